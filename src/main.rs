use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use propval::core::investment::{LoanParameters, PaymentType};
use propval::core::log::init_logging;
use rust_decimal::Decimal;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch value and rent estimates for an address (uses one API call)
    Analyze {
        /// Full property address
        address: String,
        /// Also print the raw API responses
        #[arg(long)]
        raw: bool,
    },
    /// Calculate mortgage payment, cash flow and returns for a purchase
    Invest {
        /// Purchase price
        #[arg(long, default_value = "1000000")]
        price: Decimal,
        /// Down payment (%)
        #[arg(long, default_value = "20")]
        down_payment: Decimal,
        /// Annual interest rate (%)
        #[arg(long, default_value = "6.5")]
        rate: Decimal,
        /// Loan term in years (1 to 40)
        #[arg(long, default_value_t = 30)]
        term: u32,
        /// Annual rental income
        #[arg(long, default_value = "120000")]
        rent: Decimal,
        /// Annual operating expenses
        #[arg(long, default_value = "40000")]
        expenses: Decimal,
        /// fully-amortized or interest-only
        #[arg(long, default_value = "fully-amortized")]
        payment_type: PaymentType,
        /// Also print the yearly amortization schedule
        #[arg(long)]
        schedule: bool,
    },
    /// Show or reset the monthly API call budget
    Quota {
        /// Restore the full budget for the current month
        #[arg(long)]
        reset: bool,
    },
}

impl From<Commands> for propval::AppCommand {
    fn from(cmd: Commands) -> propval::AppCommand {
        match cmd {
            Commands::Analyze { address, raw } => propval::AppCommand::Analyze {
                address,
                show_raw: raw,
            },
            Commands::Invest {
                price,
                down_payment,
                rate,
                term,
                rent,
                expenses,
                payment_type,
                schedule,
            } => propval::AppCommand::Invest {
                params: LoanParameters {
                    purchase_price: price,
                    down_payment_percent: down_payment,
                    annual_interest_rate_percent: rate,
                    loan_term_years: term,
                    annual_rent_income: rent,
                    annual_operating_expenses: expenses,
                    payment_type,
                },
                show_schedule: schedule,
            },
            Commands::Quota { reset } => propval::AppCommand::Quota { reset },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => propval::cli::setup::setup(),
        Some(cmd) => propval::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
