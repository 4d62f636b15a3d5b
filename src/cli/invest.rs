use super::ui;
use crate::core::investment::{self, InvestmentResult, LoanParameters, ScheduleYear};
use anyhow::{Context, Result};
use comfy_table::{Attribute, Cell, CellAlignment};
use rust_decimal::Decimal;
use tracing::debug;

pub fn run(params: &LoanParameters, show_schedule: bool) -> Result<()> {
    debug!("Calculating investment metrics for {params:?}");
    let result = investment::calculate(params).context("Investment calculation failed")?;
    println!("{}", display_summary(params, &result));

    if show_schedule {
        let schedule =
            investment::amortization_schedule(params).context("Amortization schedule failed")?;
        ui::print_separator();
        println!("{}", display_schedule(&schedule));
    }
    Ok(())
}

fn row(label: &str, value: Cell) -> Vec<Cell> {
    vec![Cell::new(label), value]
}

pub fn display_summary(params: &LoanParameters, result: &InvestmentResult) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);

    table.add_row(row("Purchase Price", ui::money_cell(params.purchase_price)));
    table.add_row(row("Down Payment", ui::money_cell(result.down_payment)));
    table.add_row(row("Loan Amount", ui::money_cell(result.loan_amount)));
    table.add_row(row(
        &format!("Monthly Debt Payment ({})", params.payment_type),
        ui::money_cell(result.monthly_payment),
    ));
    table.add_row(row(
        "Annual Debt Service",
        ui::money_cell(result.annual_debt_service),
    ));
    table.add_row(row(
        "Net Operating Income (NOI)",
        ui::money_cell(result.net_operating_income),
    ));
    table.add_row(row(
        "Annual Cash Flow Before Tax",
        ui::signed_money_cell(
            result.cash_flow_before_tax,
            result.cash_flow_before_tax < Decimal::ZERO,
        ),
    ));
    table.add_row(row(
        "Cap Rate",
        Cell::new(format!("{:.2}%", result.cap_rate_percent)).set_alignment(CellAlignment::Right),
    ));
    // N/A when there is no down payment
    let coc = ui::format_optional_cell(result.cash_on_cash_return_percent.value(), |v| {
        format!("{v:.2}%")
    });
    table.add_row(row("Cash on Cash Return", coc));

    let negative = result.monthly_cash_flow < Decimal::ZERO;
    let verdict = if negative {
        "Negative Cash Flow"
    } else {
        "Positive Cash Flow"
    };
    let style_type = if negative {
        ui::StyleType::Error
    } else {
        ui::StyleType::TotalValue
    };

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Investment Summary", ui::StyleType::Title)
    );
    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\n\n{}: {}",
        ui::style_text("Monthly Cash Flow", ui::StyleType::TotalLabel),
        ui::style_text(
            &format!("{} {}", ui::format_money(result.monthly_cash_flow, 2), verdict),
            style_type
        )
    ));
    output
}

pub fn display_schedule(schedule: &[ScheduleYear]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Year"),
        ui::header_cell("Interest"),
        ui::header_cell("Principal"),
        ui::header_cell("Balance"),
    ]);

    for year in schedule {
        table.add_row(vec![
            Cell::new(year.year).set_alignment(CellAlignment::Right),
            ui::money_cell(year.interest),
            ui::money_cell(year.principal),
            ui::money_cell(year.closing_balance),
        ]);
    }

    let total_interest: Decimal = schedule.iter().map(|y| y.interest).sum();
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        ui::money_cell(total_interest).add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
    ]);

    format!(
        "{}\n\n{}",
        ui::style_text("Amortization Schedule", ui::StyleType::Title),
        table
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::investment::{Percentage, PaymentType};
    use rust_decimal_macros::dec;

    fn params() -> LoanParameters {
        LoanParameters {
            purchase_price: dec!(1000000),
            down_payment_percent: dec!(20),
            annual_interest_rate_percent: dec!(6.5),
            loan_term_years: 30,
            annual_rent_income: dec!(120000),
            annual_operating_expenses: dec!(40000),
            payment_type: PaymentType::FullyAmortized,
        }
    }

    #[test]
    fn test_summary_contains_metrics() {
        let params = params();
        let result = investment::calculate(&params).unwrap();
        let output = display_summary(&params, &result);

        assert!(output.contains("$800,000.00"));
        assert!(output.contains("$5,056.54"));
        assert!(output.contains("8.00%"));
        assert!(output.contains("9.66%"));
        assert!(output.contains("Positive Cash Flow"));
        assert!(output.contains("Fully Amortized"));
    }

    #[test]
    fn test_summary_without_down_payment() {
        let params = LoanParameters {
            down_payment_percent: Decimal::ZERO,
            ..params()
        };
        let result = investment::calculate(&params).unwrap();
        assert_eq!(result.cash_on_cash_return_percent, Percentage::NotANumber);

        let output = display_summary(&params, &result);
        assert!(output.contains("N/A"));
        assert!(output.contains("$1,000,000.00"));
    }

    #[test]
    fn test_schedule_table() {
        let params = LoanParameters {
            loan_term_years: 2,
            ..params()
        };
        let schedule = investment::amortization_schedule(&params).unwrap();
        let output = display_schedule(&schedule);
        assert!(output.contains("Amortization Schedule"));
        assert!(output.contains("Total"));
        assert!(output.contains("$0.00"));
    }

    #[test]
    fn test_run_rejects_invalid_input() {
        let params = LoanParameters {
            loan_term_years: 0,
            ..params()
        };
        let err = run(&params, false).unwrap_err();
        assert!(format!("{err:#}").contains("loan_term_years"));
    }
}
