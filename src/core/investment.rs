//! Mortgage and cash-flow metrics for a rental property.
//!
//! Everything here is a pure function of [`LoanParameters`]. No rounding is
//! applied; presentation code decides how many places to show.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalculatorError {
    #[error("Invalid input: {field} ({reason})")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: &'static str },

    #[error("Arithmetic overflow in {context}")]
    Overflow { context: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentType {
    #[default]
    FullyAmortized,
    InterestOnly,
}

impl Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PaymentType::FullyAmortized => "Fully Amortized",
                PaymentType::InterestOnly => "Interest Only",
            }
        )
    }
}

impl FromStr for PaymentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "fullyamortized" | "amortized" => Ok(PaymentType::FullyAmortized),
            "interestonly" => Ok(PaymentType::InterestOnly),
            _ => Err(anyhow::anyhow!("Invalid payment type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanParameters {
    pub purchase_price: Decimal,
    pub down_payment_percent: Decimal,
    pub annual_interest_rate_percent: Decimal,
    pub loan_term_years: u32,
    pub annual_rent_income: Decimal,
    pub annual_operating_expenses: Decimal,
    pub payment_type: PaymentType,
}

/// A percentage that may be undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Percentage {
    Value(Decimal),
    NotANumber,
}

impl Percentage {
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Percentage::Value(v) => Some(*v),
            Percentage::NotANumber => None,
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Percentage::NotANumber)
    }
}

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Percentage::Value(v) => write!(f, "{:.2}%", v),
            Percentage::NotANumber => write!(f, "NaN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentResult {
    pub down_payment: Decimal,
    pub loan_amount: Decimal,
    pub total_payments: u32,
    pub monthly_payment: Decimal,
    pub annual_debt_service: Decimal,
    pub net_operating_income: Decimal,
    pub cash_flow_before_tax: Decimal,
    pub monthly_cash_flow: Decimal,
    pub cap_rate_percent: Decimal,
    pub cash_on_cash_return_percent: Percentage,
}

/// One year of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleYear {
    pub year: u32,
    pub interest: Decimal,
    pub principal: Decimal,
    pub closing_balance: Decimal,
}

/// Longest loan the calculator accepts.
pub const MAX_LOAN_TERM_YEARS: u32 = 40;

fn months() -> Decimal {
    Decimal::from(12)
}

fn hundred() -> Decimal {
    Decimal::from(100)
}

fn checked(value: Option<Decimal>, context: &'static str) -> Result<Decimal, CalculatorError> {
    value.ok_or(CalculatorError::Overflow { context })
}

fn validate(params: &LoanParameters) -> Result<(), CalculatorError> {
    if params.purchase_price < Decimal::ZERO {
        return Err(CalculatorError::InvalidInput {
            field: "purchase_price",
            reason: format!("must be >= 0, got {}", params.purchase_price),
        });
    }
    if params.down_payment_percent < Decimal::ZERO || params.down_payment_percent > hundred() {
        return Err(CalculatorError::InvalidInput {
            field: "down_payment_percent",
            reason: format!("must be within [0, 100], got {}", params.down_payment_percent),
        });
    }
    if params.annual_interest_rate_percent < Decimal::ZERO {
        return Err(CalculatorError::InvalidInput {
            field: "annual_interest_rate_percent",
            reason: format!("must be >= 0, got {}", params.annual_interest_rate_percent),
        });
    }
    if params.loan_term_years == 0 || params.loan_term_years > MAX_LOAN_TERM_YEARS {
        return Err(CalculatorError::InvalidInput {
            field: "loan_term_years",
            reason: format!(
                "must be within [1, {MAX_LOAN_TERM_YEARS}] years, got {}",
                params.loan_term_years
            ),
        });
    }
    Ok(())
}

fn monthly_rate(annual_rate_percent: Decimal) -> Decimal {
    annual_rate_percent / hundred() / months()
}

fn total_payments(loan_term_years: u32) -> Result<u32, CalculatorError> {
    loan_term_years
        .checked_mul(12)
        .ok_or(CalculatorError::Overflow {
            context: "total payments",
        })
}

/// Fixed payment that retires `principal` over `total_months`:
/// `P * r(1+r)^n / ((1+r)^n - 1)`, or `P / n` when the rate is zero.
pub fn amortized_payment(
    principal: Decimal,
    monthly_rate: Decimal,
    total_months: u32,
) -> Result<Decimal, CalculatorError> {
    if total_months == 0 || total_months > MAX_LOAN_TERM_YEARS * 12 {
        return Err(CalculatorError::InvalidInput {
            field: "total_payments",
            reason: format!(
                "must be within [1, {}], got {total_months}",
                MAX_LOAN_TERM_YEARS * 12
            ),
        });
    }
    if monthly_rate.is_zero() {
        return Ok(principal / Decimal::from(total_months));
    }

    let overflow = CalculatorError::Overflow {
        context: "amortized payment",
    };

    // (1 + r)^n by repeated multiplication
    let growth = Decimal::ONE + monthly_rate;
    let mut compound = Decimal::ONE;
    for _ in 0..total_months {
        compound = compound.checked_mul(growth).ok_or(overflow.clone())?;
    }

    let denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        return Err(CalculatorError::DivisionByZero {
            context: "amortized payment denominator",
        });
    }

    principal
        .checked_mul(monthly_rate)
        .and_then(|p| p.checked_mul(compound))
        .and_then(|n| n.checked_div(denominator))
        .ok_or(overflow)
}

/// NOI over purchase price, as a percentage.
pub fn cap_rate_percent(
    net_operating_income: Decimal,
    purchase_price: Decimal,
) -> Result<Decimal, CalculatorError> {
    if purchase_price.is_zero() {
        return Err(CalculatorError::DivisionByZero {
            context: "cap rate (purchase price is zero)",
        });
    }
    checked(
        net_operating_income
            .checked_div(purchase_price)
            .and_then(|r| r.checked_mul(hundred())),
        "cap rate",
    )
}

/// Pre-tax cash flow over cash invested. Undefined without a down payment.
pub fn cash_on_cash_return_percent(
    cash_flow_before_tax: Decimal,
    down_payment: Decimal,
) -> Result<Percentage, CalculatorError> {
    if down_payment <= Decimal::ZERO {
        return Ok(Percentage::NotANumber);
    }
    let percent = checked(
        cash_flow_before_tax
            .checked_div(down_payment)
            .and_then(|r| r.checked_mul(hundred())),
        "cash on cash return",
    )?;
    Ok(Percentage::Value(percent))
}

pub fn calculate(params: &LoanParameters) -> Result<InvestmentResult, CalculatorError> {
    validate(params)?;

    // Fraction first, so a valid percentage never overflows the product
    let down_payment = checked(
        params
            .purchase_price
            .checked_mul(params.down_payment_percent / hundred()),
        "down payment",
    )?;
    let loan_amount = checked(params.purchase_price.checked_sub(down_payment), "loan amount")?;
    let monthly_rate = monthly_rate(params.annual_interest_rate_percent);
    let total_payments = total_payments(params.loan_term_years)?;

    let monthly_payment = match params.payment_type {
        PaymentType::FullyAmortized => amortized_payment(loan_amount, monthly_rate, total_payments)?,
        PaymentType::InterestOnly => {
            checked(loan_amount.checked_mul(monthly_rate), "interest-only payment")?
        }
    };

    let annual_debt_service = checked(
        monthly_payment.checked_mul(months()),
        "annual debt service",
    )?;
    let net_operating_income = checked(
        params
            .annual_rent_income
            .checked_sub(params.annual_operating_expenses),
        "net operating income",
    )?;
    let cash_flow_before_tax = checked(
        net_operating_income.checked_sub(annual_debt_service),
        "cash flow before tax",
    )?;
    let monthly_cash_flow = cash_flow_before_tax / months();
    let cap_rate_percent = cap_rate_percent(net_operating_income, params.purchase_price)?;
    let cash_on_cash_return_percent =
        cash_on_cash_return_percent(cash_flow_before_tax, down_payment)?;

    Ok(InvestmentResult {
        down_payment,
        loan_amount,
        total_payments,
        monthly_payment,
        annual_debt_service,
        net_operating_income,
        cash_flow_before_tax,
        monthly_cash_flow,
        cap_rate_percent,
        cash_on_cash_return_percent,
    })
}

/// Yearly interest and principal split of the loan.
///
/// Interest-only loans pay no principal, so the balance stays at the loan
/// amount. For amortized loans the final payment absorbs any rounding
/// residue and closes the balance at exactly zero.
pub fn amortization_schedule(params: &LoanParameters) -> Result<Vec<ScheduleYear>, CalculatorError> {
    let result = calculate(params)?;
    let rate = monthly_rate(params.annual_interest_rate_percent);

    let mut balance = result.loan_amount;
    let mut schedule = Vec::with_capacity(params.loan_term_years as usize);
    let mut year = ScheduleYear {
        year: 1,
        interest: Decimal::ZERO,
        principal: Decimal::ZERO,
        closing_balance: balance,
    };

    for month in 1..=result.total_payments {
        let interest = checked(balance.checked_mul(rate), "schedule interest")?;
        let principal = match params.payment_type {
            PaymentType::InterestOnly => Decimal::ZERO,
            PaymentType::FullyAmortized if month == result.total_payments => balance,
            PaymentType::FullyAmortized => checked(
                result.monthly_payment.checked_sub(interest),
                "schedule principal",
            )?,
        };
        balance = checked(balance.checked_sub(principal), "schedule balance")?;

        year.interest = checked(year.interest.checked_add(interest), "schedule interest")?;
        year.principal = checked(year.principal.checked_add(principal), "schedule principal")?;
        year.closing_balance = balance;

        if month % 12 == 0 {
            let next = ScheduleYear {
                year: year.year + 1,
                interest: Decimal::ZERO,
                principal: Decimal::ZERO,
                closing_balance: balance,
            };
            schedule.push(std::mem::replace(&mut year, next));
        }
    }

    Ok(schedule)
}
