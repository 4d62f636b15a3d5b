use super::ui;
use crate::core::quota::QuotaTracker;
use crate::core::trend::{self, DEFAULT_TREND_YEARS, RENT_GROWTH_RATE, VALUE_GROWTH_RATE};
use crate::core::valuation::{RentEstimate, ServiceError, ValuationProvider, ValueEstimate};
use anyhow::{Context, Result, bail};
use chrono::Datelike;
use comfy_table::{Cell, CellAlignment, Color};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct AnalysisReport {
    pub address: String,
    pub value: Result<ValueEstimate, ServiceError>,
    pub rent: Result<RentEstimate, ServiceError>,
    pub remaining: u32,
}

/// Spends one unit of the API budget and fetches value and rent estimates.
///
/// A blank address or an exhausted budget stops before any request is made.
/// Otherwise the spent unit is persisted whatever the requests return.
pub async fn analyze(
    address: &str,
    tracker: &QuotaTracker,
    provider: &(dyn ValuationProvider + Send + Sync),
) -> Result<AnalysisReport> {
    let address = address.trim();
    if address.is_empty() {
        bail!("Please enter a valid address.");
    }

    let state = tracker.load();
    let (allowed, next) = tracker.try_consume(state);
    if !allowed {
        bail!(
            "Monthly API pull limit reached ({}). Wait until next month.",
            tracker.max_quota()
        );
    }

    info!("Fetching data for {}", address);
    let (value, rent) = futures::join!(provider.fetch_value(address), provider.fetch_rent(address));

    tracker
        .persist(&next)
        .context("Failed to record API usage; the call was made but not counted")?;

    for err in [value.as_ref().err(), rent.as_ref().err()].into_iter().flatten() {
        warn!(status = ?err.status(), "{}", err);
    }
    debug!("{} API calls remaining", next.remaining);

    Ok(AnalysisReport {
        address: address.to_string(),
        value,
        rent,
        remaining: next.remaining,
    })
}

pub async fn run(
    address: &str,
    tracker: &QuotaTracker,
    provider: &(dyn ValuationProvider + Send + Sync),
    show_raw: bool,
) -> Result<()> {
    let pb = ui::new_spinner(&format!("Fetching data for {}...", address.trim()));
    let report = analyze(address, tracker, provider).await;
    pb.finish_and_clear();

    let report = report?;
    println!(
        "{}",
        display_report(&report, chrono::Utc::now().year(), show_raw)
    );
    Ok(())
}

fn error_cell(err: &ServiceError) -> Cell {
    Cell::new(format!("Error: {err}")).fg(Color::Red)
}

fn estimate_rows(report: &AnalysisReport) -> Vec<Vec<Cell>> {
    let money = |v: f64| ui::format_money(v, 0);
    let value_row = match &report.value {
        Ok(v) => vec![
            Cell::new("Property Value"),
            Cell::new(money(v.price)).set_alignment(CellAlignment::Right),
            ui::format_optional_cell(v.price_range_low, money),
            ui::format_optional_cell(v.price_range_high, money),
        ],
        Err(e) => vec![Cell::new("Property Value"), error_cell(e)],
    };
    let rent_row = match &report.rent {
        Ok(r) => vec![
            Cell::new("Monthly Rent"),
            Cell::new(format!("{} /mo", money(r.rent))).set_alignment(CellAlignment::Right),
            ui::format_optional_cell(r.rent_range_low, money),
            ui::format_optional_cell(r.rent_range_high, money),
        ],
        Err(e) => vec![Cell::new("Monthly Rent"), error_cell(e)],
    };
    vec![value_row, rent_row]
}

fn display_trends(value: &ValueEstimate, rent: &RentEstimate, current_year: i32) -> String {
    let values = trend::back_project(value.price, VALUE_GROWTH_RATE, DEFAULT_TREND_YEARS, current_year);
    let rents = trend::back_project(rent.rent, RENT_GROWTH_RATE, DEFAULT_TREND_YEARS, current_year);

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Year"),
        ui::header_cell("Home Value"),
        ui::header_cell("Rent (/mo)"),
    ]);
    for (v, r) in values.iter().zip(&rents) {
        table.add_row(vec![
            Cell::new(v.year),
            Cell::new(ui::format_money(v.value, 0)).set_alignment(CellAlignment::Right),
            Cell::new(ui::format_money(r.value, 0)).set_alignment(CellAlignment::Right),
        ]);
    }

    format!(
        "{}\n\n{}\n{}",
        ui::style_text("Trends Over 10 Years (Simulated)", ui::StyleType::Title),
        table,
        ui::style_text(
            "Note: Historical trends are modeled based on assumed average appreciation rates.",
            ui::StyleType::Subtle
        )
    )
}

fn raw_json<T>(label: &str, result: &Result<T, ServiceError>, raw: impl Fn(&T) -> &serde_json::Value) -> String {
    let body = match result {
        Ok(estimate) => serde_json::to_string_pretty(raw(estimate)).unwrap_or_else(|e| e.to_string()),
        Err(_) => "null".to_string(),
    };
    format!("{}\n{}", ui::style_text(label, ui::StyleType::TotalLabel), body)
}

pub fn display_report(report: &AnalysisReport, current_year: i32, show_raw: bool) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Estimate"),
        ui::header_cell("Current"),
        ui::header_cell("Range Low"),
        ui::header_cell("Range High"),
    ]);
    for row in estimate_rows(report) {
        table.add_row(row);
    }

    let mut output = format!(
        "Property: {}\n\n{}",
        ui::style_text(&report.address, ui::StyleType::Title),
        table
    );

    output.push_str(&ui::separator());
    match (&report.value, &report.rent) {
        (Ok(value), Ok(rent)) => output.push_str(&display_trends(value, rent, current_year)),
        _ => output.push_str(&ui::style_text(
            "Not enough data to generate trends.",
            ui::StyleType::Error,
        )),
    }

    if show_raw {
        output.push_str(&ui::separator());
        output.push_str(&raw_json("Property Value API Response:", &report.value, |v| &v.raw));
        output.push_str("\n\n");
        output.push_str(&raw_json("Rent Estimate API Response:", &report.rent, |r| &r.raw));
    }

    output.push_str(&format!(
        "\n\n{}: {}",
        ui::style_text("API Calls Remaining", ui::StyleType::TotalLabel),
        ui::style_text(&report.remaining.to_string(), ui::StyleType::TotalValue)
    ));
    output
}
