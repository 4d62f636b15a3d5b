use super::ui;
use crate::core::quota::{QuotaStatus, QuotaTracker};
use anyhow::{Context, Result};
use comfy_table::{Cell, CellAlignment};

pub fn run(tracker: &QuotaTracker, reset: bool) -> Result<()> {
    let status = if reset {
        let status = tracker.reset().context("Failed to reset API call budget")?;
        tracing::info!("Quota reset to {}", status.remaining);
        status
    } else {
        tracker.status()
    };
    println!("{}", display_status(&status));
    Ok(())
}

pub fn display_status(status: &QuotaStatus) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Quota"), ui::header_cell("Value")]);
    table.add_row(vec![Cell::new("Period"), Cell::new(&status.period)]);
    table.add_row(vec![
        Cell::new("API Calls Remaining"),
        Cell::new(format!("{} / {}", status.remaining, status.max_quota))
            .set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![Cell::new("Stored At"), Cell::new(&status.location)]);

    let style_type = if status.remaining == 0 {
        ui::StyleType::Error
    } else {
        ui::StyleType::TotalValue
    };
    format!(
        "{}\n\n{}\n\n{}: {}",
        ui::style_text("API Budget", ui::StyleType::Title),
        table,
        ui::style_text("Remaining", ui::StyleType::TotalLabel),
        ui::style_text(&status.remaining.to_string(), style_type)
    )
}
