//! Modeled history for a value that grew at a constant annual rate.

use serde::{Deserialize, Serialize};

pub const VALUE_GROWTH_RATE: f64 = 0.035;
pub const RENT_GROWTH_RATE: f64 = 0.025;
pub const DEFAULT_TREND_YEARS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub year: i32,
    pub value: f64,
}

/// Discounts `current` back by `growth_rate` per year, oldest point first.
/// The last point is `current` at `current_year`.
pub fn back_project(current: f64, growth_rate: f64, years: u32, current_year: i32) -> Vec<TrendPoint> {
    (0..years)
        .map(|i| {
            let age = (years - 1 - i) as i32;
            TrendPoint {
                year: current_year - age,
                value: current / (1.0 + growth_rate).powi(age),
            }
        })
        .collect()
}
