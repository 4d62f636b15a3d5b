//! Valuation and rent estimate abstractions

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Value,
    Rent,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Value => "avm/value",
            Endpoint::Rent => "avm/rent/long-term",
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Endpoint::Value => "Value",
                Endpoint::Rent => "Rent",
            }
        )
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{endpoint} API Error {status}: {message}")]
    Status {
        endpoint: Endpoint,
        status: u16,
        message: String,
    },

    #[error("{endpoint} API request failed: {message}")]
    Transport { endpoint: Endpoint, message: String },

    #[error("Failed to parse {endpoint} API response: {reason}. Response: '{body}'")]
    Decode {
        endpoint: Endpoint,
        reason: String,
        body: String,
    },
}

impl ServiceError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueEstimate {
    pub price: f64,
    pub price_range_low: Option<f64>,
    pub price_range_high: Option<f64>,
    /// Response body as returned by the service
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentEstimate {
    pub rent: f64,
    pub rent_range_low: Option<f64>,
    pub rent_range_high: Option<f64>,
    pub raw: serde_json::Value,
}

#[async_trait]
pub trait ValuationProvider: Send + Sync {
    async fn fetch_value(&self, address: &str) -> Result<ValueEstimate, ServiceError>;
    async fn fetch_rent(&self, address: &str) -> Result<RentEstimate, ServiceError>;
}
