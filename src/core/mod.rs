//! Core business logic abstractions

pub mod config;
pub mod investment;
pub mod log;
pub mod quota;
pub mod trend;
pub mod valuation;

// Re-export main types for cleaner imports
pub use investment::{InvestmentResult, LoanParameters, PaymentType, Percentage};
pub use quota::{QuotaState, QuotaStatus, QuotaStore, QuotaTracker, StorageError};
pub use valuation::{Endpoint, RentEstimate, ServiceError, ValuationProvider, ValueEstimate};
