use rust_decimal::Decimal;
use thiserror::Error;

use super::PaymentStructure;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Operation requires a {expected} payment structure")]
    PlanMismatch { expected: PaymentStructure },

    #[error("Milestone allocation would reach {attempted}%, the limit is 100%")]
    AllocationExceeded { attempted: Decimal },

    #[error("Milestone percent must be between 0 and 100, got {0}")]
    InvalidPercent(Decimal),

    #[error("No milestone at position {0}")]
    MilestoneOutOfRange(usize),

    #[error("Month {month} is outside the {duration}-month contract")]
    MonthOutOfRange { month: u32, duration: u32 },
}

pub type DomainResult<T> = Result<T, DomainError>;
