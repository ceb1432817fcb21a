use thiserror::Error;

/// Validation failures caught before any I/O is attempted.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("a daily log needs at least one activity type")]
    EmptyActivityTypes,
    #[error("daily hours must be non-negative, got {0}")]
    NegativeHours(f64),
    #[error("daily hours must be a finite number")]
    NonFiniteHours,
    #[error("required hours target must be a non-negative finite number, got {0}")]
    InvalidRequiredHours(f64),
    #[error("internship end date {end} is before start date {start}")]
    EndBeforeStart { start: time::Date, end: time::Date },
}
