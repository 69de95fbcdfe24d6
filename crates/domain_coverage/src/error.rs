//! Coverage domain errors

use core_kernel::MoneyError;
use thiserror::Error;

/// Errors that can occur in the coverage domain
///
/// A missing rule is NOT an error - uncovered items are common and resolve to
/// a zero-coverage result. Errors here are argument violations or internal
/// arithmetic faults.
#[derive(Debug, Error)]
pub enum CoverageError {
    /// Negative unit price passed to a calculation
    #[error("Unit price cannot be negative: {0}")]
    NegativeUnitPrice(String),

    /// Zero quantity passed to a calculation
    #[error("Quantity must be at least 1")]
    ZeroQuantity,

    /// Money arithmetic failure (currency mismatch between rule and price)
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),
}
