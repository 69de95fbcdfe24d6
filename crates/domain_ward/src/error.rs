//! Ward domain errors

use core_kernel::AdministrationId;
use thiserror::Error;

/// Errors that can occur in the ward domain
#[derive(Debug, Error)]
pub enum WardError {
    /// Attempted to adjust a dose that was already administered
    #[error("Cannot adjust medication that has already been administered")]
    AlreadyAdministered,

    /// Attempted to adjust a dose in another terminal state
    #[error("Cannot adjust a {status} medication")]
    NotAdjustable { status: String },

    /// Attempted a transition the dose state machine does not permit
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// Attempted to discontinue a prescription twice
    #[error("Prescription has already been discontinued")]
    AlreadyDiscontinued,

    /// Vitals interval outside the permitted range
    #[error("Vitals interval must be between {min} and {max} minutes, got {actual}")]
    InvalidInterval { min: u32, max: u32, actual: u32 },

    /// Administration row does not exist
    #[error("Administration not found: {0}")]
    AdministrationNotFound(AdministrationId),
}
