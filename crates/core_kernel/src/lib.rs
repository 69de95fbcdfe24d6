//! Core Kernel - Foundational types and utilities for the hospital core
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Effective-date windows and facility timezone handling
//! - Common identifiers and value objects

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod error;

pub use money::{Money, Currency, Rate, MoneyError};
pub use temporal::{EffectiveWindow, Timezone, TemporalError};
pub use identifiers::{
    PlanId, RuleId, TariffId, DrugId,
    PrescriptionId, AdministrationId, AdjustmentId,
    AdmissionId, VitalsScheduleId, UserId,
};
pub use error::CoreError;
