//! Drug metadata consumed by quantity calculation
//!
//! The parser itself is drug-agnostic; the form only matters when turning a
//! parsed schedule into a dispense quantity (bottles for liquids, single
//! units for inhalers and drops).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::DrugId;

/// Pharmaceutical form of a drug
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrugForm {
    Tablet,
    Capsule,
    Syrup,
    Suspension,
    Solution,
    Injection,
    Drops,
    Inhaler,
    CombinationPack,
    Cream,
    Ointment,
    Gel,
    Lotion,
}

impl DrugForm {
    /// Liquid forms dispense by the bottle; doses are in millilitres
    pub fn is_liquid(&self) -> bool {
        matches!(
            self,
            DrugForm::Syrup | DrugForm::Suspension | DrugForm::Solution
        )
    }

    /// Forms dispensed as a single unit regardless of frequency and duration
    pub fn is_fixed_unit(&self) -> bool {
        matches!(
            self,
            DrugForm::Drops | DrugForm::Inhaler | DrugForm::CombinationPack
        )
    }
}

/// The metadata the quantity calculation needs about a drug
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugInfo {
    /// Catalog identifier
    pub id: DrugId,
    /// Pharmaceutical form
    pub form: DrugForm,
    /// Bottle volume for liquid forms; None means the pharmacy enters the
    /// bottle count manually
    pub bottle_size_ml: Option<Decimal>,
}

impl DrugInfo {
    pub fn new(form: DrugForm) -> Self {
        Self {
            id: DrugId::new_v7(),
            form,
            bottle_size_ml: None,
        }
    }

    /// Sets the bottle volume for a liquid form
    pub fn with_bottle_size_ml(mut self, volume: Decimal) -> Self {
        self.bottle_size_ml = Some(volume);
        self
    }
}
