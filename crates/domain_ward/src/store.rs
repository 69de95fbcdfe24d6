//! Administration row storage
//!
//! The scheduler mutates rows through [`AdministrationStore::update`], which
//! runs the mutation as a closure inside the store's critical section. That
//! gives the compare-and-set guard the discontinuation sweep relies on: an
//! adjustment and a bulk cancellation racing on the same row serialize, and
//! whichever loses observes the terminal or adjusted state instead of
//! overwriting it.

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use core_kernel::{AdministrationId, PrescriptionId};

use crate::administration::{AdministrationStatus, MedicationAdministration};
use crate::error::WardError;

/// Storage port for MAR rows
pub trait AdministrationStore: Send + Sync {
    /// Inserts a new row
    fn insert(&self, administration: MedicationAdministration);

    /// Fetches a snapshot of one row
    fn get(&self, id: AdministrationId) -> Option<MedicationAdministration>;

    /// Snapshots of every row for a prescription, in scheduled-time order
    fn for_prescription(&self, prescription_id: PrescriptionId) -> Vec<MedicationAdministration>;

    /// Runs a mutation on one row inside the store's critical section
    ///
    /// The closure's error leaves the row untouched.
    fn update<T>(
        &self,
        id: AdministrationId,
        mutate: impl FnOnce(&mut MedicationAdministration) -> Result<T, WardError>,
    ) -> Result<T, WardError>;

    /// Cancels every still-scheduled row of a prescription in one atomic
    /// sweep; with `after` set, only rows scheduled later than that instant.
    /// Returns the number of rows cancelled.
    fn cancel_scheduled(
        &self,
        prescription_id: PrescriptionId,
        after: Option<DateTime<Utc>>,
    ) -> usize;
}

/// In-memory [`AdministrationStore`] backed by an `RwLock`
pub struct InMemoryAdministrationStore {
    rows: RwLock<BTreeMap<AdministrationId, MedicationAdministration>>,
}

impl InMemoryAdministrationStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    /// Total number of rows, across all prescriptions
    pub fn len(&self) -> usize {
        self.rows.read().expect("administration store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryAdministrationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AdministrationStore for InMemoryAdministrationStore {
    fn insert(&self, administration: MedicationAdministration) {
        self.rows
            .write()
            .expect("administration store lock poisoned")
            .insert(administration.id, administration);
    }

    fn get(&self, id: AdministrationId) -> Option<MedicationAdministration> {
        self.rows
            .read()
            .expect("administration store lock poisoned")
            .get(&id)
            .cloned()
    }

    fn for_prescription(&self, prescription_id: PrescriptionId) -> Vec<MedicationAdministration> {
        let rows = self.rows.read().expect("administration store lock poisoned");
        let mut found: Vec<MedicationAdministration> = rows
            .values()
            .filter(|row| row.prescription_id == prescription_id)
            .cloned()
            .collect();
        found.sort_by_key(|row| row.scheduled_time);
        found
    }

    fn update<T>(
        &self,
        id: AdministrationId,
        mutate: impl FnOnce(&mut MedicationAdministration) -> Result<T, WardError>,
    ) -> Result<T, WardError> {
        let mut rows = self.rows.write().expect("administration store lock poisoned");
        let row = rows
            .get_mut(&id)
            .ok_or(WardError::AdministrationNotFound(id))?;
        mutate(row)
    }

    fn cancel_scheduled(
        &self,
        prescription_id: PrescriptionId,
        after: Option<DateTime<Utc>>,
    ) -> usize {
        let mut rows = self.rows.write().expect("administration store lock poisoned");
        let mut cancelled = 0;
        for row in rows.values_mut() {
            if row.prescription_id != prescription_id {
                continue;
            }
            if row.status != AdministrationStatus::Scheduled {
                continue;
            }
            if let Some(after) = after {
                if row.scheduled_time <= after {
                    continue;
                }
            }
            if row.cancel().is_ok() {
                cancelled += 1;
            }
        }
        cancelled
    }
}
