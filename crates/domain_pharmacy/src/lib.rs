//! Pharmacy Domain - Prescription Schedule Parsing
//!
//! This crate turns free-text prescription instructions into structured
//! dosing schedules and dispense quantities.
//!
//! Supported formats:
//! - Standard: `"2 BD x 5 days"`, `"1 TDS x 7/7"`, `"5ml OD x 30 days"`
//! - Split dose: `"1-0-1 x 30 days"`, `"2-1-1 x 7 days"`
//! - Custom intervals: `"4 tabs 0h,8h,24h,36h,48h,60h"`
//! - Taper: `"4-3-2-1 taper"`
//! - Special: `"STAT"`, `"2 PRN"`, `"2 PRN max 6/24h x 5 days"`
//!
//! Parsing is pure: every call takes immutable input and returns an
//! immutable [`ParsedPrescription`]; malformed input comes back as data
//! (`is_valid = false` plus per-component error messages), never as a panic
//! or error value, so batch callers can report line-by-line failures.

pub mod drug;
pub mod duration;
pub mod frequency;
pub mod parser;
pub mod pattern;
pub mod result;

pub use drug::{DrugForm, DrugInfo};
pub use duration::{parse_duration, ParsedDuration};
pub use frequency::FrequencyCode;
pub use parser::PrescriptionParser;
pub use pattern::SchedulePattern;
pub use result::{ParsedPrescription, ScheduleType};
