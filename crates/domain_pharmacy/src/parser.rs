//! Prescription instruction parser
//!
//! Tries each schedule shape in a fixed order - STAT, PRN, taper, custom
//! intervals, split dose, standard - and falls back to partial extraction
//! with per-component error messages when nothing matches fully. The order
//! matters: taper must run before split dose so "4-3-2-1" is not read as a
//! malformed three-part split, and the special shapes must run before the
//! generic ones.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use crate::drug::DrugInfo;
use crate::duration::parse_duration;
use crate::frequency::FrequencyCode;
use crate::pattern::SchedulePattern;
use crate::result::{ParsedPrescription, ScheduleType};

const DOSE_UNITS: &str = r"tabs?|capsules?|caps?|ml|mg";
const FREQUENCY_TOKENS: &str = "OD|BD|BID|TDS|TID|QDS|QID|Q2H|Q4H|Q6H|Q8H|Q12H";

static STAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(\d+(?:\.\d+)?)?\s*({})?\s*STAT$",
        DOSE_UNITS
    ))
    .unwrap()
});

static PRN_WITH_MAX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(\d+(?:\.\d+)?)?\s*({})?\s*PRN\s+max\s+(\d+)/24h\s*x\s*(\d+)\s*days?$",
        DOSE_UNITS
    ))
    .unwrap()
});

static PRN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)^(\d+(?:\.\d+)?)?\s*({})?\s*PRN$", DOSE_UNITS)).unwrap()
});

static TAPER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^((?:\d+(?:\.\d+)?-)+\d+(?:\.\d+)?)\s*(?:taper)?$").unwrap()
});

static CUSTOM_SUFFIXED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(\d+(?:\.\d+)?)\s*({})?\s*((?:\d+h?,?\s*)+)$",
        DOSE_UNITS
    ))
    .unwrap()
});

static CUSTOM_AT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(\d+(?:\.\d+)?)\s*({})?\s*at\s*((?:\d+,?\s*)+)$",
        DOSE_UNITS
    ))
    .unwrap()
});

static CUSTOM_HRS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(mg|ml)\s+((?:\d+,)+\d+)\s*(?:hrs?)?$").unwrap()
});

static SPLIT_DOSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?)-(\d+(?:\.\d+)?)-(\d+(?:\.\d+)?)\s*(?:[x*/]\s*|for\s+)(.+)$")
        .unwrap()
});

static STANDARD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(\d+(?:\.\d+)?)\s*({})?\s*({})\s*(?:[x*/]\s*|\s+for\s+)(.+)$",
        DOSE_UNITS, FREQUENCY_TOKENS
    ))
    .unwrap()
});

static LEADING_DOSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)^(\d+(?:\.\d+)?)\s*({})?", DOSE_UNITS)).unwrap()
});

static DURATION_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)x\s*(.+)$").unwrap());

static STRIP_HOURS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)h").unwrap());

static INTERVAL_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,\s]+").unwrap());

/// Parser for free-text prescription instructions
///
/// Stateless; safe to share across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrescriptionParser;

impl PrescriptionParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses a prescription instruction
    ///
    /// When drug metadata is supplied, the dispense quantity is recomputed
    /// for the drug's form (bottles for liquids, one unit for inhalers).
    pub fn parse(&self, input: &str, drug: Option<&DrugInfo>) -> ParsedPrescription {
        let input = input.trim();

        if input.is_empty() {
            return ParsedPrescription::invalid(vec!["Please enter a prescription".to_owned()]);
        }

        let result = self
            .parse_stat(input)
            .or_else(|| self.parse_prn(input))
            .or_else(|| self.parse_taper(input))
            .or_else(|| self.parse_custom_intervals(input))
            .or_else(|| self.parse_split_dose(input))
            .or_else(|| self.parse_standard(input));

        match result {
            Some(result) => match drug {
                Some(drug) => self.apply_drug_quantity(result, drug),
                None => result,
            },
            None => self.parse_partial(input),
        }
    }

    /// Formats a valid result back into its canonical display text
    ///
    /// Reparsing the returned string reproduces the result.
    pub fn format(&self, result: &ParsedPrescription) -> String {
        if !result.is_valid {
            return String::new();
        }

        if let Some(text) = &result.display_text {
            return text.clone();
        }

        let mut parts = Vec::new();
        if let Some(dose) = &result.dose_quantity {
            parts.push(dose.clone());
        }
        if let Some(code) = &result.frequency_code {
            if !matches!(code.as_str(), "SPLIT" | "CUSTOM" | "TAPER") {
                parts.push(code.clone());
            }
        }
        if let Some(duration) = &result.duration {
            if !matches!(
                result.schedule_type,
                Some(ScheduleType::Stat) | Some(ScheduleType::Prn)
            ) {
                parts.push(format!("x {}", duration));
            }
        }
        parts.join(" ")
    }

    /// Returns the structured pattern for MAR generation, if the result is valid
    pub fn to_schedule_pattern(&self, result: &ParsedPrescription) -> Option<SchedulePattern> {
        if !result.is_valid {
            return None;
        }
        result.schedule_pattern.clone()
    }

    /// Recomputes the dispense quantity for a specific drug form
    pub fn calculate_quantity(&self, result: &ParsedPrescription, drug: &DrugInfo) -> u32 {
        if !result.is_valid {
            return 0;
        }

        // STAT and PRN dispense exactly what was parsed
        if matches!(
            result.schedule_type,
            Some(ScheduleType::Stat) | Some(ScheduleType::Prn)
        ) {
            return result.quantity_to_dispense.unwrap_or(1);
        }

        // Drops, inhalers, and combination packs go out as one unit
        if drug.form.is_fixed_unit() {
            return 1;
        }

        if drug.form.is_liquid() {
            // Missing bottle size means the pharmacy enters the count by
            // hand; zero is the sentinel the dispensing screen watches for.
            let Some(bottle_size) = drug.bottle_size_ml else {
                return 0;
            };
            let dose_ml = result.dose_numeric().unwrap_or(Decimal::ONE);
            let times_per_day = Decimal::from(result.times_per_day().unwrap_or(1));
            let days = Decimal::from(result.duration_days.unwrap_or(1));
            let total_ml = dose_ml * times_per_day * days;
            return ceil_u32(total_ml / bottle_size);
        }

        result.quantity_to_dispense.unwrap_or(0)
    }

    fn parse_stat(&self, input: &str) -> Option<ParsedPrescription> {
        let caps = STAT.captures(input)?;
        let dose_value = parse_decimal(caps.get(1).map_or("1", |m| m.as_str()))?;
        let dose_quantity = dose_string(dose_value, caps.get(2).map(|m| m.as_str()));

        Some(ParsedPrescription::stat(dose_quantity, ceil_u32(dose_value)))
    }

    fn parse_prn(&self, input: &str) -> Option<ParsedPrescription> {
        if let Some(caps) = PRN_WITH_MAX.captures(input) {
            let dose_value = parse_decimal(caps.get(1).map_or("1", |m| m.as_str()))?;
            let dose_quantity = dose_string(dose_value, caps.get(2).map(|m| m.as_str()));
            let max_daily: u32 = caps[3].parse().ok()?;
            let duration_days: u32 = caps[4].parse().ok()?;

            return Some(ParsedPrescription {
                is_valid: true,
                dose_quantity: Some(dose_quantity.clone()),
                frequency: Some(format!("As needed (max {}/24h)", max_daily)),
                frequency_code: Some("PRN".to_owned()),
                duration: Some(format!("{} days", duration_days)),
                duration_days: Some(duration_days),
                quantity_to_dispense: Some(max_daily * duration_days),
                schedule_type: Some(ScheduleType::Prn),
                schedule_pattern: Some(SchedulePattern::Prn {
                    max_daily: Some(max_daily),
                    duration_days: Some(duration_days),
                }),
                display_text: Some(format!(
                    "{} PRN (max {}/24h) x {} days",
                    dose_quantity, max_daily, duration_days
                )),
                errors: Vec::new(),
            });
        }

        let caps = PRN.captures(input)?;
        let dose_value = parse_decimal(caps.get(1).map_or("1", |m| m.as_str()))?;
        let dose_quantity = dose_string(dose_value, caps.get(2).map(|m| m.as_str()));

        Some(ParsedPrescription::prn(dose_quantity, ceil_u32(dose_value)))
    }

    fn parse_taper(&self, input: &str) -> Option<ParsedPrescription> {
        let caps = TAPER.captures(input)?;
        let doses: Vec<Decimal> = caps[1]
            .split('-')
            .map(parse_decimal)
            .collect::<Option<Vec<_>>>()?;

        if doses.len() < 2 {
            return None;
        }

        let has_keyword = input.to_ascii_lowercase().contains("taper");
        if !has_keyword {
            let is_decreasing = doses.windows(2).all(|pair| pair[1] <= pair[0]);
            // Three non-decreasing numbers read as a (malformed) split dose,
            // not a taper; anything else non-decreasing is not a taper either
            if !is_decreasing {
                return None;
            }
        }

        let total: Decimal = doses.iter().copied().sum();
        let duration_days = doses.len() as u32;
        let dose_list = doses
            .iter()
            .map(Decimal::to_string)
            .collect::<Vec<_>>()
            .join("-");

        Some(ParsedPrescription {
            is_valid: true,
            dose_quantity: Some(dose_list.clone()),
            frequency: Some("Taper schedule".to_owned()),
            frequency_code: Some("TAPER".to_owned()),
            duration: Some(format!("{} days", duration_days)),
            duration_days: Some(duration_days),
            quantity_to_dispense: Some(ceil_u32(total)),
            schedule_type: Some(ScheduleType::Taper),
            schedule_pattern: Some(SchedulePattern::Taper {
                doses,
                duration_days,
            }),
            display_text: Some(format!("{} taper", dose_list)),
            errors: Vec::new(),
        })
    }

    fn parse_custom_intervals(&self, input: &str) -> Option<ParsedPrescription> {
        let caps = CUSTOM_SUFFIXED
            .captures(input)
            .or_else(|| CUSTOM_AT.captures(input))
            .or_else(|| CUSTOM_HRS.captures(input))?;

        let dose_value = parse_decimal(&caps[1])?;
        let dose_unit = caps.get(2).map(|m| m.as_str());

        let stripped = STRIP_HOURS.replace_all(&caps[3], "");
        let mut intervals: Vec<u32> = INTERVAL_SEPARATORS
            .split(stripped.trim())
            .filter(|part| !part.is_empty())
            .map(|part| part.parse().ok())
            .collect::<Option<Vec<_>>>()?;

        if intervals.len() < 2 {
            return None;
        }

        // The first dose is always at hour zero
        if intervals[0] != 0 {
            intervals.insert(0, 0);
        }

        let total_doses = intervals.len() as u32;
        let max_offset = *intervals.iter().max().expect("intervals are non-empty");
        let duration_days = max_offset.div_ceil(24) + 1;
        let dose_quantity = dose_string(dose_value, dose_unit);
        let intervals_display = intervals
            .iter()
            .map(|h| format!("{}h", h))
            .collect::<Vec<_>>()
            .join(", ");

        Some(ParsedPrescription {
            is_valid: true,
            dose_quantity: Some(dose_quantity.clone()),
            frequency: Some(format!("Custom intervals ({} doses)", total_doses)),
            frequency_code: Some("CUSTOM".to_owned()),
            duration: Some("Custom schedule".to_owned()),
            duration_days: Some(duration_days),
            quantity_to_dispense: Some(ceil_u32(dose_value * Decimal::from(total_doses))),
            schedule_type: Some(ScheduleType::CustomInterval),
            schedule_pattern: Some(SchedulePattern::CustomInterval {
                intervals_hours: intervals,
                dose_per_interval: dose_value,
                total_doses,
            }),
            display_text: Some(format!("{} at {}", dose_quantity, intervals_display)),
            errors: Vec::new(),
        })
    }

    fn parse_split_dose(&self, input: &str) -> Option<ParsedPrescription> {
        let caps = SPLIT_DOSE.captures(input)?;
        let morning = parse_decimal(&caps[1])?;
        let noon = parse_decimal(&caps[2])?;
        let evening = parse_decimal(&caps[3])?;
        let duration_part = &caps[4];

        let dose_quantity = format!("{}-{}-{}", morning, noon, evening);

        let Some(duration) = parse_duration(duration_part) else {
            return Some(partial_with_duration_error(
                duration_part,
                Some(dose_quantity),
                None,
                None,
            ));
        };

        let daily_total = morning + noon + evening;
        let quantity = ceil_u32(daily_total * Decimal::from(duration.days));

        let mut parts = Vec::new();
        if morning > Decimal::ZERO {
            parts.push(format!("{} morning", morning));
        }
        if noon > Decimal::ZERO {
            parts.push(format!("{} noon", noon));
        }
        if evening > Decimal::ZERO {
            parts.push(format!("{} evening", evening));
        }
        let frequency = format!("{} ({}/day)", parts.join(", "), daily_total);

        Some(ParsedPrescription {
            is_valid: true,
            dose_quantity: Some(dose_quantity.clone()),
            frequency: Some(frequency),
            frequency_code: Some("SPLIT".to_owned()),
            duration: Some(duration.label.clone()),
            duration_days: Some(duration.days),
            quantity_to_dispense: Some(quantity),
            schedule_type: Some(ScheduleType::SplitDose),
            schedule_pattern: Some(SchedulePattern::SplitDose {
                morning,
                noon,
                evening,
                daily_total,
            }),
            display_text: Some(format!("{} x {}", dose_quantity, duration.label)),
            errors: Vec::new(),
        })
    }

    fn parse_standard(&self, input: &str) -> Option<ParsedPrescription> {
        let caps = STANDARD.captures(input)?;
        let dose_value = parse_decimal(&caps[1])?;
        let dose_unit = caps.get(2).map(|m| m.as_str());
        let code = FrequencyCode::from_token(&caps[3])?;
        let duration_part = &caps[4];

        let dose_quantity = dose_string(dose_value, dose_unit);

        let Some(duration) = parse_duration(duration_part) else {
            return Some(partial_with_duration_error(
                duration_part,
                Some(dose_quantity),
                Some(code.description().to_owned()),
                Some(code.as_str().to_owned()),
            ));
        };

        let quantity =
            ceil_u32(dose_value * Decimal::from(code.times_per_day()) * Decimal::from(duration.days));

        Some(ParsedPrescription {
            is_valid: true,
            dose_quantity: Some(dose_quantity.clone()),
            frequency: Some(code.description().to_owned()),
            frequency_code: Some(code.as_str().to_owned()),
            duration: Some(duration.label.clone()),
            duration_days: Some(duration.days),
            quantity_to_dispense: Some(quantity),
            schedule_type: Some(ScheduleType::Standard),
            schedule_pattern: Some(SchedulePattern::Standard {
                frequency_code: code,
                times_per_day: code.times_per_day(),
            }),
            display_text: Some(format!(
                "{} {} x {}",
                dose_quantity,
                code.as_str(),
                duration.label
            )),
            errors: Vec::new(),
        })
    }

    /// Extracts whatever components are recognizable and reports the rest
    fn parse_partial(&self, input: &str) -> ParsedPrescription {
        debug!(input, "prescription did not match any schedule shape");

        let mut result = ParsedPrescription::invalid(Vec::new());

        if let Some(caps) = LEADING_DOSE.captures(input) {
            if let Some(dose) = caps.get(1).and_then(|m| parse_decimal(m.as_str())) {
                result.dose_quantity = Some(dose_string(dose, caps.get(2).map(|m| m.as_str())));
            }
        }

        if let Some(code) = FrequencyCode::extract(input) {
            result.frequency = Some(code.description().to_owned());
            result.frequency_code = Some(code.as_str().to_owned());
        }

        if let Some(caps) = DURATION_TAIL.captures(input) {
            if let Some(duration) = parse_duration(&caps[1]) {
                result.duration = Some(duration.label);
                result.duration_days = Some(duration.days);
            }
        }

        let mut errors = Vec::new();
        if result.dose_quantity.is_none() {
            errors.push(
                "Could not find dose quantity. Start with a number (e.g., \"2 BD x 5 days\")"
                    .to_owned(),
            );
        }
        if result.frequency.is_none() {
            errors.push(
                "Could not find frequency. Use OD, BD, TDS, QDS, Q6H, Q8H, or Q12H".to_owned(),
            );
        }
        if result.duration.is_none() {
            errors.push("Could not find duration. Add \"x N days\" or \"x N/7\"".to_owned());
        }
        if errors.is_empty() {
            errors.push(
                "Could not parse prescription. Try formats like '2 BD x 5 days' or '1-0-1 x 7 days'"
                    .to_owned(),
            );
        }
        result.errors = errors;

        result
    }

    fn apply_drug_quantity(&self, result: ParsedPrescription, drug: &DrugInfo) -> ParsedPrescription {
        let quantity = self.calculate_quantity(&result, drug);
        ParsedPrescription {
            quantity_to_dispense: Some(quantity),
            ..result
        }
    }
}

/// A partial result for inputs whose dose and frequency parsed but whose
/// duration did not
fn partial_with_duration_error(
    duration_part: &str,
    dose_quantity: Option<String>,
    frequency: Option<String>,
    frequency_code: Option<String>,
) -> ParsedPrescription {
    let mut result = ParsedPrescription::invalid(vec![format!(
        "Could not parse duration: '{}'. Try 'x 5 days', '5d', or just '5'",
        duration_part.trim()
    )]);
    result.dose_quantity = dose_quantity;
    result.frequency = frequency;
    result.frequency_code = frequency_code;
    result
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    text.trim().parse().ok()
}

fn dose_string(value: Decimal, unit: Option<&str>) -> String {
    match unit {
        Some(unit) if !unit.is_empty() => format!("{} {}", value, unit.to_ascii_lowercase()),
        _ => value.to_string(),
    }
}

fn ceil_u32(value: Decimal) -> u32 {
    value.ceil().to_u32().unwrap_or(0)
}
