//! Duration grammar
//!
//! Prescribers write durations loosely; the grammar accepts the forms seen
//! on real prescriptions:
//!
//! - separators: `x`, `*`, `/`, `for` (all optional)
//! - `"5 days"`, `"5 day"`, `"5d"`, `"5 d"`, or just `"5"`
//! - week notation `"7/7"` (seven days)
//! - `"2 weeks"` (fourteen days)
//! - trailing punctuation is ignored (`"5 days."` works)

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A parsed duration with its canonical display label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDuration {
    /// Canonical label, e.g. "5 days" or "2 weeks"
    pub label: String,
    /// Length in days
    pub days: u32,
}

const SEPARATOR: &str = r"(?:[x*/]\s*|for\s+)?";

static TRAILING_PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.,;:!?]+$").unwrap());

// "N/7" week notation checked first so it never collides with the "/" separator
static WEEK_NOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)^{}(\d+)/7$", SEPARATOR)).unwrap());

static WEEKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)^{}(\d+)\s*weeks?$", SEPARATOR)).unwrap());

static DAYS: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)^{}(\d+)\s*(?:days?|d)?$", SEPARATOR)).unwrap());

/// Parses a duration expression into days
pub fn parse_duration(input: &str) -> Option<ParsedDuration> {
    let input = TRAILING_PUNCTUATION.replace(input.trim(), "");
    let input = input.trim();

    if let Some(caps) = WEEK_NOTATION.captures(input) {
        let days: u32 = caps[1].parse().ok()?;
        return Some(ParsedDuration {
            label: format!("{} days", days),
            days,
        });
    }

    if let Some(caps) = WEEKS.captures(input) {
        let weeks: u32 = caps[1].parse().ok()?;
        return Some(ParsedDuration {
            label: format!("{} weeks", weeks),
            days: weeks * 7,
        });
    }

    if let Some(caps) = DAYS.captures(input) {
        let days: u32 = caps[1].parse().ok()?;
        return Some(ParsedDuration {
            label: format!("{} days", days),
            days,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_forms() {
        for input in ["5 days", "5 day", "5d", "5 d", "5", "x 5 days", "x5", "* 5", "/ 5d", "for 5"] {
            let parsed = parse_duration(input).unwrap_or_else(|| panic!("failed on {:?}", input));
            assert_eq!(parsed.days, 5, "input {:?}", input);
        }
    }

    #[test]
    fn test_week_notation_is_days() {
        let parsed = parse_duration("7/7").unwrap();
        assert_eq!(parsed.days, 7);
        assert_eq!(parsed.label, "7 days");

        assert_eq!(parse_duration("x 10/7").unwrap().days, 10);
    }

    #[test]
    fn test_weeks_multiply_by_seven() {
        let parsed = parse_duration("2 weeks").unwrap();
        assert_eq!(parsed.days, 14);
        assert_eq!(parsed.label, "2 weeks");

        assert_eq!(parse_duration("x 1 week").unwrap().days, 7);
    }

    #[test]
    fn test_trailing_punctuation_ignored() {
        assert_eq!(parse_duration("5 days.").unwrap().days, 5);
        assert_eq!(parse_duration("2 weeks!").unwrap().days, 14);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(parse_duration("a while").is_none());
        assert!(parse_duration("days 5").is_none());
        assert!(parse_duration("").is_none());
    }
}
