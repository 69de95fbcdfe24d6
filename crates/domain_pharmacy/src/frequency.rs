//! Frequency abbreviations
//!
//! Maps the dosing abbreviations prescribers actually write (including the
//! North-American aliases BID/TID/QID) onto canonical codes with a fixed
//! times-per-day.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical dosing frequency codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FrequencyCode {
    /// Once daily
    Od,
    /// Twice daily
    Bd,
    /// Three times daily
    Tds,
    /// Four times daily
    Qds,
    /// Every 2 hours
    Q2h,
    /// Every 4 hours
    Q4h,
    /// Every 6 hours
    Q6h,
    /// Every 8 hours
    Q8h,
    /// Every 12 hours
    Q12h,
}

/// Every frequency token the parser recognizes, alias forms included
const TOKEN_ALTERNATION: &str = "OD|BD|BID|TDS|TID|QDS|QID|Q2H|Q4H|Q6H|Q8H|Q12H";

static PARENTHESIZED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\(({})\)", TOKEN_ALTERNATION)).unwrap()
});

static WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b({})\b", TOKEN_ALTERNATION)).unwrap()
});

impl FrequencyCode {
    /// Parses a standalone frequency token, case-insensitively
    ///
    /// Aliases normalize to their canonical code: BID becomes BD, TID
    /// becomes TDS, QID becomes QDS.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "OD" => Some(FrequencyCode::Od),
            "BD" | "BID" => Some(FrequencyCode::Bd),
            "TDS" | "TID" => Some(FrequencyCode::Tds),
            "QDS" | "QID" => Some(FrequencyCode::Qds),
            "Q2H" => Some(FrequencyCode::Q2h),
            "Q4H" => Some(FrequencyCode::Q4h),
            "Q6H" => Some(FrequencyCode::Q6h),
            "Q8H" => Some(FrequencyCode::Q8h),
            "Q12H" => Some(FrequencyCode::Q12h),
            _ => None,
        }
    }

    /// Extracts a frequency code embedded in descriptive text
    ///
    /// Parenthesized codes win ("Twice daily (BID)" maps via the BID), then
    /// plain word tokens.
    pub fn extract(text: &str) -> Option<Self> {
        if let Some(caps) = PARENTHESIZED.captures(text) {
            return Self::from_token(&caps[1]);
        }
        WORD.captures(text).and_then(|caps| Self::from_token(&caps[1]))
    }

    /// The canonical code string
    pub fn as_str(&self) -> &'static str {
        match self {
            FrequencyCode::Od => "OD",
            FrequencyCode::Bd => "BD",
            FrequencyCode::Tds => "TDS",
            FrequencyCode::Qds => "QDS",
            FrequencyCode::Q2h => "Q2H",
            FrequencyCode::Q4h => "Q4H",
            FrequencyCode::Q6h => "Q6H",
            FrequencyCode::Q8h => "Q8H",
            FrequencyCode::Q12h => "Q12H",
        }
    }

    /// Human-readable description shown on labels and the MAR
    pub fn description(&self) -> &'static str {
        match self {
            FrequencyCode::Od => "Once daily (OD)",
            FrequencyCode::Bd => "Twice daily (BD)",
            FrequencyCode::Tds => "Three times daily (TDS)",
            FrequencyCode::Qds => "Four times daily (QDS)",
            FrequencyCode::Q2h => "Every 2 hours (Q2H)",
            FrequencyCode::Q4h => "Every 4 hours (Q4H)",
            FrequencyCode::Q6h => "Every 6 hours (Q6H)",
            FrequencyCode::Q8h => "Every 8 hours (Q8H)",
            FrequencyCode::Q12h => "Every 12 hours (Q12H)",
        }
    }

    /// Number of doses per 24 hours
    pub fn times_per_day(&self) -> u32 {
        match self {
            FrequencyCode::Od => 1,
            FrequencyCode::Bd => 2,
            FrequencyCode::Tds => 3,
            FrequencyCode::Qds => 4,
            FrequencyCode::Q2h => 12,
            FrequencyCode::Q4h => 6,
            FrequencyCode::Q6h => 4,
            FrequencyCode::Q8h => 3,
            FrequencyCode::Q12h => 2,
        }
    }

    /// Hours between consecutive doses
    pub fn interval_hours(&self) -> u32 {
        24 / self.times_per_day()
    }
}

impl fmt::Display for FrequencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_normalize_to_canonical_codes() {
        assert_eq!(FrequencyCode::from_token("BID"), Some(FrequencyCode::Bd));
        assert_eq!(FrequencyCode::from_token("TID"), Some(FrequencyCode::Tds));
        assert_eq!(FrequencyCode::from_token("QID"), Some(FrequencyCode::Qds));
    }

    #[test]
    fn test_from_token_is_case_insensitive() {
        assert_eq!(FrequencyCode::from_token("bd"), Some(FrequencyCode::Bd));
        assert_eq!(FrequencyCode::from_token("q8h"), Some(FrequencyCode::Q8h));
        assert_eq!(FrequencyCode::from_token(" tds "), Some(FrequencyCode::Tds));
    }

    #[test]
    fn test_extract_prefers_parenthesized_code() {
        assert_eq!(
            FrequencyCode::extract("Twice daily (BID)"),
            Some(FrequencyCode::Bd)
        );
        assert_eq!(
            FrequencyCode::extract("take OD with food"),
            Some(FrequencyCode::Od)
        );
        assert_eq!(FrequencyCode::extract("as directed"), None);
    }

    #[test]
    fn test_interval_hours_is_24_over_times_per_day() {
        for code in [
            FrequencyCode::Od,
            FrequencyCode::Bd,
            FrequencyCode::Tds,
            FrequencyCode::Qds,
            FrequencyCode::Q2h,
            FrequencyCode::Q4h,
            FrequencyCode::Q6h,
            FrequencyCode::Q8h,
            FrequencyCode::Q12h,
        ] {
            assert_eq!(code.interval_hours(), 24 / code.times_per_day());
        }
    }

    #[test]
    fn test_unknown_token_is_none() {
        assert_eq!(FrequencyCode::from_token("QQ"), None);
        assert_eq!(FrequencyCode::from_token(""), None);
    }
}
