//! Boundary parsing for form input.
//!
//! # Responsibility
//! - Turn raw form text into the typed fields `NewIdea`/`NewTask` expect.
//! - Apply the blank-field defaults for budget and timeline.
//!
//! # Invariants
//! - The store never calls into this module; it trusts its callers.
//! - List splitting keeps entry order and drops blank entries.

use crate::model::idea::{DEFAULT_BUDGET, DEFAULT_TIMELINE_MONTHS};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from parsing raw form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    InvalidBudget(String),
    InvalidTimeline(String),
    UnknownStage(String),
    UnknownStatus(String),
    UnknownPriority(String),
}

impl Display for InputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBudget(raw) => {
                write!(f, "budget must be a non-negative number, got `{raw}`")
            }
            Self::InvalidTimeline(raw) => {
                write!(f, "timeline must be a whole number of months, got `{raw}`")
            }
            Self::UnknownStage(raw) => write!(f, "unknown idea stage: `{raw}`"),
            Self::UnknownStatus(raw) => write!(f, "unknown task status: `{raw}`"),
            Self::UnknownPriority(raw) => write!(f, "unknown task priority: `{raw}`"),
        }
    }
}

impl Error for InputError {}

/// Splits a comma-separated field into trimmed, non-empty entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses the budget field; blank input yields the default of 0.
pub fn parse_budget(raw: &str) -> Result<f64, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_BUDGET);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(InputError::InvalidBudget(raw.to_string())),
    }
}

/// Parses the timeline field in months; blank input yields the default of 6.
pub fn parse_timeline(raw: &str) -> Result<u32, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_TIMELINE_MONTHS);
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| InputError::InvalidTimeline(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{parse_budget, parse_timeline, split_list, InputError};

    #[test]
    fn split_list_trims_and_drops_blanks() {
        assert_eq!(
            split_list(" alice, bob ,, carol ,"),
            vec!["alice", "bob", "carol"]
        );
        assert!(split_list("  ").is_empty());
    }

    #[test]
    fn blank_numbers_fall_back_to_defaults() {
        assert_eq!(parse_budget("").unwrap(), 0.0);
        assert_eq!(parse_timeline("   ").unwrap(), 6);
    }

    #[test]
    fn numbers_are_parsed_and_validated() {
        assert_eq!(parse_budget("2500.50").unwrap(), 2500.5);
        assert_eq!(parse_timeline("18").unwrap(), 18);
        assert_eq!(
            parse_budget("-1"),
            Err(InputError::InvalidBudget("-1".to_string()))
        );
        assert!(parse_budget("NaN").is_err());
        assert!(parse_timeline("1.5").is_err());
    }
}
