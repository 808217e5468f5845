//! Internal helpers for input validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every operation enforces the same rules before an allocation
//! pass is started.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

pub(crate) const PROJECT_NAME_MIN_CHARS: usize = 5;
pub(crate) const PROJECT_NAME_MAX_CHARS: usize = 100;
pub(crate) const PROJECT_DESCRIPTION_MIN_CHARS: usize = 10;

/// Trim a project name and check its length (in characters).
pub(crate) fn normalize_project_name(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if !(PROJECT_NAME_MIN_CHARS..=PROJECT_NAME_MAX_CHARS).contains(&len) {
        return Err(EngineError::InvalidInput(format!(
            "project name must be {PROJECT_NAME_MIN_CHARS}..={PROJECT_NAME_MAX_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Key under which project names must be unique: NFKC, lowercased.
pub(crate) fn project_name_key(name: &str) -> String {
    name.nfkc().collect::<String>().to_lowercase()
}

pub(crate) fn normalize_description(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.chars().count() < PROJECT_DESCRIPTION_MIN_CHARS {
        return Err(EngineError::InvalidInput(format!(
            "project description must be at least {PROJECT_DESCRIPTION_MIN_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

pub(crate) fn require_positive_amount(amount: i64, label: &str) -> ResultEngine<()> {
    if amount <= 0 {
        return Err(EngineError::InvalidAmount(format!("{label} must be > 0")));
    }
    Ok(())
}

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidInput(format!("invalid {label} id")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed() {
        assert_eq!(normalize_project_name("  Kittens  ").unwrap(), "Kittens");
    }

    #[test]
    fn name_length_counts_chars() {
        assert!(normalize_project_name("Кот").is_err());
        assert!(normalize_project_name("Котики").is_ok());
        assert!(normalize_project_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn name_key_folds_width_and_case() {
        assert_eq!(project_name_key("Ｆｏｏｄ Bank"), project_name_key("food bank"));
    }

    #[test]
    fn short_description_rejected() {
        assert_eq!(
            normalize_description("too short"),
            Err(EngineError::InvalidInput(
                "project description must be at least 10 characters".to_string()
            ))
        );
    }

    #[test]
    fn blank_comment_dropped() {
        assert_eq!(normalize_optional_text(Some("   ")), None);
        assert_eq!(
            normalize_optional_text(Some(" thanks ")),
            Some("thanks".to_string())
        );
    }

    #[test]
    fn zero_amount_rejected() {
        assert!(require_positive_amount(0, "target_amount").is_err());
        assert!(require_positive_amount(1, "target_amount").is_ok());
    }
}
