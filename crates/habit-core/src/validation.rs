//! Input validation for habit and user fields.

use std::fmt;

use chrono_tz::Tz;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Empty value where one is required.
    Empty(String),
    /// Target days must be a positive number.
    InvalidTargetDays(i64),
    /// Not an IANA timezone name.
    InvalidTimezone(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::InvalidTargetDays(days) => {
                write!(f, "target_days must be greater than 0 (got {})", days)
            }
            ValidationError::InvalidTimezone(tz) => write!(f, "Unknown timezone: {}", tz),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for habit names.
pub const MAX_HABIT_NAME_LENGTH: usize = 255;

/// Maximum allowed length for habit descriptions.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Validate and normalise a habit name.
pub fn validate_habit_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Empty("name".to_string()));
    }

    let len = name.chars().count();
    if len > MAX_HABIT_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_HABIT_NAME_LENGTH,
            actual: len,
        });
    }

    Ok(name.to_string())
}

/// Validate an optional description; blank descriptions become `None`.
pub fn validate_description(description: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };

    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LENGTH,
            actual: len,
        });
    }

    Ok(Some(description.to_string()))
}

/// Validate the number of days needed to form a habit.
pub fn validate_target_days(days: i64) -> Result<i64, ValidationError> {
    if days <= 0 {
        return Err(ValidationError::InvalidTargetDays(days));
    }
    Ok(days)
}

/// Validate an IANA timezone name submitted by a user.
///
/// Unlike [`resolve_zone`](crate::resolve_zone), user input is rejected
/// rather than silently replaced with UTC.
pub fn validate_timezone(timezone: &str) -> Result<String, ValidationError> {
    let timezone = timezone.trim();

    if timezone.is_empty() {
        return Err(ValidationError::Empty("timezone".to_string()));
    }

    timezone
        .parse::<Tz>()
        .map(|tz| tz.name().to_string())
        .map_err(|_| ValidationError::InvalidTimezone(timezone.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_habit_name_trimmed() {
        assert_eq!(validate_habit_name("  Read  ").unwrap(), "Read");
    }

    #[test]
    fn test_habit_name_empty() {
        assert_eq!(
            validate_habit_name("   "),
            Err(ValidationError::Empty("name".to_string()))
        );
    }

    #[test]
    fn test_habit_name_too_long() {
        let name = "x".repeat(MAX_HABIT_NAME_LENGTH + 1);
        assert!(matches!(
            validate_habit_name(&name),
            Err(ValidationError::TooLong { actual: 256, .. })
        ));
    }

    #[test]
    fn test_blank_description_is_none() {
        assert_eq!(validate_description(Some("  ")).unwrap(), None);
        assert_eq!(validate_description(None).unwrap(), None);
    }

    #[test]
    fn test_target_days() {
        assert_eq!(validate_target_days(21), Ok(21));
        assert_eq!(
            validate_target_days(0),
            Err(ValidationError::InvalidTargetDays(0))
        );
    }

    #[test]
    fn test_timezone() {
        assert_eq!(validate_timezone("Europe/Moscow").unwrap(), "Europe/Moscow");
        assert!(matches!(
            validate_timezone("Europe/Atlantis"),
            Err(ValidationError::InvalidTimezone(_))
        ));
        let err = validate_timezone("Europe/Atlantis").unwrap_err();
        assert_eq!(err.to_string(), "Unknown timezone: Europe/Atlantis");
    }
}
