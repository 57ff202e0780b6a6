//! Input validation for user-supplied fields.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Empty value where one is required.
    Empty(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Numeric value outside its allowed range.
    OutOfRange { field: String, min: f64, max: f64, actual: f64 },
    /// Value not among the accepted choices.
    InvalidChoice { field: String, value: String },
    /// Latitude given without longitude, or the reverse.
    IncompleteLocation,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::OutOfRange { field, min, max, actual } => {
                write!(f, "{} must be between {} and {} (got {})", field, min, max, actual)
            }
            ValidationError::InvalidChoice { field, value } => {
                write!(f, "'{}' is not a valid {}", value, field)
            }
            ValidationError::IncompleteLocation => {
                write!(f, "latitude and longitude must be given together")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for ping type codes.
pub const MAX_PING_TYPE_LENGTH: usize = 20;

/// Maximum allowed length for ringtone identifiers.
pub const MAX_RINGTONE_LENGTH: usize = 50;

/// Maximum allowed length for handshake replies.
pub const MAX_RESPONSE_LENGTH: usize = 255;

/// Maximum allowed length for availability status and nickname.
pub const MAX_PROFILE_FIELD_LENGTH: usize = 50;

/// Longest check-in timer accepted, in minutes (one week).
pub const MAX_CHECKIN_MINUTES: i64 = 7 * 24 * 60;

/// Decimal places kept for coordinates.
pub const COORDINATE_PRECISION: i32 = 6;

/// Validate a required text field and return it trimmed.
pub fn validate_required(field: &str, value: &str, max: usize) -> Result<String, ValidationError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }

    validate_optional(field, value, max)
}

/// Validate a text field that may be empty and return it trimmed.
pub fn validate_optional(field: &str, value: &str, max: usize) -> Result<String, ValidationError> {
    let value = value.trim();
    let actual = value.chars().count();

    if actual > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
            actual,
        });
    }

    Ok(value.to_string())
}

/// Validate a ping type code and normalize it to lowercase.
pub fn validate_ping_type(ping_type: &str) -> Result<String, ValidationError> {
    validate_required("ping_type", ping_type, MAX_PING_TYPE_LENGTH).map(|t| t.to_lowercase())
}

/// Validate a ping message body. Only the emptiness check trims.
pub fn validate_message(message: &str) -> Result<(), ValidationError> {
    if message.trim().is_empty() {
        return Err(ValidationError::Empty("message".to_string()));
    }
    Ok(())
}

/// Validate a latitude/longitude pair and round it to fixed precision.
///
/// Both must be present or both absent.
pub fn validate_location(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Option<(f64, f64)>, ValidationError> {
    match (latitude, longitude) {
        (None, None) => Ok(None),
        (Some(lat), Some(lon)) => {
            let lat = check_range("latitude", lat, -90.0, 90.0)?;
            let lon = check_range("longitude", lon, -180.0, 180.0)?;
            Ok(Some((round_coordinate(lat), round_coordinate(lon))))
        }
        _ => Err(ValidationError::IncompleteLocation),
    }
}

/// Validate a battery percentage.
pub fn validate_battery_level(level: i64) -> Result<i64, ValidationError> {
    check_range("battery_level", level as f64, 0.0, 100.0).map(|_| level)
}

/// Validate a check-in timer duration in minutes.
pub fn validate_duration_minutes(minutes: i64) -> Result<i64, ValidationError> {
    check_range("duration_minutes", minutes as f64, 1.0, MAX_CHECKIN_MINUTES as f64).map(|_| minutes)
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
            actual: value,
        });
    }
    Ok(value)
}

fn round_coordinate(value: f64) -> f64 {
    let scale = 10f64.powi(COORDINATE_PRECISION);
    (value * scale).round() / scale
}
