//! Common validation rules shared across request payloads.

use validator::ValidationError;

/// Validates a parking spot label.
///
/// Requirements:
/// - 1-20 characters in length
/// - Only alphanumeric characters, `-` and `_`
pub fn validate_spot_code(spot_code: &str) -> Result<(), ValidationError> {
    let len = spot_code.chars().count();
    if len == 0 || len > 20 {
        return Err(ValidationError::new("spot_code_invalid_length"));
    }

    if !spot_code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::new("spot_code_invalid_characters"));
    }

    Ok(())
}

/// Validates a licence plate.
///
/// Requirements (after trimming):
/// - 2-20 characters in length
/// - Letters (including province characters), digits, `-` and `·`
pub fn validate_plate_number(plate: &str) -> Result<(), ValidationError> {
    let plate = plate.trim();
    let len = plate.chars().count();
    if !(2..=20).contains(&len) {
        return Err(ValidationError::new("plate_number_invalid_length"));
    }

    if !plate
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '·')
    {
        return Err(ValidationError::new("plate_number_invalid_characters"));
    }

    Ok(())
}
