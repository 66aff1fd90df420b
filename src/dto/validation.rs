//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::clock::parse_date;

/// Validates a `YYYY-MM-DD` calendar date.
///
/// ```ignore
/// validate_calendar_date("2025-01-10") // Ok
/// validate_calendar_date("2025-02-30") // Err - no such day
/// validate_calendar_date("10/01/2025") // Err - wrong layout
/// ```
pub fn validate_calendar_date(value: &str) -> Result<(), ValidationError> {
    parse_date(value).map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("calendar_date");
        err.message = Some(format!("`{value}` is not a YYYY-MM-DD date").into());
        err
    })
}

/// Validates a voucher code: 3 to 32 ASCII letters, digits, `-` or `_`.
pub fn validate_voucher_code(code: &str) -> Result<(), ValidationError> {
    let code = code.trim();
    if !(3..=32).contains(&code.len()) {
        let mut err = ValidationError::new("voucher_code_length");
        err.message = Some(
            format!("Voucher code must be 3 to 32 characters (got {})", code.len()).into(),
        );
        return Err(err);
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        let mut err = ValidationError::new("voucher_code_format");
        err.message = Some("Voucher code may only contain letters, digits, '-' and '_'".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a phone number: an optional leading `+` followed by 8 to 15 digits, spaces allowed.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    let valid_chars = digits.chars().all(|c| c.is_ascii_digit() || c == ' ');
    let count = digits.chars().filter(char::is_ascii_digit).count();
    if valid_chars && (8..=15).contains(&count) {
        return Ok(());
    }

    let mut err = ValidationError::new("phone_format");
    err.message = Some("Phone number must contain 8 to 15 digits".into());
    Err(err)
}
