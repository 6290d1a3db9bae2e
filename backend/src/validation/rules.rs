//! Common validation rules shared across request payloads.

use validator::ValidationError;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Passwords must be at least six characters.
pub fn validate_password_length(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::new("password_too_short")
            .with_message("Password must be at least 6 characters long".into()));
    }
    Ok(())
}

/// Prices must be strictly positive.
pub fn validate_price(price: f64) -> Result<(), ValidationError> {
    if !(price.is_finite() && price > 0.0) {
        return Err(ValidationError::new("price_not_positive")
            .with_message("Price must be greater than 0".into()));
    }
    Ok(())
}
