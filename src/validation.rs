//! Input validation for billing operations.
//!
//! Bounded-length, charset-checked validation for identifiers and card
//! fields, so malformed or hostile input is rejected before it reaches the
//! gateway or a log line.

use rust_decimal::Decimal;

use crate::card::CreditCard;
use crate::error::{Error, Result};

/// Maximum length for account ids.
const MAX_ACCOUNT_ID_LENGTH: usize = 256;

/// Maximum length for plan ids.
const MAX_PLAN_ID_LENGTH: usize = 64;

/// Validate a local account id.
///
/// Account ids must be non-empty, at most 256 characters, and contain only
/// alphanumerics, underscores, and hyphens.
pub fn validate_account_id(id: &str) -> Result<()> {
    validate_identifier(id, "account_id", MAX_ACCOUNT_ID_LENGTH)
}

/// Validate a plan id.
///
/// Plan ids must be non-empty, at most 64 characters, and contain only
/// alphanumerics, underscores, and hyphens.
pub fn validate_plan_id(id: &str) -> Result<()> {
    validate_identifier(id, "plan_id", MAX_PLAN_ID_LENGTH)
}

fn validate_identifier(id: &str, field: &str, max_length: usize) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidInput(format!("{field} cannot be empty")));
    }

    if id.len() > max_length {
        return Err(Error::InvalidInput(format!(
            "{field} exceeds maximum length of {max_length}"
        )));
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(Error::InvalidInput(format!(
            "{field} contains invalid characters (only alphanumeric, underscore, and hyphen allowed)"
        )));
    }

    Ok(())
}

/// Validate a lowercase ISO currency code.
pub fn validate_currency(currency: &str) -> Result<()> {
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_lowercase()) {
        return Err(Error::InvalidInput(format!(
            "currency must be a lowercase three-letter ISO code, got '{currency}'"
        )));
    }
    Ok(())
}

/// Validate a tax percentage (0-100 inclusive).
pub fn validate_tax_percent(tax_percent: Decimal) -> Result<()> {
    if tax_percent < Decimal::ZERO || tax_percent > Decimal::ONE_HUNDRED {
        return Err(Error::InvalidInput(format!(
            "tax_percent must be between 0 and 100, got {tax_percent}"
        )));
    }
    Ok(())
}

/// Validate a card's transient fields before tokenization.
///
/// Checks shape only (lengths, digit-ness, expiry ranges); real card
/// verification belongs to the gateway.
pub fn validate_card(card: &CreditCard) -> Result<()> {
    let digits = card.number.len();
    if !(12..=19).contains(&digits) || !card.number.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidInput(
            "card number must be 12-19 digits".to_string(),
        ));
    }

    if !(1..=12).contains(&card.exp_month) {
        return Err(Error::InvalidInput(format!(
            "expiry month must be 1-12, got {}",
            card.exp_month
        )));
    }

    if !(2000..=2100).contains(&card.exp_year) {
        return Err(Error::InvalidInput(format!(
            "expiry year must be four digits, got {}",
            card.exp_year
        )));
    }

    let cvc = card.cvc.len();
    if !(3..=4).contains(&cvc) || !card.cvc.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidInput("cvc must be 3-4 digits".to_string()));
    }

    Ok(())
}
