//! # Payment Instrument Checks
//!
//! Format and expiry validation for the card presented when paying an
//! order. Nothing here charges anything: a valid instrument only lets the
//! order move from Pending to Completed.
//!
//! ## Rules
//! ```text
//! card_number  16 digits; spaces and hyphens are ignored
//! expiry       MM/YY, month 01-12, valid through the last day of the month
//! cvc          exactly 3 digits
//! ```
//!
//! Checks run in that order; the first failure is reported.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::error::ValidationError;
use crate::validation::ValidationResult;

const CARD_DIGITS: usize = 16;
const CVC_DIGITS: usize = 3;

/// A card as typed by the customer.
#[derive(Clone, Deserialize)]
pub struct PaymentInstrument {
    pub card_number: String,
    pub expiry: String,
    pub cvc: String,
}

// Keeps card data out of logs.
impl fmt::Debug for PaymentInstrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentInstrument")
            .field("card_number", &format_args!("****{}", self.last4()))
            .field("expiry", &self.expiry)
            .field("cvc", &"***")
            .finish()
    }
}

impl PaymentInstrument {
    pub fn new(
        card_number: impl Into<String>,
        expiry: impl Into<String>,
        cvc: impl Into<String>,
    ) -> Self {
        PaymentInstrument {
            card_number: card_number.into(),
            expiry: expiry.into(),
            cvc: cvc.into(),
        }
    }

    /// Validates number, expiry (against `today`) and CVC.
    pub fn validate(&self, today: NaiveDate) -> ValidationResult<()> {
        validate_card_number(&self.card_number)?;
        validate_expiry(&self.expiry, today)?;
        validate_cvc(&self.cvc)?;
        Ok(())
    }

    /// Last four digits of the card number, for receipts and logs.
    pub fn last4(&self) -> String {
        let digits: Vec<char> = self
            .card_number
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        let start = digits.len().saturating_sub(4);
        digits[start..].iter().collect()
    }
}

fn validate_card_number(number: &str) -> ValidationResult<()> {
    let compact: String = number
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect();

    if compact.is_empty() {
        return Err(ValidationError::Required {
            field: "card_number".to_string(),
        });
    }

    if compact.len() != CARD_DIGITS || !compact.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "card_number".to_string(),
            reason: format!("must be {CARD_DIGITS} digits"),
        });
    }

    Ok(())
}

/// Parses `MM/YY` into (year, month).
fn parse_expiry(expiry: &str) -> Option<(i32, u32)> {
    let (mm, yy) = expiry.trim().split_once('/')?;
    if mm.len() != 2 || yy.len() != 2 {
        return None;
    }
    if !mm.chars().chain(yy.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    let month: u32 = mm.parse().ok()?;
    let year: i32 = yy.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }

    Some((2000 + year, month))
}

fn validate_expiry(expiry: &str, today: NaiveDate) -> ValidationResult<()> {
    if expiry.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "expiry".to_string(),
        });
    }

    let (year, month) = parse_expiry(expiry).ok_or_else(|| ValidationError::InvalidFormat {
        field: "expiry".to_string(),
        reason: "must be MM/YY".to_string(),
    })?;

    if (year, month) < (today.year(), today.month()) {
        return Err(ValidationError::Expired {
            field: "expiry".to_string(),
        });
    }

    Ok(())
}

fn validate_cvc(cvc: &str) -> ValidationResult<()> {
    if cvc.len() != CVC_DIGITS || !cvc.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "cvc".to_string(),
            reason: format!("must be {CVC_DIGITS} digits"),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn june_2024() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_valid_instrument() {
        let card = PaymentInstrument::new("4242 4242 4242 4242", "12/26", "123");
        assert!(card.validate(june_2024()).is_ok());

        let hyphenated = PaymentInstrument::new("4242-4242-4242-4242", "06/24", "123");
        assert!(hyphenated.validate(june_2024()).is_ok());
    }

    #[test]
    fn test_card_number_rules() {
        for bad in ["", "4242", "4242 4242 4242 424X", "42424242424242424242"] {
            let card = PaymentInstrument::new(bad, "12/26", "123");
            assert!(card.validate(june_2024()).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_expiry_rules() {
        let expired = PaymentInstrument::new("4242424242424242", "05/24", "123");
        assert!(matches!(
            expired.validate(june_2024()),
            Err(ValidationError::Expired { .. })
        ));

        for bad in ["13/26", "00/26", "1/26", "12-26", "ab/cd", ""] {
            let card = PaymentInstrument::new("4242424242424242", bad, "123");
            assert!(card.validate(june_2024()).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_cvc_rules() {
        for bad in ["", "12", "1234", "12a"] {
            let card = PaymentInstrument::new("4242424242424242", "12/26", bad);
            assert!(card.validate(june_2024()).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_debug_masks_card() {
        let card = PaymentInstrument::new("4242 4242 4242 1881", "12/26", "987");
        let printed = format!("{card:?}");
        assert!(printed.contains("****1881"));
        assert!(!printed.contains("987"));
        assert!(!printed.contains("4242 4242"));
    }
}
