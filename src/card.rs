//! Payment card value object

use crate::error::ServerError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw card fields as submitted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardOptions {
    pub name: String,
    pub number: String,
    pub expiry: String,
    pub cvc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    #[error("Invalid card number.")]
    InvalidNumber,

    #[error("Invalid CVC.")]
    InvalidCvc,
}

impl CardError {
    /// Name of the field the error refers to
    pub fn field(&self) -> &'static str {
        match self {
            CardError::InvalidNumber => "number",
            CardError::InvalidCvc => "cvc",
        }
    }
}

impl From<CardError> for ServerError {
    fn from(err: CardError) -> Self {
        ServerError::validation(err.to_string()).with_at(vec![err.field().to_string()])
    }
}

/// A validated payment card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub name: String,
    /// Digits only
    pub number: String,
    /// Last day the card is valid; `None` when the submitted expiry could not be read
    pub expiry: Option<NaiveDate>,
    pub cvc: String,
}

impl Card {
    pub fn new(options: CardOptions) -> Result<Self, CardError> {
        let number: String = options.number.chars().filter(char::is_ascii_digit).collect();
        if !luhn(&number) {
            return Err(CardError::InvalidNumber);
        }
        if options.cvc.is_empty() || !options.cvc.chars().all(|c| c.is_ascii_digit()) {
            return Err(CardError::InvalidCvc);
        }
        Ok(Self {
            name: options.name,
            number,
            expiry: parse_expiry(&options.expiry),
            cvc: options.cvc,
        })
    }

    /// Number with all but the last four digits hidden
    pub fn masked(&self) -> String {
        let visible = self.number.len().saturating_sub(4);
        format!("{}{}", "*".repeat(visible), &self.number[visible..])
    }

    /// An unreadable expiry never counts as expired
    pub fn is_expired_at(&self, date: NaiveDate) -> bool {
        self.expiry.is_some_and(|expiry| date > expiry)
    }
}

impl TryFrom<CardOptions> for Card {
    type Error = CardError;

    fn try_from(options: CardOptions) -> Result<Self, Self::Error> {
        Card::new(options)
    }
}

/// Luhn checksum over a string of digits
///
/// Empty input and non-digit characters are invalid.
pub fn luhn(number: &str) -> bool {
    if number.is_empty() {
        return false;
    }

    let mut sum = 0;
    for (i, c) in number.chars().rev().enumerate() {
        let Some(mut digit) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }

    sum % 10 == 0
}

/// Accepts `MM/YY`, `MM/YYYY`, `YYYY-MM` and `YYYY-MM-DD`
///
/// Month-only forms resolve to the last day of that month.
fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    let (year, month) = if let Some((month, year)) = raw.split_once('/') {
        let year: i32 = year.trim().parse().ok()?;
        let year = if year < 100 { 2000 + year } else { year };
        (year, month.trim().parse().ok()?)
    } else {
        let (year, month) = raw.split_once('-')?;
        (year.parse().ok()?, month.parse().ok()?)
    };

    last_day_of_month(year, month)
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    next.pred_opt()
}
