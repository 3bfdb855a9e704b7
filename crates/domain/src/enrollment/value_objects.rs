//! Value objects for the enrollment domain.
//!
//! Every constructor enforces its rule, so a value of one of these types is
//! always within its domain.

use std::fmt;

use serde::Serialize;

use super::validation::{Field, FieldError};

/// Participant name, stored trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Name(String);

impl Name {
    /// Parses a name, trimming surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FieldError::new(Field::Name, FieldError::NAME_REQUIRED));
        }
        Ok(Self(raw.to_string()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Participant age in whole years, within `[Age::MIN, Age::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Age(u8);

impl Age {
    /// Youngest accepted age.
    pub const MIN: u8 = 18;
    /// Oldest accepted age.
    pub const MAX: u8 = 65;

    /// Creates an age, rejecting values outside the accepted range.
    pub fn new(years: i64) -> Result<Self, FieldError> {
        if years < i64::from(Self::MIN) || years > i64::from(Self::MAX) {
            return Err(FieldError::new(Field::Age, FieldError::AGE_OUT_OF_RANGE));
        }
        // In range, so it fits in a u8.
        Ok(Self(years as u8))
    }

    /// Returns the age in years.
    pub fn years(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fixed set of class time slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Batch {
    #[serde(rename = "6-7AM")]
    SixToSevenAm,
    #[serde(rename = "7-8AM")]
    SevenToEightAm,
    #[serde(rename = "8-9AM")]
    EightToNineAm,
    #[serde(rename = "5-6PM")]
    FiveToSixPm,
}

impl Batch {
    /// All batches in schedule order.
    pub const ALL: [Batch; 4] = [
        Batch::SixToSevenAm,
        Batch::SevenToEightAm,
        Batch::EightToNineAm,
        Batch::FiveToSixPm,
    ];

    /// Returns the slot label, e.g. `"6-7AM"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Batch::SixToSevenAm => "6-7AM",
            Batch::SevenToEightAm => "7-8AM",
            Batch::EightToNineAm => "8-9AM",
            Batch::FiveToSixPm => "5-6PM",
        }
    }

    /// Parses a slot label. Matching is exact.
    pub fn parse(label: &str) -> Result<Self, FieldError> {
        if label.is_empty() {
            return Err(FieldError::new(
                Field::SelectedBatch,
                FieldError::BATCH_REQUIRED,
            ));
        }
        Self::ALL
            .into_iter()
            .find(|batch| batch.as_str() == label)
            .ok_or_else(|| FieldError::new(Field::SelectedBatch, FieldError::BATCH_INVALID))
    }
}

impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ten-digit phone number, the natural key of an enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Required number of digits.
    pub const LEN: usize = 10;

    /// Parses a phone number. The input must be exactly ten ASCII digits,
    /// with nothing around them.
    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        if raw.len() != Self::LEN || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FieldError::new(
                Field::PhoneNumber,
                FieldError::PHONE_INVALID,
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// Returns the digits as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
