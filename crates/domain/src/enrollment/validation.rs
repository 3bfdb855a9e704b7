//! Validation of enrollment submissions.
//!
//! The same rule set guards the server boundary and is published to form
//! clients through [`ValidationRules`], so both sides agree on what is valid.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::EnrollmentSubmission;
use super::value_objects::{Age, Batch, Name, PhoneNumber};

/// A submitted form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Name,
    Age,
    SelectedBatch,
    PhoneNumber,
}

impl Field {
    /// Returns the wire name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Age => "age",
            Field::SelectedBatch => "selectedBatch",
            Field::PhoneNumber => "phoneNumber",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: Field,
    pub reason: &'static str,
}

impl FieldError {
    pub const NAME_REQUIRED: &'static str = "Name is required";
    pub const AGE_NOT_NUMBER: &'static str = "Age is required and must be a number";
    pub const AGE_NOT_WHOLE: &'static str = "Age must be a whole number";
    pub const AGE_OUT_OF_RANGE: &'static str = "Age must be between 18 and 65";
    pub const BATCH_REQUIRED: &'static str = "Please select a batch";
    pub const BATCH_INVALID: &'static str = "Invalid batch selection";
    pub const PHONE_INVALID: &'static str =
        "Phone number is required and must be a 10-digit number";

    pub fn new(field: Field, reason: &'static str) -> Self {
        Self { field, reason }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Every field that failed validation, in form order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Returns the first failure, the one a form shows when it displays a
    /// single message.
    pub fn first(&self) -> &FieldError {
        // Only constructed by `validate`, which never builds an empty list.
        &self.0[0]
    }

    /// Returns all failures.
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Returns true if the given field failed.
    pub fn contains(&self, field: Field) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Returns the failure reason for a field, if it failed.
    pub fn reason_for(&self, field: Field) -> Option<&'static str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.reason)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid data")?;
        for (i, err) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// An unvalidated submission as it arrives over the wire.
///
/// Each field is kept as raw JSON so that missing or mistyped values become
/// field-level validation failures instead of deserialization errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubmission {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub age: Option<Value>,
    #[serde(default)]
    pub selected_batch: Option<Value>,
    #[serde(default)]
    pub phone_number: Option<Value>,
}

impl RawSubmission {
    /// Builds a submission with all four fields present.
    pub fn new(
        name: impl Into<Value>,
        age: impl Into<Value>,
        selected_batch: impl Into<Value>,
        phone_number: impl Into<Value>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            age: Some(age.into()),
            selected_batch: Some(selected_batch.into()),
            phone_number: Some(phone_number.into()),
        }
    }
}

/// Checks a raw submission against the enrollment rules.
///
/// Every field is checked independently; any failure rejects the whole
/// submission and all failures are reported.
pub fn validate(raw: &RawSubmission) -> Result<EnrollmentSubmission, ValidationErrors> {
    let name = validate_name(raw.name.as_ref());
    let age = validate_age(raw.age.as_ref());
    let batch = validate_batch(raw.selected_batch.as_ref());
    let phone = validate_phone(raw.phone_number.as_ref());

    match (name, age, batch, phone) {
        (Ok(name), Ok(age), Ok(selected_batch), Ok(phone_number)) => Ok(EnrollmentSubmission {
            name,
            age,
            selected_batch,
            phone_number,
        }),
        (name, age, batch, phone) => {
            let errors = [name.err(), age.err(), batch.err(), phone.err()]
                .into_iter()
                .flatten()
                .collect();
            Err(ValidationErrors(errors))
        }
    }
}

fn validate_name(value: Option<&Value>) -> Result<Name, FieldError> {
    match value {
        Some(Value::String(s)) => Name::parse(s),
        _ => Err(FieldError::new(Field::Name, FieldError::NAME_REQUIRED)),
    }
}

fn validate_age(value: Option<&Value>) -> Result<Age, FieldError> {
    let not_a_number = || FieldError::new(Field::Age, FieldError::AGE_NOT_NUMBER);
    match value {
        Some(Value::Number(n)) => {
            if let Some(years) = n.as_i64() {
                Age::new(years)
            } else if n.is_u64() {
                Err(FieldError::new(Field::Age, FieldError::AGE_OUT_OF_RANGE))
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 => Age::new(f as i64),
                    Some(f) if f.is_finite() => {
                        Err(FieldError::new(Field::Age, FieldError::AGE_NOT_WHOLE))
                    }
                    _ => Err(not_a_number()),
                }
            }
        }
        // Form inputs submit numbers as strings.
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| not_a_number())
            .and_then(Age::new),
        _ => Err(not_a_number()),
    }
}

fn validate_batch(value: Option<&Value>) -> Result<Batch, FieldError> {
    match value {
        Some(Value::String(s)) => Batch::parse(s),
        None => Err(FieldError::new(
            Field::SelectedBatch,
            FieldError::BATCH_REQUIRED,
        )),
        Some(_) => Err(FieldError::new(
            Field::SelectedBatch,
            FieldError::BATCH_INVALID,
        )),
    }
}

fn validate_phone(value: Option<&Value>) -> Result<PhoneNumber, FieldError> {
    match value {
        Some(Value::String(s)) => PhoneNumber::parse(s),
        _ => Err(FieldError::new(
            Field::PhoneNumber,
            FieldError::PHONE_INVALID,
        )),
    }
}

/// Machine-readable description of the rule set, served to form clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    pub min_age: u8,
    pub max_age: u8,
    pub batches: Vec<&'static str>,
    pub phone_number_digits: usize,
}

impl ValidationRules {
    /// Returns the rules enforced by [`validate`].
    pub fn current() -> Self {
        Self {
            min_age: Age::MIN,
            max_age: Age::MAX,
            batches: Batch::ALL.iter().map(Batch::as_str).collect(),
            phone_number_digits: PhoneNumber::LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn asha() -> RawSubmission {
        RawSubmission::new("Asha", 30, "6-7AM", "9876543210")
    }

    #[test]
    fn test_valid_submission_passes() {
        let submission = validate(&asha()).unwrap();
        assert_eq!(submission.name.as_str(), "Asha");
        assert_eq!(submission.age.years(), 30);
        assert_eq!(submission.selected_batch, Batch::SixToSevenAm);
        assert_eq!(submission.phone_number.as_str(), "9876543210");
    }

    #[test]
    fn test_age_boundaries() {
        for years in [18, 19, 42, 64, 65] {
            let raw = RawSubmission::new("Asha", years, "6-7AM", "9876543210");
            assert!(validate(&raw).is_ok(), "age {years} should be accepted");
        }
        for years in [-5, 0, 17, 66, 120] {
            let raw = RawSubmission::new("Asha", years, "6-7AM", "9876543210");
            let err = validate(&raw).unwrap_err();
            assert_eq!(
                err.reason_for(Field::Age),
                Some(FieldError::AGE_OUT_OF_RANGE),
                "age {years} should be rejected"
            );
        }
    }

    #[test]
    fn test_age_accepts_numeric_strings_and_whole_floats() {
        let raw = RawSubmission::new("Asha", "30", "6-7AM", "9876543210");
        assert_eq!(validate(&raw).unwrap().age.years(), 30);

        let raw = RawSubmission::new("Asha", 30.0, "6-7AM", "9876543210");
        assert_eq!(validate(&raw).unwrap().age.years(), 30);
    }

    #[test]
    fn test_age_rejects_non_numbers_and_fractions() {
        let raw = RawSubmission::new("Asha", "thirty", "6-7AM", "9876543210");
        assert_eq!(
            validate(&raw).unwrap_err().reason_for(Field::Age),
            Some(FieldError::AGE_NOT_NUMBER)
        );

        let raw = RawSubmission::new("Asha", 30.5, "6-7AM", "9876543210");
        assert_eq!(
            validate(&raw).unwrap_err().reason_for(Field::Age),
            Some(FieldError::AGE_NOT_WHOLE)
        );

        let raw = RawSubmission::new("Asha", json!(true), "6-7AM", "9876543210");
        assert!(validate(&raw).unwrap_err().contains(Field::Age));
    }

    #[test]
    fn test_missing_fields_are_reported_individually() {
        let err = validate(&RawSubmission::default()).unwrap_err();
        let fields: Vec<Field> = err.errors().iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                Field::Name,
                Field::Age,
                Field::SelectedBatch,
                Field::PhoneNumber
            ]
        );
        assert_eq!(err.first().reason, FieldError::NAME_REQUIRED);
        assert_eq!(
            err.reason_for(Field::SelectedBatch),
            Some(FieldError::BATCH_REQUIRED)
        );
    }

    #[test]
    fn test_one_bad_field_rejects_the_submission() {
        let mut raw = asha();
        raw.selected_batch = Some(json!("9-10AM"));
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.first().field, Field::SelectedBatch);
        assert_eq!(err.first().reason, FieldError::BATCH_INVALID);
    }

    #[test]
    fn test_phone_number_must_be_ten_digits() {
        for phone in [
            "987654321",
            "98765432101",
            "98765abcde",
            "",
            "98765-4321",
            " 9876543210 ",
            "9876543210\n",
        ] {
            let raw = RawSubmission::new("Asha", 30, "6-7AM", phone);
            assert!(
                validate(&raw).unwrap_err().contains(Field::PhoneNumber),
                "{phone:?} should be rejected"
            );
        }
        let raw = RawSubmission::new("Asha", 30, "6-7AM", 9876543210_i64);
        assert!(validate(&raw).unwrap_err().contains(Field::PhoneNumber));
    }

    #[test]
    fn test_raw_submission_deserializes_camel_case_and_tolerates_gaps() {
        let raw: RawSubmission =
            serde_json::from_value(json!({ "name": "Asha", "selectedBatch": "5-6PM" })).unwrap();
        assert_eq!(raw.name, Some(json!("Asha")));
        assert_eq!(raw.selected_batch, Some(json!("5-6PM")));
        assert!(raw.age.is_none());

        let raw: RawSubmission = serde_json::from_value(json!({ "age": null })).unwrap();
        assert!(raw.age.is_none());
    }

    #[test]
    fn test_errors_display_lists_every_field() {
        let err = validate(&RawSubmission::new("", 10, "6-7AM", "9876543210")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid data: name: Name is required; age: Age must be between 18 and 65"
        );
    }

    #[test]
    fn test_published_rules_match_enforced_rules() {
        let rules = ValidationRules::current();
        assert_eq!(rules.min_age, 18);
        assert_eq!(rules.max_age, 65);
        assert_eq!(rules.batches, vec!["6-7AM", "7-8AM", "8-9AM", "5-6PM"]);
        assert_eq!(rules.phone_number_digits, 10);

        let json = serde_json::to_value(&rules).unwrap();
        assert_eq!(json["phoneNumberDigits"], 10);
    }
}
