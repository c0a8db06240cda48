//! Field validation for product submissions.
//!
//! Request bodies are decoded leniently into a [`ProductSubmission`] and then
//! checked by [`ProductValidator`]. Errors are collected per field, in the fixed
//! order `name` then `price`, and each field is null-checked before its length
//! or range constraint runs.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::value::RawValue;
use serde_json::Value;
use thiserror::Error;

use crate::domain::product::{ProductChanges, ProductDraft};

pub const NOT_NULL_MESSAGE: &str = "This value should not be null.";
pub const POSITIVE_OR_ZERO_MESSAGE: &str = "This value should be either positive or zero.";
pub const NOT_A_NUMBER_MESSAGE: &str = "Please enter a number.";
pub const INVALID_VALUE_MESSAGE: &str = "This value is not valid.";

pub const NAME_FIELD: &str = "name";
pub const PRICE_FIELD: &str = "price";
pub const DEFAULT_NAME_MIN_LENGTH: usize = 5;

/// Ordered mapping from field name to the messages raised for it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Error)]
#[error("validation failed: {}", summarize(.fields))]
pub struct ValidationErrors {
    fields: Vec<(String, Vec<String>)>,
}

fn summarize(fields: &[(String, Vec<String>)]) -> String {
    fields
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message.into()),
            None => self.fields.push((field.to_string(), vec![message.into()])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, messages) in &self.fields {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

/// State of a single submitted field.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FieldInput<T> {
    /// Key not present in the body.
    #[default]
    Absent,
    /// Key present with `null`, or a blank string.
    Null,
    Value(T),
    /// Value could not be converted; carries the message to report.
    Invalid(&'static str),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductSubmission {
    pub name: FieldInput<String>,
    pub price: FieldInput<f64>,
}

impl ProductSubmission {
    /// Decodes a raw request body. Anything that is not a JSON object counts as
    /// an empty submission.
    ///
    /// Fields are decoded one at a time, so a value serde_json cannot represent
    /// (such as `1e400`) fails only its own field.
    pub fn from_json_bytes(body: &[u8]) -> Self {
        let Ok(object) = serde_json::from_slice::<HashMap<String, Box<RawValue>>>(body) else {
            return Self::default();
        };

        Self {
            name: object
                .get(NAME_FIELD)
                .map(|raw| decode_raw(raw, decode_name, INVALID_VALUE_MESSAGE))
                .unwrap_or_default(),
            price: object
                .get(PRICE_FIELD)
                .map(|raw| decode_raw(raw, decode_price, NOT_A_NUMBER_MESSAGE))
                .unwrap_or_default(),
        }
    }

    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        Self {
            name: object.get(NAME_FIELD).map(decode_name).unwrap_or_default(),
            price: object.get(PRICE_FIELD).map(decode_price).unwrap_or_default(),
        }
    }
}

fn decode_raw<T>(
    raw: &RawValue,
    decode: fn(&Value) -> FieldInput<T>,
    unrepresentable: &'static str,
) -> FieldInput<T> {
    match serde_json::from_str::<Value>(raw.get()) {
        Ok(value) => decode(&value),
        Err(_) => FieldInput::Invalid(unrepresentable),
    }
}

fn decode_name(value: &Value) -> FieldInput<String> {
    let raw = match value {
        Value::Null => return FieldInput::Null,
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Array(_) | Value::Object(_) => return FieldInput::Invalid(INVALID_VALUE_MESSAGE),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        FieldInput::Null
    } else {
        FieldInput::Value(trimmed.to_string())
    }
}

fn decode_price(value: &Value) -> FieldInput<f64> {
    match value {
        Value::Null => FieldInput::Null,
        Value::Number(number) => number
            .as_f64()
            .map(FieldInput::Value)
            .unwrap_or(FieldInput::Invalid(NOT_A_NUMBER_MESSAGE)),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return FieldInput::Null;
            }
            match trimmed.parse::<f64>() {
                Ok(price) if price.is_finite() => FieldInput::Value(price),
                _ => FieldInput::Invalid(NOT_A_NUMBER_MESSAGE),
            }
        }
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => {
            FieldInput::Invalid(NOT_A_NUMBER_MESSAGE)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Every field must be supplied (create, replace).
    Full,
    /// Only supplied fields are checked (merge).
    Partial,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductValidator {
    name_min_length: usize,
}

impl Default for ProductValidator {
    fn default() -> Self {
        Self { name_min_length: DEFAULT_NAME_MIN_LENGTH }
    }
}

impl ProductValidator {
    pub fn with_name_min_length(name_min_length: usize) -> Self {
        Self { name_min_length }
    }

    /// Validates a create or full-replace submission.
    pub fn validate_draft(
        &self,
        submission: ProductSubmission,
    ) -> Result<ProductDraft, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let name = self.check_name(submission.name, Mode::Full, &mut errors);
        let price = check_price(submission.price, Mode::Full, &mut errors);

        match (name, price) {
            (Some(name), Some(price)) if errors.is_empty() => Ok(ProductDraft { name, price }),
            _ => Err(errors),
        }
    }

    /// Validates a partial-update submission; absent fields are left alone.
    pub fn validate_changes(
        &self,
        submission: ProductSubmission,
    ) -> Result<ProductChanges, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let name = self.check_name(submission.name, Mode::Partial, &mut errors);
        let price = check_price(submission.price, Mode::Partial, &mut errors);

        if errors.is_empty() {
            Ok(ProductChanges { name, price })
        } else {
            Err(errors)
        }
    }

    fn check_name(
        &self,
        input: FieldInput<String>,
        mode: Mode,
        errors: &mut ValidationErrors,
    ) -> Option<String> {
        let name = required(input, mode, NAME_FIELD, errors)?;

        if name.chars().count() < self.name_min_length {
            errors.add(NAME_FIELD, too_short_message(self.name_min_length));
            return None;
        }

        Some(name)
    }
}

fn check_price(input: FieldInput<f64>, mode: Mode, errors: &mut ValidationErrors) -> Option<f64> {
    let price = required(input, mode, PRICE_FIELD, errors)?;

    if price < 0.0 {
        errors.add(PRICE_FIELD, POSITIVE_OR_ZERO_MESSAGE);
        return None;
    }

    Some(price)
}

fn required<T>(
    input: FieldInput<T>,
    mode: Mode,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<T> {
    match input {
        FieldInput::Value(value) => Some(value),
        FieldInput::Absent if mode == Mode::Partial => None,
        FieldInput::Absent | FieldInput::Null => {
            errors.add(field, NOT_NULL_MESSAGE);
            None
        }
        FieldInput::Invalid(message) => {
            errors.add(field, message);
            None
        }
    }
}

pub fn too_short_message(min_length: usize) -> String {
    let unit = if min_length == 1 { "character" } else { "characters" };
    format!("This value is too short. It should have {min_length} {unit} or more.")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        too_short_message, FieldInput, ProductSubmission, ProductValidator, ValidationErrors,
        INVALID_VALUE_MESSAGE, NOT_A_NUMBER_MESSAGE, NOT_NULL_MESSAGE, POSITIVE_OR_ZERO_MESSAGE,
    };

    fn submission(value: serde_json::Value) -> ProductSubmission {
        ProductSubmission::from_value(&value)
    }

    #[test]
    fn empty_draft_reports_null_for_both_fields_in_order() {
        let errors = ProductValidator::default()
            .validate_draft(submission(json!({})))
            .expect_err("empty submission must fail");

        assert_eq!(
            serde_json::to_string(&errors).expect("serialize"),
            format!(r#"{{"name":["{NOT_NULL_MESSAGE}"],"price":["{NOT_NULL_MESSAGE}"]}}"#)
        );
    }

    #[test]
    fn short_name_and_negative_price_are_both_reported() {
        let errors = ProductValidator::default()
            .validate_draft(submission(json!({"name": "New", "price": -1})))
            .expect_err("invalid submission must fail");

        assert_eq!(errors.get("name"), Some(&[too_short_message(5)][..]));
        assert_eq!(errors.get("price"), Some(&[POSITIVE_OR_ZERO_MESSAGE.to_string()][..]));
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["name", "price"]);
    }

    #[test]
    fn too_short_message_matches_expected_wording() {
        assert_eq!(
            too_short_message(5),
            "This value is too short. It should have 5 characters or more."
        );
        assert_eq!(
            too_short_message(1),
            "This value is too short. It should have 1 character or more."
        );
    }

    #[test]
    fn draft_missing_price_reports_only_price() {
        let errors = ProductValidator::default()
            .validate_draft(submission(json!({"name": "New Product"})))
            .expect_err("missing price must fail");

        assert_eq!(errors.get("name"), None);
        assert_eq!(errors.get("price"), Some(&[NOT_NULL_MESSAGE.to_string()][..]));
    }

    #[test]
    fn valid_draft_passes_and_keeps_values() {
        let draft = ProductValidator::default()
            .validate_draft(submission(json!({"name": "New Product", "price": 9.99})))
            .expect("valid submission");

        assert_eq!(draft.name, "New Product");
        assert_eq!(draft.price, 9.99);
    }

    #[test]
    fn zero_price_is_accepted() {
        let draft = ProductValidator::default()
            .validate_draft(submission(json!({"name": "Free Sample", "price": 0})))
            .expect("zero price is allowed");

        assert_eq!(draft.price, 0.0);
    }

    #[test]
    fn partial_changes_skip_absent_fields() {
        let changes = ProductValidator::default()
            .validate_changes(submission(json!({"name": "Updated Product"})))
            .expect("partial submission");

        assert_eq!(changes.name.as_deref(), Some("Updated Product"));
        assert_eq!(changes.price, None);
    }

    #[test]
    fn partial_changes_validate_supplied_fields_only() {
        let errors = ProductValidator::default()
            .validate_changes(submission(json!({"name": "New"})))
            .expect_err("short name must fail");

        assert_eq!(
            serde_json::to_string(&errors).expect("serialize"),
            r#"{"name":["This value is too short. It should have 5 characters or more."]}"#
        );
    }

    #[test]
    fn explicit_null_fails_even_in_partial_mode() {
        let errors = ProductValidator::default()
            .validate_changes(submission(json!({"price": null})))
            .expect_err("explicit null must fail");

        assert_eq!(errors.get("price"), Some(&[NOT_NULL_MESSAGE.to_string()][..]));
        assert_eq!(errors.get("name"), None);
    }

    #[test]
    fn empty_partial_submission_is_a_no_op() {
        let changes = ProductValidator::default()
            .validate_changes(ProductSubmission::default())
            .expect("nothing to validate");

        assert!(changes.is_empty());
    }

    #[test]
    fn names_are_trimmed_and_counted_in_characters() {
        let validator = ProductValidator::default();

        let errors = validator
            .validate_draft(submission(json!({"name": "  abc   ", "price": 1})))
            .expect_err("trimmed name is too short");
        assert_eq!(errors.get("name"), Some(&[too_short_message(5)][..]));

        let draft = validator
            .validate_draft(submission(json!({"name": "Crème", "price": 1})))
            .expect("five characters even though more than five bytes");
        assert_eq!(draft.name, "Crème");

        let errors = validator
            .validate_draft(submission(json!({"name": "   ", "price": 1})))
            .expect_err("blank name is null");
        assert_eq!(errors.get("name"), Some(&[NOT_NULL_MESSAGE.to_string()][..]));
    }

    #[test]
    fn numeric_strings_are_accepted_for_price() {
        let draft = ProductValidator::default()
            .validate_draft(submission(json!({"name": "New Product", "price": "4.50"})))
            .expect("numeric string price");

        assert_eq!(draft.price, 4.5);
    }

    #[test]
    fn unconvertible_values_report_conversion_messages() {
        let errors = ProductValidator::default()
            .validate_draft(submission(json!({"name": ["a"], "price": "cheap"})))
            .expect_err("conversion failures");

        assert_eq!(errors.get("name"), Some(&[INVALID_VALUE_MESSAGE.to_string()][..]));
        assert_eq!(errors.get("price"), Some(&[NOT_A_NUMBER_MESSAGE.to_string()][..]));
    }

    #[test]
    fn malformed_bodies_decode_as_empty_submissions() {
        assert_eq!(ProductSubmission::from_json_bytes(b""), ProductSubmission::default());
        assert_eq!(ProductSubmission::from_json_bytes(b"{not json"), ProductSubmission::default());
        assert_eq!(ProductSubmission::from_json_bytes(b"[1,2]"), ProductSubmission::default());

        let decoded = ProductSubmission::from_json_bytes(br#"{"name":"Lamp Shade","extra":true}"#);
        assert_eq!(decoded.name, FieldInput::Value("Lamp Shade".to_string()));
        assert_eq!(decoded.price, FieldInput::Absent);
    }

    #[test]
    fn unrepresentable_number_fails_only_its_own_field() {
        let decoded =
            ProductSubmission::from_json_bytes(br#"{"name":"Valid Name","price":1e400}"#);
        assert_eq!(decoded.name, FieldInput::Value("Valid Name".to_string()));
        assert_eq!(decoded.price, FieldInput::Invalid(NOT_A_NUMBER_MESSAGE));

        let decoded = ProductSubmission::from_json_bytes(br#"{"name":1e400,"note":-1e999}"#);
        assert_eq!(decoded.name, FieldInput::Invalid(INVALID_VALUE_MESSAGE));
        assert_eq!(decoded.price, FieldInput::Absent);

        let decoded = ProductSubmission::from_json_bytes(br#"{"name":"Valid Name","note":1e400}"#);
        assert_eq!(decoded.name, FieldInput::Value("Valid Name".to_string()));
    }

    #[test]
    fn configured_minimum_length_is_respected() {
        let validator = ProductValidator::with_name_min_length(3);

        assert!(validator
            .validate_draft(submission(json!({"name": "Pen", "price": 1})))
            .is_ok());
    }

    #[test]
    fn display_summarizes_each_field() {
        let mut errors = ValidationErrors::default();
        errors.add("name", NOT_NULL_MESSAGE);
        errors.add("price", POSITIVE_OR_ZERO_MESSAGE);

        let expected = format!(
            "validation failed: name: {NOT_NULL_MESSAGE}; price: {POSITIVE_OR_ZERO_MESSAGE}"
        );
        assert_eq!(errors.to_string(), expected);
    }
}
