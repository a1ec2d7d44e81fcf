//! Assertions over a decoded validation result.

use crate::path::FieldPath;
use crate::record::{ValidationErrorRecord, ValidationResult};
use gauntlet_core::{ErrorCode, HarnessError, HarnessResult};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Write as _;

/// Decoded validation errors with fail-fast expectations.
///
/// Every `expect_*` method panics on the first unmet expectation, naming what
/// was expected and listing every decoded error. Methods return `&Self` so
/// expectations chain.
///
/// # Example
///
/// ```
/// use gauntlet_core::ErrorMeta;
/// use gauntlet_validation::ValidationMatcher;
/// use serde_json::json;
///
/// const REQUIRED: ErrorMeta = ErrorMeta::new(1001, "required");
/// const TOO_LONG: ErrorMeta = ErrorMeta::new(1003, "too long");
///
/// let errors = vec![
///     json!({"code": 1001, "fields": ["title"]}),
///     json!({"code": 1003, "fields": ["tags", "#"], "indexes": [1], "data": {"max": 20}}),
/// ];
///
/// ValidationMatcher::decode(&errors)
///     .expect_field("title", REQUIRED)
///     .expect_field_with_data("tags.1", TOO_LONG, &json!({"max": 20}))
///     .expect_no_errors_on(["tags.0", "body"]);
/// ```
#[derive(Debug, Clone)]
pub struct ValidationMatcher {
    /// Pretty JSON of the errors as produced, kept for diagnostics.
    json: String,
    records: Vec<ValidationErrorRecord>,
}

impl ValidationMatcher {
    /// Decodes the errors of a validation result.
    ///
    /// # Panics
    ///
    /// Panics if the errors cannot be serialized or do not have the expected
    /// shape. Both are mistakes in the test setup.
    #[track_caller]
    pub fn decode<R: ValidationResult + ?Sized>(result: &R) -> Self {
        match Self::try_decode(result) {
            Ok(matcher) => matcher,
            Err(e) => panic!("failed to decode validation result: {e}"),
        }
    }

    /// Decodes the errors of a validation result, returning any decoding error.
    pub fn try_decode<R: ValidationResult + ?Sized>(result: &R) -> HarnessResult<Self> {
        let json = serde_json::to_string_pretty(result.errors())?;
        let values: Vec<Value> = serde_json::from_str(&json)?;

        let records = values
            .into_iter()
            .enumerate()
            .map(|(position, value)| {
                ValidationErrorRecord::from_value(value)
                    .map_err(|e| HarnessError::malformed_record(position, e.to_string()))
            })
            .collect::<HarnessResult<Vec<_>>>()?;

        tracing::debug!(errors = records.len(), "decoded validation result");
        Ok(Self { json, records })
    }

    /// Returns the decoded errors.
    pub fn records(&self) -> &[ValidationErrorRecord] {
        &self.records
    }

    /// Returns the number of decoded errors.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the result carried no errors.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Finds the first error at `field` with `code` and matching `data`.
    ///
    /// `data` must be given in its JSON form. `None` only matches errors
    /// without data.
    pub fn find(
        &self,
        field: &str,
        code: u32,
        data: Option<&Map<String, Value>>,
    ) -> Option<&ValidationErrorRecord> {
        let path = FieldPath::parse(field);
        self.records.iter().find(|record| {
            record.is_at(&path)
                && record.code == code
                && match (&record.data, data) {
                    (None, None) => true,
                    (Some(actual), Some(expected)) => objects_equal(actual, expected),
                    _ => false,
                }
        })
    }

    /// Expects an error at `field` with the code of `meta` and no data.
    ///
    /// `field` is a dotted path; array positions are written as numbers
    /// (`items.2.name`) or as `#` to accept any position.
    ///
    /// # Panics
    ///
    /// Panics if no decoded error matches.
    #[track_caller]
    pub fn expect_field(&self, field: &str, meta: impl ErrorCode) -> &Self {
        self.expect(field, meta.code(), None)
    }

    /// Expects an error at `field` with the code of `meta` carrying `data`.
    ///
    /// `data` is compared after a round trip through JSON, so numbers compare
    /// by value whatever their Rust type.
    ///
    /// # Panics
    ///
    /// Panics if no decoded error matches, or if `data` does not serialize to
    /// a JSON object.
    #[track_caller]
    pub fn expect_field_with_data<D: Serialize + ?Sized>(
        &self,
        field: &str,
        meta: impl ErrorCode,
        data: &D,
    ) -> &Self {
        let data = match serde_json::to_value(data) {
            Ok(Value::Object(map)) => map,
            Ok(other) => panic!("validation data must be a JSON object, got: {other}"),
            Err(e) => panic!("failed to serialize validation data: {e}"),
        };
        self.expect(field, meta.code(), Some(data))
    }

    /// Expects an error that is not attached to any field.
    ///
    /// # Panics
    ///
    /// Panics if no fieldless error with this code (and no data) exists.
    #[track_caller]
    pub fn expect_fieldless(&self, meta: impl ErrorCode) -> &Self {
        self.expect_field("", meta)
    }

    /// Expects a fieldless error carrying `data`.
    ///
    /// # Panics
    ///
    /// Panics if no fieldless error with this code and data exists.
    #[track_caller]
    pub fn expect_fieldless_with_data<D: Serialize + ?Sized>(
        &self,
        meta: impl ErrorCode,
        data: &D,
    ) -> &Self {
        self.expect_field_with_data("", meta, data)
    }

    /// Expects none of `fields` to have an error.
    ///
    /// Fieldless errors are never attributed to a field.
    ///
    /// # Panics
    ///
    /// Panics on the first error found at one of `fields`.
    #[track_caller]
    pub fn expect_no_errors_on<I>(&self, fields: I) -> &Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let paths: Vec<FieldPath> = fields
            .into_iter()
            .map(|field| FieldPath::parse(field.as_ref()))
            .filter(|path| !path.is_fieldless())
            .collect();

        for record in self.records.iter().filter(|r| !r.is_fieldless()) {
            if paths.iter().any(|path| record.is_at(path)) {
                panic!(
                    "Expected no error for field '{}', but got:\n{}",
                    record.location(),
                    record
                );
            }
        }
        self
    }

    #[track_caller]
    fn expect(&self, field: &str, code: u32, data: Option<Map<String, Value>>) -> &Self {
        if self.find(field, code, data.as_ref()).is_some() {
            tracing::trace!(field, code, "validation error matched");
            return self;
        }

        let mut message = String::from("\nexpected validation error:\n");
        if !field.is_empty() {
            let _ = writeln!(message, "  field={field}");
        }
        let _ = writeln!(message, "  code={code}");
        match data {
            Some(data) => {
                let _ = writeln!(message, "  data={}\n", Value::Object(data));
            }
            None => message.push_str("  data=none\n\n"),
        }
        let _ = write!(message, "got: {}", self.json);
        panic!("{message}");
    }
}

/// Deep equality of JSON objects, numbers compared by value.
fn objects_equal(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| values_equal(value, other)))
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x.is_f64() || y.is_f64() {
                x.as_f64() == y.as_f64()
            } else {
                x == y
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => objects_equal(x, y),
        _ => a == b,
    }
}
