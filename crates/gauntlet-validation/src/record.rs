//! Decoded validation errors.

use crate::path::{FieldPath, WILDCARD};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A type that can list the structured errors it carries.
///
/// Implemented by the validation result of the system under test. Each error
/// must serialize to an object with a numeric `code` and, optionally, its
/// location (`fields` as segments or `field` as a dotted string), the
/// `indexes` filling the `#` segments, and a `data` object.
///
/// # Example
///
/// ```
/// use gauntlet_validation::ValidationResult;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Invalid {
///     code: u32,
///     fields: Vec<&'static str>,
/// }
///
/// struct Outcome {
///     errors: Vec<Invalid>,
/// }
///
/// impl ValidationResult for Outcome {
///     type Error = Invalid;
///
///     fn errors(&self) -> &[Invalid] {
///         &self.errors
///     }
/// }
/// ```
pub trait ValidationResult {
    /// Type of one structured error.
    type Error: Serialize;

    /// Returns the errors collected by the validation.
    fn errors(&self) -> &[Self::Error];
}

impl<T: Serialize> ValidationResult for [T] {
    type Error = T;

    fn errors(&self) -> &[T] {
        self
    }
}

impl<T: Serialize> ValidationResult for Vec<T> {
    type Error = T;

    fn errors(&self) -> &[T] {
        self
    }
}

impl<T: Serialize, const N: usize> ValidationResult for [T; N] {
    type Error = T;

    fn errors(&self) -> &[T] {
        self
    }
}

/// One validation error in normalized form.
///
/// `fields` is empty for fieldless errors. Every `#` in `fields` has exactly
/// one matching entry in `indexes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct ValidationErrorRecord {
    /// Error-kind code.
    pub code: u32,
    /// Field segments, with `#` marking array positions.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    /// Concrete array positions, one per `#` in `fields`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<usize>,
    /// Extra details attached to the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl ValidationErrorRecord {
    /// Decodes a record from a JSON value.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Returns true if the error is not attached to any field.
    pub fn is_fieldless(&self) -> bool {
        self.fields.is_empty()
    }

    /// Compares the record's location with an expected path.
    pub fn is_at(&self, path: &FieldPath) -> bool {
        path.matches(&self.fields, &self.indexes)
    }

    /// Returns the concrete dotted location, indexes substituted for wildcards.
    ///
    /// ```
    /// use gauntlet_validation::ValidationErrorRecord;
    /// use serde_json::json;
    ///
    /// let record = ValidationErrorRecord::from_value(json!({
    ///     "code": 1,
    ///     "fields": ["items", "#", "name"],
    ///     "indexes": [3],
    /// })).unwrap();
    /// assert_eq!(record.location(), "items.3.name");
    /// ```
    pub fn location(&self) -> String {
        let mut indexes = self.indexes.iter();
        self.fields
            .iter()
            .map(|segment| {
                if segment == WILDCARD {
                    if let Some(index) = indexes.next() {
                        return index.to_string();
                    }
                }
                segment.clone()
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for ValidationErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_fieldless() {
            write!(f, "code={}", self.code)?;
        } else {
            write!(f, "field={} code={}", self.location(), self.code)?;
        }
        if let Some(data) = &self.data {
            write!(f, " data={}", Value::Object(data.clone()))?;
        }
        Ok(())
    }
}

/// Location as sent on the wire: either segments or a dotted string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Location {
    Dotted(String),
    Segments(Vec<String>),
}

impl Location {
    fn into_segments(self) -> Vec<String> {
        match self {
            Self::Dotted(path) if path.is_empty() => Vec::new(),
            Self::Dotted(path) => path.split('.').map(ToString::to_string).collect(),
            Self::Segments(segments) => segments,
        }
    }
}

#[derive(Deserialize)]
struct RawRecord {
    code: u32,
    #[serde(default)]
    field: Option<Location>,
    #[serde(default)]
    fields: Option<Location>,
    #[serde(default)]
    indexes: Option<Vec<usize>>,
    #[serde(default)]
    data: Option<Map<String, Value>>,
}

impl TryFrom<RawRecord> for ValidationErrorRecord {
    type Error = String;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let fields = raw
            .fields
            .or(raw.field)
            .map(Location::into_segments)
            .unwrap_or_default();
        let indexes = raw.indexes.unwrap_or_default();

        let wildcards = fields.iter().filter(|s| *s == WILDCARD).count();
        if wildcards != indexes.len() {
            return Err(format!(
                "{wildcards} wildcard segment(s) in {fields:?} but {} index(es) {indexes:?}",
                indexes.len()
            ));
        }

        Ok(Self {
            code: raw.code,
            fields,
            indexes,
            data: raw.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_segments() {
        let record = ValidationErrorRecord::from_value(json!({
            "code": 1002,
            "fields": ["items", "#", "name"],
            "indexes": [2],
            "error": "required",
        }))
        .unwrap();

        assert_eq!(record.code, 1002);
        assert_eq!(record.fields, vec!["items", "#", "name"]);
        assert_eq!(record.indexes, vec![2]);
        assert!(record.data.is_none());
        assert!(record.is_at(&FieldPath::parse("items.2.name")));
    }

    #[test]
    fn test_decode_dotted_field() {
        let record =
            ValidationErrorRecord::from_value(json!({"code": 5, "field": "user.email"})).unwrap();
        assert_eq!(record.fields, vec!["user", "email"]);
        assert_eq!(record.location(), "user.email");
    }

    #[test]
    fn test_fields_wins_over_field() {
        let record = ValidationErrorRecord::from_value(json!({
            "code": 5,
            "field": "ignored",
            "fields": ["tags", "#"],
            "indexes": [0],
        }))
        .unwrap();
        assert_eq!(record.location(), "tags.0");
    }

    #[test]
    fn test_decode_fieldless() {
        let record = ValidationErrorRecord::from_value(json!({"code": 9, "fields": null})).unwrap();
        assert!(record.is_fieldless());
        assert!(record.is_at(&FieldPath::fieldless()));

        let record = ValidationErrorRecord::from_value(json!({"code": 9, "field": ""})).unwrap();
        assert!(record.is_fieldless());
    }

    #[test]
    fn test_decode_data() {
        let record =
            ValidationErrorRecord::from_value(json!({"code": 3, "data": {"max": 10}})).unwrap();
        assert_eq!(record.data.unwrap()["max"], 10);
    }

    #[test]
    fn test_wildcard_index_count_mismatch() {
        let err = ValidationErrorRecord::from_value(json!({
            "code": 1,
            "fields": ["a", "#", "b", "#"],
            "indexes": [1],
        }))
        .unwrap_err();
        assert!(err.to_string().contains("2 wildcard segment(s)"));
    }

    #[test]
    fn test_missing_code() {
        assert!(ValidationErrorRecord::from_value(json!({"fields": ["a"]})).is_err());
    }

    #[test]
    fn test_display() {
        let record = ValidationErrorRecord::from_value(json!({
            "code": 4,
            "fields": ["items", "#"],
            "indexes": [1],
            "data": {"min": 2},
        }))
        .unwrap();
        assert_eq!(record.to_string(), "field=items.1 code=4 data={\"min\":2}");
    }

    #[test]
    fn test_slice_result() {
        let errors = [json!({"code": 1})];
        assert_eq!(errors.errors().len(), 1);
        assert_eq!(errors.to_vec().errors().len(), 1);
    }
}
