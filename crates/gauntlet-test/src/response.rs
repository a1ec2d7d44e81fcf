//! Captured responses and the assertions made on them.

use crate::writer::{title_case, ResponseWriter, WriteResponse};
use bytes::Bytes;
use gauntlet_config::ValidationConfig;
use gauntlet_core::{wire, HarnessError, HarnessResult};
use gauntlet_validation::{ValidationErrorRecord, ValidationMatcher};
use http::{header, HeaderMap, StatusCode};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Field-keyed validation errors, in encounter order.
pub type ValidationLookup = IndexMap<String, Vec<ValidationErrorRecord>>;

/// A response produced by a handler under test, decoded for assertions.
///
/// The body is parsed as JSON on a best-effort basis. When the response is a
/// validation failure (status `400` with body code `2004` under the default
/// configuration) its `invalid` array is additionally grouped by field.
///
/// Assertions panic on mismatch and return `&Self`, so they chain:
///
/// ```
/// use gauntlet_test::{req, ResponseWriter, SyntheticRequest};
/// use http::StatusCode;
/// use serde_json::json;
///
/// let response = req().post(|_: &SyntheticRequest, res: &mut ResponseWriter| {
///     res.json(
///         StatusCode::BAD_REQUEST,
///         &json!({"code": 2004, "invalid": [{"field": "name", "code": 1001}]}),
///     )
///     .unwrap();
/// });
///
/// response
///     .expect_invalid()
///     .expect_validation([("name", 1001)])
///     .expect_no_validation(["email"]);
/// ```
pub struct CapturedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    json: Option<Value>,
    invalid: Vec<Value>,
    validations: Option<ValidationLookup>,
    config: ValidationConfig,
    error: Option<anyhow::Error>,
}

impl CapturedResponse {
    /// Decodes what a handler wrote, under the default validation convention.
    pub fn decode(writer: ResponseWriter) -> Self {
        Self::decode_with(writer, ValidationConfig::default())
    }

    /// Decodes what a handler wrote, under the given validation convention.
    pub fn decode_with(writer: ResponseWriter, config: ValidationConfig) -> Self {
        let (status, headers, body) = writer.into_parts();
        Self::from_parts(status, headers, body, config)
    }

    /// Decodes an `http::Response`.
    pub fn from_http<B: Into<Bytes>>(response: http::Response<B>) -> Self {
        Self::from_http_with(response, ValidationConfig::default())
    }

    /// Decodes an `http::Response` under the given validation convention.
    pub fn from_http_with<B: Into<Bytes>>(
        response: http::Response<B>,
        config: ValidationConfig,
    ) -> Self {
        let (parts, body) = response.into_parts();
        Self::from_parts(parts.status, parts.headers, body.into(), config)
    }

    /// Decodes a handler return value directly, without dispatching a request.
    ///
    /// ```
    /// use gauntlet_core::ErrorMeta;
    /// use gauntlet_test::{CapturedResponse, JsonResponse};
    /// use http::StatusCode;
    ///
    /// const MISSING: ErrorMeta = ErrorMeta::new(3004, "widget not found");
    ///
    /// CapturedResponse::from_response(JsonResponse::error(StatusCode::NOT_FOUND, MISSING))
    ///     .expect_not_found_with(MISSING.code);
    /// ```
    pub fn from_response<R: WriteResponse>(response: R) -> Self {
        let mut writer = ResponseWriter::new();
        response.write_to(&mut writer);
        Self::decode(writer)
    }

    pub(crate) fn with_error(mut self, error: anyhow::Error) -> Self {
        self.error = Some(error);
        self
    }

    fn from_parts(
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
        config: ValidationConfig,
    ) -> Self {
        let json: Option<Value> = serde_json::from_slice(&body).ok();

        let is_validation_failure = status.as_u16() == config.status
            && json.as_ref().and_then(body_code) == Some(u64::from(config.failed_code));

        let (invalid, validations) = if is_validation_failure {
            let invalid = json
                .as_ref()
                .and_then(|json| json.get(wire::INVALID_KEY))
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let lookup = group_by_field(&invalid);
            (invalid, Some(lookup))
        } else {
            (Vec::new(), None)
        };

        Self {
            status,
            headers,
            body,
            json,
            invalid,
            validations,
            config,
            error: None,
        }
    }

    /// Returns the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as a u16.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Gets a header value by name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the headers with title-cased names (`Content-Type`).
    ///
    /// Values that are not visible ASCII are decoded lossily.
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .map(|(name, value)| {
                (
                    title_case(name),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }

    /// Returns the Content-Type header value.
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    pub fn text(&self) -> HarnessResult<&str> {
        std::str::from_utf8(&self.body)
            .map_err(|e| HarnessError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Returns the body as JSON, if it parsed.
    pub fn json_body(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Returns the body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON.
    #[track_caller]
    pub fn json(&self) -> &Value {
        match &self.json {
            Some(json) => json,
            None => panic!(
                "Expect a JSON body, got: {}",
                String::from_utf8_lossy(&self.body)
            ),
        }
    }

    /// Deserializes the body.
    pub fn parse_json<T: DeserializeOwned>(&self) -> HarnessResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Returns true if the response is a validation failure.
    pub fn is_validation_failure(&self) -> bool {
        self.validations.is_some()
    }

    /// Returns the validation errors grouped by field, if the response is a
    /// validation failure. Errors without a field are grouped under `""`.
    pub fn validations(&self) -> Option<&ValidationLookup> {
        self.validations.as_ref()
    }

    /// Returns the validation errors reported for `field`.
    pub fn validation_errors(&self, field: &str) -> &[ValidationErrorRecord] {
        self.validations
            .as_ref()
            .and_then(|lookup| lookup.get(field))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Builds a [`ValidationMatcher`] over the `invalid` array, for path and
    /// data matching.
    ///
    /// The matcher is empty unless the response is a validation failure.
    ///
    /// # Panics
    ///
    /// Panics if an entry of the `invalid` array is malformed.
    #[track_caller]
    pub fn validation(&self) -> ValidationMatcher {
        ValidationMatcher::decode(&self.invalid)
    }

    /// Returns the error returned by the handler, if any.
    pub fn error(&self) -> Option<&anyhow::Error> {
        self.error.as_ref()
    }

    /// Asserts a `200`, `201` or `204` status.
    #[track_caller]
    pub fn ok(&self) -> &Self {
        if !matches!(
            self.status,
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT
        ) {
            panic!(
                "Expect 200/201/204 status code, got: {}\n{}",
                self.status,
                self.describe_body()
            );
        }
        self
    }

    /// Asserts the status code.
    #[track_caller]
    pub fn expect_status(&self, expected: StatusCode) -> &Self {
        if self.status != expected {
            panic!(
                "Expect {} status code, got: {}\n{}",
                expected,
                self.status,
                self.describe_body()
            );
        }
        self
    }

    /// Asserts the top-level `code` of the JSON body.
    #[track_caller]
    pub fn expect_code(&self, expected: u32) -> &Self {
        let actual = self.json.as_ref().and_then(body_code);
        if actual != Some(u64::from(expected)) {
            panic!(
                "Expect body code {}, got: {}\n{}",
                expected,
                actual.map_or_else(|| "none".to_string(), |code| code.to_string()),
                self.describe_body()
            );
        }
        self
    }

    /// Asserts a `404` status.
    #[track_caller]
    pub fn expect_not_found(&self) -> &Self {
        self.expect_status(StatusCode::NOT_FOUND)
    }

    /// Asserts a `404` status with the given body code.
    #[track_caller]
    pub fn expect_not_found_with(&self, code: u32) -> &Self {
        self.expect_not_found().expect_code(code)
    }

    /// Asserts a `401` status.
    #[track_caller]
    pub fn expect_not_authorized(&self) -> &Self {
        self.expect_status(StatusCode::UNAUTHORIZED)
    }

    /// Asserts a `401` status with the given body code.
    #[track_caller]
    pub fn expect_not_authorized_with(&self, code: u32) -> &Self {
        self.expect_not_authorized().expect_code(code)
    }

    /// Asserts a `400` status.
    #[track_caller]
    pub fn expect_invalid(&self) -> &Self {
        self.expect_status(StatusCode::BAD_REQUEST)
    }

    /// Asserts a `400` status with the given body code.
    #[track_caller]
    pub fn expect_invalid_with(&self, code: u32) -> &Self {
        self.expect_invalid().expect_code(code)
    }

    /// Asserts a validation failure carrying, for each `(field, code)` pair,
    /// at least one error on `field` with `code`.
    ///
    /// Every pair is checked before failing; the panic message lists all of
    /// the unmet ones.
    #[track_caller]
    pub fn expect_validation<I, S>(&self, expected: I) -> &Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let lookup = self.require_validation_failure();

        let mut failures = Vec::new();
        for (field, code) in expected {
            let field = field.as_ref();
            match lookup.get(field) {
                None => failures.push(format!("No validation error for field '{field}'")),
                Some(records) if records.iter().any(|r| r.code == code) => {}
                Some(records) => {
                    let actual = records
                        .iter()
                        .map(|r| r.code.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    failures.push(format!(
                        "Expect validation code for field '{field}' to be {code}, got {actual}"
                    ));
                }
            }
        }

        if !failures.is_empty() {
            panic!("{}\n{}", failures.join("\n"), self.describe_body());
        }
        self
    }

    /// Asserts that none of `fields` has a validation error.
    ///
    /// Passes when the response is not a validation failure at all.
    #[track_caller]
    pub fn expect_no_validation<I>(&self, fields: I) -> &Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let Some(lookup) = &self.validations else {
            return self;
        };

        let failures: Vec<String> = fields
            .into_iter()
            .filter(|field| lookup.contains_key(field.as_ref()))
            .map(|field| format!("Did not expect an error for field: '{}'", field.as_ref()))
            .collect();

        if !failures.is_empty() {
            panic!("{}\n{}", failures.join("\n"), self.describe_body());
        }
        self
    }

    /// Asserts a header value. The name is matched case-insensitively.
    #[track_caller]
    pub fn expect_header(&self, name: &str, expected: &str) -> &Self {
        match self.header(name) {
            Some(actual) if actual == expected => self,
            Some(actual) => panic!(
                "Header '{}': expected '{}', got '{}'",
                title_case_str(name),
                expected,
                actual
            ),
            None => panic!("Header '{}' not found", title_case_str(name)),
        }
    }

    /// Asserts that the JSON value at a dotted path equals `expected`.
    ///
    /// Numeric segments index into arrays: `items.0.name`.
    #[track_caller]
    pub fn assert_json_field(&self, path: &str, expected: &Value) -> &Self {
        let json = self.json();
        match json_path(json, path) {
            Some(actual) if actual == expected => self,
            Some(actual) => panic!(
                "JSON field '{}': expected {}, got {}",
                path, expected, actual
            ),
            None => panic!("JSON path '{}' not found in: {}", path, json),
        }
    }

    /// Prints status, headers and body to the test output.
    pub fn inspect(&self) -> &Self {
        println!("{}", self.status);
        for (name, value) in self.header_pairs() {
            println!("{name}: {value}");
        }
        println!("\n{}", self.describe_body());
        self
    }

    #[track_caller]
    fn require_validation_failure(&self) -> &ValidationLookup {
        match &self.validations {
            Some(lookup) => lookup,
            None => panic!(
                "Expect a validation failure ({} status code, body code {}), got: {}\n{}",
                self.config.status,
                self.config.failed_code,
                self.status,
                self.describe_body()
            ),
        }
    }

    fn describe_body(&self) -> String {
        match &self.json {
            Some(json) => serde_json::to_string_pretty(json)
                .unwrap_or_else(|_| String::from_utf8_lossy(&self.body).into_owned()),
            None => String::from_utf8_lossy(&self.body).into_owned(),
        }
    }
}

impl fmt::Debug for CapturedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .field("validation_failure", &self.validations.is_some())
            .field("error", &self.error)
            .finish()
    }
}

fn body_code(json: &Value) -> Option<u64> {
    json.get(wire::CODE_KEY).and_then(Value::as_u64)
}

/// Groups `invalid` entries by their `field` string, skipping entries that
/// do not decode.
/// Groups raw `invalid` entries by their `field` string.
///
/// Only `code` is required here. Wildcard/index agreement and the shape of
/// `data` are checked by [`CapturedResponse::validation`] instead.
fn group_by_field(invalid: &[Value]) -> ValidationLookup {
    let mut lookup = ValidationLookup::new();
    for (position, entry) in invalid.iter().enumerate() {
        let Some(record) = lenient_record(entry) else {
            tracing::warn!(position, entry = %entry, "skipping validation error without a code");
            continue;
        };
        let field = entry
            .get(wire::FIELD_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        lookup.entry(field).or_default().push(record);
    }
    lookup
}

fn lenient_record(entry: &Value) -> Option<ValidationErrorRecord> {
    let code = entry
        .get(wire::CODE_KEY)
        .and_then(Value::as_u64)
        .and_then(|code| u32::try_from(code).ok())?;
    let fields = entry
        .get(wire::FIELD_KEY)
        .and_then(Value::as_str)
        .filter(|field| !field.is_empty())
        .map(|field| field.split('.').map(ToString::to_string).collect())
        .unwrap_or_default();
    let indexes = entry
        .get("indexes")
        .and_then(Value::as_array)
        .map(|indexes| {
            indexes
                .iter()
                .filter_map(Value::as_u64)
                .filter_map(|index| usize::try_from(index).ok())
                .collect()
        })
        .unwrap_or_default();

    Some(ValidationErrorRecord {
        code,
        fields,
        indexes,
        data: entry.get("data").and_then(Value::as_object).cloned(),
    })
}

fn title_case_str(name: &str) -> String {
    match header::HeaderName::try_from(name) {
        Ok(name) => title_case(&name),
        Err(_) => name.to_string(),
    }
}

/// Simple JSON path accessor.
fn json_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        if segment.is_empty() {
            continue;
        }
        // "items.0.name" indexes arrays
        current = match segment.parse::<usize>() {
            Ok(index) if current.is_array() => current.get(index)?,
            _ => current.get(segment)?,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::JsonResponse;
    use gauntlet_core::ErrorMeta;
    use http::HeaderValue;
    use serde::Deserialize;
    use serde_json::json;
    use std::panic::AssertUnwindSafe;

    const NOT_FOUND: ErrorMeta = ErrorMeta::new(3004, "widget not found");

    fn written(status: StatusCode, body: &Value) -> CapturedResponse {
        let mut writer = ResponseWriter::new();
        writer.json(status, body).unwrap();
        CapturedResponse::decode(writer)
    }

    fn validation_failure() -> CapturedResponse {
        written(
            StatusCode::BAD_REQUEST,
            &json!({
                "code": 2004,
                "invalid": [
                    {"field": "name", "code": 5},
                    {"field": "email", "code": 7},
                    {"field": "name", "code": 9},
                    {"code": 11},
                ],
            }),
        )
    }

    #[test]
    fn test_decode_json_body() {
        let response = written(StatusCode::OK, &json!({"id": 3}));
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.json_body(), Some(&json!({"id": 3})));
        assert_eq!(response.content_type(), Some("application/json"));
        assert!(!response.is_validation_failure());
        assert!(response.validations().is_none());
    }

    #[test]
    fn test_decode_non_json_body() {
        let mut writer = ResponseWriter::new();
        writer.set_body("plain text");
        let response = CapturedResponse::decode(writer);

        assert!(response.json_body().is_none());
        assert_eq!(response.text().unwrap(), "plain text");
        assert!(response.parse_json::<Value>().is_err());
    }

    #[test]
    fn test_text_rejects_invalid_utf8() {
        let mut writer = ResponseWriter::new();
        writer.set_body(vec![0xff, 0xfe]);
        let response = CapturedResponse::decode(writer);
        assert!(matches!(response.text(), Err(HarnessError::BodyRead(_))));
    }

    #[test]
    fn test_lookup_groups_by_field_in_order() {
        let response = validation_failure();
        let lookup = response.validations().unwrap();

        assert_eq!(lookup.keys().collect::<Vec<_>>(), ["name", "email", ""]);
        let codes: Vec<u32> = response
            .validation_errors("name")
            .iter()
            .map(|r| r.code)
            .collect();
        assert_eq!(codes, [5, 9]);
        assert_eq!(response.validation_errors("")[0].code, 11);
        assert!(response.validation_errors("missing").is_empty());
    }

    #[test]
    fn test_lookup_requires_exact_status_and_code() {
        let body = json!({"code": 2004, "invalid": [{"field": "name", "code": 5}]});
        assert!(written(StatusCode::UNPROCESSABLE_ENTITY, &body).validations().is_none());

        let body = json!({"code": 2005, "invalid": [{"field": "name", "code": 5}]});
        assert!(written(StatusCode::BAD_REQUEST, &body).validations().is_none());

        let body = json!({"code": 2004});
        let response = written(StatusCode::BAD_REQUEST, &body);
        assert!(response.validations().unwrap().is_empty());
    }

    #[test]
    fn test_lookup_skips_undecodable_entries() {
        let response = written(
            StatusCode::BAD_REQUEST,
            &json!({
                "code": 2004,
                "invalid": [
                    {"field": "name"},
                    {"field": "name", "code": 5},
                    "garbage",
                ],
            }),
        );
        assert_eq!(response.validation_errors("name").len(), 1);
        assert_eq!(response.validations().unwrap().len(), 1);
    }

    #[test]
    fn test_lookup_keeps_wildcard_fields_without_indexes() {
        let response = written(
            StatusCode::BAD_REQUEST,
            &json!({"code": 2004, "invalid": [{"field": "tags.#", "code": 5}]}),
        );
        let errors = response.validation_errors("tags.#");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].fields, ["tags", "#"]);
        assert!(errors[0].indexes.is_empty());
        response.expect_validation([("tags.#", 5)]);
    }

    #[test]
    fn test_lookup_keeps_entries_with_scalar_data() {
        let response = written(
            StatusCode::BAD_REQUEST,
            &json!({
                "code": 2004,
                "invalid": [{"field": "name", "code": 5, "data": "min 3"}],
            }),
        );
        let errors = response.validation_errors("name");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].data, None);
        response
            .expect_validation([("name", 5)])
            .expect_no_validation(["title"]);
    }

    #[test]
    fn test_custom_validation_convention() {
        let config = ValidationConfig {
            status: 422,
            failed_code: 7000,
        };
        let response = CapturedResponse::from_http_with(
            http::Response::builder()
                .status(422)
                .body(r#"{"code":7000,"invalid":[{"field":"sku","code":1}]}"#)
                .unwrap(),
            config,
        );
        response.expect_validation([("sku", 1)]);
    }

    #[test]
    fn test_from_http() {
        let response = CapturedResponse::from_http(
            http::Response::builder()
                .status(StatusCode::CREATED)
                .header("x-request-id", "r-1")
                .body(Bytes::from_static(b"{}"))
                .unwrap(),
        );
        response.ok().expect_header("X-Request-Id", "r-1");
    }

    #[test]
    fn test_from_response() {
        CapturedResponse::from_response(JsonResponse::error(StatusCode::NOT_FOUND, NOT_FOUND))
            .expect_not_found()
            .expect_not_found_with(NOT_FOUND.code)
            .assert_json_field("error", &json!("widget not found"));
    }

    #[test]
    fn test_ok_accepts_success_codes() {
        for status in [StatusCode::OK, StatusCode::CREATED, StatusCode::NO_CONTENT] {
            CapturedResponse::from_response(status).ok();
        }
    }

    #[test]
    #[should_panic(expected = "Expect 200/201/204 status code, got: 202 Accepted")]
    fn test_ok_rejects_other_success_codes() {
        CapturedResponse::from_response(StatusCode::ACCEPTED).ok();
    }

    #[test]
    fn test_ok_is_repeatable() {
        let response = CapturedResponse::from_response(StatusCode::OK);
        response.ok();
        response.ok().ok();

        let response = CapturedResponse::from_response(StatusCode::NOT_FOUND);
        for _ in 0..2 {
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                response.ok();
            }));
            assert!(outcome.is_err());
        }
    }

    #[test]
    fn test_status_class_checks() {
        let meta = ErrorMeta::new(4001, "token expired");
        CapturedResponse::from_response(JsonResponse::error(StatusCode::UNAUTHORIZED, meta))
            .expect_not_authorized()
            .expect_not_authorized_with(4001)
            .expect_code(4001);

        CapturedResponse::from_response(StatusCode::BAD_REQUEST).expect_invalid();
        validation_failure().expect_invalid_with(2004);
    }

    #[test]
    #[should_panic(expected = "Expect body code 3005, got: 3004")]
    fn test_expect_code_mismatch() {
        CapturedResponse::from_response(JsonResponse::error(StatusCode::NOT_FOUND, NOT_FOUND))
            .expect_not_found_with(3005);
    }

    #[test]
    #[should_panic(expected = "Expect body code 3004, got: none")]
    fn test_expect_code_without_json() {
        CapturedResponse::from_response(StatusCode::NOT_FOUND).expect_not_found_with(3004);
    }

    #[test]
    #[should_panic(expected = "Expect 401 Unauthorized status code, got: 404 Not Found")]
    fn test_expect_not_authorized_mismatch() {
        CapturedResponse::from_response(StatusCode::NOT_FOUND).expect_not_authorized();
    }

    #[test]
    fn test_expect_validation_passes() {
        validation_failure()
            .expect_validation([("name", 5), ("email", 7)])
            .expect_validation([("name", 9)])
            .expect_validation([("", 11)]);
    }

    #[test]
    #[should_panic(expected = "Expect validation code for field 'name' to be 6, got 5, 9")]
    fn test_expect_validation_wrong_code() {
        validation_failure().expect_validation([("name", 6)]);
    }

    #[test]
    fn test_expect_validation_reports_every_failure() {
        let response = validation_failure();
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
            response.expect_validation([("name", 6), ("email", 7), ("title", 1)]);
        }));
        let payload = outcome.unwrap_err();
        let message = payload.downcast_ref::<String>().unwrap();

        assert!(message.contains("field 'name' to be 6"));
        assert!(message.contains("No validation error for field 'title'"));
        assert!(!message.contains("'email'"));
    }

    #[test]
    #[should_panic(expected = "Expect a validation failure")]
    fn test_expect_validation_requires_failure_response() {
        written(StatusCode::OK, &json!({"code": 2004})).expect_validation([("name", 5)]);
    }

    #[test]
    fn test_expect_no_validation() {
        validation_failure().expect_no_validation(["title", "phone"]);
        CapturedResponse::from_response(StatusCode::OK).expect_no_validation(["name"]);
    }

    #[test]
    #[should_panic(expected = "Did not expect an error for field: 'email'")]
    fn test_expect_no_validation_fails() {
        validation_failure().expect_no_validation(["title", "email"]);
    }

    #[test]
    fn test_validation_matcher_over_invalid() {
        let response = written(
            StatusCode::BAD_REQUEST,
            &json!({
                "code": 2004,
                "invalid": [
                    {"field": "items.#.name", "indexes": [1], "code": 3},
                    {"field": "total", "code": 4, "data": {"max": 10}},
                ],
            }),
        );

        response
            .validation()
            .expect_field("items.1.name", 3_u32)
            .expect_field_with_data("total", 4_u32, &json!({"max": 10.0}))
            .expect_no_errors_on(["items.0.name"]);
        assert_eq!(response.validation_errors("items.#.name").len(), 1);
    }

    #[test]
    fn test_validation_matcher_empty_for_other_responses() {
        let matcher = CapturedResponse::from_response(StatusCode::OK).validation();
        assert!(matcher.is_empty());
    }

    #[test]
    fn test_headers() {
        let mut writer = ResponseWriter::new();
        writer.set_header(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        writer.header("x-trace-id", "abc").unwrap();
        let response = CapturedResponse::decode(writer);

        assert_eq!(response.header("Cache-Control"), Some("no-store"));
        assert_eq!(response.header("X-TRACE-ID"), Some("abc"));
        response.expect_header("cache-control", "no-store");

        let mut pairs = response.header_pairs();
        pairs.sort();
        assert_eq!(
            pairs,
            [
                ("Cache-Control".to_string(), "no-store".to_string()),
                ("X-Trace-Id".to_string(), "abc".to_string()),
            ]
        );
    }

    #[test]
    #[should_panic(expected = "Header 'X-Trace-Id': expected 'def', got 'abc'")]
    fn test_expect_header_mismatch() {
        let mut writer = ResponseWriter::new();
        writer.header("x-trace-id", "abc").unwrap();
        CapturedResponse::decode(writer).expect_header("x-trace-id", "def");
    }

    #[test]
    #[should_panic(expected = "Header 'Etag' not found")]
    fn test_expect_header_missing() {
        CapturedResponse::from_response(StatusCode::OK).expect_header("ETag", "v1");
    }

    #[test]
    fn test_json_access() {
        #[derive(Deserialize)]
        struct Widget {
            id: u32,
            tags: Vec<String>,
        }

        let response = written(
            StatusCode::OK,
            &json!({"id": 7, "tags": ["a", "b"], "items": [{"name": "x"}]}),
        );
        let widget: Widget = response.parse_json().unwrap();
        assert_eq!(widget.id, 7);
        assert_eq!(widget.tags, ["a", "b"]);
        assert_eq!(response.json()["id"], 7);

        response
            .assert_json_field("tags.1", &json!("b"))
            .assert_json_field("items.0.name", &json!("x"));
    }

    #[test]
    #[should_panic(expected = "JSON path 'items.3' not found")]
    fn test_assert_json_field_missing() {
        written(StatusCode::OK, &json!({"items": []})).assert_json_field("items.3", &json!(1));
    }

    #[test]
    #[should_panic(expected = "Expect a JSON body, got: nope")]
    fn test_json_panics_on_text() {
        let mut writer = ResponseWriter::new();
        writer.set_body("nope");
        CapturedResponse::decode(writer).json();
    }

    #[test]
    fn test_json_path_numeric_object_keys() {
        let value = json!({"2024": {"total": 1}});
        assert_eq!(json_path(&value, "2024.total"), Some(&json!(1)));
        assert_eq!(json_path(&value, ""), Some(&value));
    }

    #[test]
    fn test_inspect_returns_self() {
        let response = validation_failure();
        response.inspect().expect_invalid();
    }

    #[test]
    fn test_debug_omits_body() {
        let debug = format!("{:?}", validation_failure());
        assert!(debug.contains("validation_failure: true"));
        assert!(!debug.contains("invalid"));
    }
}
