//! The response side of a synthetic exchange.

use bytes::Bytes;
use gauntlet_core::{wire, ErrorMeta, HarnessResult};
use http::header::{self, HeaderMap, HeaderName, HeaderValue, IntoHeaderName};
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::io;

/// Mutable response container handed to a plain handler.
///
/// Starts as an empty `200 OK`.
///
/// # Example
///
/// ```
/// use gauntlet_test::ResponseWriter;
/// use http::StatusCode;
///
/// let mut writer = ResponseWriter::new();
/// writer.set_status(StatusCode::CREATED);
/// writer.set_body("created");
///
/// assert_eq!(writer.status(), StatusCode::CREATED);
/// assert_eq!(writer.body(), b"created");
/// ```
#[derive(Debug, Clone)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseWriter {
    /// Creates an empty `200 OK` response.
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Returns the status written so far.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status.
    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Returns the headers written so far.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the headers for modification.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Sets a header, replacing any previous value.
    pub fn set_header<K: IntoHeaderName>(&mut self, name: K, value: HeaderValue) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets a header from strings.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::InvalidHeader` if the name or value is not
    /// valid HTTP.
    pub fn header(&mut self, name: &str, value: &str) -> HarnessResult<&mut Self> {
        let (name, value) = crate::request::parse_header(name, value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Returns the body written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) -> &mut Self {
        self.body = body.into().to_vec();
        self
    }

    /// Appends to the body.
    pub fn append(&mut self, data: &[u8]) -> &mut Self {
        self.body.extend_from_slice(data);
        self
    }

    /// Writes `value` as a JSON body with the given status.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Json` if `value` cannot be serialized; the
    /// writer is left untouched.
    pub fn json<T: Serialize + ?Sized>(
        &mut self,
        status: StatusCode,
        value: &T,
    ) -> HarnessResult<&mut Self> {
        let body = serde_json::to_vec(value)?;
        self.status = status;
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.body = body;
        Ok(self)
    }

    /// Converts into an [`http::Response`].
    pub fn into_response(self) -> http::Response<Bytes> {
        let mut response = http::Response::new(Bytes::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }

    pub(crate) fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, Bytes::from(self.body))
    }
}

impl io::Write for ResponseWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A value a handler can return, able to write itself into a
/// [`ResponseWriter`].
pub trait WriteResponse {
    /// Writes status, headers and body into `writer`.
    fn write_to(self, writer: &mut ResponseWriter);
}

impl<B: Into<Bytes>> WriteResponse for http::Response<B> {
    fn write_to(self, writer: &mut ResponseWriter) {
        let (parts, body) = self.into_parts();
        writer.status = parts.status;
        writer.headers = parts.headers;
        writer.body = body.into().to_vec();
    }
}

impl WriteResponse for StatusCode {
    fn write_to(self, writer: &mut ResponseWriter) {
        writer.status = self;
    }
}

/// `None` writes the generic [`ServerError`].
impl<R: WriteResponse> WriteResponse for Option<R> {
    fn write_to(self, writer: &mut ResponseWriter) {
        match self {
            Some(response) => response.write_to(writer),
            None => ServerError.write_to(writer),
        }
    }
}

impl WriteResponse for ResponseWriter {
    fn write_to(self, writer: &mut ResponseWriter) {
        *writer = self;
    }
}

/// The generic `500` written when a handler produces no response.
///
/// Body: `{"code":2001,"error":"server error"}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerError;

impl ServerError {
    /// The error kind of the body.
    pub const META: ErrorMeta = ErrorMeta::new(wire::SERVER_ERROR, wire::SERVER_ERROR_MESSAGE);
}

impl WriteResponse for ServerError {
    fn write_to(self, writer: &mut ResponseWriter) {
        JsonResponse::new(Self::META)
            .with_status(StatusCode::INTERNAL_SERVER_ERROR)
            .write_to(writer);
    }
}

/// JSON response with a status code.
///
/// # Example
///
/// ```
/// use gauntlet_test::{JsonResponse, ResponseWriter, WriteResponse};
/// use http::StatusCode;
/// use serde_json::json;
///
/// let mut writer = ResponseWriter::new();
/// JsonResponse::created(json!({"id": 7})).write_to(&mut writer);
///
/// assert_eq!(writer.status(), StatusCode::CREATED);
/// assert_eq!(writer.body(), br#"{"id":7}"#);
/// ```
#[derive(Debug, Clone)]
pub struct JsonResponse<T> {
    data: T,
    status: StatusCode,
}

impl<T: Serialize> JsonResponse<T> {
    /// Creates a new JSON response with status 200 OK.
    #[must_use]
    pub fn new(data: T) -> Self {
        Self {
            data,
            status: StatusCode::OK,
        }
    }

    /// Creates a JSON response with status 201 Created.
    #[must_use]
    pub fn created(data: T) -> Self {
        Self {
            data,
            status: StatusCode::CREATED,
        }
    }

    /// Sets a custom status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns a reference to the data.
    #[must_use]
    pub fn data(&self) -> &T {
        &self.data
    }
}

impl JsonResponse<Value> {
    /// An error body `{"code": …, "error": …}` with the given status.
    pub fn error(status: StatusCode, meta: ErrorMeta) -> Self {
        Self::new(serde_json::json!({
            wire::CODE_KEY: meta.code,
            "error": meta.message,
        }))
        .with_status(status)
    }

    /// A validation failure: `400` with code `2004` and the given `invalid`
    /// entries.
    ///
    /// Entries that cannot be serialized are dropped with a warning.
    pub fn validation_failed<I>(invalid: I) -> Self
    where
        I: IntoIterator,
        I::Item: Serialize,
    {
        let invalid: Vec<Value> = invalid
            .into_iter()
            .filter_map(|entry| match serde_json::to_value(entry) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(error = %e, "dropping unserializable validation entry");
                    None
                }
            })
            .collect();

        let mut body = serde_json::Map::new();
        body.insert(wire::CODE_KEY.to_string(), wire::VALIDATION_FAILED.into());
        body.insert(wire::INVALID_KEY.to_string(), Value::Array(invalid));

        Self::new(Value::Object(body)).with_status(wire::VALIDATION_STATUS)
    }
}

impl<T: Serialize> WriteResponse for JsonResponse<T> {
    fn write_to(self, writer: &mut ResponseWriter) {
        if let Err(e) = writer.json(self.status, &self.data) {
            tracing::error!(error = %e, "failed to serialize JSON response");
            ServerError.write_to(writer);
        }
    }
}

/// Header names exposed title-cased, e.g. `content-type` → `Content-Type`.
pub(crate) fn title_case(name: &HeaderName) -> String {
    name.as_str()
        .split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn body_json(writer: &ResponseWriter) -> Value {
        serde_json::from_slice(writer.body()).unwrap()
    }

    #[test]
    fn test_new_writer_is_empty_ok() {
        let writer = ResponseWriter::new();
        assert_eq!(writer.status(), StatusCode::OK);
        assert!(writer.headers().is_empty());
        assert!(writer.body().is_empty());
    }

    #[test]
    fn test_io_write_appends() {
        let mut writer = ResponseWriter::new();
        write!(writer, "hello {}", 42).unwrap();
        writer.append(b"!");
        assert_eq!(writer.body(), b"hello 42!");
    }

    #[test]
    fn test_header_rejects_invalid_name() {
        let mut writer = ResponseWriter::new();
        assert!(writer.header("bad header", "x").is_err());
        writer.header("X-Request-Id", "abc").unwrap();
        assert_eq!(writer.headers()["x-request-id"], "abc");
    }

    #[test]
    fn test_json_sets_content_type() {
        let mut writer = ResponseWriter::new();
        writer.json(StatusCode::ACCEPTED, &json!({"queued": true})).unwrap();
        assert_eq!(writer.status(), StatusCode::ACCEPTED);
        assert_eq!(writer.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body_json(&writer), json!({"queued": true}));
    }

    #[test]
    fn test_http_response_writes_everything() {
        let response = http::Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header("X-Trace", "t-1")
            .body("")
            .unwrap();

        let mut writer = ResponseWriter::new();
        writer.set_body("stale");
        response.write_to(&mut writer);

        assert_eq!(writer.status(), StatusCode::NO_CONTENT);
        assert_eq!(writer.headers()["x-trace"], "t-1");
        assert!(writer.body().is_empty());
    }

    #[test]
    fn test_none_writes_server_error() {
        let mut writer = ResponseWriter::new();
        None::<StatusCode>.write_to(&mut writer);
        assert_eq!(writer.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&writer), json!({"code": 2001, "error": "server error"}));
    }

    #[test]
    fn test_some_writes_inner() {
        let mut writer = ResponseWriter::new();
        Some(StatusCode::NOT_FOUND).write_to(&mut writer);
        assert_eq!(writer.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_json_response_error() {
        const NOT_FOUND: ErrorMeta = ErrorMeta::new(3002, "widget not found");

        let mut writer = ResponseWriter::new();
        JsonResponse::error(StatusCode::NOT_FOUND, NOT_FOUND).write_to(&mut writer);
        assert_eq!(writer.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(&writer), json!({"code": 3002, "error": "widget not found"}));
    }

    #[test]
    fn test_validation_failed_shape() {
        let response = JsonResponse::validation_failed([
            json!({"field": "name", "code": 1001}),
            json!({"field": "items.0.sku", "code": 1004}),
        ]);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let mut writer = ResponseWriter::new();
        response.write_to(&mut writer);
        let body = body_json(&writer);
        assert_eq!(body["code"], 2004);
        assert_eq!(body["invalid"].as_array().unwrap().len(), 2);
        assert_eq!(body["invalid"][1]["field"], "items.0.sku");
    }

    #[test]
    fn test_unserializable_json_response_falls_back() {
        struct Broken;

        impl Serialize for Broken {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("nope"))
            }
        }

        let mut writer = ResponseWriter::new();
        JsonResponse::new(Broken).write_to(&mut writer);
        assert_eq!(writer.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_into_response() {
        let mut writer = ResponseWriter::new();
        writer.set_status(StatusCode::CREATED).set_body("ok");
        let response = writer.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.body().as_ref(), b"ok");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case(&header::CONTENT_TYPE), "Content-Type");
        assert_eq!(title_case(&HeaderName::from_static("gobl-project")), "Gobl-Project");
        assert_eq!(title_case(&HeaderName::from_static("etag")), "Etag");
    }
}
