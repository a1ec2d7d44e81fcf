//! Synthetic request building and dispatch.

use crate::response::CapturedResponse;
use crate::writer::{ResponseWriter, WriteResponse};
use bytes::Bytes;
use gauntlet_config::{HarnessConfig, ValidationConfig};
use gauntlet_core::{HarnessError, HarnessResult};
use http::{header, Extensions, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A request as seen by the handler under test.
#[derive(Debug)]
pub struct SyntheticRequest {
    method: Method,
    uri: Uri,
    host: String,
    query: BTreeMap<String, Vec<String>>,
    headers: HeaderMap,
    body: Bytes,
    extensions: Extensions,
}

impl SyntheticRequest {
    /// Returns the method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the full URI, `http://{host}{path}?{query}`.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the first value of a query parameter.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns every value of a query parameter, in insertion order.
    pub fn query_all(&self, key: &str) -> &[String] {
        self.query
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the query parameters.
    pub fn query_params(&self) -> &BTreeMap<String, Vec<String>> {
        &self.query
    }

    /// Returns the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the raw body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as UTF-8 text.
    pub fn text(&self) -> HarnessResult<&str> {
        std::str::from_utf8(&self.body)
            .map_err(|e| HarnessError::BodyRead(format!("Invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> HarnessResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Returns a typed value attached with [`RequestBuilder::extension`].
    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    /// Converts this request to an HTTP request.
    pub fn into_http_request(self) -> http::Request<Bytes> {
        let mut request = http::Request::new(self.body);
        *request.method_mut() = self.method;
        *request.uri_mut() = self.uri;
        *request.headers_mut() = self.headers;
        *request.extensions_mut() = self.extensions;
        request
    }
}

/// Builder for a [`SyntheticRequest`], dispatched through a handler.
///
/// Defaults: `GET /`, no query, no headers, host `test.gauntlet.local`,
/// empty body.
///
/// # Example
///
/// ```
/// use gauntlet_test::{req, ResponseWriter, SyntheticRequest};
///
/// fn handler(req: &SyntheticRequest, res: &mut ResponseWriter) {
///     res.set_body(format!("{} {}", req.method(), req.path()));
/// }
///
/// let response = req().path("/widgets").post(handler);
/// response.ok();
/// assert_eq!(response.text().unwrap(), "POST /widgets");
/// ```
#[must_use]
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    path: String,
    query: BTreeMap<String, Vec<String>>,
    headers: Vec<(String, String)>,
    host: Option<String>,
    body: Bytes,
    extensions: Extensions,
    config: HarnessConfig,
    error: Option<HarnessError>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    /// Creates a builder with default configuration.
    pub fn new() -> Self {
        Self::with_config(HarnessConfig::default())
    }

    /// Creates a builder using `config` for the default host, the project
    /// header and the validation wire shape.
    pub fn with_config(config: HarnessConfig) -> Self {
        Self {
            method: Method::GET,
            path: "/".to_string(),
            query: BTreeMap::new(),
            headers: Vec::new(),
            host: None,
            body: Bytes::new(),
            extensions: Extensions::new(),
            config,
            error: None,
        }
    }

    /// Sets the method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Adds a query parameter value. Repeating a key keeps every value.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Sets a header, replacing an earlier value under the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the project header (`Gobl-Project` unless configured otherwise).
    pub fn project_id(self, id: impl Into<String>) -> Self {
        let name = self.config.request.project_header.clone();
        self.header(name, id)
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the Authorization header with a Bearer token.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header(
            header::AUTHORIZATION.as_str(),
            format!("Bearer {}", token.as_ref()),
        )
    }

    /// Sets the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the raw body, used verbatim.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serializes `value` as the JSON body and sets `Content-Type`.
    ///
    /// A serialization failure is reported when the request is dispatched.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Bytes::from(bytes);
                self.content_type("application/json")
            }
            Err(e) => {
                self.error.get_or_insert(HarnessError::Json(e));
                self
            }
        }
    }

    /// Sets the body as `application/x-www-form-urlencoded`.
    ///
    /// `value` must serialize to a flat object.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match form_encode(value) {
            Ok(encoded) => {
                self.body = Bytes::from(encoded);
                self.content_type("application/x-www-form-urlencoded")
            }
            Err(e) => {
                self.error.get_or_insert(e);
                self
            }
        }
    }

    /// Attaches a typed value the handler can read with
    /// [`SyntheticRequest::extension`].
    pub fn extension<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }

    /// Builds the request without dispatching it.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError` for a body that failed to serialize, an invalid
    /// header, or a path and host that do not form a valid URI.
    pub fn build(self) -> HarnessResult<SyntheticRequest> {
        self.into_parts().map(|(request, _)| request)
    }

    fn into_parts(self) -> HarnessResult<(SyntheticRequest, ValidationConfig)> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let (name, value) = parse_header(name, value)?;
            headers.insert(name, value);
        }

        let host = self
            .host
            .unwrap_or_else(|| self.config.request.host.clone());

        let slash = if self.path.starts_with('/') { "" } else { "/" };
        let mut uri = format!("http://{host}{slash}{}", self.path);
        if !self.query.is_empty() {
            uri.push('?');
            uri.push_str(&encode_query(&self.query));
        }
        let uri: Uri = uri
            .parse()
            .map_err(|e| HarnessError::RequestBuild(format!("Invalid URI: {e}")))?;

        let request = SyntheticRequest {
            method: self.method,
            uri,
            host,
            query: self.query,
            headers,
            body: self.body,
            extensions: self.extensions,
        };
        Ok((request, self.config.validation))
    }

    /// Shared core of every dispatch: builds the request and a fresh
    /// writer, lets `invoke` run the handler, and decodes the result.
    fn dispatch_with<F>(self, invoke: F) -> HarnessResult<CapturedResponse>
    where
        F: FnOnce(&SyntheticRequest, &mut ResponseWriter) -> Option<anyhow::Error>,
    {
        let (request, validation) = self.into_parts()?;
        let mut writer = ResponseWriter::new();

        tracing::debug!(method = %request.method, uri = %request.uri, "dispatching synthetic request");
        let error = invoke(&request, &mut writer);
        tracing::debug!(status = %writer.status(), failed = error.is_some(), "handler returned");

        let response = CapturedResponse::decode_with(writer, validation);
        Ok(match error {
            Some(error) => response.with_error(error),
            None => response,
        })
    }

    /// Dispatches through a plain handler.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built (see [`build`](Self::build)).
    #[track_caller]
    pub fn request<H>(self, handler: H) -> CapturedResponse
    where
        H: FnOnce(&SyntheticRequest, &mut ResponseWriter),
    {
        match self.try_request(handler) {
            Ok(response) => response,
            Err(e) => panic!("failed to build synthetic request: {e}"),
        }
    }

    /// Dispatches through a plain handler, returning build errors.
    pub fn try_request<H>(self, handler: H) -> HarnessResult<CapturedResponse>
    where
        H: FnOnce(&SyntheticRequest, &mut ResponseWriter),
    {
        self.dispatch_with(|request, writer| {
            handler(request, writer);
            None
        })
    }

    /// Dispatches through a handler taking an environment and returning a
    /// response value or an error.
    pub(crate) fn dispatch_env<E, H, R, Err>(self, env: &E, handler: H) -> HarnessResult<CapturedResponse>
    where
        H: FnOnce(&SyntheticRequest, &E) -> Result<R, Err>,
        R: WriteResponse,
        Err: Into<anyhow::Error>,
    {
        self.dispatch_with(|request, writer| match handler(request, env) {
            Ok(response) => {
                response.write_to(writer);
                None
            }
            Err(e) => {
                crate::writer::ServerError.write_to(writer);
                Some(e.into())
            }
        })
    }

    /// Dispatches a `GET` through a plain handler.
    #[track_caller]
    pub fn get<H>(self, handler: H) -> CapturedResponse
    where
        H: FnOnce(&SyntheticRequest, &mut ResponseWriter),
    {
        self.method(Method::GET).request(handler)
    }

    /// Dispatches a `POST` through a plain handler.
    #[track_caller]
    pub fn post<H>(self, handler: H) -> CapturedResponse
    where
        H: FnOnce(&SyntheticRequest, &mut ResponseWriter),
    {
        self.method(Method::POST).request(handler)
    }

    /// Dispatches a `PUT` through a plain handler.
    #[track_caller]
    pub fn put<H>(self, handler: H) -> CapturedResponse
    where
        H: FnOnce(&SyntheticRequest, &mut ResponseWriter),
    {
        self.method(Method::PUT).request(handler)
    }

    /// Dispatches a `PATCH` through a plain handler.
    #[track_caller]
    pub fn patch<H>(self, handler: H) -> CapturedResponse
    where
        H: FnOnce(&SyntheticRequest, &mut ResponseWriter),
    {
        self.method(Method::PATCH).request(handler)
    }

    /// Dispatches a `DELETE` through a plain handler.
    #[track_caller]
    pub fn delete<H>(self, handler: H) -> CapturedResponse
    where
        H: FnOnce(&SyntheticRequest, &mut ResponseWriter),
    {
        self.method(Method::DELETE).request(handler)
    }
}

pub(crate) fn parse_header(name: &str, value: &str) -> HarnessResult<(HeaderName, HeaderValue)> {
    let name = HeaderName::try_from(name)
        .map_err(|e| HarnessError::InvalidHeader(format!("{name:?}: {e}")))?;
    let value = HeaderValue::try_from(value)
        .map_err(|e| HarnessError::InvalidHeader(format!("{name}: {e}")))?;
    Ok((name, value))
}

/// Keys sorted, values in insertion order.
fn encode_query(query: &BTreeMap<String, Vec<String>>) -> String {
    query
        .iter()
        .flat_map(|(key, values)| {
            values.iter().map(move |value| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn form_encode<T: Serialize + ?Sized>(value: &T) -> HarnessResult<String> {
    let Value::Object(map) = serde_json::to_value(value)? else {
        return Err(HarnessError::RequestBuild(
            "form body must serialize to an object".to_string(),
        ));
    };

    let pairs: Vec<String> = map
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            format!("{}={}", urlencoding::encode(&key), urlencoding::encode(&value))
        })
        .collect();
    Ok(pairs.join("&"))
}
