//! Entry points: the reusable [`Harness`] and the [`req`] shortcuts.

use crate::request::{RequestBuilder, SyntheticRequest};
use crate::response::CapturedResponse;
use crate::writer::WriteResponse;
use bytes::Bytes;
use gauntlet_config::{ConfigError, ConfigLoader, HarnessConfig};
use gauntlet_core::HarnessResult;
use http::Method;
use serde::Serialize;

/// Starts a request with default configuration.
pub fn req() -> RequestBuilder {
    RequestBuilder::new()
}

/// Starts a request whose handler receives `env` alongside the request.
pub fn req_with_env<E>(env: E) -> EnvRequestBuilder<E> {
    EnvRequestBuilder::new(env, RequestBuilder::new())
}

/// Reusable request factory carrying configuration and default headers.
///
/// # Example
///
/// ```
/// use gauntlet_test::{Harness, ResponseWriter, SyntheticRequest};
///
/// let harness = Harness::new().with_default_header("X-Client", "suite");
///
/// let response = harness.req().get(|req: &SyntheticRequest, res: &mut ResponseWriter| {
///     res.set_body(req.header("x-client").unwrap_or("none").to_string());
/// });
/// assert_eq!(response.text().unwrap(), "suite");
/// ```
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct Harness {
    config: HarnessConfig,
    default_headers: Vec<(String, String)>,
}

impl Harness {
    /// Creates a harness with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a harness with the given configuration.
    pub fn with_config(config: HarnessConfig) -> Self {
        Self {
            config,
            default_headers: Vec::new(),
        }
    }

    /// Creates a harness from `gauntlet.toml` (if present), the
    /// `GAUNTLET_TEST_*` storage variables and `GAUNTLET__SECTION__KEY`
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any layer fails to load or the result is
    /// invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = ConfigLoader::new()
            .with_defaults()
            .with_optional_file("gauntlet.toml")?
            .with_storage_env()?
            .with_env_prefix("GAUNTLET")
            .load()?;
        Ok(Self::with_config(config))
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Starts a request.
    pub fn req(&self) -> RequestBuilder {
        self.default_headers.iter().fold(
            RequestBuilder::with_config(self.config.clone()),
            |builder, (name, value)| builder.header(name.clone(), value.clone()),
        )
    }

    /// Starts a request whose handler receives `env` alongside the request.
    pub fn req_with_env<E>(&self, env: E) -> EnvRequestBuilder<E> {
        EnvRequestBuilder::new(env, self.req())
    }
}

/// Request builder for handlers shaped
/// `Fn(&SyntheticRequest, &E) -> Result<R, Err>`.
///
/// `Ok(response)` is written as returned (`None` writes the generic `500`);
/// `Err(e)` writes the generic `500` and attaches `e` to the
/// [`CapturedResponse`].
///
/// # Example
///
/// ```
/// use gauntlet_test::{req_with_env, JsonResponse, SyntheticRequest};
/// use serde_json::{json, Value};
///
/// struct Env {
///     greeting: &'static str,
/// }
///
/// fn hello(_req: &SyntheticRequest, env: &Env) -> anyhow::Result<JsonResponse<Value>> {
///     Ok(JsonResponse::new(json!({"message": env.greeting})))
/// }
///
/// let response = req_with_env(Env { greeting: "hi" }).get(hello);
/// response.ok().assert_json_field("message", &json!("hi"));
/// ```
#[must_use]
#[derive(Debug)]
pub struct EnvRequestBuilder<E> {
    env: E,
    inner: RequestBuilder,
}

impl<E> EnvRequestBuilder<E> {
    fn new(env: E, inner: RequestBuilder) -> Self {
        Self { env, inner }
    }

    /// Returns the environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    fn map(self, f: impl FnOnce(RequestBuilder) -> RequestBuilder) -> Self {
        Self {
            env: self.env,
            inner: f(self.inner),
        }
    }

    /// Sets the method.
    pub fn method(self, method: Method) -> Self {
        self.map(|b| b.method(method))
    }

    /// Sets the path.
    pub fn path(self, path: impl Into<String>) -> Self {
        self.map(|b| b.path(path))
    }

    /// Adds a query parameter value.
    pub fn query(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.map(|b| b.query(key, value))
    }

    /// Sets a header.
    pub fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.map(|b| b.header(name, value))
    }

    /// Sets the project header.
    pub fn project_id(self, id: impl Into<String>) -> Self {
        self.map(|b| b.project_id(id))
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.map(|b| b.content_type(content_type))
    }

    /// Sets the Authorization header with a Bearer token.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.map(|b| b.bearer_token(token))
    }

    /// Sets the host.
    pub fn host(self, host: impl Into<String>) -> Self {
        self.map(|b| b.host(host))
    }

    /// Sets the raw body.
    pub fn body(self, body: impl Into<Bytes>) -> Self {
        self.map(|b| b.body(body))
    }

    /// Serializes `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Self {
        self.map(|b| b.json(value))
    }

    /// Sets a form-urlencoded body.
    pub fn form<T: Serialize + ?Sized>(self, value: &T) -> Self {
        self.map(|b| b.form(value))
    }

    /// Attaches a typed value to the request.
    pub fn extension<T: Clone + Send + Sync + 'static>(self, value: T) -> Self {
        self.map(|b| b.extension(value))
    }

    /// Builds the request without dispatching it.
    pub fn build(self) -> HarnessResult<SyntheticRequest> {
        self.inner.build()
    }

    /// Dispatches through `handler`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    #[track_caller]
    pub fn request<H, R, Err>(self, handler: H) -> CapturedResponse
    where
        H: FnOnce(&SyntheticRequest, &E) -> Result<R, Err>,
        R: WriteResponse,
        Err: Into<anyhow::Error>,
    {
        match self.try_request(handler) {
            Ok(response) => response,
            Err(e) => panic!("failed to build synthetic request: {e}"),
        }
    }

    /// Dispatches through `handler`, returning build errors.
    pub fn try_request<H, R, Err>(self, handler: H) -> HarnessResult<CapturedResponse>
    where
        H: FnOnce(&SyntheticRequest, &E) -> Result<R, Err>,
        R: WriteResponse,
        Err: Into<anyhow::Error>,
    {
        self.inner.dispatch_env(&self.env, handler)
    }

    /// Dispatches a `GET`.
    #[track_caller]
    pub fn get<H, R, Err>(self, handler: H) -> CapturedResponse
    where
        H: FnOnce(&SyntheticRequest, &E) -> Result<R, Err>,
        R: WriteResponse,
        Err: Into<anyhow::Error>,
    {
        self.method(Method::GET).request(handler)
    }

    /// Dispatches a `POST`.
    #[track_caller]
    pub fn post<H, R, Err>(self, handler: H) -> CapturedResponse
    where
        H: FnOnce(&SyntheticRequest, &E) -> Result<R, Err>,
        R: WriteResponse,
        Err: Into<anyhow::Error>,
    {
        self.method(Method::POST).request(handler)
    }

    /// Dispatches a `PUT`.
    #[track_caller]
    pub fn put<H, R, Err>(self, handler: H) -> CapturedResponse
    where
        H: FnOnce(&SyntheticRequest, &E) -> Result<R, Err>,
        R: WriteResponse,
        Err: Into<anyhow::Error>,
    {
        self.method(Method::PUT).request(handler)
    }

    /// Dispatches a `PATCH`.
    #[track_caller]
    pub fn patch<H, R, Err>(self, handler: H) -> CapturedResponse
    where
        H: FnOnce(&SyntheticRequest, &E) -> Result<R, Err>,
        R: WriteResponse,
        Err: Into<anyhow::Error>,
    {
        self.method(Method::PATCH).request(handler)
    }

    /// Dispatches a `DELETE`.
    #[track_caller]
    pub fn delete<H, R, Err>(self, handler: H) -> CapturedResponse
    where
        H: FnOnce(&SyntheticRequest, &E) -> Result<R, Err>,
        R: WriteResponse,
        Err: Into<anyhow::Error>,
    {
        self.method(Method::DELETE).request(handler)
    }
}
