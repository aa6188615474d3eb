//! HTTP transport behind the authorized-request wrapper.
//!
//! Native builds send through `reqwest`; browser builds (hydrate) send through
//! `gloo-net`. Both return the raw status, headers, and body text so the gate
//! can apply its 401/403 policy before the caller sees anything.
//!
//! ERROR HANDLING
//! ==============
//! Only failures before a response exists (DNS, connect, invalid header,
//! unreadable body) are errors. Every HTTP status, including 4xx/5xx, is a
//! successful `ApiResponse`.

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::GateError;

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = GateError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(GateError::ConfigParse(format!("unsupported HTTP method: {other}"))),
        }
    }
}

/// Outgoing request as supplied by the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { url: url.into(), method, headers: Vec::new(), body: None }
    }

    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    #[must_use]
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    /// Append a header. Use [`ApiRequest::set_header`] to replace instead.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the request body.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if `value` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_string(value)?);
        Ok(self)
    }

    /// First value of `name`, compared case-insensitively.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        header_lookup(&self.headers, name)
    }

    /// Replace every header named `name` (case-insensitive) with one value.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.to_owned()));
    }
}

/// Response handed back to the caller untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, headers: Vec::new(), body: body.into() }
    }

    #[must_use]
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        header_lookup(&self.headers, name)
    }

    /// Parse the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

fn header_lookup<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Resolve `url` against an optional origin.
///
/// Absolute `http(s)` URLs pass through; relative ones need a base.
///
/// # Errors
///
/// Returns `GateError::Transport` for a relative URL without a base.
pub fn resolve_url(base_url: Option<&str>, url: &str) -> Result<String, GateError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        return Ok(url.to_owned());
    }
    let Some(base) = base_url else {
        return Err(GateError::Transport(format!("relative URL {url:?} with no base URL configured")));
    };
    let base = base.trim_end_matches('/');
    if url.starts_with('/') {
        Ok(format!("{base}{url}"))
    } else {
        Ok(format!("{base}/{url}"))
    }
}

// =============================================================================
// TRANSPORT TRAIT
// =============================================================================

/// Sends one request and returns whatever the server answered.
#[async_trait::async_trait(?Send)]
pub trait HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, GateError>;
}

#[async_trait::async_trait(?Send)]
impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, GateError> {
        (**self).send(request).await
    }
}

// =============================================================================
// REQWEST
// =============================================================================

#[cfg(feature = "native")]
pub use native::ReqwestTransport;

#[cfg(feature = "native")]
mod native {
    use std::time::Duration;

    use reqwest::header::{HeaderName, HeaderValue};

    use super::{ApiRequest, ApiResponse, HttpTransport, Method, resolve_url};
    use crate::config::GateConfig;
    use crate::error::GateError;

    pub struct ReqwestTransport {
        http: reqwest::Client,
        base_url: Option<String>,
    }

    impl ReqwestTransport {
        /// Build a client with the configured timeouts and base URL.
        ///
        /// # Errors
        ///
        /// Returns `GateError::HttpClientBuild` if the client fails to build.
        pub fn new(config: &GateConfig) -> Result<Self, GateError> {
            let http = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeouts.request_secs))
                .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
                .build()
                .map_err(|e| GateError::HttpClientBuild(e.to_string()))?;
            Ok(Self { http, base_url: config.base_url.clone() })
        }
    }

    fn reqwest_method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }

    #[async_trait::async_trait(?Send)]
    impl HttpTransport for ReqwestTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, GateError> {
            let url = resolve_url(self.base_url.as_deref(), &request.url)?;
            let mut builder = self.http.request(reqwest_method(request.method), &url);

            for (name, value) in &request.headers {
                let header_name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| GateError::InvalidHeader { name: name.clone(), reason: e.to_string() })?;
                let header_value = HeaderValue::from_str(value)
                    .map_err(|e| GateError::InvalidHeader { name: name.clone(), reason: e.to_string() })?;
                builder = builder.header(header_name, header_value);
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| GateError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_owned(), v.to_owned())))
                .collect();
            let body = response
                .text()
                .await
                .map_err(|e| GateError::Transport(e.to_string()))?;

            Ok(ApiResponse { status, headers, body })
        }
    }
}

// =============================================================================
// FETCH (BROWSER)
// =============================================================================

#[cfg(feature = "hydrate")]
pub use fetch::FetchTransport;

#[cfg(feature = "hydrate")]
mod fetch {
    use gloo_net::http::RequestBuilder;

    use super::{ApiRequest, ApiResponse, HttpTransport, Method};
    use crate::error::GateError;

    /// Transport over the browser `fetch` API. Relative URLs resolve against
    /// the current page origin.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct FetchTransport;

    fn fetch_method(method: Method) -> gloo_net::http::Method {
        match method {
            Method::Get => gloo_net::http::Method::GET,
            Method::Post => gloo_net::http::Method::POST,
            Method::Put => gloo_net::http::Method::PUT,
            Method::Patch => gloo_net::http::Method::PATCH,
            Method::Delete => gloo_net::http::Method::DELETE,
        }
    }

    #[async_trait::async_trait(?Send)]
    impl HttpTransport for FetchTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, GateError> {
            let mut builder = RequestBuilder::new(&request.url).method(fetch_method(request.method));
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            let prepared = match request.body {
                Some(body) => builder.body(body),
                None => builder.build(),
            }
            .map_err(|e| GateError::Transport(e.to_string()))?;

            let response = prepared
                .send()
                .await
                .map_err(|e| GateError::Transport(e.to_string()))?;
            let status = response.status();
            let headers = response.headers().entries().collect();
            let body = response
                .text()
                .await
                .map_err(|e| GateError::Transport(e.to_string()))?;

            Ok(ApiResponse { status, headers, body })
        }
    }
}
