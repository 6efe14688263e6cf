//! HTTP transport types and the `Transport` seam.
//!
//! # Design
//! Requests and responses are plain data. `TwinJetClient` builds an
//! `HttpRequest`, hands it to a `Transport`, and parses the `HttpResponse`
//! it gets back. The core never interprets status codes beyond "2xx or not",
//! and never retries.
//!
//! `UreqTransport` is the default blocking transport. Any
//! `Fn(HttpRequest) -> Result<HttpResponse, ApiError>` closure is also a
//! `Transport`, which is how tests intercept outgoing requests.

use std::time::Duration;

use ureq::typestate::WithBody;
use ureq::{Agent, Body, RequestBuilder};

use crate::error::ApiError;

/// HTTP method for a request. Only the verbs the TwinJet API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `TwinJetClient::build_*` methods. `url` is absolute (base URL
/// already applied) and `body` is the flat JSON object sent to the server.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes one HTTP exchange. At most one attempt per call.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<F> Transport for F
where
    F: Fn(HttpRequest) -> Result<HttpResponse, ApiError>,
{
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self(request)
    }
}

/// Blocking transport backed by a pooled `ureq::Agent`.
///
/// Non-2xx statuses are returned as data so the client reports them as
/// `ApiError::HttpError`. A timeout bounds the whole exchange; `None` waits
/// indefinitely.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let builder = match request.method {
            HttpMethod::Post => self.agent.post(&request.url),
            HttpMethod::Patch => self.agent.patch(&request.url),
            // The TwinJet API reads the job identifier from the DELETE body.
            HttpMethod::Delete => self.agent.delete(&request.url).force_send_body(),
        };

        let mut response =
            send(builder, &request.headers, request.body.as_deref()).map_err(map_ureq_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(map_ureq_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn send(
    mut builder: RequestBuilder<WithBody>,
    headers: &[(String, String)],
    body: Option<&str>,
) -> Result<ureq::http::Response<Body>, ureq::Error> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

fn map_ureq_error(err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Timeout(_) => ApiError::Timeout,
        other => ApiError::Transport(other.to_string()),
    }
}
