//! Request composition and response parsing for the TwinJet API.
//!
//! # Design
//! Every operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`. Both
//! halves are pure; the convenience methods (`create`, `cancel`, `update`,
//! `status`, `validate_address`) run them around a single
//! `Transport::execute` call.
//!
//! Request bodies are flat JSON objects built in layers, later layers
//! replacing earlier keys: fixed fields (`api_token`, plus `live` on create),
//! then the job identifier, then the payload. The merge is shallow; addresses
//! and item lists travel as single values.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::{ClientConfig, ClientOptions};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::temporal::{normalize, DateLike};
use crate::types::{
    AddressValidationPayload, AddressValidationResponse, JobCreationResponse,
    JobEditionPayload, JobIdentifier, JobPayload, JobStatus,
};
use crate::validation::{disambiguate, ValidationOutcome};

const JOBS_PATH: &str = "/jobs";
const STATUS_PATH: &str = "/status";
const VALIDATE_PATH: &str = "/validate";

/// Client for the TwinJet jobs API.
///
/// Holds only the immutable configuration and the transport, so a single
/// instance can be shared across threads when the transport allows it.
#[derive(Debug, Clone)]
pub struct TwinJetClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl TwinJetClient {
    /// Resolve `options` and bind a `ureq` transport to the configured timeout.
    pub fn new(options: ClientOptions) -> Result<Self, ApiError> {
        let config = ClientConfig::resolve(options)?;
        let transport = UreqTransport::new(config.timeout());
        Ok(Self { config, transport })
    }
}

impl<T: Transport> TwinJetClient<T> {
    pub fn with_transport(options: ClientOptions, transport: T) -> Result<Self, ApiError> {
        let config = ClientConfig::resolve(options)?;
        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Create a job and return its `request_id`.
    pub fn create(&self, payload: &JobPayload) -> Result<String, ApiError> {
        let request = self.build_create_job(payload)?;
        self.parse_create_job(self.send(request)?)
    }

    /// Cancel a job. The server answers with the post-cancellation snapshot.
    pub fn cancel(&self, identifier: &JobIdentifier) -> Result<JobStatus, ApiError> {
        let request = self.build_cancel_job(identifier)?;
        self.parse_job_status(self.send(request)?)
    }

    /// Edit a job, returning its updated snapshot.
    pub fn update(
        &self,
        identifier: &JobIdentifier,
        payload: &JobEditionPayload,
    ) -> Result<JobStatus, ApiError> {
        let request = self.build_update_job(identifier, payload)?;
        self.parse_job_status(self.send(request)?)
    }

    pub fn status(&self, identifier: &JobIdentifier) -> Result<JobStatus, ApiError> {
        let request = self.build_job_status(identifier)?;
        self.parse_job_status(self.send(request)?)
    }

    /// Check addresses against the delivery zone and get a price quote with
    /// pick up and delivery ETAs.
    pub fn validate_address(
        &self,
        payload: &AddressValidationPayload,
    ) -> Result<AddressValidationResponse, ApiError> {
        let request = self.build_validate_address(payload)?;
        self.parse_validate_address(self.send(request)?)
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), url = %request.url, "Sending TwinJet request");
        let response = self.transport.execute(request)?;
        debug!(status = response.status, "TwinJet responded");
        Ok(response)
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_create_job(&self, payload: &JobPayload) -> Result<HttpRequest, ApiError> {
        if !payload.details.has_address() {
            return Err(ApiError::MissingAddress);
        }

        let mut body = Map::new();
        body.insert("live".to_string(), Value::Bool(self.config.live()));
        body.insert("api_token".to_string(), self.api_token());
        overlay(&mut body, payload)?;

        let times = [
            ("ready_time", &payload.ready_time),
            ("deliver_from_time", &payload.deliver_from_time),
            ("deliver_to_time", &payload.deliver_to_time),
        ];
        for (key, value) in times {
            body.insert(key.to_string(), Value::String(normalize(value)?));
        }

        self.json_request(HttpMethod::Post, JOBS_PATH, body)
    }

    pub fn build_cancel_job(&self, identifier: &JobIdentifier) -> Result<HttpRequest, ApiError> {
        let body = self.identified_body(identifier)?;
        self.json_request(HttpMethod::Delete, JOBS_PATH, body)
    }

    /// Only the time fields present in `payload` are normalized; absent ones
    /// stay absent.
    pub fn build_update_job(
        &self,
        identifier: &JobIdentifier,
        payload: &JobEditionPayload,
    ) -> Result<HttpRequest, ApiError> {
        let mut body = self.identified_body(identifier)?;
        overlay(&mut body, payload)?;

        let times: [(&str, Option<&DateLike>); 3] = [
            ("ready_time", payload.ready_time.as_ref()),
            ("deliver_from_time", payload.deliver_from_time.as_ref()),
            ("deliver_to_time", payload.deliver_to_time.as_ref()),
        ];
        for (key, value) in times {
            if let Some(value) = value {
                body.insert(key.to_string(), Value::String(normalize(value)?));
            }
        }

        self.json_request(HttpMethod::Patch, JOBS_PATH, body)
    }

    pub fn build_job_status(&self, identifier: &JobIdentifier) -> Result<HttpRequest, ApiError> {
        let body = self.identified_body(identifier)?;
        self.json_request(HttpMethod::Post, STATUS_PATH, body)
    }

    pub fn build_validate_address(
        &self,
        payload: &AddressValidationPayload,
    ) -> Result<HttpRequest, ApiError> {
        if !payload.has_address() {
            return Err(ApiError::MissingAddress);
        }

        let mut body = Map::new();
        body.insert("api_token".to_string(), self.api_token());
        overlay(&mut body, payload)?;
        self.json_request(HttpMethod::Post, VALIDATE_PATH, body)
    }

    fn api_token(&self) -> Value {
        Value::String(self.config.api_token().to_string())
    }

    /// `api_token` followed by the identifier fields, after checking that at
    /// least one identifier is present.
    fn identified_body(&self, identifier: &JobIdentifier) -> Result<Map<String, Value>, ApiError> {
        identifier.validate()?;
        let mut body = Map::new();
        body.insert("api_token".to_string(), self.api_token());
        overlay(&mut body, identifier)?;
        Ok(body)
    }

    fn json_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Map<String, Value>,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(&Value::Object(body))
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method,
            url: format!("{}{path}", self.config.base_url()),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    // -----------------------------------------------------------------------
    // Response parsers
    // -----------------------------------------------------------------------

    /// Keep only `request_id`; any other response fields are dropped.
    pub fn parse_create_job(&self, response: HttpResponse) -> Result<String, ApiError> {
        check_status(&response)?;
        let created: JobCreationResponse = decode(&response.body)?;
        Ok(created.request_id)
    }

    /// Shared by cancel, update and status.
    pub fn parse_job_status(&self, response: HttpResponse) -> Result<JobStatus, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    pub fn parse_validate_address(
        &self,
        response: HttpResponse,
    ) -> Result<AddressValidationResponse, ApiError> {
        check_status(&response)?;
        match disambiguate(&response.body)? {
            ValidationOutcome::Valid(validated) => Ok(validated),
            ValidationOutcome::Invalid(rejected) => {
                let message = rejected.message();
                warn!(errors = rejected.errors.len(), %message, "Address validation rejected");
                Err(ApiError::Validation(message))
            }
        }
    }
}

/// Merge the fields of `layer` into `body`, replacing existing keys.
fn overlay<L: Serialize>(body: &mut Map<String, Value>, layer: &L) -> Result<(), ApiError> {
    match serde_json::to_value(layer).map_err(|e| ApiError::SerializationError(e.to_string()))? {
        Value::Object(fields) => {
            body.extend(fields);
            Ok(())
        }
        other => Err(ApiError::SerializationError(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

fn decode<R: DeserializeOwned>(body: &str) -> Result<R, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Any non-2xx status is a failure; the status itself is not interpreted.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
