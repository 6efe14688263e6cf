//! Error types for the TwinJet API client.
//!
//! # Design
//! Local precondition failures (`MissingAddress`, `MissingIdentifier`,
//! `InvalidDate`) are raised before any request is built, so no network call
//! is issued for them. `Validation` carries the aggregated message the
//! `/validate` endpoint reports with an HTTP 200. Everything the transport
//! surfaces (network errors, timeouts, non-2xx statuses) is passed through
//! without per-status interpretation.

use thiserror::Error;

/// Errors raised while resolving a `ClientConfig`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No API token was supplied, or it was blank.
    #[error("api_token must be provided")]
    MissingApiToken,

    /// The environment could not be read into options (e.g. a non-numeric
    /// timeout).
    #[error("invalid configuration: {0}")]
    Source(String),
}

/// Errors returned by `TwinJetClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Neither `pick_address` nor `deliver_address` was supplied.
    #[error("Pick address and/or deliver address must be defined")]
    MissingAddress,

    /// None of the four job identifier fields was supplied.
    #[error("One of request_id, job_id, external_id or reference must be defined")]
    MissingIdentifier,

    /// A date-like value could not be interpreted as an instant.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// The address validation endpoint answered with an `errors` list.
    #[error("{0}")]
    Validation(String),

    /// The server returned a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request never produced a response (DNS, connect, TLS, I/O).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The configured timeout elapsed before the exchange completed.
    #[error("request timed out")]
    Timeout,

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
