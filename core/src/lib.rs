//! Typed client for the TwinJet courier-dispatch API.
//!
//! # Overview
//! Creates, cancels, edits and queries delivery jobs, and validates
//! addresses against the delivery zone. Each operation builds an
//! `HttpRequest`, runs it through a `Transport`, and parses the
//! `HttpResponse`. The build and parse halves are public so callers can
//! drive the I/O themselves.
//!
//! # Design
//! - `TwinJetClient` holds only the resolved `ClientConfig` and a transport;
//!   nothing changes between calls.
//! - Missing identifiers or addresses are rejected before a request exists.
//! - Time fields are sent as UTC ISO-8601 strings with milliseconds.
//! - `/validate` answers 200 for rejected addresses too; `validation` splits
//!   the two shapes on the `errors` field.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod temporal;
pub mod types;
pub mod validation;

pub use client::TwinJetClient;
pub use config::{ClientConfig, ClientOptions};
pub use error::{ApiError, ConfigError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use temporal::{normalize, DateLike};
pub use types::{
    Address, AddressValidationErrorResponse, AddressValidationPayload, AddressValidationResponse,
    JobCreationResponse, JobCurrentStatus, JobDetails, JobEditionPayload, JobHistory,
    JobIdentifier, JobInfo, JobItem, JobLocation, JobPayload, JobStatus, JobStatusCode,
    PaymentMethod, UnknownCode, ValidatedAddress,
};
pub use validation::{aggregate_errors, disambiguate, ValidationOutcome};
