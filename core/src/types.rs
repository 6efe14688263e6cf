//! Domain DTOs for the TwinJet API.
//!
//! # Design
//! Request types skip absent optional fields when serialized, so a request
//! body only carries what the caller actually set. Creation and edition
//! payloads share `JobDetails` through `#[serde(flatten)]`; the fields that
//! are fixed once a job exists (`reference`, `photo`, `external_id`) live only
//! on `JobPayload`.
//!
//! Enumerations keep the server's numeric codes as explicit discriminants and
//! travel as plain integers on the wire.
//!
//! These types are defined independently from the mock-server crate;
//! integration tests catch schema drift between the two.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::ApiError;
use crate::temporal::DateLike;

/// A numeric code that is not part of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} code {code}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: u8,
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// How the delivery is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum PaymentMethod {
    /// No transaction at delivery.
    Invoice = 1,
    /// Customer tips in advance.
    CustomerPrepaid = 2,
    /// Customer tips by card at delivery.
    CustomerCc = 4,
    CustomerCash = 6,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Invoice,
        PaymentMethod::CustomerPrepaid,
        PaymentMethod::CustomerCc,
        PaymentMethod::CustomerCash,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<PaymentMethod> for u8 {
    fn from(value: PaymentMethod) -> Self {
        value.code()
    }
}

impl TryFrom<u8> for PaymentMethod {
    type Error = UnknownCode;

    fn try_from(code: u8) -> Result<Self, UnknownCode> {
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.code() == code)
            .ok_or(UnknownCode {
                kind: "payment method",
                code,
            })
    }
}

/// Lifecycle state reported by the server for a job.
///
/// The client only reads these; it never moves a job between states, and the
/// codes do not form a linear sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum JobStatusCode {
    /// Server error.
    Error = 30,
    /// Job has been received and is processing.
    Processing = 40,
    /// Job has been accepted and created; `job_id` is now available.
    Accepted = 50,
    /// Job has been rejected by the courier company.
    Rejected = 51,
    Cancelled = 52,
    /// Pick up was attempted, but the order was not ready.
    OrderNotReady = 53,
    /// Job has been assigned to a courier.
    Dispatched = 60,
    PickedUp = 61,
    Delivered = 62,
    /// Delivery was attempted without success.
    Undeliverable = 63,
}

impl JobStatusCode {
    pub const ALL: [JobStatusCode; 10] = [
        JobStatusCode::Error,
        JobStatusCode::Processing,
        JobStatusCode::Accepted,
        JobStatusCode::Rejected,
        JobStatusCode::Cancelled,
        JobStatusCode::OrderNotReady,
        JobStatusCode::Dispatched,
        JobStatusCode::PickedUp,
        JobStatusCode::Delivered,
        JobStatusCode::Undeliverable,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Lowercase name, as the server reports it in `status_string`.
    pub fn label(self) -> &'static str {
        match self {
            JobStatusCode::Error => "error",
            JobStatusCode::Processing => "processing",
            JobStatusCode::Accepted => "accepted",
            JobStatusCode::Rejected => "rejected",
            JobStatusCode::Cancelled => "cancelled",
            JobStatusCode::OrderNotReady => "order_not_ready",
            JobStatusCode::Dispatched => "dispatched",
            JobStatusCode::PickedUp => "picked_up",
            JobStatusCode::Delivered => "delivered",
            JobStatusCode::Undeliverable => "undeliverable",
        }
    }

    /// No further courier activity is expected for the job.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatusCode::Rejected | JobStatusCode::Cancelled | JobStatusCode::Delivered
        )
    }
}

impl From<JobStatusCode> for u8 {
    fn from(value: JobStatusCode) -> Self {
        value.code()
    }
}

impl TryFrom<u8> for JobStatusCode {
    type Error = UnknownCode;

    fn try_from(code: u8) -> Result<Self, UnknownCode> {
        JobStatusCode::ALL
            .into_iter()
            .find(|status| status.code() == code)
            .ok_or(UnknownCode {
                kind: "job status",
                code,
            })
    }
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// A postal address with optional contact details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// "Line 1" of the address, typically a company or recipient name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_name: Option<String>,
    /// House number and street name, e.g. `565 Ellis St`.
    pub street_address: String,
    /// Floor, suite, apartment or unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    pub city: String,
    /// Two letter USPS state abbreviation.
    pub state: String,
    /// Five digit USPS zip code (no zip+4).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

impl Address {
    pub fn new(
        street_address: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            street_address: street_address.into(),
            city: city.into(),
            state: state.into(),
            ..Self::default()
        }
    }
}

/// One line of what the courier should pick up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobItem {
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

/// Any one of these resolves an existing job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobIdentifier {
    /// Returned when the job was submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// TwinJet's own job id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<u64>,
    /// Your external reference number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Billing reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl JobIdentifier {
    pub fn by_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
            ..Self::default()
        }
    }

    pub fn by_job_id(job_id: u64) -> Self {
        Self {
            job_id: Some(job_id),
            ..Self::default()
        }
    }

    pub fn by_external_id(external_id: impl Into<String>) -> Self {
        Self {
            external_id: Some(external_id.into()),
            ..Self::default()
        }
    }

    pub fn by_reference(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::default()
        }
    }

    /// Fails with `MissingIdentifier` unless at least one field is set.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.request_id.is_none()
            && self.job_id.is_none()
            && self.external_id.is_none()
            && self.reference.is_none()
        {
            return Err(ApiError::MissingIdentifier);
        }
        Ok(())
    }
}

/// Optional job fields shared by creation and edition payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDetails {
    /// Where the courier makes the pick up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pick_address: Option<Address>,
    /// Where the courier makes the delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deliver_address: Option<Address>,
    /// URL receiving webhook events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// Service level id, provided by the courier company.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_items: Option<Vec<JobItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

impl JobDetails {
    pub fn has_address(&self) -> bool {
        self.pick_address.is_some() || self.deliver_address.is_some()
    }
}

/// Everything needed to create a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    /// Somebody the courier company can call if the fulfillment goes wrong.
    /// Not the recipient.
    pub order_contact_name: String,
    pub order_contact_phone: String,
    /// When the job is ready for pick up.
    pub ready_time: DateLike,
    /// Start of the delivery window.
    pub deliver_from_time: DateLike,
    /// End of the delivery window.
    pub deliver_to_time: DateLike,
    /// Billing reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Require a photo before the job can be marked delivered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<bool>,
    /// Reference displayed to the courier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(flatten)]
    pub details: JobDetails,
}

/// Partial update of an existing job. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobEditionPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_time: Option<DateLike>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deliver_from_time: Option<DateLike>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deliver_to_time: Option<DateLike>,
    #[serde(flatten)]
    pub details: JobDetails,
}

/// Addresses to check against the delivery zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressValidationPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pick_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deliver_address: Option<Address>,
}

impl AddressValidationPayload {
    pub fn has_address(&self) -> bool {
        self.pick_address.is_some() || self.deliver_address.is_some()
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCreationResponse {
    pub request_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInfo {
    pub job_id: u64,
    pub reference: String,
    pub request_id: String,
    pub courier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub external_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A courier position ping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobLocation {
    pub date: String,
    pub lat: f64,
    pub lng: f64,
    pub user: String,
    pub courier: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCurrentStatus {
    /// `[lat, lng]` of the latest known courier position.
    pub last_location: Option<(f64, f64)>,
    pub status_code: JobStatusCode,
    pub status_string: String,
    pub user: Option<String>,
    pub courier_name: Option<String>,
    #[serde(default)]
    pub remarks: String,
    pub status_time: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobHistory {
    pub date: String,
    pub log: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Server-side snapshot of a job, returned by cancel, update and status.
///
/// Every record keeps unrecognised server fields in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_info: JobInfo,
    pub job_locations: Vec<JobLocation>,
    pub current_status: JobCurrentStatus,
    pub job_history: Vec<JobHistory>,
    /// Fields the client does not model, kept so the snapshot round-trips.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An address as geocoded by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedAddress {
    pub address: String,
    pub city: String,
    pub state: String,
    pub floor: Option<String>,
    pub zip: String,
    pub lat: f64,
    pub lng: f64,
}

/// Successful address validation: a price quote and ETAs.
///
/// Fields the client does not model (such as the delivery zone) are kept in
/// `extra` so the body is returned unmodified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressValidationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pick_address: Option<ValidatedAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_address: Option<ValidatedAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_eta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_eta: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Address validation rejected by the server (still an HTTP 200).
///
/// Each entry of `errors` maps a field name to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressValidationErrorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pick_address: Option<ValidatedAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_address: Option<ValidatedAddress>,
    pub errors: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn status_codes_keep_their_wire_values() {
        let codes: Vec<u8> = JobStatusCode::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(codes, vec![30, 40, 50, 51, 52, 53, 60, 61, 62, 63]);
        assert_eq!(serde_json::to_value(JobStatusCode::OrderNotReady).unwrap(), json!(53));
        let parsed: JobStatusCode = serde_json::from_value(json!(52)).unwrap();
        assert_eq!(parsed, JobStatusCode::Cancelled);
    }

    #[test]
    fn unknown_status_code_is_rejected() {
        assert_eq!(
            JobStatusCode::try_from(41u8),
            Err(UnknownCode {
                kind: "job status",
                code: 41
            })
        );
        assert!(serde_json::from_value::<JobStatusCode>(json!(99)).is_err());
    }

    #[test]
    fn status_labels_and_terminal_states() {
        assert_eq!(JobStatusCode::PickedUp.label(), "picked_up");
        assert!(JobStatusCode::Delivered.is_terminal());
        assert!(JobStatusCode::Cancelled.is_terminal());
        assert!(!JobStatusCode::OrderNotReady.is_terminal());
        assert!(!JobStatusCode::Dispatched.is_terminal());
    }

    #[test]
    fn payment_methods_are_non_contiguous_codes() {
        let codes: Vec<u8> = PaymentMethod::ALL.iter().map(|m| m.code()).collect();
        assert_eq!(codes, vec![1, 2, 4, 6]);
        assert_eq!(PaymentMethod::try_from(4u8), Ok(PaymentMethod::CustomerCc));
        assert!(PaymentMethod::try_from(3u8).is_err());
        assert_eq!(serde_json::to_value(PaymentMethod::CustomerCash).unwrap(), json!(6));
    }

    #[test]
    fn identifier_requires_one_field() {
        assert!(matches!(
            JobIdentifier::default().validate(),
            Err(ApiError::MissingIdentifier)
        ));
        for identifier in [
            JobIdentifier::by_request_id("hp7Oshiech0"),
            JobIdentifier::by_job_id(100),
            JobIdentifier::by_external_id("hp7Oshiech0"),
            JobIdentifier::by_reference("8MQXS0L84T"),
        ] {
            assert!(identifier.validate().is_ok());
        }
    }

    #[test]
    fn identifier_serializes_only_present_fields() {
        let value = serde_json::to_value(JobIdentifier::by_job_id(100)).unwrap();
        assert_eq!(value, json!({ "job_id": 100 }));
    }

    #[test]
    fn edition_payload_flattens_details() {
        let payload = JobEditionPayload {
            order_contact_name: Some("Larry Bluejeans".to_string()),
            details: JobDetails {
                tip: Some(5.0),
                payment_method: Some(PaymentMethod::Invoice),
                ..JobDetails::default()
            },
            ..JobEditionPayload::default()
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({ "order_contact_name": "Larry Bluejeans", "tip": 5.0, "payment_method": 1 })
        );
    }

    #[test]
    fn job_status_decodes_server_snapshot() {
        let status: JobStatus = serde_json::from_value(json!({
            "job_info": {
                "reference": "8MQXS0L84T",
                "external_id": "",
                "job_id": 3640041,
                "courier": null,
                "request_id": "8MQXS0L84T"
            },
            "job_locations": [],
            "current_status": {
                "last_location": [45.52169, -73.58406],
                "status_code": 52,
                "status_string": "cancelled",
                "user": null,
                "courier_name": null,
                "remarks": "Canceled Testing",
                "status_time": "2020-06-08T01:00:54.178815"
            },
            "job_history": [{
                "date": "2020-06-08T00:43:27.849792+00:00",
                "lat": null,
                "lng": null,
                "log": "Job was created via the TwinJet API v1.",
                "user": null
            }]
        }))
        .unwrap();
        assert_eq!(status.job_info.job_id, 3_640_041);
        assert_eq!(status.current_status.status_code, JobStatusCode::Cancelled);
        assert_eq!(status.current_status.last_location, Some((45.52169, -73.58406)));
        assert_eq!(status.job_history.len(), 1);
        assert!(status.job_history[0].courier.is_none());
    }

    #[test]
    fn job_status_keeps_unmodelled_fields() {
        let body = json!({
            "job_info": {
                "reference": "8MQXS0L84T",
                "external_id": "",
                "job_id": 3640041,
                "courier": null,
                "request_id": "8MQXS0L84T",
                "service_name": "Rush"
            },
            "job_locations": [{
                "date": "2020-06-08T01:10:00.000Z",
                "lat": 37.78,
                "lng": -122.41,
                "user": "rider-7",
                "courier": "TCB Courier",
                "accuracy": 12
            }],
            "current_status": {
                "last_location": [37.78, -122.41],
                "status_code": 61,
                "status_string": "picked up",
                "user": null,
                "courier_name": "TCB Courier",
                "remarks": "",
                "status_time": "2020-06-08T01:10:00.000000",
                "signature_url": null
            },
            "job_history": [{
                "date": "2020-06-08T00:43:27.849792+00:00",
                "lat": null,
                "lng": null,
                "log": "Job was created via the TwinJet API v1.",
                "user": null,
                "source": "api"
            }],
            "eta": "2020-06-08T01:45:00.000Z"
        });

        let status: JobStatus = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(status.extra["eta"], "2020-06-08T01:45:00.000Z");
        assert_eq!(status.job_info.extra["service_name"], "Rush");
        assert_eq!(serde_json::to_value(&status).unwrap(), body);
    }
}
