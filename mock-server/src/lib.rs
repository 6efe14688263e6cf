use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

pub const FIRST_JOB_ID: u64 = 3_640_041;
pub const OUTSIDE_ZONE: &str = "Outside of available delivery area";

const STATUS_ACCEPTED: u8 = 50;
const STATUS_CANCELLED: u8 = 52;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AddressInput {
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub floor: Option<String>,
    pub zip_code: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidatedAddress {
    pub address: String,
    pub city: String,
    pub state: String,
    pub floor: Option<String>,
    pub zip: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct Identifier {
    pub api_token: Option<String>,
    pub request_id: Option<String>,
    pub job_id: Option<u64>,
    pub external_id: Option<String>,
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateJob {
    pub api_token: Option<String>,
    #[serde(default)]
    pub live: bool,
    pub pick_address: Option<AddressInput>,
    pub deliver_address: Option<AddressInput>,
    pub ready_time: Option<String>,
    pub deliver_from_time: Option<String>,
    pub deliver_to_time: Option<String>,
    pub reference: Option<String>,
    pub external_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJob {
    #[serde(flatten)]
    pub identifier: Identifier,
    #[serde(flatten)]
    pub changes: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateAddresses {
    pub api_token: Option<String>,
    pub pick_address: Option<AddressInput>,
    pub deliver_address: Option<AddressInput>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobInfo {
    pub job_id: u64,
    pub reference: String,
    pub request_id: String,
    pub courier: Option<String>,
    pub external_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CurrentStatus {
    pub last_location: Option<(f64, f64)>,
    pub status_code: u8,
    pub status_string: String,
    pub user: Option<String>,
    pub courier_name: Option<String>,
    pub remarks: String,
    pub status_time: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: String,
    pub log: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub user: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_info: JobInfo,
    pub job_locations: Vec<Value>,
    pub current_status: CurrentStatus,
    pub job_history: Vec<HistoryEntry>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Job {
    pub info: JobInfo,
    pub current: CurrentStatus,
    pub history: Vec<HistoryEntry>,
}

impl Job {
    fn set_status(&mut self, code: u8, label: &str, remarks: &str) {
        self.current.status_code = code;
        self.current.status_string = label.to_string();
        self.current.remarks = remarks.to_string();
        self.current.status_time = Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
    }

    fn log(&mut self, message: &str) {
        self.history.push(HistoryEntry {
            date: Utc::now().to_rfc3339(),
            log: message.to_string(),
            lat: None,
            lng: None,
            user: None,
        });
    }

    fn snapshot(&self) -> JobStatus {
        JobStatus {
            job_info: self.info.clone(),
            job_locations: Vec::new(),
            current_status: self.current.clone(),
            job_history: self.history.clone(),
        }
    }

    fn matches(&self, identifier: &Identifier) -> bool {
        let info = &self.info;
        non_empty(&identifier.request_id) == Some(info.request_id.as_str())
            || identifier.job_id == Some(info.job_id)
            || non_empty(&identifier.external_id).is_some_and(|id| id == info.external_id)
            || non_empty(&identifier.reference) == Some(info.reference.as_str())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[derive(Debug)]
pub struct Store {
    api_token: String,
    next_job_id: u64,
    jobs: Vec<Job>,
}

impl Store {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            next_job_id: FIRST_JOB_ID,
            jobs: Vec::new(),
        }
    }

    fn authorize(&self, token: Option<&str>) -> Result<(), MockError> {
        match token {
            Some(token) if token == self.api_token => Ok(()),
            _ => Err(MockError::Unauthorized),
        }
    }

    fn find(&self, identifier: &Identifier) -> Result<&Job, MockError> {
        require_identifier(identifier)?;
        self.jobs
            .iter()
            .find(|job| job.matches(identifier))
            .ok_or(MockError::NotFound)
    }

    fn find_mut(&mut self, identifier: &Identifier) -> Result<&mut Job, MockError> {
        require_identifier(identifier)?;
        self.jobs
            .iter_mut()
            .find(|job| job.matches(identifier))
            .ok_or(MockError::NotFound)
    }
}

fn require_identifier(identifier: &Identifier) -> Result<(), MockError> {
    if identifier.request_id.is_none()
        && identifier.job_id.is_none()
        && identifier.external_id.is_none()
        && identifier.reference.is_none()
    {
        return Err(MockError::MissingIdentifier);
    }
    Ok(())
}

pub type Db = Arc<RwLock<Store>>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum MockError {
    #[error("Invalid api_token")]
    Unauthorized,
    #[error("One of request_id, job_id, external_id or reference must be defined")]
    MissingIdentifier,
    #[error("Job not found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let status = match self {
            MockError::Unauthorized => StatusCode::UNAUTHORIZED,
            MockError::NotFound => StatusCode::NOT_FOUND,
            MockError::MissingIdentifier | MockError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub const DEFAULT_API_TOKEN: &str = "mock-token";

pub fn app() -> Router {
    app_with_token(DEFAULT_API_TOKEN)
}

pub fn app_with_token(api_token: &str) -> Router {
    let db: Db = Arc::new(RwLock::new(Store::new(api_token)));
    Router::new()
        .route("/jobs", post(create_job).patch(update_job).delete(cancel_job))
        .route("/status", post(job_status))
        .route("/validate", post(validate_addresses))
        .with_state(db)
}

pub async fn run(listener: TcpListener, api_token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_token(api_token)).await
}

fn require_time(field: &str, value: Option<&str>) -> Result<(), MockError> {
    let value = value.ok_or_else(|| MockError::BadRequest(format!("{field} is required")))?;
    DateTime::parse_from_rfc3339(value)
        .map(|_| ())
        .map_err(|_| MockError::BadRequest(format!("{field} is not an ISO 8601 datetime")))
}

async fn create_job(
    State(db): State<Db>,
    Json(input): Json<CreateJob>,
) -> Result<Json<Value>, MockError> {
    let mut store = db.write().await;
    store.authorize(input.api_token.as_deref())?;

    if input.pick_address.is_none() && input.deliver_address.is_none() {
        return Err(MockError::BadRequest(
            "Pick address and/or deliver address must be defined".to_string(),
        ));
    }
    require_time("ready_time", input.ready_time.as_deref())?;
    require_time("deliver_from_time", input.deliver_from_time.as_deref())?;
    require_time("deliver_to_time", input.deliver_to_time.as_deref())?;

    let request_id = Uuid::new_v4().simple().to_string()[..10].to_ascii_uppercase();
    let job_id = store.next_job_id;
    store.next_job_id += 1;

    let mut job = Job {
        info: JobInfo {
            job_id,
            reference: input.reference.unwrap_or_else(|| request_id.clone()),
            request_id: request_id.clone(),
            courier: None,
            external_id: input.external_id.unwrap_or_default(),
        },
        current: CurrentStatus {
            last_location: None,
            status_code: 0,
            status_string: String::new(),
            user: None,
            courier_name: None,
            remarks: String::new(),
            status_time: String::new(),
        },
        history: Vec::new(),
    };
    job.set_status(STATUS_ACCEPTED, "accepted", "");
    job.log("Job was created via the TwinJet API v1.");
    store.jobs.push(job);

    debug!(%request_id, job_id, live = input.live, "Job created");
    Ok(Json(json!({ "request_id": request_id })))
}

async fn cancel_job(
    State(db): State<Db>,
    Json(identifier): Json<Identifier>,
) -> Result<Json<JobStatus>, MockError> {
    let mut store = db.write().await;
    store.authorize(identifier.api_token.as_deref())?;
    let job = store.find_mut(&identifier)?;
    if job.current.status_code != STATUS_CANCELLED {
        job.set_status(STATUS_CANCELLED, "cancelled", "Cancelled via API");
        job.log("Job was cancelled via the TwinJet API v1.");
    }
    debug!(job_id = job.info.job_id, "Job cancelled");
    Ok(Json(job.snapshot()))
}

async fn update_job(
    State(db): State<Db>,
    Json(input): Json<UpdateJob>,
) -> Result<Json<JobStatus>, MockError> {
    let mut store = db.write().await;
    store.authorize(input.identifier.api_token.as_deref())?;
    let job = store.find_mut(&input.identifier)?;
    if job.current.status_code == STATUS_CANCELLED {
        return Err(MockError::BadRequest("Cancelled jobs cannot be edited".to_string()));
    }
    for field in ["ready_time", "deliver_from_time", "deliver_to_time"] {
        if let Some(value) = input.changes.get(field) {
            require_time(field, value.as_str())?;
        }
    }
    job.log("Job was edited via the TwinJet API v1.");
    debug!(job_id = job.info.job_id, fields = input.changes.len(), "Job edited");
    Ok(Json(job.snapshot()))
}

async fn job_status(
    State(db): State<Db>,
    Json(identifier): Json<Identifier>,
) -> Result<Json<JobStatus>, MockError> {
    let store = db.read().await;
    store.authorize(identifier.api_token.as_deref())?;
    let job = store.find(&identifier)?;
    Ok(Json(job.snapshot()))
}

fn in_zone(address: &AddressInput) -> bool {
    address.city.eq_ignore_ascii_case("San Francisco") && address.state.eq_ignore_ascii_case("CA")
}

fn geocode(address: &AddressInput, lat: f64, lng: f64) -> ValidatedAddress {
    ValidatedAddress {
        address: address.street_address.clone(),
        city: address.city.clone(),
        state: address.state.clone(),
        floor: address.floor.clone(),
        zip: address.zip_code.clone().unwrap_or_default(),
        lat,
        lng,
    }
}

/// Always answers 200; rejected addresses come back with an `errors` list.
async fn validate_addresses(
    State(db): State<Db>,
    Json(input): Json<ValidateAddresses>,
) -> Result<Json<Value>, MockError> {
    db.read().await.authorize(input.api_token.as_deref())?;

    if input.pick_address.is_none() && input.deliver_address.is_none() {
        return Err(MockError::BadRequest(
            "Pick address and/or deliver address must be defined".to_string(),
        ));
    }

    let mut errors = Map::new();
    if input.pick_address.as_ref().is_some_and(|a| !in_zone(a)) {
        errors.insert("pick_address".to_string(), json!(OUTSIDE_ZONE));
    }
    if input.deliver_address.as_ref().is_some_and(|a| !in_zone(a)) {
        errors.insert("drop_address".to_string(), json!(OUTSIDE_ZONE));
    }

    let pick = input.pick_address.as_ref().map(|a| geocode(a, 37.7843461905875, -122.415412005654));
    let drop = input.deliver_address.as_ref().map(|a| geocode(a, 37.7888061913173, -122.399442005392));

    let body = if errors.is_empty() {
        let now = Utc::now();
        json!({
            "pick_address": pick,
            "drop_address": drop,
            "pickup_eta": (now + chrono::Duration::minutes(20)).to_rfc3339(),
            "price": "8.00",
            "delivery_eta": (now + chrono::Duration::minutes(45)).to_rfc3339(),
        })
    } else {
        json!({
            "pick_address": pick,
            "drop_address": drop,
            "errors": [errors],
        })
    };
    Ok(Json(body))
}
