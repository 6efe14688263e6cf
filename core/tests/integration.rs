//! Full job lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every client
//! operation over real HTTP through `UreqTransport`. Validates that request
//! composition and response parsing agree with the server's schema.

use twinjet_core::{
    Address, AddressValidationPayload, ApiError, ClientOptions, DateLike, JobDetails,
    JobEditionPayload, JobIdentifier, JobItem, JobPayload, JobStatusCode, TwinJetClient,
};

const TOKEN: &str = "Ahngohsieb5aijooghugheF6iel0AeGh";

/// Start the mock server on a random port and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, TOKEN).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn client(base_url: &str) -> TwinJetClient {
    TwinJetClient::new(ClientOptions::new(TOKEN).base_url(base_url).live(false)).unwrap()
}

fn address(street: &str, city: &str) -> Address {
    Address {
        zip_code: Some("94109".to_string()),
        floor: Some("Unit B".to_string()),
        ..Address::new(street, city, "CA")
    }
}

fn job() -> JobPayload {
    JobPayload {
        order_contact_name: "Larry Bluejeans".to_string(),
        order_contact_phone: "5555555555".to_string(),
        ready_time: DateLike::from(std::time::SystemTime::now()),
        deliver_from_time: DateLike::EpochMillis(1_591_578_054_178),
        deliver_to_time: "2014-08-04T14:54:28.630613-07:00".into(),
        reference: None,
        photo: Some(true),
        external_id: Some("ORDER-1234".to_string()),
        details: JobDetails {
            pick_address: Some(address("565 Ellis St", "San Francisco")),
            deliver_address: Some(address("560 Mission St", "San Francisco")),
            job_items: Some(vec![JobItem {
                quantity: 4,
                description: Some("Fried Chickens".to_string()),
                sku: None,
            }]),
            ..JobDetails::default()
        },
    }
}

#[test]
fn job_lifecycle() {
    let base_url = start_server();
    let client = client(&base_url);

    // Step 1: validate addresses inside the zone.
    let quote = client
        .validate_address(&AddressValidationPayload {
            pick_address: Some(address("565 Ellis St", "San Francisco")),
            deliver_address: Some(address("560 Mission St", "San Francisco")),
        })
        .unwrap();
    assert_eq!(quote.price.as_deref(), Some("8.00"));
    assert_eq!(quote.pick_address.unwrap().address, "565 Ellis St");

    // Step 2: create.
    let request_id = client.create(&job()).unwrap();
    assert_eq!(request_id.len(), 10);

    // Step 3: status by each kind of identifier.
    for identifier in [
        JobIdentifier::by_request_id(request_id.clone()),
        JobIdentifier::by_job_id(mock_server::FIRST_JOB_ID),
        JobIdentifier::by_external_id("ORDER-1234"),
        JobIdentifier::by_reference(request_id.clone()),
    ] {
        let status = client.status(&identifier).unwrap();
        assert_eq!(status.job_info.request_id, request_id);
        assert_eq!(status.current_status.status_code, JobStatusCode::Accepted);
    }

    // Step 4: edit the delivery window.
    let edited = client
        .update(
            &JobIdentifier::by_request_id(request_id.clone()),
            &JobEditionPayload {
                deliver_to_time: Some(DateLike::EpochMillis(1_591_600_000_000)),
                ..JobEditionPayload::default()
            },
        )
        .unwrap();
    assert_eq!(edited.job_history.len(), 2);

    // Step 5: cancel.
    let cancelled = client
        .cancel(&JobIdentifier::by_job_id(mock_server::FIRST_JOB_ID))
        .unwrap();
    assert_eq!(cancelled.current_status.status_code, JobStatusCode::Cancelled);
    assert!(cancelled.current_status.status_code.is_terminal());

    // Step 6: cancelled jobs cannot be edited; the 400 is passed through.
    let err = client
        .update(
            &JobIdentifier::by_request_id(request_id),
            &JobEditionPayload {
                order_contact_phone: Some("5555555556".to_string()),
                ..JobEditionPayload::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::HttpError { status: 400, .. }));
}

#[test]
fn out_of_zone_addresses_fail_with_aggregated_message() {
    let base_url = start_server();
    let err = client(&base_url)
        .validate_address(&AddressValidationPayload {
            pick_address: Some(address("1 Broadway", "Oakland")),
            deliver_address: Some(address("2 Shattuck Ave", "Berkeley")),
        })
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "pick_address: Outside of available delivery area. drop_address: Outside of available delivery area"
    );
}

#[test]
fn unknown_job_is_an_http_error() {
    let base_url = start_server();
    let err = client(&base_url)
        .status(&JobIdentifier::by_request_id("NOPE"))
        .unwrap_err();
    assert!(matches!(err, ApiError::HttpError { status: 404, .. }));
}

#[test]
fn wrong_token_is_an_http_error() {
    let base_url = start_server();
    let client = TwinJetClient::new(ClientOptions::new("wrong").base_url(&base_url)).unwrap();
    let err = client.create(&job()).unwrap_err();
    assert!(matches!(err, ApiError::HttpError { status: 401, .. }));
}

#[test]
fn zero_timeout_disables_the_timeout() {
    let base_url = start_server();
    let client = TwinJetClient::new(
        ClientOptions::new(TOKEN)
            .base_url(&base_url)
            .live(false)
            .timeout_ms(0),
    )
    .unwrap();
    assert_eq!(client.config().timeout(), None);
    let request_id = client.create(&job()).unwrap();
    assert_eq!(request_id.len(), 10);
}
