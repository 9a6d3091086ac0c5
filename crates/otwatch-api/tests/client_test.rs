#![allow(clippy::unwrap_used)]
// Integration tests for the REST client and the workflow fallback decorator,
// using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use otwatch_api::{Error, PcapService, RestClient, TransportConfig, WorkflowService, WorkflowSource};
use otwatch_core::model::workflow::InstanceStatus;

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RestClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = RestClient::new(base_url, &TransportConfig::default()).unwrap();
    (server, client)
}

async fn mount_health(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(server)
        .await;
}

// ── Error surfacing ─────────────────────────────────────────────────

#[tokio::test]
async fn test_server_detail_surfaces_verbatim() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/pcap/stats"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "No captures uploaded yet"})),
        )
        .mount(&server)
        .await;

    let result = client.get("/api/v1/pcap/stats").await;
    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "No captures uploaded yet");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_message_field_surfaces_when_detail_missing() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/pcap/7"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "file is locked"})))
        .mount(&server)
        .await;

    let err = client.delete("/api/v1/pcap/7").await.unwrap_err();
    assert_eq!(err.to_string(), "file is locked");
}

#[tokio::test]
async fn test_opaque_error_body_becomes_synthetic_message() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/pcap/stats"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.get("/api/v1/pcap/stats").await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
}

// ── PCAP service ────────────────────────────────────────────────────

#[tokio::test]
async fn test_pcap_list_unwraps_files_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/pcap/"))
        .and(query_param("limit", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{
                "id": 1,
                "original_filename": "line1.pcap",
                "file_size": 20480,
                "upload_date": "2025-06-15T10:30:00Z",
                "packet_count": 512,
                "protocols": ["Modbus TCP"],
                "status": "processed",
                "duration_seconds": 12.5,
                "flagged": true
            }]
        })))
        .mount(&server)
        .await;

    let files = PcapService::new(client).list(25).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].original_filename, "line1.pcap");
    assert!(files[0].flagged);
    assert_eq!(files[0].packet_count, Some(512));
}

#[tokio::test]
async fn test_training_status_terminal_detection() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/pcap/training/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "progress": 100.0,
            "message": "model saved"
        })))
        .mount(&server)
        .await;

    let status = PcapService::new(client).training_status().await.unwrap();
    assert!(status.is_terminal());
    assert_eq!(status.progress, Some(100.0));
}

// ── Availability probe ──────────────────────────────────────────────

#[tokio::test]
async fn test_probe_runs_before_every_workflow_call() {
    let (server, client) = setup().await;

    // Exactly one probe per list call, never cached.
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/workflows/templates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(3)
        .mount(&server)
        .await;

    let service = WorkflowService::new(client);
    for _ in 0..3 {
        let (templates, source) = service.list_templates().await.unwrap();
        assert!(templates.is_empty());
        assert_eq!(source, WorkflowSource::Backend);
    }
}

#[tokio::test]
async fn test_failed_probe_falls_back_to_fixtures() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let service = WorkflowService::new(client);
    let (templates, source) = service.list_templates().await.unwrap();
    assert_eq!(source, WorkflowSource::Fixture);
    assert!(!templates.is_empty());

    // Only probes reached the wire.
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() == "/health"));
}

#[tokio::test]
async fn test_backend_errors_do_not_fall_back() {
    let (server, client) = setup().await;
    mount_health(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/workflows/instances"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "db down"})))
        .mount(&server)
        .await;

    let service = WorkflowService::new(client);
    let err = service.list_instances().await.unwrap_err();
    assert_eq!(err.to_string(), "db down");
}

// ── Offline workflow cancel ─────────────────────────────────────────

#[tokio::test]
async fn test_offline_cancel_then_relist_shows_cancelled() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let service = WorkflowService::new(client);

    let (instances, source) = service.list_instances().await.unwrap();
    assert_eq!(source, WorkflowSource::Fixture);
    let running = instances.iter().find(|i| i.id == "101").unwrap();
    assert_eq!(running.status, InstanceStatus::InProgress);

    let (cancelled, source) = service.cancel_instance("101").await.unwrap();
    assert_eq!(source, WorkflowSource::Fixture);
    assert_eq!(cancelled.status, InstanceStatus::Cancelled);

    let (instances, _) = service.list_instances().await.unwrap();
    let after = instances.iter().find(|i| i.id == "101").unwrap();
    assert_ne!(after.status, InstanceStatus::InProgress);

    // Every wire request was a probe; the fixture path stayed offline.
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() == "/health"));
}

#[tokio::test]
async fn test_offline_create_template_mints_id() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let service = WorkflowService::new(client);
    let body = json!({
        "name": "Rotate HMI credentials",
        "description": "Force a credential rotation on the HMI fleet",
        "threat_type": "Misconfiguration",
        "created_by": "tester",
        "actions": [{"type": "notify", "target": "ops", "description": "announce"}],
    });

    let (created, source) = service.create_template(&body).await.unwrap();
    assert_eq!(source, WorkflowSource::Fixture);
    assert!(created.id.parse::<u64>().is_ok());

    let (templates, _) = service.list_templates().await.unwrap();
    assert!(templates.iter().any(|t| t.id == created.id));
}
