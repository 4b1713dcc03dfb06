mod support;

use std::sync::Arc;

use bytes::Bytes;
use pagepress_core::{PageConfigStore, Profile};
use pagepress_engine::{
    EngineEvent, FailureKind, ReqwestSubmitter, ServiceConfig, SubmitRequest, Submitter,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use support::TestSink;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(bytes: &'static [u8]) -> SubmitRequest {
    let mut store = PageConfigStore::default();
    store.initialize(2).unwrap();
    store.set_profile(1, Profile::High).unwrap();
    SubmitRequest {
        upload_id: 1,
        file_name: "report.pdf".to_string(),
        bytes: Bytes::from_static(bytes),
        snapshot: store.snapshot().unwrap(),
    }
}

fn submitter(server: &MockServer, chunk: usize) -> ReqwestSubmitter {
    let mut config = ServiceConfig::with_base_url(server.uri());
    config.upload_chunk_bytes = chunk;
    ReqwestSubmitter::new(config)
}

#[tokio::test]
async fn submit_returns_job_id_and_reports_upload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/processar"))
        .and(body_string_contains("name=\"config_map\""))
        .and(body_string_contains(r#"{"0":3,"1":4}"#))
        .and(body_string_contains("name=\"pdf\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jobId": "job-7"})))
        .expect(1)
        .mount(&server)
        .await;

    let sink = TestSink::new();
    let handle = submitter(&server, 4)
        .submit(request(b"%PDF-1.4 body"), Arc::new(sink.clone()))
        .await
        .expect("submit ok");
    assert_eq!(handle.id, "job-7");

    let progress: Vec<(u64, u64)> = sink
        .take()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::UploadProgress {
                upload_id: 1,
                sent,
                total,
            } => Some((sent, total)),
            _ => None,
        })
        .collect();
    assert_eq!(progress.first(), Some(&(0, 13)));
    assert_eq!(progress.last(), Some(&(13, 13)));
    assert!(progress.windows(2).all(|pair| pair[0].0 <= pair[1].0));
}

#[tokio::test]
async fn server_error_text_becomes_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/processar"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "not a pdf"})))
        .mount(&server)
        .await;

    let err = submitter(&server, 1024)
        .submit(request(b"junk"), Arc::new(TestSink::new()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(400));
    assert_eq!(err.reason, "not a pdf");
}

#[tokio::test]
async fn plain_server_error_gets_generic_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/processar"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = submitter(&server, 1024)
        .submit(request(b"%PDF"), Arc::new(TestSink::new()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(503));
    assert!(err.reason.contains("503"));
}

#[tokio::test]
async fn response_without_job_id_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/processar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let err = submitter(&server, 1024)
        .submit(request(b"%PDF"), Arc::new(TestSink::new()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidResponse);
}

#[tokio::test]
async fn unreachable_service_is_a_network_failure() {
    let config = ServiceConfig::with_base_url("http://127.0.0.1:9");
    let err = ReqwestSubmitter::new(config)
        .submit(request(b"%PDF"), Arc::new(TestSink::new()))
        .await
        .unwrap_err();
    assert!(matches!(err.kind, FailureKind::Network | FailureKind::Timeout));
}
