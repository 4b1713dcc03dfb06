use std::fs;

use pagepress_engine::{Downloader, FailureKind, ReqwestDownloader, ServiceConfig};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn download_saves_under_optimized_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/j1/report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-small", "application/pdf"))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let out = temp.path().join("results");
    let saved = ReqwestDownloader::new(ServiceConfig::with_base_url(server.uri()))
        .download("j1", None, "report.pdf", &out)
        .await
        .expect("download ok");

    assert_eq!(saved, out.join("optimized_report.pdf"));
    assert_eq!(fs::read(&saved).unwrap(), b"%PDF-small");
}

#[tokio::test]
async fn download_uses_announced_server_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/j2/report_min.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF", "application/pdf"))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let saved = ReqwestDownloader::new(ServiceConfig::with_base_url(server.uri()))
        .download("j2", Some("report_min.pdf"), "report.pdf", temp.path())
        .await
        .expect("download ok");
    assert_eq!(saved.file_name().unwrap(), "report_min.pdf");
}

#[tokio::test]
async fn missing_result_leaves_no_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let err = ReqwestDownloader::new(ServiceConfig::with_base_url(server.uri()))
        .download("j3", None, "report.pdf", temp.path())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}
