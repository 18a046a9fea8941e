//! End-to-end checks against a local mock server

use page_analyzer::fetch::FetcherConfig;
use page_analyzer::{
    CheckStatus, Database, FetchErrorKind, HttpFetcher, PageAnalyzer, RegistrationStatus,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn analyzer_with(config: FetcherConfig) -> PageAnalyzer {
    let db = Database::open_in_memory().unwrap();
    let fetcher = HttpFetcher::new(config).unwrap();
    PageAnalyzer::new(Arc::new(db), Arc::new(fetcher))
}

#[tokio::test]
async fn register_then_check_records_page_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><head><title>Example</title></head><body></body></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let analyzer = analyzer_with(FetcherConfig::default());

    let registration = analyzer
        .register_site(&format!("{}/page?x=1", server.uri()))
        .unwrap();
    assert_eq!(registration.status, RegistrationStatus::Created);
    assert_eq!(registration.site.name, server.uri());

    let outcome = analyzer.run_check(registration.site.id).await.unwrap();
    assert_eq!(outcome.status, CheckStatus::Ok);
    assert_eq!(outcome.check.status_code, Some(200));
    assert_eq!(outcome.check.title, "Example");
    assert_eq!(outcome.check.h1, "");
    assert_eq!(outcome.check.description, "");

    let detail = analyzer.site_detail(registration.site.id).unwrap();
    assert_eq!(detail.checks, vec![outcome.check]);
}

#[tokio::test]
async fn server_errors_are_recorded_as_checks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<h1>Oops</h1>"))
        .mount(&server)
        .await;

    let analyzer = analyzer_with(FetcherConfig::default());
    let site = analyzer.register_site(&server.uri()).unwrap().site;

    let outcome = analyzer.run_check(site.id).await.unwrap();
    assert!(outcome.is_ok());
    assert_eq!(outcome.check.status_code, Some(500));
    assert_eq!(outcome.check.h1, "Oops");
}

#[tokio::test]
async fn timed_out_fetch_is_recorded_as_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let analyzer = analyzer_with(FetcherConfig {
        timeout: Duration::from_millis(200),
        ..Default::default()
    });
    let site = analyzer.register_site(&server.uri()).unwrap().site;

    let outcome = analyzer.run_check(site.id).await.unwrap();
    match &outcome.status {
        CheckStatus::FetchFailed { error } => assert_eq!(error.kind, FetchErrorKind::Timeout),
        other => panic!("expected fetch failure, got {other:?}"),
    }
    assert_eq!(outcome.check.status_code, None);

    let checks = analyzer.site_detail(site.id).unwrap().checks;
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0].status_code, None);
}

#[tokio::test]
async fn latest_check_shows_up_in_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>v1</title>"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<title>gone</title>"))
        .mount(&server)
        .await;

    let analyzer = analyzer_with(FetcherConfig::default());
    let site = analyzer.register_site(&server.uri()).unwrap().site;

    analyzer.run_check(site.id).await.unwrap();
    analyzer.run_check(site.id).await.unwrap();

    let sites = analyzer.list_sites().unwrap();
    assert_eq!(sites.len(), 1);
    let latest = sites[0].latest_check.as_ref().unwrap();
    assert_eq!(latest.status_code, Some(404));
    assert_eq!(latest.title, "gone");
}
