//! HTTP extraction integration tests
//!
//! Runs the real extractor against an in-process server.

mod common;

use std::time::Duration;

use common::{PageServer, Reply};
use pagewatch::extract::api::{
    ExtractError, Extractor, FetchSettings, HttpExtractor, DEFAULT_USER_AGENT,
};

const SHOP: &str = r#"<!DOCTYPE html>
<html>
  <head><title>Shop</title></head>
  <body>
    <h1>  Laptop  </h1>
    <span class="price">$999</span>
    <a href="/next" class="nav">Next</a>
  </body>
</html>"#;

const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Release notes</title>
    <item><title>v1.2</title></item>
  </channel>
</rss>"#;

fn extractor(timeout: Duration) -> HttpExtractor {
    HttpExtractor::new(FetchSettings {
        timeout,
        ..FetchSettings::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_extracts_matched_html_text() {
    let server = PageServer::start().await;
    server.set("/shop", Reply::html(SHOP));
    let extractor = extractor(Duration::from_secs(5));

    let heading = extractor.extract(&server.url("/shop"), "//h1").await.unwrap();
    let price = extractor
        .extract(&server.url("/shop"), "//span[@class='price']")
        .await
        .unwrap();
    let link = extractor
        .extract(&server.url("/shop"), "//a[@class='nav']/@href")
        .await
        .unwrap();

    assert_eq!(heading, "Laptop");
    assert_eq!(price, "$999");
    assert_eq!(link, "/next");
}

#[tokio::test]
async fn test_xml_document_falls_back_past_html() {
    let server = PageServer::start().await;
    server.set("/feed.xml", Reply::xml(FEED));

    let title = extractor(Duration::from_secs(5))
        .extract(&server.url("/feed.xml"), "/rss/channel/item/title")
        .await
        .unwrap();

    assert_eq!(title, "v1.2");
}

#[tokio::test]
async fn test_http_error_status_is_a_fetch_failure() {
    let server = PageServer::start().await;

    let err = extractor(Duration::from_secs(5))
        .extract(&server.url("/missing"), "//h1")
        .await
        .unwrap_err();

    match err {
        ExtractError::Fetch { status, .. } => assert_eq!(status, Some(404)),
        other => panic!("expected fetch failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unanswered_request_times_out() {
    let server = PageServer::start().await;
    server.set("/slow", Reply::Hang);

    let started = std::time::Instant::now();
    let err = extractor(Duration::from_millis(200))
        .extract(&server.url("/slow"), "//h1")
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::Timeout { timeout_ms: 200, .. }));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_selector_without_match() {
    let server = PageServer::start().await;
    server.set("/shop", Reply::html(SHOP));

    let err = extractor(Duration::from_secs(5))
        .extract(&server.url("/shop"), "//table")
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::NoMatch { .. }));
}

#[tokio::test]
async fn test_invalid_selector_is_rejected_without_fetching() {
    let server = PageServer::start().await;
    server.set("/shop", Reply::html(SHOP));

    let err = extractor(Duration::from_secs(5))
        .extract(&server.url("/shop"), "//h1[")
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::InvalidSelector { .. }));
    assert_eq!(server.requests(), 0);
}

#[tokio::test]
async fn test_browser_user_agent_is_sent() {
    let server = PageServer::start().await;
    server.set("/shop", Reply::html(SHOP));

    extractor(Duration::from_secs(5))
        .extract(&server.url("/shop"), "//h1")
        .await
        .unwrap();
    HttpExtractor::new(FetchSettings {
        user_agent: "pagewatch-test/1.0".to_string(),
        ..FetchSettings::default()
    })
    .unwrap()
    .extract(&server.url("/shop"), "//h1")
    .await
    .unwrap();

    assert_eq!(
        server.user_agents(),
        vec![
            DEFAULT_USER_AGENT.to_string(),
            "pagewatch-test/1.0".to_string()
        ]
    );
}

#[tokio::test]
async fn test_refused_connection_is_a_fetch_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);

    let err = extractor(Duration::from_secs(5))
        .extract(&url, "//h1")
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::Fetch { status: None, .. }));
}
