//! Rejected input and configuration problems

use super::{stderr, Workspace};
use crate::common::{PageServer, Reply};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_invalid_url() {
    let workspace = Workspace::new();

    let output = workspace
        .run(&["add", "--owner", "42", "ftp://files.example/x", "//h1"])
        .await;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Invalid URL format"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_no_match_and_missing_page() {
    let server = PageServer::start().await;
    server.set("/", Reply::html("<html><body><p>text</p></body></html>"));
    let workspace = Workspace::new();

    let no_match = workspace
        .run(&["add", "--owner", "42", &server.url("/"), "//h1"])
        .await;
    let missing = workspace
        .run(&["add", "--owner", "42", &server.url("/gone"), "//h1"])
        .await;

    assert_eq!(no_match.status.code(), Some(1));
    assert!(stderr(&no_match).contains("Could not extract content"));
    assert_eq!(missing.status.code(), Some(1));
    assert!(stderr(&missing).contains("Could not extract content"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_limit_message_names_the_cap() {
    let server = PageServer::start().await;
    server.set("/", Reply::html("<html><body><h1>Hi</h1></body></html>"));
    let workspace = Workspace::new();
    std::fs::write(
        workspace.path().join("pagewatch.toml"),
        "[watch]\nmax_items_per_owner = 1\n",
    )
    .unwrap();

    let first = workspace
        .run(&["add", "--owner", "42", &server.url("/"), "//h1"])
        .await;
    let second = workspace
        .run(&["add", "--owner", "42", &server.url("/"), "//h1"])
        .await;

    assert!(first.status.success());
    assert_eq!(second.status.code(), Some(1));
    assert!(stderr(&second).contains("at most 1 items"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_missing_config_file() {
    let workspace = Workspace::new();
    std::fs::remove_file(workspace.path().join("pagewatch.toml")).unwrap();

    let output = workspace.run(&["list", "--owner", "42"]).await;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("does not exist"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_invalid_config_value() {
    let workspace = Workspace::new();
    std::fs::write(
        workspace.path().join("pagewatch.toml"),
        "[notify]\nbackend = \"telegram\"\n",
    )
    .unwrap();

    let output = workspace.run(&["sweep"]).await;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("telegram_token"));
}
