//! Command round trips through the binary

use super::{stdout, Workspace};
use crate::common::{PageServer, Reply};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_add_list_sweep_remove() {
    let server = PageServer::start().await;
    server.set(
        "/product",
        Reply::html("<html><body><span class=\"price\">$19.99</span></body></html>"),
    );
    let workspace = Workspace::new();
    let url = server.url("/product");

    let added = workspace
        .run(&["add", "--owner", "42", &url, "//span[@class='price']", "Laptop", "price"])
        .await;
    assert!(added.status.success(), "{:?}", added);
    let out = stdout(&added);
    assert!(out.contains("Now tracking"));
    assert!(out.contains("Label: Laptop price"));
    assert!(out.contains("$19.99"));
    assert!(workspace.database().exists());

    let listed = workspace.run(&["list", "--owner", "42"]).await;
    let out = stdout(&listed);
    assert!(out.contains("1. Laptop price"));
    assert!(out.contains(&url));
    assert!(out.contains("ID: 1"));

    server.set(
        "/product",
        Reply::html("<html><body><span class=\"price\">$17.49</span></body></html>"),
    );
    let swept = workspace.run(&["sweep"]).await;
    assert!(swept.status.success());
    assert!(stdout(&swept).contains("1 processed: 1 changed"));

    let status = workspace.run(&["status", "--owner", "42"]).await;
    assert!(stdout(&status).contains("Content: $17.49"));

    let removed = workspace.run(&["remove", "--owner", "42", "1"]).await;
    assert!(removed.status.success());
    assert!(stdout(&removed).contains("Stopped tracking item 1"));

    let listed = workspace.run(&["list", "--owner", "42"]).await;
    assert!(stdout(&listed).contains("not tracking"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_owners_are_separate() {
    let server = PageServer::start().await;
    server.set("/", Reply::html("<html><body><h1>Hi</h1></body></html>"));
    let workspace = Workspace::new();

    let added = workspace
        .run(&["add", "--owner", "alice", &server.url("/"), "//h1"])
        .await;
    assert!(added.status.success());
    assert!(stdout(&added).contains("Label: No label"));

    let listed = workspace.run(&["list", "--owner", "bob"]).await;
    assert!(stdout(&listed).contains("not tracking"));
    let removed = workspace.run(&["remove", "--owner", "bob", "1"]).await;
    assert!(!removed.status.success());
}
