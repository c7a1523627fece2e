//! Integration tests for ddbwire against a DynamoDB-compatible endpoint.
//!
//! These tests require a running endpoint (DynamoDB Local, or any compatible
//! server) at `DYNAMODB_ENDPOINT_URL`, defaulting to `localhost:8000`.
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p ddbwire-integration -- --ignored
//! ```

use std::sync::Once;
use std::time::Duration;

use anyhow::Context;
use ddbwire_auth::{Credentials, StaticCredentials};
use ddbwire_core::{Client, ClientConfig};
use ddbwire_http::ReqwestHttpClient;
use ddbwire_model::Operation;
use serde_json::json;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
fn endpoint_url() -> String {
    std::env::var("DYNAMODB_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:8000".to_owned())
}

/// Create a client pointing at the test endpoint.
pub fn client() -> anyhow::Result<Client> {
    init_tracing();

    let credentials = StaticCredentials::new(Credentials::new("test", "test"));
    let config = ClientConfig::new("us-east-1").with_endpoint(endpoint_url());
    Client::new(ReqwestHttpClient::new(), credentials, config).context("failed to build client")
}

/// Generate a unique table name for a test.
#[must_use]
pub fn test_table_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Create a table keyed by string `pk` and, if given, string `sort_key`, then
/// wait until it is active.
pub async fn create_table(client: &Client, name: &str, sort_key: Option<&str>) -> anyhow::Result<()> {
    let mut key_schema = vec![json!({"AttributeName": "pk", "KeyType": "HASH"})];
    let mut definitions = vec![json!({"AttributeName": "pk", "AttributeType": "S"})];
    if let Some(sk) = sort_key {
        key_schema.push(json!({"AttributeName": sk, "KeyType": "RANGE"}));
        definitions.push(json!({"AttributeName": sk, "AttributeType": "S"}));
    }

    let _: serde_json::Value = client
        .send_request(
            Operation::CreateTable,
            &json!({
                "TableName": name,
                "KeySchema": key_schema,
                "AttributeDefinitions": definitions,
                "BillingMode": "PAY_PER_REQUEST",
            }),
        )
        .await
        .with_context(|| format!("failed to create table {name}"))?;

    for _ in 0..50 {
        let desc: serde_json::Value = client
            .send_request(Operation::DescribeTable, &json!({"TableName": name}))
            .await?;
        if desc["Table"]["TableStatus"] == "ACTIVE" {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    anyhow::bail!("table {name} never became active")
}

/// Delete a table, ignoring errors.
pub async fn delete_table(client: &Client, name: &str) {
    let _: Result<serde_json::Value, _> = client
        .send_request(Operation::DeleteTable, &json!({"TableName": name}))
        .await;
}

mod test_items;
mod test_query;
