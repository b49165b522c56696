use anyhow::Result;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use blt::{Blt, ConnectionConfig, HttpLedgerClient, LedgerClient, LedgerError};
use blt_common::{
    api::Confirmation,
    transaction::{Operation, TransactionFactory},
};

// ════════════════════════════════════════════════════════════════════════
// HELPER FUNCTIONS
// ════════════════════════════════════════════════════════════════════════

fn connection(server: &MockServer) -> ConnectionConfig {
    let address = server.address();
    ConnectionConfig::new("http", address.ip().to_string()).with_port(address.port().to_string())
}

// Commits whatever it receives by echoing it back, like a node in commit mode
struct EchoNode;

impl Respond for EchoNode {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        ResponseTemplate::new(202).set_body_bytes(request.body.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════
// SUBMISSION TESTS
// ════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_submit_posts_to_commit_endpoint() -> Result<()> {
    let server = MockServer::start().await;
    let tx = TransactionFactory::new().build_creation("http-submit", 0)?;

    Mock::given(method("POST"))
        .and(path("/api/v1/transactions"))
        .and(query_param("mode", "commit"))
        .and(body_json(&tx))
        .respond_with(ResponseTemplate::new(202).set_body_json(&tx))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpLedgerClient::new(&connection(&server))?;
    let confirmation = client.submit_and_confirm(&tx).await?;

    assert_eq!(confirmation, Confirmation::new(tx.id().clone(), Operation::Create));

    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests[0].headers.get("app_id").is_none());
    assert!(requests[0].headers.get("app_key").is_none());
    Ok(())
}

#[tokio::test]
async fn test_submit_keeps_api_path_without_trailing_slash() -> Result<()> {
    let server = MockServer::start().await;
    let tx = TransactionFactory::new().build_creation("http-api-path", 0)?;

    Mock::given(method("POST"))
        .and(path("/ledger/api/v1/transactions"))
        .and(query_param("mode", "commit"))
        .respond_with(ResponseTemplate::new(202).set_body_json(&tx))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpLedgerClient::new(&connection(&server).with_api_path("/ledger/api/v1"))?;
    let confirmation = client.submit_and_confirm(&tx).await?;

    assert_eq!(&confirmation.id, tx.id());
    Ok(())
}

#[tokio::test]
async fn test_submit_sends_credentials() -> Result<()> {
    let server = MockServer::start().await;
    let tx = TransactionFactory::new().build_creation("http-credentials", 0)?;

    Mock::given(method("POST"))
        .and(header("app_id", "my-app"))
        .and(header("app_key", "my-key"))
        .respond_with(ResponseTemplate::new(202).set_body_json(&tx))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpLedgerClient::new(&connection(&server).with_credentials("my-app", "my-key"))?;
    client.submit_and_confirm(&tx).await?;
    Ok(())
}

#[tokio::test]
async fn test_submit_maps_rejection() -> Result<()> {
    let server = MockServer::start().await;
    let tx = TransactionFactory::new().build_creation("http-rejected", 0)?;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid transaction"))
        .mount(&server)
        .await;

    let client = HttpLedgerClient::new(&connection(&server))?;
    let err = client.submit_and_confirm(&tx).await.unwrap_err();

    match err {
        LedgerError::Rejected { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "invalid transaction");
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_submit_rejects_unrelated_confirmation() -> Result<()> {
    let server = MockServer::start().await;
    let factory = TransactionFactory::new();
    let tx = factory.build_creation("http-mismatch", 0)?;
    let other = factory.build_creation("http-mismatch", 1)?;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202).set_body_json(&other))
        .mount(&server)
        .await;

    let client = HttpLedgerClient::new(&connection(&server))?;
    let err = client.submit_and_confirm(&tx).await.unwrap_err();

    assert!(matches!(err, LedgerError::Decode(_)));
    Ok(())
}

#[tokio::test]
async fn test_submit_maps_garbage_body() -> Result<()> {
    let server = MockServer::start().await;
    let tx = TransactionFactory::new().build_creation("http-garbage", 0)?;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = HttpLedgerClient::new(&connection(&server))?;
    let err = client.submit_and_confirm(&tx).await.unwrap_err();

    assert!(matches!(err, LedgerError::Decode(_)));
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════
// FETCH TESTS
// ════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_fetch_returns_canonical_record() -> Result<()> {
    let server = MockServer::start().await;
    let tx = TransactionFactory::new().build_creation("http-fetch", 0)?;

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/transactions/{}", tx.id().to_hex())))
        .respond_with(ResponseTemplate::new(200).set_body_json(&tx))
        .mount(&server)
        .await;

    let client = HttpLedgerClient::new(&connection(&server))?;
    let fetched = client.fetch_confirmed(tx.id()).await?;

    assert_eq!(fetched, tx);
    fetched.verify()?;
    Ok(())
}

#[tokio::test]
async fn test_fetch_maps_not_found() -> Result<()> {
    let server = MockServer::start().await;
    let tx = TransactionFactory::new().build_creation("http-missing", 0)?;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = HttpLedgerClient::new(&connection(&server))?;
    let err = client.fetch_confirmed(tx.id()).await.unwrap_err();

    assert!(matches!(err, LedgerError::NotFound(id) if &id == tx.id()));
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════
// NODE INFO TESTS
// ════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_node_info_from_root_url() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "api": {
                "v1": {
                    "assets": "/api/v1/assets/",
                    "docs": "https://docs.example.com/http-api",
                    "streams": "ws://localhost:9985/api/v1/streams/valid_transactions",
                    "transactions": "/api/v1/transactions/"
                }
            },
            "docs": "https://docs.example.com/server",
            "keyring": [],
            "public_key": "NC8c8rYcAhyKVpx1PCV65CBmyq4YUbLysy3Rqrg8L8mz",
            "software": "ledger-node",
            "version": "2.2.2"
        })))
        .mount(&server)
        .await;

    let client = HttpLedgerClient::new(&connection(&server))?;
    let info = client.get_node_info().await?;

    assert_eq!(info.api.version, "v1");
    assert_eq!(info.api.transactions, "/api/v1/transactions/");
    assert_eq!(info.version, "2.2.2");
    assert!(info.keyring.is_empty());
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════
// END TO END
// ════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_batch_over_http() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/transactions"))
        .respond_with(EchoNode)
        .expect(3)
        .mount(&server)
        .await;

    let blt = Blt::new(&connection(&server))?;
    let result = blt.run_create_batch("http-batch", 3, None).await?;

    assert_eq!(result.transaction_count(), 3);
    for (tx, response) in result.transactions().iter().zip(result.responses()) {
        assert_eq!(&response.id, tx.id());
    }
    Ok(())
}

#[tokio::test]
async fn test_client_is_shareable() -> Result<()> {
    let server = MockServer::start().await;
    let client: Arc<dyn LedgerClient> = Arc::new(HttpLedgerClient::new(&connection(&server))?);
    let blt = Blt::with_client(client);

    let result = blt.run_create_batch("http-empty", 0, None).await?;
    assert_eq!(result.transaction_count(), 0);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
    Ok(())
}
