//! API Tests - HTTP Contract of the Ledger Server
//!
//! Boots the real router on an ephemeral port backed by a temporary data
//! directory and drives it with reqwest.

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::StatusCode;
use rust_decimal_macros::dec;
use serde_json::{Value, json};

use bet_ledger::adapters::api::{ApiSettings, AppState, ErrorBody, router};
use bet_ledger::adapters::metrics::{HealthServer, HealthState, MetricsRegistry};
use bet_ledger::adapters::persistence::RepositoryImpl;
use bet_ledger::usecases::ledger::LedgerPolicy;
use bet_ledger::usecases::service::LedgerService;

struct TestServer {
    base: String,
    client: reqwest::Client,
    metrics: Arc<MetricsRegistry>,
}

impl TestServer {
    async fn start() -> Self {
        let dir = std::env::temp_dir().join(format!("bet-ledger-api-{}", uuid::Uuid::new_v4()));
        let repo = Arc::new(RepositoryImpl::from_data_dir(&dir).await.unwrap());
        let service = Arc::new(
            LedgerService::load(repo, LedgerPolicy::default())
                .await
                .unwrap(),
        );
        let metrics = Arc::new(MetricsRegistry::new().unwrap());
        let app = router(AppState {
            service,
            metrics: Some(Arc::clone(&metrics)),
            settings: ApiSettings {
                low_balance_threshold: dec!(150),
                history_limit: 30,
            },
        });

        let base = spawn(app).await;
        Self {
            base,
            client: reqwest::Client::new(),
            metrics,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let resp = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn error(&self, method: reqwest::Method, path: &str, body: Value) -> (StatusCode, ErrorBody) {
        let resp = self
            .client
            .request(method, self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn create_account(&self, name: &str, cash: &str, freebet: &str) -> u64 {
        let (status, body) = self
            .post(
                "/api/accounts",
                json!({
                    "name": name,
                    "provider": "bet365",
                    "cashBalance": cash,
                    "freebetBalance": freebet,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_u64().unwrap()
    }
}

async fn spawn(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn decimal(value: &Value) -> rust_decimal::Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}

#[tokio::test]
async fn test_place_and_resolve_freebet_operation() {
    let server = TestServer::start().await;
    let alpha = server.create_account("Alpha", "500", "0").await;
    let beta = server.create_account("Beta", "0", "50").await;

    let (status, quote) = server
        .post(
            "/api/operations/quote",
            json!({ "legs": [
                { "odd": "2.10", "stakes": [{ "accountId": alpha, "amount": "100" }] },
                { "odd": "3.00", "stakes": [{ "accountId": beta, "amount": "50", "isFreebet": true }] },
            ]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&quote["legs"][1]["potentialReturn"]), dec!(100));

    let (status, placed) = server
        .post(
            "/api/operations",
            json!({
                "gameName": "Team A x Team B",
                "category": "sports",
                "legs": [
                    { "odd": "2.10", "stakes": [{ "accountId": alpha, "amount": "100" }] },
                    { "odd": "3.00", "stakes": [{ "accountId": beta, "amount": "50", "isFreebet": true }] },
                ],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{placed}");
    let operation_id = placed["operationId"].as_str().unwrap().to_string();

    let (status, resolved) = server
        .post(
            &format!("/api/operations/{operation_id}/resolve"),
            json!({ "winningLegIndex": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{resolved}");
    assert_eq!(resolved["status"], "won");

    let (_, accounts) = server.get("/api/accounts").await;
    assert_eq!(decimal(&accounts[0]["cashBalance"]), dec!(400));
    assert_eq!(decimal(&accounts[1]["cashBalance"]), dec!(100));
    assert_eq!(decimal(&accounts[1]["freebetBalance"]), dec!(0));

    let (status, history) = server.get(&format!("/api/transactions?accountId={beta}&limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["kind"], "bet_won");

    let (status, again) = server
        .post(&format!("/api/operations/{operation_id}/resolve"), json!({ "lost": true }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(again["kind"], "invalid_state");

    assert_eq!(
        server
            .metrics
            .operations_resolved
            .with_label_values(&["won"])
            .get(),
        1
    );
}

#[tokio::test]
async fn test_error_kinds_map_to_status_codes() {
    let server = TestServer::start().await;
    let alpha = server.create_account("Alpha", "20", "0").await;

    let (status, body) = server
        .post(
            "/api/operations",
            json!({
                "gameName": "Cup",
                "category": "sports",
                "legs": [{ "odd": "2.0", "stakes": [{ "accountId": alpha, "amount": "50" }] }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let (status, body) = server
        .post(
            &format!("/api/operations/{}/resolve", uuid::Uuid::new_v4()),
            json!({ "lost": true }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    let (status, body) = server.post("/api/transactions", json!({ "nonsense": 1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let (status, _) = server.get("/api/transactions?accountId=999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // the rejected JSON body is counted as well as the ledger rejection
    assert_eq!(server.metrics.errors.with_label_values(&["validation"]).get(), 2);
}

#[tokio::test]
async fn test_malformed_path_ids_get_json_errors() {
    let server = TestServer::start().await;
    server.create_account("Alpha", "100", "0").await;

    let (status, body) = server
        .error(reqwest::Method::DELETE, "/api/accounts/not-a-number", Value::Null)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.kind, "validation");
    assert!(!body.error.is_empty());

    let (status, body) = server
        .error(
            reqwest::Method::POST,
            "/api/operations/not-a-uuid/resolve",
            json!({ "lost": true }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.kind, "validation");

    let (status, body) = server
        .error(reqwest::Method::DELETE, "/api/transactions/-1", Value::Null)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.kind, "validation");

    assert_eq!(server.metrics.errors.with_label_values(&["validation"]).get(), 3);
}

#[tokio::test]
async fn test_out_of_range_odd_is_rejected_not_panicking() {
    let server = TestServer::start().await;
    let alpha = server.create_account("Alpha", "100", "0").await;
    let legs = json!([
        { "odd": "10000000000000000000000000000", "stakes": [{ "accountId": alpha, "amount": "10" }] },
    ]);

    let (status, body) = server
        .error(reqwest::Method::POST, "/api/operations/quote", json!({ "legs": legs }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.kind, "validation");

    let (status, body) = server
        .error(
            reqwest::Method::POST,
            "/api/operations",
            json!({ "gameName": "Longshot", "category": "sports", "legs": legs }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.kind, "validation");

    // the server is still serving
    let (status, accounts) = server.get("/api/accounts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&accounts[0]["cashBalance"]), dec!(100));
}

#[tokio::test]
async fn test_reverse_transaction_restores_balance() {
    let server = TestServer::start().await;
    let alpha = server.create_account("Alpha", "100", "0").await;

    let (status, tx) = server
        .post(
            "/api/transactions",
            json!({ "accountId": alpha, "kind": "expense", "amount": "30", "description": "tools" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let tx_id = tx["id"].as_u64().unwrap();

    let resp = server
        .client
        .delete(server.url(&format!("/api/transactions/{tx_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (_, accounts) = server.get("/api/accounts").await;
    assert_eq!(decimal(&accounts[0]["cashBalance"]), dec!(100));

    let resp = server
        .client
        .delete(server.url(&format!("/api/transactions/{tx_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_account_lifecycle_and_reports() {
    let server = TestServer::start().await;
    let alpha = server.create_account("Alpha", "100", "0").await;
    let beta = server.create_account("Beta", "300", "0").await;

    let (status, moved) = server
        .post(
            "/api/transfers",
            json!({ "fromAccountId": beta, "toAccountId": alpha, "amount": "60" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&moved["debit"]["amount"]), dec!(-60));

    let (status, statuses) = server.get("/api/accounts/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(statuses[0]["needsDeposit"], false);
    assert_eq!(statuses[1]["needsDeposit"], false);

    let resp = server
        .client
        .delete(server.url(&format!("/api/accounts/{beta}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let (_, active) = server.get("/api/accounts").await;
    assert_eq!(active.as_array().unwrap().len(), 1);
    let (_, all) = server.get("/api/accounts?includeInactive=true").await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (status, summary) = server.get("/api/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&summary["credits"]), dec!(460));
    assert_eq!(decimal(&summary["debits"]), dec!(60));

    let (status, report) = server.get("/api/report").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["months"].as_array().unwrap().len(), 12);
    assert_eq!(report["accounts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_probe_server_reports_readiness_and_metrics() {
    let health = Arc::new(HealthState::new());
    let metrics = Arc::new(MetricsRegistry::new().unwrap());
    metrics.record_error("not_found");
    let server = HealthServer::new(Arc::clone(&health), Some(metrics), 0);
    let base = spawn(server.router()).await;
    let client = reqwest::Client::new();

    let ready = client.get(format!("{base}/ready")).send().await.unwrap();
    assert_eq!(ready.status(), StatusCode::OK);

    let text = client
        .get(format!("{base}/metrics"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(text.contains("bet_ledger_errors_total"));

    health.stop_accepting();
    let ready = client.get(format!("{base}/ready")).send().await.unwrap();
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
    let live = client.get(format!("{base}/live")).send().await.unwrap();
    assert_eq!(live.status(), StatusCode::OK);
}
