mod common;

use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::json;
use tiny_http::{Method, Response, Server, StatusCode};

use common::{keypair, network, payment_request};
use ledgerpay_adapters::{AdapterConfig, LedgerGatewayAdapter, LocalSigner};
use ledgerpay_core::{
    build_envelope, LedgerGateway, PaymentIntent, PortError, TransferSigner,
};

fn spawn_mock_gateway(
    calls: Arc<Mutex<Vec<String>>>,
    reject_submissions: bool,
) -> (String, thread::JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").expect("start server");
    let addr = format!("http://{}", server.server_addr());
    let (_, source) = keypair(1);
    let source_path = format!("/accounts/{source}");

    let join = thread::spawn(move || {
        for _ in 0..16 {
            let req = match server.recv() {
                Ok(r) => r,
                Err(_) => break,
            };
            let method = req.method().clone();
            let path = req.url().to_owned();
            if let Ok(mut g) = calls.lock() {
                g.push(path.clone());
            }

            let (code, payload) = match (method, path.as_str()) {
                (Method::Get, p) if p == source_path => (
                    200,
                    json!({
                        "id": source.to_string(),
                        "sequence": 41,
                        "balances": [{"asset": "native", "amount": "50"}]
                    }),
                ),
                (Method::Get, "/fee_stats") => {
                    (200, json!({"last_ledger_base_fee": "150"}))
                }
                (Method::Post, "/transactions") if reject_submissions => (
                    400,
                    json!({"extras": {"result_codes": {"transaction": "tx_bad_seq"}}}),
                ),
                (Method::Post, "/transactions") => (
                    200,
                    json!({"id": "abc123", "result_code": "tx_success", "ledger": 812}),
                ),
                (Method::Get, "/transactions/abc123") => (
                    200,
                    json!({"id": "abc123", "successful": true, "result_code": "tx_success"}),
                ),
                _ => (404, json!({"error": "not found"})),
            };

            let response =
                Response::from_string(payload.to_string()).with_status_code(StatusCode(code));
            let _ = req.respond(response);
        }
    });

    (addr, join)
}

fn http_gateway(base_url: String) -> LedgerGatewayAdapter {
    let config = AdapterConfig {
        gateway_base_url: Some(base_url),
        gateway_timeout_ms: 5_000,
        ..AdapterConfig::default()
    };
    LedgerGatewayAdapter::with_config(&config).expect("gateway construction")
}

async fn signed_fixture(
    gateway: &LedgerGatewayAdapter,
) -> ledgerpay_core::SignedEnvelope {
    let (source_key, source) = keypair(1);
    let (_, dest) = keypair(2);
    let snapshot = gateway.load_account(&source).await.expect("load account");
    assert_eq!(snapshot.sequence, 41);
    let intent = PaymentIntent::from_request(&payment_request(dest, "10")).expect("intent");
    let envelope = build_envelope(&snapshot, &intent, 100, &network(), 1_800_000_000);
    LocalSigner::from_signing_key(source_key)
        .sign(&envelope)
        .await
        .expect("sign")
}

#[tokio::test]
async fn http_gateway_loads_fees_submits_and_looks_up() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let (base_url, _join) = spawn_mock_gateway(Arc::clone(&calls), false);
    let gateway = http_gateway(base_url);

    let signed = signed_fixture(&gateway).await;

    let fee = gateway.fetch_base_fee().await.expect("fee");
    assert_eq!(fee, 150);

    let receipt = gateway.submit(&signed).await.expect("submit");
    assert_eq!(receipt.id, "abc123");
    assert_eq!(receipt.result_code, "tx_success");
    assert_eq!(receipt.raw.get("ledger").and_then(|v| v.as_u64()), Some(812));

    let record = gateway.fetch_transaction("abc123").await.expect("lookup");
    assert!(record.successful);

    let calls = calls.lock().expect("call log");
    assert!(calls.iter().any(|p| p.starts_with("/accounts/")));
    assert!(calls.iter().any(|p| p == "/fee_stats"));
    assert!(calls.iter().any(|p| p == "/transactions"));
    assert!(calls.iter().any(|p| p == "/transactions/abc123"));
}

#[tokio::test]
async fn ledger_rejection_carries_the_result_code() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let (base_url, _join) = spawn_mock_gateway(Arc::clone(&calls), true);
    let gateway = http_gateway(base_url);

    let signed = signed_fixture(&gateway).await;
    let err = gateway.submit(&signed).await.expect_err("rejected");
    match err {
        PortError::Rejected { code, raw } => {
            assert_eq!(code, "tx_bad_seq");
            assert_eq!(
                raw.pointer("/extras/result_codes/transaction").and_then(|v| v.as_str()),
                Some("tx_bad_seq")
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn missing_account_maps_to_not_found() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let (base_url, _join) = spawn_mock_gateway(Arc::clone(&calls), false);
    let gateway = http_gateway(base_url);

    let (_, stranger) = keypair(9);
    let err = gateway
        .load_account(&stranger)
        .await
        .expect_err("unknown account");
    assert!(matches!(err, PortError::NotFound(_)));
}

#[tokio::test]
async fn unreachable_gateway_is_a_transport_error() {
    // Nothing listens here.
    let gateway = http_gateway("http://127.0.0.1:9".to_owned());
    let (_, source) = keypair(1);
    let err = gateway
        .load_account(&source)
        .await
        .expect_err("connection must fail");
    assert!(matches!(err, PortError::Transport(_)));
}
