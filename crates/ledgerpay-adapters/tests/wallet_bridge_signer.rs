mod common;

use std::io::Read as _;
use std::thread;

use ed25519_dalek::{Signer as _, SigningKey};
use serde_json::{json, Value};
use tiny_http::{Method, Response, Server, StatusCode};

use common::{keypair, network, payment_request};
use ledgerpay_adapters::{
    AdapterConfig, BridgeDecision, LedgerGatewayAdapter, RuntimeProfile, SystemClock,
    WalletBridgeSigner,
};
use ledgerpay_core::{
    DecoratedSignature, PaymentWorkflow, PortError, SignedEnvelope, SubmitError,
    TransactionEnvelope, TransferSigner,
};

#[tokio::test]
async fn scripted_approval_confirms_a_payment_end_to_end() {
    let (key, source) = keypair(1);
    let (_, dest) = keypair(2);
    let gateway = LedgerGatewayAdapter::in_memory();
    gateway.seed_account(source, 41, "50").expect("seed source");
    gateway.seed_account(dest, 7, "20").expect("seed dest");

    let signer = WalletBridgeSigner::scripted(key, BridgeDecision::Approve);
    let wf = PaymentWorkflow::new(gateway, signer, SystemClock, network());

    let confirmed = wf
        .submit_payment(payment_request(dest, "10"))
        .await
        .expect("approved payment confirms");
    assert_eq!(confirmed.result_code, "tx_success");
}

#[tokio::test]
async fn scripted_rejection_surfaces_as_signing_rejected() {
    let (key, source) = keypair(1);
    let (_, dest) = keypair(2);
    let gateway = LedgerGatewayAdapter::in_memory();
    gateway.seed_account(source, 41, "50").expect("seed source");
    gateway.seed_account(dest, 7, "20").expect("seed dest");

    let signer = WalletBridgeSigner::scripted(key, BridgeDecision::Reject);
    let wf = PaymentWorkflow::new(gateway, signer, SystemClock, network());

    let err = wf
        .submit_payment(payment_request(dest, "10"))
        .await
        .expect_err("dismissed prompt must fail");
    match err {
        SubmitError::SigningRejected(msg) => assert!(msg.contains("user_declined")),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

/// Bridge fixture that behaves like a wallet: answers its address, and signs
/// or rejects whatever envelope it is handed.
fn spawn_mock_bridge(key: SigningKey, approve: bool) -> (String, thread::JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").expect("start server");
    let addr = format!("http://{}", server.server_addr());
    let account = ledgerpay_core::AccountId::from_bytes(key.verifying_key().to_bytes());

    let join = thread::spawn(move || {
        for _ in 0..8 {
            let mut req = match server.recv() {
                Ok(r) => r,
                Err(_) => break,
            };
            let method = req.method().clone();
            let path = req.url().to_owned();

            let (code, payload) = match (method, path.as_str()) {
                (Method::Get, "/address") => (200, json!({ "address": account.to_string() })),
                (Method::Post, "/sign") if !approve => (
                    200,
                    json!({ "status": "rejected", "reason": "user dismissed the prompt" }),
                ),
                (Method::Post, "/sign") => {
                    let mut body = String::new();
                    let _ = req.as_reader().read_to_string(&mut body);
                    let parsed: Value = serde_json::from_str(&body).expect("sign request json");
                    let encoded = parsed
                        .get("tx")
                        .and_then(|v| v.as_str())
                        .expect("sign request carries tx");
                    let envelope =
                        TransactionEnvelope::decode_base64(encoded).expect("decodable envelope");
                    let hash = envelope.hash().expect("hash");
                    let signature = key.sign(&hash);
                    let signed = SignedEnvelope {
                        envelope,
                        signatures: vec![DecoratedSignature {
                            hint: account.hint(),
                            signature: signature.to_bytes().to_vec(),
                        }],
                    };
                    (
                        200,
                        json!({
                            "status": "approved",
                            "signed_tx": signed.encode_base64().expect("encode signed"),
                        }),
                    )
                }
                _ => (404, json!({ "error": "not found" })),
            };

            let response =
                Response::from_string(payload.to_string()).with_status_code(StatusCode(code));
            let _ = req.respond(response);
        }
    });

    (addr, join)
}

fn bridge_over(base_url: String) -> WalletBridgeSigner {
    let config = AdapterConfig {
        wallet_bridge_url: Some(base_url),
        ..AdapterConfig::default()
    };
    WalletBridgeSigner::with_config(&config).expect("bridge construction")
}

#[tokio::test]
async fn http_bridge_approval_confirms_a_payment_end_to_end() {
    let (key, source) = keypair(1);
    let (_, dest) = keypair(2);
    let (base_url, _join) = spawn_mock_bridge(key, true);

    let gateway = LedgerGatewayAdapter::in_memory();
    gateway.seed_account(source, 41, "50").expect("seed source");
    gateway.seed_account(dest, 7, "20").expect("seed dest");

    let signer = bridge_over(base_url);
    assert_eq!(signer.active_account().await.expect("address"), source);

    let wf = PaymentWorkflow::new(gateway, signer, SystemClock, network());
    let confirmed = wf
        .submit_payment(payment_request(dest, "10"))
        .await
        .expect("bridge-signed payment confirms");
    assert_eq!(confirmed.result_code, "tx_success");
}

#[tokio::test]
async fn http_bridge_rejection_surfaces_as_signing_rejected() {
    let (key, source) = keypair(1);
    let (_, dest) = keypair(2);
    let (base_url, _join) = spawn_mock_bridge(key, false);

    let gateway = LedgerGatewayAdapter::in_memory();
    gateway.seed_account(source, 41, "50").expect("seed source");
    gateway.seed_account(dest, 7, "20").expect("seed dest");

    let wf = PaymentWorkflow::new(gateway, bridge_over(base_url), SystemClock, network());
    let err = wf
        .submit_payment(payment_request(dest, "10"))
        .await
        .expect_err("dismissal must fail");
    assert!(matches!(err, SubmitError::SigningRejected(_)));
}

#[tokio::test]
async fn production_profile_requires_a_bridge_url() {
    let config = AdapterConfig {
        runtime_profile: RuntimeProfile::Production,
        ..AdapterConfig::default()
    };
    let signer = WalletBridgeSigner::with_config(&config).expect("construction succeeds");
    let err = signer
        .active_account()
        .await
        .expect_err("no fallback in production");
    assert!(matches!(err, PortError::Unavailable(_)));
}
