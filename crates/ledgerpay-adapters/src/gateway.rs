use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::debug;

use ledgerpay_core::{
    AccountId, AccountSnapshot, Balance, LedgerGateway, PortError, SignedEnvelope, SubmitReceipt,
    TransactionRecord, MIN_BASE_FEE, NATIVE_ASSET,
};

use crate::config::AdapterConfig;

/// Ledger-query gateway adapter.
///
/// `Http` speaks JSON to a gateway endpoint; `InMemory` is a deterministic
/// single-process ledger used by tests and offline development. The
/// production profile refuses to run without a configured endpoint.
pub struct LedgerGatewayAdapter {
    mode: GatewayMode,
}

enum GatewayMode {
    Disabled(String),
    InMemory(Arc<Mutex<LedgerState>>),
    Http(HttpRuntime),
}

struct HttpRuntime {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<AccountId, AccountEntry>,
    base_fee: u32,
    transactions: HashMap<String, TransactionRecord>,
}

struct AccountEntry {
    sequence: u64,
    native_balance: Decimal,
}

impl LedgerGatewayAdapter {
    pub fn with_config(config: &AdapterConfig) -> Result<Self, PortError> {
        let mode = if let Some(base_url) = &config.gateway_base_url {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_millis(config.gateway_timeout_ms()))
                .build()
                .map_err(|e| PortError::Transport(format!("gateway client init failed: {e}")))?;
            GatewayMode::Http(HttpRuntime {
                base_url: base_url.trim_end_matches('/').to_owned(),
                client,
            })
        } else if config.strict_runtime_required() {
            GatewayMode::Disabled(
                "gateway URL not configured in production runtime profile".to_owned(),
            )
        } else {
            GatewayMode::InMemory(Arc::new(Mutex::new(LedgerState {
                base_fee: MIN_BASE_FEE,
                ..LedgerState::default()
            })))
        };
        Ok(Self { mode })
    }

    pub fn in_memory() -> Self {
        Self {
            mode: GatewayMode::InMemory(Arc::new(Mutex::new(LedgerState {
                base_fee: MIN_BASE_FEE,
                ..LedgerState::default()
            }))),
        }
    }

    /// Create or overwrite an account in the in-memory ledger.
    pub fn seed_account(
        &self,
        id: AccountId,
        sequence: u64,
        native_balance: &str,
    ) -> Result<(), PortError> {
        let state = self.in_memory_state()?;
        let balance = Decimal::from_str_exact(native_balance)
            .map_err(|e| PortError::Validation(format!("bad seed balance: {e}")))?;
        let mut g = lock(&state)?;
        g.accounts.insert(
            id,
            AccountEntry {
                sequence,
                native_balance: balance,
            },
        );
        Ok(())
    }

    /// Set the base fee the in-memory ledger reports.
    pub fn set_base_fee(&self, fee: u32) -> Result<(), PortError> {
        let state = self.in_memory_state()?;
        lock(&state)?.base_fee = fee;
        Ok(())
    }

    fn in_memory_state(&self) -> Result<Arc<Mutex<LedgerState>>, PortError> {
        match &self.mode {
            GatewayMode::InMemory(state) => Ok(Arc::clone(state)),
            _ => Err(PortError::NotImplemented(
                "in-memory ledger control requires the in-memory gateway",
            )),
        }
    }
}

#[async_trait]
impl LedgerGateway for LedgerGatewayAdapter {
    async fn load_account(&self, id: &AccountId) -> Result<AccountSnapshot, PortError> {
        match &self.mode {
            GatewayMode::Disabled(reason) => Err(PortError::Unavailable(reason.clone())),
            GatewayMode::InMemory(state) => {
                let g = lock(state)?;
                let entry = g
                    .accounts
                    .get(id)
                    .ok_or_else(|| PortError::NotFound(format!("account not found: {id}")))?;
                Ok(AccountSnapshot {
                    id: *id,
                    sequence: entry.sequence,
                    balances: vec![Balance {
                        asset: NATIVE_ASSET.to_owned(),
                        amount: entry.native_balance.normalize().to_string(),
                    }],
                })
            }
            GatewayMode::Http(rt) => {
                let body = get_json(rt, &format!("/accounts/{id}")).await?;
                serde_json::from_value(body)
                    .map_err(|e| PortError::Validation(format!("malformed account response: {e}")))
            }
        }
    }

    async fn fetch_base_fee(&self) -> Result<u32, PortError> {
        match &self.mode {
            GatewayMode::Disabled(reason) => Err(PortError::Unavailable(reason.clone())),
            GatewayMode::InMemory(state) => Ok(lock(state)?.base_fee),
            GatewayMode::Http(rt) => {
                let body = get_json(rt, "/fee_stats").await?;
                parse_fee_units(body.get("last_ledger_base_fee"))
            }
        }
    }

    async fn submit(&self, signed: &SignedEnvelope) -> Result<SubmitReceipt, PortError> {
        match &self.mode {
            GatewayMode::Disabled(reason) => Err(PortError::Unavailable(reason.clone())),
            GatewayMode::InMemory(state) => submit_in_memory(state, signed),
            GatewayMode::Http(rt) => {
                let encoded = signed
                    .encode_base64()
                    .map_err(|e| PortError::Validation(e.to_string()))?;
                let url = format!("{}/transactions", rt.base_url);
                debug!(url = %url, "submitting transaction");
                let response = rt
                    .client
                    .post(&url)
                    .json(&json!({ "tx": encoded }))
                    .send()
                    .await
                    .map_err(|e| PortError::Transport(format!("submit request failed: {e}")))?;
                let status = response.status();
                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| PortError::Transport(format!("submit response decode failed: {e}")))?;
                if status.is_success() {
                    let id = body
                        .get("id")
                        .and_then(|v| v.as_str())
                        .ok_or_else(|| {
                            PortError::Validation("submit response missing transaction id".to_owned())
                        })?
                        .to_owned();
                    let result_code = body
                        .get("result_code")
                        .and_then(|v| v.as_str())
                        .unwrap_or("tx_success")
                        .to_owned();
                    Ok(SubmitReceipt {
                        id,
                        result_code,
                        raw: body,
                    })
                } else if let Some(code) = rejection_code(&body) {
                    Err(PortError::Rejected { code, raw: body })
                } else {
                    Err(PortError::Transport(format!(
                        "gateway status {status}: {body}"
                    )))
                }
            }
        }
    }

    async fn fetch_transaction(&self, id: &str) -> Result<TransactionRecord, PortError> {
        match &self.mode {
            GatewayMode::Disabled(reason) => Err(PortError::Unavailable(reason.clone())),
            GatewayMode::InMemory(state) => {
                let g = lock(state)?;
                g.transactions
                    .get(id)
                    .cloned()
                    .ok_or_else(|| PortError::NotFound(format!("transaction not found: {id}")))
            }
            GatewayMode::Http(rt) => {
                let body = get_json(rt, &format!("/transactions/{id}")).await?;
                let result_code = body
                    .get("result_code")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_owned();
                Ok(TransactionRecord {
                    id: body
                        .get("id")
                        .and_then(|v| v.as_str())
                        .unwrap_or(id)
                        .to_owned(),
                    successful: body
                        .get("successful")
                        .and_then(|v| v.as_bool())
                        .unwrap_or(result_code == "tx_success"),
                    result_code,
                    raw: body,
                })
            }
        }
    }
}

async fn get_json(rt: &HttpRuntime, path: &str) -> Result<Value, PortError> {
    let url = format!("{}{path}", rt.base_url);
    let response = rt
        .client
        .get(&url)
        .send()
        .await
        .map_err(|e| PortError::Transport(format!("request to {path} failed: {e}")))?;
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(PortError::NotFound(format!("{path} returned 404")));
    }
    let body: Value = response
        .json()
        .await
        .map_err(|e| PortError::Transport(format!("response from {path} not JSON: {e}")))?;
    if !status.is_success() {
        return Err(PortError::Transport(format!(
            "gateway status {status} on {path}: {body}"
        )));
    }
    Ok(body)
}

fn rejection_code(body: &Value) -> Option<String> {
    body.get("result_code")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            body.pointer("/extras/result_codes/transaction")
                .and_then(|v| v.as_str())
                .map(str::to_owned)
        })
}

fn parse_fee_units(value: Option<&Value>) -> Result<u32, PortError> {
    let value = value.ok_or_else(|| {
        PortError::Validation("fee stats response missing last_ledger_base_fee".to_owned())
    })?;
    // Gateways report fees as either numbers or decimal strings.
    let units = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };
    units
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| PortError::Validation(format!("unparseable base fee: {value}")))
}

fn submit_in_memory(
    state: &Arc<Mutex<LedgerState>>,
    signed: &SignedEnvelope,
) -> Result<SubmitReceipt, PortError> {
    let envelope = &signed.envelope;
    if signed.verify_source_signature().is_err() {
        return Err(rejected("tx_bad_auth"));
    }
    if envelope.operation.asset != NATIVE_ASSET {
        return Err(rejected("op_malformed"));
    }
    let amount = Decimal::from_str_exact(&envelope.operation.amount)
        .map_err(|_| rejected("op_malformed"))?;
    // Fee units are the smallest ledger denomination, 1e-7 of the asset.
    let fee = Decimal::new(i64::from(envelope.fee), 7);
    let tx_id = envelope
        .tx_id()
        .map_err(|e| PortError::Validation(e.to_string()))?;

    let mut g = lock(state)?;
    let source = g
        .accounts
        .get(&envelope.source)
        .ok_or_else(|| rejected("tx_no_source_account"))?;
    if envelope.sequence != source.sequence + 1 {
        return Err(rejected("tx_bad_seq"));
    }
    if !g.accounts.contains_key(&envelope.operation.destination) {
        return Err(rejected("op_no_destination"));
    }
    let total = amount + fee;
    if g.accounts[&envelope.source].native_balance < total {
        return Err(rejected("tx_insufficient_balance"));
    }

    if let Some(entry) = g.accounts.get_mut(&envelope.source) {
        entry.native_balance -= total;
        entry.sequence += 1;
    }
    if let Some(entry) = g.accounts.get_mut(&envelope.operation.destination) {
        entry.native_balance += amount;
    }

    let raw = json!({ "id": tx_id, "result_code": "tx_success" });
    g.transactions.insert(
        tx_id.clone(),
        TransactionRecord {
            id: tx_id.clone(),
            successful: true,
            result_code: "tx_success".to_owned(),
            raw: raw.clone(),
        },
    );
    Ok(SubmitReceipt {
        id: tx_id,
        result_code: "tx_success".to_owned(),
        raw,
    })
}

fn rejected(code: &str) -> PortError {
    PortError::Rejected {
        code: code.to_owned(),
        raw: json!({ "result_code": code }),
    }
}

fn lock(state: &Arc<Mutex<LedgerState>>) -> Result<std::sync::MutexGuard<'_, LedgerState>, PortError> {
    state
        .lock()
        .map_err(|e| PortError::Transport(format!("ledger state lock poisoned: {e}")))
}
