use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use serde_json::{json, Value};
use tracing::debug;

use ledgerpay_core::{
    AccountId, PortError, SignedEnvelope, TransactionEnvelope, TransferSigner,
};

use crate::config::AdapterConfig;
use crate::local_signer::LocalSigner;

/// What the scripted bridge does when asked to sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeDecision {
    Approve,
    Reject,
}

/// Delegated signer speaking to an external wallet bridge.
///
/// `Http` hands the serialized envelope to the bridge and waits for the user
/// to act; the wait is bounded only by the bridge itself, never by this
/// adapter. `Scripted` is the deterministic stand-in for tests and offline
/// development, resolving immediately with a configured decision.
pub struct WalletBridgeSigner {
    mode: BridgeMode,
}

enum BridgeMode {
    Disabled(String),
    Scripted {
        signer: LocalSigner,
        decision: BridgeDecision,
    },
    Http(HttpRuntime),
}

struct HttpRuntime {
    base_url: String,
    client: reqwest::Client,
}

impl WalletBridgeSigner {
    pub fn with_config(config: &AdapterConfig) -> Result<Self, PortError> {
        let mode = if let Some(base_url) = &config.wallet_bridge_url {
            // No request timeout: the sign call suspends until the user
            // approves or dismisses the prompt in the external agent.
            let client = reqwest::Client::builder()
                .build()
                .map_err(|e| PortError::Transport(format!("bridge client init failed: {e}")))?;
            BridgeMode::Http(HttpRuntime {
                base_url: base_url.trim_end_matches('/').to_owned(),
                client,
            })
        } else if config.strict_runtime_required() {
            BridgeMode::Disabled(
                "wallet bridge URL not configured in production runtime profile".to_owned(),
            )
        } else {
            BridgeMode::Scripted {
                signer: LocalSigner::from_signing_key(SigningKey::from_bytes(&[1u8; 32])),
                decision: BridgeDecision::Approve,
            }
        };
        Ok(Self { mode })
    }

    /// Deterministic bridge over a known key, approving or rejecting every
    /// request.
    pub fn scripted(key: SigningKey, decision: BridgeDecision) -> Self {
        Self {
            mode: BridgeMode::Scripted {
                signer: LocalSigner::from_signing_key(key),
                decision,
            },
        }
    }
}

#[async_trait]
impl TransferSigner for WalletBridgeSigner {
    async fn active_account(&self) -> Result<AccountId, PortError> {
        match &self.mode {
            BridgeMode::Disabled(reason) => Err(PortError::Unavailable(reason.clone())),
            BridgeMode::Scripted { signer, .. } => signer.active_account().await,
            BridgeMode::Http(rt) => {
                let url = format!("{}/address", rt.base_url);
                let response = rt
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| PortError::Unavailable(format!("bridge unreachable: {e}")))?;
                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| PortError::Transport(format!("bridge address decode failed: {e}")))?;
                let raw = body
                    .get("address")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        PortError::Unavailable("bridge reported no active address".to_owned())
                    })?;
                raw.parse()
                    .map_err(|e| PortError::Validation(format!("bridge returned a bad address: {e}")))
            }
        }
    }

    async fn sign(&self, envelope: &TransactionEnvelope) -> Result<SignedEnvelope, PortError> {
        match &self.mode {
            BridgeMode::Disabled(reason) => Err(PortError::Unavailable(reason.clone())),
            BridgeMode::Scripted { signer, decision } => match decision {
                BridgeDecision::Approve => signer.sign(envelope).await,
                BridgeDecision::Reject => Err(PortError::Rejected {
                    code: "user_declined".to_owned(),
                    raw: json!({ "reason": "request dismissed in wallet" }),
                }),
            },
            BridgeMode::Http(rt) => {
                let encoded = envelope
                    .encode_base64()
                    .map_err(|e| PortError::Validation(e.to_string()))?;
                let url = format!("{}/sign", rt.base_url);
                debug!(url = %url, "awaiting wallet approval");
                let response = rt
                    .client
                    .post(&url)
                    .json(&json!({
                        "tx": encoded,
                        "address": envelope.source.to_string(),
                        "network_passphrase": envelope.network_passphrase,
                    }))
                    .send()
                    .await
                    .map_err(|e| PortError::Transport(format!("bridge sign request failed: {e}")))?;
                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| PortError::Transport(format!("bridge sign decode failed: {e}")))?;
                match body.get("status").and_then(|v| v.as_str()) {
                    Some("approved") => {
                        let signed = body
                            .get("signed_tx")
                            .and_then(|v| v.as_str())
                            .ok_or_else(|| {
                                PortError::Transport(
                                    "bridge approved without a signed envelope".to_owned(),
                                )
                            })?;
                        SignedEnvelope::decode_base64(signed)
                            .map_err(|e| PortError::Validation(e.to_string()))
                    }
                    Some("rejected") => Err(PortError::Rejected {
                        code: "user_declined".to_owned(),
                        raw: body,
                    }),
                    _ => Err(PortError::Transport(format!(
                        "bridge returned an unknown status: {body}"
                    ))),
                }
            }
        }
    }
}
