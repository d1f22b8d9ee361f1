use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ed25519_dalek::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::domain::{AccountId, AccountSnapshot, NetworkConfig, PaymentIntent, NATIVE_ASSET};

/// Minimum per-operation fee bid accepted by the network, in fee units.
pub const MIN_BASE_FEE: u32 = 100;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("envelope serialization failed: {0}")]
    Serialize(String),
    #[error("envelope decoding failed: {0}")]
    Decode(String),
    #[error("no signature from the source account")]
    NoSourceSignature,
    #[error("signature does not verify against the source account: {0}")]
    BadSignature(String),
}

/// Absolute validity window. `max_time` is the only cancellation the ledger
/// recognizes: past it, an unsubmitted envelope is dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

/// The single payment operation an envelope carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOp {
    pub destination: AccountId,
    pub asset: String,
    pub amount: String,
}

/// Immutable unsigned transaction. Built once per workflow run; never
/// mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEnvelope {
    pub source: AccountId,
    /// Source account sequence number this envelope consumes; always the
    /// freshly fetched sequence plus one.
    pub sequence: u64,
    /// Total fee bid in fee units.
    pub fee: u32,
    pub network_passphrase: String,
    pub time_bounds: TimeBounds,
    pub operation: PaymentOp,
}

impl TransactionEnvelope {
    /// Canonical byte form: JSON with object keys sorted recursively, so the
    /// hash is stable across serializer implementations.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        let value =
            serde_json::to_value(self).map_err(|e| EnvelopeError::Serialize(e.to_string()))?;
        serde_json::to_vec(&sort_keys(&value)).map_err(|e| EnvelopeError::Serialize(e.to_string()))
    }

    /// sha-256 over the canonical bytes; the payload every signature covers.
    /// Binds the network because the passphrase is part of the envelope.
    pub fn hash(&self) -> Result<[u8; 32], EnvelopeError> {
        Ok(Sha256::digest(self.canonical_bytes()?).into())
    }

    /// Hex transaction id the ledger derives from the envelope hash.
    pub fn tx_id(&self) -> Result<String, EnvelopeError> {
        Ok(hex::encode(self.hash()?))
    }

    pub fn encode_base64(&self) -> Result<String, EnvelopeError> {
        Ok(BASE64.encode(self.canonical_bytes()?))
    }

    pub fn decode_base64(raw: &str) -> Result<Self, EnvelopeError> {
        let bytes = BASE64
            .decode(raw.trim())
            .map_err(|e| EnvelopeError::Decode(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| EnvelopeError::Decode(e.to_string()))
    }
}

/// An ed25519 signature plus the signing key's four-byte hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratedSignature {
    #[serde(with = "hex::serde")]
    pub hint: [u8; 4],
    #[serde(with = "hex::serde")]
    pub signature: Vec<u8>,
}

/// Envelope plus authorization; the form the submission endpoint accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    pub envelope: TransactionEnvelope,
    pub signatures: Vec<DecoratedSignature>,
}

impl SignedEnvelope {
    pub fn encode_base64(&self) -> Result<String, EnvelopeError> {
        let value =
            serde_json::to_value(self).map_err(|e| EnvelopeError::Serialize(e.to_string()))?;
        let bytes = serde_json::to_vec(&sort_keys(&value))
            .map_err(|e| EnvelopeError::Serialize(e.to_string()))?;
        Ok(BASE64.encode(bytes))
    }

    pub fn decode_base64(raw: &str) -> Result<Self, EnvelopeError> {
        let bytes = BASE64
            .decode(raw.trim())
            .map_err(|e| EnvelopeError::Decode(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| EnvelopeError::Decode(e.to_string()))
    }

    /// Check that a signature with the source account's hint verifies over
    /// the envelope hash. The workflow refuses to submit anything that fails
    /// this.
    pub fn verify_source_signature(&self) -> Result<(), EnvelopeError> {
        let hint = self.envelope.source.hint();
        let candidate = self
            .signatures
            .iter()
            .find(|s| s.hint == hint)
            .ok_or(EnvelopeError::NoSourceSignature)?;

        let key = VerifyingKey::from_bytes(self.envelope.source.as_bytes())
            .map_err(|e| EnvelopeError::BadSignature(e.to_string()))?;
        let signature = Signature::from_slice(&candidate.signature)
            .map_err(|e| EnvelopeError::BadSignature(e.to_string()))?;
        let hash = self.envelope.hash()?;
        key.verify_strict(&hash, &signature)
            .map_err(|e| EnvelopeError::BadSignature(e.to_string()))
    }
}

/// Deterministically assemble the unsigned envelope. Pure: same snapshot,
/// intent, fee, network, and clock reading always yield the same envelope.
pub fn build_envelope(
    snapshot: &AccountSnapshot,
    intent: &PaymentIntent,
    fee_per_operation: u32,
    network: &NetworkConfig,
    now_unix: u64,
) -> TransactionEnvelope {
    TransactionEnvelope {
        source: snapshot.id,
        sequence: snapshot.sequence + 1,
        fee: fee_per_operation,
        network_passphrase: network.network_passphrase.clone(),
        time_bounds: TimeBounds {
            min_time: 0,
            max_time: now_unix + intent.timeout_secs(),
        },
        operation: PaymentOp {
            destination: intent.destination(),
            asset: NATIVE_ASSET.to_owned(),
            amount: intent.amount_text(),
        },
    }
}

fn sort_keys(value: &serde_json::Value) -> serde_json::Value {
    use serde_json::{Map, Value};
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            let mut out = Map::with_capacity(keys.len());
            for key in keys {
                if let Some(v) = map.get(key) {
                    out.insert(key.clone(), sort_keys(v));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        _ => value.clone(),
    }
}
