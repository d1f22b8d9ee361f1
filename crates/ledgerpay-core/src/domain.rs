use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::outcome::SubmitError;

/// Asset code of the ledger's native asset; the only asset this workflow moves.
pub const NATIVE_ASSET: &str = "native";

/// Most fractional digits the ledger tracks for an amount.
pub const MAX_AMOUNT_SCALE: u32 = 7;

#[derive(Debug, Error)]
#[error("invalid account identifier: {0}")]
pub struct AccountIdParseError(String);

/// 32-byte ed25519 public key identifying a ledger participant.
///
/// Canonical text form is 0x-prefixed lowercase hex; parsing accepts the
/// prefix as optional and either case.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId([u8; 32]);

impl AccountId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Last four key bytes, attached to signatures so a verifier can match
    /// a signature to its key without trying every signer.
    pub fn hint(&self) -> [u8; 4] {
        let mut hint = [0u8; 4];
        hint.copy_from_slice(&self.0[28..]);
        hint
    }
}

impl FromStr for AccountId {
    type Err = AccountIdParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let stripped = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .unwrap_or(raw);
        if stripped.len() != 64 {
            return Err(AccountIdParseError(format!(
                "expected 64 hex characters, got {}",
                stripped.len()
            )));
        }
        let decoded =
            hex::decode(stripped).map_err(|e| AccountIdParseError(format!("bad hex: {e}")))?;
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({self})")
    }
}

impl TryFrom<String> for AccountId {
    type Error = AccountIdParseError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.to_string()
    }
}

/// One asset position held by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub asset: String,
    pub amount: String,
}

/// Account state as read from the ledger-query gateway.
///
/// Fetched fresh before every workflow run; stale the moment any transaction
/// from the account is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: AccountId,
    pub sequence: u64,
    pub balances: Vec<Balance>,
}

impl AccountSnapshot {
    pub fn native_balance(&self) -> Option<&str> {
        self.balances
            .iter()
            .find(|b| b.asset == NATIVE_ASSET)
            .map(|b| b.amount.as_str())
    }
}

/// How the per-operation fee bid is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeePolicy {
    /// Bid a fixed number of fee units per operation.
    Fixed(u32),
    /// Bid whatever the gateway currently reports as the network base fee.
    NetworkBase,
}

/// Target-network parameters handed to the workflow explicitly, instead of a
/// process-wide client singleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub network_passphrase: String,
}

impl NetworkConfig {
    pub fn new(network_passphrase: impl Into<String>) -> Self {
        Self {
            network_passphrase: network_passphrase.into(),
        }
    }
}

/// Caller input, unvalidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub destination: String,
    pub amount: String,
    pub fee: FeePolicy,
    pub timeout_secs: u64,
}

/// A validated transfer description, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    destination: AccountId,
    amount: Decimal,
    fee: FeePolicy,
    timeout_secs: u64,
}

impl PaymentIntent {
    /// Validate raw caller input. Runs before any port is touched; every
    /// failure here is `SubmitError::InvalidIntent`.
    pub fn from_request(request: &PaymentRequest) -> Result<Self, SubmitError> {
        let destination: AccountId = request
            .destination
            .parse()
            .map_err(|e: AccountIdParseError| SubmitError::InvalidIntent(e.to_string()))?;

        let amount = Decimal::from_str_exact(request.amount.trim())
            .map_err(|e| SubmitError::InvalidIntent(format!("unparseable amount: {e}")))?;
        if amount <= Decimal::ZERO {
            return Err(SubmitError::InvalidIntent(format!(
                "amount must be positive, got {amount}"
            )));
        }
        if amount.scale() > MAX_AMOUNT_SCALE {
            return Err(SubmitError::InvalidIntent(format!(
                "amount has {} fractional digits; the ledger tracks at most {MAX_AMOUNT_SCALE}",
                amount.scale()
            )));
        }

        if let FeePolicy::Fixed(units) = request.fee {
            if units < crate::envelope::MIN_BASE_FEE {
                return Err(SubmitError::InvalidIntent(format!(
                    "fixed fee {units} is below the network minimum of {}",
                    crate::envelope::MIN_BASE_FEE
                )));
            }
        }

        if request.timeout_secs == 0 {
            return Err(SubmitError::InvalidIntent(
                "timeout must be greater than zero seconds".to_owned(),
            ));
        }

        Ok(Self {
            destination,
            amount,
            fee: request.fee,
            timeout_secs: request.timeout_secs,
        })
    }

    pub fn destination(&self) -> AccountId {
        self.destination
    }

    /// Normalized decimal string, trailing zeros dropped.
    pub fn amount_text(&self) -> String {
        self.amount.normalize().to_string()
    }

    pub fn fee(&self) -> FeePolicy {
        self.fee
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }
}
