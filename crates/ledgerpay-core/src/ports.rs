use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{AccountId, AccountSnapshot};
use crate::envelope::{SignedEnvelope, TransactionEnvelope};

/// Error surface shared by every port.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    /// The remote party refused the request and said why; `code` is its
    /// structured result code, surfaced verbatim.
    #[error("rejected: {code}")]
    Rejected { code: String, raw: Value },
}

/// Acknowledgement returned by the ledger's submission endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub id: String,
    pub result_code: String,
    pub raw: Value,
}

/// A transaction as recorded by the ledger, for post-hoc lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub successful: bool,
    pub result_code: String,
    pub raw: Value,
}

/// Read/submit access to the ledger-query gateway.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    async fn load_account(&self, id: &AccountId) -> Result<AccountSnapshot, PortError>;
    async fn fetch_base_fee(&self) -> Result<u32, PortError>;
    async fn submit(&self, signed: &SignedEnvelope) -> Result<SubmitReceipt, PortError>;
    /// Look up a previously submitted transaction. The reconciliation path
    /// after a transport failure that may or may not have landed.
    async fn fetch_transaction(&self, id: &str) -> Result<TransactionRecord, PortError>;
}

/// Authority able to authorize an envelope: a local key, or a handle to an
/// external signing agent.
///
/// For delegated implementations the future returned by `sign` is the
/// user-approval wait itself. It has no workflow-imposed timeout; dismissal
/// in the external agent must resolve it to `PortError::Rejected`, never
/// leave it pending.
#[async_trait]
pub trait TransferSigner: Send + Sync {
    async fn active_account(&self) -> Result<AccountId, PortError>;
    async fn sign(&self, envelope: &TransactionEnvelope) -> Result<SignedEnvelope, PortError>;
}

#[async_trait]
impl<T: TransferSigner + ?Sized> TransferSigner for Box<T> {
    async fn active_account(&self) -> Result<AccountId, PortError> {
        (**self).active_account().await
    }

    async fn sign(&self, envelope: &TransactionEnvelope) -> Result<SignedEnvelope, PortError> {
        (**self).sign(envelope).await
    }
}

/// Wall-clock seconds, behind a trait so tests pin time.
pub trait Clock: Send + Sync {
    fn unix_time(&self) -> Result<u64, PortError>;
}
