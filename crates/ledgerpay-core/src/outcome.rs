use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Successful terminal outcome of a submission attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confirmed {
    /// Ledger-assigned transaction id.
    pub tx_id: String,
    pub result_code: String,
    /// The gateway's response body, verbatim.
    pub raw: Value,
}

/// Failed terminal outcomes. One per workflow phase that can fail, plus
/// `InvalidIntent` for input rejected before any port call and `Internal`
/// for workflow invariant breaches that should never happen.
///
/// None of these variants ever carries signer credentials.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum SubmitError {
    #[error("invalid payment intent: {0}")]
    InvalidIntent(String),
    #[error("signer unavailable: {0}")]
    SignerUnavailable(String),
    #[error("account fetch failed: {0}")]
    AccountFetchFailed(String),
    #[error("signing rejected: {0}")]
    SigningRejected(String),
    #[error("submission transport error: {0}")]
    SubmissionTransportError(String),
    #[error("submission rejected by ledger: {code}")]
    SubmissionRejected { code: String, raw: Value },
    #[error("workflow invariant violated: {0}")]
    Internal(String),
}

impl SubmitError {
    /// Whether the caller may retry the same request without reconciling
    /// first. Only transport failures during submission qualify, and even
    /// then the transaction may already have landed; see
    /// `LedgerGateway::fetch_transaction`.
    pub fn caller_retryable(&self) -> bool {
        matches!(self, SubmitError::SubmissionTransportError(_))
    }
}

/// The discriminated result of one submission attempt.
pub type TransactionOutcome = Result<Confirmed, SubmitError>;
