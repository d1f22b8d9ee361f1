pub mod domain;
pub mod envelope;
pub mod outcome;
pub mod ports;
pub mod state_machine;
pub mod workflow;

pub use domain::{
    AccountId, AccountIdParseError, AccountSnapshot, Balance, FeePolicy, NetworkConfig,
    PaymentIntent, PaymentRequest, NATIVE_ASSET,
};
pub use envelope::{
    build_envelope, DecoratedSignature, EnvelopeError, PaymentOp, SignedEnvelope, TimeBounds,
    TransactionEnvelope, MIN_BASE_FEE,
};
pub use outcome::{Confirmed, SubmitError, TransactionOutcome};
pub use ports::{Clock, LedgerGateway, PortError, SubmitReceipt, TransactionRecord, TransferSigner};
pub use state_machine::{phase_transition, IllegalTransition, PhaseAction, PhaseTransition, SubmitPhase};
pub use workflow::PaymentWorkflow;
