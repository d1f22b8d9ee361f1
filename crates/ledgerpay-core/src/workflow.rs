use tracing::{debug, info, warn};

use crate::domain::{FeePolicy, NetworkConfig, PaymentIntent, PaymentRequest};
use crate::envelope::build_envelope;
use crate::outcome::{Confirmed, SubmitError, TransactionOutcome};
use crate::ports::{Clock, LedgerGateway, PortError, TransferSigner};
use crate::state_machine::{phase_transition, PhaseAction, SubmitPhase};

/// The payment-submission workflow: validate, resolve the source account
/// from the signer, fetch fresh account state, build an immutable envelope,
/// have it signed, submit it.
///
/// Single-attempt and stateless between calls. Nothing is retried and
/// nothing is cached; overlapping calls against the same source account are
/// not coordinated here, and the later one will surface the ledger's
/// sequence-mismatch rejection.
pub struct PaymentWorkflow<G, S, C> {
    pub gateway: G,
    pub signer: S,
    pub clock: C,
    pub network: NetworkConfig,
}

impl<G, S, C> PaymentWorkflow<G, S, C>
where
    G: LedgerGateway,
    S: TransferSigner,
    C: Clock,
{
    pub fn new(gateway: G, signer: S, clock: C, network: NetworkConfig) -> Self {
        Self {
            gateway,
            signer,
            clock,
            network,
        }
    }

    pub async fn submit_payment(&self, request: PaymentRequest) -> TransactionOutcome {
        let mut phase = SubmitPhase::Validating;
        match self.run(&mut phase, &request).await {
            Ok(confirmed) => {
                info!(tx_id = %confirmed.tx_id, "payment confirmed");
                Ok(confirmed)
            }
            Err(err) => {
                if let Ok((_, transition)) = phase_transition(phase, PhaseAction::Fail) {
                    warn!(phase = ?transition.from, error = %err, "payment failed");
                }
                Err(err)
            }
        }
    }

    async fn run(&self, phase: &mut SubmitPhase, request: &PaymentRequest) -> TransactionOutcome {
        let intent = PaymentIntent::from_request(request)?;
        self.advance(phase, PhaseAction::Advance)?;

        let source = self
            .signer
            .active_account()
            .await
            .map_err(|e| SubmitError::SignerUnavailable(e.to_string()))?;
        if source == intent.destination() {
            return Err(SubmitError::InvalidIntent(
                "destination equals the source account".to_owned(),
            ));
        }
        self.advance(phase, PhaseAction::Advance)?;

        let snapshot = self
            .gateway
            .load_account(&source)
            .await
            .map_err(|e| SubmitError::AccountFetchFailed(e.to_string()))?;
        let fee = match intent.fee() {
            FeePolicy::Fixed(units) => units,
            FeePolicy::NetworkBase => self
                .gateway
                .fetch_base_fee()
                .await
                .map_err(|e| SubmitError::AccountFetchFailed(format!("base fee fetch failed: {e}")))?,
        };
        self.advance(phase, PhaseAction::Advance)?;

        let now = self
            .clock
            .unix_time()
            .map_err(|e| SubmitError::Internal(format!("clock read failed: {e}")))?;
        let envelope = build_envelope(&snapshot, &intent, fee, &self.network, now);
        debug!(
            sequence = envelope.sequence,
            fee = envelope.fee,
            max_time = envelope.time_bounds.max_time,
            "envelope built"
        );
        self.advance(phase, PhaseAction::Advance)?;

        let signed = self
            .signer
            .sign(&envelope)
            .await
            .map_err(|e| SubmitError::SigningRejected(e.to_string()))?;
        if signed.envelope != envelope {
            return Err(SubmitError::SigningRejected(
                "signing agent returned a different envelope".to_owned(),
            ));
        }
        signed
            .verify_source_signature()
            .map_err(|e| SubmitError::SigningRejected(e.to_string()))?;
        self.advance(phase, PhaseAction::Advance)?;

        let receipt = self.gateway.submit(&signed).await.map_err(|e| match e {
            PortError::Rejected { code, raw } => SubmitError::SubmissionRejected { code, raw },
            other => SubmitError::SubmissionTransportError(other.to_string()),
        })?;
        self.advance(phase, PhaseAction::Complete)?;
        Ok(Confirmed {
            tx_id: receipt.id,
            result_code: receipt.result_code,
            raw: receipt.raw,
        })
    }

    fn advance(&self, phase: &mut SubmitPhase, action: PhaseAction) -> Result<(), SubmitError> {
        let (next, transition) =
            phase_transition(*phase, action).map_err(|e| SubmitError::Internal(e.to_string()))?;
        debug!(from = ?transition.from, to = ?transition.to, "submit phase");
        *phase = next;
        Ok(())
    }
}
