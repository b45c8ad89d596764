//! Approval/Submission state machine.
//!
//! Pure and synchronous: every input carries the [`FlowId`] it belongs to, and
//! inputs that do not match the current waiting state are discarded. The async
//! driver lives in [`crate::wallet::coordinator`].

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::wallet::models::{
    Account, FlowError, FlowId, FlowPhase, SignedTransaction, SubmittedTransaction, TransactionObject,
    TransactionStatus,
};
use crate::wallet::services::signer::{SignRequest, SignerResult};

/// The transaction a flow is working on. Shared read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransaction {
    pub flow_id: FlowId,
    pub transaction: Arc<TransactionObject>,
    pub fee_token_id: String,
    pub account: Account,
    pub schema: Value,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FlowState {
    #[default]
    Idle,
    Building {
        flow_id: FlowId,
    },
    AwaitingSignature {
        pending: PendingTransaction,
    },
    AwaitingApproval {
        pending: PendingTransaction,
        signed: SignedTransaction,
    },
    Submitting {
        pending: PendingTransaction,
    },
    Succeeded {
        pending: PendingTransaction,
        submitted: SubmittedTransaction,
    },
    Failed {
        flow_id: FlowId,
        pending: Option<PendingTransaction>,
        error: String,
    },
}

impl FlowState {
    pub fn phase(&self) -> FlowPhase {
        match self {
            FlowState::Idle => FlowPhase::Idle,
            FlowState::Building { .. } => FlowPhase::Building,
            FlowState::AwaitingSignature { .. } => FlowPhase::AwaitingSignature,
            FlowState::AwaitingApproval { .. } => FlowPhase::AwaitingApproval,
            FlowState::Submitting { .. } => FlowPhase::Submitting,
            FlowState::Succeeded { .. } => FlowPhase::Succeeded,
            FlowState::Failed { .. } => FlowPhase::Failed,
        }
    }

    pub fn flow_id(&self) -> Option<FlowId> {
        match self {
            FlowState::Idle => None,
            FlowState::Building { flow_id } | FlowState::Failed { flow_id, .. } => Some(*flow_id),
            FlowState::AwaitingSignature { pending }
            | FlowState::AwaitingApproval { pending, .. }
            | FlowState::Submitting { pending }
            | FlowState::Succeeded { pending, .. } => Some(pending.flow_id),
        }
    }

    pub fn pending(&self) -> Option<&PendingTransaction> {
        match self {
            FlowState::Idle | FlowState::Building { .. } => None,
            FlowState::Failed { pending, .. } => pending.as_ref(),
            FlowState::AwaitingSignature { pending }
            | FlowState::AwaitingApproval { pending, .. }
            | FlowState::Submitting { pending }
            | FlowState::Succeeded { pending, .. } => Some(pending),
        }
    }
}

/// What a signer result did to the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureOutcome {
    /// Signed payload is waiting for the user's confirmation.
    AwaitingApproval,
    /// The user declined; the flow is idle again.
    Declined,
    Failed(String),
    /// No flow was waiting for this result.
    Discarded,
}

#[derive(Debug, Clone, Default)]
pub struct ApprovalFlow {
    state: FlowState,
}

impl ApprovalFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn phase(&self) -> FlowPhase {
        self.state.phase()
    }

    pub fn status(&self) -> Option<TransactionStatus> {
        self.phase().transaction_status()
    }

    pub fn pending(&self) -> Option<&PendingTransaction> {
        self.state.pending()
    }

    /// Starts a new flow. Only possible from `Idle`.
    pub fn begin(&mut self) -> Result<FlowId, FlowError> {
        if self.state != FlowState::Idle {
            return Err(FlowError::FlowInProgress(self.phase()));
        }
        let flow_id = FlowId::new();
        self.state = FlowState::Building { flow_id };
        debug!(flow = %flow_id, "flow started");
        Ok(flow_id)
    }

    /// Drops a flow whose build step failed.
    pub fn abort_build(&mut self, flow_id: FlowId) -> bool {
        match &self.state {
            FlowState::Building { flow_id: current } if *current == flow_id => {
                self.state = FlowState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Records the built transaction and returns the request to send to the
    /// signer, or `None` if the flow was cancelled while building.
    pub fn built(&mut self, pending: PendingTransaction) -> Option<SignRequest> {
        match &self.state {
            FlowState::Building { flow_id } if *flow_id == pending.flow_id => {}
            _ => {
                debug!(flow = %pending.flow_id, "discarding build for inactive flow");
                return None;
            }
        }
        let request = SignRequest {
            flow_id: pending.flow_id,
            chain_id: pending.account.chain_id.clone(),
            public_key: pending.account.public_key.clone(),
            schema: pending.schema.clone(),
            transaction: Arc::clone(&pending.transaction),
        };
        self.state = FlowState::AwaitingSignature { pending };
        Some(request)
    }

    pub fn on_signature(&mut self, flow_id: FlowId, result: Result<SignerResult, String>) -> SignatureOutcome {
        let pending = match std::mem::take(&mut self.state) {
            FlowState::AwaitingSignature { pending } if pending.flow_id == flow_id => pending,
            other => {
                self.state = other;
                debug!(flow = %flow_id, "discarding late signer result");
                return SignatureOutcome::Discarded;
            }
        };

        match result {
            Ok(SignerResult { valid: true, result: Some(signed) }) => {
                info!(flow = %flow_id, "transaction signed, awaiting approval");
                self.state = FlowState::AwaitingApproval {
                    pending,
                    signed: SignedTransaction(signed),
                };
                SignatureOutcome::AwaitingApproval
            }
            Ok(SignerResult { valid: false, .. }) => {
                info!(flow = %flow_id, "signature declined");
                SignatureOutcome::Declined
            }
            Ok(SignerResult { valid: true, result: None }) => {
                self.fail(flow_id, Some(pending), "signer returned no signed transaction".to_string())
            }
            Err(e) => self.fail(flow_id, Some(pending), e),
        }
    }

    fn fail(&mut self, flow_id: FlowId, pending: Option<PendingTransaction>, error: String) -> SignatureOutcome {
        warn!(flow = %flow_id, "signing failed: {}", error);
        self.state = FlowState::Failed {
            flow_id,
            pending,
            error: error.clone(),
        };
        SignatureOutcome::Failed(error)
    }

    /// User approved the signed payload; hands it out for submission.
    pub fn confirm(&mut self) -> Result<(FlowId, SignedTransaction), FlowError> {
        match std::mem::take(&mut self.state) {
            FlowState::AwaitingApproval { pending, signed } => {
                let flow_id = pending.flow_id;
                self.state = FlowState::Submitting { pending };
                Ok((flow_id, signed))
            }
            other => {
                let phase = other.phase();
                self.state = other;
                Err(FlowError::InvalidTransition { action: "confirm", phase })
            }
        }
    }

    /// Abandons the flow before submission. Returns the discarded transaction,
    /// if one was built. Requests already sent are not retracted.
    pub fn cancel(&mut self) -> Result<Option<PendingTransaction>, FlowError> {
        match std::mem::take(&mut self.state) {
            FlowState::Building { flow_id } => {
                info!(flow = %flow_id, "flow cancelled while building");
                Ok(None)
            }
            FlowState::AwaitingSignature { pending } | FlowState::AwaitingApproval { pending, .. } => {
                info!(flow = %pending.flow_id, "flow cancelled");
                Ok(Some(pending))
            }
            other => {
                let phase = other.phase();
                self.state = other;
                Err(FlowError::InvalidTransition { action: "cancel", phase })
            }
        }
    }

    /// Applies a submission result. Returns false when no flow was submitting
    /// `flow_id`, in which case nothing changes.
    pub fn on_submission(&mut self, flow_id: FlowId, result: Result<SubmittedTransaction, String>) -> bool {
        let pending = match std::mem::take(&mut self.state) {
            FlowState::Submitting { pending } if pending.flow_id == flow_id => pending,
            other => {
                self.state = other;
                debug!(flow = %flow_id, "discarding submission result for inactive flow");
                return false;
            }
        };
        self.state = match result {
            Ok(submitted) => {
                info!(flow = %flow_id, tx = %submitted.transaction_id, "transaction submitted");
                FlowState::Succeeded { pending, submitted }
            }
            Err(error) => {
                warn!(flow = %flow_id, "transaction submission failed: {}", error);
                FlowState::Failed {
                    flow_id,
                    pending: Some(pending),
                    error,
                }
            }
        };
        true
    }

    /// Closes the status view of a finished flow, resetting to `Idle`.
    pub fn close(&mut self) -> Result<(), FlowError> {
        match self.state {
            FlowState::Idle => Ok(()),
            FlowState::Succeeded { .. } | FlowState::Failed { .. } => {
                self.state = FlowState::Idle;
                Ok(())
            }
            _ => Err(FlowError::InvalidTransition {
                action: "close",
                phase: self.phase(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pending(flow_id: FlowId) -> PendingTransaction {
        PendingTransaction {
            flow_id,
            transaction: Arc::new(TransactionObject {
                module: "dex".into(),
                command: "createPool".into(),
                sender_public_key: "ab12".into(),
                nonce: "0".into(),
                fee: "1000000".into(),
                params: json!({}),
                signatures: vec![],
            }),
            fee_token_id: "0000000000000000".into(),
            account: Account::from_session_account("lisk:1:ab12").unwrap(),
            schema: json!({ "$id": "/dex/createPool" }),
        }
    }

    fn signed_flow() -> (ApprovalFlow, FlowId) {
        let mut flow = ApprovalFlow::new();
        let id = flow.begin().unwrap();
        let request = flow.built(pending(id)).unwrap();
        assert_eq!(request.chain_id.to_string(), "lisk:1");
        assert_eq!(
            flow.on_signature(id, Ok(SignerResult::signed("c0ffee"))),
            SignatureOutcome::AwaitingApproval
        );
        (flow, id)
    }

    #[test]
    fn happy_path_reaches_succeeded_and_closes() {
        let (mut flow, id) = signed_flow();
        assert_eq!(flow.phase(), FlowPhase::AwaitingApproval);

        let (confirmed, signed) = flow.confirm().unwrap();
        assert_eq!(confirmed, id);
        assert_eq!(signed, SignedTransaction("c0ffee".into()));
        assert_eq!(flow.status(), Some(TransactionStatus::Pending));

        assert!(flow.on_submission(id, Ok(SubmittedTransaction { transaction_id: "tx".into() })));
        assert_eq!(flow.phase(), FlowPhase::Succeeded);
        assert_eq!(flow.status(), Some(TransactionStatus::Success));

        flow.close().unwrap();
        assert_eq!(flow.state(), &FlowState::Idle);
        assert!(flow.pending().is_none());
    }

    #[test]
    fn decline_returns_to_idle() {
        let mut flow = ApprovalFlow::new();
        let id = flow.begin().unwrap();
        flow.built(pending(id)).unwrap();
        assert_eq!(flow.on_signature(id, Ok(SignerResult::declined())), SignatureOutcome::Declined);
        assert_eq!(flow.phase(), FlowPhase::Idle);
    }

    #[test]
    fn signer_error_fails_the_flow() {
        let mut flow = ApprovalFlow::new();
        let id = flow.begin().unwrap();
        flow.built(pending(id)).unwrap();
        let outcome = flow.on_signature(id, Err("relay down".into()));
        assert_eq!(outcome, SignatureOutcome::Failed("relay down".into()));
        assert_eq!(flow.status(), Some(TransactionStatus::Failure));
    }

    #[test]
    fn second_begin_leaves_flow_untouched() {
        let (mut flow, _) = signed_flow();
        let before = flow.state().clone();
        assert_eq!(flow.begin(), Err(FlowError::FlowInProgress(FlowPhase::AwaitingApproval)));
        assert_eq!(flow.state(), &before);
    }

    #[test]
    fn late_submission_result_after_cancel_is_discarded() {
        let (mut flow, id) = signed_flow();
        assert!(flow.cancel().unwrap().is_some());
        assert_eq!(flow.phase(), FlowPhase::Idle);

        assert!(!flow.on_submission(id, Ok(SubmittedTransaction { transaction_id: "tx".into() })));
        assert_eq!(flow.phase(), FlowPhase::Idle);
    }

    #[test]
    fn late_signature_for_old_flow_is_discarded() {
        let mut flow = ApprovalFlow::new();
        let old = flow.begin().unwrap();
        flow.built(pending(old)).unwrap();
        flow.cancel().unwrap();

        let new = flow.begin().unwrap();
        flow.built(pending(new)).unwrap();
        assert_eq!(
            flow.on_signature(old, Ok(SignerResult::signed("stale"))),
            SignatureOutcome::Discarded
        );
        assert_eq!(flow.phase(), FlowPhase::AwaitingSignature);
    }

    #[test]
    fn invalid_transitions_are_refused() {
        let mut flow = ApprovalFlow::new();
        assert!(matches!(
            flow.confirm(),
            Err(FlowError::InvalidTransition { action: "confirm", phase: FlowPhase::Idle })
        ));
        assert!(flow.cancel().is_err());
        flow.close().unwrap();

        let (mut flow, _) = signed_flow();
        flow.confirm().unwrap();
        assert!(matches!(
            flow.cancel(),
            Err(FlowError::InvalidTransition { action: "cancel", phase: FlowPhase::Submitting })
        ));
        assert!(flow.close().is_err());
        assert_eq!(flow.phase(), FlowPhase::Submitting);
    }

    #[test]
    fn build_after_cancel_is_dropped() {
        let mut flow = ApprovalFlow::new();
        let id = flow.begin().unwrap();
        assert_eq!(flow.cancel().unwrap(), None);
        assert!(flow.built(pending(id)).is_none());
        assert!(!flow.abort_build(id));
        assert_eq!(flow.phase(), FlowPhase::Idle);
    }
}
