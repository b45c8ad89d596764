//! Drives the approval flow: builds, asks the signer, waits for the user's
//! confirmation and submits, publishing every transition as a [`FlowStatus`].

use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info};

use crate::rpc::node::ChainReader;
use crate::wallet::approval::{ApprovalFlow, FlowState, PendingTransaction, SignatureOutcome};
use crate::wallet::models::{
    Account, FlowError, FlowId, FlowPhase, SubmittedTransaction, TransactionObject, TransactionStatus,
};
use crate::wallet::nonce_manager::NonceManager;
use crate::wallet::services::event::{AlertVariant, Notifier};
use crate::wallet::services::signer::{SignerResult, TransactionSigner, TransactionSubmitter};
use crate::wallet::services::transactions::{AccountContext, DexAction, TransactionBuilder};

/// Observable view of the current flow.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowStatus {
    pub phase: FlowPhase,
    pub flow_id: Option<FlowId>,
    pub status: Option<TransactionStatus>,
    pub transaction: Option<Arc<TransactionObject>>,
    pub fee_token_id: Option<String>,
    pub error: Option<String>,
    pub submitted: Option<SubmittedTransaction>,
    /// A request to the signer or the node is in flight.
    pub request_pending: bool,
}

impl Default for FlowStatus {
    fn default() -> Self {
        Self::from_state(&FlowState::Idle)
    }
}

impl FlowStatus {
    fn from_state(state: &FlowState) -> Self {
        let phase = state.phase();
        let pending = state.pending();
        Self {
            phase,
            flow_id: state.flow_id(),
            status: phase.transaction_status(),
            transaction: pending.map(|p| Arc::clone(&p.transaction)),
            fee_token_id: pending.map(|p| p.fee_token_id.clone()),
            error: match state {
                FlowState::Failed { error, .. } => Some(error.clone()),
                _ => None,
            },
            submitted: match state {
                FlowState::Succeeded { submitted, .. } => Some(submitted.clone()),
                _ => None,
            },
            request_pending: matches!(phase, FlowPhase::AwaitingSignature | FlowPhase::Submitting),
        }
    }
}

pub struct TransactionCoordinator {
    builder: TransactionBuilder,
    chain: Arc<dyn ChainReader>,
    nonces: NonceManager,
    signer: Arc<dyn TransactionSigner>,
    submitter: Arc<dyn TransactionSubmitter>,
    flow: Mutex<ApprovalFlow>,
    status: watch::Sender<FlowStatus>,
    notifier: Notifier,
}

impl TransactionCoordinator {
    pub fn new(
        builder: TransactionBuilder,
        chain: Arc<dyn ChainReader>,
        signer: Arc<dyn TransactionSigner>,
        submitter: Arc<dyn TransactionSubmitter>,
        notifier: Notifier,
    ) -> Self {
        let (status, _rx) = watch::channel(FlowStatus::default());
        Self {
            builder,
            chain,
            nonces: NonceManager::new(),
            signer,
            submitter,
            flow: Mutex::new(ApprovalFlow::new()),
            status,
            notifier,
        }
    }

    pub fn status(&self) -> FlowStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FlowStatus> {
        self.status.subscribe()
    }

    pub fn nonces(&self) -> &NonceManager {
        &self.nonces
    }

    fn publish(&self, flow: &ApprovalFlow) {
        self.status.send_replace(FlowStatus::from_state(flow.state()));
    }

    async fn abort(&self, flow_id: FlowId, err: FlowError) -> FlowError {
        let mut flow = self.flow.lock().await;
        if flow.abort_build(flow_id) {
            self.publish(&flow);
        }
        drop(flow);
        error!(flow = %flow_id, "Failed to build transaction: {}", err);
        self.notifier.notify(err.to_string(), AlertVariant::Fail);
        err
    }

    /// Starts a flow for `action` sent from `account`. Returns once the sign
    /// request has been dispatched; the signer result arrives asynchronously.
    pub async fn start(self: &Arc<Self>, action: DexAction, account: &Account) -> Result<FlowId, FlowError> {
        let flow_id = {
            let mut flow = self.flow.lock().await;
            let flow_id = flow.begin()?;
            self.publish(&flow);
            flow_id
        };

        if let Err(e) = self.builder.validate(&action) {
            return Err(self.abort(flow_id, e.into()).await);
        }

        let nonce = match self.nonces.next_nonce(&account.address, self.chain.as_ref()).await {
            Ok(nonce) => nonce,
            Err(e) => return Err(self.abort(flow_id, FlowError::Context(e.to_string())).await),
        };
        let fee_token_id = match self.chain.fee_token_id().await {
            Ok(token) => token,
            Err(e) => return Err(self.abort(flow_id, FlowError::Context(e.to_string())).await),
        };
        let ctx = AccountContext {
            account: account.clone(),
            nonce,
            fee_token_id,
        };
        let built = match self.builder.build(&action, &ctx) {
            Ok(built) => built,
            Err(e) => return Err(self.abort(flow_id, e.into()).await),
        };

        let pending = PendingTransaction {
            flow_id,
            transaction: Arc::new(built.transaction),
            fee_token_id: built.fee_token_id,
            account: account.clone(),
            schema: built.schema,
        };
        let request = {
            let mut flow = self.flow.lock().await;
            let request = flow.built(pending);
            self.publish(&flow);
            match request {
                Some(request) => request,
                None => {
                    return Err(FlowError::InvalidTransition {
                        action: "sign",
                        phase: flow.phase(),
                    })
                }
            }
        };

        info!(
            flow = %flow_id,
            module = %request.transaction.module,
            command = %request.transaction.command,
            "requesting signature"
        );
        let this = Arc::clone(self);
        let address = account.address.clone();
        tokio::spawn(async move {
            let result = this
                .signer
                .sign_transaction(&request)
                .await
                .map_err(|e| e.to_string());
            this.apply_signature(flow_id, &address, result).await;
        });
        Ok(flow_id)
    }

    async fn apply_signature(
        &self,
        flow_id: FlowId,
        address: &str,
        result: Result<SignerResult, String>,
    ) {
        let outcome = {
            let mut flow = self.flow.lock().await;
            let outcome = flow.on_signature(flow_id, result);
            self.publish(&flow);
            outcome
        };
        match outcome {
            SignatureOutcome::AwaitingApproval | SignatureOutcome::Discarded => {}
            SignatureOutcome::Declined => self.nonces.release(address).await,
            SignatureOutcome::Failed(e) => {
                self.nonces.release(address).await;
                self.notifier.notify(e, AlertVariant::Fail);
            }
        }
    }

    /// Submits the signed transaction the user approved and waits for the
    /// node's answer. Returns the terminal phase.
    pub async fn confirm(&self) -> Result<FlowPhase, FlowError> {
        let (flow_id, signed) = {
            let mut flow = self.flow.lock().await;
            let confirmed = flow.confirm()?;
            self.publish(&flow);
            confirmed
        };
        debug!(flow = %flow_id, "submitting signed transaction");

        let result = self.submitter.submit(&signed).await.map_err(|e| e.to_string());
        let terminal = if result.is_ok() {
            FlowPhase::Succeeded
        } else {
            FlowPhase::Failed
        };
        if self.apply_submission_result(flow_id, result).await {
            Ok(terminal)
        } else {
            Ok(self.status().phase)
        }
    }

    /// Applies a submission result reported for `flow_id`. Results for a flow
    /// that is no longer submitting are dropped.
    pub async fn apply_submission_result(
        &self,
        flow_id: FlowId,
        result: Result<SubmittedTransaction, String>,
    ) -> bool {
        let outcome = result
            .as_ref()
            .map(|submitted| submitted.transaction_id.clone())
            .map_err(Clone::clone);
        let (applied, sender) = {
            let mut flow = self.flow.lock().await;
            let sender = flow
                .pending()
                .filter(|p| p.flow_id == flow_id)
                .map(|p| (p.account.address.clone(), p.transaction.nonce.clone()));
            let applied = flow.on_submission(flow_id, result);
            self.publish(&flow);
            (applied, sender)
        };
        let Some((address, nonce)) = sender.filter(|_| applied) else {
            return false;
        };

        // the published status may already be closed, settle from the result itself
        match outcome {
            Ok(transaction_id) => {
                if let Ok(used) = nonce.parse::<u64>() {
                    self.nonces.commit(&address, used).await;
                }
                self.notifier.notify(
                    format!("Transaction {} submitted.", transaction_id),
                    AlertVariant::Success,
                );
            }
            Err(error) => {
                self.nonces.release(&address).await;
                let err = FlowError::SubmissionFailed(error);
                self.notifier.notify(err.to_string(), AlertVariant::Fail);
            }
        }
        true
    }

    /// Drops the current flow before submission.
    pub async fn cancel(&self) -> Result<(), FlowError> {
        let discarded = {
            let mut flow = self.flow.lock().await;
            let discarded = flow.cancel()?;
            self.publish(&flow);
            discarded
        };
        if let Some(pending) = discarded {
            self.nonces.release(&pending.account.address).await;
        }
        Ok(())
    }

    /// Closes the status view of a finished flow.
    pub async fn close(&self) -> Result<(), FlowError> {
        let mut flow = self.flow.lock().await;
        flow.close()?;
        self.publish(&flow);
        Ok(())
    }
}
