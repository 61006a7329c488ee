//! # Transaction Pipeline
//!
//! The state machine shared by question creation and arbitration requests.
//!
//! A [`TransactionPipeline`] sequences one attempt at a time:
//!
//! 1. wallet account check, requesting access when no account is connected
//! 2. chain check, requesting a switch when the wallet is elsewhere
//! 3. broadcast of exactly one transaction (`Submitting`)
//! 4. receipt wait (`Confirming`), then `Succeeded` or `Failed`
//!
//! Gas estimation is a side branch (`Idle → Estimating → Idle`) whose
//! failures are recorded as warnings only.
//!
//! # Status Surface
//!
//! Every state change is published on a `tokio::sync::watch` channel, so a
//! UI sees the transaction hash as soon as the broadcast is acknowledged,
//! before confirmation completes.
//!
//! # Cancellation
//!
//! [`TransactionPipeline::reset`] returns the pipeline to `Idle` at any
//! time and bumps the attempt epoch. Results of an attempt started under an
//! older epoch are discarded; a broadcast transaction is not aborted
//! on-chain.

use crate::application::error::{PipelineError, PipelineResult};
use crate::domain::errors::DomainResult;
use crate::domain::entities::{GasEstimate, PipelineState, TransactionOutcome};
use crate::domain::value_objects::{ChainId, NativeAmount, PipelinePhase};
use crate::infrastructure::blockchain::gateway::{ContractCall, ContractGateway};
use crate::infrastructure::blockchain::wallet::WalletGateway;
use ethers::types::{Address, Bytes, TransactionReceipt, U64};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

/// A fully prepared contract call for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCall {
    /// Chain the wallet must be on.
    pub chain_id: ChainId,
    /// Target contract.
    pub to: Address,
    /// Encoded calldata.
    pub data: Bytes,
    /// Value attached to the transaction.
    pub value: NativeAmount,
}

impl PreparedCall {
    fn contract_call(&self, from: Option<Address>) -> ContractCall {
        ContractCall {
            from,
            to: self.to,
            data: self.data.clone(),
            value: self.value.wei(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: PipelineState,
    epoch: u64,
    in_flight: bool,
}

/// One transaction pipeline instance.
///
/// State is owned by the instance; independent flows use independent
/// instances.
pub struct TransactionPipeline {
    name: &'static str,
    wallet: Arc<dyn WalletGateway>,
    gateway: Arc<dyn ContractGateway>,
    inner: Mutex<Inner>,
    status: watch::Sender<PipelineState>,
}

/// Marks the in-flight slot of one attempt and releases it on drop.
struct Attempt<'a> {
    pipeline: &'a TransactionPipeline,
    epoch: u64,
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        let mut inner = self.pipeline.lock();
        if inner.epoch == self.epoch {
            inner.in_flight = false;
        }
    }
}

impl TransactionPipeline {
    /// Creates an idle pipeline.
    #[must_use]
    pub fn new(
        name: &'static str,
        wallet: Arc<dyn WalletGateway>,
        gateway: Arc<dyn ContractGateway>,
    ) -> Self {
        let (status, _) = watch::channel(PipelineState::new());
        Self {
            name,
            wallet,
            gateway,
            inner: Mutex::new(Inner::default()),
            status,
        }
    }

    /// Returns the pipeline name used in logs.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the wallet gateway.
    #[must_use]
    pub fn wallet(&self) -> &Arc<dyn WalletGateway> {
        &self.wallet
    }

    /// Returns the contract gateway.
    #[must_use]
    pub fn gateway(&self) -> &Arc<dyn ContractGateway> {
        &self.gateway
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.lock().state.clone()
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> PipelinePhase {
        self.lock().state.phase
    }

    /// Returns true while an attempt or estimation is running.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.lock().in_flight
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.status.subscribe()
    }

    /// Returns the pipeline to `Idle` and discards any in-flight results.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.epoch = inner.epoch.wrapping_add(1);
        inner.in_flight = false;
        inner.state = PipelineState::new();
        self.status.send_replace(inner.state.clone());
        info!(pipeline = self.name, epoch = inner.epoch, "Pipeline reset");
    }

    /// Records a failure that happened outside an attempt (for example a
    /// failed fee load) as a warning on an idle pipeline.
    pub fn record_warning(&self, err: &PipelineError) {
        let mut inner = self.lock();
        if inner.in_flight || inner.state.phase != PipelinePhase::Idle {
            return;
        }
        inner.state.error = Some(err.failure());
        self.status.send_replace(inner.state.clone());
    }

    /// Estimates the gas cost of `prepared`.
    ///
    /// The pipeline moves to `Estimating` and back to `Idle`. A failure is
    /// stored as a warning and returned; it does not block a later submit.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Busy` if the pipeline is not idle, the
    /// preparation error, or `PipelineError::SimulationFailed`.
    #[instrument(skip(self, prepared), fields(pipeline = self.name))]
    pub async fn estimate(&self, prepared: PipelineResult<PreparedCall>) -> PipelineResult<GasEstimate> {
        let attempt = self.begin(|state| {
            state.error = None;
            state.transition(PipelinePhase::Estimating)
        })?;

        let result = self.run_estimate(prepared).await;

        let mut inner = self.lock();
        if inner.epoch != attempt.epoch {
            return Err(PipelineError::Cancelled);
        }
        inner.state.phase = PipelinePhase::Idle;
        match &result {
            Ok(estimate) => {
                inner.state.gas_estimate = Some(*estimate);
                info!(cost = %estimate.cost, gas = %estimate.gas_units, "Gas estimated");
            }
            Err(err) => {
                inner.state.error = Some(err.failure());
                warn!(error = %err, "Gas estimation failed");
            }
        }
        self.status.send_replace(inner.state.clone());
        result
    }

    async fn run_estimate(&self, prepared: PipelineResult<PreparedCall>) -> PipelineResult<GasEstimate> {
        let prepared = prepared?;
        let from = self
            .wallet
            .accounts()
            .await
            .ok()
            .and_then(|accounts| accounts.first().copied());
        let call = prepared.contract_call(from);

        let gas_units = self
            .gateway
            .estimate_gas(&call)
            .await
            .map_err(|e| PipelineError::SimulationFailed(e.reason.unwrap_or(e.message)))?;
        let gas_price = self
            .gateway
            .gas_price()
            .await
            .map_err(|e| PipelineError::SimulationFailed(e.message))?;

        GasEstimate::new(gas_units, gas_price)
            .map_err(|e| PipelineError::SimulationFailed(e.to_string()))
    }

    /// Runs one submission attempt.
    ///
    /// `prepared` is evaluated before any wallet or network call; an error
    /// fails the attempt immediately. `interpret` turns a successful receipt
    /// into the outcome.
    ///
    /// A receipt with status 0 was mined and reverted by the contract, so it
    /// fails as `SubmissionFailed`. `ConfirmationFailed` is kept for a missing
    /// receipt or one that lacks the expected event. RPC receipts carry no
    /// revert reason; replaying the call to recover one would need the
    /// historical state at that block.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Busy` without touching the state if the
    /// pipeline is not idle. Every other error is also recorded in the state
    /// as a `Failed` phase.
    #[instrument(skip(self, prepared, interpret), fields(pipeline = self.name))]
    pub async fn submit<F>(
        &self,
        prepared: PipelineResult<PreparedCall>,
        interpret: F,
    ) -> PipelineResult<TransactionOutcome>
    where
        F: FnOnce(&TransactionReceipt) -> PipelineResult<TransactionOutcome> + Send,
    {
        let attempt = self.begin(|state| {
            *state = PipelineState::new();
            Ok(())
        })?;
        let epoch = attempt.epoch;

        let prepared = match prepared {
            Ok(prepared) => prepared,
            Err(err) => return Err(self.fail(epoch, err)),
        };

        let from = match self.ensure_account().await {
            Ok(account) => account,
            Err(err) => return Err(self.fail(epoch, err)),
        };
        if let Err(err) = self.ensure_chain(prepared.chain_id).await {
            return Err(self.fail(epoch, err));
        }

        self.update(epoch, |state| state.transition(PipelinePhase::Submitting))?;

        let call = prepared.contract_call(Some(from));
        let hash = match self.gateway.send_transaction(&call).await {
            Ok(hash) => hash,
            Err(err) => return Err(self.fail(epoch, PipelineError::from_submission(err))),
        };
        info!(tx_hash = %hash, from = ?from, to = ?call.to, "Transaction broadcast");

        if let Err(err) = self.update(epoch, |state| state.record_broadcast(hash)) {
            warn!(tx_hash = %hash, "Attempt reset after broadcast, dropping tracking");
            return Err(err);
        }

        let receipt = match self.gateway.wait_for_receipt(hash).await {
            Ok(Some(receipt)) => receipt,
            Ok(None) => {
                return Err(self.fail(
                    epoch,
                    PipelineError::confirmation_failed("transaction receipt not available"),
                ));
            }
            Err(err) => {
                return Err(self.fail(epoch, PipelineError::confirmation_failed(err.message)));
            }
        };

        if receipt.status == Some(U64::zero()) {
            return Err(self.fail(
                epoch,
                PipelineError::submission_failed("transaction reverted on-chain"),
            ));
        }

        let outcome = match interpret(&receipt) {
            Ok(outcome) => outcome,
            Err(err) => return Err(self.fail(epoch, err)),
        };
        self.update(epoch, |state| state.succeed(outcome))?;
        info!(
            tx_hash = %hash,
            question_id = %outcome.question_id(),
            block = ?outcome.block_number(),
            "Transaction confirmed"
        );
        Ok(outcome)
    }

    /// Returns a connected account, requesting access when none is
    /// connected.
    async fn ensure_account(&self) -> PipelineResult<Address> {
        if let Ok(accounts) = self.wallet.accounts().await
            && let Some(account) = accounts.first()
        {
            return Ok(*account);
        }

        info!(pipeline = self.name, "No connected account, requesting access");
        let accounts = self
            .wallet
            .request_accounts()
            .await
            .map_err(|e| PipelineError::wallet_not_connected(e.message))?;
        accounts
            .first()
            .copied()
            .ok_or_else(|| PipelineError::wallet_not_connected("no account available"))
    }

    /// Makes sure the wallet is on `required`, requesting a switch if not.
    async fn ensure_chain(&self, required: ChainId) -> PipelineResult<()> {
        let current = self
            .wallet
            .chain_id()
            .await
            .map_err(|e| PipelineError::wrong_network(format!("could not read chain id: {}", e.message)))?;
        if current == required {
            return Ok(());
        }

        info!(
            pipeline = self.name,
            current = %current,
            required = %required,
            "Wallet on wrong chain, requesting switch"
        );
        self.wallet
            .switch_chain(required)
            .await
            .map_err(|e| PipelineError::from_switch(&e, required))?;

        let switched = self
            .wallet
            .chain_id()
            .await
            .map_err(|e| PipelineError::wrong_network(format!("could not read chain id: {}", e.message)))?;
        if switched != required {
            return Err(PipelineError::wrong_network(format!(
                "wallet is on chain {switched}, expected {required}"
            )));
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims the in-flight slot and applies `start` to the state.
    fn begin(
        &self,
        start: impl FnOnce(&mut PipelineState) -> DomainResult<()>,
    ) -> PipelineResult<Attempt<'_>> {
        let mut inner = self.lock();
        let phase = inner.state.phase;
        if inner.in_flight || phase != PipelinePhase::Idle {
            warn!(pipeline = self.name, phase = %phase, "Rejected concurrent attempt");
            return Err(PipelineError::Busy(phase));
        }

        let mut next = inner.state.clone();
        start(&mut next).map_err(|_| PipelineError::Busy(phase))?;
        inner.state = next;
        inner.in_flight = true;
        self.status.send_replace(inner.state.clone());

        Ok(Attempt {
            pipeline: self,
            epoch: inner.epoch,
        })
    }

    /// Applies `change` if `epoch` is still current.
    fn update(
        &self,
        epoch: u64,
        change: impl FnOnce(&mut PipelineState) -> DomainResult<()>,
    ) -> PipelineResult<()> {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            return Err(PipelineError::Cancelled);
        }
        change(&mut inner.state).map_err(|_| PipelineError::Cancelled)?;
        self.status.send_replace(inner.state.clone());
        Ok(())
    }

    /// Records `err` as the attempt's failure and returns it.
    fn fail(&self, epoch: u64, err: PipelineError) -> PipelineError {
        let failure = err.failure();
        match self.update(epoch, |state| state.fail(failure)) {
            Ok(()) => {
                warn!(pipeline = self.name, kind = %err.kind(), error = %err, "Attempt failed");
                err
            }
            Err(cancelled) => cancelled,
        }
    }
}

impl fmt::Debug for TransactionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionPipeline")
            .field("name", &self.name)
            .field("phase", &self.phase())
            .finish()
    }
}
