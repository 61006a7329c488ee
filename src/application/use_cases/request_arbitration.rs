//! # Request Arbitration Use Case
//!
//! Requests arbitration of a question on the foreign proxy of its bridge.
//!
//! The foreign proxy is derived from the current question on every call,
//! never cached. The dispute fee must be loaded with
//! [`ArbitrationRequestPipeline::load_dispute_fee`] before a request can be
//! prepared; replacing the question discards the loaded fee.

use crate::application::error::{PipelineError, PipelineResult};
use crate::application::services::BridgeResolver;
use crate::application::use_cases::pipeline::{PreparedCall, TransactionPipeline};
use crate::domain::entities::{
    ForeignProxyInfo, GasEstimate, PipelineState, QuestionRecord, TransactionOutcome,
};
use crate::domain::value_objects::{NativeAmount, QuestionId};
use crate::infrastructure::blockchain::contracts::{
    decode_dispute_fee, encode_get_dispute_fee, encode_request_arbitration, parse_address,
};
use crate::infrastructure::blockchain::{ContractCall, ContractGateway, WalletGateway};
use ethers::types::{Address, TransactionReceipt};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

/// Parameters of an arbitration request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArbitrationRequestParams {
    /// Highest bond the requester accepts, as a decimal string in native
    /// currency. `None` means no upper bound.
    pub max_previous: Option<String>,
}

impl ArbitrationRequestParams {
    /// Creates parameters with no upper bound.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the max previous bond.
    #[must_use]
    pub fn with_max_previous(mut self, max_previous: impl Into<String>) -> Self {
        self.max_previous = Some(max_previous.into());
        self
    }
}

#[derive(Debug, Default)]
struct Context {
    question: Option<QuestionRecord>,
    dispute_fee: Option<NativeAmount>,
    generation: u64,
}

/// Arbitration request flow for one question at a time.
#[derive(Debug)]
pub struct ArbitrationRequestPipeline {
    resolver: Arc<BridgeResolver>,
    context: Mutex<Context>,
    pipeline: TransactionPipeline,
}

impl ArbitrationRequestPipeline {
    /// Creates an idle pipeline for `question`.
    #[must_use]
    pub fn new(
        question: Option<QuestionRecord>,
        resolver: Arc<BridgeResolver>,
        wallet: Arc<dyn WalletGateway>,
        gateway: Arc<dyn ContractGateway>,
    ) -> Self {
        Self {
            resolver,
            context: Mutex::new(Context {
                question,
                ..Context::default()
            }),
            pipeline: TransactionPipeline::new("request_arbitration", wallet, gateway),
        }
    }

    /// Returns the underlying pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &TransactionPipeline {
        &self.pipeline
    }

    /// Returns a snapshot of the pipeline state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.pipeline.state()
    }

    /// Subscribes to pipeline state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.pipeline.subscribe()
    }

    /// Returns the current question.
    #[must_use]
    pub fn question(&self) -> Option<QuestionRecord> {
        self.lock().question.clone()
    }

    /// Replaces the question and discards the loaded dispute fee.
    pub fn set_question(&self, question: Option<QuestionRecord>) {
        let mut context = self.lock();
        context.question = question;
        context.dispute_fee = None;
        context.generation = context.generation.wrapping_add(1);
    }

    /// Resolves the foreign proxy of the current question.
    #[must_use]
    pub fn foreign_proxy_info(&self) -> Option<ForeignProxyInfo> {
        let question = self.question()?;
        self.resolver.resolve_foreign_proxy_info(&question)
    }

    /// Returns the loaded dispute fee.
    #[must_use]
    pub fn dispute_fee(&self) -> Option<NativeAmount> {
        self.lock().dispute_fee
    }

    /// Returns true if the dispute fee is loaded and a foreign proxy is
    /// known.
    #[must_use]
    pub fn has_required_data(&self) -> bool {
        self.dispute_fee().is_some() && self.foreign_proxy_info().is_some()
    }

    /// Returns true if the current question accepts an arbitration request.
    #[must_use]
    pub fn can_request(&self) -> bool {
        self.question()
            .is_some_and(|q| self.resolver.can_request_arbitration(&q))
    }

    /// Returns true if arbitration was already requested for the current
    /// question.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.question()
            .is_some_and(|q| self.resolver.is_arbitration_requested(&q))
    }

    /// Reads the dispute fee of the current question from its foreign
    /// proxy.
    ///
    /// A failure is recorded as a warning on an idle pipeline.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::MissingContractData` when there is no
    /// question or foreign proxy, or the fee could not be read.
    #[instrument(skip(self))]
    pub async fn load_dispute_fee(&self) -> PipelineResult<NativeAmount> {
        let result = self.fetch_dispute_fee().await;
        if let Err(err) = &result {
            warn!(error = %err, "Failed to load dispute fee");
            self.pipeline.record_warning(err);
        }
        result
    }

    async fn fetch_dispute_fee(&self) -> PipelineResult<NativeAmount> {
        let (question_id, generation) = {
            let context = self.lock();
            let question = context
                .question
                .as_ref()
                .ok_or_else(|| PipelineError::missing_contract_data("no question selected"))?;
            (question.id, context.generation)
        };
        let proxy = self.foreign_proxy_address()?;

        let data = self
            .pipeline
            .gateway()
            .call(&ContractCall::read(proxy, encode_get_dispute_fee(question_id)))
            .await
            .map_err(|e| {
                PipelineError::missing_contract_data(format!("failed to load dispute fee: {}", e.message))
            })?;
        let fee = decode_dispute_fee(&data)
            .map_err(|e| PipelineError::missing_contract_data(e.to_string()))?;

        let mut context = self.lock();
        if context.generation != generation {
            return Err(PipelineError::Cancelled);
        }
        context.dispute_fee = Some(fee);
        info!(question_id = %question_id, fee = %fee, "Dispute fee loaded");
        Ok(fee)
    }

    /// Returns the pipeline to `Idle` and discards the loaded dispute fee.
    pub fn reset(&self) {
        {
            let mut context = self.lock();
            context.dispute_fee = None;
            context.generation = context.generation.wrapping_add(1);
        }
        self.pipeline.reset();
    }

    /// Builds the `requestArbitration` call for `params`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::MissingContractData` when the dispute fee,
    /// question or foreign proxy is missing, and
    /// `PipelineError::InvalidInput` for an unusable max previous bond.
    pub fn prepare(&self, params: &ArbitrationRequestParams) -> PipelineResult<PreparedCall> {
        self.prepare_request(params).map(|(call, _)| call)
    }

    fn prepare_request(
        &self,
        params: &ArbitrationRequestParams,
    ) -> PipelineResult<(PreparedCall, QuestionId)> {
        let (question_id, fee) = {
            let context = self.lock();
            let fee = context
                .dispute_fee
                .ok_or_else(|| PipelineError::missing_contract_data("dispute fee not loaded"))?;
            let question = context
                .question
                .as_ref()
                .ok_or_else(|| PipelineError::missing_contract_data("no question selected"))?;
            (question.id, fee)
        };
        let info = self
            .foreign_proxy_info()
            .ok_or_else(|| PipelineError::missing_contract_data("foreign proxy not found"))?;
        let to = proxy_address(&info)?;
        let max_previous = NativeAmount::parse_or_zero(params.max_previous.as_deref())?;

        let call = PreparedCall {
            chain_id: info.foreign_chain_id,
            to,
            data: encode_request_arbitration(question_id, max_previous),
            value: fee,
        };
        Ok((call, question_id))
    }

    /// Estimates the gas cost of the request.
    ///
    /// # Errors
    ///
    /// See [`TransactionPipeline::estimate`].
    #[instrument(skip(self, params))]
    pub async fn estimate_gas(&self, params: &ArbitrationRequestParams) -> PipelineResult<GasEstimate> {
        self.pipeline.estimate(self.prepare(params)).await
    }

    /// Requests arbitration and waits for confirmation.
    ///
    /// # Errors
    ///
    /// See [`TransactionPipeline::submit`]. A missing dispute fee fails the
    /// attempt before any wallet or network call.
    #[instrument(skip(self, params))]
    pub async fn request_arbitration(
        &self,
        params: &ArbitrationRequestParams,
    ) -> PipelineResult<TransactionOutcome> {
        let (prepared, question_id) = match self.prepare_request(params) {
            Ok((call, question_id)) => (Ok(call), Some(question_id)),
            Err(err) => (Err(err), None),
        };
        self.pipeline
            .submit(prepared, move |receipt| {
                let question_id = question_id
                    .ok_or_else(|| PipelineError::missing_contract_data("no question selected"))?;
                Ok(arbitration_requested(question_id, receipt))
            })
            .await
    }

    fn foreign_proxy_address(&self) -> PipelineResult<Address> {
        let info = self
            .foreign_proxy_info()
            .ok_or_else(|| PipelineError::missing_contract_data("foreign proxy not found"))?;
        proxy_address(&info)
    }

    fn lock(&self) -> MutexGuard<'_, Context> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn proxy_address(info: &ForeignProxyInfo) -> PipelineResult<Address> {
    parse_address(&info.foreign_proxy_address)
        .map_err(|e| PipelineError::missing_contract_data(e.to_string()))
}

fn arbitration_requested(question_id: QuestionId, receipt: &TransactionReceipt) -> TransactionOutcome {
    TransactionOutcome::ArbitrationRequested {
        question_id,
        block_number: receipt.block_number.map(|b| b.as_u64()),
    }
}
