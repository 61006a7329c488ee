//! # Create Question Use Case
//!
//! Asks a new question on the oracle contract of a home chain.
//!
//! The question is sent to the chain's primary oracle contract with the
//! chain's default arbitrator, the bounty as transaction value, and a random
//! nonce unless the caller supplies one. On confirmation the new question id
//! is read from the first `LogNewQuestion` event of the receipt.

use crate::application::error::{PipelineError, PipelineResult};
use crate::application::services::BridgeResolver;
use crate::application::use_cases::pipeline::{PreparedCall, TransactionPipeline};
use crate::config::PipelineConfig;
use crate::domain::entities::{GasEstimate, PipelineState, TransactionOutcome};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{ChainId, NativeAmount};
use crate::infrastructure::blockchain::contracts::{
    AskQuestionCall, find_new_question_id, format_question_text, parse_address,
};
use crate::infrastructure::blockchain::{ContractGateway, WalletGateway};
use chrono::{DateTime, Utc};
use ethers::types::{TransactionReceipt, U256};
use rand::Rng;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::instrument;

/// Parameters of a new question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateQuestionParams {
    /// Question title.
    pub title: String,
    /// Question category.
    pub category: String,
    /// Answer timeout in seconds.
    pub timeout_secs: u64,
    /// Opening time; `None` opens the question immediately.
    pub opening_time: Option<DateTime<Utc>>,
    /// Bounty as a decimal string in native currency (e.g. `"0.01"`).
    pub bounty: String,
    /// Nonce; `None` draws a random one.
    pub nonce: Option<u64>,
}

impl CreateQuestionParams {
    /// Creates parameters with no opening time and a random nonce.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        timeout_secs: u64,
        bounty: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            timeout_secs,
            opening_time: None,
            bounty: bounty.into(),
            nonce: None,
        }
    }

    /// Sets the opening time.
    #[must_use]
    pub fn with_opening_time(mut self, opening_time: DateTime<Utc>) -> Self {
        self.opening_time = Some(opening_time);
        self
    }

    /// Sets the nonce.
    #[must_use]
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }
}

/// Question creation flow for one home chain.
#[derive(Debug)]
pub struct QuestionCreationPipeline {
    chain_name: String,
    resolver: Arc<BridgeResolver>,
    config: PipelineConfig,
    pipeline: TransactionPipeline,
}

impl QuestionCreationPipeline {
    /// Creates an idle question creation pipeline for `chain_name`.
    #[must_use]
    pub fn new(
        chain_name: impl Into<String>,
        resolver: Arc<BridgeResolver>,
        wallet: Arc<dyn WalletGateway>,
        gateway: Arc<dyn ContractGateway>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            chain_name: chain_name.into(),
            resolver,
            config,
            pipeline: TransactionPipeline::new("create_question", wallet, gateway),
        }
    }

    /// Returns the home chain name.
    #[must_use]
    pub fn chain_name(&self) -> &str {
        &self.chain_name
    }

    /// Returns the chain the wallet must be on.
    #[must_use]
    pub fn required_chain_id(&self) -> ChainId {
        self.resolver.chains().chain_id_for_name(&self.chain_name)
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

    /// Returns the pipeline to `Idle`.
    pub fn reset(&self) {
        self.pipeline.reset();
    }

    /// Builds the `askQuestion` call for `params`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidInput` for an unusable title, timeout,
    /// opening time or bounty, and `PipelineError::MissingContractData` when
    /// no oracle or arbitrator is known for the chain.
    pub fn prepare(&self, params: &CreateQuestionParams) -> PipelineResult<PreparedCall> {
        let title = params.title.trim();
        if title.is_empty() {
            return Err(PipelineError::invalid_input("question title is empty"));
        }
        let timeout = u32::try_from(params.timeout_secs)
            .ok()
            .filter(|t| *t > 0)
            .ok_or_else(|| {
                PipelineError::invalid_input(format!("invalid timeout: {} seconds", params.timeout_secs))
            })?;
        let opening = params.opening_time.unwrap_or_else(Utc::now);
        let opening_ts = u32::try_from(opening.timestamp()).map_err(|_| {
            DomainError::InvalidTimestamp(format!("opening time out of range: {opening}"))
        })?;
        let bounty = NativeAmount::parse(&params.bounty)?;

        let chains = self.resolver.chains();
        let oracle = self
            .resolver
            .primary_oracle_address(&self.chain_name)
            .ok_or_else(|| {
                PipelineError::missing_contract_data(format!(
                    "no oracle contract found for {}",
                    self.chain_name
                ))
            })?;
        let oracle = parse_address(&oracle).map_err(|e| PipelineError::missing_contract_data(e.to_string()))?;
        let arbitrator = chains.default_arbitrator(&self.chain_name).ok_or_else(|| {
            PipelineError::missing_contract_data(format!("no arbitrator known for {}", self.chain_name))
        })?;
        let arbitrator =
            parse_address(arbitrator).map_err(|e| PipelineError::missing_contract_data(e.to_string()))?;

        let nonce = params
            .nonce
            .unwrap_or_else(|| rand::rng().random_range(0..self.config.max_nonce.max(1)));

        let call = AskQuestionCall {
            template_id: self.config.template_id,
            question: format_question_text(title, params.category.trim(), &self.config.language),
            arbitrator,
            timeout,
            opening_ts,
            nonce: U256::from(nonce),
        };

        Ok(PreparedCall {
            chain_id: chains.chain_id_for_name(&self.chain_name),
            to: oracle,
            data: call.encode(),
            value: bounty,
        })
    }

    /// Estimates the gas cost of creating the question.
    ///
    /// # Errors
    ///
    /// See [`TransactionPipeline::estimate`].
    #[instrument(skip(self, params), fields(chain = %self.chain_name))]
    pub async fn estimate_gas(&self, params: &CreateQuestionParams) -> PipelineResult<GasEstimate> {
        self.pipeline.estimate(self.prepare(params)).await
    }

    /// Creates the question and waits for confirmation.
    ///
    /// # Errors
    ///
    /// See [`TransactionPipeline::submit`]. A receipt without a
    /// `LogNewQuestion` event is `PipelineError::ConfirmationFailed`.
    #[instrument(skip(self, params), fields(chain = %self.chain_name))]
    pub async fn create_question(&self, params: &CreateQuestionParams) -> PipelineResult<TransactionOutcome> {
        self.pipeline
            .submit(self.prepare(params), question_created)
            .await
    }
}

fn question_created(receipt: &TransactionReceipt) -> PipelineResult<TransactionOutcome> {
    let question_id = find_new_question_id(&receipt.logs).ok_or_else(|| {
        PipelineError::confirmation_failed("receipt contains no LogNewQuestion event")
    })?;
    Ok(TransactionOutcome::QuestionCreated {
        question_id,
        block_number: receipt.block_number.map(|b| b.as_u64()),
    })
}
