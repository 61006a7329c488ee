//! # Use Case Integration Tests
//!
//! Scripted wallet and gateway doubles plus end-to-end scenarios for the
//! question creation and arbitration request pipelines.
//!
//! # Test Categories
//!
//! - **CreateQuestion**: chain switching, broadcast, event extraction
//! - **RequestArbitration**: dispute fee loading, foreign chain routing
//! - **Error Handling**: classification of wallet and gateway failures
//! - **Concurrency**: busy rejection, status channel, reset

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::clone_on_ref_ptr)]
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::DateTime;
use ethers::types::{Address, Bytes, H256, Log, TransactionReceipt, U64, U256};
use tokio::sync::Notify;

use crate::application::error::PipelineError;
use crate::application::services::BridgeResolver;
use crate::application::use_cases::create_question::{
    CreateQuestionParams, QuestionCreationPipeline,
};
use crate::application::use_cases::request_arbitration::{
    ArbitrationRequestParams, ArbitrationRequestPipeline,
};
use crate::config::PipelineConfig;
use crate::domain::entities::{
    BridgeRecord, FailureKind, QuestionPhase, QuestionRecord, TransactionOutcome,
};
use crate::domain::value_objects::{
    ChainId, NativeAmount, PipelinePhase, QuestionId, TransactionHash,
};
use crate::infrastructure::blockchain::contracts::{
    AskQuestionCall, encode_get_dispute_fee, encode_request_arbitration, format_question_text,
    log_new_question_topic,
};
use crate::infrastructure::blockchain::{
    BridgeRegistry, ChainRegistry, ContractCall, ContractGateway, GatewayError, GatewayResult,
    WalletError, WalletGateway, WalletResult,
};

// ============================================================================
// Fixtures
// ============================================================================

const ORACLE: &str = "0x79e32aE03fb27B07C89c0c568F80287C01ca2E57";
const HOME_PROXY: &str = "0x29f39dE98D750eb77b5FAfb31B2837f079FcE222";
const FOREIGN_PROXY: &str = "0x2F0895732bfacdCF2FDB19962fF609D8C2f5f7FB";

fn account() -> Address {
    Address::repeat_byte(0xaa)
}

fn question_id() -> QuestionId {
    QuestionId::new(H256::repeat_byte(0x42))
}

fn tx_hash() -> TransactionHash {
    TransactionHash::new(H256::repeat_byte(0x77))
}

fn resolver() -> Arc<BridgeResolver> {
    let bridge = BridgeRecord {
        name: "Gnosis to Ethereum".to_string(),
        home_chain: "Gnosis".to_string(),
        home_proxy: HOME_PROXY.to_string(),
        foreign_chain: "Ethereum".to_string(),
        foreign_proxy: FOREIGN_PROXY.to_string(),
        oracle_address: ORACLE.to_string(),
        appeals: "Yes".to_string(),
        is_testnet: false,
    };
    Arc::new(BridgeResolver::new(
        Arc::new(BridgeRegistry::from_records(vec![bridge])),
        Arc::new(ChainRegistry::with_known_chains()),
    ))
}

fn question() -> QuestionRecord {
    QuestionRecord::new(question_id())
        .with_title("Will it rain tomorrow?")
        .with_chain(ChainRegistry::with_known_chains().descriptor("Gnosis"))
        .with_arbitrator(HOME_PROXY.to_ascii_lowercase())
        .with_phase(QuestionPhase::Open)
}

fn new_question_log(id: QuestionId) -> Log {
    Log {
        topics: vec![
            log_new_question_topic(),
            id.get(),
            H256::from(account()),
            H256::zero(),
        ],
        ..Log::default()
    }
}

fn receipt(status: u64, logs: Vec<Log>) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: tx_hash().get(),
        status: Some(U64::from(status)),
        block_number: Some(U64::from(1_234u64)),
        logs,
        ..TransactionReceipt::default()
    }
}

fn fee_word(wei: u64) -> Bytes {
    let mut word = [0u8; 32];
    U256::from(wei).to_big_endian(&mut word);
    Bytes::from(word.to_vec())
}

fn params() -> CreateQuestionParams {
    CreateQuestionParams::new("Will it rain tomorrow?", "weather", 86_400, "0.01")
        .with_opening_time(DateTime::from_timestamp(1_700_000_000, 0).unwrap())
        .with_nonce(7)
}

// ============================================================================
// Scripted Doubles
// ============================================================================

/// Wallet double with a call log.
#[derive(Debug)]
pub struct ScriptedWallet {
    accounts: Mutex<Vec<Address>>,
    connectable: Mutex<WalletResult<Vec<Address>>>,
    chain: Mutex<ChainId>,
    switch_error: Mutex<Option<WalletError>>,
    ignore_switch: Mutex<bool>,
    switch_gate: Mutex<Option<Arc<Notify>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedWallet {
    pub fn connected(chain: ChainId) -> Self {
        Self {
            accounts: Mutex::new(vec![account()]),
            connectable: Mutex::new(Ok(vec![account()])),
            chain: Mutex::new(chain),
            switch_error: Mutex::new(None),
            ignore_switch: Mutex::new(false),
            switch_gate: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn disconnected(chain: ChainId) -> Self {
        let wallet = Self::connected(chain);
        wallet.accounts.lock().unwrap().clear();
        wallet
    }

    pub fn refuse_connect(&self, err: WalletError) {
        *self.connectable.lock().unwrap() = Err(err);
    }

    pub fn refuse_switch(&self, err: WalletError) {
        *self.switch_error.lock().unwrap() = Some(err);
    }

    pub fn ignore_switch(&self) {
        *self.ignore_switch.lock().unwrap() = true;
    }

    /// Holds every `switch_chain` until `gate` is notified.
    pub fn gate_switch(&self, gate: Arc<Notify>) {
        *self.switch_gate.lock().unwrap() = Some(gate);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl WalletGateway for ScriptedWallet {
    async fn accounts(&self) -> WalletResult<Vec<Address>> {
        self.log("accounts");
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn chain_id(&self) -> WalletResult<ChainId> {
        self.log("chain_id");
        Ok(*self.chain.lock().unwrap())
    }

    async fn request_accounts(&self) -> WalletResult<Vec<Address>> {
        self.log("request_accounts");
        let result = self.connectable.lock().unwrap().clone();
        if let Ok(accounts) = &result {
            *self.accounts.lock().unwrap() = accounts.clone();
        }
        result
    }

    async fn switch_chain(&self, chain_id: ChainId) -> WalletResult<()> {
        self.log(format!("switch_chain:{}", chain_id.as_u64()));
        let gate = self.switch_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(err) = self.switch_error.lock().unwrap().clone() {
            return Err(err);
        }
        if !*self.ignore_switch.lock().unwrap() {
            *self.chain.lock().unwrap() = chain_id;
        }
        Ok(())
    }
}

/// Contract gateway double with a call log.
#[derive(Debug)]
pub struct ScriptedGateway {
    call_result: Mutex<GatewayResult<Bytes>>,
    estimate_result: Mutex<GatewayResult<U256>>,
    gas_price: U256,
    send_result: Mutex<GatewayResult<TransactionHash>>,
    receipt: Mutex<GatewayResult<Option<TransactionReceipt>>>,
    receipt_gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<String>>,
    sent: Mutex<Vec<ContractCall>>,
    reads: Mutex<Vec<ContractCall>>,
}

impl ScriptedGateway {
    pub fn confirming(receipt: TransactionReceipt) -> Self {
        Self {
            call_result: Mutex::new(Ok(fee_word(0))),
            estimate_result: Mutex::new(Ok(U256::from(21_000u64))),
            gas_price: U256::from(2_000_000_000u64),
            send_result: Mutex::new(Ok(tx_hash())),
            receipt: Mutex::new(Ok(Some(receipt))),
            receipt_gate: None,
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            reads: Mutex::new(Vec::new()),
        }
    }

    pub fn gated(receipt: TransactionReceipt, gate: Arc<Notify>) -> Self {
        Self {
            receipt_gate: Some(gate),
            ..Self::confirming(receipt)
        }
    }

    pub fn set_call_result(&self, result: GatewayResult<Bytes>) {
        *self.call_result.lock().unwrap() = result;
    }

    pub fn set_estimate_result(&self, result: GatewayResult<U256>) {
        *self.estimate_result.lock().unwrap() = result;
    }

    pub fn set_send_result(&self, result: GatewayResult<TransactionHash>) {
        *self.send_result.lock().unwrap() = result;
    }

    pub fn set_receipt(&self, result: GatewayResult<Option<TransactionReceipt>>) {
        *self.receipt.lock().unwrap() = result;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<ContractCall> {
        self.sent.lock().unwrap().clone()
    }

    pub fn reads(&self) -> Vec<ContractCall> {
        self.reads.lock().unwrap().clone()
    }

    fn log(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait]
impl ContractGateway for ScriptedGateway {
    async fn call(&self, call: &ContractCall) -> GatewayResult<Bytes> {
        self.log("call");
        self.reads.lock().unwrap().push(call.clone());
        self.call_result.lock().unwrap().clone()
    }

    async fn estimate_gas(&self, _call: &ContractCall) -> GatewayResult<U256> {
        self.log("estimate_gas");
        self.estimate_result.lock().unwrap().clone()
    }

    async fn gas_price(&self) -> GatewayResult<U256> {
        self.log("gas_price");
        Ok(self.gas_price)
    }

    async fn send_transaction(&self, call: &ContractCall) -> GatewayResult<TransactionHash> {
        self.log("send_transaction");
        self.sent.lock().unwrap().push(call.clone());
        self.send_result.lock().unwrap().clone()
    }

    async fn wait_for_receipt(
        &self,
        _hash: TransactionHash,
    ) -> GatewayResult<Option<TransactionReceipt>> {
        self.log("wait_for_receipt");
        if let Some(gate) = &self.receipt_gate {
            gate.notified().await;
        }
        self.receipt.lock().unwrap().clone()
    }
}

fn creation(
    wallet: &Arc<ScriptedWallet>,
    gateway: &Arc<ScriptedGateway>,
) -> QuestionCreationPipeline {
    QuestionCreationPipeline::new(
        "Gnosis",
        resolver(),
        wallet.clone(),
        gateway.clone(),
        PipelineConfig::default(),
    )
}

fn arbitration(
    wallet: &Arc<ScriptedWallet>,
    gateway: &Arc<ScriptedGateway>,
) -> ArbitrationRequestPipeline {
    ArbitrationRequestPipeline::new(Some(question()), resolver(), wallet.clone(), gateway.clone())
}

// ============================================================================
// CreateQuestion Tests
// ============================================================================

mod create_question {
    use super::*;

    #[tokio::test]
    async fn switches_chain_before_submit() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::ETHEREUM));
        let second = QuestionId::new(H256::repeat_byte(0x43));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(
            1,
            vec![new_question_log(question_id()), new_question_log(second)],
        )));
        let pipeline = creation(&wallet, &gateway);

        let outcome = pipeline.create_question(&params()).await.unwrap();

        assert_eq!(
            outcome,
            TransactionOutcome::QuestionCreated {
                question_id: question_id(),
                block_number: Some(1_234),
            }
        );
        assert_eq!(
            wallet.calls(),
            vec!["accounts", "chain_id", "switch_chain:100", "chain_id"]
        );
        assert_eq!(gateway.calls(), vec!["send_transaction", "wait_for_receipt"]);

        let state = pipeline.state();
        assert_eq!(state.phase, PipelinePhase::Succeeded);
        assert_eq!(state.tx_hash, Some(tx_hash()));
        assert_eq!(state.question_id(), Some(question_id()));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn sends_ask_question_with_bounty() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::GNOSIS));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(
            1,
            vec![new_question_log(question_id())],
        )));
        let pipeline = creation(&wallet, &gateway);

        pipeline.create_question(&params()).await.unwrap();

        let expected = AskQuestionCall {
            template_id: 0,
            question: format_question_text("Will it rain tomorrow?", "weather", "en"),
            arbitrator: "0x68154EA682f95BF582b80Dd6453FA401737491Dc".parse().unwrap(),
            timeout: 86_400,
            opening_ts: 1_700_000_000,
            nonce: U256::from(7u64),
        };
        let sent = gateway.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, Some(account()));
        assert_eq!(sent[0].to, ORACLE.parse::<Address>().unwrap());
        assert_eq!(sent[0].value, NativeAmount::parse("0.01").unwrap().wei());
        assert_eq!(sent[0].data, expected.encode());
        assert!(!wallet.calls().iter().any(|c| c.starts_with("switch_chain")));
    }

    #[tokio::test]
    async fn switch_rejection_is_wrong_network() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::ETHEREUM));
        wallet.refuse_switch(WalletError::user_rejected());
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        let pipeline = creation(&wallet, &gateway);

        let err = pipeline.create_question(&params()).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::WrongNetwork);
        assert!(err.is_recoverable());
        assert!(gateway.sent().is_empty());
        let state = pipeline.state();
        assert_eq!(state.phase, PipelinePhase::Failed);
        assert_eq!(state.error.unwrap().kind, FailureKind::WrongNetwork);
        assert!(state.tx_hash.is_none());
    }

    #[tokio::test]
    async fn unchanged_chain_after_switch_is_wrong_network() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::ETHEREUM));
        wallet.ignore_switch();
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        let pipeline = creation(&wallet, &gateway);

        let err = pipeline.create_question(&params()).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::WrongNetwork);
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn requests_accounts_when_disconnected() {
        let wallet = Arc::new(ScriptedWallet::disconnected(ChainId::GNOSIS));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(
            1,
            vec![new_question_log(question_id())],
        )));
        let pipeline = creation(&wallet, &gateway);

        pipeline.create_question(&params()).await.unwrap();

        assert_eq!(wallet.calls()[..2], ["accounts", "request_accounts"]);
    }

    #[tokio::test]
    async fn declined_connection_is_wallet_not_connected() {
        let wallet = Arc::new(ScriptedWallet::disconnected(ChainId::GNOSIS));
        wallet.refuse_connect(WalletError::user_rejected());
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        let pipeline = creation(&wallet, &gateway);

        let err = pipeline.create_question(&params()).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::WalletNotConnected);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_event_is_confirmation_failure() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::GNOSIS));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![Log::default()])));
        let pipeline = creation(&wallet, &gateway);

        let err = pipeline.create_question(&params()).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::ConfirmationFailed);
        let state = pipeline.state();
        assert_eq!(state.phase, PipelinePhase::Failed);
        assert_eq!(state.tx_hash, Some(tx_hash()));
    }

    #[tokio::test]
    async fn missing_receipt_keeps_hash() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::GNOSIS));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        gateway.set_receipt(Ok(None));
        let pipeline = creation(&wallet, &gateway);

        let err = pipeline.create_question(&params()).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::ConfirmationFailed);
        assert_eq!(pipeline.state().tx_hash, Some(tx_hash()));
    }

    #[tokio::test]
    async fn reverted_receipt_is_submission_failure() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::GNOSIS));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(
            0,
            vec![new_question_log(question_id())],
        )));
        let pipeline = creation(&wallet, &gateway);

        let err = pipeline.create_question(&params()).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::SubmissionFailed);
        assert!(err.to_string().contains("reverted"));
    }

    #[tokio::test]
    async fn invalid_input_fails_before_wallet() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::GNOSIS));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        let pipeline = creation(&wallet, &gateway);

        let mut blank = params();
        blank.title = "   ".to_string();
        let err = pipeline.create_question(&blank).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidInput);
        assert_eq!(pipeline.state().phase, PipelinePhase::Failed);

        pipeline.reset();
        let mut bad_bounty = params();
        bad_bounty.bounty = "lots".to_string();
        let err = pipeline.create_question(&bad_bounty).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidInput);

        pipeline.reset();
        let mut no_timeout = params();
        no_timeout.timeout_secs = 0;
        assert!(matches!(
            pipeline.prepare(&no_timeout),
            Err(PipelineError::InvalidInput(_))
        ));

        let before_epoch = params()
            .with_opening_time(DateTime::from_timestamp(-1, 0).unwrap());
        let err = pipeline.prepare(&before_epoch).unwrap_err();
        assert!(err.to_string().contains("invalid timestamp"), "{err}");

        assert!(wallet.calls().is_empty());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_chain_without_oracle_is_missing_contract_data() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::ETHEREUM));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        let pipeline = QuestionCreationPipeline::new(
            "Base",
            resolver(),
            wallet.clone(),
            gateway.clone(),
            PipelineConfig::default(),
        );

        let err = pipeline.create_question(&params()).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::MissingContractData);
        assert!(wallet.calls().is_empty());
    }

    #[test]
    fn random_nonce_stays_below_max() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::GNOSIS));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        let config = PipelineConfig {
            max_nonce: 1,
            ..PipelineConfig::default()
        };
        let pipeline =
            QuestionCreationPipeline::new("Gnosis", resolver(), wallet, gateway, config);

        let mut params = params();
        params.nonce = None;
        let prepared = pipeline.prepare(&params).unwrap();

        let expected = AskQuestionCall {
            template_id: 0,
            question: format_question_text("Will it rain tomorrow?", "weather", "en"),
            arbitrator: "0x68154EA682f95BF582b80Dd6453FA401737491Dc".parse().unwrap(),
            timeout: 86_400,
            opening_ts: 1_700_000_000,
            nonce: U256::zero(),
        };
        assert_eq!(prepared.data, expected.encode());
        assert_eq!(prepared.chain_id, ChainId::GNOSIS);
        assert_eq!(pipeline.required_chain_id(), ChainId::GNOSIS);
    }
}

// ============================================================================
// Gas Estimation Tests
// ============================================================================

mod estimation {
    use super::*;

    #[tokio::test]
    async fn reports_native_cost() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::ETHEREUM));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        let pipeline = creation(&wallet, &gateway);

        let estimate = pipeline.estimate_gas(&params()).await.unwrap();

        assert_eq!(estimate.gas_units, U256::from(21_000u64));
        assert_eq!(estimate.cost.to_decimal_string(), "0.000042");
        let state = pipeline.state();
        assert_eq!(state.phase, PipelinePhase::Idle);
        assert_eq!(state.gas_estimate, Some(estimate));
        assert_eq!(wallet.calls(), vec!["accounts"]);
    }

    #[tokio::test]
    async fn failure_does_not_block_submission() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::GNOSIS));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(
            1,
            vec![new_question_log(question_id())],
        )));
        gateway.set_estimate_result(Err(GatewayError::other(
            "execution reverted: Question must not exist",
        )));
        let pipeline = creation(&wallet, &gateway);

        let err = pipeline.estimate_gas(&params()).await.unwrap_err();
        assert_eq!(err, PipelineError::SimulationFailed("Question must not exist".to_string()));

        let state = pipeline.state();
        assert_eq!(state.phase, PipelinePhase::Idle);
        assert_eq!(state.error.unwrap().kind, FailureKind::SimulationFailed);

        let outcome = pipeline.create_question(&params()).await.unwrap();
        assert_eq!(outcome.question_id(), question_id());
        assert!(pipeline.state().error.is_none());
    }
}

// ============================================================================
// RequestArbitration Tests
// ============================================================================

mod request_arbitration {
    use super::*;

    #[tokio::test]
    async fn missing_fee_fails_without_calls() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::ETHEREUM));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        let pipeline = arbitration(&wallet, &gateway);

        let err = pipeline
            .request_arbitration(&ArbitrationRequestParams::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::MissingContractData);
        assert!(wallet.calls().is_empty());
        assert!(gateway.calls().is_empty());
        assert_eq!(pipeline.state().phase, PipelinePhase::Failed);
    }

    #[tokio::test]
    async fn loads_fee_from_foreign_proxy() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::GNOSIS));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        gateway.set_call_result(Ok(fee_word(50_000_000_000_000_000)));
        let pipeline = arbitration(&wallet, &gateway);

        assert!(!pipeline.has_required_data());
        let fee = pipeline.load_dispute_fee().await.unwrap();

        assert_eq!(fee.to_decimal_string(), "0.05");
        assert_eq!(pipeline.dispute_fee(), Some(fee));
        assert!(pipeline.has_required_data());
        let reads = gateway.reads();
        assert_eq!(reads[0].to, FOREIGN_PROXY.parse::<Address>().unwrap());
        assert_eq!(reads[0].data, encode_get_dispute_fee(question_id()));
        assert!(wallet.calls().is_empty());
    }

    #[tokio::test]
    async fn fee_load_failure_is_a_warning() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::GNOSIS));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        gateway.set_call_result(Err(GatewayError::other("connection refused")));
        let pipeline = arbitration(&wallet, &gateway);

        let err = pipeline.load_dispute_fee().await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::MissingContractData);
        let state = pipeline.state();
        assert_eq!(state.phase, PipelinePhase::Idle);
        assert_eq!(state.error.unwrap().kind, FailureKind::MissingContractData);
        assert!(!pipeline.has_required_data());
    }

    #[tokio::test]
    async fn requests_on_foreign_chain_with_fee() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::GNOSIS));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        gateway.set_call_result(Ok(fee_word(50_000_000_000_000_000)));
        let pipeline = arbitration(&wallet, &gateway);
        let fee = pipeline.load_dispute_fee().await.unwrap();

        let params = ArbitrationRequestParams::new().with_max_previous("0.5");
        let outcome = pipeline.request_arbitration(&params).await.unwrap();

        assert_eq!(
            outcome,
            TransactionOutcome::ArbitrationRequested {
                question_id: question_id(),
                block_number: Some(1_234),
            }
        );
        assert!(wallet.calls().contains(&"switch_chain:1".to_string()));
        let sent = gateway.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, FOREIGN_PROXY.parse::<Address>().unwrap());
        assert_eq!(sent[0].value, fee.wei());
        assert_eq!(
            sent[0].data,
            encode_request_arbitration(question_id(), NativeAmount::parse("0.5").unwrap())
        );
        assert_eq!(pipeline.state().phase, PipelinePhase::Succeeded);
    }

    #[tokio::test]
    async fn absent_max_previous_is_zero() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::ETHEREUM));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        gateway.set_call_result(Ok(fee_word(1)));
        let pipeline = arbitration(&wallet, &gateway);
        pipeline.load_dispute_fee().await.unwrap();

        let prepared = pipeline.prepare(&ArbitrationRequestParams::new()).unwrap();

        assert_eq!(prepared.chain_id, ChainId::ETHEREUM);
        assert_eq!(
            prepared.data,
            encode_request_arbitration(question_id(), NativeAmount::from_wei(U256::zero()))
        );
    }

    #[tokio::test]
    async fn invalid_max_previous_is_invalid_input() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::ETHEREUM));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        gateway.set_call_result(Ok(fee_word(1)));
        let pipeline = arbitration(&wallet, &gateway);
        pipeline.load_dispute_fee().await.unwrap();

        let err = pipeline
            .prepare(&ArbitrationRequestParams::new().with_max_previous("-1"))
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::InvalidInput);
    }

    #[tokio::test]
    async fn replacing_question_discards_fee() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::ETHEREUM));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        gateway.set_call_result(Ok(fee_word(1)));
        let pipeline = arbitration(&wallet, &gateway);
        pipeline.load_dispute_fee().await.unwrap();

        pipeline.set_question(Some(question().with_arbitrator("0x0000000000000000000000000000000000000001")));

        assert!(pipeline.dispute_fee().is_none());
        assert!(pipeline.foreign_proxy_info().is_none());
        assert!(!pipeline.has_required_data());
        let err = pipeline.load_dispute_fee().await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::MissingContractData);
    }

    #[tokio::test]
    async fn reset_discards_fee() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::ETHEREUM));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        gateway.set_call_result(Ok(fee_word(1)));
        let pipeline = arbitration(&wallet, &gateway);
        pipeline.load_dispute_fee().await.unwrap();

        pipeline.reset();

        assert!(pipeline.dispute_fee().is_none());
        assert_eq!(pipeline.state().phase, PipelinePhase::Idle);
    }

    #[test]
    fn eligibility_follows_question() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::ETHEREUM));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        let pipeline = arbitration(&wallet, &gateway);

        assert!(pipeline.can_request());
        assert!(!pipeline.is_requested());

        pipeline.set_question(Some(question().with_arbitration_requested_by("0xabc")));
        assert!(pipeline.is_requested());
        assert!(!pipeline.can_request());

        pipeline.set_question(None);
        assert!(!pipeline.can_request());
        assert!(!pipeline.is_requested());
        assert!(pipeline.foreign_proxy_info().is_none());
    }

    #[test]
    fn foreign_proxy_info_tracks_question() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::ETHEREUM));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        let pipeline = arbitration(&wallet, &gateway);

        let info = pipeline.foreign_proxy_info().unwrap();
        assert_eq!(info.foreign_proxy_address, FOREIGN_PROXY);
        assert_eq!(info.foreign_chain_id, ChainId::ETHEREUM);
        assert_eq!(info.home_chain_id, ChainId::GNOSIS);
        assert_eq!(info.bridge_name, "Gnosis to Ethereum");
    }
}

// ============================================================================
// Error Handling Tests
// ============================================================================

mod error_handling {
    use super::*;

    #[tokio::test]
    async fn rejected_signature_is_user_rejected() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::GNOSIS));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        gateway.set_send_result(Err(GatewayError::new(
            Some(4001),
            "MetaMask Tx Signature: User denied transaction signature.",
        )));
        let pipeline = creation(&wallet, &gateway);

        let err = pipeline.create_question(&params()).await.unwrap_err();

        assert_eq!(err, PipelineError::UserRejected);
        let state = pipeline.state();
        assert_eq!(state.phase, PipelinePhase::Failed);
        assert!(state.tx_hash.is_none());
        assert_eq!(state.error_message(), Some("transaction rejected by the user"));
    }

    #[tokio::test]
    async fn insufficient_funds() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::GNOSIS));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        gateway.set_send_result(Err(GatewayError::other(
            "insufficient funds for gas * price + value",
        )));
        let pipeline = creation(&wallet, &gateway);

        let err = pipeline.create_question(&params()).await.unwrap_err();

        assert_eq!(err, PipelineError::InsufficientFunds);
    }

    #[tokio::test]
    async fn mined_revert_is_submission_failure_with_hash() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::GNOSIS));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(
            0,
            vec![new_question_log(question_id())],
        )));
        let pipeline = creation(&wallet, &gateway);

        let err = pipeline.create_question(&params()).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::SubmissionFailed);
        let state = pipeline.state();
        assert_eq!(state.phase, PipelinePhase::Failed);
        assert_eq!(state.tx_hash, Some(tx_hash()));
        assert!(state.outcome.is_none());
    }

    #[tokio::test]
    async fn revert_reason_is_surfaced() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::GNOSIS));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(1, vec![])));
        gateway.set_send_result(Err(GatewayError::other(
            "execution reverted: Bounty must be positive",
        )));
        let pipeline = creation(&wallet, &gateway);

        let err = pipeline.create_question(&params()).await.unwrap_err();

        assert_eq!(err.to_string(), "transaction failed: Bounty must be positive");
        assert_eq!(
            pipeline.state().error_message(),
            Some("transaction failed: Bounty must be positive")
        );
    }
}

// ============================================================================
// Concurrency Tests
// ============================================================================

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn terminal_state_rejects_new_attempt() {
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::GNOSIS));
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(
            1,
            vec![new_question_log(question_id())],
        )));
        let pipeline = creation(&wallet, &gateway);
        pipeline.create_question(&params()).await.unwrap();
        let before = pipeline.state();

        let err = pipeline.create_question(&params()).await.unwrap_err();

        assert_eq!(err, PipelineError::Busy(PipelinePhase::Succeeded));
        assert_eq!(pipeline.state(), before);
        assert_eq!(gateway.sent().len(), 1);

        pipeline.reset();
        pipeline.create_question(&params()).await.unwrap();
        assert_eq!(gateway.sent().len(), 2);
    }

    #[tokio::test]
    async fn pending_chain_switch_rejects_second_attempt() {
        let gate = Arc::new(Notify::new());
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::ETHEREUM));
        wallet.gate_switch(gate.clone());
        let gateway = Arc::new(ScriptedGateway::confirming(receipt(
            1,
            vec![new_question_log(question_id())],
        )));
        let pipeline = Arc::new(creation(&wallet, &gateway));

        let task = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.create_question(&params()).await })
        };
        while !wallet.calls().iter().any(|call| call.starts_with("switch_chain")) {
            tokio::task::yield_now().await;
        }

        assert!(pipeline.pipeline().is_in_flight());
        let before = pipeline.state();
        assert_eq!(before.phase, PipelinePhase::Idle);
        let wallet_calls = wallet.calls();

        let err = pipeline.create_question(&params()).await.unwrap_err();
        assert_eq!(err, PipelineError::Busy(PipelinePhase::Idle));
        let err = pipeline.estimate_gas(&params()).await.unwrap_err();
        assert_eq!(err, PipelineError::Busy(PipelinePhase::Idle));

        assert_eq!(pipeline.state(), before);
        assert_eq!(wallet.calls(), wallet_calls);
        assert!(gateway.calls().is_empty());

        gate.notify_one();
        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome.question_id(), question_id());
        assert_eq!(gateway.sent().len(), 1);
        assert_eq!(
            wallet.calls().iter().filter(|call| call.starts_with("switch_chain")).count(),
            1
        );
    }

    #[tokio::test]
    async fn hash_is_visible_while_confirming() {
        let gate = Arc::new(Notify::new());
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::GNOSIS));
        let gateway = Arc::new(ScriptedGateway::gated(
            receipt(1, vec![new_question_log(question_id())]),
            gate.clone(),
        ));
        let pipeline = Arc::new(creation(&wallet, &gateway));
        let mut status = pipeline.subscribe();

        let task = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.create_question(&params()).await })
        };

        let confirming = status
            .wait_for(|state| state.phase == PipelinePhase::Confirming)
            .await
            .unwrap()
            .clone();
        assert_eq!(confirming.tx_hash, Some(tx_hash()));
        assert!(confirming.is_confirming());

        let err = pipeline.create_question(&params()).await.unwrap_err();
        assert_eq!(err, PipelineError::Busy(PipelinePhase::Confirming));

        gate.notify_one();
        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome.question_id(), question_id());
        assert!(status.borrow_and_update().is_success());
    }

    #[tokio::test]
    async fn reset_discards_in_flight_attempt() {
        let gate = Arc::new(Notify::new());
        let wallet = Arc::new(ScriptedWallet::connected(ChainId::GNOSIS));
        let gateway = Arc::new(ScriptedGateway::gated(
            receipt(1, vec![new_question_log(question_id())]),
            gate.clone(),
        ));
        let pipeline = Arc::new(creation(&wallet, &gateway));
        let mut status = pipeline.subscribe();

        let task = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.create_question(&params()).await })
        };
        status
            .wait_for(|state| state.phase == PipelinePhase::Confirming)
            .await
            .unwrap();

        pipeline.reset();
        assert_eq!(pipeline.state().phase, PipelinePhase::Idle);
        assert!(!pipeline.pipeline().is_in_flight());

        gate.notify_one();
        let err = task.await.unwrap().unwrap_err();
        assert_eq!(err, PipelineError::Cancelled);

        let state = pipeline.state();
        assert_eq!(state.phase, PipelinePhase::Idle);
        assert!(state.outcome.is_none());
        assert!(state.tx_hash.is_none());
    }
}
