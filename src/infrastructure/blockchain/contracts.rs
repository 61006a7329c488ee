//! # Contract ABI
//!
//! Calldata encoding and log decoding for the oracle contract and the
//! foreign-chain arbitration proxy.
//!
//! Only the handful of functions the pipelines call are encoded, by hand,
//! with `ethers::abi`:
//!
//! | Contract | Function |
//! |----------|----------|
//! | Oracle | `askQuestion(uint256,string,address,uint32,uint32,uint256)` payable |
//! | Arbitration proxy | `getDisputeFee(bytes32)` view |
//! | Arbitration proxy | `requestArbitration(bytes32,uint256)` payable |
//!
//! The oracle announces new questions with `LogNewQuestion`, whose first
//! indexed topic is the question id.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{NativeAmount, QuestionId};
use ethers::abi::{self, Token};
use ethers::types::{Address, Bytes, H256, Log, U256};
use ethers::utils::{id, keccak256};

/// Separator between the fields of a question text (U+001F, not the
/// visible U+241F glyph).
pub const QUESTION_FIELD_SEPARATOR: char = '\u{1f}';

/// `askQuestion` signature.
pub const ASK_QUESTION_SIGNATURE: &str = "askQuestion(uint256,string,address,uint32,uint32,uint256)";

/// `getDisputeFee` signature.
pub const GET_DISPUTE_FEE_SIGNATURE: &str = "getDisputeFee(bytes32)";

/// `requestArbitration` signature.
pub const REQUEST_ARBITRATION_SIGNATURE: &str = "requestArbitration(bytes32,uint256)";

/// `LogNewQuestion` event signature.
pub const LOG_NEW_QUESTION_SIGNATURE: &str =
    "LogNewQuestion(bytes32,address,uint256,string,bytes32,address,uint32,uint32,uint256,uint256)";

fn with_selector(signature: &str, tokens: &[Token]) -> Bytes {
    let mut calldata = id(signature).to_vec();
    calldata.extend_from_slice(&abi::encode(tokens));
    Bytes::from(calldata)
}

/// Composes the question text: `title ␟ category ␟ language`.
#[must_use]
pub fn format_question_text(title: &str, category: &str, language: &str) -> String {
    let sep = QUESTION_FIELD_SEPARATOR;
    format!("{title}{sep}{category}{sep}{language}")
}

/// Parses an account or contract address.
///
/// # Errors
///
/// Returns `DomainError::InvalidAddress` if `value` is not a 20-byte hex
/// address.
pub fn parse_address(value: &str) -> DomainResult<Address> {
    value
        .trim()
        .parse()
        .map_err(|_| DomainError::InvalidAddress(value.to_string()))
}

/// Arguments of `askQuestion`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskQuestionCall {
    /// Template id (0 for plain questions).
    pub template_id: u64,
    /// Question text as composed by [`format_question_text`].
    pub question: String,
    /// Arbitrator address.
    pub arbitrator: Address,
    /// Answer timeout in seconds.
    pub timeout: u32,
    /// Opening timestamp in seconds since the epoch.
    pub opening_ts: u32,
    /// Caller nonce.
    pub nonce: U256,
}

impl AskQuestionCall {
    /// Encodes the calldata.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        with_selector(
            ASK_QUESTION_SIGNATURE,
            &[
                Token::Uint(U256::from(self.template_id)),
                Token::String(self.question.clone()),
                Token::Address(self.arbitrator),
                Token::Uint(U256::from(self.timeout)),
                Token::Uint(U256::from(self.opening_ts)),
                Token::Uint(self.nonce),
            ],
        )
    }
}

/// Encodes `getDisputeFee(question_id)`.
#[must_use]
pub fn encode_get_dispute_fee(question_id: QuestionId) -> Bytes {
    with_selector(
        GET_DISPUTE_FEE_SIGNATURE,
        &[Token::FixedBytes(question_id.as_bytes().to_vec())],
    )
}

/// Decodes the `uint256` returned by `getDisputeFee`.
///
/// # Errors
///
/// Returns `DomainError::InvalidAmount` if the return data is shorter than
/// one word.
pub fn decode_dispute_fee(data: &[u8]) -> DomainResult<NativeAmount> {
    let word = data.get(..32).ok_or_else(|| {
        DomainError::InvalidAmount(format!("dispute fee response too short: {} bytes", data.len()))
    })?;
    Ok(NativeAmount::from_wei(U256::from_big_endian(word)))
}

/// Encodes `requestArbitration(question_id, max_previous)`.
#[must_use]
pub fn encode_request_arbitration(question_id: QuestionId, max_previous: NativeAmount) -> Bytes {
    with_selector(
        REQUEST_ARBITRATION_SIGNATURE,
        &[
            Token::FixedBytes(question_id.as_bytes().to_vec()),
            Token::Uint(max_previous.wei()),
        ],
    )
}

/// Returns `topic0` of `LogNewQuestion`.
#[must_use]
pub fn log_new_question_topic() -> H256 {
    H256::from(keccak256(LOG_NEW_QUESTION_SIGNATURE))
}

/// Returns the question id of the first `LogNewQuestion` entry in `logs`.
///
/// Later matches are ignored.
#[must_use]
pub fn find_new_question_id(logs: &[Log]) -> Option<QuestionId> {
    let topic = log_new_question_topic();
    logs.iter()
        .find(|log| log.topics.first() == Some(&topic) && log.topics.len() > 1)
        .map(|log| QuestionId::new(log.topics[1]))
}
