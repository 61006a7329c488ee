//! # Contract Gateway
//!
//! Port for contract reads, gas estimation and transaction broadcast.
//!
//! The pipelines talk to contracts through [`ContractGateway`] so that they
//! can be driven by a scripted gateway in tests. [`EthersContractGateway`]
//! implements the port with an ethers-rs HTTP provider; transactions are
//! sent with `eth_sendTransaction`, so the endpoint (the wallet) signs.
//!
//! # Examples
//!
//! ```ignore
//! use oracle_arbitration::infrastructure::blockchain::gateway::EthersContractGateway;
//!
//! let gateway = EthersContractGateway::new("http://localhost:8545", 1)?;
//! let price = gateway.gas_price().await?;
//! ```

use crate::domain::value_objects::TransactionHash;
use crate::infrastructure::blockchain::wallet::USER_REJECTED_CODE;
use async_trait::async_trait;
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A contract call as sent to the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    /// Sender; `None` for anonymous reads.
    pub from: Option<Address>,
    /// Target contract.
    pub to: Address,
    /// Encoded calldata.
    pub data: Bytes,
    /// Native value attached.
    pub value: U256,
}

impl ContractCall {
    /// Creates a read-only call without value.
    #[must_use]
    pub fn read(to: Address, data: Bytes) -> Self {
        Self {
            from: None,
            to,
            data,
            value: U256::zero(),
        }
    }

    /// Sets the sender.
    #[must_use]
    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Sets the attached value.
    #[must_use]
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    fn to_request(&self) -> TypedTransaction {
        let mut tx = TransactionRequest::new()
            .to(self.to)
            .data(self.data.clone())
            .value(self.value);
        if let Some(from) = self.from {
            tx = tx.from(from);
        }
        tx.into()
    }
}

/// Error returned by a gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GatewayError {
    /// JSON-RPC error code, when available.
    pub code: Option<i64>,
    /// Provider message.
    pub message: String,
    /// Revert reason extracted from the message, when available.
    pub reason: Option<String>,
}

impl GatewayError {
    /// Creates an error from a message, extracting any revert reason.
    #[must_use]
    pub fn new(code: Option<i64>, message: impl Into<String>) -> Self {
        let message = message.into();
        let reason = revert_reason(&message);
        Self {
            code,
            message,
            reason,
        }
    }

    /// Creates an error without a code.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    /// Returns true if the user declined signing.
    #[must_use]
    pub fn is_user_rejected(&self) -> bool {
        let lower = self.message.to_ascii_lowercase();
        self.code == Some(USER_REJECTED_CODE)
            || lower.contains("action_rejected")
            || lower.contains("user rejected")
            || lower.contains("user denied")
    }

    /// Returns true if the account cannot pay value plus gas.
    #[must_use]
    pub fn is_insufficient_funds(&self) -> bool {
        let lower = self.message.to_ascii_lowercase();
        lower.contains("insufficient funds") || lower.contains("insufficient_funds")
    }
}

impl From<ProviderError> for GatewayError {
    fn from(err: ProviderError) -> Self {
        match RpcError::as_error_response(&err) {
            Some(response) => Self::new(Some(response.code), response.message.clone()),
            None => Self::other(err.to_string()),
        }
    }
}

fn revert_reason(message: &str) -> Option<String> {
    const MARKER: &str = "execution reverted:";
    let start = message.find(MARKER)? + MARKER.len();
    let reason = message[start..].trim();
    (!reason.is_empty()).then(|| reason.to_string())
}

/// Result type for gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Contract access as seen by the pipelines.
#[async_trait]
pub trait ContractGateway: Send + Sync + fmt::Debug {
    /// Executes a read-only call.
    async fn call(&self, call: &ContractCall) -> GatewayResult<Bytes>;

    /// Simulates `call` and returns the gas it would use.
    async fn estimate_gas(&self, call: &ContractCall) -> GatewayResult<U256>;

    /// Returns the current network gas price.
    async fn gas_price(&self) -> GatewayResult<U256>;

    /// Broadcasts `call` as a transaction and returns its hash.
    async fn send_transaction(&self, call: &ContractCall) -> GatewayResult<TransactionHash>;

    /// Waits for the receipt of `hash`. `None` means the transaction was
    /// dropped.
    async fn wait_for_receipt(&self, hash: TransactionHash) -> GatewayResult<Option<TransactionReceipt>>;
}

/// HTTP provider type alias.
pub type HttpProvider = Provider<Http>;

/// Contract gateway over an ethers-rs HTTP provider.
#[derive(Clone)]
pub struct EthersContractGateway {
    provider: Arc<HttpProvider>,
    rpc_url: String,
    confirmations: usize,
}

impl EthersContractGateway {
    /// Creates a gateway for `rpc_url`.
    ///
    /// # Errors
    ///
    /// Returns a `GatewayError` if the URL is not valid.
    pub fn new(rpc_url: impl Into<String>, confirmations: usize) -> GatewayResult<Self> {
        let rpc_url = rpc_url.into();
        let provider = Provider::<Http>::try_from(rpc_url.as_str())
            .map_err(|e| GatewayError::other(format!("Failed to create provider: {}", e)))?
            .interval(Duration::from_millis(100));

        Ok(Self {
            provider: Arc::new(provider),
            rpc_url,
            confirmations,
        })
    }

    /// Creates a gateway sharing an existing provider, typically the one
    /// behind the wallet.
    #[must_use]
    pub fn from_provider(provider: Arc<HttpProvider>, confirmations: usize) -> Self {
        let rpc_url = provider.url().to_string();
        Self {
            provider,
            rpc_url,
            confirmations,
        }
    }

    /// Returns the RPC URL.
    #[inline]
    #[must_use]
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Returns the confirmations waited for.
    #[inline]
    #[must_use]
    pub fn confirmations(&self) -> usize {
        self.confirmations
    }
}

impl fmt::Debug for EthersContractGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EthersContractGateway")
            .field("rpc_url", &self.rpc_url)
            .field("confirmations", &self.confirmations)
            .finish()
    }
}

#[async_trait]
impl ContractGateway for EthersContractGateway {
    async fn call(&self, call: &ContractCall) -> GatewayResult<Bytes> {
        Ok(self.provider.call(&call.to_request(), None).await?)
    }

    async fn estimate_gas(&self, call: &ContractCall) -> GatewayResult<U256> {
        Ok(self.provider.estimate_gas(&call.to_request(), None).await?)
    }

    async fn gas_price(&self) -> GatewayResult<U256> {
        Ok(self.provider.get_gas_price().await?)
    }

    async fn send_transaction(&self, call: &ContractCall) -> GatewayResult<TransactionHash> {
        let pending = self.provider.send_transaction(call.to_request(), None).await?;
        Ok(TransactionHash::new(pending.tx_hash()))
    }

    async fn wait_for_receipt(&self, hash: TransactionHash) -> GatewayResult<Option<TransactionReceipt>> {
        let receipt = PendingTransaction::new(hash.get(), self.provider.as_ref())
            .confirmations(self.confirmations)
            .await?;
        Ok(receipt)
    }
}
