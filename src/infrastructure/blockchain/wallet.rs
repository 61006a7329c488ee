//! # Wallet Gateway
//!
//! Port for the user's wallet: connected accounts, current chain, account
//! access requests and chain switches.
//!
//! The pipelines only consume [`WalletGateway`]; every call may fail, and a
//! decline by the user is distinguishable through [`USER_REJECTED_CODE`].
//! [`JsonRpcWallet`] implements the port over the EIP-1193 JSON-RPC methods
//! of a wallet-backed endpoint.

use crate::domain::value_objects::ChainId;
use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::types::Address;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// JSON-RPC error code a wallet returns when the user declines a prompt.
pub const USER_REJECTED_CODE: i64 = 4001;

/// JSON-RPC error code returned when the requested chain is unknown to the
/// wallet.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

/// Error returned by a wallet call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct WalletError {
    /// JSON-RPC error code, when the wallet supplied one.
    pub code: Option<i64>,
    /// Wallet-provided message.
    pub message: String,
}

impl WalletError {
    /// Creates an error with a code.
    #[must_use]
    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    /// Creates an error without a code.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Creates the error a wallet returns when the user declines.
    #[must_use]
    pub fn user_rejected() -> Self {
        Self::with_code(USER_REJECTED_CODE, "User rejected the request.")
    }

    /// Returns true if the user declined the request.
    #[inline]
    #[must_use]
    pub fn is_user_rejected(&self) -> bool {
        self.code == Some(USER_REJECTED_CODE)
    }
}

impl From<ProviderError> for WalletError {
    fn from(err: ProviderError) -> Self {
        match err.as_error_response() {
            Some(response) => Self::with_code(response.code, response.message.clone()),
            None => Self::other(err.to_string()),
        }
    }
}

/// Result type for wallet calls.
pub type WalletResult<T> = Result<T, WalletError>;

/// The wallet as seen by the pipelines.
#[async_trait]
pub trait WalletGateway: Send + Sync + fmt::Debug {
    /// Returns the accounts already connected, without prompting.
    async fn accounts(&self) -> WalletResult<Vec<Address>>;

    /// Returns the chain the wallet is currently on.
    async fn chain_id(&self) -> WalletResult<ChainId>;

    /// Asks the user to connect accounts. May be declined.
    async fn request_accounts(&self) -> WalletResult<Vec<Address>>;

    /// Asks the wallet to switch to `chain_id`. May be declined.
    async fn switch_chain(&self, chain_id: ChainId) -> WalletResult<()>;
}

/// Wallet gateway over a JSON-RPC endpoint exposing the wallet methods.
#[derive(Clone)]
pub struct JsonRpcWallet {
    provider: Arc<Provider<Http>>,
    rpc_url: String,
}

impl JsonRpcWallet {
    /// Connects to the wallet endpoint at `rpc_url`.
    ///
    /// # Errors
    ///
    /// Returns a `WalletError` if the URL is not valid.
    pub fn new(rpc_url: impl Into<String>) -> WalletResult<Self> {
        let rpc_url = rpc_url.into();
        let provider = Provider::<Http>::try_from(rpc_url.as_str())
            .map_err(|e| WalletError::other(format!("Failed to create provider: {}", e)))?
            .interval(Duration::from_millis(100));

        Ok(Self {
            provider: Arc::new(provider),
            rpc_url,
        })
    }

    /// Wraps an existing provider.
    #[must_use]
    pub fn from_provider(provider: Arc<Provider<Http>>) -> Self {
        let rpc_url = provider.url().to_string();
        Self { provider, rpc_url }
    }

    /// Returns the provider.
    #[inline]
    #[must_use]
    pub fn provider(&self) -> Arc<Provider<Http>> {
        Arc::clone(&self.provider)
    }

    /// Returns the endpoint URL.
    #[inline]
    #[must_use]
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }
}

impl fmt::Debug for JsonRpcWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonRpcWallet")
            .field("rpc_url", &self.rpc_url)
            .finish()
    }
}

#[async_trait]
impl WalletGateway for JsonRpcWallet {
    async fn accounts(&self) -> WalletResult<Vec<Address>> {
        Ok(self.provider.get_accounts().await?)
    }

    async fn chain_id(&self) -> WalletResult<ChainId> {
        let raw: String = self.provider.request("eth_chainId", ()).await?;
        raw.parse()
            .map_err(|_| WalletError::other(format!("wallet returned invalid chain id: {raw}")))
    }

    async fn request_accounts(&self) -> WalletResult<Vec<Address>> {
        Ok(self.provider.request("eth_requestAccounts", ()).await?)
    }

    async fn switch_chain(&self, chain_id: ChainId) -> WalletResult<()> {
        let params = [json!({ "chainId": chain_id.to_hex() })];
        let _: serde_json::Value = self
            .provider
            .request("wallet_switchEthereumChain", params)
            .await?;
        Ok(())
    }
}
