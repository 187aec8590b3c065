use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Canonical lookup key, e.g. `bsc-testnet`.
    pub key: String,
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub explorer_url: String,
    pub identity_registry: Address,
    pub reputation_registry: Address,
    /// `None` where no validation registry has been deployed yet.
    pub validation_registry: Option<Address>,
    pub testnet: bool,
    /// Send legacy (gas price) transactions instead of EIP-1559 ones.
    #[serde(default)]
    pub legacy_tx: bool,
}

impl ChainConfig {
    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), tx_hash)
    }
}

/// Selects a chain either by (case-insensitive) name or by numeric chain ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainSelector {
    Name(String),
    Id(u64),
}

impl Default for ChainSelector {
    fn default() -> Self {
        ChainSelector::Name("bsc-testnet".to_string())
    }
}

impl From<&str> for ChainSelector {
    fn from(name: &str) -> Self {
        ChainSelector::Name(name.to_string())
    }
}

impl From<String> for ChainSelector {
    fn from(name: String) -> Self {
        ChainSelector::Name(name)
    }
}

impl From<u64> for ChainSelector {
    fn from(id: u64) -> Self {
        ChainSelector::Id(id)
    }
}

impl fmt::Display for ChainSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainSelector::Name(name) => write!(f, "{}", name),
            ChainSelector::Id(id) => write!(f, "{}", id),
        }
    }
}
