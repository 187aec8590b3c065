use crate::services::connection::SignerClient;
use ethers::{
    contract::ContractError,
    providers::{Http, Provider, ProviderError},
    types::H256,
};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Erc8004Error {
    #[error("Unknown chain: {0}")]
    UnknownChain(String),

    #[error("Keystore file not found: {}", .0.display())]
    KeystoreNotFound(PathBuf),

    #[error("Malformed keystore: {0}")]
    MalformedKeystore(String),

    // One message for every decryption failure so callers cannot tell a wrong
    // password from a corrupted file.
    #[error("Failed to decrypt keystore: wrong password or malformed file")]
    DecryptionFailed,

    #[error("Failed to write keystore: {0}")]
    KeystoreWrite(String),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("No signing account configured. Initialize the client with a private key or use from_keystore()")]
    NoSigner,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{registry} registry is not deployed on {chain}")]
    NotDeployed { registry: &'static str, chain: String },

    #[error("Unsupported agent URI: {0}")]
    UnsupportedUri(String),

    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("Transaction {0:?} was dropped from the mempool")]
    TransactionDropped(H256),

    #[error("Transaction {0:?} reverted")]
    TransactionReverted(H256),

    #[error("Event {event} not found in receipt of {tx_hash:?}")]
    MissingEvent { event: &'static str, tx_hash: H256 },

    #[error("RPC error: {0}")]
    Rpc(#[from] ProviderError),

    #[error("Contract error: {0}")]
    Contract(#[from] ContractError<Provider<Http>>),

    #[error("Contract error: {0}")]
    SignerContract(#[from] ContractError<SignerClient>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Erc8004Error>;
