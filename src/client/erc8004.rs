use crate::contracts::{IdentityRegistry, ReputationRegistry, ValidationRegistry};
use crate::error::{Erc8004Error, Result};
use crate::models::{
    AgentMetadata, ChainConfig, ChainSelector, MetadataEntry, RegisterOptions, RegisteredAgent,
};
use crate::services::chains::get_chain;
use crate::services::connection::{parse_private_key, wallet_from_bytes, Connection};
use crate::services::keystore::decrypt_keystore;
use ethers::{
    providers::{Http, Provider},
    signers::LocalWallet,
    types::{Address, U256},
};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Construction-time settings for [`Erc8004Client`].
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub chain: ChainSelector,
    pub private_key: Option<String>,
    /// Overrides the chain's default RPC URL.
    pub rpc_url: Option<String>,
    /// Used as-is instead of resolving `chain`.
    pub chain_config: Option<ChainConfig>,
}

impl ClientOptions {
    pub fn new(chain: impl Into<ChainSelector>) -> Self {
        Self {
            chain: chain.into(),
            ..Default::default()
        }
    }

    pub fn with_private_key(mut self, private_key: impl Into<String>) -> Self {
        self.private_key = Some(private_key.into());
        self
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = Some(rpc_url.into());
        self
    }

    pub fn with_chain_config(mut self, chain_config: ChainConfig) -> Self {
        self.chain_config = Some(chain_config);
        self
    }

    fn resolve_chain(self) -> Result<ChainConfig> {
        let chain = match self.chain_config {
            Some(config) => config,
            None => get_chain(self.chain)?,
        };
        Ok(match self.rpc_url {
            Some(url) => chain.with_rpc_url(url),
            None => chain,
        })
    }
}

/// High-level client for the ERC-8004 registries.
///
/// Authenticate with a raw key (`from_private_key`) or, preferably, an
/// encrypted keystore (`from_keystore`). Without either the client is
/// read-only and every state-changing call fails with `NoSigner`.
pub struct Erc8004Client {
    conn: Connection,
    identity: IdentityRegistry,
    reputation: OnceLock<ReputationRegistry>,
    validation: OnceLock<ValidationRegistry>,
}

impl Erc8004Client {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let wallet = options
            .private_key
            .as_deref()
            .map(parse_private_key)
            .transpose()?;
        Self::with_wallet(options, wallet)
    }

    pub fn from_private_key(private_key: &str, options: ClientOptions) -> Result<Self> {
        let wallet = parse_private_key(private_key)?;
        Self::with_wallet(options, Some(wallet))
    }

    /// Decrypt a keystore file and use its key as the signing account.
    pub fn from_keystore(
        keystore_path: impl AsRef<Path>,
        password: &str,
        options: ClientOptions,
    ) -> Result<Self> {
        let secret = decrypt_keystore(keystore_path, password)?;
        let wallet = wallet_from_bytes(&secret)?;
        Self::with_wallet(options, Some(wallet))
    }

    fn with_wallet(options: ClientOptions, wallet: Option<LocalWallet>) -> Result<Self> {
        let chain = options.resolve_chain()?;
        tracing::debug!(chain = %chain.key, rpc_url = %chain.rpc_url, "Creating ERC-8004 client");

        let conn = Connection::new(chain, wallet)?;
        Ok(Self {
            identity: IdentityRegistry::new(conn.clone()),
            conn,
            reputation: OnceLock::new(),
            validation: OnceLock::new(),
        })
    }

    pub fn chain(&self) -> &ChainConfig {
        self.conn.chain()
    }

    /// Default sender address, `None` for a read-only client.
    pub fn address(&self) -> Option<Address> {
        self.conn.address()
    }

    pub fn provider(&self) -> Arc<Provider<Http>> {
        self.conn.provider()
    }

    pub(crate) fn wallet(&self) -> Option<&LocalWallet> {
        self.conn.wallet()
    }

    pub fn identity(&self) -> &IdentityRegistry {
        &self.identity
    }

    pub fn reputation(&self) -> &ReputationRegistry {
        self.reputation
            .get_or_init(|| ReputationRegistry::new(self.conn.clone()))
    }

    pub fn validation(&self) -> &ValidationRegistry {
        self.validation
            .get_or_init(|| ValidationRegistry::new(self.conn.clone()))
    }

    /// Register an agent and return its newly minted ID.
    pub async fn register(
        &self,
        name: &str,
        description: &str,
        options: RegisterOptions,
    ) -> Result<U256> {
        let (metadata, entries) = build_registration(name, description, options)?;
        let agent = self.identity.register_with_metadata(&metadata, &entries).await?;
        Ok(agent.agent_id)
    }

    pub async fn register_full(
        &self,
        metadata: &AgentMetadata,
        metadata_entries: &[MetadataEntry],
    ) -> Result<RegisteredAgent> {
        self.identity.register_with_metadata(metadata, metadata_entries).await
    }

    pub async fn get_agent(&self, agent_id: impl Into<U256>) -> Result<RegisteredAgent> {
        self.identity.get_agent(agent_id.into()).await
    }

    pub async fn get_version(&self) -> Result<String> {
        self.identity.get_version().await
    }

    /// Best-effort reachability probe. Never errors.
    pub async fn is_connected(&self) -> bool {
        match self.conn.remote_chain_id().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(
                    rpc_url = %self.chain().rpc_url,
                    error = %e,
                    "RPC connectivity probe failed"
                );
                false
            }
        }
    }

    /// Check that the endpoint serves the chain this client was built for.
    pub async fn verify_chain(&self) -> Result<()> {
        let actual = self.conn.remote_chain_id().await?;
        let expected = self.chain().chain_id;
        if actual != expected {
            return Err(Erc8004Error::ChainMismatch { expected, actual });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Erc8004Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Erc8004Client")
            .field("chain", &self.chain().key)
            .field("chain_id", &self.chain().chain_id)
            .field("address", &self.address())
            .finish()
    }
}

// Set from register()'s own arguments; an extra field may not shadow them.
const RESERVED_FIELDS: [&str; 4] = ["name", "description", "image", "services"];

/// Assemble the metadata document for `register`.
pub fn build_registration(
    name: &str,
    description: &str,
    options: RegisterOptions,
) -> Result<(AgentMetadata, Vec<MetadataEntry>)> {
    let services = options
        .services
        .into_iter()
        .map(|s| s.into_service())
        .collect::<Result<Vec<_>>>()?;

    let mut document = options.extra;
    if let Some(key) = RESERVED_FIELDS.iter().find(|k| document.contains_key(**k)) {
        return Err(Erc8004Error::Validation(format!(
            "extra metadata field '{}' conflicts with a register argument",
            key
        )));
    }
    document.insert("name".to_string(), Value::String(name.to_string()));
    document.insert("description".to_string(), Value::String(description.to_string()));

    let mut metadata: AgentMetadata = serde_json::from_value(Value::Object(document))
        .map_err(|e| Erc8004Error::Validation(format!("invalid metadata field: {}", e)))?;
    metadata.image = options.image;
    metadata.services = services;
    metadata.validate()?;

    Ok((metadata, options.metadata_entries))
}
