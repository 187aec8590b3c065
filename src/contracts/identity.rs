use crate::contracts::send_and_confirm;
use crate::error::{Erc8004Error, Result};
use crate::models::{AgentMetadata, MetadataEntry, RegisteredAgent};
use crate::services::connection::{Connection, SignerClient};
use crate::services::uri::{build_agent_uri, resolve_agent_uri};
use ethers::{
    prelude::*,
    providers::{Http, Provider},
    types::{Address, TransactionReceipt, H256, U256},
};

// ERC-8004 IdentityRegistry ABI (ERC-721 based)
abigen!(
    IdentityRegistryContract,
    r#"[
        struct MetadataEntryAbi { string key; bytes value; }
        function register(string agentURI, MetadataEntryAbi[] metadata) returns (uint256 agentId)
        function setAgentURI(uint256 agentId, string newURI)
        function tokenURI(uint256 tokenId) view returns (string)
        function ownerOf(uint256 tokenId) view returns (address)
        function balanceOf(address owner) view returns (uint256)
        function getMetadata(uint256 agentId, string metadataKey) view returns (bytes)
        function setMetadata(uint256 agentId, string metadataKey, bytes metadataValue)
        function getVersion() view returns (string)
        event Registered(uint256 indexed agentId, string agentURI, address indexed owner)
    ]"#
);

#[derive(Debug, Clone)]
pub struct IdentityRegistry {
    conn: Connection,
    address: Address,
}

impl IdentityRegistry {
    pub fn new(conn: Connection) -> Self {
        let address = conn.chain().identity_registry;
        Self { conn, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn reader(&self) -> IdentityRegistryContract<Provider<Http>> {
        IdentityRegistryContract::new(self.address, self.conn.provider())
    }

    fn writer(&self) -> Result<IdentityRegistryContract<SignerClient>> {
        Ok(IdentityRegistryContract::new(self.address, self.conn.signer()?))
    }

    /// Register an agent whose metadata is embedded as a data URI.
    pub async fn register_with_metadata(
        &self,
        metadata: &AgentMetadata,
        extra_entries: &[MetadataEntry],
    ) -> Result<RegisteredAgent> {
        let agent_uri = build_agent_uri(metadata)?;
        let mut agent = self.register_uri(&agent_uri, extra_entries).await?;
        agent.metadata = Some(metadata.clone());
        Ok(agent)
    }

    /// Register an agent pointing at an externally hosted registration file.
    pub async fn register_uri(
        &self,
        agent_uri: &str,
        extra_entries: &[MetadataEntry],
    ) -> Result<RegisteredAgent> {
        let registry = self.writer()?;
        let entries: Vec<MetadataEntryAbi> = extra_entries
            .iter()
            .map(|entry| {
                let (key, value) = entry.to_abi();
                MetadataEntryAbi { key, value }
            })
            .collect();

        tracing::info!(
            registry = %self.address,
            chain_id = self.conn.chain().chain_id,
            uri_len = agent_uri.len(),
            entries = entries.len(),
            "Registering agent"
        );

        let call = registry.register(agent_uri.to_string(), entries);
        let receipt = send_and_confirm(call, self.conn.chain(), "Register").await?;
        let (agent_id, owner) = registered_event(&receipt, self.address)?;

        tracing::info!("Agent {} registered to {:?}", agent_id, owner);

        Ok(RegisteredAgent {
            agent_id,
            owner,
            agent_uri: agent_uri.to_string(),
            metadata: None,
            tx_hash: Some(receipt.transaction_hash),
            chain_id: self.conn.chain().chain_id,
        })
    }

    pub async fn get_agent(&self, agent_id: U256) -> Result<RegisteredAgent> {
        let registry = self.reader();
        let uri_call = registry.token_uri(agent_id);
        let owner_call = registry.owner_of(agent_id);
        let (agent_uri, owner) = futures::try_join!(uri_call.call(), owner_call.call())?;

        let metadata = match resolve_agent_uri(&agent_uri).await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                tracing::warn!("Could not resolve metadata for agent {}: {}", agent_id, e);
                None
            }
        };

        Ok(RegisteredAgent {
            agent_id,
            owner,
            agent_uri,
            metadata,
            tx_hash: None,
            chain_id: self.conn.chain().chain_id,
        })
    }

    pub async fn set_agent_uri(&self, agent_id: U256, agent_uri: &str) -> Result<H256> {
        let registry = self.writer()?;
        let call = registry.set_agent_uri(agent_id, agent_uri.to_string());
        let receipt = send_and_confirm(call, self.conn.chain(), "SetAgentURI").await?;
        Ok(receipt.transaction_hash)
    }

    pub async fn get_metadata(&self, agent_id: U256, key: &str) -> Result<Vec<u8>> {
        let value = self.reader().get_metadata(agent_id, key.to_string()).call().await?;
        Ok(value.to_vec())
    }

    pub async fn set_metadata(&self, agent_id: U256, entry: &MetadataEntry) -> Result<H256> {
        let registry = self.writer()?;
        let (key, value) = entry.to_abi();
        let call = registry.set_metadata(agent_id, key, value);
        let receipt = send_and_confirm(call, self.conn.chain(), "SetMetadata").await?;
        Ok(receipt.transaction_hash)
    }

    /// Number of agents owned by `owner`.
    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        Ok(self.reader().balance_of(owner).call().await?)
    }

    pub async fn get_version(&self) -> Result<String> {
        Ok(self.reader().get_version().call().await?)
    }
}

/// Pull `(agentId, owner)` out of the `Registered` log emitted by `registry`.
fn registered_event(receipt: &TransactionReceipt, registry: Address) -> Result<(U256, Address)> {
    let topic = RegisteredFilter::signature();

    receipt
        .logs
        .iter()
        .find(|log| log.address == registry && log.topics.first() == Some(&topic) && log.topics.len() >= 3)
        .map(|log| {
            let agent_id = U256::from_big_endian(log.topics[1].as_bytes());
            let owner = Address::from(log.topics[2]);
            (agent_id, owner)
        })
        .ok_or(Erc8004Error::MissingEvent {
            event: "Registered",
            tx_hash: receipt.transaction_hash,
        })
}
