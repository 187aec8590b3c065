use crate::contracts::send_and_confirm;
use crate::error::Result;
use crate::models::{check_score, encode_tag, FeedbackSummary};
use crate::services::connection::{Connection, SignerClient};
use ethers::{
    prelude::*,
    providers::{Http, Provider},
    types::{Address, H256, U256},
};

abigen!(
    ReputationRegistryContract,
    r#"[
        function giveFeedback(uint256 agentId, uint8 score, bytes32 tag1, bytes32 tag2, string feedbackUri, bytes32 feedbackHash)
        function revokeFeedback(uint256 agentId, uint64 feedbackIndex)
        function getSummary(uint256 agentId, address[] clientAddresses, bytes32 tag1, bytes32 tag2) view returns (uint64 count, uint8 averageScore)
        function getClients(uint256 agentId) view returns (address[])
        function getVersion() view returns (string)
    ]"#
);

/// Feedback to record against an agent.
#[derive(Debug, Clone, Default)]
pub struct Feedback {
    pub score: u8,
    pub tag1: String,
    pub tag2: String,
    pub feedback_uri: String,
    pub feedback_hash: H256,
}

#[derive(Debug, Clone)]
pub struct ReputationRegistry {
    conn: Connection,
    address: Address,
}

impl ReputationRegistry {
    pub fn new(conn: Connection) -> Self {
        let address = conn.chain().reputation_registry;
        Self { conn, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn reader(&self) -> ReputationRegistryContract<Provider<Http>> {
        ReputationRegistryContract::new(self.address, self.conn.provider())
    }

    fn writer(&self) -> Result<ReputationRegistryContract<SignerClient>> {
        Ok(ReputationRegistryContract::new(self.address, self.conn.signer()?))
    }

    pub async fn give_feedback(&self, agent_id: U256, feedback: &Feedback) -> Result<H256> {
        let score = check_score(feedback.score)?;
        let tag1 = encode_tag(&feedback.tag1)?;
        let tag2 = encode_tag(&feedback.tag2)?;
        let registry = self.writer()?;

        tracing::info!("Giving feedback {} to agent {}", score, agent_id);

        let call = registry.give_feedback(
            agent_id,
            score,
            tag1,
            tag2,
            feedback.feedback_uri.clone(),
            feedback.feedback_hash.to_fixed_bytes(),
        );
        let receipt = send_and_confirm(call, self.conn.chain(), "GiveFeedback").await?;
        Ok(receipt.transaction_hash)
    }

    pub async fn revoke_feedback(&self, agent_id: U256, feedback_index: u64) -> Result<H256> {
        let registry = self.writer()?;
        let call = registry.revoke_feedback(agent_id, feedback_index);
        let receipt = send_and_confirm(call, self.conn.chain(), "RevokeFeedback").await?;
        Ok(receipt.transaction_hash)
    }

    /// Aggregate feedback, optionally restricted to some clients and tags.
    /// Empty `clients` and tags mean "all".
    pub async fn get_summary(
        &self,
        agent_id: U256,
        clients: &[Address],
        tag1: &str,
        tag2: &str,
    ) -> Result<FeedbackSummary> {
        let (count, average_score) = self
            .reader()
            .get_summary(agent_id, clients.to_vec(), encode_tag(tag1)?, encode_tag(tag2)?)
            .call()
            .await?;

        Ok(FeedbackSummary { count, average_score })
    }

    pub async fn get_clients(&self, agent_id: U256) -> Result<Vec<Address>> {
        Ok(self.reader().get_clients(agent_id).call().await?)
    }

    pub async fn get_version(&self) -> Result<String> {
        Ok(self.reader().get_version().call().await?)
    }
}
