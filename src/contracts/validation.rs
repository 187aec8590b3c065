use crate::contracts::send_and_confirm;
use crate::error::{Erc8004Error, Result};
use crate::models::{check_score, decode_tag, encode_tag, ValidationStatus};
use crate::services::connection::{Connection, SignerClient};
use ethers::{
    prelude::*,
    providers::{Http, Provider},
    types::{Address, H256, U256},
};

abigen!(
    ValidationRegistryContract,
    r#"[
        function validationRequest(address validatorAddress, uint256 agentId, string requestUri, bytes32 requestHash)
        function validationResponse(bytes32 requestHash, uint8 response, string responseUri, bytes32 responseHash, bytes32 tag)
        function getValidationStatus(bytes32 requestHash) view returns (address validatorAddress, uint256 agentId, uint8 response, bytes32 tag, uint256 lastUpdate)
        function getAgentValidations(uint256 agentId) view returns (bytes32[])
        function getVersion() view returns (string)
    ]"#
);

#[derive(Debug, Clone)]
pub struct ValidationRegistry {
    conn: Connection,
    address: Option<Address>,
}

impl ValidationRegistry {
    pub fn new(conn: Connection) -> Self {
        let address = conn.chain().validation_registry;
        Self { conn, address }
    }

    pub fn address(&self) -> Result<Address> {
        self.address.ok_or_else(|| Erc8004Error::NotDeployed {
            registry: "Validation",
            chain: self.conn.chain().name.clone(),
        })
    }

    fn reader(&self) -> Result<ValidationRegistryContract<Provider<Http>>> {
        Ok(ValidationRegistryContract::new(self.address()?, self.conn.provider()))
    }

    fn writer(&self) -> Result<ValidationRegistryContract<SignerClient>> {
        let address = self.address()?;
        Ok(ValidationRegistryContract::new(address, self.conn.signer()?))
    }

    /// Ask `validator` to validate work done by `agent_id`.
    pub async fn request_validation(
        &self,
        validator: Address,
        agent_id: U256,
        request_uri: &str,
        request_hash: H256,
    ) -> Result<H256> {
        let registry = self.writer()?;

        tracing::info!("Requesting validation of agent {} from {:?}", agent_id, validator);

        let call = registry.validation_request(
            validator,
            agent_id,
            request_uri.to_string(),
            request_hash.to_fixed_bytes(),
        );
        let receipt = send_and_confirm(call, self.conn.chain(), "ValidationRequest").await?;
        Ok(receipt.transaction_hash)
    }

    /// Answer a validation request as the designated validator.
    pub async fn respond(
        &self,
        request_hash: H256,
        response: u8,
        response_uri: &str,
        response_hash: H256,
        tag: &str,
    ) -> Result<H256> {
        let response = check_score(response)?;
        let tag = encode_tag(tag)?;
        let registry = self.writer()?;

        let call = registry.validation_response(
            request_hash.to_fixed_bytes(),
            response,
            response_uri.to_string(),
            response_hash.to_fixed_bytes(),
            tag,
        );
        let receipt = send_and_confirm(call, self.conn.chain(), "ValidationResponse").await?;
        Ok(receipt.transaction_hash)
    }

    pub async fn get_status(&self, request_hash: H256) -> Result<ValidationStatus> {
        let (validator, agent_id, response, tag, last_update) = self
            .reader()?
            .get_validation_status(request_hash.to_fixed_bytes())
            .call()
            .await?;

        Ok(ValidationStatus {
            validator,
            agent_id,
            response,
            tag: decode_tag(tag),
            last_update,
        })
    }

    pub async fn get_agent_validations(&self, agent_id: U256) -> Result<Vec<H256>> {
        let hashes = self.reader()?.get_agent_validations(agent_id).call().await?;
        Ok(hashes.into_iter().map(H256::from).collect())
    }

    pub async fn get_version(&self) -> Result<String> {
        Ok(self.reader()?.get_version().call().await?)
    }
}
