pub mod identity;
pub mod reputation;
pub mod validation;

pub use identity::IdentityRegistry;
pub use reputation::ReputationRegistry;
pub use validation::ValidationRegistry;

use crate::error::{Erc8004Error, Result};
use crate::models::ChainConfig;
use crate::services::connection::SignerClient;
use ethers::{abi::Detokenize, contract::ContractCall, types::TransactionReceipt};

/// Send a signed contract call and wait until it is mined successfully.
pub(crate) async fn send_and_confirm<D: Detokenize>(
    call: ContractCall<SignerClient, D>,
    chain: &ChainConfig,
    action: &str,
) -> Result<TransactionReceipt> {
    let call = if chain.legacy_tx { call.legacy() } else { call };
    let pending_tx = call.send().await?;
    let tx_hash = *pending_tx;

    tracing::info!("{} transaction sent ({:?}), waiting for confirmation...", action, tx_hash);

    let receipt = pending_tx
        .await?
        .ok_or(Erc8004Error::TransactionDropped(tx_hash))?;

    if receipt.status != Some(1.into()) {
        tracing::warn!("{} transaction {:?} reverted", action, tx_hash);
        return Err(Erc8004Error::TransactionReverted(tx_hash));
    }

    tracing::info!(
        "{} confirmed in block {:?}: {:?}",
        action,
        receipt.block_number,
        receipt.transaction_hash
    );

    Ok(receipt)
}
