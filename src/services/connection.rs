use crate::error::{Erc8004Error, Result};
use crate::models::ChainConfig;
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::Address,
};
use std::sync::Arc;
use std::time::Duration;

// Dev nodes mine instantly; poll them faster than the provider's 7s default.
const LOCAL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Provider that signs every transaction it sends with the client's wallet.
pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// The single outbound RPC connection of a client, shared by every registry.
#[derive(Clone)]
pub struct Connection {
    provider: Arc<Provider<Http>>,
    signer: Option<Arc<SignerClient>>,
    chain: Arc<ChainConfig>,
}

impl Connection {
    pub fn new(chain: ChainConfig, wallet: Option<LocalWallet>) -> Result<Self> {
        let mut provider = Provider::<Http>::try_from(chain.rpc_url.as_str()).map_err(|e| {
            Erc8004Error::Validation(format!("Invalid RPC URL '{}': {}", chain.rpc_url, e))
        })?;
        if is_local_endpoint(&chain.rpc_url) {
            provider = provider.interval(LOCAL_POLL_INTERVAL);
        }

        let signer = wallet.map(|wallet| {
            let wallet = wallet.with_chain_id(chain.chain_id);
            tracing::info!(
                address = %wallet.address(),
                chain_id = chain.chain_id,
                "Signing account configured"
            );
            Arc::new(SignerMiddleware::new(provider.clone(), wallet))
        });

        Ok(Self {
            provider: Arc::new(provider),
            signer,
            chain: Arc::new(chain),
        })
    }

    pub fn provider(&self) -> Arc<Provider<Http>> {
        self.provider.clone()
    }

    /// The signing provider, or `NoSigner` for a read-only connection.
    pub fn signer(&self) -> Result<Arc<SignerClient>> {
        self.signer.clone().ok_or(Erc8004Error::NoSigner)
    }

    pub fn wallet(&self) -> Option<&LocalWallet> {
        self.signer.as_ref().map(|s| s.signer())
    }

    /// Default sender for transactions originated by this connection.
    pub fn address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    pub async fn remote_chain_id(&self) -> Result<u64> {
        let id = self.provider.get_chainid().await?;
        Ok(id.as_u64())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("rpc_url", &self.chain.rpc_url)
            .field("chain_id", &self.chain.chain_id)
            .field("address", &self.address())
            .finish()
    }
}

fn is_local_endpoint(rpc_url: &str) -> bool {
    reqwest::Url::parse(rpc_url)
        .ok()
        .and_then(|url| url.host_str().map(|host| matches!(host, "localhost" | "127.0.0.1" | "[::1]")))
        .unwrap_or(false)
}

/// Parse a hex private key, with or without a `0x` prefix.
pub fn parse_private_key(private_key: &str) -> Result<LocalWallet> {
    let key_hex = private_key.trim();
    let key_hex = key_hex
        .strip_prefix("0x")
        .or_else(|| key_hex.strip_prefix("0X"))
        .unwrap_or(key_hex);

    let bytes = hex::decode(key_hex)
        .map_err(|e| Erc8004Error::InvalidKey(format!("malformed hex: {}", e)))?;
    wallet_from_bytes(&bytes)
}

pub fn wallet_from_bytes(bytes: &[u8]) -> Result<LocalWallet> {
    if bytes.len() != 32 {
        return Err(Erc8004Error::InvalidKey(format!(
            "expected 32 bytes, got {}",
            bytes.len()
        )));
    }
    LocalWallet::from_bytes(bytes)
        .map_err(|_| Erc8004Error::InvalidKey("not a valid secp256k1 scalar".to_string()))
}

/// Raw 32-byte secret of a wallet.
pub fn wallet_secret(wallet: &LocalWallet) -> Vec<u8> {
    wallet.signer().to_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::chains::get_chain;

    // Anvil's first dev account; never holds real funds.
    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn parses_key_with_and_without_prefix() {
        let bare = parse_private_key(TEST_PRIVATE_KEY).unwrap();
        let prefixed = parse_private_key(&format!("0x{}", TEST_PRIVATE_KEY)).unwrap();
        assert_eq!(bare.address(), prefixed.address());
        assert_eq!(format!("{:?}", bare.address()), TEST_ADDRESS);
    }

    #[test]
    fn rejects_malformed_hex() {
        let err = parse_private_key("invalid_key").unwrap_err();
        assert!(matches!(err, Erc8004Error::InvalidKey(_)));
    }

    #[test]
    fn rejects_wrong_length() {
        let err = parse_private_key("0xdeadbeef").unwrap_err();
        assert!(err.to_string().contains("expected 32 bytes, got 4"));
    }

    #[test]
    fn rejects_zero_scalar() {
        let err = wallet_from_bytes(&[0u8; 32]).unwrap_err();
        assert!(matches!(err, Erc8004Error::InvalidKey(_)));
    }

    #[test]
    fn secret_round_trips() {
        let wallet = parse_private_key(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(hex::encode(wallet_secret(&wallet)), TEST_PRIVATE_KEY);
    }

    #[test]
    fn read_only_connection_has_no_signer() {
        let conn = Connection::new(get_chain("bsc-testnet").unwrap(), None).unwrap();
        assert!(conn.address().is_none());
        assert!(matches!(conn.signer(), Err(Erc8004Error::NoSigner)));
    }

    #[test]
    fn signer_binds_chain_id_and_sender() {
        let wallet = parse_private_key(TEST_PRIVATE_KEY).unwrap();
        let conn = Connection::new(get_chain("bsc").unwrap(), Some(wallet)).unwrap();
        assert_eq!(format!("{:?}", conn.address().unwrap()), TEST_ADDRESS);
        assert_eq!(conn.wallet().unwrap().chain_id(), 56);
    }

    #[test]
    fn detects_local_endpoints() {
        assert!(is_local_endpoint("http://127.0.0.1:8545"));
        assert!(is_local_endpoint("http://localhost:8545/rpc"));
        assert!(!is_local_endpoint("https://bsc-dataseed.bnbchain.org"));
        assert!(!is_local_endpoint("not a url"));
    }

    #[test]
    fn invalid_rpc_url_is_rejected() {
        let chain = get_chain("bsc").unwrap().with_rpc_url("not a url");
        assert!(matches!(Connection::new(chain, None), Err(Erc8004Error::Validation(_))));
    }
}
