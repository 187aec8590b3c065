use crate::client::Erc8004Client;
use crate::error::{Erc8004Error, Result};
use crate::services::connection::wallet_secret;
use crate::services::keystore::encrypt_keystore;
use ethers::signers::{LocalWallet, Signer};
use std::path::{Path, PathBuf};

impl Erc8004Client {
    /// Generate a new random account and save it as an encrypted keystore.
    pub fn create_wallet(password: &str, save_path: impl AsRef<Path>) -> Result<PathBuf> {
        let wallet = LocalWallet::new(&mut rand::thread_rng());
        tracing::info!(address = %wallet.address(), "Generated new wallet");
        encrypt_keystore(&wallet_secret(&wallet), password, save_path)
    }

    /// Write the client's signing key to `path` as an encrypted keystore.
    pub fn export_keystore(&self, password: &str, path: impl AsRef<Path>) -> Result<PathBuf> {
        let wallet = self.wallet().ok_or(Erc8004Error::NoSigner)?;
        encrypt_keystore(&wallet_secret(wallet), password, path)
    }
}
