//! Web3 Secret Storage (v3) keystore files.
//!
//! Encryption, key derivation and MAC checks are done by `eth-keystore`; this
//! module owns the file handling around it and the error contract:
//! - a missing path is reported before anything is read
//! - a file that is not a keystore document is `MalformedKeystore`
//! - every decryption failure is the same `DecryptionFailed`
//! - decryption never writes to the file

use crate::error::{Erc8004Error, Result};
use crate::services::connection::wallet_from_bytes;
use ethers::{signers::Signer, types::Address};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Read and structurally check a keystore document without decrypting it.
pub fn read_keystore(path: &Path) -> Result<Value> {
    if !path.is_file() {
        return Err(Erc8004Error::KeystoreNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let document: Value = serde_json::from_str(&content)
        .map_err(|e| Erc8004Error::MalformedKeystore(format!("not valid JSON: {}", e)))?;

    let crypto = document.get("crypto").or_else(|| document.get("Crypto"));
    match crypto {
        Some(Value::Object(_)) => Ok(document),
        Some(_) => Err(Erc8004Error::MalformedKeystore(
            "'crypto' must be an object".to_string(),
        )),
        None => Err(Erc8004Error::MalformedKeystore(
            "missing 'crypto' section".to_string(),
        )),
    }
}

/// Decrypt a keystore file and return the raw 32-byte private key.
pub fn decrypt_keystore(path: impl AsRef<Path>, password: &str) -> Result<Vec<u8>> {
    let path = path.as_ref();
    read_keystore(path)?;

    let secret =
        eth_keystore::decrypt_key(path, password).map_err(|_| Erc8004Error::DecryptionFailed)?;

    tracing::debug!(path = %path.display(), "Keystore decrypted");
    Ok(secret)
}

/// Encrypt `secret` under `password` and write it to `path`.
///
/// Every call draws a fresh salt, IV and id, so two exports of one key differ.
pub fn encrypt_keystore(secret: &[u8], password: &str, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let wallet = wallet_from_bytes(secret)?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            Erc8004Error::Validation(format!("Invalid keystore path: {}", path.display()))
        })?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    eth_keystore::encrypt_key(&dir, &mut rand::thread_rng(), secret, password, Some(file_name))
        .map_err(|e| Erc8004Error::KeystoreWrite(e.to_string()))?;

    // geth and web3 tooling expect the plain address alongside the ciphertext.
    let written = dir.join(file_name);
    let mut document: Value = serde_json::from_str(&fs::read_to_string(&written)?)?;
    if let Value::Object(map) = &mut document {
        map.entry("address")
            .or_insert_with(|| Value::String(hex::encode(wallet.address().as_bytes())));
    }
    fs::write(&written, serde_json::to_string_pretty(&document)?)?;

    tracing::info!(
        path = %written.display(),
        address = %wallet.address(),
        "Keystore written"
    );

    Ok(written)
}

/// The unencrypted `address` field of a keystore, if present.
pub fn keystore_address(path: impl AsRef<Path>) -> Result<Option<Address>> {
    let document = read_keystore(path.as_ref())?;
    let Some(raw) = document.get("address").and_then(Value::as_str) else {
        return Ok(None);
    };

    let raw = raw.trim_start_matches("0x");
    Address::from_str(raw)
        .map(Some)
        .map_err(|e| Erc8004Error::MalformedKeystore(format!("invalid address field: {}", e)))
}
