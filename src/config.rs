use crate::client::{ClientOptions, Erc8004Client};
use crate::services::chains::get_chain;
use anyhow::{bail, Context, Result};
use std::fmt;
use std::path::PathBuf;

pub const CHAIN_VAR: &str = "ERC8004_CHAIN";
pub const RPC_URL_VAR: &str = "ERC8004_RPC_URL";
pub const PRIVATE_KEY_VARS: [&str; 2] = ["PRIVATE_KEY", "ERC8004_PRIVATE_KEY"];
pub const KEYSTORE_FILE_VAR: &str = "KEYSTORE_FILE";
pub const KEYSTORE_PASSWORD_VAR: &str = "KEYSTORE_PASSWORD";

const DEFAULT_CHAIN: &str = "bsc-testnet";

/// Where the signing key comes from. A raw private key wins over a keystore.
#[derive(Clone, PartialEq, Eq)]
pub enum SignerSource {
    None,
    PrivateKey(String),
    Keystore { path: PathBuf, password: String },
    KeystoreWithoutPassword(PathBuf),
}

// Never print key material or passwords.
impl fmt::Debug for SignerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerSource::None => write!(f, "None"),
            SignerSource::PrivateKey(_) => write!(f, "PrivateKey(<redacted>)"),
            SignerSource::Keystore { path, .. } => write!(f, "Keystore({})", path.display()),
            SignerSource::KeystoreWithoutPassword(path) => {
                write!(f, "KeystoreWithoutPassword({})", path.display())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub chain: String,
    pub rpc_url: Option<String>,
    pub signer: SignerSource,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let private_key = PRIVATE_KEY_VARS.iter().find_map(|key| get(key));
        let signer = match (private_key, get(KEYSTORE_FILE_VAR), get(KEYSTORE_PASSWORD_VAR)) {
            (Some(key), _, _) => SignerSource::PrivateKey(key),
            (None, Some(path), Some(password)) => SignerSource::Keystore {
                path: PathBuf::from(path),
                password,
            },
            (None, Some(path), None) => SignerSource::KeystoreWithoutPassword(PathBuf::from(path)),
            (None, None, _) => SignerSource::None,
        };

        let config = Self {
            chain: get(CHAIN_VAR).unwrap_or_else(|| DEFAULT_CHAIN.to_string()),
            rpc_url: get(RPC_URL_VAR),
            signer,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        get_chain(self.chain.as_str()).with_context(|| format!("Invalid {}", CHAIN_VAR))?;

        if let Some(url) = &self.rpc_url {
            if !url.starts_with("http") {
                bail!("{} must be HTTP(S) URL", RPC_URL_VAR);
            }
        }

        tracing::debug!(chain = %self.chain, auth = %self.auth_status(), "Configuration validated");
        Ok(())
    }

    /// Human-readable description of the configured auth method.
    pub fn auth_status(&self) -> String {
        match &self.signer {
            SignerSource::PrivateKey(_) => "private key".to_string(),
            SignerSource::Keystore { path, .. } => format!("keystore file ({})", path.display()),
            SignerSource::KeystoreWithoutPassword(_) => format!(
                "keystore file configured but {} is missing",
                KEYSTORE_PASSWORD_VAR
            ),
            SignerSource::None => format!(
                "none (read-only mode, set {} or {} + {})",
                PRIVATE_KEY_VARS[0], KEYSTORE_FILE_VAR, KEYSTORE_PASSWORD_VAR
            ),
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        let options = ClientOptions::new(self.chain.as_str());
        match &self.rpc_url {
            Some(url) => options.with_rpc_url(url.as_str()),
            None => options,
        }
    }

    pub fn connect(&self) -> Result<Erc8004Client> {
        let options = self.client_options();
        let client = match &self.signer {
            SignerSource::PrivateKey(key) => Erc8004Client::from_private_key(key, options)
                .context("Invalid private key")?,
            SignerSource::Keystore { path, password } => {
                Erc8004Client::from_keystore(path, password, options)
                    .with_context(|| format!("Failed to load keystore {}", path.display()))?
            }
            SignerSource::KeystoreWithoutPassword(path) => bail!(
                "{} is set to {} but {} is missing",
                KEYSTORE_FILE_VAR,
                path.display(),
                KEYSTORE_PASSWORD_VAR
            ),
            SignerSource::None => Erc8004Client::new(options)?,
        };

        tracing::info!(
            chain = %client.chain().name,
            auth = %self.auth_status(),
            "ERC-8004 client ready"
        );
        Ok(client)
    }
}

/// Password for writing a keystore: the explicit value, else `KEYSTORE_PASSWORD`
/// from the environment or `.env`.
pub fn keystore_password(explicit: Option<&str>) -> Result<String> {
    dotenvy::dotenv().ok();
    password_from_lookup(explicit, |key| std::env::var(key).ok())
}

fn password_from_lookup(
    explicit: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    explicit
        .map(str::to_string)
        .or_else(|| lookup(KEYSTORE_PASSWORD_VAR))
        .filter(|password| !password.is_empty())
        .with_context(|| {
            format!(
                "A password is required: pass --keystore-password or set {}",
                KEYSTORE_PASSWORD_VAR
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<EnvConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_read_only_testnet() {
        let config = config(&[]).unwrap();
        assert_eq!(config.chain, "bsc-testnet");
        assert_eq!(config.signer, SignerSource::None);
        assert!(config.auth_status().starts_with("none"));
    }

    #[test]
    fn private_key_takes_precedence() {
        let config = config(&[
            ("PRIVATE_KEY", "0xabc"),
            ("KEYSTORE_FILE", "wallet.json"),
            ("KEYSTORE_PASSWORD", "pw"),
        ])
        .unwrap();
        assert_eq!(config.signer, SignerSource::PrivateKey("0xabc".into()));
        assert_eq!(config.auth_status(), "private key");
    }

    #[test]
    fn keystore_needs_password() {
        let config = config(&[("KEYSTORE_FILE", "wallet.json")]).unwrap();
        assert!(matches!(config.signer, SignerSource::KeystoreWithoutPassword(_)));
        assert!(config.auth_status().contains("KEYSTORE_PASSWORD is missing"));
        assert!(config.connect().is_err());
    }

    #[test]
    fn empty_values_are_ignored() {
        let config = config(&[("PRIVATE_KEY", ""), ("ERC8004_CHAIN", "  ")]).unwrap();
        assert_eq!(config.signer, SignerSource::None);
        assert_eq!(config.chain, "bsc-testnet");
    }

    #[test]
    fn rejects_unknown_chain_and_bad_rpc() {
        assert!(config(&[("ERC8004_CHAIN", "narnia")]).is_err());
        assert!(config(&[("ERC8004_RPC_URL", "ws://node")]).is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let source = SignerSource::Keystore {
            path: PathBuf::from("wallet.json"),
            password: "hunter2".into(),
        };
        assert!(!format!("{:?}", source).contains("hunter2"));
        assert!(!format!("{:?}", SignerSource::PrivateKey("0xsecret".into())).contains("secret"));
    }

    #[test]
    fn password_prefers_explicit_value() {
        let lookup = |key: &str| (key == KEYSTORE_PASSWORD_VAR).then(|| "from-env".to_string());
        assert_eq!(password_from_lookup(Some("flag"), lookup).unwrap(), "flag");
        assert_eq!(password_from_lookup(None, lookup).unwrap(), "from-env");
    }

    #[test]
    fn password_is_required() {
        let err = password_from_lookup(None, |_| None).unwrap_err();
        assert!(err.to_string().contains("KEYSTORE_PASSWORD"));
        assert!(password_from_lookup(Some(""), |_| None).is_err());
    }

    #[test]
    fn rpc_override_reaches_client() {
        let config = config(&[("ERC8004_CHAIN", "bsc"), ("ERC8004_RPC_URL", "http://127.0.0.1:8545")]).unwrap();
        let client = config.connect().unwrap();
        assert_eq!(client.chain().chain_id, 56);
        assert_eq!(client.chain().rpc_url, "http://127.0.0.1:8545");
    }
}
