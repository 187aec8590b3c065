pub mod chains;
pub mod connection;
pub mod keystore;
pub mod uri;

pub use chains::{get_chain, get_chain_by_id, supported_chains};
pub use connection::{parse_private_key, Connection, SignerClient};
pub use keystore::{decrypt_keystore, encrypt_keystore, keystore_address};
pub use uri::{build_agent_uri, parse_agent_uri};
