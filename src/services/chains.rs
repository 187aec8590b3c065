use crate::error::{Erc8004Error, Result};
use crate::models::{ChainConfig, ChainSelector};
use ethers::types::Address;
use std::str::FromStr;

// The registries are CREATE2 deployments, so every testnet shares one set of
// addresses and every mainnet another.
const TESTNET_IDENTITY: &str = "0x8004A818BFB912233c491871b3d84c89A494BD9e";
const TESTNET_REPUTATION: &str = "0x8004B663056A597Dffe9eCcC1965A193B7388713";
const TESTNET_VALIDATION: &str = "0x8004Cb1BF31DAf7788923b405b754f57acEB4272";
const MAINNET_IDENTITY: &str = "0x8004A169FB4a3325136EB29fA0ceB6D2e539a432";
const MAINNET_REPUTATION: &str = "0x8004BAa17C55a88189AE136b182e5fdA19dE9b63";

struct ChainEntry {
    key: &'static str,
    aliases: &'static [&'static str],
    name: &'static str,
    chain_id: u64,
    rpc_url: &'static str,
    explorer_url: &'static str,
    testnet: bool,
    /// No EIP-1559 fee market; send legacy gas-price transactions.
    legacy_tx: bool,
}

const CHAINS: &[ChainEntry] = &[
    ChainEntry {
        key: "bsc-testnet",
        aliases: &["bnb-testnet"],
        name: "BSC Testnet",
        chain_id: 97,
        rpc_url: "https://data-seed-prebsc-1-s1.bnbchain.org:8545",
        explorer_url: "https://testnet.bscscan.com",
        testnet: true,
        legacy_tx: true,
    },
    ChainEntry {
        key: "bsc",
        aliases: &["bsc-mainnet", "bnb"],
        name: "BSC Mainnet",
        chain_id: 56,
        rpc_url: "https://bsc-dataseed.bnbchain.org",
        explorer_url: "https://bscscan.com",
        testnet: false,
        legacy_tx: true,
    },
    ChainEntry {
        key: "opbnb-testnet",
        aliases: &[],
        name: "opBNB Testnet",
        chain_id: 5611,
        rpc_url: "https://opbnb-testnet-rpc.bnbchain.org",
        explorer_url: "https://testnet.opbnbscan.com",
        testnet: true,
        legacy_tx: false,
    },
    ChainEntry {
        key: "opbnb",
        aliases: &["opbnb-mainnet"],
        name: "opBNB Mainnet",
        chain_id: 204,
        rpc_url: "https://opbnb-mainnet-rpc.bnbchain.org",
        explorer_url: "https://opbnbscan.com",
        testnet: false,
        legacy_tx: false,
    },
    ChainEntry {
        key: "eth-sepolia",
        aliases: &["sepolia"],
        name: "Ethereum Sepolia",
        chain_id: 11155111,
        rpc_url: "https://ethereum-sepolia-rpc.publicnode.com",
        explorer_url: "https://sepolia.etherscan.io",
        testnet: true,
        legacy_tx: false,
    },
    ChainEntry {
        key: "ethereum",
        aliases: &["eth", "eth-mainnet", "mainnet"],
        name: "Ethereum Mainnet",
        chain_id: 1,
        rpc_url: "https://ethereum-rpc.publicnode.com",
        explorer_url: "https://etherscan.io",
        testnet: false,
        legacy_tx: false,
    },
    ChainEntry {
        key: "base-sepolia",
        aliases: &[],
        name: "Base Sepolia",
        chain_id: 84532,
        rpc_url: "https://sepolia.base.org",
        explorer_url: "https://sepolia.basescan.org",
        testnet: true,
        legacy_tx: false,
    },
    ChainEntry {
        key: "base",
        aliases: &["base-mainnet"],
        name: "Base Mainnet",
        chain_id: 8453,
        rpc_url: "https://mainnet.base.org",
        explorer_url: "https://basescan.org",
        testnet: false,
        legacy_tx: false,
    },
];

impl ChainEntry {
    fn matches(&self, name: &str) -> bool {
        self.key == name || self.aliases.contains(&name)
    }

    fn to_config(&self) -> Result<ChainConfig> {
        let (identity, reputation, validation) = if self.testnet {
            (TESTNET_IDENTITY, TESTNET_REPUTATION, Some(TESTNET_VALIDATION))
        } else {
            (MAINNET_IDENTITY, MAINNET_REPUTATION, None)
        };

        Ok(ChainConfig {
            key: self.key.to_string(),
            name: self.name.to_string(),
            chain_id: self.chain_id,
            rpc_url: self.rpc_url.to_string(),
            explorer_url: self.explorer_url.to_string(),
            identity_registry: parse_address(identity)?,
            reputation_registry: parse_address(reputation)?,
            validation_registry: validation.map(parse_address).transpose()?,
            testnet: self.testnet,
            legacy_tx: self.legacy_tx,
        })
    }
}

fn parse_address(value: &str) -> Result<Address> {
    Address::from_str(value)
        .map_err(|e| Erc8004Error::Validation(format!("Invalid registry address {}: {}", value, e)))
}

/// Resolve a chain by name, alias or numeric ID. Purely a table lookup.
pub fn get_chain(selector: impl Into<ChainSelector>) -> Result<ChainConfig> {
    match selector.into() {
        ChainSelector::Id(id) => get_chain_by_id(id),
        ChainSelector::Name(name) => {
            let normalized = name.trim().to_lowercase().replace('_', "-");
            if let Ok(id) = normalized.parse::<u64>() {
                return get_chain_by_id(id);
            }
            CHAINS
                .iter()
                .find(|entry| entry.matches(&normalized))
                .ok_or(Erc8004Error::UnknownChain(name))?
                .to_config()
        }
    }
}

pub fn get_chain_by_id(chain_id: u64) -> Result<ChainConfig> {
    CHAINS
        .iter()
        .find(|entry| entry.chain_id == chain_id)
        .ok_or_else(|| Erc8004Error::UnknownChain(chain_id.to_string()))?
        .to_config()
}

/// All built-in chains, testnets first within each network.
pub fn supported_chains() -> Result<Vec<ChainConfig>> {
    CHAINS.iter().map(ChainEntry::to_config).collect()
}
