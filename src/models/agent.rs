use crate::error::{Erc8004Error, Result};
use ethers::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `type` value of an ERC-8004 registration document.
pub const REGISTRATION_TYPE: &str = "https://eips.ethereum.org/EIPS/eip-8004#registration-v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentService {
    /// Protocol or service kind, e.g. `A2A`, `MCP`, `web`.
    pub name: String,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AgentService {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            version: None,
            extra: Map::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Coerce a loosely-typed JSON object into a service record.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let name = required_str(map, "name")?;
        let endpoint = required_str(map, "endpoint")?;
        let version = match map.get("version") {
            None | Some(Value::Null) => None,
            Some(Value::String(v)) => Some(v.clone()),
            Some(other) => {
                return Err(Erc8004Error::Validation(format!(
                    "service field 'version' must be a string, got {}",
                    other
                )))
            }
        };

        let extra = map
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "name" | "endpoint" | "version"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            name,
            endpoint,
            version,
            extra,
        })
    }
}

fn required_str(map: &Map<String, Value>, field: &str) -> Result<String> {
    match map.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(Erc8004Error::Validation(format!(
            "service field '{}' must not be empty",
            field
        ))),
        Some(other) => Err(Erc8004Error::Validation(format!(
            "service field '{}' must be a string, got {}",
            field, other
        ))),
        None => Err(Erc8004Error::Validation(format!(
            "service is missing required field '{}'",
            field
        ))),
    }
}

/// A service entry as handed to `register`: either already typed or a raw JSON mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceInput {
    Typed(AgentService),
    Loose(Value),
}

impl ServiceInput {
    pub fn into_service(self) -> Result<AgentService> {
        match self {
            ServiceInput::Typed(service) => Ok(service),
            ServiceInput::Loose(Value::Object(map)) => AgentService::from_map(&map),
            ServiceInput::Loose(other) => Err(Erc8004Error::Validation(format!(
                "service entry must be an object, got {}",
                other
            ))),
        }
    }
}

impl From<AgentService> for ServiceInput {
    fn from(service: AgentService) -> Self {
        ServiceInput::Typed(service)
    }
}

impl From<Value> for ServiceInput {
    fn from(value: Value) -> Self {
        ServiceInput::Loose(value)
    }
}

impl From<Map<String, Value>> for ServiceInput {
    fn from(map: Map<String, Value>) -> Self {
        ServiceInput::Loose(Value::Object(map))
    }
}

fn default_type() -> String {
    REGISTRATION_TYPE.to_string()
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMetadata {
    #[serde(rename = "type", default = "default_type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub services: Vec<AgentService>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(rename = "x402support", default)]
    pub x402_support: bool,
    #[serde(rename = "supportedTrust", default, skip_serializing_if = "Vec::is_empty")]
    pub supported_trust: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AgentMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: default_type(),
            name: name.into(),
            description: description.into(),
            image: None,
            services: Vec::new(),
            active: true,
            x402_support: false,
            supported_trust: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_service(mut self, service: AgentService) -> Self {
        self.services.push(service);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Erc8004Error::Validation("agent name must not be empty".to_string()));
        }
        Ok(())
    }
}

/// On-chain key/value metadata attached at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: Vec<u8>,
}

impl MetadataEntry {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub(crate) fn to_abi(&self) -> (String, Bytes) {
        (self.key.clone(), Bytes::from(self.value.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredAgent {
    pub agent_id: U256,
    pub owner: Address,
    pub agent_uri: String,
    pub metadata: Option<AgentMetadata>,
    pub tx_hash: Option<H256>,
    pub chain_id: u64,
}

/// Optional inputs to `Erc8004Client::register`.
#[derive(Debug, Clone, Default)]
pub struct RegisterOptions {
    pub services: Vec<ServiceInput>,
    pub image: Option<String>,
    pub metadata_entries: Vec<MetadataEntry>,
    /// Additional top-level fields merged into the metadata document.
    pub extra: Map<String, Value>,
}
