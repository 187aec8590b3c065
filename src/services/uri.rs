use crate::error::{Erc8004Error, Result};
use crate::models::AgentMetadata;
use base64::{engine::general_purpose::STANDARD, Engine as _};

const BASE64_PREFIX: &str = "data:application/json;base64,";
const PLAIN_PREFIX: &str = "data:application/json,";

/// Serialize metadata with sorted keys and no whitespace.
pub fn canonical_json(metadata: &AgentMetadata) -> Result<String> {
    // Round-tripping through `Value` sorts every object's keys.
    let value = serde_json::to_value(metadata)?;
    Ok(serde_json::to_string(&value)?)
}

/// Embed the metadata document in a self-contained `data:` URI.
pub fn build_agent_uri(metadata: &AgentMetadata) -> Result<String> {
    metadata.validate()?;
    let json = canonical_json(metadata)?;
    Ok(format!("{}{}", BASE64_PREFIX, STANDARD.encode(json)))
}

/// True when the URI can be decoded without network access.
pub fn is_inline(uri: &str) -> bool {
    let trimmed = uri.trim_start();
    trimmed.starts_with(BASE64_PREFIX) || trimmed.starts_with(PLAIN_PREFIX) || trimmed.starts_with('{')
}

pub fn parse_agent_uri(uri: &str) -> Result<AgentMetadata> {
    let uri = uri.trim();

    if let Some(encoded) = uri.strip_prefix(BASE64_PREFIX) {
        let decoded = STANDARD
            .decode(encoded)
            .map_err(|e| Erc8004Error::UnsupportedUri(format!("invalid base64 payload: {}", e)))?;
        return Ok(serde_json::from_slice(&decoded)?);
    }

    if let Some(json) = uri.strip_prefix(PLAIN_PREFIX) {
        return Ok(serde_json::from_str(json)?);
    }

    if uri.starts_with('{') {
        return Ok(serde_json::from_str(uri)?);
    }

    let scheme = uri.split(':').next().unwrap_or_default();
    Err(Erc8004Error::UnsupportedUri(format!("scheme '{}' in {}", scheme, uri)))
}

/// Resolve a URI to metadata, fetching `http(s)` documents over the network.
pub async fn resolve_agent_uri(uri: &str) -> Result<AgentMetadata> {
    if is_inline(uri) {
        return parse_agent_uri(uri);
    }

    let uri = uri.trim();
    if uri.starts_with("https://") || uri.starts_with("http://") {
        let metadata = reqwest::get(uri)
            .await?
            .error_for_status()?
            .json::<AgentMetadata>()
            .await?;
        return Ok(metadata);
    }

    parse_agent_uri(uri)
}
