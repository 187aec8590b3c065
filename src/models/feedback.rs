use crate::error::{Erc8004Error, Result};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

/// Highest score/response value the registries accept.
pub const MAX_SCORE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSummary {
    pub count: u64,
    pub average_score: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStatus {
    pub validator: Address,
    pub agent_id: U256,
    pub response: u8,
    pub tag: String,
    pub last_update: U256,
}

pub fn check_score(score: u8) -> Result<u8> {
    if score > MAX_SCORE {
        return Err(Erc8004Error::Validation(format!(
            "score must be between 0 and {}, got {}",
            MAX_SCORE, score
        )));
    }
    Ok(score)
}

/// Right-pad a UTF-8 tag into a `bytes32` word.
pub fn encode_tag(tag: &str) -> Result<[u8; 32]> {
    let bytes = tag.as_bytes();
    if bytes.len() > 32 {
        return Err(Erc8004Error::Validation(format!(
            "tag '{}' is longer than 32 bytes",
            tag
        )));
    }
    let mut word = [0u8; 32];
    word[..bytes.len()].copy_from_slice(bytes);
    Ok(word)
}

pub fn decode_tag(word: [u8; 32]) -> String {
    let end = word.iter().position(|b| *b == 0).unwrap_or(word.len());
    String::from_utf8_lossy(&word[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_is_right_padded() {
        let word = encode_tag("uptime").unwrap();
        assert_eq!(&word[..6], b"uptime");
        assert!(word[6..].iter().all(|b| *b == 0));
        assert_eq!(decode_tag(word), "uptime");
    }

    #[test]
    fn empty_tag_is_zero_word() {
        assert_eq!(encode_tag("").unwrap(), [0u8; 32]);
        assert_eq!(decode_tag([0u8; 32]), "");
    }

    #[test]
    fn oversized_tag_is_rejected() {
        let tag = "x".repeat(33);
        assert!(matches!(encode_tag(&tag), Err(Erc8004Error::Validation(_))));
    }

    #[test]
    fn score_range() {
        assert_eq!(check_score(0).unwrap(), 0);
        assert_eq!(check_score(100).unwrap(), 100);
        assert!(check_score(101).is_err());
    }
}
