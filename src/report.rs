use serde::Serialize;

use crate::blockchain::{Block, Blockchain, HashAlgorithm};

/// Summary of a mined chain and its validation result
#[derive(Debug, Serialize)]
pub struct ChainReport<'a> {
    /// The length of the chain
    pub length: usize,

    /// Leading zero hex digits every block was mined to
    pub difficulty: usize,

    /// Hash function the chain was mined with
    pub algorithm: HashAlgorithm,

    /// Whether the chain is valid
    pub is_valid: bool,

    /// First validation failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// The blocks in the chain
    pub chain: &'a [Block],
}

impl<'a> ChainReport<'a> {
    /// Validates the chain and captures the result
    pub fn new(blockchain: &'a Blockchain) -> Self {
        let error = blockchain.validate().err().map(|err| err.to_string());

        ChainReport {
            length: blockchain.len(),
            difficulty: blockchain.config().difficulty,
            algorithm: blockchain.config().algorithm,
            is_valid: error.is_none(),
            error,
            chain: blockchain.blocks(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Renders the chain in the plain-text display format
pub fn render_text(blockchain: &Blockchain) -> String {
    format!("\nBlockchain:\n{}", blockchain)
}
