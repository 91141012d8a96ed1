use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use std::fmt;
use std::slice;

use super::block::{Block, BlockError};
use super::hash::HashAlgorithm;

/// Errors that can occur during blockchain operations
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Block {index}: {source}")]
    Block {
        index: usize,
        #[source]
        source: BlockError,
    },

    #[error("Forged block at index {index}: stored hash does not match its contents")]
    ForgedBlock { index: usize },

    #[error("Broken linkage at index {index}: expected previous hash {expected}, found {found}")]
    BrokenLinkage {
        index: usize,
        expected: String,
        found: String,
    },
}

impl ChainError {
    /// Position of the block the error refers to
    pub fn index(&self) -> usize {
        match self {
            ChainError::Block { index, .. }
            | ChainError::ForgedBlock { index }
            | ChainError::BrokenLinkage { index, .. } => *index,
        }
    }
}

/// Mining settings shared by every block the chain produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainConfig {
    /// Number of leading zero hex digits required in a block hash
    pub difficulty: usize,

    /// Digest function for new blocks
    pub algorithm: HashAlgorithm,

    /// Previous hash recorded in the first block
    pub genesis_previous_hash: String,

    /// Nonce each new block starts mining from
    pub starting_nonce: u64,

    /// Optional cap on hash evaluations per block
    pub max_attempts: Option<u64>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            difficulty: 2,
            algorithm: HashAlgorithm::default(),
            genesis_previous_hash: "0".to_string(),
            starting_nonce: 0,
            max_attempts: None,
        }
    }
}

/// Represents the blockchain
#[derive(Debug, Clone, Default)]
pub struct Blockchain {
    /// The chain of blocks
    blocks: Vec<Block>,

    config: ChainConfig,
}

impl Blockchain {
    /// Creates an empty blockchain
    ///
    /// # Arguments
    ///
    /// * `config` - Mining settings for blocks produced by [`Blockchain::mine_next`]
    pub fn new(config: ChainConfig) -> Self {
        Blockchain {
            blocks: Vec::new(),
            config,
        }
    }

    /// Gets the mining settings of the chain
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Appends a block to the end of the chain
    ///
    /// No validation happens here; call [`Blockchain::validate`] for that.
    pub fn append(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Mines a new block on top of the chain and appends it
    ///
    /// # Returns
    ///
    /// Result with the newly mined block
    pub fn mine_next(&mut self) -> Result<&Block, ChainError> {
        let index = self.blocks.len();
        let previous_hash = match self.blocks.last() {
            Some(block) => block.hash().to_string(),
            None => self.config.genesis_previous_hash.clone(),
        };

        let mut block = Block::with_algorithm(
            index as u64,
            previous_hash,
            self.config.starting_nonce,
            self.config.algorithm,
        );

        let attempts = match self.config.max_attempts {
            Some(max_attempts) => block
                .mine_bounded(self.config.difficulty, max_attempts)
                .map_err(|source| ChainError::Block { index, source })?,
            None => block.mine(self.config.difficulty),
        };
        debug!("Block {} took {} attempts", index, attempts);

        self.append(block);
        Ok(&self.blocks[index])
    }

    /// Mines and appends `count` blocks
    pub fn mine_blocks(&mut self, count: usize) -> Result<(), ChainError> {
        for _ in 0..count {
            self.mine_next()?;
        }

        info!("Chain now holds {} blocks", self.blocks.len());
        Ok(())
    }

    /// Gets the number of blocks in the chain
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if no block has been appended yet
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Gets the block at the given position
    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Gets the first block in the chain
    pub fn first(&self) -> Option<&Block> {
        self.blocks.first()
    }

    /// Gets the last block in the chain
    pub fn last(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Gets all blocks in chain order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Iterates the blocks in insertion order
    pub fn iter(&self) -> slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Validates the blockchain
    ///
    /// Every block after the first must carry its predecessor's hash, and
    /// every block must match its own hash. Linkage is checked first, so a
    /// block whose previous hash was swapped is reported as broken linkage.
    ///
    /// # Returns
    ///
    /// The first failure found, or `Ok(())`
    pub fn validate(&self) -> Result<(), ChainError> {
        for (index, block) in self.blocks.iter().enumerate() {
            if index > 0 {
                let previous = &self.blocks[index - 1];
                if block.previous_hash() != previous.hash() {
                    return Err(ChainError::BrokenLinkage {
                        index,
                        expected: previous.hash().to_string(),
                        found: block.previous_hash().to_string(),
                    });
                }
            }

            let valid = block
                .is_valid()
                .map_err(|source| ChainError::Block { index, source })?;
            if !valid {
                return Err(ChainError::ForgedBlock { index });
            }
        }

        Ok(())
    }

    /// Validates the blockchain
    ///
    /// # Returns
    ///
    /// true if the blockchain is valid, false otherwise
    pub fn is_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(err) => {
                warn!("Chain validation failed: {}", err);
                false
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn block_mut(&mut self, index: usize) -> &mut Block {
        &mut self.blocks[index]
    }
}

impl<'a> IntoIterator for &'a Blockchain {
    type Item = &'a Block;
    type IntoIter = slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in self {
            writeln!(f, "{}", block)?;
        }
        writeln!(f)
    }
}
