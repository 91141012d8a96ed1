use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use thiserror::Error;

use std::cmp::Ordering;
use std::fmt;

use super::hash::{to_hex, HashAlgorithm};

/// Errors that can occur during block operations
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("Corrupt digest: {0:?} is not a decimal 32-bit value")]
    CorruptDigest(String),

    #[error("Mining gave up after {attempts} attempts")]
    MiningExhausted { attempts: u64 },
}

/// Where a block is in its proof-of-work lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MiningState {
    Unmined,
    Mining,
    Mined,
}

/// Represents a block in the blockchain
///
/// The digest covers only the previous hash and the nonce. Neither the id nor
/// the timestamp is hashed.
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    /// Position of the block in the chain
    id: u64,

    /// Proof of work counter
    nonce: u64,

    /// Timestamp when the block was created
    timestamp: DateTime<Utc>,

    /// Hash of the previous block
    previous_hash: String,

    /// Hash of the current block, as a decimal string
    hash: String,

    /// Digest function used for every hash of this block
    algorithm: HashAlgorithm,

    state: MiningState,
}

impl Block {
    /// Creates a new block hashed with FNV-1a
    ///
    /// # Arguments
    ///
    /// * `id` - The position of the block in the chain
    /// * `previous_hash` - The hash of the previous block
    /// * `nonce` - The nonce mining starts from
    ///
    /// # Returns
    ///
    /// An unmined Block with a provisional hash
    pub fn new(id: u64, previous_hash: impl Into<String>, nonce: u64) -> Self {
        Self::with_algorithm(id, previous_hash, nonce, HashAlgorithm::default())
    }

    /// Creates a new block hashed with the given algorithm
    pub fn with_algorithm(
        id: u64,
        previous_hash: impl Into<String>,
        nonce: u64,
        algorithm: HashAlgorithm,
    ) -> Self {
        let block = Block {
            id,
            nonce,
            timestamp: Utc::now(),
            previous_hash: previous_hash.into(),
            hash: String::new(),
            algorithm,
            state: MiningState::Unmined,
        };

        let hash = block.calculate_hash().to_string();

        Block { hash, ..block }
    }

    /// Gets the position of the block in the chain
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Gets the current nonce
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Gets the creation time of the block
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The stored hash, as a decimal string
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Gets the hash of the previous block
    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    /// Gets the digest function this block is hashed with
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Gets the mining state of the block
    pub fn state(&self) -> MiningState {
        self.state
    }

    /// Calculates the hash of the block from its previous hash and nonce
    ///
    /// # Returns
    ///
    /// The raw 32-bit digest
    pub fn calculate_hash(&self) -> u32 {
        let input = format!("{}{}", self.previous_hash, self.nonce);
        self.algorithm.hash(input.as_bytes())
    }

    /// Parses the stored hash back into its 32-bit value
    pub fn digest_value(&self) -> Result<u32, BlockError> {
        self.hash
            .parse::<u32>()
            .map_err(|_| BlockError::CorruptDigest(self.hash.clone()))
    }

    /// Searches for a nonce whose digest starts with `difficulty` zero hex digits
    ///
    /// The search has no upper bound. A difficulty above 8 can never be met
    /// by an 8-digit rendering and will not return; use [`Block::mine_bounded`]
    /// when the runtime must be capped.
    ///
    /// # Returns
    ///
    /// The number of hash evaluations performed
    pub fn mine(&mut self, difficulty: usize) -> u64 {
        let target = "0".repeat(difficulty);
        self.state = MiningState::Mining;

        let mut attempts = 0;
        loop {
            attempts += 1;
            if let Some(digest) = self.attempt(&target) {
                self.seal(digest, attempts);
                return attempts;
            }
            self.nonce = self.nonce.wrapping_add(1);
        }
    }

    /// Like [`Block::mine`], but gives up after `max_attempts` hash evaluations
    ///
    /// On failure the block goes back to `Unmined`. It keeps its provisional
    /// hash and the advanced nonce, so it no longer validates.
    pub fn mine_bounded(
        &mut self,
        difficulty: usize,
        max_attempts: u64,
    ) -> Result<u64, BlockError> {
        let target = "0".repeat(difficulty);
        self.state = MiningState::Mining;

        for attempts in 1..=max_attempts {
            if let Some(digest) = self.attempt(&target) {
                self.seal(digest, attempts);
                return Ok(attempts);
            }
            self.nonce = self.nonce.wrapping_add(1);
        }

        self.state = MiningState::Unmined;
        Err(BlockError::MiningExhausted {
            attempts: max_attempts,
        })
    }

    /// Validates the stored hash against a fresh recomputation
    ///
    /// # Returns
    ///
    /// `Ok(false)` for a forged block, `Err` if the stored hash is not a number
    pub fn is_valid(&self) -> Result<bool, BlockError> {
        Ok(self.calculate_hash() == self.digest_value()?)
    }

    /// Compares two blocks by nonce only. Not a chain-order key.
    pub fn cmp_nonce(&self, other: &Block) -> Ordering {
        self.nonce.cmp(&other.nonce)
    }

    // Hex is only used for the difficulty test; the stored hash stays decimal.
    fn attempt(&self, target: &str) -> Option<u32> {
        let digest = self.calculate_hash();
        to_hex(digest).starts_with(target).then_some(digest)
    }

    fn seal(&mut self, digest: u32, attempts: u64) {
        self.hash = digest.to_string();
        self.state = MiningState::Mined;

        debug!(
            "Mined block {} with nonce {} after {} attempts (0x{})",
            self.id,
            self.nonce,
            attempts,
            to_hex(digest)
        );
    }

    #[cfg(test)]
    pub(crate) fn set_hash(&mut self, hash: impl Into<String>) {
        self.hash = hash.into();
    }

    #[cfg(test)]
    pub(crate) fn set_previous_hash(&mut self, previous_hash: impl Into<String>) {
        self.previous_hash = previous_hash.into();
    }
}

/// Width of the hex digest column: two digits per byte of a machine word
const DISPLAY_WIDTH: usize = std::mem::size_of::<usize>() * 2;

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.digest_value() {
            Ok(digest) => write!(
                f,
                "{:>2}:0x{:0width$x}:{}",
                self.id,
                digest,
                self.nonce,
                width = DISPLAY_WIDTH
            ),
            Err(_) => write!(
                f,
                "{:>2}:0x{:0>width$}:{}",
                self.id,
                self.hash,
                self.nonce,
                width = DISPLAY_WIDTH
            ),
        }
    }
}

/// Orders blocks by nonce only
///
/// Two blocks with the same nonce are equal under this wrapper even when
/// their ids and hashes differ. Use it for sorting or picking extremes, never
/// to decide chain order or identity.
#[derive(Debug, Clone, Copy)]
pub struct ByNonce<'a>(pub &'a Block);

impl PartialEq for ByNonce<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.nonce == other.0.nonce
    }
}

impl Eq for ByNonce<'_> {}

impl PartialOrd for ByNonce<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByNonce<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp_nonce(other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_block() {
        let block = Block::new(1, "previous_hash", 100);

        assert_eq!(block.id(), 1);
        assert_eq!(block.nonce(), 100);
        assert_eq!(block.previous_hash(), "previous_hash");
        assert_eq!(block.algorithm(), HashAlgorithm::Fnv1a);
        assert_eq!(block.state(), MiningState::Unmined);
        assert_eq!(block.hash(), block.calculate_hash().to_string());
        assert!(block.is_valid().unwrap());
    }

    #[test]
    fn test_calculate_hash() {
        let block = Block::new(7, "0", 42);

        assert_eq!(block.calculate_hash(), HashAlgorithm::Fnv1a.hash(b"042"));
    }

    #[test]
    fn test_hash_ignores_id_and_timestamp() {
        let first = Block::new(1, "abc", 5);
        let second = Block::new(99, "abc", 5);

        assert_eq!(first.hash(), second.hash());
    }

    #[test]
    fn test_algorithm_is_used_for_hashing() {
        for algorithm in HashAlgorithm::ALL {
            let block = Block::with_algorithm(0, "0", 0, algorithm);
            assert_eq!(block.calculate_hash(), algorithm.hash(b"00"));
        }
    }

    #[test]
    fn test_mine_difficulty_zero_takes_one_attempt() {
        let mut block = Block::new(0, "0", 0);

        let attempts = block.mine(0);

        assert_eq!(attempts, 1);
        assert_eq!(block.nonce(), 0);
        assert_eq!(block.state(), MiningState::Mined);
        assert_eq!(block.digest_value().unwrap(), HashAlgorithm::Fnv1a.hash(b"00"));
    }

    #[test]
    fn test_mined_block_is_valid() {
        for algorithm in HashAlgorithm::ALL {
            let mut block = Block::with_algorithm(3, "12345", 0, algorithm);
            block.mine(2);

            assert_eq!(block.state(), MiningState::Mined);
            assert!(block.is_valid().unwrap());
            assert!(to_hex(block.digest_value().unwrap()).starts_with("00"));
        }
    }

    #[test]
    fn test_mine_stores_decimal_hash() {
        let mut block = Block::new(0, "0", 0);
        block.mine(1);

        assert!(block.hash().bytes().all(|b| b.is_ascii_digit()));
        assert_eq!(block.hash(), block.calculate_hash().to_string());
    }

    #[test]
    fn test_mine_counts_attempts_from_starting_nonce() {
        let mut block = Block::new(0, "0", 10);
        let attempts = block.mine(1);

        assert_eq!(block.nonce(), 10 + attempts - 1);
    }

    #[test]
    fn test_mine_bounded_gives_up() {
        let mut block = Block::new(0, "0", 0);
        let provisional = block.hash().to_string();

        let result = block.mine_bounded(9, 50);

        assert!(matches!(result, Err(BlockError::MiningExhausted { attempts: 50 })));
        assert_eq!(block.state(), MiningState::Unmined);
        assert_eq!(block.nonce(), 50);
        assert_eq!(block.hash(), provisional);
        assert!(!block.is_valid().unwrap());
    }

    #[test]
    fn test_mine_bounded_succeeds_within_cap() {
        let mut block = Block::new(0, "0", 0);

        let attempts = block.mine_bounded(0, 1).unwrap();

        assert_eq!(attempts, 1);
        assert!(block.is_valid().unwrap());
    }

    #[test]
    fn test_tampered_hash_is_invalid() {
        let mut block = Block::new(0, "0", 0);
        block.mine(1);

        let forged = block.digest_value().unwrap().wrapping_add(1);
        block.set_hash(forged.to_string());

        assert!(!block.is_valid().unwrap());
    }

    #[test]
    fn test_corrupt_hash_is_an_error() {
        let mut block = Block::new(0, "0", 0);
        block.set_hash("not-a-number");

        assert!(matches!(
            block.is_valid(),
            Err(BlockError::CorruptDigest(h)) if h == "not-a-number"
        ));
    }

    #[test]
    fn test_display_format() {
        let mut block = Block::new(3, "0", 0);
        block.set_hash("255");

        let expected = format!("{:>2}:0x{:0>width$}:0", 3, "ff", width = DISPLAY_WIDTH);
        assert_eq!(block.to_string(), expected);
        assert!(block.to_string().starts_with(" 3:0x"));
    }

    #[test]
    fn test_nonce_ordering() {
        let low = Block::new(5, "a", 1);
        let high = Block::new(0, "b", 2);
        let same_nonce = Block::new(9, "c", 1);

        assert!(ByNonce(&low) < ByNonce(&high));
        assert!(ByNonce(&low) == ByNonce(&same_nonce));
        assert_eq!(high.cmp_nonce(&low), Ordering::Greater);

        let blocks = [&high, &low, &same_nonce];
        let max = blocks.iter().copied().map(ByNonce).max().unwrap();
        assert_eq!(max.0.id(), 0);
    }
}
