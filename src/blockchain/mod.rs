// Blockchain module
//
// This module contains the core blockchain implementation:
// - Pluggable 32-bit hash functions
// - Block structure and proof of work
// - Blockchain structure and validation

pub mod block;
pub mod chain;
pub mod hash;

// Re-export main components for easier access
pub use block::{Block, BlockError, ByNonce, MiningState};
pub use chain::{Blockchain, ChainConfig, ChainError};
pub use hash::{HashAlgorithm, HashError, HashFn};
