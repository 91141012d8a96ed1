use clap::{Parser, ValueEnum};
use thiserror::Error;

use crate::blockchain::{ChainConfig, HashAlgorithm};

/// Number of hex digits in a rendered 32-bit digest
pub const MAX_DIFFICULTY: usize = 8;

/// Errors in the command-line configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Chain length must be at least 1")]
    EmptyChain,

    #[error("Difficulty {0} can never be met: digests only have 8 hex digits")]
    UnreachableDifficulty(usize),

    #[error("--max-attempts must be at least 1")]
    ZeroAttempts,
}

/// How the mined chain is printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One `id:0xhash:nonce` line per block
    #[default]
    Text,
    /// A JSON report with every block and the validation result
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "hashchain",
    version,
    about = "Mine and validate a hash-chained ledger of proof-of-work blocks"
)]
pub struct Cli {
    /// Number of blocks to mine
    #[arg(short = 'n', long, default_value_t = 100)]
    pub length: usize,

    /// Leading zero hex digits required in every block hash
    #[arg(short, long, default_value_t = 2)]
    pub difficulty: usize,

    /// Hash function: fnv1a, crc32, sdbm or sha256
    #[arg(short, long, default_value_t = HashAlgorithm::Fnv1a)]
    pub algorithm: HashAlgorithm,

    /// Previous hash recorded in the first block
    #[arg(long, default_value = "0")]
    pub genesis: String,

    /// Nonce every block starts mining from
    #[arg(long, default_value_t = 0)]
    pub start_nonce: u64,

    /// Give up on a block after this many hash evaluations
    #[arg(long)]
    pub max_attempts: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Default log filter for env_logger
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Checks the arguments and builds the mining settings
    pub fn chain_config(&self) -> Result<ChainConfig, ConfigError> {
        if self.length == 0 {
            return Err(ConfigError::EmptyChain);
        }
        if self.difficulty > MAX_DIFFICULTY {
            return Err(ConfigError::UnreachableDifficulty(self.difficulty));
        }
        if self.max_attempts == Some(0) {
            return Err(ConfigError::ZeroAttempts);
        }

        Ok(ChainConfig {
            difficulty: self.difficulty,
            algorithm: self.algorithm,
            genesis_previous_hash: self.genesis.clone(),
            starting_nonce: self.start_nonce,
            max_attempts: self.max_attempts,
        })
    }
}
