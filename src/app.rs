use anyhow::Context;
use log::{info, warn};

use std::io::Write;

use crate::blockchain::{Blockchain, ByNonce};
use crate::config::{Cli, OutputFormat};
use crate::report::{render_text, ChainReport};

/// Mines, validates and prints the chain described by the command line
///
/// # Arguments
///
/// * `cli` - Parsed command-line arguments
/// * `out` - Where the chain is printed
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> anyhow::Result<()> {
    let config = cli.chain_config()?;

    if cli.format == OutputFormat::Text {
        writeln!(
            out,
            "Mining {} blocks at difficulty level: {}",
            cli.length, config.difficulty
        )?;
    }
    info!(
        "Mining {} blocks with {} at difficulty {}",
        cli.length, config.algorithm, config.difficulty
    );

    let mut blockchain = Blockchain::new(config);
    blockchain
        .mine_blocks(cli.length)
        .context("Failed to mine blockchain")?;

    if let Some(ByNonce(hardest)) = blockchain.iter().map(ByNonce).max() {
        info!("Highest nonce: block {} at {}", hardest.id(), hardest.nonce());
    }

    match blockchain.validate() {
        Ok(()) => info!("Chain of {} blocks is valid", blockchain.len()),
        Err(err) => warn!("Chain is invalid: {}", err),
    }

    match cli.format {
        OutputFormat::Text => write!(out, "{}", render_text(&blockchain))?,
        OutputFormat::Json => {
            let json = ChainReport::new(&blockchain)
                .to_json()
                .context("Failed to serialize chain report")?;
            writeln!(out, "{}", json)?;
        }
    }

    Ok(())
}
