//! Hash-chained ledger of proof-of-work blocks
//!
//! Blocks are sealed with one of several interchangeable 32-bit hash
//! functions and linked by their predecessor's hash.

pub mod app;
pub mod blockchain;
pub mod config;
pub mod report;
