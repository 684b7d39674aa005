//! distload: scripted load and consistency test for a multi-asset
//! distribution chain, plus the in-process dev node it runs against.

pub mod utils;
pub mod crypto;
pub mod chain;
pub mod state;
pub mod tx;
pub mod sync;
pub mod ledger;
pub mod suite;
pub mod runtime;
pub mod txpool;
pub mod node;

#[cfg(test)]
mod tests;

pub use utils::{LoadError, Result};
