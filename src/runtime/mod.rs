//! Runtime module: the simulated chain behind the dev node.
//!
//! Exposes:
//! - Executor: validates transactions and executes blocks.
//! - ChainState: storage plus the assets/balances/distribution/oracle/sudo handlers.
//! - runtime_types: genesis config, module accounts, receipts.

pub mod executor;
pub mod pallets;
pub mod runtime_types;

pub use executor::{ChainState, Executor};
pub use pallets::Origin;
pub use runtime_types::{
    distribution_account, treasury_account, BlockOutcome, InvalidTransaction, Receipt, RuntimeConfig,
    Validity, MAIN_ASSET, ONE_TOKEN, STABLE_ASSET,
};
