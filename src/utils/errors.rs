use serde::Serialize;
use thiserror::Error;

use crate::chain::types::{AccountId, AssetId, Balance, BlockNumber, DispatchError, Price, TxHash};

/// Diagnostic context of a failed balance reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceMismatch {
    #[serde(serialize_with = "as_string")]
    pub account: AccountId,
    pub asset: AssetId,
    #[serde(serialize_with = "as_string")]
    pub predicted: Balance,
    #[serde(serialize_with = "as_string")]
    pub delta: Balance,
    #[serde(serialize_with = "as_string")]
    pub actual: Balance,
}

fn as_string<T: std::fmt::Display, S: serde::Serializer>(v: &T, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&v.to_string())
}

impl std::fmt::Display for BalanceMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(
                f,
                "{} {} predicted={} delta={} actual={}",
                self.account, self.asset, self.predicted, self.delta, self.actual
            ),
        }
    }
}

/// Unified error type for the load test
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("nonce is not initialized for account {0}")]
    NonceUninitialized(AccountId),

    #[error("invalid transaction {hash}: {reason}")]
    InvalidTransaction { hash: TxHash, reason: String },

    #[error("dispatch error: {0}")]
    Dispatch(DispatchError),

    #[error("sudo wrapped call failed: {0}")]
    WrappedCall(DispatchError),

    #[error("watch for transaction {0} closed before inclusion")]
    WatchClosed(TxHash),

    #[error("chain error: {0}")]
    Chain(String),

    #[error("balance mismatch: {0}")]
    BalanceMismatch(Box<BalanceMismatch>),

    #[error("price for {asset} should change (still {price}) at block {block}")]
    PriceNotChanged { asset: AssetId, price: Price, block: BlockNumber },

    #[error("no known price for {0}")]
    UnknownPrice(AssetId),

    #[error("price listener stopped")]
    PriceListenerStopped,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("key error: {0}")]
    Key(String),

    #[error("keyring has no sudo key")]
    MissingSudoKey,

    #[error("*** Test case failed for N={clients}, M={assets} ***")]
    ScenarioFailed { clients: usize, assets: usize },
}

/// Convenience alias
pub type Result<T> = std::result::Result<T, LoadError>;
