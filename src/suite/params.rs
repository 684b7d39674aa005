use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

use crate::chain::types::Balance;
use crate::runtime::{MAIN_ASSET, ONE_TOKEN, STABLE_ASSET};

/// Scenario size: N clients, M created assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestParams {
    pub clients: usize,
    pub assets: usize,
}

/// Scenario constants. Every field has a default so a config file may set any subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    pub iterations: u32,
    /// Accounts funded concurrently.
    pub mint_chunk: usize,
    /// Deposits or withdrawals in flight at once.
    pub op_chunk: usize,
    /// Reconciliation tolerance in raw units.
    #[serde(deserialize_with = "balance_from_int_or_str")]
    pub eps: Balance,
    /// Soft cap per block while issuing.
    pub block_timeout_ms: u64,
    pub issue_wait_blocks: u32,
    /// Deposits are drawn from `1..max_deposit`.
    #[serde(deserialize_with = "balance_from_int_or_str")]
    pub max_deposit: Balance,
    #[serde(deserialize_with = "balance_from_int_or_str")]
    pub issue_min: Balance,
    #[serde(deserialize_with = "balance_from_int_or_str")]
    pub issue_span: Balance,
    #[serde(deserialize_with = "balance_from_int_or_str")]
    pub initial_mint: Balance,
    pub decimals: u8,
    pub client_step: usize,
    /// Stop `loop` after this many scenarios; unbounded when absent.
    pub max_runs: Option<u32>,
    pub main_asset: String,
    pub stable_asset: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BalanceRepr {
    Int(u64),
    Text(String),
}

/// TOML integers stop at i64; larger balances are written as decimal strings.
fn balance_from_int_or_str<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Balance, D::Error> {
    match BalanceRepr::deserialize(d)? {
        BalanceRepr::Int(v) => Ok(v.into()),
        BalanceRepr::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            iterations: 5,
            mint_chunk: 100,
            op_chunk: 2000,
            eps: 100,
            block_timeout_ms: 2050,
            issue_wait_blocks: 3,
            max_deposit: ONE_TOKEN,
            issue_min: 5 * ONE_TOKEN,
            issue_span: 5 * ONE_TOKEN,
            initial_mint: 10 * ONE_TOKEN,
            decimals: 12,
            client_step: 10,
            max_runs: None,
            main_asset: MAIN_ASSET.to_string(),
            stable_asset: STABLE_ASSET.to_string(),
        }
    }
}

impl SuiteConfig {
    pub fn block_timeout(&self) -> Duration {
        Duration::from_millis(self.block_timeout_ms)
    }
}
