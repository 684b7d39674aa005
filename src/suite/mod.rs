//! Scenario orchestration.
//!
//! A scenario creates M assets and N accounts, runs a fixed number of
//! deposit / issue / withdraw iterations, reconciles balances after each one
//! and tears everything down. The loop repeats scenarios with a growing
//! client count.

pub mod check;
pub mod finish;
pub mod init;
pub mod iteration;
pub mod naming;
pub mod params;

pub use check::reconcile;
pub use iteration::predict_deltas;
pub use naming::gen_asset_id;
pub use params::{SuiteConfig, TestParams};

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::chain::types::{AccountId, AssetId, Balance};
use crate::chain::ChainClient;
use crate::crypto::{Keypair, Keyring};
use crate::ledger::LedgerOps;
use crate::state::NonceSequencer;
use crate::sync::{BlockWaiter, PriceSynchronizer};
use crate::tx::TransactionSubmitter;
use crate::utils::{LoadError, Result, METRICS};

/// Per (account, asset) amounts.
pub type Deltas = BTreeMap<(AccountId, AssetId), Balance>;

/// Live state of one scenario.
pub struct Scenario {
    pub accounts: Vec<Keypair>,
    pub assets: Vec<AssetId>,
    /// Last verified on-chain balance of every (account, created asset) pair.
    pub balances: Deltas,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationOutcome {
    pub deltas: Deltas,
    /// False when an issue block overran its soft deadline.
    pub good: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    PartialSuccess { goods: u32, bads: u32 },
    PartialFailure { goods: u32, bads: u32 },
}

/// Classify a scenario by its good and degraded iteration counts.
/// `None` means every iteration was degraded.
pub fn classify(goods: u32, bads: u32) -> Option<Verdict> {
    if bads == 0 {
        Some(Verdict::Success)
    } else if goods == 0 {
        None
    } else if goods > bads {
        Some(Verdict::PartialSuccess { goods, bads })
    } else {
        Some(Verdict::PartialFailure { goods, bads })
    }
}

pub struct TestSuite<C: ChainClient> {
    ops: LedgerOps<C>,
    keyring: Arc<Keyring>,
    blocks: BlockWaiter<C>,
    prices: PriceSynchronizer,
    config: SuiteConfig,
}

impl<C: ChainClient> TestSuite<C> {
    pub fn new(client: Arc<C>, keyring: Arc<Keyring>, prices: PriceSynchronizer, config: SuiteConfig) -> Self {
        let submitter = TransactionSubmitter::new(client.clone(), NonceSequencer::new());
        Self { ops: LedgerOps::new(submitter), keyring, blocks: BlockWaiter::new(client), prices, config }
    }

    pub fn ops(&self) -> &LedgerOps<C> {
        &self.ops
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Run one scenario end to end.
    pub async fn suite(&self, params: TestParams) -> Result<Verdict> {
        let mut scenario = self.init(params).await?;
        let (mut goods, mut bads) = (0u32, 0u32);
        for it in 1..=self.config.iterations {
            info!("Iteration {}", it);
            let outcome = self.iteration(&scenario).await?;
            if outcome.good {
                info!("Iteration {} finished successfully", it);
                goods += 1;
            } else {
                error!("Iteration {} failed", it);
                bads += 1;
            }
            self.check(&mut scenario, &outcome.deltas).await?;
        }
        self.finish(&scenario).await?;

        let (n, m) = (params.clients, params.assets);
        let Some(verdict) = classify(goods, bads) else {
            error!("*** Test case failed for N={}, M={} ***", n, m);
            return Err(LoadError::ScenarioFailed { clients: n, assets: m });
        };
        match verdict {
            Verdict::Success => info!("*** Test case passed for N={}, M={} ***", n, m),
            Verdict::PartialSuccess { goods, bads } => {
                warn!("*** Test case partially passed for N={}, M={}: {} good, {} bad ***", n, m, goods, bads)
            }
            Verdict::PartialFailure { goods, bads } => {
                warn!("*** Test case partially failed for N={}, M={}: {} good, {} bad ***", n, m, goods, bads)
            }
        }
        Ok(verdict)
    }

    /// Run scenarios forever, or `max_runs` times, growing N by `client_step`.
    pub async fn run_loop(&self, mut params: TestParams) -> Result<Vec<Verdict>> {
        let mut verdicts = Vec::new();
        loop {
            info!("*** Test case is starting for N={}, M={} ***", params.clients, params.assets);
            let verdict = self.suite(params).await?;
            verdicts.push(verdict);
            info!(metrics = ?METRICS.snapshot(), "scenario finished");

            if let Some(max) = self.config.max_runs {
                if verdicts.len() >= max as usize {
                    return Ok(verdicts);
                }
            }
            params.clients += self.config.client_step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(5, 0), Some(Verdict::Success));
        assert_eq!(classify(0, 0), Some(Verdict::Success));
        assert_eq!(classify(3, 2), Some(Verdict::PartialSuccess { goods: 3, bads: 2 }));
        assert_eq!(classify(2, 2), Some(Verdict::PartialFailure { goods: 2, bads: 2 }));
        assert_eq!(classify(0, 5), None);
    }
}
