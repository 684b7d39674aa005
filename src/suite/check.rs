use std::collections::BTreeMap;
use tracing::info;

use crate::chain::types::{AccountId, AssetId, Balance};
use crate::chain::ChainClient;
use crate::suite::{Deltas, Scenario, TestSuite};
use crate::utils::{BalanceMismatch, LoadError, Result};

impl<C: ChainClient> TestSuite<C> {
    /// Compare every on-chain balance with `mirror + delta`, then adopt the
    /// observed balances as the new mirror.
    pub async fn check(&self, scenario: &mut Scenario, deltas: &Deltas) -> Result<()> {
        info!("Start checking balances");
        let mut observed = BTreeMap::new();
        for acc in &scenario.accounts {
            let who = acc.account_id();
            for asset in &scenario.assets {
                let key = (who, asset.clone());
                let actual = self.ops.balance(&who, asset).await?;
                let predicted = scenario.balances.get(&key).copied().unwrap_or(0);
                let delta = deltas.get(&key).copied().unwrap_or(0);
                reconcile(who, asset, predicted, delta, actual, self.config.eps)?;
                observed.insert(key, actual);
            }
        }
        scenario.balances = observed;
        info!("Balances are checked");
        Ok(())
    }
}

/// Accept `actual` when it is within `eps` of `predicted + delta`.
pub fn reconcile(
    account: AccountId,
    asset: &AssetId,
    predicted: Balance,
    delta: Balance,
    actual: Balance,
    eps: Balance,
) -> Result<()> {
    let expected = predicted.checked_add(delta).ok_or(LoadError::Overflow)?;
    if expected.abs_diff(actual) < eps {
        return Ok(());
    }
    Err(LoadError::BalanceMismatch(Box::new(BalanceMismatch {
        account,
        asset: asset.clone(),
        predicted,
        delta,
        actual,
    })))
}
