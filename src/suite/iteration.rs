use futures::future::{try_join, try_join_all};
use rand::Rng;
use std::collections::BTreeMap;
use tracing::info;

use crate::chain::types::{AccountId, AssetId, Balance};
use crate::chain::ChainClient;
use crate::crypto::Keypair;
use crate::suite::{Deltas, IterationOutcome, Scenario, TestSuite};
use crate::sync::IterationHealth;
use crate::utils::{multiply_by_rational, LoadError, Result};

impl<C: ChainClient> TestSuite<C> {
    /// One deposit / issue / withdraw cycle. Returns the predicted balance
    /// change of every (account, asset) pair and whether every issue block
    /// arrived in time.
    pub async fn iteration(&self, scenario: &Scenario) -> Result<IterationOutcome> {
        let cfg = &self.config;
        let deposits: Vec<(&Keypair, &AssetId, Balance)> = {
            let mut rng = rand::thread_rng();
            scenario
                .accounts
                .iter()
                .flat_map(|acc| scenario.assets.iter().map(move |asset| (acc, asset)))
                .map(|(acc, asset)| (acc, asset, rng.gen_range(1..cfg.max_deposit.max(2))))
                .collect()
        };

        let mut per_account: BTreeMap<AccountId, Vec<(&AssetId, Balance)>> = BTreeMap::new();
        let mut totals: BTreeMap<&AssetId, Balance> = BTreeMap::new();
        for (acc, asset, amount) in &deposits {
            per_account.entry(acc.account_id()).or_default().push((*asset, *amount));
            let total = totals.entry(*asset).or_insert(0);
            *total = total.checked_add(*amount).ok_or(LoadError::Overflow)?;
        }

        info!("Deposit to distribution");
        for chunk in deposits.chunks(cfg.op_chunk.max(1)) {
            try_join_all(chunk.iter().map(|(acc, asset, amount)| self.ops.deposit(acc, asset, *amount))).await?;
        }

        let to_issue: Vec<(&AssetId, Balance)> = {
            let mut rng = rand::thread_rng();
            scenario
                .assets
                .iter()
                .map(|asset| (asset, cfg.issue_min + rng.gen_range(0..cfg.issue_span.max(1))))
                .collect()
        };

        self.prices.next_update().await?;

        let health = IterationHealth::new();
        let issue_in_stable = self.prices.convert_to_stable(to_issue.iter().copied())?;
        info!("Issue {} ${}", issue_in_stable, cfg.stable_asset);
        let wait = self.blocks.strict_wait_blocks(cfg.issue_wait_blocks, cfg.block_timeout(), &health);
        let issues = try_join_all(
            to_issue.iter().map(|(asset, amount)| self.ops.issue_sudo(&self.keyring, asset, *amount)),
        );
        try_join(wait, issues).await?;

        let total_in_stable = self.prices.convert_to_stable(totals.iter().map(|(asset, v)| (*asset, *v)))?;
        let shares = per_account
            .iter()
            .map(|(who, entries)| -> Result<(AccountId, Balance)> {
                Ok((*who, self.prices.convert_to_stable(entries.iter().copied())?))
            })
            .collect::<Result<Vec<_>>>()?;

        self.prices.next_update().await?;

        info!("Withdraw from distribution");
        for chunk in deposits.chunks(cfg.op_chunk.max(1)) {
            try_join_all(chunk.iter().map(|(acc, asset, _)| self.ops.withdraw(acc, asset))).await?;
        }
        info!("Iteration complete");

        let deltas = predict_deltas(&to_issue, &shares, total_in_stable)?;
        Ok(IterationOutcome { deltas, good: health.is_good() })
    }
}

/// Split each issued amount across accounts proportionally to their deposit
/// value in stable units, truncating every share.
pub fn predict_deltas(
    issued: &[(&AssetId, Balance)],
    shares: &[(AccountId, Balance)],
    total_in_stable: Balance,
) -> Result<Deltas> {
    let mut deltas = Deltas::new();
    for (asset, amount) in issued {
        for (who, in_stable) in shares {
            let delta = multiply_by_rational(*amount, *in_stable, total_in_stable).ok_or(LoadError::Overflow)?;
            deltas.insert((*who, (*asset).clone()), delta);
        }
    }
    Ok(deltas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_deltas_truncates_shares() {
        let a = AccountId([1; 32]);
        let b = AccountId([2; 32]);
        let x = AssetId::new("A");
        let deltas = predict_deltas(&[(&x, 10)], &[(a, 1), (b, 2)], 3).unwrap();
        assert_eq!(deltas[&(a, x.clone())], 3);
        assert_eq!(deltas[&(b, x)], 6);
    }

    #[test]
    fn test_predict_deltas_zero_total() {
        let x = AssetId::new("A");
        assert!(predict_deltas(&[(&x, 10)], &[], 0).unwrap().is_empty());
        assert!(matches!(
            predict_deltas(&[(&x, 10)], &[(AccountId([1; 32]), 0)], 0),
            Err(LoadError::Overflow)
        ));
    }
}
