use futures::future::try_join_all;
use tracing::info;

use crate::chain::ChainClient;
use crate::suite::{Scenario, TestSuite};
use crate::utils::Result;

impl<C: ChainClient> TestSuite<C> {
    /// Burn every non-zero mirrored balance, then remove the created assets.
    pub async fn finish(&self, scenario: &Scenario) -> Result<()> {
        info!("Burning balances");
        try_join_all(
            scenario
                .balances
                .iter()
                .filter(|(_, amount)| **amount > 0)
                .map(|((who, asset), amount)| self.ops.burn(&self.keyring, who, asset, *amount)),
        )
        .await?;

        info!("Removing assets");
        try_join_all(scenario.assets.iter().map(|asset| self.ops.remove_asset(&self.keyring, asset))).await?;
        Ok(())
    }
}
