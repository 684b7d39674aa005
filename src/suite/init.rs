use futures::future::{try_join, try_join_all};
use std::collections::BTreeMap;
use tracing::info;

use crate::chain::types::{AssetData, AssetId};
use crate::chain::ChainClient;
use crate::crypto::Keypair;
use crate::suite::naming::gen_asset_id;
use crate::suite::{Scenario, TestParams, TestSuite};
use crate::utils::{LoadError, Result};

impl<C: ChainClient> TestSuite<C> {
    /// Create the M assets, N fresh accounts, fund them and snapshot their balances.
    pub async fn init(&self, params: TestParams) -> Result<Scenario> {
        let sudo = self.keyring.sudo()?.account_id();
        let nonce = self.ops.client().account_nonce(&sudo).await?;
        self.ops.submitter().nonces().init_nonce(sudo, nonce);

        info!("Creating assets");
        let data = AssetData { decimals: self.config.decimals };
        let assets = try_join_all((0..params.assets).map(|idx| async move {
            let asset = AssetId::new(gen_asset_id(idx));
            if self.ops.asset(&asset).await?.is_none() {
                self.ops.create_asset(&self.keyring, &asset, data).await?;
            }
            Ok::<_, LoadError>(asset)
        }))
        .await?;

        let accounts = (0..params.clients)
            .map(|idx| self.keyring.create_pair(&format!("#{idx}")))
            .collect::<Result<Vec<_>>>()?;

        info!("Minting to accounts");
        for chunk in accounts.chunks(self.config.mint_chunk.max(1)) {
            try_join_all(chunk.iter().map(|acc| self.fund(acc, &assets))).await?;
        }

        let mut balances = BTreeMap::new();
        for acc in &accounts {
            let who = acc.account_id();
            for asset in &assets {
                balances.insert((who, asset.clone()), self.ops.balance(&who, asset).await?);
            }
        }
        info!(clients = accounts.len(), assets = assets.len(), "scenario initialized");
        Ok(Scenario { accounts, assets, balances })
    }

    /// Mint the fee asset, the stable asset and every created asset to `acc`
    /// while reading its on-chain nonce.
    async fn fund(&self, acc: &Keypair, assets: &[AssetId]) -> Result<()> {
        let who = acc.account_id();
        let main = AssetId::new(self.config.main_asset.as_str());
        let stable = AssetId::new(self.config.stable_asset.as_str());
        let amount = self.config.initial_mint;
        let targets: Vec<&AssetId> = [&main, &stable].into_iter().chain(assets).collect();

        let mints = try_join_all(targets.into_iter().map(|asset| self.ops.mint(&self.keyring, &who, asset, amount)));
        let (nonce, _) = try_join(self.ops.client().account_nonce(&who), mints).await?;
        self.ops.submitter().nonces().init_nonce(who, nonce);
        Ok(())
    }
}
