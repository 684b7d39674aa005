use crate::chain::types::{AssetId, Call, Price};
use crate::chain::ChainClient;
use crate::crypto::Keyring;
use crate::ledger::LedgerOps;
use crate::tx::TxOutcome;
use crate::utils::Result;

impl<C: ChainClient> LedgerOps<C> {
    pub async fn force_set_price(&self, keyring: &Keyring, asset: &AssetId, price: Price) -> Result<TxOutcome> {
        self.root(keyring, Call::ForceSetPrice { asset: asset.clone(), price }).await
    }

    pub async fn price(&self, asset: &AssetId) -> Result<Option<Price>> {
        self.client().price(asset).await
    }
}

#[cfg(test)]
mod tests {
    use crate::chain::types::{AssetId, DispatchError, PRICE_PRECISION};
    use crate::ledger::testing::harness;
    use crate::node::{MAIN_ASSET, STABLE_ASSET};
    use crate::utils::LoadError;

    #[tokio::test]
    async fn test_force_set_price() {
        let h = harness().await;
        let coin = AssetId::new(MAIN_ASSET);
        h.ops.force_set_price(&h.keyring, &coin, 3 * PRICE_PRECISION / 2).await.unwrap();
        assert_eq!(h.ops.price(&coin).await.unwrap(), Some(3 * PRICE_PRECISION / 2));

        let usd = AssetId::new(STABLE_ASSET);
        assert_eq!(h.ops.price(&usd).await.unwrap(), Some(PRICE_PRECISION));
        let err = h.ops.force_set_price(&h.keyring, &usd, 2 * PRICE_PRECISION).await.unwrap_err();
        assert!(matches!(err, LoadError::WrappedCall(DispatchError::Module { ref error, .. }) if error == "SetPriceForStableAsset"));

        let err = h.ops.force_set_price(&h.keyring, &coin, 0).await.unwrap_err();
        assert!(matches!(err, LoadError::WrappedCall(DispatchError::Module { ref error, .. }) if error == "SetZeroPrice"));
        h.svc.shutdown().await.unwrap();
    }
}
