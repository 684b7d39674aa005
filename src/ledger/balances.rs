use std::collections::BTreeMap;

use crate::chain::types::{AccountId, AssetId, Balance, Call};
use crate::chain::ChainClient;
use crate::crypto::{Keypair, Keyring};
use crate::ledger::LedgerOps;
use crate::tx::TxOutcome;
use crate::utils::Result;

impl<C: ChainClient> LedgerOps<C> {
    /// Root mint out of the treasury.
    pub async fn mint(&self, keyring: &Keyring, who: &AccountId, asset: &AssetId, amount: Balance) -> Result<TxOutcome> {
        self.root(keyring, Call::Mint { who: *who, asset: asset.clone(), amount }).await
    }

    /// Root burn back into the treasury.
    pub async fn burn(&self, keyring: &Keyring, who: &AccountId, asset: &AssetId, amount: Balance) -> Result<TxOutcome> {
        self.root(keyring, Call::Burn { who: *who, asset: asset.clone(), amount }).await
    }

    pub async fn transfer(&self, from: &Keypair, to: &AccountId, asset: &AssetId, amount: Balance) -> Result<TxOutcome> {
        self.signed(from, Call::Transfer { to: *to, asset: asset.clone(), amount }).await
    }

    pub async fn balance(&self, who: &AccountId, asset: &AssetId) -> Result<Balance> {
        self.client().balance(who, asset).await
    }

    pub async fn balances(&self, who: &AccountId) -> Result<BTreeMap<AssetId, Balance>> {
        self.client().balances(who).await
    }
}

#[cfg(test)]
mod tests {
    use crate::chain::types::{AssetId, DispatchError};
    use crate::crypto::Keypair;
    use crate::ledger::testing::{funded_account, harness};
    use crate::node::STABLE_ASSET;
    use crate::utils::LoadError;

    #[tokio::test]
    async fn test_mint_transfer_burn() {
        let h = harness().await;
        let usd = AssetId::new(STABLE_ASSET);
        let alice = funded_account(&h).await;
        let bob = Keypair::generate().unwrap().account_id();

        h.ops.mint(&h.keyring, &alice.account_id(), &usd, 1_000).await.unwrap();
        h.ops.transfer(&alice, &bob, &usd, 400).await.unwrap();
        assert_eq!(h.ops.balance(&alice.account_id(), &usd).await.unwrap(), 600);
        assert_eq!(h.ops.balance(&bob, &usd).await.unwrap(), 400);

        h.ops.burn(&h.keyring, &bob, &usd, 400).await.unwrap();
        assert_eq!(h.ops.balance(&bob, &usd).await.unwrap(), 0);
        assert_eq!(h.ops.balances(&alice.account_id()).await.unwrap().get(&usd), Some(&600));
        h.svc.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_overdraft_is_debt() {
        let h = harness().await;
        let usd = AssetId::new(STABLE_ASSET);
        let alice = funded_account(&h).await;
        let err = h.ops.transfer(&alice, &alice.account_id(), &usd, 1).await.unwrap_err();
        assert!(matches!(err, LoadError::Dispatch(DispatchError::Module { ref error, .. }) if error == "Debt"));
        h.svc.shutdown().await.unwrap();
    }
}
