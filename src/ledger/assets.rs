use crate::chain::types::{AssetData, AssetId, Call};
use crate::chain::ChainClient;
use crate::crypto::Keyring;
use crate::ledger::LedgerOps;
use crate::tx::TxOutcome;
use crate::utils::Result;

impl<C: ChainClient> LedgerOps<C> {
    pub async fn create_asset(&self, keyring: &Keyring, id: &AssetId, data: AssetData) -> Result<TxOutcome> {
        self.root(keyring, Call::CreateAsset { id: id.clone(), data }).await
    }

    pub async fn remove_asset(&self, keyring: &Keyring, id: &AssetId) -> Result<TxOutcome> {
        self.root(keyring, Call::RemoveAsset { id: id.clone() }).await
    }

    pub async fn asset(&self, id: &AssetId) -> Result<Option<AssetData>> {
        self.client().asset(id).await
    }

    pub async fn assets(&self) -> Result<Vec<(AssetId, AssetData)>> {
        self.client().assets().await
    }
}
