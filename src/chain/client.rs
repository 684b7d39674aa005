use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::chain::subscription::Subscription;
use crate::chain::types::{
    AccountId, AssetData, AssetId, Balance, BlockEvents, BlockNumber, ChainInfo, Header, Nonce,
    Price, SignedTransaction, TxHash, TxStatus,
};
use crate::utils::Result;

/// Trait describing what the load test needs from a node.
/// Implement this for a concrete node connection and hand it to the suite.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
    async fn chain_info(&self) -> Result<ChainInfo>;

    /// Submit a signed transaction; resolves once the pool accepted it.
    async fn submit(&self, tx: SignedTransaction) -> Result<TxHash>;

    /// Submit and stream its status updates.
    async fn submit_and_watch(&self, tx: SignedTransaction) -> Result<Subscription<TxStatus>>;

    /// Current best head first, then every new head.
    async fn subscribe_new_heads(&self) -> Result<Subscription<Header>>;

    /// Events of every new block.
    async fn subscribe_events(&self) -> Result<Subscription<BlockEvents>>;

    async fn best_block_number(&self) -> Result<BlockNumber>;

    async fn account_nonce(&self, who: &AccountId) -> Result<Nonce>;

    async fn sudo_key(&self) -> Result<AccountId>;

    async fn asset(&self, id: &AssetId) -> Result<Option<AssetData>>;

    async fn assets(&self) -> Result<Vec<(AssetId, AssetData)>>;

    async fn balance(&self, who: &AccountId, asset: &AssetId) -> Result<Balance>;

    async fn balances(&self, who: &AccountId) -> Result<BTreeMap<AssetId, Balance>>;

    async fn price(&self, asset: &AssetId) -> Result<Option<Price>>;

    async fn deposit_of(&self, who: &AccountId, asset: &AssetId) -> Result<Balance>;
}
