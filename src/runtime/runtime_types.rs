//! Common runtime types: genesis config, module accounts, receipts, validity.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chain::types::{AccountId, AssetId, Balance, BlockNumber, ChainEvent, DispatchError, TxHash};

pub const MAIN_ASSET: &str = "coin";
pub const STABLE_ASSET: &str = "usd";

/// One whole token of a 12-decimal asset.
pub const ONE_TOKEN: Balance = 1_000_000_000_000;

pub type DispatchResult<T = ()> = std::result::Result<T, DispatchError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Fee asset.
    pub main_asset: AssetId,
    /// Unit of account, always priced at exactly 1.0.
    pub stable_asset: AssetId,
    pub decimals: u8,
    /// Treasury balance seeded for every new asset.
    pub initial_issuance: Balance,
    /// Main-asset funds minted to the sudo account at genesis.
    pub sudo_endowment: Balance,
    /// Oracle refresh interval in blocks; 0 disables it.
    pub price_period: BlockNumber,
    pub fee: Balance,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            main_asset: AssetId::new(MAIN_ASSET),
            stable_asset: AssetId::new(STABLE_ASSET),
            decimals: 12,
            initial_issuance: 1_000_000_000 * 1_000_000 * ONE_TOKEN,
            sudo_endowment: 1_000_000_000 * ONE_TOKEN,
            price_period: 5,
            fee: 1_000_000,
        }
    }
}

pub(crate) fn module_account(tag: &[u8]) -> AccountId {
    AccountId(*blake3::hash(tag).as_bytes())
}

pub fn treasury_account() -> AccountId {
    module_account(b"modlpy/trsry")
}

pub fn distribution_account() -> AccountId {
    module_account(b"modlpy/dstrb")
}

/// Why a transaction cannot be included at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTransaction {
    #[error("BadProof")]
    BadProof,
    #[error("Stale")]
    Stale,
    #[error("Payment")]
    Payment,
}

/// Pool placement of a valid transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Ready,
    Future,
}

/// Result of one included extrinsic.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub hash: TxHash,
    pub events: Vec<ChainEvent>,
    pub dispatch_error: Option<DispatchError>,
}

#[derive(Debug, Clone, Default)]
pub struct BlockOutcome {
    pub number: BlockNumber,
    pub receipts: Vec<Receipt>,
    pub rejected: Vec<(TxHash, InvalidTransaction)>,
    /// Every event of the block in emission order.
    pub events: Vec<ChainEvent>,
}
