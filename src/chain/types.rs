//! Chain-side data model shared by the load-test core and any node adapter.
//!
//! Amounts are raw integers in the asset's smallest denomination. Prices are
//! fixed point with `PRICE_PRECISION` representing 1.0; the stable asset is
//! always priced at exactly `PRICE_PRECISION`.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type Balance = u128;
pub type Price = u128;
pub type BlockNumber = u64;
pub type Nonce = u64;

/// 1.0 in fixed-point price units.
pub const PRICE_PRECISION: Price = 1_000_000_000_000_000_000;

/// Longest asset name the chain accepts.
pub const MAX_ASSET_ID_LEN: usize = 8;

/// 32-byte public key identifying an account.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}..", hex::encode(&self.0[..4]))
    }
}

/// Short textual asset identifier (`coin`, `usd`, `A`, `BK`, ...).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the chain would accept this name.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && self.0.len() <= MAX_ASSET_ID_LEN
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetData {
    pub decimals: u8,
}

/// blake3 hash of a signed payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub [u8; 32]);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}..", hex::encode(&self.0[..6]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub number: BlockNumber,
    pub hash: [u8; 32],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub chain: String,
    pub node_name: String,
    pub node_version: String,
}

/// Runtime calls the load test issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Call {
    CreateAsset { id: AssetId, data: AssetData },
    RemoveAsset { id: AssetId },
    Mint { who: AccountId, asset: AssetId, amount: Balance },
    Burn { who: AccountId, asset: AssetId, amount: Balance },
    Transfer { to: AccountId, asset: AssetId, amount: Balance },
    Deposit { asset: AssetId, amount: Balance },
    Withdraw { asset: AssetId },
    Issue { asset: AssetId, amount: Balance },
    ForceSetPrice { asset: AssetId, price: Price },
    /// Dispatch the inner call as root.
    Sudo(Box<Call>),
}

impl Call {
    pub fn sudo(self) -> Self {
        Call::Sudo(Box::new(self))
    }

    pub fn is_sudo(&self) -> bool {
        matches!(self, Call::Sudo(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub signer: AccountId,
    pub nonce: Nonce,
    pub tip: Balance,
    pub call: Call,
    #[serde(with = "signature_bytes")]
    pub signature: [u8; 64],
}

mod signature_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(sig: &[u8; 64], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bytes(sig)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 64], D::Error> {
        let v: Vec<u8> = Vec::deserialize(d)?;
        v.try_into()
            .map_err(|_| serde::de::Error::custom("signature must be 64 bytes"))
    }
}

impl SignedTransaction {
    /// Bytes covered by the signature.
    pub fn signing_payload(
        signer: &AccountId,
        nonce: Nonce,
        tip: Balance,
        call: &Call,
    ) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(&(signer, nonce, tip, call))
    }

    pub fn payload(&self) -> Result<Vec<u8>, bincode::Error> {
        Self::signing_payload(&self.signer, self.nonce, self.tip, &self.call)
    }

    pub fn hash(&self) -> TxHash {
        let mut h = blake3::Hasher::new();
        h.update(self.signer.as_bytes());
        h.update(&self.nonce.to_le_bytes());
        h.update(&self.signature);
        TxHash(*h.finalize().as_bytes())
    }
}

/// Why a dispatch failed, as reported by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchError {
    BadOrigin,
    Module { pallet: String, error: String },
    Other(String),
}

impl DispatchError {
    pub fn module(pallet: &str, error: &str) -> Self {
        DispatchError::Module { pallet: pallet.into(), error: error.into() }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::BadOrigin => f.write_str("BadOrigin"),
            DispatchError::Module { pallet, error } => write!(f, "{}.{}", pallet, error),
            DispatchError::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ExtrinsicSuccess,
    ExtrinsicFailed,
    Sudid,
    AssetCreated,
    AssetRemoved,
    Minted,
    Burnt,
    Transfer,
    NewDeposit,
    Withdraw,
    Issued,
    Redistributed,
    UpdatePrice,
    TransactionPayment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainEvent {
    ExtrinsicSuccess,
    ExtrinsicFailed(DispatchError),
    Sudid(Result<(), DispatchError>),
    AssetCreated { id: AssetId, data: AssetData },
    AssetRemoved { id: AssetId, data: AssetData },
    Minted { who: AccountId, asset: AssetId, amount: Balance },
    Burnt { who: AccountId, asset: AssetId, amount: Balance },
    Transfer { from: AccountId, to: AccountId, asset: AssetId, amount: Balance },
    NewDeposit { who: AccountId, asset: AssetId, amount: Balance, total: Balance },
    Withdraw { who: AccountId, asset: AssetId, amount: Balance },
    Issued { asset: AssetId, amount: Balance },
    Redistributed { who: AccountId, asset: AssetId, amount: Balance },
    UpdatePrice { asset: AssetId, price: Price },
    TransactionPayment { who: AccountId, fee: Balance, tip: Balance },
}

impl ChainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ChainEvent::ExtrinsicSuccess => EventKind::ExtrinsicSuccess,
            ChainEvent::ExtrinsicFailed(_) => EventKind::ExtrinsicFailed,
            ChainEvent::Sudid(_) => EventKind::Sudid,
            ChainEvent::AssetCreated { .. } => EventKind::AssetCreated,
            ChainEvent::AssetRemoved { .. } => EventKind::AssetRemoved,
            ChainEvent::Minted { .. } => EventKind::Minted,
            ChainEvent::Burnt { .. } => EventKind::Burnt,
            ChainEvent::Transfer { .. } => EventKind::Transfer,
            ChainEvent::NewDeposit { .. } => EventKind::NewDeposit,
            ChainEvent::Withdraw { .. } => EventKind::Withdraw,
            ChainEvent::Issued { .. } => EventKind::Issued,
            ChainEvent::Redistributed { .. } => EventKind::Redistributed,
            ChainEvent::UpdatePrice { .. } => EventKind::UpdatePrice,
            ChainEvent::TransactionPayment { .. } => EventKind::TransactionPayment,
        }
    }
}

/// All events emitted while building one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEvents {
    pub number: BlockNumber,
    pub events: Vec<ChainEvent>,
}

impl BlockEvents {
    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &ChainEvent> {
        self.events.iter().filter(move |e| e.kind() == kind)
    }
}

/// Lifecycle of a watched transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    Ready,
    Future,
    InBlock {
        block: BlockNumber,
        events: Vec<ChainEvent>,
        dispatch_error: Option<DispatchError>,
    },
    Invalid(String),
    Dropped(String),
}
