//! Node adapter surface: the `ChainClient` trait, chain types and subscriptions.

pub mod types;
pub mod client;
pub mod subscription;

pub use client::ChainClient;
pub use subscription::{subscription, Subscription, SubscriptionSink};
pub use types::{
    AccountId, AssetData, AssetId, Balance, BlockEvents, BlockNumber, Call, ChainEvent, ChainInfo,
    DispatchError, EventKind, Header, Nonce, Price, SignedTransaction, TxHash, TxStatus,
    PRICE_PRECISION,
};
