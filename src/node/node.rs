//! In-process development node.
//!
//! Wires the runtime executor, the transaction pool and the push
//! subscriptions behind the `ChainClient` trait. Blocks are sealed either by
//! the authoring task started with `start()` or on demand via `produce_block()`.
//! Subscribers are notified while the chain lock is held, so a subscription
//! opened between two blocks never misses or reorders a head.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::chain::subscription::{subscription, Subscription, SubscriptionSink};
use crate::chain::types::{
    AccountId, AssetData, AssetId, Balance, BlockEvents, BlockNumber, ChainInfo, Header, Nonce, Price,
    SignedTransaction, TxHash, TxStatus,
};
use crate::chain::ChainClient;
use crate::crypto::{Keypair, DEFAULT_SUDO_SEED};
use crate::node::service_handle::ServiceHandle;
use crate::runtime::{BlockOutcome, ChainState, Executor, InvalidTransaction, RuntimeConfig, Validity};
use crate::txpool::{TxPool, TxPoolError};
use crate::utils::{LoadError, Result};

pub const NODE_NAME: &str = "Hack-a-node";

#[derive(Debug, Clone)]
pub struct DevNodeConfig {
    /// Authoring interval; `None` seals blocks only through `produce_block`.
    pub block_time: Option<Duration>,
    pub price_period: BlockNumber,
    pub sudo_seed: String,
    pub max_pool_size: usize,
    pub runtime: RuntimeConfig,
}

impl Default for DevNodeConfig {
    fn default() -> Self {
        Self {
            block_time: None,
            price_period: 5,
            sudo_seed: DEFAULT_SUDO_SEED.to_string(),
            max_pool_size: 200_000,
            runtime: RuntimeConfig::default(),
        }
    }
}

struct Chain {
    executor: Executor,
    pool: TxPool,
    head: Header,
}

#[derive(Default)]
struct Sinks {
    heads: Vec<SubscriptionSink<Header>>,
    events: Vec<SubscriptionSink<BlockEvents>>,
    watchers: HashMap<TxHash, SubscriptionSink<TxStatus>>,
}

struct Inner {
    config: DevNodeConfig,
    sudo: Keypair,
    chain: Mutex<Chain>,
    sinks: Mutex<Sinks>,
}

#[derive(Clone)]
pub struct DevNode {
    inner: Arc<Inner>,
}

fn block_hash(number: BlockNumber, parent: &[u8; 32], outcome: &BlockOutcome) -> [u8; 32] {
    let mut h = blake3::Hasher::new();
    h.update(&number.to_le_bytes());
    h.update(parent);
    for receipt in &outcome.receipts {
        h.update(&receipt.hash.0);
    }
    *h.finalize().as_bytes()
}

impl DevNode {
    pub fn new(config: DevNodeConfig) -> Result<Self> {
        let sudo = Keypair::from_seed(&config.sudo_seed)?;
        let runtime = RuntimeConfig { price_period: config.price_period, ..config.runtime.clone() };
        let state = ChainState::genesis(runtime, sudo.account_id());
        let chain = Chain {
            executor: Executor::new(state),
            pool: TxPool::new(config.max_pool_size),
            head: Header { number: 0, hash: [0; 32] },
        };
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                sudo,
                chain: Mutex::new(chain),
                sinks: Mutex::new(Sinks::default()),
            }),
        })
    }

    pub fn config(&self) -> &DevNodeConfig {
        &self.inner.config
    }

    /// Key pair the node trusts as sudo.
    pub fn sudo_pair(&self) -> &Keypair {
        &self.inner.sudo
    }

    pub fn pool_len(&self) -> usize {
        self.inner.chain.lock().pool.len()
    }

    /// Open head and event subscriptions.
    pub fn active_subscriptions(&self) -> usize {
        let mut sinks = self.inner.sinks.lock();
        sinks.heads.retain_mut(|s| !s.is_closed());
        sinks.events.retain_mut(|s| !s.is_closed());
        sinks.heads.len() + sinks.events.len()
    }

    /// Open transaction watches.
    pub fn active_watchers(&self) -> usize {
        let mut sinks = self.inner.sinks.lock();
        sinks.watchers.retain(|_, s| !s.is_closed());
        sinks.watchers.len()
    }

    /// Spawn the authoring task when a block time is configured.
    pub fn start(&self) -> ServiceHandle {
        let mut svc = ServiceHandle::new();
        let Some(block_time) = self.inner.config.block_time else {
            info!(node = NODE_NAME, "dev node started in manual sealing mode");
            return svc;
        };

        let node = self.clone();
        let mut shutdown_rx = svc.shutdown_rx();
        let h: JoinHandle<anyhow::Result<()>> = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(block_time);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        node.produce_block();
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("block author observed shutdown");
            Ok(())
        });
        svc.attach("block-author", h);
        info!(node = NODE_NAME, ms = block_time.as_millis() as u64, "dev node started");
        svc
    }

    /// Seal one block with every ready transaction.
    pub fn produce_block(&self) -> Header {
        let mut chain = self.inner.chain.lock();
        let Chain { executor, pool, head } = &mut *chain;

        let txs = pool.take_ready(|who| executor.state.nonce(who));
        let outcome = executor.execute_block(txs);
        let pruned = pool.prune(|who| executor.state.nonce(who));
        *head = Header { number: outcome.number, hash: block_hash(outcome.number, &head.hash, &outcome) };
        debug!(
            block = outcome.number,
            included = outcome.receipts.len(),
            rejected = outcome.rejected.len(),
            "sealed block"
        );

        let header = *head;
        self.notify(header, outcome, pruned);
        header
    }

    fn notify(&self, header: Header, outcome: BlockOutcome, pruned: Vec<TxHash>) {
        let mut sinks = self.inner.sinks.lock();
        for receipt in outcome.receipts {
            if let Some(mut sink) = sinks.watchers.remove(&receipt.hash) {
                sink.send(TxStatus::InBlock {
                    block: header.number,
                    events: receipt.events,
                    dispatch_error: receipt.dispatch_error,
                });
            }
        }
        for (hash, reason) in outcome.rejected {
            if let Some(mut sink) = sinks.watchers.remove(&hash) {
                sink.send(TxStatus::Invalid(reason.to_string()));
            }
        }
        for hash in pruned {
            if let Some(mut sink) = sinks.watchers.remove(&hash) {
                sink.send(TxStatus::Dropped(InvalidTransaction::Stale.to_string()));
            }
        }
        sinks.heads.retain_mut(|s| s.send(header));
        let block = BlockEvents { number: header.number, events: outcome.events };
        sinks.events.retain_mut(|s| s.send(block.clone()));
    }

    /// Validate and queue `tx`; the chain lock is held by the caller.
    fn import(chain: &mut Chain, tx: SignedTransaction) -> std::result::Result<Validity, TxPoolError> {
        chain.executor.validate(&tx)?;
        let nonce = chain.executor.state.nonce(&tx.signer);
        chain.pool.insert(tx, nonce)
    }

    fn read<T>(&self, f: impl FnOnce(&ChainState) -> T) -> T {
        f(&self.inner.chain.lock().executor.state)
    }
}

#[async_trait]
impl ChainClient for DevNode {
    async fn chain_info(&self) -> Result<ChainInfo> {
        Ok(ChainInfo {
            chain: "Development".into(),
            node_name: NODE_NAME.into(),
            node_version: env!("CARGO_PKG_VERSION").into(),
        })
    }

    async fn submit(&self, tx: SignedTransaction) -> Result<TxHash> {
        let hash = tx.hash();
        let mut chain = self.inner.chain.lock();
        match Self::import(&mut chain, tx) {
            Ok(_) => Ok(hash),
            Err(e) => Err(LoadError::InvalidTransaction { hash, reason: e.to_string() }),
        }
    }

    async fn submit_and_watch(&self, tx: SignedTransaction) -> Result<Subscription<TxStatus>> {
        let hash = tx.hash();
        let (mut sink, sub) = subscription();
        let mut chain = self.inner.chain.lock();
        match Self::import(&mut chain, tx) {
            Ok(Validity::Ready) => {
                sink.send(TxStatus::Ready);
                self.inner.sinks.lock().watchers.insert(hash, sink);
            }
            Ok(Validity::Future) => {
                sink.send(TxStatus::Future);
                self.inner.sinks.lock().watchers.insert(hash, sink);
            }
            Err(e) => {
                // terminal status, then the sink is dropped
                sink.send(TxStatus::Invalid(e.to_string()));
            }
        }
        Ok(sub)
    }

    async fn subscribe_new_heads(&self) -> Result<Subscription<Header>> {
        let (mut sink, sub) = subscription();
        let chain = self.inner.chain.lock();
        sink.send(chain.head);
        self.inner.sinks.lock().heads.push(sink);
        Ok(sub)
    }

    async fn subscribe_events(&self) -> Result<Subscription<BlockEvents>> {
        let (sink, sub) = subscription();
        let _chain = self.inner.chain.lock();
        self.inner.sinks.lock().events.push(sink);
        Ok(sub)
    }

    async fn best_block_number(&self) -> Result<BlockNumber> {
        Ok(self.inner.chain.lock().head.number)
    }

    async fn account_nonce(&self, who: &AccountId) -> Result<Nonce> {
        Ok(self.read(|s| s.nonce(who)))
    }

    async fn sudo_key(&self) -> Result<AccountId> {
        Ok(self.read(|s| s.sudo()))
    }

    async fn asset(&self, id: &AssetId) -> Result<Option<AssetData>> {
        Ok(self.read(|s| s.asset(id)))
    }

    async fn assets(&self) -> Result<Vec<(AssetId, AssetData)>> {
        Ok(self.read(|s| s.assets()))
    }

    async fn balance(&self, who: &AccountId, asset: &AssetId) -> Result<Balance> {
        Ok(self.read(|s| s.balance(who, asset)))
    }

    async fn balances(&self, who: &AccountId) -> Result<BTreeMap<AssetId, Balance>> {
        Ok(self.read(|s| s.balances(who)))
    }

    async fn price(&self, asset: &AssetId) -> Result<Option<Price>> {
        Ok(self.read(|s| s.price(asset)))
    }

    async fn deposit_of(&self, who: &AccountId, asset: &AssetId) -> Result<Balance> {
        Ok(self.read(|s| s.deposit_of(who, asset)))
    }
}
