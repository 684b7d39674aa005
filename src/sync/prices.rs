//! Oracle price tracking.
//!
//! The synchronizer keeps the last observed price of every asset and a single
//! pending "next update" signal. A listener task feeds it every block's events;
//! when a block carries at least one price update, the pending signal fires
//! and a fresh one is installed under the same lock, so a waiter registering
//! right after the update waits for the following one.

use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{error, info};

use crate::chain::subscription::Subscription;
use crate::chain::types::{AssetId, Balance, BlockEvents, BlockNumber, ChainEvent, Price, PRICE_PRECISION};
use crate::chain::ChainClient;
use crate::utils::metrics::{METRICS, PRICE_UPDATES};
use crate::utils::{multiply_by_rational, LoadError, Result};

/// A block that repeated an asset's price.
#[derive(Debug, Clone)]
struct StalePrice {
    asset: AssetId,
    price: Price,
    block: BlockNumber,
}

type Signal = std::result::Result<BlockNumber, StalePrice>;

struct Pending {
    tx: oneshot::Sender<Signal>,
    rx: Shared<oneshot::Receiver<Signal>>,
}

impl Pending {
    fn new() -> Self {
        let (tx, rx) = oneshot::channel();
        Self { tx, rx: rx.shared() }
    }
}

struct Inner {
    stable: AssetId,
    prices: RwLock<BTreeMap<AssetId, Price>>,
    /// `None` while no listener is running.
    pending: Mutex<Option<Pending>>,
}

/// Process-wide price table plus the "next update" signal.
#[derive(Clone)]
pub struct PriceSynchronizer {
    inner: Arc<Inner>,
}

/// Resolves with the block of the next observed price update.
pub struct NextPriceUpdate {
    rx: Option<Shared<oneshot::Receiver<Signal>>>,
}

impl Future for NextPriceUpdate {
    type Output = Result<BlockNumber>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(rx) = self.rx.as_mut() else {
            return Poll::Ready(Err(LoadError::PriceListenerStopped));
        };
        match Pin::new(rx).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(Ok(block))) => Poll::Ready(Ok(block)),
            Poll::Ready(Ok(Err(stale))) => Poll::Ready(Err(LoadError::PriceNotChanged {
                asset: stale.asset,
                price: stale.price,
                block: stale.block,
            })),
            Poll::Ready(Err(_)) => Poll::Ready(Err(LoadError::PriceListenerStopped)),
        }
    }
}

impl PriceSynchronizer {
    /// Table seeded with `stable` at exactly 1.0.
    pub fn new(stable: AssetId) -> Self {
        let mut prices = BTreeMap::new();
        prices.insert(stable.clone(), PRICE_PRECISION);
        Self {
            inner: Arc::new(Inner {
                stable,
                prices: RwLock::new(prices),
                pending: Mutex::new(Some(Pending::new())),
            }),
        }
    }

    pub fn stable(&self) -> &AssetId {
        &self.inner.stable
    }

    pub fn price(&self, asset: &AssetId) -> Option<Price> {
        self.inner.prices.read().get(asset).copied()
    }

    pub fn prices(&self) -> BTreeMap<AssetId, Price> {
        self.inner.prices.read().clone()
    }

    /// Handle on the current pending signal.
    pub fn wait_for_next_update(&self) -> NextPriceUpdate {
        NextPriceUpdate { rx: self.inner.pending.lock().as_ref().map(|p| p.rx.clone()) }
    }

    pub async fn next_update(&self) -> Result<BlockNumber> {
        info!("Waiting for updatePrice event");
        self.wait_for_next_update().await
    }

    /// Feed one block of events. Returns whether any price changed.
    pub fn apply_block(&self, block: &BlockEvents) -> Result<bool> {
        let mut updated = false;
        let mut stale = None;
        {
            let mut prices = self.inner.prices.write();
            for event in &block.events {
                let ChainEvent::UpdatePrice { asset, price } = event else {
                    continue;
                };
                if prices.get(asset) == Some(price) {
                    stale = Some(StalePrice { asset: asset.clone(), price: *price, block: block.number });
                    break;
                }
                prices.insert(asset.clone(), *price);
                updated = true;
            }
        }

        if let Some(stale) = stale {
            let err = LoadError::PriceNotChanged {
                asset: stale.asset.clone(),
                price: stale.price,
                block: stale.block,
            };
            self.fire(Err(stale));
            return Err(err);
        }

        if updated {
            METRICS.inc_counter(PRICE_UPDATES);
            info!("Prices updated: {}", self.render_prices());
            self.fire(Ok(block.number));
        }
        Ok(updated)
    }

    /// Sum `amount * price / stable_price` over `entries`, truncating each term.
    pub fn convert_to_stable<'a, I>(&self, entries: I) -> Result<Balance>
    where
        I: IntoIterator<Item = (&'a AssetId, Balance)>,
    {
        let prices = self.inner.prices.read();
        let stable = *prices
            .get(&self.inner.stable)
            .ok_or_else(|| LoadError::UnknownPrice(self.inner.stable.clone()))?;
        entries.into_iter().try_fold(0, |total: Balance, (asset, amount)| {
            let price = *prices.get(asset).ok_or_else(|| LoadError::UnknownPrice(asset.clone()))?;
            let value = multiply_by_rational(amount, price, stable).ok_or(LoadError::Overflow)?;
            total.checked_add(value).ok_or(LoadError::Overflow)
        })
    }

    /// Subscribe to block events and keep the table current until stopped.
    pub async fn observe<C: ChainClient>(&self, client: &C) -> Result<PriceListener> {
        let events = client.subscribe_events().await?;
        self.inner.pending.lock().get_or_insert_with(Pending::new);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(listen(self.clone(), events, cancel.clone()));
        Ok(PriceListener { _guard: cancel.clone().drop_guard(), cancel, handle })
    }

    /// Resolve the pending signal and install a fresh one atomically.
    fn fire(&self, signal: Signal) {
        let mut pending = self.inner.pending.lock();
        if let Some(old) = pending.replace(Pending::new()) {
            let _ = old.tx.send(signal);
        }
    }

    /// Drop the pending signal so waiters fail instead of hanging.
    fn close(&self) {
        self.inner.pending.lock().take();
    }

    fn render_prices(&self) -> String {
        let prices = self.inner.prices.read();
        let shown: BTreeMap<&str, f64> = prices
            .iter()
            .map(|(asset, price)| (asset.as_str(), (price / 1_000_000_000_000) as f64 / 1_000_000.0))
            .collect();
        serde_json::to_string(&shown).unwrap_or_default()
    }
}

async fn listen(
    sync: PriceSynchronizer,
    mut events: Subscription<BlockEvents>,
    cancel: CancellationToken,
) -> Result<()> {
    let result = loop {
        tokio::select! {
            _ = cancel.cancelled() => break Ok(()),
            next = events.next() => match next {
                Some(block) => {
                    if let Err(e) = sync.apply_block(&block) {
                        error!(error = %e, "price listener stopped");
                        break Err(e);
                    }
                }
                None => break Err(LoadError::Chain("event subscription closed".into())),
            },
        }
    };
    events.unsubscribe();
    sync.close();
    result
}

/// Running event listener. Dropping it cancels the task.
pub struct PriceListener {
    cancel: CancellationToken,
    handle: JoinHandle<Result<()>>,
    _guard: DropGuard,
}

impl PriceListener {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the listener and wait for it to release its subscription.
    pub async fn stop(self) -> Result<()> {
        self.cancel.cancel();
        match self.handle.await {
            Ok(res) => res,
            Err(e) => Err(LoadError::Chain(format!("price listener task: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{DevNode, DevNodeConfig, STABLE_ASSET};
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready};

    fn sync() -> PriceSynchronizer {
        PriceSynchronizer::new(AssetId::new("usd"))
    }

    fn update(block: BlockNumber, asset: &str, price: Price) -> BlockEvents {
        BlockEvents {
            number: block,
            events: vec![ChainEvent::UpdatePrice { asset: AssetId::new(asset), price }],
        }
    }

    #[test]
    fn test_convert_to_stable_truncates() {
        let s = sync();
        s.apply_block(&update(1, "X", 2 * PRICE_PRECISION)).unwrap();
        s.apply_block(&update(2, "Y", PRICE_PRECISION)).unwrap();
        s.apply_block(&update(3, "Z", 3 * PRICE_PRECISION / 2)).unwrap();

        let (x, y, z) = (AssetId::new("X"), AssetId::new("Y"), AssetId::new("Z"));
        assert_eq!(s.convert_to_stable([(&x, 2_000_000), (&y, 3_000_000)]).unwrap(), 7_000_000);
        // 3 * 1.5 = 4.5 -> 4
        assert_eq!(s.convert_to_stable([(&z, 3)]).unwrap(), 4);
        assert_eq!(s.convert_to_stable(std::iter::empty()).unwrap(), 0);
    }

    #[test]
    fn test_render_prices_in_units() {
        let s = sync();
        s.apply_block(&update(1, "X", 3 * PRICE_PRECISION / 2)).unwrap();
        let rendered = s.render_prices();
        assert!(rendered.contains("\"X\":1.5"), "{}", rendered);
        assert!(rendered.contains("\"usd\":1.0"), "{}", rendered);
    }

    #[test]
    fn test_convert_unknown_price() {
        let s = sync();
        let q = AssetId::new("Q");
        assert!(matches!(s.convert_to_stable([(&q, 1)]), Err(LoadError::UnknownPrice(a)) if a == q));
    }

    #[tokio::test]
    async fn test_unchanged_price_is_rejected() {
        let s = sync();
        s.apply_block(&update(5, "X", 2 * PRICE_PRECISION)).unwrap();
        let mut waiter = tokio_test::task::spawn(s.wait_for_next_update());
        assert_pending!(waiter.poll());

        let err = s.apply_block(&update(10, "X", 2 * PRICE_PRECISION)).unwrap_err();
        assert!(matches!(err, LoadError::PriceNotChanged { block: 10, .. }));
        assert!(matches!(assert_ready!(waiter.poll()), Err(LoadError::PriceNotChanged { .. })));
    }

    #[tokio::test]
    async fn test_update_releases_one_waiter_and_rearms() {
        let s = sync();
        let mut first = tokio_test::task::spawn(s.wait_for_next_update());
        let mut also_first = tokio_test::task::spawn(s.wait_for_next_update());
        assert_pending!(first.poll());

        assert!(s.apply_block(&update(5, "X", 2 * PRICE_PRECISION)).unwrap());
        assert_eq!(assert_ready!(first.poll()).unwrap(), 5);
        assert_eq!(assert_ready!(also_first.poll()).unwrap(), 5);

        let mut second = tokio_test::task::spawn(s.wait_for_next_update());
        assert_pending!(second.poll());
        // blocks without price events do not fire
        assert!(!s.apply_block(&BlockEvents { number: 6, events: vec![] }).unwrap());
        assert_pending!(second.poll());
        s.apply_block(&update(10, "X", 3 * PRICE_PRECISION)).unwrap();
        assert_eq!(assert_ready!(second.poll()).unwrap(), 10);
        assert_eq!(s.price(&AssetId::new("X")), Some(3 * PRICE_PRECISION));
    }

    #[tokio::test]
    async fn test_listener_follows_node_and_releases_subscription() {
        let cfg = DevNodeConfig {
            block_time: Some(Duration::from_millis(10)),
            price_period: 2,
            ..Default::default()
        };
        let node = Arc::new(DevNode::new(cfg).unwrap());
        let svc = node.start();
        let s = PriceSynchronizer::new(AssetId::new(STABLE_ASSET));
        let listener = s.observe(node.as_ref()).await.unwrap();

        let block = s.next_update().await.unwrap();
        assert!(block > 0);
        assert!(s.price(&AssetId::new(crate::node::MAIN_ASSET)).is_some());

        listener.stop().await.unwrap();
        assert_eq!(node.active_subscriptions(), 0);
        assert!(matches!(s.next_update().await, Err(LoadError::PriceListenerStopped)));
        svc.shutdown().await.unwrap();
    }
}
