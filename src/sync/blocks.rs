//! Block-height synchronisation over the node's new-heads subscription.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::chain::types::BlockNumber;
use crate::chain::ChainClient;
use crate::sync::deadline::{with_soft_deadline, IterationHealth};
use crate::utils::{LoadError, Result};

pub struct BlockWaiter<C: ChainClient> {
    client: Arc<C>,
}

impl<C: ChainClient> Clone for BlockWaiter<C> {
    fn clone(&self) -> Self {
        Self { client: self.client.clone() }
    }
}

impl<C: ChainClient> BlockWaiter<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Resolve with the first head above the one the subscription starts on.
    pub async fn wait_next_block(&self) -> Result<BlockNumber> {
        let mut heads = self.client.subscribe_new_heads().await?;
        let mut baseline = None;
        let result = loop {
            let Some(head) = heads.next().await else {
                break Err(LoadError::Chain("new heads subscription closed".into()));
            };
            match baseline {
                None => {
                    debug!(block = head.number, "current block");
                    baseline = Some(head.number);
                }
                Some(base) if head.number > base => break Ok(head.number),
                Some(_) => {}
            }
        };
        heads.unsubscribe();
        result
    }

    /// Resolve once the head is at least `delta` blocks past the head at call time.
    pub async fn wait_blocks(&self, delta: BlockNumber) -> Result<BlockNumber> {
        let start = self.client.best_block_number().await?;
        let mut heads = self.client.subscribe_new_heads().await?;
        let result = loop {
            match heads.next().await {
                Some(head) if head.number.saturating_sub(start) >= delta => break Ok(head.number),
                Some(_) => {}
                None => break Err(LoadError::Chain("new heads subscription closed".into())),
            }
        };
        heads.unsubscribe();
        result
    }

    /// Wait `blocks` single blocks, each under a soft cap of `per_block`.
    ///
    /// A block that is late marks `health` degraded and the next wait starts
    /// right away; the late wait keeps running in the background.
    pub async fn strict_wait_blocks(
        &self,
        blocks: u32,
        per_block: Duration,
        health: &IterationHealth,
    ) -> Result<Option<BlockNumber>> {
        let mut last = None;
        for _ in 0..blocks {
            let waiter = self.clone();
            match with_soft_deadline(async move { waiter.wait_next_block().await }, per_block, health).await {
                Some(Ok(number)) => last = Some(number),
                Some(Err(e)) => return Err(e),
                None => warn!(ms = per_block.as_millis() as u64, "block wait timed out"),
            }
        }
        Ok(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{DevNode, DevNodeConfig};
    use tokio_test::{assert_pending, assert_ready};

    fn manual_node_at(height: u64) -> Arc<DevNode> {
        let node = Arc::new(DevNode::new(DevNodeConfig::default()).unwrap());
        for _ in 0..height {
            node.produce_block();
        }
        node
    }

    #[tokio::test]
    async fn test_wait_blocks_needs_full_delta() {
        let node = manual_node_at(100);
        let waiter = BlockWaiter::new(node.clone());
        let mut fut = tokio_test::task::spawn(waiter.wait_blocks(3));

        // head 100 is delivered on subscribe
        assert_pending!(fut.poll());
        node.produce_block();
        assert_pending!(fut.poll());
        node.produce_block();
        assert_pending!(fut.poll());
        node.produce_block();
        let number = assert_ready!(fut.poll()).unwrap();
        assert_eq!(number, 103);
        drop(fut);
        assert_eq!(node.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_first_head_is_only_a_baseline() {
        let node = manual_node_at(7);
        let waiter = BlockWaiter::new(node.clone());
        let mut fut = tokio_test::task::spawn(waiter.wait_next_block());
        assert_pending!(fut.poll());
        node.produce_block();
        assert_eq!(assert_ready!(fut.poll()).unwrap(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_strict_wait_degrades_when_chain_stalls() {
        let node = manual_node_at(1);
        let waiter = BlockWaiter::new(node.clone());
        let health = IterationHealth::new();
        let last = waiter
            .strict_wait_blocks(3, Duration::from_millis(2050), &health)
            .await
            .unwrap();
        assert_eq!(last, None);
        assert!(!health.is_good());
    }
}
