//! Signs calls with sequenced nonces and submits them to the node.
//!
//! Two modes:
//! - fire-and-forget: resolves once the pool accepted the transaction
//! - watched: resolves once the transaction is in a block, and fails if the
//!   inclusion was invalid, the dispatch failed, or a sudo-wrapped inner call
//!   reported an error even though the envelope succeeded
//!
//! Nothing is retried here; callers decide.

use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::chain::types::{Balance, BlockNumber, Call, ChainEvent, DispatchError, SignedTransaction, TxHash, TxStatus};
use crate::chain::ChainClient;
use crate::crypto::{sign_transaction, Keypair};
use crate::state::NonceSequencer;
use crate::utils::metrics::{METRICS, TX_FAILED, TX_IN_BLOCK, TX_SUBMITTED};
use crate::utils::{LoadError, Result};

/// Optional signing parameters. The nonce always comes from the sequencer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignOptions {
    pub tip: Balance,
}

/// A transaction that made it into a block with a successful outcome.
#[derive(Debug, Clone)]
pub struct TxOutcome {
    pub hash: TxHash,
    pub block: BlockNumber,
    pub events: Vec<ChainEvent>,
}

pub struct TransactionSubmitter<C: ChainClient> {
    client: Arc<C>,
    nonces: NonceSequencer,
}

impl<C: ChainClient> Clone for TransactionSubmitter<C> {
    fn clone(&self) -> Self {
        Self { client: self.client.clone(), nonces: self.nonces.clone() }
    }
}

impl<C: ChainClient> TransactionSubmitter<C> {
    pub fn new(client: Arc<C>, nonces: NonceSequencer) -> Self {
        Self { client, nonces }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn nonces(&self) -> &NonceSequencer {
        &self.nonces
    }

    fn sign(&self, signer: &Keypair, call: Call, options: Option<SignOptions>) -> Result<SignedTransaction> {
        let nonce = self.nonces.claim(&signer.account_id())?;
        let tip = options.unwrap_or_default().tip;
        sign_transaction(signer, nonce, tip, call)
    }

    /// Sign with a fresh nonce and hand to the pool without waiting for inclusion.
    pub async fn submit_and_forget(
        &self,
        signer: &Keypair,
        call: Call,
        options: Option<SignOptions>,
    ) -> Result<TxHash> {
        let tx = self.sign(signer, call, options)?;
        let res = self.client.submit(tx).await;
        match &res {
            Ok(hash) => {
                METRICS.inc_counter(TX_SUBMITTED);
                trace!(%hash, "submitted");
            }
            Err(e) => {
                METRICS.inc_counter(TX_FAILED);
                debug!(error = %e, "submit failed");
            }
        }
        res
    }

    /// Sign with a fresh nonce, submit, and wait for the in-block outcome.
    pub async fn submit_and_watch(
        &self,
        signer: &Keypair,
        call: Call,
        options: Option<SignOptions>,
    ) -> Result<TxOutcome> {
        let tx = self.sign(signer, call, options)?;
        let hash = tx.hash();
        let mut statuses = self.client.submit_and_watch(tx).await?;
        METRICS.inc_counter(TX_SUBMITTED);

        let result = loop {
            match statuses.next().await {
                Some(TxStatus::Ready) | Some(TxStatus::Future) => continue,
                Some(TxStatus::Invalid(reason)) | Some(TxStatus::Dropped(reason)) => {
                    break Err(LoadError::InvalidTransaction { hash, reason });
                }
                Some(TxStatus::InBlock { block, events, dispatch_error }) => {
                    break inclusion_outcome(hash, block, events, dispatch_error);
                }
                None => break Err(LoadError::WatchClosed(hash)),
            }
        };
        // first terminal status ends the watch
        statuses.unsubscribe();

        match &result {
            Ok(outcome) => {
                METRICS.inc_counter(TX_IN_BLOCK);
                trace!(%hash, block = outcome.block, "in block");
            }
            Err(e) => {
                METRICS.inc_counter(TX_FAILED);
                warn!(%hash, error = %e, "transaction failed");
            }
        }
        result
    }
}

/// Judge an in-block status, including the wrapped result of sudo calls.
fn inclusion_outcome(
    hash: TxHash,
    block: BlockNumber,
    events: Vec<ChainEvent>,
    dispatch_error: Option<DispatchError>,
) -> Result<TxOutcome> {
    if let Some(err) = dispatch_error {
        return Err(LoadError::Dispatch(err));
    }
    for event in &events {
        if let ChainEvent::Sudid(Err(inner)) = event {
            return Err(LoadError::WrappedCall(inner.clone()));
        }
    }
    Ok(TxOutcome { hash, block, events })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::types::{AssetId, PRICE_PRECISION};
    use crate::node::{DevNode, DevNodeConfig, MAIN_ASSET};
    use std::time::Duration;

    async fn setup() -> (Arc<DevNode>, crate::node::ServiceHandle, TransactionSubmitter<DevNode>, Keypair) {
        let cfg = DevNodeConfig { block_time: Some(Duration::from_millis(10)), ..Default::default() };
        let node = Arc::new(DevNode::new(cfg).unwrap());
        let svc = node.start();
        let submitter = TransactionSubmitter::new(node.clone(), NonceSequencer::new());
        let sudo = node.sudo_pair().clone();
        let nonce = node.account_nonce(&sudo.account_id()).await.unwrap();
        submitter.nonces().init_nonce(sudo.account_id(), nonce);
        (node, svc, submitter, sudo)
    }

    #[test]
    fn test_inclusion_outcome_flags_wrapped_error() {
        let hash = TxHash([1; 32]);
        let inner = DispatchError::module("assets", "NotFound");
        let events = vec![ChainEvent::Sudid(Err(inner.clone())), ChainEvent::ExtrinsicSuccess];
        match inclusion_outcome(hash, 3, events, None) {
            Err(LoadError::WrappedCall(e)) => assert_eq!(e, inner),
            other => panic!("unexpected {:?}", other),
        }
        let ok = inclusion_outcome(hash, 3, vec![ChainEvent::Sudid(Ok(()))], None).unwrap();
        assert_eq!(ok.block, 3);
        assert!(matches!(
            inclusion_outcome(hash, 3, vec![], Some(DispatchError::BadOrigin)),
            Err(LoadError::Dispatch(DispatchError::BadOrigin))
        ));
    }

    #[tokio::test]
    async fn test_watch_reaches_block() {
        let (node, svc, submitter, sudo) = setup().await;
        let call = Call::Mint { who: sudo.account_id(), asset: AssetId::new(MAIN_ASSET), amount: 5 }.sudo();
        let outcome = submitter.submit_and_watch(&sudo, call, None).await.unwrap();
        assert!(outcome.block > 0);
        assert_eq!(node.active_watchers(), 0);
        svc.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_uninitialized_nonce_is_rejected_before_submission() {
        let (node, svc, submitter, _) = setup().await;
        let stranger = Keypair::generate().unwrap();
        let call = Call::Withdraw { asset: AssetId::new("A") };
        let err = submitter.submit_and_watch(&stranger, call, None).await.unwrap_err();
        assert!(matches!(err, LoadError::NonceUninitialized(a) if a == stranger.account_id()));
        assert_eq!(node.pool_len(), 0);
        svc.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_stale_nonce_is_invalid() {
        let (_node, svc, submitter, sudo) = setup().await;
        let call = || Call::ForceSetPrice { asset: AssetId::new(MAIN_ASSET), price: 3 * PRICE_PRECISION }.sudo();
        submitter.submit_and_watch(&sudo, call(), None).await.unwrap();
        // rewind: the next claim reuses a consumed nonce
        let used = submitter.nonces().peek(&sudo.account_id()).unwrap() - 1;
        submitter.nonces().init_nonce(sudo.account_id(), used);
        let err = submitter.submit_and_watch(&sudo, call(), None).await.unwrap_err();
        assert!(matches!(err, LoadError::InvalidTransaction { .. }));
        svc.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_dispatch_error_surfaces() {
        let (node, svc, submitter, sudo) = setup().await;
        // signed withdraw without any deposit
        let err = submitter
            .submit_and_watch(&sudo, Call::Withdraw { asset: AssetId::new(MAIN_ASSET) }, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Dispatch(DispatchError::Module { ref error, .. }) if error == "NoDeposit"));
        assert_eq!(node.active_watchers(), 0);
        svc.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_sudo_inner_failure_surfaces() {
        let (_node, svc, submitter, sudo) = setup().await;
        let call = Call::Mint { who: sudo.account_id(), asset: AssetId::new("NOPE"), amount: 1 }.sudo();
        let err = submitter.submit_and_watch(&sudo, call, None).await.unwrap_err();
        assert!(matches!(err, LoadError::WrappedCall(DispatchError::Module { ref error, .. }) if error == "NotFound"));
        svc.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_forget_consumes_one_nonce() {
        let (node, svc, submitter, sudo) = setup().await;
        let before = submitter.nonces().peek(&sudo.account_id()).unwrap();
        let to = Keypair::generate().unwrap().account_id();
        let call = Call::Transfer { to, asset: AssetId::new(MAIN_ASSET), amount: 10 };
        submitter.submit_and_forget(&sudo, call, Some(SignOptions { tip: 1 })).await.unwrap();
        assert_eq!(submitter.nonces().peek(&sudo.account_id()), Some(before + 1));

        // lands eventually
        let mut tries = 0;
        while node.balance(&to, &AssetId::new(MAIN_ASSET)).await.unwrap() != 10 {
            tries += 1;
            assert!(tries < 200, "transfer never landed");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        svc.shutdown().await.unwrap();
    }
}
