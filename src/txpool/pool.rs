//! TxPool: in-memory transaction pool with per-signer nonce queues, dedup and capacity.
//!
//! Data model:
//! - one `BTreeMap<Nonce, PoolEntry>` per signer
//! - a transaction is ready when every nonce from the signer's state nonce up
//!   to its own is queued, otherwise it waits in the future set
//! - block building drains the gap-free run of each signer, signers ordered
//!   by the arrival of their earliest drained transaction

use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

use crate::chain::types::{AccountId, Nonce, SignedTransaction, TxHash};
use crate::runtime::{InvalidTransaction, Validity};

/// Error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxPoolError {
    #[error("duplicate tx")]
    Duplicate,
    #[error("pool full")]
    PoolFull,
    #[error("priority is too low")]
    TooLowPriority,
    #[error("{0}")]
    Invalid(#[from] InvalidTransaction),
}

/// Internal pool entry
struct PoolEntry {
    tx: SignedTransaction,
    hash: TxHash,
    seq: u64,
}

pub struct TxPool {
    queues: HashMap<AccountId, BTreeMap<Nonce, PoolEntry>>,
    hashes: HashSet<TxHash>,
    next_seq: u64,
    pub max_size: usize,
}

impl TxPool {
    pub fn new(max_size: usize) -> Self {
        Self { queues: HashMap::new(), hashes: HashSet::new(), next_seq: 0, max_size }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn contains(&self, hash: &TxHash) -> bool {
        self.hashes.contains(hash)
    }

    /// Insert a validated transaction. `account_nonce` is the signer's state nonce.
    pub fn insert(&mut self, tx: SignedTransaction, account_nonce: Nonce) -> Result<Validity, TxPoolError> {
        let hash = tx.hash();
        if self.hashes.contains(&hash) {
            return Err(TxPoolError::Duplicate);
        }
        if tx.nonce < account_nonce {
            return Err(InvalidTransaction::Stale.into());
        }
        if self.hashes.len() >= self.max_size {
            return Err(TxPoolError::PoolFull);
        }
        let queue = self.queues.entry(tx.signer).or_default();
        if queue.contains_key(&tx.nonce) {
            return Err(TxPoolError::TooLowPriority);
        }

        let nonce = tx.nonce;
        let seq = self.next_seq;
        self.next_seq += 1;
        queue.insert(nonce, PoolEntry { tx, hash, seq });
        self.hashes.insert(hash);

        let queued_below = queue.range(account_nonce..nonce).count() as u64;
        Ok(if queued_below == nonce - account_nonce { Validity::Ready } else { Validity::Future })
    }

    /// Remove and return every ready transaction.
    pub fn take_ready<F>(&mut self, nonce_of: F) -> Vec<SignedTransaction>
    where
        F: Fn(&AccountId) -> Nonce,
    {
        let mut runs: Vec<(u64, Vec<PoolEntry>)> = Vec::new();
        for (who, queue) in self.queues.iter_mut() {
            let mut next = nonce_of(who);
            let mut run = Vec::new();
            while let Some(entry) = queue.remove(&next) {
                run.push(entry);
                next += 1;
            }
            if let Some(first) = run.iter().map(|e| e.seq).min() {
                runs.push((first, run));
            }
        }
        self.queues.retain(|_, q| !q.is_empty());
        runs.sort_by_key(|(seq, _)| *seq);

        let mut ready = Vec::new();
        for entry in runs.into_iter().flat_map(|(_, run)| run) {
            self.hashes.remove(&entry.hash);
            ready.push(entry.tx);
        }
        ready
    }

    /// Drop entries whose nonce is already used on chain; returns their hashes.
    pub fn prune<F>(&mut self, nonce_of: F) -> Vec<TxHash>
    where
        F: Fn(&AccountId) -> Nonce,
    {
        let mut stale = Vec::new();
        for (who, queue) in self.queues.iter_mut() {
            let current = nonce_of(who);
            let keep = queue.split_off(&current);
            stale.extend(queue.values().map(|e| e.hash));
            *queue = keep;
        }
        self.queues.retain(|_, q| !q.is_empty());
        for hash in &stale {
            self.hashes.remove(hash);
        }
        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::types::{AssetId, Call};
    use crate::crypto::{sign_transaction, Keypair};

    fn tx(who: &Keypair, nonce: Nonce) -> SignedTransaction {
        sign_transaction(who, nonce, 0, Call::Withdraw { asset: AssetId::new("usd") }).unwrap()
    }

    #[test]
    fn test_future_becomes_ready_when_gap_closes() {
        let a = Keypair::generate().unwrap();
        let mut pool = TxPool::new(16);
        assert_eq!(pool.insert(tx(&a, 1), 0), Ok(Validity::Future));
        assert!(pool.take_ready(|_| 0).is_empty());

        assert_eq!(pool.insert(tx(&a, 0), 0), Ok(Validity::Ready));
        let ready = pool.take_ready(|_| 0);
        assert_eq!(ready.iter().map(|t| t.nonce).collect::<Vec<_>>(), vec![0, 1]);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_rejections() {
        let a = Keypair::generate().unwrap();
        let mut pool = TxPool::new(2);
        let t = tx(&a, 5);
        pool.insert(t.clone(), 5).unwrap();
        assert_eq!(pool.insert(t, 5), Err(TxPoolError::Duplicate));
        assert_eq!(pool.insert(tx(&a, 4), 5), Err(TxPoolError::Invalid(InvalidTransaction::Stale)));

        let mut retipped = sign_transaction(&a, 5, 1, Call::Withdraw { asset: AssetId::new("usd") }).unwrap();
        assert_eq!(pool.insert(retipped.clone(), 5), Err(TxPoolError::TooLowPriority));
        retipped = tx(&a, 6);
        pool.insert(retipped, 5).unwrap();
        assert_eq!(pool.insert(tx(&a, 7), 5), Err(TxPoolError::PoolFull));
    }

    #[test]
    fn test_signers_drain_in_arrival_order() {
        let a = Keypair::generate().unwrap();
        let b = Keypair::generate().unwrap();
        let mut pool = TxPool::new(16);
        pool.insert(tx(&b, 0), 0).unwrap();
        pool.insert(tx(&a, 1), 0).unwrap();
        pool.insert(tx(&a, 0), 0).unwrap();
        pool.insert(tx(&b, 1), 0).unwrap();

        let order: Vec<_> = pool.take_ready(|_| 0).iter().map(|t| (t.signer, t.nonce)).collect();
        let (a, b) = (a.account_id(), b.account_id());
        assert_eq!(order, vec![(b, 0), (b, 1), (a, 0), (a, 1)]);
    }

    #[test]
    fn test_prune_drops_used_nonces() {
        let a = Keypair::generate().unwrap();
        let mut pool = TxPool::new(16);
        pool.insert(tx(&a, 3), 0).unwrap();
        pool.insert(tx(&a, 9), 0).unwrap();
        let stale = pool.prune(|_| 5);
        assert_eq!(stale.len(), 1);
        assert_eq!(pool.len(), 1);
    }
}
