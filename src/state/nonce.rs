//! Per-account nonce sequencing for concurrently built transactions.
//!
//! Each account owns one mutex-guarded counter. Claims for the same account
//! serialize on that counter; claims for different accounts never contend.
//!
//! API:
//! - `NonceSequencer::init_nonce(account, n)` seeds the counter, usually from chain state
//! - `NonceSequencer::claim(account)` returns the current value and advances it by one

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::chain::types::{AccountId, Nonce};
use crate::utils::{LoadError, Result};

#[derive(Clone, Default)]
pub struct NonceSequencer {
    counters: Arc<DashMap<AccountId, Arc<Mutex<Nonce>>>>,
}

impl NonceSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the next nonce for `account`, replacing any previous value.
    pub fn init_nonce(&self, account: AccountId, nonce: Nonce) {
        self.counters
            .entry(account)
            .and_modify(|counter| *counter.lock() = nonce)
            .or_insert_with(|| Arc::new(Mutex::new(nonce)));
    }

    /// Hand out the next nonce for `account`.
    pub fn claim(&self, account: &AccountId) -> Result<Nonce> {
        // clone the counter out so the map shard is not held while counting
        let counter = self
            .counters
            .get(account)
            .map(|c| c.value().clone())
            .ok_or(LoadError::NonceUninitialized(*account))?;
        let mut next = counter.lock();
        let nonce = *next;
        *next += 1;
        Ok(nonce)
    }

    /// Next nonce that would be claimed, if initialized.
    pub fn peek(&self, account: &AccountId) -> Option<Nonce> {
        self.counters.get(account).map(|c| *c.lock())
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }
}
