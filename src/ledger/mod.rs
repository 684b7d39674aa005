//! Ledger operations: typed call builders over the transaction submitter.
//!
//! Every write goes through `submit_and_watch` and returns once the call is
//! in a block; failures are propagated untouched. Reads go straight to the
//! node and consume no nonce. Root-only calls take the keyring and are sent
//! sudo-wrapped by its privileged pair.

pub mod assets;
pub mod balances;
pub mod distribution;
pub mod oracle;

use std::sync::Arc;

use crate::chain::types::Call;
use crate::chain::ChainClient;
use crate::crypto::{Keypair, Keyring};
use crate::tx::{TransactionSubmitter, TxOutcome};
use crate::utils::Result;

pub struct LedgerOps<C: ChainClient> {
    submitter: TransactionSubmitter<C>,
}

impl<C: ChainClient> Clone for LedgerOps<C> {
    fn clone(&self) -> Self {
        Self { submitter: self.submitter.clone() }
    }
}

impl<C: ChainClient> LedgerOps<C> {
    pub fn new(submitter: TransactionSubmitter<C>) -> Self {
        Self { submitter }
    }

    pub fn submitter(&self) -> &TransactionSubmitter<C> {
        &self.submitter
    }

    pub fn client(&self) -> &Arc<C> {
        self.submitter.client()
    }

    async fn signed(&self, signer: &Keypair, call: Call) -> Result<TxOutcome> {
        self.submitter.submit_and_watch(signer, call, None).await
    }

    async fn root(&self, keyring: &Keyring, call: Call) -> Result<TxOutcome> {
        let sudo = keyring.sudo()?;
        self.submitter.submit_and_watch(sudo, call.sudo(), None).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::crypto::DEFAULT_SUDO_SEED;
    use crate::node::{DevNode, DevNodeConfig, ServiceHandle};
    use crate::state::NonceSequencer;
    use std::time::Duration;

    pub struct Harness {
        pub node: Arc<DevNode>,
        pub svc: ServiceHandle,
        pub ops: LedgerOps<DevNode>,
        pub keyring: Keyring,
    }

    /// Running dev node with the sudo nonce already seeded.
    pub async fn harness() -> Harness {
        let cfg = DevNodeConfig { block_time: Some(Duration::from_millis(10)), ..Default::default() };
        let node = Arc::new(DevNode::new(cfg).unwrap());
        let svc = node.start();
        let keyring = Keyring::new(Some(DEFAULT_SUDO_SEED)).unwrap();
        let nonces = NonceSequencer::new();
        let sudo = keyring.sudo().unwrap().account_id();
        nonces.init_nonce(sudo, node.account_nonce(&sudo).await.unwrap());
        let ops = LedgerOps::new(TransactionSubmitter::new(node.clone(), nonces));
        Harness { node, svc, ops, keyring }
    }

    /// Fresh account funded in the fee asset with its nonce seeded.
    pub async fn funded_account(h: &Harness) -> Keypair {
        let pair = Keypair::generate().unwrap();
        let main = crate::chain::types::AssetId::new(crate::node::MAIN_ASSET);
        h.ops.mint(&h.keyring, &pair.account_id(), &main, 1_000_000_000_000).await.unwrap();
        h.ops.submitter().nonces().init_nonce(pair.account_id(), 0);
        pair
    }
}
