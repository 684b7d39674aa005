//! Runtime Executor
//!
//! Validates transactions against chain state and executes whole blocks:
//! oracle refresh on initialize, fee charge plus dispatch per extrinsic,
//! redistribution on finalize. Produces one Receipt per included extrinsic.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::chain::types::{
    AccountId, AssetData, AssetId, Balance, BlockNumber, ChainEvent, Nonce, Price, SignedTransaction,
    PRICE_PRECISION,
};
use crate::crypto::verify_transaction;
use crate::runtime::pallets::Origin;
use crate::runtime::runtime_types::{
    treasury_account, BlockOutcome, InvalidTransaction, Receipt, RuntimeConfig, Validity,
};

/// Storage of the simulated chain.
pub struct ChainState {
    pub(crate) config: RuntimeConfig,
    pub(crate) number: BlockNumber,
    pub(crate) sudo: AccountId,
    pub(crate) assets: BTreeMap<AssetId, AssetData>,
    pub(crate) accounts: HashMap<AccountId, BTreeMap<AssetId, Balance>>,
    pub(crate) nonces: HashMap<AccountId, Nonce>,
    pub(crate) deposits: BTreeMap<AccountId, BTreeMap<AssetId, Balance>>,
    pub(crate) total_deposits: BTreeMap<AssetId, Balance>,
    pub(crate) prices: BTreeMap<AssetId, Price>,
    pub(crate) rng: StdRng,
}

impl ChainState {
    pub fn genesis(config: RuntimeConfig, sudo: AccountId) -> Self {
        let mut state = Self {
            number: 0,
            sudo,
            assets: BTreeMap::new(),
            accounts: HashMap::new(),
            nonces: HashMap::new(),
            deposits: BTreeMap::new(),
            total_deposits: BTreeMap::new(),
            prices: BTreeMap::new(),
            rng: StdRng::from_entropy(),
            config,
        };
        let data = AssetData { decimals: state.config.decimals };
        let issuance = state.config.initial_issuance;
        let treasury = treasury_account();
        let main = state.config.main_asset.clone();
        let stable = state.config.stable_asset.clone();
        for asset in [&main, &stable] {
            state.assets.insert(asset.clone(), data);
            state.set_balance(&treasury, asset, issuance);
        }
        state.prices.insert(stable, PRICE_PRECISION);

        let endowment = state.config.sudo_endowment;
        if let Err(e) = state.currency_mint(&sudo, &main, endowment) {
            warn!(error = %e, "genesis endowment failed");
        }
        state
    }

    pub fn number(&self) -> BlockNumber {
        self.number
    }

    pub fn sudo(&self) -> AccountId {
        self.sudo
    }

    pub fn nonce(&self, who: &AccountId) -> Nonce {
        self.nonces.get(who).copied().unwrap_or(0)
    }

    pub fn balance(&self, who: &AccountId, asset: &AssetId) -> Balance {
        self.accounts.get(who).and_then(|b| b.get(asset)).copied().unwrap_or(0)
    }

    pub fn balances(&self, who: &AccountId) -> BTreeMap<AssetId, Balance> {
        self.accounts.get(who).cloned().unwrap_or_default()
    }

    pub fn asset(&self, id: &AssetId) -> Option<AssetData> {
        self.assets.get(id).copied()
    }

    pub fn assets(&self) -> Vec<(AssetId, AssetData)> {
        self.assets.iter().map(|(id, data)| (id.clone(), *data)).collect()
    }

    pub fn price(&self, asset: &AssetId) -> Option<Price> {
        if asset == &self.config.stable_asset {
            return Some(PRICE_PRECISION);
        }
        self.prices.get(asset).copied()
    }

    pub fn deposit_of(&self, who: &AccountId, asset: &AssetId) -> Balance {
        self.deposits.get(who).and_then(|d| d.get(asset)).copied().unwrap_or(0)
    }

    pub(crate) fn set_balance(&mut self, who: &AccountId, asset: &AssetId, amount: Balance) {
        let entry = self.accounts.entry(*who).or_default();
        if amount == 0 {
            entry.remove(asset);
        } else {
            entry.insert(asset.clone(), amount);
        }
    }
}

pub struct Executor {
    pub state: ChainState,
}

impl Executor {
    pub fn new(state: ChainState) -> Self {
        Self { state }
    }

    /// Pool-level validity of `tx` against current state.
    pub fn validate(&self, tx: &SignedTransaction) -> Result<Validity, InvalidTransaction> {
        verify_transaction(tx).map_err(|_| InvalidTransaction::BadProof)?;
        let expected = self.state.nonce(&tx.signer);
        if tx.nonce < expected {
            return Err(InvalidTransaction::Stale);
        }
        let cost = self.state.config.fee.saturating_add(tx.tip);
        if self.state.balance(&tx.signer, &self.state.config.main_asset) < cost {
            return Err(InvalidTransaction::Payment);
        }
        Ok(if tx.nonce == expected { Validity::Ready } else { Validity::Future })
    }

    /// Seal one block containing `txs` in the given order.
    pub fn execute_block(&mut self, txs: Vec<SignedTransaction>) -> BlockOutcome {
        self.state.number += 1;
        let number = self.state.number;
        let mut outcome = BlockOutcome { number, ..Default::default() };
        outcome.events.extend(self.state.on_initialize(number));

        for tx in txs {
            let hash = tx.hash();
            match self.apply_extrinsic(&tx) {
                Ok(receipt) => {
                    outcome.events.extend(receipt.events.iter().cloned());
                    outcome.receipts.push(receipt);
                }
                Err(reason) => {
                    debug!(%hash, %reason, "dropped at inclusion");
                    outcome.rejected.push((hash, reason));
                }
            }
        }

        outcome.events.extend(self.state.on_finalize());
        outcome
    }

    fn apply_extrinsic(&mut self, tx: &SignedTransaction) -> Result<Receipt, InvalidTransaction> {
        if self.validate(tx)? != Validity::Ready {
            return Err(InvalidTransaction::Stale);
        }
        let state = &mut self.state;
        let mut events = vec![state.charge_fee(&tx.signer, tx.tip)?];
        *state.nonces.entry(tx.signer).or_insert(0) += 1;

        let dispatch_error = match state.dispatch(Origin::Signed(tx.signer), &tx.call) {
            Ok(call_events) => {
                events.extend(call_events);
                events.push(ChainEvent::ExtrinsicSuccess);
                None
            }
            Err(e) => {
                events.push(ChainEvent::ExtrinsicFailed(e.clone()));
                Some(e)
            }
        };
        Ok(Receipt { hash: tx.hash(), events, dispatch_error })
    }
}
