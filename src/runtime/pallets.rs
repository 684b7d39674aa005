//! Call handlers and block hooks of the simulated runtime.
//!
//! Handlers check everything they need before writing, so a failed dispatch
//! leaves storage untouched.

use rand::Rng;
use std::collections::BTreeMap;
use tracing::warn;

use crate::chain::types::{
    AccountId, AssetData, AssetId, Balance, BlockNumber, Call, ChainEvent, DispatchError, Price,
    PRICE_PRECISION,
};
use crate::runtime::executor::ChainState;
use crate::runtime::runtime_types::{
    distribution_account, treasury_account, DispatchResult, InvalidTransaction,
};
use crate::utils::multiply_by_rational;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Root,
    Signed(AccountId),
}

fn ensure_root(origin: Origin) -> DispatchResult {
    match origin {
        Origin::Root => Ok(()),
        Origin::Signed(_) => Err(DispatchError::BadOrigin),
    }
}

fn ensure_signed(origin: Origin) -> DispatchResult<AccountId> {
    match origin {
        Origin::Signed(who) => Ok(who),
        Origin::Root => Err(DispatchError::BadOrigin),
    }
}

fn assets_error(e: &str) -> DispatchError {
    DispatchError::module("assets", e)
}

fn balances_error(e: &str) -> DispatchError {
    DispatchError::module("balances", e)
}

fn distribution_error(e: &str) -> DispatchError {
    DispatchError::module("distribution", e)
}

fn oracle_error(e: &str) -> DispatchError {
    DispatchError::module("oracle", e)
}

impl ChainState {
    pub(crate) fn dispatch(&mut self, origin: Origin, call: &Call) -> DispatchResult<Vec<ChainEvent>> {
        match call {
            Call::CreateAsset { id, data } => {
                ensure_root(origin)?;
                self.create_asset(id, *data)
            }
            Call::RemoveAsset { id } => {
                ensure_root(origin)?;
                self.remove_asset(id)
            }
            Call::Mint { who, asset, amount } => {
                ensure_root(origin)?;
                self.currency_mint(who, asset, *amount)?;
                Ok(vec![ChainEvent::Minted { who: *who, asset: asset.clone(), amount: *amount }])
            }
            Call::Burn { who, asset, amount } => {
                ensure_root(origin)?;
                self.currency_burn(who, asset, *amount)?;
                Ok(vec![ChainEvent::Burnt { who: *who, asset: asset.clone(), amount: *amount }])
            }
            Call::Transfer { to, asset, amount } => {
                let from = ensure_signed(origin)?;
                self.currency_transfer(&from, to, asset, *amount)?;
                Ok(vec![ChainEvent::Transfer { from, to: *to, asset: asset.clone(), amount: *amount }])
            }
            Call::Deposit { asset, amount } => {
                let who = ensure_signed(origin)?;
                self.deposit(who, asset, *amount)
            }
            Call::Withdraw { asset } => {
                let who = ensure_signed(origin)?;
                self.withdraw(who, asset)
            }
            Call::Issue { asset, amount } => {
                let pot = distribution_account();
                match origin {
                    Origin::Signed(who) => self.currency_transfer(&who, &pot, asset, *amount)?,
                    Origin::Root => self.currency_mint(&pot, asset, *amount)?,
                }
                Ok(vec![ChainEvent::Issued { asset: asset.clone(), amount: *amount }])
            }
            Call::ForceSetPrice { asset, price } => {
                ensure_root(origin)?;
                Ok(vec![self.set_price(asset, *price)?])
            }
            Call::Sudo(inner) => {
                let who = ensure_signed(origin)?;
                if who != self.sudo {
                    return Err(DispatchError::module("sudo", "RequireSudo"));
                }
                let mut events = Vec::new();
                match self.dispatch(Origin::Root, inner) {
                    Ok(inner_events) => {
                        events.extend(inner_events);
                        events.push(ChainEvent::Sudid(Ok(())));
                    }
                    Err(e) => events.push(ChainEvent::Sudid(Err(e))),
                }
                Ok(events)
            }
        }
    }

    // assets

    fn check_asset(&self, asset: &AssetId) -> DispatchResult {
        if self.assets.contains_key(asset) {
            Ok(())
        } else {
            Err(assets_error("NotFound"))
        }
    }

    fn create_asset(&mut self, id: &AssetId, data: AssetData) -> DispatchResult<Vec<ChainEvent>> {
        if !id.is_valid() {
            return Err(assets_error("WrongName"));
        }
        self.assets.insert(id.clone(), data);
        let issuance = self.config.initial_issuance;
        self.set_balance(&treasury_account(), id, issuance);
        Ok(vec![ChainEvent::AssetCreated { id: id.clone(), data }])
    }

    fn remove_asset(&mut self, id: &AssetId) -> DispatchResult<Vec<ChainEvent>> {
        if !id.is_valid() {
            return Err(assets_error("WrongName"));
        }
        let data = self.assets.remove(id).ok_or_else(|| assets_error("NotFound"))?;
        Ok(vec![ChainEvent::AssetRemoved { id: id.clone(), data }])
    }

    // balances

    fn move_funds(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        asset: &AssetId,
        amount: Balance,
        shortfall: DispatchError,
    ) -> DispatchResult {
        let from_balance = self.balance(from, asset).checked_sub(amount).ok_or(shortfall)?;
        if from == to {
            return Ok(());
        }
        let to_balance = self
            .balance(to, asset)
            .checked_add(amount)
            .ok_or_else(|| balances_error("Overflow"))?;
        self.set_balance(from, asset, from_balance);
        self.set_balance(to, asset, to_balance);
        Ok(())
    }

    pub(crate) fn currency_mint(&mut self, who: &AccountId, asset: &AssetId, amount: Balance) -> DispatchResult {
        self.check_asset(asset)?;
        self.move_funds(&treasury_account(), who, asset, amount, balances_error("EmptyTreasury"))
    }

    pub(crate) fn currency_burn(&mut self, who: &AccountId, asset: &AssetId, amount: Balance) -> DispatchResult {
        self.check_asset(asset)?;
        self.move_funds(who, &treasury_account(), asset, amount, balances_error("Debt"))
    }

    pub(crate) fn currency_transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        asset: &AssetId,
        amount: Balance,
    ) -> DispatchResult {
        self.check_asset(asset)?;
        self.move_funds(from, to, asset, amount, balances_error("Debt"))
    }

    /// Flat fee plus tip in the main asset, paid to the treasury.
    pub(crate) fn charge_fee(&mut self, who: &AccountId, tip: Balance) -> Result<ChainEvent, InvalidTransaction> {
        let fee = self.config.fee;
        let main = self.config.main_asset.clone();
        let total = fee.checked_add(tip).ok_or(InvalidTransaction::Payment)?;
        self.move_funds(who, &treasury_account(), &main, total, balances_error("Debt"))
            .map_err(|_| InvalidTransaction::Payment)?;
        Ok(ChainEvent::TransactionPayment { who: *who, fee, tip })
    }

    // distribution

    fn deposit(&mut self, who: AccountId, asset: &AssetId, amount: Balance) -> DispatchResult<Vec<ChainEvent>> {
        let overflow = || distribution_error("Overflow");
        let total = self.deposit_of(&who, asset).checked_add(amount).ok_or_else(overflow)?;
        let all = self
            .total_deposits
            .get(asset)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or_else(overflow)?;
        self.currency_burn(&who, asset, amount)?;
        self.deposits.entry(who).or_default().insert(asset.clone(), total);
        self.total_deposits.insert(asset.clone(), all);
        Ok(vec![ChainEvent::NewDeposit { who, asset: asset.clone(), amount, total }])
    }

    fn withdraw(&mut self, who: AccountId, asset: &AssetId) -> DispatchResult<Vec<ChainEvent>> {
        let amount = self.deposit_of(&who, asset);
        if amount == 0 {
            return Err(distribution_error("NoDeposit"));
        }
        self.currency_mint(&who, asset, amount)?;
        if let Some(own) = self.deposits.get_mut(&who) {
            own.remove(asset);
            if own.is_empty() {
                self.deposits.remove(&who);
            }
        }
        if let Some(all) = self.total_deposits.get_mut(asset) {
            *all = all.saturating_sub(amount);
        }
        Ok(vec![ChainEvent::Withdraw { who, asset: asset.clone(), amount }])
    }

    fn to_stable(&self, asset: &AssetId, amount: Balance) -> Option<Balance> {
        multiply_by_rational(amount, self.price(asset)?, PRICE_PRECISION)
    }

    fn deposit_in_stable(&self, who: &AccountId) -> Balance {
        self.deposits
            .get(who)
            .map(|own| {
                own.iter()
                    .filter_map(|(asset, amount)| self.to_stable(asset, *amount))
                    .fold(0, Balance::saturating_add)
            })
            .unwrap_or(0)
    }

    /// End of block: share the distribution pot among depositors by the
    /// stable value of their deposits; the rounding residue goes to the treasury.
    pub(crate) fn on_finalize(&mut self) -> Vec<ChainEvent> {
        let total_in_stable = self
            .total_deposits
            .iter()
            .filter_map(|(asset, amount)| self.to_stable(asset, *amount))
            .fold(0, Balance::saturating_add);
        if total_in_stable == 0 {
            return Vec::new();
        }

        let pot = distribution_account();
        let mut issuances: BTreeMap<AssetId, (Balance, Balance)> = BTreeMap::new();
        let mut payouts = Vec::new();
        for (who, own) in &self.deposits {
            let share = self.deposit_in_stable(who);
            for asset in own.keys() {
                let issuance = issuances
                    .entry(asset.clone())
                    .or_insert_with(|| (self.balance(&pot, asset), 0));
                if let Some(amount) = multiply_by_rational(issuance.0, share, total_in_stable) {
                    if amount > 0 {
                        issuance.1 += amount;
                        payouts.push((*who, asset.clone(), amount));
                    }
                }
            }
        }
        let treasury = treasury_account();
        for (asset, (available, paid)) in issuances {
            if paid < available {
                payouts.push((treasury, asset, available - paid));
            }
        }

        let mut events = Vec::with_capacity(payouts.len());
        for (who, asset, amount) in payouts {
            match self.move_funds(&pot, &who, &asset, amount, balances_error("Debt")) {
                Ok(()) => events.push(ChainEvent::Redistributed { who, asset, amount }),
                Err(e) => warn!(error = %e, %asset, "redistribution failed"),
            }
        }
        events
    }

    // oracle

    fn set_price(&mut self, asset: &AssetId, price: Price) -> DispatchResult<ChainEvent> {
        if asset == &self.config.stable_asset && price != PRICE_PRECISION {
            return Err(oracle_error("SetPriceForStableAsset"));
        }
        if price == 0 {
            return Err(oracle_error("SetZeroPrice"));
        }
        self.check_asset(asset)?;
        self.prices.insert(asset.clone(), price);
        Ok(ChainEvent::UpdatePrice { asset: asset.clone(), price })
    }

    /// Random price in [1.0, 2.0) at 1e-6 steps, never equal to the current one.
    fn gen_price(&mut self, asset: &AssetId) -> Price {
        const STEP: Price = PRICE_PRECISION / 1_000_000;
        loop {
            let price = PRICE_PRECISION + self.rng.gen_range(0..1_000_000u128) * STEP;
            if self.prices.get(asset) != Some(&price) {
                break price;
            }
        }
    }

    pub(crate) fn on_initialize(&mut self, n: BlockNumber) -> Vec<ChainEvent> {
        let period = self.config.price_period;
        if period == 0 || n % period != 0 {
            return Vec::new();
        }
        let stable = self.config.stable_asset.clone();
        let assets: Vec<AssetId> = self.assets.keys().filter(|a| **a != stable).cloned().collect();
        let mut events = Vec::with_capacity(assets.len());
        for asset in assets {
            let price = self.gen_price(&asset);
            match self.set_price(&asset, price) {
                Ok(event) => events.push(event),
                Err(e) => warn!(error = %e, %asset, "SetPriceError"),
            }
        }
        events
    }
}
