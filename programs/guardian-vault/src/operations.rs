//! Vault operations that move capital.
//!
//! Every operation runs against a scratch copy of the ledger (see
//! [`transact`]) so a failure anywhere, including inside an adapter, leaves
//! shares, idle balance and positions exactly as they were. Token movements
//! the ledger does not own (pulling deposits, minting, burning, paying out)
//! are handed back to the caller through a `settle` callback invoked at the
//! point in the sequence where they must happen.

use anchor_lang::prelude::*;

use crate::{
    adapters::{DivestRequest, ExecutionBounds, YieldAdapter},
    constants::*,
    errors::VaultError,
    guard::transact,
    math::{mul_div_ceil, mul_div_floor},
    state::{DepositSplit, Lifecycle, VaultState},
};

/// Adapters bound to the slots of one vault, in slot order
pub type Adapters<'a> = [Box<dyn YieldAdapter + 'a>];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositOutcome {
    pub split: DepositSplit,
    /// Asset units moved into markets after the deposit
    pub invested: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExitOutcome {
    pub shares: u64,
    pub assets: u64,
    /// Asset units pulled back from markets to cover the payout
    pub divested: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RebalanceOutcome {
    pub divested: u64,
    pub invested: u64,
}

impl VaultState {
    /// Adapters must line up one-to-one with the registered slots
    fn check_adapters(&self, adapters: &Adapters) -> Result<()> {
        require!(
            adapters.len() == self.adapters.len(),
            VaultError::AdapterAccountMismatch
        );
        for (slot, adapter) in self.adapters.iter().zip(adapters.iter()) {
            require!(
                slot.kind == adapter.kind(),
                VaultError::AdapterAccountMismatch
            );
        }
        Ok(())
    }

    fn credit_idle(&mut self, amount: u64) -> Result<()> {
        self.idle_assets = self
            .idle_assets
            .checked_add(amount)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    fn debit_idle(&mut self, amount: u64) -> Result<()> {
        self.idle_assets = self
            .idle_assets
            .checked_sub(amount)
            .ok_or(VaultError::InsufficientLiquidity)?;
        Ok(())
    }

    /// Split `amount` across slots by weight. Allocations below the minimum
    /// stay idle.
    fn allocation_plan(&self, amount: u64) -> Result<Vec<(usize, u64)>> {
        let mut plan = Vec::with_capacity(self.adapters.len());
        for (index, slot) in self.adapters.iter().enumerate() {
            let allocation = mul_div_floor(amount, slot.weight_bps as u64, BPS_DENOMINATOR)?;
            if allocation >= MIN_ADAPTER_ALLOCATION {
                plan.push((index, allocation));
            }
        }
        Ok(plan)
    }

    /// Move `amount` of idle assets into markets by slot weight.
    ///
    /// Idle drops by exactly what the adapters consumed and positions grow
    /// by the same book value, so `total_assets_managed` does not move.
    /// Returns the amount invested.
    pub fn invest<'a>(
        &mut self,
        amount: u64,
        adapters: &mut Adapters<'a>,
        bounds: &ExecutionBounds,
    ) -> Result<u64> {
        require!(amount <= self.idle_assets, VaultError::InsufficientLiquidity);

        let plan = self.allocation_plan(amount)?;
        if plan.is_empty() {
            return Ok(0);
        }
        self.check_adapters(adapters)?;

        let mut invested = 0u64;
        for (index, allocation) in plan {
            let slot = &mut self.adapters[index];
            let consumed = adapters[index].invest(&mut slot.position, allocation, bounds)?;
            require!(consumed <= allocation, VaultError::MathOverflow);
            invested = invested
                .checked_add(consumed)
                .ok_or(VaultError::MathOverflow)?;
        }
        self.debit_idle(invested)?;

        msg!("Invested {} of {} requested", invested, amount);
        Ok(invested)
    }

    fn divest_slot<'a>(
        &mut self,
        index: usize,
        request: DivestRequest,
        adapters: &mut Adapters<'a>,
        bounds: &ExecutionBounds,
    ) -> Result<u64> {
        let slot = &mut self.adapters[index];
        let outcome = adapters[index].divest(&mut slot.position, request, bounds)?;
        self.credit_idle(outcome.received)?;
        msg!(
            "Divested slot {}: received {}, book value released {}",
            index,
            outcome.received,
            outcome.cost_released
        );
        Ok(outcome.received)
    }

    /// Close every open position into idle. Returns the amount received.
    pub fn divest_all<'a>(
        &mut self,
        adapters: &mut Adapters<'a>,
        bounds: &ExecutionBounds,
    ) -> Result<u64> {
        if !self.has_open_positions() {
            return Ok(0);
        }
        self.check_adapters(adapters)?;

        let mut received = 0u64;
        for index in 0..self.adapters.len() {
            if !self.adapters[index].position.is_open() {
                continue;
            }
            let amount = self.divest_slot(index, DivestRequest::All, adapters, bounds)?;
            received = received
                .checked_add(amount)
                .ok_or(VaultError::MathOverflow)?;
        }
        Ok(received)
    }

    /// Divest until idle covers `needed` or no position is left.
    ///
    /// The shortfall is first spread over open positions by allocation weight
    /// (by book value when every open slot has a zero weight), then taken from
    /// whatever remains in slot order. Each divest realizes its result into
    /// the ledger. Returns the amount received; the caller decides whether
    /// idle now suffices.
    pub fn cover_shortfall<'a>(
        &mut self,
        needed: u64,
        adapters: &mut Adapters<'a>,
        bounds: &ExecutionBounds,
    ) -> Result<u64> {
        if self.idle_assets >= needed || !self.has_open_positions() {
            return Ok(0);
        }
        self.check_adapters(adapters)?;

        let shortfall = needed - self.idle_assets;
        let open: Vec<usize> = (0..self.adapters.len())
            .filter(|index| self.adapters[*index].position.is_open())
            .collect();

        let weight_total: u64 = open
            .iter()
            .map(|index| self.adapters[*index].weight_bps as u64)
            .sum();
        let by_weight = weight_total > 0;
        let share_total = if by_weight {
            weight_total
        } else {
            self.invested_assets()?
        };

        let mut received = 0u64;
        for index in &open {
            let slot = &self.adapters[*index];
            let share = if by_weight {
                slot.weight_bps as u64
            } else {
                slot.position.cost_basis
            };
            let portion = mul_div_ceil(shortfall, share, share_total)?;
            if portion == 0 || !slot.position.is_open() {
                continue;
            }
            let request = if portion >= slot.position.cost_basis {
                DivestRequest::All
            } else {
                DivestRequest::Assets(portion)
            };
            let amount = self.divest_slot(*index, request, adapters, bounds)?;
            received = received
                .checked_add(amount)
                .ok_or(VaultError::MathOverflow)?;
        }

        // Slippage and rounding can leave the first pass short
        for index in open {
            if self.idle_assets >= needed {
                break;
            }
            let position = self.adapters[index].position;
            if !position.is_open() {
                continue;
            }
            let missing = needed - self.idle_assets;
            let request = if missing >= position.cost_basis {
                DivestRequest::All
            } else {
                DivestRequest::Assets(missing)
            };
            let amount = self.divest_slot(index, request, adapters, bounds)?;
            received = received
                .checked_add(amount)
                .ok_or(VaultError::MathOverflow)?;
        }

        Ok(received)
    }

    /// Deposit `assets` and invest them.
    ///
    /// `settle` receives the share split once the ledger has been credited
    /// and must pull the assets in and mint user, guardian and treasury
    /// shares, in that order. The investment runs after it.
    pub fn deposit<'a, F>(
        &mut self,
        assets: u64,
        fee_cut_divisor: u64,
        adapters: &mut Adapters<'a>,
        bounds: &ExecutionBounds,
        settle: F,
    ) -> Result<DepositOutcome>
    where
        F: FnOnce(&DepositSplit) -> Result<()>,
    {
        transact(self, |vault| {
            require!(vault.is_active(), VaultError::VaultInactive);
            require!(assets > 0, VaultError::ZeroAmount);
            require!(
                assets <= vault.max_deposit()?,
                VaultError::DepositExceedsMax
            );

            let split = vault.split_deposit(assets, fee_cut_divisor)?;
            vault.fee_cut_divisor = fee_cut_divisor;
            vault.credit_idle(assets)?;
            vault.total_shares = vault
                .total_shares
                .checked_add(split.total)
                .ok_or(VaultError::MathOverflow)?;

            settle(&split)?;

            let invested = vault.invest(assets, adapters, bounds)?;
            Ok(DepositOutcome { split, invested })
        })
    }

    /// Burn the shares needed for exactly `assets` and pay them out.
    ///
    /// Markets are divested first when idle is short; the shares burned are
    /// priced on the realized figures afterwards, so the exiting owner bears
    /// the realized result of what was pulled out for them.
    ///
    /// `settle(shares, assets)` must burn the owner's shares and transfer the
    /// assets to the receiver.
    pub fn withdraw<'a, F>(
        &mut self,
        assets: u64,
        owner_shares: u64,
        adapters: &mut Adapters<'a>,
        bounds: &ExecutionBounds,
        settle: F,
    ) -> Result<ExitOutcome>
    where
        F: FnOnce(u64, u64) -> Result<()>,
    {
        transact(self, |vault| {
            require!(assets > 0, VaultError::ZeroAmount);
            require!(vault.total_shares > 0, VaultError::InsufficientShares);

            let divested = vault.cover_shortfall(assets, adapters, bounds)?;
            require!(
                vault.idle_assets >= assets,
                VaultError::InsufficientLiquidity
            );

            let shares = vault.preview_withdraw(assets)?;
            require!(shares > 0, VaultError::ZeroShares);
            require!(shares <= owner_shares, VaultError::InsufficientShares);
            require!(shares <= vault.total_shares, VaultError::InsufficientShares);

            vault.pay_out(shares, assets, divested, settle)
        })
    }

    /// Burn `shares` for their current asset value and pay it out.
    ///
    /// When idle is short the payout is re-priced after every divest round,
    /// until idle covers it. Redeeming the whole supply always empties the
    /// vault, whatever the markets returned.
    pub fn redeem<'a, F>(
        &mut self,
        shares: u64,
        owner_shares: u64,
        adapters: &mut Adapters<'a>,
        bounds: &ExecutionBounds,
        settle: F,
    ) -> Result<ExitOutcome>
    where
        F: FnOnce(u64, u64) -> Result<()>,
    {
        transact(self, |vault| {
            require!(shares > 0, VaultError::ZeroShares);
            require!(shares <= owner_shares, VaultError::InsufficientShares);
            require!(shares <= vault.total_shares, VaultError::InsufficientShares);

            let mut assets = vault.preview_redeem(shares)?;
            let mut divested = 0u64;
            for _ in 0..MAX_EXIT_ROUNDS {
                if vault.idle_assets >= assets || !vault.has_open_positions() {
                    break;
                }
                let received = vault.cover_shortfall(assets, adapters, bounds)?;
                divested = divested
                    .checked_add(received)
                    .ok_or(VaultError::MathOverflow)?;
                assets = vault.preview_redeem(shares)?;
            }
            require!(assets > 0, VaultError::ZeroAmount);
            require!(
                vault.idle_assets >= assets,
                VaultError::InsufficientLiquidity
            );

            vault.pay_out(shares, assets, divested, settle)
        })
    }

    fn pay_out<F>(
        &mut self,
        shares: u64,
        assets: u64,
        divested: u64,
        settle: F,
    ) -> Result<ExitOutcome>
    where
        F: FnOnce(u64, u64) -> Result<()>,
    {
        self.total_shares = self
            .total_shares
            .checked_sub(shares)
            .ok_or(VaultError::InsufficientShares)?;
        self.debit_idle(assets)?;

        settle(shares, assets)?;
        Ok(ExitOutcome {
            shares,
            assets,
            divested,
        })
    }

    /// Unwind every position and re-invest the whole idle balance by the
    /// current weights.
    pub fn rebalance<'a>(
        &mut self,
        adapters: &mut Adapters<'a>,
        bounds: &ExecutionBounds,
    ) -> Result<RebalanceOutcome> {
        transact(self, |vault| {
            require!(vault.is_active(), VaultError::VaultInactive);
            let divested = vault.divest_all(adapters, bounds)?;
            let idle = vault.idle_assets;
            let invested = vault.invest(idle, adapters, bounds)?;
            Ok(RebalanceOutcome { divested, invested })
        })
    }

    /// Divest everything and move to the terminal Inactive state
    pub fn deactivate<'a>(
        &mut self,
        adapters: &mut Adapters<'a>,
        bounds: &ExecutionBounds,
    ) -> Result<u64> {
        transact(self, |vault| {
            require!(vault.is_active(), VaultError::VaultInactive);
            let divested = vault.divest_all(adapters, bounds)?;
            vault.lifecycle = Lifecycle::Inactive;
            Ok(divested)
        })
    }

    /// Mark Inactive without touching positions. Used when the guardian
    /// leaves; remaining positions are unwound by later withdrawals.
    pub fn retire(&mut self) -> Result<bool> {
        require!(!self.locked, VaultError::ReentrantCall);
        let was_active = self.is_active();
        self.lifecycle = Lifecycle::Inactive;
        Ok(was_active)
    }
}
