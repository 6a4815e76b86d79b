use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::VaultError,
    guard::{GuardChain, Reentrant},
};

/// Protocol-wide guardian registry
///
/// Owns the admin parameters vaults read (stake price, fee cut) and escrows
/// guardian stakes in its stake token account.
#[account]
#[derive(InitSpace)]
pub struct GuardianRegistry {
    /// Admin allowed to change parameters, deactivate vaults and sweep
    pub owner: Pubkey,

    /// Treasury wallet receiving treasury fee shares and swept tokens
    pub treasury: Pubkey,

    /// Asset whose vaults may keep positions when their guardian quits
    pub base_asset_mint: Pubkey,

    /// Token guardians stake in
    pub stake_mint: Pubkey,

    pub stake_price: u64,
    pub fee_cut_divisor: u64,

    /// Sum of active guardian stakes held in escrow
    pub total_staked: u64,

    pub guardian_count: u32,

    /// Reentrancy flag
    pub locked: bool,

    pub bump: u8,
}

/// Previous and new value of an admin parameter. `old` is read before the
/// write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParameterChange {
    pub old: u64,
    pub new: u64,
}

impl Reentrant for GuardianRegistry {
    fn is_locked(&self) -> bool {
        self.locked
    }

    fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }
}

pub fn is_valid_fee_cut(divisor: u64) -> bool {
    divisor >= MIN_FEE_CUT_DIVISOR
}

impl GuardianRegistry {
    pub const SPACE: usize = 8 + Self::INIT_SPACE;

    /// Owner-only entry with an argument check
    pub fn guard_admin(
        &mut self,
        caller: &Pubkey,
        argument_ok: bool,
        error: VaultError,
    ) -> Result<()> {
        let owner = self.owner;
        GuardChain::new()
            .role(caller, &[owner])
            .argument(argument_ok, error)
            .enter(self)
    }

    /// Guardian onboarding: stake must meet the current price
    pub fn guard_join(&mut self, stake_amount: u64) -> Result<()> {
        let price = self.stake_price;
        GuardChain::new()
            .argument(stake_amount >= price, VaultError::StakeTooLow)
            .enter(self)
    }

    /// Guardian offboarding; per-vault checks happen on the guardian record
    pub fn guard_quit(&mut self) -> Result<()> {
        GuardChain::new().enter(self)
    }

    pub fn set_stake_price(&mut self, new_price: u64) -> ParameterChange {
        let old = self.stake_price;
        self.stake_price = new_price;
        ParameterChange { old, new: new_price }
    }

    pub fn set_fee_cut(&mut self, new_cut: u64) -> Result<ParameterChange> {
        require!(is_valid_fee_cut(new_cut), VaultError::InvalidFeeCut);
        let old = self.fee_cut_divisor;
        self.fee_cut_divisor = new_cut;
        Ok(ParameterChange { old, new: new_cut })
    }

    pub fn record_stake(&mut self, amount: u64) -> Result<()> {
        self.total_staked = self
            .total_staked
            .checked_add(amount)
            .ok_or(VaultError::MathOverflow)?;
        self.guardian_count = self
            .guardian_count
            .checked_add(1)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    pub fn release_stake(&mut self, amount: u64) -> Result<()> {
        self.total_staked = self
            .total_staked
            .checked_sub(amount)
            .ok_or(VaultError::MathOverflow)?;
        self.guardian_count = self.guardian_count.saturating_sub(1);
        Ok(())
    }

    /// Owner-only sweep entry. Takes the reentrancy flag and returns the
    /// amount of `mint` that may leave, given the registry's `balance`.
    pub fn authorize_sweep(
        &mut self,
        caller: &Pubkey,
        mint: &Pubkey,
        balance: u64,
    ) -> Result<u64> {
        self.guard_admin(caller, true, VaultError::ZeroAmount)?;
        Ok(self.sweepable(mint, balance))
    }

    /// Amount of `mint` held by the registry that is not owed to anyone.
    /// Escrowed guardian stakes are never sweepable.
    pub fn sweepable(&self, mint: &Pubkey, balance: u64) -> u64 {
        if *mint == self.stake_mint {
            balance.saturating_sub(self.total_staked)
        } else {
            balance
        }
    }
}
