use anchor_lang::prelude::*;

use crate::{
    adapters::{DivestOutcome, DivestRequest, ExecutionBounds, LendingPool, YieldAdapter},
    errors::VaultError,
    math::mul_div_floor,
    state::{AdapterKind, Position},
};

/// Adapter for a lending pool issuing 1:1 interest-bearing receipts.
pub struct LendingAdapter<P> {
    pool: P,
}

impl<P: LendingPool> LendingAdapter<P> {
    pub fn new(pool: P) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn into_inner(self) -> P {
        self.pool
    }
}

impl<P: LendingPool> YieldAdapter for LendingAdapter<P> {
    fn kind(&self) -> AdapterKind {
        AdapterKind::LendingMarket
    }

    fn invest(
        &mut self,
        position: &mut Position,
        amount: u64,
        _bounds: &ExecutionBounds,
    ) -> Result<u64> {
        require!(amount > 0, VaultError::ZeroAmount);

        let approved = self.pool.approve(amount)?;
        require!(approved, VaultError::ApprovalFailed);

        let before = self.pool.receipt_balance()?;
        self.pool.supply(amount)?;
        let minted = self
            .pool
            .receipt_balance()?
            .checked_sub(before)
            .ok_or(VaultError::MathOverflow)?;
        require!(minted > 0, VaultError::SlippageExceeded);

        position.record(minted, amount)?;
        msg!("Supply amount: {}, receipt: {}", amount, minted);
        Ok(amount)
    }

    fn divest(
        &mut self,
        position: &mut Position,
        request: DivestRequest,
        _bounds: &ExecutionBounds,
    ) -> Result<DivestOutcome> {
        let claimable = self.pool.receipt_balance()?;
        let amount = match request {
            DivestRequest::All => claimable,
            DivestRequest::Assets(assets) => assets.min(claimable),
        };
        require!(amount > 0, VaultError::ZeroAmount);

        let withdrawn = self.pool.withdraw(amount)?;
        // A short withdrawal must surface, not silently shrink the payout
        require!(withdrawn == amount, VaultError::PartialWithdrawal);

        let receipt = if amount == claimable {
            position.receipt
        } else {
            mul_div_floor(position.receipt, amount, claimable)?
        };
        let cost_released = position.release(receipt)?;

        msg!("Withdraw amount: {}, receipt released: {}", amount, receipt);
        Ok(DivestOutcome {
            received: withdrawn,
            cost_released,
        })
    }
}
