//! Investment adapters
//!
//! An adapter moves vault capital into one external market and back. The
//! orchestration logic is written against the [`LiquidityMarket`] and
//! [`LendingPool`] traits; [`cpi`] backs them with real market programs.
//! Adapters keep no state of their own: the position they update is handed
//! in by the vault for each call.

use anchor_lang::prelude::*;

use crate::{
    constants::{BPS_DENOMINATOR, MAX_SLIPPAGE_BPS},
    errors::VaultError,
    math::apply_bps_haircut,
    state::{AdapterKind, Position},
};

pub mod cpi;
pub mod lending;
pub mod liquidity;
pub mod market;

pub use lending::*;
pub use liquidity::*;
pub use market::*;

/// Slippage and deadline bounds applied to every market call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutionBounds {
    pub slippage_bps: u16,
    pub deadline_buffer: i64,
    /// Clock reading at the start of the instruction
    pub now: i64,
}

impl ExecutionBounds {
    /// `now + buffer`; never `now` itself
    pub fn deadline(&self) -> Result<i64> {
        require!(self.deadline_buffer > 0, VaultError::InvalidDeadlineBuffer);
        self.now
            .checked_add(self.deadline_buffer)
            .ok_or(error!(VaultError::MathOverflow))
    }

    /// Minimum acceptable output for an `expected` output.
    ///
    /// Non-zero whenever `expected` is non-zero, even when the haircut rounds
    /// down to nothing.
    pub fn minimum_out(&self, expected: u64) -> Result<u64> {
        require!(
            self.slippage_bps <= MAX_SLIPPAGE_BPS,
            VaultError::InvalidSlippage
        );
        if expected == 0 {
            return Ok(0);
        }
        let minimum = apply_bps_haircut(expected, self.slippage_bps as u64, BPS_DENOMINATOR)?;
        Ok(minimum.max(1))
    }

    /// Minimum output for a swap; a swap with nothing expected is refused
    pub fn swap_minimum(&self, expected: u64) -> Result<u64> {
        require!(expected > 0, VaultError::SlippageExceeded);
        self.minimum_out(expected)
    }
}

/// How much of a position to unwind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DivestRequest {
    /// Close the whole position
    All,
    /// Unwind enough receipt to cover this many asset units of book value
    Assets(u64),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DivestOutcome {
    /// Asset units returned to the vault's idle balance
    pub received: u64,
    /// Book value removed from the position
    pub cost_released: u64,
}

/// Capability moving vault funds into one external market and back
pub trait YieldAdapter {
    fn kind(&self) -> AdapterKind;

    /// Invest `amount` asset units. Returns the asset units actually consumed;
    /// anything not consumed stays in the vault's asset account.
    fn invest(
        &mut self,
        position: &mut Position,
        amount: u64,
        bounds: &ExecutionBounds,
    ) -> Result<u64>;

    fn divest(
        &mut self,
        position: &mut Position,
        request: DivestRequest,
        bounds: &ExecutionBounds,
    ) -> Result<DivestOutcome>;
}
