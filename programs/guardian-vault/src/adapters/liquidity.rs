use anchor_lang::prelude::*;

use crate::{
    adapters::{
        at_reference_rate, DivestOutcome, DivestRequest, ExecutionBounds, LiquidityMarket, Side,
        YieldAdapter,
    },
    errors::VaultError,
    state::{AdapterKind, Position},
};

/// Adapter for a constant-product liquidity market.
///
/// Invest swaps half of the amount into the counter token and adds both
/// halves as liquidity; divest removes liquidity and swaps the counter side
/// back into the asset.
///
/// Swap minimums are taken from `reference_rate`, supplied by the caller of
/// the instruction, so a pool pushed off its price before the call cannot
/// loosen them.
pub struct LiquidityAdapter<M> {
    market: M,
    /// Counter units per asset unit, scaled by `RATE_SCALE`
    reference_rate: u64,
}

impl<M: LiquidityMarket> LiquidityAdapter<M> {
    pub fn new(market: M, reference_rate: u64) -> Self {
        Self {
            market,
            reference_rate,
        }
    }

    pub fn market(&self) -> &M {
        &self.market
    }

    pub fn into_inner(self) -> M {
        self.market
    }

    fn approve_exact(&mut self, side: Side, amount: u64) -> Result<()> {
        let approved = self.market.approve(side, amount)?;
        require!(approved, VaultError::ApprovalFailed);
        Ok(())
    }

    fn expected_output(&self, input: Side, amount_in: u64) -> Result<u64> {
        at_reference_rate(input, amount_in, self.reference_rate)
    }

    /// Bounded swap of `amount_in` of `input`; returns the output received
    fn bounded_swap(
        &mut self,
        input: Side,
        amount_in: u64,
        deadline: i64,
        bounds: &ExecutionBounds,
    ) -> Result<u64> {
        let expected = self.expected_output(input, amount_in)?;
        let minimum_out = bounds.swap_minimum(expected)?;

        self.approve_exact(input, amount_in)?;
        let output = self.market.swap(input, amount_in, minimum_out, deadline)?;
        require!(output >= minimum_out, VaultError::SlippageExceeded);

        msg!(
            "Swap {:?} in: {}, out: {}, min: {}, deadline: {}",
            input,
            amount_in,
            output,
            minimum_out,
            deadline
        );
        Ok(output)
    }
}

impl<M: LiquidityMarket> YieldAdapter for LiquidityAdapter<M> {
    fn kind(&self) -> AdapterKind {
        AdapterKind::LiquidityMarket
    }

    fn invest(
        &mut self,
        position: &mut Position,
        amount: u64,
        bounds: &ExecutionBounds,
    ) -> Result<u64> {
        let amount_to_swap = amount / 2;
        require!(amount_to_swap > 0, VaultError::ZeroAmount);
        let deadline = bounds.deadline()?;

        let swap_output = self.bounded_swap(Side::Asset, amount_to_swap, deadline, bounds)?;

        // What the vault actually still holds for this operation. The swap's
        // input was spent and must not be counted again.
        let remaining_asset = amount
            .checked_sub(amount_to_swap)
            .ok_or(VaultError::MathOverflow)?;

        self.approve_exact(Side::Asset, remaining_asset)?;
        self.approve_exact(Side::Counter, swap_output)?;

        let asset_min = bounds.minimum_out(remaining_asset)?;
        let counter_min = bounds.minimum_out(swap_output)?;
        let added = self.market.add_liquidity(
            remaining_asset,
            swap_output,
            asset_min,
            counter_min,
            deadline,
        )?;
        require!(
            added.asset_used >= asset_min && added.counter_used >= counter_min,
            VaultError::SlippageExceeded
        );
        require!(added.liquidity > 0, VaultError::SlippageExceeded);

        let spare_counter = swap_output
            .checked_sub(added.counter_used)
            .ok_or(VaultError::MathOverflow)?;
        let consumed = amount_to_swap
            .checked_add(added.asset_used)
            .ok_or(VaultError::MathOverflow)?;
        position.record(added.liquidity, consumed)?;
        position.hold_counter(spare_counter)?;

        msg!(
            "AddLiquidity asset: {}, counter: {}, liquidity: {}, spare counter: {}",
            added.asset_used,
            added.counter_used,
            added.liquidity,
            spare_counter
        );
        Ok(consumed)
    }

    fn divest(
        &mut self,
        position: &mut Position,
        request: DivestRequest,
        bounds: &ExecutionBounds,
    ) -> Result<DivestOutcome> {
        let liquidity = match request {
            DivestRequest::All => position.receipt,
            DivestRequest::Assets(assets) => position.receipt_for(assets)?,
        };
        require!(liquidity > 0, VaultError::ZeroAmount);
        let deadline = bounds.deadline()?;
        let spare_counter = position.counter_share(liquidity)?;

        let (expected_asset, expected_counter) = self.market.quote_remove_liquidity(liquidity)?;
        let asset_min = bounds.minimum_out(expected_asset)?;
        let counter_min = bounds.minimum_out(expected_counter)?;

        let (asset_out, counter_out) =
            self.market
                .remove_liquidity(liquidity, asset_min, counter_min, deadline)?;
        require!(
            asset_out >= asset_min && counter_out >= counter_min,
            VaultError::SlippageExceeded
        );
        msg!(
            "RemoveLiquidity liquidity: {}, asset: {}, counter: {}",
            liquidity,
            asset_out,
            counter_out
        );

        let counter_total = counter_out
            .checked_add(spare_counter)
            .ok_or(VaultError::MathOverflow)?;
        let mut received = asset_out;
        // Counter dust worth less than one asset unit is left where it is
        if self.expected_output(Side::Counter, counter_total)? > 0 {
            let swapped = self.bounded_swap(Side::Counter, counter_total, deadline, bounds)?;
            received = received
                .checked_add(swapped)
                .ok_or(VaultError::MathOverflow)?;
        }

        let cost_released = position.release(liquidity)?;
        Ok(DivestOutcome {
            received,
            cost_released,
        })
    }
}
