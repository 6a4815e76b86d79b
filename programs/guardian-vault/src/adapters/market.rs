use anchor_lang::prelude::*;

use crate::{
    constants::{BPS_DENOMINATOR, LIQUIDITY_MARKET_FEE_BPS, RATE_SCALE},
    errors::VaultError,
    math::mul_div_floor,
};

/// Token side of a liquidity market pair, from the vault's point of view
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// The vault's own asset
    Asset,
    /// The other token of the pair
    Counter,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Asset => Side::Counter,
            Side::Counter => Side::Asset,
        }
    }
}

/// Amounts reported by an add-liquidity call
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LiquidityAdded {
    pub asset_used: u64,
    pub counter_used: u64,
    pub liquidity: u64,
}

/// Interface the vault expects from a constant-product liquidity market.
///
/// Swap bounds never come from the market itself; they are derived from the
/// caller's reference rate.
pub trait LiquidityMarket {
    /// Expected `(asset, counter)` returned for burning `liquidity`
    fn quote_remove_liquidity(&self, liquidity: u64) -> Result<(u64, u64)>;

    /// Allow the market to pull exactly `amount` of `side`. Returns whether
    /// the allowance is in place.
    fn approve(&mut self, side: Side, amount: u64) -> Result<bool>;

    /// Returns the amount of the opposite side received
    fn swap(&mut self, input: Side, amount_in: u64, minimum_out: u64, deadline: i64)
        -> Result<u64>;

    fn add_liquidity(
        &mut self,
        asset_desired: u64,
        counter_desired: u64,
        asset_min: u64,
        counter_min: u64,
        deadline: i64,
    ) -> Result<LiquidityAdded>;

    /// Returns `(asset, counter)` received
    fn remove_liquidity(
        &mut self,
        liquidity: u64,
        asset_min: u64,
        counter_min: u64,
        deadline: i64,
    ) -> Result<(u64, u64)>;
}

/// Interface the vault expects from a lending pool.
///
/// Receipt tokens are redeemable 1:1 for the underlying asset, interest
/// accrues as a growing receipt balance.
pub trait LendingPool {
    /// Allow the pool to pull exactly `amount` of the asset. Returns whether
    /// the allowance is in place.
    fn approve(&mut self, amount: u64) -> Result<bool>;

    /// Receipt tokens held by the vault
    fn receipt_balance(&self) -> Result<u64>;

    fn supply(&mut self, amount: u64) -> Result<()>;

    /// Returns the asset amount actually withdrawn
    fn withdraw(&mut self, amount: u64) -> Result<u64>;
}

/// Output of `amount_in` of `input` at `rate` counter units per asset unit
/// (scaled by `RATE_SCALE`), before fees
pub fn at_reference_rate(input: Side, amount_in: u64, rate: u64) -> Result<u64> {
    require!(rate > 0, VaultError::InvalidReferenceRate);
    match input {
        Side::Asset => mul_div_floor(amount_in, rate, RATE_SCALE),
        Side::Counter => mul_div_floor(amount_in, RATE_SCALE, rate),
    }
}

/// Counter units per asset unit implied by a pair of reserves
pub fn spot_rate(asset_reserve: u64, counter_reserve: u64) -> Result<u64> {
    mul_div_floor(counter_reserve, RATE_SCALE, asset_reserve)
}

/// Constant-product output for `amount_in` against `(reserve_in, reserve_out)`
/// after a basis-point fee on the input.
pub fn constant_product_out(
    amount_in: u64,
    reserve_in: u64,
    reserve_out: u64,
    fee_bps: u64,
) -> Result<u64> {
    if amount_in == 0 || reserve_in == 0 || reserve_out == 0 {
        return Ok(0);
    }
    let in_after_fee = (amount_in as u128)
        .checked_mul((BPS_DENOMINATOR - fee_bps) as u128)
        .ok_or(VaultError::MathOverflow)?;
    let numerator = in_after_fee
        .checked_mul(reserve_out as u128)
        .ok_or(VaultError::MathOverflow)?;
    let denominator = (reserve_in as u128)
        .checked_mul(BPS_DENOMINATOR as u128)
        .and_then(|v| v.checked_add(in_after_fee))
        .ok_or(VaultError::MathOverflow)?;
    u64::try_from(numerator / denominator).map_err(|_| error!(VaultError::MathOverflow))
}

/// Constant-product output with the market's default fee
pub fn quote_constant_product(amount_in: u64, reserve_in: u64, reserve_out: u64) -> Result<u64> {
    constant_product_out(amount_in, reserve_in, reserve_out, LIQUIDITY_MARKET_FEE_BPS)
}

/// Reserves owed to `liquidity` out of `supply` LP tokens
pub fn liquidity_share(
    liquidity: u64,
    supply: u64,
    asset_reserve: u64,
    counter_reserve: u64,
) -> Result<(u64, u64)> {
    if supply == 0 {
        return Ok((0, 0));
    }
    Ok((
        mul_div_floor(liquidity, asset_reserve, supply)?,
        mul_div_floor(liquidity, counter_reserve, supply)?,
    ))
}
