use anchor_lang::prelude::*;

use crate::errors::VaultError;

/// `value * numerator / denominator`, rounded down, with a u128 intermediate.
pub fn mul_div_floor(value: u64, numerator: u64, denominator: u64) -> Result<u64> {
    require!(denominator > 0, VaultError::DivisionByZero);
    let result = (value as u128)
        .checked_mul(numerator as u128)
        .ok_or(VaultError::MathOverflow)?
        / (denominator as u128);
    u64::try_from(result).map_err(|_| error!(VaultError::MathOverflow))
}

/// `value * numerator / denominator`, rounded up.
pub fn mul_div_ceil(value: u64, numerator: u64, denominator: u64) -> Result<u64> {
    require!(denominator > 0, VaultError::DivisionByZero);
    let product = (value as u128)
        .checked_mul(numerator as u128)
        .ok_or(VaultError::MathOverflow)?;
    let denominator = denominator as u128;
    let result = product
        .checked_add(denominator - 1)
        .ok_or(VaultError::MathOverflow)?
        / denominator;
    u64::try_from(result).map_err(|_| error!(VaultError::MathOverflow))
}

/// Portion of `amount` left after a basis-point haircut.
pub fn apply_bps_haircut(amount: u64, haircut_bps: u64, denominator: u64) -> Result<u64> {
    let kept = denominator
        .checked_sub(haircut_bps)
        .ok_or(VaultError::MathOverflow)?;
    mul_div_floor(amount, kept, denominator)
}
