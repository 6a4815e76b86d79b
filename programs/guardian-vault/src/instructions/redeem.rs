use anchor_lang::prelude::*;

use crate::instructions::withdraw::{process_exit, ExitRequest, Withdraw};

/// Burn exactly `shares` for their current asset value (rounded down)
pub fn handler<'info>(
    ctx: Context<'_, '_, '_, 'info, Withdraw<'info>>,
    shares: u64,
    reference_rates: Vec<u64>,
) -> Result<()> {
    process_exit(ctx, ExitRequest::Shares(shares), &reference_rates)
}
