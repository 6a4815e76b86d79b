use anchor_lang::prelude::*;

use crate::{
    errors::*, events::*, guard::Reentrant,
    instructions::update_guardian_stake_price::UpdateRegistry, state::*,
};

/// Set the fee-cut divisor applied to future deposits
pub fn handler(ctx: Context<UpdateRegistry>, new_cut: u64) -> Result<()> {
    let caller = ctx.accounts.owner.key();
    let registry = &mut ctx.accounts.registry;
    registry.guard_admin(&caller, is_valid_fee_cut(new_cut), VaultError::InvalidFeeCut)?;

    let change = registry.set_fee_cut(new_cut)?;
    registry.release();

    emit!(FeeCutUpdated {
        old: change.old,
        new: change.new,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
