use anchor_lang::prelude::*;

use crate::{constants::*, errors::*, events::*, guard::Reentrant, state::*};

/// Admin parameter update on the registry. Owner only.
#[derive(Accounts)]
pub struct UpdateRegistry<'info> {
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [REGISTRY_SEED],
        bump = registry.bump,
    )]
    pub registry: Box<Account<'info, GuardianRegistry>>,
}

pub fn handler(ctx: Context<UpdateRegistry>, new_price: u64) -> Result<()> {
    let caller = ctx.accounts.owner.key();
    let registry = &mut ctx.accounts.registry;
    registry.guard_admin(&caller, new_price > 0, VaultError::ZeroAmount)?;

    let change = registry.set_stake_price(new_price);
    registry.release();

    emit!(StakePriceUpdated {
        old: change.old,
        new: change.new,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
