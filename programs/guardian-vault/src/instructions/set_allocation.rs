use anchor_lang::prelude::*;

use crate::{constants::*, events::*, guard::Reentrant, state::*};

/// Replace the allocation weight of every adapter slot
#[derive(Accounts)]
pub struct SetAllocation<'info> {
    pub guardian: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.guardian.as_ref(), vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Box<Account<'info, VaultState>>,
}

pub fn handler(ctx: Context<SetAllocation>, weights: Vec<u16>) -> Result<()> {
    let caller = ctx.accounts.guardian.key();
    let vault_state = &mut ctx.accounts.vault_state;
    vault_state.guard_manage(&caller)?;

    // New weights apply to future investments; call rebalance to move
    // existing positions
    vault_state.set_allocation(&weights)?;
    vault_state.release();

    emit!(AllocationUpdated {
        vault: vault_state.key(),
        weights,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
