use anchor_lang::prelude::*;

use crate::{constants::*, events::*, guard::Reentrant, state::*};

/// Set slippage tolerance, deadline buffer and deposit cap
#[derive(Accounts)]
pub struct ConfigureVault<'info> {
    pub guardian: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.guardian.as_ref(), vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Box<Account<'info, VaultState>>,
}

pub fn handler(
    ctx: Context<ConfigureVault>,
    slippage_bps: u16,
    deadline_buffer: i64,
    deposit_cap: u64,
) -> Result<()> {
    let caller = ctx.accounts.guardian.key();
    let vault_state = &mut ctx.accounts.vault_state;
    vault_state.guard_manage(&caller)?;

    vault_state.configure(slippage_bps, deadline_buffer, deposit_cap)?;
    vault_state.release();

    emit!(VaultConfigured {
        vault: vault_state.key(),
        slippage_bps,
        deadline_buffer,
        deposit_cap,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
