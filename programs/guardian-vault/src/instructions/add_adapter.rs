use anchor_lang::prelude::*;

use crate::{constants::*, events::*, guard::Reentrant, state::*};

/// Register an external market the vault may invest in
///
/// Security considerations:
/// - Guardian only, Active vaults only
/// - At most `MAX_ADAPTERS` slots, one slot per market account
/// - Total weight across slots stays within 100%
#[derive(Accounts)]
pub struct AddAdapter<'info> {
    pub guardian: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.guardian.as_ref(), vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Box<Account<'info, VaultState>>,
}

pub fn handler(
    ctx: Context<AddAdapter>,
    kind: AdapterKind,
    program: Pubkey,
    market: Pubkey,
    weight_bps: u16,
) -> Result<()> {
    let caller = ctx.accounts.guardian.key();
    let vault_state = &mut ctx.accounts.vault_state;
    vault_state.guard_manage(&caller)?;

    vault_state.add_adapter(kind, program, market, weight_bps)?;
    vault_state.release();

    emit!(AdapterAdded {
        vault: vault_state.key(),
        program,
        market,
        weight_bps,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
