use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::{
    adapters::cpi::{build_adapters, VaultSigner},
    constants::*,
    errors::*,
    events::*,
    guard::Reentrant,
    state::*,
};

/// Deactivate a vault through the registry: divest every position into idle
/// and stop accepting deposits. Irreversible.
///
/// Remaining accounts: the market accounts of every adapter slot, in slot
/// order. May be empty when no position is open.
#[derive(Accounts)]
pub struct SetNotActive<'info> {
    /// Registry owner
    pub owner: Signer<'info>,

    #[account(
        seeds = [REGISTRY_SEED],
        bump = registry.bump,
        address = vault_state.registry,
    )]
    pub registry: Box<Account<'info, GuardianRegistry>>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.guardian.as_ref(), vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Box<Account<'info, VaultState>>,

    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.key().as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        constraint = vault_asset_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = vault_asset_account.owner == vault_authority.key() @ VaultError::InvalidOwner,
    )]
    pub vault_asset_account: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

pub fn handler<'info>(
    mut ctx: Context<'_, '_, '_, 'info, SetNotActive<'info>>,
    reference_rates: Vec<u64>,
) -> Result<()> {
    let caller = ctx.accounts.owner.key();
    let registry_owner = ctx.accounts.registry.owner;
    ctx.accounts
        .vault_state
        .guard_deactivate(&caller, &registry_owner)?;
    ctx.accounts.vault_state.exit(&crate::ID)?;

    let now = Clock::get()?.unix_timestamp;
    let accounts = &mut ctx.accounts;
    let signer = VaultSigner::new(
        &accounts.vault_state,
        accounts.vault_authority.to_account_info(),
        accounts.vault_asset_account.to_account_info(),
        accounts.token_program.to_account_info(),
    );
    let mut adapters = build_adapters(
        &accounts.vault_state,
        &signer,
        ctx.remaining_accounts,
        &reference_rates,
    )?;
    let bounds = accounts.vault_state.execution_bounds(now);

    let vault_state = &mut accounts.vault_state;
    let divested = vault_state.deactivate(&mut adapters, &bounds)?;
    vault_state.release();

    emit!(VaultDeactivated {
        vault: vault_state.key(),
        divested,
        timestamp: now,
    });

    Ok(())
}
