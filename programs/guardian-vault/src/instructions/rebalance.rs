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

/// Unwind every position and re-invest idle capital by the current weights
///
/// Security considerations:
/// - Guardian or registry owner only, Active vaults only
/// - Every market call is slippage and deadline bounded
///
/// Remaining accounts: the market accounts of every adapter slot, in slot
/// order.
#[derive(Accounts)]
pub struct Rebalance<'info> {
    pub caller: Signer<'info>,

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
    mut ctx: Context<'_, '_, '_, 'info, Rebalance<'info>>,
    reference_rates: Vec<u64>,
) -> Result<()> {
    let caller = ctx.accounts.caller.key();
    let registry_owner = ctx.accounts.registry.owner;
    ctx.accounts
        .vault_state
        .guard_rebalance(&caller, &registry_owner)?;
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
    let outcome = vault_state.rebalance(&mut adapters, &bounds)?;
    vault_state.release();

    emit!(Rebalanced {
        vault: vault_state.key(),
        caller,
        divested: outcome.divested,
        invested: outcome.invested,
        total_assets: vault_state.total_assets_managed()?,
        timestamp: now,
    });

    Ok(())
}
