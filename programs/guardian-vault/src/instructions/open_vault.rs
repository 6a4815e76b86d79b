use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{Mint, Token, TokenAccount},
};

use crate::{constants::*, errors::*, events::*, state::*};

/// Open a vault for another asset under an existing guardianship
#[derive(Accounts)]
pub struct OpenVault<'info> {
    #[account(mut)]
    pub guardian: Signer<'info>,

    #[account(
        seeds = [REGISTRY_SEED],
        bump = registry.bump,
    )]
    pub registry: Box<Account<'info, GuardianRegistry>>,

    #[account(
        mut,
        seeds = [GUARDIAN_SEED, guardian.key().as_ref()],
        bump = guardian_account.bump,
        constraint = guardian_account.active @ VaultError::GuardianNotActive,
    )]
    pub guardian_account: Box<Account<'info, GuardianAccount>>,

    pub asset_mint: Box<Account<'info, Mint>>,

    #[account(
        init,
        payer = guardian,
        space = VaultState::SPACE,
        seeds = [VAULT_SEED, guardian.key().as_ref(), asset_mint.key().as_ref()],
        bump
    )]
    pub vault_state: Box<Account<'info, VaultState>>,

    #[account(
        init,
        payer = guardian,
        seeds = [SHARE_MINT_SEED, vault_state.key().as_ref()],
        bump,
        mint::decimals = asset_mint.decimals,
        mint::authority = vault_authority,
    )]
    pub share_mint: Box<Account<'info, Mint>>,

    /// CHECK: PDA used as mint and token authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.key().as_ref()],
        bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        init,
        payer = guardian,
        associated_token::mint = asset_mint,
        associated_token::authority = vault_authority,
    )]
    pub vault_asset_account: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<OpenVault>) -> Result<()> {
    let guardian = ctx.accounts.guardian.key();
    let asset_mint = ctx.accounts.asset_mint.key();
    let vault_key = ctx.accounts.vault_state.key();

    ctx.accounts
        .guardian_account
        .register_vault(asset_mint, vault_key)?;

    let registry_key = ctx.accounts.registry.key();
    ctx.accounts.vault_state.open(
        registry_key,
        &ctx.accounts.registry,
        guardian,
        asset_mint,
        ctx.accounts.share_mint.key(),
        VaultBumps {
            vault: ctx.bumps.vault_state,
            share_mint: ctx.bumps.share_mint,
            authority: ctx.bumps.vault_authority,
        },
    );

    emit!(VaultCreated {
        vault: vault_key,
        guardian,
        asset_mint,
        share_mint: ctx.accounts.share_mint.key(),
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
