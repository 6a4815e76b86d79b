use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{self, Mint, Token, TokenAccount, Transfer},
};

use crate::{constants::*, errors::*, events::*, guard::Reentrant, state::*};

/// Stake into the registry, become a guardian and open the first vault
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: Guardian must sign and pays for the new accounts
/// ✅ 2. ACCOUNT OWNERSHIP: Registry, guardian record and vault are PDAs
/// ✅ 7. TOKEN ACCOUNT VALIDATION: Stake accounts checked for mint and owner
/// ✅ 8. BUSINESS LOGIC: Stake must cover the current stake price
#[derive(Accounts)]
pub struct BecomeGuardian<'info> {
    #[account(mut)]
    pub guardian: Signer<'info>,

    #[account(
        mut,
        seeds = [REGISTRY_SEED],
        bump = registry.bump,
    )]
    pub registry: Box<Account<'info, GuardianRegistry>>,

    /// Guardian record; reused when a former guardian stakes again
    #[account(
        init_if_needed,
        payer = guardian,
        space = GuardianAccount::SPACE,
        seeds = [GUARDIAN_SEED, guardian.key().as_ref()],
        bump
    )]
    pub guardian_account: Box<Account<'info, GuardianAccount>>,

    /// Guardian's stake token account (source)
    #[account(
        mut,
        constraint = guardian_stake_account.mint == registry.stake_mint @ VaultError::InvalidMint,
        constraint = guardian_stake_account.owner == guardian.key() @ VaultError::InvalidOwner,
    )]
    pub guardian_stake_account: Box<Account<'info, TokenAccount>>,

    /// Registry stake escrow (destination)
    #[account(
        mut,
        associated_token::mint = registry.stake_mint,
        associated_token::authority = registry,
    )]
    pub stake_escrow: Box<Account<'info, TokenAccount>>,

    /// Asset the first vault manages
    pub asset_mint: Box<Account<'info, Mint>>,

    #[account(
        init,
        payer = guardian,
        space = VaultState::SPACE,
        seeds = [VAULT_SEED, guardian.key().as_ref(), asset_mint.key().as_ref()],
        bump
    )]
    pub vault_state: Box<Account<'info, VaultState>>,

    /// Share mint PDA, minted by the vault authority
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

    /// Vault's token account for idle assets
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

pub fn handler(ctx: Context<BecomeGuardian>, stake_amount: u64) -> Result<()> {
    ctx.accounts.registry.guard_join(stake_amount)?;
    ctx.accounts.registry.exit(&crate::ID)?;

    let guardian = ctx.accounts.guardian.key();
    let asset_mint = ctx.accounts.asset_mint.key();
    let vault_key = ctx.accounts.vault_state.key();

    // EFFECTS
    ctx.accounts
        .guardian_account
        .activate(guardian, stake_amount, ctx.bumps.guardian_account)?;
    ctx.accounts
        .guardian_account
        .register_vault(asset_mint, vault_key)?;
    ctx.accounts.registry.record_stake(stake_amount)?;

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

    // INTERACTIONS: Escrow the stake
    if stake_amount > 0 {
        token::transfer(
            CpiContext::new(
                ctx.accounts.token_program.to_account_info(),
                Transfer {
                    from: ctx.accounts.guardian_stake_account.to_account_info(),
                    to: ctx.accounts.stake_escrow.to_account_info(),
                    authority: ctx.accounts.guardian.to_account_info(),
                },
            ),
            stake_amount,
        )?;
    }

    ctx.accounts.registry.release();

    let timestamp = Clock::get()?.unix_timestamp;
    emit!(GuardianJoined {
        guardian,
        stake_amount,
        total_staked: ctx.accounts.registry.total_staked,
        timestamp,
    });
    emit!(VaultCreated {
        vault: vault_key,
        guardian,
        asset_mint,
        share_mint: ctx.accounts.share_mint.key(),
        timestamp,
    });

    Ok(())
}
