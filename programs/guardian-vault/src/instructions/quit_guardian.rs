use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::{constants::*, errors::*, events::*, guard::Reentrant, state::*};

/// Leave the registry, deactivate every owned vault and take the stake back
///
/// Every vault the guardian owns is passed, writable, in the remaining
/// accounts. Vaults outside the base asset must hold no position.
#[derive(Accounts)]
pub struct QuitGuardian<'info> {
    #[account(mut)]
    pub guardian: Signer<'info>,

    #[account(
        mut,
        seeds = [REGISTRY_SEED],
        bump = registry.bump,
    )]
    pub registry: Box<Account<'info, GuardianRegistry>>,

    #[account(
        mut,
        seeds = [GUARDIAN_SEED, guardian.key().as_ref()],
        bump = guardian_account.bump,
    )]
    pub guardian_account: Box<Account<'info, GuardianAccount>>,

    /// Guardian's stake token account (destination)
    #[account(
        mut,
        constraint = guardian_stake_account.mint == registry.stake_mint @ VaultError::InvalidMint,
        constraint = guardian_stake_account.owner == guardian.key() @ VaultError::InvalidOwner,
    )]
    pub guardian_stake_account: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        associated_token::mint = registry.stake_mint,
        associated_token::authority = registry,
    )]
    pub stake_escrow: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

pub fn handler<'info>(ctx: Context<'_, '_, 'info, 'info, QuitGuardian<'info>>) -> Result<()> {
    ctx.accounts.registry.guard_quit()?;
    ctx.accounts.registry.exit(&crate::ID)?;

    let registry_key = ctx.accounts.registry.key();
    let mut vaults: Vec<Account<'info, VaultState>> =
        Vec::with_capacity(ctx.remaining_accounts.len());
    for info in ctx.remaining_accounts.iter() {
        require!(info.is_writable, VaultError::UnknownVault);
        let vault = Account::<VaultState>::try_from(info)?;
        require_keys_eq!(vault.registry, registry_key, VaultError::UnknownVault);
        vaults.push(vault);
    }

    // CHECKS: every owned vault presented, non-base vaults fully divested
    {
        let presented: Vec<(Pubkey, &VaultState)> =
            vaults.iter().map(|vault| (vault.key(), &**vault)).collect();
        ctx.accounts
            .guardian_account
            .check_quit(&presented, &ctx.accounts.registry.base_asset_mint)?;
    }

    // EFFECTS
    let mut vaults_deactivated = 0u32;
    for vault in vaults.iter_mut() {
        if vault.retire()? {
            vaults_deactivated += 1;
        }
        vault.exit(&crate::ID)?;
    }

    let stake = ctx.accounts.guardian_account.retire();
    ctx.accounts.registry.release_stake(stake)?;

    // INTERACTIONS: Return the stake from escrow
    if stake > 0 {
        let bump = ctx.accounts.registry.bump;
        let registry_seeds: &[&[u8]] = &[REGISTRY_SEED, &[bump]];
        let signer_seeds = &[registry_seeds];

        token::transfer(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                Transfer {
                    from: ctx.accounts.stake_escrow.to_account_info(),
                    to: ctx.accounts.guardian_stake_account.to_account_info(),
                    authority: ctx.accounts.registry.to_account_info(),
                },
                signer_seeds,
            ),
            stake,
        )?;
    }

    ctx.accounts.registry.release();

    emit!(GuardianQuit {
        guardian: ctx.accounts.guardian.key(),
        stake_returned: stake,
        vaults_deactivated,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
