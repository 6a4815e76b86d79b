use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, Token, TokenAccount, Transfer};

use crate::{constants::*, errors::*, events::*, guard::Reentrant, state::*};

/// Send the registry's balance of a token to the treasury
///
/// Security considerations:
/// - Owner only; every other caller gets `AccessDenied` and nothing moves
/// - For the stake mint only the excess over escrowed stakes is swept
#[derive(Accounts)]
pub struct SweepExcessToken<'info> {
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [REGISTRY_SEED],
        bump = registry.bump,
    )]
    pub registry: Box<Account<'info, GuardianRegistry>>,

    pub mint: Box<Account<'info, Mint>>,

    /// Registry's token account (source)
    #[account(
        mut,
        constraint = registry_token_account.mint == mint.key() @ VaultError::InvalidMint,
        constraint = registry_token_account.owner == registry.key() @ VaultError::InvalidOwner,
    )]
    pub registry_token_account: Box<Account<'info, TokenAccount>>,

    /// Treasury's token account (destination)
    #[account(
        mut,
        constraint = treasury_token_account.mint == mint.key() @ VaultError::InvalidMint,
        constraint = treasury_token_account.owner == registry.treasury @ VaultError::InvalidOwner,
    )]
    pub treasury_token_account: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<SweepExcessToken>) -> Result<()> {
    let caller = ctx.accounts.owner.key();
    let mint = ctx.accounts.mint.key();
    let balance = ctx.accounts.registry_token_account.amount;
    let amount = ctx
        .accounts
        .registry
        .authorize_sweep(&caller, &mint, balance)?;
    ctx.accounts.registry.exit(&crate::ID)?;

    if amount > 0 {
        let bump = ctx.accounts.registry.bump;
        let registry_seeds: &[&[u8]] = &[REGISTRY_SEED, &[bump]];
        let signer_seeds = &[registry_seeds];

        token::transfer(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                Transfer {
                    from: ctx.accounts.registry_token_account.to_account_info(),
                    to: ctx.accounts.treasury_token_account.to_account_info(),
                    authority: ctx.accounts.registry.to_account_info(),
                },
                signer_seeds,
            ),
            amount,
        )?;
    }

    ctx.accounts.registry.release();

    emit!(TokenSwept {
        mint,
        amount,
        treasury: ctx.accounts.registry.treasury,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
