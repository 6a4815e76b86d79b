use anchor_lang::prelude::*;
use anchor_spl::token::{self, Burn, Mint, Token, TokenAccount, Transfer};

use crate::{
    adapters::cpi::{build_adapters, VaultSigner},
    constants::*,
    errors::*,
    events::*,
    guard::Reentrant,
    state::*,
};

/// Burn shares and receive assets, divesting from markets when idle is short.
/// Shared by `withdraw` (exact assets) and `redeem` (exact shares).
///
/// Stays open once the vault is Inactive.
///
/// Remaining accounts: the market accounts of every adapter slot, in slot
/// order. May be empty when idle covers the payout.
#[derive(Accounts)]
pub struct Withdraw<'info> {
    /// Share owner, signs the burn
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.guardian.as_ref(), vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Box<Account<'info, VaultState>>,

    #[account(
        mut,
        address = vault_state.share_mint,
    )]
    pub share_mint: Box<Account<'info, Mint>>,

    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.key().as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// Owner's share token account (burned from)
    #[account(
        mut,
        constraint = owner_share_account.mint == vault_state.share_mint @ VaultError::InvalidMint,
        constraint = owner_share_account.owner == owner.key() @ VaultError::InvalidOwner,
    )]
    pub owner_share_account: Box<Account<'info, TokenAccount>>,

    /// Receiver's asset token account (destination)
    #[account(
        mut,
        constraint = receiver_asset_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
    )]
    pub receiver_asset_account: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = vault_asset_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = vault_asset_account.owner == vault_authority.key() @ VaultError::InvalidOwner,
    )]
    pub vault_asset_account: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

/// What the caller fixes when leaving the vault
#[derive(Clone, Copy, Debug)]
pub enum ExitRequest {
    Assets(u64),
    Shares(u64),
}

impl ExitRequest {
    fn amount(self) -> u64 {
        match self {
            ExitRequest::Assets(amount) | ExitRequest::Shares(amount) => amount,
        }
    }
}

pub fn handler<'info>(
    ctx: Context<'_, '_, '_, 'info, Withdraw<'info>>,
    assets: u64,
    reference_rates: Vec<u64>,
) -> Result<()> {
    process_exit(ctx, ExitRequest::Assets(assets), &reference_rates)
}

pub(crate) fn process_exit<'info>(
    mut ctx: Context<'_, '_, '_, 'info, Withdraw<'info>>,
    request: ExitRequest,
    reference_rates: &[u64],
) -> Result<()> {
    // CHECKS: reentrancy, amount
    ctx.accounts.vault_state.guard_exit(request.amount())?;
    ctx.accounts.vault_state.exit(&crate::ID)?;

    let now = Clock::get()?.unix_timestamp;
    let accounts = &mut ctx.accounts;

    let token_program = accounts.token_program.to_account_info();
    let vault_authority = accounts.vault_authority.to_account_info();
    let vault_asset = accounts.vault_asset_account.to_account_info();
    let owner = accounts.owner.to_account_info();
    let owner_shares_info = accounts.owner_share_account.to_account_info();
    let receiver_asset = accounts.receiver_asset_account.to_account_info();
    let share_mint = accounts.share_mint.to_account_info();
    let owner_shares = accounts.owner_share_account.amount;

    let signer = VaultSigner::new(
        &accounts.vault_state,
        vault_authority.clone(),
        vault_asset.clone(),
        token_program.clone(),
    );
    let mut adapters = build_adapters(
        &accounts.vault_state,
        &signer,
        ctx.remaining_accounts,
        reference_rates,
    )?;

    let vault_key = accounts.vault_state.key();
    let authority_bump = accounts.vault_state.authority_bump;
    let bounds = accounts.vault_state.execution_bounds(now);

    let settle = |shares: u64, assets: u64| -> Result<()> {
        token::burn(
            CpiContext::new(
                token_program.clone(),
                Burn {
                    mint: share_mint.clone(),
                    from: owner_shares_info.clone(),
                    authority: owner.clone(),
                },
            ),
            shares,
        )?;

        let authority_seeds: &[&[u8]] = &[
            VAULT_AUTHORITY_SEED,
            vault_key.as_ref(),
            &[authority_bump],
        ];
        let signer_seeds = &[authority_seeds];
        token::transfer(
            CpiContext::new_with_signer(
                token_program.clone(),
                Transfer {
                    from: vault_asset.clone(),
                    to: receiver_asset.clone(),
                    authority: vault_authority.clone(),
                },
                signer_seeds,
            ),
            assets,
        )
    };

    let outcome = match request {
        ExitRequest::Assets(assets) => accounts.vault_state.withdraw(
            assets,
            owner_shares,
            &mut adapters,
            &bounds,
            settle,
        )?,
        ExitRequest::Shares(shares) => accounts.vault_state.redeem(
            shares,
            owner_shares,
            &mut adapters,
            &bounds,
            settle,
        )?,
    };

    let vault_state = &mut accounts.vault_state;
    vault_state.release();

    let timestamp = Clock::get()?.unix_timestamp;
    if outcome.divested > 0 {
        emit!(Divested {
            vault: vault_key,
            amount: outcome.divested,
            idle_assets: vault_state.idle_assets,
            invested_assets: vault_state.invested_assets()?,
            timestamp,
        });
    }
    emit!(Withdrawn {
        vault: vault_key,
        owner: accounts.owner.key(),
        receiver: accounts.receiver_asset_account.owner,
        asset_amount: outcome.assets,
        shares_burned: outcome.shares,
        total_assets: vault_state.total_assets_managed()?,
        total_shares: vault_state.total_shares,
        timestamp,
    });

    Ok(())
}
