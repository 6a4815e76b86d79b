use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, MintTo, Token, TokenAccount, Transfer};

use crate::{
    adapters::cpi::{build_adapters, VaultSigner},
    constants::*,
    errors::*,
    events::*,
    guard::Reentrant,
    state::*,
};

/// Deposit assets into the vault, receive shares and invest the deposit
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: User must be signer
/// ✅ 2. ACCOUNT OWNERSHIP: Vault state PDA validated with seeds
/// ✅ 6. MATH SAFETY: Checked share math with u128 intermediates
/// ✅ 7. TOKEN ACCOUNT VALIDATION: Validates mint and owner
/// ✅ 8. BUSINESS LOGIC: Fees carved out of the predicted shares
/// ✅ 10. EVENTS: Emits Deposited and Invested events
///
/// Remaining accounts: the market accounts of every adapter slot, in slot
/// order, with one reference rate per slot in the arguments.
#[derive(Accounts)]
pub struct Deposit<'info> {
    /// User depositing assets
    #[account(mut)]
    pub user: Signer<'info>,

    /// Registry holding the current fee cut
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

    /// User's asset token account (source)
    #[account(
        mut,
        constraint = user_asset_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = user_asset_account.owner == user.key() @ VaultError::InvalidOwner,
    )]
    pub user_asset_account: Box<Account<'info, TokenAccount>>,

    /// Receiver's share token account, credited with the user shares
    #[account(
        mut,
        constraint = receiver_share_account.mint == vault_state.share_mint @ VaultError::InvalidMint,
    )]
    pub receiver_share_account: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = guardian_share_account.mint == vault_state.share_mint @ VaultError::InvalidMint,
        constraint = guardian_share_account.owner == vault_state.guardian @ VaultError::InvalidOwner,
    )]
    pub guardian_share_account: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = treasury_share_account.mint == vault_state.share_mint @ VaultError::InvalidMint,
        constraint = treasury_share_account.owner == vault_state.treasury @ VaultError::InvalidOwner,
    )]
    pub treasury_share_account: Box<Account<'info, TokenAccount>>,

    /// Vault's asset token account
    #[account(
        mut,
        constraint = vault_asset_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = vault_asset_account.owner == vault_authority.key() @ VaultError::InvalidOwner,
    )]
    pub vault_asset_account: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

pub fn handler<'info>(
    mut ctx: Context<'_, '_, '_, 'info, Deposit<'info>>,
    assets: u64,
    reference_rates: Vec<u64>,
) -> Result<()> {
    // CHECKS: reentrancy, lifecycle, amount
    ctx.accounts.vault_state.guard_deposit(assets)?;
    ctx.accounts.vault_state.exit(&crate::ID)?;

    let now = Clock::get()?.unix_timestamp;
    let accounts = &mut ctx.accounts;

    let token_program = accounts.token_program.to_account_info();
    let vault_authority = accounts.vault_authority.to_account_info();
    let vault_asset = accounts.vault_asset_account.to_account_info();
    let user = accounts.user.to_account_info();
    let user_asset = accounts.user_asset_account.to_account_info();
    let share_mint = accounts.share_mint.to_account_info();
    let recipients = [
        accounts.receiver_share_account.to_account_info(),
        accounts.guardian_share_account.to_account_info(),
        accounts.treasury_share_account.to_account_info(),
    ];

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
        &reference_rates,
    )?;

    let vault_key = accounts.vault_state.key();
    let authority_bump = accounts.vault_state.authority_bump;
    let fee_cut_divisor = accounts.registry.fee_cut_divisor;
    let bounds = accounts.vault_state.execution_bounds(now);

    let outcome = accounts.vault_state.deposit(
        assets,
        fee_cut_divisor,
        &mut adapters,
        &bounds,
        |split| {
            // Pull the assets in
            token::transfer(
                CpiContext::new(
                    token_program.clone(),
                    Transfer {
                        from: user_asset.clone(),
                        to: vault_asset.clone(),
                        authority: user.clone(),
                    },
                ),
                assets,
            )?;

            // Mint user, guardian and treasury shares
            let authority_seeds: &[&[u8]] = &[
                VAULT_AUTHORITY_SEED,
                vault_key.as_ref(),
                &[authority_bump],
            ];
            let signer_seeds = &[authority_seeds];
            let amounts = [split.user, split.guardian_fee, split.treasury_fee];
            for (to, amount) in recipients.iter().zip(amounts) {
                if amount == 0 {
                    continue;
                }
                token::mint_to(
                    CpiContext::new_with_signer(
                        token_program.clone(),
                        MintTo {
                            mint: share_mint.clone(),
                            to: to.clone(),
                            authority: vault_authority.clone(),
                        },
                        signer_seeds,
                    ),
                    amount,
                )?;
            }
            Ok(())
        },
    )?;

    let vault_state = &mut accounts.vault_state;
    vault_state.release();

    let timestamp = Clock::get()?.unix_timestamp;
    emit!(Deposited {
        vault: vault_key,
        user: accounts.user.key(),
        receiver: accounts.receiver_share_account.owner,
        asset_amount: assets,
        shares_minted: outcome.split.user,
        guardian_fee: outcome.split.guardian_fee,
        treasury_fee: outcome.split.treasury_fee,
        total_assets: vault_state.total_assets_managed()?,
        total_shares: vault_state.total_shares,
        timestamp,
    });
    if outcome.invested > 0 {
        emit!(Invested {
            vault: vault_key,
            amount: outcome.invested,
            idle_assets: vault_state.idle_assets,
            invested_assets: vault_state.invested_assets()?,
            timestamp,
        });
    }

    Ok(())
}
