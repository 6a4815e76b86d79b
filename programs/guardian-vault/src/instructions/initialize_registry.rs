use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{Mint, Token, TokenAccount},
};

use crate::{constants::*, errors::*, events::*, state::*};

/// Create the guardian registry and its stake escrow
#[derive(Accounts)]
pub struct InitializeRegistry<'info> {
    /// Registry owner
    /// Security: Must be signer, stored in state as the only admin
    #[account(mut)]
    pub owner: Signer<'info>,

    /// Registry PDA
    #[account(
        init,
        payer = owner,
        space = GuardianRegistry::SPACE,
        seeds = [REGISTRY_SEED],
        bump
    )]
    pub registry: Box<Account<'info, GuardianRegistry>>,

    /// Treasury wallet receiving fee shares and swept tokens
    /// CHECK: Any wallet can be the treasury; only its key is stored
    pub treasury: UncheckedAccount<'info>,

    /// Asset whose vault may keep positions when its guardian quits
    pub base_asset_mint: Box<Account<'info, Mint>>,

    /// Token guardians stake in
    pub stake_mint: Box<Account<'info, Mint>>,

    /// Stake escrow owned by the registry PDA
    #[account(
        init,
        payer = owner,
        associated_token::mint = stake_mint,
        associated_token::authority = registry,
    )]
    pub stake_escrow: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<InitializeRegistry>,
    stake_price: u64,
    fee_cut_divisor: u64,
) -> Result<()> {
    require!(
        is_valid_fee_cut(fee_cut_divisor),
        VaultError::InvalidFeeCut
    );

    let registry = &mut ctx.accounts.registry;
    registry.owner = ctx.accounts.owner.key();
    registry.treasury = ctx.accounts.treasury.key();
    registry.base_asset_mint = ctx.accounts.base_asset_mint.key();
    registry.stake_mint = ctx.accounts.stake_mint.key();
    registry.stake_price = stake_price;
    registry.fee_cut_divisor = fee_cut_divisor;
    registry.total_staked = 0;
    registry.guardian_count = 0;
    registry.locked = false;
    registry.bump = ctx.bumps.registry;

    emit!(RegistryInitialized {
        registry: registry.key(),
        owner: registry.owner,
        treasury: registry.treasury,
        base_asset_mint: registry.base_asset_mint,
        stake_mint: registry.stake_mint,
        stake_price,
        fee_cut_divisor,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
