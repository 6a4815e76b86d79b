// Guardian Vault - per-asset share vaults managed by staked guardians
// Capital is invested across external markets through adapters with
// slippage and deadline bounds on every market call
// Architecture: Registry (guardians, stakes, admin parameters) + per-guardian vaults

#![allow(unexpected_cfgs)]

use anchor_lang::prelude::*;

pub mod adapters;
pub mod constants;
pub mod errors;
pub mod events;
pub mod guard;
pub mod instructions;
pub mod math;
pub mod operations;
pub mod state;

use instructions::*;
use state::AdapterKind;

declare_id!("GVau1tQk3nB8yQmJ6rZsT7eD4pXcW9fHvLuA2oYzK5sM");

#[program]
pub mod guardian_vault {
    use super::*;

    /// Create the guardian registry and its stake escrow
    ///
    /// Security considerations:
    /// - Owner is signer and becomes the only admin
    /// - Fee cut divisor must be greater than 2
    pub fn initialize_registry(
        ctx: Context<InitializeRegistry>,
        stake_price: u64,
        fee_cut_divisor: u64,
    ) -> Result<()> {
        instructions::initialize_registry::handler(ctx, stake_price, fee_cut_divisor)
    }

    /// Stake, become a guardian and open a vault for `asset_mint`
    ///
    /// Security considerations:
    /// - Stake must cover the current stake price
    /// - Stake is escrowed by the registry PDA
    pub fn become_guardian(ctx: Context<BecomeGuardian>, stake_amount: u64) -> Result<()> {
        instructions::become_guardian::handler(ctx, stake_amount)
    }

    /// Open a vault for another asset (active guardians only)
    pub fn open_vault(ctx: Context<OpenVault>) -> Result<()> {
        instructions::open_vault::handler(ctx)
    }

    /// Leave the registry and take the stake back
    ///
    /// Security considerations:
    /// - Every owned vault must be passed in the remaining accounts
    /// - Refused while a non-base-asset vault holds a position
    /// - Every owned vault becomes Inactive
    pub fn quit_guardian<'info>(
        ctx: Context<'_, '_, 'info, 'info, QuitGuardian<'info>>,
    ) -> Result<()> {
        instructions::quit_guardian::handler(ctx)
    }

    /// Register an external market for a vault
    pub fn add_adapter(
        ctx: Context<AddAdapter>,
        kind: AdapterKind,
        program: Pubkey,
        market: Pubkey,
        weight_bps: u16,
    ) -> Result<()> {
        instructions::add_adapter::handler(ctx, kind, program, market, weight_bps)
    }

    /// Replace every adapter weight (sum at most 10 000 bps)
    pub fn set_allocation(ctx: Context<SetAllocation>, weights: Vec<u16>) -> Result<()> {
        instructions::set_allocation::handler(ctx, weights)
    }

    pub fn configure_vault(
        ctx: Context<ConfigureVault>,
        slippage_bps: u16,
        deadline_buffer: i64,
        deposit_cap: u64,
    ) -> Result<()> {
        instructions::configure_vault::handler(ctx, slippage_bps, deadline_buffer, deposit_cap)
    }

    /// Deposit assets into the vault and receive shares
    ///
    /// Security considerations:
    /// - Validates user token accounts (mint, owner)
    /// - Guardian and treasury fees are carved out of the predicted shares
    /// - The deposit is invested by weight in the same instruction
    /// - Swap minimums come from `reference_rates` (one per adapter slot,
    ///   counter units per asset unit scaled by 1e9), never from pool reserves
    /// - Any failure, including a market call, reverts everything
    pub fn deposit<'info>(
        ctx: Context<'_, '_, '_, 'info, Deposit<'info>>,
        assets: u64,
        reference_rates: Vec<u64>,
    ) -> Result<()> {
        instructions::deposit::handler(ctx, assets, reference_rates)
    }

    /// Withdraw exactly `assets`, burning shares rounded up
    pub fn withdraw<'info>(
        ctx: Context<'_, '_, '_, 'info, Withdraw<'info>>,
        assets: u64,
        reference_rates: Vec<u64>,
    ) -> Result<()> {
        instructions::withdraw::handler(ctx, assets, reference_rates)
    }

    /// Redeem exactly `shares` for assets rounded down
    pub fn redeem<'info>(
        ctx: Context<'_, '_, '_, 'info, Withdraw<'info>>,
        shares: u64,
        reference_rates: Vec<u64>,
    ) -> Result<()> {
        instructions::redeem::handler(ctx, shares, reference_rates)
    }

    /// Divest every position and re-invest by the current weights
    pub fn rebalance<'info>(
        ctx: Context<'_, '_, '_, 'info, Rebalance<'info>>,
        reference_rates: Vec<u64>,
    ) -> Result<()> {
        instructions::rebalance::handler(ctx, reference_rates)
    }

    /// Deactivate a vault (registry owner only). Irreversible.
    pub fn set_not_active<'info>(
        ctx: Context<'_, '_, '_, 'info, SetNotActive<'info>>,
        reference_rates: Vec<u64>,
    ) -> Result<()> {
        instructions::set_not_active::handler(ctx, reference_rates)
    }

    pub fn update_guardian_stake_price(ctx: Context<UpdateRegistry>, new_price: u64) -> Result<()> {
        instructions::update_guardian_stake_price::handler(ctx, new_price)
    }

    pub fn update_guardian_and_dao_cut(ctx: Context<UpdateRegistry>, new_cut: u64) -> Result<()> {
        instructions::update_guardian_and_dao_cut::handler(ctx, new_cut)
    }

    /// Send excess registry tokens to the treasury (owner only)
    pub fn sweep_excess_token(ctx: Context<SweepExcessToken>) -> Result<()> {
        instructions::sweep_excess_token::handler(ctx)
    }
}
