//! In-memory markets for driving adapters and vault operations off-chain.
//!
//! Mock state sits behind `Rc<RefCell<..>>` so a test can keep a handle on it
//! after the market has been boxed into an adapter.

#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use anchor_lang::prelude::*;
use guardian_vault::{
    adapters::{
        liquidity_share, quote_constant_product, spot_rate, ExecutionBounds, LendingAdapter,
        LendingPool, LiquidityAdapter, LiquidityAdded, LiquidityMarket, Side, YieldAdapter,
    },
    constants::*,
    errors::VaultError,
    math::mul_div_floor,
    state::{GuardianRegistry, Lifecycle, VaultBumps, VaultState},
};

pub const NOW: i64 = 1_700_000_000;

pub fn bounds() -> ExecutionBounds {
    ExecutionBounds {
        slippage_bps: DEFAULT_SLIPPAGE_BPS,
        deadline_buffer: DEFAULT_DEADLINE_BUFFER,
        now: NOW,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapCall {
    pub input: Side,
    pub amount_in: u64,
    pub minimum_out: u64,
    pub deadline: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddCall {
    pub asset_desired: u64,
    pub counter_desired: u64,
    pub asset_min: u64,
    pub counter_min: u64,
    pub deadline: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoveCall {
    pub liquidity: u64,
    pub asset_min: u64,
    pub counter_min: u64,
    pub deadline: i64,
}

/// Constant-product pool plus the vault's balances on its side
#[derive(Debug, Default)]
pub struct MarketState {
    pub asset_reserve: u64,
    pub counter_reserve: u64,
    pub lp_supply: u64,

    pub vault_asset: u64,
    pub vault_counter: u64,
    pub vault_lp: u64,

    /// Indexed by `side_index`
    pub allowance: [u64; 2],

    /// Fixed swap output instead of the constant-product quote
    pub swap_output: Option<u64>,
    /// Units withheld from every swap output after quoting
    pub swap_haircut: u64,
    pub refuse_approval: bool,

    pub swaps: Vec<SwapCall>,
    pub adds: Vec<AddCall>,
    pub removes: Vec<RemoveCall>,
}

fn side_index(side: Side) -> usize {
    match side {
        Side::Asset => 0,
        Side::Counter => 1,
    }
}

impl MarketState {
    pub fn with_reserves(asset_reserve: u64, counter_reserve: u64) -> Self {
        Self {
            asset_reserve,
            counter_reserve,
            lp_supply: asset_reserve,
            ..Default::default()
        }
    }

    fn reserve(&self, side: Side) -> u64 {
        match side {
            Side::Asset => self.asset_reserve,
            Side::Counter => self.counter_reserve,
        }
    }

    fn reserve_mut(&mut self, side: Side) -> &mut u64 {
        match side {
            Side::Asset => &mut self.asset_reserve,
            Side::Counter => &mut self.counter_reserve,
        }
    }

    fn vault_mut(&mut self, side: Side) -> &mut u64 {
        match side {
            Side::Asset => &mut self.vault_asset,
            Side::Counter => &mut self.vault_counter,
        }
    }

    fn quote(&self, input: Side, amount_in: u64) -> Result<u64> {
        match self.swap_output {
            Some(output) => Ok(output),
            None => quote_constant_product(
                amount_in,
                self.reserve(input),
                self.reserve(input.opposite()),
            ),
        }
    }

    fn spend(&mut self, side: Side, amount: u64) -> Result<()> {
        let index = side_index(side);
        require!(self.allowance[index] >= amount, VaultError::ApprovalFailed);
        self.allowance[index] -= amount;
        let balance = self.vault_mut(side);
        require!(*balance >= amount, VaultError::InsufficientLiquidity);
        *balance -= amount;
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockMarket(pub Rc<RefCell<MarketState>>);

impl MockMarket {
    pub fn new(state: MarketState) -> Self {
        Self(Rc::new(RefCell::new(state)))
    }

    /// Adapter whose reference rate is the pool's current price
    pub fn adapter(&self) -> Box<dyn YieldAdapter> {
        let s = self.0.borrow();
        let rate = spot_rate(s.asset_reserve, s.counter_reserve).unwrap();
        drop(s);
        self.adapter_at(rate)
    }

    pub fn adapter_at(&self, reference_rate: u64) -> Box<dyn YieldAdapter> {
        Box::new(LiquidityAdapter::new(self.clone(), reference_rate))
    }
}

impl LiquidityMarket for MockMarket {
    fn quote_remove_liquidity(&self, liquidity: u64) -> Result<(u64, u64)> {
        let s = self.0.borrow();
        liquidity_share(liquidity, s.lp_supply, s.asset_reserve, s.counter_reserve)
    }

    fn approve(&mut self, side: Side, amount: u64) -> Result<bool> {
        let mut s = self.0.borrow_mut();
        if s.refuse_approval {
            return Ok(false);
        }
        s.allowance[side_index(side)] = amount;
        Ok(true)
    }

    fn swap(
        &mut self,
        input: Side,
        amount_in: u64,
        minimum_out: u64,
        deadline: i64,
    ) -> Result<u64> {
        let mut s = self.0.borrow_mut();
        s.swaps.push(SwapCall {
            input,
            amount_in,
            minimum_out,
            deadline,
        });
        let output = s.quote(input, amount_in)?.saturating_sub(s.swap_haircut);
        s.spend(input, amount_in)?;

        *s.reserve_mut(input) += amount_in;
        let reserve_out = s.reserve_mut(input.opposite());
        *reserve_out = reserve_out.saturating_sub(output);
        *s.vault_mut(input.opposite()) += output;
        Ok(output)
    }

    fn add_liquidity(
        &mut self,
        asset_desired: u64,
        counter_desired: u64,
        asset_min: u64,
        counter_min: u64,
        deadline: i64,
    ) -> Result<LiquidityAdded> {
        let mut s = self.0.borrow_mut();
        s.adds.push(AddCall {
            asset_desired,
            counter_desired,
            asset_min,
            counter_min,
            deadline,
        });

        let (asset_used, counter_used) = if s.lp_supply == 0 {
            (asset_desired, counter_desired)
        } else {
            let counter_optimal = mul_div_floor(asset_desired, s.counter_reserve, s.asset_reserve)?;
            if counter_optimal <= counter_desired {
                (asset_desired, counter_optimal)
            } else {
                (
                    mul_div_floor(counter_desired, s.asset_reserve, s.counter_reserve)?,
                    counter_desired,
                )
            }
        };

        let liquidity = if s.lp_supply == 0 {
            asset_used
        } else {
            mul_div_floor(asset_used, s.lp_supply, s.asset_reserve)?.min(mul_div_floor(
                counter_used,
                s.lp_supply,
                s.counter_reserve,
            )?)
        };

        s.spend(Side::Asset, asset_used)?;
        s.spend(Side::Counter, counter_used)?;
        s.asset_reserve += asset_used;
        s.counter_reserve += counter_used;
        s.lp_supply += liquidity;
        s.vault_lp += liquidity;

        Ok(LiquidityAdded {
            asset_used,
            counter_used,
            liquidity,
        })
    }

    fn remove_liquidity(
        &mut self,
        liquidity: u64,
        asset_min: u64,
        counter_min: u64,
        deadline: i64,
    ) -> Result<(u64, u64)> {
        let mut s = self.0.borrow_mut();
        s.removes.push(RemoveCall {
            liquidity,
            asset_min,
            counter_min,
            deadline,
        });
        require!(s.vault_lp >= liquidity, VaultError::InsufficientLiquidity);

        let (asset_out, counter_out) =
            liquidity_share(liquidity, s.lp_supply, s.asset_reserve, s.counter_reserve)?;
        s.vault_lp -= liquidity;
        s.lp_supply -= liquidity;
        s.asset_reserve -= asset_out;
        s.counter_reserve -= counter_out;
        s.vault_asset += asset_out;
        s.vault_counter += counter_out;
        Ok((asset_out, counter_out))
    }
}

/// Lending pool with 1:1 receipts
#[derive(Debug, Default)]
pub struct PoolState {
    pub receipt: u64,
    pub vault_asset: u64,
    pub allowance: u64,
    pub refuse_approval: bool,
    /// Units the pool keeps back on every withdrawal
    pub withdraw_shortfall: u64,
    pub supplies: Vec<u64>,
    pub withdrawals: Vec<u64>,
}

#[derive(Clone, Default)]
pub struct MockPool(pub Rc<RefCell<PoolState>>);

impl MockPool {
    pub fn new(vault_asset: u64) -> Self {
        Self(Rc::new(RefCell::new(PoolState {
            vault_asset,
            ..Default::default()
        })))
    }

    pub fn adapter(&self) -> Box<dyn YieldAdapter> {
        Box::new(LendingAdapter::new(self.clone()))
    }

    /// Interest paid as extra receipt tokens
    pub fn accrue(&self, interest: u64) {
        self.0.borrow_mut().receipt += interest;
    }
}

impl LendingPool for MockPool {
    fn approve(&mut self, amount: u64) -> Result<bool> {
        let mut s = self.0.borrow_mut();
        if s.refuse_approval {
            return Ok(false);
        }
        s.allowance = amount;
        Ok(true)
    }

    fn receipt_balance(&self) -> Result<u64> {
        Ok(self.0.borrow().receipt)
    }

    fn supply(&mut self, amount: u64) -> Result<()> {
        let mut s = self.0.borrow_mut();
        require!(s.allowance >= amount, VaultError::ApprovalFailed);
        require!(s.vault_asset >= amount, VaultError::InsufficientLiquidity);
        s.allowance -= amount;
        s.vault_asset -= amount;
        s.receipt += amount;
        s.supplies.push(amount);
        Ok(())
    }

    fn withdraw(&mut self, amount: u64) -> Result<u64> {
        let mut s = self.0.borrow_mut();
        require!(s.receipt >= amount, VaultError::InsufficientLiquidity);
        let delivered = amount.saturating_sub(s.withdraw_shortfall);
        s.receipt -= amount;
        s.vault_asset += delivered;
        s.withdrawals.push(delivered);
        Ok(delivered)
    }
}

pub fn registry() -> GuardianRegistry {
    GuardianRegistry {
        owner: Pubkey::new_unique(),
        treasury: Pubkey::new_unique(),
        base_asset_mint: Pubkey::new_unique(),
        stake_mint: Pubkey::new_unique(),
        stake_price: 1_000,
        fee_cut_divisor: 20,
        total_staked: 0,
        guardian_count: 0,
        locked: false,
        bump: 255,
    }
}

/// Freshly opened vault of `registry` for a new guardian and asset
pub fn open_vault(registry: &GuardianRegistry) -> VaultState {
    let mut vault = VaultState {
        registry: Pubkey::default(),
        guardian: Pubkey::default(),
        treasury: Pubkey::default(),
        asset_mint: Pubkey::default(),
        share_mint: Pubkey::default(),
        total_shares: 0,
        idle_assets: 0,
        fee_cut_divisor: 0,
        deposit_cap: 0,
        slippage_bps: 0,
        deadline_buffer: 0,
        lifecycle: Lifecycle::Inactive,
        locked: true,
        adapters: Vec::new(),
        bump: 0,
        share_bump: 0,
        authority_bump: 0,
    };
    vault.open(
        Pubkey::new_unique(),
        registry,
        Pubkey::new_unique(),
        Pubkey::new_unique(),
        Pubkey::new_unique(),
        VaultBumps::default(),
    );
    vault
}
