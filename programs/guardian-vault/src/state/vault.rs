use anchor_lang::prelude::*;

use crate::{
    adapters::ExecutionBounds,
    constants::*,
    errors::VaultError,
    guard::{GuardChain, Reentrant},
    math::{mul_div_ceil, mul_div_floor},
    state::GuardianRegistry,
};

/// Vault lifecycle. Inactive is terminal.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub enum Lifecycle {
    Active,
    Inactive,
}

/// External market family an adapter slot talks to
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub enum AdapterKind {
    /// Constant-product market: half swapped, both sides added as liquidity
    LiquidityMarket,
    /// Lending pool: supplied as-is for an interest-bearing receipt
    LendingMarket,
}

/// Position held through one adapter, carried at book value.
#[derive(
    AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace,
)]
pub struct Position {
    /// LP tokens or interest-bearing receipt tokens held for the vault
    pub receipt: u64,
    /// Asset units moved into the market and not yet released
    pub cost_basis: u64,
    /// Counter tokens the market did not take when liquidity was added.
    /// Held by the vault and swapped back together with the receipt.
    pub counter: u64,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.receipt > 0 || self.cost_basis > 0
    }

    /// Record receipt tokens obtained for `cost` asset units
    pub fn record(&mut self, receipt: u64, cost: u64) -> Result<()> {
        self.receipt = self
            .receipt
            .checked_add(receipt)
            .ok_or(VaultError::MathOverflow)?;
        self.cost_basis = self
            .cost_basis
            .checked_add(cost)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    /// Receipt units backing `assets` of book value, rounded up and capped at
    /// the whole position
    pub fn receipt_for(&self, assets: u64) -> Result<u64> {
        if self.cost_basis == 0 || assets >= self.cost_basis {
            return Ok(self.receipt);
        }
        Ok(mul_div_ceil(self.receipt, assets, self.cost_basis)?.min(self.receipt))
    }

    /// Keep `amount` spare counter tokens with the position
    pub fn hold_counter(&mut self, amount: u64) -> Result<()> {
        self.counter = self
            .counter
            .checked_add(amount)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    /// Spare counter tokens attached to `receipt` units
    pub fn counter_share(&self, receipt: u64) -> Result<u64> {
        if receipt >= self.receipt {
            return Ok(self.counter);
        }
        mul_div_floor(self.counter, receipt, self.receipt)
    }

    /// Drop `receipt` units with the matching share of the cost basis and of
    /// the spare counter tokens. Returns the cost basis released.
    pub fn release(&mut self, receipt: u64) -> Result<u64> {
        require!(receipt <= self.receipt, VaultError::InsufficientLiquidity);
        let counter = self.counter_share(receipt)?;
        let released = if receipt == self.receipt {
            self.cost_basis
        } else {
            mul_div_floor(self.cost_basis, receipt, self.receipt)?
        };
        self.receipt -= receipt;
        self.cost_basis -= released;
        self.counter -= counter;
        Ok(released)
    }
}

/// One registered adapter and the position held through it
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq, InitSpace)]
pub struct AdapterSlot {
    pub kind: AdapterKind,
    /// Program id of the external market
    pub program: Pubkey,
    /// Pool (liquidity) or reserve (lending) account
    pub market: Pubkey,
    /// Share of investable capital, in basis points
    pub weight_bps: u16,
    pub position: Position,
}

/// Per-guardian, per-asset vault ledger
///
/// Invariant: `total_assets_managed() == idle_assets + Σ position.cost_basis`.
/// Book values are realized whenever capital comes back from a market, and
/// exits are priced on the realized figures.
#[account]
#[derive(InitSpace)]
pub struct VaultState {
    /// Registry that created this vault and may deactivate it
    pub registry: Pubkey,

    /// Guardian directing the allocation, receives the guardian fee
    pub guardian: Pubkey,

    /// Protocol treasury, receives the treasury fee
    pub treasury: Pubkey,

    /// Mint of the underlying asset token
    pub asset_mint: Pubkey,

    /// Mint of the vault share token
    pub share_mint: Pubkey,

    /// Shares outstanding, changed only by mint and burn
    pub total_shares: u64,

    /// Assets held by the vault and not invested
    pub idle_assets: u64,

    /// Fee per recipient is `shares / fee_cut_divisor`
    pub fee_cut_divisor: u64,

    /// Ceiling on total assets managed
    pub deposit_cap: u64,

    /// Slippage tolerance for market calls
    pub slippage_bps: u16,

    /// Seconds added to the clock for market call deadlines
    pub deadline_buffer: i64,

    pub lifecycle: Lifecycle,

    /// Reentrancy flag
    pub locked: bool,

    #[max_len(4)]
    pub adapters: Vec<AdapterSlot>,

    pub bump: u8,
    pub share_bump: u8,
    pub authority_bump: u8,
}

/// Shares produced by one deposit. `user + guardian_fee + treasury_fee == total`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositSplit {
    pub total: u64,
    pub user: u64,
    pub guardian_fee: u64,
    pub treasury_fee: u64,
}

impl Reentrant for VaultState {
    fn is_locked(&self) -> bool {
        self.locked
    }

    fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }
}

/// PDA bumps recorded when a vault is opened
#[derive(Clone, Copy, Debug, Default)]
pub struct VaultBumps {
    pub vault: u8,
    pub share_mint: u8,
    pub authority: u8,
}

impl VaultState {
    pub const SPACE: usize = 8 + Self::INIT_SPACE;

    /// Fill a freshly created account: Active, empty, default execution
    /// parameters, no deposit cap
    pub fn open(
        &mut self,
        registry_key: Pubkey,
        registry: &GuardianRegistry,
        guardian: Pubkey,
        asset_mint: Pubkey,
        share_mint: Pubkey,
        bumps: VaultBumps,
    ) {
        self.registry = registry_key;
        self.guardian = guardian;
        self.treasury = registry.treasury;
        self.asset_mint = asset_mint;
        self.share_mint = share_mint;
        self.total_shares = 0;
        self.idle_assets = 0;
        self.fee_cut_divisor = registry.fee_cut_divisor;
        self.deposit_cap = u64::MAX;
        self.slippage_bps = DEFAULT_SLIPPAGE_BPS;
        self.deadline_buffer = DEFAULT_DEADLINE_BUFFER;
        self.lifecycle = Lifecycle::Active;
        self.locked = false;
        self.adapters = Vec::new();
        self.bump = bumps.vault;
        self.share_bump = bumps.share_mint;
        self.authority_bump = bumps.authority;
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    /// Sum of book values across adapter positions
    pub fn invested_assets(&self) -> Result<u64> {
        self.adapters.iter().try_fold(0u64, |acc, slot| {
            acc.checked_add(slot.position.cost_basis)
                .ok_or(error!(VaultError::MathOverflow))
        })
    }

    /// Idle balance plus the book value of every position
    pub fn total_assets_managed(&self) -> Result<u64> {
        self.idle_assets
            .checked_add(self.invested_assets()?)
            .ok_or(error!(VaultError::MathOverflow))
    }

    pub fn has_open_positions(&self) -> bool {
        self.adapters.iter().any(|slot| slot.position.is_open())
    }

    /// Largest deposit currently accepted
    pub fn max_deposit(&self) -> Result<u64> {
        if !self.is_active() {
            return Ok(0);
        }
        Ok(self.deposit_cap.saturating_sub(self.total_assets_managed()?))
    }

    /// Shares a deposit of `assets` produces before the fee carve-out
    ///
    /// - Empty supply: shares = assets
    /// - Otherwise: shares = assets * totalShares / totalAssetsManaged (floor)
    pub fn preview_deposit(&self, assets: u64) -> Result<u64> {
        if self.total_shares == 0 {
            return Ok(assets);
        }
        mul_div_floor(assets, self.total_shares, self.total_assets_managed()?)
    }

    /// Shares burned to withdraw exactly `assets` (rounded up)
    pub fn preview_withdraw(&self, assets: u64) -> Result<u64> {
        if self.total_shares == 0 {
            return Ok(assets);
        }
        mul_div_ceil(assets, self.total_shares, self.total_assets_managed()?)
    }

    /// Assets paid out for redeeming `shares` (rounded down)
    pub fn preview_redeem(&self, shares: u64) -> Result<u64> {
        if self.total_shares == 0 {
            return Ok(0);
        }
        mul_div_floor(shares, self.total_assets_managed()?, self.total_shares)
    }

    /// Carve guardian and treasury fees out of the predicted share total.
    ///
    /// The fees come out of `preview_deposit(assets)`; they are never minted
    /// on top of it.
    pub fn split_deposit(&self, assets: u64, fee_cut_divisor: u64) -> Result<DepositSplit> {
        require!(
            fee_cut_divisor >= MIN_FEE_CUT_DIVISOR,
            VaultError::InvalidFeeCut
        );
        let total = self.preview_deposit(assets)?;
        require!(total > 0, VaultError::ZeroShares);

        let guardian_fee = total / fee_cut_divisor;
        let treasury_fee = total / fee_cut_divisor;
        let user = total
            .checked_sub(guardian_fee)
            .and_then(|v| v.checked_sub(treasury_fee))
            .ok_or(VaultError::MathOverflow)?;

        Ok(DepositSplit {
            total,
            user,
            guardian_fee,
            treasury_fee,
        })
    }

    /// Market call bounds for this vault at clock reading `now`
    pub fn execution_bounds(&self, now: i64) -> ExecutionBounds {
        ExecutionBounds {
            slippage_bps: self.slippage_bps,
            deadline_buffer: self.deadline_buffer,
            now,
        }
    }

    /// Register a new adapter slot with an initial weight
    pub fn add_adapter(
        &mut self,
        kind: AdapterKind,
        program: Pubkey,
        market: Pubkey,
        weight_bps: u16,
    ) -> Result<()> {
        require!(
            self.adapters.len() < MAX_ADAPTERS,
            VaultError::AdapterLimitReached
        );
        require!(
            !self.adapters.iter().any(|slot| slot.market == market),
            VaultError::AdapterAlreadyExists
        );

        let allocated: u64 = self
            .adapters
            .iter()
            .map(|slot| slot.weight_bps as u64)
            .sum();
        require!(
            allocated + weight_bps as u64 <= BPS_DENOMINATOR,
            VaultError::InvalidAllocation
        );

        self.adapters.push(AdapterSlot {
            kind,
            program,
            market,
            weight_bps,
            position: Position::default(),
        });
        Ok(())
    }

    /// Replace every slot weight. One weight per slot, summing to at most 100%.
    pub fn set_allocation(&mut self, weights: &[u16]) -> Result<()> {
        require!(
            weights.len() == self.adapters.len(),
            VaultError::InvalidAllocation
        );
        let total: u64 = weights.iter().map(|w| *w as u64).sum();
        require!(total <= BPS_DENOMINATOR, VaultError::InvalidAllocation);

        for (slot, weight) in self.adapters.iter_mut().zip(weights) {
            slot.weight_bps = *weight;
        }
        Ok(())
    }

    /// Update execution parameters and the deposit cap
    pub fn configure(
        &mut self,
        slippage_bps: u16,
        deadline_buffer: i64,
        deposit_cap: u64,
    ) -> Result<()> {
        require!(
            slippage_bps > 0 && slippage_bps <= MAX_SLIPPAGE_BPS,
            VaultError::InvalidSlippage
        );
        require!(
            deadline_buffer > 0 && deadline_buffer <= MAX_DEADLINE_BUFFER,
            VaultError::InvalidDeadlineBuffer
        );
        self.slippage_bps = slippage_bps;
        self.deadline_buffer = deadline_buffer;
        self.deposit_cap = deposit_cap;
        Ok(())
    }

    // Guard chains, one per entry point. Each acquires the reentrancy flag
    // before anything else.

    pub fn guard_deposit(&mut self, assets: u64) -> Result<()> {
        GuardChain::new()
            .active(self.lifecycle)
            .nonzero(assets)
            .enter(self)
    }

    /// Withdraw and redeem stay open after deactivation
    pub fn guard_exit(&mut self, amount: u64) -> Result<()> {
        GuardChain::new().nonzero(amount).enter(self)
    }

    /// Allocation management: guardian only, Active only
    pub fn guard_manage(&mut self, caller: &Pubkey) -> Result<()> {
        let guardian = self.guardian;
        GuardChain::new()
            .active(self.lifecycle)
            .role(caller, &[guardian])
            .enter(self)
    }

    pub fn guard_rebalance(&mut self, caller: &Pubkey, registry_owner: &Pubkey) -> Result<()> {
        let allowed = [self.guardian, *registry_owner];
        GuardChain::new()
            .active(self.lifecycle)
            .role(caller, &allowed)
            .enter(self)
    }

    /// Deactivation goes through the registry only, never the guardian
    pub fn guard_deactivate(&mut self, caller: &Pubkey, registry_owner: &Pubkey) -> Result<()> {
        GuardChain::new()
            .active(self.lifecycle)
            .role(caller, &[*registry_owner])
            .enter(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_vault(idle_assets: u64, total_shares: u64) -> VaultState {
        VaultState {
            registry: Pubkey::default(),
            guardian: Pubkey::new_unique(),
            treasury: Pubkey::new_unique(),
            asset_mint: Pubkey::default(),
            share_mint: Pubkey::default(),
            total_shares,
            idle_assets,
            fee_cut_divisor: 20,
            deposit_cap: u64::MAX,
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
            deadline_buffer: DEFAULT_DEADLINE_BUFFER,
            lifecycle: Lifecycle::Active,
            locked: false,
            adapters: Vec::new(),
            bump: 0,
            share_bump: 0,
            authority_bump: 0,
        }
    }

    #[test]
    fn test_first_deposit() {
        let vault = mock_vault(0, 0);
        assert_eq!(vault.preview_deposit(1000).unwrap(), 1000);
    }

    #[test]
    fn test_subsequent_deposit_with_profit() {
        // 2000 assets backing 1000 shares
        let vault = mock_vault(2000, 1000);
        assert_eq!(vault.preview_deposit(500).unwrap(), 250);
        assert_eq!(vault.preview_redeem(500).unwrap(), 1000);
    }

    #[test]
    fn test_withdraw_rounds_up() {
        let vault = mock_vault(1000, 333);
        // 100 * 333 / 1000 = 33.3
        assert_eq!(vault.preview_deposit(100).unwrap(), 33);
        assert_eq!(vault.preview_withdraw(100).unwrap(), 34);
    }

    #[test]
    fn test_positions_count_towards_managed_assets() {
        let mut vault = mock_vault(400, 1000);
        vault
            .add_adapter(
                AdapterKind::LendingMarket,
                Pubkey::new_unique(),
                Pubkey::new_unique(),
                5_000,
            )
            .unwrap();
        vault.adapters[0].position.record(600, 600).unwrap();
        assert_eq!(vault.total_assets_managed().unwrap(), 1000);
        assert!(vault.has_open_positions());
    }

    #[test]
    fn test_split_carves_fees_out() {
        let vault = mock_vault(0, 0);
        let split = vault.split_deposit(1000, 20).unwrap();
        assert_eq!(split.total, 1000);
        assert_eq!(split.user, 900);
        assert_eq!(split.guardian_fee, 50);
        assert_eq!(split.treasury_fee, 50);
    }

    #[test]
    fn test_split_rejects_low_divisor() {
        let vault = mock_vault(0, 0);
        for divisor in [0, 1, 2] {
            assert_eq!(
                vault.split_deposit(1000, divisor).unwrap_err(),
                VaultError::InvalidFeeCut.into()
            );
        }
    }

    #[test]
    fn test_position_release_is_proportional() {
        let mut position = Position::default();
        position.record(300, 900).unwrap();
        assert_eq!(position.receipt_for(300).unwrap(), 100);
        assert_eq!(position.release(100).unwrap(), 300);
        assert_eq!(
            position,
            Position {
                receipt: 200,
                cost_basis: 600,
                counter: 0
            }
        );
        assert_eq!(position.release(200).unwrap(), 600);
        assert!(!position.is_open());
    }

    #[test]
    fn test_max_deposit_respects_cap_and_lifecycle() {
        let mut vault = mock_vault(700, 700);
        vault.deposit_cap = 1000;
        assert_eq!(vault.max_deposit().unwrap(), 300);
        vault.lifecycle = Lifecycle::Inactive;
        assert_eq!(vault.max_deposit().unwrap(), 0);
    }

    #[test]
    fn test_adapter_slots_are_bounded() {
        let mut vault = mock_vault(0, 0);
        let market = Pubkey::new_unique();
        vault
            .add_adapter(AdapterKind::LiquidityMarket, Pubkey::new_unique(), market, 6_000)
            .unwrap();

        assert_eq!(
            vault
                .add_adapter(AdapterKind::LendingMarket, Pubkey::new_unique(), market, 1_000)
                .unwrap_err(),
            VaultError::AdapterAlreadyExists.into()
        );
        assert_eq!(
            vault
                .add_adapter(
                    AdapterKind::LendingMarket,
                    Pubkey::new_unique(),
                    Pubkey::new_unique(),
                    4_001
                )
                .unwrap_err(),
            VaultError::InvalidAllocation.into()
        );

        for _ in 1..MAX_ADAPTERS {
            vault
                .add_adapter(
                    AdapterKind::LendingMarket,
                    Pubkey::new_unique(),
                    Pubkey::new_unique(),
                    0,
                )
                .unwrap();
        }
        assert_eq!(
            vault
                .add_adapter(
                    AdapterKind::LendingMarket,
                    Pubkey::new_unique(),
                    Pubkey::new_unique(),
                    0
                )
                .unwrap_err(),
            VaultError::AdapterLimitReached.into()
        );
    }

    #[test]
    fn test_set_allocation_replaces_every_weight() {
        let mut vault = mock_vault(0, 0);
        for weight in [5_000, 5_000] {
            vault
                .add_adapter(
                    AdapterKind::LendingMarket,
                    Pubkey::new_unique(),
                    Pubkey::new_unique(),
                    weight,
                )
                .unwrap();
        }

        vault.set_allocation(&[7_000, 2_000]).unwrap();
        assert_eq!(vault.adapters[0].weight_bps, 7_000);
        assert_eq!(vault.adapters[1].weight_bps, 2_000);

        assert_eq!(
            vault.set_allocation(&[7_000]).unwrap_err(),
            VaultError::InvalidAllocation.into()
        );
        assert_eq!(
            vault.set_allocation(&[7_000, 3_001]).unwrap_err(),
            VaultError::InvalidAllocation.into()
        );
    }

    #[test]
    fn test_configure_limits() {
        let mut vault = mock_vault(0, 0);
        assert_eq!(
            vault.configure(0, 60, 1_000).unwrap_err(),
            VaultError::InvalidSlippage.into()
        );
        assert_eq!(
            vault.configure(MAX_SLIPPAGE_BPS + 1, 60, 1_000).unwrap_err(),
            VaultError::InvalidSlippage.into()
        );
        assert_eq!(
            vault.configure(50, 0, 1_000).unwrap_err(),
            VaultError::InvalidDeadlineBuffer.into()
        );

        vault.configure(50, 60, 1_000).unwrap();
        assert_eq!(vault.execution_bounds(10).deadline_buffer, 60);
        assert_eq!(vault.max_deposit().unwrap(), 1_000);
    }

    #[test]
    fn test_spare_counter_leaves_with_its_receipt() {
        let mut position = Position::default();
        position.record(400, 1_000).unwrap();
        position.hold_counter(10).unwrap();

        assert_eq!(position.counter_share(100).unwrap(), 2);
        position.release(100).unwrap();
        assert_eq!(position.counter, 8);

        assert_eq!(position.counter_share(300).unwrap(), 8);
        position.release(300).unwrap();
        assert_eq!(position, Position::default());
    }
}
