use anchor_lang::prelude::*;

/// Event emitted when the guardian registry is created
#[event]
pub struct RegistryInitialized {
    pub registry: Pubkey,
    pub owner: Pubkey,
    pub treasury: Pubkey,
    pub base_asset_mint: Pubkey,
    pub stake_mint: Pubkey,
    pub stake_price: u64,
    pub fee_cut_divisor: u64,
    pub timestamp: i64,
}

/// Event emitted when a guardian stakes and joins
#[event]
pub struct GuardianJoined {
    pub guardian: Pubkey,
    pub stake_amount: u64,
    pub total_staked: u64,
    pub timestamp: i64,
}

/// Event emitted when a guardian leaves and gets the stake back
#[event]
pub struct GuardianQuit {
    pub guardian: Pubkey,
    pub stake_returned: u64,
    pub vaults_deactivated: u32,
    pub timestamp: i64,
}

/// Event emitted when a vault is created for a guardian
#[event]
pub struct VaultCreated {
    pub vault: Pubkey,
    pub guardian: Pubkey,
    pub asset_mint: Pubkey,
    pub share_mint: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct AdapterAdded {
    pub vault: Pubkey,
    pub program: Pubkey,
    pub market: Pubkey,
    pub weight_bps: u16,
    pub timestamp: i64,
}

#[event]
pub struct AllocationUpdated {
    pub vault: Pubkey,
    pub weights: Vec<u16>,
    pub timestamp: i64,
}

#[event]
pub struct VaultConfigured {
    pub vault: Pubkey,
    pub slippage_bps: u16,
    pub deadline_buffer: i64,
    pub deposit_cap: u64,
    pub timestamp: i64,
}

/// Event emitted when assets are deposited
#[event]
pub struct Deposited {
    pub vault: Pubkey,
    pub user: Pubkey,
    pub receiver: Pubkey,
    pub asset_amount: u64,
    pub shares_minted: u64,
    pub guardian_fee: u64,
    pub treasury_fee: u64,
    pub total_assets: u64,
    pub total_shares: u64,
    pub timestamp: i64,
}

/// Event emitted on withdraw and redeem
#[event]
pub struct Withdrawn {
    pub vault: Pubkey,
    pub owner: Pubkey,
    pub receiver: Pubkey,
    pub asset_amount: u64,
    pub shares_burned: u64,
    pub total_assets: u64,
    pub total_shares: u64,
    pub timestamp: i64,
}

/// Event emitted when idle assets move into markets
#[event]
pub struct Invested {
    pub vault: Pubkey,
    pub amount: u64,
    pub idle_assets: u64,
    pub invested_assets: u64,
    pub timestamp: i64,
}

/// Event emitted when positions are unwound into idle
#[event]
pub struct Divested {
    pub vault: Pubkey,
    pub amount: u64,
    pub idle_assets: u64,
    pub invested_assets: u64,
    pub timestamp: i64,
}

#[event]
pub struct Rebalanced {
    pub vault: Pubkey,
    pub caller: Pubkey,
    pub divested: u64,
    pub invested: u64,
    pub total_assets: u64,
    pub timestamp: i64,
}

#[event]
pub struct VaultDeactivated {
    pub vault: Pubkey,
    pub divested: u64,
    pub timestamp: i64,
}

#[event]
pub struct StakePriceUpdated {
    pub old: u64,
    pub new: u64,
    pub timestamp: i64,
}

#[event]
pub struct FeeCutUpdated {
    pub old: u64,
    pub new: u64,
    pub timestamp: i64,
}

/// Event emitted when excess registry tokens go to the treasury
#[event]
pub struct TokenSwept {
    pub mint: Pubkey,
    pub amount: u64,
    pub treasury: Pubkey,
    pub timestamp: i64,
}
