// Constants for the Guardian Vault program

/// Seed for the guardian registry PDA
pub const REGISTRY_SEED: &[u8] = b"registry";

/// Seed for guardian account PDAs
pub const GUARDIAN_SEED: &[u8] = b"guardian";

/// Seed for vault state PDAs (guardian + asset mint)
pub const VAULT_SEED: &[u8] = b"vault";

/// Seed for share mint PDAs
pub const SHARE_MINT_SEED: &[u8] = b"shares";

/// Seed for the vault authority PDA that owns vault token accounts
pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault_authority";

/// Basis point denominator for weights and slippage
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Smallest accepted fee-cut divisor (a divisor of 2 would hand out 100%)
pub const MIN_FEE_CUT_DIVISOR: u64 = 3;

/// Slippage applied to market calls unless the guardian configures another one
pub const DEFAULT_SLIPPAGE_BPS: u16 = 100;

/// Upper bound for the configurable slippage tolerance (10%)
pub const MAX_SLIPPAGE_BPS: u16 = 1_000;

/// Seconds added to the clock to form a market call deadline
pub const DEFAULT_DEADLINE_BUFFER: i64 = 300;

/// Upper bound for the configurable deadline buffer
pub const MAX_DEADLINE_BUFFER: i64 = 3_600;

/// Maximum adapter slots per vault (keep in sync with `max_len` on VaultState)
pub const MAX_ADAPTERS: usize = 4;

/// Maximum vaults per guardian (keep in sync with `max_len` on GuardianAccount)
pub const MAX_GUARDIAN_VAULTS: usize = 8;

/// Allocations below this amount stay idle instead of hitting a market
pub const MIN_ADAPTER_ALLOCATION: u64 = 1_000;

/// Swap fee charged by the constant-product market, used for quotes
pub const LIQUIDITY_MARKET_FEE_BPS: u64 = 30;

/// Remaining accounts per liquidity adapter slot:
/// program, pool, asset reserve, counter reserve, lp mint, vault counter, vault lp
pub const LIQUIDITY_ADAPTER_ACCOUNTS: usize = 7;

/// Remaining accounts per lending adapter slot:
/// program, reserve, liquidity supply, receipt mint, vault receipt
pub const LENDING_ADAPTER_ACCOUNTS: usize = 5;

/// Fixed-point scale of reference rates (counter units per asset unit)
pub const RATE_SCALE: u64 = 1_000_000_000;

/// Divest rounds an exit may run while re-pricing on realized values
pub const MAX_EXIT_ROUNDS: usize = 4;
