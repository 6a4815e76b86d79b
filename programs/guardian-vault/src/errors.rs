use anchor_lang::prelude::*;

/// Custom error codes for the Guardian Vault program
#[error_code]
pub enum VaultError {
    #[msg("Caller lacks the role required for this action")]
    AccessDenied,

    #[msg("Vault is inactive - only withdrawals are accepted")]
    VaultInactive,

    #[msg("Deposit exceeds the vault's maximum deposit")]
    DepositExceedsMax,

    #[msg("Insufficient liquidity to cover the withdrawal")]
    InsufficientLiquidity,

    #[msg("Market output below the slippage-bounded minimum")]
    SlippageExceeded,

    #[msg("Market call deadline has passed")]
    DeadlineExpired,

    #[msg("Stake is below the current guardian stake price")]
    StakeTooLow,

    #[msg("Guardian still has invested positions in non-base vaults")]
    CannotQuitWithActivePositions,

    #[msg("Fee cut divisor must be greater than 2")]
    InvalidFeeCut,

    #[msg("Reentrant call rejected")]
    ReentrantCall,

    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Operation would mint or burn zero shares")]
    ZeroShares,

    #[msg("Math overflow occurred during calculation")]
    MathOverflow,

    #[msg("Cannot divide by zero - vault has shares but no assets")]
    DivisionByZero,

    #[msg("Invalid token mint")]
    InvalidMint,

    #[msg("Invalid token account owner")]
    InvalidOwner,

    #[msg("Token approval was not applied")]
    ApprovalFailed,

    #[msg("Lending pool withdrew less than requested")]
    PartialWithdrawal,

    #[msg("Allocation weights must match adapters and sum to at most 10000 bps")]
    InvalidAllocation,

    #[msg("Slippage tolerance out of range")]
    InvalidSlippage,

    #[msg("Deadline buffer out of range")]
    InvalidDeadlineBuffer,

    #[msg("Adapter for this market already exists")]
    AdapterAlreadyExists,

    #[msg("Vault adapter limit reached")]
    AdapterLimitReached,

    #[msg("Adapter accounts do not match the registered adapter")]
    AdapterAccountMismatch,

    #[msg("Guardian already has a vault for this asset")]
    VaultAlreadyExists,

    #[msg("Guardian vault limit reached")]
    VaultLimitReached,

    #[msg("Guardian is not active")]
    GuardianNotActive,

    #[msg("Guardian is already active")]
    GuardianAlreadyActive,

    #[msg("Vault is not owned by this guardian")]
    UnknownVault,

    #[msg("Owner holds fewer shares than required")]
    InsufficientShares,

    #[msg("Liquidity adapters need a nonzero reference rate")]
    InvalidReferenceRate,
}
