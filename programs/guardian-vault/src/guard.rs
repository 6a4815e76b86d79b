use anchor_lang::prelude::*;

use crate::{errors::VaultError, state::Lifecycle};

/// Accounts carrying a reentrancy flag.
///
/// The flag must be flushed to account data before any CPI so that a
/// re-entered instruction deserializes it as set.
pub trait Reentrant {
    fn is_locked(&self) -> bool;
    fn set_locked(&mut self, locked: bool);

    fn release(&mut self) {
        self.set_locked(false);
    }
}

/// Stage of a guard check. Checks run sorted by stage, so call sites cannot
/// reorder them by declaring them in a different order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Lifecycle,
    Authorization,
    Argument,
}

#[derive(Clone, Copy, Debug)]
struct Check {
    stage: Stage,
    passed: bool,
    error: VaultError,
}

/// Ordered guard chain for a state-mutating entry point.
///
/// `enter` acquires the reentrancy flag first, then evaluates lifecycle,
/// authorization and argument checks in that order. The first failing check
/// releases the flag and surfaces its error.
#[derive(Clone, Debug, Default)]
pub struct GuardChain {
    checks: Vec<Check>,
}

impl GuardChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, stage: Stage, passed: bool, error: VaultError) -> Self {
        self.checks.push(Check { stage, passed, error });
        self
    }

    /// Vault must still accept new capital
    pub fn active(self, lifecycle: Lifecycle) -> Self {
        self.push(
            Stage::Lifecycle,
            lifecycle == Lifecycle::Active,
            VaultError::VaultInactive,
        )
    }

    /// Caller must be one of `allowed`
    pub fn role(self, caller: &Pubkey, allowed: &[Pubkey]) -> Self {
        self.push(
            Stage::Authorization,
            allowed.contains(caller),
            VaultError::AccessDenied,
        )
    }

    pub fn nonzero(self, amount: u64) -> Self {
        self.push(Stage::Argument, amount > 0, VaultError::ZeroAmount)
    }

    pub fn lifecycle(self, passed: bool, error: VaultError) -> Self {
        self.push(Stage::Lifecycle, passed, error)
    }

    pub fn authorization(self, passed: bool, error: VaultError) -> Self {
        self.push(Stage::Authorization, passed, error)
    }

    pub fn argument(self, passed: bool, error: VaultError) -> Self {
        self.push(Stage::Argument, passed, error)
    }

    /// Acquire the reentrancy flag of `target`, then run every check.
    pub fn enter<T: Reentrant + ?Sized>(mut self, target: &mut T) -> Result<()> {
        require!(!target.is_locked(), VaultError::ReentrantCall);
        target.set_locked(true);

        // sort_by_key is stable: declaration order is kept within a stage
        self.checks.sort_by_key(|check| check.stage);
        if let Some(failed) = self.checks.iter().find(|check| !check.passed) {
            target.release();
            return Err(error!(failed.error));
        }
        Ok(())
    }
}

/// Runs `op` against a scratch copy of `state` and commits it only when
/// `op` succeeds, so a failed operation leaves the ledger untouched.
pub fn transact<T, R, F>(state: &mut T, op: F) -> Result<R>
where
    T: Clone,
    F: FnOnce(&mut T) -> Result<R>,
{
    let mut draft = state.clone();
    let outcome = op(&mut draft)?;
    *state = draft;
    Ok(outcome)
}
