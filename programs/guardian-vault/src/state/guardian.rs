use anchor_lang::prelude::*;

use crate::{constants::*, errors::VaultError, state::VaultState};

/// Vault created by a guardian for one asset
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub struct OwnedVault {
    pub asset_mint: Pubkey,
    pub vault: Pubkey,
}

/// Guardian record: stake and the vaults it controls
#[account]
#[derive(InitSpace)]
pub struct GuardianAccount {
    pub guardian: Pubkey,

    /// Stake escrowed by the registry, at least the stake price while active
    pub staked_amount: u64,

    #[max_len(8)]
    pub vaults: Vec<OwnedVault>,

    pub active: bool,

    pub bump: u8,
}

impl GuardianAccount {
    pub const SPACE: usize = 8 + Self::INIT_SPACE;

    /// Start (or restart) guardianship with a fresh stake
    pub fn activate(&mut self, guardian: Pubkey, stake: u64, bump: u8) -> Result<()> {
        require!(!self.active, VaultError::GuardianAlreadyActive);
        self.guardian = guardian;
        self.staked_amount = stake;
        self.active = true;
        self.bump = bump;
        Ok(())
    }

    pub fn register_vault(&mut self, asset_mint: Pubkey, vault: Pubkey) -> Result<()> {
        require!(self.active, VaultError::GuardianNotActive);
        require!(
            self.vaults.len() < MAX_GUARDIAN_VAULTS,
            VaultError::VaultLimitReached
        );
        require!(
            !self.vaults.iter().any(|owned| owned.asset_mint == asset_mint),
            VaultError::VaultAlreadyExists
        );
        self.vaults.push(OwnedVault { asset_mint, vault });
        Ok(())
    }

    pub fn owns(&self, vault: &Pubkey) -> bool {
        self.vaults.iter().any(|owned| owned.vault == *vault)
    }

    /// Quitting requires every owned vault to be presented and every vault
    /// outside the base asset to be fully divested.
    pub fn check_quit(
        &self,
        vaults: &[(Pubkey, &VaultState)],
        base_asset_mint: &Pubkey,
    ) -> Result<()> {
        require!(self.active, VaultError::GuardianNotActive);
        require!(vaults.len() == self.vaults.len(), VaultError::UnknownVault);

        for owned in &self.vaults {
            let (_, vault) = vaults
                .iter()
                .find(|(key, _)| *key == owned.vault)
                .ok_or(VaultError::UnknownVault)?;

            if vault.asset_mint != *base_asset_mint {
                require!(
                    !vault.has_open_positions(),
                    VaultError::CannotQuitWithActivePositions
                );
            }
        }
        Ok(())
    }

    /// Deactivate and hand back the stake amount to return
    pub fn retire(&mut self) -> u64 {
        let stake = self.staked_amount;
        self.staked_amount = 0;
        self.active = false;
        stake
    }
}
