//! CPI-backed market clients.
//!
//! Markets are called with Anchor-style instructions (8-byte
//! `sha256("global:<name>")[..8]` discriminator followed by borsh arguments).
//! Amounts received are measured as balance deltas on the vault's token
//! accounts rather than trusted from the callee.

use anchor_lang::{
    error::ErrorCode,
    prelude::*,
    solana_program::{
        instruction::{AccountMeta, Instruction},
        program::invoke_signed,
    },
};
use anchor_spl::token::{self, Approve, Mint, TokenAccount};

use crate::{
    adapters::{
        LendingAdapter, LendingPool, LiquidityAdapter, LiquidityAdded, LiquidityMarket, Side,
        YieldAdapter, liquidity_share,
    },
    constants::*,
    errors::VaultError,
    state::{AdapterKind, AdapterSlot, VaultState},
};

fn read_token_account(info: &AccountInfo) -> Result<TokenAccount> {
    let data = info.try_borrow_data()?;
    TokenAccount::try_deserialize(&mut &data[..])
}

fn token_amount(info: &AccountInfo) -> Result<u64> {
    Ok(read_token_account(info)?.amount)
}

fn mint_supply(info: &AccountInfo) -> Result<u64> {
    let data = info.try_borrow_data()?;
    Ok(Mint::try_deserialize(&mut &data[..])?.supply)
}

fn balance_delta(before: u64, after: u64) -> Result<u64> {
    after
        .checked_sub(before)
        .ok_or(error!(VaultError::MathOverflow))
}

// sha256("global:<name>")[..8] of each market instruction
const SWAP_DISCRIMINATOR: [u8; 8] = [248, 198, 158, 145, 225, 117, 135, 200];
const ADD_LIQUIDITY_DISCRIMINATOR: [u8; 8] = [181, 157, 89, 67, 143, 182, 52, 72];
const REMOVE_LIQUIDITY_DISCRIMINATOR: [u8; 8] = [80, 85, 209, 72, 24, 206, 177, 108];
const SUPPLY_DISCRIMINATOR: [u8; 8] = [81, 67, 116, 61, 250, 209, 5, 198];
const WITHDRAW_DISCRIMINATOR: [u8; 8] = [183, 18, 70, 156, 148, 109, 161, 34];

fn market_instruction<T: AnchorSerialize>(
    program_id: Pubkey,
    discriminator: [u8; 8],
    args: &T,
    accounts: Vec<AccountMeta>,
) -> Result<Instruction> {
    let mut data = discriminator.to_vec();
    args.serialize(&mut data)
        .map_err(|_| error!(ErrorCode::InstructionDidNotSerialize))?;
    Ok(Instruction {
        program_id,
        accounts,
        data,
    })
}

#[derive(AnchorSerialize)]
struct SwapArgs {
    amount_in: u64,
    minimum_amount_out: u64,
    deadline: i64,
}

#[derive(AnchorSerialize)]
struct AddLiquidityArgs {
    amount_a_desired: u64,
    amount_b_desired: u64,
    amount_a_min: u64,
    amount_b_min: u64,
    deadline: i64,
}

#[derive(AnchorSerialize)]
struct RemoveLiquidityArgs {
    liquidity: u64,
    amount_a_min: u64,
    amount_b_min: u64,
    deadline: i64,
}

#[derive(AnchorSerialize)]
struct AmountArgs {
    amount: u64,
}

/// Vault authority PDA and the accounts every adapter of a vault shares
#[derive(Clone)]
pub struct VaultSigner<'info> {
    pub vault: Pubkey,
    pub asset_mint: Pubkey,
    pub authority: AccountInfo<'info>,
    pub authority_bump: u8,
    pub asset_account: AccountInfo<'info>,
    pub token_program: AccountInfo<'info>,
}

impl<'info> VaultSigner<'info> {
    pub fn new(
        vault: &Account<'info, VaultState>,
        authority: AccountInfo<'info>,
        asset_account: AccountInfo<'info>,
        token_program: AccountInfo<'info>,
    ) -> Self {
        Self {
            vault: vault.key(),
            asset_mint: vault.asset_mint,
            authority,
            authority_bump: vault.authority_bump,
            asset_account,
            token_program,
        }
    }

    fn invoke(&self, instruction: &Instruction, infos: &[AccountInfo<'info>]) -> Result<()> {
        let bump = [self.authority_bump];
        let seeds: &[&[u8]] = &[VAULT_AUTHORITY_SEED, self.vault.as_ref(), &bump];
        invoke_signed(instruction, infos, &[seeds])?;
        Ok(())
    }

    /// Approve `delegate` for exactly `amount` and report whether the token
    /// account now carries that allowance
    fn approve(
        &self,
        account: &AccountInfo<'info>,
        delegate: &AccountInfo<'info>,
        amount: u64,
    ) -> Result<bool> {
        let bump = [self.authority_bump];
        let seeds: &[&[u8]] = &[VAULT_AUTHORITY_SEED, self.vault.as_ref(), &bump];
        let signer_seeds = &[seeds];

        token::approve(
            CpiContext::new_with_signer(
                self.token_program.clone(),
                Approve {
                    to: account.clone(),
                    delegate: delegate.clone(),
                    authority: self.authority.clone(),
                },
                signer_seeds,
            ),
            amount,
        )?;

        let state = read_token_account(account)?;
        Ok(state.delegate.unwrap_or(Pubkey::default()) == delegate.key()
            && state.delegated_amount == amount)
    }

    fn check_vault_token_account(&self, info: &AccountInfo) -> Result<TokenAccount> {
        let account = read_token_account(info)?;
        require_keys_eq!(account.owner, self.authority.key(), VaultError::InvalidOwner);
        Ok(account)
    }
}

/// Constant-product market reached through CPI
pub struct CpiLiquidityMarket<'info> {
    signer: VaultSigner<'info>,
    program: AccountInfo<'info>,
    pool: AccountInfo<'info>,
    asset_reserve: AccountInfo<'info>,
    counter_reserve: AccountInfo<'info>,
    lp_mint: AccountInfo<'info>,
    vault_counter: AccountInfo<'info>,
    vault_lp: AccountInfo<'info>,
}

impl<'info> CpiLiquidityMarket<'info> {
    /// Accounts: program, pool, asset reserve, counter reserve, lp mint,
    /// vault counter account, vault lp account
    pub fn from_accounts(
        signer: VaultSigner<'info>,
        slot: &AdapterSlot,
        accounts: &[AccountInfo<'info>],
    ) -> Result<Self> {
        let [program, pool, asset_reserve, counter_reserve, lp_mint, vault_counter, vault_lp] =
            accounts
        else {
            return err!(VaultError::AdapterAccountMismatch);
        };
        require_keys_eq!(program.key(), slot.program, VaultError::AdapterAccountMismatch);
        require_keys_eq!(pool.key(), slot.market, VaultError::AdapterAccountMismatch);

        let reserve = read_token_account(asset_reserve)?;
        require_keys_eq!(reserve.mint, signer.asset_mint, VaultError::InvalidMint);

        let counter = signer.check_vault_token_account(vault_counter)?;
        let counter_reserve_account = read_token_account(counter_reserve)?;
        require_keys_eq!(counter_reserve_account.mint, counter.mint, VaultError::InvalidMint);

        let lp = signer.check_vault_token_account(vault_lp)?;
        require_keys_eq!(lp.mint, lp_mint.key(), VaultError::InvalidMint);

        Ok(Self {
            signer,
            program: program.clone(),
            pool: pool.clone(),
            asset_reserve: asset_reserve.clone(),
            counter_reserve: counter_reserve.clone(),
            lp_mint: lp_mint.clone(),
            vault_counter: vault_counter.clone(),
            vault_lp: vault_lp.clone(),
        })
    }

    fn vault_account(&self, side: Side) -> &AccountInfo<'info> {
        match side {
            Side::Asset => &self.signer.asset_account,
            Side::Counter => &self.vault_counter,
        }
    }

    fn reserve(&self, side: Side) -> &AccountInfo<'info> {
        match side {
            Side::Asset => &self.asset_reserve,
            Side::Counter => &self.counter_reserve,
        }
    }

    /// Account list shared by add and remove liquidity
    fn liquidity_accounts(&self) -> (Vec<AccountMeta>, Vec<AccountInfo<'info>>) {
        let metas = vec![
            AccountMeta::new(self.pool.key(), false),
            AccountMeta::new_readonly(self.signer.authority.key(), true),
            AccountMeta::new(self.signer.asset_account.key(), false),
            AccountMeta::new(self.vault_counter.key(), false),
            AccountMeta::new(self.asset_reserve.key(), false),
            AccountMeta::new(self.counter_reserve.key(), false),
            AccountMeta::new(self.lp_mint.key(), false),
            AccountMeta::new(self.vault_lp.key(), false),
            AccountMeta::new_readonly(self.signer.token_program.key(), false),
        ];
        let infos = vec![
            self.program.clone(),
            self.pool.clone(),
            self.signer.authority.clone(),
            self.signer.asset_account.clone(),
            self.vault_counter.clone(),
            self.asset_reserve.clone(),
            self.counter_reserve.clone(),
            self.lp_mint.clone(),
            self.vault_lp.clone(),
            self.signer.token_program.clone(),
        ];
        (metas, infos)
    }
}

impl<'info> LiquidityMarket for CpiLiquidityMarket<'info> {
    fn quote_remove_liquidity(&self, liquidity: u64) -> Result<(u64, u64)> {
        liquidity_share(
            liquidity,
            mint_supply(&self.lp_mint)?,
            token_amount(&self.asset_reserve)?,
            token_amount(&self.counter_reserve)?,
        )
    }

    fn approve(&mut self, side: Side, amount: u64) -> Result<bool> {
        self.signer.approve(self.vault_account(side), &self.pool, amount)
    }

    fn swap(
        &mut self,
        input: Side,
        amount_in: u64,
        minimum_out: u64,
        deadline: i64,
    ) -> Result<u64> {
        let source = self.vault_account(input).clone();
        let destination = self.vault_account(input.opposite()).clone();
        let reserve_in = self.reserve(input).clone();
        let reserve_out = self.reserve(input.opposite()).clone();

        let instruction = market_instruction(
            self.program.key(),
            SWAP_DISCRIMINATOR,
            &SwapArgs {
                amount_in,
                minimum_amount_out: minimum_out,
                deadline,
            },
            vec![
                AccountMeta::new(self.pool.key(), false),
                AccountMeta::new_readonly(self.signer.authority.key(), true),
                AccountMeta::new(source.key(), false),
                AccountMeta::new(destination.key(), false),
                AccountMeta::new(reserve_in.key(), false),
                AccountMeta::new(reserve_out.key(), false),
                AccountMeta::new_readonly(self.signer.token_program.key(), false),
            ],
        )?;

        let before = token_amount(&destination)?;
        self.signer.invoke(
            &instruction,
            &[
                self.program.clone(),
                self.pool.clone(),
                self.signer.authority.clone(),
                source,
                destination.clone(),
                reserve_in,
                reserve_out,
                self.signer.token_program.clone(),
            ],
        )?;
        balance_delta(before, token_amount(&destination)?)
    }

    fn add_liquidity(
        &mut self,
        asset_desired: u64,
        counter_desired: u64,
        asset_min: u64,
        counter_min: u64,
        deadline: i64,
    ) -> Result<LiquidityAdded> {
        let (metas, infos) = self.liquidity_accounts();
        let instruction = market_instruction(
            self.program.key(),
            ADD_LIQUIDITY_DISCRIMINATOR,
            &AddLiquidityArgs {
                amount_a_desired: asset_desired,
                amount_b_desired: counter_desired,
                amount_a_min: asset_min,
                amount_b_min: counter_min,
                deadline,
            },
            metas,
        )?;

        let asset_before = token_amount(&self.signer.asset_account)?;
        let counter_before = token_amount(&self.vault_counter)?;
        let lp_before = token_amount(&self.vault_lp)?;

        self.signer.invoke(&instruction, &infos)?;

        Ok(LiquidityAdded {
            asset_used: balance_delta(token_amount(&self.signer.asset_account)?, asset_before)?,
            counter_used: balance_delta(token_amount(&self.vault_counter)?, counter_before)?,
            liquidity: balance_delta(lp_before, token_amount(&self.vault_lp)?)?,
        })
    }

    fn remove_liquidity(
        &mut self,
        liquidity: u64,
        asset_min: u64,
        counter_min: u64,
        deadline: i64,
    ) -> Result<(u64, u64)> {
        let (metas, infos) = self.liquidity_accounts();
        let instruction = market_instruction(
            self.program.key(),
            REMOVE_LIQUIDITY_DISCRIMINATOR,
            &RemoveLiquidityArgs {
                liquidity,
                amount_a_min: asset_min,
                amount_b_min: counter_min,
                deadline,
            },
            metas,
        )?;

        let asset_before = token_amount(&self.signer.asset_account)?;
        let counter_before = token_amount(&self.vault_counter)?;

        self.signer.invoke(&instruction, &infos)?;

        Ok((
            balance_delta(asset_before, token_amount(&self.signer.asset_account)?)?,
            balance_delta(counter_before, token_amount(&self.vault_counter)?)?,
        ))
    }
}

/// Lending pool reached through CPI
pub struct CpiLendingPool<'info> {
    signer: VaultSigner<'info>,
    program: AccountInfo<'info>,
    reserve: AccountInfo<'info>,
    liquidity_supply: AccountInfo<'info>,
    receipt_mint: AccountInfo<'info>,
    vault_receipt: AccountInfo<'info>,
}

impl<'info> CpiLendingPool<'info> {
    /// Accounts: program, reserve, liquidity supply, receipt mint,
    /// vault receipt account
    pub fn from_accounts(
        signer: VaultSigner<'info>,
        slot: &AdapterSlot,
        accounts: &[AccountInfo<'info>],
    ) -> Result<Self> {
        let [program, reserve, liquidity_supply, receipt_mint, vault_receipt] = accounts else {
            return err!(VaultError::AdapterAccountMismatch);
        };
        require_keys_eq!(program.key(), slot.program, VaultError::AdapterAccountMismatch);
        require_keys_eq!(reserve.key(), slot.market, VaultError::AdapterAccountMismatch);

        let supply = read_token_account(liquidity_supply)?;
        require_keys_eq!(supply.mint, signer.asset_mint, VaultError::InvalidMint);

        let receipt = signer.check_vault_token_account(vault_receipt)?;
        require_keys_eq!(receipt.mint, receipt_mint.key(), VaultError::InvalidMint);

        Ok(Self {
            signer,
            program: program.clone(),
            reserve: reserve.clone(),
            liquidity_supply: liquidity_supply.clone(),
            receipt_mint: receipt_mint.clone(),
            vault_receipt: vault_receipt.clone(),
        })
    }

    fn call(&self, discriminator: [u8; 8], amount: u64) -> Result<()> {
        let instruction = market_instruction(
            self.program.key(),
            discriminator,
            &AmountArgs { amount },
            vec![
                AccountMeta::new(self.reserve.key(), false),
                AccountMeta::new_readonly(self.signer.authority.key(), true),
                AccountMeta::new(self.signer.asset_account.key(), false),
                AccountMeta::new(self.vault_receipt.key(), false),
                AccountMeta::new(self.liquidity_supply.key(), false),
                AccountMeta::new(self.receipt_mint.key(), false),
                AccountMeta::new_readonly(self.signer.token_program.key(), false),
            ],
        )?;
        self.signer.invoke(
            &instruction,
            &[
                self.program.clone(),
                self.reserve.clone(),
                self.signer.authority.clone(),
                self.signer.asset_account.clone(),
                self.vault_receipt.clone(),
                self.liquidity_supply.clone(),
                self.receipt_mint.clone(),
                self.signer.token_program.clone(),
            ],
        )
    }
}

impl<'info> LendingPool for CpiLendingPool<'info> {
    fn approve(&mut self, amount: u64) -> Result<bool> {
        self.signer
            .approve(&self.signer.asset_account, &self.reserve, amount)
    }

    fn receipt_balance(&self) -> Result<u64> {
        token_amount(&self.vault_receipt)
    }

    fn supply(&mut self, amount: u64) -> Result<()> {
        self.call(SUPPLY_DISCRIMINATOR, amount)
    }

    fn withdraw(&mut self, amount: u64) -> Result<u64> {
        let before = token_amount(&self.signer.asset_account)?;
        self.call(WITHDRAW_DISCRIMINATOR, amount)?;
        balance_delta(before, token_amount(&self.signer.asset_account)?)
    }
}

/// Build one adapter per registered slot, in slot order, from the
/// instruction's remaining accounts.
///
/// `reference_rates` holds one rate per slot (counter units per asset unit,
/// scaled by `RATE_SCALE`); lending slots ignore theirs.
///
/// No remaining accounts binds no adapters; an operation that then needs a
/// market fails with `AdapterAccountMismatch`.
pub fn build_adapters<'info>(
    vault: &VaultState,
    signer: &VaultSigner<'info>,
    remaining: &[AccountInfo<'info>],
    reference_rates: &[u64],
) -> Result<Vec<Box<dyn YieldAdapter + 'info>>> {
    if remaining.is_empty() {
        return Ok(Vec::new());
    }
    require!(
        reference_rates.len() == vault.adapters.len(),
        VaultError::InvalidReferenceRate
    );

    let mut adapters: Vec<Box<dyn YieldAdapter + 'info>> = Vec::with_capacity(vault.adapters.len());
    let mut cursor = 0usize;

    for (slot, reference_rate) in vault.adapters.iter().zip(reference_rates) {
        let width = match slot.kind {
            AdapterKind::LiquidityMarket => LIQUIDITY_ADAPTER_ACCOUNTS,
            AdapterKind::LendingMarket => LENDING_ADAPTER_ACCOUNTS,
        };
        let end = cursor + width;
        let accounts = remaining
            .get(cursor..end)
            .ok_or(error!(VaultError::AdapterAccountMismatch))?;

        let adapter: Box<dyn YieldAdapter + 'info> = match slot.kind {
            AdapterKind::LiquidityMarket => {
                require!(*reference_rate > 0, VaultError::InvalidReferenceRate);
                Box::new(LiquidityAdapter::new(
                    CpiLiquidityMarket::from_accounts(signer.clone(), slot, accounts)?,
                    *reference_rate,
                ))
            }
            AdapterKind::LendingMarket => Box::new(LendingAdapter::new(
                CpiLendingPool::from_accounts(signer.clone(), slot, accounts)?,
            )),
        };
        adapters.push(adapter);
        cursor = end;
    }

    require!(
        cursor == remaining.len(),
        VaultError::AdapterAccountMismatch
    );
    Ok(adapters)
}
