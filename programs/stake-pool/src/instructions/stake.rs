use anchor_lang::prelude::*;
use anchor_spl::token_interface::{
    mint_to, transfer_checked, Mint, MintTo, TokenAccount, TokenInterface, TransferChecked,
};

use crate::constants::{POOL_SEED, POOL_STATE_SEED, SHARE_MINT_SEED};
use crate::error::StakeError;
use crate::math;
use crate::state::Pool;

#[derive(Accounts)]
pub struct Stake<'info> {
    #[account(
        seeds = [POOL_STATE_SEED, base_mint.key().as_ref()],
        bump = pool.bump,
        has_one = base_mint @ StakeError::InvalidDerivation,
        has_one = vault @ StakeError::InvalidDerivation,
        has_one = share_mint @ StakeError::InvalidDerivation,
    )]
    pub pool: Account<'info, Pool>,

    /// The base asset mint
    pub base_mint: InterfaceAccount<'info, Mint>,

    /// The pool's token account holding base tokens
    #[account(
        mut,
        seeds = [POOL_SEED, base_mint.key().as_ref()],
        bump = pool.vault_bump
    )]
    pub vault: InterfaceAccount<'info, TokenAccount>,

    /// The share mint
    #[account(
        mut,
        seeds = [SHARE_MINT_SEED, base_mint.key().as_ref()],
        bump = pool.share_mint_bump
    )]
    pub share_mint: InterfaceAccount<'info, Mint>,

    /// The owner's base-token account, debited by the stake
    #[account(
        mut,
        token::mint = base_mint,
        constraint = owner_base_account.owner == owner.key() @ StakeError::Unauthorized,
    )]
    pub owner_base_account: InterfaceAccount<'info, TokenAccount>,

    /// The owner's share-token account, credited with minted shares
    #[account(
        mut,
        token::mint = share_mint,
        constraint = owner_share_account.owner == owner.key() @ StakeError::Unauthorized,
    )]
    pub owner_share_account: InterfaceAccount<'info, TokenAccount>,

    pub owner: Signer<'info>,

    pub token_program: Interface<'info, TokenInterface>,
}

pub fn handler(
    ctx: Context<Stake>,
    share_mint_bump: u8,
    vault_bump: u8,
    amount: u64,
) -> Result<()> {
    require!(
        vault_bump == ctx.accounts.pool.vault_bump,
        StakeError::InvalidDerivation
    );
    require!(
        share_mint_bump == ctx.accounts.pool.share_mint_bump,
        StakeError::InvalidDerivation
    );
    require!(
        ctx.accounts.owner_base_account.amount >= amount,
        StakeError::InsufficientFunds
    );

    // Balances as deserialized at transaction entry, before the transfer
    // below lands.
    let vault_balance = ctx.accounts.vault.amount;
    let share_supply = ctx.accounts.share_mint.supply;

    let shares_to_mint = math::base_to_shares(amount, vault_balance, share_supply)?;
    require!(shares_to_mint > 0, StakeError::InvalidAmount);

    // Move the base tokens into the vault
    let transfer_accounts = TransferChecked {
        from: ctx.accounts.owner_base_account.to_account_info(),
        mint: ctx.accounts.base_mint.to_account_info(),
        to: ctx.accounts.vault.to_account_info(),
        authority: ctx.accounts.owner.to_account_info(),
    };

    let cpi_ctx = CpiContext::new(
        ctx.accounts.token_program.to_account_info(),
        transfer_accounts,
    );

    transfer_checked(cpi_ctx, amount, ctx.accounts.base_mint.decimals)?;

    // Mint the shares, signed by the vault PDA
    let base_mint_key = ctx.accounts.base_mint.key();
    let vault_seeds = &[POOL_SEED, base_mint_key.as_ref(), &[vault_bump]];
    let signer_seeds = &[&vault_seeds[..]];

    let mint_accounts = MintTo {
        mint: ctx.accounts.share_mint.to_account_info(),
        to: ctx.accounts.owner_share_account.to_account_info(),
        authority: ctx.accounts.vault.to_account_info(),
    };

    let cpi_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_program.to_account_info(),
        mint_accounts,
        signer_seeds,
    );

    mint_to(cpi_ctx, shares_to_mint)?;

    msg!("Staked {} base tokens for {} shares", amount, shares_to_mint);
    msg!("Vault balance: {}", vault_balance + amount);
    msg!("Share supply: {}", share_supply + shares_to_mint);

    Ok(())
}
