use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

use crate::constants::{POOL_SEED, POOL_STATE_SEED, SHARE_MINT_SEED};
use crate::error::StakeError;
use crate::state::Pool;

#[derive(Accounts)]
pub struct Initialize<'info> {
    /// The base asset mint the pool will custody
    pub base_mint: InterfaceAccount<'info, Mint>,

    /// The pool record tying vault and share mint to the base mint
    #[account(
        init,
        payer = payer,
        space = Pool::LEN,
        seeds = [POOL_STATE_SEED, base_mint.key().as_ref()],
        bump
    )]
    pub pool: Account<'info, Pool>,

    /// The token account that will hold deposited base tokens.
    /// It is its own transfer authority, so only this program can sign
    /// for outgoing transfers.
    #[account(
        init,
        payer = payer,
        token::mint = base_mint,
        token::authority = vault,
        token::token_program = token_program,
        seeds = [POOL_SEED, base_mint.key().as_ref()],
        bump
    )]
    pub vault: InterfaceAccount<'info, TokenAccount>,

    /// The share mint, with the vault PDA as mint authority
    #[account(
        init,
        payer = payer,
        mint::decimals = base_mint.decimals,
        mint::authority = vault,
        mint::token_program = token_program,
        seeds = [SHARE_MINT_SEED, base_mint.key().as_ref()],
        bump
    )]
    pub share_mint: InterfaceAccount<'info, Mint>,

    #[account(mut)]
    pub payer: Signer<'info>,

    pub token_program: Interface<'info, TokenInterface>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

pub fn handler(ctx: Context<Initialize>) -> Result<()> {
    let pool = &mut ctx.accounts.pool;

    require!(
        pool.base_mint == Pubkey::default(),
        StakeError::AlreadyInitialized
    );

    pool.base_mint = ctx.accounts.base_mint.key();
    pool.vault = ctx.accounts.vault.key();
    pool.share_mint = ctx.accounts.share_mint.key();
    pool.bump = ctx.bumps.pool;
    pool.vault_bump = ctx.bumps.vault;
    pool.share_mint_bump = ctx.bumps.share_mint;

    msg!("Pool initialized for base mint {}", pool.base_mint);
    msg!("Vault: {}", pool.vault);
    msg!("Share mint: {}", pool.share_mint);

    Ok(())
}
