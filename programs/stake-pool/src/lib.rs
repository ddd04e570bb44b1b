pub mod constants;
pub mod error;
pub mod instructions;
pub mod math;
pub mod state;

use anchor_lang::prelude::*;

pub use constants::*;
pub use instructions::*;
pub use state::*;

declare_id!("4yfgL28g3oE2bFqFPACsxxLVS1H6gSiyDYNtsc8Rss7t");

#[program]
pub mod stake_pool {
    use super::*;

    pub fn initialize(ctx: Context<Initialize>) -> Result<()> {
        initialize::handler(ctx)
    }

    pub fn stake(
        ctx: Context<Stake>,
        share_mint_bump: u8,
        vault_bump: u8,
        amount: u64,
    ) -> Result<()> {
        stake::handler(ctx, share_mint_bump, vault_bump, amount)
    }

    pub fn unstake(
        ctx: Context<Unstake>,
        share_mint_bump: u8,
        vault_bump: u8,
        amount: u64,
    ) -> Result<()> {
        unstake::handler(ctx, share_mint_bump, vault_bump, amount)
    }
}
