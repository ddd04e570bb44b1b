use anchor_lang::prelude::*;

#[account]
pub struct Pool {
    /// The mint of the base token this pool custodies
    pub base_mint: Pubkey,
    /// The token account holding the pool's base tokens
    pub vault: Pubkey,
    /// The mint of the share token
    pub share_mint: Pubkey,
    /// Bump seed for this record's derivation
    pub bump: u8,
    /// Bump seed for the vault derivation
    pub vault_bump: u8,
    /// Bump seed for the share mint derivation
    pub share_mint_bump: u8,
}

impl Pool {
    pub const LEN: usize = 8 + // discriminator
        32 + // base_mint
        32 + // vault
        32 + // share_mint
        1 + // bump
        1 + // vault_bump
        1; // share_mint_bump
}
