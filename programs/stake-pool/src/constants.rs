use anchor_lang::prelude::*;

/// Seed of the vault token account holding the pool's base tokens.
#[constant]
pub const POOL_SEED: &[u8] = b"pool";

/// Seed of the share (sToken) mint.
#[constant]
pub const SHARE_MINT_SEED: &[u8] = b"stoken";

/// Seed of the per-mint pool record.
#[constant]
pub const POOL_STATE_SEED: &[u8] = b"pool_state";
