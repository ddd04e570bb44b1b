use anchor_lang::prelude::*;

#[error_code]
pub enum StakeError {
    #[msg("Amount must be greater than zero")]
    InvalidAmount,

    #[msg("Balance does not cover the requested transfer or burn")]
    InsufficientFunds,

    #[msg("Math operation overflow")]
    ArithmeticOverflow,

    #[msg("Missing or incorrect signer")]
    Unauthorized,

    #[msg("Account or bump does not match the derivation for this mint")]
    InvalidDerivation,

    #[msg("Pool already initialized for this mint")]
    AlreadyInitialized,
}
