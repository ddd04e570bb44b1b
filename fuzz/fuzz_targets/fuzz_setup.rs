use anchor_lang::AccountDeserialize;
use anchor_lang::InstructionData;
use anchor_lang::ToAccountMetas;
use solana_program_test::*;
use solana_sdk::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    instruction::{Instruction, InstructionError},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::{Transaction, TransactionError},
};
use spl_token::instruction as token_instruction;
use stake_pool::constants::{POOL_SEED, POOL_STATE_SEED, SHARE_MINT_SEED};
use stake_pool::error::StakeError;
use stake_pool::state::Pool;

// Re-export for convenience
pub use solana_program_test::ProgramTestContext;

// Custom error type for fuzzing
pub type FuzzResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Test environment with program loaded
pub struct FuzzTestEnv {
    pub program_id: Pubkey,
    pub context: ProgramTestContext,
}

/// Base (xToken) mint accounts
#[derive(Debug)]
pub struct BaseMintAccounts {
    pub mint: Pubkey,
    pub mint_authority: Keypair,
    pub decimals: u8,
}

/// Pool-specific accounts, with the canonical bumps of their derivations
#[derive(Debug, Clone)]
pub struct PoolAccounts {
    pub pool: Pubkey,
    pub vault: Pubkey,
    pub share_mint: Pubkey,
    pub base_mint: Pubkey,
    pub vault_bump: u8,
    pub share_mint_bump: u8,
}

/// User token accounts for interacting with the pool
#[derive(Debug)]
pub struct UserAccounts {
    pub owner: Keypair,
    pub base_token_account: Pubkey,
    pub share_token_account: Pubkey,
}

/// Complete setup with all accounts
pub struct CompleteSetup {
    pub base: BaseMintAccounts,
    pub pool: PoolAccounts,
    pub user: UserAccounts,
}

// ============================================================================
// Core Setup Functions
// ============================================================================

// `entry` borrows the account slice for the accounts' own lifetime, so the
// harness hands it a leaked copy of the slice the runtime built.
fn process_entry(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let accounts = Box::leak(Box::new(accounts.to_vec()));
    stake_pool::entry(program_id, accounts, instruction_data)
}

/// Creates the basic program test environment with the staking program loaded
pub async fn setup_program_test() -> FuzzTestEnv {
    let program_id = stake_pool::id();
    let program_test = ProgramTest::new("stake_pool", program_id, processor!(process_entry));

    let context = program_test.start_with_context().await;

    FuzzTestEnv {
        program_id,
        context,
    }
}

/// Transfers lamports from the context payer to `recipient`
pub async fn fund_account(
    context: &mut ProgramTestContext,
    recipient: &Pubkey,
    lamports: u64,
) -> FuzzResult<()> {
    let ix = solana_sdk::system_instruction::transfer(
        &context.payer.pubkey(),
        recipient,
        lamports,
    );

    let tx = Transaction::new_signed_with_payer(
        &[ix],
        Some(&context.payer.pubkey()),
        &[&context.payer],
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await?;

    Ok(())
}

/// Creates a new SPL token mint to serve as the base (xToken) asset
pub async fn setup_base_mint(
    context: &mut ProgramTestContext,
    decimals: u8,
) -> FuzzResult<BaseMintAccounts> {
    let mint_authority = Keypair::new();
    let mint_keypair = Keypair::new();
    let mint = mint_keypair.pubkey();

    let rent = context.banks_client.get_rent().await?;
    let mint_len = 82; // Size of Mint account in SPL Token program
    let mint_rent = rent.minimum_balance(mint_len);

    let create_account_ix = solana_sdk::system_instruction::create_account(
        &context.payer.pubkey(),
        &mint,
        mint_rent,
        mint_len as u64,
        &spl_token::id(),
    );

    let init_mint_ix = token_instruction::initialize_mint(
        &spl_token::id(),
        &mint,
        &mint_authority.pubkey(),
        None,
        decimals,
    )?;

    let tx = Transaction::new_signed_with_payer(
        &[create_account_ix, init_mint_ix],
        Some(&context.payer.pubkey()),
        &[&context.payer, &mint_keypair],
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await?;

    Ok(BaseMintAccounts {
        mint,
        mint_authority,
        decimals,
    })
}

/// Initializes a pool for the given base mint, paid for by `payer`
pub async fn initialize_pool(
    context: &mut ProgramTestContext,
    program_id: &Pubkey,
    base_mint: &Pubkey,
    payer: &Keypair,
) -> std::result::Result<PoolAccounts, BanksClientError> {
    let (pool, _) = derive_pool_state_pda(program_id, base_mint);
    let (vault, vault_bump) = derive_vault_pda(program_id, base_mint);
    let (share_mint, share_mint_bump) = derive_share_mint_pda(program_id, base_mint);

    let accounts = stake_pool::accounts::Initialize {
        base_mint: *base_mint,
        pool,
        vault,
        share_mint,
        payer: payer.pubkey(),
        token_program: spl_token::id(),
        system_program: solana_sdk::system_program::ID,
        rent: solana_sdk::sysvar::rent::ID,
    };

    let data = stake_pool::instruction::Initialize {}.data();

    let ix = Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data,
    };

    let tx = Transaction::new_signed_with_payer(
        &[ix],
        Some(&payer.pubkey()),
        &[payer],
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await?;

    Ok(PoolAccounts {
        pool,
        vault,
        share_mint,
        base_mint: *base_mint,
        vault_bump,
        share_mint_bump,
    })
}

/// Creates base and share token accounts for a fresh user
pub async fn setup_user(
    context: &mut ProgramTestContext,
    base_mint: &Pubkey,
    share_mint: &Pubkey,
) -> FuzzResult<UserAccounts> {
    let owner = Keypair::new();

    fund_account(context, &owner.pubkey(), 1_000_000_000).await?;

    let rent = context.banks_client.get_rent().await?;
    let account_len = 165; // Size of Token account in SPL Token program

    let base_token_account = Keypair::new();
    let create_base_ix = solana_sdk::system_instruction::create_account(
        &context.payer.pubkey(),
        &base_token_account.pubkey(),
        rent.minimum_balance(account_len),
        account_len as u64,
        &spl_token::id(),
    );

    let init_base_ix = token_instruction::initialize_account(
        &spl_token::id(),
        &base_token_account.pubkey(),
        base_mint,
        &owner.pubkey(),
    )?;

    let share_token_account = Keypair::new();
    let create_share_ix = solana_sdk::system_instruction::create_account(
        &context.payer.pubkey(),
        &share_token_account.pubkey(),
        rent.minimum_balance(account_len),
        account_len as u64,
        &spl_token::id(),
    );

    let init_share_ix = token_instruction::initialize_account(
        &spl_token::id(),
        &share_token_account.pubkey(),
        share_mint,
        &owner.pubkey(),
    )?;

    let tx = Transaction::new_signed_with_payer(
        &[create_base_ix, init_base_ix, create_share_ix, init_share_ix],
        Some(&context.payer.pubkey()),
        &[&context.payer, &base_token_account, &share_token_account],
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await?;

    Ok(UserAccounts {
        owner,
        base_token_account: base_token_account.pubkey(),
        share_token_account: share_token_account.pubkey(),
    })
}

/// Mints base tokens to a destination token account
pub async fn mint_base_tokens(
    context: &mut ProgramTestContext,
    mint: &Pubkey,
    mint_authority: &Keypair,
    destination: &Pubkey,
    amount: u64,
) -> FuzzResult<()> {
    let mint_to_ix = token_instruction::mint_to(
        &spl_token::id(),
        mint,
        destination,
        &mint_authority.pubkey(),
        &[],
        amount,
    )?;

    let tx = Transaction::new_signed_with_payer(
        &[mint_to_ix],
        Some(&context.payer.pubkey()),
        &[&context.payer, mint_authority],
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await?;

    Ok(())
}

/// Sets up everything: pool + base mint + one user holding base tokens
pub async fn setup_complete_environment(
    initial_user_balance: u64,
    decimals: u8,
) -> FuzzResult<(FuzzTestEnv, CompleteSetup)> {
    let mut env = setup_program_test().await;

    let base = setup_base_mint(&mut env.context, decimals).await?;

    let admin = Keypair::new();
    fund_account(&mut env.context, &admin.pubkey(), 1_000_000_000).await?;

    let pool = initialize_pool(&mut env.context, &env.program_id, &base.mint, &admin).await?;

    let user = setup_user(&mut env.context, &base.mint, &pool.share_mint).await?;

    if initial_user_balance > 0 {
        mint_base_tokens(
            &mut env.context,
            &base.mint,
            &base.mint_authority,
            &user.base_token_account,
            initial_user_balance,
        )
        .await?;
    }

    let setup = CompleteSetup { base, pool, user };

    Ok((env, setup))
}

// ============================================================================
// Instruction Helpers
// ============================================================================

/// Builds a stake instruction with explicit bumps
pub fn build_stake_instruction(
    program_id: &Pubkey,
    pool: &PoolAccounts,
    user: &UserAccounts,
    share_mint_bump: u8,
    vault_bump: u8,
    amount: u64,
) -> Instruction {
    let accounts = stake_pool::accounts::Stake {
        pool: pool.pool,
        base_mint: pool.base_mint,
        vault: pool.vault,
        share_mint: pool.share_mint,
        owner_base_account: user.base_token_account,
        owner_share_account: user.share_token_account,
        owner: user.owner.pubkey(),
        token_program: spl_token::id(),
    };

    let data = stake_pool::instruction::Stake {
        share_mint_bump,
        vault_bump,
        amount,
    }
    .data();

    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data,
    }
}

/// Builds an unstake instruction with explicit bumps
pub fn build_unstake_instruction(
    program_id: &Pubkey,
    pool: &PoolAccounts,
    user: &UserAccounts,
    share_mint_bump: u8,
    vault_bump: u8,
    amount: u64,
) -> Instruction {
    let accounts = stake_pool::accounts::Unstake {
        pool: pool.pool,
        base_mint: pool.base_mint,
        vault: pool.vault,
        share_mint: pool.share_mint,
        owner_base_account: user.base_token_account,
        owner_share_account: user.share_token_account,
        owner: user.owner.pubkey(),
        token_program: spl_token::id(),
    };

    let data = stake_pool::instruction::Unstake {
        share_mint_bump,
        vault_bump,
        amount,
    }
    .data();

    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data,
    }
}

/// Signs and processes a single instruction, fee-paid by the user
pub async fn process_as_user(
    context: &mut ProgramTestContext,
    user: &UserAccounts,
    ix: Instruction,
) -> std::result::Result<(), BanksClientError> {
    let tx = Transaction::new_signed_with_payer(
        &[ix],
        Some(&user.owner.pubkey()),
        &[&user.owner],
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await
}

/// Stakes `amount` base tokens with the canonical bumps
pub async fn stake(
    context: &mut ProgramTestContext,
    program_id: &Pubkey,
    pool: &PoolAccounts,
    user: &UserAccounts,
    amount: u64,
) -> std::result::Result<(), BanksClientError> {
    let ix = build_stake_instruction(
        program_id,
        pool,
        user,
        pool.share_mint_bump,
        pool.vault_bump,
        amount,
    );
    process_as_user(context, user, ix).await
}

/// Unstakes `amount` shares with the canonical bumps
pub async fn unstake(
    context: &mut ProgramTestContext,
    program_id: &Pubkey,
    pool: &PoolAccounts,
    user: &UserAccounts,
    amount: u64,
) -> std::result::Result<(), BanksClientError> {
    let ix = build_unstake_instruction(
        program_id,
        pool,
        user,
        pool.share_mint_bump,
        pool.vault_bump,
        amount,
    );
    process_as_user(context, user, ix).await
}

// ============================================================================
// PDA Derivation Helpers
// ============================================================================

/// Derive the pool record PDA
pub fn derive_pool_state_pda(program_id: &Pubkey, base_mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[POOL_STATE_SEED, base_mint.as_ref()], program_id)
}

/// Derive the vault token account PDA
pub fn derive_vault_pda(program_id: &Pubkey, base_mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[POOL_SEED, base_mint.as_ref()], program_id)
}

/// Derive the share mint PDA
pub fn derive_share_mint_pda(program_id: &Pubkey, base_mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[SHARE_MINT_SEED, base_mint.as_ref()], program_id)
}

// ============================================================================
// Account State Verification Helpers
// ============================================================================

/// Fetch and return the pool record
pub async fn get_pool_state(
    context: &mut ProgramTestContext,
    pool: &Pubkey,
) -> FuzzResult<Pool> {
    let account = context
        .banks_client
        .get_account(*pool)
        .await?
        .ok_or("Pool account not found")?;

    let pool_data = Pool::try_deserialize(&mut account.data.as_ref())?;
    Ok(pool_data)
}

/// Get token account balance
pub async fn get_token_balance(
    context: &mut ProgramTestContext,
    account: &Pubkey,
) -> FuzzResult<u64> {
    let account_data = context
        .banks_client
        .get_account(*account)
        .await?
        .ok_or("Token account not found")?;

    // Token account structure: amount is at offset 64 (u64)
    if account_data.data.len() < 72 {
        return Err("Invalid token account data".into());
    }

    let amount = u64::from_le_bytes(
        account_data.data[64..72]
            .try_into()
            .map_err(|_| "Failed to parse amount")?,
    );

    Ok(amount)
}

/// Get mint supply
pub async fn get_mint_supply(
    context: &mut ProgramTestContext,
    mint: &Pubkey,
) -> FuzzResult<u64> {
    let account = context
        .banks_client
        .get_account(*mint)
        .await?
        .ok_or("Mint account not found")?;

    // Mint account structure: supply is at offset 36 (u64)
    if account.data.len() < 44 {
        return Err("Invalid mint account data".into());
    }

    let supply = u64::from_le_bytes(
        account.data[36..44]
            .try_into()
            .map_err(|_| "Failed to parse supply")?,
    );

    Ok(supply)
}

// ============================================================================
// Error Helpers
// ============================================================================

/// Extracts the custom program error code from a failed transaction, if any
pub fn custom_error_code(err: &BanksClientError) -> Option<u32> {
    match err {
        BanksClientError::TransactionError(TransactionError::InstructionError(
            _,
            InstructionError::Custom(code),
        )) => Some(*code),
        BanksClientError::SimulationError {
            err: TransactionError::InstructionError(_, InstructionError::Custom(code)),
            ..
        } => Some(*code),
        _ => None,
    }
}

/// The on-chain error code for a `StakeError` variant
pub fn stake_error_code(err: StakeError) -> u32 {
    anchor_lang::error::ERROR_CODE_OFFSET + err as u32
}
