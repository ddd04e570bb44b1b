use anchor_lang::{InstructionData, ToAccountMetas};
use fuzz_helpers::*;
use solana_sdk::{instruction::Instruction, signature::Keypair, signer::Signer};
use stake_pool::error::StakeError;

#[tokio::test]
async fn initialize_creates_pool_accounts() {
    let (mut env, setup) = setup_complete_environment(0, 6).await.unwrap();

    let pool = get_pool_state(&mut env.context, &setup.pool.pool)
        .await
        .unwrap();

    assert_eq!(pool.base_mint, setup.base.mint);
    assert_eq!(pool.vault, setup.pool.vault);
    assert_eq!(pool.share_mint, setup.pool.share_mint);
    assert_eq!(pool.vault_bump, setup.pool.vault_bump);
    assert_eq!(pool.share_mint_bump, setup.pool.share_mint_bump);

    let vault_balance = get_token_balance(&mut env.context, &setup.pool.vault)
        .await
        .unwrap();
    let share_supply = get_mint_supply(&mut env.context, &setup.pool.share_mint)
        .await
        .unwrap();

    assert_eq!(vault_balance, 0);
    assert_eq!(share_supply, 0);
}

#[tokio::test]
async fn initialize_twice_fails() {
    let (mut env, setup) = setup_complete_environment(0, 6).await.unwrap();

    let second_payer = Keypair::new();
    fund_account(&mut env.context, &second_payer.pubkey(), 1_000_000_000)
        .await
        .unwrap();

    let result = initialize_pool(
        &mut env.context,
        &env.program_id,
        &setup.base.mint,
        &second_payer,
    )
    .await;

    assert!(result.is_err(), "re-initializing the same pool must fail");
}

#[tokio::test]
async fn first_stake_mints_one_to_one() {
    let (mut env, setup) = setup_complete_environment(10_000, 6).await.unwrap();

    stake(
        &mut env.context,
        &env.program_id,
        &setup.pool,
        &setup.user,
        3_000,
    )
    .await
    .unwrap();

    let user_base = get_token_balance(&mut env.context, &setup.user.base_token_account)
        .await
        .unwrap();
    let user_shares = get_token_balance(&mut env.context, &setup.user.share_token_account)
        .await
        .unwrap();
    let vault_balance = get_token_balance(&mut env.context, &setup.pool.vault)
        .await
        .unwrap();
    let share_supply = get_mint_supply(&mut env.context, &setup.pool.share_mint)
        .await
        .unwrap();

    assert_eq!(user_base, 7_000);
    assert_eq!(user_shares, 3_000);
    assert_eq!(vault_balance, 3_000);
    assert_eq!(share_supply, 3_000);
}

#[tokio::test]
async fn reference_trace_two_stakers() {
    let (mut env, setup) = setup_complete_environment(10_000, 6).await.unwrap();
    let alice = setup.user;

    let bob = setup_user(&mut env.context, &setup.base.mint, &setup.pool.share_mint)
        .await
        .unwrap();
    mint_base_tokens(
        &mut env.context,
        &setup.base.mint,
        &setup.base.mint_authority,
        &bob.base_token_account,
        10_000,
    )
    .await
    .unwrap();

    stake(&mut env.context, &env.program_id, &setup.pool, &alice, 3_000)
        .await
        .unwrap();
    stake(&mut env.context, &env.program_id, &setup.pool, &bob, 7_000)
        .await
        .unwrap();

    let vault_balance = get_token_balance(&mut env.context, &setup.pool.vault)
        .await
        .unwrap();
    let share_supply = get_mint_supply(&mut env.context, &setup.pool.share_mint)
        .await
        .unwrap();
    assert_eq!(vault_balance, 10_000);
    assert_eq!(share_supply, 10_000);

    unstake(&mut env.context, &env.program_id, &setup.pool, &alice, 2_000)
        .await
        .unwrap();
    unstake(&mut env.context, &env.program_id, &setup.pool, &bob, 7_000)
        .await
        .unwrap();

    let alice_base = get_token_balance(&mut env.context, &alice.base_token_account)
        .await
        .unwrap();
    let alice_shares = get_token_balance(&mut env.context, &alice.share_token_account)
        .await
        .unwrap();
    let bob_base = get_token_balance(&mut env.context, &bob.base_token_account)
        .await
        .unwrap();
    let bob_shares = get_token_balance(&mut env.context, &bob.share_token_account)
        .await
        .unwrap();
    let vault_balance = get_token_balance(&mut env.context, &setup.pool.vault)
        .await
        .unwrap();
    let share_supply = get_mint_supply(&mut env.context, &setup.pool.share_mint)
        .await
        .unwrap();

    assert_eq!(alice_base, 9_000);
    assert_eq!(alice_shares, 1_000);
    assert_eq!(bob_base, 10_000);
    assert_eq!(bob_shares, 0);
    assert_eq!(vault_balance, 1_000);
    assert_eq!(share_supply, 1_000);

    // No base tokens created or destroyed across the whole sequence.
    assert_eq!(alice_base + bob_base + vault_balance, 20_000);
}

#[tokio::test]
async fn zero_amount_is_rejected() {
    let (mut env, setup) = setup_complete_environment(5_000, 6).await.unwrap();

    let err = stake(
        &mut env.context,
        &env.program_id,
        &setup.pool,
        &setup.user,
        0,
    )
    .await
    .unwrap_err();
    assert_eq!(
        custom_error_code(&err),
        Some(stake_error_code(StakeError::InvalidAmount))
    );

    let err = unstake(
        &mut env.context,
        &env.program_id,
        &setup.pool,
        &setup.user,
        0,
    )
    .await
    .unwrap_err();
    assert_eq!(
        custom_error_code(&err),
        Some(stake_error_code(StakeError::InvalidAmount))
    );

    // Nothing moved.
    let user_base = get_token_balance(&mut env.context, &setup.user.base_token_account)
        .await
        .unwrap();
    let vault_balance = get_token_balance(&mut env.context, &setup.pool.vault)
        .await
        .unwrap();
    assert_eq!(user_base, 5_000);
    assert_eq!(vault_balance, 0);
}

#[tokio::test]
async fn stake_beyond_balance_fails() {
    let (mut env, setup) = setup_complete_environment(1_000, 6).await.unwrap();

    let err = stake(
        &mut env.context,
        &env.program_id,
        &setup.pool,
        &setup.user,
        1_001,
    )
    .await
    .unwrap_err();

    assert_eq!(
        custom_error_code(&err),
        Some(stake_error_code(StakeError::InsufficientFunds))
    );
}

#[tokio::test]
async fn unstake_beyond_shares_fails() {
    let (mut env, setup) = setup_complete_environment(1_000, 6).await.unwrap();

    stake(
        &mut env.context,
        &env.program_id,
        &setup.pool,
        &setup.user,
        600,
    )
    .await
    .unwrap();

    let err = unstake(
        &mut env.context,
        &env.program_id,
        &setup.pool,
        &setup.user,
        601,
    )
    .await
    .unwrap_err();

    assert_eq!(
        custom_error_code(&err),
        Some(stake_error_code(StakeError::InsufficientFunds))
    );
}

#[tokio::test]
async fn non_canonical_bump_fails() {
    let (mut env, setup) = setup_complete_environment(1_000, 6).await.unwrap();

    let ix = build_stake_instruction(
        &env.program_id,
        &setup.pool,
        &setup.user,
        setup.pool.share_mint_bump,
        setup.pool.vault_bump.wrapping_sub(1),
        500,
    );
    let err = process_as_user(&mut env.context, &setup.user, ix)
        .await
        .unwrap_err();

    assert_eq!(
        custom_error_code(&err),
        Some(stake_error_code(StakeError::InvalidDerivation))
    );
}

#[tokio::test]
async fn foreign_token_account_fails() {
    let (mut env, setup) = setup_complete_environment(1_000, 6).await.unwrap();

    let intruder = setup_user(&mut env.context, &setup.base.mint, &setup.pool.share_mint)
        .await
        .unwrap();

    // Intruder signs, but points the stake at the victim's token accounts.
    let accounts = stake_pool::accounts::Stake {
        pool: setup.pool.pool,
        base_mint: setup.pool.base_mint,
        vault: setup.pool.vault,
        share_mint: setup.pool.share_mint,
        owner_base_account: setup.user.base_token_account,
        owner_share_account: setup.user.share_token_account,
        owner: intruder.owner.pubkey(),
        token_program: spl_token::id(),
    };
    let ix = Instruction {
        program_id: env.program_id,
        accounts: accounts.to_account_metas(None),
        data: stake_pool::instruction::Stake {
            share_mint_bump: setup.pool.share_mint_bump,
            vault_bump: setup.pool.vault_bump,
            amount: 100,
        }
        .data(),
    };

    let err = process_as_user(&mut env.context, &intruder, ix)
        .await
        .unwrap_err();

    assert_eq!(
        custom_error_code(&err),
        Some(stake_error_code(StakeError::Unauthorized))
    );
}

#[tokio::test]
async fn round_trip_returns_exact_amount() {
    let (mut env, setup) = setup_complete_environment(5_000, 6).await.unwrap();

    stake(
        &mut env.context,
        &env.program_id,
        &setup.pool,
        &setup.user,
        5_000,
    )
    .await
    .unwrap();
    unstake(
        &mut env.context,
        &env.program_id,
        &setup.pool,
        &setup.user,
        5_000,
    )
    .await
    .unwrap();

    let user_base = get_token_balance(&mut env.context, &setup.user.base_token_account)
        .await
        .unwrap();
    let user_shares = get_token_balance(&mut env.context, &setup.user.share_token_account)
        .await
        .unwrap();
    let vault_balance = get_token_balance(&mut env.context, &setup.pool.vault)
        .await
        .unwrap();
    let share_supply = get_mint_supply(&mut env.context, &setup.pool.share_mint)
        .await
        .unwrap();

    assert_eq!(user_base, 5_000);
    assert_eq!(user_shares, 0);
    assert_eq!(vault_balance, 0);
    assert_eq!(share_supply, 0);

    // A fully drained pool prices the next stake 1:1 again.
    stake(
        &mut env.context,
        &env.program_id,
        &setup.pool,
        &setup.user,
        1_234,
    )
    .await
    .unwrap();
    let user_shares = get_token_balance(&mut env.context, &setup.user.share_token_account)
        .await
        .unwrap();
    assert_eq!(user_shares, 1_234);
}

#[tokio::test]
async fn donations_raise_the_share_price() {
    let (mut env, setup) = setup_complete_environment(1_000, 6).await.unwrap();

    stake(
        &mut env.context,
        &env.program_id,
        &setup.pool,
        &setup.user,
        1_000,
    )
    .await
    .unwrap();

    // Yield lands directly in the vault: 1000 shares now back 1500 tokens.
    mint_base_tokens(
        &mut env.context,
        &setup.base.mint,
        &setup.base.mint_authority,
        &setup.pool.vault,
        500,
    )
    .await
    .unwrap();

    let late = setup_user(&mut env.context, &setup.base.mint, &setup.pool.share_mint)
        .await
        .unwrap();
    mint_base_tokens(
        &mut env.context,
        &setup.base.mint,
        &setup.base.mint_authority,
        &late.base_token_account,
        300,
    )
    .await
    .unwrap();

    // Too small to earn a single share at the new price.
    let err = stake(&mut env.context, &env.program_id, &setup.pool, &late, 1)
        .await
        .unwrap_err();
    assert_eq!(
        custom_error_code(&err),
        Some(stake_error_code(StakeError::InvalidAmount))
    );

    // 300 * 1000 / 1500 = 200 shares, floored.
    stake(&mut env.context, &env.program_id, &setup.pool, &late, 300)
        .await
        .unwrap();

    let late_shares = get_token_balance(&mut env.context, &late.share_token_account)
        .await
        .unwrap();
    let vault_balance = get_token_balance(&mut env.context, &setup.pool.vault)
        .await
        .unwrap();
    let share_supply = get_mint_supply(&mut env.context, &setup.pool.share_mint)
        .await
        .unwrap();
    assert_eq!(late_shares, 200);
    assert_eq!(vault_balance, 1_800);
    assert_eq!(share_supply, 1_200);

    // 200 * 1800 / 1200 = 300: the late staker gets back exactly what they
    // put in, none of the earlier yield.
    unstake(&mut env.context, &env.program_id, &setup.pool, &late, 200)
        .await
        .unwrap();

    let late_base = get_token_balance(&mut env.context, &late.base_token_account)
        .await
        .unwrap();
    let late_shares = get_token_balance(&mut env.context, &late.share_token_account)
        .await
        .unwrap();
    assert_eq!(late_base, 300);
    assert_eq!(late_shares, 0);
}
