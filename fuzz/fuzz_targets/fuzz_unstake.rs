use arbitrary::Arbitrary;
use fuzz_helpers::*;
use honggfuzz::fuzz;

/// Fuzzable input for the unstake instruction
#[derive(Debug, Clone, Arbitrary)]
struct UnstakeFuzzInput {
    /// Shares to unstake (fuzzed, may exceed holdings)
    unstake_amount: u64,
    /// Stake that seeds the pool before unstaking
    stake_amount: u64,
    /// Token decimals (for setup)
    decimals: u8,
    /// Yield added directly to the vault between stake and unstake
    yield_amount: u64,
}

/// Execute a single fuzz iteration for the unstake instruction
async fn fuzz_unstake_once(input: UnstakeFuzzInput) -> FuzzResult<()> {
    let stake_amount = input.stake_amount.max(1);
    let decimals = input.decimals % 19;
    let yield_amount = input.yield_amount % 1_000_000_000;

    let (mut env, setup) = match setup_complete_environment(stake_amount, decimals).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Setup failed: {}", e);
            return Ok(());
        }
    };

    if stake(
        &mut env.context,
        &env.program_id,
        &setup.pool,
        &setup.user,
        stake_amount,
    )
    .await
    .is_err()
    {
        return Ok(());
    }

    if yield_amount > 0 {
        let _ = mint_base_tokens(
            &mut env.context,
            &setup.base.mint,
            &setup.base.mint_authority,
            &setup.pool.vault,
            yield_amount,
        )
        .await;
    }

    let vault_balance_before = get_token_balance(&mut env.context, &setup.pool.vault).await?;
    let share_supply_before = get_mint_supply(&mut env.context, &setup.pool.share_mint).await?;
    let user_balance_before =
        get_token_balance(&mut env.context, &setup.user.base_token_account).await?;
    let user_shares_before =
        get_token_balance(&mut env.context, &setup.user.share_token_account).await?;

    let result = unstake(
        &mut env.context,
        &env.program_id,
        &setup.pool,
        &setup.user,
        input.unstake_amount,
    )
    .await;

    let vault_balance_after = get_token_balance(&mut env.context, &setup.pool.vault).await?;
    let share_supply_after = get_mint_supply(&mut env.context, &setup.pool.share_mint).await?;
    let user_balance_after =
        get_token_balance(&mut env.context, &setup.user.base_token_account).await?;
    let user_shares_after =
        get_token_balance(&mut env.context, &setup.user.share_token_account).await?;

    if result.is_err() {
        // Over-withdrawals and zero amounts must leave state untouched.
        assert_eq!(vault_balance_after, vault_balance_before, "failed unstake moved tokens");
        assert_eq!(share_supply_after, share_supply_before, "failed unstake burned shares");
        assert_eq!(user_shares_after, user_shares_before);
        return Ok(());
    }

    let base_returned = user_balance_after - user_balance_before;

    // CONSERVATION: no base tokens created or destroyed
    assert_eq!(
        vault_balance_before + user_balance_before,
        vault_balance_after + user_balance_after,
        "token conservation violated"
    );

    // Exactly the requested shares were burned
    assert_eq!(user_shares_after, user_shares_before - input.unstake_amount);
    assert_eq!(share_supply_after, share_supply_before - input.unstake_amount);
    assert_eq!(vault_balance_after, vault_balance_before - base_returned);

    // Floor rounding never pays out more than the proportional claim:
    // returned * supply <= shares * balance
    assert!(
        (base_returned as u128) * (share_supply_before as u128)
            <= (input.unstake_amount as u128) * (vault_balance_before as u128),
        "unstake paid out more than the proportional claim"
    );

    // And matches the floored formula exactly
    let expected = (input.unstake_amount as u128)
        .saturating_mul(vault_balance_before as u128)
        .saturating_div(share_supply_before as u128);
    assert_eq!(base_returned as u128, expected);

    Ok(())
}

fn main() {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");

    loop {
        fuzz!(|input: UnstakeFuzzInput| {
            rt.block_on(async {
                if let Err(e) = fuzz_unstake_once(input).await {
                    panic!("fuzz iteration failed: {}", e);
                }
            });
        });
    }
}
