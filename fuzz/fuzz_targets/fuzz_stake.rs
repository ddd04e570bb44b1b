use arbitrary::Arbitrary;
use fuzz_helpers::*;
use honggfuzz::fuzz;

/// Fuzzable input for the stake instruction
#[derive(Debug, Clone, Arbitrary)]
struct StakeFuzzInput {
    /// Amount to stake (fuzzed)
    amount: u64,
    /// Extra user balance on top of what the scenario needs
    initial_balance: u64,
    /// Token decimals (for setup)
    decimals: u8,
    /// Yield added directly to the vault before staking, so the share
    /// price can drift away from 1:1
    yield_amount: u64,
    /// Whether a prior stake should seed the pool first
    do_initial_stake: bool,
    /// Prior stake amount (if do_initial_stake is true)
    initial_stake_amount: u64,
}

/// Execute a single fuzz iteration for the stake instruction
async fn fuzz_stake_once(input: StakeFuzzInput) -> FuzzResult<()> {
    let amount = input.amount.max(1);

    let mut total_needed = amount;
    if input.do_initial_stake {
        total_needed = total_needed.saturating_add(input.initial_stake_amount.max(1));
    }

    let initial_balance = input.initial_balance.saturating_add(total_needed);
    let decimals = input.decimals % 19;
    let yield_amount = input.yield_amount % 1_000_000_000;

    let (mut env, setup) = match setup_complete_environment(initial_balance, decimals).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Setup failed: {}", e);
            return Ok(());
        }
    };

    if input.do_initial_stake {
        let initial_stake = input.initial_stake_amount.max(1).min(initial_balance / 2);
        if initial_stake == 0
            || stake(
                &mut env.context,
                &env.program_id,
                &setup.pool,
                &setup.user,
                initial_stake,
            )
            .await
            .is_err()
        {
            return Ok(());
        }
    }

    if yield_amount > 0 {
        // Simulates external profit landing in the vault; may fail near the
        // supply cap, in which case the iteration continues without yield.
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

    if stake(
        &mut env.context,
        &env.program_id,
        &setup.pool,
        &setup.user,
        amount,
    )
    .await
    .is_err()
    {
        // Rejected input (zero-share mint, balance overflow, ...): the
        // interesting property is that nothing moved.
        let vault_balance = get_token_balance(&mut env.context, &setup.pool.vault).await?;
        let share_supply = get_mint_supply(&mut env.context, &setup.pool.share_mint).await?;
        assert_eq!(vault_balance, vault_balance_before, "failed stake moved tokens");
        assert_eq!(share_supply, share_supply_before, "failed stake minted shares");
        return Ok(());
    }

    let vault_balance_after = get_token_balance(&mut env.context, &setup.pool.vault).await?;
    let share_supply_after = get_mint_supply(&mut env.context, &setup.pool.share_mint).await?;
    let user_balance_after =
        get_token_balance(&mut env.context, &setup.user.base_token_account).await?;
    let user_shares_after =
        get_token_balance(&mut env.context, &setup.user.share_token_account).await?;

    let shares_minted = user_shares_after - user_shares_before;

    // CONSERVATION: no base tokens created or destroyed
    assert_eq!(
        vault_balance_before + user_balance_before,
        vault_balance_after + user_balance_after,
        "token conservation violated"
    );

    // Exact movement of the staked amount
    assert_eq!(vault_balance_after, vault_balance_before + amount);
    assert_eq!(user_balance_after, user_balance_before - amount);

    // Supply accounting matches the minted shares
    assert_eq!(share_supply_after, share_supply_before + shares_minted);

    // Staking never mints nothing
    assert!(shares_minted > 0, "stake succeeded but minted 0 shares");

    if share_supply_before == 0 {
        // First stake establishes the 1:1 baseline
        assert_eq!(shares_minted, amount, "first stake must mint 1:1");
    } else {
        // Value per share never decreases: existing holders are never diluted
        let precision = 1_000_000_000u128;
        let value_per_share_before =
            (vault_balance_before as u128 * precision) / share_supply_before as u128;
        let value_per_share_after =
            (vault_balance_after as u128 * precision) / share_supply_after as u128;
        assert!(
            value_per_share_after >= value_per_share_before,
            "share dilution: value per share fell from {} to {}",
            value_per_share_before,
            value_per_share_after
        );

        // Minted shares match the floored formula
        let expected_shares = (amount as u128)
            .saturating_mul(share_supply_before as u128)
            .saturating_div(vault_balance_before as u128);
        assert_eq!(
            shares_minted as u128, expected_shares,
            "minted shares diverge from amount * supply / balance"
        );
    }

    Ok(())
}

fn main() {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");

    loop {
        fuzz!(|input: StakeFuzzInput| {
            rt.block_on(async {
                if let Err(e) = fuzz_stake_once(input).await {
                    panic!("fuzz iteration failed: {}", e);
                }
            });
        });
    }
}
