use anchor_lang::prelude::*;

use crate::error::StakeError;

/// amount * numerator / denominator, widened to u128 and truncated toward
/// zero. Truncation always biases in the pool's favor.
fn mul_div(amount: u64, numerator: u64, denominator: u64) -> Result<u64> {
    let result = (amount as u128)
        .checked_mul(numerator as u128)
        .ok_or(StakeError::ArithmeticOverflow)?
        .checked_div(denominator as u128)
        .ok_or(StakeError::ArithmeticOverflow)?;

    Ok(u64::try_from(result).map_err(|_| StakeError::ArithmeticOverflow)?)
}

/// Shares minted for depositing `amount` base tokens.
///
/// An empty pool prices the first deposit 1:1; afterwards
/// shares = amount * share_supply / vault_balance, floored.
pub fn base_to_shares(amount: u64, vault_balance: u64, share_supply: u64) -> Result<u64> {
    require!(amount > 0, StakeError::InvalidAmount);

    if share_supply == 0 {
        Ok(amount)
    } else {
        mul_div(amount, share_supply, vault_balance)
    }
}

/// Base tokens returned for burning `shares` share tokens.
///
/// base = shares * vault_balance / share_supply, floored.
pub fn shares_to_base(shares: u64, vault_balance: u64, share_supply: u64) -> Result<u64> {
    require!(shares > 0, StakeError::InvalidAmount);

    mul_div(shares, vault_balance, share_supply)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(err: Error) -> u32 {
        match err {
            Error::AnchorError(e) => e.error_code_number,
            _ => panic!("expected an anchor error"),
        }
    }

    #[test]
    fn first_deposit_mints_one_to_one() {
        assert_eq!(base_to_shares(3_000, 0, 0).unwrap(), 3_000);
        assert_eq!(base_to_shares(1, 0, 0).unwrap(), 1);
        // A drained pool behaves like a fresh one.
        assert_eq!(base_to_shares(500, 0, 0).unwrap(), 500);
    }

    #[test]
    fn reference_trace() {
        // Alice stakes 3000 into an empty pool.
        assert_eq!(base_to_shares(3_000, 0, 0).unwrap(), 3_000);
        // Bob stakes 7000 at vault=3000, supply=3000.
        assert_eq!(base_to_shares(7_000, 3_000, 3_000).unwrap(), 7_000);
        // Alice unstakes 2000 shares at vault=10000, supply=10000.
        assert_eq!(shares_to_base(2_000, 10_000, 10_000).unwrap(), 2_000);
        // Bob unstakes 7000 shares at vault=8000, supply=8000.
        assert_eq!(shares_to_base(7_000, 8_000, 8_000).unwrap(), 7_000);
    }

    #[test]
    fn rounding_truncates_toward_zero() {
        // vault grew to 1500 against 1000 shares: 100 base buys 66 shares,
        // not 66.67.
        assert_eq!(base_to_shares(100, 1_500, 1_000).unwrap(), 66);
        // Burning those 66 shares at vault=1600, supply=1066 returns 99.
        assert_eq!(shares_to_base(66, 1_600, 1_066).unwrap(), 99);
    }

    #[test]
    fn deposit_too_small_to_earn_a_share() {
        assert_eq!(base_to_shares(1, 1_500, 1_000).unwrap(), 0);
    }

    #[test]
    fn zero_amount_rejected() {
        assert_eq!(
            code(base_to_shares(0, 1_000, 1_000).unwrap_err()),
            6000 + StakeError::InvalidAmount as u32
        );
        assert_eq!(
            code(shares_to_base(0, 1_000, 1_000).unwrap_err()),
            6000 + StakeError::InvalidAmount as u32
        );
    }

    #[test]
    fn division_by_zero_is_overflow() {
        // Supply without backing balance cannot price a deposit.
        assert_eq!(
            code(base_to_shares(100, 0, 1_000).unwrap_err()),
            6000 + StakeError::ArithmeticOverflow as u32
        );
        assert_eq!(
            code(shares_to_base(100, 1_000, 0).unwrap_err()),
            6000 + StakeError::ArithmeticOverflow as u32
        );
    }

    #[test]
    fn result_exceeding_u64_is_overflow() {
        // One share backed by the full u64 range: a max-amount deposit
        // would mint more shares than u64 can hold.
        assert_eq!(
            code(base_to_shares(u64::MAX, 1, u64::MAX).unwrap_err()),
            6000 + StakeError::ArithmeticOverflow as u32
        );
    }

    #[test]
    fn round_trip_never_profits() {
        for (vault, supply) in [(1_000, 1_000), (1_500, 1_000), (999_999, 7)] {
            for amount in [1, 3, 97, 10_000] {
                let shares = base_to_shares(amount, vault, supply).unwrap();
                if shares == 0 {
                    continue;
                }
                let returned =
                    shares_to_base(shares, vault + amount, supply + shares).unwrap();
                assert!(
                    returned <= amount,
                    "extracted {returned} from a {amount} deposit at vault={vault} supply={supply}"
                );
            }
        }
    }
}
