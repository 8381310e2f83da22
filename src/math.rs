//! Fixed-point arithmetic shared by the vault, the oracle and the yield wallets.
//!
//! ## Units
//! - LP amounts, debt-token amounts and USD prices: `BASE` (1e18) fixed point
//! - Rates (LTV, CR, fees, shares, deviation bounds): `SECOND_BASE` (1e8) fixed point
//!
//! Every division truncates. Repeated partial repayments rely on that.

use odra::casper_types::U256;

/// 1e18
pub const BASE: u128 = 1_000_000_000_000_000_000;
/// 1e8, denominator of every rate parameter
pub const SECOND_BASE: u64 = 100_000_000;
/// Decimals of the 1e18 scale
pub const BASE_DECIMALS: u8 = 18;

pub fn base() -> U256 {
    U256::from(BASE)
}

pub fn second_base() -> U256 {
    U256::from(SECOND_BASE)
}

/// `a * b / c`, floored.
pub fn mul_div(a: U256, b: U256, c: U256) -> U256 {
    a * b / c
}

/// `amount * rate / SECOND_BASE`, floored.
pub fn apply_rate(amount: U256, rate: u64) -> U256 {
    mul_div(amount, U256::from(rate), second_base())
}

/// Scale a value with `decimals` decimals to 18 decimals.
/// Callers reject `decimals > 18` up front.
pub fn normalize_decimals(value: U256, decimals: u8) -> U256 {
    if decimals >= BASE_DECIMALS {
        return value;
    }
    value * U256::from(10u64).pow(U256::from(BASE_DECIMALS - decimals))
}

/// Result of splitting a freshly minted debt amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintSplit {
    /// Full debt booked against the position.
    pub mint_amount: U256,
    /// Minted to the vault itself, later sent out by `distribute_fee`.
    pub protocol_fee: U256,
    /// Minted to the staking address.
    pub stake_fee: U256,
    /// Minted to the `mint_to` recipient.
    pub user_amount: U256,
}

/// Debt minted for `lp_amount` of collateral at `lp_price`.
///
/// `protocol_fee + stake_fee + user_amount == mint_amount` always holds:
/// the user leg absorbs the rounding remainder of both fee legs.
pub fn split_mint(
    lp_amount: U256,
    lp_price: U256,
    ltv: u64,
    protocol_fee_rate: u64,
    stake_fee_rate: u64,
) -> MintSplit {
    let value_usd = mul_div(lp_amount, lp_price, base());
    let mint_amount = apply_rate(value_usd, ltv);
    let protocol_fee = apply_rate(mint_amount, protocol_fee_rate);
    let stake_fee = apply_rate(mint_amount, stake_fee_rate);
    let user_amount = mint_amount - protocol_fee - stake_fee;
    MintSplit {
        mint_amount,
        protocol_fee,
        stake_fee,
        user_amount,
    }
}

/// Collateral released when `debt_amount` of `debt` is repaid.
///
/// Positions below the CR floor get back only what exceeds the floor for the
/// remaining loan, which puts them exactly at `cr`. Healthy positions get back
/// a share of collateral proportional to the repaid share of debt, which keeps
/// their ratio unchanged. Full repayment always returns everything.
pub fn collateral_to_release(
    collateral: U256,
    debt: U256,
    debt_amount: U256,
    lp_price: U256,
    cr: u64,
) -> U256 {
    if debt.is_zero() || debt_amount >= debt {
        return collateral;
    }
    if lp_price.is_zero() {
        return U256::zero();
    }

    let value_start = lp_price * collateral;
    let loan_after = debt - debt_amount;
    let required_before = required_value(debt, cr);
    let required_after = required_value(loan_after, cr);

    if value_start < required_before {
        if value_start <= required_after {
            return U256::zero();
        }
        let released = (value_start - required_after) / lp_price;
        released.min(collateral)
    } else {
        mul_div(collateral, debt_amount, debt)
    }
}

/// `cr * loan`, expressed in the `price * collateral` scale (1e36).
fn required_value(loan: U256, cr: u64) -> U256 {
    mul_div(U256::from(cr) * loan, base(), second_base())
}

/// Collateral ratio over `SECOND_BASE`: `collateral * price / debt`.
/// Debt-free positions report `u64::MAX`.
pub fn collateral_ratio(collateral: U256, debt: U256, lp_price: U256) -> u64 {
    if debt.is_zero() {
        return u64::MAX;
    }
    let value = mul_div(collateral, lp_price, base());
    let ratio = mul_div(value, second_base(), debt);
    if ratio > U256::from(u64::MAX) {
        u64::MAX
    } else {
        ratio.as_u64()
    }
}

/// `|a - b| * SECOND_BASE / b`, the relative deviation of `a` from `b`.
pub fn relative_diff(a: U256, b: U256) -> U256 {
    let diff = if a > b { a - b } else { b - a };
    mul_div(diff, second_base(), b)
}
