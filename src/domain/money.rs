//! Monetary helpers.
//!
//! Balances, stakes and payouts are `Decimal` values with two decimal
//! places. Anything derived from user input is floored, never rounded up,
//! so a balance can never gain a fraction of a cent through rounding.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::error::{LedgerError, LedgerResult};

/// Number of decimal places kept for every monetary value.
pub const CENT_SCALE: u32 = 2;

/// Largest amount accepted for a single stake, movement or opening balance.
///
/// Keeps every product and sum the ledger computes far inside `Decimal`'s
/// range.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

/// Floors a value to whole cents (toward negative infinity).
pub fn floor_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CENT_SCALE, RoundingStrategy::ToNegativeInfinity)
}

/// Floors a value to whole cents and clamps it at zero.
pub fn floor_cents_non_negative(value: Decimal) -> Decimal {
    floor_cents(value).max(Decimal::ZERO)
}

/// Floors an amount to cents and checks it lies in `(0, MAX_AMOUNT]`.
pub fn positive_amount(amount: Decimal) -> LedgerResult<Decimal> {
    let amount = floor_cents(amount);
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation("amount must be positive"));
    }
    ensure_within_max(amount)?;
    Ok(amount)
}

/// Rejects amounts above `MAX_AMOUNT`.
pub fn ensure_within_max(amount: Decimal) -> LedgerResult<()> {
    if amount > MAX_AMOUNT {
        return Err(LedgerError::validation(format!(
            "amount {amount} exceeds the maximum of {MAX_AMOUNT}"
        )));
    }
    Ok(())
}
