//! Payout arithmetic for stakes and operation previews.
//!
//! A normal stake returns `odd × amount` (stake included). A freebet stake
//! only returns the winnings, `odd × amount − amount`, because the freebet
//! itself is never paid back. Both are floored to cents and at zero.
//!
//! These functions are pure: the same inputs always give the same output.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::error::{LedgerError, LedgerResult};
use super::money::{MAX_AMOUNT, floor_cents_non_negative};
use super::operation::LegRequest;

/// Largest odd accepted for a leg.
pub const MAX_ODD: Decimal = dec!(10000);

/// Rejects odds above `MAX_ODD`.
pub fn ensure_odd_within_max(odd: Decimal) -> LedgerResult<()> {
    if odd > MAX_ODD {
        return Err(LedgerError::validation(format!(
            "odd {odd} exceeds the maximum of {MAX_ODD}"
        )));
    }
    Ok(())
}

/// Potential return of a single stake if its leg wins.
///
/// Saturates instead of overflowing; inputs within `MAX_ODD` and
/// `MAX_AMOUNT` never get near the limit.
pub fn potential_return(odd: Decimal, amount: Decimal, is_freebet: bool) -> Decimal {
    let gross = odd.saturating_mul(amount);
    let value = if is_freebet {
        gross.saturating_sub(amount)
    } else {
        gross
    };
    floor_cents_non_negative(value)
}

/// Preview of one leg of a proposed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegQuote {
    pub leg_index: usize,
    pub odd: Decimal,
    pub cash_stake: Decimal,
    pub freebet_stake: Decimal,
    /// Cash credited if this leg wins.
    pub potential_return: Decimal,
    /// Net cash result of the whole operation if this leg wins.
    pub profit: Decimal,
}

/// Preview of a proposed operation, computed before anything is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationQuote {
    pub legs: Vec<LegQuote>,
    pub total_cash_stake: Decimal,
    pub total_freebet_stake: Decimal,
    /// Worst leg profit: the amount locked in whichever leg wins.
    pub guaranteed_profit: Decimal,
}

/// Computes potential returns for a proposed set of legs.
///
/// Incomplete inputs (non-positive amount, odd not above 1) contribute a
/// zero return rather than an error, so a half-filled form can be previewed.
/// Odds or amounts above the accepted maximums are rejected.
pub fn quote_operation(legs: &[LegRequest]) -> LedgerResult<OperationQuote> {
    let mut quotes = Vec::with_capacity(legs.len());
    let mut total_cash_stake = Decimal::ZERO;
    let mut total_freebet_stake = Decimal::ZERO;

    for (leg_index, leg) in legs.iter().enumerate() {
        let mut cash_stake = Decimal::ZERO;
        let mut freebet_stake = Decimal::ZERO;
        let mut leg_return = Decimal::ZERO;

        ensure_odd_within_max(leg.odd)?;
        for stake in &leg.stakes {
            let amount = stake.amount.max(Decimal::ZERO);
            if amount > MAX_AMOUNT {
                return Err(LedgerError::validation(format!(
                    "leg {leg_index}: stake amount {amount} exceeds the maximum of {MAX_AMOUNT}"
                )));
            }
            if stake.is_freebet {
                freebet_stake += amount;
            } else {
                cash_stake += amount;
            }
            if amount > Decimal::ZERO && leg.odd > Decimal::ONE {
                leg_return += potential_return(leg.odd, amount, stake.is_freebet);
            }
        }

        total_cash_stake += cash_stake;
        total_freebet_stake += freebet_stake;
        quotes.push(LegQuote {
            leg_index,
            odd: leg.odd,
            cash_stake,
            freebet_stake,
            potential_return: leg_return,
            profit: Decimal::ZERO,
        });
    }

    for quote in &mut quotes {
        quote.profit = quote.potential_return - total_cash_stake;
    }

    let guaranteed_profit = quotes
        .iter()
        .map(|q| q.profit)
        .min()
        .unwrap_or(Decimal::ZERO);

    Ok(OperationQuote {
        legs: quotes,
        total_cash_stake,
        total_freebet_stake,
        guaranteed_profit,
    })
}
