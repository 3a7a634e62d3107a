use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::decimal::{Money, Rate};

/// fixed monthly installment for an amortizing loan, rounded to currency precision
///
/// Returns zero when no payment is well defined (principal <= 0, negative rate,
/// zero term).
pub fn installment(principal: Money, annual_rate: Rate, term_months: u32) -> Money {
    if !principal.is_positive() || annual_rate.is_negative() || term_months == 0 {
        return Money::ZERO;
    }

    let monthly_rate = annual_rate.monthly_rate().as_decimal();

    if monthly_rate.is_zero() {
        return (principal / Decimal::from(term_months)).round_currency();
    }

    // EMI = P * r * (1 + r)^n / ((1 + r)^n - 1)
    let r = monthly_rate;
    let Some(compound) = compound_factor(r, term_months) else {
        // (1 + r)^n beyond decimal range: the annuity collapses to interest-only plus a cent
        let interest_only = (principal.as_decimal() * r)
            .round_dp_with_strategy(2, rust_decimal::RoundingStrategy::AwayFromZero);
        return Money::from_decimal(interest_only) + Money::CENT;
    };
    let numerator = principal.as_decimal() * r * compound;
    let denominator = compound - Decimal::ONE;

    if denominator.is_zero() {
        return Money::ZERO;
    }

    Money::from_decimal(numerator / denominator).round_currency()
}

/// whole installments covered by an already-paid amount
pub fn initially_settled_months(amount_already_paid: Money, installment: Money) -> u32 {
    if !installment.is_positive() || !amount_already_paid.is_positive() {
        return 0;
    }
    let months = (amount_already_paid.as_decimal() / installment.as_decimal()).floor();
    months.to_u32().unwrap_or(u32::MAX)
}

/// (1 + r)^n, `None` on decimal overflow
fn compound_factor(r: Decimal, n: u32) -> Option<Decimal> {
    let base = Decimal::ONE + r;
    let mut compound = Decimal::ONE;
    for _ in 0..n {
        compound = compound.checked_mul(base)?;
    }
    Some(compound)
}
