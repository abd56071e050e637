//! Currency parsing and formatting.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Parse a spreadsheet currency cell such as `"$1,200.50"`.
///
/// `$` and `,` are stripped, then the longest leading number is read the
/// way a lenient float parser would (`"12 USD"` is 12). Anything without a
/// numeric prefix, or out of decimal range, is zero.
pub fn parse_currency(raw: &str) -> Decimal {
    let stripped: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    parse_leading_number(stripped.trim_start()).unwrap_or(Decimal::ZERO)
}

fn parse_leading_number(s: &str) -> Option<Decimal> {
    let bytes = s.as_bytes();
    let len = bytes.len();
    let mut end = 0;

    if end < len && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let negative = end > 0 && bytes[0] == b'-';
    let int_start = end;
    while end < len && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let int_digits = &s[int_start..end];

    let mut frac_digits = "";
    if end < len && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < len && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || !int_digits.is_empty() {
            frac_digits = &s[frac_start..frac_end];
            end = frac_end;
        }
    }

    if int_digits.is_empty() && frac_digits.is_empty() {
        return None;
    }

    let mut exponent: i32 = 0;
    if end < len && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < len && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < len && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            exponent = s[end + 1..exp_end].parse().ok()?;
        }
    }

    let int_part = if int_digits.is_empty() { "0" } else { int_digits };
    let mantissa = if frac_digits.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_digits)
    };
    let mut value = Decimal::from_str(&mantissa).ok()?;

    if exponent != 0 {
        if exponent.unsigned_abs() > 28 {
            return None;
        }
        let scale = Decimal::from_i128_with_scale(10i128.pow(exponent.unsigned_abs()), 0);
        value = if exponent > 0 {
            value.checked_mul(scale)?
        } else {
            value.checked_div(scale)?
        };
    }

    Some(if negative { -value } else { value })
}

/// Format an amount as US dollars with thousands separators: `$1,234.56`.
///
/// Cents are rounded half away from zero.
pub fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let cents = format!("{:.2}", rounded.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }

    if negative {
        format!("-${}.{}", with_commas, dec_part)
    } else {
        format!("${}.{}", with_commas, dec_part)
    }
}

/// Sum amounts, clamping at the edge of the decimal range.
pub fn sum_amounts<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |total, amount| total.saturating_add(amount))
}

/// Share of `whole` covered by `part`, as a whole percentage.
///
/// Rounds half away from zero. Returns 0 when `whole` is not positive.
pub fn percent_complete(part: Decimal, whole: Decimal) -> u32 {
    if whole <= Decimal::ZERO {
        return 0;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|pct| pct.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|pct| pct.to_u32())
        .unwrap_or(0)
}

/// Budget utilization of a milestone in percent, capped at 100.
///
/// Zero when nothing was planned.
pub fn utilization(actual: Decimal, planned: Decimal) -> Decimal {
    if planned.is_zero() {
        return Decimal::ZERO;
    }
    actual
        .checked_div(planned)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map_or(Decimal::ONE_HUNDRED, |pct| pct.min(Decimal::ONE_HUNDRED))
}
