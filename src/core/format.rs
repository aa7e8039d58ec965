//! Compact currency rendering for summary figures and chart labels.

const BILLION: f64 = 1e9;
const MILLION: f64 = 1e6;
const THOUSAND: f64 = 1e3;

/// Renders `amount` as `$1.23B`, `$4.56M`, `$7.8k`, or `$950`. Ties round
/// toward positive infinity.
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("${amount}");
    }

    if amount >= BILLION {
        format!("${}B", fixed(amount / BILLION, 2))
    } else if amount >= MILLION {
        format!("${}M", fixed(amount / MILLION, 2))
    } else if amount >= THOUSAND {
        format!("${}k", fixed(amount / THOUSAND, 1))
    } else {
        format!("${}", group_thousands(round_half_up(amount) as i64))
    }
}

/// `1234567` becomes `1,234,567`.
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

fn fixed(value: f64, decimals: usize) -> String {
    let scale = 10f64.powi(decimals as i32);
    let rounded = round_half_up(value * scale) / scale;
    format!("{rounded:.decimals$}")
}

fn round_half_up(value: f64) -> f64 {
    let rounded = value.round();
    // f64::round takes negative ties away from zero.
    if value - rounded == 0.5 {
        rounded + 1.0
    } else {
        rounded
    }
}
