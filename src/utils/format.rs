use crate::models::metrics::Summary;

pub const NOT_AVAILABLE: &str = "N/A";

/// Group the integer part of an already formatted number with commas.
fn group_thousands(formatted: &str) -> String {
    let (sign, digits) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Dollar amount with the sign ahead of the symbol: `-$1,500.00`.
fn currency(formatted: &str) -> String {
    match formatted.strip_prefix('-') {
        Some(rest) => format!("-${}", group_thousands(rest)),
        None => format!("${}", group_thousands(formatted)),
    }
}

/// `$1,234.57`
pub fn format_price(value: Option<f64>) -> String {
    match value {
        Some(v) => currency(&format!("{:.2}", v)),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// `$1,234,567`
pub fn format_market_cap(value: Option<f64>) -> String {
    match value {
        Some(v) => currency(&format!("{:.0}", v)),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Plain two-decimal number, used for P/E and indicator readings.
pub fn format_ratio(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Summary cards as (label, rendered value).
pub fn summary_cards(summary: &Summary) -> [(&'static str, String); 3] {
    [
        ("Average Price", format_price(summary.avg_price)),
        ("Average Market Cap", format_market_cap(summary.avg_market_cap)),
        ("Average PE Ratio", format_ratio(summary.avg_pe)),
    ]
}

/// Compact axis label: `1.2M`, `35K`, `412`.
pub fn format_axis(v: f64) -> String {
    let abs = v.abs();
    let sign = if v < 0.0 { "-" } else { "" };
    if abs >= 1_000_000.0 {
        format!("{}{:.1}M", sign, abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{}{:.0}K", sign, abs / 1_000.0)
    } else if abs >= 10.0 {
        format!("{}{:.0}", sign, abs)
    } else {
        format!("{}{:.2}", sign, abs)
    }
}
