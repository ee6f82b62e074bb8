//! Display helpers for prices, changes and large figures

/// Formats a USD amount with thousands separators, e.g. `$67,012.50`.
///
/// Positive amounts below one cent keep six decimals so they do not
/// collapse to `$0.00`.
pub fn format_currency(value: f64, decimals: usize) -> String {
    if value > 0.0 && value < 0.01 {
        return format!("${:.6}", value);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}${}.{}", sign, grouped, frac),
        None => format!("{}${}", sign, grouped),
    }
}

/// Formats a percentage with an explicit sign, e.g. `+1.25%` or `-0.40%`
pub fn format_percentage(value: f64, decimals: usize) -> String {
    let sign = if value >= 0.0 { '+' } else { '-' };
    format!("{}{:.*}%", sign, decimals, value.abs())
}

/// Shortens large figures with a K/M/B/T suffix, e.g. `1.3T`
pub fn format_compact(value: f64) -> String {
    const SUFFIXES: [&str; 5] = ["", "K", "M", "B", "T"];

    if value.abs() < 1000.0 {
        return format!("{}", value);
    }

    let index = ((value.abs().log10() / 3.0).floor() as usize).min(SUFFIXES.len() - 1);
    let scaled = value / 1000f64.powi(index as i32);
    format!("{:.1}{}", scaled, SUFFIXES[index])
}
