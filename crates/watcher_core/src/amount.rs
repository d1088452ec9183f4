//! Monetary amount parsing shared by record decoding and the amount filter.
//!
//! Locale assumptions, in order:
//! - currency symbols, letters and whitespace are ignored (`R$ 5.000,00`);
//! - a minus sign makes the amount invalid, amounts are never negative;
//! - when both `.` and `,` appear, the one appearing last is the decimal separator;
//! - a lone `,` is a decimal comma (`1234,5`);
//! - repeated identical separators are thousands separators (`1.234.567`);
//! - a lone `.` followed by exactly three digits after a 1-3 digit non-zero
//!   integer part is a thousands separator (`5.000`), otherwise it is decimal.
//!
//! Anything that does not reduce to a finite, non-negative number is `None`,
//! which callers treat as "field absent" and never as zero.

/// Parses a user- or service-provided amount.
pub fn parse_amount(raw: &str) -> Option<f64> {
    if raw.contains('-') {
        return None;
    }
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let dots = cleaned.matches('.').count();
    let commas = cleaned.matches(',').count();
    let normalized = match (dots, commas) {
        (0, 0) => cleaned,
        (d, c) if d > 0 && c > 0 => {
            let last_dot = cleaned.rfind('.').unwrap_or(0);
            let last_comma = cleaned.rfind(',').unwrap_or(0);
            let (decimal, thousands, decimal_count) = if last_comma > last_dot {
                (',', '.', c)
            } else {
                ('.', ',', d)
            };
            if decimal_count > 1 {
                return None;
            }
            cleaned
                .chars()
                .filter(|ch| *ch != thousands)
                .map(|ch| if ch == decimal { '.' } else { ch })
                .collect()
        }
        (0, 1) => cleaned.replace(',', "."),
        (0, _) => cleaned.replace(',', ""),
        (1, 0) => {
            if is_thousands_group(&cleaned) {
                cleaned.replace('.', "")
            } else {
                cleaned
            }
        }
        _ => cleaned.replace('.', ""),
    };

    let value: f64 = normalized.parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Accepts an already numeric amount, applying the same validity rules as [`parse_amount`].
pub fn normalize_amount(value: f64) -> Option<f64> {
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

fn is_thousands_group(cleaned: &str) -> bool {
    let Some((int_part, frac_part)) = cleaned.split_once('.') else {
        return false;
    };
    frac_part.len() == 3
        && (1..=3).contains(&int_part.len())
        && !int_part.starts_with('0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_integers_and_decimals() {
        assert_eq!(parse_amount("5000"), Some(5000.0));
        assert_eq!(parse_amount("12.5"), Some(12.5));
        assert_eq!(parse_amount("1234,5"), Some(1234.5));
    }

    #[test]
    fn brazilian_notation_with_currency_symbol() {
        assert_eq!(parse_amount("R$ 5.000,00"), Some(5000.0));
        assert_eq!(parse_amount("R$ 1.234.567,89"), Some(1_234_567.89));
        assert_eq!(parse_amount("5.000"), Some(5000.0));
    }

    #[test]
    fn english_notation_with_thousands_commas() {
        assert_eq!(parse_amount("USD 1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("1,234,567"), Some(1_234_567.0));
    }

    #[test]
    fn ambiguous_dot_falls_back_to_decimal() {
        assert_eq!(parse_amount("0.125"), Some(0.125));
        assert_eq!(parse_amount("1234.567"), Some(1234.567));
    }

    #[test]
    fn unparsable_input_is_absent_not_zero() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("a combinar"), None);
        assert_eq!(parse_amount("-50"), None);
        assert_eq!(parse_amount("1.234,5,6"), None);
        assert_eq!(normalize_amount(f64::NAN), None);
        assert_eq!(normalize_amount(-1.0), None);
    }
}
