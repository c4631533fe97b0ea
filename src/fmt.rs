fn with_commas(int_part: &str) -> String {
    let mut out = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.chars().rev().collect()
}

/// Format a float as a dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    if !val.is_finite() {
        return "n/a".to_string();
    }
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((&cents, "00"));
    let sign = if val < 0.0 { "-" } else { "" };
    format!("{sign}${}.{dec_part}", with_commas(int_part))
}

/// Whole-dollar amount for headline totals: $12,346
pub fn money_whole(val: f64) -> String {
    if !val.is_finite() {
        return "n/a".to_string();
    }
    let rounded = format!("{:.0}", val.abs());
    let sign = if val < 0.0 && rounded != "0" { "-" } else { "" };
    format!("{sign}${}", with_commas(&rounded))
}

/// Format a fraction as a percentage: 0.1234 with 2 decimals -> "12.34%"
pub fn percent(fraction: f64, decimals: usize) -> String {
    if !fraction.is_finite() {
        return "n/a".to_string();
    }
    format!("{:.*}%", decimals, fraction * 100.0)
}

/// Plain float with fixed decimals, `n/a` for NaN or infinities.
pub fn decimal(val: f64, decimals: usize) -> String {
    if !val.is_finite() {
        return "n/a".to_string();
    }
    format!("{:.*}", decimals, val)
}

/// Integer with thousands separators.
pub fn number(n: usize) -> String {
    with_commas(&n.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56), "$1,234.56");
        assert_eq!(money(-500.00), "-$500.00");
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(1000000.99), "$1,000,000.99");
        assert_eq!(money(f64::NAN), "n/a");
    }

    #[test]
    fn test_money_whole() {
        assert_eq!(money_whole(12345.6), "$12,346");
        assert_eq!(money_whole(0.0), "$0");
        assert_eq!(money_whole(-999.4), "-$999");
        assert_eq!(money_whole(-0.2), "$0");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.05, 2), "5.00%");
        assert_eq!(percent(0.9, 1), "90.0%");
        assert_eq!(percent(f64::NAN, 1), "n/a");
    }

    #[test]
    fn test_number() {
        assert_eq!(number(0), "0");
        assert_eq!(number(1234567), "1,234,567");
    }
}
