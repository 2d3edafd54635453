use chrono::NaiveDate;

use crate::models::parse_iso_date;

fn group_thousands(int_part: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// Format a float as a dollar amount with thousands separators: $1,234.56
/// Non-finite input renders as $0.00.
pub fn money(val: f64) -> String {
    let val = if val.is_finite() { val } else { 0.0 };
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((&cents, "00"));
    let with_commas = group_thousands(int_part);

    if negative && cents != "0.00" {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

/// `money` for values that may be absent.
pub fn money_opt(val: Option<f64>) -> String {
    money(val.unwrap_or(0.0))
}

/// Integer with thousands separators.
pub fn number(n: usize) -> String {
    group_thousands(&n.to_string())
}

/// Short human date ("Jan 5, 2024") from an ISO date or timestamp string.
/// Unparseable input yields an empty string.
pub fn format_date(raw: &str) -> String {
    parse_iso_date(raw).map(short_date).unwrap_or_default()
}

pub fn short_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Signed percentage with one decimal: "+12.5%", "-3.0%", "+0.0%".
pub fn format_percentage(val: f64) -> String {
    let val = if val.is_finite() { val } else { 0.0 };
    let s = format!("{val:.1}");
    if s.starts_with('-') && s != "-0.0" {
        format!("{s}%")
    } else {
        format!("+{}%", s.trim_start_matches('-'))
    }
}

/// Format a dollar amount as compact "$Xk" or "$X.Xk" for thousands, "$XM" for millions.
pub fn format_k(val: f64) -> String {
    if val >= 1_000_000.0 {
        let m = val / 1_000_000.0;
        if m == m.floor() {
            format!("${}M", m as u64)
        } else {
            format!("${:.1}M", m)
        }
    } else if val >= 1000.0 {
        let k = val / 1000.0;
        if k == k.floor() {
            format!("${}k", k as u64)
        } else {
            format!("${:.1}k", k)
        }
    } else {
        format!("${}", val.max(0.0) as u64)
    }
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
        assert_eq!(money(42.10), "$42.10");
        assert_eq!(money(-0.001), "$0.00");
    }

    #[test]
    fn test_money_treats_missing_as_zero() {
        assert_eq!(money(f64::NAN), "$0.00");
        assert_eq!(money(f64::INFINITY), "$0.00");
        assert_eq!(money_opt(None), "$0.00");
        assert_eq!(money_opt(Some(7.5)), "$7.50");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-01-05"), "Jan 5, 2024");
        assert_eq!(format_date("2024-11-30T09:15:00Z"), "Nov 30, 2024");
        assert_eq!(format_date("yesterday"), "");
        assert_eq!(format_date(""), "");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(12.34), "+12.3%");
        assert_eq!(format_percentage(-3.0), "-3.0%");
        assert_eq!(format_percentage(0.0), "+0.0%");
        assert_eq!(format_percentage(-0.04), "+0.0%");
        assert_eq!(format_percentage(f64::NAN), "+0.0%");
    }

    #[test]
    fn test_number_and_compact() {
        assert_eq!(number(1234567), "1,234,567");
        assert_eq!(number(12), "12");
        assert_eq!(format_k(2500.0), "$2.5k");
        assert_eq!(format_k(3000.0), "$3k");
        assert_eq!(format_k(1_500_000.0), "$1.5M");
        assert_eq!(format_k(640.0), "$640");
    }
}
