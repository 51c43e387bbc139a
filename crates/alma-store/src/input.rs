// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Parsing and display for the text fields the form dialogs edit: rupee
//! amounts kept as integer paise, `YYYY-MM-DD` dates, `HH:MM` times.

use time::macros::format_description;
use time::{Date, Time};

pub const DATE_LAYOUT: &str = "YYYY-MM-DD";
pub const TIME_LAYOUT: &str = "HH:MM";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    InvalidMoney,
    NegativeMoney,
    InvalidDate,
    InvalidTime,
    InvalidInt,
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMoney => f.write_str("invalid amount"),
            Self::NegativeMoney => f.write_str("negative amount"),
            Self::InvalidDate => f.write_str("invalid date value"),
            Self::InvalidTime => f.write_str("invalid time value"),
            Self::InvalidInt => f.write_str("invalid integer value"),
        }
    }
}

impl std::error::Error for InputError {}

pub type InputResult<T> = std::result::Result<T, InputError>;

pub fn parse_required_cents(input: &str) -> InputResult<i64> {
    parse_cents(input.trim())
}

pub fn parse_optional_cents(input: &str) -> InputResult<Option<i64>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_cents(trimmed).map(Some)
}

pub fn format_cents(cents: i64) -> String {
    let (sign, cents) = normalize_sign(cents);
    let rupees = cents / 100;
    let remainder = cents % 100;
    format!("{sign}\u{20b9}{}.{:02}", comma_format(rupees), remainder)
}

pub fn format_optional_cents(cents: Option<i64>) -> String {
    cents.map_or_else(String::new, format_cents)
}

/// Short form for stat panels: `₹1.2L`, `₹3.4Cr`.
pub fn format_compact_cents(cents: i64) -> String {
    let (sign, cents) = normalize_sign(cents);
    let rupees = (cents as f64) / 100.0;
    if rupees < 100_000.0 {
        return format!("{sign}{}", format_cents(cents));
    }

    let (value, suffix) = if rupees < 10_000_000.0 {
        (rupees / 100_000.0, "L")
    } else {
        (rupees / 10_000_000.0, "Cr")
    };

    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract().abs() < f64::EPSILON {
        format!("{sign}\u{20b9}{rounded:.0}{suffix}")
    } else {
        format!("{sign}\u{20b9}{rounded:.1}{suffix}")
    }
}

pub fn parse_required_date(input: &str) -> InputResult<Date> {
    parse_date(input.trim())
}

pub fn parse_optional_date(input: &str) -> InputResult<Option<Date>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_date(trimmed).map(Some)
}

pub fn parse_required_time(input: &str) -> InputResult<Time> {
    Time::parse(input.trim(), &format_description!("[hour]:[minute]"))
        .map_err(|_| InputError::InvalidTime)
}

pub fn parse_optional_time(input: &str) -> InputResult<Option<Time>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_required_time(trimmed).map(Some)
}

pub fn parse_required_int(input: &str) -> InputResult<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::InvalidInt);
    }
    let value = trimmed
        .parse::<i64>()
        .map_err(|_| InputError::InvalidInt)?;
    if value < 0 {
        return Err(InputError::InvalidInt);
    }
    Ok(value)
}

pub fn parse_optional_int(input: &str) -> InputResult<i64> {
    if input.trim().is_empty() {
        return Ok(0);
    }
    parse_required_int(input)
}

/// CGPA entered as `8.5` kept as tenths (85).
pub fn parse_cgpa_tenths(input: &str) -> InputResult<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| InputError::InvalidInt)?;
    if !(0.0..=10.0).contains(&value) {
        return Err(InputError::InvalidInt);
    }
    Ok((value * 10.0).round() as i64)
}

pub fn format_cgpa_tenths(tenths: i64) -> String {
    format!("{}.{}", tenths / 10, tenths % 10)
}

fn parse_cents(input: &str) -> InputResult<i64> {
    let clean = input.replace(',', "");
    if clean.starts_with('-') {
        return Err(InputError::NegativeMoney);
    }

    let clean = clean.strip_prefix('\u{20b9}').unwrap_or(&clean);
    if clean.is_empty() {
        return Err(InputError::InvalidMoney);
    }

    let parts = clean.split('.').collect::<Vec<_>>();
    if parts.len() > 2 {
        return Err(InputError::InvalidMoney);
    }

    let whole = parse_digits(parts[0], true)?;
    if whole > i64::MAX / 100 {
        return Err(InputError::InvalidMoney);
    }

    let mut frac = 0i64;
    if parts.len() == 2 {
        if parts[1].len() > 2 {
            return Err(InputError::InvalidMoney);
        }
        frac = parse_digits(parts[1], false)?;
        if parts[1].len() == 1 {
            frac = frac.checked_mul(10).ok_or(InputError::InvalidMoney)?;
        }
    }

    whole
        .checked_mul(100)
        .and_then(|value| value.checked_add(frac))
        .ok_or(InputError::InvalidMoney)
}

fn parse_digits(input: &str, allow_empty: bool) -> InputResult<i64> {
    if input.is_empty() {
        if allow_empty {
            return Ok(0);
        }
        return Err(InputError::InvalidMoney);
    }
    if !input.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(InputError::InvalidMoney);
    }
    input.parse::<i64>().map_err(|_| InputError::InvalidMoney)
}

fn parse_date(input: &str) -> InputResult<Date> {
    Date::parse(input, &format_description!("[year]-[month]-[day]"))
        .map_err(|_| InputError::InvalidDate)
}

fn comma_format(value: i64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let mut chars = digits.chars().collect::<Vec<_>>();
    let mut count = 0usize;
    while let Some(ch) = chars.pop() {
        if count == 3 {
            out.push(',');
            count = 0;
        }
        out.push(ch);
        count += 1;
    }
    out.chars().rev().collect()
}

fn normalize_sign(cents: i64) -> (&'static str, i64) {
    if cents >= 0 {
        return ("", cents);
    }
    if cents == i64::MIN {
        ("-", i64::MAX)
    } else {
        ("-", -cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_required_cents_accepts_common_shapes() {
        let cases = [
            ("100", 10_000),
            ("100.5", 10_050),
            ("100.05", 10_005),
            ("\u{20b9}1,234.56", 123_456),
            (".75", 75),
            ("0.99", 99),
        ];
        for (input, expected) in cases {
            let got = parse_required_cents(input).expect("money should parse");
            assert_eq!(got, expected, "input {input}");
        }
    }

    #[test]
    fn parse_required_cents_rejects_garbage() {
        for input in ["", "12.345", "abc", "1.2.3", "-\u{20b9}5"] {
            assert!(parse_required_cents(input).is_err(), "input {input}");
        }
    }

    #[test]
    fn optional_cents_treats_empty_as_absent() {
        assert_eq!(parse_optional_cents("").expect("empty ok"), None);
        assert_eq!(parse_optional_cents("5").expect("parse"), Some(500));
    }

    #[test]
    fn format_cents_groups_digits() {
        assert_eq!(format_cents(123_456), "\u{20b9}1,234.56");
        assert_eq!(format_cents(0), "\u{20b9}0.00");
        assert_eq!(format_cents(-500), "-\u{20b9}5.00");
    }

    #[test]
    fn cents_format_parse_round_trip() {
        for cents in [0_i64, 1, 99, 100, 123_456, 5_000_000] {
            let formatted = format_cents(cents);
            let parsed = parse_required_cents(&formatted).expect("formatted cents parse");
            assert_eq!(parsed, cents, "formatted={formatted}");
        }
    }

    #[test]
    fn compact_format_uses_lakh_and_crore() {
        assert_eq!(format_compact_cents(12_000_000), "\u{20b9}1.2L");
        assert_eq!(format_compact_cents(10_000_000), "\u{20b9}1L");
        assert_eq!(format_compact_cents(2_500_000_000), "\u{20b9}2.5Cr");
        assert_eq!(format_compact_cents(99_999), "\u{20b9}999.99");
    }

    #[test]
    fn date_parse_enforces_iso_layout() {
        assert!(parse_required_date("2026-06-11").is_ok());
        assert!(parse_required_date("11/06/2026").is_err());
        assert_eq!(parse_optional_date("  ").expect("empty ok"), None);
    }

    #[test]
    fn time_parse_enforces_hh_mm() {
        let parsed = parse_required_time("09:30").expect("time parse");
        assert_eq!(parsed.hour(), 9);
        assert_eq!(parsed.minute(), 30);
        assert!(parse_required_time("9.30").is_err());
        assert_eq!(parse_optional_time("").expect("empty ok"), None);
    }

    #[test]
    fn int_parse_rejects_negatives_and_garbage() {
        assert_eq!(parse_required_int(" 42 ").expect("int parse"), 42);
        for input in ["", "-5", "1.5", "abc"] {
            assert!(parse_required_int(input).is_err(), "input {input}");
        }
        assert_eq!(parse_optional_int("").expect("empty ok"), 0);
    }

    #[test]
    fn cgpa_is_kept_as_tenths() {
        assert_eq!(parse_cgpa_tenths("8.5").expect("cgpa parse"), 85);
        assert_eq!(parse_cgpa_tenths("10").expect("cgpa parse"), 100);
        assert!(parse_cgpa_tenths("10.5").is_err());
        assert_eq!(format_cgpa_tenths(85), "8.5");
    }
}
