// Copyright 2020-2022 Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
//
// This module contains code adapted from AWS CloudFormation Guard
// https://github.com/aws-cloudformation/cloudformation-guard
// See readme.md for attribution details

//! Resolution of untagged plain scalars, and the reverse check the dumper
//! needs to keep strings from reading back as something else.

use lazy_static::lazy_static;
use regex::Regex;

use super::types::Value;

lazy_static! {
    static ref NUMBER: Regex =
        Regex::new(r"^[-+]?(\.[0-9]+|[0-9][0-9_]*(\.[0-9_]*)?)([eE][-+]?[0-9]+)?$").unwrap();
    static ref SPECIAL_NUMBER: Regex = Regex::new(
        r"^([-+]?0x[0-9a-fA-F_]+|[-+]?0o[0-7_]+|[-+]?0b[01_]+|[-+]?\.(inf|Inf|INF)|\.(nan|NaN|NAN)|[-+]?[0-9][0-9_]*(:[0-5]?[0-9])+(\.[0-9_]*)?)$"
    )
    .unwrap();
    static ref TIMESTAMP: Regex = Regex::new(r"^[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}").unwrap();
}

/// Words YAML 1.1 or 1.2 readers resolve to null, booleans or merge keys.
const KEYWORDS: [&str; 28] = [
    "~", "null", "Null", "NULL", "true", "True", "TRUE", "false", "False", "FALSE", "yes", "Yes",
    "YES", "no", "No", "NO", "on", "On", "ON", "off", "Off", "OFF", "y", "Y", "n", "N", "<<", "=",
];

/// Value of an untagged plain scalar: null, boolean, integer, float or string.
pub(crate) fn resolve_plain(text: &str) -> Value {
    if is_null(text) {
        Value::Null
    } else if let Some(b) = parse_bool(text) {
        Value::Bool(b)
    } else if let Some(int) = parse_int(text) {
        int
    } else if let Some(f) = parse_float(text) {
        Value::Float(f)
    } else {
        Value::String(text.to_string())
    }
}

pub(crate) fn is_null(text: &str) -> bool {
    matches!(text, "" | "~" | "null" | "Null" | "NULL")
}

pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Decimal, `0x`, `0o` and `0b` integers. Values past `i64::MAX` stay exact as
/// [`Value::UInt`]; anything wider is not an integer.
pub(crate) fn parse_int(text: &str) -> Option<Value> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (radix, digits) = if let Some(rest) = unsigned.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = unsigned.strip_prefix("0o") {
        (8, rest)
    } else if let Some(rest) = unsigned.strip_prefix("0b") {
        (2, rest)
    } else if digits_but_not_number(unsigned) {
        return None;
    } else {
        (10, unsigned)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = i128::from(u64::from_str_radix(digits, radix).ok()?);
    let signed = if negative { -magnitude } else { magnitude };
    if let Ok(int) = i64::try_from(signed) {
        Some(Value::Int(int))
    } else {
        u64::try_from(signed).ok().map(Value::UInt)
    }
}

pub(crate) fn parse_float(text: &str) -> Option<f64> {
    let unsigned = text.strip_prefix('+').unwrap_or(text);
    if unsigned.starts_with(['+', '-']) && text.starts_with('+') {
        return None;
    }
    match unsigned {
        ".inf" | ".Inf" | ".INF" => return Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => return Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Some(f64::NAN),
        _ => {}
    }
    if digits_but_not_number(unsigned.strip_prefix('-').unwrap_or(unsigned)) {
        return None;
    }
    unsigned.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Leading zeros followed by more digits read as a string, not an octal number.
fn digits_but_not_number(text: &str) -> bool {
    text.len() > 1 && text.starts_with('0') && text[1..].bytes().all(|b| b.is_ascii_digit())
}

/// True when `text` written plain would not read back as the same string,
/// either here or in a YAML 1.1 reader.
pub(crate) fn is_ambiguous(text: &str) -> bool {
    text.is_empty()
        || KEYWORDS.contains(&text)
        || !matches!(resolve_plain(text), Value::String(_))
        || NUMBER.is_match(text)
        || SPECIAL_NUMBER.is_match(text)
        || TIMESTAMP.is_match(text)
}

/// Float text that reads back as the same float.
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        ".nan".to_string()
    } else if f.is_infinite() && f > 0.0 {
        ".inf".to_string()
    } else if f.is_infinite() {
        "-.inf".to_string()
    } else {
        format!("{:?}", f)
    }
}
