//! Environment lookups shared by the config types.
//!
//! Unset, empty and unparseable variables all resolve to the caller's default.

use std::env;
use std::str::FromStr;

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn string_or(key: &str, default: String) -> String {
    var(key).unwrap_or(default)
}

pub(crate) fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    var(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

pub(crate) fn flag_or(key: &str, default: bool) -> bool {
    var(key).and_then(|v| parse_flag(&v)).unwrap_or(default)
}

pub(crate) fn list(key: &str) -> Option<Vec<String>> {
    var(key).map(|v| parse_list(&v))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
