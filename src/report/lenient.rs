//! Tolerant field deserializers for browser-supplied reports.
//!
//! Browsers disagree on JSON types for the same field (`"line-number": "12"`
//! vs `12`). Values are coerced when the conversion is lossless; anything
//! else is treated as if the field were absent.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

pub fn u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

pub fn i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

pub fn bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => Some(b),
        Value::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    })
}

/// A list of strings; non-string entries are skipped.
pub fn strings<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<String>>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

/// Converts `hyphen-case` and `camelCase` keys to `snake_case`.
pub fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev_lower = false;
    for c in key.chars() {
        if c == '-' || c == ' ' {
            out.push('_');
            prev_lower = false;
        } else if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            out.push(c);
        }
    }
    out
}

/// Re-keys a report object to snake_case before it is deserialized.
///
/// `renames` maps a snake_cased browser spelling onto the field it fills
/// (`blocked_url` → `blocked_uri`). When several keys land on the same name,
/// the canonical spelling wins, then the hyphenated one, then the first key
/// in object order. Nothing is merged.
pub fn normalize_keys(object: Map<String, Value>, renames: &[(&str, &str)]) -> Map<String, Value> {
    let mut ranked: BTreeMap<String, (u8, Value)> = BTreeMap::new();
    for (key, value) in object {
        let snake = snake_case(&key);
        let name = renames
            .iter()
            .find(|(from, _)| *from == snake)
            .map_or(snake, |(_, to)| to.to_string());
        let rank = spelling_rank(&key, &name);
        match ranked.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert((rank, value));
            }
            Entry::Occupied(mut slot) => {
                if rank < slot.get().0 {
                    slot.insert((rank, value));
                }
            }
        }
    }
    ranked.into_iter().map(|(name, (_, value))| (name, value)).collect()
}

fn spelling_rank(key: &str, name: &str) -> u8 {
    if key == name {
        0
    } else if key.replace('-', "_") == name {
        1
    } else {
        2
    }
}
