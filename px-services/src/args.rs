//! Session argument strings
//!
//! Session requests carry their arguments as a flat string of comma
//! separated `key=value` pairs. Values may be double-quoted, in which case
//! they can contain commas.

use alloc::string::String;
use alloc::vec::Vec;

use px_api::Result;
use px_api::error::invalid_argument;

/// Split `args` into `(key, raw value)` pairs, honouring quotes
fn pairs(args: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let bytes = args.as_bytes();

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'"' => quoted = !quoted,
            b',' if !quoted => {
                push_pair(&mut out, &args[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    push_pair(&mut out, &args[start..]);
    out
}

fn push_pair<'a>(out: &mut Vec<(&'a str, &'a str)>, token: &'a str) {
    let token = token.trim();
    if token.is_empty() {
        return;
    }
    match token.split_once('=') {
        Some((key, value)) => out.push((key.trim(), value.trim())),
        None => out.push((token, "")),
    }
}

/// Raw value of `key`, quotes included
pub fn find_arg<'a>(args: &'a str, key: &str) -> Option<&'a str> {
    pairs(args).into_iter().find(|(k, _)| *k == key).map(|(_, v)| v)
}

/// Value of `key` with surrounding quotes removed
pub fn string_arg<'a>(args: &'a str, key: &str) -> Option<&'a str> {
    find_arg(args, key).map(|v| {
        v.strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(v)
    })
}

/// Remove every occurrence of `key`
pub fn remove_arg(args: &mut String, key: &str) {
    let kept: Vec<String> = pairs(args)
        .into_iter()
        .filter(|(k, _)| *k != key)
        .map(|(k, v)| if v.is_empty() { String::from(k) } else { alloc::format!("{}={}", k, v) })
        .collect();
    *args = kept.join(", ");
}

/// Set `key` to `value`, replacing an existing entry
///
/// `capacity` is the size of the caller's argument buffer including its
/// terminator; the update is rejected and `args` left untouched when the
/// result would not fit.
pub fn set_arg(args: &mut String, capacity: usize, key: &str, value: &str) -> Result<()> {
    let mut updated = args.clone();
    remove_arg(&mut updated, key);
    if !updated.is_empty() {
        updated.push_str(", ");
    }
    updated.push_str(key);
    updated.push('=');
    updated.push_str(value);

    if updated.len() >= capacity {
        return Err(invalid_argument("session arguments exceed buffer"));
    }
    *args = updated;
    Ok(())
}
