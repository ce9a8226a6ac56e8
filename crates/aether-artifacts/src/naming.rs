//! Artifact naming: normalization, identifiers, and stable choices

use chrono::{DateTime, Utc};

/// Lowercase ASCII letters, digits and `_`; everything else becomes `_`.
///
/// Returns `None` when nothing alphanumeric survives, so the caller falls
/// back to a generated name.
pub fn normalize_name(raw: &str) -> Option<String> {
    let normalized: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    if normalized.chars().any(|c| c.is_ascii_alphanumeric()) {
        Some(normalized)
    } else {
        None
    }
}

/// `<prefix>_<UTC YYYYmmddHHMMSS>`
pub fn generated_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}", prefix, at.format("%Y%m%d%H%M%S"))
}

/// `cyber_space_` → `CyberSpace`. Identifiers never start with a digit.
pub fn pascal_case(normalized: &str) -> String {
    let mut out: String = normalized
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    if out.is_empty() {
        out.push_str("Artifact");
    } else if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'X');
    }
    out
}

/// FNV-1a. Used for choices that must be identical across runs and builds.
pub fn stable_hash(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in s.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Pick an element of `options` keyed by `key`.
pub fn stable_pick<'a, T>(options: &'a [T], key: &str) -> &'a T {
    &options[(stable_hash(key) % options.len() as u64) as usize]
}

/// Render `s` as a double-quoted string literal valid in both Python and
/// JavaScript source.
pub fn string_literal(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}
