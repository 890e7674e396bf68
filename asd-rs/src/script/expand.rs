//! `=(name)` variable interpolation.
//!
//! | Sequence   | Meaning                                          |
//! |------------|--------------------------------------------------|
//! | `=(name)`  | Text of variable `name`; empty if it is unset    |
//!
//! Anything else, including a malformed `=(` sequence, is copied through
//! unchanged.  A list cannot be interpolated: it expands to nothing and the
//! caller is told which names referred to lists.

use crate::var::VarStore;
use super::value::Value;

/// Result of [`interpolate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub text: String,
    /// Names that referred to list values, in order of appearance.
    pub list_refs: Vec<String>,
}

/// Replace every `=(name)` in `src` with the value of `name`.
pub fn interpolate(src: &str, vars: &VarStore) -> Expansion {
    let mut out = Expansion {
        text: String::with_capacity(src.len()),
        list_refs: Vec::new(),
    };
    let mut rest = src;

    while let Some(at) = rest.find("=(") {
        out.text.push_str(&rest[..at]);
        let after = &rest[at + 2..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());

        if name_len == 0 || !after[name_len..].starts_with(')') {
            // Not a reference; keep the `=` and rescan from the `(`.
            out.text.push('=');
            rest = &rest[at + 1..];
            continue;
        }

        let name = &after[..name_len];
        match vars.get(name) {
            Some(Value::List(_)) => out.list_refs.push(name.to_owned()),
            Some(v) => out.text.push_str(&v.to_string()),
            None => {}
        }
        rest = &after[name_len + 1..];
    }

    out.text.push_str(rest);
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
