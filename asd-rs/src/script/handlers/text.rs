//! `LEN`, `UPPER`, `LOWER` and `REPLACE`.

use crate::diagnostics::ErrorCode;
use crate::pattern::{group, LinePattern};
use crate::script::interp::Env;
use crate::script::value::Value;
use super::Outcome;

static LEN: LinePattern =
    LinePattern::new(r"^LEN(?:\(\s*([A-Za-z_][A-Za-z0-9_]*)\s*\)|\s+([A-Za-z_][A-Za-z0-9_]*))$");
static UPPER_PRINT: LinePattern = LinePattern::new(r"^UPPER\s+PRINT\s+(.+)$");
static UPPER_VAR: LinePattern = LinePattern::new(r"^UPPER\s+([A-Za-z_][A-Za-z0-9_]*)$");
static LOWER_PRINT: LinePattern = LinePattern::new(r"^LOWER\s+PRINT\s+(.+)$");
static LOWER_VAR: LinePattern = LinePattern::new(r"^LOWER\s+([A-Za-z_][A-Za-z0-9_]*)$");
static REPLACE_DOUBLE: LinePattern =
    LinePattern::new(r#"^REPLACE\s+([A-Za-z_][A-Za-z0-9_]*)\s+"([^"]*)"\s+"([^"]*)"$"#);
static REPLACE_SINGLE: LinePattern =
    LinePattern::new(r"^REPLACE\s+([A-Za-z_][A-Za-z0-9_]*)\s+'([^']*)'\s+'([^']*)'$");

pub(super) fn handle_len(line: &str, env: &mut Env) -> Outcome {
    let Some(caps) = LEN.captures(line) else {
        return Outcome::NotHandled;
    };
    let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
    let len = match env.vars.get(name) {
        Some(Value::List(items)) => items.len(),
        Some(v) => v.to_string().len(),
        None => 0,
    };
    env.emit(len.to_string());
    Outcome::Handled
}

pub(super) fn handle_upper(line: &str, env: &mut Env) -> Outcome {
    change_case(line, env, &UPPER_PRINT, &UPPER_VAR, str::to_uppercase)
}

pub(super) fn handle_lower(line: &str, env: &mut Env) -> Outcome {
    change_case(line, env, &LOWER_PRINT, &LOWER_VAR, str::to_lowercase)
}

fn change_case(
    line: &str,
    env: &mut Env,
    print_form: &LinePattern,
    var_form: &LinePattern,
    convert: fn(&str) -> String,
) -> Outcome {
    if let Some(caps) = print_form.captures(line) {
        let text = env.interpolate(group(&caps, 1));
        env.emit(convert(&text));
        return Outcome::Handled;
    }
    let Some(caps) = var_form.captures(line) else {
        return Outcome::NotHandled;
    };
    let name = group(&caps, 1);
    if let Some(text) = text_var(env, name) {
        let converted = convert(&text);
        env.vars.set(name, converted);
    }
    Outcome::Handled
}

pub(super) fn handle_replace(line: &str, env: &mut Env) -> Outcome {
    let Some(caps) = REPLACE_DOUBLE
        .captures(line)
        .or_else(|| REPLACE_SINGLE.captures(line))
    else {
        return Outcome::NotHandled;
    };
    let (name, search, replacement) = (group(&caps, 1), group(&caps, 2), group(&caps, 3));
    if let Some(text) = text_var(env, name) {
        let replaced = if search.is_empty() {
            text
        } else {
            text.replace(search, replacement)
        };
        env.vars.set(name, replaced.clone());
        env.emit(replaced);
    }
    Outcome::Handled
}

/// The text held by `name`.  Missing variables and non-text values are
/// reported and yield `None`.
fn text_var(env: &mut Env, name: &str) -> Option<String> {
    match env.vars.get(name) {
        Some(Value::Text(s)) => Some(s.clone()),
        Some(other) => {
            let kind = other.type_name();
            env.diagnose(
                ErrorCode::VariableWrongType,
                format!("Variable '{name}' holds a {kind}, not text"),
            );
            None
        }
        None => {
            env.diagnose(ErrorCode::VariableUndefined, format!("Variable '{name}' is not defined"));
            None
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
