//! Arithmetic, comparison and random-number statements.
//!
//! | Form | Effect |
//! |------|--------|
//! | `INC v` / `DEC v` | `v ± 1`, printed |
//! | `ADD x TO v` / `SUB x FROM v` | accumulate into `v`, printed |
//! | `ADD\|SUB\|MULT\|DIV\|MOD\|POW a b` | result printed, stored into `a` if it is a variable |
//! | `EQ\|NE\|GT\|LT\|GTE\|LTE a b` | `true` / `false` |
//! | `RANDOM(min,max)` / `RANDOM min max` | random integer in `[min, max]` |
//! | `RANDOM FROM v` | random element of list `v`, `0` if there is none |
//!
//! Operands name a variable when one is defined, else they are literals.

use std::cmp::Ordering;

use rand::Rng;

use crate::diagnostics::ErrorCode;
use crate::pattern::{group, LinePattern};
use crate::script::interp::Env;
use crate::script::value::{ArithmeticError, Number, Value};
use super::Outcome;

static INC: LinePattern = LinePattern::new(r"^INC\s+([A-Za-z_][A-Za-z0-9_]*)$");
static DEC: LinePattern = LinePattern::new(r"^DEC\s+([A-Za-z_][A-Za-z0-9_]*)$");
static ADD_TO: LinePattern = LinePattern::new(r"^ADD\s+(.+?)\s+TO\s+([A-Za-z_][A-Za-z0-9_]*)$");
static SUB_FROM: LinePattern =
    LinePattern::new(r"^SUB\s+(.+?)\s+FROM\s+([A-Za-z_][A-Za-z0-9_]*)$");
static BINARY: LinePattern = LinePattern::new(r"^(ADD|SUB|MULT|DIV|MOD|POW)\s+(\S+)\s+(\S+)$");
static COMPARE: LinePattern = LinePattern::new(r"^(EQ|NE|GTE|GT|LTE|LT)\s+(\S+)\s+(\S+)$");

static RANDOM_CALL: LinePattern = LinePattern::new(r"^RANDOM\(\s*(-?\d+)\s*,\s*(-?\d+)\s*\)$");
static RANDOM_ARGS: LinePattern = LinePattern::new(r"^RANDOM\s+(-?\d+)\s+(-?\d+)$");
static RANDOM_FROM: LinePattern = LinePattern::new(r"^RANDOM\s+FROM\s+([A-Za-z_][A-Za-z0-9_]*)$");

// ── Arithmetic ────────────────────────────────────────────────────────────────

pub(super) fn handle_arithmetic(line: &str, env: &mut Env) -> Outcome {
    if let Some(caps) = INC.captures(line) {
        accumulate(env, group(&caps, 1), Number::Int(1));
        return Outcome::Handled;
    }
    if let Some(caps) = DEC.captures(line) {
        accumulate(env, group(&caps, 1), Number::Int(-1));
        return Outcome::Handled;
    }
    if let Some(caps) = ADD_TO.captures(line) {
        let amount = env.numeric_operand(group(&caps, 1).trim());
        accumulate(env, group(&caps, 2), amount);
        return Outcome::Handled;
    }
    if let Some(caps) = SUB_FROM.captures(line) {
        let amount = env.numeric_operand(group(&caps, 1).trim());
        accumulate(env, group(&caps, 2), amount.neg());
        return Outcome::Handled;
    }

    let Some(caps) = BINARY.captures(line) else {
        return Outcome::NotHandled;
    };
    let op = group(&caps, 1).to_ascii_uppercase();
    let (lhs, rhs) = (group(&caps, 2), group(&caps, 3));
    let a = env.numeric_operand(lhs);
    let b = env.numeric_operand(rhs);

    let result = match op.as_str() {
        "ADD" => Ok(a.add(b)),
        "SUB" => Ok(a.sub(b)),
        "MULT" => Ok(a.mul(b)),
        "DIV" => a.int_div(b),
        "MOD" => a.rem(b),
        _ => Ok(a.pow(b)),
    };
    match result {
        Ok(n) => {
            if env.vars.contains(lhs) {
                env.vars.set(lhs, n);
            }
            env.emit(n.to_string());
        }
        Err(ArithmeticError::DivisionByZero) => {
            env.diagnose(ErrorCode::RuntimeDivisionZero, format!("Cannot divide {a} by zero"));
        }
        Err(ArithmeticError::ModuloByZero) => {
            env.diagnose(ErrorCode::RuntimeDivisionZero, "Cannot calculate modulo with zero");
        }
    }
    Outcome::Handled
}

/// `var += amount`, creating `var` as 0, then print the new value.
fn accumulate(env: &mut Env, var: &str, amount: Number) {
    let current = match env.vars.get_or_zero(var).coerce_numeric() {
        Ok(n) => n,
        Err(_) => {
            env.diagnose(
                ErrorCode::TypeArrayString,
                format!("List '{var}' used in a math operation"),
            );
            Number::Int(0)
        }
    };
    let n = current.add(amount);
    env.vars.set(var, n);
    env.emit(n.to_string());
}

// ── Comparison ────────────────────────────────────────────────────────────────

pub(super) fn handle_comparison(line: &str, env: &mut Env) -> Outcome {
    let Some(caps) = COMPARE.captures(line) else {
        return Outcome::NotHandled;
    };
    let op = group(&caps, 1).to_ascii_uppercase();
    let a = env.resolve(group(&caps, 2));
    let b = env.resolve(group(&caps, 3));

    let result = match a.loose_cmp(&b) {
        Ok(ord) => match op.as_str() {
            "EQ" => ord == Ordering::Equal,
            "NE" => ord != Ordering::Equal,
            "GT" => ord == Ordering::Greater,
            "LT" => ord == Ordering::Less,
            "GTE" => ord != Ordering::Less,
            _ => ord != Ordering::Greater,
        },
        Err(_) => {
            env.diagnose(ErrorCode::TypeArrayString, "List used in a comparison");
            false
        }
    };
    env.emit(if result { "true" } else { "false" });
    Outcome::Handled
}

// ── Random ────────────────────────────────────────────────────────────────────

/// Parse two integer bounds, swapping them if they are reversed.
pub(super) fn parse_bounds(a: &str, b: &str) -> Option<(i64, i64)> {
    let (a, b) = (a.parse::<i64>().ok()?, b.parse::<i64>().ok()?);
    Some(if a <= b { (a, b) } else { (b, a) })
}

pub(super) fn random_between(env: &mut Env, lo: i64, hi: i64) -> i64 {
    env.rng().gen_range(lo..=hi)
}

pub(super) fn handle_random(line: &str, env: &mut Env) -> Outcome {
    let caps = RANDOM_CALL.captures(line).or_else(|| RANDOM_ARGS.captures(line));
    if let Some(caps) = caps {
        match parse_bounds(group(&caps, 1), group(&caps, 2)) {
            Some((lo, hi)) => {
                let n = random_between(env, lo, hi);
                env.emit(n.to_string());
            }
            None => env.diagnose(ErrorCode::SyntaxInvalid, "RANDOM bounds out of range"),
        }
        return Outcome::Handled;
    }

    let Some(caps) = RANDOM_FROM.captures(line) else {
        return Outcome::NotHandled;
    };
    let name = group(&caps, 1);
    let len = match env.vars.get(name) {
        Some(Value::List(items)) => items.len(),
        _ => 0,
    };
    if len == 0 {
        env.emit("0");
        return Outcome::Handled;
    }
    let i = env.rng().gen_range(0..len);
    let picked = match env.vars.get(name) {
        Some(Value::List(items)) => items[i].to_string(),
        _ => "0".to_owned(),
    };
    env.emit(picked);
    Outcome::Handled
}

// ── Tests ─────────────────────────────────────────────────────────────────────
