//! `SETVAR`, `LET`, `PRINT` and `DISPLAY VARS`.

use crate::pattern::{group, LinePattern};
use crate::script::expr::evaluate;
use crate::script::interp::Env;
use crate::script::value::Value;
use super::{clock, math, Outcome};

static SETVAR: LinePattern = LinePattern::new(r"^SETVAR\s+([A-Za-z_][A-Za-z0-9_]*)\s+(.+)$");
static LET: LinePattern = LinePattern::new(r"^LET\s+([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.+)$");
static PRINT: LinePattern = LinePattern::new(r"^PRINT(?:\s+(.*))?$");
static DISPLAY_VARS: LinePattern = LinePattern::new(r"^DISPLAY\s+VARS$");

static READLINE: LinePattern = LinePattern::new(r"^READLINE\(\s*\)$");
static RANDOM_CALL: LinePattern = LinePattern::new(r"^RANDOM\(\s*(-?\d+)\s*,\s*(-?\d+)\s*\)$");
static DATE_CALL: LinePattern = LinePattern::new(r"^DATE\((.*)\)$");
static TIME_CALL: LinePattern = LinePattern::new(r"^TIME\((.*)\)$");
static LONE_REFERENCE: LinePattern = LinePattern::new(r"^=\(([A-Za-z0-9_]+)\)$");

pub(super) fn handle(line: &str, env: &mut Env) -> Outcome {
    if let Some(caps) = SETVAR.captures(line) {
        setvar(group(&caps, 1), group(&caps, 2).trim(), env);
        return Outcome::Handled;
    }
    if let Some(caps) = LET.captures(line) {
        let (name, src) = (group(&caps, 1), group(&caps, 2).trim());
        let value = evaluate(src, &env.vars).unwrap_or_else(|e| {
            env.report_eval(src, &e);
            Value::default()
        });
        env.vars.set(name, value);
        return Outcome::Handled;
    }
    if let Some(caps) = PRINT.captures(line) {
        let text = env.interpolate(group(&caps, 1));
        env.emit(text);
        return Outcome::Handled;
    }
    if DISPLAY_VARS.is_match(line) {
        display_vars(env);
        return Outcome::Handled;
    }
    Outcome::NotHandled
}

fn setvar(name: &str, raw: &str, env: &mut Env) {
    let value = if READLINE.is_match(raw) {
        Value::Text(env.read_line())
    } else if let Some(caps) = RANDOM_CALL.captures(raw) {
        match math::parse_bounds(group(&caps, 1), group(&caps, 2)) {
            Some((lo, hi)) => Value::from(math::random_between(env, lo, hi)),
            None => Value::Text(raw.to_owned()),
        }
    } else if let Some(caps) = DATE_CALL.captures(raw) {
        Value::Text(clock::date_text(group(&caps, 1)))
    } else if let Some(caps) = TIME_CALL.captures(raw) {
        Value::Text(clock::time_text(group(&caps, 1)))
    } else if let Some(v) = LONE_REFERENCE
        .captures(raw)
        .and_then(|caps| env.vars.get(group(&caps, 1)).cloned())
    {
        // A whole-value reference copies the value itself, lists included.
        v
    } else {
        Value::parse_literal(&env.interpolate(raw))
    };
    env.vars.set(name, value);
}

fn display_vars(env: &mut Env) {
    if env.vars.is_empty() {
        env.emit("No variables defined.");
        return;
    }
    let listing: Vec<String> = env
        .vars
        .iter()
        .map(|(name, value)| format!("{name} = {value}"))
        .collect();
    env.emit("=== VARIABLES ===");
    for row in listing {
        env.emit(row);
    }
    env.emit("=================");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::diagnostics::ErrorCode;
    use crate::script::value::Value;
    use crate::script::Interpreter;

    fn run(src: &str) -> Interpreter {
        let config = EngineConfig { seed: Some(7), ..EngineConfig::default() };
        let mut interp = Interpreter::captured(config);
        interp.run_script(src).expect("script failed");
        interp
    }

    #[test]
    fn setvar_literals() {
        let interp = run("SETVAR n 42\nSETVAR s \"hello world\"\nSETVAR w plain text");
        assert_eq!(interp.vars().get("n"), Some(&Value::from(42)));
        assert_eq!(interp.vars().get("s"), Some(&Value::from("hello world")));
        assert_eq!(interp.vars().get("w"), Some(&Value::from("plain text")));
    }

    #[test]
    fn setvar_interpolates() {
        let interp = run("SETVAR a 4\nSETVAR b =(a)2");
        assert_eq!(interp.vars().get("b"), Some(&Value::from(42)));
    }

    #[test]
    fn setvar_random_in_range() {
        let interp = run("SETVAR r RANDOM(1,6)");
        let Some(Value::Number(n)) = interp.vars().get("r") else {
            panic!("expected a number");
        };
        assert!((1..=6).contains(&n.truncate()));
    }

    #[test]
    fn setvar_copies_list() {
        let mut interp = Interpreter::captured(EngineConfig::default());
        interp.vars_mut().set("src", Value::List(vec![Value::from("a")]));
        interp.run_script("SETVAR copy =(src)").unwrap();
        assert_eq!(interp.vars().get("copy"), Some(&Value::List(vec![Value::from("a")])));
        assert!(interp.diagnostics().is_empty());
    }

    #[test]
    fn setvar_date_is_text() {
        let interp = run("SETVAR y DATE(Y)");
        let Some(Value::Text(year)) = interp.vars().get("y") else {
            panic!("expected text");
        };
        assert_eq!(year.len(), 4);
    }

    #[test]
    fn let_evaluates_expressions() {
        let interp = run("SETVAR x 6\nLET y = x * 7\nLET ok = y == 42\nLET half = 7 / 2");
        assert_eq!(interp.vars().get("y"), Some(&Value::from(42)));
        assert_eq!(interp.vars().get("ok"), Some(&Value::from(1)));
        assert_eq!(interp.vars().get("half"), Some(&Value::from(3.5)));
    }

    #[test]
    fn let_error_stores_zero() {
        let interp = run("LET z = 1 / 0");
        assert_eq!(interp.vars().get("z"), Some(&Value::from(0)));
        assert_eq!(interp.diagnostic_count(ErrorCode::RuntimeDivisionZero), 1);
    }

    #[test]
    fn print_forms() {
        let interp = run("SETVAR who you\nprint hi =(who)\nPRINT\nPRINT =(nobody)!");
        assert_eq!(interp.output(), &["hi you", "", "!"]);
    }

    #[test]
    fn print_list_reports() {
        let mut interp = Interpreter::captured(EngineConfig::default());
        interp.vars_mut().set("lines", Value::List(vec![Value::from("a")]));
        interp.run_script("PRINT [=(lines)]").unwrap();
        assert_eq!(interp.output(), &["[]"]);
        assert_eq!(interp.diagnostic_count(ErrorCode::TypeArrayString), 1);
    }

    #[test]
    fn display_vars_sorted() {
        let interp = run("SETVAR b 2\nSETVAR a 1\nDISPLAY VARS");
        assert_eq!(
            interp.output(),
            &["=== VARIABLES ===", "a = 1", "b = 2", "================="]
        );
    }

    #[test]
    fn display_vars_empty() {
        assert_eq!(run("DISPLAY VARS").output(), &["No variables defined."]);
    }
}
