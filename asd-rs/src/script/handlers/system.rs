//! `READFILE` and `EXIT`.

use std::io::ErrorKind;
use std::path::Path;

use crate::diagnostics::ErrorCode;
use crate::pattern::{group, LinePattern};
use crate::script::interp::Env;
use crate::script::value::Value;
use crate::var::FILE_VAR;
use super::Outcome;

static READFILE_CALL: LinePattern = LinePattern::new(r"^READFILE\((.+)\)$");
static READFILE_ARG: LinePattern = LinePattern::new(r"^READFILE\s+(.+)$");
static EXIT: LinePattern = LinePattern::new(r"^EXIT(?:\s+(.+))?$");

fn unquote(s: &str) -> &str {
    s.trim().trim_matches(|c| c == '"' || c == '\'')
}

pub(super) fn handle_readfile(line: &str, env: &mut Env) -> Outcome {
    let Some(caps) = READFILE_CALL
        .captures(line)
        .or_else(|| READFILE_ARG.captures(line))
    else {
        return Outcome::NotHandled;
    };
    let filename = unquote(group(&caps, 1));

    match std::fs::read_to_string(Path::new(filename)) {
        Ok(content) => {
            let lines: Vec<Value> = content
                .lines()
                .filter(|l| !l.is_empty())
                .map(Value::from)
                .collect();
            let count = lines.len();
            env.vars.set(FILE_VAR, lines);
            env.emit(format!("Read {count} lines from {filename}"));
        }
        Err(e) => {
            tracing::debug!(filename, "read failed: {e}");
            if e.kind() == ErrorKind::NotFound {
                env.diagnose(ErrorCode::FileNotFound, format!("File '{filename}' not found"));
            } else {
                env.diagnose(
                    ErrorCode::FileReadError,
                    format!("Unable to read file '{filename}': {e}"),
                );
            }
            env.vars.set(FILE_VAR, Vec::<Value>::new());
        }
    }
    Outcome::Handled
}

pub(super) fn handle_exit(line: &str, env: &mut Env) -> Outcome {
    let Some(caps) = EXIT.captures(line) else {
        return Outcome::NotHandled;
    };
    if let Some(m) = caps.get(1) {
        env.emit(unquote(m.as_str()));
    }
    tracing::debug!(line = env.line(), "script exit");
    Outcome::Terminate
}

// ── Tests ─────────────────────────────────────────────────────────────────────
