//! `SLEEP`, `DATE` and `TIME`.
//!
//! Date formats use single-letter codes:
//!
//! | Code | Output | Code | Output |
//! |------|--------|------|--------|
//! | `Y` | 2024 | `H` | 00-23 |
//! | `y` | 24 | `G` | 0-23 |
//! | `m` | 01-12 | `h` | 01-12 |
//! | `n` | 1-12 | `g` | 1-12 |
//! | `d` | 01-31 | `i` | 00-59 |
//! | `j` | 1-31 | `s` | 00-59 |
//! | `D` | Mon | `A` / `a` | AM / am |
//! | `l` | Monday | `N` | 1 (Mon) - 7 (Sun) |
//! | `M` | Jan | `w` | 0 (Sun) - 6 (Sat) |
//! | `F` | January | `\x` | literal `x` |
//!
//! Any other character is copied through.

use std::time::Duration;

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};

use crate::diagnostics::ErrorCode;
use crate::pattern::{group, LinePattern};
use crate::script::interp::Env;
use crate::script::value::strip_matching_quotes;
use super::Outcome;

const DEFAULT_DATE: &str = "Y-m-d";
const DEFAULT_TIME: &str = "H:i:s";

static SLEEP: LinePattern = LinePattern::new(r"^SLEEP\s+(\d+)$");
static DATE: LinePattern = LinePattern::new(r"^DATE\((.*)\)$");
static TIME: LinePattern = LinePattern::new(r"^TIME\((.*)\)$");

pub(super) fn handle_sleep(line: &str, env: &mut Env) -> Outcome {
    let Some(caps) = SLEEP.captures(line) else {
        return Outcome::NotHandled;
    };
    match group(&caps, 1).parse::<u64>() {
        Ok(0) => {}
        Ok(secs) if env.config.sleep => {
            tracing::debug!(secs, "sleeping");
            std::thread::sleep(Duration::from_secs(secs));
        }
        Ok(secs) => tracing::debug!(secs, "sleep disabled"),
        Err(_) => env.diagnose(ErrorCode::SyntaxInvalid, "SLEEP duration out of range"),
    }
    Outcome::Handled
}

pub(super) fn handle_date(line: &str, env: &mut Env) -> Outcome {
    match DATE.captures(line) {
        Some(caps) => {
            env.emit(date_text(group(&caps, 1)));
            Outcome::Handled
        }
        None => Outcome::NotHandled,
    }
}

pub(super) fn handle_time(line: &str, env: &mut Env) -> Outcome {
    match TIME.captures(line) {
        Some(caps) => {
            env.emit(time_text(group(&caps, 1)));
            Outcome::Handled
        }
        None => Outcome::NotHandled,
    }
}

/// The current local date in `arg` format (`Y-m-d` when empty).
pub(super) fn date_text(arg: &str) -> String {
    format_date(&format_arg(arg, DEFAULT_DATE), &Local::now())
}

/// The current local time in `arg` format (`H:i:s` when empty).
pub(super) fn time_text(arg: &str) -> String {
    format_date(&format_arg(arg, DEFAULT_TIME), &Local::now())
}

fn format_arg(arg: &str, default: &str) -> String {
    let arg = arg.trim();
    let fmt = strip_matching_quotes(arg).unwrap_or(arg);
    if fmt.is_empty() {
        default.to_owned()
    } else {
        fmt.to_owned()
    }
}

/// Render `when` using single-letter format codes.
pub fn format_date<Tz>(fmt: &str, when: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::with_capacity(fmt.len() * 2);
    let mut chars = fmt.chars();
    while let Some(ch) = chars.next() {
        let hour12 = match when.hour() % 12 {
            0 => 12,
            h => h,
        };
        match ch {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            'Y' => out.push_str(&when.year().to_string()),
            'y' => out.push_str(&format!("{:02}", when.year().rem_euclid(100))),
            'm' => out.push_str(&format!("{:02}", when.month())),
            'n' => out.push_str(&when.month().to_string()),
            'd' => out.push_str(&format!("{:02}", when.day())),
            'j' => out.push_str(&when.day().to_string()),
            'H' => out.push_str(&format!("{:02}", when.hour())),
            'G' => out.push_str(&when.hour().to_string()),
            'h' => out.push_str(&format!("{hour12:02}")),
            'g' => out.push_str(&hour12.to_string()),
            'i' => out.push_str(&format!("{:02}", when.minute())),
            's' => out.push_str(&format!("{:02}", when.second())),
            'A' => out.push_str(if when.hour() < 12 { "AM" } else { "PM" }),
            'a' => out.push_str(if when.hour() < 12 { "am" } else { "pm" }),
            'D' => out.push_str(&when.format("%a").to_string()),
            'l' => out.push_str(&when.format("%A").to_string()),
            'M' => out.push_str(&when.format("%b").to_string()),
            'F' => out.push_str(&when.format("%B").to_string()),
            'N' => out.push_str(&when.weekday().number_from_monday().to_string()),
            'w' => out.push_str(&when.weekday().num_days_from_sunday().to_string()),
            c => out.push(c),
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
