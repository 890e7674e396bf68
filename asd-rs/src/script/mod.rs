//! The ASD scripting language.
//!
//! This module implements a line-walking interpreter for ASD scripts,
//! covering:
//!
//! - Dynamically typed values (numbers, text, lists)
//! - Arithmetic and boolean expressions in conditions and `LET`
//! - Control flow: `IF` … `ELSEIF` … `ELSE` … `END`, `LOOP n (`, `WHILE cond (`,
//!   `FOR v FROM a TO b [STEP s] (`, all closed by `)` except `IF`
//! - An ordered library of statement handlers (`SETVAR`, `PRINT`, `ADD`, …)
//!
//! # Quick start
//!
//! ```rust
//! use asd::config::EngineConfig;
//! use asd::script::Interpreter;
//!
//! let mut interp = Interpreter::captured(EngineConfig::default());
//! interp.run_script("SETVAR x 6\nMULT x 7\nPRINT x is =(x)").unwrap();
//! assert_eq!(interp.output(), &["42", "x is 42"]);
//! ```

pub mod block;
mod control;
pub mod expand;
pub mod expr;
pub mod handlers;
pub mod interp;
pub mod value;

// Re-exports for convenience.
pub use expr::EvalContext;
pub use interp::{EngineError, Env, Interpreter, RunOutcome};
pub use value::Value;
