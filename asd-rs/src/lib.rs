//! ASD: a line-oriented scripting engine.
//!
//! Scripts are plain text, one statement or control keyword per line.  See
//! [`script`] for the language and [`script::Interpreter`] for running it.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod pattern;
pub mod script;
pub mod var;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for the engine.
///
/// Safe to call multiple times; only the first call has an effect.  Logging
/// is enabled when `RUST_LOG` is set (e.g. `RUST_LOG=asd=trace`) or when
/// `force` is true, in which case `asd=debug` is the default filter.
/// Output goes to stderr so it never mixes with script output.
pub fn init_tracing(force: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) if force => EnvFilter::new("asd=debug"),
            Err(_) => return,
        };
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(filter)
            .init();
    });
}
