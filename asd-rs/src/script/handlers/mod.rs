//! Statement-handler library.
//!
//! A handler inspects one trimmed, non-control line and either performs it
//! or declines.  The registry tries handlers in a fixed order and stops at
//! the first that accepts, so an earlier form shadows a later one (`ADD x TO
//! v` is seen before `ADD a b`).

mod clock;
mod math;
mod system;
mod text;
mod vars;

pub use clock::format_date;

use super::interp::Env;

/// Result of offering a line to a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NotHandled,
    Handled,
    /// The line ran and the script must stop (`EXIT`).
    Terminate,
}

/// One statement family.
pub trait StatementHandler {
    fn try_handle(&self, line: &str, env: &mut Env) -> Outcome;
}

impl<F> StatementHandler for F
where
    F: Fn(&str, &mut Env) -> Outcome,
{
    fn try_handle(&self, line: &str, env: &mut Env) -> Outcome {
        self(line, env)
    }
}

/// Ordered list of named handlers.
pub struct HandlerRegistry {
    handlers: Vec<(&'static str, Box<dyn StatementHandler>)>,
}

impl HandlerRegistry {
    pub fn empty() -> Self {
        HandlerRegistry {
            handlers: Vec::new(),
        }
    }

    /// The standard ASD statement library, in priority order.
    pub fn standard() -> Self {
        let mut r = HandlerRegistry::empty();
        r.register("vars", vars::handle);
        r.register("arithmetic", math::handle_arithmetic);
        r.register("comparison", math::handle_comparison);
        r.register("sleep", clock::handle_sleep);
        r.register("random", math::handle_random);
        r.register("len", text::handle_len);
        r.register("upper", text::handle_upper);
        r.register("lower", text::handle_lower);
        r.register("replace", text::handle_replace);
        r.register("readfile", system::handle_readfile);
        r.register("date", clock::handle_date);
        r.register("time", clock::handle_time);
        r.register("exit", system::handle_exit);
        r
    }

    /// Append a handler; it runs after every handler already registered.
    pub fn register(&mut self, name: &'static str, handler: impl StatementHandler + 'static) {
        self.handlers.push((name, Box::new(handler)));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|(name, _)| *name).collect()
    }

    pub fn dispatch(&self, line: &str, env: &mut Env) -> Outcome {
        for (name, handler) in &self.handlers {
            match handler.try_handle(line, env) {
                Outcome::NotHandled => continue,
                outcome => {
                    tracing::trace!(handler = *name, line = env.line(), "handled");
                    return outcome;
                }
            }
        }
        Outcome::NotHandled
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
