//! Control-flow executor: conditional chains and the three loop forms.
//!
//! Each construct extracts its body once and runs it through
//! [`Interpreter::run_lines`], so nesting is plain recursion.  Faults in a
//! condition, count, or range bound are reported and the construct degrades
//! (false condition, skipped body); only structural faults propagate.

use crate::diagnostics::ErrorCode;
use super::{
    block::{
        classify, extract_block, extract_chain, Branch, Guard, Line, Opener, StructuralError,
        LOOP_TERMINATOR,
    },
    expr::{evaluate, evaluate_condition, EvalError},
    interp::{Flow, Interpreter},
    value::Number,
};

impl Interpreter {
    /// Run the construct opened at `lines[*cursor]`, if there is one.
    ///
    /// Returns `Ok(None)` and leaves the cursor alone when the line is not
    /// an opener; otherwise the cursor ends past the construct's terminator.
    pub(crate) fn try_control(
        &mut self,
        lines: &[Line],
        cursor: &mut usize,
    ) -> Result<Option<Flow>, StructuralError> {
        let Some(opener) = classify(&lines[*cursor].text) else {
            return Ok(None);
        };
        let at = lines[*cursor].number;

        let flow = match opener {
            Opener::If { .. } => {
                let branches = extract_chain(lines, cursor)?;
                self.run_chain(branches)?
            }
            Opener::Loop { count } => {
                let body = extract_block(lines, cursor, LOOP_TERMINATOR)?;
                self.run_counted(at, &count, &body)?
            }
            Opener::While { condition } => {
                let body = extract_block(lines, cursor, LOOP_TERMINATOR)?;
                self.run_while(at, &condition, &body)?
            }
            Opener::For { var, from, to, step } => {
                let body = extract_block(lines, cursor, LOOP_TERMINATOR)?;
                self.run_range(at, &var, &from, &to, step.as_deref(), &body)?
            }
        };
        Ok(Some(flow))
    }

    // ── IF / ELSEIF / ELSE ────────────────────────────────────────────────────

    fn run_chain(&mut self, branches: Vec<Branch>) -> Result<Flow, StructuralError> {
        for branch in branches {
            let taken = match &branch.guard {
                Guard::Always => true,
                Guard::When(condition) => self.condition_holds(branch.line, condition),
            };
            if taken {
                tracing::trace!(line = branch.line, "branch taken");
                return self.run_lines(&branch.body);
            }
        }
        Ok(Flow::Continue)
    }

    /// Evaluate a condition; a faulty one is reported and counts as false.
    fn condition_holds(&mut self, line: usize, condition: &str) -> bool {
        match evaluate_condition(condition, &self.env.vars) {
            Ok(b) => b,
            Err(e) => {
                self.report_eval(line, condition, &e);
                false
            }
        }
    }

    fn report_eval(&mut self, line: usize, src: &str, err: &EvalError) {
        self.env.set_line(line);
        self.env.report_eval(src, err);
    }

    // ── LOOP n ( ──────────────────────────────────────────────────────────────

    fn run_counted(&mut self, at: usize, count: &str, body: &[Line]) -> Result<Flow, StructuralError> {
        let n = match Number::parse(count) {
            Some(Number::Int(n)) => n,
            _ => {
                self.env.set_line(at);
                self.env.diagnose(
                    ErrorCode::SyntaxInvalid,
                    format!("Loop count `{count}` is not an integer"),
                );
                return Ok(Flow::Continue);
            }
        };
        if n <= 0 {
            self.env.set_line(at);
            self.env.diagnose(
                ErrorCode::RuntimeException,
                format!("Loop count must be positive, got {n}"),
            );
            return Ok(Flow::Continue);
        }
        for _ in 0..n {
            if self.run_lines(body)? == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    // ── WHILE cond ( ──────────────────────────────────────────────────────────

    fn run_while(&mut self, at: usize, condition: &str, body: &[Line]) -> Result<Flow, StructuralError> {
        let cap = self.env.config.max_iterations;
        let mut iterations = 0;
        while self.condition_holds(at, condition) {
            if iterations == cap {
                self.env.set_line(at);
                self.env.diagnose(
                    ErrorCode::IterationLimit,
                    format!("WHILE loop stopped after {cap} iterations"),
                );
                break;
            }
            iterations += 1;
            if self.run_lines(body)? == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    // ── FOR v FROM a TO b [STEP s] ( ──────────────────────────────────────────

    fn run_range(
        &mut self,
        at: usize,
        var: &str,
        from: &str,
        to: &str,
        step: Option<&str>,
        body: &[Line],
    ) -> Result<Flow, StructuralError> {
        let Some(start) = self.range_bound(at, from) else {
            return Ok(Flow::Continue);
        };
        let Some(end) = self.range_bound(at, to) else {
            return Ok(Flow::Continue);
        };
        let mut magnitude = match step {
            None => 1,
            Some(s) => match self.range_bound(at, s) {
                Some(s) => s.checked_abs().unwrap_or(i64::MAX),
                None => return Ok(Flow::Continue),
            },
        };
        if magnitude == 0 {
            self.env.set_line(at);
            self.env
                .diagnose(ErrorCode::RuntimeException, "FOR step of 0 treated as 1");
            magnitude = 1;
        }

        let ascending = start <= end;
        let mut i = start;
        loop {
            let in_range = if ascending { i <= end } else { i >= end };
            if !in_range {
                self.env.vars.set(var, i);
                break;
            }
            self.env.vars.set(var, i);
            if self.run_lines(body)? == Flow::Exit {
                return Ok(Flow::Exit);
            }
            let next = if ascending {
                i.checked_add(magnitude)
            } else {
                i.checked_sub(magnitude)
            };
            match next {
                Some(n) => i = n,
                // Past the representable range, so also past `end`.
                None => break,
            }
        }
        Ok(Flow::Continue)
    }

    /// A FOR bound or step: a literal or a variable, truncated to an integer.
    fn range_bound(&mut self, at: usize, src: &str) -> Option<i64> {
        let value = evaluate(src, &self.env.vars)
            .and_then(|v| v.coerce_numeric().map_err(EvalError::from));
        match value {
            Ok(n) => Some(n.truncate()),
            Err(e) => {
                self.report_eval(at, src, &e);
                None
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
