//! Block delimiting over a flat line sequence.
//!
//! An ASD script is never parsed into a tree.  Control constructs are found
//! by scanning forward from an opener line to its terminator:
//!
//! ```text
//! IF cond THEN DO            LOOP n (          WHILE cond (
//!   ...                        ...               ...
//! ELSEIF cond                )                 )
//!   ...
//! ELSE                       FOR v FROM a TO b [STEP s] (
//!   ...                        ...
//! END                        )
//! ```
//!
//! While scanning, openers of nested constructs are pushed on a small stack
//! so that an inner `)` or `END` is not mistaken for the outer terminator.
//! An `IF` directly inside a branch of another `IF` is rejected.

use thiserror::Error;

use crate::pattern::{group, LinePattern};

static IF_OPENER: LinePattern = LinePattern::new(r"^IF\s+(.+?)\s+THEN\s+DO$");
static LOOP_OPENER: LinePattern = LinePattern::new(r"^LOOP\s+(.+?)\s*\($");
static WHILE_OPENER: LinePattern = LinePattern::new(r"^WHILE\s+(.+?)\s*\($");
static FOR_OPENER: LinePattern = LinePattern::new(
    r"^FOR\s+([A-Za-z_][A-Za-z0-9_]*)\s+FROM\s+(\S+)\s+TO\s+(\S+)(?:\s+STEP\s+(\S+))?\s*\($",
);
static ELSEIF_MARKER: LinePattern =
    LinePattern::new(r"^ELSE(?:IF|\s+IF|\s*;\s*IF)\s+(.+?)(?:\s+THEN(?:\s+DO)?)?$");

/// Terminator of every loop form.
pub const LOOP_TERMINATOR: &str = ")";
/// Terminator of a conditional chain.
pub const CHAIN_TERMINATOR: &str = "END";

// ── Lines ─────────────────────────────────────────────────────────────────────

/// One trimmed script line with its 1-based source line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub text: String,
}

impl Line {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Line {
            number,
            text: text.into(),
        }
    }
}

/// Split a script into trimmed, numbered lines.  Blank lines are kept so
/// that numbering matches the source.
pub fn load_lines(src: &str) -> Vec<Line> {
    src.lines()
        .enumerate()
        .map(|(i, text)| Line::new(i + 1, text.trim()))
        .collect()
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("{opener} block opened at line {line} is never closed with `{terminator}`")]
    UnterminatedBlock {
        line: usize,
        opener: &'static str,
        terminator: &'static str,
    },
    #[error("IF at line {line} is nested directly inside the IF opened at line {outer}")]
    NestedConditional { line: usize, outer: usize },
}

impl StructuralError {
    /// The script line the fault is reported against.
    pub fn line(&self) -> usize {
        match self {
            StructuralError::UnterminatedBlock { line, .. }
            | StructuralError::NestedConditional { line, .. } => *line,
        }
    }
}

// ── Classification ────────────────────────────────────────────────────────────

/// A line that opens a control construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opener {
    If { condition: String },
    Loop { count: String },
    While { condition: String },
    For {
        var: String,
        from: String,
        to: String,
        step: Option<String>,
    },
}

impl Opener {
    pub fn keyword(&self) -> &'static str {
        match self {
            Opener::If { .. } => "IF",
            Opener::Loop { .. } => "LOOP",
            Opener::While { .. } => "WHILE",
            Opener::For { .. } => "FOR",
        }
    }

    pub fn terminator(&self) -> &'static str {
        match self {
            Opener::If { .. } => CHAIN_TERMINATOR,
            _ => LOOP_TERMINATOR,
        }
    }

    fn is_conditional(&self) -> bool {
        matches!(self, Opener::If { .. })
    }
}

/// Recognise a control-construct opener.
pub fn classify(text: &str) -> Option<Opener> {
    if let Some(caps) = IF_OPENER.captures(text) {
        return Some(Opener::If {
            condition: group(&caps, 1).to_owned(),
        });
    }
    if let Some(caps) = LOOP_OPENER.captures(text) {
        return Some(Opener::Loop {
            count: group(&caps, 1).to_owned(),
        });
    }
    if let Some(caps) = FOR_OPENER.captures(text) {
        return Some(Opener::For {
            var: group(&caps, 1).to_owned(),
            from: group(&caps, 2).to_owned(),
            to: group(&caps, 3).to_owned(),
            step: caps.get(4).map(|m| m.as_str().to_owned()),
        });
    }
    if let Some(caps) = WHILE_OPENER.captures(text) {
        return Some(Opener::While {
            condition: group(&caps, 1).to_owned(),
        });
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Marker {
    ElseIf(String),
    Else,
    End,
}

fn marker(text: &str) -> Option<Marker> {
    if text.eq_ignore_ascii_case("ELSE") {
        return Some(Marker::Else);
    }
    if text.eq_ignore_ascii_case(CHAIN_TERMINATOR) {
        return Some(Marker::End);
    }
    ELSEIF_MARKER
        .captures(text)
        .map(|caps| Marker::ElseIf(group(&caps, 1).to_owned()))
}

// ── Nesting tracker ───────────────────────────────────────────────────────────

/// Open constructs seen while scanning a body, innermost last.
#[derive(Debug, Default)]
struct Nesting {
    open: Vec<(Opener, usize)>,
}

impl Nesting {
    fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    /// Update the stack for one body line.  A terminator that closes the
    /// wrong kind of construct means the innermost one was never closed.
    fn track(&mut self, line: &Line) -> Result<(), StructuralError> {
        if let Some(opener) = classify(&line.text) {
            self.open.push((opener, line.number));
            return Ok(());
        }
        let closes_loop = line.text == LOOP_TERMINATOR;
        let closes_chain = line.text.eq_ignore_ascii_case(CHAIN_TERMINATOR);
        if !closes_loop && !closes_chain {
            return Ok(());
        }
        let Some((inner, at)) = self.open.last() else {
            // Stray terminator at depth 0; the caller decides what it means.
            return Ok(());
        };
        if inner.is_conditional() == closes_chain {
            self.open.pop();
            Ok(())
        } else {
            Err(StructuralError::UnterminatedBlock {
                line: *at,
                opener: inner.keyword(),
                terminator: inner.terminator(),
            })
        }
    }
}

// ── Extraction ────────────────────────────────────────────────────────────────

/// Slice out the body of the construct opened at `lines[*cursor]`.
///
/// On success `*cursor` points just past the terminator.  Running out of
/// lines is [`StructuralError::UnterminatedBlock`] at the opener.
pub fn extract_block(
    lines: &[Line],
    cursor: &mut usize,
    terminator: &'static str,
) -> Result<Vec<Line>, StructuralError> {
    let open = &lines[*cursor];
    let opener = classify(&open.text).map_or("block", |o| o.keyword());
    let mut nesting = Nesting::default();
    let mut body = Vec::new();

    for (i, line) in lines.iter().enumerate().skip(*cursor + 1) {
        if nesting.is_empty() && line.text.eq_ignore_ascii_case(terminator) {
            tracing::trace!(opener, from = open.number, to = line.number, "extracted block");
            *cursor = i + 1;
            return Ok(body);
        }
        nesting.track(line)?;
        body.push(line.clone());
    }

    Err(StructuralError::UnterminatedBlock {
        line: open.number,
        opener,
        terminator,
    })
}

/// Branch guard of a conditional chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    When(String),
    Always,
}

/// One `IF` / `ELSEIF` / `ELSE` arm with its body lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub guard: Guard,
    pub line: usize,
    pub body: Vec<Line>,
}

/// Split the chain opened at `lines[*cursor]` into its branches.
///
/// On success `*cursor` points just past `END`.
pub fn extract_chain(lines: &[Line], cursor: &mut usize) -> Result<Vec<Branch>, StructuralError> {
    let open = &lines[*cursor];
    let condition = match classify(&open.text) {
        Some(Opener::If { condition }) => condition,
        _ => String::new(),
    };
    let mut branches = vec![Branch {
        guard: Guard::When(condition),
        line: open.number,
        body: Vec::new(),
    }];
    let mut nesting = Nesting::default();

    for (i, line) in lines.iter().enumerate().skip(*cursor + 1) {
        if nesting.is_empty() {
            match marker(&line.text) {
                Some(Marker::End) => {
                    tracing::trace!(
                        from = open.number,
                        to = line.number,
                        branches = branches.len(),
                        "extracted chain"
                    );
                    *cursor = i + 1;
                    return Ok(branches);
                }
                Some(Marker::ElseIf(condition)) => {
                    branches.push(Branch {
                        guard: Guard::When(condition),
                        line: line.number,
                        body: Vec::new(),
                    });
                    continue;
                }
                Some(Marker::Else) => {
                    branches.push(Branch {
                        guard: Guard::Always,
                        line: line.number,
                        body: Vec::new(),
                    });
                    continue;
                }
                None => {}
            }
            if classify(&line.text).is_some_and(|o| o.is_conditional()) {
                return Err(StructuralError::NestedConditional {
                    line: line.number,
                    outer: open.number,
                });
            }
        }
        nesting.track(line)?;
        if let Some(branch) = branches.last_mut() {
            branch.body.push(line.clone());
        }
    }

    Err(StructuralError::UnterminatedBlock {
        line: open.number,
        opener: "IF",
        terminator: CHAIN_TERMINATOR,
    })
}

/// Check the structure of a whole line sequence without running anything.
pub fn validate(lines: &[Line]) -> Result<(), StructuralError> {
    let mut cursor = 0;
    while cursor < lines.len() {
        match classify(&lines[cursor].text) {
            Some(Opener::If { .. }) => {
                for branch in extract_chain(lines, &mut cursor)? {
                    validate(&branch.body)?;
                }
            }
            Some(opener) => {
                let body = extract_block(lines, &mut cursor, opener.terminator())?;
                validate(&body)?;
            }
            None => cursor += 1,
        }
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[Line]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn load_trims_and_numbers() {
        let lines = load_lines("  PRINT a  \n\n\tPRINT b");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], Line::new(1, "PRINT a"));
        assert_eq!(lines[1], Line::new(2, ""));
        assert_eq!(lines[2], Line::new(3, "PRINT b"));
    }

    #[test]
    fn classify_openers() {
        assert_eq!(
            classify("if x > 1 then do"),
            Some(Opener::If { condition: "x > 1".into() })
        );
        assert_eq!(classify("LOOP 3 ("), Some(Opener::Loop { count: "3".into() }));
        assert_eq!(classify("LOOP 3("), Some(Opener::Loop { count: "3".into() }));
        assert_eq!(
            classify("WHILE (n < 5) ("),
            Some(Opener::While { condition: "(n < 5)".into() })
        );
        assert_eq!(
            classify("FOR i FROM 10 TO 1 STEP -2 ("),
            Some(Opener::For {
                var: "i".into(),
                from: "10".into(),
                to: "1".into(),
                step: Some("-2".into()),
            })
        );
        assert_eq!(classify("PRINT LOOP 3 ("), None);
        assert_eq!(classify("IF x"), None);
    }

    #[test]
    fn elseif_spellings() {
        for text in ["ELSEIF x", "ELSE IF x", "ELSE;IF x", "elseif x THEN DO", "ELSE IF x then"] {
            assert_eq!(marker(text), Some(Marker::ElseIf("x".into())), "{text}");
        }
        assert_eq!(marker("else"), Some(Marker::Else));
        assert_eq!(marker("End"), Some(Marker::End));
        assert_eq!(marker("ELSEWHERE"), None);
    }

    #[test]
    fn extract_simple_loop() {
        let lines = load_lines("LOOP 2 (\nPRINT a\n)\nPRINT after");
        let mut cursor = 0;
        let body = extract_block(&lines, &mut cursor, LOOP_TERMINATOR).unwrap();
        assert_eq!(texts(&body), vec!["PRINT a"]);
        assert_eq!(cursor, 3);
    }

    #[test]
    fn extract_nested_loops() {
        let src = "LOOP 2 (\nLOOP 3 (\nPRINT x\n)\nPRINT y\n)\nPRINT z";
        let lines = load_lines(src);
        let mut cursor = 0;
        let body = extract_block(&lines, &mut cursor, LOOP_TERMINATOR).unwrap();
        assert_eq!(texts(&body), vec!["LOOP 3 (", "PRINT x", ")", "PRINT y"]);
        assert_eq!(cursor, 6);
    }

    #[test]
    fn loop_may_contain_chain() {
        let src = "WHILE x < 3 (\nIF x == 1 THEN DO\nPRINT one\nELSE\nPRINT other\nEND\nINC x\n)";
        let lines = load_lines(src);
        let mut cursor = 0;
        let body = extract_block(&lines, &mut cursor, LOOP_TERMINATOR).unwrap();
        assert_eq!(body.len(), 6);
        assert_eq!(cursor, lines.len());
    }

    #[test]
    fn unterminated_loop() {
        let lines = load_lines("PRINT a\nLOOP 2 (\nPRINT b");
        let mut cursor = 1;
        assert_eq!(
            extract_block(&lines, &mut cursor, LOOP_TERMINATOR),
            Err(StructuralError::UnterminatedBlock {
                line: 2,
                opener: "LOOP",
                terminator: ")",
            })
        );
    }

    #[test]
    fn mismatched_terminator_blames_inner_opener() {
        // The IF inside the loop is closed by `)` instead of END.
        let lines = load_lines("LOOP 2 (\nIF 1 THEN DO\nPRINT a\n)\n");
        let mut cursor = 0;
        let err = extract_block(&lines, &mut cursor, LOOP_TERMINATOR).unwrap_err();
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn chain_branches() {
        let src = "IF a THEN DO\nPRINT 1\nELSEIF b\nPRINT 2\nELSE\nPRINT 3\nEND\nPRINT after";
        let lines = load_lines(src);
        let mut cursor = 0;
        let branches = extract_chain(&lines, &mut cursor).unwrap();
        assert_eq!(branches.len(), 3);
        assert_eq!(branches[0].guard, Guard::When("a".into()));
        assert_eq!(branches[1].guard, Guard::When("b".into()));
        assert_eq!(branches[1].line, 3);
        assert_eq!(branches[2].guard, Guard::Always);
        assert_eq!(texts(&branches[2].body), vec!["PRINT 3"]);
        assert_eq!(cursor, 7);
    }

    #[test]
    fn chain_with_loop_holding_chain() {
        let src = "IF a THEN DO\nLOOP 2 (\nIF b THEN DO\nPRINT x\nELSE\nPRINT y\nEND\n)\nELSE\nPRINT z\nEND";
        let lines = load_lines(src);
        let mut cursor = 0;
        let branches = extract_chain(&lines, &mut cursor).unwrap();
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].body.len(), 7);
        assert_eq!(texts(&branches[1].body), vec!["PRINT z"]);
    }

    #[test]
    fn nested_conditional_rejected() {
        let src = "IF a THEN DO\nIF b THEN DO\nPRINT x\nEND\nEND";
        let lines = load_lines(src);
        let mut cursor = 0;
        assert_eq!(
            extract_chain(&lines, &mut cursor),
            Err(StructuralError::NestedConditional { line: 2, outer: 1 })
        );
    }

    #[test]
    fn unterminated_chain_reports_if_line() {
        let lines = load_lines("PRINT a\nIF x THEN DO\nPRINT b");
        let mut cursor = 1;
        let err = extract_chain(&lines, &mut cursor).unwrap_err();
        assert_eq!(
            err,
            StructuralError::UnterminatedBlock {
                line: 2,
                opener: "IF",
                terminator: "END",
            }
        );
    }

    #[test]
    fn validate_finds_faults_deep_inside() {
        let ok = load_lines("LOOP 2 (\nFOR i FROM 1 TO 2 (\nPRINT i\n)\n)");
        assert_eq!(validate(&ok), Ok(()));

        let nested = load_lines("LOOP 2 (\nIF a THEN DO\nIF b THEN DO\nEND\nEND\n)");
        assert_eq!(
            validate(&nested),
            Err(StructuralError::NestedConditional { line: 3, outer: 2 })
        );
    }

    #[test]
    fn stray_terminators_are_ordinary_lines() {
        let lines = load_lines(")\nEND\nPRINT a");
        assert_eq!(validate(&lines), Ok(()));
    }
}
