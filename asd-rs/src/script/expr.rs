//! ASD expression lexer, AST, parser, and evaluator.
//!
//! Conditions of `IF`, `ELSEIF` and `WHILE` and the right-hand side of `LET`
//! are parsed into a small AST and evaluated directly against the variable
//! store.  Identifiers are looked up at evaluation time; an undefined
//! identifier is the number `0`.
//!
//! Operator precedence (lowest → highest):
//!   `OR`  →  `AND`  →  comparison  →  additive  →  multiplicative  →
//!   unary (`-`, `NOT`)  →  primary

use thiserror::Error;

use crate::var::VarStore;
use super::value::{push_escape, ArithmeticError, Number, TypeError, Value};

/// Parenthesis and unary-operator nesting accepted before the parser gives up.
const MAX_DEPTH: usize = 64;
/// Operator nodes accepted in one expression.  Bounds the depth of the
/// left-leaning tree that evaluation and drop walk recursively.
const MAX_NODES: usize = 256;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Every way evaluating an expression can fail.  All of them are
/// recoverable: callers turn them into diagnostics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("invalid expression: {0}")]
    Syntax(String),
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

// ── EvalContext ───────────────────────────────────────────────────────────────

/// Variable lookup used by the evaluator.
pub trait EvalContext {
    fn get_var(&self, name: &str) -> Option<&Value>;
}

impl EvalContext for VarStore {
    fn get_var(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Comparison
    Eq, // ==
    Ne, // != or <>
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And, // AND or &&
    Or,  // OR or ||
    Not, // NOT or !

    LParen,
    RParen,
    /// A lone `=`, reported with a hint instead of as an unknown character.
    Assign,
    Unknown(char),
    Eof,
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

struct Lexer {
    src: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Lexer {
            src: src.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<char> {
        self.src.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn take_digits(&mut self, s: &mut String) {
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            s.push(c);
            self.pos += 1;
        }
    }

    fn read_number(&mut self, first: char) -> Result<Token, EvalError> {
        let mut s = String::from(first);
        let mut is_float = first == '.';
        self.take_digits(&mut s);
        // `5.` is a complete float literal, as it is for stored values.
        if !is_float && self.peek() == Some('.') {
            is_float = true;
            s.push('.');
            self.pos += 1;
            self.take_digits(&mut s);
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = self.peek2().filter(|c| matches!(c, '+' | '-'));
            let digit_at = if sign.is_some() { self.pos + 2 } else { self.pos + 1 };
            if self.src.get(digit_at).is_some_and(char::is_ascii_digit) {
                is_float = true;
                s.push('e');
                self.pos += 1;
                if let Some(sign) = sign {
                    s.push(sign);
                    self.pos += 1;
                }
                self.take_digits(&mut s);
            }
        }
        if is_float {
            s.parse()
                .map(Token::Float)
                .map_err(|_| EvalError::Syntax(format!("bad number `{s}`")))
        } else {
            // Integer literals too large for i64 are kept as floats.
            Ok(s.parse()
                .map(Token::Int)
                .unwrap_or_else(|_| Token::Float(s.parse().unwrap_or(f64::MAX))))
        }
    }

    fn read_string(&mut self, quote: char) -> Result<Token, EvalError> {
        let mut s = String::new();
        loop {
            match self.advance() {
                None => return Err(EvalError::Syntax("unterminated string".into())),
                Some('\\') => match self.advance() {
                    Some(c) => push_escape(&mut s, c),
                    None => return Err(EvalError::Syntax("unterminated string".into())),
                },
                Some(c) if c == quote => break,
                Some(c) => s.push(c),
            }
        }
        Ok(Token::Str(s))
    }

    fn read_word(&mut self, first: char) -> Token {
        let mut s = String::from(first);
        while let Some(c) = self.peek().filter(|c| c.is_ascii_alphanumeric() || *c == '_') {
            s.push(c);
            self.pos += 1;
        }
        // Keywords are case-insensitive; identifiers are not.
        match s.to_ascii_uppercase().as_str() {
            "AND" => Token::And,
            "OR" => Token::Or,
            "NOT" => Token::Not,
            "TRUE" => Token::Int(1),
            "FALSE" => Token::Int(0),
            _ => Token::Ident(s),
        }
    }

    fn next_token(&mut self) -> Result<Token, EvalError> {
        self.skip_ws();
        let ch = match self.advance() {
            None => return Ok(Token::Eof),
            Some(c) => c,
        };

        Ok(match ch {
            '0'..='9' => self.read_number(ch)?,
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_number(ch)?,
            '"' | '\'' => self.read_string(ch)?,
            'a'..='z' | 'A'..='Z' | '_' => self.read_word(ch),
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '=' => {
                if self.eat('=') {
                    Token::Eq
                } else {
                    Token::Assign
                }
            }
            '!' => {
                if self.eat('=') {
                    Token::Ne
                } else {
                    Token::Not
                }
            }
            '<' => {
                if self.eat('=') {
                    Token::Le
                } else if self.eat('>') {
                    Token::Ne
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '&' if self.eat('&') => Token::And,
            '|' if self.eat('|') => Token::Or,
            c => Token::Unknown(c),
        })
    }

    fn tokenize(mut self) -> Result<Vec<Token>, EvalError> {
        let mut tokens = Vec::new();
        loop {
            let t = self.next_token()?;
            let done = t == Token::Eof;
            tokens.push(t);
            if done {
                break;
            }
        }
        Ok(tokens)
    }
}

// ── AST ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Var(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

// ── Parser ────────────────────────────────────────────────────────────────────

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    nodes: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
            nodes: 0,
        }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        t
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // ── Grammar ───────────────────────────────────────────────────────────────

    fn parse_condition(&mut self) -> Result<Expr, EvalError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::Or) {
            let rhs = self.parse_and()?;
            lhs = self.binary(BinOp::Or, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_comparison()?;
        while self.eat(&Token::And) {
            let rhs = self.parse_comparison()?;
            lhs = self.binary(BinOp::And, lhs, rhs)?;
        }
        Ok(lhs)
    }

    /// Comparisons do not chain: `1 < 2 < 3` is a syntax error.
    fn parse_comparison(&mut self) -> Result<Expr, EvalError> {
        let lhs = self.parse_additive()?;
        let op = match self.peek() {
            Token::Eq => BinOp::Eq,
            Token::Ne => BinOp::Ne,
            Token::Lt => BinOp::Lt,
            Token::Le => BinOp::Le,
            Token::Gt => BinOp::Gt,
            Token::Ge => BinOp::Ge,
            _ => return Ok(lhs),
        };
        self.pos += 1;
        let rhs = self.parse_additive()?;
        self.binary(op, lhs, rhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = self.binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Rem,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = self.binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Neg,
            Token::Not => UnaryOp::Not,
            Token::Plus => {
                self.pos += 1;
                self.enter()?;
                let inner = self.parse_unary();
                self.depth -= 1;
                return inner;
            }
            _ => return self.parse_primary(),
        };
        self.pos += 1;
        self.enter()?;
        let inner = self.parse_unary();
        self.depth -= 1;
        self.count_node()?;
        Ok(Expr::Unary(op, Box::new(inner?)))
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        match self.advance() {
            Token::Int(n) => Ok(Expr::Literal(Value::from(n))),
            Token::Float(x) => Ok(Expr::Literal(Value::from(x))),
            Token::Str(s) => Ok(Expr::Literal(Value::Text(s))),
            Token::Ident(name) => Ok(Expr::Var(name)),
            Token::LParen => {
                self.enter()?;
                let inner = self.parse_condition();
                self.depth -= 1;
                let inner = inner?;
                if !self.eat(&Token::RParen) {
                    return Err(EvalError::Syntax("expected `)`".into()));
                }
                Ok(inner)
            }
            Token::Assign => Err(EvalError::Syntax("`=` is not a comparison, use `==`".into())),
            Token::Eof => Err(EvalError::Syntax("unexpected end of expression".into())),
            Token::Unknown(c) => Err(EvalError::Syntax(format!("unexpected character `{c}`"))),
            other => Err(EvalError::Syntax(format!("unexpected token {other:?}"))),
        }
    }

    fn binary(&mut self, op: BinOp, lhs: Expr, rhs: Expr) -> Result<Expr, EvalError> {
        self.count_node()?;
        Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))
    }

    fn count_node(&mut self) -> Result<(), EvalError> {
        self.nodes += 1;
        if self.nodes > MAX_NODES {
            return Err(EvalError::Syntax("expression too long".into()));
        }
        Ok(())
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::Syntax("expression nested too deeply".into()));
        }
        Ok(())
    }
}

/// Parse an expression or condition string into an AST.  The whole input
/// must be consumed.
pub fn parse_expr(src: &str) -> Result<Expr, EvalError> {
    let tokens = Lexer::new(src).tokenize()?;
    if tokens.first() == Some(&Token::Eof) {
        return Err(EvalError::Syntax("empty expression".into()));
    }
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_condition()?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        Token::Assign => Err(EvalError::Syntax("`=` is not a comparison, use `==`".into())),
        other => Err(EvalError::Syntax(format!("unexpected token {other:?}"))),
    }
}

// ── Evaluator ─────────────────────────────────────────────────────────────────

/// Evaluate an [`Expr`] AST node against the given context.
pub fn eval_expr(expr: &Expr, ctx: &dyn EvalContext) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),

        Expr::Var(name) => Ok(ctx.get_var(name).cloned().unwrap_or_default()),

        Expr::Unary(op, inner) => {
            let v = eval_expr(inner, ctx)?;
            Ok(match op {
                UnaryOp::Neg => Value::Number(v.coerce_numeric()?.neg()),
                UnaryOp::Not => Value::from(!v.is_truthy()),
            })
        }

        Expr::Binary(op, lhs, rhs) => {
            // Short-circuit for AND and OR
            match op {
                BinOp::And => {
                    let l = eval_expr(lhs, ctx)?;
                    if !l.is_truthy() {
                        return Ok(Value::from(false));
                    }
                    return Ok(Value::from(eval_expr(rhs, ctx)?.is_truthy()));
                }
                BinOp::Or => {
                    let l = eval_expr(lhs, ctx)?;
                    if l.is_truthy() {
                        return Ok(Value::from(true));
                    }
                    return Ok(Value::from(eval_expr(rhs, ctx)?.is_truthy()));
                }
                _ => {}
            }
            let l = eval_expr(lhs, ctx)?;
            let r = eval_expr(rhs, ctx)?;
            eval_binop(*op, &l, &r)
        }
    }
}

fn eval_binop(op: BinOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    use std::cmp::Ordering;

    let compare = |want: fn(Ordering) -> bool| -> Result<Value, EvalError> {
        Ok(Value::from(want(l.loose_cmp(r)?)))
    };

    match op {
        BinOp::Eq => Ok(Value::from(l.loose_eq(r)?)),
        BinOp::Ne => Ok(Value::from(!l.loose_eq(r)?)),
        BinOp::Lt => compare(|o| o == Ordering::Less),
        BinOp::Le => compare(|o| o != Ordering::Greater),
        BinOp::Gt => compare(|o| o == Ordering::Greater),
        BinOp::Ge => compare(|o| o != Ordering::Less),
        BinOp::And | BinOp::Or => unreachable!("short-circuit operators are handled by eval_expr"),
        _ => {
            let (a, b) = (l.coerce_numeric()?, r.coerce_numeric()?);
            let n: Number = match op {
                BinOp::Add => a.add(b),
                BinOp::Sub => a.sub(b),
                BinOp::Mul => a.mul(b),
                BinOp::Div => a.div(b)?,
                BinOp::Rem => a.rem(b)?,
                _ => unreachable!("comparison operators are handled above"),
            };
            Ok(Value::Number(n))
        }
    }
}

/// Parse and evaluate an expression string.
pub fn evaluate(src: &str, ctx: &dyn EvalContext) -> Result<Value, EvalError> {
    let expr = parse_expr(src)?;
    eval_expr(&expr, ctx)
}

/// Parse and evaluate a condition string, reducing the result to a boolean.
pub fn evaluate_condition(src: &str, ctx: &dyn EvalContext) -> Result<bool, EvalError> {
    evaluate(src, ctx).map(|v| v.is_truthy())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str) -> Value {
        evaluate(src, &VarStore::new()).expect("eval failed")
    }

    fn eval_with(src: &str, vars: &VarStore) -> Value {
        evaluate(src, vars).expect("eval failed")
    }

    fn cond(src: &str, vars: &VarStore) -> bool {
        evaluate_condition(src, vars).expect("eval failed")
    }

    #[test]
    fn literals() {
        assert_eq!(eval("42"), Value::from(42));
        assert_eq!(eval("2.5"), Value::from(2.5));
        assert_eq!(eval("\"hello\""), Value::from("hello"));
        assert_eq!(eval("'it\\'s'"), Value::from("it's"));
        assert_eq!(eval("true"), Value::from(1));
        assert_eq!(eval("FALSE"), Value::from(0));
    }

    #[test]
    fn arithmetic() {
        assert_eq!(eval("2 + 3"), Value::from(5));
        assert_eq!(eval("10 - 4"), Value::from(6));
        assert_eq!(eval("3 * 4"), Value::from(12));
        assert_eq!(eval("12 / 4"), Value::from(3));
        assert_eq!(eval("10 / 4"), Value::from(2.5));
        assert_eq!(eval("10 % 3"), Value::from(1));
    }

    #[test]
    fn precedence() {
        assert_eq!(eval("2 + 3 * 4"), Value::from(14));
        assert_eq!(eval("(2 + 3) * 4"), Value::from(20));
        assert_eq!(eval("-2 * 3"), Value::from(-6));
        assert_eq!(eval("-(3 + 2)"), Value::from(-5));
        assert_eq!(eval("1 + 2 > 2 AND 0 OR 1"), Value::from(1));
    }

    #[test]
    fn division_by_zero_is_recoverable() {
        let vars = VarStore::new();
        assert_eq!(
            evaluate("5 / 0", &vars),
            Err(EvalError::Arithmetic(ArithmeticError::DivisionByZero))
        );
        assert_eq!(
            evaluate("5 % 0", &vars),
            Err(EvalError::Arithmetic(ArithmeticError::ModuloByZero))
        );
    }

    #[test]
    fn variables() {
        let mut vars = VarStore::new();
        vars.set("x", 7);
        vars.set("name", "bob");
        assert_eq!(eval_with("x + 1", &vars), Value::from(8));
        assert!(cond("name == \"bob\"", &vars));
        assert!(cond("name != 'alice'", &vars));
    }

    #[test]
    fn undefined_identifier_is_zero() {
        let vars = VarStore::new();
        assert_eq!(eval_with("missing", &vars), Value::from(0));
        assert!(cond("missing == 0", &vars));
        assert!(!cond("missing", &vars));
    }

    #[test]
    fn numeric_text_compares_numerically() {
        let mut vars = VarStore::new();
        vars.set("n", "10");
        assert!(cond("n > 9", &vars));
        assert!(cond("n == 10.0", &vars));
        assert_eq!(eval_with("n * 2", &vars), Value::from(20));
    }

    #[test]
    fn text_compares_lexically() {
        assert!(cond("\"apple\" < \"banana\"", &VarStore::new()));
        assert!(!cond("\"b\" <= \"a\"", &VarStore::new()));
    }

    #[test]
    fn logical_keywords_and_aliases() {
        let vars = VarStore::new();
        assert!(cond("1 and 1", &vars));
        assert!(!cond("1 AND 0", &vars));
        assert!(cond("0 || 1", &vars));
        assert!(cond("NOT 0", &vars));
        assert!(cond("!(1 == 2)", &vars));
        assert!(cond("1 <> 2", &vars));
    }

    #[test]
    fn short_circuit_skips_errors() {
        let vars = VarStore::new();
        assert!(!cond("0 AND 1 / 0", &vars));
        assert!(cond("1 OR 1 / 0", &vars));
    }

    #[test]
    fn lists_are_type_errors() {
        let mut vars = VarStore::new();
        vars.set("lines", Value::List(vec![Value::from("a")]));
        assert_eq!(evaluate("lines + 1", &vars), Err(EvalError::Type(TypeError)));
        assert_eq!(evaluate("lines == 1", &vars), Err(EvalError::Type(TypeError)));
        // A bare list is still usable as a truth value.
        assert!(cond("lines", &vars));
    }

    #[test]
    fn syntax_errors() {
        let vars = VarStore::new();
        for src in ["", "1 +", "(1", "x = 5", "1 < 2 < 3", "\"open", "5 $ 2", "1 2"] {
            assert!(
                matches!(evaluate(src, &vars), Err(EvalError::Syntax(_))),
                "`{src}` should be a syntax error"
            );
        }
    }

    #[test]
    fn long_operator_chains_are_rejected() {
        let vars = VarStore::new();
        for src in [
            vec!["1"; 5_000].join("+"),
            vec!["2"; 5_000].join(" * "),
            vec!["x"; 5_000].join(" AND "),
            format!("{}1", "+".repeat(200_000)),
            format!("{}1", "-".repeat(5_000)),
        ] {
            assert!(matches!(evaluate(&src, &vars), Err(EvalError::Syntax(_))));
        }
    }

    #[test]
    fn moderate_chains_evaluate() {
        assert_eq!(eval(&vec!["1"; 200].join("+")), Value::from(200));
        assert_eq!(eval(&format!("{}7", "+".repeat(40))), Value::from(7));
    }

    #[test]
    fn trailing_dot_is_a_float() {
        assert_eq!(eval("5."), Value::from(5.0));
        assert_eq!(eval("5.e1"), Value::from(50.0));
        assert_eq!(eval("-5. + .5"), Value::from(-4.5));
    }

    #[test]
    fn string_escapes() {
        assert_eq!(eval(r#""a\tb""#), Value::from("a\tb"));
        assert_eq!(eval(r#""x\\y""#), Value::from("x\\y"));
        assert_eq!(eval(r#""C:\data""#), Value::from("C:\\data"));
        assert_eq!(eval(r#"'say "hi"'"#), Value::from("say \"hi\""));
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let src = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        assert!(matches!(evaluate(&src, &VarStore::new()), Err(EvalError::Syntax(_))));
    }

    #[test]
    fn huge_integer_literal_becomes_float() {
        assert!(matches!(eval("99999999999999999999"), Value::Number(Number::Float(_))));
    }
}
