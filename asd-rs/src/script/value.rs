//! Runtime value type for ASD scripts.
//!
//! ASD is dynamically typed.  A variable holds a number, a piece of text, or
//! a list (the lines of a file read with `READFILE`).  Text that looks like a
//! number takes part in arithmetic and comparison as that number; a list never
//! does.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

// ── Errors ────────────────────────────────────────────────────────────────────

/// A list was used where a scalar is required.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("list value used where a number or text is expected")]
pub struct TypeError;

/// Division or modulo with a zero right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("modulo by zero")]
    ModuloByZero,
}

// ── Number ────────────────────────────────────────────────────────────────────

/// The numeric half of [`Value`].
///
/// Integer arithmetic that would overflow is carried out in floating point
/// instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Parse a numeric literal.  Surrounding whitespace is ignored; words such
    /// as `inf` or `nan` are not numbers.
    pub fn parse(s: &str) -> Option<Number> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(n) = s.parse::<i64>() {
            return Some(Number::Int(n));
        }
        if !looks_like_float(s) {
            return None;
        }
        s.parse::<f64>().ok().map(Number::Float)
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(x) => x,
        }
    }

    /// Integer part, truncating toward zero (saturating for huge floats).
    pub fn truncate(self) -> i64 {
        match self {
            Number::Int(n) => n,
            Number::Float(x) => x as i64,
        }
    }

    pub fn is_zero(self) -> bool {
        self.as_f64() == 0.0
    }

    pub fn add(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_add(b)
                .map_or(Number::Float(a as f64 + b as f64), Number::Int),
            _ => Number::Float(self.as_f64() + rhs.as_f64()),
        }
    }

    pub fn sub(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_sub(b)
                .map_or(Number::Float(a as f64 - b as f64), Number::Int),
            _ => Number::Float(self.as_f64() - rhs.as_f64()),
        }
    }

    pub fn mul(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_mul(b)
                .map_or(Number::Float(a as f64 * b as f64), Number::Int),
            _ => Number::Float(self.as_f64() * rhs.as_f64()),
        }
    }

    /// True division: an exact integer quotient stays an integer, anything
    /// else becomes a float.
    pub fn div(self, rhs: Number) -> Result<Number, ArithmeticError> {
        if rhs.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(match (self, rhs) {
            (Number::Int(a), Number::Int(b)) if a.checked_rem(b) == Some(0) => {
                a.checked_div(b)
                    .map_or(Number::Float(a as f64 / b as f64), Number::Int)
            }
            _ => Number::Float(self.as_f64() / rhs.as_f64()),
        })
    }

    /// Truncating integer division, as used by the `DIV` statement.
    pub fn int_div(self, rhs: Number) -> Result<Number, ArithmeticError> {
        let q = self.div(rhs)?;
        Ok(Number::Int(q.truncate()))
    }

    /// Remainder of the integer parts of both operands.
    pub fn rem(self, rhs: Number) -> Result<Number, ArithmeticError> {
        let (a, b) = (self.truncate(), rhs.truncate());
        if b == 0 {
            return Err(ArithmeticError::ModuloByZero);
        }
        // i64::MIN % -1 overflows; the mathematical answer is 0.
        Ok(Number::Int(a.checked_rem(b).unwrap_or(0)))
    }

    pub fn pow(self, rhs: Number) -> Number {
        if let (Number::Int(base), Number::Int(exp)) = (self, rhs) {
            if let Ok(exp) = u32::try_from(exp) {
                if let Some(n) = base.checked_pow(exp) {
                    return Number::Int(n);
                }
            }
        }
        Number::Float(self.as_f64().powf(rhs.as_f64()))
    }

    pub fn neg(self) -> Number {
        match self {
            Number::Int(n) => n.checked_neg().map_or(Number::Float(-(n as f64)), Number::Int),
            Number::Float(x) => Number::Float(-x),
        }
    }

    /// Numeric ordering.  Two integers compare exactly; NaN compares equal to
    /// everything so that ordering stays total.
    pub fn compare(self, rhs: Number) -> Ordering {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => a.cmp(&b),
            _ => self
                .as_f64()
                .partial_cmp(&rhs.as_f64())
                .unwrap_or(Ordering::Equal),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            // Integral floats print without a fractional part: 6.0 → "6".
            Number::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 => {
                write!(f, "{}", *x as i64)
            }
            Number::Float(x) => write!(f, "{x}"),
        }
    }
}

/// Digits with an optional sign, fraction and exponent, and nothing else.
fn looks_like_float(s: &str) -> bool {
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty() {
        return false;
    }
    if !digits(int_part) || !digits(frac_part) {
        return false;
    }
    match exponent {
        None => true,
        Some(e) => {
            let e = e.strip_prefix(['+', '-']).unwrap_or(e);
            !e.is_empty() && digits(e)
        }
    }
}

// ── Value ─────────────────────────────────────────────────────────────────────

/// An ASD runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(Number),
    Text(String),
    List(Vec<Value>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Number(Number::Int(0))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl Value {
    /// Convert a source token: numeric literals become numbers, a quoted
    /// literal becomes its decoded text, anything else is kept as text.
    pub fn parse_literal(token: &str) -> Value {
        let token = token.trim();
        if let Some(text) = unquote(token) {
            return Value::Text(text);
        }
        match Number::parse(token) {
            Some(n) => Value::Number(n),
            None => Value::Text(token.to_owned()),
        }
    }

    /// Coerce to a number.  Non-numeric text counts as zero; a list is an
    /// error.
    pub fn coerce_numeric(&self) -> Result<Number, TypeError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Text(s) => Ok(Number::parse(s).unwrap_or(Number::Int(0))),
            Value::List(_) => Err(TypeError),
        }
    }

    /// The number this value stands for, if it is numeric or numeric-looking.
    pub fn numeric_view(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => Number::parse(s),
            Value::List(_) => None,
        }
    }

    /// Loose comparison: numerically when both sides are numeric-looking,
    /// otherwise as text.
    pub fn loose_cmp(&self, rhs: &Value) -> Result<Ordering, TypeError> {
        if matches!(self, Value::List(_)) || matches!(rhs, Value::List(_)) {
            return Err(TypeError);
        }
        match (self.numeric_view(), rhs.numeric_view()) {
            (Some(a), Some(b)) => Ok(a.compare(b)),
            _ => Ok(self.to_string().cmp(&rhs.to_string())),
        }
    }

    pub fn loose_eq(&self, rhs: &Value) -> Result<bool, TypeError> {
        Ok(self.loose_cmp(rhs)? == Ordering::Equal)
    }

    /// `0`, `0.0`, `""`, `"0"` and the empty list are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => !n.is_zero(),
            Value::Text(s) => !s.is_empty() && s != "0",
            Value::List(items) => !items.is_empty(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::List(_) => "list",
        }
    }
}

/// Decode the character after a backslash in quoted text.  Pairs other
/// than `\n`, `\t`, `\\` and the escaped quotes are kept as written.
pub fn push_escape(out: &mut String, escaped: char) {
    match escaped {
        'n' => out.push('\n'),
        't' => out.push('\t'),
        '\\' | '"' | '\'' => out.push(escaped),
        other => {
            out.push('\\');
            out.push(other);
        }
    }
}

/// The decoded text of a quoted literal such as `"a\tb"` or `'it\'s'`.
/// `None` unless the closing quote is the token's last character.
pub fn unquote(token: &str) -> Option<String> {
    let mut chars = token.chars();
    let quote = chars.next().filter(|&c| c == '"' || c == '\'')?;
    let mut out = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' => push_escape(&mut out, chars.next()?),
            c if c == quote => return chars.next().is_none().then_some(out),
            c => out.push(c),
        }
    }
    None
}

/// `"abc"` or `'abc'` → `abc`, with no escape decoding.
pub fn strip_matching_quotes(token: &str) -> Option<&str> {
    let bytes = token.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return Some(&token[1..token.len() - 1]);
        }
    }
    None
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::Int(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Number(Number::Float(x))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Number(Number::Int(i64::from(b)))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
