//! Expression Evaluator - the arithmetic engine behind every mode
//!
//! `Evaluator` is the capability the calculator depends on. `CalcEngine`
//! implements it on top of evalexpr with:
//! - Arithmetic: +, -, *, /, %, ^
//! - Comparison and logic: <, >, <=, >=, ==, !=, &&, ||, !
//! - Assignment and chaining: `a = 3; a * 2`
//! - Built-in functions: sin, cos, sqrt, ln, log, factorial, ... (see `builtin_functions`)
//! - Constants: `pi`, `e`

use crate::builtin_functions;
use crate::error::{CalcError, Result};
use crate::format::format_number;
use evalexpr::{Context, ContextWithMutableVariables, HashMapContext};
use std::fmt;
use tracing::debug;

/// Result of evaluating an expression or statement
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Boolean(bool),
    Text(String),
    List(Vec<Value>),
    /// Statement without a result (e.g. an assignment)
    Empty,
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Render the value with `precision` significant digits for numbers
    pub fn format(&self, precision: usize) -> String {
        match self {
            Self::Number(n) => format_number(*n, precision),
            Self::Boolean(b) => b.to_string(),
            Self::Text(s) => s.clone(),
            Self::List(items) => {
                let inner: Vec<String> = items.iter().map(|v| v.format(precision)).collect();
                format!("[{}]", inner.join(", "))
            },
            Self::Empty => String::new(),
        }
    }

    fn from_evalexpr(value: evalexpr::Value) -> Result<Self> {
        let value = match value {
            evalexpr::Value::Float(f) => Self::Number(f),
            evalexpr::Value::Int(i) => Self::Number(i as f64),
            evalexpr::Value::Boolean(b) => Self::Boolean(b),
            evalexpr::Value::String(s) => Self::Text(s),
            evalexpr::Value::Tuple(items) => Self::List(
                items
                    .into_iter()
                    .map(Self::from_evalexpr)
                    .collect::<Result<Vec<_>>>()?,
            ),
            evalexpr::Value::Empty => Self::Empty,
        };
        if let Self::Number(n) = value {
            if !n.is_finite() {
                return Err(CalcError::NotFinite);
            }
        }
        Ok(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(crate::format::DISPLAY_PRECISION))
    }
}

/// Expression evaluation capability
///
/// Any numeric engine that can evaluate text against an optional variable
/// scope can drive the calculator.
pub trait Evaluator: Send + Sync {
    /// Variable scope shared by the statements of one formula script run
    type Scope;

    /// Create a fresh scope with the built-in constants defined
    fn new_scope(&self) -> Self::Scope;

    /// Evaluate an expression or statement
    ///
    /// Without a scope the text is evaluated in a throw-away one. With a
    /// scope, the scope only changes if evaluation succeeds.
    fn evaluate(&self, text: &str, scope: Option<&mut Self::Scope>) -> Result<Value>;

    /// Format a value for display
    fn format(&self, value: &Value, precision: usize) -> String {
        value.format(precision)
    }
}

/// Variable scope backed by an evalexpr context
#[derive(Debug, Clone)]
pub struct Scope {
    context: HashMapContext,
}

impl Scope {
    /// Look up a variable
    pub fn get(&self, name: &str) -> Option<Value> {
        self.context
            .get_value(name)
            .cloned()
            .and_then(|v| Value::from_evalexpr(v).ok())
    }
}

/// CalcEngine - evalexpr-backed expression evaluator
///
/// # Example
/// ```
/// use smartcalc_core::{CalcEngine, Evaluator, Value};
///
/// let engine = CalcEngine::new().unwrap();
/// assert_eq!(engine.evaluate("7 + 5", None).unwrap(), Value::Number(12.0));
///
/// let mut scope = engine.new_scope();
/// engine.evaluate("r = 2", Some(&mut scope)).unwrap();
/// let area = engine.evaluate("pi * r^2", Some(&mut scope)).unwrap();
/// assert_eq!(engine.format(&area, 10), "12.56637061");
/// ```
#[derive(Debug, Clone)]
pub struct CalcEngine {
    /// Context with built-in functions and constants, cloned per evaluation
    base: HashMapContext,
}

impl CalcEngine {
    /// Create new CalcEngine
    pub fn new() -> Result<Self> {
        let mut base = HashMapContext::new();
        builtin_functions::register(&mut base)?;

        base.set_value("pi".to_string(), evalexpr::Value::Float(std::f64::consts::PI))
            .map_err(|e| CalcError::expression(format!("Failed to set pi: {}", e)))?;
        base.set_value("e".to_string(), evalexpr::Value::Float(std::f64::consts::E))
            .map_err(|e| CalcError::expression(format!("Failed to set e: {}", e)))?;

        Ok(Self { base })
    }
}

impl Evaluator for CalcEngine {
    type Scope = Scope;

    fn new_scope(&self) -> Scope {
        Scope {
            context: self.base.clone(),
        }
    }

    fn evaluate(&self, text: &str, scope: Option<&mut Scope>) -> Result<Value> {
        let source = widen_integer_literals(text.trim());
        if source.is_empty() {
            return Err(CalcError::expression("Empty expression"));
        }

        let result = match scope {
            Some(scope) => {
                // Evaluate against a staged copy so a failing statement
                // leaves the scope untouched
                let mut staged = scope.context.clone();
                let value = evalexpr::eval_with_context_mut(&source, &mut staged)?;
                let value = Value::from_evalexpr(value)?;
                scope.context = staged;
                value
            },
            None => {
                let mut context = self.base.clone();
                let value = evalexpr::eval_with_context_mut(&source, &mut context)?;
                Value::from_evalexpr(value)?
            },
        };

        debug!(expression = text, result = %result, "evaluate");
        Ok(result)
    }
}

/// Replace display-only glyphs with the evaluator's operator and constant names
///
/// Juxtaposed operands multiply, so `2π` reads as `2*pi`. An exponent such
/// as `2e-4` stays a number.
pub fn normalize_display(expression: &str) -> String {
    let chars: Vec<char> = expression.chars().collect();
    let mut out = String::with_capacity(expression.len() + 8);
    let mut run = Run::Other;
    // last character closed an operand: `)` or a constant glyph
    let mut closed = false;

    for (i, &c) in chars.iter().enumerate() {
        let follows_operand = run == Run::Number || closed;
        match c {
            '×' => out.push('*'),
            '÷' => out.push('/'),
            '−' => out.push('-'),
            'π' => {
                if follows_operand {
                    out.push('*');
                }
                out.push_str("pi");
                run = Run::Other;
                closed = true;
                continue;
            },
            '(' => {
                if follows_operand {
                    out.push('*');
                }
                out.push(c);
            },
            ')' => {
                out.push(c);
                run = Run::Other;
                closed = true;
                continue;
            },
            c if c.is_ascii_digit() || c == '.' => {
                if closed {
                    out.push('*');
                }
                if run != Run::Ident {
                    run = Run::Number;
                }
                out.push(c);
                closed = false;
                continue;
            },
            c if c.is_alphabetic() || c == '_' => {
                if run == Run::Number && exponent_follows(&chars, i) {
                    out.push(c);
                    run = Run::Exponent;
                } else {
                    if run != Run::Ident && follows_operand {
                        out.push('*');
                    }
                    out.push(c);
                    run = Run::Ident;
                }
                closed = false;
                continue;
            },
            c => out.push(c),
        }
        // the sign right after an exponent marker belongs to the number
        run = if run == Run::Exponent && matches!(c, '+' | '-' | '−') {
            Run::Number
        } else {
            Run::Other
        };
        closed = false;
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Run {
    Other,
    Number,
    Exponent,
    Ident,
}

/// `chars[at]` is `e`/`E` followed by an optionally signed digit
fn exponent_follows(chars: &[char], at: usize) -> bool {
    if !matches!(chars[at], 'e' | 'E') {
        return false;
    }
    let mut next = at + 1;
    if matches!(chars.get(next), Some('+' | '-' | '−')) {
        next += 1;
    }
    chars.get(next).is_some_and(|c| c.is_ascii_digit())
}

/// Rewrite numeric literals as plain float literals so `/` never truncates
///
/// Integers gain `.0`. Exponent literals such as `2e-4` or `3e+5`, which the
/// result formatter produces, are expanded to decimal form as one token.
fn widen_integer_literals(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if !(c.is_alphanumeric() || c == '_' || c == '.') {
            out.push(c);
            i += 1;
            continue;
        }

        let start = i;
        if c.is_ascii_digit() || c == '.' {
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            if i < chars.len() && exponent_follows(&chars, i) {
                i += 1;
                if matches!(chars[i], '+' | '-') {
                    i += 1;
                }
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
        }
        // anything still word-like makes the whole token an identifier
        while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.')
        {
            i += 1;
        }

        let token: String = chars[start..i].iter().collect();
        out.push_str(&float_literal(&token));
    }
    out
}

fn float_literal(token: &str) -> String {
    if token.chars().all(|c| c.is_ascii_digit()) {
        return format!("{}.0", token);
    }
    let is_exponent = token.contains(['e', 'E'])
        && token.starts_with(|c: char| c.is_ascii_digit() || c == '.');
    match token.parse::<f64>() {
        Ok(value) if is_exponent && value.is_finite() => {
            let decimal = value.to_string();
            if decimal.contains('.') {
                decimal
            } else {
                format!("{}.0", decimal)
            }
        },
        _ => token.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
#[allow(clippy::approx_constant)]
mod tests {
    use super::*;

    fn create_engine() -> CalcEngine {
        CalcEngine::new().unwrap()
    }

    #[test]
    fn test_basic_arithmetic() {
        let engine = create_engine();

        assert_eq!(engine.evaluate("7 + 5", None).unwrap(), Value::Number(12.0));
        assert_eq!(engine.evaluate("10 - 4", None).unwrap(), Value::Number(6.0));
        assert_eq!(engine.evaluate("6 * 7", None).unwrap(), Value::Number(42.0));
        assert_eq!(engine.evaluate("2 ^ 10", None).unwrap(), Value::Number(1024.0));
        assert_eq!(engine.evaluate("10 % 3", None).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_division_is_not_truncated() {
        let engine = create_engine();
        let value = engine.evaluate("1 / 3", None).unwrap();
        assert_eq!(engine.format(&value, 10), "0.3333333333");
    }

    #[test]
    fn test_operator_precedence() {
        let engine = create_engine();

        assert_eq!(engine.evaluate("2 + 3 * 4", None).unwrap(), Value::Number(14.0));
        assert_eq!(engine.evaluate("(2 + 3) * 4", None).unwrap(), Value::Number(20.0));
    }

    #[test]
    fn test_constants_and_functions() {
        let engine = create_engine();

        let value = engine.evaluate("sqrt(3^2 + 4^2)", None).unwrap();
        assert_eq!(value, Value::Number(5.0));

        let value = engine.evaluate("cos(pi)", None).unwrap();
        assert_eq!(value, Value::Number(-1.0));

        let value = engine.evaluate("ln(e)", None).unwrap();
        assert_eq!(engine.format(&value, 10), "1");
    }

    #[test]
    fn test_syntax_error() {
        let engine = create_engine();
        assert!(engine.evaluate("2 +* 2", None).is_err());
        assert!(engine.evaluate("", None).is_err());
        assert!(engine.evaluate("undefined_var + 1", None).is_err());
    }

    #[test]
    fn test_non_finite_is_error() {
        let engine = create_engine();
        assert!(matches!(
            engine.evaluate("1 / 0", None),
            Err(CalcError::NotFinite)
        ));
    }

    #[test]
    fn test_domain_error_inside_expression() {
        let engine = create_engine();
        let err = engine.evaluate("ln(0)", None).unwrap_err();
        assert!(err.to_string().contains("not positive"));
    }

    #[test]
    fn test_scope_keeps_assignments() {
        let engine = create_engine();
        let mut scope = engine.new_scope();

        assert_eq!(
            engine.evaluate("a = 3", Some(&mut scope)).unwrap(),
            Value::Empty
        );
        assert_eq!(
            engine.evaluate("a * 2", Some(&mut scope)).unwrap(),
            Value::Number(6.0)
        );
        assert_eq!(scope.get("a"), Some(Value::Number(3.0)));
    }

    #[test]
    fn test_failed_statement_leaves_scope_untouched() {
        let engine = create_engine();
        let mut scope = engine.new_scope();

        engine.evaluate("a = 1", Some(&mut scope)).unwrap();
        assert!(engine
            .evaluate("a = 5; b = missing", Some(&mut scope))
            .is_err());

        assert_eq!(scope.get("a"), Some(Value::Number(1.0)));
        assert_eq!(scope.get("b"), None);
    }

    #[test]
    fn test_unscoped_evaluation_does_not_leak() {
        let engine = create_engine();
        engine.evaluate("x = 4", None).unwrap();
        assert!(engine.evaluate("x", None).is_err());
    }

    #[test]
    fn test_normalize_display() {
        assert_eq!(normalize_display("2 × π ÷ 4"), "2 * pi / 4");
        assert_eq!(normalize_display("5 − 1"), "5 - 1");
    }

    #[test]
    fn test_normalize_display_implicit_multiplication() {
        assert_eq!(normalize_display("2π"), "2*pi");
        assert_eq!(normalize_display("ππ"), "pi*pi");
        assert_eq!(normalize_display("3(1+1)"), "3*(1+1)");
        assert_eq!(normalize_display("(1+1)(2)"), "(1+1)*(2)");
        assert_eq!(normalize_display("2e"), "2*e");
        assert_eq!(normalize_display("π2"), "pi*2");

        // exponents, function calls and identifiers are left alone
        assert_eq!(normalize_display("2e-4 + 1"), "2e-4 + 1");
        assert_eq!(normalize_display("3e+5"), "3e+5");
        assert_eq!(normalize_display("sqrt(16)"), "sqrt(16)");
        assert_eq!(normalize_display("log2(8)"), "log2(8)");
    }

    #[test]
    fn test_implicit_multiplication_evaluates() {
        let engine = create_engine();
        let value = engine.evaluate(&normalize_display("2π"), None).unwrap();
        assert_eq!(engine.format(&value, 10), "6.283185307");

        let value = engine.evaluate(&normalize_display("3(1+1)"), None).unwrap();
        assert_eq!(value, Value::Number(6.0));
    }

    #[test]
    fn test_widen_integer_literals() {
        assert_eq!(widen_integer_literals("1 / 3"), "1.0 / 3.0");
        assert_eq!(widen_integer_literals("1.5+x2"), "1.5+x2");
        assert_eq!(widen_integer_literals("sqrt(16)"), "sqrt(16.0)");
        assert_eq!(widen_integer_literals("2e3"), "2000.0");
        assert_eq!(widen_integer_literals("2e-4 + 1"), "0.0002 + 1.0");
        assert_eq!(widen_integer_literals("3e+5*2"), "300000.0*2.0");
        assert_eq!(widen_integer_literals("2 * e"), "2.0 * e");
    }

    #[test]
    fn test_formatted_exponent_evaluates_again() {
        let engine = create_engine();

        let small = engine.evaluate("1 / 5000", None).unwrap();
        let shown = engine.format(&small, 10);
        assert_eq!(shown, "2e-4");
        let next = engine.evaluate(&format!("{} + 1", shown), None).unwrap();
        assert_eq!(engine.format(&next, 10), "1.0002");

        let large = engine.evaluate("100000 * 3", None).unwrap();
        let shown = engine.format(&large, 10);
        assert_eq!(shown, "3e+5");
        let next = engine.evaluate(&format!("{} + 1", shown), None).unwrap();
        assert_eq!(engine.format(&next, 10), "300001");
    }
}
