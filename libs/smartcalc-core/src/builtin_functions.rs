//! Built-in functions for expression evaluation
//!
//! Pure numeric functions shared by the scientific keypad and by
//! expressions/formula scripts. Trig functions work in radians; angle-unit
//! conversion happens in the scientific dispatcher.

use crate::error::{CalcError, Result};
use evalexpr::{ContextWithMutableFunctions, EvalexprError, Function, HashMapContext, Value};

/// Largest n whose factorial is representable as f64.
const MAX_FACTORIAL: f64 = 170.0;

/// Signature shared by all single-argument built-ins
type UnaryFn = fn(f64) -> Result<f64>;

/// Names under which the unary built-ins are registered
pub const UNARY_FUNCTIONS: &[(&str, UnaryFn)] = &[
    ("sin", sin),
    ("cos", cos),
    ("tan", tan),
    ("asin", asin),
    ("acos", acos),
    ("atan", atan),
    ("sinh", sinh),
    ("cosh", cosh),
    ("tanh", tanh),
    ("asinh", asinh),
    ("acosh", acosh),
    ("atanh", atanh),
    ("sqrt", sqrt),
    ("cbrt", cbrt),
    ("abs", abs),
    ("ln", ln),
    ("log", log10),
    ("log2", log2),
    ("exp", exp),
    ("factorial", factorial),
];

// === Trigonometric (radians) ===

pub fn sin(x: f64) -> Result<f64> {
    Ok(x.sin())
}

pub fn cos(x: f64) -> Result<f64> {
    Ok(x.cos())
}

pub fn tan(x: f64) -> Result<f64> {
    Ok(x.tan())
}

pub fn asin(x: f64) -> Result<f64> {
    if !(-1.0..=1.0).contains(&x) {
        return Err(CalcError::domain("asin", format!("{} is outside [-1, 1]", x)));
    }
    Ok(x.asin())
}

pub fn acos(x: f64) -> Result<f64> {
    if !(-1.0..=1.0).contains(&x) {
        return Err(CalcError::domain("acos", format!("{} is outside [-1, 1]", x)));
    }
    Ok(x.acos())
}

pub fn atan(x: f64) -> Result<f64> {
    Ok(x.atan())
}

// === Hyperbolic ===

pub fn sinh(x: f64) -> Result<f64> {
    Ok(x.sinh())
}

pub fn cosh(x: f64) -> Result<f64> {
    Ok(x.cosh())
}

pub fn tanh(x: f64) -> Result<f64> {
    Ok(x.tanh())
}

pub fn asinh(x: f64) -> Result<f64> {
    Ok(x.asinh())
}

pub fn acosh(x: f64) -> Result<f64> {
    if x < 1.0 {
        return Err(CalcError::domain("acosh", format!("{} is below 1", x)));
    }
    Ok(x.acosh())
}

pub fn atanh(x: f64) -> Result<f64> {
    if x.abs() >= 1.0 {
        return Err(CalcError::domain("atanh", format!("{} is outside (-1, 1)", x)));
    }
    Ok(x.atanh())
}

// === Powers, roots and logarithms ===

pub fn sqrt(x: f64) -> Result<f64> {
    if x < 0.0 {
        return Err(CalcError::domain("sqrt", format!("{} is negative", x)));
    }
    Ok(x.sqrt())
}

pub fn cbrt(x: f64) -> Result<f64> {
    Ok(x.cbrt())
}

pub fn exp(x: f64) -> Result<f64> {
    Ok(x.exp())
}

pub fn ln(x: f64) -> Result<f64> {
    if x <= 0.0 {
        return Err(CalcError::domain("ln", format!("{} is not positive", x)));
    }
    Ok(x.ln())
}

pub fn log10(x: f64) -> Result<f64> {
    if x <= 0.0 {
        return Err(CalcError::domain("log", format!("{} is not positive", x)));
    }
    Ok(x.log10())
}

pub fn log2(x: f64) -> Result<f64> {
    if x <= 0.0 {
        return Err(CalcError::domain("log2", format!("{} is not positive", x)));
    }
    Ok(x.log2())
}

// === Misc ===

pub fn abs(x: f64) -> Result<f64> {
    Ok(x.abs())
}

/// n! for non-negative integers
pub fn factorial(n: f64) -> Result<f64> {
    if n < 0.0 {
        return Err(CalcError::domain("factorial", format!("{} is negative", n)));
    }
    if n.fract() != 0.0 {
        return Err(CalcError::domain("factorial", format!("{} is not an integer", n)));
    }
    if n > MAX_FACTORIAL {
        return Err(CalcError::NotFinite);
    }
    Ok((2..=n as u32).fold(1.0, |acc, k| acc * f64::from(k)))
}

/// Register the unary built-ins with an evalexpr context
pub fn register(context: &mut HashMapContext) -> Result<()> {
    for &(name, function) in UNARY_FUNCTIONS {
        context
            .set_function(name.to_string(), unary(function))
            .map_err(|e| CalcError::expression(format!("Failed to register {}: {}", name, e)))?;
    }
    Ok(())
}

fn unary(function: UnaryFn) -> Function {
    Function::new(move |argument: &Value| {
        let x = to_f64(argument)?;
        function(x)
            .map(Value::Float)
            .map_err(|e| EvalexprError::CustomMessage(e.to_string()))
    })
}

/// Convert evalexpr Value to f64 (handles both Int and Float)
fn to_f64(value: &Value) -> std::result::Result<f64, EvalexprError> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Int(i) => Ok(*i as f64),
        _ => Err(EvalexprError::expected_number(value.clone())),
    }
}
