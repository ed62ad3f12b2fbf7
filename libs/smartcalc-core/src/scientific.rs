//! Scientific keypad functions
//!
//! A [`ScientificKey`] is what was pressed; the [`ScientificContext`] turns it
//! into a [`ScientificFunction`], which is evaluated through the
//! [`Evaluator`] with angle-unit conversion around the trig functions.

use crate::error::{CalcError, Result};
use crate::evaluator::{Evaluator, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleUnit {
    #[default]
    Degrees,
    Radians,
}

impl AngleUnit {
    pub fn toggled(self) -> Self {
        match self {
            Self::Degrees => Self::Radians,
            Self::Radians => Self::Degrees,
        }
    }
}

impl fmt::Display for AngleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degrees => f.write_str("Deg"),
            Self::Radians => f.write_str("Rad"),
        }
    }
}

/// Angle unit and inverse ("2nd") toggle of the scientific keypad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScientificContext {
    pub angle_unit: AngleUnit,
    pub inverse_active: bool,
}

impl ScientificContext {
    pub fn toggle_angle_unit(&mut self) {
        self.angle_unit = self.angle_unit.toggled();
    }

    pub fn toggle_inverse(&mut self) {
        self.inverse_active = !self.inverse_active;
    }

    /// Resolve a pressed key to the function it currently selects
    pub fn resolve(&self, key: ScientificKey) -> ScientificFunction {
        key.resolve(self.inverse_active)
    }
}

/// Keys of the scientific keypad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScientificKey {
    Sin,
    Cos,
    Tan,
    Sinh,
    Cosh,
    Tanh,
    Log,
    Ln,
    Sqrt,
    Square,
    Cube,
    Factorial,
    Abs,
    Reciprocal,
    PowerOfTen,
    Exp,
}

impl ScientificKey {
    pub const ALL: [ScientificKey; 16] = [
        Self::Sin,
        Self::Cos,
        Self::Tan,
        Self::Sinh,
        Self::Cosh,
        Self::Tanh,
        Self::Log,
        Self::Ln,
        Self::Sqrt,
        Self::Square,
        Self::Cube,
        Self::Factorial,
        Self::Abs,
        Self::Reciprocal,
        Self::PowerOfTen,
        Self::Exp,
    ];

    /// Only the trig and hyperbolic keys have an inverse member
    pub fn resolve(self, inverse: bool) -> ScientificFunction {
        use ScientificFunction as F;
        match (self, inverse) {
            (Self::Sin, false) => F::Sin,
            (Self::Sin, true) => F::Asin,
            (Self::Cos, false) => F::Cos,
            (Self::Cos, true) => F::Acos,
            (Self::Tan, false) => F::Tan,
            (Self::Tan, true) => F::Atan,
            (Self::Sinh, false) => F::Sinh,
            (Self::Sinh, true) => F::Asinh,
            (Self::Cosh, false) => F::Cosh,
            (Self::Cosh, true) => F::Acosh,
            (Self::Tanh, false) => F::Tanh,
            (Self::Tanh, true) => F::Atanh,
            (Self::Log, _) => F::Log,
            (Self::Ln, _) => F::Ln,
            (Self::Sqrt, _) => F::Sqrt,
            (Self::Square, _) => F::Square,
            (Self::Cube, _) => F::Cube,
            (Self::Factorial, _) => F::Factorial,
            (Self::Abs, _) => F::Abs,
            (Self::Reciprocal, _) => F::Reciprocal,
            (Self::PowerOfTen, _) => F::PowerOfTen,
            (Self::Exp, _) => F::Exp,
        }
    }
}

impl FromStr for ScientificKey {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self> {
        let key = match s.trim() {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "log" => Self::Log,
            "ln" => Self::Ln,
            "sqrt" | "√" => Self::Sqrt,
            "x2" | "x²" | "square" => Self::Square,
            "x3" | "x³" | "cube" => Self::Cube,
            "n!" | "fact" | "factorial" => Self::Factorial,
            "abs" => Self::Abs,
            "1/x" | "recip" | "reciprocal" => Self::Reciprocal,
            "10^x" | "10ˣ" | "pow10" => Self::PowerOfTen,
            "exp" | "e^x" | "eˣ" => Self::Exp,
            other => {
                return Err(CalcError::expression(format!(
                    "Unknown scientific key: {}",
                    other
                )))
            },
        };
        Ok(key)
    }
}

/// Functions the dispatcher can apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScientificFunction {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Log,
    Ln,
    Sqrt,
    Square,
    Cube,
    Factorial,
    Abs,
    Reciprocal,
    PowerOfTen,
    Exp,
}

impl ScientificFunction {
    /// Label used in the formula line and in history entries
    pub fn label(self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "sin⁻¹",
            Self::Acos => "cos⁻¹",
            Self::Atan => "tan⁻¹",
            Self::Sinh => "sinh",
            Self::Cosh => "cosh",
            Self::Tanh => "tanh",
            Self::Asinh => "sinh⁻¹",
            Self::Acosh => "cosh⁻¹",
            Self::Atanh => "tanh⁻¹",
            Self::Log => "log",
            Self::Ln => "ln",
            Self::Sqrt => "√",
            Self::Square => "x²",
            Self::Cube => "x³",
            Self::Factorial => "n!",
            Self::Abs => "abs",
            Self::Reciprocal => "1/x",
            Self::PowerOfTen => "10ˣ",
            Self::Exp => "exp",
        }
    }

    fn is_forward_trig(self) -> bool {
        matches!(self, Self::Sin | Self::Cos | Self::Tan)
    }

    fn is_inverse_trig(self) -> bool {
        matches!(self, Self::Asin | Self::Acos | Self::Atan)
    }

    /// Evaluator expression applying the function to `x`
    fn expression(self, x: f64) -> String {
        let name = match self {
            Self::Square => return format!("({})^2", x),
            Self::Cube => return format!("({})^3", x),
            Self::Reciprocal => return format!("1/({})", x),
            Self::PowerOfTen => return format!("10^({})", x),
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Sinh => "sinh",
            Self::Cosh => "cosh",
            Self::Tanh => "tanh",
            Self::Asinh => "asinh",
            Self::Acosh => "acosh",
            Self::Atanh => "atanh",
            Self::Log => "log",
            Self::Ln => "ln",
            Self::Sqrt => "sqrt",
            Self::Factorial => "factorial",
            Self::Abs => "abs",
            Self::Exp => "exp",
        };
        format!("{}({})", name, x)
    }
}

impl fmt::Display for ScientificFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Apply `function` to `value` under `context`
///
/// Forward trig inputs are converted from degrees before evaluation and
/// inverse trig results are converted back to degrees afterwards. Domain
/// violations surface as evaluation errors.
pub fn apply<E: Evaluator>(
    evaluator: &E,
    function: ScientificFunction,
    value: f64,
    context: &ScientificContext,
) -> Result<f64> {
    let degrees = context.angle_unit == AngleUnit::Degrees;
    let input = if degrees && function.is_forward_trig() {
        value.to_radians()
    } else {
        value
    };

    let expression = function.expression(input);
    let result = match evaluator.evaluate(&expression, None)? {
        Value::Number(n) => n,
        other => {
            return Err(CalcError::expression(format!(
                "{} did not produce a number: {}",
                function, other
            )))
        },
    };

    let result = if degrees && function.is_inverse_trig() {
        result.to_degrees()
    } else {
        result
    };
    debug!(function = %function, value, result, "scientific function applied");
    Ok(result)
}
