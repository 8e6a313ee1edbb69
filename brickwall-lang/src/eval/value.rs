//! Defines the values produced by evaluating expressions.

use std::fmt;

use brickwall_common::Scalar;

use crate::ir::ArithOp;

use super::ExecErrorKind;

/// The result of evaluating an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// A 64 bit signed integer.
    Int(i64),
    /// A 64 bit float.
    Float(f64),
}

impl Value {
    /// Converts a decoded primitive into a value.
    pub(crate) fn from_scalar(scalar: Scalar) -> Result<Value, ExecErrorKind> {
        match scalar {
            Scalar::Signed(value) => Ok(Value::Int(value)),
            Scalar::Unsigned(value) => i64::try_from(value)
                .map(Value::Int)
                .map_err(|_| ExecErrorKind::ValueOutOfRange(value)),
            Scalar::Float(value) => Ok(Value::Float(value)),
        }
    }

    /// Returns the value as a float.
    fn to_float(self) -> f64 {
        match self {
            Value::Int(value) => value as f64,
            Value::Float(value) => value,
        }
    }

    /// Applies `op` to both values.
    ///
    /// Integers stay integers unless either side is a float. Integer overflow and division by
    /// zero are errors.
    pub(crate) fn apply(op: ArithOp, lhs: Value, rhs: Value) -> Result<Value, ExecErrorKind> {
        if let (Value::Int(lhs), Value::Int(rhs)) = (lhs, rhs) {
            let result = match op {
                ArithOp::Add => lhs.checked_add(rhs),
                ArithOp::Sub => lhs.checked_sub(rhs),
                ArithOp::Mul => lhs.checked_mul(rhs),
                ArithOp::Div if rhs == 0 => return Err(ExecErrorKind::DivisionByZero),
                ArithOp::Div => lhs.checked_div(rhs),
            };

            return result.map(Value::Int).ok_or(ExecErrorKind::Overflow);
        }

        let (lhs, rhs) = (lhs.to_float(), rhs.to_float());
        Ok(Value::Float(match op {
            ArithOp::Add => lhs + rhs,
            ArithOp::Sub => lhs - rhs,
            ArithOp::Mul => lhs * rhs,
            ArithOp::Div => lhs / rhs,
        }))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn integer_arithmetic_is_checked() {
        assert_eq!(
            Value::apply(ArithOp::Sub, Value::Int(2), Value::Int(5)).unwrap(),
            Value::Int(-3)
        );
        assert_eq!(
            Value::apply(ArithOp::Div, Value::Int(7), Value::Int(2)).unwrap(),
            Value::Int(3)
        );
        assert!(matches!(
            Value::apply(ArithOp::Div, Value::Int(7), Value::Int(0)),
            Err(ExecErrorKind::DivisionByZero)
        ));
        assert!(matches!(
            Value::apply(ArithOp::Mul, Value::Int(i64::MAX), Value::Int(2)),
            Err(ExecErrorKind::Overflow)
        ));
        assert!(matches!(
            Value::apply(ArithOp::Div, Value::Int(i64::MIN), Value::Int(-1)),
            Err(ExecErrorKind::Overflow)
        ));
    }

    #[test]
    fn floats_are_contagious() {
        assert_eq!(
            Value::apply(ArithOp::Mul, Value::Int(3), Value::Float(0.5)).unwrap(),
            Value::Float(1.5)
        );
        assert_eq!(
            Value::apply(ArithOp::Div, Value::Float(1.0), Value::Int(0)).unwrap(),
            Value::Float(f64::INFINITY)
        );
    }

    #[test]
    fn large_unsigned_values_are_rejected() {
        assert_eq!(
            Value::from_scalar(Scalar::Unsigned(7)).unwrap(),
            Value::Int(7)
        );
        assert!(matches!(
            Value::from_scalar(Scalar::Unsigned(u64::MAX)),
            Err(ExecErrorKind::ValueOutOfRange(u64::MAX))
        ));
    }
}
