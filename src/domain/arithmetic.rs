//! Four-function arithmetic shared by the calculator agent and the calculator tool

use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ArithmeticError {
    #[error("Division by zero is not allowed")]
    DivisionByZero,

    #[error("Unsupported operation '{0}'. Use add, subtract, multiply or divide")]
    UnknownOperation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl FromStr for Operation {
    type Err = ArithmeticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add" => Ok(Operation::Add),
            "subtract" => Ok(Operation::Subtract),
            "multiply" => Ok(Operation::Multiply),
            "divide" => Ok(Operation::Divide),
            other => Err(ArithmeticError::UnknownOperation(other.to_string())),
        }
    }
}

impl Operation {
    pub fn apply(self, a: f64, b: f64) -> Result<f64, ArithmeticError> {
        match self {
            Operation::Add => Ok(a + b),
            Operation::Subtract => Ok(a - b),
            Operation::Multiply => Ok(a * b),
            Operation::Divide if b == 0.0 => Err(ArithmeticError::DivisionByZero),
            Operation::Divide => Ok(a / b),
        }
    }
}

/// Parse `operation` and apply it
pub fn calculate(operation: &str, a: f64, b: f64) -> Result<f64, ArithmeticError> {
    operation.parse::<Operation>()?.apply(a, b)
}
