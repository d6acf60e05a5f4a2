//! # Shared Error Types
//!
//! Arithmetic and validation errors used across the workspace, built with
//! `thiserror`. No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! Arithmetic failures are defensive checks: they should never occur under
//! valid preconditions, and when they do they signal a logic or
//! configuration bug rather than a recoverable condition.

use thiserror::Error;

/// Errors from checked monetary and weight arithmetic.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    /// An addition or multiplication exceeded the representable range.
    #[error("arithmetic overflow")]
    Overflow,

    /// A subtraction went below zero.
    #[error("arithmetic underflow")]
    Underflow,

    /// A division by zero was attempted.
    #[error("division by zero")]
    DivisionByZero,
}

/// Validation errors for domain primitive newtypes.
///
/// Each primitive enforces its range at construction time so that invalid
/// values cannot circulate through the engine.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// A per-myriad share exceeded the 10 000 base.
    #[error("per-myriad value {0} exceeds the 10000 base")]
    PermyriadOutOfRange(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_error_display() {
        assert_eq!(format!("{}", ArithmeticError::Overflow), "arithmetic overflow");
        assert_eq!(
            format!("{}", ArithmeticError::Underflow),
            "arithmetic underflow"
        );
        assert_eq!(
            format!("{}", ArithmeticError::DivisionByZero),
            "division by zero"
        );
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError::PermyriadOutOfRange(10_001);
        assert!(format!("{err}").contains("10001"));
    }
}
