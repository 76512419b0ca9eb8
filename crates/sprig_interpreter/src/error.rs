use thiserror::Error;

use sprig_parser::token::Token;

/// Failures raised while evaluating a program.
///
/// These travel through evaluation as [`Object::Error`](crate::object::Object::Error)
/// values, never as panics.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum RuntimeError {
    /// When referencing an identifier that does not exist/has not been defined
    #[error("identifier not found: {0}")]
    IdentifierNotFound(String),
    /// When the operands of an infix operation have different types (e.g. `5 + true`)
    #[error("type mismatch: {left} {operator} {right}")]
    TypeMismatch {
        left: &'static str,
        operator: Token,
        right: &'static str,
    },
    /// When a prefix operator does not support its operand (e.g. `-true`)
    #[error("unknown operator: {operator}{right}")]
    UnknownPrefixOperator {
        operator: Token,
        right: &'static str,
    },
    /// When an infix operator does not support its operands (e.g. `"a" - "b"`)
    #[error("unknown operator: {left} {operator} {right}")]
    UnknownInfixOperator {
        left: &'static str,
        operator: Token,
        right: &'static str,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    IntegerOverflow,
    /// When an object that is not a function is used with function call syntax
    #[error("not a function: {0}")]
    NotAFunction(&'static str),
    /// When a call's argument count does not match what the callee expects
    #[error("wrong number of arguments: expected {expected}, got {got}")]
    BadArity { expected: usize, got: usize },
    /// When a builtin receives an argument of an unsupported type
    #[error("argument to `{builtin}` not supported, got {got}")]
    InvalidArgumentType {
        builtin: &'static str,
        got: &'static str,
    },
    /// When a hash key is not an integer, boolean or string
    #[error("unusable as hash key: {0}")]
    UnusableAsHashKey(&'static str),
    /// When attempting to index an object that does not support it (e.g. `1[0]`)
    #[error("index operator not supported: {0}")]
    IndexNotSupported(&'static str),
    /// When indexing an array with something other than an integer (e.g. `[1, 2][true]`)
    #[error("index operator not supported: {left}[{index}]")]
    InvalidIndexOperandType {
        left: &'static str,
        index: &'static str,
    },
    #[error("maximum call depth of {0} exceeded")]
    CallDepthExceeded(usize),
    /// When a builtin fails to write to the output sink
    #[error("could not write output: {0}")]
    Output(String),
}
