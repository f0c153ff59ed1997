//! The three error tiers: internal dispatch signals and the language-level
//! `Exception` that `try`/`catch` can observe.

use crate::position::Position;
use crate::value::Data;

/// A single call-chain frame recorded when an exception is raised,
/// cheapest innermost first.
#[derive(Debug, Clone)]
pub struct StackFrame {
    pub position: Position,
}

/// A language-visible exception: a value, the position it was raised at,
/// and the call chain active at that point.
#[derive(Debug, Clone)]
pub struct Exception {
    pub value: Data,
    pub position: Position,
    pub stack: Vec<StackFrame>,
}

/// Internal evaluator signals. `FunctionArgumentsError` and `NotAnLValue`
/// never reach user code directly: overload resolution turns a string of
/// `FunctionArgumentsError`s into a user-visible `NotAFunction` /
/// `IncorrectFunctionArguments` Exception once every overload has failed.
#[derive(Debug, Clone)]
pub enum RunError {
    FunctionArgumentsError,
    NotAnLValue,
    RecursionLimitExceeded,
    Exception(Exception),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::FunctionArgumentsError => write!(f, "function arguments did not match any overload"),
            RunError::NotAnLValue => write!(f, "cannot assign into a value with no place"),
            RunError::RecursionLimitExceeded => write!(f, "recursion limit exceeded"),
            RunError::Exception(exc) => write!(f, "unhandled exception at {}", exc.position),
        }
    }
}
