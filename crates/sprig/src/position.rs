//! Source locations attached to every token and expression tree node.

use std::fmt;
use std::rc::Rc;

/// A location in a source file: path, 1-based line, 1-based column.
///
/// Kept as a plain value (not interned) since `Rc<str>` already makes the
/// path cheap to clone into every token and tree node without touching the
/// heap arena owned by `GlobalContext`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Position {
    pub path: Rc<str>,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(path: Rc<str>, line: usize, column: usize) -> Self {
        Self { path, line, column }
    }

    /// A position used for synthesized nodes that have no real source
    /// location (e.g. an auto-created empty Tuple). Every tree node needs
    /// a position, but this one should never show up in a stack trace;
    /// `stack_reportable` distinguishes it from a real one.
    pub fn synthetic() -> Self {
        Self { path: Rc::from(""), line: 0, column: 0 }
    }

    pub fn stack_reportable(&self) -> bool {
        self.line != 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.line, self.column)
    }
}
