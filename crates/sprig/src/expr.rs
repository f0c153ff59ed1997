//! The expression tree produced by the parser and walked by the evaluator.

use ahash::AHashSet;

use crate::position::Position;

/// The set of identifier names lexically visible at a tree node.
pub type SymbolSet = AHashSet<String>;

#[derive(Debug, Clone, serde::Serialize)]
pub struct SymbolExpr {
    pub name: String,
    pub escaped: bool,
    pub position: Position,
    pub symbols: SymbolSet,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TupleExpr {
    pub objects: Vec<Expression>,
    pub position: Position,
    pub symbols: SymbolSet,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FunctionCallExpr {
    pub function: Box<Expression>,
    pub arguments: Box<Expression>,
    pub position: Position,
    pub symbols: SymbolSet,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FunctionDefinitionExpr {
    pub parameters: Box<Expression>,
    pub filter: Option<Box<Expression>>,
    pub body: Box<Expression>,
    pub position: Position,
    /// Computed over parameters ∪ filter ∪ body, but not merged into the
    /// parent's set: a function definition is a scope barrier.
    pub symbols: SymbolSet,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PropertyExpr {
    pub object: Box<Expression>,
    pub name: String,
    pub position: Position,
    pub symbols: SymbolSet,
}

/// Five variants, every node carries a source `Position` and a `symbols`
/// set.
#[derive(Debug, Clone, serde::Serialize)]
pub enum Expression {
    Symbol(SymbolExpr),
    Tuple(TupleExpr),
    FunctionCall(FunctionCallExpr),
    FunctionDefinition(FunctionDefinitionExpr),
    Property(PropertyExpr),
}

impl Expression {
    pub fn position(&self) -> &Position {
        match self {
            Expression::Symbol(e) => &e.position,
            Expression::Tuple(e) => &e.position,
            Expression::FunctionCall(e) => &e.position,
            Expression::FunctionDefinition(e) => &e.position,
            Expression::Property(e) => &e.position,
        }
    }

    pub fn symbols(&self) -> &SymbolSet {
        match self {
            Expression::Symbol(e) => &e.symbols,
            Expression::Tuple(e) => &e.symbols,
            Expression::FunctionCall(e) => &e.symbols,
            Expression::FunctionDefinition(e) => &e.symbols,
            Expression::Property(e) => &e.symbols,
        }
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolSet {
        match self {
            Expression::Symbol(e) => &mut e.symbols,
            Expression::Tuple(e) => &mut e.symbols,
            Expression::FunctionCall(e) => &mut e.symbols,
            Expression::FunctionDefinition(e) => &mut e.symbols,
            Expression::Property(e) => &mut e.symbols,
        }
    }

    pub fn empty_tuple(position: Position) -> Self {
        Expression::Tuple(TupleExpr { objects: Vec::new(), position, symbols: SymbolSet::default() })
    }

    pub fn is_empty_tuple(&self) -> bool {
        matches!(self, Expression::Tuple(t) if t.objects.is_empty())
    }

    /// True for a bare identifier symbol (not a literal, not escaped-group).
    pub fn as_plain_name(&self) -> Option<&str> {
        match self {
            Expression::Symbol(s) if !s.escaped && !is_literal_token(&s.name) => Some(&s.name),
            _ => None,
        }
    }
}

/// A symbol token is a literal (not an identifier) if it parses as a
/// number, or is `true`/`false`, or is a quoted string.
pub fn is_literal_token(text: &str) -> bool {
    text == "true"
        || text == "false"
        || text.starts_with('"')
        || text.parse::<i64>().is_ok()
        || text.parse::<f64>().is_ok()
}
