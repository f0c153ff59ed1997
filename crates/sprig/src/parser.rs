//! Recursive-descent parser with a post-processing operator-precedence
//! fold and a bottom-up symbol-set pass.

use std::borrow::Cow;
use std::rc::Rc;

use crate::expr::{
    is_literal_token, Expression, FunctionCallExpr, FunctionDefinitionExpr, PropertyExpr, SymbolExpr, SymbolSet,
    TupleExpr,
};
use crate::lexer::{self, tokenize, Word};
use crate::position::Position;

#[derive(Debug, Clone)]
pub struct ParserError {
    pub message: String,
    pub position: Position,
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ParserError at {}: {}", self.position, self.message)
    }
}

/// Accumulates `ParserError`s across one parse and tracks whether the
/// source looked like it was cut off mid-construct.
pub struct ParseCtx {
    pub errors: Vec<ParserError>,
    pub incomplete: bool,
}

impl ParseCtx {
    fn new() -> Self {
        Self { errors: Vec::new(), incomplete: false }
    }

    fn error(&mut self, position: Position, message: impl Into<String>) {
        self.errors.push(ParserError { message: message.into(), position });
    }
}

pub struct ParseOutcome {
    pub expression: Expression,
    pub errors: Vec<ParserError>,
    pub incomplete: bool,
}

/// Parses `source` (attributed to `path` for positions) into an
/// `Expression` tree with `symbols` fully computed.
pub fn parse(path: &str, source: &str) -> ParseOutcome {
    let (words, lex_errors) = tokenize(path, source);
    let mut ctx = ParseCtx::new();
    for e in lex_errors {
        ctx.incomplete = true;
        ctx.error(e.position, e.message);
    }
    let empty_pos = words
        .first()
        .map(|w| w.position.clone())
        .unwrap_or_else(|| Position::new(Rc::from(path), 1, 1));
    let mut expression = parse_top_level(&words, &mut ctx, empty_pos);
    compute_symbols(&mut expression);
    ParseOutcome { expression, errors: ctx.errors, incomplete: ctx.incomplete }
}

// ---------------------------------------------------------------------
// Tuple / grouping level
// ---------------------------------------------------------------------

/// Parses commas at THIS level (not inside nested brackets) into a flat
/// Tuple; a single segment is returned unwrapped; an empty span is the
/// unit value.
fn parse_top_level(words: &[Word], ctx: &mut ParseCtx, empty_pos: Position) -> Expression {
    let segments = split_top_level(words, ",");
    if segments.is_empty() {
        return Expression::empty_tuple(empty_pos);
    }
    if segments.len() == 1 {
        return parse_segment(segments[0], ctx, empty_pos);
    }
    let position = segments[0].first().map(|w| w.position.clone()).unwrap_or(empty_pos);
    let objects = segments.into_iter().map(|seg| parse_segment(seg, ctx, position.clone())).collect();
    Expression::Tuple(TupleExpr { objects, position, symbols: SymbolSet::default() })
}

fn split_top_level<'w>(words: &'w [Word], sep: &str) -> Vec<&'w [Word]> {
    if words.is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, w) in words.iter().enumerate() {
        if lexer::is_open_bracket(&w.text) {
            depth += 1;
        } else if lexer::is_close_bracket(&w.text) {
            depth -= 1;
        } else if depth == 0 && w.text == sep {
            parts.push(&words[start..i]);
            start = i + 1;
        }
    }
    parts.push(&words[start..]);
    parts
}

fn find_top_level(words: &[Word], needle: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, w) in words.iter().enumerate() {
        if lexer::is_open_bracket(&w.text) {
            depth += 1;
        } else if lexer::is_close_bracket(&w.text) {
            depth -= 1;
        } else if depth == 0 && w.text == needle {
            return Some(i);
        }
    }
    None
}

// ---------------------------------------------------------------------
// Segment level: function definitions, then operator folding
// ---------------------------------------------------------------------

/// A comma-free span, in precedence order from loosest to tightest:
/// `left ; right` (sequencing), `target := value` (assignment, right
/// associative so chains nest as `a := (b := c)`), `params |-> body` /
/// `params \ filter |-> body` (function definition), or a plain
/// operator/juxtaposition expression. `;` and `:=` are split out here
/// rather than folded as ordinary binary operators so that a `|->` inside
/// one statement of a `;`-chain only swallows that statement, not
/// everything after it.
fn parse_segment(words: &[Word], ctx: &mut ParseCtx, empty_pos: Position) -> Expression {
    if words.is_empty() {
        return Expression::empty_tuple(empty_pos);
    }
    if let Some(semi_idx) = find_top_level(words, ";") {
        let position = words[0].position.clone();
        let left = parse_segment(&words[..semi_idx], ctx, position.clone());
        let right = parse_segment(&words[semi_idx + 1..], ctx, position.clone());
        return sequence_call(";", left, right, position);
    }
    if let Some(assign_idx) = find_top_level(words, ":=") {
        let position = words[0].position.clone();
        let target = parse_operator_sequence(&words[..assign_idx], ctx);
        let value = parse_segment(&words[assign_idx + 1..], ctx, position.clone());
        return sequence_call(":=", target, value, position);
    }
    if let Some(arrow_idx) = find_top_level(words, "|->") {
        let head = &words[..arrow_idx];
        let body_words = &words[arrow_idx + 1..];
        let position = words[0].position.clone();
        let (parameters, filter) = if let Some(bs_idx) = find_top_level(head, "\\") {
            let params = parse_top_level(&head[..bs_idx], ctx, position.clone());
            let filt = parse_top_level(&head[bs_idx + 1..], ctx, position.clone());
            (params, Some(Box::new(filt)))
        } else {
            (parse_top_level(head, ctx, position.clone()), None)
        };
        if body_words.is_empty() {
            ctx.incomplete = true;
            ctx.error(position.clone(), "function definition is missing a body after '|->'");
        }
        let body = parse_top_level(body_words, ctx, position.clone());
        return Expression::FunctionDefinition(FunctionDefinitionExpr {
            parameters: Box::new(parameters),
            filter,
            body: Box::new(body),
            position,
            symbols: SymbolSet::default(),
        });
    }
    parse_operator_sequence(words, ctx)
}

/// Builds the `FunctionCall` node for a left-associated-by-construction
/// split operator (`;`, `:=`) that bypasses the normal priority fold.
fn sequence_call(op: &str, left: Expression, right: Expression, position: Position) -> Expression {
    let func_symbol = Expression::Symbol(SymbolExpr {
        name: op.to_owned(),
        escaped: false,
        position: position.clone(),
        symbols: SymbolSet::default(),
    });
    let args_position = left.position().clone();
    let arguments = Expression::Tuple(TupleExpr { objects: vec![left, right], position: args_position, symbols: SymbolSet::default() });
    Expression::FunctionCall(FunctionCallExpr { function: Box::new(func_symbol), arguments: Box::new(arguments), position, symbols: SymbolSet::default() })
}

enum Element {
    Unit(Expression),
    Op(Word),
}

fn parse_operator_sequence(words: &[Word], ctx: &mut ParseCtx) -> Expression {
    let mut elements: Vec<Element> = Vec::new();
    let mut idx = 0usize;
    while idx < words.len() {
        let (unit, next) = parse_unit(words, idx, ctx);
        elements.push(Element::Unit(unit));
        idx = next;
        if idx < words.len() {
            elements.push(Element::Op(words[idx].clone()));
            idx += 1;
        }
    }
    fold_operators(elements, ctx)
}

/// `^` (1) < `* / %` (2) < `+ -` (3) < `& |` (5) < `:` (6) < `;` (7);
/// everything else is 4. Equal-class ties favor the longer operator text
/// (binds tighter).
fn priority_key(op_text: &str) -> (u8, std::cmp::Reverse<usize>) {
    let lead = op_text.chars().next().unwrap_or('\0');
    let class = match lead {
        '^' => 1,
        '*' | '/' | '%' => 2,
        '+' | '-' => 3,
        '&' | '|' => 5,
        ':' => 6,
        ';' => 7,
        _ => 4,
    };
    (class, std::cmp::Reverse(op_text.chars().count()))
}

fn fold_operators(mut elements: Vec<Element>, ctx: &mut ParseCtx) -> Expression {
    loop {
        let op_indices: Vec<usize> =
            elements.iter().enumerate().filter_map(|(i, e)| matches!(e, Element::Op(_)).then_some(i)).collect();
        if op_indices.is_empty() {
            break;
        }
        let mut best_idx = op_indices[0];
        let mut best_key = match &elements[best_idx] {
            Element::Op(w) => priority_key(&w.text),
            _ => unreachable!(),
        };
        for &i in &op_indices[1..] {
            if let Element::Op(w) = &elements[i] {
                let key = priority_key(&w.text);
                if key < best_key {
                    best_idx = i;
                    best_key = key;
                }
            }
        }
        let i = best_idx;
        let has_left = i > 0 && matches!(elements[i - 1], Element::Unit(_));
        let has_right = i + 1 < elements.len() && matches!(elements[i + 1], Element::Unit(_));
        if !has_left || !has_right {
            if let Element::Op(w) = &elements[i] {
                let side = if !has_left { "left" } else { "right" };
                ctx.error(w.position.clone(), format!("operator '{}' is missing a {side} operand", w.text));
                let symbol = Expression::Symbol(SymbolExpr {
                    name: w.text.clone(),
                    escaped: false,
                    position: w.position.clone(),
                    symbols: SymbolSet::default(),
                });
                elements[i] = Element::Unit(symbol);
            }
            continue;
        }
        let right = match elements.remove(i + 1) {
            Element::Unit(e) => e,
            _ => unreachable!(),
        };
        let op = match elements.remove(i) {
            Element::Op(w) => w,
            _ => unreachable!(),
        };
        let left = match elements.remove(i - 1) {
            Element::Unit(e) => e,
            _ => unreachable!(),
        };
        let position = left.position().clone();
        let func_symbol = Expression::Symbol(SymbolExpr {
            name: op.text.clone(),
            escaped: false,
            position: op.position.clone(),
            symbols: SymbolSet::default(),
        });
        let args_position = func_symbol.position().clone();
        let arguments = Expression::Tuple(TupleExpr { objects: vec![left, right], position: args_position, symbols: SymbolSet::default() });
        let call = Expression::FunctionCall(FunctionCallExpr {
            function: Box::new(func_symbol),
            arguments: Box::new(arguments),
            position,
            symbols: SymbolSet::default(),
        });
        elements.insert(i - 1, Element::Unit(call));
    }

    let units: Vec<Expression> = elements
        .into_iter()
        .map(|e| match e {
            Element::Unit(x) => x,
            Element::Op(w) => {
                Expression::Symbol(SymbolExpr { name: w.text, escaped: false, position: w.position, symbols: SymbolSet::default() })
            }
        })
        .collect();
    match units.len() {
        0 => Expression::empty_tuple(Position::synthetic()),
        1 => units.into_iter().next().expect("checked len == 1"),
        _ => {
            let position = units[0].position().clone();
            Expression::Tuple(TupleExpr { objects: units, position, symbols: SymbolSet::default() })
        }
    }
}

// ---------------------------------------------------------------------
// Units: primary + property chain + juxtaposition
// ---------------------------------------------------------------------

/// A primary, its property chain, and (if more follow immediately) a
/// function call over the trailing juxtaposed primaries.
fn parse_unit(words: &[Word], idx: usize, ctx: &mut ParseCtx) -> (Expression, usize) {
    let (mut expr, mut idx) = parse_primary(words, idx, ctx);
    idx = consume_property_chain(&mut expr, words, idx, ctx);

    let mut trailing: Vec<Expression> = Vec::new();
    while idx < words.len() && !lexer::is_operator_text(&words[idx].text) && words[idx].text != "," && words[idx].text != "\\" {
        let (mut arg, next_idx) = parse_primary(words, idx, ctx);
        idx = consume_property_chain(&mut arg, words, next_idx, ctx);
        trailing.push(arg);
    }
    if !trailing.is_empty() {
        let position = expr.position().clone();
        let arguments = if trailing.len() == 1 {
            trailing.into_iter().next().expect("checked len == 1")
        } else {
            let args_pos = trailing[0].position().clone();
            Expression::Tuple(TupleExpr { objects: trailing, position: args_pos, symbols: SymbolSet::default() })
        };
        expr = Expression::FunctionCall(FunctionCallExpr {
            function: Box::new(expr),
            arguments: Box::new(arguments),
            position,
            symbols: SymbolSet::default(),
        });
    }
    (expr, idx)
}

fn parse_primary(words: &[Word], idx: usize, ctx: &mut ParseCtx) -> (Expression, usize) {
    if idx >= words.len() {
        ctx.incomplete = true;
        let pos = words.last().map(|w| w.position.clone()).unwrap_or_else(Position::synthetic);
        ctx.error(pos.clone(), "unexpected end of input, expected an expression");
        return (Expression::empty_tuple(pos), idx);
    }
    let w = &words[idx];
    if lexer::is_open_bracket(&w.text) {
        return parse_bracket_group(words, idx, ctx);
    }
    if lexer::is_close_bracket(&w.text) || matches!(w.text.as_str(), "," | "\\" | "|->" | "->") {
        // Reserved tokens used where an identifier/operand is expected:
        // report but keep going.
        ctx.error(w.position.clone(), format!("unexpected token '{}', expected an expression", w.text));
        return (
            Expression::Symbol(SymbolExpr { name: w.text.clone(), escaped: false, position: w.position.clone(), symbols: SymbolSet::default() }),
            idx + 1,
        );
    }
    (
        Expression::Symbol(SymbolExpr { name: w.text.clone(), escaped: false, position: w.position.clone(), symbols: SymbolSet::default() }),
        idx + 1,
    )
}

fn parse_bracket_group(words: &[Word], idx: usize, ctx: &mut ParseCtx) -> (Expression, usize) {
    let open_pos = words[idx].position.clone();
    let mut depth = 1i32;
    let mut j = idx + 1;
    while j < words.len() && depth > 0 {
        if lexer::is_open_bracket(&words[j].text) {
            depth += 1;
        } else if lexer::is_close_bracket(&words[j].text) {
            depth -= 1;
        }
        j += 1;
    }
    if depth > 0 {
        ctx.incomplete = true;
        ctx.error(open_pos.clone(), "unterminated bracket group");
        let inner = &words[idx + 1..words.len()];
        let mut expr = parse_top_level(inner, ctx, open_pos);
        mark_escaped(&mut expr);
        return (expr, words.len());
    }
    let inner = &words[idx + 1..j - 1];
    let mut expr = parse_top_level(inner, ctx, open_pos);
    mark_escaped(&mut expr);
    (expr, j)
}

fn mark_escaped(expr: &mut Expression) {
    if let Expression::Symbol(s) = expr {
        s.escaped = true;
    }
}

fn consume_property_chain(expr: &mut Expression, words: &[Word], mut idx: usize, ctx: &mut ParseCtx) -> usize {
    while idx < words.len() && words[idx].text == "->" {
        let arrow_pos = words[idx].position.clone();
        idx += 1;
        if idx >= words.len() {
            ctx.incomplete = true;
            ctx.error(arrow_pos, "'->' is missing a property name");
            break;
        }
        let name = words[idx].text.clone();
        let position = expr.position().clone();
        let object = std::mem::replace(expr, Expression::empty_tuple(Position::synthetic()));
        *expr = Expression::Property(PropertyExpr { object: Box::new(object), name, position, symbols: SymbolSet::default() });
        idx += 1;
    }
    idx
}

// ---------------------------------------------------------------------
// Symbol-set pass
// ---------------------------------------------------------------------

fn compute_symbols(expr: &mut Expression) {
    match expr {
        Expression::Symbol(s) => {
            s.symbols.clear();
            if !is_literal_token(&s.name) {
                s.symbols.insert(s.name.clone());
            }
        }
        Expression::Tuple(t) => {
            for obj in &mut t.objects {
                compute_symbols(obj);
            }
            t.symbols = t.objects.iter().flat_map(|o| external_symbols(o).into_owned()).collect();
        }
        Expression::FunctionCall(c) => {
            compute_symbols(&mut c.function);
            compute_symbols(&mut c.arguments);
            let mut set = external_symbols(&c.function).into_owned();
            set.extend(external_symbols(&c.arguments).into_owned());
            c.symbols = set;
        }
        Expression::Property(p) => {
            compute_symbols(&mut p.object);
            p.symbols = external_symbols(&p.object).into_owned();
        }
        Expression::FunctionDefinition(f) => {
            compute_symbols(&mut f.parameters);
            if let Some(filt) = &mut f.filter {
                compute_symbols(filt);
            }
            compute_symbols(&mut f.body);
            let mut set = f.parameters.symbols().clone();
            if let Some(filt) = &f.filter {
                set.extend(filt.symbols().iter().cloned());
            }
            set.extend(f.body.symbols().iter().cloned());
            f.symbols = set;
        }
    }
}

/// The set a node contributes to its parent's union — empty for a
/// FunctionDefinition, since it is a scope barrier.
fn external_symbols(expr: &Expression) -> Cow<'_, SymbolSet> {
    match expr {
        Expression::FunctionDefinition(_) => Cow::Owned(SymbolSet::default()),
        other => Cow::Borrowed(other.symbols()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Expression {
        let outcome = parse("t.fl", src);
        assert!(outcome.errors.is_empty(), "unexpected parser errors: {:?}", outcome.errors.iter().map(|e| &e.message).collect::<Vec<_>>());
        outcome.expression
    }

    #[test]
    fn arithmetic_precedence_builds_nested_calls() {
        let expr = parse_ok("1 + 2 * 3");
        match expr {
            Expression::FunctionCall(c) => {
                assert_eq!(c.function.as_plain_name(), None);
                if let Expression::Symbol(s) = &*c.function {
                    assert_eq!(s.name, "+");
                } else {
                    panic!("expected + at the top");
                }
            }
            other => panic!("expected a FunctionCall, got {other:?}"),
        }
    }

    #[test]
    fn juxtaposition_wraps_multiple_trailing_args_in_a_tuple() {
        let expr = parse_ok("f x y");
        if let Expression::FunctionCall(c) = &expr {
            assert!(matches!(&*c.arguments, Expression::Tuple(t) if t.objects.len() == 2));
        } else {
            panic!("expected FunctionCall");
        }
    }

    #[test]
    fn property_chain_binds_tighter_than_call() {
        let expr = parse_ok("a->b c");
        if let Expression::FunctionCall(c) = &expr {
            assert!(matches!(&*c.function, Expression::Property(_)));
        } else {
            panic!("expected FunctionCall");
        }
    }

    #[test]
    fn function_definition_with_filter() {
        let expr = parse_ok("(x) \\ x < 0 |-> -x");
        match expr {
            Expression::FunctionDefinition(f) => assert!(f.filter.is_some()),
            other => panic!("expected FunctionDefinition, got {other:?}"),
        }
    }

    #[test]
    fn function_definition_is_a_scope_barrier() {
        let expr = parse_ok("y + ((x) |-> x)");
        assert!(expr.symbols().contains("y"));
        assert!(!expr.symbols().contains("x"));
    }

    #[test]
    fn reserved_token_as_identifier_reports_error_but_continues() {
        let outcome = parse("t.fl", "-> := 1");
        assert!(!outcome.errors.is_empty());
    }

    #[test]
    fn empty_program_is_empty_tuple() {
        let expr = parse_ok("");
        assert!(expr.is_empty_tuple());
    }
}
