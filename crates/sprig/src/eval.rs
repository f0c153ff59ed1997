//! The tree-walking evaluator: `execute` dispatches on expression kind;
//! `call_object` performs overload resolution as a loop over a three-state
//! outcome rather than by using `Result`/`?` to simulate host exceptions.

use std::rc::Rc;

use ahash::AHashMap;

use crate::context::ContextId;
use crate::exception::{Exception, RunError};
use crate::expr::{is_literal_token, Expression, FunctionDefinitionExpr, PropertyExpr, SymbolExpr, TupleExpr};
use crate::heap::{GlobalContext, ObjectId};
use crate::object::Function;
use crate::position::Position;
use crate::reference::Reference;
use crate::value::Data;

pub fn execute(gc: &mut GlobalContext, ctx: ContextId, expr: &Expression) -> Result<Reference, RunError> {
    match expr {
        Expression::Symbol(s) => execute_symbol(gc, ctx, s),
        Expression::Tuple(t) => execute_tuple(gc, ctx, t),
        Expression::Property(p) => execute_property(gc, ctx, p),
        Expression::FunctionDefinition(f) => execute_function_definition(gc, ctx, f),
        Expression::FunctionCall(c) => execute_function_call(gc, ctx, c),
    }
}

fn execute_symbol(gc: &mut GlobalContext, ctx: ContextId, s: &SymbolExpr) -> Result<Reference, RunError> {
    if s.name.starts_with('"') {
        let text = unescape_string_literal(&s.name);
        let object = gc.alloc_string(&text);
        return Ok(Reference::Direct(Data::Object(object)));
    }
    if s.name == "true" {
        return Ok(Reference::Direct(Data::Bool(true)));
    }
    if s.name == "false" {
        return Ok(Reference::Direct(Data::Bool(false)));
    }
    if let Ok(v) = s.name.parse::<i64>() {
        return Ok(Reference::Direct(Data::Long(v)));
    }
    if let Ok(v) = s.name.parse::<f64>() {
        return Ok(Reference::Direct(Data::Double(v)));
    }
    let cell = gc.lookup(ctx, &s.name);
    Ok(Reference::Symbol(cell))
}

fn execute_tuple(gc: &mut GlobalContext, ctx: ContextId, t: &TupleExpr) -> Result<Reference, RunError> {
    if t.objects.is_empty() {
        return Ok(Reference::Direct(Data::Object(gc.new_empty_object())));
    }
    let mut refs = Vec::with_capacity(t.objects.len());
    for obj in &t.objects {
        refs.push(execute(gc, ctx, obj)?);
    }
    Ok(Reference::Tuple(refs))
}

fn execute_property(gc: &mut GlobalContext, ctx: ContextId, p: &PropertyExpr) -> Result<Reference, RunError> {
    let object_ref = execute(gc, ctx, &p.object)?;
    let data = object_ref.read(gc)?;
    let object_id = data.as_object().ok_or(RunError::FunctionArgumentsError)?;
    let cell = gc.property_cell(object_id, &p.name);
    Ok(Reference::Property(cell))
}

fn execute_function_definition(
    gc: &mut GlobalContext,
    ctx: ContextId,
    f: &FunctionDefinitionExpr,
) -> Result<Reference, RunError> {
    let object_id = gc.new_object();
    let mut captured = AHashMap::default();
    for name in f.body.symbols().iter().chain(f.filter.as_ref().map(|e| e.symbols().iter()).into_iter().flatten()) {
        if let Some(cell) = gc.try_lookup(ctx, name) {
            captured.insert(name.clone(), cell);
        }
    }
    let definition = Rc::new(f.clone());
    gc.object_mut(object_id).functions.insert(0, Rc::new(Function::Custom { definition, captured: Rc::new(captured) }));
    Ok(Reference::Direct(Data::Object(object_id)))
}

fn execute_function_call(
    gc: &mut GlobalContext,
    ctx: ContextId,
    c: &crate::expr::FunctionCallExpr,
) -> Result<Reference, RunError> {
    let function_ref = execute(gc, ctx, &c.function)?;
    let function_data = function_ref.read(gc)?;
    let Some(object_id) = function_data.as_object() else {
        return Err(raise(gc, Data::Object(gc.exceptions.not_a_function), &c.position));
    };
    call_object(gc, ctx, object_id, &c.arguments, &c.position)
}

/// Builds a language-visible `Exception` carrying `value`, raised at
/// `position` with the call chain captured as of right now.
pub fn raise(gc: &GlobalContext, value: Data, position: &Position) -> RunError {
    RunError::Exception(Exception { value, position: position.clone(), stack: gc.capture_stack() })
}

enum AttemptOutcome {
    Matched(Reference),
    NoMatch,
    Raised(RunError),
}

/// Overload resolution: tries each Function in front-to-back order,
/// returning the first match. `NotAFunction`/`IncorrectFunctionArguments`
/// surface once every overload has failed to bind or match its filter.
pub fn call_object(
    gc: &mut GlobalContext,
    caller_ctx: ContextId,
    object_id: ObjectId,
    argument: &Expression,
    call_position: &Position,
) -> Result<Reference, RunError> {
    let functions = gc.object(object_id).functions.clone();
    if functions.is_empty() {
        return Err(raise(gc, Data::Object(gc.exceptions.not_a_function), call_position));
    }
    for function in &functions {
        match attempt_overload(gc, caller_ctx, function, argument, call_position) {
            AttemptOutcome::Matched(r) => return Ok(r),
            AttemptOutcome::NoMatch => continue,
            AttemptOutcome::Raised(e) => return Err(e),
        }
    }
    Err(raise(gc, Data::Object(gc.exceptions.incorrect_function_arguments), call_position))
}

fn attempt_overload(
    gc: &mut GlobalContext,
    caller_ctx: ContextId,
    function: &Function,
    argument: &Expression,
    call_position: &Position,
) -> AttemptOutcome {
    let fctx = match gc.push_function_context(caller_ctx) {
        Ok(id) => id,
        Err(e) => return AttemptOutcome::Raised(e),
    };
    match function {
        Function::Custom { definition, captured } => {
            for (name, cell) in captured.iter() {
                gc.add_symbol(fctx, name, *cell);
            }
            match bind_parameters(gc, fctx, caller_ctx, &definition.parameters, argument) {
                Ok(()) => {}
                Err(RunError::FunctionArgumentsError) => return AttemptOutcome::NoMatch,
                Err(e) => return AttemptOutcome::Raised(e),
            }
            if let Some(filter) = &definition.filter {
                match execute(gc, fctx, filter).and_then(|r| r.read(gc)) {
                    Ok(Data::Bool(true)) => {}
                    Ok(_) => return AttemptOutcome::NoMatch,
                    Err(RunError::FunctionArgumentsError) => return AttemptOutcome::NoMatch,
                    Err(e) => return AttemptOutcome::Raised(e),
                }
            }
            gc.push_call_frame(call_position.clone());
            let result = execute(gc, fctx, &definition.body);
            gc.pop_call_frame();
            match result {
                Ok(r) => AttemptOutcome::Matched(r),
                Err(e) => AttemptOutcome::Raised(e),
            }
        }
        Function::System { callable, captured, .. } => {
            for (name, cell) in captured.iter() {
                gc.add_symbol(fctx, name, *cell);
            }
            match callable(gc, fctx, argument, call_position) {
                Ok(r) => AttemptOutcome::Matched(r),
                Err(RunError::FunctionArgumentsError) => AttemptOutcome::NoMatch,
                Err(e) => AttemptOutcome::Raised(e),
            }
        }
    }
}

/// Binds a Custom function's parameter pattern against a raw (unevaluated)
/// argument expression. `FunctionCall` patterns quote the argument as a
/// body so statement blocks can be passed around unevaluated; everything
/// else evaluates the argument (lazily, once per attempt) before binding.
fn bind_parameters(
    gc: &mut GlobalContext,
    fctx: ContextId,
    caller_ctx: ContextId,
    pattern: &Expression,
    argument: &Expression,
) -> Result<(), RunError> {
    match pattern {
        Expression::FunctionCall(call) => {
            let name = call.function.as_plain_name().ok_or(RunError::FunctionArgumentsError)?;
            let object_id = gc.new_object();
            let mut captured = AHashMap::default();
            for symbol in argument.symbols() {
                if let Some(cell) = gc.try_lookup(caller_ctx, symbol) {
                    captured.insert(symbol.clone(), cell);
                }
            }
            let definition = Rc::new(FunctionDefinitionExpr {
                parameters: call.arguments.clone(),
                filter: None,
                body: Box::new(argument.clone()),
                position: argument.position().clone(),
                symbols: argument.symbols().clone(),
            });
            gc.object_mut(object_id).functions.insert(
                0,
                Rc::new(Function::Custom { definition, captured: Rc::new(captured) }),
            );
            let cell = gc.new_cell(Some(Data::Object(object_id)));
            gc.add_symbol(fctx, name, cell);
            Ok(())
        }
        Expression::Tuple(pt) => {
            if let Expression::Tuple(at) = argument {
                if pt.objects.len() != at.objects.len() {
                    return Err(RunError::FunctionArgumentsError);
                }
                for (p, a) in pt.objects.iter().zip(at.objects.iter()) {
                    bind_parameters(gc, fctx, caller_ctx, p, a)?;
                }
                Ok(())
            } else {
                let value = execute(gc, caller_ctx, argument)?.read(gc)?;
                let object_id = value.as_object().ok_or(RunError::FunctionArgumentsError)?;
                let array = gc.object(object_id).array.clone();
                if array.len() != pt.objects.len() {
                    return Err(RunError::FunctionArgumentsError);
                }
                for (p, cell) in pt.objects.iter().zip(array.iter()) {
                    let data = gc.read_cell(*cell)?;
                    bind_parameter_to_data(gc, fctx, p, data)?;
                }
                Ok(())
            }
        }
        Expression::Symbol(s) if !is_literal_token(&s.name) => {
            let value = execute(gc, caller_ctx, argument)?.read(gc)?;
            let cell = gc.new_cell(Some(value));
            gc.add_symbol(fctx, &s.name, cell);
            Ok(())
        }
        _ => Err(RunError::FunctionArgumentsError),
    }
}

fn bind_parameter_to_data(gc: &mut GlobalContext, fctx: ContextId, pattern: &Expression, data: Data) -> Result<(), RunError> {
    match pattern {
        Expression::Symbol(s) if !is_literal_token(&s.name) => {
            let cell = gc.new_cell(Some(data));
            gc.add_symbol(fctx, &s.name, cell);
            Ok(())
        }
        Expression::Tuple(pt) => {
            let object_id = data.as_object().ok_or(RunError::FunctionArgumentsError)?;
            let array = gc.object(object_id).array.clone();
            if array.len() != pt.objects.len() {
                return Err(RunError::FunctionArgumentsError);
            }
            for (p, cell) in pt.objects.iter().zip(array.iter()) {
                let element = gc.read_cell(*cell)?;
                bind_parameter_to_data(gc, fctx, p, element)?;
            }
            Ok(())
        }
        _ => Err(RunError::FunctionArgumentsError),
    }
}

/// Invokes an Object's first (highest-priority) Custom function with an
/// already-evaluated `Data` argument, skipping the raw-expression bind
/// path. Used by `catch` handlers, which receive the thrown value rather
/// than an unevaluated call-site expression.
pub fn call_with_data(
    gc: &mut GlobalContext,
    caller_ctx: ContextId,
    object_id: ObjectId,
    data: Data,
    call_position: &Position,
) -> Result<Reference, RunError> {
    let functions = gc.object(object_id).functions.clone();
    let function = functions.first().ok_or_else(|| raise(gc, Data::Object(gc.exceptions.not_a_function), call_position))?;
    match function.as_ref() {
        Function::Custom { definition, captured } => {
            let fctx = gc.push_function_context(caller_ctx)?;
            for (name, cell) in captured.iter() {
                gc.add_symbol(fctx, name, *cell);
            }
            bind_parameter_to_data(gc, fctx, &definition.parameters, data)?;
            if let Some(filter) = &definition.filter {
                let cond = execute(gc, fctx, filter)?.read(gc)?;
                if cond.as_bool() != Some(true) {
                    return Err(raise(gc, Data::Object(gc.exceptions.incorrect_function_arguments), call_position));
                }
            }
            gc.push_call_frame(call_position.clone());
            let result = execute(gc, fctx, &definition.body);
            gc.pop_call_frame();
            result
        }
        Function::System { .. } => Err(raise(gc, Data::Object(gc.exceptions.not_a_function), call_position)),
    }
}

fn unescape_string_literal(raw: &str) -> String {
    let inner = &raw[1..raw.len().saturating_sub(1).max(1)];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('b') => out.push('\u{8}'),
            Some('e') => out.push('\u{1b}'),
            Some('f') => out.push('\u{c}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('v') => out.push('\u{b}'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::GLOBAL_CONTEXT;
    use crate::heap::InterpreterLimits;
    use crate::parser::parse;

    fn run(src: &str) -> (GlobalContext, Result<Reference, RunError>) {
        let mut gc = GlobalContext::with_stdout(InterpreterLimits::default(), Box::new(Vec::new()));
        crate::builtins::register(&mut gc);
        let outcome = parse("t.fl", src);
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors.iter().map(|e| &e.message).collect::<Vec<_>>());
        let result = execute(&mut gc, GLOBAL_CONTEXT, &outcome.expression);
        (gc, result)
    }

    fn run_long(src: &str) -> i64 {
        let (mut gc, result) = run(src);
        let data = result.unwrap().read(&mut gc).unwrap();
        data.as_long().expect("expected a Long result")
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(run_long("1 + 2 * 3"), 7);
    }

    #[test]
    fn overloading_by_arity() {
        assert_eq!(run_long("f := (x) |-> x + 1; f := (x, y) |-> x * y; f(10)"), 11);
        assert_eq!(run_long("f := (x) |-> x + 1; f := (x, y) |-> x * y; f(3, 4)"), 12);
    }

    #[test]
    fn guarded_overload() {
        // The guard is the later (and so higher-priority) overload: it is
        // tried first and falls through to the plain case when it fails.
        assert_eq!(run_long("abs := (x) |-> x; abs := (x) \\ x < 0 |-> -x; abs(-5)"), 5);
        assert_eq!(run_long("abs := (x) |-> x; abs := (x) \\ x < 0 |-> -x; abs(5)"), 5);
    }

    #[test]
    fn destructuring_assignment() {
        assert_eq!(run_long("(a, b) := (1, 2); a + b"), 3);
    }

    #[test]
    fn try_catch_adds_one() {
        assert_eq!(run_long("try { throw 42 } catch ((e) |-> e + 1)"), 43);
    }

    #[test]
    fn while_with_side_effect() {
        assert_eq!(run_long("i := 0; s := 0; while (i < 5) { s := s + i; i := i + 1 }; s"), 10);
    }

    #[test]
    fn empty_program_evaluates_to_unit() {
        let (mut gc, result) = run("");
        let data = result.unwrap().read(&mut gc).unwrap();
        assert!(matches!(data, Data::Object(_)));
    }

    #[test]
    fn for_zero_iterations() {
        assert_eq!(run_long("n := 0; for i from 3 to 3 { n := n + 1 }; n"), 0);
    }

    #[test]
    fn for_reverse_step() {
        assert_eq!(run_long("total := 0; for i from 5 to 1 step (-2) { total := total + i }; total"), 8);
    }

    #[test]
    fn recursion_limit_is_enforced() {
        let mut gc = GlobalContext::with_stdout(
            InterpreterLimits { max_recursion_depth: 3, include_paths: Vec::new() },
            Box::new(Vec::new()),
        );
        crate::builtins::register(&mut gc);
        let outcome = parse("t.fl", "loop := (n) |-> loop(n + 1); loop(0)");
        let result = execute(&mut gc, GLOBAL_CONTEXT, &outcome.expression);
        assert!(matches!(result, Err(RunError::RecursionLimitExceeded)));
    }
}
