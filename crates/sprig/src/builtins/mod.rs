//! Registration of the builtin library and the control-flow group.
//!
//! Builtins receive their call's raw, unevaluated argument expression and
//! walk it themselves rather than going through the generic parameter
//! binder: that is what lets `if`/`while`/`for`/`try`/`&`/`|` stay lazy and
//! short-circuiting without constructing throwaway quoted functions.

mod arithmetic;
mod assign;
mod copy;
mod equality;
mod import;

use std::rc::Rc;

use ahash::AHashMap;

use crate::context::{ContextId, GLOBAL_CONTEXT};
use crate::eval::{execute, raise};
use crate::exception::RunError;
use crate::expr::Expression;
use crate::heap::GlobalContext;
use crate::object::{Function, SystemCallable};
use crate::position::Position;
use crate::reference::Reference;
use crate::value::Data;

/// Normalizes a call's raw argument expression into logical argument
/// slots: a non-empty `Tuple` yields its elements, anything else (including
/// an empty `Tuple`, i.e. `f()`) yields that one expression (zero for the
/// empty case, since an empty `Tuple`'s `objects` is empty).
fn as_args(expr: &Expression) -> Vec<&Expression> {
    match expr {
        Expression::Tuple(t) => t.objects.iter().collect(),
        other => vec![other],
    }
}

fn check_keyword(expr: &Expression, word: &str) -> Result<(), RunError> {
    match expr {
        Expression::Symbol(s) if s.name == word => Ok(()),
        _ => Err(RunError::FunctionArgumentsError),
    }
}

fn unit_reference(gc: &mut GlobalContext) -> Reference {
    Reference::Direct(Data::Object(gc.new_empty_object()))
}

fn register_system(gc: &mut GlobalContext, name: &'static str, callable: SystemCallable) {
    let object_id = gc.new_object();
    let function = Function::System { name, callable, captured: Rc::new(AHashMap::default()) };
    gc.object_mut(object_id).functions.push(Rc::new(function));
    let cell = gc.new_cell(Some(Data::Object(object_id)));
    gc.add_symbol(GLOBAL_CONTEXT, name, cell);
}

/// Populates a fresh `GlobalContext`'s global frame with every builtin.
pub fn register(gc: &mut GlobalContext) {
    register_system(gc, ";", sequence);
    register_system(gc, "if", if_builtin);
    register_system(gc, "while", while_builtin);
    register_system(gc, "for", for_builtin);
    register_system(gc, "try", try_builtin);
    register_system(gc, "throw", throw_builtin);

    assign::register(gc);
    copy::register(gc);
    equality::register(gc);
    arithmetic::register(gc);
    import::register(gc);
}

fn sequence(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    if args.len() != 2 {
        return Err(RunError::FunctionArgumentsError);
    }
    execute(gc, ctx, args[0])?;
    execute(gc, ctx, args[1])
}

/// `if (c, b, [else c2 b2 …, else bN])`: the first `(c, b)` pair is
/// unconditional; each further branch is introduced by the `else`
/// keyword, followed either by another `(c, b)` pair (an "else if") or,
/// as the final branch only, a bare fallback body with no condition.
fn if_builtin(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    if args.len() < 2 {
        return Err(RunError::FunctionArgumentsError);
    }
    let cond = execute(gc, ctx, args[0])?.read(gc)?;
    if cond.as_bool().ok_or(RunError::FunctionArgumentsError)? {
        return execute(gc, ctx, args[1]);
    }
    let mut i = 2;
    while i < args.len() {
        check_keyword(args[i], "else")?;
        let remaining = args.len() - (i + 1);
        if remaining == 1 {
            return execute(gc, ctx, args[i + 1]);
        }
        if remaining < 2 {
            return Err(RunError::FunctionArgumentsError);
        }
        let cond = execute(gc, ctx, args[i + 1])?.read(gc)?;
        if cond.as_bool().ok_or(RunError::FunctionArgumentsError)? {
            return execute(gc, ctx, args[i + 2]);
        }
        i += 3;
    }
    Ok(unit_reference(gc))
}

fn while_builtin(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    if args.len() != 2 {
        return Err(RunError::FunctionArgumentsError);
    }
    loop {
        let cond = execute(gc, ctx, args[0])?.read(gc)?;
        match cond.as_bool() {
            Some(true) => {
                execute(gc, ctx, args[1])?;
            }
            Some(false) => break,
            None => return Err(RunError::FunctionArgumentsError),
        }
    }
    Ok(unit_reference(gc))
}

/// `for v from start to end [step by] { body }`: a 6-element argument list
/// without `step`, 8 with it. `by` is re-evaluated every iteration is not
/// required by anything here, so it's read once up front.
fn for_builtin(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    let (var, from_kw, start_e, to_kw, end_e, step_kw, step_e, block) = match args.len() {
        6 => (args[0], args[1], args[2], args[3], args[4], None, None, args[5]),
        8 => (args[0], args[1], args[2], args[3], args[4], Some(args[5]), Some(args[6]), args[7]),
        _ => return Err(RunError::FunctionArgumentsError),
    };
    check_keyword(from_kw, "from")?;
    check_keyword(to_kw, "to")?;
    if let Some(kw) = step_kw {
        check_keyword(kw, "step")?;
    }
    let name = var.as_plain_name().ok_or(RunError::FunctionArgumentsError)?;
    let start = execute(gc, ctx, start_e)?.read(gc)?.as_long().ok_or(RunError::FunctionArgumentsError)?;
    let end = execute(gc, ctx, end_e)?.read(gc)?.as_long().ok_or(RunError::FunctionArgumentsError)?;
    let step = match step_e {
        Some(e) => execute(gc, ctx, e)?.read(gc)?.as_long().ok_or(RunError::FunctionArgumentsError)?,
        None => 1,
    };
    if step == 0 {
        return Err(raise(gc, Data::Object(gc.exceptions.incorrect_function_arguments), position));
    }
    let mut i = start;
    loop {
        let keep_going = if step > 0 { i < end } else { i > end };
        if !keep_going {
            break;
        }
        let cell = gc.new_cell(Some(Data::Long(i)));
        gc.add_symbol(ctx, name, cell);
        execute(gc, ctx, block)?;
        i += step;
    }
    Ok(unit_reference(gc))
}

/// `try { block } catch handler`: `handler` is evaluated to an Object only
/// if `block` raises, then invoked directly against the raised value. If
/// `handler` itself raises an Exception, the original exception propagates
/// unchanged rather than the handler's — a non-Exception signal out of the
/// handler (e.g. a recursion-limit hit) still propagates as itself.
fn try_builtin(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    if args.len() != 3 {
        return Err(RunError::FunctionArgumentsError);
    }
    check_keyword(args[1], "catch")?;
    match execute(gc, ctx, args[0]) {
        Ok(r) => Ok(r),
        Err(RunError::Exception(exc)) => {
            let handler = match execute(gc, ctx, args[2]).and_then(|r| r.read(gc)) {
                Ok(handler) => handler,
                Err(RunError::Exception(_)) => return Err(RunError::Exception(exc)),
                Err(other) => return Err(other),
            };
            let handler_object = handler.as_object().ok_or(RunError::FunctionArgumentsError)?;
            match crate::eval::call_with_data(gc, ctx, handler_object, exc.value, position) {
                Err(RunError::Exception(_)) => Err(RunError::Exception(exc)),
                other => other,
            }
        }
        Err(other) => Err(other),
    }
}

fn throw_builtin(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    if args.len() != 1 {
        return Err(RunError::FunctionArgumentsError);
    }
    let value = execute(gc, ctx, args[0])?.read(gc)?;
    Err(raise(gc, value, position))
}
