//! Numeric and logical operators, plus `print`/`length`. `+`/`-` special-case
//! a single argument (juxtaposition like `- x` rather than a folded binary
//! call) as unary plus/negate; everything else is strictly binary.

use crate::context::ContextId;
use crate::eval::execute;
use crate::exception::RunError;
use crate::expr::Expression;
use crate::heap::GlobalContext;
use crate::position::Position;
use crate::reference::Reference;
use crate::value::Data;

use super::{as_args, register_system};

pub fn register(gc: &mut GlobalContext) {
    register_system(gc, "+", add);
    register_system(gc, "-", sub);
    register_system(gc, "*", mul);
    register_system(gc, "/", div);
    register_system(gc, "%", rem);
    register_system(gc, "<", lt);
    register_system(gc, "<=", le);
    register_system(gc, ">", gt);
    register_system(gc, ">=", ge);
    register_system(gc, "!", not_builtin);
    register_system(gc, "&", and_builtin);
    register_system(gc, "|", or_builtin);
    register_system(gc, "print", print_builtin);
    register_system(gc, "length", length_builtin);
}

fn eval_one(gc: &mut GlobalContext, ctx: ContextId, e: &Expression) -> Result<Data, RunError> {
    execute(gc, ctx, e)?.read(gc)
}

fn numeric_pair(gc: &mut GlobalContext, ctx: ContextId, args: &[&Expression]) -> Result<(Data, Data), RunError> {
    if args.len() != 2 {
        return Err(RunError::FunctionArgumentsError);
    }
    Ok((eval_one(gc, ctx, args[0])?, eval_one(gc, ctx, args[1])?))
}

fn add(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    match args.len() {
        1 => Ok(Reference::Direct(eval_one(gc, ctx, args[0])?)),
        2 => {
            let (a, b) = numeric_pair(gc, ctx, &args)?;
            match (a, b) {
                (Data::Long(x), Data::Long(y)) => Ok(Reference::Direct(Data::Long(x.wrapping_add(y)))),
                _ => {
                    let (x, y) = (a.as_f64(), b.as_f64());
                    let (Some(x), Some(y)) = (x, y) else { return Err(RunError::FunctionArgumentsError) };
                    Ok(Reference::Direct(Data::Double(x + y)))
                }
            }
        }
        _ => Err(RunError::FunctionArgumentsError),
    }
}

fn sub(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    match args.len() {
        1 => match eval_one(gc, ctx, args[0])? {
            Data::Long(v) => Ok(Reference::Direct(Data::Long(v.wrapping_neg()))),
            Data::Double(v) => Ok(Reference::Direct(Data::Double(-v))),
            _ => Err(RunError::FunctionArgumentsError),
        },
        2 => {
            let (a, b) = numeric_pair(gc, ctx, &args)?;
            match (a, b) {
                (Data::Long(x), Data::Long(y)) => Ok(Reference::Direct(Data::Long(x.wrapping_sub(y)))),
                _ => {
                    let (x, y) = (a.as_f64(), b.as_f64());
                    let (Some(x), Some(y)) = (x, y) else { return Err(RunError::FunctionArgumentsError) };
                    Ok(Reference::Direct(Data::Double(x - y)))
                }
            }
        }
        _ => Err(RunError::FunctionArgumentsError),
    }
}

fn mul(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    let (a, b) = numeric_pair(gc, ctx, &args)?;
    match (a, b) {
        (Data::Long(x), Data::Long(y)) => Ok(Reference::Direct(Data::Long(x.wrapping_mul(y)))),
        _ => {
            let (x, y) = (a.as_f64(), b.as_f64());
            let (Some(x), Some(y)) = (x, y) else { return Err(RunError::FunctionArgumentsError) };
            Ok(Reference::Direct(Data::Double(x * y)))
        }
    }
}

fn div(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    let (a, b) = numeric_pair(gc, ctx, &args)?;
    match (a, b) {
        (Data::Long(x), Data::Long(y)) => {
            if y == 0 {
                return Err(crate::eval::raise(gc, Data::Object(gc.exceptions.incorrect_function_arguments), position));
            }
            Ok(Reference::Direct(Data::Long(x.wrapping_div(y))))
        }
        _ => {
            let (x, y) = (a.as_f64(), b.as_f64());
            let (Some(x), Some(y)) = (x, y) else { return Err(RunError::FunctionArgumentsError) };
            Ok(Reference::Direct(Data::Double(x / y)))
        }
    }
}

fn rem(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    let (a, b) = numeric_pair(gc, ctx, &args)?;
    match (a, b) {
        (Data::Long(x), Data::Long(y)) => {
            if y == 0 {
                return Err(crate::eval::raise(gc, Data::Object(gc.exceptions.incorrect_function_arguments), position));
            }
            Ok(Reference::Direct(Data::Long(x.wrapping_rem(y))))
        }
        _ => {
            let (x, y) = (a.as_f64(), b.as_f64());
            let (Some(x), Some(y)) = (x, y) else { return Err(RunError::FunctionArgumentsError) };
            Ok(Reference::Direct(Data::Double(x % y)))
        }
    }
}

fn compare(gc: &mut GlobalContext, ctx: ContextId, args: &[&Expression]) -> Result<std::cmp::Ordering, RunError> {
    let (a, b) = numeric_pair(gc, ctx, args)?;
    match (a, b) {
        (Data::Char(x), Data::Char(y)) => Ok(x.cmp(&y)),
        _ => {
            let (x, y) = (a.as_f64(), b.as_f64());
            let (Some(x), Some(y)) = (x, y) else { return Err(RunError::FunctionArgumentsError) };
            x.partial_cmp(&y).ok_or(RunError::FunctionArgumentsError)
        }
    }
}

fn lt(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    Ok(Reference::Direct(Data::Bool(compare(gc, ctx, &args)?.is_lt())))
}

fn le(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    Ok(Reference::Direct(Data::Bool(compare(gc, ctx, &args)?.is_le())))
}

fn gt(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    Ok(Reference::Direct(Data::Bool(compare(gc, ctx, &args)?.is_gt())))
}

fn ge(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    Ok(Reference::Direct(Data::Bool(compare(gc, ctx, &args)?.is_ge())))
}

fn not_builtin(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    if args.len() != 1 {
        return Err(RunError::FunctionArgumentsError);
    }
    let value = eval_one(gc, ctx, args[0])?.as_bool().ok_or(RunError::FunctionArgumentsError)?;
    Ok(Reference::Direct(Data::Bool(!value)))
}

/// Short-circuiting logical AND: the right side is only ever evaluated if
/// the left side is `true`.
fn and_builtin(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    if args.len() != 2 {
        return Err(RunError::FunctionArgumentsError);
    }
    let left = eval_one(gc, ctx, args[0])?.as_bool().ok_or(RunError::FunctionArgumentsError)?;
    if !left {
        return Ok(Reference::Direct(Data::Bool(false)));
    }
    let right = eval_one(gc, ctx, args[1])?.as_bool().ok_or(RunError::FunctionArgumentsError)?;
    Ok(Reference::Direct(Data::Bool(right)))
}

/// Short-circuiting logical OR: the right side is only ever evaluated if
/// the left side is `false`.
fn or_builtin(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    if args.len() != 2 {
        return Err(RunError::FunctionArgumentsError);
    }
    let left = eval_one(gc, ctx, args[0])?.as_bool().ok_or(RunError::FunctionArgumentsError)?;
    if left {
        return Ok(Reference::Direct(Data::Bool(true)));
    }
    let right = eval_one(gc, ctx, args[1])?.as_bool().ok_or(RunError::FunctionArgumentsError)?;
    Ok(Reference::Direct(Data::Bool(right)))
}

fn display_data(gc: &GlobalContext, data: Data) -> String {
    match data {
        Data::Bool(b) => b.to_string(),
        Data::Long(v) => v.to_string(),
        Data::Double(v) => v.to_string(),
        Data::Char(c) => c.to_string(),
        Data::Object(id) => gc.string_contents(id).unwrap_or_else(|| format!("<object {id}>")),
    }
}

fn print_builtin(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    if args.len() != 1 {
        return Err(RunError::FunctionArgumentsError);
    }
    let value = eval_one(gc, ctx, args[0])?;
    let text = display_data(gc, value);
    gc.print(&text);
    Ok(Reference::Direct(value))
}

fn length_builtin(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    if args.len() != 1 {
        return Err(RunError::FunctionArgumentsError);
    }
    let value = eval_one(gc, ctx, args[0])?;
    let object_id = value.as_object().ok_or(RunError::FunctionArgumentsError)?;
    Ok(Reference::Direct(Data::Long(gc.object(object_id).array.len() as i64)))
}
