//! `$`/`$==`: value vs. reference duplication of a single argument.

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
    register_system(gc, "$", copy);
    register_system(gc, "$==", copy_pointer);
}

/// Fails on Objects; a primitive copies itself into a fresh Direct Data.
fn copy(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    if args.len() != 1 {
        return Err(RunError::FunctionArgumentsError);
    }
    let value = execute(gc, ctx, args[0])?.read(gc)?;
    if matches!(value, Data::Object(_)) {
        return Err(RunError::FunctionArgumentsError);
    }
    Ok(Reference::Direct(value))
}

/// Returns the same Data unchanged: for an Object this shares the reference.
fn copy_pointer(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    if args.len() != 1 {
        return Err(RunError::FunctionArgumentsError);
    }
    let value = execute(gc, ctx, args[0])?.read(gc)?;
    Ok(Reference::Direct(value))
}
