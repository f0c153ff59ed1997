//! `:=`: evaluates its left side as a place (not a value) and writes the
//! right side's value into it. The assignment expression's own value is
//! whatever was written, so assignments chain: `a := b := 1`.

use crate::context::ContextId;
use crate::eval::execute;
use crate::exception::RunError;
use crate::expr::Expression;
use crate::heap::GlobalContext;
use crate::position::Position;
use crate::reference::Reference;

use super::{as_args, register_system};

pub fn register(gc: &mut GlobalContext) {
    register_system(gc, ":=", assign);
    register_system(gc, ":", define_method);
}

fn assign(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    if args.len() != 2 {
        return Err(RunError::FunctionArgumentsError);
    }
    let target = execute(gc, ctx, args[0])?;
    let value = execute(gc, ctx, args[1])?.read(gc)?;
    let value = fold_into_existing_overloads(gc, &target, value);
    target.write(gc, value)?;
    Ok(Reference::Direct(value))
}

/// `var : data`: method definition. Prepends `data`'s functions onto
/// `var`'s functions in place, so `var`'s object keeps its identity but
/// gains `data`'s overloads at the front (highest dispatch priority).
/// Distinct from `:=`'s overload folding: `:` always mutates `var`'s
/// existing object rather than only kicking in when `:=` happens to
/// reassign a function-valued place.
fn define_method(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    if args.len() != 2 {
        return Err(RunError::FunctionArgumentsError);
    }
    let var = execute(gc, ctx, args[0])?.read(gc)?;
    let data = execute(gc, ctx, args[1])?.read(gc)?;
    let var_id = var.as_object().ok_or(RunError::FunctionArgumentsError)?;
    let data_id = data.as_object().ok_or(RunError::FunctionArgumentsError)?;
    let mut functions = gc.object(data_id).functions.clone();
    functions.extend(gc.object(var_id).functions.iter().cloned());
    gc.object_mut(var_id).functions = functions;
    Ok(Reference::Direct(var))
}

/// `name := (params) |-> body` assigned over an existing function-valued
/// place adds an overload instead of replacing it: the new definition is
/// spliced onto the front (highest dispatch priority) of the place's
/// current function list, and the place keeps its existing Object id so
/// anything else already holding that value sees the new overload too.
fn fold_into_existing_overloads(gc: &mut GlobalContext, target: &Reference, value: crate::value::Data) -> crate::value::Data {
    let crate::value::Data::Object(new_id) = value else { return value };
    let new_object = gc.object(new_id);
    if new_object.functions.is_empty() || !new_object.array.is_empty() || !new_object.properties.is_empty() {
        return value;
    }
    let Ok(existing) = target.read(gc) else { return value };
    let crate::value::Data::Object(existing_id) = existing else { return value };
    if existing_id == new_id || gc.object(existing_id).functions.is_empty() {
        return value;
    }
    let mut functions = gc.object(new_id).functions.clone();
    functions.extend(gc.object(existing_id).functions.iter().cloned());
    gc.object_mut(existing_id).functions = functions;
    crate::value::Data::Object(existing_id)
}
