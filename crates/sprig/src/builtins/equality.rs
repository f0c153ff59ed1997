//! `==`/`!=` (structural equality, walking arrays and properties) and
//! `===`/`!==` (identity: same Object id, or equal primitive).

use ahash::AHashSet;

use crate::context::ContextId;
use crate::eval::execute;
use crate::exception::RunError;
use crate::expr::Expression;
use crate::heap::{GlobalContext, ObjectId};
use crate::position::Position;
use crate::reference::Reference;
use crate::value::Data;

use super::{as_args, register_system};

pub fn register(gc: &mut GlobalContext) {
    register_system(gc, "==", eq);
    register_system(gc, "!=", neq);
    register_system(gc, "===", identical);
    register_system(gc, "!==", not_identical);
}

/// Deep structural equality bounded against cycles: once a pair of Object
/// ids is already being compared further up the walk, it's taken as equal
/// rather than recursing forever.
pub fn data_equal(gc: &GlobalContext, a: Data, b: Data) -> bool {
    let mut seen = AHashSet::default();
    deep_eq(gc, a, b, &mut seen)
}

fn deep_eq(gc: &GlobalContext, a: Data, b: Data, seen: &mut AHashSet<(ObjectId, ObjectId)>) -> bool {
    match (a, b) {
        (Data::Object(x), Data::Object(y)) => {
            if x == y {
                return true;
            }
            if !seen.insert((x, y)) {
                return true;
            }
            let oa = gc.object(x);
            let ob = gc.object(y);
            if oa.array.len() != ob.array.len() {
                return false;
            }
            for (ca, cb) in oa.array.iter().zip(ob.array.iter()) {
                let (Ok(da), Ok(db)) = (gc.read_cell(*ca), gc.read_cell(*cb)) else { return false };
                if !deep_eq(gc, da, db, seen) {
                    return false;
                }
            }
            if oa.properties.len() != ob.properties.len() {
                return false;
            }
            for (name, cell_a) in oa.properties.iter() {
                let Some(cell_b) = ob.properties.get(name) else { return false };
                let (Ok(da), Ok(db)) = (gc.read_cell(*cell_a), gc.read_cell(*cell_b)) else { return false };
                if !deep_eq(gc, da, db, seen) {
                    return false;
                }
            }
            true
        }
        (Data::Long(x), Data::Double(y)) | (Data::Double(y), Data::Long(x)) => (x as f64) == y,
        _ => a == b,
    }
}

fn eq(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    if args.len() != 2 {
        return Err(RunError::FunctionArgumentsError);
    }
    let a = execute(gc, ctx, args[0])?.read(gc)?;
    let b = execute(gc, ctx, args[1])?.read(gc)?;
    Ok(Reference::Direct(Data::Bool(data_equal(gc, a, b))))
}

fn neq(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, position: &Position) -> Result<Reference, RunError> {
    match eq(gc, ctx, arg, position)?.read(gc)? {
        Data::Bool(b) => Ok(Reference::Direct(Data::Bool(!b))),
        _ => unreachable!("eq always returns a Bool"),
    }
}

fn identical(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, _position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    if args.len() != 2 {
        return Err(RunError::FunctionArgumentsError);
    }
    let a = execute(gc, ctx, args[0])?.read(gc)?;
    let b = execute(gc, ctx, args[1])?.read(gc)?;
    Ok(Reference::Direct(Data::Bool(a == b)))
}

fn not_identical(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, position: &Position) -> Result<Reference, RunError> {
    match identical(gc, ctx, arg, position)?.read(gc)? {
        Data::Bool(b) => Ok(Reference::Direct(Data::Bool(!b))),
        _ => unreachable!("identical always returns a Bool"),
    }
}
