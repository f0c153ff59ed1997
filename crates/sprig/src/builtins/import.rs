//! `import`: a thin wrapper handing a string-valued argument to the source
//! loader.

use crate::context::ContextId;
use crate::eval::execute;
use crate::exception::RunError;
use crate::expr::Expression;
use crate::heap::GlobalContext;
use crate::position::Position;
use crate::reference::Reference;

use super::{as_args, register_system};

pub fn register(gc: &mut GlobalContext) {
    register_system(gc, "import", import);
}

fn import(gc: &mut GlobalContext, ctx: ContextId, arg: &Expression, position: &Position) -> Result<Reference, RunError> {
    let args = as_args(arg);
    if args.len() != 1 {
        return Err(RunError::FunctionArgumentsError);
    }
    let value = execute(gc, ctx, args[0])?.read(gc)?;
    let object_id = value.as_object().ok_or(RunError::FunctionArgumentsError)?;
    let text = gc.string_contents(object_id).ok_or(RunError::FunctionArgumentsError)?;
    crate::loader::load(gc, &text, &position.path, position)
}
