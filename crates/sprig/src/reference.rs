//! Evaluation results: read/write handles into the heap.

use crate::exception::RunError;
use crate::heap::{GlobalContext, ObjectId};
use crate::value::{CellId, Data};

/// What evaluating an expression yields: either a plain value with no
/// place, or a handle that can be read and (for everything but `Direct`)
/// written back into.
#[derive(Debug, Clone)]
pub enum Reference {
    Direct(Data),
    Symbol(CellId),
    /// `(object, name)` resolved to the cell it names at evaluation time
    /// (the cell is auto-created then, per the Property evaluation rule).
    Property(CellId),
    Array(ObjectId, usize),
    Tuple(Vec<Reference>),
}

impl Reference {
    /// Collapses this reference to a `Data` value. A non-empty `Tuple`
    /// reference materialises a fresh Object whose `array` holds each
    /// element's data, per the Tuple/array-interchangeability invariant.
    pub fn read(&self, gc: &mut GlobalContext) -> Result<Data, RunError> {
        match self {
            Reference::Direct(d) => Ok(*d),
            Reference::Symbol(cell) => gc.read_cell(*cell),
            Reference::Property(cell) => gc.read_cell(*cell),
            Reference::Array(object, index) => {
                let cell = gc.array_cell(*object, *index).ok_or(RunError::FunctionArgumentsError)?;
                gc.read_cell(cell)
            }
            Reference::Tuple(items) => {
                if items.is_empty() {
                    return Ok(Data::Object(gc.new_empty_object()));
                }
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(item.read(gc)?);
                }
                let object = gc.new_object();
                for value in values {
                    let cell = gc.new_cell(Some(value));
                    gc.object_mut(object).array.push(cell);
                }
                Ok(Data::Object(object))
            }
        }
    }

    /// Writes `value` into the place this reference names.
    pub fn write(&self, gc: &mut GlobalContext, value: Data) -> Result<(), RunError> {
        match self {
            Reference::Direct(_) => Err(RunError::NotAnLValue),
            Reference::Symbol(cell) => {
                gc.write_cell(*cell, value);
                Ok(())
            }
            Reference::Property(cell) => {
                gc.write_cell(*cell, value);
                Ok(())
            }
            Reference::Array(object, index) => {
                let cell = gc.array_cell(*object, *index).ok_or(RunError::FunctionArgumentsError)?;
                gc.write_cell(cell, value);
                Ok(())
            }
            Reference::Tuple(items) => {
                let object = value.as_object().ok_or(RunError::FunctionArgumentsError)?;
                let array = gc.object(object).array.clone();
                if array.len() != items.len() {
                    return Err(RunError::FunctionArgumentsError);
                }
                for (item, cell) in items.iter().zip(array.iter()) {
                    let element = gc.read_cell(*cell)?;
                    item.write(gc, element)?;
                }
                Ok(())
            }
        }
    }
}
