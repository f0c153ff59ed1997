//! Heap objects and the functions attached to them.

use std::any::Any;
use std::rc::Rc;

use ahash::AHashMap;

use crate::expr::FunctionDefinitionExpr;
use crate::heap::GlobalContext;
use crate::position::Position;
use crate::reference::Reference;
use crate::value::CellId;

/// Heap record: named properties, an overload list, an index array, and an
/// opaque host payload for streams/native handles.
#[derive(Default)]
pub struct Object {
    pub properties: AHashMap<String, CellId>,
    pub functions: Vec<Rc<Function>>,
    pub array: Vec<CellId>,
    pub host: Option<Box<dyn Any>>,
}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object")
            .field("properties", &self.properties)
            .field("functions", &self.functions.len())
            .field("array", &self.array)
            .field("host", &self.host.is_some())
            .finish()
    }
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Each builtin's Rust implementation. Receives the pre-pushed
/// `FunctionContext` it should bind parameters and run in, the call's raw
/// (unevaluated) argument expression, and the call site position.
pub type SystemCallable =
    fn(&mut GlobalContext, ContextId, &crate::expr::Expression, &Position) -> Result<Reference, crate::exception::RunError>;

pub use crate::context::ContextId;

/// A callable attached to an Object's overload list.
pub enum Function {
    Custom { definition: Rc<FunctionDefinitionExpr>, captured: Rc<AHashMap<String, CellId>> },
    System { name: &'static str, callable: SystemCallable, captured: Rc<AHashMap<String, CellId>> },
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Function::Custom { definition, .. } => {
                f.debug_struct("Function::Custom").field("position", &definition.position).finish()
            }
            Function::System { name, .. } => f.debug_struct("Function::System").field("name", name).finish(),
        }
    }
}
