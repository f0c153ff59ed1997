//! The arena that owns every Object and Data-cell for one program run, plus
//! the handful of process-wide settings and singletons that live alongside
//! it (recursion limits, include path, predefined exceptions).

use std::io::Write;
use std::path::PathBuf;

use ahash::AHashSet;

use crate::exception::RunError;
use crate::object::Object;
use crate::value::{CellId, Data, DataCell};

pub type ObjectId = usize;

/// Recursion ceiling and the ordered include-path list seeding `import`
/// resolution. Constructed by the CLI from flags, defaulted for embedders.
#[derive(Debug, Clone)]
pub struct InterpreterLimits {
    pub max_recursion_depth: usize,
    pub include_paths: Vec<PathBuf>,
}

impl Default for InterpreterLimits {
    fn default() -> Self {
        Self { max_recursion_depth: 2000, include_paths: Vec::new() }
    }
}

/// The predefined exception values registered in every `GlobalContext`.
#[derive(Debug, Clone, Copy)]
pub struct ExceptionSingletons {
    pub not_a_function: ObjectId,
    pub incorrect_function_arguments: ObjectId,
    pub parser_exception: ObjectId,
    pub recursion_limit_exceeded: ObjectId,
}

/// Owns the heap (Objects), the Data-cell arena, the context-frame arena,
/// and the loader/limits state threaded through every `execute` call.
pub struct GlobalContext {
    objects: Vec<Object>,
    cells: Vec<DataCell>,
    pub(crate) contexts: Vec<crate::context::ContextFrame>,
    pub limits: InterpreterLimits,
    pub exceptions: ExceptionSingletons,
    pub loaded_sources: AHashSet<PathBuf>,
    call_stack: Vec<crate::position::Position>,
    stdout: Box<dyn Write>,
}

impl GlobalContext {
    pub fn new(limits: InterpreterLimits) -> Self {
        Self::with_stdout(limits, Box::new(std::io::stdout()))
    }

    pub fn with_stdout(limits: InterpreterLimits, stdout: Box<dyn Write>) -> Self {
        let mut gc = Self {
            objects: Vec::new(),
            cells: Vec::new(),
            contexts: vec![crate::context::ContextFrame::root()],
            limits,
            exceptions: ExceptionSingletons {
                not_a_function: 0,
                incorrect_function_arguments: 0,
                parser_exception: 0,
                recursion_limit_exceeded: 0,
            },
            loaded_sources: AHashSet::default(),
            call_stack: Vec::new(),
            stdout,
        };
        gc.exceptions = ExceptionSingletons {
            not_a_function: gc.new_named_exception("NotAFunction"),
            incorrect_function_arguments: gc.new_named_exception("IncorrectFunctionArguments"),
            parser_exception: gc.new_named_exception("ParserException"),
            recursion_limit_exceeded: gc.new_named_exception("RecursionLimitExceeded"),
        };
        gc
    }

    fn new_named_exception(&mut self, name: &str) -> ObjectId {
        let string_id = self.alloc_string(name);
        let object_id = self.new_object();
        let cell = self.new_cell(Some(Data::Object(string_id)));
        self.object_mut(object_id).properties.insert("name".to_owned(), cell);
        object_id
    }

    // -- object & cell arenas ------------------------------------------------

    pub fn new_object(&mut self) -> ObjectId {
        self.objects.push(Object::new());
        self.objects.len() - 1
    }

    pub fn new_empty_object(&mut self) -> ObjectId {
        self.new_object()
    }

    pub fn object(&self, id: ObjectId) -> &Object {
        &self.objects[id]
    }

    pub fn object_mut(&mut self, id: ObjectId) -> &mut Object {
        &mut self.objects[id]
    }

    pub fn new_cell(&mut self, data: Option<Data>) -> CellId {
        self.cells.push(DataCell { data });
        self.cells.len() - 1
    }

    pub fn read_cell(&self, cell: CellId) -> Result<Data, RunError> {
        self.cells[cell].data.ok_or(RunError::FunctionArgumentsError)
    }

    pub fn write_cell(&mut self, cell: CellId, value: Data) {
        self.cells[cell].data = Some(value);
    }

    pub fn cell_is_defined(&self, cell: CellId) -> bool {
        self.cells[cell].is_defined()
    }

    pub fn property_cell(&mut self, object: ObjectId, name: &str) -> CellId {
        if let Some(cell) = self.objects[object].properties.get(name) {
            return *cell;
        }
        let cell = self.new_cell(None);
        self.objects[object].properties.insert(name.to_owned(), cell);
        cell
    }

    pub fn array_cell(&self, object: ObjectId, index: usize) -> Option<CellId> {
        self.objects[object].array.get(index).copied()
    }

    /// Allocates a string Object: an Object whose `array` is the sequence
    /// of character Data-cells.
    pub fn alloc_string(&mut self, text: &str) -> ObjectId {
        let object = self.new_object();
        for ch in text.chars() {
            let cell = self.new_cell(Some(Data::Char(ch)));
            self.objects[object].array.push(cell);
        }
        object
    }

    /// Reads a string Object's characters back out as an owned `String`.
    /// Returns `None` if any array cell is undefined or not a `Char`.
    pub fn string_contents(&self, object: ObjectId) -> Option<String> {
        let mut out = String::with_capacity(self.objects[object].array.len());
        for cell in &self.objects[object].array {
            match self.cells[*cell].data {
                Some(Data::Char(c)) => out.push(c),
                _ => return None,
            }
        }
        Some(out)
    }

    // -- call stack (for Exception frames) ----------------------------------

    pub fn push_call_frame(&mut self, position: crate::position::Position) {
        self.call_stack.push(position);
    }

    pub fn pop_call_frame(&mut self) {
        self.call_stack.pop();
    }

    pub fn capture_stack(&self) -> Vec<crate::exception::StackFrame> {
        self.call_stack.iter().rev().map(|p| crate::exception::StackFrame { position: p.clone() }).collect()
    }

    // -- host I/O -------------------------------------------------------------

    pub fn print(&mut self, text: &str) {
        let _ = writeln!(self.stdout, "{text}");
    }
}
