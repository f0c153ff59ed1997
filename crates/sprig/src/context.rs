//! Lexical scopes.
//!
//! Contexts form a chain terminating at the global frame (index 0). Rather
//! than borrowed parent links with a shared lifetime, the chain is an
//! index arena owned by `GlobalContext` itself: every `Context` is a plain
//! `usize`, so the evaluator threads `(&mut GlobalContext, ContextId)`
//! instead of juggling self-referential borrows through the recursive
//! tree walk.

use ahash::AHashMap;

use crate::exception::RunError;
use crate::heap::GlobalContext;
use crate::value::CellId;

pub type ContextId = usize;

pub const GLOBAL_CONTEXT: ContextId = 0;

#[derive(Debug)]
pub struct ContextFrame {
    parent: Option<ContextId>,
    bindings: AHashMap<String, CellId>,
    depth: usize,
}

impl ContextFrame {
    pub fn root() -> Self {
        Self { parent: None, bindings: AHashMap::default(), depth: 0 }
    }
}

impl GlobalContext {
    /// Pushes a fresh `FunctionContext` parented to `parent`, failing once
    /// the recursion ceiling is crossed.
    pub fn push_function_context(&mut self, parent: ContextId) -> Result<ContextId, RunError> {
        let depth = self.contexts[parent].depth + 1;
        if depth > self.limits.max_recursion_depth {
            return Err(RunError::RecursionLimitExceeded);
        }
        self.contexts.push(ContextFrame { parent: Some(parent), bindings: AHashMap::default(), depth });
        Ok(self.contexts.len() - 1)
    }

    pub fn add_symbol(&mut self, ctx: ContextId, name: &str, cell: CellId) {
        self.contexts[ctx].bindings.insert(name.to_owned(), cell);
    }

    pub fn has_symbol(&self, ctx: ContextId, name: &str) -> bool {
        let mut current = Some(ctx);
        while let Some(id) = current {
            if self.contexts[id].bindings.contains_key(name) {
                return true;
            }
            current = self.contexts[id].parent;
        }
        false
    }

    /// Returns the binding in the nearest frame; if absent, the global
    /// frame auto-creates an uninitialised cell and binds it there.
    pub fn lookup(&mut self, ctx: ContextId, name: &str) -> CellId {
        let mut current = Some(ctx);
        while let Some(id) = current {
            if let Some(cell) = self.contexts[id].bindings.get(name) {
                return *cell;
            }
            current = self.contexts[id].parent;
        }
        let cell = self.new_cell(None);
        self.add_symbol(GLOBAL_CONTEXT, name, cell);
        cell
    }

    /// Looks up `name` without creating a binding on a miss. Used to
    /// resolve captured free variables of a `FunctionDefinition`, where a
    /// name with no binding anywhere simply contributes nothing.
    pub fn try_lookup(&self, ctx: ContextId, name: &str) -> Option<CellId> {
        let mut current = Some(ctx);
        while let Some(id) = current {
            if let Some(cell) = self.contexts[id].bindings.get(name) {
                return Some(*cell);
            }
            current = self.contexts[id].parent;
        }
        None
    }
}
