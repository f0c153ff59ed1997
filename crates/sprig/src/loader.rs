//! Source file loading for `import`: resolves a requested path relative to
//! the importing file or the configured include path, then runs it once at
//! the global scope. A second `import` of the same canonical path is a
//! no-op that returns unit, so shared modules don't re-execute their
//! top-level side effects.

use std::path::{Path, PathBuf};

use crate::context::GLOBAL_CONTEXT;
use crate::eval::{execute, raise};
use crate::exception::RunError;
use crate::heap::GlobalContext;
use crate::position::Position;
use crate::reference::Reference;
use crate::value::Data;

fn resolve(gc: &GlobalContext, requested: &str, from: &Path) -> Option<PathBuf> {
    let candidate = Path::new(requested);
    if candidate.is_absolute() {
        return candidate.canonicalize().ok();
    }
    if let Some(parent) = from.parent() {
        let joined = parent.join(candidate);
        if joined.exists() {
            return joined.canonicalize().ok();
        }
    }
    for base in &gc.limits.include_paths {
        let joined = base.join(candidate);
        if joined.exists() {
            return joined.canonicalize().ok();
        }
    }
    candidate.canonicalize().ok()
}

pub fn load(gc: &mut GlobalContext, requested: &str, from_path: &str, position: &Position) -> Result<Reference, RunError> {
    let from = Path::new(from_path);
    let Some(resolved) = resolve(gc, requested, from) else {
        return Err(raise(gc, Data::Object(gc.exceptions.parser_exception), position));
    };
    if !gc.loaded_sources.insert(resolved.clone()) {
        return Ok(Reference::Direct(Data::Object(gc.new_empty_object())));
    }
    let Ok(source) = std::fs::read_to_string(&resolved) else {
        return Err(raise(gc, Data::Object(gc.exceptions.parser_exception), position));
    };
    let path_text = resolved.to_string_lossy().into_owned();
    let outcome = crate::parser::parse(&path_text, &source);
    if !outcome.errors.is_empty() {
        return Err(raise(gc, Data::Object(gc.exceptions.parser_exception), position));
    }
    execute(gc, GLOBAL_CONTEXT, &outcome.expression)
}
