//! # Editing Core
//!
//! The transactional undo manager and the protocols built on it: scalar
//! field edits through [`Editable`] slots, documents as the lookup point
//! for "which undo manager applies here", and typed preferences with
//! JSON persistence.
//!
//! Mutations record *inverse* operations. Closing the outermost
//! transaction appends it to the open undo step; closing the step pushes
//! it onto the undo stack and clears the redo stack. Undo applies a
//! step's records in reverse insertion order and moves the step to the
//! redo stack; redo mirrors it back.

pub mod document;
pub mod editable;
pub mod preferences;
pub mod record;
pub mod undo;

pub use document::{Document, DocumentCore};
pub use editable::{Editable, EditableObject};
pub use preferences::Preferences;
pub use record::UndoRecord;
pub use undo::{SharedUndoManager, UndoManager};
