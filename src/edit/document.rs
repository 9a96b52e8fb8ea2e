//! Documents
//!
//! A document owns exactly one undo manager, the root container of its
//! editable objects and optional preferences. It is the lookup point
//! for "which undo manager applies here"; editable objects reach the
//! manager through a shared handle instead of a counted back-pointer.

use uuid::Uuid;

use super::preferences::Preferences;
use super::undo::{SharedUndoManager, UndoManager};
use crate::core::Status;

/// The lifecycle surface a concrete document implements.
///
/// Lifecycle: `init_new_document` then any number of loads and edits,
/// then `save_document`.
pub trait Document {
    /// The undo manager applying to this document's objects.
    fn undo_manager(&self) -> SharedUndoManager;

    /// Initialises a fresh document, optionally from preferences.
    fn init_new_document(&mut self, preferences: Option<Preferences>) -> Status;

    /// Loads the document content from its backing store.
    fn load_document(&mut self) -> Status;

    /// Saves the document content to its backing store.
    fn save_document(&mut self) -> Status;
}

/// The state every document carries; concrete documents embed it.
pub struct DocumentCore {
    id: Uuid,
    undo: SharedUndoManager,
    preferences: Option<Preferences>,
}

impl DocumentCore {
    /// Creates the core with a fresh undo manager and identity.
    pub fn new() -> Self {
        DocumentCore {
            id: Uuid::new_v4(),
            undo: UndoManager::shared(),
            preferences: None,
        }
    }

    /// Stable identity of this document; back-references are resolved
    /// through it rather than through counted pointers.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// A handle to the document's undo manager.
    pub fn undo_manager(&self) -> SharedUndoManager {
        self.undo.clone()
    }

    /// The document preferences, if any were supplied.
    pub fn preferences(&self) -> Option<&Preferences> {
        self.preferences.as_ref()
    }

    /// Replaces the document preferences.
    pub fn set_preferences(&mut self, preferences: Option<Preferences>) {
        self.preferences = preferences;
    }

    /// Installs the regeneration notification invoked after an undo or
    /// redo step applies to this document.
    pub fn set_regeneration_hook(&self, hook: impl FnMut() + 'static) {
        self.undo.borrow_mut().set_after_step_hook(hook);
    }
}

impl Default for DocumentCore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Sketch {
        core: DocumentCore,
    }

    impl Document for Sketch {
        fn undo_manager(&self) -> SharedUndoManager {
            self.core.undo_manager()
        }

        fn init_new_document(&mut self, preferences: Option<Preferences>) -> Status {
            self.core.set_preferences(preferences);
            Status::Ok
        }

        fn load_document(&mut self) -> Status {
            Status::Ok
        }

        fn save_document(&mut self) -> Status {
            Status::Ok
        }
    }

    #[test]
    fn documents_have_distinct_identities() {
        let a = DocumentCore::new();
        let b = DocumentCore::new();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn lifecycle_and_regeneration_hook() {
        let mut doc = Sketch {
            core: DocumentCore::new(),
        };
        let mut prefs = Preferences::new();
        prefs.set("units", "mm");
        assert_eq!(doc.init_new_document(Some(prefs)), Status::Ok);
        assert_eq!(doc.core.preferences().unwrap().get("units"), Some("mm"));

        let regenerated = Rc::new(Cell::new(0));
        let seen = regenerated.clone();
        doc.core.set_regeneration_hook(move || seen.set(seen.get() + 1));

        let um = doc.undo_manager();
        let field = crate::edit::Editable::new(1i64);
        let _ = um.borrow_mut().set_member(&field, 2);
        um.borrow_mut().close();
        um.borrow_mut().undo();
        assert_eq!(regenerated.get(), 1);
        assert_eq!(doc.load_document(), Status::Ok);
        assert_eq!(doc.save_document(), Status::Ok);
    }
}
