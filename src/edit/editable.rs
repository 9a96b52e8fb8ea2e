//! Editable fields
//!
//! An [`Editable`] is a field slot whose mutations run through the undo
//! manager's setter protocol. Editable objects hold their fields in
//! these slots and reach their document's manager through
//! [`EditableObject::undo_manager`].

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use super::undo::SharedUndoManager;
use crate::core::Status;

/// A scalar member of an editable object.
///
/// The slot is shared between the object and any scalar undo records
/// capturing its prior values; that sharing is what lets a record
/// restore the field long after the setter returned.
#[derive(Debug, Default)]
pub struct Editable<T> {
    inner: Rc<RefCell<T>>,
}

impl<T> Editable<T> {
    /// Creates a slot holding `value`.
    pub fn new(value: T) -> Self {
        Editable {
            inner: Rc::new(RefCell::new(value)),
        }
    }

    /// Borrows the current value.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.inner.borrow()
    }

    pub(crate) fn inner(&self) -> &Rc<RefCell<T>> {
        &self.inner
    }

    pub(crate) fn replace(&self, value: T) -> T {
        self.inner.replace(value)
    }
}

impl<T: Clone> Editable<T> {
    /// Returns a copy of the current value.
    pub fn get(&self) -> T {
        self.inner.borrow().clone()
    }
}

/// The mutation surface of objects owned by a document.
///
/// Implementors supply the manager lookup; the provided methods are the
/// setter protocol and the transaction brackets for multi-field edits.
pub trait EditableObject {
    /// The undo manager of the owning document.
    fn undo_manager(&self) -> SharedUndoManager;

    /// Opens a transaction for a multi-field atomic edit.
    fn open_transaction(&self) {
        self.undo_manager().borrow_mut().open();
    }

    /// Closes the transaction; see
    /// [`UndoManager::close_transaction`](super::UndoManager::close_transaction).
    fn close_transaction(&self) -> Status {
        self.undo_manager().borrow_mut().close_transaction()
    }

    /// Sets member `slot` to `value` with no validity constraint.
    fn set_member<T: PartialEq + 'static>(&self, slot: &Editable<T>, value: T) -> Status {
        self.undo_manager().borrow_mut().set_member(slot, value)
    }

    /// Sets member `slot` to `value`, rejecting values that fail `valid`.
    fn set_member_checked<T: PartialEq + 'static>(
        &self,
        slot: &Editable<T>,
        value: T,
        valid: impl FnOnce(&T) -> bool,
    ) -> Status {
        self.undo_manager()
            .borrow_mut()
            .set_member_checked(slot, value, valid)
    }
}
