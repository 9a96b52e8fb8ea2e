//! Undo manager
//!
//! Records inverse operations, groups them into transactions and undo
//! steps, and drives the document notification after a step applies.
//!
//! State machine:
//!
//! ```text
//!  Idle ──open()──▶ TransactionOpen ──append*──▶ TransactionOpen
//!  TransactionOpen ──close_transaction(ok)──▶ StepOpen (Idle if empty)
//!  TransactionOpen ──close_transaction(err)──▶ StepOpen (records discarded)
//!  StepOpen ──close()──▶ Idle (step pushed, redo stack cleared)
//!  Idle ──undo()──▶ top step applied in reverse, moved to redo
//!  Idle ──redo()──▶ symmetric
//! ```
//!
//! Records appended while no transaction is open go straight into the
//! open step, each as its own single-record transaction.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};

use super::editable::Editable;
use super::record::UndoRecord;
use crate::core::Status;

/// The shared handle through which documents and editable objects reach
/// their undo manager.
pub type SharedUndoManager = Rc<RefCell<UndoManager>>;

#[derive(Default)]
struct Transaction {
    records: Vec<UndoRecord>,
    saw_invalid: bool,
}

impl Transaction {
    fn single(record: UndoRecord) -> Self {
        Transaction {
            records: vec![record],
            saw_invalid: false,
        }
    }
}

#[derive(Default)]
struct UndoStep {
    transactions: Vec<Transaction>,
}

impl UndoStep {
    fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Transactional recorder of inverse operations with undo/redo stacks.
pub struct UndoManager {
    active: bool,
    transaction: Option<Transaction>,
    transaction_depth: u32,
    step: Option<UndoStep>,
    undo_stack: Vec<UndoStep>,
    redo_stack: Vec<UndoStep>,
    undo_limit: usize,
    after_step: Option<Box<dyn FnMut()>>,
}

impl UndoManager {
    /// Creates an active manager with unlimited history.
    pub fn new() -> Self {
        UndoManager {
            active: true,
            transaction: None,
            transaction_depth: 0,
            step: None,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            undo_limit: 0,
            after_step: None,
        }
    }

    /// Creates a manager behind the shared handle type.
    pub fn shared() -> SharedUndoManager {
        Rc::new(RefCell::new(Self::new()))
    }

    /// True while the manager records inverse operations.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Turns recording on or off. An inactive manager is a no-op
    /// recorder, useful during document load.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Caps the number of retained undo steps; the oldest steps are
    /// discarded beyond it. Zero means unlimited.
    pub fn set_undo_limit(&mut self, limit: usize) {
        self.undo_limit = limit;
        self.trim_history();
    }

    /// Installs the hook invoked after an undo or redo step applies,
    /// typically a document regeneration notification.
    pub fn set_after_step_hook(&mut self, hook: impl FnMut() + 'static) {
        self.after_step = Some(Box::new(hook));
    }

    /// Opens a transaction; nested calls only increase the depth.
    pub fn open(&mut self) {
        if self.transaction.is_none() {
            self.transaction = Some(Transaction::default());
        }
        self.transaction_depth += 1;
    }

    /// Closes one transaction level. Only the outermost close decides:
    /// a transaction that saw invalid input rolls its records back and
    /// reports it; an empty one collapses to `NotChanged`; otherwise the
    /// transaction joins the open undo step.
    pub fn close_transaction(&mut self) -> Status {
        if self.transaction.is_none() {
            warn!("close_transaction without an open transaction");
            return Status::NotChanged;
        }
        self.transaction_depth -= 1;
        if self.transaction_depth > 0 {
            return Status::Ok;
        }

        let mut transaction = self.transaction.take().expect("transaction is open");
        if transaction.saw_invalid {
            for record in transaction.records.iter_mut().rev() {
                record.apply();
            }
            debug!(
                "transaction rolled back ({} records)",
                transaction.records.len()
            );
            return Status::InvalidInput;
        }
        if transaction.records.is_empty() {
            return Status::NotChanged;
        }
        self.step
            .get_or_insert_with(UndoStep::default)
            .transactions
            .push(transaction);
        Status::Ok
    }

    /// True while a transaction is open.
    pub fn has_open_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// True while an undo step is accumulating transactions.
    pub fn has_open_undo_step(&self) -> bool {
        self.step.is_some()
    }

    /// Appends a record to the open transaction, or directly to the
    /// open step when none is. Dropped when the manager is inactive.
    pub fn append_record(&mut self, record: UndoRecord) {
        if !self.active {
            return;
        }
        match &mut self.transaction {
            Some(transaction) => transaction.records.push(record),
            None => self
                .step
                .get_or_insert_with(UndoStep::default)
                .transactions
                .push(Transaction::single(record)),
        }
    }

    /// Closes the open undo step and pushes it onto the undo stack,
    /// clearing the redo stack (a new history branch replaces the old
    /// forward history). Returns whether a step was pushed.
    pub fn close(&mut self) -> bool {
        while self.transaction.is_some() {
            warn!("close with an open transaction; closing it first");
            let _ = self.close_transaction();
        }
        match self.step.take() {
            Some(step) if !step.is_empty() => {
                self.undo_stack.push(step);
                self.redo_stack.clear();
                self.trim_history();
                true
            }
            _ => false,
        }
    }

    /// Applies the top undo step in reverse and moves it to the redo
    /// stack. An open step is closed first; an open transaction refuses.
    pub fn undo(&mut self) -> bool {
        if self.transaction.is_some() {
            warn!("undo with an open transaction is refused");
            return false;
        }
        if self.step.is_some() {
            self.close();
        }
        let Some(mut step) = self.undo_stack.pop() else {
            return false;
        };
        for transaction in step.transactions.iter_mut().rev() {
            for record in transaction.records.iter_mut().rev() {
                record.apply();
            }
        }
        self.redo_stack.push(step);
        debug!("undo applied; {} steps remain", self.undo_stack.len());
        self.notify_after_step();
        true
    }

    /// Re-applies the top redo step and moves it back to the undo stack.
    pub fn redo(&mut self) -> bool {
        if self.transaction.is_some() {
            warn!("redo with an open transaction is refused");
            return false;
        }
        let Some(mut step) = self.redo_stack.pop() else {
            return false;
        };
        for transaction in step.transactions.iter_mut() {
            for record in transaction.records.iter_mut() {
                record.apply();
            }
        }
        self.undo_stack.push(step);
        debug!("redo applied; {} steps remain", self.redo_stack.len());
        self.notify_after_step();
        true
    }

    /// Discards all history, the open step and any open transaction.
    pub fn clear_stacks(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.step = None;
        self.transaction = None;
        self.transaction_depth = 0;
    }

    /// Number of undoable steps.
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redoable steps.
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Sets member `slot` to `value` with no validity constraint.
    pub fn set_member<T: PartialEq + 'static>(
        &mut self,
        slot: &Editable<T>,
        value: T,
    ) -> Status {
        self.set_member_checked(slot, value, |_| true)
    }

    /// The setter protocol: equality short-circuits to `NotChanged`, a
    /// failed validation yields `InvalidInput` without side effects (and
    /// marks the enclosing transaction for rollback), otherwise a scalar
    /// record captures the prior value and the change applies.
    pub fn set_member_checked<T, F>(
        &mut self,
        slot: &Editable<T>,
        value: T,
        valid: F,
    ) -> Status
    where
        T: PartialEq + 'static,
        F: FnOnce(&T) -> bool,
    {
        if !valid(&value) {
            if let Some(transaction) = &mut self.transaction {
                transaction.saw_invalid = true;
            }
            return Status::InvalidInput;
        }
        if *slot.inner().borrow() == value {
            return Status::NotChanged;
        }
        let prior = slot.replace(value);
        if self.active {
            let cell = slot.inner().clone();
            let mut held = prior;
            self.append_record(UndoRecord::scalar(move || {
                std::mem::swap(&mut *cell.borrow_mut(), &mut held);
            }));
        }
        Status::Ok
    }

    fn trim_history(&mut self) {
        if self.undo_limit == 0 {
            return;
        }
        while self.undo_stack.len() > self.undo_limit {
            self.undo_stack.remove(0);
        }
    }

    fn notify_after_step(&mut self) {
        if let Some(hook) = self.after_step.as_mut() {
            hook();
        }
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}
