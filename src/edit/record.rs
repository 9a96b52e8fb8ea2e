//! Undo records
//!
//! The tagged variant of recorded inverse operations. Every record is
//! *self-inverting*: applying it exchanges the captured state with the
//! live state, so the same record serves undo and redo and a step can
//! bounce between the two stacks without copies.

use std::cell::RefCell;
use std::rc::Rc;

use crate::collections::linked_list::{ListState, NodeRef};
use crate::collections::object_map::MapState;
use crate::core::ObjectRef;

/// A scalar field change: the captured prior value swaps with the live
/// field content on every apply.
pub struct ScalarChange {
    swap: Box<dyn FnMut()>,
}

/// A structural list change; toggles between "node is linked" and
/// "node is unlinked", remembering the predecessor and successor.
pub struct ListChange {
    list: Rc<RefCell<ListState>>,
    node: NodeRef,
    prev: Option<NodeRef>,
    next: Option<NodeRef>,
    linked: bool,
}

/// A payload exchange between two list nodes.
pub struct ListSwap {
    a: NodeRef,
    b: NodeRef,
}

/// A map entry change: the captured prior mapping swaps with the live
/// mapping for the key on every apply.
pub struct MapChange {
    map: Rc<RefCell<MapState>>,
    key: String,
    prior: Option<ObjectRef>,
}

/// An ordered group of records treated atomically.
pub struct Composite {
    records: Vec<UndoRecord>,
    undone: bool,
}

/// One recorded inverse operation.
pub enum UndoRecord {
    /// A scalar member change on an editable object.
    Scalar(ScalarChange),
    /// A list insertion (applies as removal, then back).
    ListInsert(ListChange),
    /// A list removal (applies as re-insertion, then back).
    ListRemove(ListChange),
    /// A data exchange between two list nodes.
    ListSwap(ListSwap),
    /// A hash-map put (insert or overwrite).
    MapPut(MapChange),
    /// A hash-map removal.
    MapRemove(MapChange),
    /// An ordered list of records treated atomically.
    Composite(Composite),
}

impl UndoRecord {
    /// Records a scalar change; `swap` exchanges the captured prior
    /// value with the live field content.
    pub(crate) fn scalar(swap: impl FnMut() + 'static) -> Self {
        UndoRecord::Scalar(ScalarChange {
            swap: Box::new(swap),
        })
    }

    /// Records that `node` was just linked into `list`.
    pub(crate) fn list_insert(list: Rc<RefCell<ListState>>, node: NodeRef) -> Self {
        UndoRecord::ListInsert(ListChange {
            list,
            node,
            prev: None,
            next: None,
            linked: true,
        })
    }

    /// Records that `node` was just unlinked from between `prev` and
    /// `next`.
    pub(crate) fn list_remove(
        list: Rc<RefCell<ListState>>,
        node: NodeRef,
        prev: Option<NodeRef>,
        next: Option<NodeRef>,
    ) -> Self {
        UndoRecord::ListRemove(ListChange {
            list,
            node,
            prev,
            next,
            linked: false,
        })
    }

    /// Records a payload exchange between two nodes.
    pub(crate) fn list_swap(a: NodeRef, b: NodeRef) -> Self {
        UndoRecord::ListSwap(ListSwap { a, b })
    }

    /// Records a map put; `prior` is the value the key held before.
    pub(crate) fn map_put(
        map: Rc<RefCell<MapState>>,
        key: String,
        prior: Option<ObjectRef>,
    ) -> Self {
        UndoRecord::MapPut(MapChange { map, key, prior })
    }

    /// Records a map removal; `prior` is the removed value.
    pub(crate) fn map_remove(
        map: Rc<RefCell<MapState>>,
        key: String,
        prior: Option<ObjectRef>,
    ) -> Self {
        UndoRecord::MapRemove(MapChange { map, key, prior })
    }

    /// Groups `records` (in execution order) into one atomic unit.
    pub(crate) fn composite(records: Vec<UndoRecord>) -> Self {
        UndoRecord::Composite(Composite {
            records,
            undone: false,
        })
    }

    /// Applies the inverse of the recorded operation and turns the
    /// record into its own inverse.
    pub(crate) fn apply(&mut self) {
        match self {
            UndoRecord::Scalar(change) => (change.swap)(),
            UndoRecord::ListInsert(change) | UndoRecord::ListRemove(change) => change.toggle(),
            UndoRecord::ListSwap(swap) => swap.exchange(),
            UndoRecord::MapPut(change) | UndoRecord::MapRemove(change) => change.exchange(),
            UndoRecord::Composite(composite) => composite.toggle(),
        }
    }
}

impl ListChange {
    fn toggle(&mut self) {
        if self.linked {
            let (prev, next) = self.list.borrow_mut().unlink(&self.node);
            self.prev = prev;
            self.next = next;
            self.linked = false;
        } else {
            self.list
                .borrow_mut()
                .relink(&self.node, self.prev.take(), self.next.take());
            self.linked = true;
        }
    }
}

impl ListSwap {
    fn exchange(&mut self) {
        let mut a = self.a.borrow_mut();
        let mut b = self.b.borrow_mut();
        std::mem::swap(&mut a.data, &mut b.data);
    }
}

impl MapChange {
    fn exchange(&mut self) {
        let mut map = self.map.borrow_mut();
        let live = map.take_raw(&self.key);
        if let Some(value) = self.prior.take() {
            map.insert_raw(self.key.clone(), value);
        }
        self.prior = live;
    }
}

impl Composite {
    fn toggle(&mut self) {
        if self.undone {
            for record in self.records.iter_mut() {
                record.apply();
            }
        } else {
            for record in self.records.iter_mut().rev() {
                record.apply();
            }
        }
        self.undone = !self.undone;
    }
}
