//! Doubly-linked list with undo support
//!
//! Each node owns one shared object reference. The list keeps a single
//! forward cursor (`rewind` / `has_next` / `next`); removing the cursor
//! node advances the cursor, any other mutation during iteration is the
//! caller's problem. Mutations record their inverses when an active
//! undo manager is supplied.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::core::{ObjectRef, Status};
use crate::edit::record::UndoRecord;
use crate::edit::SharedUndoManager;

pub(crate) type NodeRef = Rc<RefCell<Node>>;

pub(crate) struct Node {
    pub(crate) data: ObjectRef,
    pub(crate) next: Option<NodeRef>,
    pub(crate) prev: Option<Weak<RefCell<Node>>>,
}

#[derive(Default)]
pub(crate) struct ListState {
    head: Option<NodeRef>,
    tail: Option<NodeRef>,
    cursor: Option<NodeRef>,
    len: usize,
}

impl ListState {
    /// Appends `data` in a fresh node at the tail.
    fn append(&mut self, data: ObjectRef) -> NodeRef {
        let node = Rc::new(RefCell::new(Node {
            data,
            next: None,
            prev: None,
        }));
        match self.tail.take() {
            Some(tail) => {
                node.borrow_mut().prev = Some(Rc::downgrade(&tail));
                tail.borrow_mut().next = Some(node.clone());
                self.tail = Some(node.clone());
            }
            None => {
                self.head = Some(node.clone());
                self.tail = Some(node.clone());
            }
        }
        self.len += 1;
        node
    }

    /// Inserts `data` in a fresh node immediately before `reference`.
    fn insert_before(&mut self, reference: &NodeRef, data: ObjectRef) -> NodeRef {
        let prev = reference.borrow().prev.as_ref().and_then(Weak::upgrade);
        let node = Rc::new(RefCell::new(Node {
            data,
            next: Some(reference.clone()),
            prev: prev.as_ref().map(Rc::downgrade),
        }));
        reference.borrow_mut().prev = Some(Rc::downgrade(&node));
        match &prev {
            Some(prev) => prev.borrow_mut().next = Some(node.clone()),
            None => self.head = Some(node.clone()),
        }
        self.len += 1;
        node
    }

    /// Takes `node` out of the chain, returning its former neighbours.
    /// A cursor resting on the node advances to its successor.
    pub(crate) fn unlink(&mut self, node: &NodeRef) -> (Option<NodeRef>, Option<NodeRef>) {
        let prev = node.borrow().prev.as_ref().and_then(Weak::upgrade);
        let next = node.borrow().next.clone();

        match &prev {
            Some(prev_node) => prev_node.borrow_mut().next = next.clone(),
            None => self.head = next.clone(),
        }
        match &next {
            Some(next_node) => next_node.borrow_mut().prev = prev.as_ref().map(Rc::downgrade),
            None => self.tail = prev.clone(),
        }
        if self
            .cursor
            .as_ref()
            .map(|c| Rc::ptr_eq(c, node))
            .unwrap_or(false)
        {
            self.cursor = next.clone();
        }

        node.borrow_mut().next = None;
        node.borrow_mut().prev = None;
        self.len -= 1;
        (prev, next)
    }

    /// Splices `node` back between the given neighbours.
    pub(crate) fn relink(
        &mut self,
        node: &NodeRef,
        prev: Option<NodeRef>,
        next: Option<NodeRef>,
    ) {
        node.borrow_mut().prev = prev.as_ref().map(Rc::downgrade);
        node.borrow_mut().next = next.clone();
        match &prev {
            Some(prev_node) => prev_node.borrow_mut().next = Some(node.clone()),
            None => self.head = Some(node.clone()),
        }
        match &next {
            Some(next_node) => next_node.borrow_mut().prev = Some(Rc::downgrade(node)),
            None => self.tail = Some(node.clone()),
        }
        self.len += 1;
    }

    /// Finds the node whose payload is the same allocation as `data`.
    fn find(&self, data: &ObjectRef) -> Option<NodeRef> {
        let mut current = self.head.clone();
        while let Some(node) = current {
            if ObjectRef::ptr_eq(&node.borrow().data, data) {
                return Some(node);
            }
            current = node.borrow().next.clone();
        }
        None
    }
}

/// A doubly-linked list of shared objects with undo-aware mutations.
#[derive(Default)]
pub struct LinkedList {
    state: Rc<RefCell<ListState>>,
}

impl LinkedList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(um: Option<&SharedUndoManager>, record: UndoRecord) {
        if let Some(um) = um {
            um.borrow_mut().append_record(record);
        }
    }

    /// Appends `data` at the tail.
    pub fn add(&self, data: ObjectRef, um: Option<&SharedUndoManager>) {
        let node = self.state.borrow_mut().append(data);
        Self::record(um, UndoRecord::list_insert(self.state.clone(), node));
    }

    /// Inserts `item` immediately before the element `before`.
    pub fn add_before(
        &self,
        before: &ObjectRef,
        item: ObjectRef,
        um: Option<&SharedUndoManager>,
    ) -> Status {
        let Some(reference) = self.state.borrow().find(before) else {
            return Status::NotFound;
        };
        let node = self.state.borrow_mut().insert_before(&reference, item);
        Self::record(um, UndoRecord::list_insert(self.state.clone(), node));
        Status::Ok
    }

    /// Removes the element `data` from the list.
    pub fn remove(&self, data: &ObjectRef, um: Option<&SharedUndoManager>) -> Status {
        let Some(node) = self.state.borrow().find(data) else {
            return Status::NotFound;
        };
        let (prev, next) = self.state.borrow_mut().unlink(&node);
        Self::record(
            um,
            UndoRecord::list_remove(self.state.clone(), node, prev, next),
        );
        Status::Ok
    }

    /// Exchanges the payloads of the nodes holding `a` and `b`.
    pub fn swap_data(
        &self,
        a: &ObjectRef,
        b: &ObjectRef,
        um: Option<&SharedUndoManager>,
    ) -> Status {
        let (node_a, node_b) = {
            let state = self.state.borrow();
            match (state.find(a), state.find(b)) {
                (Some(na), Some(nb)) => (na, nb),
                _ => return Status::NotFound,
            }
        };
        if Rc::ptr_eq(&node_a, &node_b) {
            return Status::NotChanged;
        }
        {
            let mut borrow_a = node_a.borrow_mut();
            let mut borrow_b = node_b.borrow_mut();
            std::mem::swap(&mut borrow_a.data, &mut borrow_b.data);
        }
        Self::record(um, UndoRecord::list_swap(node_a, node_b));
        Status::Ok
    }

    /// Removes every element, recording one composite inverse built from
    /// removals running tail to head.
    pub fn clear(&self, um: Option<&SharedUndoManager>) {
        let mut removals = Vec::new();
        loop {
            let tail = self.state.borrow().tail.clone();
            let Some(node) = tail else { break };
            let (prev, next) = self.state.borrow_mut().unlink(&node);
            removals.push(UndoRecord::list_remove(
                self.state.clone(),
                node,
                prev,
                next,
            ));
        }
        if !removals.is_empty() {
            Self::record(um, UndoRecord::composite(removals));
        }
    }

    /// Number of elements in the list.
    pub fn size(&self) -> usize {
        self.state.borrow().len
    }

    /// True when the list holds no elements.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// The first element, if any.
    pub fn first(&self) -> Option<ObjectRef> {
        self.state
            .borrow()
            .head
            .as_ref()
            .map(|n| n.borrow().data.clone())
    }

    /// The last element, if any.
    pub fn last(&self) -> Option<ObjectRef> {
        self.state
            .borrow()
            .tail
            .as_ref()
            .map(|n| n.borrow().data.clone())
    }

    /// Resets the cursor to the head.
    pub fn rewind(&self) {
        let mut state = self.state.borrow_mut();
        state.cursor = state.head.clone();
    }

    /// True while the cursor has an element to return.
    pub fn has_next(&self) -> bool {
        self.state.borrow().cursor.is_some()
    }

    /// Returns the element under the cursor and advances it.
    pub fn next(&self) -> Option<ObjectRef> {
        let mut state = self.state.borrow_mut();
        let current = state.cursor.clone()?;
        state.cursor = current.borrow().next.clone();
        let data = current.borrow().data.clone();
        Some(data)
    }

    /// Snapshot of the payloads in list order.
    pub fn values(&self) -> Vec<ObjectRef> {
        let mut out = Vec::with_capacity(self.size());
        let mut current = self.state.borrow().head.clone();
        while let Some(node) = current {
            out.push(node.borrow().data.clone());
            current = node.borrow().next.clone();
        }
        out
    }
}
