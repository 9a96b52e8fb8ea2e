//! Autorelease pool
//!
//! A pool collects object references scheduled for deferred release via
//! [`ObjectRef::autorelease`]. Draining releases every enqueued reference
//! exactly once, in enqueue order. Each thread owns one default pool,
//! reached implicitly when `autorelease` is called.

use parking_lot::Mutex;

use super::object::ObjectRef;

/// A FIFO of object references awaiting their deferred release.
///
/// The entry list is guarded by a mutex; `drain` detaches the whole list
/// under the lock and releases outside of it, so `autorelease` calls made
/// from destructors re-enter safely and are processed by the next drain.
#[derive(Default)]
pub struct AutoreleasePool {
    entries: Mutex<Vec<ObjectRef>>,
}

impl AutoreleasePool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `object`, taking over its reference.
    pub fn add(&self, object: ObjectRef) {
        self.entries.lock().push(object);
    }

    /// Number of references currently awaiting release.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True if nothing is enqueued.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Releases every enqueued reference once, in enqueue order.
    ///
    /// References enqueued while the drain is running are kept for the
    /// next drain.
    pub fn drain(&self) {
        let detached = std::mem::take(&mut *self.entries.lock());
        for object in detached {
            drop(object);
        }
    }
}

impl Drop for AutoreleasePool {
    fn drop(&mut self) {
        self.drain();
    }
}

thread_local! {
    static DEFAULT_POOL: AutoreleasePool = AutoreleasePool::new();
}

pub(crate) fn add_to_default_pool(object: ObjectRef) {
    DEFAULT_POOL.with(|pool| pool.add(object));
}

/// Drains the calling thread's default autorelease pool.
pub fn drain_default_pool() {
    DEFAULT_POOL.with(|pool| pool.drain());
}

/// Runs `f` with the calling thread's default pool.
pub fn with_default_pool<R>(f: impl FnOnce(&AutoreleasePool) -> R) -> R {
    DEFAULT_POOL.with(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::object::{Comparable, CoreObject, DiffPrintable, Displayable};
    use crate::diff::DiffOperation;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Ordered {
        tag: usize,
        order: Rc<RefCell<Vec<usize>>>,
    }

    impl Drop for Ordered {
        fn drop(&mut self) {
            self.order.borrow_mut().push(self.tag);
        }
    }

    impl Comparable for Ordered {
        fn equals(&self, _other: &dyn CoreObject) -> bool {
            false
        }
    }

    impl Displayable for Ordered {
        fn display_name(&self) -> String {
            format!("ordered {}", self.tag)
        }
    }

    impl DiffPrintable for Ordered {
        fn print_diff_info(&self, _operation: DiffOperation, _other: Option<&dyn CoreObject>) {}
    }

    #[test]
    fn drain_releases_in_enqueue_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let pool = AutoreleasePool::new();
        for tag in 0..4 {
            pool.add(ObjectRef::new(Ordered {
                tag,
                order: order.clone(),
            }));
        }
        assert_eq!(pool.len(), 4);
        pool.drain();
        assert!(pool.is_empty());
        assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn default_pool_takes_autoreleased_references() {
        drain_default_pool();
        let order = Rc::new(RefCell::new(Vec::new()));
        let obj = ObjectRef::new(Ordered {
            tag: 9,
            order: order.clone(),
        });
        obj.autorelease();
        assert!(order.borrow().is_empty());
        with_default_pool(|pool| assert_eq!(pool.len(), 1));
        drain_default_pool();
        assert_eq!(*order.borrow(), vec![9]);
        with_default_pool(|pool| assert!(pool.is_empty()));
    }
}
