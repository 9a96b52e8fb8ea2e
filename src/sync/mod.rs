//! # Synchronisation Primitives
//!
//! The single mutex abstraction of the library: lock/unlock through a
//! scoped guard that releases on every exit path, plus condition
//! signalling (`sleep` blocks the calling thread, `wake_up` signals one
//! waiter). There is no reentrance guarantee.

use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard};

/// A mutex with condition signalling.
#[derive(Default)]
pub struct CoreMutex {
    state: Mutex<()>,
    signal: Condvar,
}

/// The scoped guard returned by [`CoreMutex::lock`]; dropping it
/// releases the mutex.
pub struct Lock<'a> {
    guard: MutexGuard<'a, ()>,
}

impl CoreMutex {
    /// Creates an unlocked mutex.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the mutex, blocking until it is available.
    pub fn lock(&self) -> Lock<'_> {
        Lock {
            guard: self.state.lock(),
        }
    }

    /// Blocks the calling thread on the mutex's condition variable. The
    /// lock is released while sleeping and re-acquired before returning.
    pub fn sleep(&self, lock: &mut Lock<'_>) {
        self.signal.wait(&mut lock.guard);
    }

    /// Like [`sleep`](Self::sleep) with an upper bound; returns `false`
    /// when the wait timed out.
    pub fn sleep_for(&self, lock: &mut Lock<'_>, timeout: Duration) -> bool {
        !self.signal.wait_for(&mut lock.guard, timeout).timed_out()
    }

    /// Signals one thread sleeping on this mutex.
    pub fn wake_up(&self) {
        self.signal.notify_one();
    }
}

/// Suspends the calling thread for at least `milliseconds`.
pub fn sleep_ms(milliseconds: u64) {
    std::thread::sleep(Duration::from_millis(milliseconds));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn guard_releases_on_drop() {
        let mutex = CoreMutex::new();
        {
            let _lock = mutex.lock();
        }
        // A second acquisition would deadlock if the guard leaked.
        let _lock = mutex.lock();
    }

    #[test]
    fn wake_up_releases_a_sleeper() {
        let mutex = Arc::new(CoreMutex::new());
        let woken = Arc::new(AtomicBool::new(false));

        let thread_mutex = mutex.clone();
        let thread_woken = woken.clone();
        let handle = std::thread::spawn(move || {
            let mut lock = thread_mutex.lock();
            let signalled = thread_mutex.sleep_for(&mut lock, Duration::from_secs(5));
            thread_woken.store(signalled, Ordering::SeqCst);
        });

        // Give the sleeper time to park, then signal it.
        sleep_ms(50);
        mutex.wake_up();
        handle.join().unwrap();
        assert!(woken.load(Ordering::SeqCst));
    }

    #[test]
    fn sleep_for_times_out_without_a_signal() {
        let mutex = CoreMutex::new();
        let mut lock = mutex.lock();
        assert!(!mutex.sleep_for(&mut lock, Duration::from_millis(10)));
    }
}
