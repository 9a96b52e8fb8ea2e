//! # Process Lifecycle
//!
//! `System::init` brings up the process-wide pieces (the logger), and
//! `System::quit` tears down the per-thread ones (the default
//! autorelease pool). Both are idempotent and may be called again.

use once_cell::sync::OnceCell;

use crate::core::drain_default_pool;

static LOGGER: OnceCell<()> = OnceCell::new();

/// Process-wide initialisation and teardown.
pub struct System;

impl System {
    /// Initialises the library. Safe to call more than once; later
    /// calls are no-ops.
    pub fn init() {
        LOGGER.get_or_init(|| {
            // Another logger may already be installed; that is fine.
            let _ = env_logger::Builder::from_default_env().try_init();
        });
        log::debug!("{} {} initialised", crate::NAME, crate::VERSION);
    }

    /// Tears down per-thread state: drains the calling thread's default
    /// autorelease pool. Safe to call more than once.
    pub fn quit() {
        drain_default_pool();
        log::logger().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{with_default_pool, IntValue};

    #[test]
    fn init_and_quit_are_idempotent() {
        System::init();
        System::init();

        IntValue::shared(1).autorelease();
        with_default_pool(|pool| assert_eq!(pool.len(), 1));
        System::quit();
        with_default_pool(|pool| assert!(pool.is_empty()));
        System::quit();
    }
}
