use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::captions::{FooterHelpStack, FooterStatusStack, HeaderStack};
use super::escape::EscapeRouter;
use super::stack::ListenerGuard;

/// The shared stacks every screen publishes into.
///
/// Created once per TUI session by the runtime and handed to each screen. Cloning is
/// cheap and all clones share the same stacks, so tests can build a fresh, isolated kernel
/// per case.
#[derive(Clone, Default)]
pub struct Kernel {
    pub escape: EscapeRouter,
    pub header: HeaderStack,
    pub footer_help: FooterHelpStack,
    pub footer_status: FooterStatusStack,
}

impl Kernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to all three caption stacks.
    ///
    /// The returned flag is raised after any caption change; the guards keep the
    /// subscriptions alive.
    pub fn watch_captions(&self) -> (Arc<AtomicBool>, Vec<ListenerGuard>) {
        let dirty = Arc::new(AtomicBool::new(true));
        let flag = |dirty: &Arc<AtomicBool>| {
            let dirty = dirty.clone();
            move || dirty.store(true, Ordering::SeqCst)
        };
        let guards = vec![
            self.header.subscribe(flag(&dirty)),
            self.footer_help.subscribe(flag(&dirty)),
            self.footer_status.subscribe(flag(&dirty)),
        ];
        (dirty, guards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_captions_flags_changes() {
        let kernel = Kernel::new();
        let (dirty, _guards) = kernel.watch_captions();
        assert!(dirty.swap(false, Ordering::SeqCst));

        let _help = kernel.footer_help.publish("home", "Enter open");
        assert!(dirty.swap(false, Ordering::SeqCst));

        let _esc = kernel.escape.register("home", || {});
        assert!(!dirty.load(Ordering::SeqCst));
    }

    #[test]
    fn test_clones_share_stacks() {
        let kernel = Kernel::new();
        let clone = kernel.clone();
        let _h = clone.header.publish("pages", "Pages");
        assert_eq!(kernel.header.current().title, "Pages");
    }
}
