//! Escape-key routing.
//!
//! Nested transient UI (a dialog inside a tab inside a screen) registers one handler per
//! layer. A single Escape press runs only the most recently registered handler, so "back"
//! unwinds exactly one layer per press without any layer knowing about the others.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::stack::{ListenerGuard, Registration, StackRegistry};

/// Zero-argument handler run on Escape
pub type EscapeHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
pub struct EscapeRouter {
    stack: StackRegistry<EscapeHandler>,
}

impl Default for EscapeRouter {
    fn default() -> Self {
        Self {
            stack: StackRegistry::named("escape"),
        }
    }
}

impl EscapeRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `id`; it becomes the handler for the next Escape press
    pub fn register<F>(&self, id: impl Into<String>, handler: F) -> Registration<EscapeHandler>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.stack.push(id, Arc::new(handler))
    }

    /// Register a handler that only raises a flag.
    ///
    /// The owner consumes the returned [`EscapeSignal`] as soon as [`EscapeRouter::dispatch`]
    /// returns, before any further input. This keeps the handler free of borrows into the
    /// owner's state.
    pub fn register_signal(
        &self,
        id: impl Into<String>,
    ) -> (Registration<EscapeHandler>, EscapeSignal) {
        let signal = EscapeSignal::default();
        let raised = signal.clone();
        let registration = self.register(id, move || raised.raise());
        (registration, signal)
    }

    /// Run the current handler once. Returns false when no handler is registered.
    ///
    /// The handler is resolved while the registry is locked and called after the lock is
    /// released, so it may dispose registrations (including its own).
    pub fn dispatch(&self) -> bool {
        let Some((id, handler)) = self.stack.current_entry() else {
            log::debug!("escape: no handler registered, ignoring");
            return false;
        };
        log::debug!("escape: dispatching to '{}'", id);
        handler();
        true
    }

    pub fn unregister(&self, id: &str) -> bool {
        self.stack.pop(id)
    }

    pub fn current_id(&self) -> Option<String> {
        self.stack.current_id()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerGuard
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.stack.subscribe(listener)
    }
}

/// Flag raised by a signal-style escape handler
#[derive(Clone, Default, Debug)]
pub struct EscapeSignal {
    raised: Arc<AtomicBool>,
}

impl EscapeSignal {
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    /// Consume the flag; true if Escape was routed here since the last call
    pub fn take(&self) -> bool {
        self.raised.swap(false, Ordering::SeqCst)
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let hits = Arc::new(AtomicUsize::new(0));
        let c = hits.clone();
        (hits, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_only_most_recent_handler_runs() {
        let router = EscapeRouter::new();
        let (a_hits, a) = counter();
        let (b_hits, b) = counter();
        let _a = router.register("a", a);
        let _b = router.register("b", b);

        assert!(router.dispatch());
        assert_eq!(b_hits.load(Ordering::SeqCst), 1);
        assert_eq!(a_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dispatch_without_handlers_is_noop() {
        let router = EscapeRouter::new();
        assert!(!router.dispatch());
    }

    #[test]
    fn test_disposed_handler_is_never_called() {
        let router = EscapeRouter::new();
        let (a_hits, a) = counter();
        let (b_hits, b) = counter();
        let _a = router.register("a", a);
        let b_reg = router.register("b", b);
        drop(b_reg);

        router.dispatch();
        assert_eq!(b_hits.load(Ordering::SeqCst), 0);
        assert_eq!(a_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_may_unregister_itself() {
        let router = EscapeRouter::new();
        let (a_hits, a) = counter();
        let _a = router.register("a", a);
        let inner = router.clone();
        let _dialog = router.register("dialog", move || {
            inner.unregister("dialog");
        });

        assert!(router.dispatch());
        assert_eq!(router.current_id().as_deref(), Some("a"));
        assert_eq!(a_hits.load(Ordering::SeqCst), 0);

        router.dispatch();
        assert_eq!(a_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_one_layer_per_press() {
        let router = EscapeRouter::new();
        let (screen, screen_signal) = router.register_signal("screen");
        let (dialog, dialog_signal) = router.register_signal("dialog");

        router.dispatch();
        assert!(dialog_signal.take());
        assert!(!screen_signal.is_raised());
        drop(dialog);

        router.dispatch();
        assert!(screen_signal.take());
        assert!(!dialog_signal.take());
        drop(screen);

        assert!(!router.dispatch());
    }

    #[test]
    fn test_signal_take_consumes() {
        let signal = EscapeSignal::default();
        assert!(!signal.take());
        signal.raise();
        assert!(signal.take());
        assert!(!signal.take());
    }
}
