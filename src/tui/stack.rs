//! Last-in-first-out registry of named frames.
//!
//! Every piece of screen-scoped shared UI state (escape handlers, header and footer
//! captions) lives in one of these. A screen pushes a frame when it is mounted and keeps
//! the returned [`Registration`] for as long as it stays mounted; dropping the
//! registration removes the frame again, so no frame can outlive its owner.
//!
//! # Example
//!
//! ```rust
//! use wikit::tui::stack::StackRegistry;
//!
//! let stack = StackRegistry::new();
//! let outer = stack.push("pages", "Pages".to_string());
//! {
//!     let _inner = stack.push("dialog", "Confirm".to_string());
//!     assert_eq!(stack.current().as_deref(), Some("Confirm"));
//! } // dialog frame removed here
//! assert_eq!(stack.current().as_deref(), Some("Pages"));
//! drop(outer);
//! assert!(stack.is_empty());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Callback fired after the stack changes
pub type Listener = Arc<dyn Fn() + Send + Sync>;

type ListenerList = Mutex<Vec<(u64, Listener)>>;

struct Frame<T> {
    id: String,
    token: u64,
    payload: T,
}

struct Shared<T> {
    name: &'static str,
    frames: Mutex<Vec<Frame<T>>>,
    listeners: Arc<ListenerList>,
    next_token: AtomicU64,
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    // Listeners never run under this lock, so poisoning can only come from a panicking
    // payload clone; the frame list itself is still consistent.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<T> Shared<T> {
    fn next_token(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::Relaxed)
    }

    /// Snapshot the listeners and call them with no lock held.
    fn notify(&self) {
        let listeners: Vec<Listener> = lock(&self.listeners)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener();
        }
    }

    fn remove_token(&self, token: u64) -> bool {
        let removed = {
            let mut frames = lock(&self.frames);
            match frames.iter().position(|f| f.token == token) {
                Some(pos) => {
                    let frame = frames.remove(pos);
                    log::debug!(
                        "{}: disposed '{}' (depth {})",
                        self.name,
                        frame.id,
                        frames.len()
                    );
                    true
                }
                None => false,
            }
        };
        if removed {
            self.notify();
        }
        removed
    }
}

/// A shared LIFO stack of `(id, payload)` frames.
///
/// Cloning the registry clones the handle, not the frames: all clones see the same stack.
pub struct StackRegistry<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for StackRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Default for StackRegistry<T> {
    fn default() -> Self {
        Self::named("stack")
    }
}

impl<T> StackRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry whose name shows up in debug logs
    pub fn named(name: &'static str) -> Self {
        Self {
            shared: Arc::new(Shared {
                name,
                frames: Mutex::new(Vec::new()),
                listeners: Arc::new(Mutex::new(Vec::new())),
                next_token: AtomicU64::new(1),
            }),
        }
    }

    /// Push a frame and return the registration that owns it.
    ///
    /// A frame already registered under `id` is replaced: it is removed and the new frame
    /// becomes the most recent one. The stack never holds two frames with the same id.
    pub fn push(&self, id: impl Into<String>, payload: T) -> Registration<T> {
        let id = id.into();
        let token = self.shared.next_token();
        {
            let mut frames = lock(&self.shared.frames);
            frames.retain(|f| f.id != id);
            frames.push(Frame {
                id: id.clone(),
                token,
                payload,
            });
            log::debug!(
                "{}: pushed '{}' (depth {})",
                self.shared.name,
                id,
                frames.len()
            );
        }
        self.shared.notify();

        Registration {
            shared: Arc::downgrade(&self.shared),
            id,
            token,
            active: true,
        }
    }

    /// Remove the frame registered under `id`.
    ///
    /// Returns whether a frame was removed. Popping an unknown id, or popping twice, is a
    /// no-op.
    pub fn pop(&self, id: &str) -> bool {
        let removed = {
            let mut frames = lock(&self.shared.frames);
            let before = frames.len();
            frames.retain(|f| f.id != id);
            before != frames.len()
        };
        if removed {
            log::debug!("{}: popped '{}'", self.shared.name, id);
            self.shared.notify();
        }
        removed
    }

    pub fn len(&self) -> usize {
        lock(&self.shared.frames).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        lock(&self.shared.frames).iter().any(|f| f.id == id)
    }

    /// Frame ids, bottom first
    pub fn ids(&self) -> Vec<String> {
        lock(&self.shared.frames)
            .iter()
            .map(|f| f.id.clone())
            .collect()
    }

    /// Register a listener that fires after every change to the stack.
    ///
    /// The listener stays registered until the returned guard is dropped.
    pub fn subscribe<F>(&self, listener: F) -> ListenerGuard
    where
        F: Fn() + Send + Sync + 'static,
    {
        let key = self.shared.next_token();
        lock(&self.shared.listeners).push((key, Arc::new(listener)));
        ListenerGuard {
            listeners: Arc::downgrade(&self.shared.listeners),
            key,
        }
    }
}

impl<T: Clone> StackRegistry<T> {
    /// Payload of the most recently pushed frame that is still present
    pub fn current(&self) -> Option<T> {
        lock(&self.shared.frames).last().map(|f| f.payload.clone())
    }

    /// Id of the most recently pushed frame that is still present
    pub fn current_id(&self) -> Option<String> {
        lock(&self.shared.frames).last().map(|f| f.id.clone())
    }

    /// Id and payload of the top frame, read under a single lock
    pub fn current_entry(&self) -> Option<(String, T)> {
        lock(&self.shared.frames)
            .last()
            .map(|f| (f.id.clone(), f.payload.clone()))
    }
}

impl<T: Clone + Default> StackRegistry<T> {
    /// Like [`current`](Self::current), falling back to `T::default()` on an empty stack
    pub fn current_or_default(&self) -> T {
        self.current().unwrap_or_default()
    }
}

/// Owner of one pushed frame. Disposing it (explicitly or by dropping it) removes the frame.
#[must_use = "dropping a Registration immediately removes its frame"]
pub struct Registration<T> {
    shared: Weak<Shared<T>>,
    id: String,
    token: u64,
    active: bool,
}

impl<T> Registration<T> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether this registration's frame is still on the stack.
    ///
    /// False after disposal, and also after someone else re-pushed the same id or popped it.
    pub fn is_active(&self) -> bool {
        if !self.active {
            return false;
        }
        match self.shared.upgrade() {
            Some(shared) => lock(&shared.frames).iter().any(|f| f.token == self.token),
            None => false,
        }
    }

    /// Swap the payload of this registration's frame without moving it.
    ///
    /// Returns false (and drops `payload`) when the frame is gone.
    pub fn replace(&self, payload: T) -> bool {
        if !self.active {
            return false;
        }
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        let replaced = {
            let mut frames = lock(&shared.frames);
            match frames.iter_mut().find(|f| f.token == self.token) {
                Some(frame) => {
                    frame.payload = payload;
                    true
                }
                None => false,
            }
        };
        if replaced {
            shared.notify();
        }
        replaced
    }

    /// Remove this registration's frame. Safe to call any number of times.
    ///
    /// Only the frame created by this registration is removed: if the id has since been
    /// re-pushed by another owner, that newer frame is left alone.
    pub fn dispose(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(shared) = self.shared.upgrade() {
            shared.remove_token(self.token);
        }
    }
}

impl<T> Drop for Registration<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T> std::fmt::Debug for Registration<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("token", &self.token)
            .field("active", &self.active)
            .finish()
    }
}

/// Keeps a stack listener registered; dropping it unsubscribes.
#[must_use = "dropping a ListenerGuard immediately unsubscribes"]
pub struct ListenerGuard {
    listeners: Weak<ListenerList>,
    key: u64,
}

impl ListenerGuard {
    pub fn unsubscribe(self) {}
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            lock(&listeners).retain(|(key, _)| *key != self.key);
        }
    }
}
