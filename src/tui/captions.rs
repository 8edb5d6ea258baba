//! Header and footer caption stacks.
//!
//! Screens publish the captions shown in the always-visible header and footer bars. The
//! most recently published caption wins; when its owner goes away the previous one shows
//! again.

use std::fmt;
use std::time::{Duration, Instant};

use super::stack::{ListenerGuard, Registration, StackRegistry};

/// Header bar content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderCaption {
    pub title: String,
    pub metadata: Option<String>,
}

impl HeaderCaption {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }
}

impl fmt::Display for HeaderCaption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.metadata {
            Some(metadata) if !metadata.is_empty() => write!(f, "{}: {}", self.title, metadata),
            _ => write!(f, "{}", self.title),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusLevel {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// Footer status line content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, level: StatusLevel) -> Self {
        Self {
            text: text.into(),
            level,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, StatusLevel::Info)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(text, StatusLevel::Success)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(text, StatusLevel::Warning)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, StatusLevel::Error)
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Generates a caption stack newtype over [`StackRegistry`]
macro_rules! caption_stack {
    ($(#[$meta:meta])* $name:ident, $payload:ty, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name {
            stack: StackRegistry<$payload>,
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    stack: StackRegistry::named($label),
                }
            }
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            /// Publish `caption` on behalf of `owner`; the caption is withdrawn when the
            /// returned registration is dropped
            pub fn publish(&self, owner: impl Into<String>, caption: impl Into<$payload>) -> Registration<$payload> {
                self.stack.push(owner, caption.into())
            }

            pub fn withdraw(&self, owner: &str) -> bool {
                self.stack.pop(owner)
            }

            /// The caption on top, or the empty default
            pub fn current(&self) -> $payload {
                self.stack.current_or_default()
            }

            /// The caption on top, `None` when nothing is published
            pub fn published(&self) -> Option<$payload> {
                self.stack.current()
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
    };
}

caption_stack!(
    /// Stack of header captions (title plus optional metadata)
    HeaderStack,
    HeaderCaption,
    "header"
);

caption_stack!(
    /// Stack of footer key-help lines
    FooterHelpStack,
    String,
    "footer-help"
);

caption_stack!(
    /// Stack of footer status messages
    FooterStatusStack,
    StatusMessage,
    "footer-status"
);

impl From<&str> for HeaderCaption {
    fn from(title: &str) -> Self {
        HeaderCaption::new(title)
    }
}

impl From<String> for HeaderCaption {
    fn from(title: String) -> Self {
        HeaderCaption::new(title)
    }
}

impl From<&str> for StatusMessage {
    fn from(text: &str) -> Self {
        StatusMessage::info(text)
    }
}

impl From<String> for StatusMessage {
    fn from(text: String) -> Self {
        StatusMessage::info(text)
    }
}

impl FooterStatusStack {
    /// Publish a status message that the caller clears after `ttl`.
    ///
    /// Nothing is scheduled here: the caller keeps the returned [`TransientCaption`] and
    /// calls [`TransientCaption::expire_if_due`] from its own tick.
    pub fn publish_transient(
        &self,
        owner: impl Into<String>,
        message: impl Into<StatusMessage>,
        ttl: Duration,
        now: Instant,
    ) -> TransientCaption<StatusMessage> {
        TransientCaption::new(self.publish(owner, message), now + ttl)
    }
}

/// A registration with a caller-owned deadline
#[derive(Debug)]
pub struct TransientCaption<T> {
    registration: Registration<T>,
    expires_at: Instant,
}

impl<T> TransientCaption<T> {
    pub fn new(registration: Registration<T>, expires_at: Instant) -> Self {
        Self {
            registration,
            expires_at,
        }
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Dispose the caption if its deadline has passed. Returns true once expired.
    pub fn expire_if_due(&mut self, now: Instant) -> bool {
        if now >= self.expires_at {
            self.registration.dispose();
            true
        } else {
            false
        }
    }

    pub fn dispose(&mut self) {
        self.registration.dispose();
    }
}
