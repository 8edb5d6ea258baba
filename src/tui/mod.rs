pub mod async_action;
pub mod captions;
pub mod escape;
pub mod kernel;
pub mod keyboard;
pub mod runtime;
pub mod screens;
pub mod search;
pub mod stack;
pub mod theme;
pub mod widgets;

pub use async_action::{ActionEvent, ActionState, AsyncActionController, DialogChoice, ProgressReporter};
pub use captions::{HeaderCaption, StatusLevel, StatusMessage};
pub use escape::{EscapeRouter, EscapeSignal};
pub use kernel::Kernel;
pub use keyboard::{KeyOutcome, KeyboardMode, TabbedScreen, dispatch_key};
pub use runtime::{Command, Runtime, Screen, ScreenId};
pub use screens::ScreenContext;
pub use stack::{ListenerGuard, Registration, StackRegistry};
pub use theme::{Theme, ThemeVariant};
