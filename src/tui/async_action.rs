//! Confirm → run → success/error lifecycle for operations that touch the remote wiki.
//!
//! An [`AsyncActionController`] is owned by the dialog that shows it and dropped when the
//! dialog closes. It never talks to the network itself: the caller supplies the operation
//! as a future factory and the controller only sequences it.
//!
//! ```text
//! Confirming --confirm--> Loading --ok--> Success --timer--> (closed)
//!     |                      |
//!   cancel                  err
//!     v                      v
//! (cancelled) <--cancel-- Error --retry--> Confirming
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use tokio::sync::watch;

pub type ActionFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

type Operation = Box<dyn FnMut(ProgressReporter) -> ActionFuture + Send>;
type Hook = Box<dyn FnMut() + Send>;
type ErrorHook = Box<dyn FnMut(&str) + Send>;

pub const DEFAULT_SUCCESS_DURATION: Duration = Duration::from_millis(3000);
pub const DEFAULT_ITEMS_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Confirming,
    Loading,
    Success,
    Error,
}

/// Which button is highlighted in the Confirming and Error states
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialogChoice {
    /// Confirm button, or "Try Again" in the Error state
    Confirm,
    #[default]
    Cancel,
}

/// What a call on the controller changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEvent {
    /// Confirming → Loading; the operation has been invoked
    Started,
    /// Loading → Success
    Succeeded,
    /// Loading → Error
    Failed(String),
    /// Error → Confirming
    Retrying,
    /// Terminal: the user declined
    Cancelled,
    /// Terminal: the success message has been shown long enough
    Closed,
}

impl ActionEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionEvent::Cancelled | ActionEvent::Closed)
    }
}

/// Handed to the operation so it can update the progress line while it runs
#[derive(Clone)]
pub struct ProgressReporter {
    tx: Arc<watch::Sender<String>>,
}

impl ProgressReporter {
    pub fn set(&self, message: impl Into<String>) {
        self.tx.send_replace(message.into());
    }
}

pub struct AsyncActionController {
    title: String,
    message: String,
    items: Vec<String>,
    items_limit: usize,
    confirm_text: String,
    cancel_text: String,
    destructive: bool,
    loading_message: String,
    success_message: String,
    success_duration: Duration,

    operation: Operation,
    on_success: Option<Hook>,
    on_cancel: Option<Hook>,
    on_error: Option<ErrorHook>,

    state: ActionState,
    selected: DialogChoice,
    error: Option<String>,
    progress_tx: Arc<watch::Sender<String>>,
    progress_rx: watch::Receiver<String>,
    pending: Option<ActionFuture>,
    succeeded_at: Option<Instant>,
    finished: bool,
    attempts: usize,
}

impl AsyncActionController {
    /// Create a controller in the Confirming state.
    ///
    /// `operation` is called once per confirmation and must return the future doing the
    /// actual work. Any error it resolves to is shown as a single message.
    pub fn new<F, Fut>(title: impl Into<String>, mut operation: F) -> Self
    where
        F: FnMut(ProgressReporter) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let (progress_tx, progress_rx) = watch::channel(String::new());
        Self {
            title: title.into(),
            message: String::new(),
            items: Vec::new(),
            items_limit: DEFAULT_ITEMS_LIMIT,
            confirm_text: "Confirm".to_string(),
            cancel_text: "Cancel".to_string(),
            destructive: false,
            loading_message: "Working...".to_string(),
            success_message: "Done".to_string(),
            success_duration: DEFAULT_SUCCESS_DURATION,
            operation: Box::new(move |progress| -> ActionFuture { Box::pin(operation(progress)) }),
            on_success: None,
            on_cancel: None,
            on_error: None,
            state: ActionState::Confirming,
            selected: DialogChoice::Cancel,
            error: None,
            progress_tx: Arc::new(progress_tx),
            progress_rx,
            pending: None,
            succeeded_at: None,
            finished: false,
            attempts: 0,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn items_limit(mut self, limit: usize) -> Self {
        self.items_limit = limit;
        self
    }

    pub fn confirm_text(mut self, text: impl Into<String>) -> Self {
        self.confirm_text = text.into();
        self
    }

    pub fn cancel_text(mut self, text: impl Into<String>) -> Self {
        self.cancel_text = text.into();
        self
    }

    pub fn destructive(mut self, destructive: bool) -> Self {
        self.destructive = destructive;
        self
    }

    pub fn loading_message(mut self, text: impl Into<String>) -> Self {
        self.loading_message = text.into();
        self
    }

    pub fn success_message(mut self, text: impl Into<String>) -> Self {
        self.success_message = text.into();
        self
    }

    pub fn success_duration(mut self, duration: Duration) -> Self {
        self.success_duration = duration;
        self
    }

    pub fn on_success<F: FnMut() + Send + 'static>(mut self, hook: F) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }

    pub fn on_cancel<F: FnMut() + Send + 'static>(mut self, hook: F) -> Self {
        self.on_cancel = Some(Box::new(hook));
        self
    }

    pub fn on_error<F: FnMut(&str) + Send + 'static>(mut self, hook: F) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    pub fn selected(&self) -> DialogChoice {
        self.selected
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Latest progress line reported by the running operation
    pub fn progress(&self) -> String {
        self.progress_rx.borrow().clone()
    }

    /// True once Cancelled or Closed has been reported; the owner should drop the controller
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of Loading episodes started so far
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.message
    }

    pub fn confirm_label(&self) -> &str {
        &self.confirm_text
    }

    pub fn cancel_label(&self) -> &str {
        &self.cancel_text
    }

    pub fn is_destructive(&self) -> bool {
        self.destructive
    }

    pub fn loading_text(&self) -> &str {
        &self.loading_message
    }

    pub fn success_text(&self) -> &str {
        &self.success_message
    }

    pub fn all_items(&self) -> &[String] {
        &self.items
    }

    /// Items to render and how many were cut off by the limit
    pub fn visible_items(&self) -> (&[String], usize) {
        let shown = self.items.len().min(self.items_limit);
        (&self.items[..shown], self.items.len() - shown)
    }

    /// Whether the dialog currently reacts to keys (false while Loading or showing Success)
    pub fn accepts_input(&self) -> bool {
        !self.finished && matches!(self.state, ActionState::Confirming | ActionState::Error)
    }

    /// Confirming → Loading. Invokes the operation exactly once.
    pub fn confirm(&mut self) -> Option<ActionEvent> {
        if self.finished || self.state != ActionState::Confirming {
            return None;
        }
        self.state = ActionState::Loading;
        self.error = None;
        self.succeeded_at = None;
        self.progress_tx.send_replace(String::new());
        self.attempts += 1;
        log::info!("{}: confirmed, starting operation (attempt {})", self.title, self.attempts);

        let reporter = ProgressReporter {
            tx: self.progress_tx.clone(),
        };
        self.pending = Some((self.operation)(reporter));
        Some(ActionEvent::Started)
    }

    /// Confirming or Error → cancelled (terminal)
    pub fn cancel(&mut self) -> Option<ActionEvent> {
        if !self.accepts_input() {
            return None;
        }
        self.finished = true;
        log::debug!("{}: cancelled", self.title);
        if let Some(hook) = self.on_cancel.as_mut() {
            hook();
        }
        Some(ActionEvent::Cancelled)
    }

    /// Error → Confirming, clearing the error
    pub fn retry(&mut self) -> Option<ActionEvent> {
        if self.finished || self.state != ActionState::Error {
            return None;
        }
        self.state = ActionState::Confirming;
        self.error = None;
        self.selected = DialogChoice::Cancel;
        log::debug!("{}: retry requested", self.title);
        Some(ActionEvent::Retrying)
    }

    /// Escape cancels while confirming and retries from the error screen; it is ignored
    /// while the operation is in flight or the success message is showing.
    pub fn handle_escape(&mut self) -> Option<ActionEvent> {
        match self.state {
            ActionState::Confirming => self.cancel(),
            ActionState::Error => self.retry(),
            ActionState::Loading | ActionState::Success => {
                log::debug!("{}: escape ignored while {:?}", self.title, self.state);
                None
            }
        }
    }

    pub fn select(&mut self, choice: DialogChoice) {
        if self.accepts_input() {
            self.selected = choice;
        }
    }

    /// Left/Right move between the two buttons, Enter activates the highlighted one
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<ActionEvent> {
        if key.kind != KeyEventKind::Press || !self.accepts_input() {
            return None;
        }
        match key.code {
            KeyCode::Left => {
                self.select(DialogChoice::Confirm);
                None
            }
            KeyCode::Right => {
                self.select(DialogChoice::Cancel);
                None
            }
            KeyCode::Esc => self.handle_escape(),
            KeyCode::Enter => match (self.state, self.selected) {
                (ActionState::Confirming, DialogChoice::Confirm) => self.confirm(),
                (ActionState::Error, DialogChoice::Confirm) => self.retry(),
                (_, DialogChoice::Cancel) => self.cancel(),
                _ => None,
            },
            _ => None,
        }
    }

    /// Drive the in-flight operation and the success timer.
    ///
    /// Called from the owner's tick; polls the operation with a no-op waker, so the owner
    /// must keep calling it until the operation settles.
    pub fn poll(&mut self, now: Instant) -> Option<ActionEvent> {
        if self.finished {
            return None;
        }
        match self.state {
            ActionState::Loading => {
                let future = self.pending.as_mut()?;
                let waker = futures::task::noop_waker();
                let mut cx = Context::from_waker(&waker);
                match future.as_mut().poll(&mut cx) {
                    Poll::Ready(result) => Some(self.complete(result, now)),
                    Poll::Pending => None,
                }
            }
            ActionState::Success => {
                let succeeded_at = self.succeeded_at?;
                if now.saturating_duration_since(succeeded_at) >= self.success_duration {
                    self.finished = true;
                    log::debug!("{}: closing after success", self.title);
                    Some(ActionEvent::Closed)
                } else {
                    None
                }
            }
            ActionState::Confirming | ActionState::Error => None,
        }
    }

    /// Await the in-flight operation instead of polling it.
    ///
    /// Returns `None` when nothing is running.
    pub async fn settle(&mut self) -> Option<ActionEvent> {
        if self.finished || self.state != ActionState::Loading {
            return None;
        }
        let result = self.pending.as_mut()?.await;
        Some(self.complete(result, Instant::now()))
    }

    fn complete(&mut self, result: anyhow::Result<()>, now: Instant) -> ActionEvent {
        self.pending = None;
        match result {
            Ok(()) => {
                self.state = ActionState::Success;
                self.succeeded_at = Some(now);
                log::info!("{}: operation succeeded", self.title);
                if let Some(hook) = self.on_success.as_mut() {
                    hook();
                }
                ActionEvent::Succeeded
            }
            Err(err) => {
                let message = format!("{:#}", err);
                log::warn!("{}: operation failed: {}", self.title, message);
                self.state = ActionState::Error;
                self.error = Some(message.clone());
                if let Some(hook) = self.on_error.as_mut() {
                    hook(&message);
                }
                ActionEvent::Failed(message)
            }
        }
    }
}

impl std::fmt::Debug for AsyncActionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncActionController")
            .field("title", &self.title)
            .field("state", &self.state)
            .field("selected", &self.selected)
            .field("error", &self.error)
            .field("finished", &self.finished)
            .field("attempts", &self.attempts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use futures::channel::oneshot;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default, Clone)]
    struct Calls {
        confirm: Arc<AtomicUsize>,
        success: Arc<AtomicUsize>,
        cancel: Arc<AtomicUsize>,
        error: Arc<Mutex<Vec<String>>>,
    }

    impl Calls {
        fn get(counter: &Arc<AtomicUsize>) -> usize {
            counter.load(Ordering::SeqCst)
        }
    }

    /// Controller whose operation resolves to the queued results in order
    fn controller(results: Vec<anyhow::Result<()>>, calls: &Calls) -> AsyncActionController {
        let queue = Arc::new(Mutex::new(results.into_iter()));
        let confirm = calls.confirm.clone();
        let success = calls.success.clone();
        let cancel = calls.cancel.clone();
        let errors = calls.error.clone();
        AsyncActionController::new("Delete pages", move |_progress| {
            confirm.fetch_add(1, Ordering::SeqCst);
            let next = queue.lock().unwrap().next().unwrap_or(Ok(()));
            async move { next }
        })
        .destructive(true)
        .success_duration(Duration::from_millis(3000))
        .on_success(move || {
            success.fetch_add(1, Ordering::SeqCst);
        })
        .on_cancel(move || {
            cancel.fetch_add(1, Ordering::SeqCst);
        })
        .on_error(move |msg| errors.lock().unwrap().push(msg.to_string()))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_confirming_then_cancel() {
        let calls = Calls::default();
        let mut action = controller(vec![], &calls);
        assert_eq!(action.state(), ActionState::Confirming);

        assert_eq!(action.cancel(), Some(ActionEvent::Cancelled));
        assert!(action.is_finished());
        assert_eq!(Calls::get(&calls.cancel), 1);
        assert_eq!(Calls::get(&calls.confirm), 0);

        // finished controllers ignore everything
        assert_eq!(action.confirm(), None);
        assert_eq!(action.cancel(), None);
        assert_eq!(Calls::get(&calls.cancel), 1);
    }

    #[test]
    fn test_success_path_closes_after_duration() {
        let calls = Calls::default();
        let mut action = controller(vec![Ok(())], &calls);
        let start = Instant::now();

        assert_eq!(action.confirm(), Some(ActionEvent::Started));
        assert_eq!(action.state(), ActionState::Loading);
        assert_eq!(action.poll(start), Some(ActionEvent::Succeeded));
        assert_eq!(action.state(), ActionState::Success);
        assert_eq!(Calls::get(&calls.success), 1);

        assert_eq!(action.poll(start + Duration::from_millis(2999)), None);
        assert!(!action.is_finished());
        assert_eq!(action.poll(start + Duration::from_millis(3000)), Some(ActionEvent::Closed));
        assert!(action.is_finished());

        assert_eq!(action.poll(start + Duration::from_secs(10)), None);
        assert_eq!(Calls::get(&calls.success), 1);
        assert_eq!(Calls::get(&calls.confirm), 1);
    }

    #[test]
    fn test_error_then_retry_then_success() {
        let calls = Calls::default();
        let mut action = controller(vec![Err(anyhow::anyhow!("network down")), Ok(())], &calls);
        let now = Instant::now();

        action.confirm();
        assert_eq!(action.poll(now), Some(ActionEvent::Failed("network down".into())));
        assert_eq!(action.state(), ActionState::Error);
        assert_eq!(action.error(), Some("network down"));
        assert_eq!(*calls.error.lock().unwrap(), vec!["network down".to_string()]);

        assert_eq!(action.retry(), Some(ActionEvent::Retrying));
        assert_eq!(action.state(), ActionState::Confirming);
        assert_eq!(action.error(), None);
        assert_eq!(action.selected(), DialogChoice::Cancel);

        action.confirm();
        assert_eq!(action.poll(now), Some(ActionEvent::Succeeded));
        assert_eq!(Calls::get(&calls.confirm), 2);
        assert_eq!(Calls::get(&calls.success), 1);
        assert_eq!(calls.error.lock().unwrap().len(), 1);
        assert_eq!(action.attempts(), 2);
    }

    #[test]
    fn test_error_then_cancel() {
        let calls = Calls::default();
        let mut action = controller(vec![Err(anyhow::anyhow!("denied"))], &calls);
        action.confirm();
        action.poll(Instant::now());

        assert_eq!(action.cancel(), Some(ActionEvent::Cancelled));
        assert!(action.is_finished());
        assert_eq!(Calls::get(&calls.cancel), 1);
    }

    #[test]
    fn test_error_message_keeps_context_chain() {
        let calls = Calls::default();
        let err = anyhow::anyhow!("HTTP 500").context("Failed to delete page 7");
        let mut action = controller(vec![Err(err)], &calls);
        action.confirm();

        assert_eq!(
            action.poll(Instant::now()),
            Some(ActionEvent::Failed("Failed to delete page 7: HTTP 500".into()))
        );
    }

    #[test]
    fn test_loading_ignores_escape_and_keys() {
        let (tx, rx) = oneshot::channel::<anyhow::Result<()>>();
        let rx = Arc::new(Mutex::new(Some(rx)));
        let cancels = Arc::new(AtomicUsize::new(0));
        let cancel_count = cancels.clone();
        let mut action = AsyncActionController::new("Delete", move |_| {
            let rx = rx.lock().unwrap().take();
            async move {
                match rx {
                    Some(rx) => match rx.await {
                        Ok(result) => result,
                        Err(_) => Err(anyhow::anyhow!("sender dropped")),
                    },
                    None => Ok(()),
                }
            }
        })
        .destructive(true)
        .on_cancel(move || {
            cancel_count.fetch_add(1, Ordering::SeqCst);
        });

        action.confirm();
        let now = Instant::now();
        assert_eq!(action.poll(now), None);

        assert_eq!(action.handle_escape(), None);
        assert_eq!(action.handle_key(key(KeyCode::Enter)), None);
        assert_eq!(action.handle_key(key(KeyCode::Left)), None);
        assert_eq!(action.retry(), None);
        assert_eq!(action.cancel(), None);
        assert_eq!(action.confirm(), None);
        assert_eq!(action.state(), ActionState::Loading);
        assert_eq!(cancels.load(Ordering::SeqCst), 0);
        assert_eq!(action.attempts(), 1);

        tx.send(Ok(())).unwrap();
        assert_eq!(action.poll(now), Some(ActionEvent::Succeeded));

        // still ignored while the success message shows
        assert_eq!(action.handle_escape(), None);
        assert_eq!(action.state(), ActionState::Success);
    }

    #[test]
    fn test_escape_cancels_while_confirming_and_retries_on_error() {
        let calls = Calls::default();
        let mut action = controller(vec![Err(anyhow::anyhow!("boom"))], &calls);
        action.confirm();
        action.poll(Instant::now());

        assert_eq!(action.handle_escape(), Some(ActionEvent::Retrying));
        assert_eq!(action.state(), ActionState::Confirming);
        assert_eq!(action.handle_escape(), Some(ActionEvent::Cancelled));
        assert_eq!(Calls::get(&calls.cancel), 1);
    }

    #[test]
    fn test_keyboard_selection() {
        let calls = Calls::default();
        let mut action = controller(vec![Err(anyhow::anyhow!("boom")), Ok(())], &calls);
        assert_eq!(action.selected(), DialogChoice::Cancel);

        action.handle_key(key(KeyCode::Left));
        assert_eq!(action.selected(), DialogChoice::Confirm);
        action.handle_key(key(KeyCode::Right));
        action.handle_key(key(KeyCode::Left));
        assert_eq!(action.handle_key(key(KeyCode::Enter)), Some(ActionEvent::Started));

        action.poll(Instant::now());
        assert_eq!(action.state(), ActionState::Error);
        // "Try Again" stays highlighted after the failure
        assert_eq!(action.handle_key(key(KeyCode::Enter)), Some(ActionEvent::Retrying));

        // Default selection after retry is Cancel
        assert_eq!(action.handle_key(key(KeyCode::Enter)), Some(ActionEvent::Cancelled));
        assert_eq!(Calls::get(&calls.confirm), 1);
    }

    #[test]
    fn test_release_events_are_ignored() {
        let calls = Calls::default();
        let mut action = controller(vec![], &calls);
        let mut release = key(KeyCode::Enter);
        release.kind = KeyEventKind::Release;

        assert_eq!(action.handle_key(release), None);
        assert!(!action.is_finished());
    }

    #[test]
    fn test_progress_is_reported_and_reset() {
        let (tx, rx) = oneshot::channel::<()>();
        let rx = Arc::new(Mutex::new(Some(rx)));
        let mut action = AsyncActionController::new("Export", move |progress| {
            let rx = rx.lock().unwrap().take();
            async move {
                progress.set("Deleting page 1/2: home");
                if let Some(rx) = rx {
                    let _ = rx.await;
                }
                Err(anyhow::anyhow!("page 2 failed"))
            }
        });
        let now = Instant::now();

        action.confirm();
        assert_eq!(action.poll(now), None);
        assert_eq!(action.progress(), "Deleting page 1/2: home");

        tx.send(()).unwrap();
        assert!(matches!(action.poll(now), Some(ActionEvent::Failed(_))));
        action.retry();
        action.confirm();
        // the new episode starts with an empty progress line until the operation reports
        assert_eq!(action.progress(), "");
    }

    #[test]
    fn test_visible_items_respects_limit() {
        let action = AsyncActionController::new("Delete", |_| async { Ok(()) })
            .items((1..=7).map(|i| format!("• page-{}", i)))
            .items_limit(5);

        let (shown, hidden) = action.visible_items();
        assert_eq!(shown.len(), 5);
        assert_eq!(hidden, 2);
        assert_eq!(shown[0], "• page-1");
    }

    #[tokio::test]
    async fn test_settle_awaits_real_futures() {
        let mut action = AsyncActionController::new("Sleep", |_| async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(())
        })
        .success_duration(Duration::ZERO);

        assert_eq!(action.settle().await, None);
        action.confirm();
        assert_eq!(action.settle().await, Some(ActionEvent::Succeeded));
        assert_eq!(action.poll(Instant::now()), Some(ActionEvent::Closed));
    }
}
