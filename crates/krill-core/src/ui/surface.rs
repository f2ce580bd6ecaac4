//! Modal surface contract.
//!
//! A modal surface temporarily owns the terminal: it renders to lines,
//! receives every keystroke, and completes exactly once through its
//! `Done` handle. The host's render loop drives it through a
//! [`ModalSession`], which also contains surface panics so a broken
//! extension UI cannot take the host down.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::input::{decode, InputEvent, Keybindings};
use super::theme::Theme;

/// A renderable, input-driven modal component.
///
/// `render` is pure given the current state and width and must not
/// perform I/O; `handle_input` is the sole mutator of modal state and
/// requests a re-render through the surface's [`SurfaceHandle`] after
/// any change.
pub trait Surface: Send {
    fn render(&mut self, width: usize) -> Vec<String>;

    fn handle_input(&mut self, event: &InputEvent);

    /// Drop any cached render state.
    fn invalidate(&mut self) {}
}

/// Signals the host that a re-render is needed, without rendering.
#[derive(Clone, Default)]
pub struct SurfaceHandle {
    dirty: Arc<AtomicBool>,
}

impl SurfaceHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the surface dirty. Safe to call from async state changes.
    pub fn request_render(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::SeqCst)
    }
}

/// Single-resolution completion handle for a modal surface.
///
/// The first call wins; later calls are no-ops. `cancel` resolves with
/// `None`, the dismissal value.
pub struct Done<T> {
    tx: Arc<Mutex<Option<oneshot::Sender<Option<T>>>>>,
}

impl<T> Clone for Done<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T> Done<T> {
    fn channel() -> (Self, oneshot::Receiver<Option<T>>) {
        let (tx, rx) = oneshot::channel();
        (Self::from_sender(tx), rx)
    }

    /// Wrap an existing sender. For hosts that manage the receiving
    /// side themselves.
    pub fn from_sender(tx: oneshot::Sender<Option<T>>) -> Self {
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        }
    }

    pub fn done(&self, value: T) {
        self.finish(Some(value));
    }

    pub fn cancel(&self) {
        self.finish(None);
    }

    pub fn finish(&self, value: Option<T>) {
        if let Some(tx) = self.tx.lock().take() {
            let _ = tx.send(value);
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.tx.lock().is_none()
    }
}

/// Host-side driver for one modal invocation.
///
/// Created from a builder, fed input until the surface resolves its
/// completion handle, then torn down. The session traps panics from the
/// surface: a panicking render or input handler resolves the session
/// with `None` instead of unwinding into the host loop.
pub struct ModalSession<T> {
    surface: Box<dyn Surface>,
    handle: SurfaceHandle,
    done: Done<T>,
    rx: oneshot::Receiver<Option<T>>,
    outcome: Option<Option<T>>,
}

impl<T: Send + 'static> ModalSession<T> {
    pub fn new<F>(theme: Theme, keys: Keybindings, build: F) -> Self
    where
        F: FnOnce(SurfaceHandle, Theme, Keybindings, Done<T>) -> Box<dyn Surface>,
    {
        let handle = SurfaceHandle::new();
        let (done, rx) = Done::channel();
        let surface = build(handle.clone(), theme, keys, done.clone());
        handle.request_render();
        Self {
            surface,
            handle,
            done,
            rx,
            outcome: None,
        }
    }

    /// Decode a raw input chunk and feed each event to the surface.
    pub fn handle_raw(&mut self, raw: &str) {
        for event in decode(raw) {
            self.handle_input(&event);
        }
    }

    pub fn handle_input(&mut self, event: &InputEvent) {
        if self.is_finished() {
            return;
        }
        let surface = &mut self.surface;
        if catch_unwind(AssertUnwindSafe(|| surface.handle_input(event))).is_err() {
            tracing::error!("modal surface panicked in handle_input; closing");
            self.done.cancel();
        }
    }

    pub fn render(&mut self, width: usize) -> Vec<String> {
        if self.is_finished() {
            return Vec::new();
        }
        let surface = &mut self.surface;
        match catch_unwind(AssertUnwindSafe(|| surface.render(width))) {
            Ok(lines) => lines,
            Err(_) => {
                tracing::error!("modal surface panicked in render; closing");
                self.done.cancel();
                Vec::new()
            }
        }
    }

    /// True when the surface requested a re-render since the last call.
    pub fn needs_render(&self) -> bool {
        self.handle.take_dirty()
    }

    /// True once the completion handle has resolved.
    pub fn is_finished(&mut self) -> bool {
        self.poll_outcome();
        self.outcome.is_some()
    }

    /// The completion value, once resolved. `Some(None)` is a
    /// cancellation; `None` means the surface is still active.
    pub fn try_result(&mut self) -> Option<&Option<T>> {
        self.poll_outcome();
        self.outcome.as_ref()
    }

    /// Consume the session and wait for completion. Only useful when
    /// the surface resolves from an async state change; an interactive
    /// surface needs input fed first.
    pub async fn wait(mut self) -> Option<T> {
        if let Some(outcome) = self.outcome.take() {
            return outcome;
        }
        self.rx.await.unwrap_or(None)
    }

    /// Consume the session, returning the resolved value if any.
    pub fn into_result(mut self) -> Option<T> {
        self.poll_outcome();
        self.outcome.take().flatten()
    }

    fn poll_outcome(&mut self) {
        if self.outcome.is_none() {
            if let Ok(value) = self.rx.try_recv() {
                self.outcome = Some(value);
            }
        }
    }
}
