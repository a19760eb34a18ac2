//! In-memory platform collaborators.
//!
//! `HeadlessWindow` keeps its frame in memory and records every frame and
//! focus request, so the simulator can print what a real window would have
//! done and tests can assert on it. `HeadlessNativeAnimator` emits a completion
//! event after the requested duration on the current tokio runtime.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{
    AttachRequest, CapsuleWindow, NativeAnimationEnded, NativeAnimator, PlatformError,
    StartupDimensions,
};
use crate::capsule::geometry::Rect;
use crate::capsule::state::Phase;

/// Default work area used by the headless window (a 1512x982 display).
const DEFAULT_WORK_AREA: Rect = Rect::new(0.0, 0.0, 1512.0, 982.0);

// ============================================================================
// Window
// ============================================================================

/// A window that lives entirely in memory.
pub struct HeadlessWindow {
    frame: Mutex<Rect>,
    work_area: Option<Rect>,
    refresh_rate: Option<f64>,
    dimensions: Option<StartupDimensions>,
    dimensions_delay: Duration,
    fail_focus: AtomicBool,
    frames: Mutex<Vec<Rect>>,
    focus_requests: Mutex<Vec<bool>>,
    level_offset: Mutex<Option<i32>>,
}

impl HeadlessWindow {
    /// Creates a window at `frame` on the default work area.
    #[must_use]
    pub fn new(frame: Rect) -> Self {
        Self {
            frame: Mutex::new(frame),
            work_area: Some(DEFAULT_WORK_AREA),
            refresh_rate: None,
            dimensions: None,
            dimensions_delay: Duration::ZERO,
            fail_focus: AtomicBool::new(false),
            frames: Mutex::new(Vec::new()),
            focus_requests: Mutex::new(Vec::new()),
            level_offset: Mutex::new(None),
        }
    }

    /// Overrides (or clears) the reported work area.
    #[must_use]
    pub const fn with_work_area(mut self, work_area: Option<Rect>) -> Self {
        self.work_area = work_area;
        self
    }

    /// Reports a refresh rate for frame pacing.
    #[must_use]
    pub const fn with_refresh_rate(mut self, hz: f64) -> Self {
        self.refresh_rate = Some(hz);
        self
    }

    /// Answers the startup dimension query with `dimensions` after `delay`.
    ///
    /// Without this the query fails and the controller falls back to the
    /// configured sizes.
    #[must_use]
    pub const fn with_dimensions(mut self, dimensions: StartupDimensions, delay: Duration) -> Self {
        self.dimensions = Some(dimensions);
        self.dimensions_delay = delay;
        self
    }

    /// Makes every subsequent focus request fail.
    pub fn set_fail_focus(&self, fail: bool) { self.fail_focus.store(fail, Ordering::SeqCst); }

    /// The current frame.
    #[must_use]
    pub fn frame(&self) -> Rect { *self.frame.lock() }

    /// Every frame applied through [`CapsuleWindow::set_frame`], in order.
    #[must_use]
    pub fn applied_frames(&self) -> Vec<Rect> { self.frames.lock().clone() }

    /// Every focus request received, in order.
    #[must_use]
    pub fn focus_requests(&self) -> Vec<bool> { self.focus_requests.lock().clone() }

    /// The last level offset applied.
    #[must_use]
    pub fn level_offset(&self) -> Option<i32> { *self.level_offset.lock() }
}

impl CapsuleWindow for HeadlessWindow {
    fn outer_frame(&self) -> Result<Rect, PlatformError> { Ok(*self.frame.lock()) }

    fn work_area(&self) -> Result<Rect, PlatformError> {
        self.work_area.ok_or(PlatformError::Unsupported("work_area"))
    }

    fn refresh_rate(&self) -> Option<f64> { self.refresh_rate }

    fn set_frame(&self, frame: Rect) -> Result<(), PlatformError> {
        *self.frame.lock() = frame;
        self.frames.lock().push(frame);
        Ok(())
    }

    fn set_level_offset(&self, offset: i32) -> Result<(), PlatformError> {
        *self.level_offset.lock() = Some(offset);
        Ok(())
    }

    fn request_focus(&self, focusable: bool) -> BoxFuture<'static, Result<(), PlatformError>> {
        self.focus_requests.lock().push(focusable);
        let result = if self.fail_focus.load(Ordering::SeqCst) {
            Err(PlatformError::call("request_focus", "focus request rejected"))
        } else {
            Ok(())
        };
        async move { result }.boxed()
    }

    fn query_dimensions(&self) -> BoxFuture<'static, Result<StartupDimensions, PlatformError>> {
        let dimensions = self.dimensions;
        let delay = self.dimensions_delay;
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            dimensions.ok_or(PlatformError::Unsupported("query_dimensions"))
        }
        .boxed()
    }
}

// ============================================================================
// Native animator
// ============================================================================

/// A call received by [`HeadlessNativeAnimator`].
#[derive(Debug, Clone, PartialEq)]
pub enum NativeCall {
    Attach(AttachRequest),
    Expand(Duration),
    Collapse(Duration),
    SetProgress(f64),
}

/// A native animator that completes each animation after its duration.
pub struct HeadlessNativeAnimator {
    events: mpsc::UnboundedSender<NativeAnimationEnded>,
    calls: Mutex<Vec<NativeCall>>,
    fail_starts: AtomicBool,
    fail_attach: AtomicBool,
    auto_complete: AtomicBool,
}

impl HeadlessNativeAnimator {
    /// Creates the animator and the receiving end of its completion channel.
    #[must_use]
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<NativeAnimationEnded>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let animator = Arc::new(Self {
            events,
            calls: Mutex::new(Vec::new()),
            fail_starts: AtomicBool::new(false),
            fail_attach: AtomicBool::new(false),
            auto_complete: AtomicBool::new(true),
        });
        (animator, receiver)
    }

    /// Makes `expand`/`collapse` fail until cleared.
    pub fn set_fail_starts(&self, fail: bool) { self.fail_starts.store(fail, Ordering::SeqCst); }

    /// Makes `attach` fail until cleared.
    pub fn set_fail_attach(&self, fail: bool) { self.fail_attach.store(fail, Ordering::SeqCst); }

    /// When disabled, animations never report completion on their own; use
    /// [`Self::emit`] instead.
    pub fn set_auto_complete(&self, enabled: bool) {
        self.auto_complete.store(enabled, Ordering::SeqCst);
    }

    /// Emits a completion event for `phase` right away.
    pub fn emit(&self, phase: Phase) {
        if self.events.send(NativeAnimationEnded { phase }).is_err() {
            tracing::debug!(?phase, "native event receiver dropped");
        }
    }

    /// Every call received, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<NativeCall> { self.calls.lock().clone() }

    fn start(&self, phase: Phase, duration: Duration) -> Result<(), PlatformError> {
        let call = match phase {
            Phase::Expand => NativeCall::Expand(duration),
            Phase::Collapse => NativeCall::Collapse(duration),
        };
        self.calls.lock().push(call);

        if self.fail_starts.load(Ordering::SeqCst) {
            return Err(PlatformError::call("native animation", "mask layer detached"));
        }

        if self.auto_complete.load(Ordering::SeqCst) {
            let events = self.events.clone();
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                let _ = events.send(NativeAnimationEnded { phase });
            });
        }

        Ok(())
    }
}

impl NativeAnimator for HeadlessNativeAnimator {
    fn attach(&self, request: &AttachRequest) -> Result<(), PlatformError> {
        self.calls.lock().push(NativeCall::Attach(request.clone()));
        if self.fail_attach.load(Ordering::SeqCst) {
            return Err(PlatformError::call("attach", "native layer unavailable"));
        }
        Ok(())
    }

    fn expand(&self, duration: Duration) -> Result<(), PlatformError> {
        self.start(Phase::Expand, duration)
    }

    fn collapse(&self, duration: Duration) -> Result<(), PlatformError> {
        self.start(Phase::Collapse, duration)
    }

    fn set_progress(&self, progress: f64) -> Result<(), PlatformError> {
        self.calls.lock().push(NativeCall::SetProgress(progress));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_frame_records_history() {
        let window = HeadlessWindow::new(Rect::new(0.0, 0.0, 100.0, 20.0));
        window.set_frame(Rect::new(10.0, 0.0, 80.0, 20.0)).unwrap();
        assert_eq!(window.frame(), Rect::new(10.0, 0.0, 80.0, 20.0));
        assert_eq!(window.applied_frames().len(), 1);
    }

    #[test]
    fn test_missing_work_area_is_an_error() {
        let window = HeadlessWindow::new(Rect::new(0.0, 0.0, 100.0, 20.0)).with_work_area(None);
        assert!(window.work_area().is_err());
    }

    #[tokio::test]
    async fn test_focus_failure_is_reported() {
        let window = HeadlessWindow::new(Rect::new(0.0, 0.0, 100.0, 20.0));
        assert!(window.request_focus(true).await.is_ok());
        window.set_fail_focus(true);
        assert!(window.request_focus(false).await.is_err());
        assert_eq!(window.focus_requests(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_dimension_query_without_answer_fails() {
        let window = HeadlessWindow::new(Rect::new(0.0, 0.0, 100.0, 20.0));
        assert!(window.query_dimensions().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_native_animator_completes_after_duration() {
        let (animator, mut events) = HeadlessNativeAnimator::new();
        animator.expand(Duration::from_millis(300)).unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(event.phase, Phase::Expand);
        assert_eq!(animator.calls(), vec![NativeCall::Expand(Duration::from_millis(300))]);
    }

    #[tokio::test]
    async fn test_native_animator_start_failure() {
        let (animator, _events) = HeadlessNativeAnimator::new();
        animator.set_fail_starts(true);
        assert!(animator.collapse(Duration::from_millis(100)).is_err());
    }
}
