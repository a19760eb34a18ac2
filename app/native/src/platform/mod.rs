//! Platform collaborators for the capsule controller.
//!
//! The controller never talks to a window system directly. It drives a
//! [`CapsuleWindow`] for frames and focus, and optionally a [`NativeAnimator`]
//! that morphs the capsule mask inside the webview/native layer. Completion of
//! native animations is reported back through a typed event channel.
//!
//! [`headless`] provides in-memory implementations used by the CLI simulator
//! and the test-suite; the `tauri` feature adds an adapter over a Tauri
//! webview window.

pub mod headless;
#[cfg(feature = "tauri")]
pub mod tauri;

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::capsule::geometry::{Rect, Size};
use crate::capsule::state::Phase;

/// Errors reported by platform collaborators.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlatformError {
    /// The window has been closed or was never created.
    #[error("window is not available")]
    WindowUnavailable,

    /// A platform call failed.
    #[error("{op} failed: {message}")]
    Call { op: &'static str, message: String },

    /// The operation is not supported by this backend.
    #[error("{0} is not supported")]
    Unsupported(&'static str),
}

impl PlatformError {
    /// Shorthand for a failed platform call.
    pub fn call(op: &'static str, message: impl Into<String>) -> Self {
        Self::Call { op, message: message.into() }
    }
}

/// Result of the startup dimension query.
///
/// Widths and heights are logical points; `scale_factor` converts them to
/// physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartupDimensions {
    pub collapsed_width: f64,
    pub collapsed_height: f64,
    pub scale_factor: f64,
}

/// Parameters handed to the native animator when it is attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachRequest {
    pub collapsed: Size,
    pub expanded: Size,
    pub corner_radius: f64,
    pub expand_timing: [f64; 4],
    pub collapse_timing: [f64; 4],
}

/// Completion event emitted by the native animator.
///
/// Carries only the phase; the controller correlates it with the session that
/// dispatched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeAnimationEnded {
    pub phase: Phase,
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// The top-level window hosting the capsule.
///
/// Frames are physical screen pixels with a top-left origin.
pub trait CapsuleWindow: Send + Sync + 'static {
    /// Current outer frame of the window.
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be queried.
    fn outer_frame(&self) -> Result<Rect, PlatformError>;

    /// Work area of the monitor the window lives on.
    ///
    /// # Errors
    ///
    /// Returns an error if the monitor cannot be determined.
    fn work_area(&self) -> Result<Rect, PlatformError>;

    /// Display refresh rate in Hz, if known.
    fn refresh_rate(&self) -> Option<f64> { None }

    /// Moves and resizes the window.
    ///
    /// # Errors
    ///
    /// Returns an error if the window rejects the frame.
    fn set_frame(&self, frame: Rect) -> Result<(), PlatformError>;

    /// Raises the window `offset` levels above the main menu and keeps it on
    /// every space.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Unsupported`] when the backend has no notion
    /// of window levels.
    fn set_level_offset(&self, offset: i32) -> Result<(), PlatformError> {
        let _ = offset;
        Err(PlatformError::Unsupported("window levels"))
    }

    /// Asks the window to become (or stop being) focusable.
    fn request_focus(&self, focusable: bool) -> BoxFuture<'static, Result<(), PlatformError>>;

    /// Queries the collapsed capsule dimensions and display scale factor.
    fn query_dimensions(&self) -> BoxFuture<'static, Result<StartupDimensions, PlatformError>>;
}

/// The external mask animator living in the native layer.
///
/// All calls are fire-and-forget; completion arrives later as a
/// [`NativeAnimationEnded`] event.
pub trait NativeAnimator: Send + Sync + 'static {
    /// Installs the animator over the window with the given geometry.
    ///
    /// # Errors
    ///
    /// Returns an error if the native layer is unavailable.
    fn attach(&self, request: &AttachRequest) -> Result<(), PlatformError>;

    /// Starts the expand animation.
    ///
    /// # Errors
    ///
    /// Returns an error if the animation cannot be started.
    fn expand(&self, duration: Duration) -> Result<(), PlatformError>;

    /// Starts the collapse animation.
    ///
    /// # Errors
    ///
    /// Returns an error if the animation cannot be started.
    fn collapse(&self, duration: Duration) -> Result<(), PlatformError>;

    /// Jumps the mask to a fixed progress (0.0 collapsed, 1.0 expanded).
    ///
    /// # Errors
    ///
    /// Returns an error if the native layer rejects the call.
    fn set_progress(&self, progress: f64) -> Result<(), PlatformError>;
}

/// The set of collaborators a controller is spawned with.
pub struct Platform {
    pub window: Arc<dyn CapsuleWindow>,
    pub native: Option<Arc<dyn NativeAnimator>>,
    pub native_events: Option<mpsc::UnboundedReceiver<NativeAnimationEnded>>,
}

impl Platform {
    /// Window only; every transition uses the fallback animator.
    #[must_use]
    pub fn window_only(window: Arc<dyn CapsuleWindow>) -> Self {
        Self { window, native: None, native_events: None }
    }

    /// Window plus a native animator and its completion channel.
    #[must_use]
    pub fn with_native(
        window: Arc<dyn CapsuleWindow>,
        native: Arc<dyn NativeAnimator>,
        native_events: mpsc::UnboundedReceiver<NativeAnimationEnded>,
    ) -> Self {
        Self {
            window,
            native: Some(native),
            native_events: Some(native_events),
        }
    }
}
