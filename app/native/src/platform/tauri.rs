//! Tauri adapter.
//!
//! [`TauriCapsuleWindow`] drives a webview window, native animation events
//! arrive over the Tauri event bus, and the published panel view is emitted
//! back to the webview.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Deserialize;
use tauri::{
    AppHandle, Emitter, Listener, PhysicalPosition, PhysicalSize, Position, State, WebviewWindow,
};
use tokio::sync::mpsc;

use super::{CapsuleWindow, NativeAnimationEnded, PlatformError, StartupDimensions};
use crate::capsule::geometry::Rect;
use crate::capsule::state::{PanelView, Phase};
use crate::capsule::CapsuleHandle;
use crate::error::CapsuleError;
use crate::events;

/// A capsule hosted in a Tauri webview window.
#[derive(Clone)]
pub struct TauriCapsuleWindow {
    window: WebviewWindow,
}

impl TauriCapsuleWindow {
    #[must_use]
    pub const fn new(window: WebviewWindow) -> Self { Self { window } }
}

fn call_err(op: &'static str) -> impl FnOnce(tauri::Error) -> PlatformError {
    move |err| PlatformError::call(op, err.to_string())
}

impl CapsuleWindow for TauriCapsuleWindow {
    fn outer_frame(&self) -> Result<Rect, PlatformError> {
        let position = self.window.outer_position().map_err(call_err("outer_position"))?;
        let size = self.window.outer_size().map_err(call_err("outer_size"))?;
        Ok(Rect::new(
            f64::from(position.x),
            f64::from(position.y),
            f64::from(size.width),
            f64::from(size.height),
        ))
    }

    fn work_area(&self) -> Result<Rect, PlatformError> {
        let monitor = self
            .window
            .current_monitor()
            .map_err(call_err("current_monitor"))?
            .ok_or(PlatformError::WindowUnavailable)?;
        let area = monitor.work_area();
        Ok(Rect::new(
            f64::from(area.position.x),
            f64::from(area.position.y),
            f64::from(area.size.width),
            f64::from(area.size.height),
        ))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn set_frame(&self, frame: Rect) -> Result<(), PlatformError> {
        self.window
            .set_size(PhysicalSize::new(frame.width.round() as u32, frame.height.round() as u32))
            .map_err(call_err("set_size"))?;
        self.window
            .set_position(Position::Physical(PhysicalPosition::new(
                frame.x.round() as i32,
                frame.y.round() as i32,
            )))
            .map_err(call_err("set_position"))
    }

    fn set_level_offset(&self, offset: i32) -> Result<(), PlatformError> {
        self.window.set_always_on_top(true).map_err(call_err("set_always_on_top"))?;
        self.window
            .set_visible_on_all_workspaces(true)
            .map_err(call_err("set_visible_on_all_workspaces"))?;

        #[cfg(target_os = "macos")]
        set_ns_window_level(&self.window, offset)?;
        #[cfg(not(target_os = "macos"))]
        tracing::debug!(offset, "capsule: window level offset only applies on macOS");

        Ok(())
    }

    fn request_focus(&self, focusable: bool) -> BoxFuture<'static, Result<(), PlatformError>> {
        let window = self.window.clone();
        async move {
            window.set_focusable(focusable).map_err(call_err("set_focusable"))?;
            if focusable {
                window.set_focus().map_err(call_err("set_focus"))?;
            }
            Ok(())
        }
        .boxed()
    }

    fn query_dimensions(&self) -> BoxFuture<'static, Result<StartupDimensions, PlatformError>> {
        let window = self.window.clone();
        async move {
            let scale_factor = window.scale_factor().map_err(call_err("scale_factor"))?;
            let size = window.outer_size().map_err(call_err("outer_size"))?;
            let logical = size.to_logical::<f64>(scale_factor);
            Ok(StartupDimensions {
                collapsed_width: logical.width,
                collapsed_height: logical.height,
                scale_factor,
            })
        }
        .boxed()
    }
}

/// Puts the `NSWindow` `offset` levels above the main menu level.
#[cfg(target_os = "macos")]
fn set_ns_window_level(window: &WebviewWindow, offset: i32) -> Result<(), PlatformError> {
    use objc::runtime::Object;
    use objc::{msg_send, sel, sel_impl};

    // kCGMainMenuWindowLevelKey
    const MAIN_MENU_LEVEL_KEY: i32 = 8;

    #[link(name = "CoreGraphics", kind = "framework")]
    unsafe extern "C" {
        fn CGWindowLevelForKey(key: i32) -> i32;
    }

    let ns_window = window.ns_window().map_err(call_err("ns_window"))?;
    if ns_window.is_null() {
        return Err(PlatformError::WindowUnavailable);
    }

    unsafe {
        let level = i64::from(CGWindowLevelForKey(MAIN_MENU_LEVEL_KEY)) + i64::from(offset);
        let ns_window = ns_window.cast::<Object>();
        let _: () = msg_send![ns_window, setLevel: level];
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct AnimationEndPayload {
    phase: Phase,
}

/// Forwards `notch-native-anim-end` events into a typed channel.
///
/// The returned receiver is handed to the controller through
/// [`Platform::with_native`](super::Platform::with_native).
#[must_use]
pub fn native_animation_events(app: &AppHandle) -> mpsc::UnboundedReceiver<NativeAnimationEnded> {
    let (tx, rx) = mpsc::unbounded_channel();

    app.listen(events::native::ANIMATION_END, move |event| {
        match serde_json::from_str::<AnimationEndPayload>(event.payload()) {
            Ok(AnimationEndPayload { phase }) => {
                if tx.send(NativeAnimationEnded { phase }).is_err() {
                    tracing::debug!(?phase, "capsule: native event dropped, controller stopped");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, payload = event.payload(), "capsule: malformed native animation event");
            }
        }
    });

    rx
}

/// Emits every published panel view to the webview.
pub fn publish_panel_view(app: AppHandle, handle: &CapsuleHandle) -> tauri::async_runtime::JoinHandle<()> {
    let mut subscriber = handle.subscribe();
    let initial = handle.view();

    tauri::async_runtime::spawn(async move {
        if let Err(err) = app.emit(events::panel::STATE_CHANGED, &initial) {
            tracing::warn!(error = %err, "capsule: failed to emit panel view");
        }
        while let Some(view) = subscriber.next().await {
            if let Err(err) = app.emit(events::panel::STATE_CHANGED, &view) {
                tracing::warn!(error = %err, "capsule: failed to emit panel view");
            }
        }
    })
}

// ============================================================================
// Commands
// ============================================================================

/// Returns the current panel view.
#[tauri::command]
pub fn capsule_panel_view(handle: State<'_, CapsuleHandle>) -> PanelView { handle.view() }

/// Holds the panel open, or releases it.
///
/// # Errors
///
/// Returns an error if the controller has stopped.
#[tauri::command]
pub fn capsule_set_manual_hold(handle: State<'_, CapsuleHandle>, held: bool) -> Result<(), CapsuleError> {
    Ok(handle.set_manual_hold(held)?)
}

/// Expands the panel now.
///
/// # Errors
///
/// Returns an error if the controller has stopped.
#[tauri::command]
pub fn capsule_expand(handle: State<'_, CapsuleHandle>) -> Result<(), CapsuleError> {
    Ok(handle.request_expand()?)
}

/// Collapses the panel, bypassing hover guards when `force` is set.
///
/// # Errors
///
/// Returns an error if the controller has stopped.
#[tauri::command]
pub fn capsule_collapse(handle: State<'_, CapsuleHandle>, force: bool) -> Result<(), CapsuleError> {
    if force {
        Ok(handle.force_collapse()?)
    } else {
        Ok(handle.request_collapse()?)
    }
}

/// Sets the collapsed width used from the next collapse on.
///
/// # Errors
///
/// Returns an error if the width is not a positive number or the controller
/// has stopped.
#[tauri::command]
pub fn capsule_set_collapsed_width(
    handle: State<'_, CapsuleHandle>,
    width: Option<f64>,
) -> Result<(), CapsuleError> {
    if width.is_some_and(|width| !width.is_finite() || width <= 0.0) {
        return Err(CapsuleError::InvalidArguments(format!(
            "collapsed width must be a positive number, got {width:?}"
        )));
    }
    Ok(handle.set_collapsed_width_hint(width)?)
}
