//! Event names shared with the webview and the native layer.
//!
//! Events emitted by this crate follow `capsule://<module>/<event-name>`.
//! The native animation event keeps the name the native layer already emits.

/// Events received from the native mask layer.
pub mod native {
    /// Emitted by the native layer when a mask animation ends.
    ///
    /// Payload: `{ "phase": "expand" | "collapse" }`
    pub const ANIMATION_END: &str = "notch-native-anim-end";
}

/// Panel events emitted to the webview.
pub mod panel {
    /// Emitted whenever the published panel view changes.
    ///
    /// Payload: `PanelView` (camelCase JSON).
    pub const STATE_CHANGED: &str = "capsule://panel/state-changed";
}
