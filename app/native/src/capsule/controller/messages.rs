//! Message types for the expansion controller.
//!
//! Everything that can change the capsule becomes a `ControllerMessage` on
//! one queue: user requests, hover edges, timer expiries, animator
//! completions and native events.

use serde::Serialize;
use tokio::sync::oneshot;

use crate::capsule::animation::AnimationSettled;
use crate::capsule::geometry::{GeometrySpec, HoverSignal, PointerSample};
use crate::capsule::intent::IntentFired;
use crate::capsule::state::{AnimationSession, ExpansionState, GuardFlags, Phase, SessionId};

// ============================================================================
// Controller Messages
// ============================================================================

/// Messages sent to the expansion controller.
#[derive(Debug)]
pub enum ControllerMessage {
    // ════════════════════════════════════════════════════════════════════════
    // Signals
    // ════════════════════════════════════════════════════════════════════════
    /// Raw hover edge from the hover watcher.
    Hover(HoverSignal),

    /// Pointer position, used to detect the pointer inside the expanded panel.
    Pointer(PointerSample),

    // ════════════════════════════════════════════════════════════════════════
    // Requests
    // ════════════════════════════════════════════════════════════════════════
    /// Expand now.
    RequestExpand,

    /// Collapse now. `force` bypasses the hold and pointer guards.
    RequestCollapse { force: bool },

    /// Hold the panel open (or release it).
    SetManualHold { held: bool },

    /// Pin the panel expanded (or unpin it).
    SetDevForceExpanded { enabled: bool },

    /// Logical width the collapsed capsule should take on the next collapse.
    SetCollapsedWidthHint { width: Option<f64> },

    /// Jump the native mask to a fixed progress.
    SetNativeProgress { progress: f64 },

    /// Attach (or re-attach) the native mask animator.
    AttachNative,

    // ════════════════════════════════════════════════════════════════════════
    // Internal events
    // ════════════════════════════════════════════════════════════════════════
    /// A debounce timer elapsed.
    IntentFired(IntentFired),

    /// The fallback animator finished or was superseded.
    AnimationSettled(AnimationSettled),

    /// The native layer finished an animation.
    NativeAnimationEnded { phase: Phase },

    /// A session passed its deadline without completing.
    SessionTimedOut { session: SessionId },

    // ════════════════════════════════════════════════════════════════════════
    // Queries & Control
    // ════════════════════════════════════════════════════════════════════════
    /// Snapshot of the controller state.
    Query { respond_to: oneshot::Sender<ControllerSnapshot> },

    /// Stop the controller.
    Shutdown,
}

impl ControllerMessage {
    /// Returns the message name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Hover(_) => "Hover",
            Self::Pointer(_) => "Pointer",
            Self::RequestExpand => "RequestExpand",
            Self::RequestCollapse { .. } => "RequestCollapse",
            Self::SetManualHold { .. } => "SetManualHold",
            Self::SetDevForceExpanded { .. } => "SetDevForceExpanded",
            Self::SetCollapsedWidthHint { .. } => "SetCollapsedWidthHint",
            Self::SetNativeProgress { .. } => "SetNativeProgress",
            Self::AttachNative => "AttachNative",
            Self::IntentFired(_) => "IntentFired",
            Self::AnimationSettled(_) => "AnimationSettled",
            Self::NativeAnimationEnded { .. } => "NativeAnimationEnded",
            Self::SessionTimedOut { .. } => "SessionTimedOut",
            Self::Query { .. } => "Query",
            Self::Shutdown => "Shutdown",
        }
    }
}

impl From<IntentFired> for ControllerMessage {
    fn from(fired: IntentFired) -> Self { Self::IntentFired(fired) }
}

impl From<AnimationSettled> for ControllerMessage {
    fn from(settled: AnimationSettled) -> Self { Self::AnimationSettled(settled) }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Point-in-time view of the controller internals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerSnapshot {
    pub state: ExpansionState,
    pub guards: GuardFlags,
    pub geometry: GeometrySpec,
    pub collapsed_width: f64,
    pub hover_inside: Option<bool>,
    pub expand_pending: bool,
    pub collapse_pending: bool,
    pub collapse_deferred: bool,
    pub active_session: Option<AnimationSession>,
    pub native_attached: bool,
    pub focusable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capsule::intent::IntentKind;

    #[test]
    fn test_message_names() {
        assert_eq!(ControllerMessage::RequestExpand.name(), "RequestExpand");
        assert_eq!(ControllerMessage::RequestCollapse { force: true }.name(), "RequestCollapse");
        assert_eq!(
            ControllerMessage::SessionTimedOut { session: SessionId(4) }.name(),
            "SessionTimedOut"
        );
    }

    #[test]
    fn test_conversions() {
        let fired = IntentFired { kind: IntentKind::Collapse, token: 9 };
        assert!(matches!(
            ControllerMessage::from(fired),
            ControllerMessage::IntentFired(IntentFired { token: 9, .. })
        ));

        let settled = AnimationSettled {
            session: SessionId(2),
            phase: Phase::Expand,
            cancelled: false,
        };
        assert!(matches!(
            ControllerMessage::from(settled),
            ControllerMessage::AnimationSettled(_)
        ));
    }
}
