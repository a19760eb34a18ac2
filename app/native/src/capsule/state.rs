//! Expansion state, guard flags and the published panel view.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Visual/interaction state of the capsule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpansionState {
    #[default]
    Collapsed,
    Expanding,
    Expanded,
    Collapsing,
}

impl ExpansionState {
    /// Expanding or Expanded.
    #[must_use]
    pub const fn is_open(self) -> bool { matches!(self, Self::Expanding | Self::Expanded) }

    /// Expanding or Collapsing.
    #[must_use]
    pub const fn is_transient(self) -> bool { matches!(self, Self::Expanding | Self::Collapsing) }
}

impl fmt::Display for ExpansionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Collapsed => "collapsed",
            Self::Expanding => "expanding",
            Self::Expanded => "expanded",
            Self::Collapsing => "collapsing",
        };
        f.pad(name)
    }
}

/// Conditions that keep the capsule open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardFlags {
    /// The user (or frontend) is holding the panel open.
    pub manual_hold: bool,
    /// The pointer is inside the expanded panel frame.
    pub pointer_in_expanded_panel: bool,
    /// Developer override pinning the panel expanded.
    pub dev_force_expanded: bool,
}

impl GuardFlags {
    /// Whether an unforced collapse must be suppressed.
    #[must_use]
    pub const fn blocks_collapse(&self) -> bool {
        self.manual_hold || self.pointer_in_expanded_panel || self.dev_force_expanded
    }
}

/// Direction of an animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Expand,
    Collapse,
}

impl Phase {
    /// The state entered while this phase runs.
    #[must_use]
    pub const fn transient_state(self) -> ExpansionState {
        match self {
            Self::Expand => ExpansionState::Expanding,
            Self::Collapse => ExpansionState::Collapsing,
        }
    }

    /// The state entered when this phase completes.
    #[must_use]
    pub const fn settled_state(self) -> ExpansionState {
        match self {
            Self::Expand => ExpansionState::Expanded,
            Self::Collapse => ExpansionState::Collapsed,
        }
    }
}

/// Which animator drives a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Native,
    Fallback,
}

/// Identifier of one geometry transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
}

/// One in-flight geometry transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnimationSession {
    pub id: SessionId,
    pub phase: Phase,
    pub backend: Backend,
}

/// State published to the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelView {
    pub state: ExpansionState,
    pub collapsed_content_visible: bool,
    pub expanded_content_visible: bool,
    /// Logical width of the collapsed capsule.
    pub collapsed_width: f64,
    pub focusable: bool,
    /// Backend of the most recent session, if any.
    pub backend: Option<Backend>,
    /// Most recent session, if any.
    pub session: Option<SessionId>,
}

impl PanelView {
    /// Initial view: collapsed, collapsed content shown, not focusable.
    #[must_use]
    pub const fn collapsed(collapsed_width: f64) -> Self {
        Self {
            state: ExpansionState::Collapsed,
            collapsed_content_visible: true,
            expanded_content_visible: false,
            collapsed_width,
            focusable: false,
            backend: None,
            session: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guards_block_collapse() {
        assert!(!GuardFlags::default().blocks_collapse());
        assert!(GuardFlags { manual_hold: true, ..Default::default() }.blocks_collapse());
        assert!(
            GuardFlags {
                pointer_in_expanded_panel: true,
                ..Default::default()
            }
            .blocks_collapse()
        );
        assert!(GuardFlags { dev_force_expanded: true, ..Default::default() }.blocks_collapse());
    }

    #[test]
    fn test_phase_states() {
        assert_eq!(Phase::Expand.transient_state(), ExpansionState::Expanding);
        assert_eq!(Phase::Expand.settled_state(), ExpansionState::Expanded);
        assert_eq!(Phase::Collapse.transient_state(), ExpansionState::Collapsing);
        assert_eq!(Phase::Collapse.settled_state(), ExpansionState::Collapsed);
    }

    #[test]
    fn test_phase_deserializes_from_native_payload() {
        let phase: Phase = serde_json::from_str("\"collapse\"").unwrap();
        assert_eq!(phase, Phase::Collapse);
    }

    #[test]
    fn test_panel_view_serializes_camel_case() {
        let json = serde_json::to_value(PanelView::collapsed(460.0)).unwrap();
        assert_eq!(json["state"], "collapsed");
        assert_eq!(json["collapsedContentVisible"], true);
        assert_eq!(json["expandedContentVisible"], false);
        assert!(json["session"].is_null());
    }

    #[test]
    fn test_state_predicates() {
        assert!(ExpansionState::Expanding.is_open());
        assert!(ExpansionState::Expanded.is_open());
        assert!(!ExpansionState::Collapsing.is_open());
        assert!(ExpansionState::Collapsing.is_transient());
        assert!(!ExpansionState::Collapsed.is_transient());
    }
}
