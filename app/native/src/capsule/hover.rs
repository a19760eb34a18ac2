//! Pointer polling that turns cursor positions into hover signals.
//!
//! The poller is optional: hosts that already receive enter/leave events can
//! call [`CapsuleHandle::hover`] directly.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::controller::CapsuleHandle;
use super::geometry::{HoverSignal, PointerSample, Rect, Size};
use super::state::ExpansionState;
use crate::config::HoverConfig;
use crate::platform::CapsuleWindow;

/// Reads the global cursor position in physical pixels.
pub trait CursorSource: Send + Sync {
    /// Current cursor position, or `None` when it cannot be read.
    fn position(&self) -> Option<(f64, f64)>;
}

/// Hover zones in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverZones {
    pub collapsed: Size,
    pub expanded: Size,
}

impl HoverZones {
    #[must_use]
    pub fn from_config(config: &HoverConfig, scale_factor: f64) -> Self {
        Self {
            collapsed: Size::new(config.collapsed_zone_width, config.collapsed_zone_height)
                .scaled(scale_factor),
            expanded: Size::new(config.expanded_zone_width, config.expanded_zone_height)
                .scaled(scale_factor),
        }
    }

    /// The zone for the current window frame, centred on it and anchored to
    /// its top edge.
    #[must_use]
    pub fn zone_for(&self, frame: Rect, open: bool) -> Rect {
        let size = if open { self.expanded } else { self.collapsed };
        Rect::centered_at_top(size, frame.center_x(), frame.y)
    }
}

/// Polls a [`CursorSource`] and reports hover edges to a controller.
pub struct HoverPoller {
    handle: CapsuleHandle,
    window: Arc<dyn CapsuleWindow>,
    cursor: Arc<dyn CursorSource>,
    zones: HoverZones,
    interval: Duration,
}

impl HoverPoller {
    #[must_use]
    pub fn new(
        handle: CapsuleHandle,
        window: Arc<dyn CapsuleWindow>,
        cursor: Arc<dyn CursorSource>,
        zones: HoverZones,
        interval: Duration,
    ) -> Self {
        Self { handle, window, cursor, zones, interval }
    }

    /// Starts polling. The task ends once the controller stops.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> { tokio::spawn(self.run()) }

    async fn run(self) {
        tracing::debug!(interval_ms = self.interval.as_millis(), "capsule: hover poller started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last: Option<((f64, f64), ExpansionState)> = None;

        loop {
            ticker.tick().await;
            if !self.handle.is_running() {
                break;
            }

            let Some(position) = self.cursor.position() else {
                continue;
            };
            let state = self.handle.view().state;
            if last == Some((position, state)) {
                continue;
            }
            last = Some((position, state));

            let Ok(frame) = self.window.outer_frame() else {
                continue;
            };
            let (x, y) = position;
            let inside = self.zones.zone_for(frame, state.is_open()).contains_with_slop(x, y, 0.0);

            let sent = self
                .handle
                .pointer(PointerSample::now(x, y))
                .and_then(|()| self.handle.hover_signal(HoverSignal::now(inside)));
            if let Err(err) = sent {
                tracing::debug!(error = %err, "capsule: hover poller could not deliver sample");
            }
        }

        tracing::debug!("capsule: hover poller stopped");
    }
}
