//! Window-resize animator used when the native mask layer is unavailable.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::easing::linear_progress;
use super::transition::SizeTransition;
use super::{
    AnimationPlan, AnimationSettled, DEFAULT_REFRESH_RATE, GeometryAnimator,
    MIN_ANIMATION_DISTANCE,
};
use crate::capsule::geometry::{Rect, Size};
use crate::capsule::state::{Backend, Phase, SessionId};
use crate::platform::{CapsuleWindow, PlatformError};

struct InFlight {
    session: SessionId,
    phase: Phase,
    task: JoinHandle<()>,
}

/// Eased, frame-paced window resize.
///
/// Only one transition runs at a time. Starting a new one aborts the running
/// task, leaves the window at its last applied size and reports the old
/// session as cancelled.
pub struct FallbackAnimator<M> {
    window: Arc<dyn CapsuleWindow>,
    sender: mpsc::WeakSender<M>,
    in_flight: Option<InFlight>,
}

impl<M> FallbackAnimator<M>
where M: From<AnimationSettled> + Send + 'static
{
    #[must_use]
    pub fn new(window: Arc<dyn CapsuleWindow>, sender: mpsc::WeakSender<M>) -> Self {
        Self { window, sender, in_flight: None }
    }

    /// Whether a transition task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|in_flight| !in_flight.task.is_finished())
    }

    /// Aborts the running transition, if any, reporting it as cancelled.
    pub fn cancel(&mut self) {
        let Some(in_flight) = self.in_flight.take() else {
            return;
        };
        if in_flight.task.is_finished() {
            return;
        }
        in_flight.task.abort();
        tracing::debug!(
            session = %in_flight.session,
            phase = ?in_flight.phase,
            "fallback transition superseded"
        );

        let settled = AnimationSettled {
            session: in_flight.session,
            phase: in_flight.phase,
            cancelled: true,
        };
        let delivered = self
            .sender
            .upgrade()
            .is_some_and(|sender| sender.try_send(settled.into()).is_ok());
        if !delivered {
            tracing::debug!(session = %in_flight.session, "could not report cancelled transition");
        }
    }

    /// Applies `target` immediately, centred the same way a transition would.
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be queried or resized.
    pub fn apply_immediately(&mut self, target: Size) -> Result<Rect, PlatformError> {
        self.cancel();
        let start = self.window.outer_frame()?;
        let frame = SizeTransition::new(start, target, self.window.work_area().ok()).target_frame();
        self.window.set_frame(frame)?;
        Ok(frame)
    }

    fn frame_interval(&self) -> Duration {
        let hz = self
            .window
            .refresh_rate()
            .filter(|hz| hz.is_finite() && *hz > 0.0)
            .unwrap_or(DEFAULT_REFRESH_RATE)
            .clamp(30.0, 360.0);
        Duration::from_secs_f64(1.0 / hz)
    }
}

impl<M> GeometryAnimator for FallbackAnimator<M>
where M: From<AnimationSettled> + Send + 'static
{
    fn backend(&self) -> Backend { Backend::Fallback }

    fn start(
        &mut self,
        session: SessionId,
        phase: Phase,
        plan: &AnimationPlan,
    ) -> Result<(), PlatformError> {
        self.cancel();

        let sender = self.sender.clone();
        let settle = move || async move {
            let settled = AnimationSettled { session, phase, cancelled: false };
            let Some(sender) = sender.upgrade() else {
                return;
            };
            if sender.send(settled.into()).await.is_err() {
                tracing::trace!(%session, "animation receiver dropped");
            }
        };

        let start = match self.window.outer_frame() {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(error = %err, %session, "cannot read window frame, skipping resize");
                let task = tokio::spawn(settle());
                self.in_flight = Some(InFlight { session, phase, task });
                return Ok(());
            }
        };

        let transition = SizeTransition::new(start, plan.target, self.window.work_area().ok());
        if transition.max_distance() < MIN_ANIMATION_DISTANCE {
            if let Err(err) = self.window.set_frame(transition.target_frame()) {
                tracing::warn!(error = %err, %session, "failed to apply target frame");
            }
            let task = tokio::spawn(settle());
            self.in_flight = Some(InFlight { session, phase, task });
            return Ok(());
        }

        let window = Arc::clone(&self.window);
        let frame_interval = self.frame_interval();
        let duration = plan.duration;
        tracing::debug!(
            %session,
            ?phase,
            from = ?transition.from,
            to = ?transition.to,
            duration_ms = duration.as_millis(),
            "fallback transition started"
        );

        let task = tokio::spawn(async move {
            let started = Instant::now();
            let mut ticker = tokio::time::interval(frame_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let t = linear_progress(started.elapsed(), duration);
                if let Err(err) = window.set_frame(transition.frame_at(t)) {
                    tracing::warn!(error = %err, %session, "window rejected frame, ending transition");
                    break;
                }
                if t >= 1.0 {
                    break;
                }
            }

            settle().await;
        });

        self.in_flight = Some(InFlight { session, phase, task });
        Ok(())
    }
}

impl<M> Drop for FallbackAnimator<M> {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.task.abort();
        }
    }
}
