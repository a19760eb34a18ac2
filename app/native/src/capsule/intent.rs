//! Debounced expand/collapse intents.
//!
//! Raw hover edges are turned into delayed intents. At most one intent per
//! direction is pending; scheduling a direction cancels the opposite one and
//! restarts (never stacks) its own timer. Every intent carries a monotonic
//! token so a timer that already fired but is still queued can be told apart
//! from the latest request.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::state::{ExpansionState, GuardFlags};

/// Direction of an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    Expand,
    Collapse,
}

impl IntentKind {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Expand => Self::Collapse,
            Self::Collapse => Self::Expand,
        }
    }
}

/// Delivered to the owner's queue when an intent timer elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentFired {
    pub kind: IntentKind,
    pub token: u64,
}

/// Outcome of checking a fired intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The intent is current and may be acted on.
    Fire,
    /// A newer request replaced this one, or it was cancelled.
    Stale,
    /// A collapse arrived while a guard holds the panel open.
    Suppressed,
}

struct PendingIntent {
    token: u64,
    fires_at: Instant,
    task: JoinHandle<()>,
}

/// Owns the pending expand/collapse timers.
///
/// Timers deliver an [`IntentFired`] (converted into `M`) on the owner's
/// queue, so every decision happens on the owner's task. The scheduler only
/// holds a weak sender and never keeps the queue open by itself.
pub struct IntentScheduler<M> {
    sender: mpsc::WeakSender<M>,
    next_token: u64,
    expand: Option<PendingIntent>,
    collapse: Option<PendingIntent>,
    expand_delay: Duration,
    collapse_delay: Duration,
}

impl<M> IntentScheduler<M>
where M: From<IntentFired> + Send + 'static
{
    /// Creates a scheduler with the hover delays.
    #[must_use]
    pub const fn new(
        sender: mpsc::WeakSender<M>,
        expand_delay: Duration,
        collapse_delay: Duration,
    ) -> Self {
        Self {
            sender,
            next_token: 0,
            expand: None,
            collapse: None,
            expand_delay,
            collapse_delay,
        }
    }

    /// The configured delay for `kind`.
    #[must_use]
    pub const fn delay_for(&self, kind: IntentKind) -> Duration {
        match kind {
            IntentKind::Expand => self.expand_delay,
            IntentKind::Collapse => self.collapse_delay,
        }
    }

    /// Applies a hover edge to the pending intents.
    ///
    /// Inside cancels a pending collapse and schedules an expand unless the
    /// capsule is already open. Outside cancels a pending expand and schedules
    /// a collapse if the capsule is open.
    pub fn on_hover_signal(&mut self, inside: bool, state: ExpansionState) {
        if inside {
            self.cancel(IntentKind::Collapse);
            if !state.is_open() {
                self.schedule(IntentKind::Expand, self.expand_delay);
            }
        } else {
            self.cancel(IntentKind::Expand);
            if state.is_open() {
                self.schedule(IntentKind::Collapse, self.collapse_delay);
            }
        }
    }

    /// Schedules `kind` to fire after `delay` and returns its token.
    ///
    /// The timer always runs on a spawned task, even for a zero delay.
    pub fn schedule(&mut self, kind: IntentKind, delay: Duration) -> u64 {
        self.cancel(kind.opposite());
        self.cancel(kind);

        self.next_token += 1;
        let token = self.next_token;
        let sender = self.sender.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(sender) = sender.upgrade() else {
                return;
            };
            if sender.send(IntentFired { kind, token }.into()).await.is_err() {
                tracing::trace!(?kind, token, "intent receiver dropped");
            }
        });

        tracing::trace!(?kind, token, delay_ms = delay.as_millis(), "intent scheduled");
        *self.slot(kind) = Some(PendingIntent {
            token,
            fires_at: Instant::now() + delay,
            task,
        });
        token
    }

    /// Cancels the pending intent of `kind`, if any.
    pub fn cancel(&mut self, kind: IntentKind) {
        if let Some(pending) = self.slot(kind).take() {
            pending.task.abort();
            tracing::trace!(?kind, token = pending.token, "intent cancelled");
        }
    }

    /// Cancels both directions.
    pub fn cancel_all(&mut self) {
        self.cancel(IntentKind::Expand);
        self.cancel(IntentKind::Collapse);
    }

    /// Token and fire time of the pending intent of `kind`.
    #[must_use]
    pub fn pending(&self, kind: IntentKind) -> Option<(u64, Instant)> {
        let slot = match kind {
            IntentKind::Expand => &self.expand,
            IntentKind::Collapse => &self.collapse,
        };
        slot.as_ref().map(|pending| (pending.token, pending.fires_at))
    }

    #[must_use]
    pub fn is_pending(&self, kind: IntentKind) -> bool { self.pending(kind).is_some() }

    /// Checks a fired intent against the latest request and the guards.
    ///
    /// A current intent is consumed whether it fires or is suppressed.
    pub fn resolve(&mut self, fired: IntentFired, guards: &GuardFlags) -> Resolution {
        let slot = self.slot(fired.kind);
        if slot.as_ref().is_none_or(|pending| pending.token != fired.token) {
            return Resolution::Stale;
        }
        *slot = None;

        if fired.kind == IntentKind::Collapse && guards.blocks_collapse() {
            return Resolution::Suppressed;
        }
        Resolution::Fire
    }

    const fn slot(&mut self, kind: IntentKind) -> &mut Option<PendingIntent> {
        match kind {
            IntentKind::Expand => &mut self.expand,
            IntentKind::Collapse => &mut self.collapse,
        }
    }
}

impl<M> Drop for IntentScheduler<M> {
    fn drop(&mut self) {
        for pending in [self.expand.take(), self.collapse.take()].into_iter().flatten() {
            pending.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPAND_DELAY: Duration = Duration::from_millis(250);
    const COLLAPSE_DELAY: Duration = Duration::from_millis(150);

    struct Harness {
        scheduler: IntentScheduler<IntentFired>,
        rx: mpsc::Receiver<IntentFired>,
        _tx: mpsc::Sender<IntentFired>,
    }

    fn harness() -> Harness {
        let (tx, rx) = mpsc::channel(16);
        let scheduler = IntentScheduler::new(tx.downgrade(), EXPAND_DELAY, COLLAPSE_DELAY);
        Harness { scheduler, rx, _tx: tx }
    }

    #[tokio::test(start_paused = true)]
    async fn test_intent_fires_after_delay() {
        let Harness { mut scheduler, mut rx, _tx } = harness();
        let start = Instant::now();
        let token = scheduler.schedule(IntentKind::Expand, EXPAND_DELAY);

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired, IntentFired { kind: IntentKind::Expand, token });
        assert!(start.elapsed() >= EXPAND_DELAY);
        assert_eq!(scheduler.resolve(fired, &GuardFlags::default()), Resolution::Fire);
        assert!(!scheduler.is_pending(IntentKind::Expand));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_does_not_stack() {
        let Harness { mut scheduler, mut rx, _tx } = harness();
        let first = scheduler.schedule(IntentKind::Expand, EXPAND_DELAY);
        tokio::time::advance(Duration::from_millis(200)).await;
        let second = scheduler.schedule(IntentKind::Expand, EXPAND_DELAY);
        assert!(second > first);

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired.token, second);
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduling_cancels_opposite_direction() {
        let Harness { mut scheduler, mut rx, _tx } = harness();
        scheduler.schedule(IntentKind::Expand, EXPAND_DELAY);
        let collapse = scheduler.schedule(IntentKind::Collapse, COLLAPSE_DELAY);

        assert!(!scheduler.is_pending(IntentKind::Expand));
        let fired = rx.recv().await.unwrap();
        assert_eq!(fired, IntentFired { kind: IntentKind::Collapse, token: collapse });
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_token_is_rejected() {
        let Harness { mut scheduler, rx: _rx, _tx } = harness();
        let old = scheduler.schedule(IntentKind::Collapse, COLLAPSE_DELAY);
        scheduler.schedule(IntentKind::Collapse, COLLAPSE_DELAY);

        let stale = IntentFired { kind: IntentKind::Collapse, token: old };
        assert_eq!(scheduler.resolve(stale, &GuardFlags::default()), Resolution::Stale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_intent_resolves_stale() {
        let Harness { mut scheduler, rx: _rx, _tx } = harness();
        let token = scheduler.schedule(IntentKind::Expand, EXPAND_DELAY);
        scheduler.cancel(IntentKind::Expand);
        scheduler.cancel(IntentKind::Expand);

        let fired = IntentFired { kind: IntentKind::Expand, token };
        assert_eq!(scheduler.resolve(fired, &GuardFlags::default()), Resolution::Stale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_collapse_suppressed_by_hold() {
        let Harness { mut scheduler, mut rx, _tx } = harness();
        scheduler.schedule(IntentKind::Collapse, COLLAPSE_DELAY);
        let fired = rx.recv().await.unwrap();

        let guards = GuardFlags { manual_hold: true, ..Default::default() };
        assert_eq!(scheduler.resolve(fired, &guards), Resolution::Suppressed);
        // Consumed: a second delivery of the same token is stale
        assert_eq!(scheduler.resolve(fired, &GuardFlags::default()), Resolution::Stale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expand_ignores_guards() {
        let Harness { mut scheduler, mut rx, _tx } = harness();
        scheduler.schedule(IntentKind::Expand, EXPAND_DELAY);
        let fired = rx.recv().await.unwrap();

        let guards = GuardFlags { manual_hold: true, ..Default::default() };
        assert_eq!(scheduler.resolve(fired, &guards), Resolution::Fire);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_is_never_synchronous() {
        let Harness { mut scheduler, mut rx, _tx } = harness();
        scheduler.schedule(IntentKind::Expand, Duration::ZERO);
        assert!(rx.try_recv().is_err());
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hover_inside_schedules_expand_when_closed() {
        let Harness { mut scheduler, rx: _rx, _tx } = harness();
        scheduler.schedule(IntentKind::Collapse, COLLAPSE_DELAY);
        scheduler.on_hover_signal(true, ExpansionState::Collapsed);
        assert!(scheduler.is_pending(IntentKind::Expand));
        assert!(!scheduler.is_pending(IntentKind::Collapse));

        scheduler.cancel_all();
        scheduler.on_hover_signal(true, ExpansionState::Expanded);
        assert!(!scheduler.is_pending(IntentKind::Expand));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hover_outside_schedules_collapse_when_open() {
        let Harness { mut scheduler, rx: _rx, _tx } = harness();
        scheduler.on_hover_signal(false, ExpansionState::Collapsed);
        assert!(!scheduler.is_pending(IntentKind::Collapse));

        scheduler.schedule(IntentKind::Expand, EXPAND_DELAY);
        scheduler.on_hover_signal(false, ExpansionState::Expanding);
        assert!(!scheduler.is_pending(IntentKind::Expand));
        let (_, fires_at) = scheduler.pending(IntentKind::Collapse).unwrap();
        assert_eq!(fires_at, Instant::now() + COLLAPSE_DELAY);
    }
}
