//! Normalises animation completions.
//!
//! The fallback animator reports `(session, phase)`; the native layer only
//! reports a phase. The bridge remembers each native dispatch in order so an
//! incoming native phase can be matched to the session that started it, then
//! lets a completion through only when it belongs to the active session.
//!
//! Each dispatch expires once its animation should long have ended. An event
//! lost by the native layer then stops occupying the queue instead of pairing
//! every later event with the session before it.

use std::collections::VecDeque;

use tokio::time::Instant;

use super::animation::AnimationSettled;
use super::state::{AnimationSession, Backend, Phase, SessionId};

/// Outstanding native dispatches remembered at most.
const MAX_NATIVE_DISPATCHES: usize = 8;

/// Where a completion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSource {
    Fallback,
    Native,
    Watchdog,
}

/// A completion accepted for the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub session: SessionId,
    pub phase: Phase,
    pub source: CompletionSource,
}

/// Tracks the active session and correlates completions with it.
#[derive(Debug, Default)]
pub struct CompletionBridge {
    active: Option<AnimationSession>,
    native_dispatches: VecDeque<NativeDispatch>,
}

#[derive(Debug, Clone, Copy)]
struct NativeDispatch {
    session: SessionId,
    phase: Phase,
    expires_at: Instant,
}

impl CompletionBridge {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Makes `session` the only session whose completion is accepted.
    ///
    /// A native dispatch stays claimable by native events until `expires_at`.
    pub fn begin(&mut self, session: AnimationSession, expires_at: Instant) {
        if let Some(previous) = self.active.replace(session) {
            tracing::debug!(previous = %previous.id, next = %session.id, "session superseded");
        }
        if session.backend == Backend::Native {
            if self.native_dispatches.len() == MAX_NATIVE_DISPATCHES {
                self.native_dispatches.pop_front();
            }
            self.native_dispatches.push_back(NativeDispatch {
                session: session.id,
                phase: session.phase,
                expires_at,
            });
        }
    }

    /// The session currently awaiting completion.
    #[must_use]
    pub const fn active(&self) -> Option<AnimationSession> { self.active }

    /// Number of native dispatches without a matching completion yet.
    #[must_use]
    pub fn outstanding_native(&self) -> usize { self.native_dispatches.len() }

    /// Resolves a fallback completion.
    pub fn resolve_settled(&mut self, settled: AnimationSettled) -> Option<Completion> {
        if settled.cancelled {
            tracing::debug!(session = %settled.session, "ignoring cancelled transition");
            return None;
        }
        self.accept(settled.session, settled.phase, CompletionSource::Fallback)
    }

    /// Resolves a native completion received at `now` by claiming the oldest
    /// unexpired dispatch of `phase`.
    pub fn resolve_native(&mut self, phase: Phase, now: Instant) -> Option<Completion> {
        self.evict_expired(now);
        let Some(index) = self.native_dispatches.iter().position(|d| d.phase == phase) else {
            tracing::debug!(?phase, "native completion without a matching dispatch");
            return None;
        };
        let dispatch = self.native_dispatches.remove(index)?;
        self.accept(dispatch.session, dispatch.phase, CompletionSource::Native)
    }

    fn evict_expired(&mut self, now: Instant) {
        self.native_dispatches.retain(|dispatch| {
            let live = dispatch.expires_at > now;
            if !live {
                tracing::debug!(session = %dispatch.session, phase = ?dispatch.phase, "native dispatch expired");
            }
            live
        });
    }

    /// Resolves a watchdog deadline for `session`.
    pub fn resolve_timeout(&mut self, session: SessionId) -> Option<Completion> {
        let phase = self.active.filter(|active| active.id == session)?.phase;
        self.accept(session, phase, CompletionSource::Watchdog)
    }

    fn accept(
        &mut self,
        session: SessionId,
        phase: Phase,
        source: CompletionSource,
    ) -> Option<Completion> {
        match self.active {
            Some(active) if active.id == session && active.phase == phase => {
                self.active = None;
                Some(Completion { session, phase, source })
            }
            _ => {
                tracing::debug!(
                    %session,
                    ?phase,
                    ?source,
                    active = ?self.active.map(|active| active.id),
                    "discarding stale completion"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn live() -> Instant { Instant::now() + Duration::from_secs(60) }

    fn session(id: u64, phase: Phase, backend: Backend) -> AnimationSession {
        AnimationSession { id: SessionId(id), phase, backend }
    }

    fn settled(id: u64, phase: Phase) -> AnimationSettled {
        AnimationSettled { session: SessionId(id), phase, cancelled: false }
    }

    #[test]
    fn test_fallback_completion_for_active_session() {
        let mut bridge = CompletionBridge::new();
        bridge.begin(session(1, Phase::Expand, Backend::Fallback), live());

        let completion = bridge.resolve_settled(settled(1, Phase::Expand)).unwrap();
        assert_eq!(completion.source, CompletionSource::Fallback);
        assert!(bridge.active().is_none());
    }

    #[test]
    fn test_superseded_fallback_completion_is_discarded() {
        let mut bridge = CompletionBridge::new();
        bridge.begin(session(1, Phase::Expand, Backend::Fallback), live());
        bridge.begin(session(2, Phase::Collapse, Backend::Fallback), live());

        assert!(bridge.resolve_settled(settled(1, Phase::Expand)).is_none());
        assert_eq!(bridge.active().map(|s| s.id), Some(SessionId(2)));
        assert!(bridge.resolve_settled(settled(2, Phase::Collapse)).is_some());
    }

    #[test]
    fn test_cancelled_fallback_is_discarded() {
        let mut bridge = CompletionBridge::new();
        bridge.begin(session(1, Phase::Expand, Backend::Fallback), live());
        let cancelled = AnimationSettled { cancelled: true, ..settled(1, Phase::Expand) };
        assert!(bridge.resolve_settled(cancelled).is_none());
        assert!(bridge.active().is_some());
    }

    #[test]
    fn test_native_completion_claims_oldest_dispatch() {
        let mut bridge = CompletionBridge::new();
        bridge.begin(session(1, Phase::Expand, Backend::Native), live());
        bridge.begin(session(2, Phase::Collapse, Backend::Native), live());
        bridge.begin(session(3, Phase::Expand, Backend::Native), live());
        assert_eq!(bridge.outstanding_native(), 3);

        // Late end of session 1 is claimed and discarded
        assert!(bridge.resolve_native(Phase::Expand, Instant::now()).is_none());
        // End of session 2 is also stale
        assert!(bridge.resolve_native(Phase::Collapse, Instant::now()).is_none());
        // Session 3 completes
        let completion = bridge.resolve_native(Phase::Expand, Instant::now()).unwrap();
        assert_eq!(completion.session, SessionId(3));
        assert_eq!(completion.source, CompletionSource::Native);
        assert_eq!(bridge.outstanding_native(), 0);
    }

    #[test]
    fn test_native_completion_without_dispatch() {
        let mut bridge = CompletionBridge::new();
        bridge.begin(session(1, Phase::Expand, Backend::Fallback), live());
        assert!(bridge.resolve_native(Phase::Expand, Instant::now()).is_none());
        assert!(bridge.active().is_some());
    }

    #[test]
    fn test_native_dispatch_queue_is_bounded() {
        let mut bridge = CompletionBridge::new();
        for id in 0..20 {
            bridge.begin(session(id, Phase::Expand, Backend::Native), live());
        }
        assert_eq!(bridge.outstanding_native(), MAX_NATIVE_DISPATCHES);
    }

    #[test]
    fn test_timeout_only_for_active_session() {
        let mut bridge = CompletionBridge::new();
        bridge.begin(session(1, Phase::Collapse, Backend::Native), live());
        bridge.begin(session(2, Phase::Expand, Backend::Fallback), live());

        assert!(bridge.resolve_timeout(SessionId(1)).is_none());
        let completion = bridge.resolve_timeout(SessionId(2)).unwrap();
        assert_eq!(completion.phase, Phase::Expand);
        assert_eq!(completion.source, CompletionSource::Watchdog);
        // Already resolved
        assert!(bridge.resolve_settled(settled(2, Phase::Expand)).is_none());
    }

    #[test]
    fn test_expired_dispatch_does_not_claim_later_event() {
        let start = Instant::now();
        let mut bridge = CompletionBridge::new();
        // Its end event is lost; the watchdog settles it
        bridge.begin(session(1, Phase::Expand, Backend::Native), start + Duration::from_secs(1));
        assert!(bridge.resolve_timeout(SessionId(1)).is_some());

        bridge.begin(session(2, Phase::Expand, Backend::Native), start + Duration::from_secs(3));
        let completion = bridge.resolve_native(Phase::Expand, start + Duration::from_secs(2)).unwrap();
        assert_eq!(completion.session, SessionId(2));
        assert_eq!(bridge.outstanding_native(), 0);
    }

    #[test]
    fn test_unexpired_interrupted_dispatch_absorbs_its_late_event() {
        let start = Instant::now();
        let mut bridge = CompletionBridge::new();
        bridge.begin(session(1, Phase::Expand, Backend::Native), start + Duration::from_secs(1));
        bridge.begin(session(2, Phase::Collapse, Backend::Native), start + Duration::from_secs(2));
        bridge.begin(session(3, Phase::Expand, Backend::Native), start + Duration::from_secs(3));

        let at = start + Duration::from_millis(500);
        assert!(bridge.resolve_native(Phase::Expand, at).is_none());
        assert!(bridge.resolve_native(Phase::Expand, at).is_some());
    }
}
