//! Expansion controller.
//!
//! The controller owns the capsule's expansion state and processes messages
//! sequentially on one tokio task. Hover edges, debounce timers, animator
//! completions, native events and user requests all arrive on the same queue,
//! so every decision sees a consistent state.
//!
//! # Startup
//!
//! Before draining its queue the controller queries the collapsed dimensions
//! (bounded by a timeout), attaches the native mask animator when one is
//! available, and applies the initial frame. Requests sent in the meantime
//! wait in the queue.
//!
//! # Panic Recovery
//!
//! A panicking handler is caught and logged; the controller keeps processing
//! subsequent messages.

mod handle;
mod messages;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use eyeball::SharedObservable;
pub use handle::{ActorError, CapsuleHandle};
pub use messages::{ControllerMessage, ControllerSnapshot};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::animation::{AnimationPlan, FallbackAnimator, GeometryAnimator, NativeMaskAnimator};
use super::completion::{Completion, CompletionBridge};
use super::focus::FocusCoordinator;
use super::geometry::{GeometrySpec, HoverSignal, PointerSample};
use super::intent::{IntentFired, IntentKind, IntentScheduler, Resolution};
use super::state::{
    AnimationSession, Backend, ExpansionState, GuardFlags, PanelView, Phase, SessionId,
};
use crate::config::CapsuleConfig;
use crate::platform::{
    AttachRequest, CapsuleWindow, NativeAnimationEnded, Platform, PlatformError,
    StartupDimensions,
};

/// Channel buffer size for the controller.
const CHANNEL_BUFFER_SIZE: usize = 256;

/// Upper bound for the startup dimension query.
pub const STARTUP_QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Slack added to an animation's duration before its session is force-settled.
pub const SESSION_WATCHDOG_GRACE: Duration = Duration::from_millis(500);

/// The controller owning the capsule's expansion state.
pub struct ExpansionController {
    config: CapsuleConfig,
    geometry: GeometrySpec,
    state: ExpansionState,
    guards: GuardFlags,

    hover_inside: Option<bool>,
    last_hover_at: Option<Instant>,
    collapse_deferred: bool,
    reattach_pending: bool,

    collapsed_width: f64,
    collapsed_width_hint: Option<f64>,

    next_session: u64,
    last_session: Option<AnimationSession>,
    watchdog: Option<JoinHandle<()>>,

    window: Arc<dyn CapsuleWindow>,
    intents: IntentScheduler<ControllerMessage>,
    bridge: CompletionBridge,
    fallback: FallbackAnimator<ControllerMessage>,
    native: Option<NativeMaskAnimator>,
    focus: FocusCoordinator,

    view: SharedObservable<PanelView>,
    sender: mpsc::WeakSender<ControllerMessage>,
    receiver: mpsc::Receiver<ControllerMessage>,
}

impl ExpansionController {
    /// Spawns a controller for one capsule window and returns its handle.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(config: CapsuleConfig, platform: Platform) -> CapsuleHandle {
        tracing::debug!("capsule: spawning expansion controller");
        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let weak = sender.downgrade();

        let geometry = GeometrySpec::from_config(&config.dimensions);
        let view = SharedObservable::new(PanelView::collapsed(geometry.collapsed.width));

        if let Some(events) = platform.native_events {
            tokio::spawn(forward_native_events(events, weak.clone()));
        }

        let actor = Self {
            geometry,
            state: ExpansionState::Collapsed,
            guards: GuardFlags::default(),
            hover_inside: None,
            last_hover_at: None,
            collapse_deferred: false,
            reattach_pending: false,
            collapsed_width: geometry.collapsed.width,
            collapsed_width_hint: None,
            next_session: 0,
            last_session: None,
            watchdog: None,
            intents: IntentScheduler::new(
                weak.clone(),
                config.hover.expand_delay(),
                config.hover.collapse_delay(),
            ),
            bridge: CompletionBridge::new(),
            fallback: FallbackAnimator::new(Arc::clone(&platform.window), weak.clone()),
            native: platform.native.map(NativeMaskAnimator::new),
            focus: FocusCoordinator::new(Arc::clone(&platform.window)),
            window: platform.window,
            view: view.clone(),
            sender: weak,
            receiver,
            config,
        };

        tokio::spawn(actor.run());

        CapsuleHandle::new(sender, view)
    }

    /// Run the controller's message loop.
    ///
    /// This loop includes panic recovery - if a message handler panics,
    /// the error is logged and the controller continues processing messages.
    async fn run(mut self) {
        self.startup().await;
        tracing::trace!("capsule: controller message loop starting");

        while let Some(msg) = self.receiver.recv().await {
            if matches!(msg, ControllerMessage::Shutdown) {
                tracing::debug!("capsule: controller received shutdown message");
                break;
            }

            let msg_name = msg.name();
            let result = catch_unwind(AssertUnwindSafe(|| {
                self.handle_message(msg);
            }));

            if let Err(panic_info) = result {
                let panic_msg = panic_info
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic_info.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());

                tracing::error!(message = msg_name, panic = %panic_msg, "capsule: controller recovered from panic");
            }
        }

        self.teardown();
        tracing::debug!("capsule: controller stopped");
    }

    // ========================================================================
    // Startup
    // ========================================================================

    async fn startup(&mut self) {
        match tokio::time::timeout(STARTUP_QUERY_TIMEOUT, self.window.query_dimensions()).await {
            Ok(Ok(dimensions)) => self.apply_startup_dimensions(&dimensions),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "capsule: dimension query failed, using configured sizes");
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = STARTUP_QUERY_TIMEOUT.as_millis(),
                    "capsule: dimension query timed out, using configured sizes"
                );
            }
        }

        self.elevate_window();
        if !self.attach_native() {
            self.apply_collapsed_frame();
        }

        tracing::info!(
            collapsed = ?self.geometry.collapsed,
            expanded = ?self.geometry.expanded,
            scale_factor = self.geometry.scale_factor,
            native = self.native_attached(),
            "capsule: controller ready"
        );

        if self.config.developer.force_expanded {
            self.on_set_dev_force_expanded(true);
        }
        self.publish();
    }

    fn apply_startup_dimensions(&mut self, dimensions: &StartupDimensions) {
        self.geometry = self.geometry.with_startup_dimensions(dimensions);
        self.collapsed_width = self.geometry.collapsed.width;
        tracing::debug!(
            collapsed = ?self.geometry.collapsed,
            scale_factor = self.geometry.scale_factor,
            "capsule: applied startup dimensions"
        );
    }

    fn elevate_window(&self) {
        let offset = self.config.window.level_offset;
        match self.window.set_level_offset(offset) {
            Ok(()) => tracing::debug!(offset, "capsule: window elevated above the menu bar"),
            Err(PlatformError::Unsupported(_)) => {
                tracing::debug!(offset, "capsule: window levels not supported, skipping");
            }
            Err(err) => tracing::warn!(error = %err, offset, "capsule: failed to elevate window"),
        }
    }

    /// Attaches the native animator and sizes the window for it.
    ///
    /// Returns whether the native backend is usable afterwards.
    fn attach_native(&mut self) -> bool {
        let request = AttachRequest {
            collapsed: self.geometry.collapsed,
            expanded: self.geometry.expanded,
            corner_radius: self.geometry.corner_radius,
            expand_timing: self.config.animation.expand_timing,
            collapse_timing: self.config.animation.collapse_timing,
        };
        let Some(native) = self.native.as_mut() else {
            return false;
        };

        if let Err(err) = native.attach(&request) {
            tracing::warn!(error = %err, "capsule: native animator unavailable, using window resize");
            return false;
        }

        // The mask animates inside a window kept at the expanded size
        if let Err(err) = self.fallback.apply_immediately(self.geometry.expanded_physical()) {
            tracing::warn!(error = %err, "capsule: failed to size window for native animator");
        }
        let progress = if self.state == ExpansionState::Expanded { 1.0 } else { 0.0 };
        if let Err(err) = native.set_progress(progress) {
            tracing::debug!(error = %err, "capsule: failed to sync native progress");
        }
        true
    }

    fn native_attached(&self) -> bool { self.native.as_ref().is_some_and(NativeMaskAnimator::is_attached) }

    fn teardown(&mut self) {
        self.intents.cancel_all();
        self.fallback.cancel();
        if let Some(watchdog) = self.watchdog.take() {
            watchdog.abort();
        }
    }

    // ========================================================================
    // Message dispatch
    // ========================================================================

    fn handle_message(&mut self, msg: ControllerMessage) {
        match msg {
            ControllerMessage::Hover(signal) => self.on_hover(signal),
            ControllerMessage::Pointer(sample) => self.on_pointer(sample),
            ControllerMessage::RequestExpand => self.request_expand(),
            ControllerMessage::RequestCollapse { force } => self.request_collapse(force),
            ControllerMessage::SetManualHold { held } => self.on_set_manual_hold(held),
            ControllerMessage::SetDevForceExpanded { enabled } => {
                self.on_set_dev_force_expanded(enabled);
            }
            ControllerMessage::SetCollapsedWidthHint { width } => self.on_collapsed_width_hint(width),
            ControllerMessage::SetNativeProgress { progress } => self.on_native_progress(progress),
            ControllerMessage::AttachNative => self.on_attach_native(),
            ControllerMessage::IntentFired(fired) => self.on_intent_fired(fired),
            ControllerMessage::AnimationSettled(settled) => {
                if let Some(completion) = self.bridge.resolve_settled(settled) {
                    self.on_completion(completion);
                }
            }
            ControllerMessage::NativeAnimationEnded { phase } => {
                if let Some(completion) = self.bridge.resolve_native(phase, Instant::now()) {
                    self.on_completion(completion);
                }
            }
            ControllerMessage::SessionTimedOut { session } => {
                if let Some(completion) = self.bridge.resolve_timeout(session) {
                    tracing::warn!(%session, phase = ?completion.phase, "capsule: animation did not report completion, settling");
                    self.on_completion(completion);
                }
            }
            ControllerMessage::Query { respond_to } => {
                if respond_to.send(self.snapshot()).is_err() {
                    tracing::warn!("capsule: failed to send query response (channel closed)");
                }
            }
            // Shutdown handled in run()
            ControllerMessage::Shutdown => {}
        }
        self.publish();
    }

    // ========================================================================
    // Signals
    // ========================================================================

    fn on_hover(&mut self, signal: HoverSignal) {
        if self.last_hover_at.is_some_and(|last| signal.at < last) {
            tracing::debug!(inside = signal.inside, "capsule: dropping out-of-order hover signal");
            return;
        }
        self.last_hover_at = Some(signal.at);

        if self.hover_inside == Some(signal.inside) {
            return;
        }
        self.hover_inside = Some(signal.inside);
        tracing::trace!(inside = signal.inside, state = %self.state, "capsule: hover changed");

        if signal.inside {
            self.collapse_deferred = false;
        }
        self.intents.on_hover_signal(signal.inside, self.state);
    }

    fn on_pointer(&mut self, sample: PointerSample) {
        let inside = self.state == ExpansionState::Expanded
            && self.window.outer_frame().is_ok_and(|frame| {
                frame.contains_with_slop(sample.x, sample.y, self.config.hover.slop)
            });

        if inside == self.guards.pointer_in_expanded_panel {
            return;
        }
        self.guards.pointer_in_expanded_panel = inside;
        tracing::trace!(inside, "capsule: pointer in expanded panel changed");

        if inside {
            self.intents.cancel(IntentKind::Collapse);
        } else {
            self.schedule_collapse_if_idle();
        }
    }

    fn on_intent_fired(&mut self, fired: IntentFired) {
        match self.intents.resolve(fired, &self.guards) {
            Resolution::Stale => {
                tracing::debug!(kind = ?fired.kind, token = fired.token, "capsule: ignoring stale intent");
            }
            Resolution::Suppressed => {
                tracing::debug!(guards = ?self.guards, "capsule: collapse suppressed by guard");
            }
            Resolution::Fire => match fired.kind {
                IntentKind::Expand => self.request_expand(),
                IntentKind::Collapse => self.request_collapse(false),
            },
        }
    }

    // ========================================================================
    // Requests
    // ========================================================================

    fn request_expand(&mut self) {
        match self.state {
            ExpansionState::Expanding | ExpansionState::Expanded => {
                tracing::debug!(state = %self.state, "capsule: expand request rejected");
                return;
            }
            ExpansionState::Collapsing => {
                tracing::debug!("capsule: reversing collapse");
            }
            ExpansionState::Collapsed => {}
        }

        self.intents.cancel(IntentKind::Expand);
        self.intents.cancel(IntentKind::Collapse);
        self.collapse_deferred = false;
        self.begin_transition(Phase::Expand);
    }

    fn request_collapse(&mut self, force: bool) {
        if self.guards.dev_force_expanded {
            tracing::debug!(force, "capsule: collapse ignored while force-expanded");
            return;
        }

        match self.state {
            ExpansionState::Collapsed | ExpansionState::Collapsing => {
                tracing::debug!(state = %self.state, "capsule: collapse request rejected");
                return;
            }
            ExpansionState::Expanding if !force => {
                tracing::debug!("capsule: collapse deferred until expand completes");
                self.collapse_deferred = true;
                return;
            }
            ExpansionState::Expanded if !force && self.guards.blocks_collapse() => {
                tracing::debug!(guards = ?self.guards, "capsule: collapse rejected by guard");
                return;
            }
            ExpansionState::Expanding | ExpansionState::Expanded => {}
        }

        self.intents.cancel(IntentKind::Expand);
        self.intents.cancel(IntentKind::Collapse);
        self.collapse_deferred = false;
        self.guards.pointer_in_expanded_panel = false;
        self.begin_transition(Phase::Collapse);
    }

    fn on_set_manual_hold(&mut self, held: bool) {
        if self.guards.manual_hold == held {
            return;
        }
        self.guards.manual_hold = held;
        tracing::debug!(held, "capsule: manual hold changed");

        if !held {
            self.schedule_collapse_if_idle();
        }
    }

    fn on_set_dev_force_expanded(&mut self, enabled: bool) {
        if self.guards.dev_force_expanded == enabled {
            return;
        }
        self.guards.dev_force_expanded = enabled;
        tracing::info!(enabled, "capsule: developer force-expand changed");

        if enabled {
            self.intents.cancel(IntentKind::Collapse);
            self.collapse_deferred = false;
            if !self.state.is_open() {
                self.request_expand();
            }
        } else {
            self.schedule_collapse_if_idle();
        }
    }

    fn on_collapsed_width_hint(&mut self, width: Option<f64>) {
        self.collapsed_width_hint = width;
        if self.state == ExpansionState::Collapsed {
            self.collapsed_width = self.resolved_collapsed_width();
            if !self.native_attached() {
                self.apply_collapsed_frame();
            }
        }
    }

    fn on_native_progress(&mut self, progress: f64) {
        let Some(native) = self.native.as_ref() else {
            tracing::debug!("capsule: no native animator for progress update");
            return;
        };
        if let Err(err) = native.set_progress(progress) {
            tracing::debug!(error = %err, "capsule: native progress update failed");
        }
    }

    fn on_attach_native(&mut self) {
        if self.state.is_transient() {
            self.reattach_pending = true;
            return;
        }
        self.reattach_pending = false;
        if self.attach_native() {
            return;
        }
        if self.state == ExpansionState::Collapsed {
            self.apply_collapsed_frame();
        }
    }

    /// Schedules a collapse when nothing keeps the panel open.
    fn schedule_collapse_if_idle(&mut self) {
        let idle = self.state.is_open()
            && self.hover_inside != Some(true)
            && !self.guards.blocks_collapse();
        if idle {
            self.intents.schedule(IntentKind::Collapse, self.intents.delay_for(IntentKind::Collapse));
        }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    fn begin_transition(&mut self, phase: Phase) {
        self.next_session += 1;
        let id = SessionId(self.next_session);
        let plan = self.plan_for(phase);

        let backend = self.start_animation(id, phase, &plan);
        let session = AnimationSession { id, phase, backend };
        let deadline = plan.duration + SESSION_WATCHDOG_GRACE;
        self.bridge.begin(session, Instant::now() + deadline);
        self.last_session = Some(session);
        self.state = phase.transient_state();
        self.arm_watchdog(id, deadline);

        tracing::debug!(session = %id, ?phase, ?backend, "capsule: transition started");
    }

    fn plan_for(&self, phase: Phase) -> AnimationPlan {
        match phase {
            Phase::Expand => AnimationPlan {
                target: self.geometry.expanded_physical(),
                duration: self.config.animation.expand_duration(),
            },
            Phase::Collapse => AnimationPlan {
                target: self.geometry.collapsed_physical(self.resolved_collapsed_width()),
                duration: self.config.animation.collapse_duration(),
            },
        }
    }

    /// Starts the animation on the native backend, or the fallback if native
    /// is unavailable or fails to start.
    fn start_animation(&mut self, session: SessionId, phase: Phase, plan: &AnimationPlan) -> Backend {
        if let Some(native) = self.native.as_mut().filter(|native| native.is_attached()) {
            self.fallback.cancel();
            match native.start(session, phase, plan) {
                Ok(()) => return Backend::Native,
                Err(err) => {
                    tracing::warn!(error = %err, %session, "capsule: native animation failed, using window resize");
                    // The window sits at the expanded size while the mask is attached
                    if phase == Phase::Expand {
                        let collapsed = self.geometry.collapsed_physical(self.collapsed_width);
                        if let Err(err) = self.fallback.apply_immediately(collapsed) {
                            tracing::warn!(error = %err, "capsule: failed to shrink window before resize");
                        }
                    }
                }
            }
        }

        if let Err(err) = self.fallback.start(session, phase, plan) {
            tracing::warn!(error = %err, %session, "capsule: window resize failed to start");
        }
        Backend::Fallback
    }

    fn arm_watchdog(&mut self, session: SessionId, deadline: Duration) {
        if let Some(previous) = self.watchdog.take() {
            previous.abort();
        }
        let sender = self.sender.clone();
        self.watchdog = Some(tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            if let Some(sender) = sender.upgrade() {
                let _ = sender.send(ControllerMessage::SessionTimedOut { session }).await;
            }
        }));
    }

    fn on_completion(&mut self, completion: Completion) {
        if let Some(watchdog) = self.watchdog.take() {
            watchdog.abort();
        }
        let backend = self
            .last_session
            .filter(|session| session.id == completion.session)
            .map_or(Backend::Fallback, |session| session.backend);

        self.state = completion.phase.settled_state();
        tracing::debug!(
            session = %completion.session,
            state = %self.state,
            source = ?completion.source,
            "capsule: transition completed"
        );

        match completion.phase {
            Phase::Expand => {
                self.focus.set_focusable(true);
                if self.collapse_deferred {
                    self.collapse_deferred = false;
                    self.request_collapse(false);
                }
            }
            Phase::Collapse => {
                self.collapsed_width = self.resolved_collapsed_width();
                if backend == Backend::Fallback {
                    self.apply_collapsed_frame();
                }
                self.focus.set_focusable(false);
            }
        }

        if self.reattach_pending && !self.state.is_transient() {
            self.on_attach_native();
        }
    }

    fn resolved_collapsed_width(&self) -> f64 {
        self.collapsed_width_hint.map_or(self.geometry.collapsed.width, |hint| {
            self.geometry.clamp_collapsed_width(hint)
        })
    }

    fn apply_collapsed_frame(&mut self) {
        let target = self.geometry.collapsed_physical(self.collapsed_width);
        if let Err(err) = self.fallback.apply_immediately(target) {
            tracing::warn!(error = %err, "capsule: failed to apply collapsed frame");
        }
    }

    // ========================================================================
    // Published state
    // ========================================================================

    fn publish(&self) {
        let view = PanelView {
            state: self.state,
            collapsed_content_visible: self.state == ExpansionState::Collapsed,
            expanded_content_visible: self.state == ExpansionState::Expanded,
            collapsed_width: self.collapsed_width,
            focusable: self.focus.focusable(),
            backend: self.last_session.map(|session| session.backend),
            session: self.last_session.map(|session| session.id),
        };
        self.view.set_if_not_eq(view);
    }

    fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            state: self.state,
            guards: self.guards,
            geometry: self.geometry,
            collapsed_width: self.collapsed_width,
            hover_inside: self.hover_inside,
            expand_pending: self.intents.is_pending(IntentKind::Expand),
            collapse_pending: self.intents.is_pending(IntentKind::Collapse),
            collapse_deferred: self.collapse_deferred,
            active_session: self.bridge.active(),
            native_attached: self.native_attached(),
            focusable: self.focus.focusable(),
        }
    }
}

/// Forwards native completion events into the controller queue.
async fn forward_native_events(
    mut events: mpsc::UnboundedReceiver<NativeAnimationEnded>,
    sender: mpsc::WeakSender<ControllerMessage>,
) {
    while let Some(NativeAnimationEnded { phase }) = events.recv().await {
        let Some(sender) = sender.upgrade() else {
            break;
        };
        if sender.send(ControllerMessage::NativeAnimationEnded { phase }).await.is_err() {
            break;
        }
    }
    tracing::trace!("capsule: native event forwarding stopped");
}
