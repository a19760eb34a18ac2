//! Capsule expansion control.
//!
//! A capsule is a small window pinned under the top edge of the screen that
//! grows into a larger panel while the pointer rests on it. This module holds
//! the pieces that decide when it grows or shrinks and drive the animation:
//!
//! - [`intent`] debounces raw hover edges into expand/collapse intents
//! - [`controller`] owns the expansion state machine and processes messages
//! - [`animation`] resizes the window (fallback) or drives the native mask
//! - [`completion`] matches animation completions to the session that started them
//! - [`focus`] makes the expanded panel focusable, best-effort
//! - [`hover`] optionally polls the cursor and reports hover edges
//!
//! # Architecture
//!
//! ```text
//! hover poller / host UI ──► CapsuleHandle ──► ExpansionController (actor)
//!                                                 │    ▲
//!                        IntentScheduler timers ──┘    │
//!          FallbackAnimator / NativeMaskAnimator ──────┘ completions
//!                                                 │
//!                       SharedObservable<PanelView> ──► UI
//! ```

pub mod animation;
pub mod completion;
pub mod controller;
pub mod focus;
pub mod geometry;
pub mod hover;
pub mod intent;
pub mod state;

pub use controller::{
    ActorError, CapsuleHandle, ControllerMessage, ControllerSnapshot, ExpansionController,
};
pub use geometry::{GeometrySpec, HoverSignal, PointerSample, Rect, Size};
pub use hover::{CursorSource, HoverPoller, HoverZones};
pub use state::{
    AnimationSession, Backend, ExpansionState, GuardFlags, PanelView, Phase, SessionId,
};
