//! Geometry animators for the capsule.
//!
//! Two backends move the capsule between its collapsed and expanded geometry:
//! - [`NativeMaskAnimator`] forwards to the native mask layer, which reports
//!   completion later through an event carrying only the phase.
//! - [`FallbackAnimator`] resizes the window itself with an eased, frame-paced
//!   loop and reports completion tagged with its session.
//!
//! Both are driven through [`GeometryAnimator`]; the completion bridge hides
//! the difference in how they report back.

mod easing;
mod fallback;
mod native;
mod transition;

use std::time::Duration;

pub use easing::{ease_out_cubic, lerp, linear_progress};
pub use fallback::FallbackAnimator;
pub use native::NativeMaskAnimator;
pub use transition::SizeTransition;

use super::geometry::Size;
use super::state::{Backend, Phase, SessionId};
use crate::platform::PlatformError;

/// Below this many pixels of travel the target size is applied directly.
pub const MIN_ANIMATION_DISTANCE: f64 = 5.0;

/// Default frame rate when the display refresh rate is unknown.
pub const DEFAULT_REFRESH_RATE: f64 = 60.0;

/// What a session animates towards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationPlan {
    /// Target window size in physical pixels.
    pub target: Size,
    pub duration: Duration,
}

/// Completion reported by the fallback animator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationSettled {
    pub session: SessionId,
    pub phase: Phase,
    /// The session was superseded before reaching its target.
    pub cancelled: bool,
}

/// A backend able to run expand/collapse transitions.
pub trait GeometryAnimator {
    /// Which backend this is.
    fn backend(&self) -> Backend;

    /// Starts a transition for `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend could not start the transition.
    fn start(&mut self, session: SessionId, phase: Phase, plan: &AnimationPlan)
    -> Result<(), PlatformError>;

    /// Starts an expand transition.
    ///
    /// # Errors
    ///
    /// See [`Self::start`].
    fn expand(&mut self, session: SessionId, plan: &AnimationPlan) -> Result<(), PlatformError> {
        self.start(session, Phase::Expand, plan)
    }

    /// Starts a collapse transition.
    ///
    /// # Errors
    ///
    /// See [`Self::start`].
    fn collapse(&mut self, session: SessionId, plan: &AnimationPlan) -> Result<(), PlatformError> {
        self.start(session, Phase::Collapse, plan)
    }
}
