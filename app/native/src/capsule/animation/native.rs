//! Adapter over the external native mask animator.

use std::sync::Arc;

use super::{AnimationPlan, GeometryAnimator};
use crate::capsule::state::{Backend, Phase, SessionId};
use crate::platform::{AttachRequest, NativeAnimator, PlatformError};

/// Drives the native mask layer.
///
/// The adapter tracks whether the layer is usable. A failed attach or a
/// failed animation start marks it detached until the next successful
/// [`attach`](Self::attach).
pub struct NativeMaskAnimator {
    inner: Arc<dyn NativeAnimator>,
    attached: bool,
}

impl NativeMaskAnimator {
    #[must_use]
    pub fn new(inner: Arc<dyn NativeAnimator>) -> Self { Self { inner, attached: false } }

    /// Attaches the native layer with the capsule geometry.
    ///
    /// # Errors
    ///
    /// Returns the native layer's error; the adapter stays detached.
    pub fn attach(&mut self, request: &AttachRequest) -> Result<(), PlatformError> {
        self.attached = false;
        self.inner.attach(request)?;
        self.attached = true;
        tracing::info!(
            collapsed = ?request.collapsed,
            expanded = ?request.expanded,
            "native mask animator attached"
        );
        Ok(())
    }

    /// Whether new sessions may use this backend.
    #[must_use]
    pub const fn is_attached(&self) -> bool { self.attached }

    /// Jumps the mask to `progress` (clamped to `[0, 1]`).
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is detached or rejects the call.
    pub fn set_progress(&self, progress: f64) -> Result<(), PlatformError> {
        if !self.attached {
            return Err(PlatformError::Unsupported("set_progress on a detached animator"));
        }
        self.inner.set_progress(progress.clamp(0.0, 1.0))
    }
}

impl GeometryAnimator for NativeMaskAnimator {
    fn backend(&self) -> Backend { Backend::Native }

    fn start(
        &mut self,
        session: SessionId,
        phase: Phase,
        plan: &AnimationPlan,
    ) -> Result<(), PlatformError> {
        if !self.attached {
            return Err(PlatformError::Unsupported("native animation while detached"));
        }

        let result = match phase {
            Phase::Expand => self.inner.expand(plan.duration),
            Phase::Collapse => self.inner.collapse(plan.duration),
        };

        if let Err(err) = result {
            self.attached = false;
            return Err(err);
        }

        tracing::debug!(%session, ?phase, duration_ms = plan.duration.as_millis(), "native transition started");
        Ok(())
    }
}
