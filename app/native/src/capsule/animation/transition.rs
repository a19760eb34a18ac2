//! Size transitions driven by the fallback animator.

use super::easing::{ease_out_cubic, lerp};
use crate::capsule::geometry::{Rect, Size};

/// A resize of the capsule window from one physical size to another.
///
/// Position is not interpolated: every step is re-centred horizontally on
/// `center_x` and anchored at `top`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeTransition {
    pub from: Size,
    pub to: Size,
    pub center_x: f64,
    pub top: f64,
}

impl SizeTransition {
    /// Builds a transition starting at `start` towards `target`.
    ///
    /// The anchor is the work area's horizontal centre when known, otherwise
    /// the starting frame's centre.
    #[must_use]
    pub fn new(start: Rect, target: Size, work_area: Option<Rect>) -> Self {
        let center_x = work_area.map_or_else(|| start.center_x(), |area| area.center_x());
        Self {
            from: start.size(),
            to: target,
            center_x,
            top: start.y,
        }
    }

    /// Largest distance either dimension needs to travel.
    #[must_use]
    pub fn max_distance(&self) -> f64 { self.from.max_delta(self.to) }

    /// The size at linear progress `t`, eased and rounded to whole pixels.
    #[must_use]
    pub fn size_at(&self, t: f64) -> Size {
        let eased = ease_out_cubic(t);
        Size::new(
            lerp(self.from.width, self.to.width, eased),
            lerp(self.from.height, self.to.height, eased),
        )
        .rounded()
    }

    /// The frame at linear progress `t`.
    #[must_use]
    pub fn frame_at(&self, t: f64) -> Rect { self.frame_for(self.size_at(t)) }

    /// The final frame.
    #[must_use]
    pub fn target_frame(&self) -> Rect { self.frame_for(self.to.rounded()) }

    fn frame_for(&self, size: Size) -> Rect {
        let frame = Rect::centered_at_top(size, self.center_x, self.top);
        Rect::new(frame.x.round(), frame.y, frame.width, frame.height)
    }
}
