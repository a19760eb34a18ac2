//! Geometry primitives for the capsule window.
//!
//! Sizes in [`GeometrySpec`] are logical points; [`Rect`] frames handed to the
//! window layer are physical pixels. Conversions go through the scale factor
//! reported by the startup dimension query.

use serde::Serialize;
use tokio::time::Instant;

use crate::config::DimensionsConfig;
use crate::platform::StartupDimensions;

// ============================================================================
// Size / Rect
// ============================================================================

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self { Self { width, height } }

    /// Multiplies both dimensions by `factor`.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }

    /// Rounds both dimensions to whole pixels.
    #[must_use]
    pub fn rounded(self) -> Self { Self::new(self.width.round(), self.height.round()) }

    /// Largest absolute per-dimension difference to `other`.
    #[must_use]
    pub fn max_delta(self, other: Self) -> f64 {
        (self.width - other.width).abs().max((self.height - other.height).abs())
    }
}

/// A frame in physical screen pixels (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub const fn size(&self) -> Size { Size::new(self.width, self.height) }

    #[must_use]
    pub fn center_x(&self) -> f64 { self.width.mul_add(0.5, self.x) }

    /// Builds a frame of `size` horizontally centred on `center_x` whose top
    /// edge sits at `top`.
    #[must_use]
    pub fn centered_at_top(size: Size, center_x: f64, top: f64) -> Self {
        Self::new(size.width.mul_add(-0.5, center_x), top, size.width, size.height)
    }

    /// Whether the point lies inside the frame grown by `slop` on every side.
    #[must_use]
    pub fn contains_with_slop(&self, x: f64, y: f64, slop: f64) -> bool {
        let slop = slop.max(0.0);
        x >= self.x - slop
            && x <= self.x + self.width + slop
            && y >= self.y - slop
            && y <= self.y + self.height + slop
    }
}

// ============================================================================
// Geometry bounds
// ============================================================================

/// Collapsed/expanded bounds of the capsule, fixed for the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometrySpec {
    /// Collapsed size in logical points.
    pub collapsed: Size,
    /// Expanded size in logical points.
    pub expanded: Size,
    /// Corner radius in logical points.
    pub corner_radius: f64,
    /// Display scale factor (physical pixels per logical point).
    pub scale_factor: f64,
}

impl GeometrySpec {
    /// Builds the geometry from configuration alone (scale factor 1.0).
    #[must_use]
    pub const fn from_config(dimensions: &DimensionsConfig) -> Self {
        Self {
            collapsed: Size::new(dimensions.collapsed_width, dimensions.collapsed_height),
            expanded: Size::new(dimensions.expanded_width, dimensions.expanded_height),
            corner_radius: dimensions.corner_radius,
            scale_factor: 1.0,
        }
    }

    /// Applies the startup dimension query result.
    ///
    /// Queried collapsed dimensions and scale factor override the configured
    /// ones when they are usable; anything non-finite or non-positive is
    /// ignored.
    #[must_use]
    pub fn with_startup_dimensions(mut self, dims: &StartupDimensions) -> Self {
        if is_usable(dims.collapsed_width) && is_usable(dims.collapsed_height) {
            self.collapsed = Size::new(
                dims.collapsed_width.min(self.expanded.width),
                dims.collapsed_height.min(self.expanded.height),
            );
        }
        if is_usable(dims.scale_factor) {
            self.scale_factor = dims.scale_factor;
        }
        self
    }

    /// Clamps a dynamic collapsed width into the allowed range.
    #[must_use]
    pub fn clamp_collapsed_width(&self, width: f64) -> f64 {
        if !width.is_finite() {
            return self.collapsed.width;
        }
        width.clamp(self.collapsed.width, self.expanded.width)
    }

    /// Physical collapsed size for the given logical width.
    #[must_use]
    pub fn collapsed_physical(&self, logical_width: f64) -> Size {
        Size::new(logical_width, self.collapsed.height).scaled(self.scale_factor).rounded()
    }

    /// Physical expanded size.
    #[must_use]
    pub fn expanded_physical(&self) -> Size {
        self.expanded.scaled(self.scale_factor).rounded()
    }
}

fn is_usable(value: f64) -> bool { value.is_finite() && value > 0.0 }

// ============================================================================
// Signals
// ============================================================================

/// A raw hover transition reported by the hover watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverSignal {
    pub inside: bool,
    pub at: Instant,
}

impl HoverSignal {
    #[must_use]
    pub fn now(inside: bool) -> Self { Self { inside, at: Instant::now() } }
}

/// A pointer position in physical screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    pub at: Instant,
}

impl PointerSample {
    #[must_use]
    pub fn now(x: f64, y: f64) -> Self { Self { x, y, at: Instant::now() } }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> GeometrySpec {
        GeometrySpec {
            collapsed: Size::new(240.0, 40.0),
            expanded: Size::new(700.0, 200.0),
            corner_radius: 12.0,
            scale_factor: 2.0,
        }
    }

    #[test]
    fn test_centered_at_top_keeps_center() {
        let frame = Rect::centered_at_top(Size::new(200.0, 50.0), 500.0, 10.0);
        assert!((frame.x - 400.0).abs() < f64::EPSILON);
        assert!((frame.y - 10.0).abs() < f64::EPSILON);
        assert!((frame.center_x() - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_contains_with_slop() {
        let frame = Rect::new(100.0, 0.0, 200.0, 50.0);
        assert!(frame.contains_with_slop(150.0, 25.0, 0.0));
        assert!(!frame.contains_with_slop(303.0, 25.0, 0.0));
        assert!(frame.contains_with_slop(303.0, 25.0, 4.0));
        assert!(!frame.contains_with_slop(305.0, 25.0, 4.0));
        // Negative slop behaves like zero slop
        assert!(!frame.contains_with_slop(301.0, 25.0, -10.0));
    }

    #[test]
    fn test_max_delta() {
        let a = Size::new(240.0, 40.0);
        let b = Size::new(243.0, 30.0);
        assert!((a.max_delta(b) - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_physical_sizes_use_scale_factor() {
        let geometry = geometry();
        assert_eq!(geometry.expanded_physical(), Size::new(1400.0, 400.0));
        assert_eq!(geometry.collapsed_physical(300.0), Size::new(600.0, 80.0));
    }

    #[test]
    fn test_clamp_collapsed_width() {
        let geometry = geometry();
        assert!((geometry.clamp_collapsed_width(100.0) - 240.0).abs() < f64::EPSILON);
        assert!((geometry.clamp_collapsed_width(320.0) - 320.0).abs() < f64::EPSILON);
        assert!((geometry.clamp_collapsed_width(9000.0) - 700.0).abs() < f64::EPSILON);
        assert!((geometry.clamp_collapsed_width(f64::NAN) - 240.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_startup_dimensions_override() {
        let dims = StartupDimensions {
            collapsed_width: 300.0,
            collapsed_height: 36.0,
            scale_factor: 1.5,
        };
        let updated = geometry().with_startup_dimensions(&dims);
        assert_eq!(updated.collapsed, Size::new(300.0, 36.0));
        assert!((updated.scale_factor - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_startup_dimensions_ignores_garbage() {
        let dims = StartupDimensions {
            collapsed_width: f64::NAN,
            collapsed_height: -1.0,
            scale_factor: 0.0,
        };
        let updated = geometry().with_startup_dimensions(&dims);
        assert_eq!(updated, geometry());
    }
}
