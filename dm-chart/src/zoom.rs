//! Horizontal zoom and pan.
//!
//! The controller only ever holds a [`ViewTransform`]; it knows nothing about
//! the data. The transform is applied to the horizontal scale at draw time and
//! never to the vertical one.

use log::trace;

/// Smallest allowed zoom factor (the full data extent).
pub const MIN_SCALE: f64 = 1.0;
/// Largest allowed zoom factor.
pub const MAX_SCALE: f64 = 64.0;

/// Wheel sensitivity per pixel of `deltaY`, matching d3-zoom's default.
const WHEEL_SENSITIVITY: f64 = 0.002;

/// `x' = x * k + x_translate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Scale factor, always within `[MIN_SCALE, MAX_SCALE]`.
    pub k: f64,
    /// Horizontal translation in pixels.
    pub x: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ViewTransform {
    pub fn identity() -> Self {
        ViewTransform { k: 1.0, x: 0.0 }
    }

    pub fn is_identity(&self) -> bool {
        self.k == 1.0 && self.x == 0.0
    }

    pub fn apply_x(&self, x: f64) -> f64 {
        x * self.k + self.x
    }

    pub fn invert_x(&self, x: f64) -> f64 {
        (x - self.x) / self.k
    }
}

/// Zoom gestures delivered by the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomGesture {
    /// Wheel or trackpad zoom around the pointer.
    Wheel { delta_y: f64, anchor_x: f64 },
    /// Drag-pan by a pixel delta.
    Pan { dx: f64 },
    /// Back to the full extent.
    Reset,
}

/// Owns the view transform and keeps it inside the plotting extent.
#[derive(Debug, Clone)]
pub struct ZoomController {
    transform: ViewTransform,
    extent: (f64, f64),
}

impl ZoomController {
    /// `extent` is the horizontal plotting range; it doubles as the translate
    /// extent, so the view can never leave the data.
    pub fn new(extent: (f64, f64)) -> Self {
        ZoomController {
            transform: ViewTransform::identity(),
            extent,
        }
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    /// Update the extent after a resize, keeping the zoom factor.
    pub fn set_extent(&mut self, extent: (f64, f64)) {
        self.extent = extent;
        self.transform = self.constrain(self.transform);
    }

    /// Apply a gesture; returns whether the transform changed.
    pub fn apply(&mut self, gesture: ZoomGesture) -> bool {
        let before = self.transform;
        let next = match gesture {
            ZoomGesture::Wheel { delta_y, anchor_x } => {
                let factor = 2f64.powf(-delta_y * WHEEL_SENSITIVITY);
                self.scaled(before.k * factor, anchor_x)
            }
            ZoomGesture::Pan { dx } => ViewTransform {
                k: before.k,
                x: before.x + dx,
            },
            ZoomGesture::Reset => ViewTransform::identity(),
        };
        self.transform = self.constrain(next);
        trace!("zoom {:?} -> {:?}", gesture, self.transform);
        self.transform != before
    }

    /// Zoom to factor `k`, keeping the pixel under `anchor_x` fixed.
    #[cfg(test)]
    fn scale_to(&mut self, k: f64, anchor_x: f64) {
        self.transform = self.constrain(self.scaled(k, anchor_x));
    }

    fn scaled(&self, k: f64, anchor_x: f64) -> ViewTransform {
        if !k.is_finite() || !anchor_x.is_finite() {
            return self.transform;
        }
        let k = k.clamp(MIN_SCALE, MAX_SCALE);
        let focus = self.transform.invert_x(anchor_x);
        ViewTransform {
            k,
            x: anchor_x - focus * k,
        }
    }

    /// Clamp `k` and keep `[e0, e1]` covered by the transformed extent,
    /// i.e. `apply_x(e0) <= e0` and `apply_x(e1) >= e1`.
    fn constrain(&self, transform: ViewTransform) -> ViewTransform {
        let k = if transform.k.is_finite() {
            transform.k.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            MIN_SCALE
        };
        let (e0, e1) = self.extent;
        let max_x = e0 * (1.0 - k);
        let min_x = e1 * (1.0 - k);
        let x = if transform.x.is_finite() {
            transform.x.max(min_x).min(max_x)
        } else {
            max_x
        };
        ViewTransform { k, x }
    }

    /// Pixel range of the original extent currently visible, in untransformed
    /// coordinates. Always a sub-range of the extent.
    #[cfg(test)]
    fn visible_range(&self) -> (f64, f64) {
        let (e0, e1) = self.extent;
        (self.transform.invert_x(e0), self.transform.invert_x(e1))
    }
}
