//! Zoom transform and its extent constraints
//!
//! A transform maps an un-zoomed pixel `p` to `p * k + t`. The canvas keeps
//! exactly one of these and rebuilds its y scale from the baseline on every
//! change.

use crate::scale::LinearScale;

/// Screen-space point in pixels, origin at the top-left
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Scale factor plus translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: ZoomTransform = ZoomTransform { k: 1.0, x: 0.0, y: 0.0 };

    pub fn new(k: f64, x: f64, y: f64) -> Self {
        Self { k, x, y }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
    }

    pub fn invert(&self, p: Point) -> Point {
        Point::new(self.invert_x(p.x), self.invert_y(p.y))
    }

    pub fn invert_x(&self, x: f64) -> f64 {
        (x - self.x) / self.k
    }

    pub fn invert_y(&self, y: f64) -> f64 {
        (y - self.y) / self.k
    }

    /// Translate by `(dx, dy)` in un-zoomed units
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.k, self.x + self.k * dx, self.y + self.k * dy)
    }

    /// Translate by `(dx, dy)` screen pixels
    pub fn pan_by(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.k, self.x + dx, self.y + dy)
    }

    /// Change the scale factor to `k`, keeping the world point under `anchor` fixed
    pub fn scale_at(&self, k: f64, anchor: Point) -> Self {
        let world = self.invert(anchor);
        Self::new(k, anchor.x - world.x * k, anchor.y - world.y * k)
    }

    /// Y scale for this transform, always derived from the un-zoomed `base`
    pub fn rescale_y(&self, base: &LinearScale) -> LinearScale {
        base.rescaled(self.k, self.y)
    }
}

/// Limits a transform must respect after every update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomConstraints {
    /// Allowed `[k_min, k_max]`
    pub scale_extent: [f64; 2],
    /// World-pixel bounding box `[[x0, y0], [x1, y1]]` the viewport may show
    pub translate_extent: [[f64; 2]; 2],
    /// Viewport box `[[x0, y0], [x1, y1]]`
    pub viewport: [[f64; 2]; 2],
}

impl ZoomConstraints {
    pub fn clamp_k(&self, k: f64) -> f64 {
        k.max(self.scale_extent[0]).min(self.scale_extent[1])
    }

    /// Clamp the scale factor, then pull the translation back inside the
    /// translate extent. When the extent is smaller than the viewport on an
    /// axis, the extent is centered on that axis.
    pub fn constrain(&self, transform: ZoomTransform) -> ZoomTransform {
        let k = self.clamp_k(transform.k);
        let t = if k != transform.k {
            let center = Point::new(
                (self.viewport[0][0] + self.viewport[1][0]) / 2.0,
                (self.viewport[0][1] + self.viewport[1][1]) / 2.0,
            );
            transform.scale_at(k, center)
        } else {
            transform
        };

        let [[ex0, ey0], [ex1, ey1]] = self.translate_extent;
        let [[vx0, vy0], [vx1, vy1]] = self.viewport;
        let dx0 = t.invert_x(vx0) - ex0;
        let dx1 = t.invert_x(vx1) - ex1;
        let dy0 = t.invert_y(vy0) - ey0;
        let dy1 = t.invert_y(vy1) - ey1;

        t.translate(settle(dx0, dx1), settle(dy0, dy1))
    }
}

fn settle(d0: f64, d1: f64) -> f64 {
    if d1 > d0 {
        (d0 + d1) / 2.0
    } else if d0 < 0.0 {
        d0
    } else if d1 > 0.0 {
        d1
    } else {
        0.0
    }
}
