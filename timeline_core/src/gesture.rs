//! Gesture normalizer - turns wheel, mouse and touch input into pan/zoom deltas
//!
//! Every recognized event becomes a `GestureDelta`: an optional zoom step
//! anchored at a screen point, a translation of the zoom transform (only its
//! y component matters to the chart), and a horizontal pan of the free x
//! axis. Events that match no modality produce nothing.

use serde::{Deserialize, Serialize};

use crate::zoom::{Point, ZoomConstraints, ZoomTransform};

/// Unit of a wheel delta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDeltaMode {
    Pixel,
    Line,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Secondary,
    Middle,
}

/// Where a touch frame sits in the touch sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
}

/// One finger on the surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: u64,
    pub position: Point,
}

/// Raw pointer input in screen pixels (origin top-left, y down)
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// `delta_y > 0` scrolls down / zooms out, like browser wheel events
    Wheel {
        position: Point,
        delta_x: f64,
        delta_y: f64,
        mode: WheelDeltaMode,
        /// Set by trackpads for pinch gestures
        ctrl: bool,
    },
    MouseDown {
        position: Point,
        button: MouseButton,
    },
    MouseMove {
        position: Point,
    },
    MouseUp {
        position: Point,
        button: MouseButton,
    },
    /// All touches active after the change
    Touch {
        phase: TouchPhase,
        touches: Vec<TouchPoint>,
    },
}

/// Wheel sensitivity coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Per pixel of wheel distance while ctrl is held (trackpad pinch)
    pub pinch_zoom_speed: f64,
    /// Per pixel of wheel distance for a plain mouse wheel
    pub wheel_zoom_speed: f64,
    /// Per line when the wheel reports lines
    pub line_zoom_speed: f64,
    /// Per page when the wheel reports pages
    pub page_zoom_speed: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pinch_zoom_speed: 0.016,
            wheel_zoom_speed: 0.002,
            line_zoom_speed: 0.05,
            page_zoom_speed: 1.0,
        }
    }
}

/// Multiplicative zoom around a fixed screen point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomStep {
    pub factor: f64,
    pub anchor: Point,
}

/// Canonical pan/zoom update
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureDelta {
    pub zoom: Option<ZoomStep>,
    /// Screen pixels to move the zoom transform by
    pub translate: [f64; 2],
    /// Screen pixels to move content along the free x axis
    pub pan_x: f64,
}

impl GestureDelta {
    pub fn is_noop(&self) -> bool {
        self.zoom.map_or(true, |z| z.factor == 1.0)
            && self.translate == [0.0, 0.0]
            && self.pan_x == 0.0
    }

    /// Apply to `transform`, clamping scale and translation to `constraints`
    pub fn apply_to(&self, transform: ZoomTransform, constraints: &ZoomConstraints) -> ZoomTransform {
        let mut t = transform;
        if let Some(step) = self.zoom {
            let k = constraints.clamp_k(t.k * step.factor);
            t = t.scale_at(k, step.anchor);
        }
        t = t.pan_by(self.translate[0], self.translate[1]);
        constraints.constrain(t)
    }

    /// Fold a later delta into this one
    ///
    /// Each delta maps a screen point `p` to `f * p + a * (1 - f) + t`. The
    /// composition keeps the later anchor (or the earlier one when only it
    /// zooms) and moves the remaining offset into the translation, so the
    /// merged delta equals applying both in order as long as no scale or
    /// translate clamping kicks in between them. Horizontal pans add.
    pub fn merge(&mut self, later: &GestureDelta) {
        let (f1, a1) = zoom_parts(self.zoom);
        let (f2, a2) = zoom_parts(later.zoom);
        let factor = f1 * f2;
        let anchor = later.zoom.or(self.zoom).map_or(Point::default(), |z| z.anchor);

        let compose = |a1: f64, a2: f64, a: f64, t1: f64, t2: f64| {
            f2 * a1 * (1.0 - f1) + a2 * (1.0 - f2) + f2 * t1 + t2 - a * (1.0 - factor)
        };
        self.translate = [
            compose(a1.x, a2.x, anchor.x, self.translate[0], later.translate[0]),
            compose(a1.y, a2.y, anchor.y, self.translate[1], later.translate[1]),
        ];
        self.zoom = (self.zoom.is_some() || later.zoom.is_some()).then_some(ZoomStep { factor, anchor });
        self.pan_x += later.pan_x;
    }
}

/// `(factor, anchor)` of an optional zoom step, identity when absent
fn zoom_parts(zoom: Option<ZoomStep>) -> (f64, Point) {
    zoom.map_or((1.0, Point::default()), |z| (z.factor, z.anchor))
}

/// Snapshot of the touches reported by one touch event
#[derive(Debug, Clone, PartialEq)]
struct TouchFrame {
    phase: TouchPhase,
    touches: Vec<TouchPoint>,
}

/// Ring buffer holding the last two touch frames
#[derive(Debug, Clone, Default)]
struct TouchWindow {
    frames: [Option<TouchFrame>; 2],
    next: usize,
}

impl TouchWindow {
    fn push(&mut self, frame: TouchFrame) {
        self.frames[self.next] = Some(frame);
        self.next = (self.next + 1) % 2;
    }

    /// `(previous, current)` once two frames have been seen
    fn pair(&self) -> Option<(&TouchFrame, &TouchFrame)> {
        let current = self.frames[(self.next + 1) % 2].as_ref()?;
        let previous = self.frames[self.next].as_ref()?;
        Some((previous, current))
    }
}

/// Stateful converter from `InputEvent` to `GestureDelta`
#[derive(Debug, Clone, Default)]
pub struct GestureNormalizer {
    config: GestureConfig,
    pointer_down: bool,
    last_mouse: Option<Point>,
    touches: TouchWindow,
}

impl GestureNormalizer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// True between a primary mouse-down and the matching mouse-up
    pub fn pointer_down(&self) -> bool {
        self.pointer_down
    }

    pub fn normalize(&mut self, event: &InputEvent) -> Option<GestureDelta> {
        let delta = match event {
            InputEvent::Wheel {
                position,
                delta_x,
                delta_y,
                mode,
                ctrl,
            } => self.wheel(*position, *delta_x, *delta_y, *mode, *ctrl),
            InputEvent::MouseDown { position, button } => {
                if *button == MouseButton::Primary {
                    self.pointer_down = true;
                }
                self.last_mouse = Some(*position);
                None
            }
            InputEvent::MouseMove { position } => self.mouse_move(*position),
            InputEvent::MouseUp { position, button } => {
                if *button == MouseButton::Primary {
                    self.pointer_down = false;
                }
                self.last_mouse = Some(*position);
                None
            }
            InputEvent::Touch { phase, touches } => self.touch(*phase, touches),
        };
        delta.filter(|d| !d.is_noop())
    }

    fn wheel_speed(&self, mode: WheelDeltaMode, ctrl: bool) -> f64 {
        match mode {
            WheelDeltaMode::Line => self.config.line_zoom_speed,
            WheelDeltaMode::Page => self.config.page_zoom_speed,
            WheelDeltaMode::Pixel if ctrl => self.config.pinch_zoom_speed,
            WheelDeltaMode::Pixel => self.config.wheel_zoom_speed,
        }
    }

    fn wheel(
        &self,
        position: Point,
        delta_x: f64,
        delta_y: f64,
        mode: WheelDeltaMode,
        ctrl: bool,
    ) -> Option<GestureDelta> {
        if !delta_x.is_finite() || !delta_y.is_finite() {
            return None;
        }
        let exponent = -delta_y * self.wheel_speed(mode, ctrl);
        let zoom = (exponent != 0.0).then(|| ZoomStep {
            factor: 2f64.powf(exponent),
            anchor: position,
        });
        Some(GestureDelta {
            zoom,
            translate: [0.0, 0.0],
            pan_x: -delta_x,
        })
    }

    fn mouse_move(&mut self, position: Point) -> Option<GestureDelta> {
        let previous = self.last_mouse.replace(position);
        if !self.pointer_down {
            return None;
        }
        let previous = previous?;
        let dx = position.x - previous.x;
        let dy = position.y - previous.y;
        Some(GestureDelta {
            zoom: None,
            translate: [dx, dy],
            pan_x: dx,
        })
    }

    fn touch(&mut self, phase: TouchPhase, touches: &[TouchPoint]) -> Option<GestureDelta> {
        self.touches.push(TouchFrame {
            phase,
            touches: touches.to_vec(),
        });
        let (previous, current) = self.touches.pair()?;
        if current.phase == TouchPhase::Start {
            return None;
        }

        match (previous.touches.as_slice(), current.touches.as_slice()) {
            ([before], [after]) if before.id == after.id => {
                let dx = after.position.x - before.position.x;
                let dy = after.position.y - before.position.y;
                Some(GestureDelta {
                    zoom: None,
                    translate: [dx, dy],
                    pan_x: dx,
                })
            }
            ([a0, a1], [b0, b1]) => {
                let before = a0.position.distance(&a1.position);
                let after = b0.position.distance(&b1.position);
                if before <= 0.0 {
                    return None;
                }
                let mid_before = a0.position.midpoint(&a1.position);
                let mid_after = b0.position.midpoint(&b1.position);
                Some(GestureDelta {
                    zoom: Some(ZoomStep {
                        factor: after / before,
                        anchor: mid_before,
                    }),
                    translate: [mid_after.x - mid_before.x, mid_after.y - mid_before.y],
                    pan_x: 0.0,
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(id: u64, x: f64, y: f64) -> TouchPoint {
        TouchPoint {
            id,
            position: Point::new(x, y),
        }
    }

    fn wheel(delta_y: f64, mode: WheelDeltaMode, ctrl: bool) -> InputEvent {
        InputEvent::Wheel {
            position: Point::new(100.0, 200.0),
            delta_x: 0.0,
            delta_y,
            mode,
            ctrl,
        }
    }

    #[test]
    fn test_wheel_coefficients() {
        let mut n = GestureNormalizer::default();
        let mouse = n.normalize(&wheel(-100.0, WheelDeltaMode::Pixel, false)).unwrap();
        let pinch = n.normalize(&wheel(-100.0, WheelDeltaMode::Pixel, true)).unwrap();
        let line = n.normalize(&wheel(-3.0, WheelDeltaMode::Line, false)).unwrap();
        let page = n.normalize(&wheel(1.0, WheelDeltaMode::Page, false)).unwrap();

        assert!((mouse.zoom.unwrap().factor - 2f64.powf(0.2)).abs() < 1e-12);
        assert!((pinch.zoom.unwrap().factor - 2f64.powf(1.6)).abs() < 1e-12);
        assert!((line.zoom.unwrap().factor - 2f64.powf(0.15)).abs() < 1e-12);
        assert!((page.zoom.unwrap().factor - 0.5).abs() < 1e-12);
        assert_eq!(mouse.zoom.unwrap().anchor, Point::new(100.0, 200.0));
    }

    #[test]
    fn test_horizontal_wheel_pans_x() {
        let mut n = GestureNormalizer::default();
        let event = InputEvent::Wheel {
            position: Point::default(),
            delta_x: 30.0,
            delta_y: 0.0,
            mode: WheelDeltaMode::Pixel,
            ctrl: false,
        };
        let delta = n.normalize(&event).unwrap();
        assert!(delta.zoom.is_none());
        assert_eq!(delta.pan_x, -30.0);
    }

    #[test]
    fn test_mouse_drag_pans_and_toggles_pointer() {
        let mut n = GestureNormalizer::default();
        assert!(n
            .normalize(&InputEvent::MouseMove { position: Point::new(10.0, 10.0) })
            .is_none());
        n.normalize(&InputEvent::MouseDown {
            position: Point::new(10.0, 10.0),
            button: MouseButton::Primary,
        });
        assert!(n.pointer_down());

        let delta = n
            .normalize(&InputEvent::MouseMove { position: Point::new(25.0, 4.0) })
            .unwrap();
        assert_eq!(delta.pan_x, 15.0);
        assert_eq!(delta.translate, [15.0, -6.0]);
        assert!(delta.zoom.is_none());

        n.normalize(&InputEvent::MouseUp {
            position: Point::new(25.0, 4.0),
            button: MouseButton::Primary,
        });
        assert!(!n.pointer_down());
    }

    #[test]
    fn test_secondary_button_does_not_drag() {
        let mut n = GestureNormalizer::default();
        n.normalize(&InputEvent::MouseDown {
            position: Point::new(0.0, 0.0),
            button: MouseButton::Secondary,
        });
        assert!(!n.pointer_down());
        assert!(n
            .normalize(&InputEvent::MouseMove { position: Point::new(50.0, 0.0) })
            .is_none());
    }

    #[test]
    fn test_single_touch_drag() {
        let mut n = GestureNormalizer::default();
        let start = InputEvent::Touch {
            phase: TouchPhase::Start,
            touches: vec![touch(1, 100.0, 100.0)],
        };
        assert!(n.normalize(&start).is_none());
        let moved = InputEvent::Touch {
            phase: TouchPhase::Move,
            touches: vec![touch(1, 92.0, 130.0)],
        };
        let delta = n.normalize(&moved).unwrap();
        assert_eq!(delta.pan_x, -8.0);
        assert_eq!(delta.translate, [-8.0, 30.0]);
    }

    #[test]
    fn test_two_to_one_touch_is_ignored() {
        let mut n = GestureNormalizer::default();
        n.normalize(&InputEvent::Touch {
            phase: TouchPhase::Move,
            touches: vec![touch(1, 100.0, 100.0), touch(2, 200.0, 100.0)],
        });
        let lifted = InputEvent::Touch {
            phase: TouchPhase::End,
            touches: vec![touch(1, 140.0, 100.0)],
        };
        assert!(n.normalize(&lifted).is_none());
    }

    #[test]
    fn test_touch_start_frame_is_ignored() {
        let mut n = GestureNormalizer::default();
        n.normalize(&InputEvent::Touch {
            phase: TouchPhase::Move,
            touches: vec![touch(1, 100.0, 100.0)],
        });
        let restart = InputEvent::Touch {
            phase: TouchPhase::Start,
            touches: vec![touch(1, 300.0, 100.0)],
        };
        assert!(n.normalize(&restart).is_none());
    }

    #[test]
    fn test_pinch_zooms_about_midpoint() {
        let mut n = GestureNormalizer::default();
        n.normalize(&InputEvent::Touch {
            phase: TouchPhase::Start,
            touches: vec![touch(1, 100.0, 100.0), touch(2, 100.0, 200.0)],
        });
        let spread = InputEvent::Touch {
            phase: TouchPhase::Move,
            touches: vec![touch(1, 100.0, 50.0), touch(2, 100.0, 250.0)],
        };
        let delta = n.normalize(&spread).unwrap();
        let zoom = delta.zoom.unwrap();
        assert!((zoom.factor - 2.0).abs() < 1e-12);
        assert_eq!(zoom.anchor, Point::new(100.0, 150.0));
        assert_eq!(delta.pan_x, 0.0);
    }

    #[test]
    fn test_apply_clamps_to_extents() {
        let constraints = ZoomConstraints {
            scale_extent: [0.4, 60.0],
            translate_extent: [[0.0, -2000.0], [0.0, 2000.0]],
            viewport: [[0.0, 0.0], [800.0, 600.0]],
        };
        let huge = GestureDelta {
            zoom: Some(ZoomStep {
                factor: 1000.0,
                anchor: Point::new(400.0, 300.0),
            }),
            ..GestureDelta::default()
        };
        let t = huge.apply_to(ZoomTransform::IDENTITY, &constraints);
        assert_eq!(t.k, 60.0);
    }

    #[test]
    fn test_merge() {
        let mut a = GestureDelta {
            zoom: Some(ZoomStep { factor: 2.0, anchor: Point::new(1.0, 1.0) }),
            translate: [1.0, 2.0],
            pan_x: 3.0,
        };
        let b = GestureDelta {
            zoom: Some(ZoomStep { factor: 1.5, anchor: Point::new(5.0, 5.0) }),
            translate: [1.0, 1.0],
            pan_x: -1.0,
        };
        a.merge(&b);
        let zoom = a.zoom.unwrap();
        assert!((zoom.factor - 3.0).abs() < 1e-12);
        assert_eq!(zoom.anchor, Point::new(5.0, 5.0));
        // offset left over after zooming 3x about (5, 5)
        assert!((a.translate[0] - 8.5).abs() < 1e-12);
        assert!((a.translate[1] - 10.0).abs() < 1e-12);
        assert_eq!(a.pan_x, 2.0);
    }

    #[test]
    fn test_merged_zooms_with_different_anchors_match_sequential() {
        let constraints = ZoomConstraints {
            scale_extent: [0.01, 100.0],
            translate_extent: [[-1e6, -1e6], [1e6, 1e6]],
            viewport: [[0.0, 0.0], [800.0, 600.0]],
        };
        let start = ZoomTransform::new(1.3, -40.0, 120.0);
        let steps = [
            GestureDelta {
                zoom: Some(ZoomStep { factor: 1.25, anchor: Point::new(100.0, 50.0) }),
                translate: [0.0, 7.0],
                pan_x: 0.0,
            },
            GestureDelta {
                zoom: None,
                translate: [3.0, -12.0],
                pan_x: 3.0,
            },
            GestureDelta {
                zoom: Some(ZoomStep { factor: 0.8, anchor: Point::new(640.0, 480.0) }),
                translate: [0.0, 0.0],
                pan_x: 0.0,
            },
        ];

        let sequential = steps
            .iter()
            .fold(start, |t, step| step.apply_to(t, &constraints));
        let mut merged = steps[0];
        merged.merge(&steps[1]);
        merged.merge(&steps[2]);
        let folded = merged.apply_to(start, &constraints);

        assert!((folded.k - sequential.k).abs() < 1e-9);
        assert!((folded.x - sequential.x).abs() < 1e-9);
        assert!((folded.y - sequential.y).abs() < 1e-9);
        assert_eq!(merged.zoom.unwrap().anchor, Point::new(640.0, 480.0));
    }
}
