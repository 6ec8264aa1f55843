//! Master canvas - owns the zoom transform, the lanes and the frame loop
//!
//! World space is `(x pixels, float years)`: x is a free pan-only axis, y is
//! time increasing downward. Input is normalized as it arrives and buffered;
//! `on_animation_frame` applies the buffered deltas and runs one layout pass:
//!
//! 1. rebuild the y scale from the baseline and the current transform,
//! 2. rescale and lay out every lane,
//! 3. move any overlay anchored in world space.
//!
//! Lane scales are only valid after step 1 of the current frame.

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use log::{debug, info, trace};

use crate::config::CanvasConfig;
use crate::date::LabelStyle;
use crate::error::{RecordError, TimelineError};
use crate::events::{CanvasEmitters, HoverEvent, ItemRef, OverlayCommand, PlaybackIntent};
use crate::frame::{Debouncer, FrameBatcher};
use crate::gesture::{GestureDelta, GestureNormalizer, InputEvent, MouseButton};
use crate::item::{RawRecord, TextMetrics};
use crate::lane::{resolve_config, AxisTick, Lane, LaneOptions};
use crate::scale::{LinearScale, Scale};
use crate::zoom::{Point, ZoomConstraints, ZoomTransform};

/// Where the canvas is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed and accepting input, no frame rendered yet
    Attached,
    Running,
    Detached,
}

/// Summary of one committed layout pass
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    /// Gesture deltas applied in this pass
    pub inputs: usize,
    pub transform: ZoomTransform,
    pub visible_items: usize,
    pub style: LabelStyle,
}

/// Popup anchored to a world position
#[derive(Debug, Clone, PartialEq)]
struct Overlay {
    item: ItemRef,
    world: Point,
}

/// The top-level chart
pub struct MasterCanvas {
    config: CanvasConfig,
    width: f64,
    height: f64,
    /// Year to pixel mapping before any zoom
    baseline: LinearScale,
    y_scale: LinearScale,
    /// Pan-only horizontal axis
    x_scale: LinearScale,
    transform: ZoomTransform,
    lanes: IndexMap<String, Lane>,
    metrics: Box<dyn TextMetrics>,
    normalizer: GestureNormalizer,
    batch: FrameBatcher<GestureDelta>,
    hovered: Option<ItemRef>,
    hover_hide: Debouncer<Option<ItemRef>>,
    overlay: Option<Overlay>,
    press_origin: Option<Point>,
    emitters: Option<CanvasEmitters>,
    lifecycle: Lifecycle,
    frames: u64,
}

impl std::fmt::Debug for MasterCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterCanvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("transform", &self.transform)
            .field("lanes", &self.lanes.keys().collect::<Vec<_>>())
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}

impl MasterCanvas {
    /// Attach a canvas of `width` x `height` pixels
    pub fn new(
        config: CanvasConfig,
        width: f64,
        height: f64,
        metrics: Box<dyn TextMetrics>,
        emitters: CanvasEmitters,
    ) -> Self {
        let baseline = LinearScale::new(config.base_domain, [0.0, height]);
        let normalizer = GestureNormalizer::new(config.gesture);
        let batch = FrameBatcher::new(config.queue_capacity);
        let hover_hide = Debouncer::new(Duration::from_millis(config.hover_debounce_ms));
        info!(
            "canvas attached: {}x{} showing years {:?}",
            width, height, config.base_domain
        );

        let mut canvas = Self {
            config,
            width,
            height,
            baseline,
            y_scale: baseline,
            x_scale: LinearScale::identity(width),
            transform: ZoomTransform::IDENTITY,
            lanes: IndexMap::new(),
            metrics,
            normalizer,
            batch,
            hovered: None,
            hover_hide,
            overlay: None,
            press_origin: None,
            emitters: Some(emitters),
            lifecycle: Lifecycle::Attached,
            frames: 0,
        };
        canvas.batch.request_frame();
        canvas
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn transform(&self) -> ZoomTransform {
        self.transform
    }

    pub fn baseline(&self) -> &LinearScale {
        &self.baseline
    }

    pub fn y_scale(&self) -> &LinearScale {
        &self.y_scale
    }

    pub fn x_scale(&self) -> &LinearScale {
        &self.x_scale
    }

    pub fn pointer_down(&self) -> bool {
        self.normalizer.pointer_down()
    }

    pub fn lanes(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.values()
    }

    pub fn lane(&self, name: &str) -> Option<&Lane> {
        self.lanes.get(name)
    }

    /// Total number of items over all lanes
    pub fn item_count(&self) -> usize {
        self.lanes.values().map(|lane| lane.items().len()).sum()
    }

    /// Float years at the top and bottom edges of the viewport
    pub fn visible_world_range(&self) -> [f64; 2] {
        [self.y_scale.invert(0.0), self.y_scale.invert(self.height)]
    }

    pub fn pixels_per_year(&self) -> f64 {
        self.y_scale.density()
    }

    pub fn label_style(&self) -> LabelStyle {
        LabelStyle::for_pixels_per_year(self.pixels_per_year())
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(self.x_scale.forward(world.x), self.y_scale.forward(world.y))
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new(self.x_scale.invert(screen.x), self.y_scale.invert(screen.y))
    }

    /// Screen x of a lane's left edge, including horizontal pan
    pub fn lane_screen_x(&self, lane: &Lane) -> f64 {
        self.x_scale.forward(0.0) + lane.config().left
    }

    fn constraints(&self) -> ZoomConstraints {
        let [y0, y1] = self.config.translate_extent_years;
        ZoomConstraints {
            scale_extent: self.config.scale_extent,
            translate_extent: [
                [0.0, self.baseline.forward(y0)],
                [self.width, self.baseline.forward(y1)],
            ],
            viewport: [[0.0, 0.0], [self.width, self.height]],
        }
    }

    fn ensure_attached(&self) -> Result<(), TimelineError> {
        if self.lifecycle == Lifecycle::Detached {
            return Err(TimelineError::Detached);
        }
        Ok(())
    }

    /// Register a lane at the next horizontal slot and load its records
    ///
    /// Returns the records that were rejected for bad dates.
    pub fn add_lane(
        &mut self,
        name: &str,
        records: &[RawRecord],
        options: LaneOptions,
    ) -> Result<Vec<RecordError>, TimelineError> {
        self.ensure_attached()?;
        if self.lanes.contains_key(name) {
            return Err(TimelineError::DuplicateLane(name.to_string()));
        }

        let left = self.config.lane_origin + self.config.lane_spacing * self.lanes.len() as f64;
        let lane_config = resolve_config(name, &options, left, self.config.events_left);
        let mut lane = Lane::new(name, lane_config, self.config.overlap_threshold)?;
        let rejected = lane.set_data(records, self.metrics.as_ref()).to_vec();
        lane.rescale(&self.y_scale);
        lane.update();

        debug!("lane `{}` added at x={} with {} items", name, left, lane.items().len());
        self.lanes.insert(name.to_string(), lane);
        self.batch.request_frame();
        Ok(rejected)
    }

    /// Replace every item of a lane with a fresh load
    pub fn replace_data(
        &mut self,
        name: &str,
        records: &[RawRecord],
    ) -> Result<Vec<RecordError>, TimelineError> {
        self.ensure_attached()?;
        let lane = self
            .lanes
            .get_mut(name)
            .ok_or_else(|| TimelineError::UnknownLane(name.to_string()))?;
        let rejected = lane.set_data(records, self.metrics.as_ref()).to_vec();

        // indices into the old item list are stale now
        if self.hovered.as_ref().is_some_and(|item| item.lane == name) {
            self.hovered = None;
        }
        if self.overlay.as_ref().is_some_and(|o| o.item.lane == name) {
            self.overlay = None;
            self.emit_overlay(OverlayCommand::Hide);
        }
        self.batch.request_frame();
        Ok(rejected)
    }

    /// Feed one raw input event
    ///
    /// Pan/zoom deltas are buffered until the next animation frame. Hover and
    /// click detection use the layout of the last committed frame.
    pub fn handle_input(&mut self, event: &InputEvent, now: Instant) -> Result<(), TimelineError> {
        self.ensure_attached()?;

        if let Some(delta) = self.normalizer.normalize(event) {
            self.batch.push(delta);
        }

        match event {
            InputEvent::MouseDown {
                position,
                button: MouseButton::Primary,
            } => {
                self.press_origin = Some(*position);
            }
            InputEvent::MouseUp {
                position,
                button: MouseButton::Primary,
            } => {
                let origin = self.press_origin.take();
                let is_click = origin.is_some_and(|o| o.distance(position) <= self.config.click_slop);
                if is_click {
                    if let Some(item) = self.hit_test(*position) {
                        self.click(&item.lane, &item.title)?;
                    }
                }
            }
            InputEvent::MouseMove { position } if !self.normalizer.pointer_down() => {
                let target = self.hit_test(*position);
                self.pointer_over(target, now);
            }
            _ => {}
        }
        Ok(())
    }

    /// Item label under a screen point, visible items only
    pub fn hit_test(&self, screen: Point) -> Option<ItemRef> {
        self.lanes.values().find_map(|lane| {
            let local = Point::new(
                screen.x - self.lane_screen_x(lane) - lane.config().events_left,
                screen.y - lane.range_start(),
            );
            lane.hit_test(local).map(|index| ItemRef {
                lane: lane.name().to_string(),
                title: lane.items()[index].title.clone(),
                index,
            })
        })
    }

    /// Pointer entered `target` (`Some`) or left all items (`None`)
    ///
    /// Showing is immediate; hiding waits for the debounce quiet window, and
    /// any newer hover change restarts that window.
    pub fn pointer_over(&mut self, target: Option<ItemRef>, now: Instant) {
        if target == self.hovered {
            return;
        }
        self.hovered = target.clone();
        self.hover_hide.schedule(target.clone(), now);

        let Some(item) = target else {
            return;
        };
        if self.normalizer.pointer_down() {
            return;
        }
        if let Err(err) = self.show_overlay(&item.lane, &item.title) {
            debug!("hover ignored: {}", err);
        }
    }

    /// Point the popup at an item and anchor it in world space
    ///
    /// Fails when the lane or item does not exist.
    pub fn show_overlay(&mut self, lane_name: &str, title: &str) -> Result<(), TimelineError> {
        self.ensure_attached()?;
        let mismatch = || TimelineError::OverlayTargetMismatch {
            lane: lane_name.to_string(),
            title: title.to_string(),
        };
        let lane = self.lanes.get(lane_name).ok_or_else(mismatch)?;
        let index = lane.find_item(title).ok_or_else(mismatch)?;
        let item = &lane.items()[index];

        let label_x = lane.config().left + lane.config().events_left + item.width;
        let x = self.x_scale.forward(label_x) + self.config.popup_margin;
        let y = item.screen_y + lane.range_start();
        let world = self.screen_to_world(Point::new(x, y));
        let item_ref = ItemRef {
            lane: lane_name.to_string(),
            title: title.to_string(),
            index,
        };

        self.emit_hover(HoverEvent {
            world_x: world.x,
            world_y: world.y,
            item: item_ref.clone(),
        });
        self.emit_overlay(OverlayCommand::Show {
            item: item_ref.clone(),
            x,
            y,
        });
        self.overlay = Some(Overlay { item: item_ref, world });
        Ok(())
    }

    /// Emit a click for an item, plus a playback toggle when it has media
    pub fn click(&mut self, lane_name: &str, title: &str) -> Result<(), TimelineError> {
        self.ensure_attached()?;
        let lane = self
            .lanes
            .get(lane_name)
            .ok_or_else(|| TimelineError::UnknownLane(lane_name.to_string()))?;
        let index = lane
            .find_item(title)
            .ok_or_else(|| TimelineError::OverlayTargetMismatch {
                lane: lane_name.to_string(),
                title: title.to_string(),
            })?;
        let item = &lane.items()[index];
        let item_ref = ItemRef {
            lane: lane_name.to_string(),
            title: title.to_string(),
            index,
        };
        info!("click: {}", title);

        if let Some(emitters) = &self.emitters {
            if let Some(media) = &item.media {
                emitters.playback.emit(PlaybackIntent::Toggle {
                    item: item_ref.clone(),
                    media: media.clone(),
                });
            }
            emitters.click.emit(item_ref);
        }
        Ok(())
    }

    /// The host viewport changed size
    ///
    /// The baseline keeps the world values at pixel 0 and at the new bottom
    /// edge; the transform is then clamped to the new viewport and the zoomed
    /// scale rebuilt from it. Empty or non-finite sizes (a minimized window)
    /// are ignored so the baseline never collapses.
    pub fn resize(&mut self, width: f64, height: f64) {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            debug!("ignoring resize to {}x{}", width, height);
            return;
        }

        let domain = [self.baseline.invert(0.0), self.baseline.invert(height)];
        self.baseline = LinearScale::new(domain, [0.0, height]);

        let x0 = self.x_scale.domain()[0];
        self.x_scale = LinearScale::new([x0, x0 + width], [0.0, width]);

        self.width = width;
        self.height = height;
        self.transform = self.constraints().constrain(self.transform);
        self.y_scale = self.transform.rescale_y(&self.baseline);
        debug!("canvas resized to {}x{}", width, height);
        self.batch.request_frame();
    }

    /// Run at most one layout pass for this animation frame
    pub fn on_animation_frame(&mut self, now: Instant) -> Option<FrameReport> {
        if self.lifecycle == Lifecycle::Detached {
            return None;
        }

        if let Some(target) = self.hover_hide.poll(now) {
            if target.is_none() && self.hovered.is_none() && self.overlay.take().is_some() {
                self.emit_overlay(OverlayCommand::Hide);
            }
        }

        let batch = self.batch.take_frame()?;
        let constraints = self.constraints();
        for delta in &batch.items {
            self.transform = delta.apply_to(self.transform, &constraints);
            if delta.pan_x != 0.0 {
                self.x_scale.shift_domain(-delta.pan_x);
            }
        }

        self.update();
        self.frames += 1;
        self.lifecycle = Lifecycle::Running;

        let report = FrameReport {
            frame: self.frames,
            inputs: batch.items.len(),
            transform: self.transform,
            visible_items: self.lanes.values().map(|l| l.visible_items().count()).sum(),
            style: self.label_style(),
        };
        trace!("frame {:?}", report);
        Some(report)
    }

    fn update(&mut self) {
        self.y_scale = self.transform.rescale_y(&self.baseline);

        for lane in self.lanes.values_mut() {
            lane.rescale(&self.y_scale);
            lane.update();
        }

        if let Some(overlay) = &self.overlay {
            let screen = self.world_to_screen(overlay.world);
            self.emit_overlay(OverlayCommand::Move {
                x: screen.x,
                y: screen.y,
            });
        }
    }

    /// Master axis ticks for debugging: `(x ticks, y ticks)` in screen pixels
    pub fn debug_axes(&self) -> Option<(Vec<AxisTick>, Vec<AxisTick>)> {
        if !self.config.draw_debug_axes {
            return None;
        }
        let x_step = nice_step(self.x_scale.domain()[1] - self.x_scale.domain()[0]);
        let y_step = nice_step(self.visible_world_range()[1] - self.visible_world_range()[0]);
        let x = self
            .x_scale
            .ticks(x_step)
            .into_iter()
            .map(|v| AxisTick {
                y: self.x_scale.forward(v),
                label: format!("{}", v),
            })
            .collect();
        let y = self
            .y_scale
            .ticks(y_step)
            .into_iter()
            .map(|v| AxisTick {
                y: self.y_scale.forward(v),
                label: format!("{}", v),
            })
            .collect();
        Some((x, y))
    }

    pub fn set_draw_debug_axes(&mut self, enabled: bool) {
        self.config.draw_debug_axes = enabled;
    }

    /// Remove all lanes, close every outgoing channel, refuse further input
    pub fn detach(&mut self) {
        if self.lifecycle == Lifecycle::Detached {
            return;
        }
        self.lanes.clear();
        self.batch.clear();
        self.hover_hide.clear();
        self.hovered = None;
        self.overlay = None;
        self.emitters = None;
        self.lifecycle = Lifecycle::Detached;
        info!("canvas detached after {} frames", self.frames);
    }

    fn emit_overlay(&self, command: OverlayCommand) {
        if let Some(emitters) = &self.emitters {
            emitters.overlay.emit(command);
        }
    }

    fn emit_hover(&self, event: HoverEvent) {
        if let Some(emitters) = &self.emitters {
            emitters.hover.emit(event);
        }
    }
}

/// Round step (1, 2 or 5 times a power of ten) giving about ten ticks over `span`
fn nice_step(span: f64) -> f64 {
    if !(span.is_finite() && span > 0.0) {
        return 1.0;
    }
    let raw = span / 10.0;
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized < 1.5 {
        1.0
    } else if normalized < 3.5 {
        2.0
    } else if normalized < 7.5 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}
