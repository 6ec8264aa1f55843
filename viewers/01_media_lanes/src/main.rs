//! Media Lanes
//!
//! Side-by-side lanes of dated events on one zoomable time axis. Wheel and
//! pinch zoom, drag pans, hovering a label shows its card and clicking a
//! playable item toggles its media.
//!
//! Usage: `media_lanes [DATA.toml]` (the built-in demo is shown without one).

mod data;
mod drawing;
mod player;
mod ui;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use log::{debug, error, info, warn};
use nannou::prelude::*;
use nannou_egui::{self, Egui};
use timeline_core::{
    canvas_channels, CanvasConfig, CanvasEvents, FixedMetrics, InputEvent, ItemRef, MasterCanvas,
    OverlayCommand, Point as ScreenPoint, TouchPoint, WheelDeltaMode,
};

use crate::data::{load_data, DataFile};
use crate::drawing::{
    colors, draw_card, draw_debug_axes, draw_help_text, draw_lanes, to_screen, CardContent,
};
use crate::player::Player;
use crate::ui::draw_control_panel;

const VIEWER_NAME: &str = "media_lanes";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    nannou::app(model).update(update).run();
}

/// Detail card placement, driven by overlay commands
#[derive(Debug, Clone)]
struct Card {
    item: ItemRef,
    x: f64,
    y: f64,
}

/// Application state
struct Model {
    config: CanvasConfig,
    data: DataFile,
    canvas: MasterCanvas,
    events: CanvasEvents,
    player: Player,
    card: Option<Card>,
    /// Touches currently on the surface, by id
    touches: BTreeMap<u64, ScreenPoint>,
    /// egui integration
    egui: Egui,
}

fn load_canvas_config() -> CanvasConfig {
    match timeline_core::load_config::<CanvasConfig>(VIEWER_NAME) {
        Ok(Some(config)) => config,
        Ok(None) => {
            let config = CanvasConfig::default();
            if let Err(e) = timeline_core::save_config(VIEWER_NAME, &config) {
                warn!("failed to write default config: {}", e);
            }
            config
        }
        Err(e) => {
            warn!("failed to load config, using defaults: {}", e);
            CanvasConfig::default()
        }
    }
}

/// Build a canvas for the window and load every lane of `data` into it
fn build_canvas(
    config: &CanvasConfig,
    data: &DataFile,
    width: f64,
    height: f64,
) -> (MasterCanvas, CanvasEvents) {
    let (emitters, events) = canvas_channels(config.queue_capacity);
    let mut canvas = MasterCanvas::new(
        config.clone(),
        width,
        height,
        Box::new(FixedMetrics::default()),
        emitters,
    );

    for lane in &data.lanes {
        match canvas.add_lane(&lane.name, &lane.records, lane.options()) {
            Ok(rejected) if !rejected.is_empty() => {
                warn!("lane `{}`: {} records rejected", lane.name, rejected.len());
            }
            Ok(_) => {}
            Err(e) => error!("cannot add lane `{}`: {}", lane.name, e),
        }
    }
    (canvas, events)
}

fn model(app: &App) -> Model {
    let window_id = app
        .new_window()
        .title("Media Lanes")
        .size(1200, 800)
        .min_size(640, 400)
        .view(view)
        .key_pressed(key_pressed)
        .mouse_pressed(mouse_pressed)
        .mouse_released(mouse_released)
        .mouse_moved(mouse_moved)
        .mouse_wheel(mouse_wheel)
        .touch(touch)
        .resized(resized)
        .raw_event(raw_window_event)
        .build()
        .expect("failed to create window");

    let window = app.window(window_id).expect("window closed during startup");
    let egui = Egui::from_window(&window);
    let rect = window.rect();

    let config = load_canvas_config();
    let data_path = std::env::args().nth(1).map(PathBuf::from);
    let data = load_data(data_path.as_deref()).unwrap_or_else(|e| {
        error!("{}", e);
        DataFile::default()
    });
    info!("loaded {} lanes", data.lanes.len());

    let (canvas, events) = build_canvas(&config, &data, rect.w() as f64, rect.h() as f64);

    Model {
        config,
        data,
        canvas,
        events,
        player: Player::default(),
        card: None,
        touches: BTreeMap::new(),
        egui,
    }
}

impl Model {
    /// Feed one input event to the canvas unless egui is using the pointer
    fn feed(&mut self, event: InputEvent) {
        if self.egui.ctx().wants_pointer_input() {
            return;
        }
        if let Err(e) = self.canvas.handle_input(&event, Instant::now()) {
            debug!("input dropped: {}", e);
        }
    }

    fn reset_view(&mut self) {
        let (w, h) = self.canvas.size();
        self.canvas.detach();
        let (canvas, events) = build_canvas(&self.config, &self.data, w, h);
        self.canvas = canvas;
        self.events = events;
        self.card = None;
        info!("view reset");
    }

    fn toggle_debug_axes(&mut self, enabled: bool) {
        self.config.draw_debug_axes = enabled;
        self.canvas.set_draw_debug_axes(enabled);
        if let Err(e) = timeline_core::save_config(VIEWER_NAME, &self.config) {
            warn!("failed to save config: {}", e);
        }
    }

    /// Apply everything the canvas emitted since the last frame
    fn drain_events(&mut self) {
        for command in self.events.overlay.drain() {
            match command {
                OverlayCommand::Show { item, x, y } => self.card = Some(Card { item, x, y }),
                OverlayCommand::Move { x, y } => {
                    if let Some(card) = self.card.as_mut() {
                        card.x = x;
                        card.y = y;
                    }
                }
                OverlayCommand::Hide => self.card = None,
            }
        }
        for hover in self.events.hover.drain() {
            debug!(
                "hover `{}` at ({:.1}, {:.2})",
                hover.item.title, hover.world_x, hover.world_y
            );
        }
        for click in self.events.click.drain() {
            debug!("clicked `{}` in lane `{}`", click.title, click.lane);
        }
        for intent in self.events.playback.drain() {
            self.player.handle(intent);
        }
    }
}

fn update(_app: &App, model: &mut Model, update: Update) {
    if let Some(report) = model.canvas.on_animation_frame(Instant::now()) {
        if report.inputs > 0 {
            debug!(
                "frame {}: {} inputs, k={:.3}, {} items visible",
                report.frame, report.inputs, report.transform.k, report.visible_items
            );
        }
    }
    model.drain_events();

    model.egui.set_elapsed_time(update.since_start);
    let ctx = model.egui.begin_frame();
    let result = draw_control_panel(&ctx, &model.canvas, &model.player);
    drop(ctx);

    if result.reset_view {
        model.reset_view();
    }
    if result.pause {
        model.player.pause();
    }
    if let Some(enabled) = result.debug_axes {
        model.toggle_debug_axes(enabled);
    }
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    let window_rect = app.window_rect();

    draw.background().color(colors::BACKGROUND);

    let playing = model
        .player
        .current()
        .filter(|now| now.playing)
        .map(|now| (now.item.lane.as_str(), now.item.title.as_str()));
    draw_lanes(&draw, &model.canvas, window_rect, playing);
    draw_debug_axes(&draw, &model.canvas, window_rect);

    if let Some(card) = &model.card {
        let item = model
            .canvas
            .lane(&card.item.lane)
            .and_then(|lane| lane.item(card.item.index));
        if let Some(item) = item {
            let content = CardContent {
                title: &item.title,
                date: timeline_core::date::format_smart(&item.date),
                detail: item.detail.as_deref(),
                playable: item.is_playable(),
            };
            draw_card(&draw, &content, card.x, card.y, window_rect);
        }
    }

    draw_help_text(&draw, window_rect);

    if let Err(e) = draw.to_frame(app, &frame) {
        error!("failed to render frame: {:?}", e);
    }
    if let Err(e) = model.egui.draw_to_frame(&frame) {
        error!("failed to render egui: {:?}", e);
    }
}

fn key_pressed(_app: &App, model: &mut Model, key: Key) {
    match key {
        Key::D => {
            let enabled = !model.canvas.config().draw_debug_axes;
            model.toggle_debug_axes(enabled);
        }
        Key::R => model.reset_view(),
        Key::Space => model.player.pause(),
        _ => {}
    }
}

fn pointer_button(button: MouseButton) -> timeline_core::MouseButton {
    match button {
        MouseButton::Right => timeline_core::MouseButton::Secondary,
        MouseButton::Middle => timeline_core::MouseButton::Middle,
        _ => timeline_core::MouseButton::Primary,
    }
}

fn screen_point(app: &App, p: Point2) -> ScreenPoint {
    let (x, y) = to_screen(app.window_rect(), p);
    ScreenPoint::new(x, y)
}

fn mouse_pressed(app: &App, model: &mut Model, button: MouseButton) {
    let position = screen_point(app, app.mouse.position());
    model.feed(InputEvent::MouseDown {
        position,
        button: pointer_button(button),
    });
}

fn mouse_released(app: &App, model: &mut Model, button: MouseButton) {
    let position = screen_point(app, app.mouse.position());
    // releases always reach the canvas so a drag cannot get stuck
    let event = InputEvent::MouseUp {
        position,
        button: pointer_button(button),
    };
    if let Err(e) = model.canvas.handle_input(&event, Instant::now()) {
        debug!("input dropped: {}", e);
    }
}

fn mouse_moved(app: &App, model: &mut Model, pos: Point2) {
    let position = screen_point(app, pos);
    model.feed(InputEvent::MouseMove { position });
}

fn mouse_wheel(app: &App, model: &mut Model, delta: MouseScrollDelta, _phase: TouchPhase) {
    // winit reports scroll-up as positive; the canvas expects browser-style signs
    let (mut delta_x, mut delta_y, mode) = match delta {
        MouseScrollDelta::LineDelta(x, y) => (-x as f64, -y as f64, WheelDeltaMode::Line),
        MouseScrollDelta::PixelDelta(pos) => (-pos.x, -pos.y, WheelDeltaMode::Pixel),
    };
    let mods = app.keys.mods;
    if mods.shift() && delta_x == 0.0 {
        delta_x = delta_y;
        delta_y = 0.0;
    }
    let position = screen_point(app, app.mouse.position());
    model.feed(InputEvent::Wheel {
        position,
        delta_x,
        delta_y,
        mode,
        ctrl: mods.ctrl(),
    });
}

fn touch(app: &App, model: &mut Model, touch: TouchEvent) {
    let position = screen_point(app, touch.position);
    let phase = match touch.phase {
        TouchPhase::Started => timeline_core::TouchPhase::Start,
        TouchPhase::Moved => timeline_core::TouchPhase::Move,
        TouchPhase::Ended | TouchPhase::Cancelled => timeline_core::TouchPhase::End,
    };
    match phase {
        timeline_core::TouchPhase::End => {
            model.touches.remove(&touch.id);
        }
        _ => {
            model.touches.insert(touch.id, position);
        }
    }
    let touches = model
        .touches
        .iter()
        .map(|(&id, &position)| TouchPoint { id, position })
        .collect();
    model.feed(InputEvent::Touch { phase, touches });
}

fn resized(_app: &App, model: &mut Model, size: Vec2) {
    model.canvas.resize(size.x as f64, size.y as f64);
}

fn raw_window_event(_app: &App, model: &mut Model, event: &nannou::winit::event::WindowEvent) {
    model.egui.handle_raw_event(event);
}
