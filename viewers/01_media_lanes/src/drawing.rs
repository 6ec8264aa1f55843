//! Drawing module - lanes, item labels, axes and the detail card
//!
//! The core works in screen pixels with the origin at the top-left and y
//! growing downward; nannou draws around the window center with y up.
//! Everything passes through `to_draw` on its way to the screen.

use nannou::prelude::*;
use timeline_core::{AxisTick, Item, LabelStyle, Lane, MasterCanvas};

/// Color palette - dark archive aesthetic
pub mod colors {
    use nannou::prelude::*;

    /// Near-black blue background
    pub const BACKGROUND: Srgb<u8> = Srgb {
        red: 18,
        green: 20,
        blue: 26,
        standard: std::marker::PhantomData,
    };

    /// Lane spine
    pub const LANE: Srgb<u8> = Srgb {
        red: 96,
        green: 110,
        blue: 140,
        standard: std::marker::PhantomData,
    };

    pub const TEXT_PRIMARY: Srgb<u8> = Srgb {
        red: 232,
        green: 234,
        blue: 240,
        standard: std::marker::PhantomData,
    };

    pub const TEXT_SECONDARY: Srgb<u8> = Srgb {
        red: 140,
        green: 148,
        blue: 166,
        standard: std::marker::PhantomData,
    };

    /// Items carrying playable media
    pub const PLAYABLE: Srgb<u8> = Srgb {
        red: 255,
        green: 179,
        blue: 71,
        standard: std::marker::PhantomData,
    };

    /// The item whose media is playing right now
    pub const PLAYING: Srgb<u8> = Srgb {
        red: 120,
        green: 220,
        blue: 140,
        standard: std::marker::PhantomData,
    };

    pub const CARD: Srgb<u8> = Srgb {
        red: 34,
        green: 38,
        blue: 50,
        standard: std::marker::PhantomData,
    };

    pub const DEBUG: Srgb<u8> = Srgb {
        red: 200,
        green: 80,
        blue: 160,
        standard: std::marker::PhantomData,
    };
}

/// Length of a year tick mark
const TICK_LENGTH: f32 = 6.0;
const LABEL_FONT_SIZE: u32 = 12;
const CARD_WIDTH: f32 = 260.0;
const CARD_HEIGHT: f32 = 84.0;

/// Screen pixel (top-left origin) to nannou draw coordinates
pub fn to_draw(window_rect: Rect, x: f64, y: f64) -> Point2 {
    pt2(
        window_rect.left() + x as f32,
        window_rect.top() - y as f32,
    )
}

/// Nannou draw coordinates to screen pixel (top-left origin)
pub fn to_screen(window_rect: Rect, p: Point2) -> (f64, f64) {
    ((p.x - window_rect.left()) as f64, (window_rect.top() - p.y) as f64)
}

/// Draw every lane of the canvas
pub fn draw_lanes(
    draw: &Draw,
    canvas: &MasterCanvas,
    window_rect: Rect,
    playing: Option<(&str, &str)>,
) {
    let style = canvas.label_style();
    for lane in canvas.lanes() {
        if !lane.is_on_screen() {
            continue;
        }
        draw_lane(draw, canvas, lane, style, window_rect, playing);
    }
}

fn draw_lane(
    draw: &Draw,
    canvas: &MasterCanvas,
    lane: &Lane,
    style: LabelStyle,
    window_rect: Rect,
    playing: Option<(&str, &str)>,
) {
    let x = canvas.lane_screen_x(lane);
    let top = lane.range_start();
    let bottom = top + lane.height();

    draw.line()
        .start(to_draw(window_rect, x, top))
        .end(to_draw(window_rect, x, bottom))
        .color(colors::LANE)
        .weight(2.0);

    // Title pinned above the visible part of the lane
    let title_pos = to_draw(window_rect, x, top.max(0.0) + 14.0);
    draw.text(lane.title())
        .xy(title_pos + vec2(110.0, 0.0))
        .w(220.0)
        .left_justify()
        .color(colors::TEXT_PRIMARY)
        .font_size(14);

    for tick in lane.year_ticks(style) {
        draw_year_tick(draw, &tick, x, top, window_rect);
    }

    let label_x = x + lane.config().events_left;
    for (_, item) in lane.visible_items() {
        let is_playing = playing.is_some_and(|(l, t)| l == lane.name() && t == item.title);
        draw_item(draw, item, x, label_x, top, style, window_rect, is_playing);
    }
}

fn draw_year_tick(draw: &Draw, tick: &AxisTick, lane_x: f64, lane_top: f64, window_rect: Rect) {
    let y = lane_top + tick.y;
    let start = to_draw(window_rect, lane_x, y);
    draw.line()
        .start(start)
        .end(start - vec2(TICK_LENGTH, 0.0))
        .color(colors::LANE)
        .weight(1.0);
    draw.text(&tick.label)
        .xy(start - vec2(TICK_LENGTH + 24.0, 0.0))
        .w(44.0)
        .right_justify()
        .color(colors::TEXT_SECONDARY)
        .font_size(10);
}

#[allow(clippy::too_many_arguments)]
fn draw_item(
    draw: &Draw,
    item: &Item,
    lane_x: f64,
    label_x: f64,
    lane_top: f64,
    style: LabelStyle,
    window_rect: Rect,
    is_playing: bool,
) {
    let y = lane_top + item.screen_y;
    let color = if is_playing {
        colors::PLAYING
    } else if item.is_playable() {
        colors::PLAYABLE
    } else {
        colors::TEXT_PRIMARY
    };

    // event axis mark
    let dot = to_draw(window_rect, lane_x, y);
    draw.ellipse().xy(dot).radius(3.0).color(color);
    draw.line()
        .start(dot)
        .end(to_draw(window_rect, label_x - 4.0, y))
        .color(srgba(96u8, 110u8, 140u8, 90u8))
        .weight(1.0);

    let width = item.width as f32;
    let anchor = to_draw(window_rect, label_x, y);
    draw.text(&item.title)
        .xy(anchor + vec2(width / 2.0, 0.0))
        .w(width + 4.0)
        .left_justify()
        .color(color)
        .font_size(LABEL_FONT_SIZE);

    let date_label = style.format(&item.date);
    draw.text(&date_label)
        .xy(dot - vec2(TICK_LENGTH + 60.0, 0.0))
        .w(100.0)
        .right_justify()
        .color(colors::TEXT_SECONDARY)
        .font_size(9);
}

/// Draw the master debug axes along the top and left edges
pub fn draw_debug_axes(draw: &Draw, canvas: &MasterCanvas, window_rect: Rect) {
    let Some((x_ticks, y_ticks)) = canvas.debug_axes() else {
        return;
    };
    for tick in &x_ticks {
        let p = to_draw(window_rect, tick.y, 0.0);
        draw.line()
            .start(p)
            .end(p - vec2(0.0, 8.0))
            .color(colors::DEBUG)
            .weight(1.0);
        draw.text(&tick.label)
            .xy(p - vec2(0.0, 16.0))
            .w(60.0)
            .color(colors::DEBUG)
            .font_size(9);
    }
    for tick in &y_ticks {
        let p = to_draw(window_rect, 0.0, tick.y);
        draw.line()
            .start(p)
            .end(p + vec2(8.0, 0.0))
            .color(colors::DEBUG)
            .weight(1.0);
        draw.text(&tick.label)
            .xy(p + vec2(34.0, 0.0))
            .w(48.0)
            .left_justify()
            .color(colors::DEBUG)
            .font_size(9);
    }
}

/// Content of the hover detail card
pub struct CardContent<'a> {
    pub title: &'a str,
    pub date: String,
    pub detail: Option<&'a str>,
    pub playable: bool,
}

/// Draw the detail card with its left edge at screen `(x, y)`, vertically centered on `y`
pub fn draw_card(draw: &Draw, content: &CardContent, x: f64, y: f64, window_rect: Rect) {
    let left_mid = to_draw(window_rect, x, y);
    let center = left_mid + vec2(CARD_WIDTH / 2.0, 0.0);
    draw.rect()
        .xy(center)
        .w_h(CARD_WIDTH, CARD_HEIGHT)
        .color(colors::CARD)
        .stroke(colors::LANE)
        .stroke_weight(1.0);

    let text_w = CARD_WIDTH - 20.0;
    draw.text(content.title)
        .xy(center + vec2(0.0, 24.0))
        .w(text_w)
        .left_justify()
        .color(colors::TEXT_PRIMARY)
        .font_size(14);
    draw.text(&content.date)
        .xy(center + vec2(0.0, 6.0))
        .w(text_w)
        .left_justify()
        .color(colors::TEXT_SECONDARY)
        .font_size(11);
    if let Some(detail) = content.detail {
        draw.text(detail)
            .xy(center - vec2(0.0, 18.0))
            .w(text_w)
            .left_justify()
            .color(colors::TEXT_SECONDARY)
            .font_size(10);
    }
    if content.playable {
        draw.text("click to play / pause")
            .xy(center - vec2(0.0, 34.0))
            .w(text_w)
            .left_justify()
            .color(colors::PLAYABLE)
            .font_size(9);
    }
}

/// Draw the input help along the bottom edge
pub fn draw_help_text(draw: &Draw, window_rect: Rect) {
    let help_lines = [
        "Wheel: zoom  |  Ctrl+wheel / pinch: fast zoom  |  Shift+wheel: pan sideways",
        "Drag: pan  |  Click item: play / pause media  |  D: debug axes",
    ];

    let base_y = window_rect.bottom() + 20.0;
    for (i, line) in help_lines.iter().enumerate() {
        draw.text(line)
            .x_y(0.0, base_y + (help_lines.len() - 1 - i) as f32 * 16.0)
            .color(srgba(140u8, 148u8, 166u8, 120u8))
            .font_size(11)
            .w(700.0);
    }
}
