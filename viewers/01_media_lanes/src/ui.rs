//! UI module - egui control panel
//!
//! Shows the view state, the lanes with their load problems and the player,
//! and returns what the user asked for.

use nannou_egui::egui;
use timeline_core::{LabelStyle, MasterCanvas};

use crate::player::Player;

/// Result of control panel interactions
#[derive(Debug, Default)]
pub struct PanelResult {
    /// Rebuild the canvas at its initial view
    pub reset_view: bool,
    /// Pause the current media
    pub pause: bool,
    /// New value of the debug axes checkbox, when it changed
    pub debug_axes: Option<bool>,
}

fn style_name(style: LabelStyle) -> &'static str {
    match style {
        LabelStyle::Decades => "decades",
        LabelStyle::Years => "years",
    }
}

/// Draw the control panel
pub fn draw_control_panel(ctx: &egui::Context, canvas: &MasterCanvas, player: &Player) -> PanelResult {
    let mut result = PanelResult::default();

    egui::Window::new("Media Lanes")
        .collapsible(true)
        .resizable(false)
        .default_width(260.0)
        .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
        .show(ctx, |ui| {
            let [from, to] = canvas.visible_world_range();
            ui.label(format!("Showing {:.1} to {:.1}", from, to));
            ui.label(format!(
                "Zoom {:.2}x · {:.1} px/year · {} labels",
                canvas.transform().k,
                canvas.pixels_per_year(),
                style_name(canvas.label_style())
            ));

            ui.horizontal(|ui| {
                if ui.button("Reset view").clicked() {
                    result.reset_view = true;
                }
                let mut debug_axes = canvas.config().draw_debug_axes;
                if ui.checkbox(&mut debug_axes, "Debug axes").changed() {
                    result.debug_axes = Some(debug_axes);
                }
            });

            ui.separator();

            // Lanes
            for lane in canvas.lanes() {
                let visible = lane.visible_items().count();
                ui.label(format!(
                    "{} · {} of {} items shown",
                    lane.title(),
                    visible,
                    lane.items().len()
                ));
                if !lane.rejected().is_empty() {
                    ui.collapsing(format!("{} rejected records", lane.rejected().len()), |ui| {
                        for err in lane.rejected() {
                            ui.colored_label(
                                egui::Color32::from_rgb(255, 107, 53),
                                err.to_string(),
                            );
                        }
                    });
                }
            }

            ui.separator();

            // Player
            match player.current() {
                Some(now) => {
                    let state = if now.playing { "Playing" } else { "Paused" };
                    ui.label(format!("{}: {}", state, now.item.title));
                    ui.label(
                        egui::RichText::new(&now.media.url)
                            .small()
                            .color(egui::Color32::from_rgb(140, 148, 166)),
                    );
                    if ui.add_enabled(now.playing, egui::Button::new("Pause")).clicked() {
                        result.pause = true;
                    }
                }
                None => {
                    ui.label("Nothing playing");
                }
            }
        });

    result
}
