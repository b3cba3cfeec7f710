//! Main GUI application struct and eframe::App implementation.

use std::time::Duration;

use eframe::egui;

use crate::app::App;
use crate::config::Theme;
use crate::gui::pie::{donut, legend_entry, FREE_COLOR, USED_COLOR};
use crate::host::LocalHost;
use crate::storage::{format_percent, usage_line, Reading, ReadingStatus};
use crate::volume::Severity;

/// Diameter of each donut in points.
const CHART_SIZE: f32 = 180.0;

/// Main application state for the GUI.
pub struct DasifaApp {
    app: App<LocalHost>,
}

impl DasifaApp {
    pub fn new(cc: &eframe::CreationContext<'_>, app: App<LocalHost>) -> Self {
        let mut style = (*cc.egui_ctx.style()).clone();
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        cc.egui_ctx.set_style(style);

        Self { app }
    }

    fn apply_theme(&self, ctx: &egui::Context) {
        let visuals = match self.app.theme() {
            Theme::Light => egui::Visuals::light(),
            Theme::Dark => egui::Visuals::dark(),
        };
        ctx.set_visuals(visuals);
    }

    fn storage_card(ui: &mut egui::Ui, title: &str, reading: &Reading, empty_message: &str) {
        ui.vertical_centered(|ui| {
            ui.heading(title);
            ui.add_space(8.0);
            let empty = ui.visuals().weak_text_color();
            donut(ui, reading, CHART_SIZE, empty);
            ui.add_space(8.0);

            match &reading.status {
                ReadingStatus::Ok => {
                    let snapshot = &reading.snapshot;
                    legend_entry(
                        ui,
                        USED_COLOR,
                        &format!("Used: {}%", format_percent(snapshot.used_percent())),
                    );
                    legend_entry(
                        ui,
                        FREE_COLOR,
                        &format!("Free: {}%", format_percent(snapshot.free_percent())),
                    );
                    ui.label(usage_line(snapshot));
                }
                ReadingStatus::NoData => {
                    ui.weak(empty_message);
                }
                ReadingStatus::Failed(reason) => {
                    ui.colored_label(
                        ui.visuals().error_fg_color,
                        format!("Could not read storage: {}", reason),
                    );
                }
            }
        });
    }

    fn render_removable_actions(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            if ui.button("Select USB storage").clicked() {
                let pick = rfd::FileDialog::new()
                    .set_title("Select USB storage")
                    .pick_folder();
                self.app.pick_volume(pick);
            }

            if self.app.can_eject() && ui.button("Eject").clicked() {
                self.app.eject();
            }

            if let Some(folders) = self.app.folders() {
                let root = folders.root().display().to_string();
                ui.weak(root);
                if ui.button("Open folder").clicked() {
                    self.app.open_managed_folder();
                }
            }
        });
    }

    fn render_permission_prompt(&mut self, ctx: &egui::Context) {
        let Some(device) = self.app.pending_permission().map(|d| d.to_string()) else {
            return;
        };

        egui::Window::new("USB permission")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(format!("Allow DaSifA to access {}?", device));
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Allow").clicked() {
                        self.app.answer_permission(true);
                    }
                    if ui.button("Deny").clicked() {
                        self.app.answer_permission(false);
                    }
                });
            });
    }

    fn render_notices(&self, ctx: &egui::Context) {
        if self.app.notices.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("notices"))
            .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -40.0))
            .interactable(false)
            .show(ctx, |ui| {
                for notice in self.app.notices.iter() {
                    let color = match notice.severity {
                        Severity::Info => ui.visuals().text_color(),
                        Severity::Warning => ui.visuals().warn_fg_color,
                        Severity::Error => ui.visuals().error_fg_color,
                    };
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.colored_label(color, &notice.message);
                    });
                }
            });
    }
}

impl eframe::App for DasifaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.app.update();
        self.apply_theme(ctx);

        // Device events and expiring notices arrive without input
        ctx.request_repaint_after(Duration::from_millis(250));

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("DaSifA");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .button(self.app.theme().toggle_icon())
                        .on_hover_text("Toggle theme")
                        .clicked()
                    {
                        self.app.toggle_theme();
                    }
                    if ui.button("Refresh").clicked() {
                        self.app.refresh();
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Internal: {}", self.app.config.internal_root.display()));
                ui.separator();
                match self.app.session().handle() {
                    Some(handle) => ui.label(format!("USB: {}", handle)),
                    None => ui.weak("USB: none"),
                };
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(2, |columns| {
                Self::storage_card(
                    &mut columns[0],
                    "Internal storage",
                    self.app.internal(),
                    "No data",
                );
                Self::storage_card(
                    &mut columns[1],
                    "USB storage",
                    self.app.removable(),
                    "No USB storage selected",
                );
                columns[1].add_space(12.0);
                self.render_removable_actions(&mut columns[1]);
            });
        });

        self.render_permission_prompt(ctx);
        self.render_notices(ctx);
    }
}

impl Drop for DasifaApp {
    fn drop(&mut self) {
        self.app.shutdown();
    }
}
