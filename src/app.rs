use eframe::egui;

use crate::config::Settings;
use crate::state::{AppState, Tab};
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ActivityViewerApp {
    pub state: AppState,
}

impl ActivityViewerApp {
    pub fn new(settings: Settings) -> Self {
        Self {
            state: AppState::new(settings),
        }
    }
}

impl Default for ActivityViewerApp {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl eframe::App for ActivityViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll_tasks();

        // ---- Top panel: tabs ----
        egui::TopBottomPanel::top("tab_bar").show(ctx, |ui| {
            panels::tab_bar(ui, &mut self.state);
        });

        // ---- Bottom panels: instructions, then progress and date range ----
        egui::TopBottomPanel::bottom("instructions").show(ctx, |ui| {
            panels::instructions(ui);
        });
        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.add_space(4.0);
            panels::controls(ui, &mut self.state);
            ui.add_space(4.0);
        });

        // ---- Left side panel: day list (visualization tab only) ----
        if self.state.tab == Tab::Chart {
            egui::SidePanel::left("day_list")
                .default_width(160.0)
                .max_width(200.0)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::day_list(ui, &mut self.state);
                });
        }

        // ---- Central panel: chart or table ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.tab {
            Tab::Chart => plot::activity_plot(ui, &self.state),
            Tab::Table => table::data_overview(ui, &mut self.state),
        });

        // ---- Dialogs ----
        panels::sign_in_dialog(ctx, &mut self.state);
        panels::notice_dialog(ctx, &mut self.state);

        if self.state.busy() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
