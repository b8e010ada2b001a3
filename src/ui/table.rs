use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{format_percent, TIMESTAMP_FORMAT};
use crate::state::AppState;

const ROW_HEIGHT: f32 = 20.0;

// ---------------------------------------------------------------------------
// Data overview tab
// ---------------------------------------------------------------------------

/// Table mirroring the chart rows, plus the clipboard export.
pub fn data_overview(ui: &mut Ui, state: &mut AppState) {
    let Some(series) = &state.series else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("No data loaded yet.");
        });
        return;
    };

    let mut clicked: Option<usize> = None;
    let mut copy = false;

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Copy data").clicked() {
            copy = true;
        }
        ui.label(format!("{} rows, {}", series.len(), series.range));
    });
    ui.separator();

    let additive = ui.input(|i| i.modifiers.command);
    let selected = &state.selected_rows;

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .sense(egui::Sense::click())
        .column(Column::auto().at_least(170.0))
        .column(Column::remainder())
        .header(ROW_HEIGHT, |mut header| {
            header.col(|ui: &mut Ui| {
                ui.strong("Date");
            });
            header.col(|ui: &mut Ui| {
                ui.strong("AC Measurements Active Percent");
            });
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, series.len(), |mut row| {
                let idx = row.index();
                let m = &series.measurements[idx];
                row.set_selected(selected.contains(&idx));
                row.col(|ui: &mut Ui| {
                    ui.label(m.timestamp.format(TIMESTAMP_FORMAT).to_string());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{}%", format_percent(m.percent)));
                });
                if row.response().clicked() {
                    clicked = Some(idx);
                }
            });
        });

    if let Some(idx) = clicked {
        state.select_row(idx, additive);
    }
    if copy {
        if let Some(text) = state.export_to_clipboard() {
            log::info!("Copied {} lines to the clipboard", text.lines().count());
            ui.ctx().copy_text(text);
        }
    }
}
