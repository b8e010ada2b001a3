use eframe::egui::{self, Color32, Id, Modal, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::model::DAY_FORMAT;
use crate::state::{AppState, NoticeKind, Phase, Tab};

const INSTRUCTIONS: &str = "Instructions:\n\
    - Pick a start and an end date.\n\
    - Click 'Start visualization' to load the chart.\n\
    - Pick one or more days in the list to highlight their points (Ctrl-click adds).\n\
    - Hover highlighted points to see details.";

/// Wakes the UI once a background task has reported.
fn repaint_notifier(ctx: &egui::Context) -> impl FnOnce() + Send + 'static {
    let ctx = ctx.clone();
    move || ctx.request_repaint()
}

// ---------------------------------------------------------------------------
// Tab bar
// ---------------------------------------------------------------------------

pub fn tab_bar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.selectable_value(&mut state.tab, Tab::Chart, "Visualization");
        ui.selectable_value(&mut state.tab, Tab::Table, "Data overview");
    });
}

// ---------------------------------------------------------------------------
// Controls: progress and date range
// ---------------------------------------------------------------------------

/// Progress label, date pickers and the start button.
pub fn controls(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if state.busy() {
                    ui.spinner();
                }
                ui.label(&state.status_message);
            });
            if state.can_sign_in() && ui.button("Sign in…").clicked() {
                state.open_sign_in();
            }
        });

        ui.separator();

        ui.vertical(|ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Start date:");
                ui.add(DatePickerButton::new(&mut state.start_date).id_salt("start_date"));
                ui.label("End date:");
                ui.add(DatePickerButton::new(&mut state.end_date).id_salt("end_date"));
            });
            let button = egui::Button::new("Start visualization");
            let start = ui.add_enabled(state.can_visualize(), button);
            if start.clicked() {
                state.start_visualization(repaint_notifier(ui.ctx()));
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Day list
// ---------------------------------------------------------------------------

/// Distinct days of the series; selecting them highlights their points.
pub fn day_list(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Days");
    ui.separator();

    if state.days.is_empty() {
        ui.label("No days to show.");
        return;
    }

    let additive = ui.input(|i| i.modifiers.command);
    let mut clicked = None;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for day in &state.days {
                let selected = state.selected_days.contains(day);
                let label = day.format(DAY_FORMAT).to_string();
                if ui.selectable_label(selected, label).clicked() {
                    clicked = Some(*day);
                }
            }
        });

    if let Some(day) = clicked {
        state.select_day(day, additive);
    }
}

// ---------------------------------------------------------------------------
// Footer
// ---------------------------------------------------------------------------

pub fn instructions(ui: &mut Ui) {
    ui.label(RichText::new(INSTRUCTIONS).size(10.0).color(Color32::GRAY));
}

// ---------------------------------------------------------------------------
// Dialogs
// ---------------------------------------------------------------------------

/// Credentials dialog, open while the session is authenticating.
pub fn sign_in_dialog(ctx: &egui::Context, state: &mut AppState) {
    if state.phase != Phase::Authenticating {
        return;
    }

    let mut submit = false;
    let modal = Modal::new(Id::new("sign_in")).show(ctx, |ui: &mut Ui| {
        ui.set_width(280.0);
        ui.heading("Sign in");
        ui.add_space(4.0);

        ui.label("Username:");
        ui.text_edit_singleline(&mut state.credentials.username);
        ui.label("Password:");
        let password = ui.add(
            egui::TextEdit::singleline(&mut state.credentials.password).password(true),
        );
        if password.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            submit = true;
        }

        ui.add_space(8.0);
        if ui.button("Submit").clicked() {
            submit = true;
        }
    });

    if submit {
        state.submit_credentials(repaint_notifier(ctx));
    } else if modal.should_close() {
        state.cancel_sign_in();
    }
}

/// Blocking information / warning / error message.
pub fn notice_dialog(ctx: &egui::Context, state: &mut AppState) {
    let Some(notice) = &state.notice else {
        return;
    };

    let color = match notice.kind {
        NoticeKind::Info => ctx.style().visuals.text_color(),
        NoticeKind::Warning => Color32::from_rgb(230, 160, 0),
        NoticeKind::Error => Color32::RED,
    };

    let mut close = false;
    let modal = Modal::new(Id::new("notice")).show(ctx, |ui: &mut Ui| {
        ui.set_max_width(420.0);
        ui.heading(RichText::new(&notice.title).color(color));
        ui.add_space(4.0);
        ui.label(&notice.text);
        ui.add_space(8.0);
        if ui.button("OK").clicked() {
            close = true;
        }
    });

    if close || modal.should_close() {
        state.dismiss_notice();
    }
}
