//! egui side panels
//!
//! Panels only read [`ViewerState`] and report what the user asked for as
//! [`Action`]s; the viewer applies them after the frame's UI pass.

use crate::scene::GeometryRole;
use crate::state::ViewerState;
use cloudframe_core::Axis;
use cloudframe_io::{AssetKind, DebugInfo, Pose};
use egui::{Color32, RichText};

/// A user request coming from the panels or the keyboard
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    PreviousFrame,
    NextFrame,
    ResetView,
    Toggle(AssetKind),
    SetOffset(Axis, f32),
    SetMatch(usize, bool),
    SelectAllMatches,
    DeselectAllMatches,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InfoTab {
    #[default]
    Debug,
    Match,
}

/// Panel state that lives only in the UI
#[derive(Debug, Default)]
pub struct PanelState {
    pub tab: InfoTab,
    /// Last failed action, shown until the next one succeeds
    pub error: Option<String>,
}

/// Draw both side panels and collect the requested actions
pub fn draw_panels(ctx: &egui::Context, state: &ViewerState, panels: &mut PanelState) -> Vec<Action> {
    let mut actions = Vec::new();

    egui::SidePanel::left("control_panel")
        .default_width(300.0)
        .resizable(true)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                control_panel(ui, state, panels, &mut actions);
            });
        });

    egui::SidePanel::right("info_panel")
        .default_width(420.0)
        .resizable(true)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut panels.tab, InfoTab::Debug, "Debug");
                ui.selectable_value(&mut panels.tab, InfoTab::Match, "Match");
            });
            ui.separator();
            match panels.tab {
                InfoTab::Debug => debug_tab(ui, state),
                InfoTab::Match => match_tab(ui, state, &mut actions),
            }
        });

    actions
}

fn control_panel(ui: &mut egui::Ui, state: &ViewerState, panels: &PanelState, actions: &mut Vec<Action>) {
    ui.heading("Current frame");
    ui.label(format!("{} (id {})", state.frame_status(), state.frame_id()));
    ui.label(state.type_status());

    let composed = state.composed();
    let present = composed.debug_text.is_some() || composed.match_text.is_some();
    let status_color = if present { Color32::BLACK } else { Color32::GRAY };
    ui.colored_label(status_color, state.debug_status());
    ui.colored_label(status_color, state.match_status());

    if let Some(error) = &panels.error {
        ui.colored_label(Color32::from_rgb(200, 40, 40), error);
    }

    ui.separator();
    ui.heading("Controls");
    ui.horizontal(|ui| {
        if ui.button("Previous (←)").clicked() {
            actions.push(Action::PreviousFrame);
        }
        if ui.button("Next (→)").clicked() {
            actions.push(Action::NextFrame);
        }
    });
    if ui.button("Reset View (R)").clicked() {
        actions.push(Action::ResetView);
    }

    ui.separator();
    ui.label(RichText::new("Visibility").strong());
    for kind in AssetKind::ALL {
        let button = egui::Button::new(state.button_label(kind));
        if ui.add_enabled(state.has_kind(kind), button).clicked() {
            actions.push(Action::Toggle(kind));
        }
    }

    ui.separator();
    ui.label(RichText::new("Transformed cloud offset").strong());
    let offset = state.offset();
    let limit = state.offset_limit();
    let enabled = composed.is_transformed();
    for axis in Axis::ALL {
        let mut value = offset[axis.index()];
        ui.horizontal(|ui| {
            ui.label(format!("{} offset:", axis.label()));
            let drag = egui::DragValue::new(&mut value)
                .speed(state.offset_step())
                .clamp_range(-limit..=limit)
                .max_decimals(3);
            if ui.add_enabled(enabled, drag).changed() {
                actions.push(Action::SetOffset(axis, value));
            }
        });
    }

    ui.separator();
    picked_point(ui, state);

    ui.separator();
    if ui.button("Quit (Esc)").clicked() {
        actions.push(Action::Quit);
    }
}

fn picked_point(ui: &mut egui::Ui, state: &ViewerState) {
    ui.label(RichText::new("Picked point").strong());
    let Some(picked) = state.picked() else {
        ui.weak("Click a point to inspect it");
        return;
    };

    ui.label(format!("Cloud: {}", picked.name));
    if let GeometryRole::Cloud { layer, kind, id } = picked.role {
        let id = id.map_or_else(|| "-".to_string(), |id| id.to_string());
        ui.label(format!("{} {} (id {})", layer.label(), kind, id));
    }
    ui.label(format!("Index: {} of {}", picked.index, picked.cloud_len));
    let p = picked.position;
    ui.monospace(format!("x {:.4}\ny {:.4}\nz {:.4}", p.x, p.y, p.z));

    let Some(sidecar) = state.picked_sidecar() else {
        return;
    };
    match &sidecar.plane {
        Some(plane) => {
            if let Some(c) = plane.center {
                ui.monospace(format!("center ({:.4}, {:.4}, {:.4})", c.a, c.b, c.c));
            }
            if let Some(p) = plane.plane_param {
                ui.monospace(format!("plane {:.4}x + {:.4}y + {:.4}z + {:.4} = 0", p.a, p.b, p.c, p.d));
            }
            if let Some(r) = plane.radius {
                ui.monospace(format!("radius {:.4}", r));
            }
        }
        None => {
            ui.collapsing("Sidecar JSON", |ui| {
                ui.monospace(sidecar.raw.to_string());
            });
        }
    }
}

fn debug_tab(ui: &mut egui::Ui, state: &ViewerState) {
    let Some(text) = state.debug_text() else {
        ui.weak("debug.txt not found");
        return;
    };

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            match &state.composed().debug_info {
                Some(info) => optimization_summary(ui, info),
                None => {
                    ui.colored_label(Color32::from_rgb(200, 120, 0), "No usable T_opt_w_b pose in debug.txt");
                }
            }
            ui.separator();
            ui.collapsing("Raw debug.txt", |ui| {
                ui.monospace(text);
            });
        });
}

fn pose_rows(ui: &mut egui::Ui, pose: &Pose) {
    let q = pose.quaternion;
    let t = pose.translation;
    ui.monospace(format!("q(wxyz) ({:.8}, {:.8}, {:.8}, {:.8})", q[0], q[1], q[2], q[3]));
    ui.monospace(format!("t(xyz)  ({:.8}, {:.8}, {:.8})", t[0], t[1], t[2]));
}

fn optimization_summary(ui: &mut egui::Ui, info: &DebugInfo) {
    ui.label(RichText::new("Initial pose (T_init_w_b)").strong());
    pose_rows(ui, &info.init);
    ui.label(RichText::new("Optimized pose (T_opt_w_b)").strong());
    pose_rows(ui, &info.optimized);

    let dq: Vec<f64> = (0..4).map(|i| info.optimized.quaternion[i] - info.init.quaternion[i]).collect();
    let dt: Vec<f64> = (0..3).map(|i| info.optimized.translation[i] - info.init.translation[i]).collect();
    ui.label(RichText::new("Change").strong());
    ui.monospace(format!("q {:+.3e} {:+.3e} {:+.3e} {:+.3e}", dq[0], dq[1], dq[2], dq[3]));
    ui.monospace(format!("t {:+.3e} {:+.3e} {:+.3e}", dt[0], dt[1], dt[2]));

    if info.iterations.is_empty() {
        return;
    }
    ui.separator();
    ui.label(RichText::new(format!("Iterations ({})", info.iterations.len())).strong());
    let fmt = |cost: Option<[f64; 3]>, i: usize| cost.map_or_else(|| "-".to_string(), |c| format!("{:.5}", c[i]));
    egui::Grid::new("iterations").striped(true).show(ui, |ui| {
        for header in ["#", "before a", "before b", "before c", "after a", "after b", "after c", "gain a", "gain b", "gain c"] {
            ui.label(RichText::new(header).strong());
        }
        ui.end_row();
        for iteration in &info.iterations {
            ui.monospace(iteration.index.to_string());
            for i in 0..3 {
                ui.monospace(fmt(iteration.cost_before, i));
            }
            for i in 0..3 {
                ui.monospace(fmt(iteration.cost_after, i));
            }
            for i in 0..3 {
                let gain = iteration
                    .cost_before
                    .zip(iteration.cost_after)
                    .map_or_else(|| "-".to_string(), |(b, a)| format!("{:+.5}", b[i] - a[i]));
                ui.monospace(gain);
            }
            ui.end_row();
        }
    });
}

fn match_tab(ui: &mut egui::Ui, state: &ViewerState, actions: &mut Vec<Action>) {
    let Some(text) = state.match_text_pretty() else {
        ui.weak("match.json not found");
        return;
    };

    let composed = state.composed();
    let matches = state.plane_matches();
    let total = composed
        .match_info
        .as_ref()
        .map_or(0, |info| info.plane_match_infos.len());
    ui.label(format!("Plane matches: {} usable of {} entries", matches.len(), total));
    ui.label(format!("Dense match lines: {}", composed.dense_line_count));
    if let Some(report) = &composed.report {
        ui.label(format!(
            "Map dense points: {} matched, {} unmatched",
            report.matched.len(),
            report.unmatched.len()
        ));
    }

    if !matches.is_empty() {
        ui.horizontal(|ui| {
            if ui.button("Select all").clicked() {
                actions.push(Action::SelectAllMatches);
            }
            if ui.button("Deselect all").clicked() {
                actions.push(Action::DeselectAllMatches);
            }
        });
        egui::ScrollArea::vertical()
            .id_source("plane_matches")
            .max_height(220.0)
            .show(ui, |ui| {
                for (i, pair) in matches.iter().enumerate() {
                    let mut selected = state.is_match_selected(i);
                    if ui.checkbox(&mut selected, pair.label()).changed() {
                        actions.push(Action::SetMatch(i, selected));
                    }
                }
            });
    }

    ui.separator();
    egui::ScrollArea::vertical()
        .id_source("match_json")
        .auto_shrink([false, false])
        .show(ui, |ui| {
            ui.monospace(text);
        });
}
