//! Equations and telemetry sidebar
//!
//! egui side panel with the Rabi model's equations and the live state of
//! every driven qubit.

use crate::bloch::{basis_labels, project_to_screen};
use crate::qubit::Measurement;
use crate::session::ChannelTelemetry;
use egui::{Align2, Color32, Context, FontFamily, FontId, LayerId, RichText};
use glam::Mat4;

/// Equation entry with label and formula
pub struct Equation {
    pub name: &'static str,
    pub formula: &'static str,
    pub description: &'static str,
}

pub const RABI_EQUATIONS: &[Equation] = &[
    Equation {
        name: "Qubit State",
        formula: "|ψ⟩ = α|0⟩ + β|1⟩",
        description: "|α|² + |β|² = 1 while unmeasured",
    },
    Equation {
        name: "Drive Strength",
        formula: "Ω = 2π · f_max · b",
        description: "b = brightness ratio in [0, 1]",
    },
    Equation {
        name: "Effective Hamiltonian",
        formula: "H = (Ω σx + Δ σz) / 2",
        description: "Held constant over one timestep",
    },
    Equation {
        name: "Step Propagator",
        formula: "U = cos θ − i sin θ (n·σ)",
        description: "θ = dt·√(Ω²+Δ²)/2, n = (Ω, 0, Δ)/√(Ω²+Δ²)",
    },
    Equation {
        name: "Born Rule",
        formula: "P(0) = |α|²,  P(1) = |β|²",
        description: "Measurement collapses to |0⟩ or |1⟩",
    },
];

pub const RABI_VARIABLES: &[(&str, &str)] = &[
    ("α, β", "Complex amplitudes"),
    ("Ω", "Angular Rabi frequency"),
    ("Δ", "Fixed detuning"),
    ("f_max", "Maximum drive frequency"),
    ("b", "Camera brightness ratio"),
    ("dt", "Timestep per frame"),
];

/// Draw the sidebar: per-qubit telemetry, then equations and variables
pub fn draw_telemetry_sidebar(
    ctx: &Context,
    title: &str,
    brightness: f64,
    telemetry: &[ChannelTelemetry],
) {
    egui::SidePanel::right("telemetry_panel")
        .min_width(280.0)
        .max_width(360.0)
        .resizable(true)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading(RichText::new(title).color(Color32::from_rgb(100, 200, 255)));
                });

                ui.add_space(10.0);
                ui.label(
                    RichText::new(format!("Brightness: {:.1}%", brightness * 100.0))
                        .color(Color32::WHITE),
                );
                ui.separator();

                for t in telemetry {
                    draw_qubit(ui, t);
                    ui.add_space(6.0);
                }

                ui.separator();
                ui.label(RichText::new("Equations").strong().color(Color32::from_rgb(255, 200, 100)));
                ui.add_space(5.0);
                for eq in RABI_EQUATIONS {
                    draw_equation(ui, eq);
                    ui.add_space(8.0);
                }

                ui.separator();
                ui.label(RichText::new("Variables").strong().color(Color32::from_rgb(255, 200, 100)));
                ui.add_space(5.0);
                for (symbol, meaning) in RABI_VARIABLES {
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(*symbol)
                                .color(Color32::from_rgb(150, 255, 150))
                                .font(FontId::new(14.0, FontFamily::Monospace)),
                        );
                        ui.label(RichText::new("=").color(Color32::GRAY));
                        ui.label(RichText::new(*meaning).color(Color32::LIGHT_GRAY));
                    });
                }
            });
        });
}

/// Label the six basis directions at their projected screen positions,
/// behind every panel
pub fn draw_basis_labels(ctx: &Context, view_proj: Mat4) {
    let screen = ctx.screen_rect();
    let painter = ctx.layer_painter(LayerId::background());
    for (label, anchor) in basis_labels() {
        if let Some(pos) = project_to_screen(view_proj, anchor, screen.width(), screen.height()) {
            painter.text(
                screen.min + egui::vec2(pos.x, pos.y),
                Align2::CENTER_CENTER,
                label,
                FontId::proportional(16.0),
                Color32::WHITE,
            );
        }
    }
}

/// Status line for a qubit's measurement state
pub fn status_text(measured: Measurement) -> &'static str {
    match measured {
        Measurement::Unmeasured => "driving",
        Measurement::Collapsed0 => "collapsed to |0⟩",
        Measurement::Collapsed1 => "collapsed to |1⟩",
    }
}

fn draw_qubit(ui: &mut egui::Ui, t: &ChannelTelemetry) {
    let mono = FontId::new(13.0, FontFamily::Monospace);
    ui.group(|ui| {
        ui.label(RichText::new(format!("Qubit #{}", t.index)).strong().color(Color32::WHITE));
        ui.label(RichText::new(format!("α = {}", t.alpha)).font(mono.clone()));
        ui.label(RichText::new(format!("β = {}", t.beta)).font(mono.clone()));
        ui.label(
            RichText::new(format!(
                "P(0) = {:.3}   P(1) = {:.3}",
                t.alpha.norm_sq(),
                t.beta.norm_sq()
            ))
            .font(mono.clone()),
        );
        ui.label(RichText::new(format!("Rabi freq = {:.3} MHz", t.frequency)).font(mono.clone()));
        ui.label(RichText::new(format!("t = {:.3}", t.elapsed_time)).font(mono));
        let color = match t.measured {
            Measurement::Unmeasured => Color32::from_rgb(150, 255, 150),
            _ => Color32::from_rgb(255, 160, 40),
        };
        ui.label(RichText::new(status_text(t.measured)).small().color(color));
    });
}

fn draw_equation(ui: &mut egui::Ui, eq: &Equation) {
    ui.group(|ui| {
        ui.label(RichText::new(eq.name).strong().color(Color32::WHITE));
        ui.label(
            RichText::new(eq.formula)
                .font(FontId::new(16.0, FontFamily::Monospace))
                .color(Color32::from_rgb(200, 220, 255)),
        );
        ui.label(RichText::new(eq.description).small().color(Color32::GRAY));
    });
}
