//! Bloch sphere scene geometry
//!
//! Physics coordinates put |0⟩ on +z. The renderer is Y-up, so a Bloch vector
//! (x, y, z) is drawn at (x, z, -y).

use crate::qubit::Measurement;
use crate::session::ChannelTelemetry;
use glam::{Mat4, Vec2, Vec3};
use std::f32::consts::{PI, TAU};

/// Line segment with a color
pub type Line = (Vec3, Vec3, [f32; 4]);

/// Billboard marker: position, radius, color
pub type Marker = (Vec3, f32, [f32; 4]);

pub const SPHERE_COLOR: [f32; 4] = [0.45, 0.45, 0.55, 0.35];
pub const X_AXIS_COLOR: [f32; 4] = [1.0, 0.3, 0.3, 1.0];
pub const Y_AXIS_COLOR: [f32; 4] = [0.3, 1.0, 0.3, 1.0];
pub const Z_AXIS_COLOR: [f32; 4] = [0.3, 0.5, 1.0, 1.0];
pub const COLLAPSED_COLOR: [f32; 4] = [1.0, 0.6, 0.1, 1.0];

/// Per-qubit arrow colors, cycled by qubit index
const QUBIT_PALETTE: [[f32; 4]; 4] = [
    [0.2, 0.4, 1.0, 1.0],
    [0.9, 0.3, 0.9, 1.0],
    [0.2, 0.9, 0.9, 1.0],
    [0.95, 0.95, 0.3, 1.0],
];

/// Basis-state labels past the ends of each axis, in physics coordinates
pub const BASIS_LABELS: [(&str, [f64; 3]); 6] = [
    ("|0⟩", [0.0, 0.0, 1.3]),
    ("|1⟩", [0.0, 0.0, -1.4]),
    ("|+⟩", [1.3, 0.0, 0.0]),
    ("|-⟩", [-1.4, 0.0, 0.0]),
    ("|+i⟩", [0.0, 1.3, 0.0]),
    ("|-i⟩", [0.0, -1.4, 0.0]),
];

/// Map a physics Bloch vector into render space
pub fn to_render(x: f64, y: f64, z: f64) -> Vec3 {
    Vec3::new(x as f32, z as f32, -(y as f32))
}

pub fn qubit_color(index: u32) -> [f32; 4] {
    QUBIT_PALETTE[index as usize % QUBIT_PALETTE.len()]
}

/// Unit-sphere wireframe: `latitudes` circles of constant polar angle plus
/// `longitudes` meridians, each circle split into `segments` lines
pub fn sphere_wireframe(latitudes: usize, longitudes: usize, segments: usize) -> Vec<Line> {
    let segments = segments.max(3);
    let mut lines = Vec::with_capacity((latitudes + longitudes) * segments);

    for i in 1..=latitudes {
        let polar = PI * i as f32 / (latitudes + 1) as f32;
        let (ring, height) = (polar.sin(), polar.cos());
        for s in 0..segments {
            let a0 = TAU * s as f32 / segments as f32;
            let a1 = TAU * (s + 1) as f32 / segments as f32;
            lines.push((
                Vec3::new(ring * a0.cos(), height, ring * a0.sin()),
                Vec3::new(ring * a1.cos(), height, ring * a1.sin()),
                SPHERE_COLOR,
            ));
        }
    }

    for j in 0..longitudes {
        let azimuth = PI * j as f32 / longitudes as f32;
        let (ca, sa) = (azimuth.cos(), azimuth.sin());
        for s in 0..segments {
            let t0 = TAU * s as f32 / segments as f32;
            let t1 = TAU * (s + 1) as f32 / segments as f32;
            lines.push((
                Vec3::new(t0.sin() * ca, t0.cos(), t0.sin() * sa),
                Vec3::new(t1.sin() * ca, t1.cos(), t1.sin() * sa),
                SPHERE_COLOR,
            ));
        }
    }

    lines
}

/// The x, y, z Bloch axes, slightly longer than the sphere
pub fn axes(length: f32) -> Vec<Line> {
    [
        (to_render(1.0, 0.0, 0.0), X_AXIS_COLOR),
        (to_render(0.0, 1.0, 0.0), Y_AXIS_COLOR),
        (to_render(0.0, 0.0, 1.0), Z_AXIS_COLOR),
    ]
    .into_iter()
    .map(|(dir, color)| (-dir * length, dir * length, color))
    .collect()
}

/// Markers on the |0⟩ and |1⟩ poles
pub fn pole_markers() -> Vec<Marker> {
    vec![
        (to_render(0.0, 0.0, 1.0), 0.03, Z_AXIS_COLOR),
        (to_render(0.0, 0.0, -1.0), 0.03, Z_AXIS_COLOR),
    ]
}

/// Basis labels with their render-space anchors
pub fn basis_labels() -> impl Iterator<Item = (&'static str, Vec3)> {
    BASIS_LABELS
        .iter()
        .map(|&(label, [x, y, z])| (label, to_render(x, y, z)))
}

/// Screen position (top-left origin) of a render-space point, or `None`
/// when it lies behind the camera
pub fn project_to_screen(view_proj: Mat4, point: Vec3, width: f32, height: f32) -> Option<Vec2> {
    let clip = view_proj * point.extend(1.0);
    if clip.w <= f32::EPSILON {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    Some(Vec2::new(
        (ndc.x + 1.0) * 0.5 * width,
        (1.0 - ndc.y) * 0.5 * height,
    ))
}

/// Arrow from the origin to the qubit's Bloch vector, plus its tip marker
pub fn state_arrow(telemetry: &ChannelTelemetry) -> (Line, Marker) {
    let (x, y, z) = telemetry.bloch;
    let tip = to_render(x, y, z);
    let color = match telemetry.measured {
        Measurement::Unmeasured => qubit_color(telemetry.index),
        _ => COLLAPSED_COLOR,
    };
    ((Vec3::ZERO, tip, color), (tip, 0.05, color))
}

/// Everything drawn in one frame
#[derive(Debug, Default, Clone)]
pub struct BlochScene {
    pub lines: Vec<Line>,
    pub markers: Vec<Marker>,
}

impl BlochScene {
    /// Static sphere and axes with one arrow per qubit
    pub fn build(wireframe: &[Line], telemetry: &[ChannelTelemetry]) -> Self {
        let mut lines = wireframe.to_vec();
        lines.extend(axes(1.25));
        let mut markers = pole_markers();
        for t in telemetry {
            let (line, marker) = state_arrow(t);
            lines.push(line);
            markers.push(marker);
        }
        Self { lines, markers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;

    #[test]
    fn wireframe_lies_on_unit_sphere() {
        let lines = sphere_wireframe(5, 6, 24);
        assert_eq!(lines.len(), (5 + 6) * 24);
        for (a, b, _) in &lines {
            assert!((a.length() - 1.0).abs() < 1e-5);
            assert!((b.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn ground_state_points_up() {
        assert_eq!(to_render(0.0, 0.0, 1.0), Vec3::Y);
        assert_eq!(to_render(1.0, 0.0, 0.0), Vec3::X);
        assert_eq!(to_render(0.0, 1.0, 0.0), Vec3::NEG_Z);
    }

    #[test]
    fn basis_labels_sit_past_the_axes() {
        let labels: Vec<_> = basis_labels().collect();
        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0], ("|0⟩", Vec3::new(0.0, 1.3, 0.0)));
        assert_eq!(labels[1].1, Vec3::new(0.0, -1.4, 0.0));
        for (_, anchor) in &labels {
            assert!(anchor.length() > 1.25);
        }
    }

    #[test]
    fn projection_places_labels_on_screen() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y);
        let view_proj = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 100.0) * view;

        let center = project_to_screen(view_proj, Vec3::ZERO, 800.0, 600.0).unwrap();
        assert!((center - Vec2::new(400.0, 300.0)).length() < 1e-3);

        // |0⟩ is up on screen, |+⟩ to the right
        let zero = project_to_screen(view_proj, to_render(0.0, 0.0, 1.3), 800.0, 600.0).unwrap();
        assert!(zero.y < 300.0);
        let plus = project_to_screen(view_proj, to_render(1.3, 0.0, 0.0), 800.0, 600.0).unwrap();
        assert!(plus.x > 400.0);

        assert_eq!(project_to_screen(view_proj, Vec3::new(0.0, 0.0, 5.0), 800.0, 600.0), None);
    }

    #[test]
    fn scene_has_one_arrow_per_qubit() {
        let mut session = Session::new(Some(8));
        session.add_channel(20.0, 0.05);
        session.add_channel(17.0, 0.05);
        session.measure(1).unwrap();

        let wireframe = sphere_wireframe(3, 4, 12);
        let scene = BlochScene::build(&wireframe, &session.telemetry());
        assert_eq!(scene.lines.len(), wireframe.len() + 3 + 2);
        assert_eq!(scene.markers.len(), 2 + 2);

        let (arrow, tip) = state_arrow(&session.telemetry()[0]);
        assert!((arrow.1.length() - 1.0).abs() < 1e-5);
        assert_eq!(tip.2, qubit_color(0));

        let (collapsed, _) = state_arrow(&session.telemetry()[1]);
        assert_eq!(collapsed.2, COLLAPSED_COLOR);
        assert!((collapsed.1.y.abs() - 1.0).abs() < 1e-6);
    }
}
