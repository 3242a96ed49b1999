//! Orbital 3D camera and mouse-drag control

use glam::{Mat4, Vec3};

/// Pitch limit, just short of the poles so `look_at` stays well defined
const MAX_PITCH: f32 = 1.5;

/// 3D perspective camera orbiting a target
#[derive(Debug, Clone)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
    // Orbital parameters
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl Camera3D {
    pub fn new(aspect_ratio: f32) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 60.0f32.to_radians(),
            aspect_ratio,
            near: 0.1,
            far: 100.0,
            distance: 3.0,
            yaw: 30.0f32.to_radians(),
            pitch: 30.0f32.to_radians(),
        };
        camera.update_orbital();
        camera
    }

    /// Update camera position based on orbital parameters
    pub fn update_orbital(&mut self) {
        self.position = self.target
            + Vec3::new(
                self.distance * self.pitch.cos() * self.yaw.sin(),
                self.distance * self.pitch.sin(),
                self.distance * self.pitch.cos() * self.yaw.cos(),
            );
    }

    /// Orbit the camera around the target
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-MAX_PITCH, MAX_PITCH);
        self.update_orbital();
    }

    /// Zoom in/out, never closer than `min_distance`
    pub fn zoom(&mut self, delta: f32, min_distance: f32) {
        self.distance = (self.distance - delta).max(min_distance);
        self.update_orbital();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn update_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }
}

/// Camera uniform data for shaders
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 4],
}

impl CameraUniform {
    pub fn from_camera_3d(camera: &Camera3D) -> Self {
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            position: [camera.position.x, camera.position.y, camera.position.z, camera.aspect_ratio],
        }
    }
}

/// Turns left-button drags into orbit deltas
#[derive(Debug, Clone)]
pub struct MouseOrbit {
    /// Radians per pixel of cursor travel
    pub sensitivity: f32,
    dragging: bool,
    last: Option<(f64, f64)>,
}

impl MouseOrbit {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            sensitivity,
            dragging: false,
            last: None,
        }
    }

    /// Button pressed or released
    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
        if !dragging {
            self.last = None;
        }
    }

    /// Cursor moved; returns `(delta_yaw, delta_pitch)` while dragging
    pub fn cursor_moved(&mut self, x: f64, y: f64) -> Option<(f32, f32)> {
        let previous = self.last.replace((x, y));
        if !self.dragging {
            return None;
        }
        let (px, py) = previous?;
        Some((
            -((x - px) as f32) * self.sensitivity,
            ((y - py) as f32) * self.sensitivity,
        ))
    }
}

impl Default for MouseOrbit {
    fn default() -> Self {
        // Half a degree per pixel
        Self::new(0.5f32.to_radians())
    }
}
