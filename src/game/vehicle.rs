use nalgebra::{Matrix4, Vector3};

use crate::engine::bounds::Aabb;
use crate::engine::mesh::Mesh;
use crate::game::config::{GameConfig, ModelConfig};
use crate::game::input::InputState;

/// Loaded car model plus the transform it needs to sit upright on the road.
pub struct VehicleModel {
    pub mesh: Mesh,
    local_bounds: Aabb,
    scale: f32,
    rotation_offset: (f32, f32, f32),
    position_offset_y: f32,
}

impl VehicleModel {
    /// Returns `None` for a mesh without vertices.
    pub fn new(mut mesh: Mesh, config: &ModelConfig) -> Option<Self> {
        if let Some([r, g, b]) = config.color {
            mesh.tint(r, g, b);
        }
        let local_bounds = mesh.bounds()?;
        Some(VehicleModel {
            mesh,
            local_bounds,
            scale: config.scale,
            rotation_offset: (config.rotation_offset_x, config.rotation_offset_y, config.rotation_offset_z),
            position_offset_y: config.position_offset_y,
        })
    }

    fn local_transform(&self) -> Matrix4<f32> {
        let (rx, ry, rz) = self.rotation_offset;
        Matrix4::new_translation(&Vector3::new(0.0, self.position_offset_y, 0.0))
            * Matrix4::from_euler_angles(rx, ry, rz)
            * Matrix4::new_scaling(self.scale)
    }
}

pub struct Vehicle {
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    pub steering: f32,
    pub heading: f32,
    /// `None` until the car model has loaded; the frame loop idles until then.
    pub model: Option<VehicleModel>,
}

impl Vehicle {
    pub fn new(config: &GameConfig) -> Self {
        Vehicle {
            x: 0.0,
            y: config.vehicle_y,
            speed: 0.0,
            steering: 0.0,
            heading: 0.0,
            model: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn update(&mut self, input: &InputState, config: &GameConfig) {
        self.speed = next_speed(self.speed, input, config);
        self.steering = next_steering(self.steering, input, config);
        self.heading = -self.steering;

        self.x += self.steering * self.speed * config.lateral_factor;

        // Snap to the edge but keep speed and steering so the car can scrape along it
        let limit = config.half_road_width();
        if self.x.abs() > limit {
            self.x = limit * self.x.signum();
        }
    }

    pub fn transform(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(self.x, self.y, 0.0))
            * Matrix4::from_euler_angles(0.0, self.heading, 0.0)
    }

    /// World transform of the car mesh, if loaded.
    pub fn model_transform(&self) -> Option<Matrix4<f32>> {
        let model = self.model.as_ref()?;
        Some(self.transform() * model.local_transform())
    }

    /// World-space bounding box of the car mesh, if loaded.
    pub fn bounds(&self) -> Option<Aabb> {
        let transform = self.model_transform()?;
        Some(self.model.as_ref()?.local_bounds.transformed(&transform))
    }
}

fn next_speed(speed: f32, input: &InputState, config: &GameConfig) -> f32 {
    if input.forward {
        (speed + config.acceleration).min(config.max_speed)
    } else if input.back {
        (speed - config.braking).max(config.min_speed)
    } else {
        approach_zero(speed, config.speed_decay)
    }
}

fn next_steering(steering: f32, input: &InputState, config: &GameConfig) -> f32 {
    if input.right {
        (steering + config.steering_rate).min(config.max_steering)
    } else if input.left {
        (steering - config.steering_rate).max(-config.max_steering)
    } else {
        approach_zero(steering, config.steering_decay)
    }
}

fn approach_zero(value: f32, step: f32) -> f32 {
    if value > 0.0 {
        (value - step).max(0.0)
    } else if value < 0.0 {
        (value + step).min(0.0)
    } else {
        0.0
    }
}
