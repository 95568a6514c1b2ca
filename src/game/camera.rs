use nalgebra::{Matrix4, Perspective3, Point3, Vector3};

use crate::game::config::GameConfig;

pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub aspect: f32,
    fov_y: f32,
    near: f32,
    far: f32,
}

impl Camera {
    pub fn new(config: &GameConfig, aspect: f32) -> Self {
        Camera {
            position: Point3::new(0.0, config.camera_height, config.camera_distance),
            target: Point3::new(0.0, config.vehicle_y, 0.0),
            aspect,
            fov_y: config.camera_fov_degrees.to_radians(),
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Track the car sideways and keep it centered in view.
    pub fn follow(&mut self, target: Point3<f32>) {
        self.position.x = target.x;
        self.target = target;
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &Vector3::y())
    }

    pub fn projection(&self) -> Matrix4<f32> {
        Perspective3::new(self.aspect, self.fov_y, self.near, self.far).to_homogeneous()
    }
}
