use nalgebra::{Matrix4, Vector3};
use web_sys::WebGlTexture;

use crate::engine::mesh::Mesh;
use crate::engine::renderer::Renderer;
use crate::game::config::{AppConfig, ModelConfig};
use crate::game::GameSession;

const SKY_COLOR: (f32, f32, f32) = (0.529, 0.808, 0.922);
const FOG_NEAR: f32 = 50.0;
const FOG_FAR: f32 = 200.0;

const ROAD_COLOR: (f32, f32, f32) = (0.1, 0.1, 0.1);
const DASH_LENGTH: f32 = 4.0;
const DASH_GAP: f32 = 2.0;
const LINE_THICKNESS: f32 = 0.2;
const GROUND_WIDTH: f32 = 500.0;
const GROUND_Y: f32 = -0.1;
const GRASS_REPEAT: f32 = 10.0;

/// A loaded decoration mesh with its fixed scale and orientation.
pub struct PropModel {
    mesh: Mesh,
    local: Matrix4<f32>,
}

impl PropModel {
    pub fn new(mut mesh: Mesh, config: &ModelConfig) -> Self {
        if let Some([r, g, b]) = config.color {
            mesh.tint(r, g, b);
        }
        let local = Matrix4::new_translation(&Vector3::new(0.0, config.position_offset_y, 0.0))
            * Matrix4::from_euler_angles(config.rotation_offset_x, config.rotation_offset_y, config.rotation_offset_z)
            * Matrix4::new_scaling(config.scale);
        PropModel { mesh, local }
    }
}

/// Draws a `GameSession` with WebGL. Holds only GPU-side resources; all
/// positions come from the session each frame.
pub struct SceneView {
    renderer: Renderer,
    ground_mesh: Mesh,
    obstacle_mesh: Mesh,
    grass_texture: Option<WebGlTexture>,
    obstacle_texture: Option<WebGlTexture>,
    tree_model: Option<PropModel>,
}

impl SceneView {
    pub fn new(renderer: Renderer, config: &AppConfig) -> Self {
        let grass_texture = renderer.create_texture(&config.grass_texture)
            .map_err(|e| log::warn!("grass texture unavailable: {:?}", e))
            .ok();
        let obstacle_texture = renderer.create_texture(&config.obstacle_texture)
            .map_err(|e| log::warn!("obstacle texture unavailable: {:?}", e))
            .ok();

        SceneView {
            renderer,
            ground_mesh: Mesh::plane(GRASS_REPEAT, GRASS_REPEAT),
            obstacle_mesh: Mesh::cube(1.0, 1.0, 1.0, 1.0),
            grass_texture,
            obstacle_texture,
            tree_model: None,
        }
    }

    pub fn set_tree_model(&mut self, model: PropModel) {
        self.tree_model = Some(model);
    }

    pub fn resize(&self, width: u32, height: u32) {
        if let Some(canvas) = self.renderer.canvas() {
            canvas.set_width(width);
            canvas.set_height(height);
        }
        self.renderer.resize(width as i32, height as i32);
    }

    pub fn render(&self, session: &GameSession) {
        let cfg = &session.config;

        self.renderer.clear(SKY_COLOR.0, SKY_COLOR.1, SKY_COLOR.2);
        self.renderer.set_fog(SKY_COLOR, FOG_NEAR, FOG_FAR);
        self.renderer.enable_depth_test();

        let projection = session.camera.projection();
        let view = session.camera.view();

        for ground in &session.world.ground {
            let model = Matrix4::new_translation(&Vector3::new(0.0, GROUND_Y, ground.z))
                * Matrix4::new_nonuniform_scaling(&Vector3::new(GROUND_WIDTH, 1.0, cfg.segment_length));
            self.renderer.draw_mesh(&self.ground_mesh, &model, &projection, &view, self.grass_texture.as_ref());
        }

        let dashes = (cfg.segment_length / (DASH_LENGTH + DASH_GAP)).floor() as usize;
        let line_x = cfg.road_width / 6.0;
        for segment in &session.world.road {
            self.renderer.draw_cube(
                0.0, -0.01, segment.z,
                cfg.road_width, 0.02, cfg.segment_length,
                ROAD_COLOR.0, ROAD_COLOR.1, ROAD_COLOR.2,
                &projection, &view
            );
            for j in 0..dashes {
                let z = segment.z - cfg.segment_length / 2.0 + j as f32 * (DASH_LENGTH + DASH_GAP) + DASH_LENGTH / 2.0;
                for x in [-line_x, line_x] {
                    self.renderer.draw_cube(
                        x, 0.01, z,
                        LINE_THICKNESS, 0.01, DASH_LENGTH,
                        1.0, 1.0, 1.0,
                        &projection, &view
                    );
                }
            }
        }

        if let Some(tree) = &self.tree_model {
            for prop in &session.world.trees {
                let model = Matrix4::new_translation(&Vector3::new(prop.x, 0.0, prop.z)) * tree.local;
                self.renderer.draw_mesh(&tree.mesh, &model, &projection, &view, None);
            }
        }

        let size = Vector3::new(cfg.obstacle_width(), cfg.obstacle_height, cfg.obstacle_depth);
        for (_, obstacle) in session.obstacles.active() {
            let model = Matrix4::new_translation(&obstacle.position.coords)
                * Matrix4::new_nonuniform_scaling(&size);
            self.renderer.draw_mesh(&self.obstacle_mesh, &model, &projection, &view, self.obstacle_texture.as_ref());
        }

        if let (Some(car), Some(model)) = (&session.vehicle.model, session.vehicle.model_transform()) {
            self.renderer.draw_mesh(&car.mesh, &model, &projection, &view, None);
        }
    }
}
