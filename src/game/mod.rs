pub mod camera;
pub mod collision;
pub mod config;
pub mod input;
pub mod obstacles;
pub mod scheduler;
pub mod state;
pub mod vehicle;
pub mod view;
pub mod world;

use nalgebra::Point3;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::game::camera::Camera;
use crate::game::collision::resolve_hits;
use crate::game::config::GameConfig;
use crate::game::input::InputState;
use crate::game::obstacles::ObstaclePool;
use crate::game::state::GameState;
use crate::game::vehicle::{Vehicle, VehicleModel};
use crate::game::world::World;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Car model missing; nothing was touched.
    NotLoaded,
    Advanced { hits: u32 },
    GameOver,
}

/// Everything that changes while a game is played.
pub struct GameSession {
    pub config: GameConfig,
    pub input: InputState,
    pub vehicle: Vehicle,
    pub world: World,
    pub obstacles: ObstaclePool,
    pub state: GameState,
    pub camera: Camera,
    rng: SmallRng,
}

impl GameSession {
    pub fn new(config: GameConfig, aspect: f32) -> Self {
        Self::with_rng(config, aspect, SmallRng::from_entropy())
    }

    pub fn with_seed(config: GameConfig, aspect: f32, seed: u64) -> Self {
        Self::with_rng(config, aspect, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, aspect: f32, rng: SmallRng) -> Self {
        GameSession {
            input: InputState::default(),
            vehicle: Vehicle::new(&config),
            world: World::new(&config),
            obstacles: ObstaclePool::new(&config),
            state: GameState::new(config.starting_lives),
            camera: Camera::new(&config, aspect),
            config,
            rng,
        }
    }

    pub fn attach_vehicle_model(&mut self, model: VehicleModel) {
        self.vehicle.model = Some(model);
    }

    /// Place the roadside trees; called when the tree model arrives.
    pub fn populate_trees(&mut self) {
        self.world.populate_trees(&self.config, &mut self.rng);
    }

    pub fn handle_key(&mut self, key: &str, pressed: bool) -> bool {
        self.input.handle_key(key, pressed)
    }

    /// Advance one frame: drive, scroll the world, spawn, collide, follow.
    pub fn step(&mut self) -> StepOutcome {
        if !self.vehicle.is_loaded() {
            return StepOutcome::NotLoaded;
        }
        if self.state.over {
            return StepOutcome::GameOver;
        }

        let cfg = &self.config;
        self.vehicle.update(&self.input, cfg);
        let speed = self.vehicle.speed;
        self.state.add_distance(speed * cfg.distance_factor);

        let camera_z = self.camera.position.z;
        self.world.advance(speed, camera_z, cfg, &mut self.rng);

        self.obstacles.advance(speed, camera_z, cfg);
        let spawn_z = self.world.tail_z() - cfg.segment_length;
        self.obstacles.update_spawner(speed, spawn_z, cfg, &mut self.rng);

        let hits = match self.vehicle.bounds() {
            Some(car) => resolve_hits(&car, &mut self.obstacles, cfg),
            None => 0,
        };

        self.camera.follow(Point3::new(self.vehicle.x, self.vehicle.y, 0.0));

        if self.state.lose_lives(hits) {
            return StepOutcome::GameOver;
        }
        StepOutcome::Advanced { hits }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mesh::Mesh;
    use crate::game::config::ModelConfig;

    fn session(seed: u64) -> GameSession {
        let mut session = GameSession::with_seed(GameConfig::default(), 1.0, seed);
        let model = VehicleModel::new(Mesh::cube(2.0, 1.0, 1.0, 1.0), &ModelConfig::default()).unwrap();
        session.attach_vehicle_model(model);
        session
    }

    #[test]
    fn test_unloaded_session_is_frozen() {
        let mut session = GameSession::with_seed(GameConfig::default(), 1.0, 1);
        session.input.forward = true;
        assert_eq!(session.step(), StepOutcome::NotLoaded);
        assert_eq!(session.vehicle.speed, 0.0);
        assert_eq!(session.world.head_z(), 0.0);
        assert_eq!(session.state.distance, 0.0);
    }

    #[test]
    fn test_hud_shows_configured_lives_before_model_loads() {
        let cfg = GameConfig { starting_lives: 5, ..GameConfig::default() };
        let mut session = GameSession::with_seed(cfg, 1.0, 1);
        assert_eq!(session.step(), StepOutcome::NotLoaded);
        let hud = session.state.hud(session.vehicle.speed);
        assert_eq!(hud.lives, 5);
        assert_eq!(hud.distance, 0);
        assert!(!hud.game_over);
    }

    #[test]
    fn test_distance_grows_while_driving_forward() {
        let mut s = session(2);
        s.input.forward = true;
        let mut last = 0.0;
        for _ in 0..300 {
            s.step();
            assert!(s.state.distance >= last);
            last = s.state.distance;
        }
        assert!(s.state.distance > 0.0);
    }

    #[test]
    fn test_long_drive_keeps_invariants() {
        let mut s = session(3);
        s.state.lives = u32::MAX;
        s.input.forward = true;
        for frame in 0..20_000u32 {
            s.input.left = frame % 700 < 200;
            s.input.right = frame % 700 > 500;
            s.step();
            assert!((-0.2..=2.0).contains(&s.vehicle.speed));
            assert!((-0.7..=0.7).contains(&s.vehicle.steering));
            assert!(s.vehicle.x.abs() <= 15.0);
            assert_eq!(s.obstacles.capacity(), 35);
            assert!(s.obstacles.active_count() <= 35);
            assert_eq!(s.world.road.len(), 20);
        }
        let road: Vec<f32> = s.world.road.iter().map(|seg| seg.z).collect();
        for pair in road.windows(2) {
            assert!((pair[0] - pair[1] - 20.0).abs() < 1e-2);
        }
    }

    #[test]
    fn test_spawned_obstacles_appear_at_far_edge() {
        let mut s = session(4);
        s.input.forward = true;
        let mut spawned = 0;
        for _ in 0..200 {
            let idle: Vec<bool> = s.obstacles.slots().iter().map(|o| !o.active).collect();
            s.step();
            let spawn_z = s.world.tail_z() - s.config.segment_length;
            for (i, o) in s.obstacles.active() {
                if idle[i] {
                    assert_eq!(o.position.z, spawn_z);
                    assert_eq!(o.position.y, 3.0);
                    assert!([-10.0, 0.0, 10.0].contains(&o.position.x));
                    spawned += 1;
                }
            }
        }
        assert!(spawned > 0);
    }

    #[test]
    fn test_collision_costs_one_life_per_obstacle() {
        let mut s = session(5);
        s.obstacles.spawn(0, 0.0, &s.config);
        assert_eq!(s.step(), StepOutcome::Advanced { hits: 1 });
        assert_eq!(s.state.lives, 2);
        // Car is still in the same place, the obstacle is gone
        assert_eq!(s.step(), StepOutcome::Advanced { hits: 0 });
        assert_eq!(s.state.lives, 2);
    }

    #[test]
    fn test_double_hit_on_last_lives_ends_game() {
        let mut s = session(6);
        s.state.lives = 2;
        s.obstacles.spawn(0, 0.5, &s.config);
        s.obstacles.spawn(0, -0.5, &s.config);
        assert_eq!(s.step(), StepOutcome::GameOver);
        assert_eq!(s.state.lives, 0);
        assert!(s.state.over);
        assert_eq!(s.obstacles.active_count(), 0);
        assert_eq!(s.step(), StepOutcome::GameOver);
    }

    #[test]
    fn test_camera_tracks_car() {
        let mut s = session(7);
        s.input.forward = true;
        s.input.right = true;
        for _ in 0..60 {
            s.step();
        }
        assert!(s.vehicle.x > 0.0);
        assert_eq!(s.camera.position.x, s.vehicle.x);
        assert_eq!(s.camera.target.x, s.vehicle.x);
        assert_eq!(s.camera.position.z, 15.0);
    }
}
