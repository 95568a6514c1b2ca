use nalgebra::{Point3, Vector3};
use rand::Rng;

use crate::engine::bounds::Aabb;
use crate::game::config::GameConfig;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
    pub position: Point3<f32>,
    pub active: bool,
}

impl Obstacle {
    pub fn bounds(&self, config: &GameConfig) -> Aabb {
        Aabb::from_center_size(
            self.position,
            Vector3::new(config.obstacle_width(), config.obstacle_height, config.obstacle_depth),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnAttempt {
    /// Accumulated distance has not reached the threshold yet.
    Waiting,
    Spawned(usize),
    /// Every slot is in use; the spawn was dropped.
    PoolExhausted,
}

/// Fixed set of obstacle slots reused by flipping `active`, plus the
/// distance-based spawner that fills them.
pub struct ObstaclePool {
    slots: Vec<Obstacle>,
    spawn_distance: f32,
    next_spawn: f32,
}

impl ObstaclePool {
    pub fn new(config: &GameConfig) -> Self {
        let idle = Obstacle {
            position: Point3::origin(),
            active: false,
        };
        ObstaclePool {
            slots: vec![idle; config.num_obstacles],
            spawn_distance: 0.0,
            next_spawn: config.first_spawn_distance,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[Obstacle] {
        &self.slots
    }

    pub fn active(&self) -> impl Iterator<Item = (usize, &Obstacle)> {
        self.slots.iter().enumerate().filter(|(_, o)| o.active)
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|o| o.active).count()
    }

    pub fn spawn_distance(&self) -> f32 {
        self.spawn_distance
    }

    pub fn next_spawn(&self) -> f32 {
        self.next_spawn
    }

    pub fn release(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.active = false;
        }
    }

    /// Place an obstacle in the first free slot. `lane` is -1, 0 or 1.
    pub fn spawn(&mut self, lane: i32, z: f32, config: &GameConfig) -> Option<usize> {
        let index = self.slots.iter().position(|o| !o.active)?;
        let slot = &mut self.slots[index];
        slot.position = Point3::new(lane as f32 * config.lane_width(), config.obstacle_spawn_y, z);
        slot.active = true;
        Some(index)
    }

    /// Move active obstacles toward the camera and retire the ones behind it.
    pub fn advance(&mut self, speed: f32, camera_z: f32, config: &GameConfig) {
        let delta = speed * config.scroll_factor;
        for obstacle in self.slots.iter_mut().filter(|o| o.active) {
            obstacle.position.z += delta;
            if obstacle.position.z > camera_z {
                obstacle.active = false;
            }
        }
    }

    /// Accumulate travelled distance and spawn one obstacle at `spawn_z` each
    /// time it passes the current threshold. The threshold is redrawn and the
    /// accumulator reset even when the pool is exhausted.
    pub fn update_spawner<R: Rng>(&mut self, speed: f32, spawn_z: f32, config: &GameConfig, rng: &mut R) -> SpawnAttempt {
        self.spawn_distance += speed * config.scroll_factor;
        if self.spawn_distance <= self.next_spawn {
            return SpawnAttempt::Waiting;
        }

        self.spawn_distance = 0.0;
        self.next_spawn = rng.gen_range(config.spawn_interval_min..config.spawn_interval_max);

        let lane = rng.gen_range(-1..=1);
        match self.spawn(lane, spawn_z, config) {
            Some(index) => SpawnAttempt::Spawned(index),
            None => {
                log::debug!("obstacle pool exhausted, spawn dropped");
                SpawnAttempt::PoolExhausted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_pool_starts_idle() {
        let cfg = GameConfig::default();
        let pool = ObstaclePool::new(&cfg);
        assert_eq!(pool.capacity(), 35);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.next_spawn(), 40.0);
    }

    #[test]
    fn test_spawn_uses_first_free_slot() {
        let cfg = GameConfig::default();
        let mut pool = ObstaclePool::new(&cfg);
        assert_eq!(pool.spawn(0, -400.0, &cfg), Some(0));
        assert_eq!(pool.spawn(1, -400.0, &cfg), Some(1));
        assert_eq!(pool.spawn(-1, -400.0, &cfg), Some(2));
        pool.release(1);
        assert_eq!(pool.spawn(0, -300.0, &cfg), Some(1));

        let slot = pool.slots()[2];
        assert_eq!(slot.position, Point3::new(-10.0, 3.0, -400.0));
    }

    #[test]
    fn test_obstacles_retire_behind_camera() {
        let cfg = GameConfig::default();
        let mut pool = ObstaclePool::new(&cfg);
        pool.spawn(0, 14.0, &cfg);
        pool.spawn(1, -100.0, &cfg);
        pool.advance(1.0, 15.0, &cfg);
        assert!(!pool.slots()[0].active);
        assert!(pool.slots()[1].active);
        assert_eq!(pool.slots()[1].position.z, -98.0);
    }

    #[test]
    fn test_obstacle_level_with_camera_stays_active() {
        let cfg = GameConfig::default();
        let mut pool = ObstaclePool::new(&cfg);
        pool.spawn(0, 13.0, &cfg);
        pool.advance(1.0, 15.0, &cfg);
        assert!(pool.slots()[0].active);
        assert_eq!(pool.slots()[0].position.z, 15.0);

        pool.advance(0.5, 15.0, &cfg);
        assert!(!pool.slots()[0].active);
        assert_eq!(pool.spawn(2, -50.0, &cfg), Some(0));
    }

    #[test]
    fn test_spawner_waits_for_threshold() {
        let cfg = GameConfig::default();
        let mut rng = SmallRng::seed_from_u64(7);
        let mut pool = ObstaclePool::new(&cfg);
        // 4 units per frame; first threshold is 40, spawn once exceeded
        for _ in 0..10 {
            assert_eq!(pool.update_spawner(2.0, -400.0, &cfg, &mut rng), SpawnAttempt::Waiting);
        }
        assert_eq!(pool.update_spawner(2.0, -400.0, &cfg, &mut rng), SpawnAttempt::Spawned(0));
        assert_eq!(pool.spawn_distance(), 0.0);
        assert!((50.0..150.0).contains(&pool.next_spawn()));

        let spawned = pool.slots()[0];
        assert!(spawned.active);
        assert_eq!(spawned.position.y, 3.0);
        assert_eq!(spawned.position.z, -400.0);
        assert!([-10.0, 0.0, 10.0].contains(&spawned.position.x));
    }

    #[test]
    fn test_stopped_car_never_spawns() {
        let cfg = GameConfig::default();
        let mut rng = SmallRng::seed_from_u64(8);
        let mut pool = ObstaclePool::new(&cfg);
        for _ in 0..1000 {
            assert_eq!(pool.update_spawner(0.0, -400.0, &cfg, &mut rng), SpawnAttempt::Waiting);
        }
    }

    #[test]
    fn test_exhausted_pool_drops_spawn_and_redraws() {
        let cfg = GameConfig::default();
        let mut rng = SmallRng::seed_from_u64(9);
        let mut pool = ObstaclePool::new(&cfg);
        for _ in 0..35 {
            assert!(pool.spawn(0, -400.0, &cfg).is_some());
        }
        assert_eq!(pool.active_count(), 35);

        let before: Vec<Obstacle> = pool.slots().to_vec();
        let mut attempt = SpawnAttempt::Waiting;
        while attempt == SpawnAttempt::Waiting {
            attempt = pool.update_spawner(2.0, -500.0, &cfg, &mut rng);
        }
        assert_eq!(attempt, SpawnAttempt::PoolExhausted);
        assert_eq!(pool.spawn_distance(), 0.0);
        assert!((50.0..150.0).contains(&pool.next_spawn()));
        assert_eq!(pool.slots(), &before[..]);
        assert_eq!(pool.capacity(), 35);
    }

    #[test]
    fn test_lanes_are_uniformly_used() {
        let cfg = GameConfig::default();
        let mut rng = SmallRng::seed_from_u64(10);
        let mut pool = ObstaclePool::new(&cfg);
        let mut seen = [0usize; 3];
        for _ in 0..3000 {
            if let SpawnAttempt::Spawned(index) = pool.update_spawner(2.0, -400.0, &cfg, &mut rng) {
                let lane = (pool.slots()[index].position.x / 10.0).round() as i32;
                seen[(lane + 1) as usize] += 1;
                pool.release(index);
            }
        }
        assert!(seen.iter().all(|&n| n > 0), "lanes seen: {:?}", seen);
    }

    #[test]
    fn test_bounds_match_obstacle_box() {
        let cfg = GameConfig::default();
        let obstacle = Obstacle { position: Point3::new(10.0, 3.0, -50.0), active: true };
        let bounds = obstacle.bounds(&cfg);
        assert_eq!(bounds.min, Point3::new(6.0, 1.0, -51.0));
        assert_eq!(bounds.max, Point3::new(14.0, 5.0, -49.0));
    }
}
