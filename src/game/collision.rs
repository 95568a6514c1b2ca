use crate::engine::bounds::Aabb;
use crate::game::config::GameConfig;
use crate::game::obstacles::ObstaclePool;

/// Deactivate every active obstacle overlapping `vehicle` and return how many
/// were hit. A hit obstacle is released immediately, so it cannot be counted
/// again on a later frame.
pub fn resolve_hits(vehicle: &Aabb, obstacles: &mut ObstaclePool, config: &GameConfig) -> u32 {
    let hits: Vec<usize> = obstacles
        .active()
        .filter(|(_, o)| vehicle.intersects(&o.bounds(config)))
        .map(|(index, _)| index)
        .collect();

    for &index in &hits {
        log::debug!("hit obstacle {}", index);
        obstacles.release(index);
    }
    hits.len() as u32
}
