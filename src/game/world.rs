use std::collections::VecDeque;

use rand::Rng;

use crate::game::config::GameConfig;

/// One tile of road or ground, positioned along the travel axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub z: f32,
}

/// Roadside decoration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prop {
    pub x: f32,
    pub z: f32,
}

/// Ring buffers of road, ground and trees. The head of each ring is the
/// segment closest to the camera; the tail is the farthest ahead.
pub struct World {
    pub road: VecDeque<Segment>,
    pub ground: VecDeque<Segment>,
    pub trees: VecDeque<Prop>,
}

impl World {
    pub fn new(config: &GameConfig) -> Self {
        let segments: VecDeque<Segment> = (0..config.num_segments)
            .map(|i| Segment { z: i as f32 * -config.segment_length })
            .collect();
        World {
            road: segments.clone(),
            ground: segments,
            trees: VecDeque::with_capacity(config.tree_count()),
        }
    }

    pub fn head_z(&self) -> f32 {
        self.road.front().map_or(0.0, |s| s.z)
    }

    pub fn tail_z(&self) -> f32 {
        self.road.back().map_or(0.0, |s| s.z)
    }

    pub fn has_trees(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Fill the tree ring once the tree model is available. Tree `i` belongs
    /// to segment `i / trees_per_segment`. Does nothing if already populated.
    pub fn populate_trees<R: Rng>(&mut self, config: &GameConfig, rng: &mut R) {
        if self.has_trees() {
            return;
        }
        for i in 0..config.tree_count() {
            let segment = self.road[i / config.trees_per_segment];
            self.trees.push_back(place_tree(segment.z, config, rng));
        }
    }

    /// Scroll everything toward the camera and recycle the head segment once
    /// it has passed behind it. At most one segment recycles per call.
    /// Returns the new tail position when a recycle happened.
    pub fn advance<R: Rng>(&mut self, speed: f32, camera_z: f32, config: &GameConfig, rng: &mut R) -> Option<f32> {
        let delta = speed * config.scroll_factor;
        for segment in self.road.iter_mut().chain(self.ground.iter_mut()) {
            segment.z += delta;
        }
        for tree in self.trees.iter_mut() {
            tree.z += delta;
        }

        if self.head_z() <= camera_z {
            return None;
        }

        let new_z = self.tail_z() - config.segment_length;
        rotate_to_back(&mut self.road, new_z);
        rotate_to_back(&mut self.ground, new_z);

        if self.has_trees() {
            for _ in 0..config.trees_per_segment {
                if self.trees.pop_front().is_some() {
                    self.trees.push_back(place_tree(new_z, config, rng));
                }
            }
        }

        Some(new_z)
    }
}

fn rotate_to_back(ring: &mut VecDeque<Segment>, z: f32) {
    if let Some(mut segment) = ring.pop_front() {
        segment.z = z;
        ring.push_back(segment);
    }
}

fn place_tree<R: Rng>(segment_z: f32, config: &GameConfig, rng: &mut R) -> Prop {
    let side = if rng.gen::<f32>() > 0.5 { 1.0 } else { -1.0 };
    let x = (config.half_road_width() + rng.gen::<f32>() * config.tree_spread) * side;
    let z = segment_z + rng.gen::<f32>() * -config.segment_length;
    Prop { x, z }
}
