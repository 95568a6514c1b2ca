use serde::Serialize;

/// Lives, distance and the terminal flag for one play session.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    pub lives: u32,
    pub distance: f32,
    pub over: bool,
}

impl GameState {
    pub fn new(lives: u32) -> Self {
        GameState {
            lives,
            distance: 0.0,
            over: false,
        }
    }

    /// Reversing winds the odometer back, but never below zero.
    pub fn add_distance(&mut self, delta: f32) {
        self.distance = (self.distance + delta).max(0.0);
    }

    /// Take `hits` lives; returns true once the game is over.
    pub fn lose_lives(&mut self, hits: u32) -> bool {
        if hits > 0 {
            self.lives = self.lives.saturating_sub(hits);
            if self.lives == 0 {
                self.over = true;
            }
        }
        self.over
    }

    pub fn distance_label(&self) -> String {
        format!("{}m", self.distance.floor() as u64)
    }

    pub fn hud(&self, speed: f32) -> HudSnapshot {
        HudSnapshot {
            lives: self.lives,
            distance: self.distance.floor() as u64,
            speed,
            game_over: self.over,
        }
    }
}

/// What the page shows, handed to JS as a plain object.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct HudSnapshot {
    pub lives: u32,
    pub distance: u64,
    pub speed: f32,
    pub game_over: bool,
}
