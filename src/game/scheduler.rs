use crate::game::{GameSession, StepOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    NotStarted,
    Running,
    /// Terminal. A new page load is required to play again.
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Not running; the host should not schedule another frame.
    Idle,
    /// Car model not loaded yet; schedule again without rendering.
    Waiting,
    /// State advanced; render and schedule again.
    Advanced,
    /// Last frame of the session. The chain ends here.
    GameOver,
}

impl FrameOutcome {
    pub fn wants_next_frame(self) -> bool {
        matches!(self, FrameOutcome::Waiting | FrameOutcome::Advanced)
    }
}

/// Owns the lifecycle of the frame loop. The host asks it every frame whether
/// to keep going; once stopped it never runs again.
pub struct FrameScheduler {
    state: SchedulerState,
    frames: u64,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        FrameScheduler {
            state: SchedulerState::NotStarted,
            frames: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    /// Frames that advanced the simulation.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Returns true if this call started the loop.
    pub fn start(&mut self) -> bool {
        if self.state != SchedulerState::NotStarted {
            return false;
        }
        self.state = SchedulerState::Running;
        log::info!("session started");
        true
    }

    pub fn stop(&mut self) {
        self.state = SchedulerState::Stopped;
    }

    pub fn tick(&mut self, session: &mut GameSession) -> FrameOutcome {
        if !self.is_running() {
            return FrameOutcome::Idle;
        }
        if session.state.over {
            self.stop();
            return FrameOutcome::GameOver;
        }

        match session.step() {
            StepOutcome::NotLoaded => FrameOutcome::Waiting,
            StepOutcome::Advanced { .. } => {
                self.frames += 1;
                FrameOutcome::Advanced
            }
            StepOutcome::GameOver => {
                self.frames += 1;
                self.stop();
                log::info!(
                    "game over after {} frames, {}",
                    self.frames,
                    session.state.distance_label()
                );
                FrameOutcome::GameOver
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mesh::Mesh;
    use crate::game::config::{GameConfig, ModelConfig};
    use crate::game::vehicle::VehicleModel;

    fn loaded_session(lives: u32) -> GameSession {
        let cfg = GameConfig { starting_lives: lives, ..GameConfig::default() };
        let mut session = GameSession::with_seed(cfg, 1.0, 11);
        session.attach_vehicle_model(
            VehicleModel::new(Mesh::cube(2.0, 1.0, 1.0, 1.0), &ModelConfig::default()).unwrap(),
        );
        session
    }

    #[test]
    fn test_idle_until_started() {
        let mut scheduler = FrameScheduler::new();
        let mut session = loaded_session(3);
        assert_eq!(scheduler.tick(&mut session), FrameOutcome::Idle);
        assert_eq!(scheduler.frames(), 0);
        assert!(scheduler.start());
        assert!(!scheduler.start());
        assert_eq!(scheduler.tick(&mut session), FrameOutcome::Advanced);
        assert_eq!(scheduler.frames(), 1);
    }

    #[test]
    fn test_waits_for_vehicle_model() {
        let mut scheduler = FrameScheduler::new();
        let mut session = GameSession::with_seed(GameConfig::default(), 1.0, 12);
        session.input.forward = true;
        scheduler.start();
        for _ in 0..10 {
            assert_eq!(scheduler.tick(&mut session), FrameOutcome::Waiting);
        }
        assert_eq!(session.vehicle.speed, 0.0);
        assert_eq!(scheduler.frames(), 0);
        assert!(scheduler.is_running());
    }

    #[test]
    fn test_last_life_stops_the_loop() {
        let mut scheduler = FrameScheduler::new();
        let mut session = loaded_session(1);
        session.obstacles.spawn(0, 0.0, &session.config);
        scheduler.start();

        let outcome = scheduler.tick(&mut session);
        assert_eq!(outcome, FrameOutcome::GameOver);
        assert!(!outcome.wants_next_frame());
        assert_eq!(session.state.lives, 0);
        assert!(session.state.over);
        assert_eq!(scheduler.state(), SchedulerState::Stopped);

        let frames = scheduler.frames();
        assert_eq!(scheduler.tick(&mut session), FrameOutcome::Idle);
        assert_eq!(scheduler.frames(), frames);
        assert!(!scheduler.start());
    }
}
