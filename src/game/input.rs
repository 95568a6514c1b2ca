#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Back,
    Left,
    Right,
}

impl Direction {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "w" | "W" | "ArrowUp" => Some(Direction::Forward),
            "s" | "S" | "ArrowDown" => Some(Direction::Back),
            "a" | "A" | "ArrowLeft" => Some(Direction::Left),
            "d" | "D" | "ArrowRight" => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "forward" => Some(Direction::Forward),
            "back" => Some(Direction::Back),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Held state of the four driving directions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl InputState {
    pub fn set(&mut self, direction: Direction, pressed: bool) {
        match direction {
            Direction::Forward => self.forward = pressed,
            Direction::Back => self.back = pressed,
            Direction::Left => self.left = pressed,
            Direction::Right => self.right = pressed,
        }
    }

    /// Returns whether the key was one of ours.
    pub fn handle_key(&mut self, key: &str, pressed: bool) -> bool {
        match Direction::from_key(key) {
            Some(direction) => {
                self.set(direction, pressed);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_and_release() {
        let mut input = InputState::default();
        assert!(input.handle_key("w", true));
        assert!(input.handle_key("d", true));
        assert!(input.forward && input.right);
        assert!(input.handle_key("w", false));
        assert!(!input.forward);
        assert!(input.right);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let mut input = InputState::default();
        assert!(!input.handle_key("q", true));
        assert!(!input.handle_key(" ", true));
        assert!(!input.handle_key("Shift", true));
        assert_eq!(input, InputState::default());
    }

    #[test]
    fn test_arrow_keys_map_to_directions() {
        assert_eq!(Direction::from_key("ArrowUp"), Some(Direction::Forward));
        assert_eq!(Direction::from_key("ArrowLeft"), Some(Direction::Left));
        assert_eq!(Direction::from_name("back"), Some(Direction::Back));
        assert_eq!(Direction::from_name("up"), None);
    }
}
