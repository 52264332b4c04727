//! Input mapping from raw events to demo actions
//!
//! Maps typed keys and clicks to high-level actions like TogglePause, DropMany, etc.
//! Keys without a binding are ignored.

/// A raw input event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A character was typed
    KeyTyped(char),
    /// A click or touch at `x` on a screen `width` pixels wide
    Click { x: f32, width: f32 },
}

/// Shape of a dropped object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropShape {
    Box,
    Sphere,
    /// Chosen by the demo's random generator
    Random,
}

/// Actions the demo reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Pause or resume the simulation (P key)
    TogglePause,
    /// Drop a batch of random objects (D key)
    DropMany,
    /// Drop a single object
    DropOne(DropShape),
    /// Throw the world away and build a new one (R key)
    Reset,
    /// Release idle scratch values (G key)
    TrimScratch,
}

/// Maps raw input events to demo actions
pub struct InputMapper;

impl InputMapper {
    /// Map a typed character to an action
    ///
    /// Only the lowercase characters are bound.
    pub fn map_key(key: char) -> Option<InputAction> {
        match key {
            'p' => Some(InputAction::TogglePause),
            'd' => Some(InputAction::DropMany),
            'r' => Some(InputAction::Reset),
            'g' => Some(InputAction::TrimScratch),
            _ => None,
        }
    }

    /// Map a click to an action
    ///
    /// The left half of the screen drops a box, the right half a sphere.
    pub fn map_click(x: f32, width: f32) -> InputAction {
        if x < width / 2.0 {
            InputAction::DropOne(DropShape::Box)
        } else {
            InputAction::DropOne(DropShape::Sphere)
        }
    }

    /// Map any raw event to an action
    pub fn map(event: InputEvent) -> Option<InputAction> {
        match event {
            InputEvent::KeyTyped(key) => Self::map_key(key),
            InputEvent::Click { x, width } => Some(Self::map_click(x, width)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_keys() {
        assert_eq!(InputMapper::map_key('p'), Some(InputAction::TogglePause));
        assert_eq!(InputMapper::map_key('d'), Some(InputAction::DropMany));
        assert_eq!(InputMapper::map_key('r'), Some(InputAction::Reset));
        assert_eq!(InputMapper::map_key('g'), Some(InputAction::TrimScratch));
    }

    #[test]
    fn test_uppercase_keys_not_mapped() {
        for key in ['P', 'D', 'R', 'G'] {
            assert_eq!(InputMapper::map_key(key), None, "Key {:?} should not be mapped", key);
        }
    }

    #[test]
    fn test_unbound_keys_not_mapped() {
        for key in ['w', 'a', 's', ' ', '1'] {
            assert_eq!(InputMapper::map_key(key), None, "Key {:?} should not be mapped", key);
        }
    }

    #[test]
    fn test_left_half_click_drops_box() {
        assert_eq!(
            InputMapper::map(InputEvent::Click { x: 100.0, width: 800.0 }),
            Some(InputAction::DropOne(DropShape::Box))
        );
    }

    #[test]
    fn test_right_half_click_drops_sphere() {
        assert_eq!(InputMapper::map_click(700.0, 800.0), InputAction::DropOne(DropShape::Sphere));
        assert_eq!(InputMapper::map_click(400.0, 800.0), InputAction::DropOne(DropShape::Sphere));
        assert_eq!(
            InputMapper::map(InputEvent::Click { x: 799.0, width: 800.0 }),
            Some(InputAction::DropOne(DropShape::Sphere))
        );
    }
}
