use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CaptureError, Result};

/// Number of discrete actions an agent can take
pub const ACTION_COUNT: usize = 5;

/// The fixed action vocabulary shared by agents and environments.
///
/// Ids are stable: the network's output index `i` always means `Action::ALL[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    StrafeLeft = 0,
    StrafeRight = 1,
    MoveForward = 2,
    MoveBackward = 3,
    Stay = 4,
}

impl Action {
    pub const ALL: [Action; ACTION_COUNT] = [
        Action::StrafeLeft,
        Action::StrafeRight,
        Action::MoveForward,
        Action::MoveBackward,
        Action::Stay,
    ];

    /// Look up an action by its network output index
    pub fn from_id(id: usize) -> Result<Self> {
        Self::ALL.get(id).copied().ok_or(CaptureError::InvalidAction {
            action: id,
            max_actions: ACTION_COUNT,
        })
    }

    pub fn id(self) -> usize {
        self as usize
    }

    /// Command name understood by the game side
    pub fn name(self) -> &'static str {
        match self {
            Action::StrafeLeft => "strafe_left",
            Action::StrafeRight => "strafe_right",
            Action::MoveForward => "move_forward",
            Action::MoveBackward => "move_backward",
            Action::Stay => "stay",
        }
    }

    /// Unit displacement on the horizontal (x, z) plane.
    /// Forward is towards negative z.
    pub fn direction(self) -> (f32, f32) {
        match self {
            Action::StrafeLeft => (-1.0, 0.0),
            Action::StrafeRight => (1.0, 0.0),
            Action::MoveForward => (0.0, -1.0),
            Action::MoveBackward => (0.0, 1.0),
            Action::Stay => (0.0, 0.0),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_mapping_is_fixed() {
        let names: Vec<&str> = Action::ALL.iter().map(|a| a.name()).collect();
        assert_eq!(names, ["strafe_left", "strafe_right", "move_forward", "move_backward", "stay"]);
        for (i, action) in Action::ALL.iter().enumerate() {
            assert_eq!(action.id(), i);
            assert_eq!(Action::from_id(i).unwrap(), *action);
        }
    }

    #[test]
    fn test_out_of_range_id() {
        let err = Action::from_id(5).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidAction { action: 5, max_actions: 5 }));
    }

    #[test]
    fn test_wire_name() {
        let json = serde_json::to_string(&Action::MoveBackward).unwrap();
        assert_eq!(json, "\"move_backward\"");
    }
}
