use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub mod agent;
pub mod beliefs;
pub mod interface;
pub mod loader;
pub mod map;
pub mod outcome;
pub mod registry;
pub mod world;

pub use interface::WumpusInterface;
pub use outcome::{ActionError, DropOutcome, GripperOutcome, MoveOutcome, Percept};
pub use registry::{AgentRegistry, MAX_AGENTS, Registration, Slot};
pub use world::{DropPolicy, World, WorldConfig};

/// Represents a 2D coordinate. `y` grows upward, `(0, 0)` is the bottom-left tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Converts 1-based boundary coordinates into an internal position.
    ///
    /// Returns `None` for coordinates below 1.
    pub fn from_one_based(x: i64, y: i64) -> Option<Self> {
        let x = usize::try_from(x.checked_sub(1)?).ok()?;
        let y = usize::try_from(y.checked_sub(1)?).ok()?;
        Some(Self { x, y })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four cardinal directions an agent can step in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit vector of the direction.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Right => (1, 0),
            Direction::Left => (-1, 0),
        }
    }

    /// Inverse of [`Direction::delta`]; anything but a unit cardinal vector yields `None`.
    pub fn from_delta(dx: isize, dy: isize) -> Option<Self> {
        match (dx, dy) {
            (0, 1) => Some(Direction::Up),
            (0, -1) => Some(Direction::Down),
            (1, 0) => Some(Direction::Right),
            (-1, 0) => Some(Direction::Left),
            _ => None,
        }
    }
}

impl FromStr for Direction {
    type Err = ActionError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(ActionError::InvalidDirection(other.to_string())),
        }
    }
}

/// The two things the gripper can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GripperAction {
    Grab,
    Drop,
}

impl FromStr for GripperAction {
    type Err = ActionError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "grab" => Ok(GripperAction::Grab),
            "drop" => Ok(GripperAction::Drop),
            other => Err(ActionError::InvalidGripperAction(other.to_string())),
        }
    }
}
