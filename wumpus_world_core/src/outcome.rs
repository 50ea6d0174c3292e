//! Results of the actions agents attempt in the world.
//!
//! Every action returns either its outcome or an [`ActionError`] whose
//! `Display` form is the short reason reported back to the agent.

use serde::{Deserialize, Serialize};

use crate::Position;

/// Why an attempted action did not apply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("Agent not registered.")]
    NotRegistered,
    #[error("Agent is dead.")]
    AgentDead,
    #[error("Not a valid move direction: {0}")]
    InvalidDirection(String),
    #[error("Not a valid gripper action: {0}")]
    InvalidGripperAction(String),
    #[error("Illegal move from {from} by ({dx}, {dy}).")]
    IllegalMove {
        from: Position,
        dx: isize,
        dy: isize,
    },
    #[error("There is no gold here.")]
    NoGoldHere,
    #[error("Already carrying gold.")]
    AlreadyCarrying,
    #[error("Not carrying gold.")]
    NotCarrying,
    #[error("There is already gold on this tile.")]
    GoldAlreadyHere,
    #[error("Could not add note. Maximal amount is {capacity}.")]
    NoticeBoardFull { capacity: usize },
}

/// What a successful move did to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// The agent stands on the new tile and is still alive.
    Moved(Position),
    /// The agent entered a pit or the wumpus tile. The move itself still counts as done.
    Died(Position),
}

/// Where dropped gold ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropOutcome {
    /// Dropped on a chest: the gold is delivered.
    Delivered,
    /// Dropped elsewhere and no longer tracked.
    Discarded,
    /// Dropped elsewhere and put back on the agent's tile.
    PlacedOnTile,
}

/// What a successful gripper action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GripperOutcome {
    Grabbed,
    Dropped(DropOutcome),
}

/// The four signals an agent senses on its current tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Percept {
    /// A pit is orthogonally adjacent.
    pub breeze: bool,
    /// Gold lies on the agent's own tile.
    pub glitter: bool,
    /// The wumpus is orthogonally adjacent.
    pub stench: bool,
    /// The agent has died.
    pub death: bool,
}

impl Percept {
    pub const BREEZE: u8 = 1;
    pub const GLITTER: u8 = 1 << 1;
    pub const STENCH: u8 = 1 << 2;
    pub const DEATH: u8 = 1 << 3;

    /// Packs the signals into a bitmask, one bit per signal.
    pub fn bits(&self) -> u8 {
        let mut bits = 0;
        if self.breeze {
            bits |= Self::BREEZE;
        }
        if self.glitter {
            bits |= Self::GLITTER;
        }
        if self.stench {
            bits |= Self::STENCH;
        }
        if self.death {
            bits |= Self::DEATH;
        }
        bits
    }

    /// Boundary encoding: `yes`/`no` for breeze, glitter, stench and death, in that order.
    pub fn answers(&self) -> [&'static str; 4] {
        let answer = |flag: bool| if flag { "yes" } else { "no" };
        [
            answer(self.breeze),
            answer(self.glitter),
            answer(self.stench),
            answer(self.death),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percept_bits_are_independent() {
        let percept = Percept {
            breeze: true,
            glitter: false,
            stench: true,
            death: false,
        };
        assert_eq!(percept.bits(), Percept::BREEZE | Percept::STENCH);
        assert_eq!(Percept::default().bits(), 0);

        let all = Percept {
            breeze: true,
            glitter: true,
            stench: true,
            death: true,
        };
        assert_eq!(all.bits(), 0b1111);
    }

    #[test]
    fn test_percept_answers_order() {
        let percept = Percept {
            breeze: false,
            glitter: true,
            stench: false,
            death: true,
        };
        assert_eq!(percept.answers(), ["no", "yes", "no", "yes"]);
    }

    #[test]
    fn test_error_reasons() {
        assert_eq!(ActionError::NotRegistered.to_string(), "Agent not registered.");
        assert_eq!(
            ActionError::InvalidDirection("sideways".into()).to_string(),
            "Not a valid move direction: sideways"
        );
        assert_eq!(
            ActionError::NoticeBoardFull { capacity: 11 }.to_string(),
            "Could not add note. Maximal amount is 11."
        );
    }
}
