use serde::{Deserialize, Serialize};

use crate::{Position, registry::Slot};

/// Holds the state of an agent within the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    pub slot: Slot,
    pub position: Position,
    alive: bool,
    pub carrying_gold: bool,
}

impl AgentState {
    /// A fresh agent: alive and empty-handed.
    pub fn spawn(slot: Slot, position: Position) -> Self {
        Self {
            slot,
            position,
            alive: true,
            carrying_gold: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Death is one-way, there is no way back.
    pub fn kill(&mut self) {
        self.alive = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawned_agent() {
        let agent = AgentState::spawn(Slot::new(1).unwrap(), Position::new(2, 3));
        assert!(agent.is_alive());
        assert!(!agent.carrying_gold);
        assert_eq!(agent.position, Position::new(2, 3));
    }

    #[test]
    fn test_kill_is_terminal() {
        let mut agent = AgentState::spawn(Slot::new(0).unwrap(), Position::new(0, 0));
        agent.kill();
        agent.kill();
        assert!(!agent.is_alive());
    }
}
