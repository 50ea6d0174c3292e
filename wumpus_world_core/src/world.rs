use serde::{Deserialize, Serialize};

use crate::{
    Direction, GripperAction, Position,
    agent::AgentState,
    map::{Grid, Terrain},
    outcome::{ActionError, DropOutcome, GripperOutcome, MoveOutcome, Percept},
    registry::{MAX_AGENTS, Slot},
};

/// Errors raised while setting up a world, before any action is taken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("World has no spawn point.")]
    NoSpawnPoint,
    #[error("Spawn point {0} is out of bounds.")]
    SpawnOutOfBounds(Position),
    #[error("Cannot spawn agents on {terrain:?} at {position}.")]
    SpawnBlocked { position: Position, terrain: Terrain },
    #[error("Agent slot {0} is already spawned.")]
    SlotTaken(Slot),
}

/// What happens to gold dropped outside a chest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropPolicy {
    /// Any drop while carrying succeeds; gold dropped off-chest is no longer tracked.
    #[default]
    Anywhere,
    /// Gold dropped off-chest goes back onto the agent's tile.
    ReturnToTile,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    #[serde(default)]
    pub drop_policy: DropPolicy,
}

/// The simulated world: terrain plus up to [`MAX_AGENTS`] agents.
///
/// Every action takes `&mut self` and completes before returning, so one action is
/// applied at a time. Callers sharing a world between threads wrap it in a mutex.
#[derive(Debug, Clone)]
pub struct World {
    terrain: Grid<Terrain>,
    spawns: Vec<Position>,
    agents: [Option<AgentState>; MAX_AGENTS],
    config: WorldConfig,
    gold_delivered: usize,
    last_failure: Option<ActionError>,
}

impl World {
    /// Creates a world with no agents yet.
    ///
    /// Agent `n` spawns at `spawns[n % spawns.len()]`.
    pub fn new(
        terrain: Grid<Terrain>,
        spawns: Vec<Position>,
        config: WorldConfig,
    ) -> Result<Self, WorldError> {
        if spawns.is_empty() {
            return Err(WorldError::NoSpawnPoint);
        }
        for &position in &spawns {
            let tile = *terrain
                .get(position)
                .ok_or(WorldError::SpawnOutOfBounds(position))?;
            if !tile.is_passable() || tile.is_deadly() {
                return Err(WorldError::SpawnBlocked {
                    position,
                    terrain: tile,
                });
            }
        }
        Ok(World {
            terrain,
            spawns,
            agents: Default::default(),
            config,
            gold_delivered: 0,
            last_failure: None,
        })
    }

    /// Places the agent for `slot` on its spawn point.
    pub fn spawn_agent(&mut self, slot: Slot) -> Result<&AgentState, WorldError> {
        let position = self.spawns[slot.index() % self.spawns.len()];
        let entry = &mut self.agents[slot.index()];
        if entry.is_some() {
            return Err(WorldError::SlotTaken(slot));
        }
        tracing::info!(%slot, %position, "agent spawned");
        Ok(&*entry.insert(AgentState::spawn(slot, position)))
    }

    pub fn terrain(&self) -> &Grid<Terrain> {
        &self.terrain
    }
    pub fn spawns(&self) -> &[Position] {
        &self.spawns
    }
    pub fn agent(&self, slot: Slot) -> Option<&AgentState> {
        self.agents[slot.index()].as_ref()
    }

    /// All spawned agents, ordered by slot.
    pub fn agents(&self) -> impl Iterator<Item = &AgentState> {
        self.agents.iter().flatten()
    }

    /// Number of gold pieces dropped on a chest so far.
    pub fn gold_delivered(&self) -> usize {
        self.gold_delivered
    }

    /// Number of tiles still holding gold.
    pub fn gold_remaining(&self) -> usize {
        self.terrain
            .enumerate()
            .filter(|(_, tile)| **tile == Terrain::Gold)
            .count()
    }

    /// Reason the most recent action failed, `None` if it succeeded.
    pub fn last_failure(&self) -> Option<&ActionError> {
        self.last_failure.as_ref()
    }

    /// Moves the agent by a unit cardinal vector.
    pub fn move_agent(
        &mut self,
        slot: Slot,
        dx: isize,
        dy: isize,
    ) -> Result<MoveOutcome, ActionError> {
        let result = self.apply_move(slot, dx, dy);
        self.record(slot, "move", result)
    }

    pub fn step(&mut self, slot: Slot, direction: Direction) -> Result<MoveOutcome, ActionError> {
        let (dx, dy) = direction.delta();
        self.move_agent(slot, dx, dy)
    }

    /// Picks up the gold lying on the agent's tile.
    pub fn grab(&mut self, slot: Slot) -> Result<(), ActionError> {
        let result = self.apply_grab(slot);
        self.record(slot, "grab", result)
    }

    /// Lets go of the carried gold.
    pub fn drop_gold(&mut self, slot: Slot) -> Result<DropOutcome, ActionError> {
        let result = self.apply_drop(slot);
        self.record(slot, "drop", result)
    }

    pub fn gripper(
        &mut self,
        slot: Slot,
        action: GripperAction,
    ) -> Result<GripperOutcome, ActionError> {
        match action {
            GripperAction::Grab => self.grab(slot).map(|()| GripperOutcome::Grabbed),
            GripperAction::Drop => self.drop_gold(slot).map(GripperOutcome::Dropped),
        }
    }

    /// Senses the agent's current tile. Allowed for dead agents.
    pub fn perceive(&mut self, slot: Slot) -> Result<Percept, ActionError> {
        let result = self.sense(slot);
        self.record(slot, "perceive", result)
    }

    /// Records a failure detected before the engine was reached (unknown agent, bad token).
    pub(crate) fn record_failure(&mut self, error: ActionError) -> ActionError {
        tracing::debug!(reason = %error, "action rejected");
        self.last_failure = Some(error.clone());
        error
    }

    /// Records a success handled outside the engine (beliefs, notes).
    pub(crate) fn record_success(&mut self) {
        self.last_failure = None;
    }

    fn record<T>(
        &mut self,
        slot: Slot,
        action: &'static str,
        result: Result<T, ActionError>,
    ) -> Result<T, ActionError> {
        match &result {
            Ok(_) => {
                tracing::debug!(%slot, action, "action applied");
                self.last_failure = None;
            }
            Err(error) => {
                tracing::debug!(%slot, action, reason = %error, "action failed");
                self.last_failure = Some(error.clone());
            }
        }
        result
    }

    fn apply_move(&mut self, slot: Slot, dx: isize, dy: isize) -> Result<MoveOutcome, ActionError> {
        let World {
            terrain, agents, ..
        } = self;
        let agent = agents[slot.index()]
            .as_mut()
            .ok_or(ActionError::NotRegistered)?;
        if Direction::from_delta(dx, dy).is_none() {
            return Err(ActionError::InvalidDirection(format!("({dx}, {dy})")));
        }
        if !agent.is_alive() {
            return Err(ActionError::AgentDead);
        }

        let from = agent.position;
        let target = terrain
            .offset(from, dx, dy)
            .filter(|target| terrain[*target].is_passable())
            .ok_or(ActionError::IllegalMove { from, dx, dy })?;

        agent.position = target;
        if terrain[target].is_deadly() {
            agent.kill();
            tracing::info!(%slot, position = %target, terrain = ?terrain[target], "agent died");
            Ok(MoveOutcome::Died(target))
        } else {
            Ok(MoveOutcome::Moved(target))
        }
    }

    fn apply_grab(&mut self, slot: Slot) -> Result<(), ActionError> {
        let World {
            terrain, agents, ..
        } = self;
        let agent = living_agent_mut(agents, slot)?;
        if agent.carrying_gold {
            return Err(ActionError::AlreadyCarrying);
        }
        let here = agent.position;
        if terrain[here] != Terrain::Gold {
            return Err(ActionError::NoGoldHere);
        }
        terrain[here] = Terrain::Empty;
        agent.carrying_gold = true;
        Ok(())
    }

    fn apply_drop(&mut self, slot: Slot) -> Result<DropOutcome, ActionError> {
        let World {
            terrain,
            agents,
            config,
            gold_delivered,
            ..
        } = self;
        let agent = living_agent_mut(agents, slot)?;
        if !agent.carrying_gold {
            return Err(ActionError::NotCarrying);
        }
        let here = agent.position;
        let outcome = match (terrain[here], config.drop_policy) {
            (Terrain::Chest, _) => {
                *gold_delivered += 1;
                tracing::info!(%slot, position = %here, "gold delivered");
                DropOutcome::Delivered
            }
            (_, DropPolicy::Anywhere) => DropOutcome::Discarded,
            (Terrain::Gold, DropPolicy::ReturnToTile) => {
                return Err(ActionError::GoldAlreadyHere);
            }
            (_, DropPolicy::ReturnToTile) => {
                terrain[here] = Terrain::Gold;
                DropOutcome::PlacedOnTile
            }
        };
        agent.carrying_gold = false;
        Ok(outcome)
    }

    fn sense(&self, slot: Slot) -> Result<Percept, ActionError> {
        let agent = self.agent(slot).ok_or(ActionError::NotRegistered)?;
        let here = agent.position;
        let mut percept = Percept {
            glitter: self.terrain[here] == Terrain::Gold,
            death: !agent.is_alive(),
            ..Percept::default()
        };
        for neighbor in self.terrain.neighbors(here) {
            match self.terrain[neighbor] {
                Terrain::Pit => percept.breeze = true,
                Terrain::Wumpus => percept.stench = true,
                _ => {}
            }
        }
        Ok(percept)
    }
}

fn living_agent_mut(
    agents: &mut [Option<AgentState>; MAX_AGENTS],
    slot: Slot,
) -> Result<&mut AgentState, ActionError> {
    let agent = agents[slot.index()]
        .as_mut()
        .ok_or(ActionError::NotRegistered)?;
    if !agent.is_alive() {
        return Err(ActionError::AgentDead);
    }
    Ok(agent)
}
