//! The action surface offered to agents.
//!
//! Agents are addressed by their external identifier and pass their arguments as
//! plain tokens (`up`, `grab`, ...). Everything is resolved here and handed to the
//! [`World`]; the answer is either the outcome or an [`ActionError`].

use crate::{
    Direction, GripperAction,
    beliefs::{BeliefReport, Presentation},
    outcome::{ActionError, GripperOutcome, MoveOutcome, Percept},
    registry::{AgentRegistry, Registration, Slot},
    world::World,
};

pub struct WumpusInterface {
    registry: AgentRegistry,
    world: World,
    /// Present when something draws the world; belief and note actions are no-ops otherwise.
    presentation: Option<Presentation>,
}

impl WumpusInterface {
    /// An interface with a renderer attached.
    pub fn new(world: World) -> Self {
        Self {
            registry: AgentRegistry::new(),
            world,
            presentation: Some(Presentation::new()),
        }
    }

    /// An interface without a renderer.
    pub fn headless(world: World) -> Self {
        Self {
            registry: AgentRegistry::new(),
            world,
            presentation: None,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }
    pub fn presentation(&self) -> Option<&Presentation> {
        self.presentation.as_ref()
    }

    /// Registers an agent and spawns it. Returns `None` once the world is full.
    pub fn register(&mut self, identifier: &str) -> Option<Slot> {
        match self.registry.register(identifier)? {
            Registration::New(slot) => {
                // Slots are handed out once each, so the world slot is always free.
                if let Err(error) = self.world.spawn_agent(slot) {
                    tracing::error!(identifier, %slot, %error, "registered agent could not spawn");
                }
                Some(slot)
            }
            Registration::Existing(slot) => Some(slot),
        }
    }

    /// `direction` is one of `up`, `down`, `left`, `right`.
    pub fn move_agent(
        &mut self,
        identifier: &str,
        direction: &str,
    ) -> Result<MoveOutcome, ActionError> {
        let slot = resolve(&self.registry, &mut self.world, identifier)?;
        let direction: Direction = direction
            .parse()
            .map_err(|error| self.world.record_failure(error))?;
        self.world.step(slot, direction)
    }

    /// `action` is either `grab` or `drop`.
    pub fn gripper(&mut self, identifier: &str, action: &str) -> Result<GripperOutcome, ActionError> {
        let slot = resolve(&self.registry, &mut self.world, identifier)?;
        let action: GripperAction = action
            .parse()
            .map_err(|error| self.world.record_failure(error))?;
        self.world.gripper(slot, action)
    }

    pub fn perceive(&mut self, identifier: &str) -> Result<Percept, ActionError> {
        let slot = resolve(&self.registry, &mut self.world, identifier)?;
        self.world.perceive(slot)
    }

    /// Replaces what the renderer shows as this agent's believed world.
    pub fn surrender_beliefs(
        &mut self,
        identifier: &str,
        reports: &[BeliefReport],
    ) -> Result<(), ActionError> {
        let WumpusInterface {
            registry,
            world,
            presentation,
        } = self;
        let Some(presentation) = presentation.as_mut() else {
            world.record_success();
            return Ok(());
        };
        let slot = resolve(registry, world, identifier)?;
        presentation.surrender(slot, reports);
        world.record_success();
        Ok(())
    }

    /// Posts a short message on the notice board, overwriting an older one with the same topic.
    pub fn add_note(
        &mut self,
        identifier: &str,
        topic: &str,
        message: &str,
    ) -> Result<(), ActionError> {
        let WumpusInterface {
            registry,
            world,
            presentation,
        } = self;
        let Some(presentation) = presentation.as_mut() else {
            world.record_success();
            return Ok(());
        };
        let slot = resolve(registry, world, identifier)?;
        match presentation.notice_board.post(slot, topic, message) {
            Ok(()) => {
                world.record_success();
                Ok(())
            }
            Err(error) => Err(world.record_failure(error)),
        }
    }
}

fn resolve(
    registry: &AgentRegistry,
    world: &mut World,
    identifier: &str,
) -> Result<Slot, ActionError> {
    match registry.lookup(identifier) {
        Some(slot) => Ok(slot),
        None => Err(world.record_failure(ActionError::NotRegistered)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Position,
        beliefs::{BeliefKind, MAX_NOTES},
        loader::load_world_from_string,
        world::WorldConfig,
    };

    fn interface() -> WumpusInterface {
        let world = load_world_from_string("BL GD\nCS PT", WorldConfig::default()).unwrap();
        WumpusInterface::new(world)
    }

    #[test]
    fn test_register_spawns_agent() {
        let mut wumpus = interface();
        let slot = wumpus.register("bob").unwrap();
        let agent = wumpus.world().agent(slot).unwrap();
        assert_eq!(agent.position, Position::new(0, 0));
        assert_eq!(wumpus.register("bob"), Some(slot));
        assert_eq!(wumpus.world().agents().count(), 1);
    }

    #[test]
    fn test_tokens() {
        let mut wumpus = interface();
        wumpus.register("bob").unwrap();
        assert_eq!(
            wumpus.move_agent("bob", "diagonal"),
            Err(ActionError::InvalidDirection("diagonal".into()))
        );
        assert_eq!(
            wumpus.world().last_failure(),
            Some(&ActionError::InvalidDirection("diagonal".into()))
        );
        assert_eq!(
            wumpus.gripper("bob", "throw"),
            Err(ActionError::InvalidGripperAction("throw".into()))
        );
        assert_eq!(
            wumpus.move_agent("bob", "up"),
            Ok(MoveOutcome::Moved(Position::new(0, 1)))
        );
        assert_eq!(wumpus.world().last_failure(), None);
    }

    #[test]
    fn test_unregistered_checked_before_tokens() {
        let mut wumpus = interface();
        assert_eq!(
            wumpus.move_agent("ghost", "nowhere"),
            Err(ActionError::NotRegistered)
        );
        assert_eq!(wumpus.perceive("ghost"), Err(ActionError::NotRegistered));
        assert_eq!(
            wumpus.surrender_beliefs("ghost", &[]),
            Err(ActionError::NotRegistered)
        );
        assert_eq!(
            wumpus.add_note("ghost", "t", "m"),
            Err(ActionError::NotRegistered)
        );
    }

    #[test]
    fn test_beliefs_and_notes_with_presentation() {
        let mut wumpus = interface();
        let slot = wumpus.register("bob").unwrap();
        wumpus
            .surrender_beliefs(
                "bob",
                &[BeliefReport::fact("visited", 1, 1), BeliefReport::mood("content")],
            )
            .unwrap();
        let believed = wumpus
            .presentation()
            .and_then(|p| p.believed_world(slot))
            .unwrap();
        assert_eq!(
            believed.at(Position::new(0, 0)).collect::<Vec<_>>(),
            vec![BeliefKind::Visited]
        );

        for i in 0..MAX_NOTES {
            wumpus.add_note("bob", &format!("t{i}"), "hi").unwrap();
        }
        assert_eq!(
            wumpus.add_note("bob", "extra", "hi"),
            Err(ActionError::NoticeBoardFull { capacity: MAX_NOTES })
        );
    }

    #[test]
    fn test_headless_presentation_actions_are_noops() {
        let world = load_world_from_string("CS BL", WorldConfig::default()).unwrap();
        let mut wumpus = WumpusInterface::headless(world);
        assert!(wumpus.presentation().is_none());
        assert_eq!(wumpus.surrender_beliefs("anyone", &[]), Ok(()));
        for i in 0..20 {
            assert_eq!(wumpus.add_note("anyone", &format!("t{i}"), "m"), Ok(()));
        }
        // Real actions still check registration.
        assert_eq!(wumpus.perceive("anyone"), Err(ActionError::NotRegistered));
        assert_eq!(wumpus.add_note("anyone", "t", "m"), Ok(()));
        assert_eq!(wumpus.world().last_failure(), None);
    }

    #[test]
    fn test_successful_beliefs_and_notes_clear_last_failure() {
        let world = load_world_from_string("CS BL", WorldConfig::default()).unwrap();
        let mut wumpus = WumpusInterface::new(world);
        wumpus.register("bob").unwrap();

        assert!(wumpus.move_agent("bob", "left").is_err());
        assert!(wumpus.world().last_failure().is_some());
        assert_eq!(wumpus.add_note("bob", "plan", "go east"), Ok(()));
        assert_eq!(wumpus.world().last_failure(), None);

        assert!(wumpus.move_agent("bob", "down").is_err());
        assert_eq!(
            wumpus.surrender_beliefs("bob", &[BeliefReport::fact("visited", 1, 1)]),
            Ok(())
        );
        assert_eq!(wumpus.world().last_failure(), None);

        // A refused note is recorded like any other failure.
        for i in 0..MAX_NOTES {
            wumpus.add_note("bob", &format!("t{i}"), "hi").unwrap();
        }
        let error = wumpus.add_note("bob", "extra", "hi").unwrap_err();
        assert_eq!(wumpus.world().last_failure(), Some(&error));
    }
}
