use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

/// The most agents a world holds at once.
pub const MAX_AGENTS: usize = 4;

/// Stable small index identifying a registered agent, in `0..MAX_AGENTS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot(u8);

impl Slot {
    /// Returns `None` for indices at or above [`MAX_AGENTS`].
    pub fn new(index: usize) -> Option<Self> {
        (index < MAX_AGENTS).then(|| Slot(index as u8))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of a registration call that got a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    New(Slot),
    Existing(Slot),
}

impl Registration {
    pub fn slot(self) -> Slot {
        match self {
            Registration::New(slot) | Registration::Existing(slot) => slot,
        }
    }
}

/// Maps external agent identifiers to slots, first come first served.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    slots: HashMap<String, Slot>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `identifier`, or returns its slot if it is already known.
    ///
    /// Once [`MAX_AGENTS`] identifiers are registered every new identifier gets `None`
    /// and stays unregistered.
    pub fn register(&mut self, identifier: &str) -> Option<Registration> {
        if let Some(slot) = self.slots.get(identifier) {
            return Some(Registration::Existing(*slot));
        }
        let Some(slot) = Slot::new(self.slots.len()) else {
            tracing::warn!(
                identifier,
                capacity = MAX_AGENTS,
                "registry full, agent stays unregistered"
            );
            return None;
        };
        self.slots.insert(identifier.to_string(), slot);
        tracing::info!(identifier, %slot, "agent registered");
        Some(Registration::New(slot))
    }

    pub fn lookup(&self, identifier: &str) -> Option<Slot> {
        self.slots.get(identifier).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Registered identifiers ordered by slot.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Slot)> {
        let mut entries: Vec<_> = self
            .slots
            .iter()
            .map(|(identifier, slot)| (identifier.as_str(), *slot))
            .collect();
        entries.sort_by_key(|(_, slot)| *slot);
        entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_constant() {
        assert_eq!(MAX_AGENTS, 4);
        assert!(Slot::new(3).is_some());
        assert!(Slot::new(4).is_none());
    }

    #[test]
    fn test_slots_assigned_in_order() {
        let mut registry = AgentRegistry::new();
        for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
            assert_eq!(
                registry.register(name),
                Some(Registration::New(Slot::new(i).unwrap()))
            );
        }
        assert_eq!(registry.len(), MAX_AGENTS);
        let order: Vec<_> = registry.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = AgentRegistry::new();
        let first = registry.register("bond").unwrap();
        let second = registry.register("bond").unwrap();
        assert_eq!(first, Registration::New(Slot::new(0).unwrap()));
        assert_eq!(second, Registration::Existing(first.slot()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_fifth_registration_refused() {
        let mut registry = AgentRegistry::new();
        for name in ["a", "b", "c", "d"] {
            registry.register(name).unwrap();
        }
        assert_eq!(registry.register("e"), None);
        assert_eq!(registry.register("e"), None);
        assert_eq!(registry.lookup("e"), None);
        assert_eq!(registry.len(), MAX_AGENTS);
        // Existing agents are still served after the refusal.
        assert_eq!(
            registry.register("c"),
            Some(Registration::Existing(Slot::new(2).unwrap()))
        );
    }

    #[test]
    fn test_lookup_is_exact() {
        let mut registry = AgentRegistry::new();
        registry.register("agent").unwrap();
        assert!(registry.lookup("Agent").is_none());
        assert!(registry.lookup("agent ").is_none());
        assert_eq!(registry.lookup("agent"), Slot::new(0));
    }
}
