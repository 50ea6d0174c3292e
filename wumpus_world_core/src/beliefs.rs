//! Per-agent believed worlds and the shared notice board.
//!
//! This is display data only: agents report what they think the world looks like
//! and a renderer draws it next to the real grid. The simulation never reads it.

use std::{collections::HashMap, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    Position,
    outcome::ActionError,
    registry::Slot,
};

/// Most distinct topics the notice board holds at once.
pub const MAX_NOTES: usize = 11;

/// Something an agent claims about a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeliefKind {
    Safe,
    Wumpus,
    Stench,
    Pit,
    Breeze,
    Visited,
    Gold,
    Chest,
    /// Where the given agent is thought to stand.
    Agent(Slot),
}

impl BeliefKind {
    /// Parses a tile claim token. `position` needs to know who it refers to.
    fn parse(token: &str, owner: Slot) -> Option<Self> {
        let kind = match token {
            "safe" => BeliefKind::Safe,
            "wumpus" => BeliefKind::Wumpus,
            "stench" => BeliefKind::Stench,
            "pit" => BeliefKind::Pit,
            "breeze" => BeliefKind::Breeze,
            "visited" => BeliefKind::Visited,
            "gold" => BeliefKind::Gold,
            "chest" => BeliefKind::Chest,
            "position" => BeliefKind::Agent(owner),
            _ => return None,
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    Angry,
    Content,
    Happy,
}

impl Mood {
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Angry => "angry",
            Mood::Content => "content",
            Mood::Happy => "happy",
        }
    }
}

impl FromStr for Mood {
    type Err = ();

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "angry" => Ok(Mood::Angry),
            "content" => Ok(Mood::Content),
            "happy" => Ok(Mood::Happy),
            _ => Err(()),
        }
    }
}

/// One term of a belief report as it arrives from an agent, with 1-based coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeliefReport {
    Mood(String),
    Fact {
        kind: String,
        x: i64,
        y: i64,
        /// Only meaningful for `position`; absent means the reporting agent.
        owner: Option<i64>,
    },
}

impl BeliefReport {
    pub fn mood(token: impl Into<String>) -> Self {
        BeliefReport::Mood(token.into())
    }

    pub fn fact(kind: impl Into<String>, x: i64, y: i64) -> Self {
        BeliefReport::Fact {
            kind: kind.into(),
            x,
            y,
            owner: None,
        }
    }

    pub fn position_of(owner: i64, x: i64, y: i64) -> Self {
        BeliefReport::Fact {
            kind: "position".to_string(),
            x,
            y,
            owner: Some(owner),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeliefEntry {
    pub kind: BeliefKind,
    pub position: Position,
}

/// What one agent last reported about the world.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BelievedWorld {
    pub entries: Vec<BeliefEntry>,
    pub mood: Option<Mood>,
}

impl BelievedWorld {
    /// Builds a believed world from a report. Unknown tokens and coordinates below 1
    /// are skipped.
    pub fn from_reports(reporter: Slot, reports: &[BeliefReport]) -> Self {
        let mut believed = BelievedWorld::default();
        for report in reports {
            match report {
                BeliefReport::Mood(token) => {
                    if let Ok(mood) = token.parse() {
                        believed.mood = Some(mood);
                    }
                }
                BeliefReport::Fact { kind, x, y, owner } => {
                    let owner = match owner {
                        Some(index) => match usize::try_from(*index).ok().and_then(Slot::new) {
                            Some(slot) => slot,
                            None => continue,
                        },
                        None => reporter,
                    };
                    let (Some(kind), Some(position)) = (
                        BeliefKind::parse(kind, owner),
                        Position::from_one_based(*x, *y),
                    ) else {
                        tracing::trace!(?report, "ignoring belief term");
                        continue;
                    };
                    believed.entries.push(BeliefEntry { kind, position });
                }
            }
        }
        believed
    }

    /// Entries claimed for a single tile.
    pub fn at(&self, position: Position) -> impl Iterator<Item = BeliefKind> + '_ {
        self.entries
            .iter()
            .filter(move |entry| entry.position == position)
            .map(|entry| entry.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub author: Slot,
    pub topic: String,
    pub message: String,
}

/// Short messages keyed by topic, oldest topic first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoticeBoard {
    notes: Vec<Note>,
}

impl NoticeBoard {
    /// Posts a note, replacing any note with the same topic.
    pub fn post(&mut self, author: Slot, topic: &str, message: &str) -> Result<(), ActionError> {
        if let Some(note) = self.notes.iter_mut().find(|note| note.topic == topic) {
            note.author = author;
            note.message = message.to_string();
            return Ok(());
        }
        if self.notes.len() >= MAX_NOTES {
            return Err(ActionError::NoticeBoardFull {
                capacity: MAX_NOTES,
            });
        }
        self.notes.push(Note {
            author,
            topic: topic.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }
}

/// Everything a renderer shows besides the real world.
#[derive(Debug, Clone, Default)]
pub struct Presentation {
    believed: HashMap<Slot, BelievedWorld>,
    pub notice_board: NoticeBoard,
}

impl Presentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the agent's believed world with a new report.
    pub fn surrender(&mut self, slot: Slot, reports: &[BeliefReport]) {
        let believed = BelievedWorld::from_reports(slot, reports);
        tracing::trace!(%slot, entries = believed.entries.len(), "beliefs surrendered");
        self.believed.insert(slot, believed);
    }

    pub fn believed_world(&self, slot: Slot) -> Option<&BelievedWorld> {
        self.believed.get(&slot)
    }
}
