//! Text map loading.
//!
//! A map is a block of whitespace separated two-letter codes, one line per row.
//! The first line is the top row, so the last line ends up at `y = 0`.
//!
//! | Code | Tile |
//! |------|------|
//! | `BL` | empty |
//! | `WL` | wall |
//! | `PT` | pit |
//! | `WU` | wumpus |
//! | `GD` | gold |
//! | `CH` | chest |
//! | `ST` | empty, agents spawn here |
//! | `CS` | chest, agents spawn here |

use std::path::Path;

use crate::{
    Position,
    map::{Grid, Terrain},
    registry::MAX_AGENTS,
    world::{World, WorldConfig, WorldError},
};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Map is empty.")]
    Empty,
    #[error("Inconsistent width at line {line}: expected {expected}, found {found}")]
    InconsistentWidth {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("Unknown map code '{code}' at line {line}, column {column}.")]
    UnknownCode {
        code: String,
        line: usize,
        column: usize,
    },
    #[error("Map has {0} spawn points, at most {max} are allowed.", max = MAX_AGENTS)]
    TooManySpawns(usize),
    #[error(transparent)]
    World(#[from] WorldError),
    #[error("Failed to read map file: {0}")]
    Io(#[from] std::io::Error),
}

/// Parses a map into its terrain grid and spawn points, without building a world.
pub fn parse_map(map_string: &str) -> Result<(Grid<Terrain>, Vec<Position>), LoadError> {
    let lines: Vec<&str> = map_string
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return Err(LoadError::Empty);
    }

    let mut rows: Vec<Vec<&str>> = Vec::with_capacity(lines.len());
    for (line, text) in lines.iter().enumerate() {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if let Some(first) = rows.first() {
            if tokens.len() != first.len() {
                return Err(LoadError::InconsistentWidth {
                    line: line + 1,
                    expected: first.len(),
                    found: tokens.len(),
                });
            }
        }
        rows.push(tokens);
    }
    let height = rows.len();
    let width = rows[0].len();

    let mut terrain = Grid::new(width, height);
    let mut spawns = Vec::new();
    for (line, tokens) in rows.iter().enumerate() {
        let y = height - 1 - line;
        for (x, code) in tokens.iter().enumerate() {
            let position = Position { x, y };
            let (tile, spawn) = match *code {
                "BL" => (Terrain::Empty, false),
                "WL" => (Terrain::Wall, false),
                "PT" => (Terrain::Pit, false),
                "WU" => (Terrain::Wumpus, false),
                "GD" => (Terrain::Gold, false),
                "CH" => (Terrain::Chest, false),
                "ST" => (Terrain::Empty, true),
                "CS" => (Terrain::Chest, true),
                unknown => {
                    return Err(LoadError::UnknownCode {
                        code: unknown.to_string(),
                        line: line + 1,
                        column: x + 1,
                    });
                }
            };
            terrain[position] = tile;
            if spawn {
                spawns.push(position);
            }
        }
    }
    if spawns.len() > MAX_AGENTS {
        return Err(LoadError::TooManySpawns(spawns.len()));
    }
    // Stable order regardless of row direction: bottom-left first.
    spawns.sort_by_key(|p| (p.y, p.x));
    Ok((terrain, spawns))
}

/// Loads a world from a string representation of a map.
pub fn load_world_from_string(map_string: &str, config: WorldConfig) -> Result<World, LoadError> {
    let (terrain, spawns) = parse_map(map_string)?;
    let world = World::new(terrain, spawns, config)?;
    tracing::info!(
        width = world.terrain().width(),
        height = world.terrain().height(),
        spawns = world.spawns().len(),
        "world loaded"
    );
    Ok(world)
}

pub fn load_world_from_file(path: &Path, config: WorldConfig) -> Result<World, LoadError> {
    let content = std::fs::read_to_string(path)?;
    load_world_from_string(&content, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STANDARD: &str = "
        BL BL BL PT
        WU GD PT BL
        BL BL BL BL
        CS BL PT BL
    ";

    #[test]
    fn test_rows_are_flipped() {
        let (terrain, spawns) = parse_map(STANDARD).unwrap();
        assert_eq!((terrain.width(), terrain.height()), (4, 4));
        assert_eq!(terrain[Position::new(0, 0)], Terrain::Chest);
        assert_eq!(terrain[Position::new(2, 0)], Terrain::Pit);
        assert_eq!(terrain[Position::new(0, 2)], Terrain::Wumpus);
        assert_eq!(terrain[Position::new(1, 2)], Terrain::Gold);
        assert_eq!(terrain[Position::new(3, 3)], Terrain::Pit);
        assert_eq!(spawns, vec![Position::new(0, 0)]);
    }

    #[test]
    fn test_load_world() {
        let world = load_world_from_string(STANDARD, WorldConfig::default()).unwrap();
        assert_eq!(world.gold_remaining(), 1);
        assert_eq!(world.agents().count(), 0);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse_map("  \n \n"), Err(LoadError::Empty)));
        assert!(matches!(
            parse_map("BL BL\nBL"),
            Err(LoadError::InconsistentWidth {
                line: 2,
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            parse_map("BL XX"),
            Err(LoadError::UnknownCode { ref code, line: 1, column: 2 }) if code == "XX"
        ));
        assert!(matches!(
            parse_map("ST ST ST\nST ST BL"),
            Err(LoadError::TooManySpawns(5))
        ));
        assert!(matches!(
            load_world_from_string("BL PT", WorldConfig::default()),
            Err(LoadError::World(WorldError::NoSpawnPoint))
        ));
    }

    #[test]
    fn test_multiple_spawns_sorted() {
        let (_, spawns) = parse_map("ST BL\nBL ST").unwrap();
        assert_eq!(spawns, vec![Position::new(1, 0), Position::new(0, 1)]);
    }

    #[test]
    fn test_missing_file() {
        let result = load_world_from_file(
            Path::new("definitely/not/a/map.txt"),
            WorldConfig::default(),
        );
        assert!(matches!(result, Err(LoadError::Io(_))));
    }
}
