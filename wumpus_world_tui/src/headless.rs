//! Line-oriented driver used when no terminal UI is wanted.
//!
//! Each input line is `<agent> <command> [args...]`:
//!
//! ```text
//! bob register
//! bob move up
//! bob gripper grab
//! bob perceive
//! bob note plan heading for the gold
//! ```
//!
//! Every line gets exactly one reply: `yes`, `no: <reason>` or a percept list.

use std::io::{BufRead, Write};

use anyhow::Result;
use wumpus_world_core::{ActionError, WumpusInterface};

pub fn run<R: BufRead, W: Write>(
    wumpus: &mut WumpusInterface,
    input: R,
    mut output: W,
) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let reply = execute(wumpus, line);
        tracing::debug!(command = line, reply = %reply, "command executed");
        writeln!(output, "{reply}")?;
    }
    output.flush()?;
    Ok(())
}

/// Runs one command line against the interface and returns the reply.
pub fn execute(wumpus: &mut WumpusInterface, line: &str) -> String {
    let mut words = line.split_whitespace();
    let (Some(agent), Some(command)) = (words.next(), words.next()) else {
        return "no: expected '<agent> <command>'".to_string();
    };
    let argument = words.next();

    match (command, argument) {
        ("register", _) => match wumpus.register(agent) {
            Some(_) => "yes".to_string(),
            None => "no: no room for more agents".to_string(),
        },
        ("move", Some(direction)) => answer(wumpus.move_agent(agent, direction)),
        ("gripper", Some(action)) => answer(wumpus.gripper(agent, action)),
        ("perceive", _) => match wumpus.perceive(agent) {
            Ok(percept) => format!("[{}]", percept.answers().join(", ")),
            Err(error) => format!("no: {error}"),
        },
        ("note", Some(topic)) => {
            let message = words.collect::<Vec<_>>().join(" ");
            answer(wumpus.add_note(agent, topic, &message))
        }
        ("move" | "gripper" | "note", None) => format!("no: '{command}' needs an argument"),
        (other, _) => format!("no: unknown command '{other}'"),
    }
}

fn answer<T>(result: Result<T, ActionError>) -> String {
    match result {
        Ok(_) => "yes".to_string(),
        Err(error) => format!("no: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use wumpus_world_core::{loader::load_world_from_string, world::WorldConfig};

    fn headless_world() -> WumpusInterface {
        let world = load_world_from_string(
            "BL BL BL WU\nBL BL PT BL\nBL GD BL BL\nCS BL BL BL",
            WorldConfig::default(),
        )
        .unwrap();
        WumpusInterface::headless(world)
    }

    #[test]
    fn test_script() {
        let mut wumpus = headless_world();
        let script = "\
# a short walk
bob register
bob perceive
bob move right
bob move up
bob perceive
bob gripper grab
bob gripper grab
bob move right
bob move up
bob perceive
bob move left
";
        let mut output = Vec::new();
        run(&mut wumpus, Cursor::new(script), &mut output).unwrap();
        let replies: Vec<_> = String::from_utf8(output).unwrap().lines().map(String::from).collect();
        assert_eq!(
            replies,
            vec![
                "yes",
                "[no, no, no, no]",
                "yes",
                "yes",
                "[no, yes, no, no]",
                "yes",
                "no: Already carrying gold.",
                "yes",
                "yes",
                "[no, no, no, yes]",
                "no: Agent is dead.",
            ]
        );
    }

    #[test]
    fn test_bad_input() {
        let mut wumpus = headless_world();
        assert_eq!(execute(&mut wumpus, "bob"), "no: expected '<agent> <command>'");
        assert_eq!(execute(&mut wumpus, "bob move up"), "no: Agent not registered.");
        assert_eq!(execute(&mut wumpus, "bob register"), "yes");
        assert_eq!(execute(&mut wumpus, "bob move"), "no: 'move' needs an argument");
        assert_eq!(
            execute(&mut wumpus, "bob move sideways"),
            "no: Not a valid move direction: sideways"
        );
        assert_eq!(execute(&mut wumpus, "bob dance"), "no: unknown command 'dance'");
    }

    #[test]
    fn test_capacity_and_notes() {
        let mut wumpus = headless_world();
        for name in ["a", "b", "c", "d"] {
            assert_eq!(execute(&mut wumpus, &format!("{name} register")), "yes");
        }
        assert_eq!(execute(&mut wumpus, "e register"), "no: no room for more agents");
        assert_eq!(execute(&mut wumpus, "e perceive"), "no: Agent not registered.");
        // Without a renderer notes are accepted and dropped.
        assert_eq!(execute(&mut wumpus, "a note plan go east now"), "yes");
    }
}
