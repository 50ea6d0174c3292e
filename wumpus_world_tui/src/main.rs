use anyhow::Result;
use clap::Parser;
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    collections::BTreeSet,
    fs::File,
    io::{self, Stdout},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::EnvFilter;
use wumpus_world_core::{
    ActionError, DropOutcome, GripperOutcome, MoveOutcome, Position, Slot, WumpusInterface,
    beliefs::{BeliefKind, BeliefReport, Mood, Presentation},
    loader::load_world_from_file,
    map::Terrain,
    world::{DropPolicy, World, WorldConfig},
};

mod headless;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Map file to load
    #[arg(short, long, value_name = "MAP_FILE")]
    map: Option<PathBuf>,
    /// Agents to register at start-up, in slot order
    #[arg(short, long = "agent", value_name = "NAME", default_value = "agent1")]
    agents: Vec<String>,
    /// Put gold dropped outside a chest back on the tile instead of discarding it
    #[arg(long)]
    strict_drop: bool,
    /// Read agent commands from stdin instead of opening the terminal UI
    #[arg(long)]
    headless: bool,
    /// Log file used while the terminal UI owns the screen
    #[arg(long, value_name = "LOG_FILE", default_value = "wumpus_world.log")]
    log_file: PathBuf,
}

/// What the keyboard-driven agents have sensed so far, surrendered as their beliefs.
#[derive(Default)]
struct Memory {
    visited: BTreeSet<(usize, usize)>,
    breezes: BTreeSet<(usize, usize)>,
    stenches: BTreeSet<(usize, usize)>,
}

impl Memory {
    fn reports(&self, here: Position, mood: Mood) -> Vec<BeliefReport> {
        let one_based = |&(x, y): &(usize, usize)| (x as i64 + 1, y as i64 + 1);
        let mut reports: Vec<BeliefReport> = Vec::new();
        for (kind, tiles) in [
            ("visited", &self.visited),
            ("breeze", &self.breezes),
            ("stench", &self.stenches),
        ] {
            reports.extend(tiles.iter().map(|tile| {
                let (x, y) = one_based(tile);
                BeliefReport::fact(kind, x, y)
            }));
        }
        let (x, y) = one_based(&(here.x, here.y));
        reports.push(BeliefReport::fact("position", x, y));
        reports.push(BeliefReport::mood(mood.as_str()));
        reports
    }
}

struct App {
    /// The world behind the agent action interface.
    wumpus: WumpusInterface,
    /// Registered agents the keyboard can drive, in slot order.
    agents: Vec<(String, Slot)>,
    memories: Vec<Memory>,
    /// Index into `agents` of the agent receiving key presses.
    selected: usize,
    /// Reply to the last action.
    status: String,
    /// Flag to control the main loop.
    should_quit: bool,
}

impl App {
    fn new(world: World, identifiers: &[String]) -> Self {
        let mut wumpus = WumpusInterface::new(world);
        let agents = register_all(&mut wumpus, identifiers);
        let memories = agents.iter().map(|_| Memory::default()).collect();
        App {
            wumpus,
            agents,
            memories,
            selected: 0,
            status: "Arrows move, g grab, d drop, p perceive, Tab next agent.".to_string(),
            should_quit: false,
        }
    }

    fn selected_identifier(&self) -> Option<String> {
        self.agents.get(self.selected).map(|(name, _)| name.clone())
    }

    fn next_agent(&mut self) {
        if !self.agents.is_empty() {
            self.selected = (self.selected + 1) % self.agents.len();
        }
    }

    fn move_selected(&mut self, direction: &str) {
        let Some(name) = self.selected_identifier() else {
            return;
        };
        self.status = match self.wumpus.move_agent(&name, direction) {
            Ok(MoveOutcome::Moved(p)) => format!("{name}: moved to {p}"),
            Ok(MoveOutcome::Died(p)) => format!("{name}: moved to {p} and died"),
            Err(error) => failure(&name, &error),
        };
    }

    fn gripper_selected(&mut self, action: &str) {
        let Some(name) = self.selected_identifier() else {
            return;
        };
        self.status = match self.wumpus.gripper(&name, action) {
            Ok(GripperOutcome::Grabbed) => format!("{name}: grabbed the gold"),
            Ok(GripperOutcome::Dropped(DropOutcome::Delivered)) => {
                format!("{name}: delivered the gold")
            }
            Ok(GripperOutcome::Dropped(_)) => format!("{name}: dropped the gold"),
            Err(error) => failure(&name, &error),
        };
    }

    /// Perceives, then hands what the agent has learned so far to the belief overlay.
    fn perceive_selected(&mut self) {
        let Some((name, slot)) = self.agents.get(self.selected).cloned() else {
            return;
        };
        let percept = match self.wumpus.perceive(&name) {
            Ok(percept) => percept,
            Err(error) => {
                self.status = failure(&name, &error);
                return;
            }
        };
        let Some(agent) = self.wumpus.world().agent(slot) else {
            return;
        };
        let here = agent.position;
        let mood = if percept.death {
            Mood::Angry
        } else if self.wumpus.world().gold_delivered() > 0 {
            Mood::Happy
        } else {
            Mood::Content
        };

        let memory = &mut self.memories[self.selected];
        memory.visited.insert((here.x, here.y));
        if percept.breeze {
            memory.breezes.insert((here.x, here.y));
        }
        if percept.stench {
            memory.stenches.insert((here.x, here.y));
        }
        let reports = memory.reports(here, mood);

        let [breeze, glitter, stench, death] = percept.answers();
        let summary = format!("breeze={breeze} glitter={glitter} stench={stench} death={death}");
        let outcome = self
            .wumpus
            .surrender_beliefs(&name, &reports)
            .and_then(|()| self.wumpus.add_note(&name, "percept", &summary));
        self.status = match outcome {
            Ok(()) => format!("{name}: {summary}"),
            Err(error) => failure(&name, &error),
        };
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn failure(name: &str, error: &ActionError) -> String {
    format!("{name}: failed, {error}")
}

/// Registers every identifier, skipping those the world has no room for.
fn register_all(wumpus: &mut WumpusInterface, identifiers: &[String]) -> Vec<(String, Slot)> {
    let mut agents: Vec<(String, Slot)> = Vec::new();
    for identifier in identifiers {
        match wumpus.register(identifier) {
            Some(slot) if !agents.iter().any(|(_, s)| *s == slot) => {
                agents.push((identifier.clone(), slot));
            }
            Some(_) => {}
            None => tracing::warn!(%identifier, "agent not registered, world is full"),
        }
    }
    agents
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    init_tracing(&args)?;

    // If no map file is provided, use the default map
    let map_file = args
        .map
        .clone()
        .unwrap_or(PathBuf::from("maps/standard_wumpus.txt"));
    // Ensure the map file exists
    if !map_file.exists() {
        return Err(anyhow::anyhow!(
            "Map file does not exist: {}",
            map_file.display()
        ));
    }
    let config = WorldConfig {
        drop_policy: if args.strict_drop {
            DropPolicy::ReturnToTile
        } else {
            DropPolicy::Anywhere
        },
    };
    let world = load_world_from_file(&map_file, config)?;

    if args.headless {
        let mut wumpus = WumpusInterface::headless(world);
        register_all(&mut wumpus, &args.agents);
        return headless::run(&mut wumpus, io::stdin().lock(), io::stdout().lock());
    }

    // Set up the terminal
    let mut terminal = setup_terminal()?;

    // Create the application state
    let mut app = App::new(world, &args.agents);

    // Run the main application loop
    let result = run_app(&mut terminal, &mut app);

    // Restore the terminal state
    restore_terminal(&mut terminal)?;

    result
}

/// Sends logs to stderr in headless mode and to the log file otherwise.
fn init_tracing(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let result = if args.headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init()
    } else {
        let file = File::create(&args.log_file)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
    };
    result.map_err(|error| anyhow::anyhow!("Failed to set up logging: {error}"))
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?; // Put terminal in raw mode
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?; // Use alternate screen and enable mouse capture
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into) // Map io::Error to anyhow::Error
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
///
/// The world only changes on key presses, so the loop just redraws and waits.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let poll_rate = Duration::from_millis(250);

    loop {
        // Draw the UI
        terminal.draw(|f| ui(f, app))?;

        // Poll for events (keyboard, mouse, etc.)
        if crossterm::event::poll(poll_rate)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                    KeyCode::Up => app.move_selected("up"),
                    KeyCode::Down => app.move_selected("down"),
                    KeyCode::Left => app.move_selected("left"),
                    KeyCode::Right => app.move_selected("right"),
                    KeyCode::Char('g') => app.gripper_selected("grab"),
                    KeyCode::Char('d') => app.gripper_selected("drop"),
                    KeyCode::Char('p') => app.perceive_selected(),
                    KeyCode::Tab => app.next_agent(),
                    _ => {}
                }
            }
        }

        // Exit loop if requested
        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(55), // Area for the maps
            Constraint::Percentage(35), // Area for agents and notes
            Constraint::Percentage(10), // Area for status/help
        ])
        .split(frame.area());

    let map_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main_layout[0]);
    let info_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main_layout[1]);

    let world = app.wumpus.world();
    let selected = app.agents.get(app.selected).map(|(_, slot)| *slot);

    render_world(frame, map_layout[0], world);
    render_beliefs(frame, map_layout[1], world, app.wumpus.presentation(), selected);
    render_agents(frame, info_layout[0], app);
    render_notes(frame, info_layout[1], app);

    let last_failure = match world.last_failure() {
        Some(reason) => Line::from(format!("Last action failed: {reason}")).red(),
        None => Line::from("Press 'q' or 'Esc' to quit.").dim(),
    };
    let status = Paragraph::new(vec![Line::from(app.status.as_str()), last_failure])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status, main_layout[2]);
}

fn agent_color(slot: Slot) -> Color {
    match slot.index() {
        0 => Color::Blue,
        1 => Color::Red,
        2 => Color::Green,
        _ => Color::Magenta,
    }
}

fn terrain_span(tile: Terrain) -> Span<'static> {
    match tile {
        Terrain::Empty => Span::raw(". "),
        Terrain::Wall => Span::styled("# ", Style::default().fg(Color::DarkGray)),
        Terrain::Pit => Span::styled("O ", Style::default().fg(Color::Cyan)),
        Terrain::Wumpus => Span::styled("W ", Style::default().fg(Color::Red).bold()),
        Terrain::Gold => Span::styled("$ ", Style::default().fg(Color::Yellow).bold()),
        Terrain::Chest => Span::styled("C ", Style::default().fg(Color::Yellow)),
    }
}

/// Renders the real world onto the frame. Row `height - 1` is drawn first since y grows upward.
fn render_world(frame: &mut Frame, area: Rect, world: &World) {
    let terrain = world.terrain();
    let mut lines: Vec<Line> = Vec::with_capacity(terrain.height());

    for y in (0..terrain.height()).rev() {
        let mut spans: Vec<Span> = Vec::with_capacity(terrain.width());
        for x in 0..terrain.width() {
            let position = Position { x, y };
            // Agents are drawn over the terrain, the lowest slot on top.
            let agent_span = world.agents().find(|a| a.position == position).map(|agent| {
                let mut style = Style::default().fg(agent_color(agent.slot)).bold();
                if !agent.is_alive() {
                    style = style.crossed_out();
                }
                Span::styled(format!("{} ", agent.slot.index() + 1), style)
            });
            spans.push(agent_span.unwrap_or_else(|| terrain_span(terrain[position])));
        }
        lines.push(Line::from(spans));
    }

    let title = format!(
        "Wumpus World  gold left: {}  delivered: {}",
        world.gold_remaining(),
        world.gold_delivered()
    );
    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().title(title).borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(map_paragraph, area);
}

fn belief_span(kinds: &[BeliefKind]) -> Span<'static> {
    if let Some(BeliefKind::Agent(slot)) = kinds.iter().find(|k| matches!(k, BeliefKind::Agent(_))) {
        return Span::styled(
            format!("{} ", slot.index() + 1),
            Style::default().fg(agent_color(*slot)),
        );
    }
    // Strongest claim wins when several are made for one tile.
    let shown = [
        BeliefKind::Wumpus,
        BeliefKind::Pit,
        BeliefKind::Gold,
        BeliefKind::Chest,
        BeliefKind::Stench,
        BeliefKind::Breeze,
        BeliefKind::Safe,
        BeliefKind::Visited,
    ]
    .into_iter()
    .find(|kind| kinds.contains(kind));
    match shown {
        Some(BeliefKind::Wumpus) => Span::styled("W ", Style::default().fg(Color::Red)),
        Some(BeliefKind::Pit) => Span::styled("O ", Style::default().fg(Color::Cyan)),
        Some(BeliefKind::Gold) => Span::styled("$ ", Style::default().fg(Color::Yellow)),
        Some(BeliefKind::Chest) => Span::styled("C ", Style::default().fg(Color::Yellow)),
        Some(BeliefKind::Stench) => Span::styled("s ", Style::default().fg(Color::Red)),
        Some(BeliefKind::Breeze) => Span::styled("b ", Style::default().fg(Color::Cyan)),
        Some(BeliefKind::Safe) => Span::styled("+ ", Style::default().fg(Color::Green)),
        Some(BeliefKind::Visited) => Span::raw(". "),
        _ => Span::styled("? ", Style::default().fg(Color::DarkGray)),
    }
}

/// Renders what the selected agent believes, on a grid the size of the real one.
fn render_beliefs(
    frame: &mut Frame,
    area: Rect,
    world: &World,
    presentation: Option<&Presentation>,
    selected: Option<Slot>,
) {
    let believed = selected.and_then(|slot| presentation?.believed_world(slot));
    let terrain = world.terrain();
    let mut lines: Vec<Line> = Vec::with_capacity(terrain.height());
    for y in (0..terrain.height()).rev() {
        let spans: Vec<Span> = (0..terrain.width())
            .map(|x| {
                let kinds: Vec<BeliefKind> = believed
                    .map(|b| b.at(Position { x, y }).collect())
                    .unwrap_or_default();
                belief_span(&kinds)
            })
            .collect();
        lines.push(Line::from(spans));
    }

    let mood = believed
        .and_then(|b| b.mood)
        .map_or("unknown", Mood::as_str);
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(format!("Believed world  mood: {mood}"))
                .borders(Borders::ALL),
        )
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Renders the state of each agent onto the frame.
fn render_agents(frame: &mut Frame, area: Rect, app: &App) {
    let world = app.wumpus.world();
    let items: Vec<ListItem> = app
        .agents
        .iter()
        .enumerate()
        .filter_map(|(index, (name, slot))| {
            let agent = world.agent(*slot)?;
            let marker = if index == app.selected { "> " } else { "  " };
            let state = if agent.is_alive() { "alive" } else { "dead" };
            let gold = if agent.carrying_gold { " carrying gold" } else { "" };
            let text = format!(
                "{marker}{} {name} at ({}, {}) {state}{gold}",
                agent.slot.index() + 1,
                agent.position.x + 1,
                agent.position.y + 1,
            );
            Some(ListItem::new(Span::styled(
                text,
                Style::default().fg(agent_color(*slot)),
            )))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Agents"));
    frame.render_widget(list, area);
}

/// Renders the notice board onto the frame.
fn render_notes(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .wumpus
        .presentation()
        .map(|presentation| presentation.notice_board.notes())
        .unwrap_or_default()
        .iter()
        .map(|note| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} {}: ", note.author.index() + 1, note.topic),
                    Style::default().fg(agent_color(note.author)).bold(),
                ),
                Span::raw(note.message.clone()),
            ]))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Notes"));
    frame.render_widget(list, area);
}
