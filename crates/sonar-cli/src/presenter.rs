//! Text radar drawn in the terminal.

use std::collections::HashMap;
use std::io::{self, Stdout, Write};

use crossterm::cursor::{Hide, MoveTo, MoveToNextLine, Show};
use crossterm::style::Print;
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use owo_colors::OwoColorize;
use sonar_core::{
    ActorKind, ActorTracker, BlipFrame, BlipStyle, Presenter, TickSummary, TrackedActor, Visuals,
};
use tracing::debug;

/// Handle for one actor's row in the console radar.
#[derive(Debug)]
pub struct ConsoleBlip {
    id: u64,
}

pub struct ConsolePresenter {
    next_id: u64,
    frames: HashMap<u64, BlipFrame>,
    out: Stdout,
}

impl ConsolePresenter {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            frames: HashMap::new(),
            out: io::stdout(),
        }
    }

    pub fn blip_count(&self) -> usize {
        self.frames.len()
    }

    /// Redraw the whole screen.
    pub fn render(
        &mut self,
        tracker: &ActorTracker<ConsolePresenter>,
        summary: &TickSummary,
    ) -> io::Result<()> {
        let view = tracker.viewpoint();
        let radar = tracker.radar();
        let [x, y, z] = view.position;

        queue!(self.out, MoveTo(0, 0), Clear(ClearType::All))?;
        let header = format!(
            "heading {:>4.0}°  X {:.0}  Y {:.0}  Z {:.0}  range {:.0}m",
            tracker.transform().heading_degrees(),
            x / 100.0,
            y / 100.0,
            z / 100.0,
            radar.range() / 100.0
        );
        queue!(self.out, Print(header.bold()), MoveToNextLine(1))?;
        let status = format!(
            "{} tracked / {} live   [Up/Down] zoom  [q] quit",
            summary.tracked, summary.live
        );
        queue!(self.out, Print(status.dimmed()), MoveToNextLine(2))?;

        let (_, rows) = terminal::size().unwrap_or((80, 24));
        let capacity = (rows as usize).saturating_sub(4);
        let scale = radar.range() / radar.radius();

        for frame in visible_frames(self.frames.values(), radar.radius())
            .into_iter()
            .take(capacity)
        {
            let line = format_blip_line(frame, scale);
            queue!(self.out, Print(colorize(frame, &line)), MoveToNextLine(1))?;
        }

        self.out.flush()
    }
}

impl Default for ConsolePresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for ConsolePresenter {
    type Blip = ConsoleBlip;

    fn create(&mut self, actor: &TrackedActor, style: BlipStyle) -> ConsoleBlip {
        self.next_id += 1;
        debug!(
            "Blip {} for {} {} ({:?})",
            self.next_id,
            actor.kind(),
            actor.type_name(),
            style
        );
        ConsoleBlip { id: self.next_id }
    }

    fn update(&mut self, blip: &mut ConsoleBlip, frame: &BlipFrame) {
        self.frames.insert(blip.id, frame.clone());
    }

    fn release(&mut self, blip: ConsoleBlip) {
        self.frames.remove(&blip.id);
    }
}

/// Frames that land on the radar, nearest first.
fn visible_frames<'a>(
    frames: impl Iterator<Item = &'a BlipFrame>,
    radius: f64,
) -> Vec<&'a BlipFrame> {
    let mut visible: Vec<&BlipFrame> = frames
        .filter(|frame| frame.screen.distance() <= radius)
        .collect();
    visible.sort_by(|a, b| a.screen.distance().total_cmp(&b.screen.distance()));
    visible
}

/// Clockwise angle from straight ahead.
fn bearing_degrees(frame: &BlipFrame) -> f64 {
    frame.screen.x.atan2(frame.screen.y).to_degrees().rem_euclid(360.0)
}

fn glyph(frame: &BlipFrame) -> char {
    match frame.visuals {
        Visuals::Player { is_ghost: true, .. } => '○',
        Visuals::Player { .. } => '●',
        Visuals::Npc { .. } => '◆',
        Visuals::Marker => '×',
    }
}

fn format_blip_line(frame: &BlipFrame, scale: f64) -> String {
    let meters = frame.screen.distance() * scale / 100.0;
    let label = frame.label.replace('\n', " ");
    let health = match frame.visuals {
        Visuals::Player {
            health_fraction,
            is_ghost: false,
        } => format!(" [{:>3.0}%]", health_fraction * 100.0),
        _ => String::new(),
    };
    let marker = format!(
        "{} {:>3.0}° {:>5.0}m",
        glyph(frame),
        bearing_degrees(frame),
        meters
    );
    match frame.visuals {
        // label on the other side of the marker
        Visuals::Npc { invert_label: true } => format!("{}{}  {}", label, health, marker),
        _ => format!("{}  {}{}", marker, label, health),
    }
}

fn colorize(frame: &BlipFrame, line: &str) -> String {
    let colored = match (frame.kind, frame.visuals) {
        (_, Visuals::Player { is_ghost: true, .. }) => line.bright_black().to_string(),
        (ActorKind::Player, _) => line.green().to_string(),
        (ActorKind::Npc, _) => line.yellow().to_string(),
        (ActorKind::Mesh, _) | (ActorKind::Generic, _) => line.white().to_string(),
    };
    if frame.alpha < 255 {
        colored.dimmed().to_string()
    } else {
        colored
    }
}

/// Raw mode and alternate screen for the lifetime of the radar.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}
