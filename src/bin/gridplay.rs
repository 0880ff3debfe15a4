use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use gridplay::present::cue::Cue;
use gridplay::present::narration::{Narrator, Utterance};
use gridplay::{
    Board, DisplayMode, Event, FrameLoop, GridPos, ManualTime, MonotonicTime, PlaybackObserver,
    PlayerSession, Preferences, Scene, Speed, TimeSource, format_time,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "gridplay", version)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect the format and summarise the scenes of a document.
    Inspect(InspectArgs),
    /// List every scene's events in timeline order.
    Timeline(TimelineArgs),
    /// Play a document headlessly, printing reveals, bubbles and scene changes.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input JSON document.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Print the normalized document as JSON instead of a summary.
    #[arg(long)]
    json: bool,

    /// Also draw the grid of each scene.
    #[arg(long)]
    board: bool,

    /// How `--board` draws occupied cells.
    #[arg(long, value_enum, default_value_t = DisplayChoice::Symbolic)]
    display: DisplayChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DisplayChoice {
    Symbolic,
    Iconographic,
}

impl From<DisplayChoice> for DisplayMode {
    fn from(c: DisplayChoice) -> Self {
        match c {
            DisplayChoice::Symbolic => DisplayMode::Symbolic,
            DisplayChoice::Iconographic => DisplayMode::Iconographic,
        }
    }
}

#[derive(Parser, Debug)]
struct TimelineArgs {
    /// Input JSON document.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Input JSON document.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Scene to start from (0-based).
    #[arg(long, default_value_t = 0)]
    scene: usize,

    /// Playback speed: 0.5, 1, 2 or 4 (overrides preferences).
    #[arg(long)]
    speed: Option<Speed>,

    /// Play every scene at once instead of in sequence.
    #[arg(long, conflicts_with = "auto")]
    all: bool,

    /// Auto-play from the first scene.
    #[arg(long)]
    auto: bool,

    /// Print narration lines.
    #[arg(long)]
    narrate: bool,

    /// Pace frames in real time instead of virtual time.
    #[arg(long)]
    realtime: bool,

    /// Frames per second of the driving loop.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Preferences file.
    #[arg(long)]
    prefs: Option<PathBuf>,

    /// Write the effective preferences back to `--prefs` after playing.
    #[arg(long, requires = "prefs")]
    save_prefs: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Timeline(args) => cmd_timeline(args),
        Command::Play(args) => cmd_play(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "gridplay=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load into a fresh session; `None` when the document had no scenes.
fn load_session(path: &Path, prefs: &Preferences) -> anyhow::Result<Option<PlayerSession>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read document '{}'", path.display()))?;
    let mut session = PlayerSession::new(prefs);
    let outcome = session
        .load(&text)
        .with_context(|| format!("load '{}'", path.display()))?;
    for d in outcome.diagnostics() {
        eprintln!("{d}");
    }
    if let Some(w) = outcome.warning() {
        eprintln!("warning: {w}");
        return Ok(None);
    }
    Ok(Some(session))
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let Some(session) = load_session(&args.in_path, &Preferences::default())? else {
        return Ok(());
    };
    let Some(doc) = session.document() else {
        return Ok(());
    };
    if args.json {
        let json = serde_json::to_string_pretty(doc).context("serialize document")?;
        println!("{json}");
        return Ok(());
    }

    println!("{} ({})", doc.title, doc.kind);
    println!(
        "{} scenes, {} total",
        doc.scenes.len(),
        format_time(doc.total_duration())
    );
    let mode = DisplayMode::from(args.display);
    for scene in &doc.scenes {
        let s = scene.summary();
        println!(
            "{:>3}  {:<12} {} - {}  ({} events, {} elements, {})",
            s.number,
            scene.id,
            s.title,
            scene.subtitle,
            s.events,
            s.elements,
            format_time(s.duration)
        );
        if args.board {
            print!("{}", Board::from_scene(scene).render_text(mode));
        }
    }
    Ok(())
}

fn cmd_timeline(args: TimelineArgs) -> anyhow::Result<()> {
    let Some(session) = load_session(&args.in_path, &Preferences::default())? else {
        return Ok(());
    };
    let Some(doc) = session.document() else {
        return Ok(());
    };
    for (scene, offset) in doc.scenes.iter().zip(doc.scene_offsets()) {
        println!("# {} {} @ {}", scene.number, scene.title, format_time(offset));
        for event in &scene.timeline {
            println!("  {}", describe_event(event, offset));
        }
    }
    Ok(())
}

/// One line per event with absolute start and end times.
fn describe_event(event: &Event, offset: f64) -> String {
    let window = format!(
        "[{:>6.1}s-{:>6.1}s]",
        offset + event.start(),
        offset + event.end()
    );
    let (kind, target) = (&event.kind, &event.target_element_id);
    match event.text() {
        Some(text) => format!("{window} {kind} {target}: {text}"),
        None => format!("{window} {kind} {target}"),
    }
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let mut prefs = match &args.prefs {
        Some(path) => Preferences::load_or_default(path),
        None => Preferences::default(),
    };
    if let Some(speed) = args.speed {
        prefs.speed = speed;
    }
    prefs.narration |= args.narrate;

    let Some(session) = load_session(&args.in_path, &prefs)? else {
        return Ok(());
    };
    let mut session = session.with_narrator(Box::new(PrintNarrator));

    let scenes = session.scenes().to_vec();
    let offsets = session.document().map(|d| d.scene_offsets()).unwrap_or_default();
    let mut printer = ConsolePrinter::new(&scenes, &offsets);

    let mut time: Box<dyn TimeSource> = if args.realtime {
        Box::new(MonotonicTime::new())
    } else {
        Box::new(ManualTime::default())
    };
    let t0 = time.now();
    if args.all {
        session.play_all(t0)?;
    } else if args.auto {
        session.start_auto_play(t0)?;
    } else {
        session.navigate(args.scene)?;
        session.toggle_play(t0)?;
    }

    // Generous cap so a stuck loop cannot spin forever.
    let budget = session.total_duration() / prefs.speed.get() * 2.0 + 5.0;
    let max_frames = (budget * f64::from(args.fps)).ceil() as u64;
    let frames = FrameLoop::new(args.fps)?
        .max_frames(max_frames)
        .run(time.as_mut(), |now| session.frame(now, &mut printer));

    eprintln!(
        "played {frames} frames at {}, stopped at {}",
        session.state().speed,
        format_time(session.global_elapsed())
    );

    if args.save_prefs
        && let Some(path) = &args.prefs
    {
        session
            .preferences()
            .save(path)
            .with_context(|| format!("save preferences '{}'", path.display()))?;
    }
    Ok(())
}

/// Prints clock transitions as timestamped lines with their audio cue.
///
/// Keeps a board per scene so bubbles land in the cell a viewer would draw them in.
struct ConsolePrinter<'a> {
    scenes: &'a [Scene],
    offsets: &'a [f64],
    boards: Vec<Board>,
    /// Placed bubbles: (scene, row, col, expiry in scene time).
    bubbles: Vec<(usize, usize, usize, f64)>,
    flashed: BTreeSet<(usize, usize)>,
    positions: BTreeMap<(usize, usize), GridPos>,
}

impl<'a> ConsolePrinter<'a> {
    fn new(scenes: &'a [Scene], offsets: &'a [f64]) -> Self {
        Self {
            scenes,
            offsets,
            boards: scenes.iter().map(Board::from_scene).collect(),
            bubbles: Vec::new(),
            flashed: BTreeSet::new(),
            positions: BTreeMap::new(),
        }
    }

    fn at(&self, scene: usize, event: usize) -> Option<(f64, &'a Event)> {
        let e = self.scenes.get(scene)?.timeline.get(event)?;
        Some((self.offset(scene) + e.start(), e))
    }

    fn offset(&self, scene: usize) -> f64 {
        self.offsets.get(scene).copied().unwrap_or(0.0)
    }

    /// Remove bubbles of `scene` whose lifetime ran out by scene time `t`.
    fn expire_bubbles(&mut self, scene: usize, t: f64) {
        let boards = &mut self.boards;
        self.bubbles.retain(|&(s, row, col, until)| {
            let keep = s != scene || t < until;
            if !keep && let Some(board) = boards.get_mut(s) {
                board.clear_cell(row, col);
            }
            keep
        });
    }

    fn reset_scene(&mut self, scene: usize) {
        if let (Some(board), Some(src)) = (self.boards.get_mut(scene), self.scenes.get(scene)) {
            *board = Board::from_scene(src);
        }
        self.bubbles.retain(|b| b.0 != scene);
        self.flashed.retain(|k| k.0 != scene);
        self.positions.retain(|k, _| k.0 != scene);
    }
}

fn cell_label((row, col): (usize, usize)) -> String {
    format!("{},{}", row + 1, col + 1)
}

impl PlaybackObserver for ConsolePrinter<'_> {
    fn on_event_revealed(&mut self, scene: usize, event: usize) {
        if let Some((t, e)) = self.at(scene, event) {
            println!(
                "{} reveal  s{}#{} {} {}  [{}]",
                format_time(t),
                scene + 1,
                event,
                e.kind,
                e.target_element_id,
                Cue::Reveal
            );
        }
    }

    fn on_event_active(&mut self, scene: usize, event: usize, scene_time: f64) {
        self.expire_bubbles(scene, scene_time);
        let Some((_, e)) = self.at(scene, event) else {
            return;
        };
        let now = format_time(self.offset(scene) + scene_time);
        let target = e.target_element_id.as_str();

        if !target.is_empty() && self.flashed.insert((scene, event)) {
            let cells: Vec<String> = self
                .boards
                .get(scene)
                .map(|b| b.matching_cells(target))
                .unwrap_or_default()
                .into_iter()
                .map(|c| cell_label((c.row, c.col)))
                .collect();
            if !cells.is_empty() {
                println!(
                    "{now} flash   s{}#{} {target} at {}  [{}]",
                    scene + 1,
                    event,
                    cells.join(" "),
                    Cue::GridFlash
                );
            }
        }

        if e.kind == "move_element"
            && let Some(pos) = e.position_at(scene_time)
            && self.positions.insert((scene, event), pos) != Some(pos)
        {
            println!(
                "{now} move    s{}#{} {target} -> {},{}",
                scene + 1,
                event,
                pos.row,
                pos.col
            );
        }
    }

    fn on_bubble_shown(&mut self, scene: usize, index: usize, event: &Event) {
        let t = self.offset(scene) + event.start();
        let text = event.text().unwrap_or_default();
        let slot = self
            .boards
            .get_mut(scene)
            .and_then(|b| b.place_bubble(&event.target_element_id, text));
        let placed = match slot {
            Some(cell) => {
                self.bubbles.push((
                    scene,
                    cell.0,
                    cell.1,
                    event.start() + event.bubble_lifetime_secs(),
                ));
                format!("  @ {}", cell_label(cell))
            }
            None => String::new(),
        };
        println!(
            "{} bubble  s{}#{} {}: {text}{placed}",
            format_time(t),
            scene + 1,
            index,
            event.target_element_id,
        );
    }

    fn on_scene_advanced(&mut self, from: usize, to: usize) {
        self.reset_scene(from);
        self.reset_scene(to);
        println!("scene {} -> {}  [{}]", from + 1, to + 1, Cue::SceneChange);
    }

    fn on_all_scenes_complete(&mut self) {
        println!("all scenes complete");
    }
}

struct PrintNarrator;

impl Narrator for PrintNarrator {
    fn speak(&mut self, u: &Utterance) {
        println!(
            "  say ({:.2}x, pitch {:.1}, ~{:.1}s): {}",
            u.rate,
            u.pitch,
            u.estimated_secs(),
            u.text
        );
    }

    fn cancel(&mut self) {}
}
