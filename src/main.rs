use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use scrawl::{
    clock::SystemClock,
    collaborators::{TerminalCanvas, TerminalSpeech},
    config::{Config, ConfigStore, FileConfigStore},
    content::{BundledContent, ClassLevel, ContentStore, JsonContentStore},
    history::{AttemptRecord, HistoryDb},
    phonics::{build_plan, clamp_rate},
    runtime::{FixedTicker, LineEventSource, PracticeEvent, PracticeEventSource, Runner, Ticker},
    verifier::VerificationResult,
    PracticeMode, PracticeSession, SessionSettings,
};
use std::{
    error::Error,
    io::{self, Stdout},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 100;
const LOG_ENV: &str = "SCRAWL_LOG";

/// handwriting practice with phonics playback
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Practice writing words and sentences for your class level, or listen to words sounded out letter by letter. Each line you enter stands in for what the handwriting recognizer read."
)]
pub struct Cli {
    /// class level to draw content from (1-5)
    #[clap(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
    level: Option<u8>,

    /// what to practice
    #[clap(short, long, value_enum)]
    mode: Option<PracticeMode>,

    /// number of items drawn for the session
    #[clap(short = 'n', long = "count")]
    count: Option<usize>,

    /// phonics playback rate, 0.3 to 1.5
    #[clap(short, long)]
    rate: Option<f32>,

    /// number of seconds before the session ends
    #[clap(short, long)]
    secs: Option<u32>,

    /// JSON file with word and sentence pools per class level
    #[clap(long)]
    content: Option<PathBuf>,

    /// seed for the content shuffle
    #[clap(long)]
    seed: Option<u64>,

    /// act as if the recognizer is switched off
    #[clap(long)]
    no_recognition: bool,

    /// do not record attempts
    #[clap(long)]
    no_history: bool,

    /// store the resulting settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Overlay the flags that were given on top of the stored config.
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(level) = self.level.and_then(ClassLevel::new) {
            cfg.class_level = level;
        }
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        if let Some(count) = self.count {
            cfg.session_size = count;
        }
        if let Some(rate) = self.rate {
            cfg.playback_rate = clamp_rate(rate);
        }
        if self.secs.is_some() {
            cfg.time_limit_secs = self.secs;
        }
        if self.no_recognition {
            cfg.recognition_enabled = false;
        }
        cfg
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Submit(Option<String>),
    Play,
    Next,
    Faster,
    Slower,
    Quit,
}

fn parse_line(mode: PracticeMode, line: &str) -> Command {
    match (mode, line.trim()) {
        (_, ":q") | (_, ":quit") => Command::Quit,
        (_, ":next") | (_, ":skip") => Command::Next,
        (PracticeMode::Phonics, "") => Command::Play,
        (PracticeMode::Phonics, "+") => Command::Faster,
        (PracticeMode::Phonics, "-") => Command::Slower,
        (_, "") => Command::Submit(None),
        _ => Command::Submit(Some(line.to_string())),
    }
}

type TerminalSession = PracticeSession<TerminalSpeech<Stdout>, TerminalCanvas<Stdout>>;

struct App {
    session: TerminalSession,
    history: Option<HistoryDb>,
}

impl App {
    fn new(settings: SessionSettings, store: Box<dyn ContentStore>, rng: StdRng, history: Option<HistoryDb>) -> Self {
        let session = PracticeSession::new(
            settings,
            store,
            Arc::new(SystemClock::new()),
            TerminalSpeech::new(io::stdout()),
            TerminalCanvas::new(io::stdout()),
            rng,
        );
        Self { session, history }
    }

    fn print_banner(&self) {
        let settings = self.session.settings();
        let level = settings
            .level
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "scrawl: class {level}, {} mode, {} items",
            settings.mode,
            self.session.verifier().session().len()
        );
        match settings.mode {
            PracticeMode::Phonics => {
                println!("enter = play, + / - = rate, :next = next word, :q = quit")
            }
            _ => println!("type what you wrote, empty line = no recognition, :skip = next, :q = quit"),
        }
    }

    fn print_prompt(&self) {
        let target = self.session.target();
        let time = self
            .session
            .time_left()
            .map(|t| format!("  [{t}]"))
            .unwrap_or_default();

        if target.is_empty() {
            let level = self.session.level().unwrap_or_default();
            println!("No {}s available for class {level}{time}", target.kind);
            return;
        }
        match self.session.mode() {
            PracticeMode::Phonics => println!(
                "Sound out: {}  ({}){time}",
                target.text,
                build_plan(&target.text).display()
            ),
            _ => println!("Write: {}{time}", target.text),
        }
    }

    fn report(&mut self, result: &VerificationResult) {
        if result.passed() {
            println!("  Correct!");
        } else if let Some(err) = self.session.explain(result) {
            println!("  {err}");
        }
        self.session.acknowledge();

        if let Some(db) = &self.history {
            let attempt =
                AttemptRecord::from_result(self.session.level(), self.session.mode(), result);
            if let Err(e) = db.record(&attempt) {
                tracing::warn!(error = %e, "history_record_failed");
            }
        }
    }

    /// Returns false once the user asked to quit.
    fn handle_line(&mut self, line: &str) -> bool {
        match parse_line(self.session.mode(), line) {
            Command::Quit => return false,
            Command::Submit(candidate) => {
                if let Some(result) = self.session.submit(candidate.as_deref()) {
                    self.report(&result);
                    self.print_prompt();
                }
            }
            Command::Next => {
                if self.session.next().is_some() {
                    self.print_prompt();
                }
            }
            Command::Play => {
                if self.session.play().is_none() {
                    println!("  nothing to play");
                }
            }
            Command::Faster => println!("  rate {:.1}", self.session.faster()),
            Command::Slower => println!("  rate {:.1}", self.session.slower()),
        }
        true
    }

    fn print_summary(&self) {
        let tally = self.session.tally();
        println!("Passed {} of {} attempts", tally.passed, tally.attempts);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();

    let config_store = FileConfigStore::new();
    let config = cli.apply(config_store.load());
    if cli.save_config {
        config_store.save(&config)?;
        tracing::info!(path = %config_store.path().display(), "config_saved");
    }

    let store: Box<dyn ContentStore> = match &cli.content {
        Some(path) => Box::new(JsonContentStore::from_path(path)?),
        None => Box::new(BundledContent::new()),
    };
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let history = if cli.no_history {
        None
    } else {
        HistoryDb::open_default()
            .map_err(|e| tracing::warn!(error = %e, "history_unavailable"))
            .ok()
    };

    let mut app = App::new(SessionSettings::from(&config), store, rng, history);
    let runner = Runner::new(
        LineEventSource::stdin(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    run(&mut app, &runner);
    Ok(())
}

fn run<E: PracticeEventSource, T: Ticker>(app: &mut App, runner: &Runner<E, T>) {
    app.print_banner();
    app.print_prompt();

    loop {
        let keep_going = match runner.step() {
            PracticeEvent::Tick => true,
            PracticeEvent::Line(line) => app.handle_line(&line),
            PracticeEvent::Closed => false,
        };

        if app.session.poll().expired {
            println!("Time's up!");
            break;
        }
        if !keep_going {
            break;
        }
    }

    app.session.teardown();
    app.print_summary();
}
