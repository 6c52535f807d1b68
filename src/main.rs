mod ui;

use chrono::{DateTime, Local};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
    time::Duration,
};
use tracing::{info, warn};

use plank::{
    app::{PlankApp, PresenceMode, ResultChoice, Screen},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, StorageBackend},
    controller::{Phase, SessionController},
    detector::CommandDetector,
    history::{write_csv, HistoryStore},
    logging,
    runtime::{event_queue, spawn_terminal_reader, FixedTicker, PlankEvent, Runner},
    storage::{open_store, KeyValueStore, MemoryStore},
};

use crate::ui::App;

/// plank exercise timer that runs while your face is in frame
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A plank timer TUI. Face detection gates the start and stops the stopwatch the moment your face leaves the frame; every finished plank is kept in a local history."
)]
pub struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,

    /// seconds to count down before the stopwatch starts
    #[clap(short = 'c', long)]
    countdown: Option<u32>,

    /// shell command streaming face detections from the front camera, one line per frame (a face count or {"faces":[...]}); without it, press `f` to toggle presence by hand
    #[clap(short = 'd', long)]
    detector: Option<String>,

    /// where to keep the history
    #[clap(short = 's', long, value_enum)]
    storage: Option<StorageBackend>,

    /// directory for history and logs (default: ~/.local/state/plank)
    #[clap(long)]
    data_dir: Option<PathBuf>,

    /// tracing filter for the log file, e.g. "debug" or "plank=trace"
    #[clap(long)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// print finished planks, most recent first
    History {
        /// write CSV (date,time) in the order sessions were recorded
        #[clap(long)]
        csv: bool,
    },
}

impl Cli {
    /// Command-line flags take precedence over the config file
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(secs) = self.countdown {
            cfg.countdown_secs = secs;
        }
        if let Some(cmd) = &self.detector {
            cfg.detector_command = Some(cmd.clone());
        }
        if let Some(storage) = self.storage {
            cfg.storage = storage;
        }
        if let Some(level) = &self.log_level {
            cfg.log_level = level.clone();
        }
        cfg
    }

    fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(AppDirs::state_dir)
            .unwrap_or_else(|| PathBuf::from("plank_data"))
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = cli.apply(FileConfigStore::new().load());
    let data_dir = cli.data_dir();
    let _log_guard = logging::init(&AppDirs::log_dir(&data_dir), &config.log_level);

    let store: Box<dyn KeyValueStore> = match open_store(config.storage, &data_dir) {
        Ok(store) => store,
        Err(e) => {
            warn!(error = %e, "history store unavailable, sessions will not be kept");
            Box::new(MemoryStore::new())
        }
    };
    let history = HistoryStore::new(store);

    if let Some(Command::History { csv }) = cli.command {
        return print_history(&history, csv, &mut io::stdout().lock());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let presence_mode = if config.detector_command.is_some() {
        PresenceMode::Detector
    } else {
        PresenceMode::Manual { present: false }
    };
    let mut app = PlankApp::new(SessionController::new(config.countdown_secs), history, presence_mode);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn print_history<S: KeyValueStore, W: Write>(
    history: &HistoryStore<S>,
    csv: bool,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    if csv {
        write_csv(&history.load_all(), out)?;
        return Ok(());
    }

    let sessions = history.newest_first();
    if sessions.is_empty() {
        writeln!(out, "Пока нет ни одной тренировки.")?;
    }
    for session in sessions {
        writeln!(out, "{}\t{}", session.formatted_date(), session.formatted_time())?;
    }
    Ok(())
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let (tx, events) = event_queue();
    spawn_terminal_reader(tx.clone());

    // With no detector running the start action simply never becomes available
    let _detector = config
        .detector_command
        .as_deref()
        .and_then(|cmd| match CommandDetector::spawn(cmd, tx.clone()) {
            Ok(detector) => Some(detector),
            Err(e) => {
                warn!(error = %e, "face detector unavailable");
                None
            }
        });
    drop(tx);

    let ticker = FixedTicker::new(Duration::from_millis(config.tick_rate_ms.max(1)));
    let mut runner = Runner::new(events, ticker);

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            PlankEvent::Tick => app.on_tick(Local::now()),
            PlankEvent::Resize => {}
            PlankEvent::Presence(detection) => app.on_detection(detection, Local::now()),
            PlankEvent::Key(key) => {
                if handle_key(app, key, Local::now()) == KeyOutcome::Quit {
                    break;
                }
            }
        }
    }

    info!("plank exiting");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    Quit,
}

fn handle_key<S: KeyValueStore>(app: &mut PlankApp<S>, key: KeyEvent, now: DateTime<Local>) -> KeyOutcome {
    if key.code == KeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
    {
        return KeyOutcome::Quit;
    }

    match app.screen() {
        Screen::Trainer => {
            let finished = matches!(app.phase(), Phase::Finished { .. });
            let idle = matches!(app.phase(), Phase::Idle);

            match key.code {
                KeyCode::Enter | KeyCode::Char('c') if finished => {
                    app.acknowledge(ResultChoice::Continue);
                }
                KeyCode::Char('h') if finished => {
                    app.acknowledge(ResultChoice::ShowHistory);
                }
                KeyCode::Char('h') if idle => app.open_history(),
                KeyCode::Char(' ') | KeyCode::Enter => {
                    app.start(now);
                }
                KeyCode::Char('f') => app.toggle_manual_presence(now),
                _ => {}
            }
        }
        Screen::History => match key.code {
            KeyCode::Char('b') | KeyCode::Backspace => app.close_history(),
            KeyCode::Up => app.scroll_history(-1),
            KeyCode::Down => app.scroll_history(1),
            KeyCode::PageUp => app.scroll_history(-10),
            KeyCode::PageDown => app.scroll_history(10),
            KeyCode::Home => app.scroll_history(isize::MIN / 2),
            _ => {}
        },
    }

    KeyOutcome::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::Parser;
    use plank::{session::TrainingSession, storage::MemoryStore};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn manual_app() -> PlankApp<MemoryStore> {
        PlankApp::new(
            SessionController::new(0),
            HistoryStore::new(MemoryStore::new()),
            PresenceMode::Manual { present: false },
        )
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["plank"]);

        assert_eq!(cli.command, None);
        assert_eq!(cli.countdown, None);
        assert_eq!(cli.detector, None);
        assert_eq!(cli.storage, None);
        assert_eq!(cli.data_dir, None);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "plank",
            "-c",
            "5",
            "--detector",
            "facecam --json",
            "--storage",
            "file",
            "--log-level",
            "debug",
        ]);
        let cfg = cli.apply(Config::default());

        assert_eq!(cfg.countdown_secs, 5);
        assert_eq!(cfg.detector_command.as_deref(), Some("facecam --json"));
        assert_eq!(cfg.storage, StorageBackend::File);
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.tick_rate_ms, Config::default().tick_rate_ms);
    }

    #[test]
    fn test_cli_keeps_config_when_unset() {
        let cli = Cli::parse_from(["plank"]);
        let loaded = Config {
            countdown_secs: 7,
            storage: StorageBackend::File,
            ..Config::default()
        };
        assert_eq!(cli.apply(loaded.clone()), loaded);
    }

    #[test]
    fn test_cli_history_subcommand() {
        let cli = Cli::parse_from(["plank", "history"]);
        assert_eq!(cli.command, Some(Command::History { csv: false }));

        let cli = Cli::parse_from(["plank", "--data-dir", "/tmp/p", "history", "--csv"]);
        assert_eq!(cli.command, Some(Command::History { csv: true }));
        assert_eq!(cli.data_dir(), PathBuf::from("/tmp/p"));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = manual_app();
        assert_eq!(handle_key(&mut app, key(KeyCode::Esc), t0()), KeyOutcome::Quit);
        assert_eq!(
            handle_key(
                &mut app,
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
                t0()
            ),
            KeyOutcome::Quit
        );
    }

    #[test]
    fn test_keys_drive_a_session() {
        let mut app = manual_app();

        handle_key(&mut app, key(KeyCode::Char(' ')), t0());
        assert_eq!(app.phase(), &Phase::Idle);

        handle_key(&mut app, key(KeyCode::Char('f')), t0());
        handle_key(&mut app, key(KeyCode::Char(' ')), t0());
        assert_eq!(app.phase(), &Phase::Countdown { remaining: 0 });

        app.on_tick(t0() + chrono::Duration::seconds(1));
        handle_key(&mut app, key(KeyCode::Char('f')), t0() + chrono::Duration::seconds(31));
        assert!(matches!(app.phase(), Phase::Finished { .. }));

        handle_key(&mut app, key(KeyCode::Char('h')), t0());
        assert_eq!(app.phase(), &Phase::Idle);
        assert_eq!(app.screen(), Screen::History);
        assert_eq!(app.history_view().sessions[0].time, 30);

        handle_key(&mut app, key(KeyCode::Char('b')), t0());
        assert_eq!(app.screen(), Screen::Trainer);
    }

    #[test]
    fn test_print_history_plain_and_csv() {
        let history = HistoryStore::new(MemoryStore::new());
        history.append(TrainingSession::new(t0(), 10)).unwrap();
        history
            .append(TrainingSession::new(t0() + chrono::Duration::minutes(5), 25))
            .unwrap();

        let mut out = Vec::new();
        print_history(&history, false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "01 марта 2024, 10:05\t25 сек.\n01 марта 2024, 10:00\t10 сек.\n"
        );

        let mut out = Vec::new();
        print_history(&history, true, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("date,time\n"));
        assert_eq!(text.lines().count(), 3);
    }
}
