mod app;
mod cli;
mod domain;
mod infra;
mod ui;

use crate::app::{AppCommand, AppEvent, AppModel, PaneSide, ScanTarget};
use crate::cli::CliInvocation;
use crate::infra::{
    DirWatcher, ReadDirOptions, Settings, WatchSignal, init_logging, load_settings, local_offset,
    read_dir_entries, resolve_config_path, resolve_state_dir, resolve_symbolic_link, watch_dir,
};
use crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    Event, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::terminal::size as terminal_size;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{ExecutableCommand, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::{Duration, Instant};
use thiserror::Error;
use time::UtcOffset;
use tracing::{debug, info, warn};

const WATCH_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    App(#[from] crate::app::AppError),

    #[error(transparent)]
    Cli(#[from] crate::cli::CliRunError),
}

#[derive(Clone, Debug)]
struct ScanRequest {
    target: ScanTarget,
    options: ReadDirOptions,
}

#[derive(Debug)]
enum ScanSignal {
    Finished {
        side: PaneSide,
        generation: u64,
        result: Result<Vec<crate::domain::Entry>, String>,
    },
}

/// Sends directory reads to the scan worker with the options current at the
/// time of the request.
struct Scanner {
    tx: Sender<ScanRequest>,
    offset: UtcOffset,
}

impl Scanner {
    fn request(&self, target: ScanTarget, show_hidden: bool) {
        debug!(
            side = ?target.side,
            generation = target.ticket.generation,
            dir = %target.ticket.dir.display(),
            "scan requested"
        );
        let options = ReadDirOptions {
            show_hidden,
            offset: self.offset,
        };
        let _ = self.tx.send(ScanRequest { target, options });
    }
}

/// Watcher bookkeeping for one pane. `dir` remembers the directory a watch was
/// attempted for, so a failing watch is not retried every frame.
#[derive(Default)]
struct PaneWatch {
    dir: Option<PathBuf>,
    watcher: Option<DirWatcher>,
    change_deadline: Option<Instant>,
    last_refresh: Option<Instant>,
}

fn main() {
    if let Err(error) = run_main() {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{error}");
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), MainError> {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match crate::cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            let _ = writeln!(err);
            print_help();
            std::process::exit(2);
        }
    };

    match invocation {
        CliInvocation::PrintHelp => {
            print_help();
            Ok(())
        }
        CliInvocation::PrintVersion => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliInvocation::Tui { left, right } => Ok(run_tui(left, right)?),
        CliInvocation::List(command) => {
            crate::cli::run_list(&command)?;
            Ok(())
        }
    }
}

fn print_help() {
    let text = format!(
        "{name} - two-pane terminal file browser\n\nUSAGE:\n  {name} [LEFT] [RIGHT]        Start the TUI (both panes default to the current folder)\n  {name} list [PATH] [FLAGS]   Print the entries a pane would show\n  {name} --help | --version\n\nLIST FLAGS:\n  --sort KEY     name|type|size|date (default: name)\n  --filter TEXT  Keep names matching TEXT as an in-order subsequence\n  --regex        Treat --filter as a regular expression\n  --all          Include dotfiles\n  --json         Output structured JSON\n\nOUTPUT:\n  list: type<TAB>size_bytes<TAB>modified<TAB>name\n\nENV:\n  TWINPANE_CONFIG     Settings file (default: <config dir>/twinpane/config.json)\n  TWINPANE_STATE_DIR  Log directory (default: ~/.twinpane)\n  TWINPANE_LOG        Log filter, e.g. debug or twinpane=trace (default: info)\n",
        name = env!("CARGO_PKG_NAME")
    );
    let mut out = io::stdout().lock();
    let _ = write!(out, "{text}");
}

fn run_tui(left: Option<PathBuf>, right: Option<PathBuf>) -> Result<(), crate::app::AppError> {
    let mut notices: Vec<String> = Vec::new();

    match resolve_state_dir() {
        Ok(state_dir) => match init_logging(&state_dir) {
            Ok(path) => info!(log = %path.display(), "twinpane starting"),
            Err(error) => notices.push(format!("Logging disabled: {error}")),
        },
        Err(error) => notices.push(format!("Logging disabled: {error}")),
    }

    let settings = match resolve_config_path() {
        Some(path) => match load_settings(&path) {
            Ok(settings) => settings,
            Err(error) => {
                warn!(path = %path.display(), %error, "using default settings");
                notices.push(format!("Using default settings: {error}"));
                Settings::default()
            }
        },
        None => Settings::default(),
    };

    let cwd = std::env::current_dir()?;
    let left = absolute_dir(left.unwrap_or_else(|| cwd.clone()), &cwd);
    let right = right.map_or_else(|| left.clone(), |path| absolute_dir(path, &cwd));

    // Must run before any thread is spawned.
    let offset = local_offset();

    let notice = (!notices.is_empty()).then(|| notices.join(" | "));
    let mut model = AppModel::new(left, right, &settings).with_notice(notice);
    let mut terminal = setup_terminal()?;
    if let Ok((width, height)) = terminal_size() {
        model = model.with_terminal_size(width, height);
    }
    let result = run(&mut terminal, &mut model, &settings, offset);
    restore_terminal(&mut terminal)?;
    info!("twinpane exiting");
    result
}

fn absolute_dir(path: PathBuf, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, app::AppError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let _ = stdout.execute(EnableBracketedPaste);
    let _ = stdout.execute(EnableMouseCapture);
    let keyboard_flags = KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
        | KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS
        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
    let _ = stdout.execute(PushKeyboardEnhancementFlags(keyboard_flags));
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
) -> Result<(), app::AppError> {
    disable_raw_mode()?;
    let _ = execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        DisableMouseCapture,
        PopKeyboardEnhancementFlags
    );
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    model: &mut AppModel,
    settings: &Settings,
    offset: UtcOffset,
) -> Result<(), app::AppError> {
    let (request_tx, request_rx) = channel::<ScanRequest>();
    let (signal_tx, signal_rx) = channel::<ScanSignal>();
    spawn_scan_worker(request_rx, signal_tx);
    let scanner = Scanner {
        tx: request_tx,
        offset,
    };

    for target in model.begin_initial_scans() {
        scanner.request(target, model.show_hidden);
    }

    let poll_interval = settings.poll_interval();
    let mut watches: [PaneWatch; 2] = Default::default();
    let now = Instant::now();
    for watch in &mut watches {
        watch.last_refresh = Some(now);
    }

    loop {
        while let Ok(signal) = signal_rx.try_recv() {
            match signal {
                ScanSignal::Finished {
                    side,
                    generation,
                    result,
                } => {
                    let event = AppEvent::Refreshed {
                        side,
                        generation,
                        result,
                    };
                    if dispatch(model, event, &scanner) {
                        return Ok(());
                    }
                }
            }
        }

        for side in PaneSide::BOTH {
            let watch = &mut watches[side.index()];
            ensure_watcher(model, side, watch);

            if let Some(watcher) = &watch.watcher {
                match watcher.drain() {
                    Some(WatchSignal::Changed) => {
                        watch.change_deadline = Some(Instant::now() + WATCH_DEBOUNCE);
                    }
                    Some(WatchSignal::Error(message)) => {
                        warn!(side = ?side, error = %message, "directory watch error");
                        watch.change_deadline = Some(Instant::now());
                    }
                    None => {}
                }
            }

            let now = Instant::now();
            let changed = watch.change_deadline.is_some_and(|deadline| now >= deadline);
            let poll_due = watch
                .last_refresh
                .is_none_or(|last| now.duration_since(last) >= poll_interval);
            if changed || poll_due {
                watch.change_deadline = None;
                watch.last_refresh = Some(now);
                if dispatch(model, AppEvent::RefreshRequested(side), &scanner) {
                    return Ok(());
                }
            }
        }

        terminal.draw(|frame| ui::render(frame, model))?;

        if event::poll(Duration::from_millis(200))? {
            let event = match event::read()? {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    AppEvent::Key(key)
                }
                Event::Paste(text) => AppEvent::Paste(text),
                Event::Mouse(mouse) => AppEvent::Mouse(mouse),
                Event::Resize(width, height) => AppEvent::Resize(width, height),
                _ => continue,
            };
            if dispatch(model, event, &scanner) {
                return Ok(());
            }
        }
    }
}

/// Feeds one event through `app::update` and carries out the resulting
/// commands. Returns `true` when the app should quit.
fn dispatch(model: &mut AppModel, event: AppEvent, scanner: &Scanner) -> bool {
    let (next, mut command) = app::update(model.clone(), event);
    *model = next;
    loop {
        match command {
            AppCommand::None => return false,
            AppCommand::Quit => return true,
            AppCommand::Scan(targets) => {
                for target in targets {
                    scanner.request(target, model.show_hidden);
                }
                return false;
            }
            AppCommand::ResolveDirectory { side, path } => {
                let result = resolve_symbolic_link(&path).map_err(|error| error.to_string());
                let (next, follow) =
                    app::update(model.clone(), AppEvent::DirectoryResolved { side, result });
                *model = next;
                command = follow;
            }
            AppCommand::OpenFile { path } => {
                info!(path = %path.display(), "open requested");
                model.notice = Some(format!("Open requested: {}", path.display()));
                return false;
            }
        }
    }
}

/// Re-targets the pane's watcher after navigation.
fn ensure_watcher(model: &AppModel, side: PaneSide, watch: &mut PaneWatch) {
    let dir = model.pane(side).dir();
    if watch.dir.as_deref() == Some(dir) {
        return;
    }
    watch.dir = Some(dir.to_path_buf());
    watch.change_deadline = None;
    watch.watcher = match watch_dir(dir) {
        Ok(watcher) => {
            debug!(side = ?side, dir = %watcher.dir().display(), "watching directory");
            Some(watcher)
        }
        Err(error) => {
            warn!(side = ?side, dir = %dir.display(), %error, "directory watch unavailable");
            None
        }
    };
}

fn spawn_scan_worker(rx: Receiver<ScanRequest>, tx: Sender<ScanSignal>) {
    std::thread::spawn(move || {
        loop {
            let first = match rx.recv() {
                Ok(request) => request,
                Err(_) => return,
            };

            // Only the newest request per pane matters; older ones are stale.
            let mut latest: [Option<ScanRequest>; 2] = [None, None];
            let index = first.target.side.index();
            latest[index] = Some(first);
            while let Ok(next) = rx.try_recv() {
                let index = next.target.side.index();
                latest[index] = Some(next);
            }

            for request in latest.into_iter().flatten() {
                let ScanRequest { target, options } = request;
                let result = read_dir_entries(&target.ticket.dir, options)
                    .map_err(|error| error.to_string());
                let signal = ScanSignal::Finished {
                    side: target.side,
                    generation: target.ticket.generation,
                    result,
                };
                if tx.send(signal).is_err() {
                    return;
                }
            }
        }
    });
}
