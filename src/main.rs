mod ui;

use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use cubik::{
    app_dirs::AppDirs,
    celebration::Celebration,
    config::{ConfigStore, FileConfigStore},
    coordinator::{Coordinator, CoordinatorEvent, Overrides, TimerKey},
    error::{CoordinatorError, StoreError},
    export::export_csv_file,
    runtime::{
        key_transitions, AppEvent, CrosstermEventSource, FixedTicker, KeyTransition, Runner,
    },
    scramble::{generate_scramble, CubeSize},
    session::{FileSessionStore, SessionStore},
    stats::PersonalBest,
    timer::{Phase, TimerConfig},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 50;

/// terminal speedcubing timer with inspection, scrambles, and rolling averages
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal speedcubing timer: 15 second inspection, random-move scrambles for 2x2x2 to 4x4x4, and rolling ao5/ao12 statistics over persisted practice sessions."
)]
pub struct Cli {
    /// session to open, created when it does not exist yet
    #[clap(short = 's', long)]
    session: Option<String>,

    /// puzzle to generate scrambles for
    #[clap(short = 'c', long, value_enum)]
    cube: Option<CubeSize>,

    /// skip the inspection countdown
    #[clap(long)]
    no_inspection: bool,

    /// print a single scramble and exit
    #[clap(long)]
    scramble: bool,

    /// write the session as CSV to PATH and exit
    #[clap(short = 'e', long, value_name = "PATH")]
    export: Option<PathBuf>,
}

impl Cli {
    /// Settings for this run only, kept out of the stored configuration
    fn overrides(&self) -> Overrides {
        Overrides {
            cube_size: self.cube,
            enable_inspection: self.no_inspection.then_some(false),
        }
    }
}

pub type FileCoordinator = Coordinator<FileSessionStore, FileConfigStore>;

#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    NewSession,
    OpenSession,
    RenameSession,
    ConfirmOverwrite(String),
    ConfirmDelete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Timer,
    Chart,
    Prompt(Prompt),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub text: String,
    pub is_error: bool,
}

#[derive(Debug, Default)]
pub struct SolveListState {
    /// 0-based index into the session's solves
    pub selected: Option<usize>,
}

pub struct App {
    pub coordinator: FileCoordinator,
    pub state: AppState,
    pub input: String,
    pub status: Option<Status>,
    pub celebration: Celebration,
    pub solve_list: SolveListState,
    pub reports_releases: bool,
    pub should_quit: bool,
    poll_interval: Duration,
    last_poll: Instant,
}

impl App {
    pub fn new(coordinator: FileCoordinator, reports_releases: bool) -> Self {
        let poll_interval = Duration::from_millis(coordinator.config().poll_interval_ms);
        Self {
            coordinator,
            state: AppState::Timer,
            input: String::new(),
            status: None,
            celebration: Celebration::default(),
            solve_list: SolveListState::default(),
            reports_releases,
            should_quit: false,
            poll_interval,
            last_poll: Instant::now(),
        }
    }

    fn info(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            is_error: false,
        });
    }

    fn error(&mut self, err: impl std::fmt::Display) {
        self.status = Some(Status {
            text: err.to_string(),
            is_error: true,
        });
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.coordinator.press(TimerKey::Escape);
            self.should_quit = true;
            return;
        }

        if let AppState::Prompt(prompt) = self.state.clone() {
            if key.kind != KeyEventKind::Release {
                self.on_prompt_key(prompt, key);
            }
            return;
        }

        for transition in key_transitions(key, self.reports_releases) {
            match transition {
                KeyTransition::Down(key) => self.on_key_down(key),
                KeyTransition::Up(key) => self.on_key_up(key),
            }
        }
    }

    fn on_key_down(&mut self, key: KeyEvent) {
        let timer_key = timer_key(key.code);
        if self.coordinator.phase() != Phase::Idle || timer_key != TimerKey::Other {
            self.coordinator.press(timer_key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('n') => self.open_prompt(Prompt::NewSession),
            KeyCode::Char('o') => {
                match self.coordinator.list_sessions() {
                    Ok(names) if names.is_empty() => self.info("no sessions yet"),
                    Ok(names) => self.info(format!("sessions: {}", names.join(", "))),
                    Err(e) => self.error(e),
                }
                self.open_prompt(Prompt::OpenSession);
            }
            KeyCode::Char('r') => self.with_session(|app| app.open_prompt(Prompt::RenameSession)),
            KeyCode::Char('d') => self.with_session(|app| app.open_prompt(Prompt::ConfirmDelete)),
            KeyCode::Char('z') => match self.coordinator.remove_last_solve() {
                Ok(solve) => self.info(format!("removed last solve ({})", solve.time)),
                Err(e) => self.error(e),
            },
            KeyCode::Delete | KeyCode::Char('x') => self.remove_selected(),
            KeyCode::Char('i') => {
                let enabled = !self.coordinator.inspection_enabled();
                match self.coordinator.set_inspection(enabled) {
                    Ok(()) => self.info(if enabled {
                        "inspection on"
                    } else {
                        "inspection off"
                    }),
                    Err(e) => self.error(e),
                }
            }
            KeyCode::Char('c') => {
                let next = next_cube_size(self.coordinator.cube_size());
                match self.coordinator.set_cube_size(next) {
                    Ok(()) => self.info(format!("scrambling for {next}")),
                    Err(e) => self.error(e),
                }
            }
            KeyCode::Char('s') => {
                self.coordinator.new_scramble();
            }
            KeyCode::Char('g') => {
                self.state = match self.state {
                    AppState::Chart => AppState::Timer,
                    _ => AppState::Chart,
                };
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Home => self.solve_list.selected = None,
            _ => {}
        }
    }

    fn on_key_up(&mut self, key: KeyEvent) {
        if let Err(e) = self.coordinator.release(timer_key(key.code)) {
            self.error(e);
        }
    }

    fn with_session(&mut self, f: impl FnOnce(&mut Self)) {
        if self.coordinator.session().is_some() {
            f(self);
        } else {
            self.error(CoordinatorError::NoSession);
        }
    }

    fn open_prompt(&mut self, prompt: Prompt) {
        self.input.clear();
        self.state = AppState::Prompt(prompt);
    }

    fn close_prompt(&mut self) {
        self.input.clear();
        self.state = AppState::Timer;
    }

    fn on_prompt_key(&mut self, prompt: Prompt, key: KeyEvent) {
        match prompt {
            Prompt::ConfirmOverwrite(name) => {
                self.close_prompt();
                if key.code == KeyCode::Char('y') {
                    let result = self.coordinator.new_session(&name, true);
                    self.report_session_change(result, format!("replaced session {name:?}"));
                }
            }
            Prompt::ConfirmDelete => {
                self.close_prompt();
                if key.code == KeyCode::Char('y') {
                    let result = self.coordinator.delete_session();
                    self.solve_list.selected = None;
                    self.report_session_change(result, "session deleted".to_string());
                }
            }
            prompt => match key.code {
                KeyCode::Esc => self.close_prompt(),
                KeyCode::Enter => self.submit_prompt(prompt),
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Char(c) => self.input.push(c),
                _ => {}
            },
        }
    }

    fn submit_prompt(&mut self, prompt: Prompt) {
        let name = self.input.clone();
        self.close_prompt();
        self.solve_list.selected = None;

        match prompt {
            Prompt::NewSession => match self.coordinator.new_session(&name, false) {
                Err(CoordinatorError::Store(StoreError::AlreadyExists(_))) => {
                    self.state = AppState::Prompt(Prompt::ConfirmOverwrite(name));
                }
                result => self.report_session_change(result, format!("created session {name:?}")),
            },
            Prompt::OpenSession => {
                let result = self.coordinator.open_session(&name);
                self.report_session_change(result, format!("opened session {name:?}"));
            }
            Prompt::RenameSession => {
                let result = self.coordinator.rename_session(&name);
                self.report_session_change(result, format!("renamed session to {name:?}"));
            }
            Prompt::ConfirmOverwrite(_) | Prompt::ConfirmDelete => {}
        }
    }

    fn report_session_change(&mut self, result: Result<(), CoordinatorError>, done: String) {
        // switching sessions commits a waiting solve first
        let events = self.coordinator.poll();
        self.on_coordinator_events(events, 0, 0);

        match result {
            Ok(()) => self.info(done),
            Err(e) => self.error(e),
        }
    }

    fn remove_selected(&mut self) {
        let Some(index) = self.solve_list.selected else {
            self.info("select a solve with the arrow keys first");
            return;
        };
        match self.coordinator.remove_solve(index) {
            Ok(solve) => {
                self.info(format!("removed solve #{} ({})", index + 1, solve.time));
                let len = self.coordinator.session().map_or(0, |s| s.len());
                self.solve_list.selected = (len > 0).then(|| index.min(len - 1));
            }
            Err(e) => self.error(e),
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.coordinator.session().map_or(0, |s| s.len());
        if len == 0 {
            self.solve_list.selected = None;
            return;
        }
        let current = self.solve_list.selected.unwrap_or(len) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.solve_list.selected = Some(next as usize);
    }

    /// Advance animations and commit finished solves on the poll schedule.
    pub fn on_tick(&mut self, width: u16, height: u16) {
        self.celebration.update();

        if self.last_poll.elapsed() >= self.poll_interval {
            self.last_poll = Instant::now();
            let events = self.coordinator.poll();
            self.on_coordinator_events(events, width, height);
        }
    }

    fn on_coordinator_events(&mut self, events: Vec<CoordinatorEvent>, width: u16, height: u16) {
        let mut bests: Vec<PersonalBest> = Vec::new();

        for event in events {
            match event {
                CoordinatorEvent::SolveSaved { index, time } => {
                    self.info(format!("solve #{index}: {time}"));
                }
                CoordinatorEvent::PersonalBest(pb) => bests.push(pb),
                CoordinatorEvent::BackupWritten(path) => {
                    self.info(format!("backup written to {}", path.display()));
                }
                CoordinatorEvent::StoreFailed(msg) => self.error(msg),
            }
        }

        // the very first value of a metric is not worth a party
        bests.retain(|pb| pb.previous.is_some());
        if let Some(text) = cubik::celebration::banner(&bests) {
            if !self.status.as_ref().is_some_and(|s| s.is_error) {
                self.info(format!("new best! {text}"));
            }
            if width > 0 && height > 0 {
                self.celebration.start(&bests, width, height);
            }
        }
    }
}

fn timer_key(code: KeyCode) -> TimerKey {
    match code {
        KeyCode::Char(' ') => TimerKey::Space,
        KeyCode::Esc => TimerKey::Escape,
        _ => TimerKey::Other,
    }
}

fn next_cube_size(current: CubeSize) -> CubeSize {
    match current {
        CubeSize::Two => CubeSize::Three,
        CubeSize::Three => CubeSize::Four,
        CubeSize::Four => CubeSize::Two,
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_env("CUBIK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    // the terminal belongs to the TUI, so everything goes to the log file
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

fn build_coordinator(cli: &Cli) -> FileCoordinator {
    let config_store = FileConfigStore::new();
    let config = config_store.load();
    let store = FileSessionStore::with_dir(AppDirs::sessions_dir());
    Coordinator::new(store, config_store, config, TimerConfig::default())
        .with_overrides(cli.overrides())
}

fn export(cli: &Cli, path: &PathBuf) -> Result<(), Box<dyn Error>> {
    let config = FileConfigStore::new().load();
    let name = cli
        .session
        .clone()
        .or(config.last_session)
        .ok_or(CoordinatorError::NoSession)?;
    let session = FileSessionStore::with_dir(AppDirs::sessions_dir()).load(&name)?;
    let count = export_csv_file(&session, path)?;
    println!("exported {count} solves from {name:?} to {}", path.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.scramble {
        let cube = cli
            .cube
            .unwrap_or_else(|| FileConfigStore::new().load().cube_size);
        println!("{}", generate_scramble(cube));
        return Ok(());
    }

    if let Some(path) = &cli.export {
        return export(&cli, path);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();
    info!("cubik starting");

    let mut coordinator = build_coordinator(&cli);
    let startup = match &cli.session {
        Some(name) => match coordinator.open_session(name) {
            Err(CoordinatorError::Store(StoreError::NotFound(_))) => {
                coordinator.new_session(name, false)
            }
            result => result,
        },
        None => coordinator.load_last_session().map(|_| ()),
    };

    let reports_releases = supports_keyboard_enhancement().unwrap_or(false);
    let mut app = App::new(coordinator, reports_releases);
    match startup {
        Ok(()) if app.coordinator.session().is_none() => {
            app.info("press n to create a session or o to open one")
        }
        Ok(()) => {}
        Err(e) => {
            error!(error = %e, "could not open session");
            app.error(e);
        }
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    if reports_releases {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);
    // a solve stopped right before quitting is still worth keeping
    app.coordinator.poll();

    if reports_releases {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("cubik exiting");
    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    while !app.should_quit {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            AppEvent::Tick => {
                let size = terminal.size().unwrap_or_default();
                app.on_tick(size.width, size.height);
            }
            AppEvent::Resize => {}
            AppEvent::Key(key) => app.on_key(key),
        }
    }

    Ok(())
}
