mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use monkeytyper::{
    app_dirs::AppDirs,
    compute_result,
    config::{ConfigStore, FileConfigStore, UserSettings},
    history::SessionHistory,
    input::apply_keystroke,
    runtime::{keystroke_from_key_event, CrosstermEventSource, FixedTicker, Runner, TestEvent},
    Language, Session, TestMode, TestResult, TestState, WordListError, WordSource,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 100;

/// terminal typing speed test
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    version,
    about,
    long_about = "A terminal typing test. Time mode runs for a fixed number of seconds, word mode until a fixed number of words are typed. Unset options fall back to your saved defaults."
)]
pub struct Cli {
    /// test mode
    #[clap(short = 'm', long, value_enum)]
    mode: Option<TestMode>,

    /// duration in seconds (time mode)
    #[clap(short = 'd', long)]
    duration: Option<usize>,

    /// number of words (word mode)
    #[clap(short = 'n', long)]
    length: Option<usize>,

    /// language to pull words from
    #[clap(short = 'l', long, value_enum)]
    language: Option<Language>,

    /// custom prompt to use instead of generated words
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// directory holding `<code>_words.txt` lists, instead of the bundled ones
    #[clap(long)]
    words_dir: Option<PathBuf>,

    /// store the chosen mode, duration, length and language as defaults
    #[clap(long)]
    save_defaults: bool,

    /// restore the built-in defaults before starting
    #[clap(long, conflicts_with = "save_defaults")]
    reset_defaults: bool,
}

/// Options after merging the command line over the saved settings
#[derive(Debug, Clone, PartialEq)]
pub struct TestOptions {
    pub mode: TestMode,
    pub config_value: usize,
    pub language: Language,
}

impl Cli {
    fn resolve(&self, settings: &UserSettings) -> TestOptions {
        let mode = self.mode.unwrap_or(settings.default_mode);
        let config_value = match mode {
            TestMode::Time => self.duration.unwrap_or(settings.default_duration),
            TestMode::Words => self.length.unwrap_or(settings.default_length),
        };
        TestOptions {
            mode,
            config_value,
            language: self.language.unwrap_or(settings.default_language),
        }
    }

    fn merged_settings(&self, settings: &UserSettings) -> UserSettings {
        UserSettings {
            default_language: self.language.unwrap_or(settings.default_language),
            default_mode: self.mode.unwrap_or(settings.default_mode),
            default_duration: self.duration.unwrap_or(settings.default_duration),
            default_length: self.length.unwrap_or(settings.default_length),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Typing,
    Results,
    History,
}

#[derive(Debug)]
pub struct App {
    pub options: TestOptions,
    pub custom_prompt: Option<String>,
    pub words: WordSource,
    pub session: Session,
    pub result: Option<TestResult>,
    pub history: SessionHistory,
    pub state: AppState,
}

impl App {
    pub fn new(
        options: TestOptions,
        custom_prompt: Option<String>,
        mut words: WordSource,
    ) -> Result<Self, WordListError> {
        let session = build_session(&options, custom_prompt.as_deref(), &mut words)?;
        Ok(Self {
            options,
            custom_prompt,
            words,
            session,
            result: None,
            history: SessionHistory::new(),
            state: AppState::Typing,
        })
    }

    /// Start over, either with a fresh prompt or the one just typed.
    pub fn reset(&mut self, same_prompt: bool) -> Result<(), WordListError> {
        self.session = if same_prompt {
            Session::new(
                self.session.prompt_text().to_string(),
                self.options.mode,
                self.options.config_value,
                self.options.language,
            )
        } else {
            build_session(&self.options, self.custom_prompt.as_deref(), &mut self.words)?
        };
        self.result = None;
        self.state = AppState::Typing;
        Ok(())
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if self.state != AppState::Typing {
            return;
        }
        if let Some(keystroke) = keystroke_from_key_event(&key) {
            apply_keystroke(&mut self.session, keystroke);
        }
        self.check_finished();
    }

    pub fn on_tick(&mut self) {
        if self.state == AppState::Typing && self.session.has_started() {
            self.check_finished();
        }
    }

    fn check_finished(&mut self) {
        if self.session.state() == TestState::Finished || self.session.is_finished() {
            let result = compute_result(&mut self.session);
            info!(
                "{} wpm, {:.1}% accuracy over {:.1}s",
                result.wpm, result.accuracy, result.elapsed_secs
            );
            self.history.record(result.clone());
            self.result = Some(result);
            self.state = AppState::Results;
        }
    }
}

fn build_session(
    options: &TestOptions,
    custom_prompt: Option<&str>,
    words: &mut WordSource,
) -> Result<Session, WordListError> {
    match custom_prompt {
        Some(prompt) => Ok(Session::new(
            prompt.to_string(),
            options.mode,
            options.config_value,
            options.language,
        )),
        None => Session::start(words, options.mode, options.config_value, options.language),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_file = AppDirs::log_path().and_then(|path| {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    // stdout belongs to the TUI, so logs go to a file or nowhere
    match log_file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .init(),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let store = FileConfigStore::new();
    let mut settings = store.load();
    if cli.reset_defaults {
        settings = UserSettings::default();
        store.save(&settings)?;
        info!("reset settings in {}", store.path().display());
    } else if cli.save_defaults {
        settings = cli.merged_settings(&settings);
        store.save(&settings)?;
        info!("saved settings to {}", store.path().display());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let words = match &cli.words_dir {
        Some(dir) => WordSource::from_dir(dir),
        None => WordSource::embedded(),
    };
    let mut app = match App::new(cli.resolve(&settings), cli.prompt.clone(), words) {
        Ok(app) => app,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::Io, e.to_string()).exit();
        }
    };

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        match runner.step() {
            TestEvent::Tick => {
                if app.state == AppState::Typing && app.session.has_started() {
                    app.on_tick();
                    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                }
            }
            TestEvent::Resize => {
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
            TestEvent::Key(key) => {
                if key.code == KeyCode::Esc
                    || (key.modifiers.contains(KeyModifiers::CONTROL)
                        && key.code == KeyCode::Char('c'))
                {
                    break;
                }

                match app.state {
                    AppState::Typing => app.on_key(key),
                    AppState::Results => match key.code {
                        KeyCode::Char('n') => reset_or_warn(app, false),
                        KeyCode::Char('r') => reset_or_warn(app, true),
                        KeyCode::Char('h') => app.state = AppState::History,
                        _ => {}
                    },
                    AppState::History => match key.code {
                        KeyCode::Char('h') | KeyCode::Char('b') | KeyCode::Backspace => {
                            app.state = AppState::Results
                        }
                        KeyCode::Char('n') => reset_or_warn(app, false),
                        _ => {}
                    },
                }
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
        }
    }

    Ok(())
}

fn reset_or_warn(app: &mut App, same_prompt: bool) {
    if let Err(e) = app.reset(same_prompt) {
        warn!("could not start a new test: {}", e);
    }
}
