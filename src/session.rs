use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info};
use unicode_width::UnicodeWidthChar;

use crate::error::WordListError;
use crate::prompt::generate_prompt_with;
use crate::words::{Language, WordSource};

/// How a test decides it is over.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Default,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TestMode {
    /// Stop once `config_value` seconds have elapsed
    #[default]
    Time,
    /// Stop once `config_value` words have been completed
    Words,
}

/// Lifecycle of a session. Only ever moves forward.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum TestState {
    NotStarted,
    Running,
    Finished,
}

/// Characters terminals send for the backspace key.
pub const BACKSPACE_SENTINELS: [char; 2] = ['\x7f', '\x08'];

/// A single unit of input from the keystroke source.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Keystroke {
    Char(char),
    Backspace,
}

impl Keystroke {
    pub fn from_char(c: char) -> Self {
        if BACKSPACE_SENTINELS.contains(&c) {
            Keystroke::Backspace
        } else {
            Keystroke::Char(c)
        }
    }
}

/// Whether `c` counts as typed text. The plain space is printable; other
/// separators, format characters and private-use code points are not.
pub fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() || c.width().is_none() {
        return false;
    }
    !matches!(
        c,
        // other space separators
        '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            // line and paragraph separators
            | '\u{2028}'..='\u{2029}'
            // format characters
            | '\u{00AD}'
            | '\u{0600}'..='\u{0605}'
            | '\u{061C}'
            | '\u{06DD}'
            | '\u{070F}'
            | '\u{08E2}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
            | '\u{110BD}'
            | '\u{110CD}'
            | '\u{13430}'..='\u{1343F}'
            | '\u{1BCA0}'..='\u{1BCA3}'
            | '\u{1D173}'..='\u{1D17A}'
            | '\u{E0001}'
            | '\u{E0020}'..='\u{E007F}'
            // private use
            | '\u{E000}'..='\u{F8FF}'
            | '\u{F0000}'..='\u{FFFFD}'
            | '\u{100000}'..='\u{10FFFD}'
    )
}

impl From<char> for Keystroke {
    fn from(c: char) -> Self {
        Keystroke::from_char(c)
    }
}

/// One typing test. Owned by a single caller and advanced through
/// [`crate::input::apply_keystroke`].
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) prompt_text: String,
    pub(crate) prompt_chars: Vec<char>,
    pub(crate) prompt_words: Vec<String>,
    pub(crate) input_chars: Vec<char>,
    pub(crate) error_indices: BTreeSet<usize>,
    pub(crate) current_word_index: usize,
    pub(crate) started_at: Option<Instant>,
    pub(crate) ended_at: Option<Instant>,
    pub(crate) state: TestState,
    pub(crate) total_typed_entries: usize,
    pub(crate) mode: TestMode,
    pub(crate) config_value: usize,
    pub(crate) language: Language,
}

impl Session {
    pub fn new(prompt: String, mode: TestMode, config_value: usize, language: Language) -> Self {
        let prompt_words = if prompt.is_empty() {
            Vec::new()
        } else {
            prompt.split(' ').map(str::to_string).collect()
        };

        Self {
            prompt_chars: prompt.chars().collect(),
            prompt_text: prompt,
            prompt_words,
            input_chars: Vec::new(),
            error_indices: BTreeSet::new(),
            current_word_index: 0,
            started_at: None,
            ended_at: None,
            state: TestState::NotStarted,
            total_typed_entries: 0,
            mode,
            config_value,
            language,
        }
    }

    /// Load the word list for `language` and generate a fresh prompt.
    pub fn start(
        words: &mut WordSource,
        mode: TestMode,
        config_value: usize,
        language: Language,
    ) -> Result<Self, WordListError> {
        Self::start_with_rng(&mut rand::thread_rng(), words, mode, config_value, language)
    }

    pub fn start_with_rng<R: Rng + ?Sized>(
        rng: &mut R,
        words: &mut WordSource,
        mode: TestMode,
        config_value: usize,
        language: Language,
    ) -> Result<Self, WordListError> {
        let list = words.load_words(language)?;
        let prompt = generate_prompt_with(rng, list, mode, config_value);

        info!(
            "new {} session ({}) in '{}', prompt of {} chars",
            mode,
            config_value,
            language,
            prompt.chars().count()
        );

        Ok(Self::new(prompt, mode, config_value, language))
    }

    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub fn prompt_words(&self) -> &[String] {
        &self.prompt_words
    }

    pub fn input_chars(&self) -> &[char] {
        &self.input_chars
    }

    pub fn typed_text(&self) -> String {
        self.input_chars.iter().collect()
    }

    pub fn error_indices(&self) -> &BTreeSet<usize> {
        &self.error_indices
    }

    pub fn current_word_index(&self) -> usize {
        self.current_word_index
    }

    /// Prompt word the user is currently on, if any remain.
    pub fn current_prompt_word(&self) -> Option<&str> {
        self.prompt_words
            .get(self.current_word_index)
            .map(String::as_str)
    }

    pub fn state(&self) -> TestState {
        self.state
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<Instant> {
        self.ended_at
    }

    pub fn total_typed_entries(&self) -> usize {
        self.total_typed_entries
    }

    pub fn mode(&self) -> TestMode {
        self.mode
    }

    pub fn config_value(&self) -> usize {
        self.config_value
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn has_started(&self) -> bool {
        self.state != TestState::NotStarted
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed_at(Instant::now())
    }

    /// Seconds since the first keystroke, frozen once the session has ended.
    pub fn elapsed_at(&self, now: Instant) -> f64 {
        match self.started_at {
            None => 0.0,
            Some(start) => self
                .ended_at
                .unwrap_or(now)
                .saturating_duration_since(start)
                .as_secs_f64(),
        }
    }

    /// Seconds left on the clock in time mode.
    pub fn remaining_secs_at(&self, now: Instant) -> Option<f64> {
        match self.mode {
            TestMode::Time => Some((self.config_value as f64 - self.elapsed_at(now)).max(0.0)),
            TestMode::Words => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.is_finished_at(Instant::now())
    }

    pub fn is_finished_at(&self, now: Instant) -> bool {
        if self.state == TestState::Finished {
            return true;
        }
        match self.mode {
            TestMode::Time => self.elapsed_at(now) >= self.config_value as f64,
            TestMode::Words => self.current_word_index >= self.config_value,
        }
    }

    pub fn finish(&mut self) {
        self.finish_at(Instant::now())
    }

    /// Idempotent. A session that never saw a keystroke gets a zero-length run.
    pub fn finish_at(&mut self, now: Instant) {
        if self.state == TestState::Finished {
            return;
        }
        self.state = TestState::Finished;
        let ended = *self.ended_at.get_or_insert(now);
        if self.started_at.is_none() {
            self.started_at = Some(ended);
        }
        info!(
            "session finished after {:.2}s with {} keystrokes",
            self.elapsed_at(now),
            self.total_typed_entries
        );
    }

    pub(crate) fn mark_running(&mut self, now: Instant) {
        if self.state == TestState::NotStarted {
            self.state = TestState::Running;
            self.started_at = Some(now);
            debug!("session running");
        }
    }

    /// Word index is always derived from the typed text so edits keep it honest.
    pub(crate) fn sync_word_index(&mut self) {
        self.current_word_index = self.input_chars.iter().filter(|c| **c == ' ').count();
    }

    /// Owned copy of everything a renderer needs.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_at(Instant::now())
    }

    pub fn snapshot_at(&self, now: Instant) -> SessionSnapshot {
        SessionSnapshot {
            prompt_text: self.prompt_text.clone(),
            typed_text: self.typed_text(),
            error_indices: self.error_indices.iter().copied().collect(),
            current_word_index: self.current_word_index,
            current_prompt_word: self.current_prompt_word().map(str::to_string),
            elapsed_secs: self.elapsed_at(now),
            remaining_secs: self.remaining_secs_at(now),
            state: self.state,
            mode: self.mode,
            config_value: self.config_value,
        }
    }
}

/// Read-only view of a session at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub prompt_text: String,
    pub typed_text: String,
    /// Sorted ascending.
    pub error_indices: Vec<usize>,
    pub current_word_index: usize,
    pub current_prompt_word: Option<String>,
    pub elapsed_secs: f64,
    pub remaining_secs: Option<f64>,
    pub state: TestState,
    pub mode: TestMode,
    pub config_value: usize,
}

impl SessionSnapshot {
    pub fn is_error(&self, idx: usize) -> bool {
        self.error_indices.binary_search(&idx).is_ok()
    }
}
