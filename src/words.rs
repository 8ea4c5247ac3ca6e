use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::WordListError;

static LANG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/lang");

/// Languages with a bundled word list, keyed by their short code.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    /// English
    En,
    /// Indonesian
    Id,
}

impl Language {
    /// Used whenever the requested language has no list.
    pub const DEFAULT: Language = Language::En;

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Id => "id",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}_words.txt", self.code())
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone)]
enum Backing {
    Embedded,
    Directory(PathBuf),
}

/// Loads word lists and keeps them for the lifetime of the process.
///
/// Lists are cached under the language they actually resolved to, so a request
/// that falls back to the default language fills the default language's slot.
#[derive(Debug)]
pub struct WordSource {
    backing: Backing,
    cache: HashMap<Language, Vec<String>>,
}

impl WordSource {
    /// Word lists compiled into the binary.
    pub fn embedded() -> Self {
        Self {
            backing: Backing::Embedded,
            cache: HashMap::new(),
        }
    }

    /// Word lists read from `<dir>/<code>_words.txt`.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            backing: Backing::Directory(dir.as_ref().to_path_buf()),
            cache: HashMap::new(),
        }
    }

    pub fn load_words(&mut self, language: Language) -> Result<&[String], WordListError> {
        let resolved = self.resolve(language)?;
        Ok(self.cache.get(&resolved).map(Vec::as_slice).unwrap_or(&[]))
    }

    fn is_cached(&self, language: Language) -> bool {
        self.cache.contains_key(&language)
    }

    fn resolve(&mut self, language: Language) -> Result<Language, WordListError> {
        if self.is_cached(language) {
            return Ok(language);
        }

        if let Some(words) = self.read_list(language)? {
            self.cache.insert(language, words);
            return Ok(language);
        }

        let fallback = Language::DEFAULT;
        if language == fallback {
            return Err(WordListError::NotFound { language, fallback });
        }

        warn!(
            "word list for '{}' not found, falling back to '{}'",
            language, fallback
        );

        if self.is_cached(fallback) {
            return Ok(fallback);
        }

        match self.read_list(fallback)? {
            Some(words) => {
                self.cache.insert(fallback, words);
                Ok(fallback)
            }
            None => Err(WordListError::NotFound { language, fallback }),
        }
    }

    /// `Ok(None)` when the list does not exist at all.
    fn read_list(&self, language: Language) -> Result<Option<Vec<String>>, WordListError> {
        let file_name = language.file_name();

        let (path, contents) = match &self.backing {
            Backing::Embedded => {
                let path = PathBuf::from(&file_name);
                let Some(file) = LANG_DIR.get_file(&file_name) else {
                    return Ok(None);
                };
                let contents = file.contents_utf8().ok_or_else(|| WordListError::Io {
                    path: path.clone(),
                    source: io::Error::new(io::ErrorKind::InvalidData, "not valid UTF-8"),
                })?;
                (path, contents.to_string())
            }
            Backing::Directory(dir) => {
                let path = dir.join(&file_name);
                match fs::read_to_string(&path) {
                    Ok(contents) => (path, contents),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
                    Err(source) => return Err(WordListError::Io { path, source }),
                }
            }
        };

        let words = parse_word_list(&contents);
        if words.is_empty() {
            return Err(WordListError::Empty { path });
        }

        debug!("loaded {} words from {}", words.len(), path.display());
        Ok(Some(words))
    }
}

impl Default for WordSource {
    fn default() -> Self {
        Self::embedded()
    }
}

/// One word per line; surrounding whitespace and blank lines are dropped.
pub fn parse_word_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
