use std::io;
use std::path::PathBuf;

use crate::words::Language;

/// Failures while resolving a word list. Any of these aborts session creation.
#[derive(Debug, thiserror::Error)]
pub enum WordListError {
    #[error("no word list for '{language}' and no fallback list for '{fallback}'")]
    NotFound {
        language: Language,
        fallback: Language,
    },

    #[error("word list '{}' has no usable entries", path.display())]
    Empty { path: PathBuf },

    #[error("failed to read word list '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
