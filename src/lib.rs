// Library surface for headless/integration tests and reuse.
// Terminal rendering lives in the binary.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod history;
pub mod input;
pub mod metrics;
pub mod prompt;
pub mod runtime;
pub mod session;
pub mod words;

pub use error::WordListError;
pub use input::{apply_keystroke, apply_keystroke_at};
pub use metrics::{compute_result, compute_result_at, TestResult};
pub use session::{Keystroke, Session, SessionSnapshot, TestMode, TestState};
pub use words::{Language, WordSource};
