use rand::seq::SliceRandom;
use rand::Rng;

use crate::session::TestMode;

/// Words drawn for a timed test. The clock ends the test, not the word supply.
pub const TIME_MODE_POOL: usize = 200;

/// Prompt used when there are no words to draw from.
pub const PLACEHOLDER_PROMPT: &str = "error loading words";

/// Build the text the user has to type.
pub fn generate_prompt(words: &[String], mode: TestMode, config_value: usize) -> String {
    generate_prompt_with(&mut rand::thread_rng(), words, mode, config_value)
}

/// Same as [`generate_prompt`] with a caller-supplied RNG.
///
/// Word mode draws `min(config_value, words.len())` distinct entries; time mode
/// draws [`TIME_MODE_POOL`] entries with replacement.
pub fn generate_prompt_with<R: Rng + ?Sized>(
    rng: &mut R,
    words: &[String],
    mode: TestMode,
    config_value: usize,
) -> String {
    if words.is_empty() {
        return PLACEHOLDER_PROMPT.to_string();
    }

    let selected: Vec<&str> = match mode {
        TestMode::Words => words
            .choose_multiple(rng, config_value.min(words.len()))
            .map(String::as_str)
            .collect(),
        TestMode::Time => (0..TIME_MODE_POOL)
            .filter_map(|_| words.choose(rng).map(String::as_str))
            .collect(),
    };

    selected.join(" ")
}
