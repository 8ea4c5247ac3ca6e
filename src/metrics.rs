use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

use crate::session::{Session, TestMode};

/// Characters that make up one "word" for speed purposes.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Final score of one finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Speed counting only characters that ended up correct
    pub wpm: f64,
    /// Speed counting every accepted keystroke, corrected or not
    pub raw_wpm: f64,
    /// Percentage in `0..=100`
    pub accuracy: f64,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    /// Expected length of the completed portion of the prompt
    pub total_chars: usize,
    pub elapsed_secs: f64,
    pub mode: TestMode,
    pub config_value: usize,
}

impl TestResult {
    pub fn zeroed(mode: TestMode, config_value: usize) -> Self {
        Self {
            wpm: 0.0,
            raw_wpm: 0.0,
            accuracy: 0.0,
            correct_chars: 0,
            incorrect_chars: 0,
            total_chars: 0,
            elapsed_secs: 0.0,
            mode,
            config_value,
        }
    }
}

pub fn words_per_minute(chars: usize, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    (chars as f64 / CHARS_PER_WORD) / (elapsed_secs / 60.0)
}

pub fn accuracy(correct: usize, incorrect: usize) -> f64 {
    let compared = correct + incorrect;
    if compared == 0 {
        return 0.0;
    }
    correct as f64 / compared as f64 * 100.0
}

pub fn compute_result(session: &mut Session) -> TestResult {
    compute_result_at(session, Instant::now())
}

/// Score the session, finishing it first if it is still open.
pub fn compute_result_at(session: &mut Session, now: Instant) -> TestResult {
    session.finish_at(now);

    let elapsed_secs = session.elapsed_at(now);
    if elapsed_secs <= 0.0 {
        return TestResult::zeroed(session.mode, session.config_value);
    }

    let (correct_chars, incorrect_chars) =
        count_chars(&session.input_chars, &session.prompt_chars);

    TestResult {
        wpm: words_per_minute(correct_chars, elapsed_secs),
        raw_wpm: words_per_minute(session.total_typed_entries, elapsed_secs),
        accuracy: accuracy(correct_chars, incorrect_chars),
        correct_chars,
        incorrect_chars,
        total_chars: expected_chars(session),
        elapsed_secs,
        mode: session.mode,
        config_value: session.config_value,
    }
}

/// Position-wise comparison; anything typed past the prompt is incorrect.
fn count_chars(typed: &[char], prompt: &[char]) -> (usize, usize) {
    let correct = typed
        .iter()
        .zip(prompt.iter())
        .filter(|(t, p)| t == p)
        .count();
    let compared = typed.len().min(prompt.len());
    let surplus = typed.len().saturating_sub(prompt.len());

    (correct, compared - correct + surplus)
}

fn expected_chars(session: &Session) -> usize {
    match session.mode {
        TestMode::Time => session.input_chars.len(),
        TestMode::Words => {
            let available = session.prompt_words.len();
            if available < session.config_value {
                warn!(
                    "prompt has only {} words, fewer than the {} requested",
                    available, session.config_value
                );
            }
            let words = &session.prompt_words[..session.config_value.min(available)];
            words.join(" ").chars().count()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{apply_keystroke_at, type_str_at};
    use crate::session::Keystroke;
    use crate::words::Language;
    use std::time::Duration;

    fn run_words(prompt: &str, n: usize, typed: &str, secs: u64) -> TestResult {
        let t0 = Instant::now();
        let end = t0 + Duration::from_secs(secs);
        let mut session = Session::new(prompt.to_string(), TestMode::Words, n, Language::En);

        // Clock starts on the first key; the rest land at `end` so a session
        // that finishes on its last space still spans the whole duration.
        let mut chars = typed.chars();
        if let Some(first) = chars.next() {
            apply_keystroke_at(&mut session, Keystroke::from_char(first), t0);
        }
        type_str_at(&mut session, chars.as_str(), end);
        compute_result_at(&mut session, end)
    }

    #[test]
    fn test_words_per_minute() {
        // 300 chars in 60 seconds = 60 WPM
        assert_eq!(words_per_minute(300, 60.0), 60.0);
        assert_eq!(words_per_minute(150, 30.0), 60.0);
        assert_eq!(words_per_minute(100, 0.0), 0.0);
        assert_eq!(words_per_minute(100, -1.0), 0.0);
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(90, 10), 90.0);
        assert_eq!(accuracy(0, 0), 0.0);
        assert_eq!(accuracy(7, 0), 100.0);
    }

    #[test]
    fn test_count_chars_with_surplus() {
        let typed: Vec<char> = "cat dogxyz".chars().collect();
        let prompt: Vec<char> = "cat dog".chars().collect();
        assert_eq!(count_chars(&typed, &prompt), (7, 3));
    }

    #[test]
    fn test_exact_typing_scores_full_accuracy() {
        let result = run_words("cat dog", 2, "cat dog", 60);

        assert_eq!(result.correct_chars, 7);
        assert_eq!(result.incorrect_chars, 0);
        assert_eq!(result.accuracy, 100.0);
        assert_eq!(result.total_chars, 7);
        assert_eq!(result.elapsed_secs, 60.0);
        assert!((result.wpm - 1.4).abs() < 1e-9);
    }

    #[test]
    fn test_single_mismatch() {
        let result = run_words("cat dog", 2, "cat dig", 60);

        assert_eq!(result.correct_chars, 6);
        assert_eq!(result.incorrect_chars, 1);
        assert!((result.accuracy - 85.714).abs() < 0.01);
    }

    #[test]
    fn test_raw_wpm_counts_backspaced_keystrokes() {
        // "cx" + backspace + "at" = 4 keystrokes accepted, 3 correct chars
        let result = run_words("cat", 1, "cx\x7fat", 12);

        assert_eq!(result.correct_chars, 3);
        assert!((result.wpm - 3.0).abs() < 1e-9);
        assert!((result.raw_wpm - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_keystrokes_yields_zeroed_result() {
        let mut session = Session::new("cat dog".to_string(), TestMode::Time, 30, Language::En);
        let result = compute_result(&mut session);

        assert_eq!(result, TestResult::zeroed(TestMode::Time, 30));
        assert_eq!(session.state(), crate::session::TestState::Finished);
    }

    #[test]
    fn test_time_mode_total_chars_is_typed_length() {
        let t0 = Instant::now();
        let mut session = Session::new("cat dog".to_string(), TestMode::Time, 30, Language::En);
        type_str_at(&mut session, "cat d", t0);

        let result = compute_result_at(&mut session, t0 + Duration::from_secs(30));
        assert_eq!(result.total_chars, 5);
        assert_eq!(result.mode, TestMode::Time);
        assert_eq!(result.config_value, 30);
    }

    #[test]
    fn test_words_mode_total_chars_covers_requested_words() {
        let result = run_words("cat dog owl", 2, "cat dog ", 10);
        assert_eq!(result.elapsed_secs, 10.0);
        assert_eq!(result.total_chars, 7);
        assert_eq!(result.correct_chars, 8);
        assert_eq!(result.incorrect_chars, 0);
    }

    #[test]
    fn test_words_mode_short_prompt_uses_available_words() {
        let result = run_words("cat dog", 5, "cat", 10);
        assert_eq!(result.total_chars, 7);
    }

    #[test]
    fn test_result_is_stable_after_finish() {
        let t0 = Instant::now();
        let mut session = Session::new("cat".to_string(), TestMode::Words, 1, Language::En);
        type_str_at(&mut session, "ca", t0);

        let first = compute_result_at(&mut session, t0 + Duration::from_secs(6));
        let second = compute_result_at(&mut session, t0 + Duration::from_secs(60));
        assert_eq!(first, second);
    }

    #[test]
    fn test_result_serializes() {
        let result = TestResult::zeroed(TestMode::Words, 25);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"mode\":\"words\""));
        let back: TestResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
