use std::time::Instant;
use tracing::trace;

use crate::session::{is_printable, Keystroke, Session, TestState};

/// Advance the session by one keystroke at the current time.
pub fn apply_keystroke(session: &mut Session, key: Keystroke) {
    apply_keystroke_at(session, key, Instant::now())
}

/// Advance the session by one keystroke received at `now`.
///
/// Never fails. Keystrokes after the end of the test, backspace before the
/// first character and non-printable characters are all ignored.
pub fn apply_keystroke_at(session: &mut Session, key: Keystroke, now: Instant) {
    if session.is_finished_at(now) {
        return;
    }

    if let Keystroke::Char(c) = key {
        if !is_printable(c) {
            trace!("ignoring non-printable character {:?}", c);
            return;
        }
    }

    if session.state == TestState::NotStarted {
        match key {
            Keystroke::Backspace => return,
            Keystroke::Char(_) => session.mark_running(now),
        }
    }

    match key {
        Keystroke::Backspace => erase_last(session),
        Keystroke::Char(c) => push_char(session, c),
    }

    if session.state != TestState::Finished && session.is_finished_at(now) {
        session.finish_at(now);
    }
}

fn erase_last(session: &mut Session) {
    if session.input_chars.pop().is_some() {
        let removed_idx = session.input_chars.len();
        session.error_indices.remove(&removed_idx);
        session.sync_word_index();
    }
}

fn push_char(session: &mut Session, c: char) {
    session.input_chars.push(c);
    session.total_typed_entries += 1;

    let idx = session.input_chars.len() - 1;
    match session.prompt_chars.get(idx) {
        Some(expected) if *expected == c => {
            session.error_indices.remove(&idx);
        }
        _ => {
            session.error_indices.insert(idx);
        }
    }

    session.sync_word_index();
}

/// Feed every character of `text` through [`apply_keystroke_at`].
pub fn type_str_at(session: &mut Session, text: &str, now: Instant) {
    for c in text.chars() {
        apply_keystroke_at(session, Keystroke::from_char(c), now);
    }
}
