use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::debug;

use crate::session::Keystroke;

/// Unified event type consumed by the app loop
#[derive(Clone, Debug)]
pub enum TestEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait TestEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<TestEvent, RecvTimeoutError>;
}

/// Production event source reading crossterm events on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<TestEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => TestEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => TestEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    debug!("terminal event reader stopped: {}", e);
                    break;
                }
            };
            if tx.send(evt).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TestEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Event source fed from a channel, for headless runs and tests
pub struct ChannelEventSource {
    rx: Receiver<TestEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<TestEvent>) -> Self {
        Self { rx }
    }
}

impl TestEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TestEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Advances the application one event at a time, yielding `Tick` when idle
pub struct Runner<E: TestEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: TestEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn step(&self) -> TestEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => TestEvent::Tick,
        }
    }
}

/// Translate a terminal key press into a keystroke for the session.
///
/// Keys with no meaning to a typing test (arrows, enter, modified chords)
/// map to `None`.
pub fn keystroke_from_key_event(key: &KeyEvent) -> Option<Keystroke> {
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }
    match key.code {
        KeyCode::Backspace => Some(Keystroke::Backspace),
        KeyCode::Char(c) => Some(Keystroke::from_char(c)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::new(
            ChannelEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );

        assert!(matches!(runner.step(), TestEvent::Tick));
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(TestEvent::Resize).unwrap();
        let runner = Runner::new(
            ChannelEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(10)),
        );

        assert!(matches!(runner.step(), TestEvent::Resize));
    }

    #[test]
    fn key_events_map_to_keystrokes() {
        let plain = |code| KeyEvent::new(code, KeyModifiers::NONE);

        assert_eq!(
            keystroke_from_key_event(&plain(KeyCode::Char('a'))),
            Some(Keystroke::Char('a'))
        );
        assert_eq!(
            keystroke_from_key_event(&KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            Some(Keystroke::Char('A'))
        );
        assert_eq!(
            keystroke_from_key_event(&plain(KeyCode::Backspace)),
            Some(Keystroke::Backspace)
        );
        assert_eq!(keystroke_from_key_event(&plain(KeyCode::Enter)), None);
        assert_eq!(keystroke_from_key_event(&plain(KeyCode::Left)), None);
        assert_eq!(
            keystroke_from_key_event(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            None
        );
    }
}
