use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use monkeytyper::{history::SessionHistory, SessionSnapshot, TestMode, TestResult};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match (self.state, self.result.as_ref()) {
            (AppState::Typing, _) | (_, None) => render_typing(&self.session.snapshot(), area, buf),
            (AppState::Results, Some(result)) => render_results(result, area, buf),
            (AppState::History, Some(_)) => render_history(&self.history, area, buf),
        }
    }
}

fn render_typing(snap: &SessionSnapshot, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_bold_style = bold_style.add_modifier(Modifier::DIM);

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_width = snap.prompt_text.width();
    let prompt_occupied_lines = if prompt_width <= max_chars_per_line as usize {
        1
    } else {
        ((prompt_width as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16
    };
    let padding = area.height.saturating_sub(prompt_occupied_lines + 2) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(padding),
            Constraint::Length(2),
            Constraint::Length(prompt_occupied_lines),
            Constraint::Min(0),
        ])
        .split(area);

    let progress = match snap.mode {
        TestMode::Time => format!("{:.1}", snap.remaining_secs.unwrap_or(0.0)),
        TestMode::Words => format!("{}/{}", snap.current_word_index, snap.config_value),
    };
    Paragraph::new(Span::styled(progress, dim_bold_style))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Line::from(prompt_spans(snap)))
        .alignment(if prompt_occupied_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);
}

/// One span per prompt character, plus anything typed past the end.
fn prompt_spans(snap: &SessionSnapshot) -> Vec<Span<'static>> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = bold_style.fg(Color::Green);
    let red_bold_style = bold_style.fg(Color::Red);
    let dim_bold_style = bold_style.add_modifier(Modifier::DIM);
    let cursor_style = dim_bold_style.add_modifier(Modifier::UNDERLINED);
    let surplus_style = bold_style.bg(Color::Red);

    let typed: Vec<char> = snap.typed_text.chars().collect();
    let mut spans: Vec<Span> = snap
        .prompt_text
        .chars()
        .enumerate()
        .map(|(idx, expected)| match typed.get(idx) {
            Some(&c) if snap.is_error(idx) => Span::styled(visible(c), red_bold_style),
            Some(_) => Span::styled(expected.to_string(), green_bold_style),
            None if idx == typed.len() => Span::styled(expected.to_string(), cursor_style),
            None => Span::styled(expected.to_string(), dim_bold_style),
        })
        .collect();

    spans.extend(
        typed
            .iter()
            .skip(snap.prompt_text.chars().count())
            .map(|c| Span::styled(visible(*c), surplus_style)),
    );
    spans
}

fn visible(c: char) -> String {
    match c {
        ' ' => "·".to_owned(),
        c => c.to_string(),
    }
}

fn result_rows(result: &TestResult) -> Vec<(&'static str, String)> {
    vec![
        ("WPM", format!("{:.2}", result.wpm)),
        ("Accuracy", format!("{:.2}%", result.accuracy)),
        ("Raw WPM", format!("{:.2}", result.raw_wpm)),
        ("Correct characters", result.correct_chars.to_string()),
        ("Incorrect characters", result.incorrect_chars.to_string()),
        ("Expected characters", result.total_chars.to_string()),
        ("Time elapsed", format!("{:.2}s", result.elapsed_secs)),
        ("Mode", format!("{} ({})", result.mode, result.config_value)),
    ]
}

fn render_results(result: &TestResult, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let rows = result_rows(result).into_iter().map(|(metric, value)| {
        Row::new(vec![
            Cell::from(metric).style(Style::default().add_modifier(Modifier::DIM)),
            Cell::from(value).style(Style::default().add_modifier(Modifier::BOLD)),
        ])
    });

    Table::new(rows, [Constraint::Length(22), Constraint::Min(10)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Test Results")
                .border_style(Style::default().fg(Color::Blue)),
        )
        .render(chunks[0], buf);

    legend("(n)ew / (r)etry / (h)istory / (esc)ape").render(chunks[1], buf);
}

fn render_history(history: &SessionHistory, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let header = Row::new(["Test", "Time", "Mode", "WPM", "Acc %", "Raw", "Chars (C/I)"])
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    let rows = history.iter_latest_first().map(|(n, entry)| {
        let r = &entry.result;
        Row::new(vec![
            format!("Test {n}"),
            entry.recorded_at.format("%H:%M:%S").to_string(),
            format!("{} ({})", r.mode, r.config_value),
            format!("{:.1}", r.wpm),
            format!("{:.1}", r.accuracy),
            format!("{:.1}", r.raw_wpm),
            format!("{}/{}", r.correct_chars, r.incorrect_chars),
        ])
    });

    Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(14),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Min(11),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Session History"),
    )
    .render(chunks[0], buf);

    let summary = [
        history.average_wpm().map(|w| format!("avg {w:.1} wpm")),
        history.best_wpm().map(|w| format!("best {w:.1} wpm")),
        history.average_accuracy().map(|a| format!("avg {a:.1}% acc")),
    ]
    .into_iter()
    .flatten()
    .join("   ");

    Paragraph::new(Span::styled(
        summary,
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    legend("(b)ack / (n)ew / (esc)ape").render(chunks[2], buf);
}

fn legend(text: &'static str) -> Paragraph<'static> {
    Paragraph::new(Span::styled(
        text,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestOptions;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use monkeytyper::{Language, WordSource};

    fn create_test_app(prompt: &str, mode: TestMode, config_value: usize) -> App {
        let options = TestOptions {
            mode,
            config_value,
            language: Language::En,
        };
        App::new(options, Some(prompt.to_string()), WordSource::embedded()).unwrap()
    }

    fn type_keys(app: &mut App, text: &str) {
        for c in text.chars() {
            app.on_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
    }

    fn rendered(app: &App, area: Rect) -> String {
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_typing_screen_shows_prompt_and_counter() {
        let app = create_test_app("hello world", TestMode::Words, 2);
        let out = rendered(&app, Rect::new(0, 0, 80, 24));
        assert!(out.contains("hello world"));
        assert!(out.contains("0/2"));
    }

    #[test]
    fn test_typing_screen_shows_timer() {
        let app = create_test_app("hello", TestMode::Time, 30);
        let out = rendered(&app, Rect::new(0, 0, 80, 24));
        assert!(out.contains("30.0"));
    }

    #[test]
    fn test_prompt_spans_mark_errors_and_surplus() {
        let mut app = create_test_app("ab", TestMode::Words, 5);
        type_keys(&mut app, "axyz");

        let spans = prompt_spans(&app.session.snapshot());

        assert_eq!(spans.len(), 4);
        assert_eq!(spans[0].style.fg, Some(Color::Green));
        assert_eq!(spans[1].content, "x");
        assert_eq!(spans[1].style.fg, Some(Color::Red));
        assert_eq!(spans[2].style.bg, Some(Color::Red));
        assert_eq!(spans[3].content, "z");
    }

    #[test]
    fn test_prompt_spans_cursor_on_next_char() {
        let mut app = create_test_app("cat", TestMode::Words, 1);
        type_keys(&mut app, "c");

        let spans = prompt_spans(&app.session.snapshot());
        assert!(spans[1].style.add_modifier.contains(Modifier::UNDERLINED));
        assert!(!spans[2].style.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn test_results_and_history_screens() {
        let mut app = create_test_app("hi", TestMode::Words, 1);
        type_keys(&mut app, "hi ");
        assert_eq!(app.state, AppState::Results);

        let out = rendered(&app, Rect::new(0, 0, 80, 24));
        assert!(out.contains("Test Results"));
        assert!(out.contains("words (1)"));

        app.state = AppState::History;
        let out = rendered(&app, Rect::new(0, 0, 100, 24));
        assert!(out.contains("Session History"));
        assert!(out.contains("Test 1"));
    }

    #[test]
    fn test_small_area_does_not_panic() {
        let app = create_test_app("hello there friend", TestMode::Time, 15);
        let area = Rect::new(0, 0, 12, 3);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        assert_eq!(*buffer.area(), area);
    }
}
