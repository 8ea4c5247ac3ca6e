use chrono::{DateTime, Local};

use crate::metrics::TestResult;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub result: TestResult,
    pub recorded_at: DateTime<Local>,
}

/// Results of every test finished while the program is running. Not persisted.
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    entries: Vec<HistoryEntry>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: TestResult) {
        self.entries.push(HistoryEntry {
            result,
            recorded_at: Local::now(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries newest first, paired with their 1-based test number.
    pub fn iter_latest_first(&self) -> impl Iterator<Item = (usize, &HistoryEntry)> {
        self.entries
            .iter()
            .enumerate()
            .rev()
            .map(|(i, entry)| (i + 1, entry))
    }

    pub fn average_wpm(&self) -> Option<f64> {
        mean(&self.collect(|r| r.wpm))
    }

    pub fn average_accuracy(&self) -> Option<f64> {
        mean(&self.collect(|r| r.accuracy))
    }

    pub fn best_wpm(&self) -> Option<f64> {
        self.entries
            .iter()
            .map(|e| e.result.wpm)
            .fold(None, |best, wpm| match best {
                Some(b) if b >= wpm => Some(b),
                _ => Some(wpm),
            })
    }

    fn collect(&self, f: impl Fn(&TestResult) -> f64) -> Vec<f64> {
        self.entries.iter().map(|e| f(&e.result)).collect()
    }
}

fn mean(data: &[f64]) -> Option<f64> {
    match data.len() {
        0 => None,
        count => Some(data.iter().sum::<f64>() / count as f64),
    }
}
