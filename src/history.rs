use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::error::CalcError;
use crate::modes::{CalcOutcome, Mode};

pub const DEFAULT_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub mode: Mode,
    pub expression: String,
    pub outcome: CalcOutcome,
    pub at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(mode: Mode, expression: impl Into<String>, outcome: CalcOutcome) -> Self {
        HistoryEntry {
            mode,
            expression: expression.into(),
            outcome,
            at: Utc::now(),
        }
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.expression, self.outcome)
    }
}

/// Most-recent-first log of successful calculations.
///
/// Holds at most `capacity` entries; pushing onto a full log drops the oldest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    capacity: usize,
    entries: VecDeque<HistoryEntry>,
}

impl Default for History {
    fn default() -> Self {
        History {
            capacity: DEFAULT_CAPACITY,
            entries: VecDeque::with_capacity(DEFAULT_CAPACITY),
        }
    }
}

impl History {
    pub fn with_capacity(capacity: usize) -> Result<Self, CalcError> {
        if capacity == 0 {
            return Err(CalcError::Config(
                "history capacity must be at least 1".to_string(),
            ));
        }
        Ok(History {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        })
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Entry `index`, counting from the newest (0).
    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Change the bound, dropping the oldest entries if the log no longer fits.
    pub fn resize(&mut self, capacity: usize) -> Result<(), CalcError> {
        if capacity == 0 {
            return Err(CalcError::Config(
                "history capacity must be at least 1".to_string(),
            ));
        }
        self.capacity = capacity;
        self.entries.truncate(capacity);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: f64) -> HistoryEntry {
        HistoryEntry::new(Mode::Simple, format!("{} + 0", n), CalcOutcome::Scalar(n))
    }

    #[test]
    fn newest_first_and_bounded() {
        let mut history = History::with_capacity(3).unwrap();
        for n in 1..=5 {
            history.push(entry(n as f64));
        }

        assert_eq!(history.len(), 3);
        let values: Vec<f64> = history
            .entries()
            .filter_map(|e| e.outcome.as_scalar())
            .collect();
        assert_eq!(values, vec![5.0, 4.0, 3.0]);
        assert_eq!(history.latest().unwrap().expression, "5 + 0");
        assert_eq!(history.get(2).unwrap().outcome, CalcOutcome::Scalar(3.0));
        assert!(history.get(3).is_none());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(History::with_capacity(0), Err(CalcError::Config(_))));
        let mut history = History::default();
        assert!(history.resize(0).is_err());
        assert_eq!(history.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn shrinking_drops_oldest() {
        let mut history = History::with_capacity(5).unwrap();
        for n in 1..=5 {
            history.push(entry(n as f64));
        }
        history.resize(2).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.get(1).unwrap().outcome, CalcOutcome::Scalar(4.0));

        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), 2);
    }

    #[test]
    fn display() {
        let e = HistoryEntry::new(Mode::Add, "12 + 6", CalcOutcome::Scalar(18.0));
        assert_eq!(e.to_string(), "12 + 6 = 18");
    }
}
