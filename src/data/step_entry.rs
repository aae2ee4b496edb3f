use crate::calc::validator::DATE_FORMAT;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct StepEntry {
    #[serde(rename = "date")]
    pub key: String,
    #[serde(skip)]
    pub date: NaiveDate,
    pub distance: f64,
}

impl StepEntry {
    pub fn new(date: NaiveDate, distance: f64) -> Self {
        StepEntry {
            key: date.format(DATE_FORMAT).to_string(),
            date,
            distance,
        }
    }
}

/// Per-day distance totals, most recent day first.
#[derive(Serialize, Default, Debug, Clone)]
pub struct StepLedger {
    entries: Vec<StepEntry>,
}

impl StepLedger {
    pub fn entries(&self) -> &[StepEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&StepEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Adds `distance` to the entry for `date`, creating it if needed, then
    /// restores descending date order. Returns the updated entry.
    pub fn upsert(&mut self, date: NaiveDate, distance: f64) -> &StepEntry {
        let incoming = StepEntry::new(date, distance);
        match self.entries.iter_mut().find(|e| e.key == incoming.key) {
            Some(existing) => existing.distance += distance,
            None => self.entries.push(incoming),
        }
        self.entries.sort_by(|a, b| b.date.cmp(&a.date));

        let idx = self
            .entries
            .iter()
            .position(|e| e.date == date)
            .unwrap_or_default();
        &self.entries[idx]
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|e| e.key != key);
    }

    pub fn total_distance(&self) -> f64 {
        self.entries.iter().map(|e| e.distance).sum()
    }
}
