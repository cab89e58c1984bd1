//! Repeat-offense aggregation.
//!
//! Counts late arrival events per student over an arbitrary event set
//! and classifies students against a threshold. Two call sites use
//! this with different semantics: the hard warning check runs over a
//! single student's all-time history right after an insert, and the
//! disciplinary-review candidate list runs over whatever filtered
//! subset a report is currently showing.

use std::collections::HashMap;

use serde::Serialize;

/// An event suitable for tallying.
///
/// This trait lets aggregation work with different event
/// representations (stored rows from lt-db, or test fixtures).
pub trait TalliedEvent {
    /// Live student reference, if the event still has one.
    fn student_id(&self) -> Option<&str>;

    /// Enrollment number snapshot taken at insert time.
    fn nis(&self) -> Option<&str>;

    /// Name snapshot taken at insert time.
    fn nama(&self) -> &str;

    /// Class snapshot taken at insert time.
    fn kelas(&self) -> &str;
}

/// Identity used for grouping. Historic rows whose student reference
/// was lost fall back to the snapshot composite so they still count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum OffenderKey {
    StudentId(String),
    Snapshot {
        nis: String,
        nama: String,
        kelas: String,
    },
}

impl OffenderKey {
    fn for_event<E: TalliedEvent>(event: &E) -> Self {
        event.student_id().map_or_else(
            || Self::Snapshot {
                nis: event.nis().unwrap_or_default().to_string(),
                nama: event.nama().to_string(),
                kelas: event.kelas().to_string(),
            },
            |id| Self::StudentId(id.to_string()),
        )
    }
}

/// One student's occurrence count within a tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OffenderEntry {
    pub nama: String,
    pub nis: Option<String>,
    pub kelas: String,
    pub count: usize,
}

/// Per-student counts over one event set.
///
/// Entries keep the order in which each student first appeared in the
/// input, so enumeration is deterministic for a given event list.
#[derive(Debug, Clone, Default)]
pub struct OffenseTally {
    entries: Vec<OffenderEntry>,
}

impl OffenseTally {
    /// Counts events per student in a single pass.
    pub fn from_events<E: TalliedEvent>(events: &[E]) -> Self {
        let mut index: HashMap<OffenderKey, usize> = HashMap::new();
        let mut entries: Vec<OffenderEntry> = Vec::new();

        for event in events {
            let key = OffenderKey::for_event(event);
            match index.get(&key) {
                Some(&slot) => entries[slot].count += 1,
                None => {
                    index.insert(key, entries.len());
                    entries.push(OffenderEntry {
                        nama: event.nama().to_string(),
                        nis: event.nis().map(str::to_string),
                        kelas: event.kelas().to_string(),
                        count: 1,
                    });
                }
            }
        }

        Self { entries }
    }

    /// All entries in first-appearance order.
    #[must_use]
    pub fn entries(&self) -> &[OffenderEntry] {
        &self.entries
    }

    /// Number of distinct students in the tally.
    #[must_use]
    pub fn distinct_students(&self) -> usize {
        self.entries.len()
    }

    /// Entries with `count >= threshold`, sorted descending by count.
    ///
    /// The sort must be stable: ties keep their first-appearance order.
    #[must_use]
    pub fn classify(&self, threshold: usize) -> Vec<OffenderEntry> {
        let mut flagged: Vec<OffenderEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.count >= threshold)
            .cloned()
            .collect();
        flagged.sort_by(|a, b| b.count.cmp(&a.count));
        flagged
    }
}
