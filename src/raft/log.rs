use serde_derive::{Deserialize, Serialize};

/// A single entry in a peer's replicated log.
///
/// `index` is dense starting from 1; index 0 is reserved for the
/// sentinel entry that every log carries so prev-log comparisons never
/// need a special case for an empty log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub index: u64,
    pub term: u64,
    pub command: Vec<u8>,
}

impl LogEntry {
    fn sentinel() -> LogEntry {
        LogEntry { index: 0, term: 0, command: Vec::new() }
    }
}

/// An ordered sequence of [`LogEntry`] values, always carrying the
/// sentinel at position 0 (invariant I5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    entries: Vec<LogEntry>,
}

impl Default for Log {
    fn default() -> Self {
        Log::new()
    }
}

impl Log {
    pub fn new() -> Log {
        Log { entries: vec![LogEntry::sentinel()] }
    }

    /// Reconstructs a log from entries already including the sentinel.
    /// Used by [`crate::raft::persister::Persister`] restoration.
    pub fn from_entries(entries: Vec<LogEntry>) -> Log {
        debug_assert_eq!(entries.first().map(|e| e.index), Some(0));
        Log { entries }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn last_index(&self) -> u64 {
        self.entries.last().expect("log always has a sentinel").index
    }

    pub fn last_term(&self) -> u64 {
        self.entries.last().expect("log always has a sentinel").term
    }

    pub fn get(&self, index: u64) -> Option<&LogEntry> {
        self.entries.get(index as usize)
    }

    /// Appends a new entry with the given term and command, returning
    /// its index.
    pub fn append(&mut self, term: u64, command: Vec<u8>) -> u64 {
        let index = self.last_index() + 1;
        self.entries.push(LogEntry { index, term, command });
        index
    }

    /// Entries whose index is strictly greater than `from`.
    pub fn entries_from(&self, from: u64) -> &[LogEntry] {
        let start = (from + 1).min(self.entries.len() as u64) as usize;
        &self.entries[start..]
    }

    /// The Raft "up-to-date" rule: is a candidate whose log ends at
    /// `(candidate_last_term, candidate_last_index)` at least as
    /// up-to-date as this log?
    pub fn is_candidate_up_to_date(&self, candidate_last_term: u64, candidate_last_index: u64) -> bool {
        let our_last_term = self.last_term();
        let our_last_index = self.last_index();
        candidate_last_term > our_last_term
            || (candidate_last_term == our_last_term && candidate_last_index >= our_last_index)
    }
}
