//! Workbook-wide shared string table

use super::SharedString;
use ahash::AHashMap;

/// Insertion-ordered string dedup table
///
/// Every text cell in a package references an entry of this table by index.
/// Repeated strings resolve to the entry created by their first occurrence, so
/// index assignment is stable for identical input.
#[derive(Debug, Default, Clone)]
pub struct SharedStringTable {
    strings: Vec<SharedString>,
    index: AHashMap<SharedString, u32>,
    /// Total number of references handed out (the `count` attribute)
    references: u64,
}

impl SharedStringTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the index of a string, adding it if it is new
    pub fn intern(&mut self, s: &str) -> u32 {
        self.references += 1;
        if let Some(&idx) = self.index.get(s) {
            return idx;
        }
        let idx = self.strings.len() as u32;
        let shared = SharedString::new(s);
        self.index.insert(shared.clone(), idx);
        self.strings.push(shared);
        idx
    }

    /// Append a string read back from a package, without dedup
    ///
    /// Packages written by other tools may repeat entries; indices must still
    /// line up with the order of the part.
    pub fn push(&mut self, s: SharedString) -> u32 {
        let idx = self.strings.len() as u32;
        self.index.entry(s.clone()).or_insert(idx);
        self.strings.push(s);
        idx
    }

    /// Get a string by index
    pub fn get(&self, index: u32) -> Option<&SharedString> {
        self.strings.get(index as usize)
    }

    /// Number of unique strings
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Total number of references made through [`intern`](Self::intern)
    pub fn count(&self) -> u64 {
        self.references
    }

    /// Iterate over strings in index order
    pub fn iter(&self) -> impl Iterator<Item = &SharedString> {
        self.strings.iter()
    }
}
