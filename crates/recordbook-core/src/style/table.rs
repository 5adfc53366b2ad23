//! Style table for deduplication

use super::Style;
use ahash::AHashMap;
use std::hash::{BuildHasher, Hash, Hasher};

/// Workbook-wide registry of distinct styles
///
/// Structurally equal styles always intern to the same index, and indices
/// are assigned in order of first insertion. Slot 0 holds the default style.
/// The table is append-only.
#[derive(Debug, Clone)]
pub struct StyleTable {
    styles: Vec<Style>,
    /// Style hash to every slot with that hash
    buckets: AHashMap<u64, Vec<u32>>,
}

fn style_hash(style: &Style) -> u64 {
    // Fixed keys keep bucket layout independent of process-wide seeding
    let mut hasher = ahash::RandomState::with_seeds(0, 0, 0, 0).build_hasher();
    style.hash(&mut hasher);
    hasher.finish()
}

impl StyleTable {
    /// Create a table holding only the default style
    pub fn new() -> Self {
        let mut table = Self {
            styles: Vec::with_capacity(16),
            buckets: AHashMap::with_capacity(16),
        };
        table.push(Style::default());
        table
    }

    fn push(&mut self, style: Style) -> u32 {
        let idx = self.styles.len() as u32;
        self.buckets.entry(style_hash(&style)).or_default().push(idx);
        self.styles.push(style);
        idx
    }

    /// Get the index of a style, adding it if no equal style exists
    pub fn intern(&mut self, style: Style) -> u32 {
        if let Some(idx) = self.find(&style) {
            return idx;
        }
        self.push(style)
    }

    /// Look up the index of an equal style without inserting
    pub fn find(&self, style: &Style) -> Option<u32> {
        self.buckets
            .get(&style_hash(style))?
            .iter()
            .copied()
            .find(|&idx| self.styles[idx as usize] == *style)
    }

    /// Append a style read back from a package, keeping its position
    ///
    /// Unlike [`intern`](Self::intern) this never merges: a package may list
    /// equal formats at distinct indices and cells refer to them by position.
    pub fn push_raw(&mut self, style: Style) -> u32 {
        self.push(style)
    }

    /// Get a style by index
    pub fn get(&self, index: u32) -> Option<&Style> {
        self.styles.get(index as usize)
    }

    /// Get the default style (index 0)
    pub fn default_style(&self) -> &Style {
        &self.styles[0]
    }

    /// Number of styles, default included
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Check if only the default style is present
    pub fn is_empty(&self) -> bool {
        self.styles.len() <= 1
    }

    /// Iterate over all styles with their indices
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Style)> {
        self.styles.iter().enumerate().map(|(i, s)| (i as u32, s))
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::new()
    }
}
