//! Row and cell types

use crate::cell::CellValue;
use std::collections::BTreeMap;

/// Role of a row within a built sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RowKind {
    /// Caption row merged across every mapped column
    Title,
    /// Column display names
    Header,
    /// One input record
    Data,
    /// Row without a known role (e.g. read back from a package)
    #[default]
    Plain,
}

/// A cell: its value plus an index into the workbook's style table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    pub style: u32,
}

impl Cell {
    /// Create a cell
    pub fn new(value: CellValue, style: u32) -> Self {
        Self { value, style }
    }
}

/// A worksheet row
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Row index (0-based)
    pub index: u32,
    pub kind: RowKind,
    /// Custom height in points (None = default)
    pub height: Option<f64>,
    cells: BTreeMap<u16, Cell>,
}

impl Row {
    /// Create an empty row
    pub fn new(index: u32, kind: RowKind) -> Self {
        Self {
            index,
            kind,
            height: None,
            cells: BTreeMap::new(),
        }
    }

    /// Get a cell by column index
    pub fn cell(&self, col: u16) -> Option<&Cell> {
        self.cells.get(&col)
    }

    /// Get a mutable cell by column index
    pub fn cell_mut(&mut self, col: u16) -> Option<&mut Cell> {
        self.cells.get_mut(&col)
    }

    /// Store a cell, replacing any previous one at that column
    pub fn set_cell(&mut self, col: u16, cell: Cell) {
        self.cells.insert(col, cell);
    }

    /// Iterate over cells in column order
    pub fn cells(&self) -> impl Iterator<Item = (u16, &Cell)> {
        self.cells.iter().map(|(&col, cell)| (col, cell))
    }

    /// Lowest and highest occupied column
    pub fn column_span(&self) -> Option<(u16, u16)> {
        let first = *self.cells.keys().next()?;
        let last = *self.cells.keys().next_back()?;
        Some((first, last))
    }

    /// Check if row has any cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of cells in the row
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
