//! Worksheet type

use crate::cell::{CellAddress, CellRange, CellValue};
use crate::column::Column;
use crate::error::{Error, Result};
use crate::row::{Cell, Row, RowKind};
use crate::{MAX_COLS, MAX_ROWS};
use std::collections::BTreeMap;

/// A single sheet in a workbook
///
/// Rows and columns are stored sparsely and kept in index order. Cells refer
/// to styles by index; the styles themselves live in the owning workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    name: String,
    rows: BTreeMap<u32, Row>,
    columns: BTreeMap<u16, Column>,
    merged: Vec<CellRange>,
}

impl Worksheet {
    /// Create a new empty worksheet
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
            columns: BTreeMap::new(),
            merged: Vec::new(),
        }
    }

    /// Get the worksheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    // === Rows ===

    /// Append a row directly after the last existing one and return its index
    pub fn push_row(&mut self, kind: RowKind) -> u32 {
        let index = self.rows.keys().next_back().map_or(0, |last| last + 1);
        self.rows.insert(index, Row::new(index, kind));
        index
    }

    /// Get a row by index
    pub fn row(&self, index: u32) -> Option<&Row> {
        self.rows.get(&index)
    }

    /// Get a mutable row by index
    pub fn row_mut(&mut self, index: u32) -> Option<&mut Row> {
        self.rows.get_mut(&index)
    }

    /// Get a row by index, creating an empty plain row if needed
    pub fn ensure_row(&mut self, index: u32) -> Result<&mut Row> {
        if index >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(index, MAX_ROWS - 1));
        }
        Ok(self
            .rows
            .entry(index)
            .or_insert_with(|| Row::new(index, RowKind::Plain)))
    }

    /// Iterate over rows in index order
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    /// Number of rows covered by the used range
    pub fn row_count(&self) -> u32 {
        self.dimension().map_or(0, |d| d.row_count())
    }

    // === Cells ===

    /// Store a value at a 0-based coordinate, creating the row if needed
    pub fn set_cell(&mut self, row: u32, col: u16, value: CellValue, style: u32) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
        }
        self.rows
            .entry(row)
            .or_insert_with(|| Row::new(row, RowKind::Plain))
            .set_cell(col, Cell::new(value, style));
        Ok(())
    }

    /// Get a cell by 0-based coordinate
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&Cell> {
        self.rows.get(&row)?.cell(col)
    }

    /// Get a cell value by A1 address (Empty when no cell is stored)
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Get a cell value by 0-based coordinate (Empty when no cell is stored)
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cell_at(row, col)
            .map(|c| c.value.clone())
            .unwrap_or_default()
    }

    /// Iterate over all cells as (row, col, cell)
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &Cell)> {
        self.rows
            .values()
            .flat_map(|row| row.cells().map(move |(col, cell)| (row.index, col, cell)))
    }

    /// Total number of stored cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(Row::cell_count).sum()
    }

    // === Columns ===

    /// Store column settings, replacing any previous ones for that index
    pub fn set_column(&mut self, column: Column) {
        self.columns.insert(column.index, column);
    }

    /// Get column settings
    pub fn column(&self, index: u16) -> Option<&Column> {
        self.columns.get(&index)
    }

    /// Iterate over columns that carry settings
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    /// Number of columns covered by the used range
    pub fn column_count(&self) -> u16 {
        self.dimension().map_or(0, |d| d.col_count())
    }

    // === Merged regions ===

    /// Get all merged regions
    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merged
    }

    /// Merge a range of cells
    pub fn merge_cells(&mut self, range: CellRange) -> Result<()> {
        if let Some(existing) = self.merged.iter().find(|m| m.overlaps(&range)) {
            return Err(Error::MergedCellConflict(format!(
                "{} (conflicts with {})",
                range, existing
            )));
        }
        self.merged.push(range);
        Ok(())
    }

    // === Extent ===

    /// Smallest range covering every stored cell and merged region
    ///
    /// Empty cells count: a blank value still occupies its coordinate.
    pub fn dimension(&self) -> Option<CellRange> {
        let cells = self.rows.values().filter_map(|row| {
            let (first, last) = row.column_span()?;
            Some(CellRange::from_indices(row.index, first, row.index, last))
        });
        cells
            .chain(self.merged.iter().copied())
            .reduce(|acc, r| acc.union(&r))
    }

    /// Highest style index referenced by any cell or column
    pub fn max_style_index(&self) -> Option<u32> {
        let cells = self.iter_cells().map(|(_, _, cell)| cell.style);
        let columns = self.columns.values().filter_map(|c| c.style);
        cells.chain(columns).max()
    }
}
