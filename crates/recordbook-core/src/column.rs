//! Column settings

/// Per-column layout written to a sheet's `<cols>` list
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// 0-based index
    pub index: u16,
    /// Width in characters; `None` keeps the sheet default
    pub width: Option<f64>,
    pub hidden: bool,
    /// Style for cells of the column that are not stored
    pub style: Option<u32>,
}

impl Column {
    pub fn new(index: u16) -> Self {
        Self {
            index,
            width: None,
            hidden: false,
            style: None,
        }
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_style(mut self, style: u32) -> Self {
        self.style = Some(style);
        self
    }

    /// Whether the column needs a `<col>` entry at all
    pub fn has_custom_settings(&self) -> bool {
        self.width.is_some() || self.hidden || self.style.is_some()
    }
}
