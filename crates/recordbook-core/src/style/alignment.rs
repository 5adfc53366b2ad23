//! Text placement inside a cell

/// Alignment, wrapping and rotation of cell text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Alignment {
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
    pub wrap_text: bool,
    pub shrink_to_fit: bool,
    /// Indent level (0-250)
    pub indent: u8,
    /// Degrees, -90 (downward) to 90 (upward)
    pub rotation: i16,
}

impl Alignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rotation, clamped to -90..=90
    pub fn with_rotation(mut self, degrees: i16) -> Self {
        self.rotation = degrees.clamp(-90, 90);
        self
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

token_enum! {
    /// Horizontal placement
    pub enum HorizontalAlignment default General {
        /// Text left, numbers right
        General => "general",
        Left => "left",
        Center => "center",
        Right => "right",
        Fill => "fill",
        Justify => "justify",
        CenterContinuous => "centerContinuous",
        Distributed => "distributed",
    }
}

token_enum! {
    /// Vertical placement
    pub enum VerticalAlignment default Bottom {
        Top => "top",
        Center => "center",
        Bottom => "bottom",
        Justify => "justify",
        Distributed => "distributed",
    }
}
