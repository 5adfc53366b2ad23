//! Cell borders

use super::Color;

/// Border of a cell, one optional edge per side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BorderStyle {
    pub left: Option<BorderEdge>,
    pub right: Option<BorderEdge>,
    pub top: Option<BorderEdge>,
    pub bottom: Option<BorderEdge>,
}

impl BorderStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same edge on every side
    pub fn all(style: BorderLineStyle, color: Color) -> Self {
        let mut border = Self::default();
        for &side in BorderSide::ALL {
            *border.edge_mut(side) = Some(BorderEdge::new(style, color));
        }
        border
    }

    pub fn edge(&self, side: BorderSide) -> Option<BorderEdge> {
        match side {
            BorderSide::Left => self.left,
            BorderSide::Right => self.right,
            BorderSide::Top => self.top,
            BorderSide::Bottom => self.bottom,
        }
    }

    pub fn edge_mut(&mut self, side: BorderSide) -> &mut Option<BorderEdge> {
        match side {
            BorderSide::Left => &mut self.left,
            BorderSide::Right => &mut self.right,
            BorderSide::Top => &mut self.top,
            BorderSide::Bottom => &mut self.bottom,
        }
    }

    /// True when no side draws a line
    pub fn is_empty(&self) -> bool {
        BorderSide::ALL
            .iter()
            .filter_map(|&side| self.edge(side))
            .all(|e| e.style == BorderLineStyle::None)
    }
}

/// One drawn side of a border
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BorderEdge {
    pub style: BorderLineStyle,
    pub color: Color,
}

impl BorderEdge {
    pub fn new(style: BorderLineStyle, color: Color) -> Self {
        Self { style, color }
    }
}

token_enum! {
    /// Sides of a cell, in the order a styles part lists them
    pub enum BorderSide default Left {
        Left => "left",
        Right => "right",
        Top => "top",
        Bottom => "bottom",
    }
}

token_enum! {
    /// Line kinds of a border edge
    pub enum BorderLineStyle default None {
        None => "none",
        Thin => "thin",
        Medium => "medium",
        Thick => "thick",
        Dashed => "dashed",
        Dotted => "dotted",
        Double => "double",
        Hair => "hair",
        MediumDashed => "mediumDashed",
        DashDot => "dashDot",
        MediumDashDot => "mediumDashDot",
        DashDotDot => "dashDotDot",
        MediumDashDotDot => "mediumDashDotDot",
        SlantDashDot => "slantDashDot",
    }
}
