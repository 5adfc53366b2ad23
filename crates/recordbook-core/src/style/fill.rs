//! Cell background fills

use super::Color;

/// Background of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillStyle {
    #[default]
    None,

    /// Single color background
    Solid { color: Color },

    /// Two-color pattern
    Pattern {
        pattern: PatternType,
        foreground: Color,
        background: Color,
    },
}

impl FillStyle {
    pub fn solid(color: Color) -> Self {
        FillStyle::Solid { color }
    }

    /// Normalize a pattern and its two colors into the narrowest variant
    ///
    /// `None` drops both colors and `Solid` keeps only the foreground.
    pub fn pattern(pattern: PatternType, foreground: Color, background: Color) -> Self {
        match pattern {
            PatternType::None => FillStyle::None,
            PatternType::Solid => FillStyle::Solid { color: foreground },
            pattern => FillStyle::Pattern {
                pattern,
                foreground,
                background,
            },
        }
    }

    /// Pattern this fill is drawn with
    pub fn pattern_type(&self) -> PatternType {
        match self {
            FillStyle::None => PatternType::None,
            FillStyle::Solid { .. } => PatternType::Solid,
            FillStyle::Pattern { pattern, .. } => *pattern,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, FillStyle::None)
    }
}

token_enum! {
    /// Fill patterns
    pub enum PatternType default None {
        None => "none",
        Solid => "solid",
        MediumGray => "mediumGray",
        DarkGray => "darkGray",
        LightGray => "lightGray",
        DarkHorizontal => "darkHorizontal",
        DarkVertical => "darkVertical",
        DarkDown => "darkDown",
        DarkUp => "darkUp",
        DarkGrid => "darkGrid",
        DarkTrellis => "darkTrellis",
        LightHorizontal => "lightHorizontal",
        LightVertical => "lightVertical",
        LightDown => "lightDown",
        LightUp => "lightUp",
        LightGrid => "lightGrid",
        LightTrellis => "lightTrellis",
        /// 12.5% gray; a styles part always reserves fill 1 for it
        Gray125 => "gray125",
        Gray0625 => "gray0625",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_normalizes() {
        assert_eq!(
            FillStyle::pattern(PatternType::None, Color::RED, Color::BLACK),
            FillStyle::None
        );
        assert_eq!(
            FillStyle::pattern(PatternType::Solid, Color::RED, Color::BLACK),
            FillStyle::solid(Color::RED)
        );
        let gray = FillStyle::pattern(PatternType::Gray125, Color::Auto, Color::Auto);
        assert_eq!(gray.pattern_type(), PatternType::Gray125);
        assert!(!gray.is_none());
    }
}
