//! Font settings

use super::Color;
use std::hash::{Hash, Hasher};

/// Font of a cell
#[derive(Debug, Clone)]
pub struct FontStyle {
    /// Family name
    pub name: String,
    /// Size in points
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: Underline,
    pub strikethrough: bool,
    pub color: Color,
}

impl FontStyle {
    /// Family used by new workbooks
    pub const DEFAULT_NAME: &'static str = "Calibri";
    /// Size used by new workbooks
    pub const DEFAULT_SIZE: f64 = 11.0;
    pub const MIN_SIZE: f64 = 1.0;
    pub const MAX_SIZE: f64 = 409.0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Bring a size into the range spreadsheet applications accept;
    /// NaN and infinite sizes fall back to the default
    pub fn clamp_size(size: f64) -> f64 {
        if size.is_finite() {
            size.clamp(Self::MIN_SIZE, Self::MAX_SIZE)
        } else {
            Self::DEFAULT_SIZE
        }
    }

    // -0.0 and 0.0 share one key
    fn size_key(&self) -> u64 {
        if self.size == 0.0 {
            0
        } else {
            self.size.to_bits()
        }
    }

    /// Whether any setting differs from the workbook default font
    pub fn is_custom(&self) -> bool {
        *self != Self::default()
    }
}

impl Default for FontStyle {
    fn default() -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            size: Self::DEFAULT_SIZE,
            bold: false,
            italic: false,
            underline: Underline::None,
            strikethrough: false,
            color: Color::Auto,
        }
    }
}

// Sizes compare and hash by bit pattern so equality stays reflexive
impl PartialEq for FontStyle {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.size_key() == other.size_key()
            && self.bold == other.bold
            && self.italic == other.italic
            && self.underline == other.underline
            && self.strikethrough == other.strikethrough
            && self.color == other.color
    }
}

impl Hash for FontStyle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.size_key().hash(state);
        (self.bold, self.italic, self.strikethrough).hash(state);
        self.underline.hash(state);
        self.color.hash(state);
    }
}

impl Eq for FontStyle {}

token_enum! {
    /// Underline kinds
    pub enum Underline default None {
        None => "none",
        Single => "single",
        Double => "double",
        SingleAccounting => "singleAccounting",
        DoubleAccounting => "doubleAccounting",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_font() {
        let font = FontStyle::new();
        assert_eq!(font.name, "Calibri");
        assert_eq!(font.size, 11.0);
        assert!(!font.is_custom());

        let bold = FontStyle {
            bold: true,
            ..FontStyle::default()
        };
        assert!(bold.is_custom());
    }

    #[test]
    fn test_size_equality_is_consistent() {
        let zero = FontStyle {
            size: 0.0,
            ..FontStyle::default()
        };
        let negative_zero = FontStyle {
            size: -0.0,
            ..FontStyle::default()
        };
        assert_eq!(zero, negative_zero);

        let nan = FontStyle {
            size: f64::NAN,
            ..FontStyle::default()
        };
        assert_eq!(nan, nan.clone());
        assert_ne!(nan, FontStyle::default());
    }

    #[test]
    fn test_clamp_size() {
        assert_eq!(FontStyle::clamp_size(14.0), 14.0);
        assert_eq!(FontStyle::clamp_size(-0.0), FontStyle::MIN_SIZE);
        assert_eq!(FontStyle::clamp_size(1000.0), FontStyle::MAX_SIZE);
        assert_eq!(FontStyle::clamp_size(f64::NAN), FontStyle::DEFAULT_SIZE);
        assert_eq!(FontStyle::clamp_size(f64::INFINITY), FontStyle::DEFAULT_SIZE);
    }
}
