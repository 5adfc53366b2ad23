//! Cell styling types
//!
//! - [`Style`] - Complete formatting record for a cell
//! - [`FontStyle`], [`FillStyle`], [`BorderStyle`], [`Alignment`] - its parts
//! - [`StyleTable`] - Workbook-wide dedup registry of styles
//!
//! Enumerated settings carry the token SpreadsheetML uses for them
//! (`token()` / `from_token()`).

/// Declares a fieldless style enum together with its SpreadsheetML tokens
macro_rules! token_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident default $default:ident {
            $($(#[$vmeta:meta])* $variant:ident => $token:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Token used for this value in a styles part
            pub fn token(self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }

            /// Parse a styles-part token (case-sensitive)
            pub fn from_token(token: &str) -> Option<Self> {
                match token {
                    $($token => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

mod alignment;
mod border;
mod color;
mod fill;
mod font;
mod number_format;
mod table;

pub use alignment::{Alignment, HorizontalAlignment, VerticalAlignment};
pub use border::{BorderEdge, BorderLineStyle, BorderSide, BorderStyle};
pub use color::Color;
pub use fill::{FillStyle, PatternType};
pub use font::{FontStyle, Underline};
pub use number_format::NumberFormat;
pub use table::StyleTable;

/// Complete cell style
///
/// Styles are plain values. Cells never own one directly; they refer to a
/// slot of the workbook's [`StyleTable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub font: FontStyle,
    pub fill: FillStyle,
    pub border: BorderStyle,
    pub alignment: Alignment,
    pub number_format: NumberFormat,
}

impl Style {
    /// Create a new default style
    pub fn new() -> Self {
        Self::default()
    }

    /// Set font to bold
    pub fn bold(mut self, bold: bool) -> Self {
        self.font.bold = bold;
        self
    }

    /// Set font to italic
    pub fn italic(mut self, italic: bool) -> Self {
        self.font.italic = italic;
        self
    }

    /// Set font size in points, clamped to 1..=409
    pub fn font_size(mut self, size: f64) -> Self {
        self.font.size = FontStyle::clamp_size(size);
        self
    }

    /// Set font name
    pub fn font_name<S: Into<String>>(mut self, name: S) -> Self {
        self.font.name = name.into();
        self
    }

    /// Set font color
    pub fn font_color(mut self, color: Color) -> Self {
        self.font.color = color;
        self
    }

    /// Set a solid background color
    pub fn fill_color(mut self, color: Color) -> Self {
        self.fill = FillStyle::Solid { color };
        self
    }

    /// Set the number format
    pub fn number_format(mut self, format: NumberFormat) -> Self {
        self.number_format = format;
        self
    }

    /// Set horizontal alignment
    pub fn horizontal_alignment(mut self, align: HorizontalAlignment) -> Self {
        self.alignment.horizontal = align;
        self
    }

    /// Set vertical alignment
    pub fn vertical_alignment(mut self, align: VerticalAlignment) -> Self {
        self.alignment.vertical = align;
        self
    }

    /// Enable text wrapping
    pub fn wrap_text(mut self, wrap: bool) -> Self {
        self.alignment.wrap_text = wrap;
        self
    }

    /// Draw the same edge on every side
    pub fn border_all(mut self, style: BorderLineStyle, color: Color) -> Self {
        self.border = BorderStyle::all(style, color);
        self
    }

    /// Get a mutable reference to font settings
    pub fn font_mut(&mut self) -> &mut FontStyle {
        &mut self.font
    }

    /// Get a mutable reference to fill settings
    pub fn fill_mut(&mut self) -> &mut FillStyle {
        &mut self.fill
    }

    /// Get a mutable reference to border settings
    pub fn border_mut(&mut self) -> &mut BorderStyle {
        &mut self.border
    }

    /// Get a mutable reference to alignment settings
    pub fn alignment_mut(&mut self) -> &mut Alignment {
        &mut self.alignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_round_trip() {
        for &p in PatternType::ALL {
            assert_eq!(PatternType::from_token(p.token()), Some(p));
        }
        for &b in BorderLineStyle::ALL {
            assert_eq!(BorderLineStyle::from_token(b.token()), Some(b));
        }
        for &u in Underline::ALL {
            assert_eq!(Underline::from_token(u.token()), Some(u));
        }
        assert_eq!(
            HorizontalAlignment::from_token("centerContinuous"),
            Some(HorizontalAlignment::CenterContinuous)
        );
        assert_eq!(VerticalAlignment::default(), VerticalAlignment::Bottom);
        assert_eq!(PatternType::from_token("Solid"), None);
    }

    #[test]
    fn test_builders_compose() {
        let style = Style::new()
            .bold(true)
            .font_size(14.0)
            .horizontal_alignment(HorizontalAlignment::Center)
            .border_all(BorderLineStyle::Thin, Color::BLACK);
        assert!(style.font.bold);
        assert_eq!(style.font.size, 14.0);
        assert_eq!(style.alignment.horizontal, HorizontalAlignment::Center);
        assert!(!style.border.is_empty());
        assert_ne!(style, Style::default());
    }
}
