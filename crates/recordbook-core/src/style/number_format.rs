//! Number format types

/// Number format for cell display
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    /// General format (default)
    #[default]
    General,

    /// Built-in format by ID
    BuiltIn(u32),

    /// Custom format code
    Custom(String),
}

impl NumberFormat {
    /// 1 - 0
    pub const ID_NUMBER_INT: u32 = 1;
    /// 2 - 0.00
    pub const ID_NUMBER_DEC2: u32 = 2;
    /// 3 - #,##0
    pub const ID_NUMBER_SEP: u32 = 3;
    /// 4 - #,##0.00
    pub const ID_NUMBER_SEP_DEC2: u32 = 4;
    /// 9 - 0%
    pub const ID_PERCENT_INT: u32 = 9;
    /// 10 - 0.00%
    pub const ID_PERCENT_DEC2: u32 = 10;
    /// 14 - mm-dd-yy
    pub const ID_DATE_SHORT: u32 = 14;
    /// 20 - h:mm
    pub const ID_TIME_24H: u32 = 20;
    /// 21 - h:mm:ss
    pub const ID_TIME_24H_SEC: u32 = 21;
    /// 22 - m/d/yy h:mm
    pub const ID_DATETIME: u32 = 22;
    /// 49 - @
    pub const ID_TEXT: u32 = 49;

    /// First id available for custom format codes in a styles part
    pub const FIRST_CUSTOM_ID: u32 = 164;

    /// Custom format from a format code
    pub fn custom<S: Into<String>>(code: S) -> Self {
        NumberFormat::Custom(code.into())
    }

    /// Map a styles-part `numFmtId` (and its code, for custom ids) back to a format
    pub fn from_id(id: u32, code: Option<&str>) -> Self {
        match (id, code) {
            (0, _) => NumberFormat::General,
            (id, Some(code)) if id >= Self::FIRST_CUSTOM_ID => NumberFormat::custom(code),
            (id, _) => NumberFormat::BuiltIn(id),
        }
    }

    /// Check if this is the general format
    pub fn is_general(&self) -> bool {
        matches!(self, NumberFormat::General | NumberFormat::BuiltIn(0))
    }

    /// Get the format code
    pub fn format_string(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::BuiltIn(id) => builtin_format_string(*id),
            NumberFormat::Custom(s) => s,
        }
    }

    /// Check if the format renders a calendar date or a clock time
    pub fn is_date_format(&self) -> bool {
        match self {
            NumberFormat::General => false,
            NumberFormat::BuiltIn(id) => matches!(id, 14..=22 | 45..=47),
            NumberFormat::Custom(s) => {
                let tokens = date_tokens(s);
                tokens.iter().any(|c| matches!(c, 'y' | 'd' | 'h' | 's'))
                    || (tokens.contains(&'m') && !s.contains('0') && !s.contains('#'))
            }
        }
    }

    /// Check if the format shows a time of day without any date part
    pub fn is_time_only(&self) -> bool {
        match self {
            NumberFormat::BuiltIn(id) => matches!(id, 18..=21 | 45..=47),
            NumberFormat::Custom(s) => {
                let tokens = date_tokens(s);
                tokens.iter().any(|c| matches!(c, 'h' | 's'))
                    && !tokens.iter().any(|c| matches!(c, 'y' | 'd'))
            }
            NumberFormat::General => false,
        }
    }
}

/// Lowercased date/time placeholder letters outside quoted literals and
/// bracketed modifiers (`[Red]`, `[$-409]`), keeping elapsed-time brackets
fn date_tokens(code: &str) -> Vec<char> {
    let mut tokens = Vec::new();
    let mut chars = code.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                for c in chars.by_ref() {
                    if c == '"' {
                        break;
                    }
                }
            }
            '\\' => {
                chars.next();
            }
            '[' => {
                let inner: String = chars.by_ref().take_while(|&c| c != ']').collect();
                let lower = inner.to_ascii_lowercase();
                if lower.chars().all(|c| matches!(c, 'h' | 'm' | 's')) {
                    tokens.extend(lower.chars());
                }
            }
            c => {
                let lower = c.to_ascii_lowercase();
                if matches!(lower, 'y' | 'm' | 'd' | 'h' | 's') {
                    tokens.push(lower);
                }
            }
        }
    }
    tokens
}

fn builtin_format_string(id: u32) -> &'static str {
    match id {
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        49 => "@",
        _ => "General",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_date_formats() {
        assert!(NumberFormat::BuiltIn(14).is_date_format());
        assert!(NumberFormat::BuiltIn(22).is_date_format());
        assert!(!NumberFormat::BuiltIn(4).is_date_format());
        assert!(!NumberFormat::General.is_date_format());

        assert!(NumberFormat::BuiltIn(21).is_time_only());
        assert!(!NumberFormat::BuiltIn(22).is_time_only());
    }

    #[test]
    fn test_custom_date_formats() {
        assert!(NumberFormat::custom("yyyy-mm-dd").is_date_format());
        assert!(NumberFormat::custom("[$-409]d-mmm-yyyy;@").is_date_format());
        assert!(NumberFormat::custom("[h]:mm").is_time_only());
        assert!(!NumberFormat::custom("0.00\"days\"").is_date_format());
        assert!(!NumberFormat::custom("[Red]#,##0").is_date_format());
        assert!(!NumberFormat::custom("#,##0.00 \\m").is_date_format());
    }

    #[test]
    fn test_from_id() {
        assert_eq!(NumberFormat::from_id(0, None), NumberFormat::General);
        assert_eq!(NumberFormat::from_id(14, None), NumberFormat::BuiltIn(14));
        assert_eq!(
            NumberFormat::from_id(164, Some("0.000")),
            NumberFormat::custom("0.000")
        );
        assert_eq!(NumberFormat::BuiltIn(14).format_string(), "mm-dd-yy");
    }
}
