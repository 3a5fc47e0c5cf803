use super::{primary_language, region};

const NARROW_NO_BREAK_SPACE: char = '\u{202F}';
const NO_BREAK_SPACE: char = '\u{00A0}';
const RIGHT_SINGLE_QUOTE: char = '\u{2019}';

/// Grouping and decimal symbols of a locale, as `Intl.NumberFormat` renders them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberSymbols {
    pub group: char,
    pub decimal: char,
    /// Integer digits required before grouping kicks in is `3 + min_grouping_digits`.
    pub min_grouping_digits: u8,
}

impl NumberSymbols {
    pub const ENGLISH: Self = Self::new(',', '.', 1);

    const fn new(group: char, decimal: char, min_grouping_digits: u8) -> Self {
        Self {
            group,
            decimal,
            min_grouping_digits,
        }
    }

    /// Symbols for a locale tag. Unknown languages fall back to English.
    pub fn for_locale(locale: &str) -> Self {
        let language = primary_language(locale);
        let region = region(locale);
        if let Some(symbols) = region
            .as_deref()
            .and_then(|region| Self::for_region(&language, region))
        {
            return symbols;
        }
        Self::for_language(&language)
    }

    fn for_region(language: &str, region: &str) -> Option<Self> {
        Some(match (language, region) {
            ("de", "CH" | "LI") | ("it", "CH") => Self::new(RIGHT_SINGLE_QUOTE, '.', 1),
            ("de", "AT") => Self::new(NO_BREAK_SPACE, ',', 1),
            ("fr", "CA") => Self::new(NO_BREAK_SPACE, ',', 1),
            ("fr", "CH") => Self::new(NARROW_NO_BREAK_SPACE, ',', 1),
            ("pt", "PT") => Self::new(NO_BREAK_SPACE, ',', 2),
            ("es", "MX" | "US" | "419") => Self::new(',', '.', 1),
            ("en", "ZA") => Self::new(NO_BREAK_SPACE, ',', 1),
            _ => return None,
        })
    }

    fn for_language(language: &str) -> Self {
        match language {
            "de" | "nl" | "it" | "id" | "tr" | "da" | "el" | "ro" | "hr" | "sl" | "sr"
            | "vi" | "ca" | "pt" => Self::new('.', ',', 1),
            "es" => Self::new('.', ',', 2),
            "fr" => Self::new(NARROW_NO_BREAK_SPACE, ',', 1),
            "ru" | "uk" | "cs" | "sk" | "fi" | "sv" | "nb" | "no" | "hu" | "bg" | "lt"
            | "lv" | "et" => Self::new(NO_BREAK_SPACE, ',', 1),
            "pl" => Self::new(NO_BREAK_SPACE, ',', 2),
            _ => Self::ENGLISH,
        }
    }
}

impl Default for NumberSymbols {
    fn default() -> Self {
        Self::ENGLISH
    }
}
