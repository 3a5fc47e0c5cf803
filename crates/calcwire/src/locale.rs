//! Locale handling: separator tables, locale-aware number parsing and
//! formatting, and resolution of the effective locale for an element.

mod format;
mod parse;
mod resolver;
mod symbols;

pub use format::{format_fixed, format_locale_number, format_with_symbols};
pub use parse::{parse_locale_number, parse_optional, try_parse_locale_number};
pub(crate) use parse::parse_with_symbols;
pub use resolver::LocaleResolver;
pub use symbols::NumberSymbols;

/// Locale used when neither configuration nor environment names one.
pub const FALLBACK_LOCALE: &str = "en-US";

/// Detect the process locale from `LC_ALL`, then `LANG`.
pub fn detect_system_locale() -> String {
    detect_system_locale_from(
        std::env::var("LC_ALL").ok().as_deref(),
        std::env::var("LANG").ok().as_deref(),
    )
}

pub fn detect_system_locale_from(lc_all: Option<&str>, lang: Option<&str>) -> String {
    [lc_all, lang]
        .into_iter()
        .flatten()
        .find_map(normalize_locale)
        .unwrap_or_else(|| FALLBACK_LOCALE.to_owned())
}

/// Turn a POSIX-style locale (`de_DE.UTF-8@euro`) into a BCP-47-ish tag (`de-DE`).
pub fn normalize_locale(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let raw = raw.split('@').next().unwrap_or(raw);
    let raw = raw.split('.').next().unwrap_or(raw);
    if raw.is_empty() {
        return None;
    }
    if raw.eq_ignore_ascii_case("c") || raw.eq_ignore_ascii_case("posix") {
        return Some("en".to_owned());
    }
    Some(raw.replace('_', "-"))
}

/// Lowercased primary language subtag: `pt-BR` -> `pt`.
pub(crate) fn primary_language(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or(locale)
        .to_ascii_lowercase()
}

/// Uppercased region subtag, skipping a script subtag: `zh-Hant-TW` -> `TW`.
pub(crate) fn region(locale: &str) -> Option<String> {
    locale
        .split(['-', '_'])
        .skip(1)
        .find(|subtag| {
            (subtag.len() == 2 && subtag.chars().all(|c| c.is_ascii_alphabetic()))
                || (subtag.len() == 3 && subtag.chars().all(|c| c.is_ascii_digit()))
        })
        .map(str::to_ascii_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_encoding_and_modifier() {
        assert_eq!(normalize_locale("de_DE.UTF-8@euro").as_deref(), Some("de-DE"));
        assert_eq!(normalize_locale("fr_CA").as_deref(), Some("fr-CA"));
        assert_eq!(normalize_locale("C").as_deref(), Some("en"));
        assert_eq!(normalize_locale("POSIX").as_deref(), Some("en"));
        assert_eq!(normalize_locale("  "), None);
    }

    #[test]
    fn detect_prefers_lc_all() {
        assert_eq!(detect_system_locale_from(Some("nl_NL.UTF-8"), Some("en_US")), "nl-NL");
        assert_eq!(detect_system_locale_from(None, Some("pl_PL")), "pl-PL");
        assert_eq!(detect_system_locale_from(Some(""), None), FALLBACK_LOCALE);
        assert_eq!(detect_system_locale_from(None, None), FALLBACK_LOCALE);
    }

    #[test]
    fn subtags() {
        assert_eq!(primary_language("pt-BR"), "pt");
        assert_eq!(primary_language("DE"), "de");
        assert_eq!(region("pt-BR").as_deref(), Some("BR"));
        assert_eq!(region("zh-Hant-TW").as_deref(), Some("TW"));
        assert_eq!(region("es-419").as_deref(), Some("419"));
        assert_eq!(region("fr"), None);
    }
}
