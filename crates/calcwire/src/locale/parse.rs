use super::{NumberSymbols, detect_system_locale};
use crate::error::NumberParseError;

/// Spaces commonly typed or pasted as thousands separators.
const LOOSE_GROUP_SEPARATORS: [char; 4] = ['\u{00A0}', ' ', '\u{2009}', '\u{2005}'];

/// Parse locale-formatted text into a number. Returns NaN when the text
/// is not a number in that locale. `None` uses the system locale.
pub fn parse_locale_number(text: &str, locale: Option<&str>) -> f64 {
    try_parse_locale_number(text, locale).unwrap_or(f64::NAN)
}

/// Like [`parse_locale_number`], but absent input is NaN too.
pub fn parse_optional(text: Option<&str>, locale: Option<&str>) -> f64 {
    text.map_or(f64::NAN, |text| parse_locale_number(text, locale))
}

pub fn try_parse_locale_number(
    text: &str,
    locale: Option<&str>,
) -> Result<f64, NumberParseError> {
    let symbols = match locale {
        Some(locale) => NumberSymbols::for_locale(locale),
        None => NumberSymbols::for_locale(&detect_system_locale()),
    };
    parse_with_symbols(text, symbols)
}

pub(crate) fn parse_with_symbols(
    text: &str,
    symbols: NumberSymbols,
) -> Result<f64, NumberParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(NumberParseError::Empty);
    }
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, text.strip_prefix('+').unwrap_or(text)),
    };

    let mut cleaned: String = if symbols.group != symbols.decimal {
        body.chars()
            .filter(|c| *c != symbols.group && !LOOSE_GROUP_SEPARATORS.contains(c))
            .collect()
    } else {
        body.to_owned()
    };

    if cleaned.matches(symbols.decimal).count() > 1 {
        return Err(NumberParseError::RepeatedDecimalSeparator(symbols.decimal));
    }
    if symbols.decimal != '.' {
        cleaned = cleaned.replace(symbols.decimal, ".");
    }
    if !is_plain_decimal(&cleaned) {
        return Err(NumberParseError::Malformed(text.to_owned()));
    }
    cleaned
        .parse::<f64>()
        .map(|value| sign * value)
        .map_err(|_| NumberParseError::Malformed(text.to_owned()))
}

/// `digits [. digits] [e [+-] digits]` with at least one mantissa digit.
fn is_plain_decimal(text: &str) -> bool {
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(index) => (&text[..index], Some(&text[index + 1..])),
        None => (text, None),
    };
    let mantissa_ok = mantissa.chars().filter(|c| *c == '.').count() <= 1
        && mantissa.chars().all(|c| c.is_ascii_digit() || c == '.')
        && mantissa.chars().any(|c| c.is_ascii_digit());
    let exponent_ok = exponent.is_none_or(|exponent| {
        let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
        !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
    });
    mantissa_ok && exponent_ok
}
