use super::NumberSymbols;

/// Fraction digits shown when no precision is requested.
const DEFAULT_MAX_FRACTION_DIGITS: usize = 3;

/// Format a number the way `toLocaleString` does. `Some(digits)` pins the
/// fraction to exactly that many digits; `None` shows up to three, trimmed.
pub fn format_locale_number(value: f64, locale: &str, fraction_digits: Option<usize>) -> String {
    format_with_symbols(value, NumberSymbols::for_locale(locale), fraction_digits)
}

pub fn format_with_symbols(
    value: f64,
    symbols: NumberSymbols,
    fraction_digits: Option<usize>,
) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    let sign = if value.is_sign_negative() { "-" } else { "" };
    if value.is_infinite() {
        return format!("{sign}\u{221E}");
    }

    let mut fixed = round_half_away(value.abs(), fraction_digits.unwrap_or(DEFAULT_MAX_FRACTION_DIGITS));
    if fraction_digits.is_none() && fixed.contains('.') {
        let trimmed = fixed.trim_end_matches('0').trim_end_matches('.').len();
        fixed.truncate(trimmed);
    }

    let (integer, fraction) = match fixed.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (fixed.as_str(), None),
    };
    let mut formatted = String::with_capacity(fixed.len() + integer.len() / 3 + 1);
    formatted.push_str(sign);
    push_grouped(&mut formatted, integer, symbols);
    if let Some(fraction) = fraction {
        formatted.push(symbols.decimal);
        formatted.push_str(fraction);
    }
    formatted
}

/// Locale-neutral fixed-point text, like ECMAScript `Number.prototype.toFixed`.
pub fn format_fixed(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{}", round_half_away(value.abs(), digits))
}

fn push_grouped(output: &mut String, integer: &str, symbols: NumberSymbols) {
    let length = integer.len();
    if length < 3 + usize::from(symbols.min_grouping_digits) {
        output.push_str(integer);
        return;
    }
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (length - index) % 3 == 0 {
            output.push(symbols.group);
        }
        output.push(digit);
    }
}

/// Round a non-negative magnitude to `digits` fraction digits, ties away from zero.
fn round_half_away(magnitude: f64, digits: usize) -> String {
    // Enough extra digits that the first dropped digit is exact for any f64.
    let expanded = format!("{:.*}", digits + 32, magnitude);
    let Some(point) = expanded.find('.') else {
        return expanded;
    };
    let cut = point + 1 + digits;
    let round_up = expanded.as_bytes().get(cut).is_some_and(|digit| *digit >= b'5');

    let mut kept: Vec<char> = expanded[..cut].chars().collect();
    let mut carry = round_up;
    let mut index = kept.len();
    while carry && index > 0 {
        index -= 1;
        match kept[index] {
            '.' => {}
            '9' => kept[index] = '0',
            digit => {
                kept[index] = char::from(digit as u8 + 1);
                carry = false;
            }
        }
    }
    if carry {
        kept.insert(0, '1');
    }
    if kept.last() == Some(&'.') {
        kept.pop();
    }
    kept.into_iter().collect()
}
