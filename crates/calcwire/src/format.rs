//! Turns an evaluation result into the text written back to the document.

use crate::document::ElementKind;
use crate::locale::{format_fixed, format_locale_number};
use crate::value::{Value, number_to_string};

/// Largest fraction-digit count accepted from a precision attribute.
pub const MAX_PRECISION: usize = 100;

/// Read a precision attribute like `parseInt`: leading digits count, the rest is ignored.
pub fn parse_precision(attribute: Option<&str>) -> Option<usize> {
    let attribute = attribute?.trim();
    let digits = attribute
        .find(|c: char| !c.is_ascii_digit())
        .map_or(attribute, |end| &attribute[..end]);
    digits.parse::<usize>().ok().map(|precision| precision.min(MAX_PRECISION))
}

/// Edit fields get locale-neutral text; display nodes get the locale's
/// grouping and decimal symbols. Non-numeric values are written as text.
pub fn format_result(value: &Value, kind: ElementKind, precision: Option<usize>, locale: &str) -> String {
    let Value::Number(number) = value else {
        return value.to_string();
    };
    if kind.is_edit_field() {
        match precision {
            Some(precision) => format_fixed(*number, precision),
            None => number_to_string(*number),
        }
    } else {
        format_locale_number(*number, locale, precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_attribute() {
        assert_eq!(parse_precision(Some("2")), Some(2));
        assert_eq!(parse_precision(Some(" 3 ")), Some(3));
        assert_eq!(parse_precision(Some("2px")), Some(2));
        assert_eq!(parse_precision(Some("0")), Some(0));
        assert_eq!(parse_precision(Some("500")), Some(MAX_PRECISION));
        assert_eq!(parse_precision(Some("")), None);
        assert_eq!(parse_precision(Some("two")), None);
        assert_eq!(parse_precision(None), None);
    }

    #[test]
    fn display_nodes_are_localized() {
        let value = Value::Number(1234.56);
        assert_eq!(format_result(&value, ElementKind::Display, Some(2), "nl-NL"), "1.234,56");
        assert_eq!(format_result(&Value::Number(1500000.0), ElementKind::Display, None, "en-US"), "1,500,000");
    }

    #[test]
    fn edit_fields_are_neutral() {
        assert_eq!(format_result(&Value::Number(1543.2), ElementKind::NumberInput, Some(2), "nl-NL"), "1543.20");
        assert_eq!(format_result(&Value::Number(1500000.0), ElementKind::NumberInput, None, "en-US"), "1500000");
        assert_eq!(format_result(&Value::Number(2470.0), ElementKind::TextInput, Some(0), "de-DE"), "2470");
        assert_eq!(format_result(&Value::Number(0.5), ElementKind::TextArea, None, "de-DE"), "0.5");
    }

    #[test]
    fn non_numbers_are_written_verbatim() {
        assert_eq!(format_result(&Value::Text("Active".into()), ElementKind::Display, Some(2), "en-US"), "Active");
        assert_eq!(format_result(&Value::Bool(true), ElementKind::NumberInput, None, "en-US"), "true");
        assert_eq!(format_result(&Value::Number(f64::NAN), ElementKind::Display, None, "en-US"), "NaN");
    }
}
