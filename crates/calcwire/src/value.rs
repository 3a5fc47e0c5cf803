//! Formula values and their ECMAScript-style coercions.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Text(String),
    /// Several sources sharing one identifier.
    List(Vec<f64>),
}

impl Value {
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Number(number) => *number,
            Self::Bool(true) => 1.0,
            Self::Bool(false) => 0.0,
            Self::Text(text) => text_to_number(text),
            Self::List(items) => match items.as_slice() {
                [] => 0.0,
                [single] => *single,
                _ => f64::NAN,
            },
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Number(number) => *number != 0.0 && !number.is_nan(),
            Self::Bool(value) => *value,
            Self::Text(text) => !text.is_empty(),
            Self::List(_) => true,
        }
    }

    /// Whether the value is not a number once coerced, like `isNaN`.
    pub fn is_nan(&self) -> bool {
        self.to_number().is_nan()
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Number(number) => f.write_str(&number_to_string(*number)),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
            Self::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str(&number_to_string(*item))?;
                }
                Ok(())
            }
        }
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Self::Number(number)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

/// `Number(text)`: blank is zero, anything but a full numeric literal is NaN.
pub fn text_to_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = text.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).map_or(f64::NAN, |value| value as f64);
        }
    }
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    if unsigned == "Infinity" {
        return if text.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY };
    }
    // Rust also accepts "inf" and "nan", which are not numeric literals here.
    if !unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return f64::NAN;
    }
    text.parse().unwrap_or(f64::NAN)
}

/// Shortest round-trip rendering with `Number.prototype.toString` layout.
pub fn number_to_string(number: f64) -> String {
    if number.is_nan() {
        return "NaN".to_owned();
    }
    if number == 0.0 {
        return "0".to_owned();
    }
    if number.is_infinite() {
        return if number > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    let sign = if number < 0.0 { "-" } else { "" };

    let scientific = format!("{:e}", number.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return format!("{number}");
    };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let Ok(exponent) = exponent.parse::<i32>() else {
        return format!("{number}");
    };
    let length = digits.len() as i32;
    let point = exponent + 1;

    let body = if length <= point && point <= 21 {
        format!("{digits}{}", "0".repeat((point - length) as usize))
    } else if 0 < point && point <= 21 {
        let (integer, fraction) = digits.split_at(point as usize);
        format!("{integer}.{fraction}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat((-point) as usize))
    } else {
        let exponent_sign = if point - 1 >= 0 { "+" } else { "-" };
        let (first, rest) = digits.split_at(1);
        let fraction = if rest.is_empty() {
            String::new()
        } else {
            format!(".{rest}")
        };
        format!("{first}{fraction}e{exponent_sign}{}", (point - 1).abs())
    };
    format!("{sign}{body}")
}

/// Operators over values, following ECMAScript coercion rules.
pub mod ops {
    use super::*;

    enum Primitive<'a> {
        Number(f64),
        Bool(bool),
        Text(std::borrow::Cow<'a, str>),
    }

    fn to_primitive(value: &Value) -> Primitive<'_> {
        match value {
            Value::Number(number) => Primitive::Number(*number),
            Value::Bool(value) => Primitive::Bool(*value),
            Value::Text(text) => Primitive::Text(text.as_str().into()),
            Value::List(_) => Primitive::Text(value.to_string().into()),
        }
    }

    fn primitive_number(primitive: &Primitive) -> f64 {
        match primitive {
            Primitive::Number(number) => *number,
            Primitive::Bool(value) => f64::from(u8::from(*value)),
            Primitive::Text(text) => text_to_number(text),
        }
    }

    pub fn add(a: &Value, b: &Value) -> Value {
        let concatenates = |value: &Value| matches!(value, Value::Text(_) | Value::List(_));
        if concatenates(a) || concatenates(b) {
            Value::Text(format!("{a}{b}"))
        } else {
            Value::Number(a.to_number() + b.to_number())
        }
    }

    pub fn subtract(a: &Value, b: &Value) -> Value {
        Value::Number(a.to_number() - b.to_number())
    }

    pub fn multiply(a: &Value, b: &Value) -> Value {
        Value::Number(a.to_number() * b.to_number())
    }

    pub fn divide(a: &Value, b: &Value) -> Value {
        Value::Number(a.to_number() / b.to_number())
    }

    pub fn remainder(a: &Value, b: &Value) -> Value {
        Value::Number(a.to_number() % b.to_number())
    }

    pub fn power(a: &Value, b: &Value) -> Value {
        let (base, exponent) = (a.to_number(), b.to_number());
        if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
            return Value::Number(f64::NAN);
        }
        Value::Number(base.powf(exponent))
    }

    pub fn negate(value: &Value) -> Value {
        Value::Number(-value.to_number())
    }

    pub fn not(value: &Value) -> Value {
        Value::Bool(!value.is_truthy())
    }

    /// `<` on primitives: text compares lexically, anything else numerically.
    /// `None` when a NaN makes the comparison undefined.
    fn less_than(a: &Value, b: &Value) -> Option<bool> {
        match (to_primitive(a), to_primitive(b)) {
            (Primitive::Text(a), Primitive::Text(b)) => Some(a < b),
            (a, b) => {
                let (a, b) = (primitive_number(&a), primitive_number(&b));
                if a.is_nan() || b.is_nan() { None } else { Some(a < b) }
            }
        }
    }

    pub fn less(a: &Value, b: &Value) -> Value {
        Value::Bool(less_than(a, b) == Some(true))
    }

    pub fn greater(a: &Value, b: &Value) -> Value {
        Value::Bool(less_than(b, a) == Some(true))
    }

    pub fn less_or_equal(a: &Value, b: &Value) -> Value {
        Value::Bool(less_than(b, a) == Some(false))
    }

    pub fn greater_or_equal(a: &Value, b: &Value) -> Value {
        Value::Bool(less_than(a, b) == Some(false))
    }

    pub fn loose_equal(a: &Value, b: &Value) -> bool {
        match (a, b) {
            // Distinct lists are distinct objects.
            (Value::List(_), Value::List(_)) => false,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => match (to_primitive(a), to_primitive(b)) {
                (Primitive::Text(a), Primitive::Text(b)) => a == b,
                (a, b) => primitive_number(&a) == primitive_number(&b),
            },
        }
    }

    pub fn strict_equal(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => false,
        }
    }
}
