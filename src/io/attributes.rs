//! Test bar attribute values and their formatting

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Attributes of a test bar, sorted by name
pub type Attributes = BTreeMap<String, AttrValue>;

/// A scalar attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl AttrValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(i) => Some(*i as f64),
            AttrValue::Float(f) => Some(*f),
            AttrValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Equality where integers and floats compare by numeric value
    pub fn matches(&self, other: &AttrValue) -> bool {
        match (self, other) {
            (AttrValue::Text(a), AttrValue::Text(b)) => a == b,
            (AttrValue::Int(a), AttrValue::Int(b)) => a == b,
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }

    /// Format according to a format spec such as `6.3f`
    pub fn format(&self, spec: &FormatSpec) -> Result<String, FormatSpecError> {
        spec.apply(self)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(i) => write!(f, "{}", i),
            // Keep a decimal point on whole floats so they read as floats
            AttrValue::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 => {
                write!(f, "{:.1}", x)
            }
            AttrValue::Float(x) => write!(f, "{}", x),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

/// Parses integers, then floats, and falls back to text
impl FromStr for AttrValue {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(i) = s.parse::<i64>() {
            return Ok(AttrValue::Int(i));
        }
        if let Ok(x) = s.parse::<f64>() {
            return Ok(AttrValue::Float(x));
        }
        Ok(AttrValue::Text(s.to_string()))
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum FormatSpecError {
    #[error("Invalid format spec '{0}'")]
    #[diagnostic(
        code(cyclic::format::invalid_spec),
        help("Use e.g. 's', 'd', '6.3f', '05.1f' or '10.4e'")
    )]
    Invalid(String),

    #[error("Format spec '{spec}' can not be applied to value '{value}'")]
    #[diagnostic(code(cyclic::format::type_mismatch))]
    TypeMismatch { spec: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
    /// Plain string conversion
    Str,
    Fixed,
    Exponent,
    Integer,
}

/// A subset of Python's format specification mini-language:
/// `[align][0][width][.precision][type]` with align one of `<`, `>`, `^` and type one of
/// `s`, `f`, `e`, `d`. An empty type uses the plain string conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    raw: String,
    align: Option<Align>,
    zero_pad: bool,
    width: usize,
    precision: Option<usize>,
    kind: FormatType,
}

impl FromStr for FormatSpec {
    type Err = FormatSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FormatSpecError::Invalid(s.to_string());
        let mut rest = s;

        let align = match rest.chars().next() {
            Some('<') => Some(Align::Left),
            Some('>') => Some(Align::Right),
            Some('^') => Some(Align::Center),
            _ => None,
        };
        if align.is_some() {
            rest = &rest[1..];
        }

        let zero_pad = rest.starts_with('0');
        if zero_pad {
            rest = &rest[1..];
        }

        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        let width = if digits > 0 {
            rest[..digits].parse().map_err(|_| invalid())?
        } else {
            0
        };
        rest = &rest[digits..];

        let precision = if let Some(after) = rest.strip_prefix('.') {
            let digits = after.chars().take_while(|c| c.is_ascii_digit()).count();
            if digits == 0 {
                return Err(invalid());
            }
            let p = after[..digits].parse().map_err(|_| invalid())?;
            rest = &after[digits..];
            Some(p)
        } else {
            None
        };

        let kind = match rest {
            "" | "s" => FormatType::Str,
            "f" | "F" => FormatType::Fixed,
            "e" | "E" => FormatType::Exponent,
            "d" => FormatType::Integer,
            _ => return Err(invalid()),
        };

        Ok(FormatSpec {
            raw: s.to_string(),
            align,
            zero_pad,
            width,
            precision,
            kind,
        })
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FormatSpec {
    pub fn apply(&self, value: &AttrValue) -> Result<String, FormatSpecError> {
        let mismatch = || FormatSpecError::TypeMismatch {
            spec: self.raw.clone(),
            value: value.to_string(),
        };

        let (body, numeric) = match (self.kind, value) {
            (FormatType::Str, AttrValue::Text(s)) => {
                let s = match self.precision {
                    Some(p) => s.chars().take(p).collect(),
                    None => s.clone(),
                };
                (s, false)
            }
            (FormatType::Str, v) => (v.to_string(), true),
            (FormatType::Fixed, v) => {
                let x = v.as_f64().ok_or_else(mismatch)?;
                (format!("{:.*}", self.precision.unwrap_or(6), x), true)
            }
            (FormatType::Exponent, v) => {
                let x = v.as_f64().ok_or_else(mismatch)?;
                (format_exponent(x, self.precision.unwrap_or(6)), true)
            }
            (FormatType::Integer, AttrValue::Int(i)) => (i.to_string(), true),
            (FormatType::Integer, AttrValue::Float(x)) if x.fract() == 0.0 && x.is_finite() => {
                (format!("{:.0}", x), true)
            }
            (FormatType::Integer, _) => return Err(mismatch()),
        };

        Ok(self.pad(body, numeric))
    }

    fn pad(&self, body: String, numeric: bool) -> String {
        let len = body.chars().count();
        if len >= self.width {
            return body;
        }
        let fill = self.width - len;

        if self.zero_pad && numeric && self.align.is_none() {
            let (sign, digits) = match body.strip_prefix('-') {
                Some(d) => ("-", d),
                None => ("", body.as_str()),
            };
            return format!("{}{}{}", sign, "0".repeat(fill), digits);
        }

        let pad_char = if self.zero_pad { "0" } else { " " };
        let align = self
            .align
            .unwrap_or(if numeric { Align::Right } else { Align::Left });
        match align {
            Align::Left => format!("{}{}", body, pad_char.repeat(fill)),
            Align::Right => format!("{}{}", pad_char.repeat(fill), body),
            Align::Center => {
                let left = fill / 2;
                format!(
                    "{}{}{}",
                    pad_char.repeat(left),
                    body,
                    pad_char.repeat(fill - left)
                )
            }
        }
    }
}

/// Scientific notation with a signed, at least two digit exponent (`1.2340e+03`)
fn format_exponent(x: f64, precision: usize) -> String {
    let s = format!("{:.*e}", precision, x);
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        // inf and NaN have no exponent
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(spec: &str, value: impl Into<AttrValue>) -> String {
        value.into().format(&spec.parse().unwrap()).unwrap()
    }

    #[test]
    fn test_parse_value() {
        assert_eq!("12".parse::<AttrValue>().unwrap(), AttrValue::Int(12));
        assert_eq!("12.5".parse::<AttrValue>().unwrap(), AttrValue::Float(12.5));
        assert_eq!("1e3".parse::<AttrValue>().unwrap(), AttrValue::Float(1000.0));
        assert_eq!(
            "ratcheting".parse::<AttrValue>().unwrap(),
            AttrValue::Text("ratcheting".to_string())
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(AttrValue::Int(3).to_string(), "3");
        assert_eq!(AttrValue::Float(12.0).to_string(), "12.0");
        assert_eq!(AttrValue::Float(0.25).to_string(), "0.25");
        assert_eq!(AttrValue::from("prop").to_string(), "prop");
    }

    #[test]
    fn test_matches_is_numeric() {
        assert!(AttrValue::Int(12).matches(&AttrValue::Float(12.0)));
        assert!(AttrValue::Float(12.0).matches(&AttrValue::Int(12)));
        assert!(!AttrValue::Int(12).matches(&AttrValue::Float(12.5)));
        assert!(!AttrValue::from("12").matches(&AttrValue::Int(12)));
        assert!(AttrValue::from("a").matches(&AttrValue::from("a")));
    }

    #[test]
    fn test_format_fixed() {
        assert_eq!(fmt("6.3f", 3.14159), " 3.142");
        assert_eq!(fmt("05.1f", 2.3), "002.3");
        assert_eq!(fmt("05.1f", -2.0), "-02.0");
        assert_eq!(fmt("5.2f", 12i64), "12.00");
        assert_eq!(fmt("f", 1.5), "1.500000");
    }

    #[test]
    fn test_format_exponent() {
        assert_eq!(fmt("10.4e", 1234.0), "1.2340e+03");
        assert_eq!(fmt("12.2e", 0.000123), "    1.23e-04");
        assert_eq!(fmt(".1e", 5.0e120), "5.0e+120");
    }

    #[test]
    fn test_format_string_and_int() {
        assert_eq!(fmt("s", "T01"), "T01");
        assert_eq!(fmt("6s", "T01"), "T01   ");
        assert_eq!(fmt(">6s", "T01"), "   T01");
        assert_eq!(fmt("", 1.0), "1.0");
        assert_eq!(fmt("d", 7i64), "7");
        assert_eq!(fmt("03d", 7i64), "007");
    }

    #[test]
    fn test_format_errors() {
        assert!("x".parse::<FormatSpec>().is_err());
        assert!("5.f".parse::<FormatSpec>().is_err());
        let spec: FormatSpec = "5.2f".parse().unwrap();
        assert!(matches!(
            AttrValue::from("abc").format(&spec),
            Err(FormatSpecError::TypeMismatch { .. })
        ));
        let spec: FormatSpec = "d".parse().unwrap();
        assert!(AttrValue::Float(1.5).format(&spec).is_err());
    }
}
