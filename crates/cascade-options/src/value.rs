//! Option kinds and the tagged values they produce.
//!
//! Every option has an [`OptionKind`] that decides how a raw string is
//! converted into an [`OptionValue`]. Typed access goes through
//! [`FromValue`], implemented for the Rust types each kind maps onto.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::duration::parse_duration;

/// How raw strings are converted for an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Boolean,
    Integer,
    Float,
    Path,
    Uri,
    Duration,
    /// One of a fixed list of constants, matched case-insensitively.
    Enum(Vec<String>),
}

impl OptionKind {
    /// Parse a raw string according to this kind.
    ///
    /// The error is a reason only; callers attach the option name and raw
    /// value.
    pub fn parse(&self, raw: &str) -> Result<OptionValue, String> {
        match self {
            OptionKind::String => Ok(OptionValue::String(raw.to_string())),
            OptionKind::Boolean => parse_boolean(raw).map(OptionValue::Boolean),
            OptionKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(OptionValue::Integer)
                .map_err(|e| e.to_string()),
            OptionKind::Float => raw
                .trim()
                .parse::<f64>()
                .map(OptionValue::Float)
                .map_err(|e| e.to_string()),
            OptionKind::Path => Ok(OptionValue::Path(PathBuf::from(raw))),
            OptionKind::Uri => Url::parse(raw.trim())
                .map(OptionValue::Uri)
                .map_err(|e| e.to_string()),
            OptionKind::Duration => parse_duration(raw).map(OptionValue::Duration),
            OptionKind::Enum(constants) => {
                let wanted = raw.trim().to_lowercase();
                constants
                    .iter()
                    .find(|c| c.to_lowercase() == wanted)
                    .map(|c| OptionValue::String(c.clone()))
                    .ok_or_else(|| format!("possible values are [{}]", constants.join(", ")))
            }
        }
    }

    /// Short name used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            OptionKind::String => "string",
            OptionKind::Boolean => "boolean",
            OptionKind::Integer => "integer",
            OptionKind::Float => "float",
            OptionKind::Path => "path",
            OptionKind::Uri => "uri",
            OptionKind::Duration => "duration",
            OptionKind::Enum(_) => "enum",
        }
    }
}

/// Boolean spellings: empty, `yes` and `on` are true; `no` and `off` are
/// false; otherwise `true`/`false` in any case.
pub fn parse_boolean(raw: &str) -> Result<bool, String> {
    match raw {
        "" | "yes" | "on" => Ok(true),
        "no" | "off" => Ok(false),
        other if other.eq_ignore_ascii_case("true") => Ok(true),
        other if other.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err("expected one of true, false, yes, no, on, off".to_string()),
    }
}

/// A typed option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Path(PathBuf),
    Uri(Url),
    Duration(Duration),
}

impl OptionValue {
    /// Returns the boolean if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Flip a boolean value; other values are returned unchanged.
    pub fn negated(self) -> Self {
        match self {
            OptionValue::Boolean(b) => OptionValue::Boolean(!b),
            other => other,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::String(s) => write!(f, "{s}"),
            OptionValue::Boolean(b) => write!(f, "{b}"),
            OptionValue::Integer(i) => write!(f, "{i}"),
            OptionValue::Float(x) => write!(f, "{x}"),
            OptionValue::Path(p) => write!(f, "{}", p.display()),
            OptionValue::Uri(u) => write!(f, "{u}"),
            OptionValue::Duration(d) => write!(f, "{d:?}"),
        }
    }
}

/// Conversion from a stored [`OptionValue`] to a concrete type.
pub trait FromValue: Sized + Send + 'static {
    /// Name of the expected value, for mismatch errors.
    const EXPECTED: &'static str;

    fn from_value(value: &OptionValue) -> Option<Self>;
}

/// Conversion of a concrete default into an [`OptionValue`].
pub trait IntoValue {
    fn into_value(self) -> OptionValue;
}

macro_rules! value_conversions {
    ($($ty:ty => $variant:ident, $label:literal;)*) => {
        $(
            impl FromValue for $ty {
                const EXPECTED: &'static str = $label;

                fn from_value(value: &OptionValue) -> Option<Self> {
                    match value {
                        OptionValue::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }
            }

            impl IntoValue for $ty {
                fn into_value(self) -> OptionValue {
                    OptionValue::$variant(self)
                }
            }
        )*
    };
}

value_conversions! {
    String => String, "string";
    bool => Boolean, "boolean";
    i64 => Integer, "integer";
    f64 => Float, "float";
    PathBuf => Path, "path";
    Url => Uri, "uri";
    Duration => Duration, "duration";
}

impl IntoValue for &str {
    fn into_value(self) -> OptionValue {
        OptionValue::String(self.to_string())
    }
}

impl FromValue for OptionValue {
    const EXPECTED: &'static str = "any";

    fn from_value(value: &OptionValue) -> Option<Self> {
        Some(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_spellings() {
        assert_eq!(parse_boolean(""), Ok(true));
        assert_eq!(parse_boolean("yes"), Ok(true));
        assert_eq!(parse_boolean("on"), Ok(true));
        assert_eq!(parse_boolean("TRUE"), Ok(true));
        assert_eq!(parse_boolean("no"), Ok(false));
        assert_eq!(parse_boolean("off"), Ok(false));
        assert_eq!(parse_boolean("False"), Ok(false));
        assert!(parse_boolean("maybe").is_err());
    }

    #[test]
    fn integer_kind() {
        assert_eq!(OptionKind::Integer.parse("42"), Ok(OptionValue::Integer(42)));
        assert_eq!(OptionKind::Integer.parse("-7"), Ok(OptionValue::Integer(-7)));
        assert!(OptionKind::Integer.parse("forty").is_err());
        assert!(OptionKind::Integer.parse("").is_err());
    }

    #[test]
    fn float_kind() {
        assert_eq!(OptionKind::Float.parse("2.5"), Ok(OptionValue::Float(2.5)));
        assert!(OptionKind::Float.parse("two").is_err());
    }

    #[test]
    fn uri_kind() {
        let value = OptionKind::Uri.parse("mysql://sub.domain.org/names").unwrap();
        match value {
            OptionValue::Uri(url) => {
                assert_eq!(url.scheme(), "mysql");
                assert_eq!(url.path(), "/names");
            }
            other => panic!("unexpected value {other:?}"),
        }
        assert!(OptionKind::Uri.parse("not a uri").is_err());
    }

    #[test]
    fn enum_kind_matches_case_insensitively() {
        let kind = OptionKind::Enum(vec!["Debug".into(), "Info".into()]);
        assert_eq!(kind.parse("debug"), Ok(OptionValue::String("Debug".into())));
        assert_eq!(kind.parse("INFO"), Ok(OptionValue::String("Info".into())));
        let err = kind.parse("loud").unwrap_err();
        assert!(err.contains("Debug, Info"));
    }

    #[test]
    fn path_kind_keeps_text() {
        assert_eq!(
            OptionKind::Path.parse("/etc/app.conf"),
            Ok(OptionValue::Path(PathBuf::from("/etc/app.conf")))
        );
    }

    #[test]
    fn from_value_checks_variant() {
        assert_eq!(bool::from_value(&OptionValue::Boolean(true)), Some(true));
        assert_eq!(i64::from_value(&OptionValue::Boolean(true)), None);
    }

    #[test]
    fn negation_only_touches_booleans() {
        assert_eq!(OptionValue::Boolean(true).negated(), OptionValue::Boolean(false));
        assert_eq!(OptionValue::Integer(3).negated(), OptionValue::Integer(3));
    }
}
