//! Custom checks: user-defined validators that plug into the matcher.
//!
//! Implement [`Check`] and wrap it with [`Template::custom`](super::Template::custom).
//! Errors returned without a path are located at the current path by the matcher.
use std::fmt;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ErrorKind, ValidationError};
use crate::path::Path;
use crate::value::Value;

pub trait Check: fmt::Debug + Send + Sync {
    fn check(&self, value: &Value, path: &Path<'_>) -> Result<(), ValidationError>;

    /// Short description used when the check shows up in another error message.
    fn describe(&self) -> String { format!("{self:?}") }
}

// ------------------------------ StringCheck ------------------------------- //

/// String whose length (in chars) lies within `min..=max`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringCheck {
    pub min: usize,
    pub max: usize,
}

impl StringCheck {
    pub fn new(max: usize) -> Self { Self { min: 0, max } }
    pub fn between(min: usize, max: usize) -> Self { Self { min, max } }
}

impl Check for StringCheck {
    fn check(&self, value: &Value, path: &Path<'_>) -> Result<(), ValidationError> {
        let Some(s) = value.as_str() else {
            return Err(ValidationError::check_failed(path, format!("is {} but must be a string", value.type_name())));
        };
        let len = s.chars().count();
        if len < self.min {
            return Err(ValidationError::check_failed(path, format!("is {len} long, but must be at least {}", self.min)));
        }
        if len > self.max {
            return Err(ValidationError::check_failed(path, format!("is {len} long, but must be at most {}", self.max)));
        }
        Ok(())
    }

    fn describe(&self) -> String { format!("str of length {}..={}", self.min, self.max) }
}

// ------------------------------ DecimalCheck ------------------------------ //

static DECIMAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(?:(?:\d+(?:_\d+)*(?:\.(?:\d+(?:_\d+)*)?)?|\.\d+(?:_\d+)*)(?:[eE][+-]?\d+)?|(?i:nan|snan|inf|infinity))\s*$")
        .expect("decimal literal regex is valid")
});

/// String holding a decimal literal; plain numbers are accepted as-is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecimalCheck;

impl Check for DecimalCheck {
    fn check(&self, value: &Value, path: &Path<'_>) -> Result<(), ValidationError> {
        match value {
            Value::Int(_) | Value::UInt(_) | Value::Float(_) => Ok(()),
            Value::Str(s) if DECIMAL_RE.is_match(s) => Ok(()),
            other => Err(ValidationError::check_failed(
                path,
                format!("is {} but should be a string containing a decimal value", describe_value(other)),
            )),
        }
    }

    fn describe(&self) -> String { "decimal string".to_string() }
}

fn describe_value(v: &Value) -> String {
    match v {
        Value::Str(s) => format!("{s:?}"),
        other => other.type_name().to_string(),
    }
}

// ------------------------------ PatternCheck ------------------------------ //

/// String matching a regular expression (unanchored unless the pattern anchors itself).
#[derive(Clone, Debug)]
pub struct PatternCheck {
    regex: Regex,
}

impl PatternCheck {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self { regex: Regex::new(pattern)? })
    }

    pub fn pattern(&self) -> &str { self.regex.as_str() }
}

impl Check for PatternCheck {
    fn check(&self, value: &Value, path: &Path<'_>) -> Result<(), ValidationError> {
        match value.as_str() {
            Some(s) if self.regex.is_match(s) => Ok(()),
            Some(s) => Err(ValidationError::check_failed(path, format!("{s:?} does not match /{}/", self.pattern()))),
            None => Err(ValidationError::new(
                ErrorKind::TypeMismatch,
                path,
                format!("is {} but should be a string matching /{}/", value.type_name(), self.pattern()),
            )),
        }
    }

    fn describe(&self) -> String { format!("str matching /{}/", self.pattern()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(check: &dyn Check, v: Value) -> Result<(), ValidationError> {
        check.check(&v, &Path::root())
    }

    #[test]
    fn string_check_bounds_are_inclusive() {
        let c = StringCheck::between(2, 4);
        assert!(run(&c, "ab".into()).is_ok());
        assert!(run(&c, "abcd".into()).is_ok());
        assert!(run(&c, "a".into()).is_err());
        let err = run(&c, "abcde".into()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CheckFailed);
        assert_eq!(err.to_string(), "$: is 5 long, but must be at most 4");
        assert!(run(&c, Value::Int(3)).is_err());
    }

    #[test]
    fn string_check_counts_chars_not_bytes() {
        assert!(run(&StringCheck::new(3), "αβγ".into()).is_ok());
    }

    #[test]
    fn decimal_check_accepts_decimal_literals() {
        for ok in ["1", "-1.50", ".5", "1e10", "2.", " 3 ", "NaN", "-Infinity", "1_000"] {
            assert!(run(&DecimalCheck, ok.into()).is_ok(), "{ok}");
        }
        assert!(run(&DecimalCheck, Value::Int(7)).is_ok());
        for bad in ["", "abc", "1.2.3", "e5", "--1", "1_", "1__0", "1._5"] {
            assert!(run(&DecimalCheck, bad.into()).is_err(), "{bad}");
        }
        assert!(run(&DecimalCheck, Value::Null).is_err());
    }

    #[test]
    fn pattern_check_separates_type_and_content_failures() {
        let c = PatternCheck::new(r"^[a-z]+$").unwrap();
        assert!(run(&c, "abc".into()).is_ok());
        assert_eq!(run(&c, "ABC".into()).unwrap_err().kind(), ErrorKind::CheckFailed);
        assert_eq!(run(&c, Value::Int(1)).unwrap_err().kind(), ErrorKind::TypeMismatch);
    }
}
