//! String and number checks.
//!
//! Checks run in the order they were added. A failing check raises an issue
//! but does not stop later checks; transforms (`trim`, case changes) rewrite
//! the value seen by the checks after them.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::error::{Result, SchemaError};
use crate::generation::ApiGeneration;
use crate::issue::{IssueKind, SizeOrigin, StringFormat};
use crate::value::{MAX_SAFE_INTEGER, js_number_string};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z0-9_'+\-.]*[A-Z0-9_+-]@([A-Z0-9][A-Z0-9\-]*\.)+[A-Z]{2,}$")
        .expect("Invalid email regex")
});

static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("Invalid uuid regex")
});

static DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?Z$").expect("Invalid datetime regex")
});

fn is_email(s: &str) -> bool {
    // The upstream pattern uses look-aheads for these two rules
    !s.starts_with('.') && !s.contains("..") && EMAIL.is_match(s)
}

/// String length as JavaScript counts it (UTF-16 code units).
#[must_use]
pub fn js_length(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Kinds of string checks and transforms.
#[derive(Debug, Clone)]
pub enum StringCheckKind {
    /// Minimum length.
    Min(usize),
    /// Maximum length.
    Max(usize),
    /// Exact length.
    Length(usize),
    /// Email address.
    Email,
    /// Absolute URL.
    Url,
    /// UUID.
    Uuid,
    /// ISO datetime in UTC.
    Datetime,
    /// Regular expression match.
    Regex {
        /// Compiled pattern.
        regex: Regex,
        /// `/source/flags` as written.
        display: String,
    },
    /// Prefix.
    StartsWith(String),
    /// Suffix.
    EndsWith(String),
    /// Substring.
    Includes(String),
    /// Trim whitespace.
    Trim,
    /// Lowercase.
    ToLowerCase,
    /// Uppercase.
    ToUpperCase,
}

/// A string check with its optional custom message.
#[derive(Debug, Clone)]
pub struct StringCheck {
    /// What to check.
    pub kind: StringCheckKind,
    /// Message overriding the default.
    pub message: Option<String>,
}

impl StringCheck {
    /// A check with an optional custom message.
    #[must_use]
    pub fn new(kind: StringCheckKind, message: Option<String>) -> Self {
        Self { kind, message }
    }

    /// Compile a regular expression literal into a check.
    ///
    /// `flags` follow JavaScript: `i`, `m` and `s` map onto the matcher, the
    /// stateful flags (`g`, `y`) and `u` do not change matching here.
    pub fn regex(source: &str, flags: &str, message: Option<String>) -> Result<Self> {
        let regex = compile_js_regex(source, flags)?;
        Ok(Self::new(
            StringCheckKind::Regex {
                regex,
                display: format!("/{source}/{flags}"),
            },
            message,
        ))
    }

    /// Apply the check. Transforms rewrite `value` and never fail.
    pub(crate) fn apply(&self, value: &mut String) -> Option<IssueKind> {
        let len = js_length(value) as f64;
        match &self.kind {
            StringCheckKind::Min(min) => (len < *min as f64).then(|| IssueKind::TooSmall {
                origin: SizeOrigin::String,
                minimum: *min as f64,
                inclusive: true,
                exact: false,
            }),
            StringCheckKind::Max(max) => (len > *max as f64).then(|| IssueKind::TooBig {
                origin: SizeOrigin::String,
                maximum: *max as f64,
                inclusive: true,
                exact: false,
            }),
            StringCheckKind::Length(exact) => {
                let exact = *exact as f64;
                if len > exact {
                    Some(IssueKind::TooBig {
                        origin: SizeOrigin::String,
                        maximum: exact,
                        inclusive: true,
                        exact: true,
                    })
                } else if len < exact {
                    Some(IssueKind::TooSmall {
                        origin: SizeOrigin::String,
                        minimum: exact,
                        inclusive: true,
                        exact: true,
                    })
                } else {
                    None
                }
            }
            StringCheckKind::Email => {
                (!is_email(value)).then_some(IssueKind::InvalidString(StringFormat::Email))
            }
            StringCheckKind::Url => url::Url::parse(value)
                .is_err()
                .then_some(IssueKind::InvalidString(StringFormat::Url)),
            StringCheckKind::Uuid => {
                (!UUID.is_match(value)).then_some(IssueKind::InvalidString(StringFormat::Uuid))
            }
            StringCheckKind::Datetime => (!DATETIME.is_match(value))
                .then_some(IssueKind::InvalidString(StringFormat::Datetime)),
            StringCheckKind::Regex { regex, display } => (!regex.is_match(value))
                .then(|| IssueKind::InvalidString(StringFormat::Regex(display.clone()))),
            StringCheckKind::StartsWith(prefix) => (!value.starts_with(prefix.as_str()))
                .then(|| IssueKind::InvalidString(StringFormat::StartsWith(prefix.clone()))),
            StringCheckKind::EndsWith(suffix) => (!value.ends_with(suffix.as_str()))
                .then(|| IssueKind::InvalidString(StringFormat::EndsWith(suffix.clone()))),
            StringCheckKind::Includes(needle) => (!value.contains(needle.as_str()))
                .then(|| IssueKind::InvalidString(StringFormat::Includes(needle.clone()))),
            StringCheckKind::Trim => {
                *value = value.trim().to_string();
                None
            }
            StringCheckKind::ToLowerCase => {
                *value = value.to_lowercase();
                None
            }
            StringCheckKind::ToUpperCase => {
                *value = value.to_uppercase();
                None
            }
        }
    }
}

/// Compile a JavaScript regular expression for the Rust matcher.
pub fn compile_js_regex(source: &str, flags: &str) -> Result<Regex> {
    RegexBuilder::new(source)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build()
        .map_err(|e| SchemaError::InvalidRegex {
            source_text: source.to_string(),
            reason: e.to_string().lines().last().unwrap_or_default().trim().to_string(),
        })
}

/// Kinds of number checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberCheckKind {
    /// Lower bound.
    Min {
        /// Bound.
        value: f64,
        /// Whether the bound is allowed.
        inclusive: bool,
    },
    /// Upper bound.
    Max {
        /// Bound.
        value: f64,
        /// Whether the bound is allowed.
        inclusive: bool,
    },
    /// Integer.
    Int,
    /// Multiple of a step.
    MultipleOf(f64),
    /// Finite.
    Finite,
}

/// A number check with its optional custom message.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberCheck {
    /// What to check.
    pub kind: NumberCheckKind,
    /// Message overriding the default.
    pub message: Option<String>,
}

impl NumberCheck {
    /// A check with an optional custom message.
    #[must_use]
    pub fn new(kind: NumberCheckKind, message: Option<String>) -> Self {
        Self { kind, message }
    }

    /// `gte(value)` / `min(value)`
    #[must_use]
    pub fn min(value: f64, inclusive: bool, message: Option<String>) -> Self {
        Self::new(NumberCheckKind::Min { value, inclusive }, message)
    }

    /// `lte(value)` / `max(value)`
    #[must_use]
    pub fn max(value: f64, inclusive: bool, message: Option<String>) -> Self {
        Self::new(NumberCheckKind::Max { value, inclusive }, message)
    }

    /// `int()`
    #[must_use]
    pub fn int(message: Option<String>) -> Self {
        Self::new(NumberCheckKind::Int, message)
    }

    /// `safe()`: both safe-integer bounds.
    #[must_use]
    pub fn safe(message: Option<String>) -> [Self; 2] {
        [
            Self::min(-MAX_SAFE_INTEGER, true, message.clone()),
            Self::max(MAX_SAFE_INTEGER, true, message),
        ]
    }

    pub(crate) fn apply(&self, n: f64, generation: ApiGeneration) -> Option<IssueKind> {
        match self.kind {
            NumberCheckKind::Min { value, inclusive } => {
                let fails = if inclusive { n < value } else { n <= value };
                fails.then_some(IssueKind::TooSmall {
                    origin: SizeOrigin::Number,
                    minimum: value,
                    inclusive,
                    exact: false,
                })
            }
            NumberCheckKind::Max { value, inclusive } => {
                let fails = if inclusive { n > value } else { n >= value };
                fails.then_some(IssueKind::TooBig {
                    origin: SizeOrigin::Number,
                    maximum: value,
                    inclusive,
                    exact: false,
                })
            }
            NumberCheckKind::Int => (n.fract() != 0.0 || !n.is_finite()).then(|| match generation {
                ApiGeneration::V3 => IssueKind::InvalidType {
                    expected: "integer".to_string(),
                    received: "float".to_string(),
                },
                ApiGeneration::V4 => IssueKind::InvalidType {
                    expected: "int".to_string(),
                    received: "number".to_string(),
                },
            }),
            NumberCheckKind::MultipleOf(step) => {
                (!is_multiple_of(n, step)).then_some(IssueKind::NotMultipleOf { divisor: step })
            }
            NumberCheckKind::Finite => (!n.is_finite()).then_some(IssueKind::NotFinite),
        }
    }
}

fn decimal_places(n: f64) -> i32 {
    js_number_string(n)
        .split_once('.')
        .map_or(0, |(_, frac)| i32::try_from(frac.len()).unwrap_or(i32::MAX))
}

/// Remainder test that scales both sides to integers first, so
/// `0.3` is a multiple of `0.1`.
fn is_multiple_of(n: f64, step: f64) -> bool {
    if step == 0.0 || !n.is_finite() || !step.is_finite() {
        return false;
    }
    let scale = 10f64.powi(decimal_places(n).max(decimal_places(step)).min(15));
    let value = (n * scale).round();
    let step = (step * scale).round();
    step != 0.0 && value % step == 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(kind: StringCheckKind, input: &str) -> (String, Option<IssueKind>) {
        let mut value = input.to_string();
        let issue = StringCheck::new(kind, None).apply(&mut value);
        (value, issue)
    }

    #[test]
    fn test_length_counts_utf16_units() {
        assert_eq!(js_length("abc"), 3);
        assert_eq!(js_length("😀"), 2);
    }

    #[test]
    fn test_min_length() {
        assert!(check(StringCheckKind::Min(3), "ab").1.is_some());
        assert!(check(StringCheckKind::Min(3), "abc").1.is_none());
    }

    #[test]
    fn test_formats() {
        assert!(check(StringCheckKind::Email, "a@b.co").1.is_none());
        assert!(check(StringCheckKind::Email, ".a@b.co").1.is_some());
        assert!(check(StringCheckKind::Email, "a..b@c.co").1.is_some());
        assert!(check(StringCheckKind::Url, "https://example.com").1.is_none());
        assert!(check(StringCheckKind::Url, "not a url").1.is_some());
        assert!(check(StringCheckKind::Uuid, "123e4567-e89b-12d3-a456-426614174000").1.is_none());
        assert!(check(StringCheckKind::Datetime, "2020-01-01T00:00:00Z").1.is_none());
        assert!(check(StringCheckKind::Datetime, "2020-01-01").1.is_some());
    }

    #[test]
    fn test_transforms_rewrite_value() {
        assert_eq!(check(StringCheckKind::Trim, "  a  ").0, "a");
        assert_eq!(check(StringCheckKind::ToUpperCase, "ab").0, "AB");
    }

    #[test]
    fn test_regex_flags() {
        let check = StringCheck::regex("^abc$", "i", None).unwrap();
        let mut value = "ABC".to_string();
        assert!(check.apply(&mut value).is_none());
        assert!(StringCheck::regex("(?<=a)b", "", None).is_err());
    }

    #[test]
    fn test_number_bounds() {
        let gt = NumberCheck::min(5.0, false, None);
        assert!(gt.apply(5.0, ApiGeneration::V3).is_some());
        assert!(gt.apply(5.1, ApiGeneration::V3).is_none());
        let lte = NumberCheck::max(5.0, true, None);
        assert!(lte.apply(5.0, ApiGeneration::V3).is_none());
    }

    #[test]
    fn test_int_issue_depends_on_generation() {
        let int = NumberCheck::int(None);
        let Some(IssueKind::InvalidType { expected, .. }) = int.apply(1.5, ApiGeneration::V3) else {
            panic!("expected invalid_type");
        };
        assert_eq!(expected, "integer");
        assert!(int.apply(2.0, ApiGeneration::V4).is_none());
    }

    #[test]
    fn test_float_safe_multiple_of() {
        assert!(is_multiple_of(0.3, 0.1));
        assert!(is_multiple_of(10.0, 5.0));
        assert!(!is_multiple_of(7.0, 5.0));
        assert!(!is_multiple_of(1.0, 0.0));
    }
}
