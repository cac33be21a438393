//! Expected value matchers.
//!
//! Assertions compare response values either exactly or by pattern. A
//! pattern accepts a string that equals its source or that the regex finds
//! a match in, so a plain href like `/api/vms/1` works as a pattern too.

use std::fmt;

use regex::Regex;
use serde_json::Value;

/// An expectation for a single JSON value.
#[derive(Debug, Clone)]
pub enum ValueMatcher {
    /// The actual value must equal this value.
    Exact(Value),
    /// The actual value must be a string matching this pattern.
    Pattern(Regex),
}

impl ValueMatcher {
    /// Creates an exact matcher.
    pub fn exact(value: impl Into<Value>) -> Self {
        ValueMatcher::Exact(value.into())
    }

    /// Creates a pattern matcher from a regex source.
    pub fn pattern(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(ValueMatcher::Pattern)
    }

    /// Creates a match-style matcher: strings become patterns, anything
    /// else is compared exactly.
    ///
    /// A string that is not a valid regex is compared exactly.
    pub fn matching(value: impl Into<Value>) -> Self {
        match value.into() {
            Value::String(s) => match Regex::new(&s) {
                Ok(re) => ValueMatcher::Pattern(re),
                Err(_) => ValueMatcher::Exact(Value::String(s)),
            },
            other => ValueMatcher::Exact(other),
        }
    }

    /// Returns true if the actual value satisfies this matcher.
    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            ValueMatcher::Exact(expected) => expected == actual,
            ValueMatcher::Pattern(re) => match actual {
                Value::String(s) => s == re.as_str() || re.is_match(s),
                _ => false,
            },
        }
    }
}

impl fmt::Display for ValueMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueMatcher::Exact(value) => write!(f, "{}", value),
            ValueMatcher::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl From<Regex> for ValueMatcher {
    fn from(re: Regex) -> Self {
        ValueMatcher::Pattern(re)
    }
}

impl From<Value> for ValueMatcher {
    fn from(value: Value) -> Self {
        ValueMatcher::Exact(value)
    }
}

/// Expected attributes of a JSON object, checked in order.
#[derive(Debug, Clone, Default)]
pub struct AttrExpectations {
    entries: Vec<(String, ValueMatcher)>,
}

impl AttrExpectations {
    /// Creates an empty set of expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects `key` to equal `value`.
    pub fn equals(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(key, ValueMatcher::exact(value))
    }

    /// Expects `key` to satisfy the given matcher.
    pub fn with(mut self, key: impl Into<String>, matcher: impl Into<ValueMatcher>) -> Self {
        self.entries.push((key.into(), matcher.into()));
        self
    }

    /// Returns true if there are no expectations.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the expected keys and their matchers.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueMatcher)> {
        self.entries.iter().map(|(k, m)| (k.as_str(), m))
    }
}

/// Builds expectations from a JSON object.
///
/// The `href` key is matched as a pattern; every other key must be equal.
/// Anything other than an object yields no expectations.
impl From<Value> for AttrExpectations {
    fn from(value: Value) -> Self {
        let Value::Object(map) = value else {
            return Self::new();
        };

        map.into_iter().fold(Self::new(), |attrs, (key, value)| {
            let matcher = if key == "href" {
                ValueMatcher::matching(value)
            } else {
                ValueMatcher::Exact(value)
            };
            attrs.with(key, matcher)
        })
    }
}

/// The JSON type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    /// A JSON string.
    String,
    /// A JSON number without a fractional part.
    Integer,
    /// Any JSON number.
    Number,
    /// A JSON boolean.
    Boolean,
    /// A JSON array.
    Array,
    /// A JSON object.
    Object,
    /// JSON null.
    Null,
}

impl JsonKind {
    /// Returns true if the value is of this kind.
    pub fn is_kind_of(&self, value: &Value) -> bool {
        match self {
            JsonKind::String => value.is_string(),
            JsonKind::Integer => value.is_i64() || value.is_u64(),
            JsonKind::Number => value.is_number(),
            JsonKind::Boolean => value.is_boolean(),
            JsonKind::Array => value.is_array(),
            JsonKind::Object => value.is_object(),
            JsonKind::Null => value.is_null(),
        }
    }
}
