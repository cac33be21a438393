//! Header aliasing and defaults.
//!
//! Tests pass headers by short alias (`auth_token`) or by real name. Before a
//! request is sent the aliases are rewritten and the JSON defaults are merged
//! in. Defaults win over caller values for the same header.

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{SpecError, SpecResult};

/// Header aliases and the header each one stands for.
pub const HEADER_ALIASES: &[(&str, &str)] = &[("auth_token", "X-Auth-Token")];

/// Headers sent with every request.
pub const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("Content-Type", "application/json"),
    ("Accept", "application/json"),
];

/// Caller-supplied request headers, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    entries: Vec<(String, String)>,
}

impl RequestHeaders {
    /// Creates an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header. A later value for the same key replaces the earlier one.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name.into(), value.into());
        self
    }

    /// Adds the authentication token alias.
    pub fn auth_token(self, token: impl Into<String>) -> Self {
        self.header("auth_token", token)
    }

    /// Returns true if no headers were given.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the value of a header as given by the caller.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over the headers as given by the caller.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn insert(&mut self, name: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Rewrites aliased keys to the headers they stand for.
    pub fn resolve_aliases(mut self) -> Self {
        for (alias, target) in HEADER_ALIASES {
            if let Some(value) = self.remove(alias) {
                self.insert((*target).to_string(), value);
            }
        }
        self
    }
}

impl<K, V> FromIterator<(K, V)> for RequestHeaders
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |headers, (k, v)| headers.header(k, v))
    }
}

/// Resolves aliases, merges the default headers, and encodes the result.
pub fn update_headers(headers: &RequestHeaders) -> SpecResult<HeaderMap> {
    let resolved = headers.clone().resolve_aliases();
    let mut map = HeaderMap::new();

    for (name, value) in resolved.iter() {
        map.insert(header_name(name)?, header_value(name, value)?);
    }

    for (name, value) in DEFAULT_HEADERS {
        map.insert(header_name(name)?, HeaderValue::from_static(value));
    }

    Ok(map)
}

fn header_name(name: &str) -> SpecResult<HeaderName> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| SpecError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })
}

fn header_value(name: &str, value: &str) -> SpecResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| SpecError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })
}
