//! Action identifier lookups in the API collection config.
//!
//! The API server describes each collection in a YAML file (`api.yml`). For
//! every collection it lists action sections keyed by HTTP verb, and each
//! action names the product feature identifier that guards it:
//!
//! ```yaml
//! :collections:
//!   :vms:
//!     :description: Virtual Machines
//!     :resource_actions:
//!       :post:
//!       - :name: start
//!         :identifier: vm_start
//!     :tags_subcollection_actions:
//!       :post:
//!       - :name: assign
//!         :identifier: vm_tag
//! ```
//!
//! Keys may be written with or without the leading `:`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{SpecError, SpecResult};

/// Which action section of a collection to search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionSelection {
    /// Actions on a single resource (`resource_actions`).
    Resource,
    /// Actions on the collection itself (`collection_actions`).
    Collection,
    /// Actions on a subcollection (`<name>_subcollection_actions`).
    Subcollection(String),
}

impl ActionSelection {
    /// Returns the config key of the section.
    pub fn section_key(&self) -> String {
        match self {
            ActionSelection::Resource => "resource_actions".to_string(),
            ActionSelection::Collection => "collection_actions".to_string(),
            ActionSelection::Subcollection(sub) => format!("{}_subcollection_actions", sub),
        }
    }
}

impl fmt::Display for ActionSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.section_key())
    }
}

/// One action entry in a section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActionSpec {
    /// The action name sent in request bodies.
    pub name: String,
    /// The product feature identifier guarding the action.
    pub identifier: String,
    /// Whether the action is disabled.
    #[serde(default)]
    pub disabled: bool,
}

/// The parsed API collection config.
#[derive(Debug, Clone, Default)]
pub struct ApiServerConfig {
    collections: BTreeMap<String, Map<String, Value>>,
}

impl ApiServerConfig {
    /// Loads the config from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> SpecResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading API collection config");
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parses the config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> SpecResult<Self> {
        let raw: Value = serde_yaml::from_str(yaml)?;
        let root = match strip_symbol_keys(raw) {
            Value::Object(root) => root,
            other => {
                return Err(SpecError::MalformedConfig(format!(
                    "expected a mapping at the top level, got {}",
                    other
                )));
            }
        };

        let collections = match root.get("collections") {
            Some(Value::Object(collections)) => collections,
            Some(_) => {
                return Err(SpecError::MalformedConfig(
                    "collections must be a mapping".to_string(),
                ));
            }
            None => {
                return Err(SpecError::MalformedConfig(
                    "missing collections".to_string(),
                ));
            }
        };

        let mut parsed = BTreeMap::new();
        for (name, spec) in collections {
            match spec {
                Value::Object(spec) => {
                    parsed.insert(name.clone(), spec.clone());
                }
                Value::Null => {
                    parsed.insert(name.clone(), Map::new());
                }
                _ => {
                    return Err(SpecError::MalformedConfig(format!(
                        "collection {} must be a mapping",
                        name
                    )));
                }
            }
        }

        Ok(Self {
            collections: parsed,
        })
    }

    /// Returns the names of all configured collections.
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Returns the description of a collection, if any.
    pub fn description(&self, collection: &str) -> Option<&str> {
        self.collections
            .get(collection)?
            .get("description")?
            .as_str()
    }

    /// Returns the actions of a section for the given verb.
    pub fn actions(
        &self,
        collection: &str,
        selection: &ActionSelection,
        verb: &str,
    ) -> SpecResult<Vec<ActionSpec>> {
        let spec = self
            .collections
            .get(collection)
            .ok_or_else(|| SpecError::UnknownCollection(collection.to_string()))?;

        let section = selection.section_key();
        let unknown_section = || SpecError::UnknownSection {
            collection: collection.to_string(),
            section: section.clone(),
            verb: verb.to_string(),
        };

        let entries = spec
            .get(&section)
            .and_then(|s| s.get(verb))
            .ok_or_else(unknown_section)?;

        serde_json::from_value(entries.clone()).map_err(|e| {
            SpecError::MalformedConfig(format!(
                "{} {} {}: {}",
                collection, section, verb, e
            ))
        })
    }

    /// Returns the identifier of a `post` action.
    pub fn action_identifier(
        &self,
        collection: &str,
        action: &str,
        selection: &ActionSelection,
    ) -> SpecResult<String> {
        self.actions(collection, selection, "post")?
            .into_iter()
            .find(|spec| spec.name == action)
            .map(|spec| spec.identifier)
            .ok_or_else(|| SpecError::UnknownAction {
                collection: collection.to_string(),
                section: selection.section_key(),
                action: action.to_string(),
            })
    }

    /// Returns the identifier of a collection-level `post` action.
    pub fn collection_action_identifier(
        &self,
        collection: &str,
        action: &str,
    ) -> SpecResult<String> {
        self.action_identifier(collection, action, &ActionSelection::Collection)
    }

    /// Returns the identifier of a subcollection `post` action.
    pub fn subcollection_action_identifier(
        &self,
        collection: &str,
        subcollection: &str,
        action: &str,
    ) -> SpecResult<String> {
        self.action_identifier(
            collection,
            action,
            &ActionSelection::Subcollection(subcollection.to_string()),
        )
    }
}

/// Removes the leading `:` from every mapping key.
fn strip_symbol_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let key = k.strip_prefix(':').map(str::to_string).unwrap_or(k);
                    (key, strip_symbol_keys(v))
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_symbol_keys).collect()),
        other => other,
    }
}
