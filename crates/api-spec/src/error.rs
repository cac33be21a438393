//! Error types for the API test helpers.
//!
//! Assertion mismatches panic, as any test assertion does. The errors here
//! cover everything that can go wrong before an assertion runs: building the
//! in-process server, seeding fixtures, sending a request, parsing a body,
//! and loading the API collection configuration.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The error type for session setup, requests and configuration lookups.
#[derive(Error, Debug)]
pub enum SpecError {
    /// A header name or value could not be encoded.
    #[error("invalid header {name}: {message}")]
    InvalidHeader { name: String, message: String },

    /// The response body was not valid JSON.
    #[error("response with status {code} is not valid JSON: {source}")]
    InvalidJson {
        code: u16,
        #[source]
        source: serde_json::Error,
    },

    /// A request body could not be serialized.
    #[error("failed to serialize request body: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The in-process test server could not be created.
    #[error("failed to create test server: {0}")]
    Server(String),

    /// The seeder failed to create a fixture.
    #[error("fixture seeding failed: {0}")]
    Seed(String),

    /// Hashing the API user's password failed.
    #[error("failed to hash API user password: {0}")]
    Password(#[from] bcrypt::BcryptError),

    /// The configuration is invalid.
    #[error("invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    /// The API collection configuration could not be read.
    #[error("failed to read API collection config: {0}")]
    Io(#[from] std::io::Error),

    /// The API collection configuration is not valid YAML.
    #[error("failed to parse API collection config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The API collection configuration has an unexpected shape.
    #[error("malformed API collection config: {0}")]
    MalformedConfig(String),

    /// No API collection configuration has been loaded.
    #[error("no API collection config loaded (set api_yml)")]
    MissingCollectionConfig,

    /// The collection is not present in the API collection configuration.
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// The collection has no actions for the requested section and verb.
    #[error("collection {collection} has no {section} for {verb}")]
    UnknownSection {
        collection: String,
        section: String,
        verb: String,
    },

    /// No action of that name exists in the section.
    #[error("collection {collection} has no action {action} in {section}")]
    UnknownAction {
        collection: String,
        section: String,
        action: String,
    },

    /// The name is not one of the API collections.
    #[error("not an API collection: {0}")]
    NotACollection(String),
}

/// Result type for the API test helpers.
pub type SpecResult<T> = Result<T, SpecError>;
