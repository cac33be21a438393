//! # vmdb-api-spec - Request-level test helpers for the vmdb REST API
//!
//! This crate drives the REST API in-process through [`axum_test`] and
//! provides assertions over the JSON envelopes it returns. It covers the
//! request plumbing a request-level test needs and nothing more: URL
//! construction for the API collections, header normalization, GET/POST/DELETE
//! runners, response parsing, and a set of structural assertions.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vmdb_api_spec::{ApiConfig, ApiSession};
//!
//! #[tokio::test]
//! async fn test_list_vms() {
//!     let seeder = MySeeder::default();
//!     let mut api = ApiSession::init(app(), seeder, ApiConfig::for_testing())
//!         .await
//!         .unwrap();
//!
//!     api.api_basic_authorize(&["vm_show_list"]).await.unwrap();
//!     let url = api.urls().vms_url();
//!     api.run_get(&url, Default::default()).await.unwrap();
//!
//!     api.response().expect_query_result("vms", 0, Some(0));
//! }
//! ```
//!
//! ## Request Headers
//!
//! Every request carries `Content-Type: application/json` and
//! `Accept: application/json`. The `auth_token` alias is rewritten to the
//! `X-Auth-Token` header.
//!
//! ## Response Envelope
//!
//! | Key | Used by |
//! |-----|---------|
//! | `name`, `count`, `subcount`, `resources` | collection queries |
//! | `success`, `message`, `href` | single actions |
//! | `results` | multiple actions and tagging |
//! | `task_id`, `task_href` | asynchronous task results |
//! | `error.message` | failed requests |
//!
//! ## Architecture
//!
//! - [`config`] - Test identity and entrypoint configuration
//! - [`collections`] - Collection names and URL builders
//! - [`headers`] - Header aliasing and defaults
//! - [`response`] - Parsed API responses
//! - [`session`] - The in-process session and request runners
//! - [`fixtures`] - The seeding seam for the API user and environment
//! - [`collection_config`] - Action identifier lookups in the API config
//! - [`request`] - Action request body construction
//! - [`matchers`] - Expected value matchers
//! - [`assertions`] - Response assertions
//! - [`error`] - Error types

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod assertions;
pub mod collection_config;
pub mod collections;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod headers;
pub mod matchers;
pub mod request;
pub mod response;
pub mod session;

// Re-export commonly used types
pub use assertions::{
    ActionExpectation, TagResult, expect_result_to_match_hash, expect_result_to_represent_task,
    resources_include, resources_include_suffix,
};
pub use collection_config::{ActionSelection, ApiServerConfig};
pub use collections::{ApiUrls, Collection};
pub use config::{ApiConfig, ApiConfigParam};
pub use error::{SpecError, SpecResult};
pub use fixtures::{ApiUserFixture, SeededEnvironment, SeededUser, Seeder};
pub use headers::{RequestHeaders, update_headers};
pub use matchers::{AttrExpectations, JsonKind, ValueMatcher};
pub use request::gen_request;
pub use response::ApiResponse;
pub use session::{ApiSession, GetOptions};

/// Initializes the tracing subscriber for test logging.
///
/// Safe to call from every test; only the first call installs the
/// subscriber.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_test_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vmdb_api_spec={}", level)));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(filter)
        .try_init();
}
