//! Common test utilities for the API session tests.
//!
//! This module provides test infrastructure including:
//!
//! - [`stub_api`] - A minimal in-process API speaking the response envelope
//! - [`seeder`] - An in-memory seeder sharing state with the stub API

pub mod stub_api;

use vmdb_api_spec::{ApiConfig, ApiSession};

use seeder::{StubSeeder, StubStore};

/// An api.yml covering the actions the stub API guards.
pub const API_YML: &str = r#"
:collections:
  :vms:
    :description: Virtual Machines
    :collection_actions:
      :get:
      - :name: read
        :identifier: vm_show_list
      :post:
      - :name: start
        :identifier: vm_start
      - :name: create
        :identifier: vm_create
    :resource_actions:
      :get:
      - :name: read
        :identifier: vm_show
      :post:
      - :name: start
        :identifier: vm_start
      :delete:
      - :name: delete
        :identifier: vm_delete
    :tags_subcollection_actions:
      :post:
      - :name: assign
        :identifier: vm_tag
"#;

/// Creates a session against a fresh stub API.
pub async fn create_session() -> (ApiSession<StubSeeder>, StubStore) {
    create_session_with(ApiConfig::for_testing()).await
}

/// Creates a session against a fresh stub API with the given config.
pub async fn create_session_with(config: ApiConfig) -> (ApiSession<StubSeeder>, StubStore) {
    vmdb_api_spec::init_test_logging("debug");

    let store = StubStore::default();
    let app = stub_api::create_routes(store.clone(), &config.entrypoint);
    let session = ApiSession::init(app, StubSeeder::new(store.clone()), config)
        .await
        .expect("Failed to create API session");

    (session, store)
}
