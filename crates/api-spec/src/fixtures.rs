//! The seeding seam for the API user and environment.
//!
//! Creating records belongs to the application under test, so this module
//! only describes what a test session needs seeded and leaves the how to a
//! [`Seeder`] implementation.

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::SpecResult;

/// The server, zone and GUID seeded for a test session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededEnvironment {
    /// GUID of the test server.
    pub guid: Uuid,
    /// Id of the seeded server record.
    pub server_id: String,
    /// Id of the seeded zone record.
    pub zone_id: String,
}

/// The records created for the API user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededUser {
    /// Id of the user record.
    pub user_id: String,
    /// Id of the user's group.
    pub group_id: String,
    /// Id of the group's role.
    pub role_id: String,
}

/// The API user, its group and its role, ready to be seeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiUserFixture {
    /// Name of the role.
    pub role_name: String,
    /// Description of the group.
    pub group_description: String,
    /// Display name of the user.
    pub user_name: String,
    /// Login of the user.
    pub userid: String,
    /// Bcrypt digest of the user's password.
    pub password_digest: String,
}

impl ApiUserFixture {
    /// Builds the fixture from the session configuration, hashing the
    /// password with the configured bcrypt cost.
    pub fn from_config(config: &ApiConfig) -> SpecResult<Self> {
        Ok(Self {
            role_name: config.role_name.clone(),
            group_description: config.group_name.clone(),
            user_name: config.user_name.clone(),
            userid: config.user.clone(),
            password_digest: bcrypt::hash(&config.password, config.bcrypt_cost)?,
        })
    }

    /// Returns true if `password` matches the fixture's digest.
    pub fn verify_password(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.password_digest).unwrap_or(false)
    }
}

/// Creates the records a test session relies on.
///
/// Implementations write into whatever store backs the application under
/// test.
#[async_trait]
pub trait Seeder: Send + Sync {
    /// Seeds the region, database, server and zone.
    async fn seed_environment(&self, guid: Uuid) -> SpecResult<SeededEnvironment>;

    /// Creates the role, the group with that role, and the user in that
    /// group.
    async fn create_user(&self, fixture: &ApiUserFixture) -> SpecResult<SeededUser>;

    /// Replaces the role's product features with the given identifiers,
    /// creating features that do not exist yet.
    async fn update_role_features(&self, role_id: &str, identifiers: &[String]) -> SpecResult<()>;
}
