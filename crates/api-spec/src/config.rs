//! Test identity and entrypoint configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `API_SPEC_USER` | api_user_id | Login of the API user |
//! | `API_SPEC_PASSWORD` | api_user_password | Password of the API user |
//! | `API_SPEC_USER_NAME` | API User | Display name of the API user |
//! | `API_SPEC_GROUP_NAME` | API User Group | Description of the user's group |
//! | `API_SPEC_ROLE_NAME` | API User Role | Name of the group's role |
//! | `API_SPEC_ENTRYPOINT` | /api | Path of the API root |
//! | `API_SPEC_API_YML` | (none) | Path to the API collection config |
//! | `API_SPEC_BCRYPT_COST` | 12 | Cost used to hash the user's password |
//! | `API_SPEC_LOG_LEVEL` | info | Log level |
//!
//! # Example
//!
//! ```rust
//! use vmdb_api_spec::{ApiConfig, ApiConfigParam};
//!
//! let config = ApiConfig::default();
//! assert_eq!(config.api_config(ApiConfigParam::Entrypoint), "/api");
//! ```

use std::path::PathBuf;

use clap::Parser;

use crate::error::{SpecError, SpecResult};

/// Configuration of the API user and entrypoint used by a test session.
#[derive(Debug, Clone, Parser)]
#[command(name = "api-spec")]
#[command(about = "REST API request test configuration")]
pub struct ApiConfig {
    /// Login of the API user.
    #[arg(long, env = "API_SPEC_USER", default_value = "api_user_id")]
    pub user: String,

    /// Password of the API user.
    #[arg(long, env = "API_SPEC_PASSWORD", default_value = "api_user_password")]
    pub password: String,

    /// Display name of the API user.
    #[arg(long, env = "API_SPEC_USER_NAME", default_value = "API User")]
    pub user_name: String,

    /// Description of the API user's group.
    #[arg(long, env = "API_SPEC_GROUP_NAME", default_value = "API User Group")]
    pub group_name: String,

    /// Name of the API user's role.
    #[arg(long, env = "API_SPEC_ROLE_NAME", default_value = "API User Role")]
    pub role_name: String,

    /// Path of the API root.
    #[arg(long, env = "API_SPEC_ENTRYPOINT", default_value = "/api")]
    pub entrypoint: String,

    /// Path to the API collection config (api.yml).
    #[arg(long, env = "API_SPEC_API_YML")]
    pub api_yml: Option<PathBuf>,

    /// Cost used to hash the API user's password.
    #[arg(long, env = "API_SPEC_BCRYPT_COST", default_value = "12")]
    pub bcrypt_cost: u32,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "API_SPEC_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// The identity parameters that can be looked up with [`ApiConfig::api_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiConfigParam {
    /// Login of the API user.
    User,
    /// Password of the API user.
    Password,
    /// Display name of the API user.
    UserName,
    /// Description of the API user's group.
    GroupName,
    /// Name of the API user's role.
    RoleName,
    /// Path of the API root.
    Entrypoint,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            user: "api_user_id".to_string(),
            password: "api_user_password".to_string(),
            user_name: "API User".to_string(),
            group_name: "API User Group".to_string(),
            role_name: "API User Role".to_string(),
            entrypoint: "/api".to_string(),
            api_yml: None,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            log_level: "info".to_string(),
        }
    }
}

impl ApiConfig {
    /// Creates a configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::try_parse_from(["api-spec"]).unwrap_or_default()
    }

    /// Creates a configuration suitable for fast tests.
    ///
    /// Uses the cheapest bcrypt cost so defining the API user stays quick.
    pub fn for_testing() -> Self {
        Self {
            bcrypt_cost: 4,
            log_level: "debug".to_string(),
            ..Self::default()
        }
    }

    /// Returns the value of one identity parameter.
    pub fn api_config(&self, param: ApiConfigParam) -> &str {
        match param {
            ApiConfigParam::User => &self.user,
            ApiConfigParam::Password => &self.password,
            ApiConfigParam::UserName => &self.user_name,
            ApiConfigParam::GroupName => &self.group_name,
            ApiConfigParam::RoleName => &self.role_name,
            ApiConfigParam::Entrypoint => &self.entrypoint,
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.entrypoint.starts_with('/') {
            errors.push(format!(
                "Entrypoint must start with '/': {}",
                self.entrypoint
            ));
        }

        if self.entrypoint.len() > 1 && self.entrypoint.ends_with('/') {
            errors.push(format!(
                "Entrypoint must not end with '/': {}",
                self.entrypoint
            ));
        }

        if self.user.is_empty() {
            errors.push("User cannot be empty".to_string());
        }

        if self.password.is_empty() {
            errors.push("Password cannot be empty".to_string());
        }

        if !(4..=31).contains(&self.bcrypt_cost) {
            errors.push(format!(
                "Bcrypt cost must be between 4 and 31, got {}",
                self.bcrypt_cost
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validates the configuration, folding problems into a [`SpecError`].
    pub fn ensure_valid(&self) -> SpecResult<()> {
        self.validate().map_err(SpecError::InvalidConfig)
    }
}
