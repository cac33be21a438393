//! The in-process API session and request runners.
//!
//! An [`ApiSession`] wraps the application in an [`axum_test::TestServer`],
//! seeds the environment and the API user, and remembers the last parsed
//! response so assertions can run against it.

use std::sync::OnceLock;

use axum::Router;
use axum::body::Bytes;
use axum_test::{TestRequest, TestServer};
use base64::{Engine, engine::general_purpose::STANDARD};
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::collection_config::{ActionSelection, ApiServerConfig};
use crate::collections::ApiUrls;
use crate::config::ApiConfig;
use crate::error::{SpecError, SpecResult};
use crate::fixtures::{ApiUserFixture, SeededEnvironment, SeededUser, Seeder};
use crate::headers::{RequestHeaders, update_headers};
use crate::response::ApiResponse;

/// Options for a GET request.
///
/// Every option other than the headers is sent as a query parameter.
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    /// Request headers.
    pub headers: RequestHeaders,
    /// Query parameters, in order.
    pub params: Vec<(String, String)>,
}

impl GetOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Sets the request headers.
    pub fn headers(mut self, headers: RequestHeaders) -> Self {
        self.headers = headers;
        self
    }
}

/// A request-level test session against the API.
///
/// # Example
///
/// ```rust,ignore
/// let mut api = ApiSession::init(app, seeder, ApiConfig::for_testing()).await?;
///
/// api.api_basic_authorize(&["vm_start"]).await?;
/// let body = gen_request("start", None, &[api.urls().vms_url_id(1)]);
/// api.run_post(&api.urls().vms_url(), &body, RequestHeaders::new()).await?;
///
/// api.response().expect_multiple_action_result(1, true);
/// ```
pub struct ApiSession<S> {
    server: TestServer,
    config: ApiConfig,
    urls: ApiUrls,
    seeder: S,
    environment: SeededEnvironment,
    user: SeededUser,
    collection_config: Option<ApiServerConfig>,
    authorized: bool,
    response: Option<ApiResponse>,
    miq_server_guid: OnceLock<Uuid>,
}

impl<S: Seeder> ApiSession<S> {
    /// Sets up a session: seeds the environment with a fresh server GUID,
    /// builds the URL helpers, defines the API user, and loads the
    /// collection config when one is configured.
    pub async fn init(app: Router, seeder: S, config: ApiConfig) -> SpecResult<Self> {
        config.ensure_valid()?;

        let server = TestServer::new(app).map_err(|e| SpecError::Server(e.to_string()))?;

        let environment = seeder.seed_environment(Uuid::new_v4()).await?;
        let urls = ApiUrls::new(config.entrypoint.clone());

        let fixture = ApiUserFixture::from_config(&config)?;
        let user = seeder.create_user(&fixture).await?;

        let collection_config = config
            .api_yml
            .as_ref()
            .map(ApiServerConfig::load)
            .transpose()?;

        info!(
            guid = %environment.guid,
            entrypoint = %config.entrypoint,
            user = %config.user,
            "Initialized API test session"
        );

        Ok(Self {
            server,
            config,
            urls,
            seeder,
            environment,
            user,
            collection_config,
            authorized: false,
            response: None,
            miq_server_guid: OnceLock::new(),
        })
    }

    /// Replaces the user's role features with the given identifiers.
    ///
    /// Does nothing when no identifiers are given.
    pub async fn update_user_role(&self, identifiers: &[&str]) -> SpecResult<()> {
        if identifiers.is_empty() {
            return Ok(());
        }

        let identifiers: Vec<String> = identifiers.iter().map(|i| i.to_string()).collect();
        debug!(role = %self.user.role_id, features = ?identifiers, "Updating API user role");

        self.seeder
            .update_role_features(&self.user.role_id, &identifiers)
            .await
    }

    /// Sends the API user's basic credentials with every following request.
    ///
    /// When identifiers are given, the user's role is first limited to
    /// exactly those product features.
    pub async fn api_basic_authorize(&mut self, identifiers: &[&str]) -> SpecResult<()> {
        self.update_user_role(identifiers).await?;
        self.authorized = true;
        Ok(())
    }

    /// Stops sending basic credentials.
    pub fn clear_authorization(&mut self) {
        self.authorized = false;
    }
}

impl<S> ApiSession<S> {
    /// Issues a GET request and records the parsed response.
    ///
    /// Returns whether the request succeeded (status below 400).
    pub async fn run_get(&mut self, url: &str, options: GetOptions) -> SpecResult<bool> {
        let headers = update_headers(&options.headers)?;

        let mut request = self.server.get(url);
        for (key, value) in &options.params {
            request = request.add_query_param(key, value);
        }

        let request = self.prepare(request, headers)?;
        self.dispatch("GET", url, request).await
    }

    /// Issues a POST request with a JSON body and records the parsed
    /// response.
    pub async fn run_post(
        &mut self,
        url: &str,
        body: &Value,
        headers: RequestHeaders,
    ) -> SpecResult<bool> {
        let headers = update_headers(&headers)?;
        let raw = serde_json::to_vec(body).map_err(SpecError::Serialize)?;

        let request = self.server.post(url).bytes(Bytes::from(raw));
        let request = self.prepare(request, headers)?;
        self.dispatch("POST", url, request).await
    }

    /// Issues a DELETE request and records the parsed response.
    pub async fn run_delete(&mut self, url: &str, headers: RequestHeaders) -> SpecResult<bool> {
        let headers = update_headers(&headers)?;

        let request = self.server.delete(url);
        let request = self.prepare(request, headers)?;
        self.dispatch("DELETE", url, request).await
    }

    fn prepare(&self, mut request: TestRequest, headers: HeaderMap) -> SpecResult<TestRequest> {
        for (name, value) in headers.iter() {
            request = request.add_header(name.clone(), value.clone());
        }

        if self.authorized {
            request = request.add_header(AUTHORIZATION, self.basic_credentials()?);
        }

        Ok(request)
    }

    fn basic_credentials(&self) -> SpecResult<HeaderValue> {
        let encoded = STANDARD.encode(format!("{}:{}", self.config.user, self.config.password));
        HeaderValue::from_str(&format!("Basic {}", encoded)).map_err(|e| SpecError::InvalidHeader {
            name: AUTHORIZATION.to_string(),
            message: e.to_string(),
        })
    }

    async fn dispatch(
        &mut self,
        method: &str,
        url: &str,
        request: TestRequest,
    ) -> SpecResult<bool> {
        let response = request.await;
        let code = response.status_code().as_u16();
        debug!(method, url, code, "API request completed");

        let parsed = ApiResponse::parse(code, response.text().as_bytes())
            .inspect_err(|e| warn!(method, url, code, error = %e, "Unparseable API response"))?;
        let success = parsed.success();
        self.response = Some(parsed);

        Ok(success)
    }

    /// Returns the last parsed response.
    ///
    /// # Panics
    ///
    /// Panics if no request has been made in this session.
    pub fn response(&self) -> &ApiResponse {
        match &self.response {
            Some(response) => response,
            None => panic!("No API request has been made in this session"),
        }
    }

    /// Returns the last parsed response, if any.
    pub fn last_response(&self) -> Option<&ApiResponse> {
        self.response.as_ref()
    }

    /// Returns the URL helpers.
    pub fn urls(&self) -> &ApiUrls {
        &self.urls
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Returns the underlying test server.
    pub fn server(&self) -> &TestServer {
        &self.server
    }

    /// Returns the seeder.
    pub fn seeder(&self) -> &S {
        &self.seeder
    }

    /// Returns the seeded environment.
    pub fn environment(&self) -> &SeededEnvironment {
        &self.environment
    }

    /// Returns the seeded API user.
    pub fn user(&self) -> &SeededUser {
        &self.user
    }

    /// Returns a GUID for the test server, generated on first use and
    /// stable for the rest of the session.
    ///
    /// Independent of the GUID the environment was seeded with.
    pub fn miq_server_guid(&self) -> Uuid {
        *self.miq_server_guid.get_or_init(Uuid::new_v4)
    }

    /// Returns true if basic credentials are sent with requests.
    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    /// Replaces the collection config.
    pub fn set_collection_config(&mut self, config: ApiServerConfig) {
        self.collection_config = Some(config);
    }

    /// Returns the loaded collection config.
    pub fn collection_config(&self) -> SpecResult<&ApiServerConfig> {
        self.collection_config
            .as_ref()
            .ok_or(SpecError::MissingCollectionConfig)
    }

    /// Returns the identifier guarding a `post` action.
    pub fn action_identifier(
        &self,
        collection: &str,
        action: &str,
        selection: &ActionSelection,
    ) -> SpecResult<String> {
        self.collection_config()?.action_identifier(collection, action, selection)
    }

    /// Returns the identifier guarding a collection-level `post` action.
    pub fn collection_action_identifier(
        &self,
        collection: &str,
        action: &str,
    ) -> SpecResult<String> {
        self.collection_config()?.collection_action_identifier(collection, action)
    }

    /// Returns the identifier guarding a subcollection `post` action.
    pub fn subcollection_action_identifier(
        &self,
        collection: &str,
        subcollection: &str,
        action: &str,
    ) -> SpecResult<String> {
        self.collection_config()?.subcollection_action_identifier(collection, subcollection, action)
    }
}
