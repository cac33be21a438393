//! A minimal in-process API for exercising sessions end to end.
//!
//! Serves the entry point, token authentication, a `vms` collection with
//! actions and tagging, and an always-empty `hosts` collection. Requests
//! are authenticated with basic credentials or an `X-Auth-Token`, and
//! guarded by the product features of the user's role.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use uuid::Uuid;

use super::seeder::StubStore;

/// Host prefix of every href the stub API returns.
pub const HOST: &str = "http://localhost";

/// Tag categories the stub API accepts.
pub const TAG_CATEGORIES: &[&str] = &["department", "environment", "location"];

#[derive(Clone)]
struct StubState {
    store: StubStore,
    entrypoint: String,
}

impl StubState {
    fn href(&self, path: &str) -> String {
        format!("{}{}/{}", HOST, self.entrypoint, path)
    }

    fn vm_href(&self, id: u64) -> String {
        self.href(&format!("vms/{}", id))
    }

    fn task_href(&self, id: u64) -> String {
        self.href(&format!("tasks/{}", id))
    }
}

/// Builds the stub API router mounted at `entrypoint`.
pub fn create_routes(store: StubStore, entrypoint: &str) -> Router {
    let state = StubState {
        store,
        entrypoint: entrypoint.to_string(),
    };

    Router::new()
        .route(entrypoint, get(entrypoint_handler))
        .route(&format!("{}/auth", entrypoint), get(auth_handler))
        .route(
            &format!("{}/vms", entrypoint),
            get(list_vms).post(vms_collection_action),
        )
        .route(
            &format!("{}/vms/{{id}}", entrypoint),
            get(show_vm).post(vm_resource_action).delete(delete_vm),
        )
        .route(&format!("{}/vms/{{id}}/tags", entrypoint), post(tag_vm))
        .route(&format!("{}/hosts", entrypoint), get(list_hosts))
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

fn error_response(status: StatusCode, kind: &str, message: impl Into<String>) -> Response {
    let message = message.into();
    (
        status,
        Json(json!({
            "error": {
                "kind": kind,
                "message": message,
                "klass": "Api::Error"
            }
        })),
    )
        .into_response()
}

fn unauthorized() -> Response {
    error_response(
        StatusCode::UNAUTHORIZED,
        "unauthorized",
        "Authentication failed",
    )
}

fn vm_not_found(id: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "not_found",
        format!("Couldn't find Vm with 'id'={}", id),
    )
}

fn bad_request(message: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, "bad_request", message)
}

// ============================================================================
// Authentication
// ============================================================================

/// Resolves the requesting user's role id.
fn authenticate(state: &StubState, headers: &HeaderMap) -> Result<String, Response> {
    let data = state.store.data();

    let user_id = if let Some(token) = headers.get("x-auth-token") {
        let token = token.to_str().map_err(|_| unauthorized())?;
        data.tokens.get(token).cloned().ok_or_else(unauthorized)?
    } else {
        let (userid, password) = basic_credentials(headers).ok_or_else(unauthorized)?;
        let (id, user) = data
            .users
            .iter()
            .find(|(_, u)| u.userid == userid)
            .ok_or_else(unauthorized)?;
        if !bcrypt::verify(&password, &user.password_digest).unwrap_or(false) {
            return Err(unauthorized());
        }
        id.clone()
    };

    let user = data.users.get(&user_id).ok_or_else(unauthorized)?;
    let group = data.groups.get(&user.group_id).ok_or_else(unauthorized)?;
    Ok(group.role_id.clone())
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded).ok()?).ok()?;
    let (userid, password) = decoded.split_once(':')?;
    Some((userid.to_string(), password.to_string()))
}

/// Authenticates the request and checks the role holds `feature`.
fn authorize(state: &StubState, headers: &HeaderMap, feature: &str) -> Result<(), Response> {
    let role_id = authenticate(state, headers)?;
    if state
        .store
        .role_features(&role_id)
        .iter()
        .any(|f| f == feature)
    {
        Ok(())
    } else {
        Err(error_response(
            StatusCode::FORBIDDEN,
            "forbidden",
            format!("Use of the {} feature is forbidden", feature),
        ))
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn entrypoint_handler(State(state): State<StubState>, headers: HeaderMap) -> Response {
    if let Err(response) = authenticate(&state, &headers) {
        return response;
    }

    Json(json!({
        "name": "API",
        "description": "REST API",
        "version": "3.0.0",
        "collections": [
            {"name": "vms", "href": state.href("vms"), "description": "Virtual Machines"},
            {"name": "hosts", "href": state.href("hosts"), "description": "Hosts"}
        ]
    }))
    .into_response()
}

async fn auth_handler(State(state): State<StubState>, headers: HeaderMap) -> Response {
    if headers.contains_key("x-auth-token") {
        return unauthorized();
    }
    if let Err(response) = authenticate(&state, &headers) {
        return response;
    }
    let Some((userid, _)) = basic_credentials(&headers) else {
        return unauthorized();
    };

    let mut data = state.store.data();
    let Some(user_id) = data
        .users
        .iter()
        .find(|(_, u)| u.userid == userid)
        .map(|(id, _)| id.clone())
    else {
        return unauthorized();
    };

    let token = Uuid::new_v4().simple().to_string();
    data.tokens.insert(token.clone(), user_id);

    Json(json!({ "auth_token": token, "token_ttl": 600 })).into_response()
}

async fn list_vms(
    State(state): State<StubState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = authorize(&state, &headers, "vm_show_list") {
        return response;
    }

    let expand = params.get("expand").is_some_and(|e| e == "resources");
    let limit = match params.get("limit").map(|l| l.parse::<usize>()) {
        Some(Ok(limit)) => Some(limit),
        Some(Err(_)) => return bad_request("Invalid limit parameter"),
        None => None,
    };

    let data = state.store.data();
    let count = data.vms.len();
    let resources: Vec<Value> = data
        .vms
        .iter()
        .take(limit.unwrap_or(count))
        .map(|(id, vm)| {
            if expand {
                let mut vm = vm.clone();
                vm["href"] = json!(state.vm_href(*id));
                vm
            } else {
                json!({ "href": state.vm_href(*id) })
            }
        })
        .collect();

    Json(json!({
        "name": "vms",
        "count": count,
        "subcount": resources.len(),
        "resources": resources
    }))
    .into_response()
}

async fn list_hosts(State(state): State<StubState>, headers: HeaderMap) -> Response {
    if let Err(response) = authenticate(&state, &headers) {
        return response;
    }

    Json(json!({
        "name": "hosts",
        "count": 0,
        "subcount": 0,
        "resources": []
    }))
    .into_response()
}

async fn show_vm(
    State(state): State<StubState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = authorize(&state, &headers, "vm_show") {
        return response;
    }

    let data = state.store.data();
    match id.parse::<u64>().ok().and_then(|n| data.vms.get(&n).map(|vm| (n, vm))) {
        Some((n, vm)) => {
            let mut vm = vm.clone();
            vm["href"] = json!(state.vm_href(n));
            Json(vm).into_response()
        }
        None => vm_not_found(&id),
    }
}

async fn delete_vm(
    State(state): State<StubState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = authorize(&state, &headers, "vm_delete") {
        return response;
    }

    let mut data = state.store.data();
    match id.parse::<u64>().ok().and_then(|n| data.vms.remove(&n)) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => vm_not_found(&id),
    }
}

fn parse_body(body: &Bytes) -> Result<(String, Value), Response> {
    let body: Value =
        serde_json::from_slice(body).map_err(|e| bad_request(format!("Invalid JSON: {}", e)))?;
    let action = body
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_request("Missing action"))?
        .to_string();
    Ok((action, body))
}

/// Collects `resources`, or the single `resource`, of an action body.
fn body_resources(body: &Value) -> Vec<Value> {
    match (body.get("resources"), body.get("resource")) {
        (Some(Value::Array(items)), _) => items.clone(),
        (_, Some(resource)) => vec![resource.clone()],
        _ => Vec::new(),
    }
}

fn start_result(state: &StubState, id: u64) -> Value {
    let mut data = state.store.data();
    let Some(name) = data
        .vms
        .get(&id)
        .and_then(|vm| vm.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
    else {
        return json!({
            "success": false,
            "message": format!("Couldn't find Vm with 'id'={}", id),
            "href": state.vm_href(id)
        });
    };

    let task_id = data.allocate_id();
    json!({
        "success": true,
        "message": format!("VM id:{} name:'{}' starting", id, name),
        "task_id": task_id.to_string(),
        "task_href": state.task_href(task_id),
        "href": state.vm_href(id)
    })
}

async fn vms_collection_action(
    State(state): State<StubState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let (action, body) = match parse_body(&body) {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };

    match action.as_str() {
        "start" => {
            if let Err(response) = authorize(&state, &headers, "vm_start") {
                return response;
            }
            let results: Vec<Value> = body_resources(&body)
                .iter()
                .map(|resource| {
                    let id = resource
                        .get("href")
                        .and_then(Value::as_str)
                        .and_then(|href| href.rsplit('/').next())
                        .and_then(|id| id.parse::<u64>().ok())
                        .unwrap_or(0);
                    start_result(&state, id)
                })
                .collect();
            Json(json!({ "results": results })).into_response()
        }
        "create" => {
            if let Err(response) = authorize(&state, &headers, "vm_create") {
                return response;
            }
            let resources = body_resources(&body);
            if resources.is_empty() {
                return bad_request("No resources specified for create");
            }
            let mut results = Vec::with_capacity(resources.len());
            for resource in &resources {
                let Some(name) = resource.get("name").and_then(Value::as_str) else {
                    return bad_request("Missing name for the vms resource specified");
                };
                let id = state.store.add_vm(name);
                results.push(json!({
                    "id": id,
                    "name": name,
                    "href": state.vm_href(id)
                }));
            }
            Json(json!({ "results": results })).into_response()
        }
        other => bad_request(format!(
            "Unsupported Action {} for the vms resource specified",
            other
        )),
    }
}

async fn vm_resource_action(
    State(state): State<StubState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let (action, _) = match parse_body(&body) {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };
    if action != "start" {
        return bad_request(format!(
            "Unsupported Action {} for the vms resource specified",
            action
        ));
    }
    if let Err(response) = authorize(&state, &headers, "vm_start") {
        return response;
    }

    let found = id
        .parse::<u64>()
        .ok()
        .filter(|n| state.store.data().vms.contains_key(n));
    match found {
        Some(n) => Json(start_result(&state, n)).into_response(),
        None => vm_not_found(&id),
    }
}

async fn tag_vm(
    State(state): State<StubState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let (action, body) = match parse_body(&body) {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };
    if action != "assign" {
        return bad_request(format!(
            "Unsupported Action {} for the tags subcollection specified",
            action
        ));
    }
    if let Err(response) = authorize(&state, &headers, "vm_tag") {
        return response;
    }

    let Some(vm_id) = id
        .parse::<u64>()
        .ok()
        .filter(|n| state.store.data().vms.contains_key(n))
    else {
        return vm_not_found(&id);
    };

    let href = state.vm_href(vm_id);
    let mut data = state.store.data();
    let results: Vec<Value> = body_resources(&body)
        .iter()
        .map(|tag| {
            let category = tag.get("category").and_then(Value::as_str).unwrap_or("");
            let name = tag.get("name").and_then(Value::as_str).unwrap_or("");
            let success = TAG_CATEGORIES.contains(&category) && !name.is_empty();
            let message = if success {
                data.tags
                    .entry(vm_id)
                    .or_default()
                    .push((category.to_string(), name.to_string()));
                format!("Assigning Tag: category:'{}' name:'{}'", category, name)
            } else {
                format!("Tag category '{}' not found", category)
            };
            json!({
                "success": success,
                "message": message,
                "href": href,
                "tag_category": category,
                "tag_name": name
            })
        })
        .collect();

    Json(json!({ "results": results })).into_response()
}
