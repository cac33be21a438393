//! Response assertions.
//!
//! Every assertion panics with the expected and actual values on mismatch,
//! failing the enclosing test.

use http::StatusCode;
use serde_json::Value;

use crate::matchers::{AttrExpectations, JsonKind, ValueMatcher};
use crate::response::ApiResponse;

/// Expectations for a single action result.
#[derive(Debug, Clone, Default)]
pub struct ActionExpectation {
    /// Expected `success` value.
    pub success: Option<bool>,
    /// Pattern the `message` must match.
    pub message: Option<String>,
    /// Pattern the `href` must match.
    pub href: Option<String>,
    /// Whether the result must represent a task.
    pub task: bool,
}

impl ActionExpectation {
    /// Creates an expectation that only checks the status code.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects the given `success` value.
    pub fn success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    /// Expects `message` to match the pattern.
    pub fn message(mut self, pattern: impl Into<String>) -> Self {
        self.message = Some(pattern.into());
        self
    }

    /// Expects `href` to match the pattern.
    pub fn href(mut self, pattern: impl Into<String>) -> Self {
        self.href = Some(pattern.into());
        self
    }

    /// Expects the result to represent a task.
    pub fn task(mut self) -> Self {
        self.task = true;
        self
    }
}

/// The expected outcome of tagging one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagResult {
    /// Expected `success` value.
    pub success: bool,
    /// Pattern the `href` must match.
    pub href: String,
    /// Expected `tag_category`.
    pub tag_category: String,
    /// Expected `tag_name`.
    pub tag_name: String,
}

/// Returns true if any resource has `key` ending with `suffix`.
pub fn resources_include_suffix(resources: &[Value], key: &str, suffix: &str) -> bool {
    resources.iter().any(|r| {
        r.get(key)
            .and_then(Value::as_str)
            .is_some_and(|v| v.ends_with(suffix))
    })
}

/// Returns true if any resource has `key` equal to `value`.
pub fn resources_include(resources: &[Value], key: &str, value: &Value) -> bool {
    resources.iter().any(|r| r.get(key).unwrap_or(&Value::Null) == value)
}

/// Asserts that `result` has every expected attribute.
pub fn expect_result_to_match_hash(result: &Value, attrs: &AttrExpectations) {
    for (key, matcher) in attrs.iter() {
        let actual = expect_key(result, key);
        assert!(
            matcher.matches(actual),
            "Expected {} to match {}, got {}",
            key,
            matcher,
            actual
        );
    }
}

/// Asserts that `result` describes an asynchronous task.
pub fn expect_result_to_represent_task(result: &Value) {
    expect_key(result, "task_id");
    expect_key(result, "task_href");
}

fn expect_key<'a>(value: &'a Value, key: &str) -> &'a Value {
    match value.get(key) {
        Some(v) => v,
        None => panic!("Expected key {:?} in {}", key, value),
    }
}

/// Compares two lists ignoring order.
fn same_elements(actual: &[Value], expected: &[Value]) -> bool {
    if actual.len() != expected.len() {
        return false;
    }
    let mut remaining: Vec<&Value> = expected.iter().collect();
    actual.iter().all(|a| match remaining.iter().position(|e| *e == a) {
        Some(index) => {
            remaining.swap_remove(index);
            true
        }
        None => false,
    })
}

fn sorted_keys<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut keys: Vec<&str> = keys.collect();
    keys.sort_unstable();
    keys
}

impl ApiResponse {
    fn expect_status(&self, expected: StatusCode) {
        assert_eq!(
            self.code(),
            expected.as_u16(),
            "Expected status {}, got {} ({}): {}",
            expected,
            self.code(),
            self.status(),
            self.result()
        );
    }

    /// Returns the array under `collection`, asserting it exists.
    pub fn result_collection(&self, collection: &str) -> &[Value] {
        match expect_key(self.result(), collection) {
            Value::Array(items) => items.as_slice(),
            other => panic!("Expected {} to be an array, got {}", collection, other),
        }
    }

    // =========================================================================
    // Status codes
    // =========================================================================

    /// Asserts a `200 OK` response.
    pub fn expect_request_success(&self) {
        self.expect_status(StatusCode::OK);
    }

    /// Asserts a `204 No Content` response.
    pub fn expect_request_success_with_no_content(&self) {
        self.expect_status(StatusCode::NO_CONTENT);
    }

    /// Asserts a `400 Bad Request` response, optionally with an
    /// `error.message` matching the pattern.
    pub fn expect_bad_request(&self, error_message: Option<&str>) {
        self.expect_status(StatusCode::BAD_REQUEST);
        let Some(pattern) = error_message.filter(|m| !m.is_empty()) else {
            return;
        };

        let error = expect_key(self.result(), "error");
        let message = error.get("message").unwrap_or(&Value::Null);
        let matcher = ValueMatcher::matching(pattern);
        assert!(
            matcher.matches(message),
            "Expected error message to match {}, got {}",
            matcher,
            message
        );
    }

    /// Asserts a `401 Unauthorized` response.
    pub fn expect_user_unauthorized(&self) {
        self.expect_status(StatusCode::UNAUTHORIZED);
    }

    /// Asserts a `403 Forbidden` response.
    pub fn expect_request_forbidden(&self) {
        self.expect_status(StatusCode::FORBIDDEN);
    }

    /// Asserts a `404 Not Found` response.
    pub fn expect_resource_not_found(&self) {
        self.expect_status(StatusCode::NOT_FOUND);
    }

    // =========================================================================
    // Resource collections
    // =========================================================================

    /// Asserts that, for each key, the values across the collection are
    /// exactly the given values in any order.
    pub fn expect_result_resources_to_include_data(
        &self,
        collection: &str,
        data: &[(&str, Vec<Value>)],
    ) {
        let resources = self.result_collection(collection);
        for (key, values) in data {
            assert_eq!(
                resources.len(),
                values.len(),
                "Expected {} {}, got {}",
                values.len(),
                collection,
                resources.len()
            );
            let actual: Vec<Value> = resources
                .iter()
                .map(|r| r.get(*key).cloned().unwrap_or(Value::Null))
                .collect();
            assert!(
                same_elements(&actual, values),
                "Expected {} values {:?} in any order, got {:?}",
                key,
                values,
                actual
            );
        }
    }

    /// Asserts that the collection holds exactly one resource per href,
    /// matching by href suffix.
    pub fn expect_result_resources_to_include_hrefs(&self, collection: &str, hrefs: &[&str]) {
        let resources = self.result_collection(collection);
        assert_eq!(
            resources.len(),
            hrefs.len(),
            "Expected {} {}, got {}",
            hrefs.len(),
            collection,
            resources.len()
        );
        for href in hrefs {
            assert!(
                resources_include_suffix(resources, "href", href),
                "Expected a resource in {} with href ending in {}",
                collection,
                href
            );
        }
    }

    /// Asserts that the n-th resource's `key` matches the n-th value.
    pub fn expect_result_resources_to_match_key_data(
        &self,
        collection: &str,
        key: &str,
        values: &[Value],
    ) {
        let resources = self.result_collection(collection);
        assert_eq!(
            resources.len(),
            values.len(),
            "Expected {} {}, got {}",
            values.len(),
            collection,
            resources.len()
        );
        for (resource, value) in resources.iter().zip(values) {
            let actual = expect_key(resource, key);
            let matcher = ValueMatcher::matching(value.clone());
            assert!(
                matcher.matches(actual),
                "Expected {} to match {}, got {}",
                key,
                matcher,
                actual
            );
        }
    }

    /// Asserts that every resource's `key` matches the pattern.
    ///
    /// A pattern that is not a valid regex must match exactly.
    pub fn expect_result_resource_keys_to_match_pattern(
        &self,
        collection: &str,
        key: &str,
        pattern: &str,
    ) {
        let matcher = ValueMatcher::matching(pattern);
        let resources = self.result_collection(collection);
        assert!(
            resources
                .iter()
                .all(|r| matcher.matches(r.get(key).unwrap_or(&Value::Null))),
            "Expected every {} {} to match {}",
            collection,
            key,
            matcher
        );
    }

    /// Asserts that the result has every key.
    pub fn expect_result_to_have_keys(&self, keys: &[&str]) {
        for key in keys {
            expect_key(self.result(), key);
        }
    }

    /// Asserts that the n-th resource of the collection matches the n-th
    /// expectation, with one expectation per resource.
    pub fn expect_results_to_match_hash(&self, collection: &str, expected: &[AttrExpectations]) {
        let resources = self.result_collection(collection);
        assert_eq!(
            resources.len(),
            expected.len(),
            "Expected {} {}, got {}",
            expected.len(),
            collection,
            resources.len()
        );
        for (actual, attrs) in resources.iter().zip(expected) {
            expect_result_to_match_hash(actual, attrs);
        }
    }

    /// Asserts that the n-th entry of `resources` matches the n-th
    /// expectation.
    pub fn expect_result_resources_to_match_hash(&self, expected: &[AttrExpectations]) {
        self.expect_results_to_match_hash("resources", expected);
    }

    /// Asserts that every resource's `key` is of the given JSON kind.
    pub fn expect_result_resource_keys_to_be_like_klass(
        &self,
        collection: &str,
        key: &str,
        kind: JsonKind,
    ) {
        let resources = self.result_collection(collection);
        assert!(
            resources
                .iter()
                .all(|r| kind.is_kind_of(r.get(key).unwrap_or(&Value::Null))),
            "Expected every {} {} to be {:?}",
            collection,
            key,
            kind
        );
    }

    /// Asserts that every resource has every key.
    pub fn expect_result_resources_to_include_keys(&self, collection: &str, keys: &[&str]) {
        let resources = self.result_collection(collection);
        for key in keys {
            assert!(
                resources.iter().all(|r| r.get(*key).is_some()),
                "Expected every {} to have key {:?}",
                collection,
                key
            );
        }
    }

    /// Asserts that every resource has exactly the given keys.
    pub fn expect_result_resources_to_have_only_keys(&self, collection: &str, keys: &[&str]) {
        let expected = sorted_keys(keys.iter().copied());
        let resources = self.result_collection(collection);
        for resource in resources {
            let actual = match resource.as_object() {
                Some(map) => sorted_keys(map.keys().map(String::as_str)),
                None => Vec::new(),
            };
            assert_eq!(
                actual, expected,
                "Expected {} to have only keys {:?}",
                collection, expected
            );
        }
    }

    /// Asserts that every resource's `key` matches the pattern.
    pub fn expect_results_match_key_pattern(&self, collection: &str, key: &str, pattern: &str) {
        self.expect_result_resource_keys_to_match_pattern(collection, key, pattern);
    }

    // =========================================================================
    // Primary result constructs
    // =========================================================================

    /// Asserts a successful query of `collection` that returned nothing.
    pub fn expect_empty_query_result(&self, collection: impl AsRef<str>) {
        self.expect_request_success();
        self.expect_collection_name(collection.as_ref());
        let resources = self.result_collection("resources");
        assert!(
            resources.is_empty(),
            "Expected no resources, got {}",
            resources.len()
        );
    }

    /// Asserts a successful query of `collection` returning `subcount`
    /// resources, out of `count` when given.
    pub fn expect_query_result(
        &self,
        collection: impl AsRef<str>,
        subcount: usize,
        count: Option<usize>,
    ) {
        self.expect_request_success();
        self.expect_collection_name(collection.as_ref());

        let actual_subcount = self.result().get("subcount").and_then(Value::as_u64);
        assert_eq!(
            actual_subcount,
            Some(subcount as u64),
            "Expected subcount {}, got {:?}",
            subcount,
            actual_subcount
        );

        let resources = self.result_collection("resources");
        assert_eq!(
            resources.len(),
            subcount,
            "Expected {} resources, got {}",
            subcount,
            resources.len()
        );

        if let Some(count) = count {
            let actual_count = self.result().get("count").and_then(Value::as_u64);
            assert_eq!(
                actual_count,
                Some(count as u64),
                "Expected count {}, got {:?}",
                count,
                actual_count
            );
        }
    }

    fn expect_collection_name(&self, collection: &str) {
        let name = expect_key(self.result(), "name");
        assert_eq!(
            name.as_str(),
            Some(collection),
            "Expected collection name {}, got {}",
            collection,
            name
        );
    }

    /// Asserts a successful single-resource query with the given
    /// attributes.
    pub fn expect_single_resource_query(&self, attrs: impl Into<AttrExpectations>) {
        self.expect_request_success();
        expect_result_to_match_hash(self.result(), &attrs.into());
    }

    /// Asserts a successful single action result.
    pub fn expect_single_action_result(&self, expected: &ActionExpectation) {
        self.expect_request_success();

        if let Some(success) = expected.success {
            let actual = expect_key(self.result(), "success");
            assert_eq!(
                actual,
                &Value::Bool(success),
                "Expected success {}, got {}",
                success,
                actual
            );
        }

        if let Some(pattern) = &expected.message {
            let actual = expect_key(self.result(), "message");
            let matcher = ValueMatcher::matching(pattern.as_str());
            assert!(
                matcher.matches(actual),
                "Expected message to match {}, got {}",
                matcher,
                actual
            );
        }

        if let Some(pattern) = &expected.href {
            let actual = expect_key(self.result(), "href");
            let matcher = ValueMatcher::matching(pattern.as_str());
            assert!(
                matcher.matches(actual),
                "Expected href to match {}, got {}",
                matcher,
                actual
            );
        }

        if expected.task {
            expect_result_to_represent_task(self.result());
        }
    }

    /// Asserts `count` successful action results, each a task when `task`
    /// is set.
    pub fn expect_multiple_action_result(&self, count: usize, task: bool) {
        self.expect_request_success();
        let results = self.result_collection("results");
        assert_eq!(
            results.len(),
            count,
            "Expected {} results, got {}",
            count,
            results.len()
        );
        assert!(
            results
                .iter()
                .all(|r| r.get("success").and_then(Value::as_bool).unwrap_or(false)),
            "Expected every result to succeed: {:?}",
            results
        );

        if task {
            results.iter().for_each(expect_result_to_represent_task);
        }
    }

    /// Asserts the per-resource outcome of a tagging request.
    pub fn expect_tagging_result(&self, expected: &[TagResult]) {
        self.expect_request_success();
        let results = self.result_collection("results");
        assert_eq!(
            results.len(),
            expected.len(),
            "Expected {} tagging results, got {}",
            expected.len(),
            results.len()
        );

        for (result, tag) in results.iter().zip(expected) {
            assert_eq!(
                result.get("success"),
                Some(&Value::Bool(tag.success)),
                "Expected tagging success {} for {}",
                tag.success,
                tag.href
            );
            let href = result.get("href").unwrap_or(&Value::Null);
            let matcher = ValueMatcher::matching(tag.href.as_str());
            assert!(
                matcher.matches(href),
                "Expected href to match {}, got {}",
                matcher,
                href
            );
            assert_eq!(
                result.get("tag_category").and_then(Value::as_str),
                Some(tag.tag_category.as_str()),
                "Expected tag_category {}",
                tag.tag_category
            );
            assert_eq!(
                result.get("tag_name").and_then(Value::as_str),
                Some(tag.tag_name.as_str()),
                "Expected tag_name {}",
                tag.tag_name
            );
        }
    }
}
