#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use chrono::{DateTime, TimeDelta, Utc};
use package_cleaner::RegistryClient;
use serde_json::{Value, json};
use url::Url;

pub const TOKEN: &str = "test-token";
pub const ORG: &str = "acme";
pub const REPO: &str = "widgets";

/// Routes of the fake registry that can be told to fail.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Route {
    Releases,
    Packages,
    Versions,
    Delete,
}

/// In-process stand-in for the GitHub packages API.
#[derive(Clone)]
pub struct FakeRegistry {
    pub now: DateTime<Utc>,
    releases: Vec<String>,
    packages: Vec<Value>,
    versions: HashMap<String, Vec<Value>>,
    failure: Option<(Route, StatusCode)>,
    deleted: Arc<Mutex<Vec<String>>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self {
            now: Utc::now(),
            releases: Vec::new(),
            packages: Vec::new(),
            versions: HashMap::new(),
            failure: None,
            deleted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn release(mut self, tag: &str) -> Self {
        self.releases.push(tag.to_string());
        self
    }

    pub fn package(mut self, name: &str, repository: &str) -> Self {
        let id = self.packages.len() as u64 + 100;
        self.packages.push(json!({
            "id": id,
            "name": name,
            "package_type": "maven",
            "repository": { "name": repository },
        }));
        self.versions.entry(name.to_string()).or_default();
        self
    }

    pub fn version(mut self, package: &str, id: u64, name: &str, age_days: i64) -> Self {
        let created_at = self.now - TimeDelta::days(age_days);
        self.versions
            .entry(package.to_string())
            .or_default()
            .push(json!({
                "id": id,
                "name": name,
                "created_at": created_at.to_rfc3339(),
            }));
        self
    }

    pub fn failing(mut self, route: Route, status: StatusCode) -> Self {
        self.failure = Some((route, status));
        self
    }

    /// `{package}/{version id}` of every delete received, sorted.
    pub fn deleted(&self) -> Vec<String> {
        let mut deleted = self.deleted.lock().unwrap().clone();
        deleted.sort();
        deleted
    }

    pub async fn serve(&self) -> Url {
        let app = Router::new()
            .route("/repos/{org}/{repo}/releases", get(releases))
            .route("/orgs/{org}/packages", get(packages))
            .route(
                "/orgs/{org}/packages/{package_type}/{name}/versions",
                get(versions),
            )
            .route(
                "/orgs/{org}/packages/{package_type}/{name}/versions/{id}",
                delete(delete_version),
            )
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Url::parse(&format!("http://{addr}")).unwrap()
    }

    fn check(&self, route: Route, headers: &HeaderMap) -> Result<(), Response> {
        if header(headers, "authorization") != Some(format!("Bearer {TOKEN}").as_str()) {
            return Err(message(StatusCode::UNAUTHORIZED, "Bad credentials"));
        }
        if header(headers, "accept") != Some("application/vnd.github+json")
            || header(headers, "x-github-api-version") != Some("2022-11-28")
            || header(headers, "user-agent").is_none()
        {
            return Err(message(StatusCode::BAD_REQUEST, "Missing API headers"));
        }
        if let Some((failing, status)) = self.failure
            && failing == route
        {
            return Err(message(status, "Must have admin rights to Repository."));
        }
        Ok(())
    }
}

pub fn client(base_url: Url) -> RegistryClient {
    RegistryClient::new(base_url, TOKEN, ORG, REPO).unwrap()
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

async fn releases(
    State(registry): State<FakeRegistry>,
    headers: HeaderMap,
    Path((org, repo)): Path<(String, String)>,
) -> Response {
    if let Err(response) = registry.check(Route::Releases, &headers) {
        return response;
    }
    if org != ORG || repo != REPO {
        return message(StatusCode::NOT_FOUND, "Not Found");
    }
    let body: Vec<Value> = registry
        .releases
        .iter()
        .map(|tag| json!({ "tag_name": tag, "draft": false }))
        .collect();
    Json(body).into_response()
}

async fn packages(
    State(registry): State<FakeRegistry>,
    headers: HeaderMap,
    Path(org): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = registry.check(Route::Packages, &headers) {
        return response;
    }
    if org != ORG {
        return message(StatusCode::NOT_FOUND, "Not Found");
    }
    let package_type = query.get("package_type").map(String::as_str);
    let body: Vec<Value> = registry
        .packages
        .iter()
        .filter(|p| package_type == p["package_type"].as_str())
        .cloned()
        .collect();
    Json(body).into_response()
}

async fn versions(
    State(registry): State<FakeRegistry>,
    headers: HeaderMap,
    Path((org, _package_type, name)): Path<(String, String, String)>,
) -> Response {
    if let Err(response) = registry.check(Route::Versions, &headers) {
        return response;
    }
    match registry.versions.get(&name) {
        Some(versions) if org == ORG => Json(versions.clone()).into_response(),
        _ => message(StatusCode::NOT_FOUND, "Package not found."),
    }
}

async fn delete_version(
    State(registry): State<FakeRegistry>,
    headers: HeaderMap,
    Path((_org, _package_type, name, id)): Path<(String, String, String, String)>,
) -> Response {
    if let Err(response) = registry.check(Route::Delete, &headers) {
        return response;
    }
    registry.deleted.lock().unwrap().push(format!("{name}/{id}"));
    StatusCode::NO_CONTENT.into_response()
}
