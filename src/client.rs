use chrono::{DateTime, FixedOffset};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::RegistryError;
use crate::types::{Package, Version};

pub const GITHUB_JSON: &str = "application/vnd.github+json";
pub const API_VERSION_HEADER: &str = "x-github-api-version";
pub const API_VERSION: &str = "2022-11-28";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Typed access to the releases and packages of one GitHub repository.
///
/// Responses are expected to fit on a single page; pagination links are ignored.
#[derive(Clone)]
pub struct RegistryClient {
    http: Client,
    base_url: Url,
    organisation: String,
    repository: String,
}

impl RegistryClient {
    pub fn new(
        base_url: Url,
        token: &str,
        organisation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        if base_url.cannot_be_a_base() {
            return Err(RegistryError::InvalidUrl(base_url));
        }

        let mut authorization = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| RegistryError::InvalidToken)?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(GITHUB_JSON));
        headers.insert(header::AUTHORIZATION, authorization);
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(RegistryError::Client)?;

        Ok(Self {
            http,
            base_url,
            organisation: organisation.into(),
            repository: repository.into(),
        })
    }

    pub fn organisation(&self) -> &str {
        &self.organisation
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Tag names of every release of the repository.
    pub async fn list_releases(&self) -> Result<Vec<String>, RegistryError> {
        let url = self.endpoint(&["repos", &self.organisation, &self.repository, "releases"])?;
        let releases: Vec<ReleaseEntry> = self.get_json(url).await?;
        Ok(releases.into_iter().map(|r| r.tag_name).collect())
    }

    /// Packages of the given type owned by the organisation and linked to the repository.
    pub async fn list_packages(&self, package_type: &str) -> Result<Vec<Package>, RegistryError> {
        let mut url = self.endpoint(&["orgs", &self.organisation, "packages"])?;
        url.query_pairs_mut()
            .append_pair("package_type", package_type);

        let packages: Vec<PackageEntry> = self.get_json(url).await?;
        Ok(packages
            .into_iter()
            .filter_map(|entry| {
                let Some(repository) = entry.repository else {
                    tracing::debug!("Skipping package {} without repository", entry.name);
                    return None;
                };
                if repository.name != self.repository {
                    tracing::debug!(
                        "Skipping package {} from repository {}",
                        entry.name,
                        repository.name
                    );
                    return None;
                }
                Some(Package {
                    id: entry.id.into(),
                    name: entry.name,
                    package_type: entry.package_type,
                    repository: repository.name,
                })
            })
            .collect())
    }

    pub async fn list_versions(
        &self,
        package_name: &str,
        package_type: &str,
    ) -> Result<Vec<Version>, RegistryError> {
        let url = self.endpoint(&[
            "orgs",
            &self.organisation,
            "packages",
            package_type,
            package_name,
            "versions",
        ])?;
        let versions: Vec<VersionEntry> = self.get_json(url).await?;
        Ok(versions
            .into_iter()
            .map(|entry| Version {
                id: entry.id.into(),
                name: entry.name,
                created_at: entry.created_at.to_utc(),
            })
            .collect())
    }

    pub async fn delete_version(
        &self,
        package_type: &str,
        package_name: &str,
        version_id: &str,
    ) -> Result<(), RegistryError> {
        let url = self.endpoint(&[
            "orgs",
            &self.organisation,
            "packages",
            package_type,
            package_name,
            "versions",
            version_id,
        ])?;
        self.send(Method::DELETE, url).await?;
        Ok(())
    }

    /// Appends percent-encoded path segments to the base url, keeping any path prefix
    /// it carries (e.g. `/api/v3` on GitHub Enterprise).
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RegistryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RegistryError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, RegistryError> {
        let response = self.send(Method::GET, url.clone()).await?;
        response
            .json::<T>()
            .await
            .map_err(|source| RegistryError::Decode { url, source })
    }

    async fn send(&self, method: Method, url: Url) -> Result<Response, RegistryError> {
        tracing::debug!("{} {}", method, url);

        let response = match self.http.request(method.clone(), url.clone()).send().await {
            Ok(response) => response,
            Err(source) => {
                return Err(RegistryError::Transport {
                    method,
                    url,
                    source,
                });
            }
        };

        let status = response.status();
        tracing::debug!("{} {} returned {}", method, url, status);
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(RegistryError::Status {
            method,
            url,
            status,
            body,
        })
    }
}

#[derive(Deserialize)]
struct ReleaseEntry {
    tag_name: String,
}

#[derive(Deserialize)]
struct PackageEntry {
    id: Id,
    name: String,
    package_type: String,
    repository: Option<RepositoryEntry>,
}

#[derive(Deserialize)]
struct RepositoryEntry {
    name: String,
}

#[derive(Deserialize)]
struct VersionEntry {
    id: Id,
    name: String,
    created_at: DateTime<FixedOffset>,
}

/// GitHub sends numeric ids; accept strings as well and carry both as text.
#[derive(Deserialize)]
#[serde(untagged)]
enum Id {
    Number(u64),
    Text(String),
}

impl From<Id> for String {
    fn from(id: Id) -> String {
        match id {
            Id::Number(n) => n.to_string(),
            Id::Text(s) => s,
        }
    }
}
