use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;

use crate::client::RegistryClient;
use crate::error::RegistryError;
use crate::retention::versions_to_delete;
use crate::types::{CleanerConfig, Package, RetentionPolicy, Version};

/// Outcome of cleaning a single package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
    pub package: Package,
    pub versions: Vec<Version>,
    /// Versions the policy selected for deletion.
    pub to_delete: Vec<Version>,
    /// Versions actually deleted; always empty on a dry run.
    pub deleted: Vec<Version>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub releases: Vec<String>,
    pub packages: Vec<PackageReport>,
    pub dry_run: bool,
}

impl CleanupReport {
    pub fn selected_count(&self) -> usize {
        self.packages.iter().map(|p| p.to_delete.len()).sum()
    }

    pub fn deleted_count(&self) -> usize {
        self.packages.iter().map(|p| p.deleted.len()).sum()
    }
}

/// Applies a [`RetentionPolicy`] to every package of one repository.
pub struct Cleaner {
    client: RegistryClient,
    package_type: String,
    policy: RetentionPolicy,
}

impl Cleaner {
    pub fn new(config: &CleanerConfig) -> Result<Self, RegistryError> {
        let client = RegistryClient::new(
            config.api_url.clone(),
            &config.token,
            config.organisation.clone(),
            config.repository.clone(),
        )?;
        Ok(Self::with_client(
            client,
            config.package_type.clone(),
            config.policy,
        ))
    }

    pub fn with_client(
        client: RegistryClient,
        package_type: impl Into<String>,
        policy: RetentionPolicy,
    ) -> Self {
        Self {
            client,
            package_type: package_type.into(),
            policy,
        }
    }

    pub async fn run(&self) -> Result<CleanupReport, RegistryError> {
        self.run_at(Utc::now()).await
    }

    /// Runs the cleanup with `now` as the reference point for version age.
    ///
    /// Packages are processed concurrently, and so are the deletions within a
    /// package. The first failure aborts the run; deletions already issued are
    /// not undone.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<CleanupReport, RegistryError> {
        let releases = self.client.list_releases().await?;
        tracing::info!(
            "Releases found in {} repository: [{}]",
            self.client.repository(),
            releases.join(", ")
        );

        let packages = self.client.list_packages(&self.package_type).await?;
        tracing::info!(
            "Packages found in {} repository: [{}]",
            self.client.repository(),
            join_names(packages.iter().map(|p| p.name.as_str()))
        );

        let protected: HashSet<String> = releases.iter().cloned().collect();
        let reports = try_join_all(
            packages
                .into_iter()
                .map(|package| self.clean_package(package, &protected, now)),
        )
        .await?;

        Ok(CleanupReport {
            releases,
            packages: reports,
            dry_run: self.policy.dry_run,
        })
    }

    async fn clean_package(
        &self,
        package: Package,
        releases: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> Result<PackageReport, RegistryError> {
        let versions = self
            .client
            .list_versions(&package.name, &package.package_type)
            .await?;
        let to_delete = versions_to_delete(&versions, releases, &self.policy, now);

        tracing::info!(
            "Versions found for {}: [{}]",
            package.name,
            join_names(versions.iter().map(|v| v.name.as_str()))
        );

        if self.policy.dry_run {
            tracing::info!(
                "DRY RUN: would be deleted from {}: [{}]",
                package.name,
                join_names(to_delete.iter().map(|v| v.name.as_str()))
            );
            return Ok(PackageReport {
                package,
                versions,
                to_delete,
                deleted: Vec::new(),
            });
        }

        let pkg = &package;
        try_join_all(to_delete.iter().map(|version| async move {
            self.client
                .delete_version(&pkg.package_type, &pkg.name, &version.id)
                .await?;
            tracing::info!("{} {} DELETED", pkg.name, version.name);
            Ok::<_, RegistryError>(())
        }))
        .await?;

        let deleted = to_delete.clone();
        Ok(PackageReport {
            package,
            versions,
            to_delete,
            deleted,
        })
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}
