use chrono::{DateTime, TimeDelta, Utc};
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_PACKAGE_TYPE: &str = "maven";

/// A package published by the organisation and linked to the configured repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub id: String,
    pub name: String,
    pub package_type: String,
    pub repository: String,
}

/// One published version of a [`Package`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Decides which versions of a package may be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub min_versions_to_keep: usize,
    pub max_lifetime: TimeDelta,
    pub dry_run: bool,
}

impl RetentionPolicy {
    pub fn new(min_versions_to_keep: usize, max_lifetime_days: u32, dry_run: bool) -> Self {
        Self {
            min_versions_to_keep,
            max_lifetime: TimeDelta::days(i64::from(max_lifetime_days)),
            dry_run,
        }
    }

    /// Versions created strictly before this instant are expired.
    ///
    /// Clamps to the earliest representable instant when the lifetime reaches
    /// further back than `chrono` can express, so nothing expires.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.max_lifetime)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Everything a cleanup run needs, built once from the command line.
#[derive(Clone)]
pub struct CleanerConfig {
    pub token: String,
    pub organisation: String,
    pub repository: String,
    pub package_type: String,
    pub api_url: Url,
    pub policy: RetentionPolicy,
}
