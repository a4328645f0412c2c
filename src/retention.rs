use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::types::{RetentionPolicy, Version};

/// Selects the versions of one package that the policy allows to delete.
///
/// Versions are ranked newest first by creation time (ties keep the order they were
/// fetched in). The newest `min_versions_to_keep` are always kept, and of the rest
/// only those created strictly before `now - max_lifetime` whose name is not a
/// release tag are returned, newest first.
pub fn versions_to_delete(
    versions: &[Version],
    releases: &HashSet<String>,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Vec<Version> {
    let cutoff = policy.cutoff(now);

    let mut ranked: Vec<&Version> = versions.iter().collect();
    ranked.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    ranked
        .into_iter()
        .skip(policy.min_versions_to_keep)
        .filter(|version| version.created_at < cutoff)
        .filter(|version| !releases.contains(&version.name))
        .cloned()
        .collect()
}
