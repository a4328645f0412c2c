use std::io::IsTerminal as _;

use anyhow::Context as _;
use clap::Parser;
use package_cleaner::types::{DEFAULT_API_URL, DEFAULT_PACKAGE_TYPE};
use package_cleaner::{Cleaner, CleanerConfig, RetentionPolicy};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(clap::Parser)]
#[command(version, about)]
struct Options {
    /// Token used to authenticate against the GitHub API
    token: String,
    /// Organisation owning the packages
    organisation: String,
    /// Repository whose packages are cleaned
    repository: String,
    /// Number of most recent versions always kept per package
    min_versions_to_keep: usize,
    /// Age in days after which a version may be deleted
    package_max_lifetime: u32,
    /// Only report what would be deleted ("true" to enable)
    #[arg(action = clap::ArgAction::Set, value_parser = parse_dry_run, default_value = "false")]
    dry_run: bool,

    /// Type of the packages to clean
    #[arg(long, default_value = DEFAULT_PACKAGE_TYPE)]
    package_type: String,
    /// Base url of the GitHub API
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: Url,

    /// Use verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Only print warnings and errors
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

impl Options {
    fn into_config(self) -> CleanerConfig {
        CleanerConfig {
            token: self.token,
            organisation: self.organisation,
            repository: self.repository,
            package_type: self.package_type,
            api_url: self.api_url,
            policy: RetentionPolicy::new(
                self.min_versions_to_keep,
                self.package_max_lifetime,
                self.dry_run,
            ),
        }
    }
}

/// Anything other than a case-insensitive "true" leaves dry run disabled.
fn parse_dry_run(value: &str) -> Result<bool, std::convert::Infallible> {
    Ok(value.eq_ignore_ascii_case("true"))
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(std::io::stdout().is_terminal())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = Options::parse();
    init_tracing(options.verbose, options.quiet);

    let config = options.into_config();
    tracing::debug!(
        "Cleaning {} packages of {}/{} at {} (keep {}, max age {} days, dry run {})",
        config.package_type,
        config.organisation,
        config.repository,
        config.api_url,
        config.policy.min_versions_to_keep,
        config.policy.max_lifetime.num_days(),
        config.policy.dry_run
    );

    let cleaner = Cleaner::new(&config).context("failed to set up registry client")?;
    let report = cleaner.run().await.with_context(|| {
        format!(
            "failed to clean packages of {}/{}",
            config.organisation, config.repository
        )
    })?;

    if report.dry_run {
        tracing::info!(
            "Dry run complete: {} version(s) across {} package(s) would be deleted",
            report.selected_count(),
            report.packages.len()
        );
    } else {
        tracing::info!(
            "Deleted {} version(s) across {} package(s)",
            report.deleted_count(),
            report.packages.len()
        );
    }

    Ok(())
}
