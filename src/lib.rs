pub mod cleaner;
pub mod client;
pub mod error;
pub mod retention;
pub mod types;

pub use cleaner::{Cleaner, CleanupReport, PackageReport};
pub use client::RegistryClient;
pub use error::RegistryError;
pub use retention::versions_to_delete;
pub use types::{CleanerConfig, Package, RetentionPolicy, Version};
