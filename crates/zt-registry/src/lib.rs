//! Package registry access for the schema playground.
//!
//! Fetches the version metadata of the validation library, filters it down
//! to what a version picker should offer and resolves the default version.
//!
//! # Example
//!
//! ```no_run
//! use zt_registry::{RegistrySettings, VersionResolver};
//!
//! async fn show_versions() -> zt_registry::Result<()> {
//!     let resolver = VersionResolver::new(RegistrySettings::default())?;
//!     let listing = resolver.list_versions().await;
//!     for version in listing.version_strings() {
//!         println!("{version}");
//!     }
//!     println!("default: {}", resolver.resolve_default().await);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod metadata;
pub mod resolver;
pub mod version;

pub use client::{RegistryClient, USER_AGENT_VALUE};
pub use config::{FALLBACK_VERSION, RegistrySettings};
pub use error::{RegistryError, Result};
pub use metadata::{LibraryVersion, RegistryMetadata, TagMap, VersionLinks};
pub use resolver::{VersionListing, VersionResolver, filter_versions};
pub use version::normalize_version;
