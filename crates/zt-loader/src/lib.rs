//! Runtime loading of validation library versions.
//!
//! A [`VersionLoader`] hands out one [`LoadedModule`] per exact version
//! string and caches it for the life of the process. Modules come from a
//! [`ModuleSource`]; the default [`CdnSource`] confirms the version on a
//! jsDelivr-style CDN before instantiating the library surface for its API
//! generation.
//!
//! ```no_run
//! use zt_loader::{CdnSettings, VersionLoader};
//!
//! # async fn demo() -> zt_loader::Result<()> {
//! let loader = VersionLoader::new(CdnSettings::default())?;
//! let module = loader.load("3.24.2").await?;
//! let declarations = loader.load_declarations("3.24.2").await;
//! println!("{} ({} bytes of declarations)", module.version(), declarations.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod cdn;
pub mod declarations;
pub mod error;
pub mod loader;
pub mod source;

pub use cache::KeyedCache;
pub use cdn::{CdnSettings, CdnSource, DEFAULT_CDN_URL};
pub use declarations::candidate_paths;
pub use error::{LoadError, Result};
pub use loader::VersionLoader;
pub use source::{LoadedModule, ModuleSource};
