//! Playground session coordinator.
//!
//! A [`Session`] owns the version resolver and module loader, tracks which
//! library version is current and records validation runs in order.
//!
//! Version selections race freely. Each selection takes an epoch when it
//! starts; when its module finishes loading it is installed only if no
//! newer selection has been installed in the meantime.
//!
//! ```no_run
//! use zt_loader::CdnSettings;
//! use zt_registry::RegistrySettings;
//! use zt_session::Session;
//!
//! # async fn demo() -> zt_session::Result<()> {
//! let session = Session::from_settings(RegistrySettings::default(), CdnSettings::default())?;
//! session.select_default().await?;
//! let record = session.validate("z.string()", "\"hello\"")?;
//! println!("{}", record.result.render());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod session;

pub use error::{Result, SessionError};
pub use session::{Selection, Session, ValidationRecord};
