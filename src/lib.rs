//! HTTP front for an external media extractor: resolves a page URL into
//! downloadable options and relays the chosen media back to the browser.

pub mod catalog;
pub mod config;
pub mod error;
pub mod extractor;
pub mod formats;
pub mod platform;
pub mod resolver;
pub mod routes;

pub use config::Config;
pub use error::{ApiError, ErrorKind};
pub use platform::{Platform, detect};
pub use resolver::{MetadataRecord, ResolveMode, Resolver};
pub use routes::{AppState, router};
