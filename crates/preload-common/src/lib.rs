//! Preload Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging for the preload workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`PreloadError`] and the [`Result`] alias used by
//!   configuration and state persistence
//! - **Logging**: [`logging::LogConfig`] and [`logging::init_logging`], the
//!   single place where the tracing subscriber is assembled
//!
//! # Example
//!
//! ```no_run
//! use preload_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> preload_common::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     let _guard = init_logging(&config)?;
//!     tracing::info!("logging ready");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{PreloadError, Result};
