//! Fetch and repackage the SQLite3 Multiple Ciphers WebAssembly build
//!
//! The upstream project publishes a zip per release containing the
//! browser build under a `jswasm/` directory. This crate finds the newest
//! release, mirrors its version into the local `package.json`, downloads the
//! zip and extracts only the `.wasm`, `.mjs` and `.js` files the browser
//! needs.
//!
//! # Example
//!
//! ```no_run
//! use sqlite_wasm_fetch::{Config, pipeline};
//!
//! let cfg = Config::default();
//! match pipeline::run(&cfg) {
//!     Ok(report) => println!("fetched {} ({} files)", report.release.version, report.files.len()),
//!     Err(failure) => eprintln!("{}", failure),
//! }
//! ```
//!
//! # Stages
//!
//! - `helpers::release` - list releases, pick the newest, strip the tag prefix
//! - `helpers::descriptor` - rewrite the `version` field of `package.json`
//! - `helpers::url` - interpolate the version into the download template
//! - `helpers::download` - fetch the zip into a scoped temp file
//! - `helpers::extract` - materialize the filtered, stripped entries
//! - `helpers::assets` - copy extra files (e.g. a worker polyfill)

pub mod core;
pub mod helpers;
pub mod pipeline;

pub use crate::core::config::{self, Config};
pub use crate::core::error::{ErrorKind, FetchError};
pub use crate::core::output;
