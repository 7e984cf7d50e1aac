//! # puml-gen
//!
//! A small library and CLI for rendering PlantUML diagrams through the
//! public PlantUML web service.
//!
//! ## Features
//!
//! - PlantUML URL encoding: raw DEFLATE + the service's 6-bit alphabet,
//!   with base64 and hex fallback schemes
//! - Sequential fallback across encoding methods and server mirrors
//! - Response validation against each format's magic signature
//! - Project diagnostics for diagram files, mirrors, and npm doc scripts
//!
//! ## Quick Start
//!
//! ```no_run
//! use puml_gen::{Config, Pipeline, ImageFormat};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .input_path("./docs/flow.puml")
//!     .format(ImageFormat::Png)
//!     .build()?;
//!
//! let stats = Pipeline::new(config)?.run()?;
//! stats.print_summary();
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library follows a pipeline architecture:
//! 1. **Source**: reads and shape-checks the diagram text
//! 2. **Encoder**: produces the URL-safe token for the selected scheme
//! 3. **Transport**: performs the HTTP GET against a mirror
//! 4. **Writer**: persists validated response bytes atomically

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod diagnose;
mod encode;
mod error;
mod format;
mod pipeline;
mod source;
mod transport;
mod writer;

pub mod api;

pub use config::{Config, ConfigBuilder};
pub use diagnose::{Check, CheckStatus, DiagnosticReport, Diagnostics};
pub use encode::{EncodingMethod, decode, decode_bytes, encode, encode_bytes};
pub use error::{Error, Result};
pub use format::ImageFormat;
pub use pipeline::{Pipeline, RenderStats, RenderedFile, build_url};
pub use source::{DiagramSource, END_MARKER, START_MARKER, SourceStats};
pub use transport::{Transport, bytes_preview};

/// Runs the complete render pipeline with the given configuration.
///
/// This is the main entry point for the library.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - The diagram source file is missing or unreadable
/// - Every encoding method × mirror combination failed
///
/// # Examples
///
/// ```no_run
/// use puml_gen::{Config, run};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = Config::builder()
///     .input_path("./docs/flow.puml")
///     .build()?;
///
/// run(config)?;
/// # Ok(())
/// # }
/// ```
pub fn run(config: Config) -> Result<RenderStats> {
    Pipeline::new(config)?.run()
}
