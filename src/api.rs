//! High-level, ergonomic API for common use cases. Start here if you want to
//! render a diagram fast without configuration overhead.
//!
//! ## Examples
//!
//! ```no_run
//! use puml_gen::api::Render;
//! use puml_gen::ImageFormat;
//!
//! // Render the conventional source path to PNG
//! Render::default_source().run()?;
//!
//! // Render a specific file to SVG in a chosen directory
//! Render::file("./docs/flow.puml")
//!     .format(ImageFormat::Svg)
//!     .output("./docs/img")
//!     .run()?;
//! # Ok::<(), puml_gen::Error>(())
//! ```

use crate::{Config, ImageFormat, Pipeline, RenderStats, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Entry point for the fluent rendering API.
#[derive(Debug, Clone)]
#[must_use = "call .run() to execute the render"]
pub struct Render {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    formats: Vec<ImageFormat>,
    servers: Vec<String>,
    timeout: Option<Duration>,
}

impl Render {
    /// Renders the conventional diagram source path.
    pub fn default_source() -> Self {
        Self {
            input: None,
            output: None,
            formats: vec![ImageFormat::Png],
            servers: Vec::new(),
            timeout: None,
        }
    }

    /// Renders the given diagram source file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            input: Some(path.into()),
            ..Self::default_source()
        }
    }

    /// Sets the output directory.
    ///
    /// Default: the input file's directory.
    pub fn output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output = Some(dir.into());
        self
    }

    /// Sets a single output format.
    ///
    /// Default: PNG.
    pub fn format(mut self, format: ImageFormat) -> Self {
        self.formats = vec![format];
        self
    }

    /// Requests every supported output format.
    pub fn all_formats(mut self) -> Self {
        self.formats = ImageFormat::ALL.to_vec();
        self
    }

    /// Adds a server mirror tried before the remaining configured mirrors.
    ///
    /// Can be called multiple times; mirrors are tried in insertion order.
    pub fn server(mut self, url: impl Into<String>) -> Self {
        self.servers.push(url.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Executes the render and returns statistics.
    ///
    /// This is a terminal operation that consumes the builder.
    ///
    /// # Errors
    ///
    /// Returns an error if the source file is missing, the configuration is
    /// invalid, or every encoding method × mirror combination failed.
    pub fn run(self) -> Result<RenderStats> {
        let config = self.build_config()?;
        Pipeline::new(config)?.run()
    }

    fn build_config(self) -> Result<Config> {
        let mut builder = Config::builder().formats(self.formats);

        if let Some(input) = self.input {
            builder = builder.input_path(input);
        }
        if let Some(output) = self.output {
            builder = builder.output_dir(output);
        }
        if !self.servers.is_empty() {
            builder = builder.servers(self.servers);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder.build()
    }
}

/// Renders a diagram file to PNG with default settings.
///
/// # Errors
///
/// Returns an error if the file is missing or every render attempt failed.
pub fn render_file(path: impl Into<PathBuf>) -> Result<RenderStats> {
    Render::file(path).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_builder_has_sensible_defaults() {
        let render = Render::default_source();
        assert!(render.input.is_none());
        assert_eq!(render.formats, vec![ImageFormat::Png]);
    }

    #[test]
    fn render_builder_is_fluent() {
        let render = Render::file("./diagram.puml")
            .output("./img")
            .format(ImageFormat::Svg)
            .server("http://localhost:8080/plantuml")
            .timeout(Duration::from_secs(3));

        assert_eq!(render.input, Some(PathBuf::from("./diagram.puml")));
        assert_eq!(render.output, Some(PathBuf::from("./img")));
        assert_eq!(render.formats, vec![ImageFormat::Svg]);
        assert_eq!(render.servers.len(), 1);
    }

    #[test]
    fn all_formats_requests_every_format() {
        let render = Render::default_source().all_formats();
        assert_eq!(render.formats.len(), ImageFormat::ALL.len());
    }

    #[test]
    fn build_config_applies_overrides() {
        let config = Render::file("./diagram.puml")
            .server("http://localhost:9999/plantuml/")
            .build_config()
            .unwrap();

        assert_eq!(config.input_path, PathBuf::from("./diagram.puml"));
        assert_eq!(config.servers, vec!["http://localhost:9999/plantuml"]);
    }
}
