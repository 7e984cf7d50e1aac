use crate::{
    config::Config,
    encode::EncodingMethod,
    error::{Error, Result},
    format::ImageFormat,
    source::DiagramSource,
    transport::{Transport, bytes_preview},
    writer::Writer,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// One successfully rendered output file.
#[derive(Debug, Clone)]
pub struct RenderedFile {
    /// Output format
    pub format: ImageFormat,

    /// Path the file was written to
    pub path: PathBuf,

    /// Size of the written file in bytes
    pub bytes: usize,

    /// Encoding method that succeeded
    pub method: EncodingMethod,

    /// Server mirror that answered
    pub server: String,
}

/// Statistics collected during pipeline execution.
#[derive(Debug)]
pub struct RenderStats {
    /// Number of formats requested
    pub formats_requested: usize,

    /// Number of formats successfully written
    pub formats_written: usize,

    /// Total HTTP attempts across all formats
    pub attempts: usize,

    /// Total execution time
    pub duration: Duration,

    /// The rendered output files
    pub outputs: Vec<RenderedFile>,

    /// Per-format failures (formats whose whole strategy list was exhausted)
    pub failures: Vec<Error>,
}

impl RenderStats {
    /// Returns true if at least one format was rendered.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.formats_written > 0
    }

    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║               Render Execution Summary                ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        println!(
            "║ Formats requested:    {:>8}                        ║",
            self.formats_requested
        );
        println!(
            "║ Formats written:      {:>8}                        ║",
            self.formats_written
        );
        println!(
            "║ HTTP attempts:        {:>8}                        ║",
            self.attempts
        );
        println!(
            "║ Total time:           {:>8.2}s                     ║",
            self.duration.as_secs_f64()
        );
        println!("╚═══════════════════════════════════════════════════════╝");
        for output in &self.outputs {
            println!(
                "  ✓ {} → {} ({} bytes, {} via {})",
                output.format,
                output.path.display(),
                output.bytes,
                output.method.name(),
                output.server
            );
        }
        for failure in &self.failures {
            println!("  ✗ {failure}");
        }
        println!();
    }
}

/// Main pipeline orchestrator: source file → encoded URL → rendered output.
pub struct Pipeline {
    config: Config,
    transport: Transport,
    writer: Writer,
}

impl Pipeline {
    /// Creates a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let transport = Transport::new(&config);
        let writer = Writer::new(&config);

        Ok(Self {
            config,
            transport,
            writer,
        })
    }

    /// Executes the complete pipeline and returns statistics.
    ///
    /// # Process
    ///
    /// 1. **Load**: reads and trims the diagram source, warning when the
    ///    sentinel markers are missing
    /// 2. **Render**: for each requested format, tries every encoding
    ///    method × mirror combination in order until one yields a response
    ///    that passes the format's signature check
    /// 3. **Write**: persists each successful response verbatim, then the
    ///    run summary
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingInput`] if the source file is absent, and the
    /// first format's [`Error::AllAttemptsFailed`] when not a single
    /// requested format could be rendered. Partial success is `Ok`; the
    /// failed formats are recorded in [`RenderStats::failures`].
    #[instrument(skip(self), fields(input = %self.config.input_path.display()))]
    pub fn run(self) -> Result<RenderStats> {
        let start_time = Instant::now();

        info!("Starting render pipeline");

        let source = DiagramSource::load(&self.config.input_path)?;
        if !source.is_well_formed() {
            warn!(
                "'{}' does not start with @startuml and end with @enduml; \
                 the rendering service may reject it",
                source.path().display()
            );
        }
        info!(
            "Loaded diagram source ({} characters)",
            source.text().chars().count()
        );

        let mut outputs = Vec::new();
        let mut failures = Vec::new();
        let mut attempts = 0;

        for &format in &self.config.formats {
            match self.render_format(&source, format) {
                (tried, Ok(rendered)) => {
                    attempts += tried;
                    info!(
                        "✓ {} written to {} after {} attempt(s)",
                        format,
                        rendered.path.display(),
                        tried
                    );
                    outputs.push(rendered);
                }
                (tried, Err(err)) => {
                    attempts += tried;
                    warn!("✗ {format}: {err}");
                    failures.push(err);
                }
            }
        }

        if outputs.is_empty() {
            // Nothing succeeded; surface the first format's collected errors.
            return Err(failures
                .into_iter()
                .next()
                .unwrap_or_else(|| Error::config("no output formats requested")));
        }

        if self.config.write_summary {
            self.writer
                .write_summary(&outputs, attempts, start_time.elapsed())?;
        }

        let stats = RenderStats {
            formats_requested: self.config.formats.len(),
            formats_written: outputs.len(),
            attempts,
            duration: start_time.elapsed(),
            outputs,
            failures,
        };

        info!(
            "✓ Pipeline completed: {}/{} formats in {:.2}s",
            stats.formats_written,
            stats.formats_requested,
            stats.duration.as_secs_f64()
        );

        Ok(stats)
    }

    /// Renders one format, walking the strategy list until a hit.
    ///
    /// Returns the number of attempts made together with the outcome. The
    /// canonical encoding is tried against every mirror before degrading to
    /// the next method, so a healthy mirror is found before the scheme
    /// changes.
    fn render_format(
        &self,
        source: &DiagramSource,
        format: ImageFormat,
    ) -> (usize, Result<RenderedFile>) {
        let mut attempt_errors = Vec::new();
        let mut tried = 0;

        for &method in &self.config.methods {
            let token = method.encode(source.text());

            for server in &self.config.servers {
                let url = build_url(server, format, method, &token);
                tried += 1;
                debug!(
                    "Attempt {}: {} via {} ({})",
                    tried,
                    format,
                    server,
                    method.name()
                );

                match self.attempt(&url, format) {
                    Ok(body) => {
                        let path = self.config.output_path(format);
                        let bytes = body.len();
                        if let Err(err) = self.writer.write_render(&path, &body) {
                            return (tried, Err(err));
                        }
                        return (
                            tried,
                            Ok(RenderedFile {
                                format,
                                path,
                                bytes,
                                method,
                                server: server.clone(),
                            }),
                        );
                    }
                    Err(err) if err.is_recoverable() => {
                        debug!("Attempt {tried} failed: {err}");
                        attempt_errors.push(err);
                    }
                    Err(err) => return (tried, Err(err)),
                }
            }
        }

        (
            tried,
            Err(Error::all_attempts_failed(
                format.to_string(),
                attempt_errors,
            )),
        )
    }

    /// Performs one GET and validates the body against the format signature.
    fn attempt(&self, url: &str, format: ImageFormat) -> Result<Vec<u8>> {
        let body = self.transport.get(url)?;
        if !format.matches_signature(&body) {
            return Err(Error::invalid_response(
                url,
                format.to_string(),
                bytes_preview(&body),
            ));
        }
        Ok(body)
    }
}

/// Builds the request URL: `{server}/{format}/{prefix}{token}`.
#[must_use]
pub fn build_url(
    server: &str,
    format: ImageFormat,
    method: EncodingMethod,
    token: &str,
) -> String {
    format!(
        "{}/{}/{}{}",
        server.trim_end_matches('/'),
        format.path_segment(),
        method.prefix(),
        token
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use std::time::Duration;

    const SAMPLE: &str = "@startuml\nclass A\n@enduml\n";

    fn unreachable_config(input: &std::path::Path) -> Config {
        Config::builder()
            .input_path(input)
            .servers(["http://127.0.0.1:1"])
            .timeout(Duration::from_millis(200))
            .write_summary(false)
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_url_shapes() {
        let url = build_url(
            "https://www.plantuml.com/plantuml",
            ImageFormat::Png,
            EncodingMethod::Deflate,
            "SoWkIImgAStDuN98pKi1",
        );
        assert_eq!(
            url,
            "https://www.plantuml.com/plantuml/png/SoWkIImgAStDuN98pKi1"
        );

        let url = build_url(
            "https://www.plantuml.com/plantuml/",
            ImageFormat::Svg,
            EncodingMethod::Hex,
            "407374",
        );
        assert_eq!(url, "https://www.plantuml.com/plantuml/svg/~h407374");
    }

    #[test]
    fn test_missing_input_fails_without_network() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = unreachable_config(&temp.path().join("absent.puml"));

        let err = Pipeline::new(config).unwrap().run().unwrap_err();
        assert!(matches!(err, Error::MissingInput { .. }));
    }

    #[test]
    fn test_all_mirrors_failing_exhausts_strategies() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("diagram.puml");
        input.write_str(SAMPLE).unwrap();

        let config = unreachable_config(input.path());
        let err = Pipeline::new(config).unwrap().run().unwrap_err();

        match err {
            Error::AllAttemptsFailed { count, attempts, .. } => {
                // 3 methods × 1 mirror
                assert_eq!(count, 3);
                assert!(attempts.iter().all(Error::is_recoverable));
            }
            other => panic!("expected AllAttemptsFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_no_output_file_left_behind_on_failure() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("diagram.puml");
        input.write_str(SAMPLE).unwrap();

        let config = unreachable_config(input.path());
        let output = config.output_path(ImageFormat::Png);
        let _ = Pipeline::new(config).unwrap().run();

        assert!(!output.exists());
    }
}
