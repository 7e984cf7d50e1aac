use crate::config::Config;
use crate::error::{Error, Result};
use crate::pipeline::RenderedFile;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Summary of a render run, written as `render-summary.json`.
#[derive(Debug, Serialize)]
pub(crate) struct RenderSummary {
    /// Diagram source the outputs were generated from
    pub input: String,

    /// Number of output files written
    pub files_written: usize,

    /// Total number of HTTP attempts across all formats
    pub attempts: usize,

    /// Execution duration in seconds
    pub duration_secs: f64,

    /// Individual output summaries
    pub outputs: Vec<OutputSummary>,

    /// Generation timestamp
    pub generated_at: String,
}

/// Summary of a single rendered output file.
#[derive(Debug, Serialize)]
pub(crate) struct OutputSummary {
    /// Output format tag
    pub format: String,

    /// Output filename
    pub filename: String,

    /// Size in bytes
    pub bytes: usize,

    /// Encoding method that succeeded
    pub method: String,

    /// Server mirror that answered
    pub server: String,
}

/// Writes rendered bytes to output files with atomic operations.
pub(crate) struct Writer {
    output_dir: PathBuf,
    input_path: PathBuf,
}

impl Writer {
    /// Creates a new writer from configuration.
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            output_dir: config.resolved_output_dir(),
            input_path: config.input_path.clone(),
        }
    }

    /// Writes one rendered output atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory cannot be created or any
    /// write/rename step fails.
    pub(crate) fn write_render(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
        }
        self.write_file_atomic(path, bytes)?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    /// Writes bytes atomically: temporary file, sync, rename.
    fn write_file_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let temp_path = path.with_extension("tmp");
        let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;

        temp_file
            .write_all(bytes)
            .map_err(|e| Error::io(&temp_path, e))?;

        temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;

        drop(temp_file);

        fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;

        Ok(())
    }

    /// Writes a summary JSON file describing the rendered outputs.
    ///
    /// # Errors
    ///
    /// Returns an error if the summary file cannot be written.
    pub(crate) fn write_summary(
        &self,
        outputs: &[RenderedFile],
        attempts: usize,
        duration: Duration,
    ) -> Result<PathBuf> {
        let summary = RenderSummary {
            input: self.input_path.display().to_string(),
            files_written: outputs.len(),
            attempts,
            duration_secs: duration.as_secs_f64(),
            outputs: outputs
                .iter()
                .map(|o| OutputSummary {
                    format: o.format.to_string(),
                    filename: o
                        .path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default(),
                    bytes: o.bytes,
                    method: o.method.name().to_string(),
                    server: o.server.clone(),
                })
                .collect(),
            generated_at: chrono::Local::now()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        };

        fs::create_dir_all(&self.output_dir).map_err(|e| Error::io(&self.output_dir, e))?;
        let summary_path = self.output_dir.join("render-summary.json");
        let file = fs::File::create(&summary_path).map_err(|e| Error::io(&summary_path, e))?;

        serde_json::to_writer_pretty(file, &summary).map_err(Error::from)?;

        info!("Wrote summary to {}", summary_path.display());
        Ok(summary_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::EncodingMethod;
    use crate::format::ImageFormat;

    fn test_writer(dir: &Path) -> Writer {
        Writer {
            output_dir: dir.to_path_buf(),
            input_path: PathBuf::from("diagram.puml"),
        }
    }

    #[test]
    fn test_write_render_creates_directories() {
        let temp = assert_fs::TempDir::new().unwrap();
        let writer = test_writer(temp.path());
        let target = temp.path().join("nested/dir/diagram.png");

        writer.write_render(&target, b"\x89PNG\r\n\x1a\nimage").unwrap();

        let written = fs::read(&target).unwrap();
        assert_eq!(&written[..4], b"\x89PN");
        assert!(!target.with_extension("tmp").exists());
    }

    #[test]
    fn test_write_render_overwrites_existing() {
        let temp = assert_fs::TempDir::new().unwrap();
        let writer = test_writer(temp.path());
        let target = temp.path().join("diagram.txt");

        writer.write_render(&target, b"first").unwrap();
        writer.write_render(&target, b"second").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"second");
    }

    #[test]
    fn test_write_summary_is_valid_json() {
        let temp = assert_fs::TempDir::new().unwrap();
        let writer = test_writer(temp.path());
        let outputs = vec![RenderedFile {
            format: ImageFormat::Png,
            path: temp.path().join("diagram.png"),
            bytes: 1234,
            method: EncodingMethod::Deflate,
            server: "https://www.plantuml.com/plantuml".to_string(),
        }];

        let path = writer
            .write_summary(&outputs, 3, Duration::from_millis(1500))
            .unwrap();

        let content = fs::read_to_string(path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["files_written"], 1);
        assert_eq!(parsed["attempts"], 3);
        assert_eq!(parsed["outputs"][0]["format"], "png");
        assert_eq!(parsed["outputs"][0]["method"], "deflate");
    }
}
