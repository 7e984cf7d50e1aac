use crate::encode::EncodingMethod;
use crate::error::{Error, Result};
use crate::format::ImageFormat;
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_INPUT_PATH: &str = "storage/uml/domain-models.puml";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_RESPONSE_BYTES: u64 = 10 * 1024 * 1024;

/// Default rendering service mirrors, tried in order.
static DEFAULT_SERVERS: Lazy<Vec<String>> = Lazy::new(|| {
    vec![
        "https://www.plantuml.com/plantuml".to_string(),
        "http://www.plantuml.com/plantuml".to_string(),
    ]
});

/// Configuration for the puml-gen pipeline.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Path to the diagram source file
    pub input_path: PathBuf,

    /// Output directory; defaults to the input file's directory
    pub output_dir: Option<PathBuf>,

    /// Rendering service base URLs, tried in order
    pub servers: Vec<String>,

    /// Encoding methods, tried in order
    pub methods: Vec<EncodingMethod>,

    /// Output formats to generate
    pub formats: Vec<ImageFormat>,

    /// Per-request timeout
    pub timeout: Duration,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Maximum accepted response body size in bytes
    pub max_response_bytes: u64,

    /// Whether to write render-summary.json next to the outputs
    pub write_summary: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use puml_gen::Config;
    ///
    /// let config = Config::builder()
    ///     .input_path("./diagram.puml")
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The mirror list is empty or contains a non-http(s) URL
    /// - No encoding method or output format is configured
    /// - The timeout is zero
    pub fn validate(&self) -> Result<()> {
        if self.servers.is_empty() {
            return Err(Error::config("At least one server mirror is required"));
        }

        for server in &self.servers {
            let parsed = url::Url::parse(server)
                .map_err(|e| Error::config(format!("Invalid server URL '{server}': {e}")))?;
            match parsed.scheme() {
                "http" | "https" => {}
                scheme => {
                    return Err(Error::config(format!(
                        "Server URL '{server}' uses unsupported scheme '{scheme}' (http or https expected)"
                    )));
                }
            }
        }

        if self.methods.is_empty() {
            return Err(Error::config("At least one encoding method is required"));
        }

        if self.formats.is_empty() {
            return Err(Error::config("At least one output format is required"));
        }

        if self.timeout.is_zero() {
            return Err(Error::config("timeout must be greater than 0"));
        }

        Ok(())
    }

    /// Returns the directory output files are written to.
    ///
    /// Falls back to the input file's directory, then to the current
    /// directory when the input path has no parent component.
    #[must_use]
    pub fn resolved_output_dir(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }
        match self.input_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Returns the output path for one format, derived from the input stem.
    #[must_use]
    pub fn output_path(&self, format: ImageFormat) -> PathBuf {
        let stem = self
            .input_path
            .file_stem()
            .map_or_else(|| "diagram".into(), |s| s.to_string_lossy().into_owned());
        self.resolved_output_dir()
            .join(format!("{stem}.{}", format.extension()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_dir: None,
            servers: DEFAULT_SERVERS.clone(),
            methods: EncodingMethod::ALL.to_vec(),
            formats: vec![ImageFormat::Png],
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: concat!("puml-gen/", env!("CARGO_PKG_VERSION")).to_string(),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            write_summary: true,
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    input_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    servers: Option<Vec<String>>,
    methods: Option<Vec<EncodingMethod>>,
    formats: Option<Vec<ImageFormat>>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    max_response_bytes: Option<u64>,
    write_summary: Option<bool>,
}

impl ConfigBuilder {
    /// Sets the diagram source path.
    #[must_use]
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Sets the output directory for rendered files.
    #[must_use]
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Replaces the mirror list. Trailing slashes are normalized away.
    #[must_use]
    pub fn servers<I, S>(mut self, servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.servers = Some(
            servers
                .into_iter()
                .map(|s| s.into().trim_end_matches('/').to_string())
                .collect(),
        );
        self
    }

    /// Replaces the encoding method order.
    #[must_use]
    pub fn methods(mut self, methods: impl Into<Vec<EncodingMethod>>) -> Self {
        self.methods = Some(methods.into());
        self
    }

    /// Replaces the requested output formats.
    #[must_use]
    pub fn formats(mut self, formats: impl Into<Vec<ImageFormat>>) -> Self {
        self.formats = Some(formats.into());
        self
    }

    /// Requests a single output format.
    #[must_use]
    pub fn format(self, format: ImageFormat) -> Self {
        self.formats(vec![format])
    }

    /// Requests every supported output format.
    #[must_use]
    pub fn all_formats(self) -> Self {
        self.formats(ImageFormat::ALL.to_vec())
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the User-Agent header.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the maximum accepted response body size.
    #[must_use]
    pub fn max_response_bytes(mut self, bytes: u64) -> Self {
        self.max_response_bytes = Some(bytes);
        self
    }

    /// Enables or disables the render-summary.json output.
    #[must_use]
    pub fn write_summary(mut self, enabled: bool) -> Self {
        self.write_summary = Some(enabled);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let defaults = Config::default();
        let config = Config {
            input_path: self.input_path.unwrap_or(defaults.input_path),
            output_dir: self.output_dir,
            servers: self.servers.unwrap_or(defaults.servers),
            methods: self.methods.unwrap_or(defaults.methods),
            formats: self.formats.unwrap_or(defaults.formats),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            max_response_bytes: self.max_response_bytes.unwrap_or(defaults.max_response_bytes),
            write_summary: self.write_summary.unwrap_or(defaults.write_summary),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::builder().build().unwrap();
        assert_eq!(config.input_path, PathBuf::from(DEFAULT_INPUT_PATH));
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.formats, vec![ImageFormat::Png]);
        assert_eq!(config.methods, EncodingMethod::ALL.to_vec());
    }

    #[test]
    fn test_empty_server_list_rejected() {
        let result = Config::builder().servers(Vec::<String>::new()).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_non_http_server_rejected() {
        let result = Config::builder().servers(["ftp://plantuml.com/plantuml"]).build();
        assert!(result.is_err());

        let result = Config::builder().servers(["not a url"]).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_trailing_slash_normalized() {
        let config = Config::builder()
            .servers(["http://localhost:8080/plantuml/"])
            .build()
            .unwrap();
        assert_eq!(config.servers, vec!["http://localhost:8080/plantuml"]);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = Config::builder().timeout(Duration::ZERO).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_output_path_derived_from_input_stem() {
        let config = Config::builder()
            .input_path("storage/uml/domain-models.puml")
            .build()
            .unwrap();
        assert_eq!(
            config.output_path(ImageFormat::Png),
            PathBuf::from("storage/uml/domain-models.png")
        );

        let config = Config::builder()
            .input_path("diagram.puml")
            .output_dir("out")
            .build()
            .unwrap();
        assert_eq!(
            config.output_path(ImageFormat::Svg),
            PathBuf::from("out/diagram.svg")
        );
    }

    #[test]
    fn test_all_formats() {
        let config = Config::builder().all_formats().build().unwrap();
        assert_eq!(config.formats.len(), ImageFormat::ALL.len());
    }
}
