//! Blocking HTTP transport for the rendering service.

use crate::config::Config;
use crate::error::{Error, Result};
use std::time::Duration;
use ureq::Agent;
use ureq::tls::{RootCerts, TlsConfig, TlsProvider};

/// HTTP client wrapper with a per-request timeout and a body size cap.
///
/// One request at a time; the agent is constructed once per pipeline run and
/// reused across mirrors so connection setup is the only per-attempt cost.
#[derive(Debug)]
pub struct Transport {
    agent: Agent,
    user_agent: String,
    max_response_bytes: u64,
}

impl Transport {
    /// Creates a transport from the pipeline configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_timeout(config.timeout, &config.user_agent, config.max_response_bytes)
    }

    /// Creates a transport with explicit settings.
    #[must_use]
    pub fn with_timeout(timeout: Duration, user_agent: &str, max_response_bytes: u64) -> Self {
        let tls_config = TlsConfig::builder()
            .provider(TlsProvider::NativeTls)
            .root_certs(RootCerts::PlatformVerifier)
            .build();

        let agent: Agent = Agent::config_builder()
            .tls_config(tls_config)
            .timeout_global(Some(timeout))
            .build()
            .into();

        Self {
            agent,
            user_agent: user_agent.to_string(),
            max_response_bytes,
        }
    }

    /// Performs a GET request and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] on connection errors, timeouts, non-2xx
    /// statuses, or a body exceeding the configured size cap.
    pub fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .agent
            .get(url)
            .header("User-Agent", &self.user_agent)
            .call()
            .map_err(|e| Error::transport(url, e.to_string()))?;

        response
            .into_body()
            .with_config()
            .limit(self.max_response_bytes)
            .read_to_vec()
            .map_err(|e| Error::transport(url, format!("reading response body: {e}")))
    }

    /// Probes a server base URL and returns the HTTP status code.
    ///
    /// Unlike [`Transport::get`], a non-2xx status is a successful probe:
    /// the server answered, which is all connectivity diagnostics need.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] only when no HTTP response came back at
    /// all (DNS failure, refused connection, timeout).
    pub fn probe(&self, url: &str) -> Result<u16> {
        match self
            .agent
            .get(url)
            .header("User-Agent", &self.user_agent)
            .call()
        {
            Ok(response) => Ok(response.status().as_u16()),
            Err(ureq::Error::StatusCode(code)) => Ok(code),
            Err(e) => Err(Error::transport(url, e.to_string())),
        }
    }
}

/// Formats the first bytes of a response as a hex + ASCII preview.
///
/// Used in error messages to help diagnose what the server actually sent
/// (typically an HTML error page instead of image bytes).
#[must_use]
pub fn bytes_preview(data: &[u8]) -> String {
    let take = data.len().min(16);
    let hex: Vec<String> = data[..take].iter().map(|b| format!("{b:02x}")).collect();
    let ascii: String = data[..take]
        .iter()
        .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
        .collect();
    format!("[{}] \"{}\"", hex.join(" "), ascii)
}
