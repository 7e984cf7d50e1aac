//! Project diagnostics for the diagram toolchain.
//!
//! Mirrors what a developer would check by hand when rendering stops
//! working: is the source file there, does it look like a diagram, are the
//! mirrors reachable, is the npm doc script still wired up.

use crate::config::Config;
use crate::error::Result;
use crate::source::{DiagramSource, END_MARKER, START_MARKER};
use crate::transport::Transport;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Severity of a single diagnostic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed
    Ok,
    /// Informational line, no pass/fail meaning
    Info,
    /// Something is off but rendering may still work
    Warn,
    /// A required piece is missing
    Fail,
}

impl CheckStatus {
    const fn tag(self) -> &'static str {
        match self {
            Self::Ok => "OK  ",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
        }
    }
}

/// One line of the diagnostic report.
#[derive(Debug, Clone)]
pub struct Check {
    /// Severity
    pub status: CheckStatus,
    /// What was checked
    pub label: String,
    /// Outcome details
    pub detail: String,
}

/// Outcome of a diagnostics run.
#[derive(Debug, Clone)]
pub struct DiagnosticReport {
    /// All checks, in execution order
    pub checks: Vec<Check>,
}

impl DiagnosticReport {
    /// Number of failed checks.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.count(CheckStatus::Fail)
    }

    /// Number of warning checks.
    #[must_use]
    pub fn warnings(&self) -> usize {
        self.count(CheckStatus::Warn)
    }

    fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    /// Prints the report to stdout.
    pub fn print(&self) {
        println!("Diagram system diagnostics\n");
        for check in &self.checks {
            println!("  {} {}: {}", check.status.tag(), check.label, check.detail);
        }
        println!(
            "\nDiagnostics complete: {} check(s), {} warning(s), {} failure(s)",
            self.checks.len(),
            self.warnings(),
            self.failures()
        );
    }
}

/// Runs presence and shape checks over the diagram project files.
pub struct Diagnostics {
    config: Config,
    root: PathBuf,
    probe_servers: bool,
}

impl Diagnostics {
    /// Creates a diagnostics runner for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            root: PathBuf::from("."),
            probe_servers: true,
        })
    }

    /// Sets the project root directory checked for `.puml` files and
    /// `package.json`.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Enables or disables the network connectivity probe.
    #[must_use]
    pub fn with_probes(mut self, enabled: bool) -> Self {
        self.probe_servers = enabled;
        self
    }

    /// Runs every check and collects the report.
    ///
    /// Diagnostics never error out: problems become report entries.
    #[must_use]
    pub fn run(&self) -> DiagnosticReport {
        let mut checks = Vec::new();

        self.check_input_file(&mut checks);
        self.check_source_shape(&mut checks);
        self.discover_sources(&mut checks);
        if self.probe_servers {
            self.check_connectivity(&mut checks);
        }
        self.check_package_json(&mut checks);

        DiagnosticReport { checks }
    }

    /// Existence and size of the configured diagram source.
    fn check_input_file(&self, checks: &mut Vec<Check>) {
        let path = &self.config.input_path;
        match fs::metadata(path) {
            Ok(meta) => checks.push(Check {
                status: CheckStatus::Ok,
                label: "diagram source".to_string(),
                detail: format!("{} ({} bytes)", path.display(), meta.len()),
            }),
            Err(_) => checks.push(Check {
                status: CheckStatus::Fail,
                label: "diagram source".to_string(),
                detail: format!("{} is missing", path.display()),
            }),
        }
    }

    /// Sentinel markers and content statistics.
    fn check_source_shape(&self, checks: &mut Vec<Check>) {
        let Ok(source) = DiagramSource::load(&self.config.input_path) else {
            return;
        };

        if source.is_well_formed() {
            checks.push(Check {
                status: CheckStatus::Ok,
                label: "diagram shape".to_string(),
                detail: format!("starts with {START_MARKER} and ends with {END_MARKER}"),
            });
        } else {
            checks.push(Check {
                status: CheckStatus::Warn,
                label: "diagram shape".to_string(),
                detail: format!(
                    "expected the source to start with {START_MARKER} and end with {END_MARKER}"
                ),
            });
        }

        let stats = source.stats();
        checks.push(Check {
            status: CheckStatus::Info,
            label: "diagram size".to_string(),
            detail: format!("{} line(s), {} character(s)", stats.lines, stats.chars),
        });
        if !stats.classes.is_empty() {
            checks.push(Check {
                status: CheckStatus::Info,
                label: "classes".to_string(),
                detail: format!(
                    "{} found: {}",
                    stats.classes.len(),
                    stats.classes.join(", ")
                ),
            });
        }
    }

    /// Other `.puml` files under the project root.
    fn discover_sources(&self, checks: &mut Vec<Check>) {
        let mut found = Vec::new();
        // depth 0 is the root itself and is never filtered, even when the
        // root directory name happens to look hidden
        let walker = WalkDir::new(&self.root)
            .max_depth(5)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e.path()));

        for entry in walker.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "puml") {
                found.push(path.to_path_buf());
            }
        }

        debug!("Discovered {} .puml file(s) under {}", found.len(), self.root.display());
        checks.push(Check {
            status: CheckStatus::Info,
            label: "diagram files".to_string(),
            detail: if found.is_empty() {
                format!("no .puml files under {}", self.root.display())
            } else {
                format!(
                    "{} .puml file(s): {}",
                    found.len(),
                    found
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            },
        });
    }

    /// Reachability of each configured mirror.
    fn check_connectivity(&self, checks: &mut Vec<Check>) {
        let transport = Transport::new(&self.config);
        for server in &self.config.servers {
            match transport.probe(server) {
                Ok(status) => checks.push(Check {
                    status: CheckStatus::Ok,
                    label: "server".to_string(),
                    detail: format!("{server} answered with status {status}"),
                }),
                Err(err) => checks.push(Check {
                    status: CheckStatus::Warn,
                    label: "server".to_string(),
                    detail: format!("{server} unreachable: {err}"),
                }),
            }
        }
    }

    /// `package.json` presence and the `docs:uml` script.
    fn check_package_json(&self, checks: &mut Vec<Check>) {
        let path = self.root.join("package.json");
        let Ok(raw) = fs::read_to_string(&path) else {
            checks.push(Check {
                status: CheckStatus::Warn,
                label: "package.json".to_string(),
                detail: format!("{} not found", path.display()),
            });
            return;
        };

        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(parsed) => match parsed
                .get("scripts")
                .and_then(|s| s.get("docs:uml"))
                .and_then(serde_json::Value::as_str)
            {
                Some(script) => checks.push(Check {
                    status: CheckStatus::Ok,
                    label: "npm script docs:uml".to_string(),
                    detail: script.to_string(),
                }),
                None => checks.push(Check {
                    status: CheckStatus::Warn,
                    label: "npm script docs:uml".to_string(),
                    detail: "not present in package.json scripts".to_string(),
                }),
            },
            Err(e) => checks.push(Check {
                status: CheckStatus::Warn,
                label: "package.json".to_string(),
                detail: format!("could not parse: {e}"),
            }),
        }
    }
}

/// Directories never descended into during discovery.
fn is_skipped_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| {
            (name.starts_with('.') && name.len() > 1)
                || name == "target"
                || name == "node_modules"
                || name == "vendor"
        })
}
