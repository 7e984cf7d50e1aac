use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Sentinel line a diagram source is expected to start with.
pub const START_MARKER: &str = "@startuml";

/// Sentinel line a diagram source is expected to end with.
pub const END_MARKER: &str = "@enduml";

/// A diagram description read from a `.puml` file.
///
/// The text is kept verbatim; [`DiagramSource::text`] returns the trimmed
/// view that encoding and validation operate on.
#[derive(Debug, Clone)]
pub struct DiagramSource {
    /// Path the source was read from
    path: PathBuf,
    /// Raw file contents
    raw: String,
}

/// Shape and size statistics for a diagram source.
#[derive(Debug, Clone)]
pub struct SourceStats {
    /// Number of lines
    pub lines: usize,
    /// Number of characters
    pub chars: usize,
    /// First line of the trimmed source
    pub first_line: String,
    /// Last line of the trimmed source
    pub last_line: String,
    /// Names of `class` declarations found
    pub classes: Vec<String>,
}

impl DiagramSource {
    /// Reads a diagram source from a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingInput`] if the file does not exist and
    /// [`Error::Io`] for any other read failure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::missing_input(path));
        }
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            raw,
        })
    }

    /// Creates a source from in-memory text.
    #[must_use]
    pub fn from_text(path: impl Into<PathBuf>, raw: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            raw: raw.into(),
        }
    }

    /// Returns the path the source was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the trimmed diagram text that gets encoded.
    #[must_use]
    pub fn text(&self) -> &str {
        self.raw.trim()
    }

    /// Returns true if the trimmed source is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }

    /// Returns true if the source starts and ends with the sentinel markers.
    ///
    /// Absence of either marker is a validation warning for callers, not a
    /// hard failure; the rendering service itself decides what it accepts.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let text = self.text();
        text.starts_with(START_MARKER) && text.ends_with(END_MARKER)
    }

    /// Computes line/char statistics and the `class` declarations present.
    #[must_use]
    pub fn stats(&self) -> SourceStats {
        let text = self.text();
        let lines = if text.is_empty() {
            0
        } else {
            memchr::memchr_iter(b'\n', text.as_bytes()).count() + 1
        };
        let classes = text
            .lines()
            .filter_map(|line| {
                let rest = line.trim_start().strip_prefix("class ")?;
                let name = rest.split_whitespace().next()?;
                Some(name.trim_end_matches('{').to_string())
            })
            .filter(|name| !name.is_empty())
            .collect();
        SourceStats {
            lines,
            chars: text.chars().count(),
            first_line: text.lines().next().unwrap_or_default().to_string(),
            last_line: text.lines().last().unwrap_or_default().to_string(),
            classes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    const SAMPLE: &str = "@startuml\nclass Paciente {\n  +nome: string\n}\nclass User\n@enduml\n";

    #[test]
    fn test_load_missing_file() {
        let err = DiagramSource::load("/nonexistent/diagram.puml").unwrap_err();
        assert!(matches!(err, Error::MissingInput { .. }));
    }

    #[test]
    fn test_load_and_trim() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("diagram.puml");
        file.write_str("  @startuml\nclass A\n@enduml\n\n").unwrap();

        let source = DiagramSource::load(file.path()).unwrap();
        assert!(source.text().starts_with(START_MARKER));
        assert!(source.text().ends_with(END_MARKER));
        assert!(source.is_well_formed());
    }

    #[test]
    fn test_missing_markers_detected() {
        let source = DiagramSource::from_text("a.puml", "class A {}\n");
        assert!(!source.is_well_formed());

        let source = DiagramSource::from_text("b.puml", "@startuml\nclass A");
        assert!(!source.is_well_formed());
    }

    #[test]
    fn test_stats_counts_lines_and_classes() {
        let source = DiagramSource::from_text("c.puml", SAMPLE);
        let stats = source.stats();
        assert_eq!(stats.lines, 6);
        assert_eq!(stats.first_line, "@startuml");
        assert_eq!(stats.last_line, "@enduml");
        assert_eq!(stats.classes, vec!["Paciente", "User"]);
    }

    #[test]
    fn test_stats_empty_source() {
        let source = DiagramSource::from_text("d.puml", "   \n  ");
        assert!(source.is_empty());
        let stats = source.stats();
        assert_eq!(stats.lines, 0);
        assert_eq!(stats.chars, 0);
        assert!(stats.classes.is_empty());
    }
}
