use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Output format understood by the PlantUML rendering service.
///
/// Each format maps to a path segment in the request URL and to the file
/// extension of the written output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// PNG raster image
    Png,
    /// SVG vector image
    Svg,
    /// Encapsulated PostScript
    Eps,
    /// PDF document
    Pdf,
    /// Plain-text (ASCII art) rendering
    Txt,
    /// Unicode-text rendering
    Utxt,
}

impl ImageFormat {
    /// All supported formats, in the order they are listed to the user.
    pub const ALL: [Self; 6] = [
        Self::Png,
        Self::Svg,
        Self::Eps,
        Self::Pdf,
        Self::Txt,
        Self::Utxt,
    ];

    /// Returns the URL path segment for this format.
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Eps => "eps",
            Self::Pdf => "pdf",
            Self::Txt => "txt",
            Self::Utxt => "utxt",
        }
    }

    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Eps => "eps",
            Self::Pdf => "pdf",
            Self::Txt => "txt",
            Self::Utxt => "utxt",
        }
    }

    /// Returns true if this format is binary and carries a magic signature.
    #[must_use]
    pub const fn is_binary(self) -> bool {
        matches!(self, Self::Png | Self::Pdf | Self::Eps)
    }

    /// Returns the magic-byte signature binary responses must start with.
    #[must_use]
    pub const fn signature(self) -> Option<&'static [u8]> {
        match self {
            Self::Png => Some(b"\x89PNG\r\n\x1a\n"),
            Self::Pdf => Some(b"%PDF"),
            Self::Eps => Some(b"%!PS"),
            Self::Svg | Self::Txt | Self::Utxt => None,
        }
    }

    /// Checks whether a response body is plausible for this format.
    ///
    /// Binary formats must start with their magic signature. Text formats
    /// accept any non-empty body.
    #[must_use]
    pub fn matches_signature(self, body: &[u8]) -> bool {
        match self.signature() {
            Some(magic) => body.len() >= magic.len() && &body[..magic.len()] == magic,
            None => !body.is_empty(),
        }
    }

    /// Returns a comma-separated list of all supported format tags.
    #[must_use]
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|f| f.path_segment())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl FromStr for ImageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            "eps" => Ok(Self::Eps),
            "pdf" => Ok(Self::Pdf),
            "txt" => Ok(Self::Txt),
            "utxt" => Ok(Self::Utxt),
            other => Err(Error::UnsupportedFormat {
                format: other.to_string(),
                supported: Self::supported_list(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_supported_formats() {
        for tag in ["png", "svg", "eps", "pdf", "txt", "utxt"] {
            let format: ImageFormat = tag.parse().unwrap();
            assert_eq!(format.path_segment(), tag);
            assert_eq!(format.extension(), tag);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let format: ImageFormat = "PNG".parse().unwrap();
        assert_eq!(format, ImageFormat::Png);
    }

    #[test]
    fn test_unsupported_format_rejected() {
        let err = "bmp".parse::<ImageFormat>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
        assert!(err.to_string().contains("bmp"));
        assert!(err.to_string().contains("png"));
    }

    #[test]
    fn test_png_signature() {
        let valid = b"\x89PNG\r\n\x1a\nrest of image";
        assert!(ImageFormat::Png.matches_signature(valid));
        assert!(!ImageFormat::Png.matches_signature(b"<html>404</html>"));
        assert!(!ImageFormat::Png.matches_signature(b""));
    }

    #[test]
    fn test_pdf_and_eps_signatures() {
        assert!(ImageFormat::Pdf.matches_signature(b"%PDF-1.7\n"));
        assert!(!ImageFormat::Pdf.matches_signature(b"%!PS-Adobe"));
        assert!(ImageFormat::Eps.matches_signature(b"%!PS-Adobe-3.0 EPSF-3.0"));
        assert!(!ImageFormat::Eps.matches_signature(b"%PDF-1.7"));
    }

    #[test]
    fn test_text_formats_accept_any_nonempty_body() {
        assert!(ImageFormat::Svg.matches_signature(b"<svg xmlns=...>"));
        assert!(ImageFormat::Txt.matches_signature(b"+---+\n| A |\n+---+"));
        assert!(!ImageFormat::Utxt.matches_signature(b""));
    }

    #[test]
    fn test_binary_classification() {
        assert!(ImageFormat::Png.is_binary());
        assert!(ImageFormat::Pdf.is_binary());
        assert!(ImageFormat::Eps.is_binary());
        assert!(!ImageFormat::Svg.is_binary());
        assert!(!ImageFormat::Txt.is_binary());
    }
}
