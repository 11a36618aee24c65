// src/extractors/source.rs
use std::fmt;
use std::path::Path;

/// Raster formats the model accepts as inline data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Bmp,
    Webp,
}

/// What kind of document a file is, which selects prompt and MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Image(ImageFormat),
}

impl FileKind {
    /// Detects the kind from a file extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" => Some(Self::Image(ImageFormat::Jpeg)),
            "png" => Some(Self::Image(ImageFormat::Png)),
            "bmp" => Some(Self::Image(ImageFormat::Bmp)),
            "webp" => Some(Self::Image(ImageFormat::Webp)),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Image(ImageFormat::Jpeg) => "image/jpeg",
            Self::Image(ImageFormat::Png) => "image/png",
            Self::Image(ImageFormat::Bmp) => "image/bmp",
            Self::Image(ImageFormat::Webp) => "image/webp",
        }
    }

    pub fn is_pdf(self) -> bool {
        matches!(self, Self::Pdf)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => write!(f, "PDF"),
            Self::Image(_) => write!(f, "image"),
        }
    }
}

/// A file submitted for extraction.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// File name without directory or extension; prefixes the output files.
    pub base_name: String,
    pub kind: FileKind,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    /// Wraps already-loaded bytes, detecting the kind from `path`'s extension.
    pub fn from_bytes(path: &Path, bytes: Vec<u8>) -> Option<Self> {
        let kind = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(FileKind::from_extension)?;
        let base_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("table")
            .to_string();
        Some(Self { base_name, kind, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(FileKind::from_extension("PDF"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_extension("JPG"), Some(FileKind::Image(ImageFormat::Jpeg)));
        assert_eq!(FileKind::from_extension("jpeg").map(FileKind::mime_type), Some("image/jpeg"));
        assert_eq!(FileKind::from_extension("webp").map(FileKind::mime_type), Some("image/webp"));
        assert_eq!(FileKind::from_extension("docx"), None);
    }

    #[test]
    fn test_source_file_from_path() {
        let file = SourceFile::from_bytes(Path::new("/tmp/reports/2023 재무제표.png"), vec![1, 2, 3]).unwrap();
        assert_eq!(file.base_name, "2023 재무제표");
        assert_eq!(file.kind.mime_type(), "image/png");

        assert!(SourceFile::from_bytes(Path::new("notes.txt"), Vec::new()).is_none());
        assert!(SourceFile::from_bytes(Path::new("no_extension"), Vec::new()).is_none());
    }
}
