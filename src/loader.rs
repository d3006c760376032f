//! Loading MCF documents from paths, raw text, or parsed values

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{CrosswalkError, Result};
use crate::model::{value_kind, Document};

/// Marker whose presence identifies raw MCF text rather than a file path
const MCF_TEXT_MARKER: &str = "metadata:";

/// Source from which to load an MCF document
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// YAML or JSON file on disk
    Path(PathBuf),
    /// Raw YAML or JSON text
    Text(String),
    /// An already-parsed document tree
    Parsed(Value),
}

impl DocumentSource {
    /// Classify a string as either raw document text or a file path
    pub fn detect(input: &str) -> Self {
        let trimmed = input.trim_start();
        if input.contains(MCF_TEXT_MARKER) || trimmed.starts_with('{') {
            DocumentSource::Text(input.to_string())
        } else {
            DocumentSource::Path(PathBuf::from(input))
        }
    }

    /// Identity used to detect inheritance cycles (canonical path for files)
    pub fn identity(&self) -> Option<String> {
        match self {
            DocumentSource::Path(p) => Some(
                p.canonicalize()
                    .unwrap_or_else(|_| p.clone())
                    .display()
                    .to_string(),
            ),
            _ => None,
        }
    }

    /// Directory that relative `base_mcf` references are resolved against
    pub fn base_dir(&self) -> Option<PathBuf> {
        match self {
            DocumentSource::Path(p) => {
                let absolute = p.canonicalize().unwrap_or_else(|_| p.clone());
                absolute.parent().map(Path::to_path_buf)
            }
            _ => None,
        }
    }

    /// Short description for log lines
    pub fn describe(&self) -> String {
        match self {
            DocumentSource::Path(p) => p.display().to_string(),
            DocumentSource::Text(_) => "<text>".to_string(),
            DocumentSource::Parsed(_) => "<parsed>".to_string(),
        }
    }
}

impl From<Value> for DocumentSource {
    fn from(value: Value) -> Self {
        DocumentSource::Parsed(value)
    }
}

impl From<PathBuf> for DocumentSource {
    fn from(path: PathBuf) -> Self {
        DocumentSource::Path(path)
    }
}

impl From<&Path> for DocumentSource {
    fn from(path: &Path) -> Self {
        DocumentSource::Path(path.to_path_buf())
    }
}

impl From<&str> for DocumentSource {
    fn from(input: &str) -> Self {
        DocumentSource::detect(input)
    }
}

/// Parse YAML (a superset of JSON) text into a document tree
pub fn parse_text(content: &str, origin: &str) -> Result<Value> {
    serde_yaml::from_str::<Value>(content)
        .map_err(|e| CrosswalkError::DocumentParse(format!("{}: {}", origin, e)))
}

/// Load a file's content, keeping not-found and permission errors intact
pub fn read_file(path: &Path) -> Result<String> {
    if path.is_dir() {
        return Err(CrosswalkError::InvalidPath(path.to_path_buf()));
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Load a document from any source without resolving inheritance
pub fn load(source: &DocumentSource) -> Result<Document> {
    let value = match source {
        DocumentSource::Parsed(v) => {
            tracing::debug!("document is already parsed");
            v.clone()
        }
        DocumentSource::Text(text) => {
            tracing::debug!("document is raw text");
            parse_text(text, "<text>")?
        }
        DocumentSource::Path(path) => {
            tracing::debug!(path = %path.display(), "document is a file path");
            let content = read_file(path)?;
            parse_text(&content, &path.display().to_string())?
        }
    };

    match value {
        Value::Object(map) => Ok(Document::from_map(map)),
        other => Err(CrosswalkError::DocumentParse(format!(
            "{}: document root must be a mapping, found {}",
            source.describe(),
            value_kind(&other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_detect_text() {
        let source = DocumentSource::detect("mcf:\n  version: 1.0\nmetadata:\n  identifier: x\n");
        assert!(matches!(source, DocumentSource::Text(_)));

        let source = DocumentSource::detect("{\"mcf\": {\"version\": \"1.0\"}}");
        assert!(matches!(source, DocumentSource::Text(_)));
    }

    #[test]
    fn test_detect_path() {
        let source = DocumentSource::detect("records/sample.yml");
        assert!(matches!(source, DocumentSource::Path(_)));
    }

    #[test]
    fn test_load_text() {
        let doc = load(&DocumentSource::Text(
            "mcf:\n  version: 1.0\nmetadata:\n  identifier: abc\n".to_string(),
        ))
        .unwrap();
        assert_eq!(doc.get_str("metadata.identifier"), Some("abc"));
        assert_eq!(doc.version(), Some("1.0".to_string()));
    }

    #[test]
    fn test_load_parsed() {
        let doc = load(&DocumentSource::Parsed(json!({"metadata": {"identifier": "p"}}))).unwrap();
        assert_eq!(doc.get_str("metadata.identifier"), Some("p"));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "metadata:\n  identifier: from-file").unwrap();
        let doc = load(&DocumentSource::Path(file.path().to_path_buf())).unwrap();
        assert_eq!(doc.get_str("metadata.identifier"), Some("from-file"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load(&DocumentSource::Path(PathBuf::from("/nonexistent/404.yml"))).unwrap_err();
        match err {
            CrosswalkError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_broken_yaml() {
        let err = load(&DocumentSource::Text(
            "metadata:\n  identifier: [unclosed\n".to_string(),
        ))
        .unwrap_err();
        assert!(matches!(err, CrosswalkError::DocumentParse(_)));
    }

    #[test]
    fn test_non_mapping_root() {
        let err = load(&DocumentSource::Parsed(json!("metadata: scalar"))).unwrap_err();
        assert!(matches!(err, CrosswalkError::DocumentParse(_)));
    }
}
