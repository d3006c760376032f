//! Canonical document resolution
//!
//! Reads an MCF document and folds every `base_mcf` reference into it,
//! producing one fully merged document. Base documents may themselves
//! inherit from other documents; chains of any depth are resolved
//! depth-first before being merged into the referencing mapping.
//!
//! Relative base paths are always resolved against the directory of the
//! top-level document, not the directory of the document holding the
//! reference.

use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::error::{CrosswalkError, Result};
use crate::loader::{load, DocumentSource};
use crate::merge::merge_base;
use crate::model::{value_kind, Document, BASE_MCF_KEY};

/// MCF versions this crate reads
pub const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// Options for document resolution
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Directory for relative `base_mcf` paths when the top-level document
    /// is not a file (defaults to the current directory)
    pub base_dir: Option<PathBuf>,
    /// Accepted `mcf.version` values; a document version must be a prefix
    /// of one of them
    pub supported_versions: Vec<String>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            base_dir: None,
            supported_versions: SUPPORTED_VERSIONS.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// Read an MCF document and resolve its inheritance chain
pub fn read_mcf(source: impl Into<DocumentSource>, options: &ResolveOptions) -> Result<Document> {
    let source = source.into();
    tracing::debug!(source = %source.describe(), "reading MCF");

    let mut doc = load(&source)?;

    let root_dir = source
        .base_dir()
        .or_else(|| options.base_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut resolver = InheritanceResolver {
        root_dir,
        chain: source.identity().into_iter().collect(),
    };

    tracing::debug!("recursively resolving base_mcf references");
    resolver.resolve_map(doc.as_map_mut())?;

    let version = check_version(&doc, &options.supported_versions)?;
    tracing::info!(version = %version, "MCF version");

    Ok(doc)
}

/// Validate `mcf.version`, returning it on success
pub fn check_version(doc: &Document, supported: &[String]) -> Result<String> {
    let version = match doc.version() {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            tracing::error!("no MCF version specified");
            return Err(CrosswalkError::DocumentRead(
                "no MCF version specified".to_string(),
            ));
        }
    };

    if supported.iter().any(|s| s.starts_with(version.as_str())) {
        Ok(version)
    } else {
        tracing::error!(version = %version, "invalid / unsupported MCF version");
        Err(CrosswalkError::DocumentRead(format!(
            "invalid / unsupported version {}",
            version
        )))
    }
}

/// Walks a document tree and folds `base_mcf` references into it
struct InheritanceResolver {
    /// Directory of the top-level document
    root_dir: PathBuf,
    /// Identities of the documents currently being resolved, outermost first
    chain: Vec<String>,
}

impl InheritanceResolver {
    fn resolve_map(&mut self, map: &mut Map<String, Value>) -> Result<()> {
        if let Some(reference) = map.remove(BASE_MCF_KEY) {
            let base = self.load_base(reference)?;
            merge_base(map, base);
        }

        for value in map.values_mut() {
            self.resolve_value(value)?;
        }

        Ok(())
    }

    fn resolve_value(&mut self, value: &mut Value) -> Result<()> {
        match value {
            Value::Object(obj) => self.resolve_map(obj),
            Value::Array(arr) => {
                for item in arr.iter_mut() {
                    self.resolve_value(item)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Load and fully resolve the document a `base_mcf` value points at
    fn load_base(&mut self, reference: Value) -> Result<Map<String, Value>> {
        match reference {
            Value::String(path) => {
                let source = DocumentSource::Path(self.root_dir.join(&path));
                let identity = source.identity().unwrap_or_else(|| path.clone());

                if self.chain.contains(&identity) {
                    return Err(CrosswalkError::CyclicInheritance(identity));
                }

                tracing::debug!(base = %identity, depth = self.chain.len(), "loading base MCF");
                let mut base = load(&source)?.into_map();

                self.chain.push(identity);
                let resolved = self.resolve_map(&mut base);
                self.chain.pop();
                resolved?;

                Ok(base)
            }
            Value::Object(mut embedded) => {
                tracing::debug!("resolving embedded base MCF");
                self.resolve_map(&mut embedded)?;
                Ok(embedded)
            }
            other => Err(CrosswalkError::DocumentRead(format!(
                "base_mcf must be a path or a mapping, found {}",
                value_kind(&other)
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use std::path::Path;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_leaf_document_unchanged() {
        let original = json!({
            "mcf": {"version": "1.0"},
            "metadata": {"identifier": "leaf", "language": "en"},
            "identification": {"title": {"en": "T", "fr": "T FR"}}
        });
        let doc = read_mcf(original.clone(), &ResolveOptions::default()).unwrap();
        assert_eq!(doc.to_value(), original);
    }

    #[test]
    fn test_override_precedence() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "parent.yml",
            "mcf:\n  version: 1.0\nidentification:\n  title: Base\n  abstract: Shared\n",
        );
        let child = write(
            dir.path(),
            "child.yml",
            "base_mcf: parent.yml\nmetadata:\n  identifier: child\nidentification:\n  title: Override\n",
        );

        let doc = read_mcf(child, &ResolveOptions::default()).unwrap();
        assert_eq!(
            doc.get("identification"),
            Some(&json!({"title": "Override", "abstract": "Shared"}))
        );
        assert_eq!(doc.get_str("metadata.identifier"), Some("child"));
        assert!(!doc.contains_key_deep(BASE_MCF_KEY));
    }

    #[test]
    fn test_multi_level_chain() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "a.yml",
            "mcf:\n  version: 1.0\nidentification:\n  abstract: From A\n  title: A\n  edition: A\n",
        );
        write(
            dir.path(),
            "b.yml",
            "base_mcf: a.yml\nidentification:\n  title: B\n",
        );
        let c = write(
            dir.path(),
            "c.yml",
            "base_mcf: b.yml\nmetadata:\n  identifier: c\nidentification:\n  edition: C\n",
        );

        let doc = read_mcf(c, &ResolveOptions::default()).unwrap();
        assert_eq!(doc.get_str("identification.abstract"), Some("From A"));
        assert_eq!(doc.get_str("identification.title"), Some("B"));
        assert_eq!(doc.get_str("identification.edition"), Some("C"));
        assert_eq!(doc.version(), Some("1.0".to_string()));
        assert!(!doc.contains_key_deep(BASE_MCF_KEY));
    }

    #[test]
    fn test_nested_section_base() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "contact.yml",
            "organization: Shared Org\ncity: Ottawa\n",
        );
        let child = write(
            dir.path(),
            "child.yml",
            "mcf:\n  version: 1.0\ncontact:\n  main:\n    base_mcf: contact.yml\n    city: Toronto\n",
        );

        let doc = read_mcf(child, &ResolveOptions::default()).unwrap();
        assert_eq!(
            doc.get("contact.main"),
            Some(&json!({"city": "Toronto", "organization": "Shared Org"}))
        );
    }

    #[test]
    fn test_base_paths_relative_to_top_level_document() {
        let dir = tempfile::tempdir().unwrap();
        // b.yml lives in sub/ but references a.yml, which resolves next to the root
        write(dir.path(), "a.yml", "mcf:\n  version: 1.0\nidentification:\n  abstract: Root A\n");
        write(dir.path(), "sub/a.yml", "identification:\n  abstract: Sub A\n");
        write(dir.path(), "sub/b.yml", "base_mcf: a.yml\nidentification:\n  title: B\n");
        let top = write(dir.path(), "top.yml", "base_mcf: sub/b.yml\n");

        let doc = read_mcf(top, &ResolveOptions::default()).unwrap();
        assert_eq!(doc.get_str("identification.abstract"), Some("Root A"));
        assert_eq!(doc.get_str("identification.title"), Some("B"));
    }

    #[test]
    fn test_text_input_uses_base_dir_option() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "parent.yml", "mcf:\n  version: 1.0\nidentification:\n  title: Base\n");

        let options = ResolveOptions {
            base_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let doc = read_mcf(
            "base_mcf: parent.yml\nmetadata:\n  identifier: text\n",
            &options,
        )
        .unwrap();
        assert_eq!(doc.get_str("identification.title"), Some("Base"));
        assert_eq!(doc.get_str("metadata.identifier"), Some("text"));
    }

    #[test]
    fn test_embedded_base() {
        let doc = read_mcf(
            json!({
                "base_mcf": {
                    "mcf": {"version": "1.0"},
                    "identification": {"title": "Embedded", "abstract": "Kept"}
                },
                "identification": {"title": "Child"}
            }),
            &ResolveOptions::default(),
        )
        .unwrap();
        assert_eq!(doc.get_str("identification.title"), Some("Child"));
        assert_eq!(doc.get_str("identification.abstract"), Some("Kept"));
    }

    #[test]
    fn test_cycle_detected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.yml", "mcf:\n  version: 1.0\nbase_mcf: b.yml\n");
        write(dir.path(), "b.yml", "base_mcf: a.yml\n");
        let a = dir.path().join("a.yml");

        let err = read_mcf(a, &ResolveOptions::default()).unwrap_err();
        assert!(matches!(err, CrosswalkError::CyclicInheritance(_)));
    }

    #[test]
    fn test_self_reference_detected() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "self.yml", "mcf:\n  version: 1.0\nbase_mcf: self.yml\n");

        let err = read_mcf(a, &ResolveOptions::default()).unwrap_err();
        assert!(matches!(err, CrosswalkError::CyclicInheritance(_)));
    }

    #[test]
    fn test_shared_base_is_not_a_cycle() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "org.yml", "organization: Shared\n");
        let child = write(
            dir.path(),
            "child.yml",
            "mcf:\n  version: 1.0\ncontact:\n  a:\n    base_mcf: org.yml\n  b:\n    base_mcf: org.yml\n",
        );

        let doc = read_mcf(child, &ResolveOptions::default()).unwrap();
        assert_eq!(doc.get_str("contact.a.organization"), Some("Shared"));
        assert_eq!(doc.get_str("contact.b.organization"), Some("Shared"));
    }

    #[test]
    fn test_missing_base_propagates_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let child = write(dir.path(), "child.yml", "mcf:\n  version: 1.0\nbase_mcf: 404.yml\n");

        let err = read_mcf(child, &ResolveOptions::default()).unwrap_err();
        match err {
            CrosswalkError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_version_gate() {
        let options = ResolveOptions::default();

        let missing = read_mcf(json!({"metadata": {"identifier": "x"}}), &options).unwrap_err();
        assert!(matches!(missing, CrosswalkError::DocumentRead(_)));

        let bad = read_mcf(json!({"mcf": {"version": "9.9"}}), &options).unwrap_err();
        assert!(matches!(bad, CrosswalkError::DocumentRead(_)));

        assert!(read_mcf(json!({"mcf": {"version": "1.0"}}), &options).is_ok());
        assert!(read_mcf("mcf:\n  version: 1.0\nmetadata: {}\n", &options).is_ok());
    }

    #[test]
    fn test_version_inherited_from_base() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "base.yml", "mcf:\n  version: 1.0\n");
        let child = write(dir.path(), "child.yml", "base_mcf: base.yml\nmetadata:\n  identifier: c\n");
        assert!(read_mcf(child, &ResolveOptions::default()).is_ok());
    }

    #[test]
    fn test_file_directory_wins_over_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        write(dir.path(), "base.yml", "mcf:\n  version: 1.0\nmetadata:\n  language: en\n");
        write(elsewhere.path(), "base.yml", "mcf:\n  version: 1.0\nmetadata:\n  language: fr\n");
        let child = write(dir.path(), "child.yml", "base_mcf: base.yml\n");

        let options = ResolveOptions {
            base_dir: Some(elsewhere.path().to_path_buf()),
            ..ResolveOptions::default()
        };
        let doc = read_mcf(child, &options).unwrap();
        assert_eq!(doc.get_str("metadata.language"), Some("en"));

        let doc = read_mcf("base_mcf: base.yml\nmetadata:\n  identifier: t\n", &options).unwrap();
        assert_eq!(doc.get_str("metadata.language"), Some("fr"));
    }
}
