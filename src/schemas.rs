//! Registry of metadata dialects
//!
//! Each dialect implements [`MetadataSchema`]; lookup is by identifier
//! through a fixed table.

use serde_json::Value;

use crate::crosswalk::{import, ImportOptions};
use crate::error::{CrosswalkError, Result};
use crate::export::to_dcat;
use crate::loader::DocumentSource;
use crate::mapping::MappingTable;
use crate::model::Document;
use crate::resolve::{read_mcf, ResolveOptions};

/// Result of a writer: a native structure or its serialized text
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Native(Value),
    Text(String),
}

impl Output {
    /// Serialized form, rendering native output as JSON
    pub fn into_text(self, pretty: bool) -> Result<String> {
        match self {
            Output::Text(text) => Ok(text),
            Output::Native(value) if pretty => Ok(serde_json::to_string_pretty(&value)?),
            Output::Native(value) => Ok(serde_json::to_string(&value)?),
        }
    }
}

/// Capabilities of one metadata dialect
pub trait MetadataSchema {
    /// Identifier used for lookup (`dcat`, `schema-org`, ...)
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Read foreign metadata into a canonical document
    fn import(&self, _text: &str, _options: &ImportOptions) -> Result<Document> {
        Err(CrosswalkError::UnsupportedOperation {
            schema: self.name().to_string(),
            operation: "import".to_string(),
        })
    }

    /// Write a canonical document in this dialect
    fn write(&self, _doc: &Document, _stringify: bool) -> Result<Output> {
        Err(CrosswalkError::UnsupportedOperation {
            schema: self.name().to_string(),
            operation: "write".to_string(),
        })
    }

    fn can_import(&self) -> bool;

    fn can_write(&self) -> bool;
}

/// Native MCF: import resolves inheritance, write emits YAML
pub struct McfSchema;

impl MetadataSchema for McfSchema {
    fn name(&self) -> &'static str {
        "mcf"
    }

    fn description(&self) -> &'static str {
        "Metadata Control File"
    }

    fn import(&self, text: &str, options: &ImportOptions) -> Result<Document> {
        let resolve_options = ResolveOptions {
            base_dir: options.base_dir.clone(),
            ..ResolveOptions::default()
        };
        read_mcf(DocumentSource::Text(text.to_string()), &resolve_options)
    }

    fn write(&self, doc: &Document, stringify: bool) -> Result<Output> {
        if !stringify {
            return Ok(Output::Native(doc.to_value()));
        }
        let text = serde_yaml::to_string(doc)
            .map_err(|e| CrosswalkError::DocumentParse(e.to_string()))?;
        Ok(Output::Text(text))
    }

    fn can_import(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        true
    }
}

/// W3C DCAT, read from any RDF serialization and written as JSON-LD
pub struct DcatSchema;

impl MetadataSchema for DcatSchema {
    fn name(&self) -> &'static str {
        "dcat"
    }

    fn description(&self) -> &'static str {
        "DCAT"
    }

    fn import(&self, text: &str, options: &ImportOptions) -> Result<Document> {
        import(text, &MappingTable::builtin("dcat")?, options)
    }

    fn write(&self, doc: &Document, stringify: bool) -> Result<Output> {
        to_dcat(doc, stringify)
    }

    fn can_import(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        true
    }
}

/// schema.org, read only
pub struct SchemaOrgSchema;

impl MetadataSchema for SchemaOrgSchema {
    fn name(&self) -> &'static str {
        "schema-org"
    }

    fn description(&self) -> &'static str {
        "schema.org"
    }

    fn import(&self, text: &str, options: &ImportOptions) -> Result<Document> {
        import(text, &MappingTable::builtin("schema-org")?, options)
    }

    fn can_import(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        false
    }
}

/// Every registered dialect, in listing order
pub fn available_schemas() -> Vec<Box<dyn MetadataSchema>> {
    vec![Box::new(McfSchema), Box::new(DcatSchema), Box::new(SchemaOrgSchema)]
}

/// Look up a dialect by identifier
pub fn load_schema(name: &str) -> Result<Box<dyn MetadataSchema>> {
    let wanted = name.trim().to_lowercase().replace('_', "-");
    available_schemas()
        .into_iter()
        .find(|schema| schema.name() == wanted)
        .ok_or_else(|| CrosswalkError::InvalidSchema(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_schema() {
        assert_eq!(load_schema("dcat").unwrap().name(), "dcat");
        assert_eq!(load_schema("schema_org").unwrap().name(), "schema-org");
        let err = load_schema("iso19139-9").err().unwrap();
        assert!(matches!(err, CrosswalkError::InvalidSchema(_)));
    }

    #[test]
    fn test_schema_org_write_unsupported() {
        let schema = load_schema("schema-org").unwrap();
        assert!(!schema.can_write());
        let err = schema.write(&Document::new(), true).unwrap_err();
        assert!(matches!(err, CrosswalkError::UnsupportedOperation { .. }));
    }

    #[test]
    fn test_dcat_round_trip_title() {
        let schema = load_schema("dcat").unwrap();
        let doc = schema
            .import(
                r#"<urn:x> a dcat:Dataset ; dct:title "Rain gauges"@en ."#,
                &ImportOptions::default(),
            )
            .unwrap();
        match schema.write(&doc, false).unwrap() {
            Output::Native(v) => assert_eq!(v["title"], json!("Rain gauges")),
            Output::Text(_) => panic!("expected native output"),
        }
    }

    #[test]
    fn test_mcf_import_and_write() {
        let schema = load_schema("mcf").unwrap();
        let doc = schema
            .import(
                "mcf:\n  version: '1.0'\nmetadata:\n  identifier: abc\n",
                &ImportOptions::default(),
            )
            .unwrap();
        assert_eq!(doc.get_str("metadata.identifier"), Some("abc"));

        let text = schema.write(&doc, true).unwrap().into_text(false).unwrap();
        assert!(text.contains("identifier: abc"));
    }

    #[test]
    fn test_output_into_text() {
        let out = Output::Native(json!({"a": 1}));
        assert_eq!(out.into_text(false).unwrap(), r#"{"a":1}"#);
    }
}
