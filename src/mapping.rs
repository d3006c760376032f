//! Declarative predicate-to-path mapping tables
//!
//! A table is YAML configuration: which predicates feed which dotted
//! canonical paths, plus sub-tables for distributions, contacts, spatial and
//! temporal coverage and keywords. The `dcat` and `schema-org` tables ship
//! with the crate.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{CrosswalkError, Result};
use crate::vocab::expand_with;

const DCAT_TABLE: &str = include_str!("mappings/dcat.yml");
const SCHEMA_ORG_TABLE: &str = include_str!("mappings/schema_org.yml");

/// Names of the tables embedded in the crate
pub const BUILTIN_TABLES: &[&str] = &["dcat", "schema-org"];

/// One predicate feeding one canonical path
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMapping {
    /// Compact IRI or property path (`vcard:hasAddress/vcard:locality`)
    pub predicate: String,
    /// Dotted canonical path
    pub path: String,
    /// Group literal values per language tag
    #[serde(default)]
    pub multilingual: bool,
}

/// A class marking the described entity, with its hierarchy level
#[derive(Debug, Clone, Deserialize)]
pub struct EntityType {
    pub class: String,
    pub hierarchylevel: String,
}

/// Nested table applied to each related node (distributions)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubMapping {
    #[serde(default)]
    pub predicates: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactRole {
    pub predicate: String,
    pub role: String,
}

/// Contact extraction
///
/// A field mapped to `name` is attributed to `organization` when the
/// contact node carries one of `organization_types`, to `individualname`
/// otherwise.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactMapping {
    #[serde(default)]
    pub roles: Vec<ContactRole>,
    #[serde(default)]
    pub organization_types: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
}

/// How a geometry value is encoded in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryEncoding {
    /// WKT literal, optionally prefixed by `<crs-iri>`
    Wkt,
    /// JSON array of four numbers
    Bbox,
    /// schema.org box: `"south west north east"`
    SchemaBox,
    /// schema.org GeoCoordinates node with latitude/longitude
    SchemaPoint,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeometryMapping {
    pub predicate: String,
    pub encoding: GeometryEncoding,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpatialMapping {
    #[serde(default)]
    pub predicates: Vec<String>,
    #[serde(default)]
    pub geometries: Vec<GeometryMapping>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemporalMapping {
    #[serde(default)]
    pub predicates: Vec<String>,
    #[serde(default)]
    pub begin: Vec<String>,
    #[serde(default)]
    pub end: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeywordMapping {
    #[serde(default)]
    pub predicates: Vec<String>,
    /// Label predicates tried on keyword nodes
    #[serde(default)]
    pub labels: Vec<String>,
    /// Predicates linking a keyword node to its vocabulary
    #[serde(default)]
    pub schemes: Vec<String>,
    /// Label predicates tried on vocabulary nodes
    #[serde(default)]
    pub scheme_labels: Vec<String>,
    /// Split literal keyword lists on this separator
    #[serde(default)]
    pub separator: Option<String>,
}

/// A complete crosswalk table for one dialect
#[derive(Debug, Clone, Deserialize)]
pub struct MappingTable {
    pub name: String,
    /// Extra compact prefixes, consulted before the built-in ones
    #[serde(default)]
    pub prefixes: Map<String, Value>,
    #[serde(default)]
    pub language: Vec<String>,
    #[serde(default)]
    pub entity_types: Vec<EntityType>,
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
    #[serde(default)]
    pub distribution: SubMapping,
    #[serde(default)]
    pub contact: ContactMapping,
    #[serde(default)]
    pub spatial: SpatialMapping,
    #[serde(default)]
    pub temporal: TemporalMapping,
    #[serde(default)]
    pub keywords: KeywordMapping,
}

impl MappingTable {
    /// Parse and validate a table from YAML
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let table: MappingTable = serde_yaml::from_str(text)
            .map_err(|e| CrosswalkError::InvalidMapping(e.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    /// One of the tables shipped with the crate
    pub fn builtin(name: &str) -> Result<Self> {
        let text = match name {
            "dcat" => DCAT_TABLE,
            "schema-org" | "schema_org" | "schemaorg" => SCHEMA_ORG_TABLE,
            other => {
                return Err(CrosswalkError::InvalidMapping(format!(
                    "no built-in table named '{}'",
                    other
                )))
            }
        };
        Self::from_yaml_str(text)
    }

    fn validate(&self) -> Result<()> {
        let all_fields = self
            .fields
            .iter()
            .chain(&self.distribution.fields)
            .chain(&self.contact.fields);
        for field in all_fields {
            if field.path.trim().is_empty() || field.path.split('.').any(str::is_empty) {
                return Err(CrosswalkError::InvalidMapping(format!(
                    "invalid path '{}' for predicate '{}'",
                    field.path, field.predicate
                )));
            }
            if self.path(&field.predicate).is_empty() {
                return Err(CrosswalkError::InvalidMapping(format!(
                    "empty predicate for path '{}'",
                    field.path
                )));
            }
        }
        Ok(())
    }

    /// Expand a compact IRI using this table's prefixes
    pub fn expand(&self, compact: &str) -> String {
        expand_with(compact, &self.prefixes)
    }

    /// Expand a predicate or property path into full IRIs, hop by hop
    pub fn path(&self, predicate: &str) -> Vec<String> {
        split_path(predicate)
            .into_iter()
            .map(|hop| self.expand(hop))
            .collect()
    }

    pub fn paths<'a>(&'a self, predicates: &'a [String]) -> impl Iterator<Item = Vec<String>> + 'a {
        predicates.iter().map(move |p| self.path(p))
    }

    /// Hierarchy level for an entity class IRI
    pub fn hierarchy_level(&self, class_iri: &str) -> Option<&str> {
        self.entity_types
            .iter()
            .find(|t| self.expand(&t.class) == class_iri)
            .map(|t| t.hierarchylevel.as_str())
    }
}

/// Split a property path on `/`, leaving bracketed IRIs intact
fn split_path(path: &str) -> Vec<&str> {
    let mut hops = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in path.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                hops.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    hops.push(&path[start..]);
    hops.into_iter()
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .collect()
}
