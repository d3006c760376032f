//! RDF crosswalk import
//!
//! Projects the entity described by an RDF document of unknown
//! serialization into a canonical document, driven by a mapping table.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde_json::{json, Map, Value};
use ulid::Ulid;

use crate::coerce::{
    first_literal, multilingual_value, node_text, scalar_value, strip_contact_scheme,
};
use crate::entity::{detect_language, find_main_entity, hierarchy_level};
use crate::error::{CrosswalkError, Result};
use crate::geometry::{parse_any, parse_bbox_values, parse_geometry, SpatialExtent};
use crate::graph::{Graph, Node};
use crate::mapping::{FieldMapping, GeometryEncoding, MappingTable};
use crate::merge::push_unique;
use crate::model::{get_path, insert_path, merge_localized_at, merge_scalar_at, Document};
use crate::parse::{inject_context, parse_prepared};
use crate::vocab::SCHEMA_NS;

/// MCF version written on imported documents
pub const IMPORTED_MCF_VERSION: &str = "1.0";

/// Bucket for keywords without a governing vocabulary
pub const DEFAULT_KEYWORD_BUCKET: &str = "default";

/// Options for an import call
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Language assumed when the entity declares none
    pub default_language: String,
    /// Directory that `base_mcf` references of MCF input resolve against
    pub base_dir: Option<PathBuf>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            base_dir: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImportState {
    Start,
    ContextChecked,
    Parsed,
    MainEntityResolved,
    Mapped,
    SecondaryExtracted,
    Validated,
    Done,
}

impl fmt::Display for ImportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportState::Start => "start",
            ImportState::ContextChecked => "context-checked",
            ImportState::Parsed => "parsed",
            ImportState::MainEntityResolved => "main-entity-resolved",
            ImportState::Mapped => "mapped",
            ImportState::SecondaryExtracted => "secondary-extracted",
            ImportState::Validated => "validated",
            ImportState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Forward-only progress of one import call
struct Progress(ImportState);

impl Progress {
    fn advance(&mut self, next: ImportState) {
        tracing::debug!(from = %self.0, to = %next, "import state");
        self.0 = next;
    }

    fn fail(&self, error: CrosswalkError) -> CrosswalkError {
        tracing::debug!(from = %self.0, error = %error, "import failed");
        error
    }
}

/// Import an RDF document into a canonical document
///
/// # Arguments
/// * `text` - RDF in any supported serialization
/// * `table` - Mapping table for the source vocabulary
/// * `options` - Import options
pub fn import(text: &str, table: &MappingTable, options: &ImportOptions) -> Result<Document> {
    let mut progress = Progress(ImportState::Start);

    let jsonld = inject_context(text);
    progress.advance(ImportState::ContextChecked);

    let (graph, format) = parse_prepared(text, &jsonld).map_err(|e| progress.fail(e))?;
    progress.advance(ImportState::Parsed);

    let entity = find_main_entity(&graph, table).map_err(|e| progress.fail(e))?;
    progress.advance(ImportState::MainEntityResolved);

    let language = detect_language(&graph, &entity, table)
        .unwrap_or_else(|| options.default_language.clone());
    tracing::info!(table = %table.name, format = %format, entity = %entity, language = %language, "importing");

    let importer = Importer {
        graph: &graph,
        table,
        language: &language,
    };

    let mut doc = Map::new();
    importer.apply_fields(&entity, &table.fields, &mut doc);
    progress.advance(ImportState::Mapped);

    importer.extract_distributions(&entity, &mut doc);
    importer.extract_contacts(&entity, &mut doc);
    importer.extract_spatial(&entity, &mut doc);
    importer.extract_temporal(&entity, &mut doc);
    importer.extract_keywords(&entity, &mut doc);
    reconcile_identifier(&entity, &mut doc);
    progress.advance(ImportState::SecondaryExtracted);

    let has_identification = doc
        .get("identification")
        .and_then(Value::as_object)
        .is_some_and(|section| !section.is_empty());
    if !has_identification {
        return Err(progress.fail(CrosswalkError::EmptyResult));
    }
    copy_distribution_terms(&mut doc);

    insert_path(&mut doc, "mcf.version", json!(IMPORTED_MCF_VERSION));
    insert_path(&mut doc, "metadata.language", json!(language));
    if let Some(level) = hierarchy_level(&graph, &entity, table) {
        insert_path(&mut doc, "metadata.hierarchylevel", json!(level));
    }
    progress.advance(ImportState::Validated);

    let doc = order_sections(doc);
    progress.advance(ImportState::Done);
    Ok(Document::from_map(doc))
}

struct Importer<'a> {
    graph: &'a Graph,
    table: &'a MappingTable,
    language: &'a str,
}

impl Importer<'_> {
    /// Apply field mappings from `subject` into `target`
    fn apply_fields(&self, subject: &Node, fields: &[FieldMapping], target: &mut Map<String, Value>) {
        for field in fields {
            let objects = self.graph.follow(subject, &self.table.path(&field.predicate));
            if objects.is_empty() {
                continue;
            }
            if field.multilingual {
                match multilingual_value(self.graph, &objects, self.language) {
                    Some(value) => merge_localized_at(target, &field.path, value, self.language),
                    None => tracing::debug!(path = %field.path, "no usable value"),
                }
            } else {
                match scalar_value(self.graph, &objects) {
                    Some(value) => merge_scalar_at(target, &field.path, value),
                    None => tracing::debug!(path = %field.path, "no usable value"),
                }
            }
        }
    }

    fn related(&self, subject: &Node, predicates: &[String]) -> Vec<Node> {
        let mut nodes = Vec::new();
        for path in self.table.paths(predicates) {
            for node in self.graph.follow(subject, &path) {
                if !nodes.contains(&node) {
                    nodes.push(node);
                }
            }
        }
        nodes
    }

    fn extract_distributions(&self, entity: &Node, doc: &mut Map<String, Value>) {
        let mapping = &self.table.distribution;
        let mut distributions = Map::new();

        for node in self.related(entity, &mapping.predicates) {
            let mut record = Map::new();
            match &node {
                Node::Literal(lit) => {
                    record.insert("url".to_string(), json!(lit.value.trim()));
                }
                resource => {
                    self.apply_fields(resource, &mapping.fields, &mut record);
                    if let (Node::Iri(iri), false) = (resource, record.contains_key("url")) {
                        record.insert("url".to_string(), json!(iri));
                    }
                }
            }
            if record.is_empty() {
                continue;
            }
            let key = format!("distribution-{}", Ulid::new().to_string().to_lowercase());
            tracing::debug!(key = %key, "extracted distribution");
            distributions.insert(key, Value::Object(record));
        }

        if !distributions.is_empty() {
            doc.insert("distribution".to_string(), Value::Object(distributions));
        }
    }

    fn is_organization(&self, node: &Node) -> bool {
        let classes: Vec<String> = self
            .table
            .contact
            .organization_types
            .iter()
            .map(|c| self.table.expand(c))
            .collect();
        self.graph.types(node).any(|t| classes.iter().any(|c| c == t))
    }

    fn extract_contacts(&self, entity: &Node, doc: &mut Map<String, Value>) {
        let mapping = &self.table.contact;
        let mut contacts = Map::new();

        for role in &mapping.roles {
            let path = self.table.path(&role.predicate);
            for node in self.graph.follow(entity, &path) {
                let mut record = self.contact_record(&node);
                if record.is_empty() {
                    tracing::debug!(role = %role.role, node = %node, "contact without details");
                    continue;
                }
                record.insert("role".to_string(), json!(role.role));
                let key = format!("{}-{}", role.role, Ulid::new().to_string().to_lowercase());
                tracing::debug!(key = %key, "extracted contact");
                contacts.insert(key, Value::Object(record));
            }
        }

        if !contacts.is_empty() {
            doc.insert("contact".to_string(), Value::Object(contacts));
        }
    }

    fn contact_record(&self, node: &Node) -> Map<String, Value> {
        let mut record = Map::new();
        let is_org = self.is_organization(node);

        match node {
            Node::Literal(lit) => {
                let field = if is_org { "organization" } else { "individualname" };
                record.insert(field.to_string(), json!(lit.value.trim()));
                return record;
            }
            Node::Iri(iri) if !self.graph.has_subject(node) => {
                record.insert("url".to_string(), json!(iri));
                return record;
            }
            _ => {}
        }

        self.apply_fields(node, &self.table.contact.fields, &mut record);

        if let Some(name) = record.remove("name") {
            let field = if is_org { "organization" } else { "individualname" };
            record.entry(field.to_string()).or_insert(name);
        }
        if is_org && !record.contains_key("organization") {
            if let Some(name) = record.remove("individualname") {
                record.insert("organization".to_string(), name);
            }
        }
        for field in ["email", "phone"] {
            if let Some(Value::String(value)) = record.get(field) {
                let stripped = strip_contact_scheme(value);
                record.insert(field.to_string(), json!(stripped));
            }
        }
        record
    }

    fn extract_spatial(&self, entity: &Node, doc: &mut Map<String, Value>) {
        let mut extents: Vec<Value> = Vec::new();
        let mut loose_numbers: Vec<&str> = Vec::new();

        let nodes = self.related(entity, &self.table.spatial.predicates);
        for node in &nodes {
            match self.spatial_extent(node) {
                Some(extent) => {
                    push_unique(&mut extents, extent.to_value());
                }
                None => match node.as_literal() {
                    Some(lit) if lit.value.trim().parse::<f64>().is_ok() => {
                        loose_numbers.push(&lit.value)
                    }
                    _ => tracing::debug!(node = %node, "dropping unparsable geometry"),
                },
            }
        }

        if !loose_numbers.is_empty() {
            match parse_bbox_values(loose_numbers.iter().copied()) {
                Some(extent) => {
                    push_unique(&mut extents, extent.to_value());
                }
                None => tracing::debug!(count = loose_numbers.len(), "dropping loose coordinates"),
            }
        }

        if !extents.is_empty() {
            insert_path(doc, "identification.extents.spatial", Value::Array(extents));
        }
    }

    fn spatial_extent(&self, node: &Node) -> Option<SpatialExtent> {
        if let Node::Literal(lit) = node {
            return parse_any(&lit.value);
        }
        if let Some(extent) = self.list_extent(node) {
            return Some(extent);
        }
        self.table.spatial.geometries.iter().find_map(|geometry| {
            let path = self.table.path(&geometry.predicate);
            let values = self.graph.follow(node, &path);
            let single = values.iter().find_map(|value| match (geometry.encoding, value) {
                (GeometryEncoding::SchemaPoint, point) if !point.is_literal() => {
                    self.schema_point(point)
                }
                (encoding, Node::Literal(lit)) => parse_geometry(&lit.value, encoding),
                (_, head) => self.list_extent(head),
            });
            single.or_else(|| match geometry.encoding {
                // an unordered array arrives as one literal per coordinate
                GeometryEncoding::Wkt | GeometryEncoding::Bbox => {
                    parse_bbox_values(literal_texts(&values)?)
                }
                _ => None,
            })
        })
    }

    /// Bounding box held in an RDF list of four numbers
    fn list_extent(&self, head: &Node) -> Option<SpatialExtent> {
        let items = self.graph.list(head)?;
        parse_bbox_values(literal_texts(&items)?)
    }

    fn schema_point(&self, point: &Node) -> Option<SpatialExtent> {
        let coordinate = |name: &str| -> Option<f64> {
            first_literal(self.graph, point, &[vec![format!("{}{}", SCHEMA_NS, name)]])?
                .parse()
                .ok()
        };
        Some(SpatialExtent::point(coordinate("longitude")?, coordinate("latitude")?))
    }

    fn extract_temporal(&self, entity: &Node, doc: &mut Map<String, Value>) {
        let mapping = &self.table.temporal;
        let begin_paths: Vec<Vec<String>> = self.table.paths(&mapping.begin).collect();
        let end_paths: Vec<Vec<String>> = self.table.paths(&mapping.end).collect();
        let mut periods: Vec<Value> = Vec::new();

        for node in self.related(entity, &mapping.predicates) {
            let (begin, end) = match &node {
                Node::Literal(lit) => split_interval(&lit.value),
                resource => (
                    first_literal(self.graph, resource, &begin_paths),
                    first_literal(self.graph, resource, &end_paths),
                ),
            };
            let mut period = Map::new();
            if let Some(begin) = begin {
                period.insert("begin".to_string(), json!(begin));
            }
            if let Some(end) = end {
                period.insert("end".to_string(), json!(end));
            }
            if period.is_empty() {
                tracing::debug!(node = %node, "dropping temporal coverage without dates");
                continue;
            }
            push_unique(&mut periods, Value::Object(period));
        }

        if !periods.is_empty() {
            insert_path(doc, "identification.extents.temporal", Value::Array(periods));
        }
    }

    fn extract_keywords(&self, entity: &Node, doc: &mut Map<String, Value>) {
        let mapping = &self.table.keywords;
        let label_paths: Vec<Vec<String>> = self.table.paths(&mapping.labels).collect();
        let scheme_paths: Vec<Vec<String>> = self.table.paths(&mapping.schemes).collect();
        let scheme_label_paths: Vec<Vec<String>> =
            self.table.paths(&mapping.scheme_labels).collect();

        let mut buckets: Vec<KeywordBucket> = Vec::new();

        for node in self.related(entity, &mapping.predicates) {
            let (key, vocabulary, words) = match &node {
                Node::Literal(lit) => {
                    let lang = lit.language.clone().unwrap_or_else(|| self.language.to_string());
                    let words = match &mapping.separator {
                        Some(sep) => lit
                            .value
                            .split(sep.as_str())
                            .map(|w| (lang.clone(), w.trim().to_string()))
                            .collect(),
                        None => vec![(lang, lit.value.trim().to_string())],
                    };
                    (DEFAULT_KEYWORD_BUCKET.to_string(), None, words)
                }
                resource => {
                    let words = self.keyword_labels(resource, &label_paths);
                    let scheme = scheme_paths
                        .iter()
                        .find_map(|path| self.graph.follow(resource, path).into_iter().next());
                    match scheme {
                        Some(scheme) => {
                            let key = match &scheme {
                                Node::Literal(lit) => lit.value.trim().to_string(),
                                resource => resource.identifier().unwrap_or_default().to_string(),
                            };
                            let vocabulary =
                                self.vocabulary(&scheme, &key, &scheme_label_paths);
                            (key, Some(vocabulary), words)
                        }
                        None => (DEFAULT_KEYWORD_BUCKET.to_string(), None, words),
                    }
                }
            };

            let index = match buckets.iter().position(|b| b.key == key) {
                Some(i) => i,
                None => {
                    buckets.push(KeywordBucket::new(key, vocabulary));
                    buckets.len() - 1
                }
            };
            for (lang, word) in words {
                buckets[index].add(lang, word);
            }
        }

        let keywords: Map<String, Value> = buckets
            .into_iter()
            .filter(|b| !b.words.is_empty())
            .map(|b| (b.key.clone(), b.into_value()))
            .collect();
        if !keywords.is_empty() {
            insert_path(doc, "identification.keywords", Value::Object(keywords));
        }
    }

    /// Labels of a keyword node, tagged with their language
    fn keyword_labels(&self, node: &Node, label_paths: &[Vec<String>]) -> Vec<(String, String)> {
        for path in label_paths {
            let labels: Vec<(String, String)> = self
                .graph
                .follow(node, path)
                .iter()
                .filter_map(Node::as_literal)
                .map(|lit| {
                    let lang = lit.language.clone().unwrap_or_else(|| self.language.to_string());
                    (lang, lit.value.trim().to_string())
                })
                .collect();
            if !labels.is_empty() {
                return labels;
            }
        }
        vec![(self.language.to_string(), node_text(self.graph, node))]
    }

    fn vocabulary(&self, scheme: &Node, key: &str, label_paths: &[Vec<String>]) -> Value {
        let name = first_literal(self.graph, scheme, label_paths).unwrap_or_else(|| key.to_string());
        let mut vocabulary = Map::new();
        vocabulary.insert("name".to_string(), json!(name));
        if let Node::Iri(iri) = scheme {
            vocabulary.insert("url".to_string(), json!(iri));
        }
        Value::Object(vocabulary)
    }
}

struct KeywordBucket {
    key: String,
    vocabulary: Option<Value>,
    words: BTreeMap<String, Vec<String>>,
}

impl KeywordBucket {
    fn new(key: String, vocabulary: Option<Value>) -> Self {
        Self {
            key,
            vocabulary,
            words: BTreeMap::new(),
        }
    }

    fn add(&mut self, lang: String, word: String) {
        if word.is_empty() {
            return;
        }
        let words = self.words.entry(lang).or_default();
        if !words.contains(&word) {
            words.push(word);
        }
    }

    /// A single language yields a bare list, several a per-language mapping
    fn into_value(self) -> Value {
        let keywords = if self.words.len() == 1 {
            let words = self.words.into_values().next().unwrap_or_default();
            json!(words)
        } else {
            Value::Object(
                self.words
                    .into_iter()
                    .map(|(lang, words)| (lang, json!(words)))
                    .collect(),
            )
        };
        let mut entry = Map::new();
        entry.insert("keywords".to_string(), keywords);
        if let Some(vocabulary) = self.vocabulary {
            entry.insert("vocabulary".to_string(), vocabulary);
        }
        Value::Object(entry)
    }
}

/// Lexical values of `nodes`, `None` if any is not a literal
fn literal_texts(nodes: &[Node]) -> Option<Vec<&str>> {
    nodes
        .iter()
        .map(|node| node.as_literal().map(|lit| lit.value.as_str()))
        .collect()
}

/// Split an interval literal `begin/end`; `..` or an empty side is open
fn split_interval(text: &str) -> (Option<String>, Option<String>) {
    let side = |s: &str| {
        let s = s.trim();
        if s.is_empty() || s == ".." {
            None
        } else {
            Some(s.to_string())
        }
    };
    match text.split_once('/') {
        Some((begin, end)) => (side(begin), side(end)),
        None => (side(text), None),
    }
}

/// Record the entity's own IRI as primary or additional identifier
fn reconcile_identifier(entity: &Node, doc: &mut Map<String, Value>) {
    let Node::Iri(iri) = entity else {
        return;
    };
    let existing = get_path(doc, "metadata.identifier")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    match existing {
        Some(id) if id == *iri => {}
        Some(_) => {
            let mut identifiers = match get_path(doc, "metadata.additional_identifiers") {
                Some(Value::Array(items)) => items.clone(),
                _ => Vec::new(),
            };
            if push_unique(&mut identifiers, json!({"identifier": iri, "scheme": "URI"})) {
                insert_path(doc, "metadata.additional_identifiers", Value::Array(identifiers));
            }
        }
        None => insert_path(doc, "metadata.identifier", json!(iri)),
    }
}

/// Copy license and rights of the first distribution carrying them
fn copy_distribution_terms(doc: &mut Map<String, Value>) {
    let first_with = |field: &str| -> Option<Value> {
        doc.get("distribution")?
            .as_object()?
            .values()
            .find_map(|d| d.get(field).cloned())
    };
    let license = first_with("license");
    let rights = first_with("rights");

    if let Some(license) = license {
        if get_path(doc, "identification.license").is_none() {
            let license = match license {
                Value::Object(obj) => Value::Object(obj),
                other => json!({"name": other}),
            };
            insert_path(doc, "identification.license", license);
        }
    }
    if let Some(rights) = rights {
        if get_path(doc, "identification.rights").is_none() {
            insert_path(doc, "identification.rights", rights);
        }
    }
}

const SECTION_ORDER: [&str; 5] = ["mcf", "metadata", "identification", "contact", "distribution"];

/// Put the well-known sections first, keeping anything else after them
fn order_sections(doc: Map<String, Value>) -> Map<String, Value> {
    let mut entries: Vec<(String, Value)> = doc.into_iter().collect();
    entries.sort_by_key(|(key, _)| {
        SECTION_ORDER
            .iter()
            .position(|section| section == key)
            .unwrap_or(SECTION_ORDER.len())
    });
    entries.into_iter().collect()
}
