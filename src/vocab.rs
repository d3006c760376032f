//! Vocabulary definitions for the RDF crosswalks
//!
//! Namespaces used by the built-in mapping tables, the default JSON-LD
//! context injected into context-less input, and the matching Turtle
//! prefix block.

use serde_json::{json, Map, Value};

pub const ADMS_NS: &str = "http://www.w3.org/ns/adms#";
pub const DCAT_NS: &str = "http://www.w3.org/ns/dcat#";
pub const DCT_NS: &str = "http://purl.org/dc/terms/";
pub const FOAF_NS: &str = "http://xmlns.com/foaf/0.1/";
pub const GSP_NS: &str = "http://www.opengis.net/ont/geosparql#";
pub const LOCN_NS: &str = "http://www.w3.org/ns/locn#";
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const SCHEMA_NS: &str = "http://schema.org/";
pub const SKOS_NS: &str = "http://www.w3.org/2004/02/skos/core#";
pub const TIME_NS: &str = "http://www.w3.org/2006/time#";
pub const VCARD_NS: &str = "http://www.w3.org/2006/vcard/ns#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

/// schema.org is published under both schemes; graphs are normalised to http
pub const SCHEMA_NS_HTTPS: &str = "https://schema.org/";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";

/// Compact prefixes understood by mapping tables and injected contexts
pub const PREFIXES: &[(&str, &str)] = &[
    ("adms", ADMS_NS),
    ("dcat", DCAT_NS),
    ("dct", DCT_NS),
    ("dcterms", DCT_NS),
    ("foaf", FOAF_NS),
    ("gsp", GSP_NS),
    ("locn", LOCN_NS),
    ("owl", OWL_NS),
    ("rdf", RDF_NS),
    ("rdfs", RDFS_NS),
    ("schema", SCHEMA_NS),
    ("skos", SKOS_NS),
    ("time", TIME_NS),
    ("vcard", VCARD_NS),
    ("xsd", XSD_NS),
];

/// Look up a namespace IRI by its compact prefix
pub fn namespace(prefix: &str) -> Option<&'static str> {
    PREFIXES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, ns)| *ns)
}

/// Expand a compact IRI (`dct:title`) using the built-in prefixes
///
/// Full IRIs, optionally wrapped in angle brackets, are returned unchanged.
pub fn expand(compact: &str) -> String {
    expand_with(compact, &Map::new())
}

/// Expand a compact IRI, consulting `extra` prefixes before the built-ins
pub fn expand_with(compact: &str, extra: &Map<String, Value>) -> String {
    let trimmed = compact.trim();
    if let Some(inner) = trimmed.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        return inner.to_string();
    }
    if let Some((prefix, local)) = trimmed.split_once(':') {
        if local.starts_with("//") {
            return trimmed.to_string();
        }
        if let Some(ns) = extra.get(prefix).and_then(|v| v.as_str()) {
            return format!("{}{}", ns, local);
        }
        if let Some(ns) = namespace(prefix) {
            return format!("{}{}", ns, local);
        }
    }
    trimmed.to_string()
}

/// Default JSON-LD context injected into JSON input that declares none
pub fn default_context() -> Value {
    let mut ctx = Map::new();
    for (prefix, ns) in PREFIXES {
        ctx.insert(prefix.to_string(), json!(ns));
    }
    Value::Object(ctx)
}

/// Inline replacement for a remote schema.org context
pub fn schema_org_context() -> Value {
    json!({ "@vocab": SCHEMA_NS })
}

/// `@prefix` declarations prepended to Turtle-family input, on one line
pub fn turtle_prefixes() -> String {
    PREFIXES
        .iter()
        .map(|(prefix, ns)| format!("@prefix {}: <{}> .", prefix, ns))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check whether a context value points at the remote schema.org context
pub fn is_schema_org_context(value: &Value) -> bool {
    match value {
        Value::String(s) => {
            let s = s.trim_end_matches('/');
            s == "http://schema.org" || s == "https://schema.org"
        }
        Value::Array(arr) => arr.iter().any(is_schema_org_context),
        _ => false,
    }
}
