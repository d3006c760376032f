//! RDF format detection and parsing
//!
//! Input of unknown serialization is tried against a fixed sequence of
//! parsers. JSON input without a usable `@context` gets the default
//! compact-IRI context injected first, and Turtle-family input gets the
//! default prefixes, so that qualified names such as `dct:title` resolve
//! without the caller declaring them.
//!
//! Turtle and TriG go through sophia; N3 goes through oxttl, the only
//! parser of the two that understands N3-only syntax (`=`, `is .. of`,
//! formulae).

use std::borrow::Cow;
use std::convert::Infallible;
use std::fmt;
use std::io::{BufReader, Cursor};

use serde_json::{json, Value};
use sophia::api::prelude::*;
use sophia::api::term::TermKind;
use oxttl::n3::N3Term;
use oxttl::N3Parser;
use sophia::jsonld::JsonLdParser;

use crate::error::{CrosswalkError, Result};
use crate::graph::{Graph, Literal, Node};
use crate::vocab::{
    default_context, is_schema_org_context, schema_org_context, turtle_prefixes, PREFIXES,
};

/// RDF serializations understood by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    JsonLd,
    RdfXml,
    Turtle,
    N3,
    TriG,
}

/// Order in which serializations are attempted
pub const DETECTION_ORDER: [RdfFormat; 5] = [
    RdfFormat::JsonLd,
    RdfFormat::RdfXml,
    RdfFormat::Turtle,
    RdfFormat::N3,
    RdfFormat::TriG,
];

impl RdfFormat {
    pub fn name(&self) -> &'static str {
        match self {
            RdfFormat::JsonLd => "json-ld",
            RdfFormat::RdfXml => "xml",
            RdfFormat::Turtle => "turtle",
            RdfFormat::N3 => "n3",
            RdfFormat::TriG => "trig",
        }
    }

    /// Formats parsed with the prefix block prepended to the input
    fn uses_prefixes(&self) -> bool {
        matches!(self, RdfFormat::Turtle | RdfFormat::TriG)
    }
}

impl fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse text of unknown serialization into a graph
///
/// The first serialization that yields triples wins. If none parses,
/// `UnparsableContent` carries the last parser error; if some parsed but
/// produced no triples, the result is `EmptyGraph`.
pub fn parse_graph(text: &str) -> Result<(Graph, RdfFormat)> {
    let prepared = inject_context(text);
    parse_prepared(text, &prepared)
}

/// Detection loop over input whose JSON-LD rendition was already prepared
/// with [`inject_context`]
pub fn parse_prepared(text: &str, jsonld: &str) -> Result<(Graph, RdfFormat)> {
    let mut last_error: Option<String> = None;
    let mut parsed_empty = false;

    for format in DETECTION_ORDER {
        let input = match format {
            RdfFormat::JsonLd => jsonld,
            _ => text,
        };

        match parse_as(input, format) {
            Ok(graph) if graph.is_empty() => {
                tracing::debug!(format = %format, "parsed without triples");
                parsed_empty = true;
            }
            Ok(graph) => {
                tracing::info!(format = %format, triples = graph.len(), "detected RDF serialization");
                return Ok((graph, format));
            }
            Err(e) => {
                tracing::debug!(format = %format, error = %e, "serialization attempt failed");
                last_error = Some(format!("{}: {}", format, e));
            }
        }
    }

    if parsed_empty {
        Err(CrosswalkError::EmptyGraph)
    } else {
        Err(CrosswalkError::UnparsableContent {
            last_error: last_error.unwrap_or_else(|| "no parser attempted".to_string()),
        })
    }
}

/// Parse text as one specific serialization
///
/// Prefixes are injected on the first line, so reported line numbers match
/// the caller's text; only columns on line 1 are shifted.
pub fn parse_as(text: &str, format: RdfFormat) -> std::result::Result<Graph, String> {
    if format.uses_prefixes() {
        let prefixes = turtle_prefixes();
        let input = format!("{} {}", prefixes, text);
        return parse_input(&input, format).map_err(|e| {
            format!(
                "{} (columns on line 1 include {} characters of injected prefixes)",
                e,
                prefixes.len() + 1
            )
        });
    }
    parse_input(text, format)
}

fn parse_input(input: &str, format: RdfFormat) -> std::result::Result<Graph, String> {
    let reader = BufReader::new(Cursor::new(input.as_bytes()));
    let mut graph = Graph::new();

    match format {
        RdfFormat::JsonLd => {
            let parser = JsonLdParser::new();
            let mut source = parser.parse_str(input);
            source
                .try_for_each_quad(|q| -> std::result::Result<(), Infallible> {
                    add_statement(&mut graph, q.s(), q.p(), q.o());
                    Ok(())
                })
                .map_err(|e| e.to_string())?;
        }
        RdfFormat::RdfXml => {
            let mut parser = sophia::xml::parser::parse_bufread(reader);
            parser
                .try_for_each_triple(|t| -> std::result::Result<(), Infallible> {
                    add_statement(&mut graph, t.s(), t.p(), t.o());
                    Ok(())
                })
                .map_err(|e| e.to_string())?;
        }
        RdfFormat::Turtle => {
            let mut parser = sophia::turtle::parser::turtle::parse_bufread(reader);
            parser
                .try_for_each_triple(|t| -> std::result::Result<(), Infallible> {
                    add_statement(&mut graph, t.s(), t.p(), t.o());
                    Ok(())
                })
                .map_err(|e| e.to_string())?;
        }
        RdfFormat::N3 => parse_n3(input, &mut graph)?,
        RdfFormat::TriG => {
            let mut parser = sophia::turtle::parser::trig::parse_bufread(reader);
            parser
                .try_for_each_quad(|q| -> std::result::Result<(), Infallible> {
                    add_statement(&mut graph, q.s(), q.p(), q.o());
                    Ok(())
                })
                .map_err(|e| e.to_string())?;
        }
    }

    Ok(graph)
}

fn parse_n3(input: &str, graph: &mut Graph) -> std::result::Result<(), String> {
    let mut parser = N3Parser::new();
    for (prefix, ns) in PREFIXES {
        parser = parser.with_prefix(*prefix, *ns).map_err(|e| e.to_string())?;
    }
    for quad in parser.for_slice(input.as_bytes()) {
        let quad = quad.map_err(|e| e.to_string())?;
        let subject = match n3_node(quad.subject) {
            Some(node) if !node.is_literal() => node,
            _ => continue,
        };
        let predicate = match n3_node(quad.predicate) {
            Some(Node::Iri(iri)) => iri,
            _ => continue,
        };
        if let Some(object) = n3_node(quad.object) {
            graph.insert(subject, predicate, object);
        }
    }
    Ok(())
}

/// Variables and quoted triples have no counterpart in the graph
fn n3_node(term: N3Term) -> Option<Node> {
    match term {
        N3Term::NamedNode(node) => Some(Node::Iri(node.as_str().to_string())),
        N3Term::BlankNode(node) => Some(Node::Blank(node.as_str().to_string())),
        N3Term::Literal(lit) => Some(Node::Literal(Literal {
            value: lit.value().to_string(),
            language: lit.language().map(str::to_ascii_lowercase),
            datatype: Some(lit.datatype().as_str().to_string()),
        })),
        _ => None,
    }
}

fn add_statement<S: Term, P: Term, O: Term>(graph: &mut Graph, s: S, p: P, o: O) {
    let subject = match to_node(s) {
        Some(node) if !node.is_literal() => node,
        _ => return,
    };
    let predicate = match to_node(p) {
        Some(Node::Iri(iri)) => iri,
        _ => return,
    };
    if let Some(object) = to_node(o) {
        graph.insert(subject, predicate, object);
    }
}

fn to_node<T: Term>(term: T) -> Option<Node> {
    match term.kind() {
        TermKind::Iri => term.iri().map(|iri| Node::Iri(iri.as_str().to_string())),
        TermKind::BlankNode => term.bnode_id().map(|id| Node::Blank(id.as_str().to_string())),
        TermKind::Literal => {
            let value = term.lexical_form()?.to_string();
            let language = term.language_tag().map(|tag| tag.as_str().to_ascii_lowercase());
            let datatype = term.datatype().map(|dt| dt.as_str().to_string());
            Some(Node::Literal(Literal {
                value,
                language,
                datatype,
            }))
        }
        _ => None,
    }
}

/// Prepare JSON input for the JSON-LD parser
///
/// - No `@context`: the default compact-IRI context is injected (a top-level
///   array becomes the `@graph` of a wrapping object)
/// - A remote schema.org context is replaced by an inline `@vocab`
/// - A bare array of four numbers becomes a `@list`, keeping coordinate
///   order and repeated values that a plain array would lose as triples
///
/// Anything that is not JSON is returned unchanged.
pub fn inject_context(text: &str) -> Cow<'_, str> {
    let trimmed = text.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return Cow::Borrowed(text);
    }

    let mut value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return Cow::Borrowed(text),
    };

    let context_changed = prepare_jsonld(&mut value);
    let lists_changed = wrap_coordinate_arrays(&mut value);
    if !(context_changed || lists_changed) {
        return Cow::Borrowed(text);
    }

    match serde_json::to_string(&value) {
        Ok(s) => Cow::Owned(s),
        Err(_) => Cow::Borrowed(text),
    }
}

/// Returns whether the document was changed
fn prepare_jsonld(value: &mut Value) -> bool {
    match value {
        Value::Object(obj) => match obj.get_mut("@context") {
            Some(ctx) => replace_remote_context(ctx),
            None => {
                tracing::debug!("injecting default JSON-LD context");
                obj.insert("@context".to_string(), default_context());
                true
            }
        },
        Value::Array(arr) => {
            let declares_context = arr.iter().any(|item| item.get("@context").is_some());
            if declares_context {
                let mut changed = false;
                for item in arr.iter_mut() {
                    if let Some(ctx) = item.get_mut("@context") {
                        changed |= replace_remote_context(ctx);
                    }
                }
                changed
            } else {
                tracing::debug!("wrapping JSON-LD array with default context");
                let graph = std::mem::take(arr);
                *value = json!({"@context": default_context(), "@graph": graph});
                true
            }
        }
        _ => false,
    }
}

fn is_coordinate_array(value: &Value) -> bool {
    matches!(value, Value::Array(items) if items.len() == 4 && items.iter().all(Value::is_number))
}

/// Returns whether any array was wrapped
fn wrap_coordinate_arrays(value: &mut Value) -> bool {
    match value {
        Value::Object(obj) => {
            let mut changed = false;
            for (key, item) in obj.iter_mut() {
                if key == "@context" || key == "@list" {
                    continue;
                }
                if is_coordinate_array(item) {
                    let coordinates = std::mem::take(item);
                    *item = json!({ "@list": coordinates });
                    changed = true;
                } else {
                    changed |= wrap_coordinate_arrays(item);
                }
            }
            changed
        }
        Value::Array(items) => items
            .iter_mut()
            .fold(false, |changed, item| wrap_coordinate_arrays(item) || changed),
        _ => false,
    }
}

fn replace_remote_context(ctx: &mut Value) -> bool {
    match ctx {
        Value::String(_) if is_schema_org_context(ctx) => {
            tracing::debug!("replacing remote schema.org context with inline vocabulary");
            *ctx = schema_org_context();
            true
        }
        Value::Array(items) => {
            let mut changed = false;
            for item in items.iter_mut() {
                changed |= replace_remote_context(item);
            }
            changed
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::expand;

    const TURTLE: &str = r#"
        <urn:x> a dcat:Dataset ;
            dct:title "Rain gauges"@en .
    "#;

    const RDF_XML: &str = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:dcat="http://www.w3.org/ns/dcat#"
         xmlns:dct="http://purl.org/dc/terms/">
  <dcat:Dataset rdf:about="urn:x">
    <dct:title xml:lang="en">Rain gauges</dct:title>
  </dcat:Dataset>
</rdf:RDF>"#;

    const JSON_LD: &str = r#"{
        "@id": "urn:x",
        "@type": "dcat:Dataset",
        "dct:title": {"@value": "Rain gauges", "@language": "en"}
    }"#;

    fn title_of(graph: &Graph) -> String {
        let x = Node::iri("urn:x");
        let title = expand("dct:title");
        graph
            .object(&x, &title)
            .and_then(Node::as_literal)
            .map(|l| l.value.clone())
            .unwrap()
    }

    #[test]
    fn test_detect_turtle_with_injected_prefixes() {
        let (graph, format) = parse_graph(TURTLE).unwrap();
        assert_eq!(format, RdfFormat::Turtle);
        assert_eq!(graph.len(), 2);
        assert_eq!(title_of(&graph), "Rain gauges");
    }

    #[test]
    fn test_detect_rdf_xml() {
        let (graph, format) = parse_graph(RDF_XML).unwrap();
        assert_eq!(format, RdfFormat::RdfXml);
        assert_eq!(title_of(&graph), "Rain gauges");
    }

    #[test]
    fn test_detect_jsonld_without_context() {
        let (graph, format) = parse_graph(JSON_LD).unwrap();
        assert_eq!(format, RdfFormat::JsonLd);
        assert_eq!(title_of(&graph), "Rain gauges");
    }

    #[test]
    fn test_literal_language_preserved() {
        let (graph, _) = parse_graph(TURTLE).unwrap();
        let x = Node::iri("urn:x");
        let title = expand("dct:title");
        let lit = graph.object(&x, &title).and_then(Node::as_literal).unwrap();
        assert_eq!(lit.language.as_deref(), Some("en"));
    }

    #[test]
    fn test_trig_named_graphs_flattened() {
        let trig = r#"
            <urn:g> {
                <urn:x> a dcat:Dataset ; dct:title "In a graph" .
            }
        "#;
        let (graph, format) = parse_graph(trig).unwrap();
        assert_eq!(format, RdfFormat::TriG);
        assert_eq!(title_of(&graph), "In a graph");
    }

    #[test]
    fn test_detect_n3_only_syntax() {
        let (graph, format) =
            parse_graph(r#"<urn:x> a dcat:Dataset ; dct:title "Rain" ; = <urn:y> ."#).unwrap();
        assert_eq!(format, RdfFormat::N3);
        assert_eq!(title_of(&graph), "Rain");
        let same_as = format!("{}sameAs", crate::vocab::OWL_NS);
        assert_eq!(graph.object(&Node::iri("urn:x"), &same_as), Some(&Node::iri("urn:y")));

        let (graph, format) = parse_graph(r#""Rain" is dct:title of <urn:x> ."#).unwrap();
        assert_eq!(format, RdfFormat::N3);
        assert_eq!(title_of(&graph), "Rain");
    }

    #[test]
    fn test_prefixes_keep_line_numbers() {
        assert!(!turtle_prefixes().contains('\n'));
        let err = parse_as("<urn:x> dct:title \"T\" .\n<urn:x> dct:title ; .", RdfFormat::Turtle)
            .unwrap_err();
        assert!(err.contains("injected prefixes"), "{}", err);
    }

    #[test]
    fn test_empty_graph() {
        let err = parse_graph("@prefix ex: <http://example.org/> .").unwrap_err();
        assert!(matches!(err, CrosswalkError::EmptyGraph));

        let err = parse_graph("{}").unwrap_err();
        assert!(matches!(err, CrosswalkError::EmptyGraph));
    }

    #[test]
    fn test_unparsable() {
        let err = parse_graph("this is { not ] rdf <<<").unwrap_err();
        assert!(matches!(err, CrosswalkError::UnparsableContent { .. }));
    }

    #[test]
    fn test_inject_context_object() {
        let injected = inject_context(r#"{"@id": "urn:x"}"#);
        let value: Value = serde_json::from_str(&injected).unwrap();
        assert!(value["@context"]["dct"].is_string());
    }

    #[test]
    fn test_inject_context_keeps_declared_context() {
        let text = r#"{"@context": {"ex": "http://example.org/"}, "@id": "urn:x"}"#;
        assert!(matches!(inject_context(text), Cow::Borrowed(_)));
    }

    #[test]
    fn test_inject_context_array() {
        let injected = inject_context(r#"[{"@id": "urn:x"}]"#);
        let value: Value = serde_json::from_str(&injected).unwrap();
        assert!(value["@context"].is_object());
        assert_eq!(value["@graph"][0]["@id"], "urn:x");
    }

    #[test]
    fn test_schema_org_context_replaced() {
        let text = r#"{"@context": "https://schema.org/", "@type": "Dataset", "name": "x"}"#;
        let injected = inject_context(text);
        let value: Value = serde_json::from_str(&injected).unwrap();
        assert_eq!(value["@context"]["@vocab"], "http://schema.org/");
    }

    #[test]
    fn test_coordinate_arrays_become_lists() {
        let text = r#"{"@id": "urn:x", "dcat:bbox": [0, 0, 10, 10], "dct:title": ["a", "b"]}"#;
        let value: Value = serde_json::from_str(&inject_context(text)).unwrap();
        assert_eq!(value["dcat:bbox"], json!({"@list": [0, 0, 10, 10]}));
        assert_eq!(value["dct:title"], json!(["a", "b"]));

        let (graph, _) = parse_graph(text).unwrap();
        let head = graph
            .object(&Node::iri("urn:x"), &expand("dcat:bbox"))
            .cloned()
            .unwrap();
        let values: Vec<String> = graph
            .list(&head)
            .unwrap()
            .iter()
            .map(|n| n.as_literal().unwrap().value.clone())
            .collect();
        assert_eq!(values, vec!["0", "0", "10", "10"]);
    }

    #[test]
    fn test_non_json_untouched() {
        assert!(matches!(inject_context(TURTLE), Cow::Borrowed(_)));
    }
}
