//! Coercion of graph objects into canonical values
//!
//! A literal contributes its text. A resource contributes the literals one
//! hop away, or its own identifier when nothing describes it.

use std::collections::BTreeMap;

use crate::graph::{Graph, Node};
use crate::model::{CharString, VALUE_SEPARATOR};

/// Text form of a single object node
pub fn node_text(graph: &Graph, node: &Node) -> String {
    match node {
        Node::Literal(lit) => lit.value.trim().to_string(),
        resource => {
            if !graph.has_subject(resource) {
                return resource.identifier().unwrap_or_default().to_string();
            }
            graph
                .about(resource)
                .filter_map(|t| t.object.as_literal())
                .map(|lit| lit.value.trim())
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        }
    }
}

/// Scalar value of several objects, space-joined, empty strings skipped
pub fn scalar_value<'a>(graph: &Graph, nodes: impl IntoIterator<Item = &'a Node>) -> Option<String> {
    let parts: Vec<String> = nodes
        .into_iter()
        .map(|node| node_text(graph, node))
        .filter(|text| !text.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Multilingual value of several objects
///
/// Literals are grouped by language tag (untagged ones take `language`),
/// values within a language are joined with `" | "`, and a single language
/// collapses to a bare scalar.
pub fn multilingual_value<'a>(
    graph: &Graph,
    nodes: impl IntoIterator<Item = &'a Node>,
    language: &str,
) -> Option<CharString> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for node in nodes {
        let lang = node
            .as_literal()
            .and_then(|lit| lit.language.as_deref())
            .unwrap_or(language);
        let text = node_text(graph, node);
        if text.is_empty() {
            continue;
        }
        let values = grouped.entry(lang.to_string()).or_default();
        if !values.contains(&text) {
            values.push(text);
        }
    }

    let joined = grouped
        .into_iter()
        .map(|(lang, values)| (lang, values.join(VALUE_SEPARATOR)))
        .collect();
    CharString::from_languages(joined)
}

/// First literal text found along any of `paths`
pub fn first_literal(graph: &Graph, subject: &Node, paths: &[Vec<String>]) -> Option<String> {
    paths.iter().find_map(|path| {
        graph
            .follow(subject, path)
            .iter()
            .filter_map(Node::as_literal)
            .map(|lit| lit.value.trim().to_string())
            .find(|text| !text.is_empty())
    })
}

/// Strip URI schemes that wrap contact details (`mailto:`, `tel:`)
pub fn strip_contact_scheme(value: &str) -> String {
    let trimmed = value.trim();
    ["mailto:", "tel:"]
        .iter()
        .find_map(|scheme| trimmed.strip_prefix(scheme))
        .unwrap_or(trimmed)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Literal;
    use crate::vocab::expand;

    fn lit(value: &str) -> Node {
        Node::Literal(Literal::plain(value))
    }

    fn tagged(value: &str, lang: &str) -> Node {
        Node::Literal(Literal::tagged(value, lang))
    }

    #[test]
    fn test_literal_text() {
        let g = Graph::new();
        assert_eq!(node_text(&g, &lit("  Rain ")), "Rain");
    }

    #[test]
    fn test_empty_node_uses_identifier() {
        let g = Graph::new();
        assert_eq!(
            node_text(&g, &Node::iri("http://example.org/license/cc-by")),
            "http://example.org/license/cc-by"
        );
    }

    #[test]
    fn test_one_hop_collection() {
        let mut g = Graph::new();
        let lic = Node::blank("lic");
        g.insert(lic.clone(), expand("rdfs:label"), lit("CC BY"));
        g.insert(lic.clone(), expand("dct:title"), lit("4.0"));
        g.insert(lic.clone(), expand("dct:source"), Node::iri("urn:src"));
        assert_eq!(node_text(&g, &lic), "CC BY 4.0");
    }

    #[test]
    fn test_scalar_join() {
        let g = Graph::new();
        let nodes = [lit("a"), lit(""), lit("b")];
        assert_eq!(scalar_value(&g, &nodes), Some("a b".to_string()));
        assert_eq!(scalar_value(&g, &[lit("")]), None);
    }

    #[test]
    fn test_multilingual_grouping() {
        let g = Graph::new();
        let nodes = [tagged("Rain", "en"), tagged("Pluie", "fr")];
        let value = multilingual_value(&g, &nodes, "en").unwrap();
        assert_eq!(
            value,
            CharString::Localized(BTreeMap::from([
                ("en".to_string(), "Rain".to_string()),
                ("fr".to_string(), "Pluie".to_string()),
            ]))
        );
    }

    #[test]
    fn test_multilingual_collapse_and_join() {
        let g = Graph::new();
        let nodes = [tagged("Rain", "en"), lit("Gauges")];
        let value = multilingual_value(&g, &nodes, "en").unwrap();
        assert_eq!(value, CharString::Scalar("Rain | Gauges".to_string()));
    }

    #[test]
    fn test_strip_contact_scheme() {
        assert_eq!(strip_contact_scheme("mailto:info@example.org"), "info@example.org");
        assert_eq!(strip_contact_scheme("tel:+1-555"), "+1-555");
        assert_eq!(strip_contact_scheme("plain"), "plain");
    }
}
