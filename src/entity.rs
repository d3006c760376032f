//! Main-entity resolution and language detection

use crate::error::{CrosswalkError, Result};
use crate::graph::{Graph, Node};
use crate::mapping::MappingTable;
use crate::vocab::RDF_TYPE;

/// Locate the resource a graph describes
///
/// Preference order:
/// 1. First subject typed with one of the table's entity classes, in table order
/// 2. First typed subject
/// 3. Subject of the first triple
pub fn find_main_entity(graph: &Graph, table: &MappingTable) -> Result<Node> {
    for entity_type in &table.entity_types {
        let class = table.expand(&entity_type.class);
        let typed = graph
            .triples()
            .find(|t| t.predicate == RDF_TYPE && t.object.as_iri() == Some(class.as_str()));
        if let Some(t) = typed {
            tracing::debug!(entity = %t.subject, class = %class, "main entity by class");
            return Ok(t.subject.clone());
        }
    }

    if let Some(t) = graph.triples().find(|t| t.predicate == RDF_TYPE) {
        tracing::debug!(entity = %t.subject, "main entity by first typed subject");
        return Ok(t.subject.clone());
    }

    match graph.triples().next() {
        Some(t) => {
            tracing::debug!(entity = %t.subject, "main entity by first triple");
            Ok(t.subject.clone())
        }
        None => Err(CrosswalkError::NoMainEntity),
    }
}

/// Language of the entity, from the table's language predicates
///
/// A literal is used as written; an IRI contributes its last path segment.
/// Three-letter ISO 639-2 codes with a two-letter equivalent are shortened,
/// so `.../language/ENG` gives `en` and matches `@en` literal tags.
pub fn detect_language(graph: &Graph, entity: &Node, table: &MappingTable) -> Option<String> {
    table.paths(&table.language).find_map(|path| {
        graph
            .follow(entity, &path)
            .iter()
            .find_map(language_code)
    })
}

fn language_code(node: &Node) -> Option<String> {
    let code = match node {
        Node::Literal(lit) => lit.value.trim().to_string(),
        Node::Iri(iri) => iri
            .trim_end_matches('/')
            .rsplit(['/', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
        Node::Blank(_) => return None,
    };
    if code.is_empty() {
        return None;
    }
    let code = code.to_lowercase();
    match two_letter_code(&code) {
        Some(short) => Some(short.to_string()),
        None => Some(code),
    }
}

/// ISO 639-2 (bibliographic and terminology) to ISO 639-1
const ISO_639_2_TO_1: &[(&str, &str)] = &[
    ("ara", "ar"),
    ("baq", "eu"),
    ("bul", "bg"),
    ("cat", "ca"),
    ("ces", "cs"),
    ("chi", "zh"),
    ("cym", "cy"),
    ("cze", "cs"),
    ("dan", "da"),
    ("deu", "de"),
    ("dut", "nl"),
    ("ell", "el"),
    ("eng", "en"),
    ("est", "et"),
    ("eus", "eu"),
    ("fin", "fi"),
    ("fra", "fr"),
    ("fre", "fr"),
    ("ger", "de"),
    ("gle", "ga"),
    ("glg", "gl"),
    ("gre", "el"),
    ("hrv", "hr"),
    ("hun", "hu"),
    ("ice", "is"),
    ("isl", "is"),
    ("ita", "it"),
    ("jpn", "ja"),
    ("kor", "ko"),
    ("lav", "lv"),
    ("lit", "lt"),
    ("ltz", "lb"),
    ("mlt", "mt"),
    ("nld", "nl"),
    ("nno", "nn"),
    ("nob", "nb"),
    ("nor", "no"),
    ("pol", "pl"),
    ("por", "pt"),
    ("ron", "ro"),
    ("rum", "ro"),
    ("rus", "ru"),
    ("slk", "sk"),
    ("slo", "sk"),
    ("slv", "sl"),
    ("spa", "es"),
    ("srp", "sr"),
    ("swe", "sv"),
    ("tur", "tr"),
    ("ukr", "uk"),
    ("wel", "cy"),
    ("zho", "zh"),
];

fn two_letter_code(code: &str) -> Option<&'static str> {
    ISO_639_2_TO_1
        .iter()
        .find(|(long, _)| *long == code)
        .map(|(_, short)| *short)
}

/// Hierarchy level from the entity's classes
pub fn hierarchy_level(graph: &Graph, entity: &Node, table: &MappingTable) -> Option<String> {
    graph
        .types(entity)
        .find_map(|class| table.hierarchy_level(class))
        .map(str::to_string)
}
