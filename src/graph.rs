//! In-memory RDF graph used during a single import
//!
//! Only what a crosswalk needs: an ordered triple list with subject and
//! predicate lookups. Named graphs are flattened into one default graph.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::vocab::{RDF_FIRST, RDF_NIL, RDF_REST, RDF_TYPE, SCHEMA_NS, SCHEMA_NS_HTTPS};

/// A literal object with optional language tag and datatype
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    pub value: String,
    pub language: Option<String>,
    pub datatype: Option<String>,
}

impl Literal {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: None,
            datatype: None,
        }
    }

    pub fn tagged(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: Some(language.into()),
            datatype: None,
        }
    }
}

/// A node in the graph
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Iri(String),
    Blank(String),
    Literal(Literal),
}

impl Node {
    pub fn iri(iri: impl Into<String>) -> Self {
        Node::Iri(iri.into())
    }

    pub fn blank(id: impl Into<String>) -> Self {
        Node::Blank(id.into())
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Node::Literal(_))
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Node::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Node::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// Identifier string of a resource node (IRI or blank node label)
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Node::Iri(iri) => Some(iri),
            Node::Blank(id) => Some(id),
            Node::Literal(_) => None,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Iri(iri) => write!(f, "<{}>", iri),
            Node::Blank(id) => write!(f, "_:{}", id),
            Node::Literal(lit) => match &lit.language {
                Some(lang) => write!(f, "\"{}\"@{}", lit.value, lang),
                None => write!(f, "\"{}\"", lit.value),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: Node,
    pub predicate: String,
    pub object: Node,
}

/// Ordered set of triples, indexed by subject
#[derive(Debug, Clone, Default)]
pub struct Graph {
    triples: Vec<Triple>,
    seen: HashSet<Triple>,
    /// Positions in `triples`, in insertion order
    by_subject: HashMap<Node, Vec<usize>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a triple, ignoring exact duplicates
    ///
    /// `https://schema.org/` predicates and classes are normalised to the
    /// `http://schema.org/` namespace.
    pub fn insert(&mut self, subject: Node, predicate: impl Into<String>, object: Node) {
        let predicate = normalize_iri(predicate.into());
        let object = match object {
            Node::Iri(iri) => Node::Iri(normalize_iri(iri)),
            other => other,
        };
        let triple = Triple {
            subject,
            predicate,
            object,
        };
        if self.seen.contains(&triple) {
            return;
        }
        self.by_subject
            .entry(triple.subject.clone())
            .or_default()
            .push(self.triples.len());
        self.seen.insert(triple.clone());
        self.triples.push(triple);
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn triples(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// All objects of `predicate` on `subject`, in document order
    pub fn objects<'a>(
        &'a self,
        subject: &'a Node,
        predicate: &'a str,
    ) -> impl Iterator<Item = &'a Node> + 'a {
        self.about(subject)
            .filter(move |t| t.predicate == predicate)
            .map(|t| &t.object)
    }

    /// First object of `predicate` on `subject`
    pub fn object<'a>(&'a self, subject: &'a Node, predicate: &'a str) -> Option<&'a Node> {
        self.objects(subject, predicate).next()
    }

    /// Every triple whose subject is `subject`
    pub fn about<'a>(&'a self, subject: &'a Node) -> impl Iterator<Item = &'a Triple> + 'a {
        self.by_subject
            .get(subject)
            .into_iter()
            .flatten()
            .map(move |&i| &self.triples[i])
    }

    /// Whether `node` is the subject of any triple
    pub fn has_subject(&self, node: &Node) -> bool {
        self.by_subject.contains_key(node)
    }

    /// Class IRIs of `subject`
    pub fn types<'a>(&'a self, subject: &'a Node) -> impl Iterator<Item = &'a str> + 'a {
        self.objects(subject, RDF_TYPE).filter_map(Node::as_iri)
    }

    /// Members of the RDF collection starting at `head`
    ///
    /// `None` when `head` is not a well-formed `rdf:first`/`rdf:rest` chain.
    pub fn list(&self, head: &Node) -> Option<Vec<Node>> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut current = head;
        while current.as_iri() != Some(RDF_NIL) {
            if !visited.insert(current) {
                return None;
            }
            items.push(self.object(current, RDF_FIRST)?.clone());
            current = self.object(current, RDF_REST)?;
        }
        Some(items)
    }

    /// Follow a property path hop by hop, collecting the nodes reached
    pub fn follow(&self, subject: &Node, path: &[String]) -> Vec<Node> {
        let mut frontier = vec![subject.clone()];
        for predicate in path {
            frontier = frontier
                .iter()
                .flat_map(|node| self.objects(node, predicate).cloned())
                .collect();
            if frontier.is_empty() {
                break;
            }
        }
        frontier
    }
}

fn normalize_iri(iri: String) -> String {
    match iri.strip_prefix(SCHEMA_NS_HTTPS) {
        Some(local) => format!("{}{}", SCHEMA_NS, local),
        None => iri,
    }
}
