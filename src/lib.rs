//! MCF Crosswalk Library
//!
//! This library maintains one canonical metadata model, the MCF (metadata
//! control file), and translates between it and external metadata dialects.
//!
//! # Overview
//!
//! - **Resolver**: loads an MCF document from a path, raw text or an
//!   already-parsed value and resolves `base_mcf` inheritance into a single
//!   merged document
//! - **Import**: reads RDF in an unknown serialization (JSON-LD, RDF/XML,
//!   Turtle, N3, TriG), finds the described entity and projects it into the
//!   canonical model through a declarative mapping table
//! - **Export**: flattens the canonical model into DCAT JSON-LD
//!
//! # Inheritance
//!
//! A mapping anywhere in an MCF document may carry a `base_mcf` key naming
//! a parent document. The parent is resolved first and merged in with the
//! child's values taking precedence. Relative paths are resolved against the
//! directory of the top-level document, including for nested bases.
//!
//! # Usage
//!
//! ## Resolve an MCF document
//!
//! ```ignore
//! use mcf_crosswalk::{read_mcf, ResolveOptions};
//!
//! let doc = read_mcf(std::path::Path::new("record.yml"), &ResolveOptions::default())?;
//! println!("{:?}", doc.get_str("identification.title"));
//! ```
//!
//! ## Import DCAT and write it back
//!
//! ```ignore
//! use mcf_crosswalk::{import, to_dcat, ImportOptions, MappingTable};
//!
//! let turtle = r#"<urn:x> a dcat:Dataset ; dct:title "Rain gauges"@en ."#;
//! let doc = import(turtle, &MappingTable::builtin("dcat")?, &ImportOptions::default())?;
//! let dcat = to_dcat(&doc, true)?;
//! ```

pub mod coerce;
pub mod crosswalk;
pub mod dates;
pub mod entity;
pub mod error;
pub mod export;
pub mod geometry;
pub mod graph;
pub mod loader;
pub mod mapping;
pub mod merge;
pub mod model;
pub mod parse;
pub mod resolve;
pub mod schemas;
pub mod vocab;

// Re-export main types for convenience
pub use crate::crosswalk::{import, ImportOptions};
pub use crate::error::{CrosswalkError, Result};
pub use crate::export::to_dcat;
pub use crate::loader::DocumentSource;
pub use crate::mapping::MappingTable;
pub use crate::model::{get_charstring, CharString, Document};
pub use crate::parse::{parse_graph, RdfFormat};
pub use crate::resolve::{read_mcf, ResolveOptions, SUPPORTED_VERSIONS};
pub use crate::schemas::{available_schemas, load_schema, MetadataSchema, Output};
