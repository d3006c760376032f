//! Error types for MCF resolution and RDF crosswalks

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrosswalkError {
    #[error("Failed to parse document: {0}")]
    DocumentParse(String),

    #[error("Failed to read document: {0}")]
    DocumentRead(String),

    #[error("Could not parse content as any RDF serialization (last error: {last_error})")]
    UnparsableContent { last_error: String },

    #[error("Parsed RDF graph contains no triples")]
    EmptyGraph,

    #[error("No main entity found in RDF graph")]
    NoMainEntity,

    #[error("Crosswalk produced no identification section")]
    EmptyResult,

    #[error("Cyclic base_mcf reference: '{0}' is already being resolved")]
    CyclicInheritance(String),

    #[error("Schema '{0}' not found")]
    InvalidSchema(String),

    #[error("Schema '{schema}' does not support {operation}")]
    UnsupportedOperation { schema: String, operation: String },

    #[error("Invalid mapping table: {0}")]
    InvalidMapping(String),

    #[error("Invalid datestring: {0}")]
    InvalidDate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),
}

pub type Result<T> = std::result::Result<T, CrosswalkError>;
