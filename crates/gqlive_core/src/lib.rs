//! Core types for gqlive.
//!
//! This crate provides the operation model shared by the transport and
//! session layers:
//! - `literal`: parsed operation literals, operation kinds, variable
//!   declarations
//! - `scan`: the lightweight operation-header scanner
//! - `endpoint`: resolved endpoint descriptors

pub mod endpoint;
pub mod literal;
pub mod scan;

pub use endpoint::EndpointDescriptor;
pub use literal::{
    OperationKind, OperationLiteral, ParsedDocument, ScalarKind, VariableDeclaration,
    VariableValues,
};
pub use scan::{scan_document, ScanError};
