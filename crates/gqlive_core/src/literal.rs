//! Operation literals and the types extracted from them.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::scan::{scan_document, ScanError};

/// Kind of a GraphQL operation, derived from the first executable
/// definition of a document. Drives every downstream transport decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    /// Returns the lowercase keyword for this kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }

    /// Returns true for subscription operations.
    pub const fn is_subscription(&self) -> bool {
        matches!(self, Self::Subscription)
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared scalar type of a variable, used by the interactive collector
/// to cast raw text input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarKind {
    Int,
    Float,
    Boolean,
    Id,
    String,
    /// Any other named type (custom scalars, enums, input objects).
    Other(String),
}

impl ScalarKind {
    /// Maps a base type name (list/non-null wrappers already stripped) to
    /// its scalar kind.
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "Int" => Self::Int,
            "Float" => Self::Float,
            "Boolean" => Self::Boolean,
            "ID" => Self::Id,
            "String" => Self::String,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A variable declared in an operation header: `$name: Type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclaration {
    pub name: String,
    pub ty: ScalarKind,
}

impl VariableDeclaration {
    pub fn new(name: impl Into<String>, ty: ScalarKind) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Values collected for one execution, keyed by declaration name in
/// declaration order. Exists only for the duration of one execution.
pub type VariableValues = IndexMap<String, serde_json::Value>;

/// The operation header of a parsed document: kind, optional name and the
/// ordered variable declarations. Produced by [`scan_document`] or
/// constructed directly by an embedding host that already has an AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub kind: OperationKind,
    pub name: Option<String>,
    pub variables: Vec<VariableDeclaration>,
}

impl ParsedDocument {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            name: None,
            variables: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_variables(mut self, variables: Vec<VariableDeclaration>) -> Self {
        self.variables = variables;
        self
    }
}

/// An immutable parsed representation of one GraphQL operation, tagged
/// with its source location and raw text. Produced once per run, owned by
/// the caller, read-only to the executor.
#[derive(Debug, Clone)]
pub struct OperationLiteral {
    source: PathBuf,
    text: String,
    document: ParsedDocument,
}

impl OperationLiteral {
    /// Builds a literal from an already-parsed document.
    pub fn new(
        source: impl Into<PathBuf>,
        text: impl Into<String>,
        document: ParsedDocument,
    ) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            document,
        }
    }

    /// Builds a literal by scanning the operation header out of raw text.
    pub fn from_text(
        source: impl Into<PathBuf>,
        text: impl Into<String>,
    ) -> Result<Self, ScanError> {
        let text = text.into();
        let document = scan_document(&text)?;
        Ok(Self {
            source: source.into(),
            text,
            document,
        })
    }

    /// The originating source location.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The raw GraphQL text, sent on the wire verbatim.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The scanned operation header.
    pub fn document(&self) -> &ParsedDocument {
        &self.document
    }

    /// Operation kind of the first definition.
    pub fn kind(&self) -> OperationKind {
        self.document.kind
    }

    /// Variable declarations in source order.
    pub fn variable_declarations(&self) -> &[VariableDeclaration] {
        &self.document.variables
    }
}
