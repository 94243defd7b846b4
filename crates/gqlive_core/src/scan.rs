//! Lightweight operation-header scanner.
//!
//! Executed documents travel on the wire verbatim and are parsed by the
//! server; the dispatcher only needs the operation header (kind, optional
//! name, variable declarations). This scanner extracts exactly that in one
//! pass and leaves everything else untouched. It is not a GraphQL parser.

use thiserror::Error;

use crate::literal::{OperationKind, ParsedDocument, ScalarKind, VariableDeclaration};

/// Errors produced while scanning an operation header.
#[derive(Debug, Clone, Error)]
pub enum ScanError {
    #[error("document contains no executable operation")]
    NoOperation,
    #[error("malformed operation header: {0}")]
    Malformed(String),
}

/// Scans the first operation definition out of `text`.
///
/// Leading fragment definitions are skipped; the header of the first
/// `query`/`mutation`/`subscription` (or shorthand `{ ... }`) definition
/// determines the document's operation kind and variable declarations.
pub fn scan_document(text: &str) -> Result<ParsedDocument, ScanError> {
    let mut cursor = Cursor::new(text);

    loop {
        cursor.skip_trivia();
        match cursor.peek() {
            None => return Err(ScanError::NoOperation),
            // Shorthand document: `{ field }` is an anonymous query.
            Some('{') => return Ok(ParsedDocument::new(OperationKind::Query)),
            Some(_) => {
                let word = cursor
                    .read_name()
                    .ok_or_else(|| ScanError::Malformed(cursor.context()))?;
                match word.as_str() {
                    "query" => return scan_header(&mut cursor, OperationKind::Query),
                    "mutation" => return scan_header(&mut cursor, OperationKind::Mutation),
                    "subscription" => {
                        return scan_header(&mut cursor, OperationKind::Subscription)
                    }
                    "fragment" => cursor.skip_definition_body()?,
                    other => {
                        return Err(ScanError::Malformed(format!(
                            "expected an operation keyword, found `{other}`"
                        )))
                    }
                }
            }
        }
    }
}

fn scan_header(cursor: &mut Cursor<'_>, kind: OperationKind) -> Result<ParsedDocument, ScanError> {
    let mut document = ParsedDocument::new(kind);

    cursor.skip_trivia();
    if let Some(name) = cursor.read_name() {
        document.name = Some(name);
    }

    cursor.skip_trivia();
    if cursor.peek() == Some('(') {
        cursor.advance();
        document.variables = scan_variable_definitions(cursor)?;
    }

    Ok(document)
}

/// Reads `$name: Type [= default] [@directive(...)]` entries until the
/// closing parenthesis of the variable definition list.
fn scan_variable_definitions(
    cursor: &mut Cursor<'_>,
) -> Result<Vec<VariableDeclaration>, ScanError> {
    let mut declarations = Vec::new();
    // Depth relative to the opening paren of the list; directive argument
    // lists nest inside it.
    let mut depth = 1usize;

    loop {
        cursor.skip_trivia();
        match cursor.peek() {
            None => {
                return Err(ScanError::Malformed(
                    "unterminated variable definition list".into(),
                ))
            }
            Some(')') => {
                cursor.advance();
                depth -= 1;
                if depth == 0 {
                    return Ok(declarations);
                }
            }
            Some('(') => {
                cursor.advance();
                depth += 1;
            }
            Some('$') if depth == 1 => {
                cursor.advance();
                let name = cursor
                    .read_name()
                    .ok_or_else(|| ScanError::Malformed("variable without a name".into()))?;
                cursor.skip_trivia();
                if cursor.peek() != Some(':') {
                    return Err(ScanError::Malformed(format!(
                        "variable `${name}` is missing a type annotation"
                    )));
                }
                cursor.advance();
                let base = scan_base_type(cursor)
                    .ok_or_else(|| ScanError::Malformed(format!("variable `${name}` has no type")))?;
                declarations.push(VariableDeclaration::new(
                    name,
                    ScalarKind::from_type_name(&base),
                ));
            }
            Some('"') => cursor.skip_string(),
            Some(_) => cursor.advance(),
        }
    }
}

/// Reads the base type name of a declaration, skipping list and non-null
/// wrappers (`[Int!]!` yields `Int`). Defaults and directives that follow
/// are skimmed by the caller.
fn scan_base_type(cursor: &mut Cursor<'_>) -> Option<String> {
    loop {
        cursor.skip_trivia();
        match cursor.peek()? {
            '[' => cursor.advance(),
            _ => return cursor.read_name(),
        }
    }
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    /// Skips whitespace, commas (insignificant in GraphQL) and `#` comments.
    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == ',' {
                self.advance();
            } else if c == '#' {
                while let Some(c) = self.peek() {
                    self.advance();
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Reads a GraphQL name: `[_A-Za-z][_0-9A-Za-z]*`.
    fn read_name(&mut self) -> Option<String> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c == '_' || c.is_ascii_alphabetic() => self.advance(),
            _ => return None,
        }
        while let Some(c) = self.peek() {
            if c == '_' || c.is_ascii_alphanumeric() {
                self.advance();
            } else {
                break;
            }
        }
        Some(self.text[start..self.pos].to_string())
    }

    /// Skips a string literal, either `"..."` with escapes or a `"""` block.
    fn skip_string(&mut self) {
        // Caller guarantees the cursor sits on a `"`.
        self.advance();
        if self.text[self.pos..].starts_with("\"\"") {
            self.pos += 2;
            while self.pos < self.text.len() {
                if self.text[self.pos..].starts_with("\"\"\"") {
                    self.pos += 3;
                    return;
                }
                self.advance();
            }
            return;
        }
        while let Some(c) = self.peek() {
            self.advance();
            match c {
                '\\' => self.advance(),
                '"' => return,
                _ => {}
            }
        }
    }

    /// Skips past the brace-delimited body of the current definition.
    fn skip_definition_body(&mut self) -> Result<(), ScanError> {
        // Find the opening brace of the selection set.
        loop {
            match self.peek() {
                None => {
                    return Err(ScanError::Malformed(
                        "definition without a selection set".into(),
                    ))
                }
                Some('"') => self.skip_string(),
                Some('#') => self.skip_trivia(),
                Some('{') => break,
                Some(_) => self.advance(),
            }
        }
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '"' => {
                    self.skip_string();
                    continue;
                }
                '#' => {
                    self.skip_trivia();
                    continue;
                }
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.advance();
        }
        Err(ScanError::Malformed("unbalanced braces".into()))
    }

    fn context(&self) -> String {
        let rest: String = self.text[self.pos..].chars().take(20).collect();
        format!("unexpected input near `{rest}`")
    }
}
