//! Error types for xsdtree
//!
//! Every error here is terminal for the load attempt that produced it.
//! Per-element resolution problems (an unknown `type` reference) are not
//! errors at all: they degrade to leaf nodes.

use std::fmt;
use thiserror::Error;

/// Result type alias using xsdtree Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xsdtree operations
#[derive(Error, Debug)]
pub enum Error {
    /// Input is not well-formed XML
    #[error("malformed XML: {0}")]
    MalformedXml(#[from] ParseError),

    /// Top-level element is not an XSD `schema`
    #[error("not an XSD schema: top-level element is <{0}>")]
    NotASchema(String),

    /// Well-formed schema without any unreferenced top-level declaration
    #[error("XML is well-formed, but no unreferenced root element declaration exists")]
    NoRootElement,

    /// File extension other than `.xsd` / `.xml`
    #[error("unsupported file type '{0}': expected an .xsd or .xml file")]
    UnsupportedFileType(String),

    /// Input exceeds a configured [`crate::limits::Limits`] bound
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// File could not be read
    #[error("resource error: {0}")]
    Resource(String),

    /// No element declaration with the requested name
    #[error("element '{0}' not found")]
    ElementNotFound(String),

    /// Node id does not name an element declaration of the loaded schema
    #[error("node {0} is not an element declaration of the loaded schema")]
    UnknownNode(usize),

    /// Session operation attempted before any schema was loaded
    #[error("no schema loaded")]
    NoSchemaLoaded,
}

/// Diagnostic reported by the XML parser
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Location in the source text, as `line:column`
    pub location: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the location from a byte offset into `text`
    pub fn at_offset(self, text: &str, offset: usize) -> Self {
        let (line, column) = line_column(text, offset);
        self.with_location(format!("{}:{}", line, column))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            write!(f, " (at {})", loc)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// 1-based line and column of a byte offset
fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let mut end = offset.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let before = &text[..end];
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(idx) => before[idx + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, column)
}
