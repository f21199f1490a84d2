//! Resource limits for schema loading
//!
//! Applied by the [`crate::loaders::Loader`] before reading a file and by
//! [`crate::documents::SchemaDocument`] while building the tree, so a huge
//! or deeply nested input fails fast with [`Error::LimitExceeded`].

use crate::error::{Error, Result};

/// Upper bounds on the size and shape of a loaded schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Deepest element nesting accepted
    pub max_depth: usize,

    /// Largest file accepted, in bytes
    pub max_file_size: usize,

    /// Most attributes on a single element
    pub max_attributes: usize,

    /// Most elements in one document
    pub max_elements: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 1000,
            max_file_size: 100 * 1024 * 1024,
            max_attributes: 1000,
            max_elements: 1_000_000,
        }
    }
}

impl Limits {
    /// Default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Tighter limits for untrusted input
    pub fn strict() -> Self {
        Self {
            max_depth: 100,
            max_file_size: 10 * 1024 * 1024,
            max_attributes: 100,
            max_elements: 100_000,
        }
    }

    /// Looser limits for very large generated schemas
    pub fn permissive() -> Self {
        Self {
            max_depth: 10_000,
            max_file_size: 1024 * 1024 * 1024,
            max_attributes: 10_000,
            max_elements: 50_000_000,
        }
    }

    /// Nesting depth of the element being opened
    pub fn check_depth(&self, depth: usize) -> Result<()> {
        check("element depth", depth, self.max_depth)
    }

    /// Size of the input in bytes
    pub fn check_file_size(&self, size: usize) -> Result<()> {
        check("file size in bytes", size, self.max_file_size)
    }

    /// Attribute count of one element
    pub fn check_attributes(&self, count: usize) -> Result<()> {
        check("attribute count", count, self.max_attributes)
    }

    /// Running element count of the document
    pub fn check_elements(&self, count: usize) -> Result<()> {
        check("element count", count, self.max_elements)
    }
}

fn check(what: &str, value: usize, max: usize) -> Result<()> {
    if value > max {
        return Err(Error::LimitExceeded(format!(
            "{} {} exceeds maximum {}",
            what, value, max
        )));
    }
    Ok(())
}
