//! # xsdtree
//!
//! Explore the element hierarchy of an XML Schema (XSD) file as a navigable
//! tree.
//!
//! The core is [`resolver::SchemaResolver`]: it finds the schema's root
//! element declarations (top-level declarations nothing references with
//! `ref`) and resolves the children of any declaration through its inline
//! or named complex type. Resolution runs against the [`nodes::XmlNode`]
//! capability, so it works over the crate's own [`documents::SchemaDocument`]
//! as well as over a `roxmltree` tree.
//!
//! ## Example
//!
//! ```rust
//! use xsdtree::documents::SchemaDocument;
//! use xsdtree::resolver::SchemaResolver;
//!
//! let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
//!   <xs:element name="note">
//!     <xs:complexType>
//!       <xs:sequence>
//!         <xs:element name="to" type="xs:string"/>
//!         <xs:element name="body" type="xs:string" minOccurs="0"/>
//!       </xs:sequence>
//!     </xs:complexType>
//!   </xs:element>
//! </xs:schema>"#;
//!
//! let doc = SchemaDocument::parse(xsd)?;
//! let resolver = SchemaResolver::new(doc.root())?;
//! let roots = resolver.resolve_roots()?;
//! assert_eq!(roots[0].name(), Some("note"));
//!
//! let children = resolver.resolve_children(&roots[0]);
//! assert_eq!(children.len(), 2);
//! assert!(children[1].is_optional());
//! # Ok::<(), xsdtree::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;
pub mod names;

// Documents
pub mod nodes;
pub mod documents;
pub mod loaders;

// Resolution
pub mod resolver;
pub mod views;

// Session
pub mod session;

// Re-exports for convenience
pub use documents::{NodeId, SchemaDocument};
pub use error::{Error, Result};
pub use resolver::{ElementDeclaration, SchemaResolver};
pub use session::Session;

/// Version of the xsdtree library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

