//! Schema element resolution
//!
//! Turns the raw structure of an XSD document into a navigable logical
//! tree: which top-level element declarations are entry points, and which
//! element declarations sit directly below a given declaration once its
//! inline or named complex type is taken into account.
//!
//! XSD has no explicit root marker. A top-level declaration is treated as a
//! root when no `ref` anywhere in the document points at it.

use std::collections::HashSet;
use std::marker::PhantomData;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::names::{is_valid_ncname, local_name};
use crate::nodes::XmlNode;

/// XSD element local names
pub mod xsd_elements {
    /// `xs:schema`
    pub const SCHEMA: &str = "schema";
    /// `xs:element`
    pub const ELEMENT: &str = "element";
    /// `xs:complexType`
    pub const COMPLEX_TYPE: &str = "complexType";
    /// `xs:annotation`
    pub const ANNOTATION: &str = "annotation";
    /// `xs:documentation`
    pub const DOCUMENTATION: &str = "documentation";
    /// `xs:attribute`
    pub const ATTRIBUTE: &str = "attribute";
    /// `xs:attributeGroup`
    pub const ATTRIBUTE_GROUP: &str = "attributeGroup";
    /// `xs:anyAttribute`
    pub const ANY_ATTRIBUTE: &str = "anyAttribute";
}

/// XSD attribute names
pub mod xsd_attrs {
    /// Declared name
    pub const NAME: &str = "name";
    /// Type reference
    pub const TYPE: &str = "type";
    /// Element reference
    pub const REF: &str = "ref";
    /// Lower occurrence bound
    pub const MIN_OCCURS: &str = "minOccurs";
    /// Upper occurrence bound
    pub const MAX_OCCURS: &str = "maxOccurs";
}

use xsd_attrs::*;
use xsd_elements::*;

/// An `element` node of a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementDeclaration<N> {
    node: N,
}

impl<'a, N: XmlNode<'a>> ElementDeclaration<N> {
    /// Wrap `node` if it is an element declaration
    pub fn from_node(node: N) -> Option<Self> {
        if node.is(ELEMENT) {
            Some(Self { node })
        } else {
            None
        }
    }

    /// Underlying XML node
    pub fn node(&self) -> N {
        self.node
    }

    /// Declared `name`
    pub fn name(&self) -> Option<&'a str> {
        self.node.attribute(NAME)
    }

    /// Target of `ref`, as written
    pub fn ref_target(&self) -> Option<&'a str> {
        self.node.attribute(REF)
    }

    /// Whether this node only references another declaration
    pub fn is_reference(&self) -> bool {
        self.name().is_none() && self.ref_target().is_some()
    }

    /// Name to show for this declaration: `name`, else `ref`, else `"unnamed"`
    pub fn display_name(&self) -> &'a str {
        self.name().or_else(|| self.ref_target()).unwrap_or("unnamed")
    }

    /// Value of `type`, as written
    pub fn type_ref(&self) -> Option<&'a str> {
        self.node.attribute(TYPE)
    }

    /// Raw `minOccurs`
    pub fn min_occurs(&self) -> Option<&'a str> {
        self.node.attribute(MIN_OCCURS)
    }

    /// Raw `maxOccurs`
    pub fn max_occurs(&self) -> Option<&'a str> {
        self.node.attribute(MAX_OCCURS)
    }

    /// `minOccurs="0"`
    pub fn is_optional(&self) -> bool {
        self.min_occurs() == Some("0")
    }

    /// Directly nested `complexType`, if the structure is declared inline
    pub fn inline_complex_type(&self) -> Option<N> {
        self.node.children().find(|child| child.is(COMPLEX_TYPE))
    }

    /// Text of the first `documentation` in this declaration's own annotation
    ///
    /// Includes the text of any inline markup. Only the ends are trimmed.
    pub fn documentation(&self) -> Option<String> {
        let doc = self
            .node
            .children()
            .filter(|child| child.is(ANNOTATION))
            .flat_map(|annotation| annotation.children())
            .find(|child| child.is(DOCUMENTATION))?;
        let text = doc.text_content();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Element declarations at the first structural level of a complex type
///
/// Descends through grouping constructs (sequence, choice, all, content
/// derivations) but stops at each element declaration it finds. Annotation
/// and attribute subtrees are skipped.
#[derive(Debug, Clone)]
pub struct NestedElements<N> {
    stack: Vec<N>,
}

impl<'a, N: XmlNode<'a>> NestedElements<N> {
    fn new(definition: Option<N>) -> Self {
        let mut stack = Vec::new();
        if let Some(definition) = definition {
            stack.extend(definition.children());
            stack.reverse();
        }
        Self { stack }
    }
}

impl<'a, N: XmlNode<'a>> Iterator for NestedElements<N> {
    type Item = ElementDeclaration<N>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node.local_name() {
                ELEMENT => return Some(ElementDeclaration { node }),
                ANNOTATION | ATTRIBUTE | ATTRIBUTE_GROUP | ANY_ATTRIBUTE => {}
                _ => {
                    let start = self.stack.len();
                    self.stack.extend(node.children());
                    self.stack[start..].reverse();
                }
            }
        }
        None
    }
}

/// Resolves roots and children over one schema document
///
/// Holds only the schema's top-level node; every operation re-derives its
/// answer from the document, so the resolver is cheap to create and never
/// goes stale.
#[derive(Debug, Clone, Copy)]
pub struct SchemaResolver<'a, N> {
    schema: N,
    _document: PhantomData<&'a ()>,
}

impl<'a, N: XmlNode<'a>> SchemaResolver<'a, N> {
    /// Create a resolver for the document whose top-level element is `schema`
    ///
    /// Fails with [`Error::NotASchema`] unless the local tag name is `schema`.
    pub fn new(schema: N) -> Result<Self> {
        if !schema.is(SCHEMA) {
            return Err(Error::NotASchema(schema.local_name().to_string()));
        }
        Ok(Self {
            schema,
            _document: PhantomData,
        })
    }

    /// Resolver for a top-level node already known to be a `schema`
    pub(crate) fn checked(schema: N) -> Self {
        debug_assert!(schema.is(SCHEMA));
        Self {
            schema,
            _document: PhantomData,
        }
    }

    /// Root element declarations in document order
    ///
    /// A root is a named, top-level declaration whose name is not the target
    /// of any `ref` in the document. Fails with [`Error::NoRootElement`] when
    /// there is no such declaration.
    pub fn resolve_roots(&self) -> Result<Vec<ElementDeclaration<N>>> {
        let candidates: Vec<ElementDeclaration<N>> = self
            .schema
            .children()
            .filter_map(ElementDeclaration::from_node)
            .filter(|decl| decl.name().is_some())
            .collect();

        let referenced = self.referenced_names();

        let roots: Vec<ElementDeclaration<N>> = candidates
            .iter()
            .copied()
            .filter(|decl| {
                decl.name()
                    .map(|name| !referenced.contains(name))
                    .unwrap_or(false)
            })
            .collect();

        for decl in &roots {
            if let Some(name) = decl.name() {
                if !is_valid_ncname(name) {
                    warn!(name, "root element declaration has an invalid name");
                }
            }
        }

        debug!(
            candidates = candidates.len(),
            referenced = referenced.len(),
            roots = roots.len(),
            "resolved root element declarations"
        );

        if roots.is_empty() {
            return Err(Error::NoRootElement);
        }
        Ok(roots)
    }

    /// Local parts of every `ref` on an element declaration, document-wide
    pub fn referenced_names(&self) -> HashSet<&'a str> {
        self.schema
            .descendants()
            .filter(|node| node.is(ELEMENT))
            .filter_map(|node| node.attribute(REF))
            .map(local_name)
            .collect()
    }

    /// Whether `decl` has any structural children
    ///
    /// Equivalent to `!self.resolve_children(decl).is_empty()`, but stops at
    /// the first child found.
    pub fn has_children(&self, decl: &ElementDeclaration<N>) -> bool {
        self.nested_elements(decl).next().is_some()
    }

    /// Element declarations directly below `decl`
    ///
    /// Uses the inline complex type if there is one, else the named complex
    /// type matching `type`. Anything else (simple types, unknown type names,
    /// `ref`-only declarations) has no children.
    pub fn resolve_children(&self, decl: &ElementDeclaration<N>) -> Vec<ElementDeclaration<N>> {
        self.nested_elements(decl).collect()
    }

    /// Lazy form of [`Self::resolve_children`]
    pub fn nested_elements(&self, decl: &ElementDeclaration<N>) -> NestedElements<N> {
        NestedElements::new(self.structural_definition(decl))
    }

    /// The complex type that gives `decl` its structure, if any
    pub fn structural_definition(&self, decl: &ElementDeclaration<N>) -> Option<N> {
        if let Some(inline) = decl.inline_complex_type() {
            return Some(inline);
        }

        let type_ref = decl.type_ref()?;
        let found = self.find_complex_type(local_name(type_ref));
        if found.is_none() {
            debug!(
                element = decl.display_name(),
                type_ref, "type does not name a complex type, treating as leaf"
            );
        }
        found
    }

    /// First complex type in document order whose `name` equals `name`
    pub fn find_complex_type(&self, name: &str) -> Option<N> {
        self.schema
            .descendants()
            .find(|node| node.is(COMPLEX_TYPE) && node.attribute(NAME) == Some(name))
    }

    /// First element declaration in document order whose `name` equals `name`
    pub fn find_element(&self, name: &str) -> Option<ElementDeclaration<N>> {
        self.schema
            .descendants()
            .filter_map(ElementDeclaration::from_node)
            .find(|decl| decl.name() == Some(name))
    }

    /// Wrap `node` as a declaration of this schema
    pub fn declaration(&self, node: N) -> Option<ElementDeclaration<N>> {
        ElementDeclaration::from_node(node)
    }
}

/// Root element declarations of the schema whose top-level node is `schema`
pub fn resolve_roots<'a, N: XmlNode<'a>>(schema: N) -> Result<Vec<ElementDeclaration<N>>> {
    SchemaResolver::new(schema)?.resolve_roots()
}

/// Element declarations directly below `decl`
pub fn resolve_children<'a, N: XmlNode<'a>>(
    schema: N,
    decl: &ElementDeclaration<N>,
) -> Result<Vec<ElementDeclaration<N>>> {
    Ok(SchemaResolver::new(schema)?.resolve_children(decl))
}

/// Whether `decl` has structural children
pub fn has_children<'a, N: XmlNode<'a>>(schema: N, decl: &ElementDeclaration<N>) -> Result<bool> {
    Ok(SchemaResolver::new(schema)?.has_children(decl))
}
