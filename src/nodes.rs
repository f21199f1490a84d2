//! Tree-walking capability over parsed XML
//!
//! The resolver only needs element children, attribute lookup, the local
//! tag name and a stable identity per node. [`XmlNode`] captures exactly that,
//! so schema resolution works over any parser that can provide it. Two
//! implementations ship with the crate: [`crate::documents::Node`] for the
//! crate's own document tree and `roxmltree::Node`.

use std::fmt;
use std::hash::Hash;

/// Read-only view of one XML element node
///
/// Implementations are cheap `Copy` handles borrowing a document for `'a`.
/// Only element nodes are ever exposed as nodes. Text is reachable through
/// [`XmlNode::text_content`]; comments and processing instructions are
/// invisible.
pub trait XmlNode<'a>: Copy {
    /// Stable identity of a node within its document
    type Id: Copy + Eq + Hash + fmt::Debug;

    /// Iterator over element children in document order
    type Children: Iterator<Item = Self>;

    /// Identity of this node
    fn id(&self) -> Self::Id;

    /// Tag name with any namespace prefix stripped
    fn local_name(&self) -> &'a str;

    /// Value of the unprefixed attribute `name`
    ///
    /// Prefixed attributes never match, so `e:name` is not `name`.
    fn attribute(&self, name: &str) -> Option<&'a str>;

    /// Element children in document order
    fn children(&self) -> Self::Children;

    /// All text below this element concatenated in document order, untrimmed
    fn text_content(&self) -> String;

    /// All attributes as `(qualified name, value)` pairs in document order,
    /// namespace declarations excluded
    fn attributes(&self) -> Vec<(String, String)>;

    /// Whether the local tag name equals `local_name`
    fn is(&self, local_name: &str) -> bool {
        self.local_name() == local_name
    }

    /// This node followed by all element descendants, in document order
    fn descendants(&self) -> Descendants<Self> {
        Descendants { stack: vec![*self] }
    }
}

/// Pre-order iterator returned by [`XmlNode::descendants`]
#[derive(Debug, Clone)]
pub struct Descendants<N> {
    stack: Vec<N>,
}

impl<'a, N: XmlNode<'a>> Iterator for Descendants<N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let node = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(node.children());
        self.stack[start..].reverse();
        Some(node)
    }
}

fn is_element_node(node: &roxmltree::Node<'_, '_>) -> bool {
    node.is_element()
}

impl<'a, 'input: 'a> XmlNode<'a> for roxmltree::Node<'a, 'input> {
    type Id = roxmltree::NodeId;
    type Children = std::iter::Filter<
        roxmltree::Children<'a, 'input>,
        fn(&roxmltree::Node<'a, 'input>) -> bool,
    >;

    fn id(&self) -> Self::Id {
        roxmltree::Node::id(self)
    }

    fn local_name(&self) -> &'a str {
        self.tag_name().name()
    }

    fn attribute(&self, name: &str) -> Option<&'a str> {
        roxmltree::Node::attribute(self, name)
    }

    fn children(&self) -> Self::Children {
        let keep: fn(&roxmltree::Node<'a, 'input>) -> bool = is_element_node;
        roxmltree::Node::children(self).filter(keep)
    }

    fn text_content(&self) -> String {
        roxmltree::Node::descendants(self)
            .filter(|node| node.is_text())
            .filter_map(|node| node.text())
            .collect()
    }

    fn attributes(&self) -> Vec<(String, String)> {
        roxmltree::Node::attributes(self)
            .map(|attr| {
                let prefix = attr
                    .namespace()
                    .and_then(|uri| self.lookup_prefix(uri))
                    .filter(|prefix| !prefix.is_empty());
                let name = match prefix {
                    Some(prefix) => format!("{}:{}", prefix, attr.name()),
                    None => attr.name().to_string(),
                };
                (name, attr.value().to_string())
            })
            .collect()
    }
}
