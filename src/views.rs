//! View-models handed to the rendering layer
//!
//! An [`ElementView`] carries everything needed to draw one node (label,
//! type badge, optionality marker, expand affordance, detail panel) without
//! reaching back into the XML tree. [`TreeNode`] nests views for rendering a
//! whole hierarchy at once.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::nodes::XmlNode;
use crate::resolver::{xsd_attrs, ElementDeclaration, SchemaResolver};

/// Display data for one element declaration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementView<I> {
    /// Node identity, used to request the next expansion level
    #[serde(skip)]
    pub id: I,
    /// Declared name, or the `ref` target for reference nodes
    pub name: String,
    /// Raw `type` attribute
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<String>,
    /// Raw `minOccurs`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_occurs: Option<String>,
    /// Raw `maxOccurs`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_occurs: Option<String>,
    /// `minOccurs="0"`
    pub optional: bool,
    /// Declared with `ref` instead of `name`
    pub is_reference: bool,
    /// Whether expanding this node yields children
    pub has_children: bool,
    /// Text of the declaration's `documentation`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Remaining attributes (everything but `name` and `type`)
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,
}

impl<I> ElementView<I> {
    /// Label with the optional marker, e.g. `author?`
    pub fn label(&self) -> String {
        if self.optional {
            format!("{}?", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Type badge text: the type reference, or a description of the node kind
    pub fn badge(&self) -> &str {
        match (&self.type_ref, self.is_reference, self.has_children) {
            (Some(type_ref), _, _) => type_ref.as_str(),
            (None, true, _) => "ref",
            (None, false, true) => "complex",
            (None, false, false) => "untyped",
        }
    }
}

impl<'a, N: XmlNode<'a>> SchemaResolver<'a, N> {
    /// View-model for `decl`
    pub fn view(&self, decl: &ElementDeclaration<N>) -> ElementView<N::Id> {
        let attributes = decl
            .node()
            .attributes()
            .into_iter()
            .filter(|(name, _)| name != xsd_attrs::NAME && name != xsd_attrs::TYPE)
            .collect();

        ElementView {
            id: decl.node().id(),
            name: decl.display_name().to_string(),
            type_ref: decl.type_ref().map(str::to_string),
            min_occurs: decl.min_occurs().map(str::to_string),
            max_occurs: decl.max_occurs().map(str::to_string),
            optional: decl.is_optional(),
            is_reference: decl.is_reference(),
            has_children: self.has_children(decl),
            documentation: decl.documentation(),
            attributes,
        }
    }
}

/// One node of a fully expanded element hierarchy
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound(serialize = ""))]
pub struct TreeNode<I> {
    /// The node itself
    #[serde(flatten)]
    pub element: ElementView<I>,
    /// Expanded children
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode<I>>,
    /// The node's structure already appears on the path from the root
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub recursive: bool,
    /// Children exist but the depth bound stopped expansion
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

/// Expand `decl` into a tree at most `max_depth` levels deep below it
///
/// A declaration whose structural definition is already being expanded
/// higher up the same path is marked `recursive` and not expanded again.
pub fn build_tree<'a, N: XmlNode<'a>>(
    resolver: &SchemaResolver<'a, N>,
    decl: &ElementDeclaration<N>,
    max_depth: usize,
) -> TreeNode<N::Id> {
    let mut path = HashSet::new();
    build_subtree(resolver, decl, max_depth, &mut path)
}

fn build_subtree<'a, N: XmlNode<'a>>(
    resolver: &SchemaResolver<'a, N>,
    decl: &ElementDeclaration<N>,
    depth_left: usize,
    path: &mut HashSet<N::Id>,
) -> TreeNode<N::Id> {
    let element = resolver.view(decl);
    let mut node = TreeNode {
        element,
        children: Vec::new(),
        recursive: false,
        truncated: false,
    };

    let definition = match resolver.structural_definition(decl) {
        Some(definition) if node.element.has_children => definition,
        _ => return node,
    };
    if path.contains(&definition.id()) {
        node.recursive = true;
        return node;
    }
    if depth_left == 0 {
        node.truncated = true;
        return node;
    }

    path.insert(definition.id());
    node.children = resolver
        .nested_elements(decl)
        .map(|child| build_subtree(resolver, &child, depth_left - 1, path))
        .collect();
    path.remove(&definition.id());

    node
}

/// Render trees as indented text, one declaration per line
///
/// ```text
/// book : bookType
/// +-- title : xs:string
/// `-- author? : personType
/// ```
pub fn render_text<I>(trees: &[TreeNode<I>]) -> String {
    let mut out = String::new();
    for tree in trees {
        out.push_str(&node_line(tree));
        out.push('\n');
        render_children(&tree.children, "", &mut out);
    }
    out
}

fn render_children<I>(children: &[TreeNode<I>], prefix: &str, out: &mut String) {
    for (idx, child) in children.iter().enumerate() {
        let last = idx + 1 == children.len();
        let branch = if last { "`-- " } else { "+-- " };
        out.push_str(prefix);
        out.push_str(branch);
        out.push_str(&node_line(child));
        out.push('\n');

        let nested = format!("{}{}", prefix, if last { "    " } else { "|   " });
        render_children(&child.children, &nested, out);
    }
}

fn node_line<I>(node: &TreeNode<I>) -> String {
    let mut line = format!("{} : {}", node.element.label(), node.element.badge());
    if node.recursive {
        line.push_str(" (recursive)");
    } else if node.truncated {
        line.push_str(" [+]");
    }
    line
}
