//! XML document handling
//!
//! [`SchemaDocument`] is an immutable, arena-backed element tree built from
//! raw text with a `quick-xml` event loop. Nodes are addressed by copyable
//! [`NodeId`]s so that callers can keep references to declarations without
//! borrowing the document.

use crate::error::{Error, ParseError, Result};
use crate::limits::Limits;
use crate::names::local_name;
use crate::nodes::XmlNode;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use std::fmt;

/// Identity of an element within a [`SchemaDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in document order
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Attribute {
    name: String,
    value: String,
}

/// Child elements and text runs in document order
#[derive(Debug, Clone)]
enum Content {
    Element(NodeId),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    name: String,
    attributes: Vec<Attribute>,
    content: Vec<Content>,
}

impl NodeData {
    fn local_name(&self) -> &str {
        local_name(&self.name)
    }
}

/// Parsed XML document
///
/// Only element structure, attributes and text are kept, with text stored
/// untrimmed between child elements. Comments, processing instructions and
/// the DOCTYPE are dropped. The first node is
/// always the top-level element; nodes are stored in document order.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    nodes: Vec<NodeData>,
}

impl SchemaDocument {
    /// Parse an XML document from a string with default limits
    pub fn parse(xml: &str) -> Result<Self> {
        Self::parse_with_limits(xml, &Limits::default())
    }

    /// Parse an XML document from a string
    pub fn parse_with_limits(xml: &str, limits: &Limits) -> Result<Self> {
        limits.check_file_size(xml.len())?;

        let mut reader = Reader::from_reader(xml.as_bytes());
        reader.check_end_names(true);

        let mut nodes: Vec<NodeData> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut buf = Vec::new();

        loop {
            let position = reader.buffer_position() as usize;
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                ParseError::new(e.to_string()).at_offset(xml, reader.buffer_position() as usize)
            })?;

            match event {
                Event::Start(e) => {
                    let id = Self::open(&mut nodes, &stack, &e, limits)
                        .map_err(|err| relocate(err, xml, position))?;
                    stack.push(id);
                    limits.check_depth(stack.len())?;
                }
                Event::Empty(e) => {
                    Self::open(&mut nodes, &stack, &e, limits)
                        .map_err(|err| relocate(err, xml, position))?;
                    limits.check_depth(stack.len() + 1)?;
                }
                Event::End(e) => {
                    if stack.pop().is_none() {
                        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                        return Err(ParseError::new(format!("unexpected closing tag </{}>", name))
                            .at_offset(xml, position)
                            .into());
                    }
                }
                Event::Text(e) => {
                    let text = e
                        .unescape()
                        .map_err(|e| ParseError::new(e.to_string()).at_offset(xml, position))?;
                    Self::append_text(&mut nodes, &stack, &text)
                        .map_err(|err| relocate(err, xml, position))?;
                }
                Event::CData(e) => {
                    let raw = e.into_inner();
                    let text = String::from_utf8_lossy(&raw);
                    Self::append_text(&mut nodes, &stack, &text)
                        .map_err(|err| relocate(err, xml, position))?;
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, DOCTYPE
                _ => {}
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(ParseError::new(format!(
                "unexpected end of document: element <{}> is not closed",
                nodes[open.0].name
            ))
            .at_offset(xml, xml.len())
            .into());
        }
        if nodes.is_empty() {
            return Err(ParseError::new("document has no root element").into());
        }

        Ok(Self { nodes })
    }

    /// Register a new element from a start (or empty) tag
    fn open(
        nodes: &mut Vec<NodeData>,
        stack: &[NodeId],
        start: &BytesStart,
        limits: &Limits,
    ) -> Result<NodeId> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| ParseError::new(format!("invalid element name: {}", e)))?
            .to_string();

        if stack.is_empty() && !nodes.is_empty() {
            return Err(ParseError::new(format!(
                "unexpected element <{}> after the root element",
                name
            ))
            .into());
        }

        let mut attributes = Vec::new();
        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| ParseError::new(format!("failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| ParseError::new(format!("invalid attribute name: {}", e)))?;

            // Namespace declarations are not attributes
            if attr_name == "xmlns" || attr_name.starts_with("xmlns:") {
                continue;
            }

            let attr_value = attr
                .unescape_value()
                .map_err(|e| {
                    ParseError::new(format!("failed to unescape attribute value: {}", e))
                })?
                .into_owned();

            attributes.push(Attribute {
                name: attr_name.to_string(),
                value: attr_value,
            });
        }
        limits.check_attributes(attributes.len())?;

        let id = NodeId(nodes.len());
        limits.check_elements(id.0 + 1)?;
        nodes.push(NodeData {
            name,
            attributes,
            content: Vec::new(),
        });
        if let Some(parent) = stack.last() {
            nodes[parent.0].content.push(Content::Element(id));
        }

        Ok(id)
    }

    fn append_text(nodes: &mut [NodeData], stack: &[NodeId], text: &str) -> Result<()> {
        match stack.last() {
            Some(current) => {
                let content = &mut nodes[current.0].content;
                match content.last_mut() {
                    Some(Content::Text(existing)) => existing.push_str(text),
                    _ => content.push(Content::Text(text.to_string())),
                }
                Ok(())
            }
            None if text.trim().is_empty() => Ok(()),
            None => Err(ParseError::new("text content outside of the root element").into()),
        }
    }

    /// The top-level element
    pub fn root(&self) -> Node<'_> {
        Node {
            doc: self,
            id: NodeId(0),
        }
    }

    /// Look up a node by id
    pub fn get(&self, id: NodeId) -> Option<Node<'_>> {
        if id.0 < self.nodes.len() {
            Some(Node { doc: self, id })
        } else {
            None
        }
    }

    /// Number of element nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a parsed document has at least its root element
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All element nodes in document order
    pub fn nodes(&self) -> impl Iterator<Item = Node<'_>> + '_ {
        (0..self.nodes.len()).map(move |idx| Node {
            doc: self,
            id: NodeId(idx),
        })
    }
}

/// Attach a byte-offset location to a parse error raised while handling an event
fn relocate(err: Error, xml: &str, offset: usize) -> Error {
    match err {
        Error::MalformedXml(parse) if parse.location.is_none() => {
            Error::MalformedXml(parse.at_offset(xml, offset))
        }
        other => other,
    }
}

/// Handle to an element of a [`SchemaDocument`]
#[derive(Clone, Copy)]
pub struct Node<'a> {
    doc: &'a SchemaDocument,
    id: NodeId,
}

impl<'a> Node<'a> {
    fn data(&self) -> &'a NodeData {
        &self.doc.nodes[self.id.0]
    }

    /// Tag name exactly as written, prefix included
    pub fn qualified_name(&self) -> &'a str {
        &self.data().name
    }

    fn collect_text(&self, out: &mut String) {
        for item in &self.data().content {
            match item {
                Content::Text(text) => out.push_str(text),
                Content::Element(id) => Node { doc: self.doc, id: *id }.collect_text(out),
            }
        }
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.data().name)
            .finish()
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

/// Iterator over the element children of a [`Node`]
#[derive(Clone)]
pub struct Children<'a> {
    doc: &'a SchemaDocument,
    content: std::slice::Iter<'a, Content>,
}

impl<'a> Iterator for Children<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Node<'a>> {
        self.content.find_map(|item| match item {
            Content::Element(id) => Some(Node { doc: self.doc, id: *id }),
            Content::Text(_) => None,
        })
    }
}

impl<'a> XmlNode<'a> for Node<'a> {
    type Id = NodeId;
    type Children = Children<'a>;

    fn id(&self) -> NodeId {
        self.id
    }

    fn local_name(&self) -> &'a str {
        self.data().local_name()
    }

    fn attribute(&self, name: &str) -> Option<&'a str> {
        self.data()
            .attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    fn children(&self) -> Children<'a> {
        Children {
            doc: self.doc,
            content: self.data().content.iter(),
        }
    }

    fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn attributes(&self) -> Vec<(String, String)> {
        self.data()
            .attributes
            .iter()
            .map(|attr| (attr.name.clone(), attr.value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn malformed(xml: &str) -> ParseError {
        match SchemaDocument::parse(xml) {
            Err(Error::MalformedXml(err)) => err,
            other => panic!("expected malformed XML error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_xml() {
        let xml = r#"<root><child>text</child></root>"#;
        let doc = SchemaDocument::parse(xml).unwrap();

        let root = doc.root();
        assert_eq!(root.local_name(), "root");
        let children: Vec<Node> = root.children().collect();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].local_name(), "child");
        assert_eq!(children[0].text_content(), "text");
    }

    #[test]
    fn test_parse_with_attributes() {
        let xml = r#"<root attr1="value1" p:attr2="value2" xmlns:p="urn:p"><child/></root>"#;
        let doc = SchemaDocument::parse(xml).unwrap();

        let root = doc.root();
        assert_eq!(root.attribute("attr1"), Some("value1"));
        assert_eq!(root.attribute("attr2"), None);
        assert_eq!(
            root.attributes(),
            vec![
                ("attr1".to_string(), "value1".to_string()),
                ("p:attr2".to_string(), "value2".to_string()),
            ]
        );
    }

    #[test]
    fn test_prefixed_attribute_does_not_shadow_unprefixed() {
        let xml = r#"<element e:name="Foreign" name="A" xmlns:e="urn:e"/>"#;
        let doc = SchemaDocument::parse(xml).unwrap();
        assert_eq!(doc.root().attribute("name"), Some("A"));
    }

    #[test]
    fn test_mixed_content_text() {
        let xml = "<doc>\n  Use <b>bold</b> text<!-- c --> here\n</doc>";
        let doc = SchemaDocument::parse(xml).unwrap();
        assert_eq!(doc.root().text_content(), "\n  Use bold text here\n");
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_prefixed_names() {
        let xml = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"><xs:element name="a"/></xs:schema>"#;
        let doc = SchemaDocument::parse(xml).unwrap();

        assert_eq!(doc.root().qualified_name(), "xs:schema");
        assert_eq!(doc.root().local_name(), "schema");
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_entities_and_cdata() {
        let xml = r#"<doc note="a &amp; b">x &lt; y<![CDATA[ & z]]></doc>"#;
        let doc = SchemaDocument::parse(xml).unwrap();

        assert_eq!(doc.root().attribute("note"), Some("a & b"));
        assert_eq!(doc.root().text_content(), "x < y & z");
    }

    #[test]
    fn test_get_and_nodes() {
        let doc = SchemaDocument::parse("<a><b/><c><d/></c></a>").unwrap();
        let names: Vec<&str> = doc.nodes().map(|n| n.local_name()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);

        let d = doc.get(NodeId(3)).unwrap();
        assert_eq!(d.local_name(), "d");
        assert_eq!(d.id().index(), 3);
        assert!(doc.get(NodeId(4)).is_none());
    }

    #[test]
    fn test_mismatched_end_tag() {
        let err = malformed("<a>\n  <b>\n</a>");
        assert!(err.location.is_some());
    }

    #[test]
    fn test_unclosed_element() {
        let err = malformed("<a><b></b>");
        assert!(err.message.contains("<a>"));
    }

    #[test]
    fn test_empty_and_text_only_documents() {
        assert!(malformed("").message.contains("no root element"));
        malformed("just text");
    }

    #[test]
    fn test_multiple_roots() {
        let err = malformed("<a/><b/>");
        assert!(err.message.contains("<b>"));
    }

    #[test]
    fn test_depth_limit() {
        let limits = Limits {
            max_depth: 2,
            ..Limits::default()
        };
        let result = SchemaDocument::parse_with_limits("<a><b></b><b/></a>", &limits);
        assert!(result.is_ok());

        let result = SchemaDocument::parse_with_limits("<a><b><c/></b></a>", &limits);
        assert!(matches!(result, Err(Error::LimitExceeded(_))));
    }

    #[test]
    fn test_comments_and_declaration_ignored() {
        let xml = "<?xml version=\"1.0\"?>\n<!-- header -->\n<a><!-- inner --><b/></a>\n";
        let doc = SchemaDocument::parse(xml).unwrap();
        assert_eq!(doc.len(), 2);
    }
}
