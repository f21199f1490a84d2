//! Resolver integration tests
//!
//! Every scenario runs against both parser backends: the crate's own
//! `SchemaDocument` and a `roxmltree` document.

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use xsdtree::nodes::XmlNode;
use xsdtree::resolver::{self, ElementDeclaration, SchemaResolver};
use xsdtree::{Error, SchemaDocument};

fn fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    std::fs::read_to_string(&path).expect("Failed to read fixture")
}

fn names<'a, N: XmlNode<'a>>(decls: &[ElementDeclaration<N>]) -> Vec<&'a str> {
    decls.iter().map(|d| d.display_name()).collect()
}

fn child<'a, N: XmlNode<'a>>(
    resolver: &SchemaResolver<'a, N>,
    parent: &ElementDeclaration<N>,
    name: &str,
) -> ElementDeclaration<N> {
    resolver
        .resolve_children(parent)
        .into_iter()
        .find(|d| d.display_name() == name)
        .unwrap_or_else(|| panic!("no child named {}", name))
}

// ============================================================================
// Root detection
// ============================================================================

fn assert_book_roots<'a, N: XmlNode<'a>>(schema: N) {
    let roots = resolver::resolve_roots(schema).unwrap();
    assert_eq!(names(&roots), vec!["library", "catalog"]);
}

#[test]
fn test_book_roots() {
    let xml = fixture("book.xsd");
    assert_book_roots(SchemaDocument::parse(&xml).unwrap().root());
    assert_book_roots(roxmltree::Document::parse(&xml).unwrap().root_element());
}

fn assert_not_a_schema<'a, N: XmlNode<'a>>(schema: N) {
    match resolver::resolve_roots(schema) {
        Err(Error::NotASchema(tag)) => assert_eq!(tag, "config"),
        other => panic!("expected NotASchema, got {:?}", other.map(|r| r.len())),
    }
}

#[test]
fn test_config_document_is_not_a_schema() {
    let xml = fixture("config.xml");
    assert_not_a_schema(SchemaDocument::parse(&xml).unwrap().root());
    assert_not_a_schema(roxmltree::Document::parse(&xml).unwrap().root_element());
}

fn assert_no_roots<'a, N: XmlNode<'a>>(schema: N) {
    assert!(matches!(
        resolver::resolve_roots(schema),
        Err(Error::NoRootElement)
    ));
}

#[test]
fn test_mutually_referenced_elements_have_no_root() {
    let xml = fixture("no_roots.xsd");
    assert_no_roots(SchemaDocument::parse(&xml).unwrap().root());
    assert_no_roots(roxmltree::Document::parse(&xml).unwrap().root_element());
}

#[test]
fn test_referenced_named_element_excluded() {
    let xml = r#"<schema>
        <element name="A"><complexType><element name="B" ref="B"/></complexType></element>
        <element name="B"/>
    </schema>"#;
    let doc = SchemaDocument::parse(xml).unwrap();
    let roots = resolver::resolve_roots(doc.root()).unwrap();
    assert_eq!(names(&roots), vec!["A"]);

    let doc = roxmltree::Document::parse(xml).unwrap();
    let roots = resolver::resolve_roots(doc.root_element()).unwrap();
    assert_eq!(names(&roots), vec!["A"]);
}

#[test]
fn test_single_element_schema() {
    let doc = SchemaDocument::parse(r#"<schema><element name="A"/></schema>"#).unwrap();
    let roots = resolver::resolve_roots(doc.root()).unwrap();
    assert_eq!(names(&roots), vec!["A"]);
    assert!(!resolver::has_children(doc.root(), &roots[0]).unwrap());
}

const FOREIGN_ATTRIBUTES: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
        xmlns:e="urn:ext" xmlns:x="urn:x">
    <xs:element e:name="Foreign" name="A">
      <xs:complexType><xs:sequence>
        <xs:element name="B" x:ref="doc" e:type="Ignored"/>
      </xs:sequence></xs:complexType>
    </xs:element>
    <xs:element name="doc"/>
</xs:schema>"#;

fn assert_foreign_attributes_ignored<'a, N: XmlNode<'a>>(schema: N) {
    let resolver = SchemaResolver::new(schema).unwrap();
    let roots = resolver.resolve_roots().unwrap();
    assert_eq!(names(&roots), vec!["A", "doc"]);

    let b = resolver.resolve_children(&roots[0])[0];
    assert_eq!(b.name(), Some("B"));
    assert!(!b.is_reference());
    assert_eq!(b.type_ref(), None);

    let view = resolver.view(&b);
    let attributes: Vec<&str> = view.attributes.keys().map(String::as_str).collect();
    assert_eq!(attributes, vec!["x:ref", "e:type"]);
}

#[test]
fn test_prefixed_attributes_do_not_stand_in_for_xsd_attributes() {
    assert_foreign_attributes_ignored(SchemaDocument::parse(FOREIGN_ATTRIBUTES).unwrap().root());
    let doc = roxmltree::Document::parse(FOREIGN_ATTRIBUTES).unwrap();
    assert_foreign_attributes_ignored(doc.root_element());
}

// ============================================================================
// Child resolution
// ============================================================================

fn assert_book_children<'a, N: XmlNode<'a>>(schema: N) {
    let resolver = SchemaResolver::new(schema).unwrap();
    let roots = resolver.resolve_roots().unwrap();
    let library = roots[0];
    let catalog = roots[1];

    // Inline complex type with a ref child; the attribute is not a child
    let library_children = resolver.resolve_children(&library);
    assert_eq!(names(&library_children), vec!["bk:book"]);
    assert!(library_children[0].is_reference());
    assert!(library_children[0].is_optional());
    assert!(!resolver.has_children(&library_children[0]));
    assert_eq!(library.documentation().as_deref(), Some("A collection of books."));

    // Named type through a prefixed type reference, flattened across choice
    let book = resolver.find_element("book").unwrap();
    assert_eq!(
        names(&resolver.resolve_children(&book)),
        vec!["title", "author", "isbn", "issn", "notes"]
    );

    let author = child(&resolver, &book, "author");
    assert_eq!(names(&resolver.resolve_children(&author)), vec!["first", "last"]);

    // Simple types are leaves
    let isbn = child(&resolver, &book, "isbn");
    assert!(resolver.resolve_children(&isbn).is_empty());
    assert!(child(&resolver, &book, "notes").is_optional());

    // Extension content is flattened; unknown types degrade to leaves
    let catalog_children = resolver.resolve_children(&catalog);
    assert_eq!(names(&catalog_children), vec!["entry"]);
    assert_eq!(catalog_children[0].type_ref(), Some("UnknownType"));
    assert!(resolver.resolve_children(&catalog_children[0]).is_empty());
}

#[test]
fn test_book_children() {
    let xml = fixture("book.xsd");
    assert_book_children(SchemaDocument::parse(&xml).unwrap().root());
    assert_book_children(roxmltree::Document::parse(&xml).unwrap().root_element());
}

fn assert_has_children_matches<'a, N: XmlNode<'a>>(schema: N) {
    let resolver = SchemaResolver::new(schema).unwrap();
    for node in schema.descendants() {
        if let Some(decl) = resolver.declaration(node) {
            assert_eq!(
                resolver.has_children(&decl),
                !resolver.resolve_children(&decl).is_empty(),
                "has_children disagrees for {}",
                decl.display_name()
            );
        }
    }
}

#[test]
fn test_has_children_agrees_with_resolve_children() {
    for name in ["book.xsd", "recursive.xsd", "no_roots.xsd"] {
        let xml = fixture(name);
        assert_has_children_matches(SchemaDocument::parse(&xml).unwrap().root());
        assert_has_children_matches(roxmltree::Document::parse(&xml).unwrap().root_element());
    }
}

#[test]
fn test_unknown_type_has_no_children() {
    let xml = r#"<schema><element name="A" type="UnknownType"/></schema>"#;
    let doc = SchemaDocument::parse(xml).unwrap();
    let roots = resolver::resolve_roots(doc.root()).unwrap();
    assert!(resolver::resolve_children(doc.root(), &roots[0])
        .unwrap()
        .is_empty());
}

#[test]
fn test_recursive_type_expands_lazily() {
    let xml = fixture("recursive.xsd");
    let doc = SchemaDocument::parse(&xml).unwrap();
    let resolver = SchemaResolver::new(doc.root()).unwrap();

    let mut current = resolver.resolve_roots().unwrap()[0];
    for _ in 0..5 {
        current = child(&resolver, &current, "folder");
        assert!(current.is_optional());
        assert!(resolver.has_children(&current));
    }
}

#[test]
fn test_repeated_resolution_is_identical() {
    let xml = fixture("book.xsd");
    let doc = SchemaDocument::parse(&xml).unwrap();
    let resolver = SchemaResolver::new(doc.root()).unwrap();

    let first = resolver.resolve_roots().unwrap();
    let second = resolver.resolve_roots().unwrap();
    assert_eq!(first, second);
    for decl in &first {
        assert_eq!(
            resolver.resolve_children(decl),
            resolver.resolve_children(decl)
        );
    }
}

const MIXED_DOCUMENTATION: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="A">
      <xs:annotation>
        <xs:documentation>
          Use <b>bold</b> text<!-- skipped --> here
        </xs:documentation>
        <xs:documentation>Second</xs:documentation>
      </xs:annotation>
    </xs:element>
</xs:schema>"#;

fn assert_mixed_documentation<'a, N: XmlNode<'a>>(schema: N) {
    let roots = resolver::resolve_roots(schema).unwrap();
    assert_eq!(roots[0].documentation().as_deref(), Some("Use bold text here"));
}

#[test]
fn test_documentation_keeps_inline_markup_text() {
    assert_mixed_documentation(SchemaDocument::parse(MIXED_DOCUMENTATION).unwrap().root());
    let doc = roxmltree::Document::parse(MIXED_DOCUMENTATION).unwrap();
    assert_mixed_documentation(doc.root_element());
}

// ============================================================================
// Malformed input
// ============================================================================

#[test]
fn test_malformed_fixture() {
    match SchemaDocument::parse(&fixture("malformed.xsd")) {
        Err(Error::MalformedXml(err)) => {
            assert!(!err.message.is_empty());
            assert!(err.location.is_some());
        }
        other => panic!("expected MalformedXml, got {:?}", other.map(|d| d.len())),
    }
}
