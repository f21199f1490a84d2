//! Viewer session state
//!
//! A [`Session`] owns the currently loaded schema: its parsed document, the
//! derived root list and the children expanded so far. Loading replaces all
//! of it in one step. A failed load leaves the session empty rather than
//! showing the previous schema.

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

use crate::documents::{Node, NodeId, SchemaDocument};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::loaders::{is_valid_file_type, Loader, SourceInfo};
use crate::nodes::XmlNode;
use crate::resolver::{ElementDeclaration, SchemaResolver};
use crate::views::{build_tree, ElementView, TreeNode};

/// View of an element declaration in a loaded schema
pub type NodeView = ElementView<NodeId>;

/// Tree of views over a loaded schema
pub type NodeTree = TreeNode<NodeId>;

/// A schema that loaded successfully
#[derive(Debug)]
pub struct LoadedSchema {
    source: SourceInfo,
    document: SchemaDocument,
    roots: Vec<NodeId>,
    expanded: HashMap<NodeId, Vec<NodeView>>,
}

impl LoadedSchema {
    /// Parse `text` and resolve its roots
    pub fn parse(source: SourceInfo, text: &str, limits: &Limits) -> Result<Self> {
        let document = SchemaDocument::parse_with_limits(text, limits)?;
        let roots = SchemaResolver::new(document.root())?
            .resolve_roots()?
            .iter()
            .map(|decl| decl.node().id())
            .collect();

        Ok(Self {
            source,
            document,
            roots,
            expanded: HashMap::new(),
        })
    }

    /// Where the schema was loaded from
    pub fn source(&self) -> &SourceInfo {
        &self.source
    }

    /// The parsed document
    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    /// Resolver over the loaded document
    pub fn resolver(&self) -> SchemaResolver<'_, Node<'_>> {
        // The top-level tag was checked when the schema was loaded
        SchemaResolver::checked(self.document.root())
    }

    /// Root element declarations in document order
    pub fn roots(&self) -> Vec<ElementDeclaration<Node<'_>>> {
        self.roots
            .iter()
            .filter_map(|&id| self.declaration(id))
            .collect()
    }

    /// Views of the root element declarations
    pub fn root_views(&self) -> Vec<NodeView> {
        let resolver = self.resolver();
        self.roots().iter().map(|decl| resolver.view(decl)).collect()
    }

    /// Element declaration with id `id`, if the node is one
    pub fn declaration(&self, id: NodeId) -> Option<ElementDeclaration<Node<'_>>> {
        self.document.get(id).and_then(ElementDeclaration::from_node)
    }

    /// View of the declaration with id `id`
    pub fn view(&self, id: NodeId) -> Result<NodeView> {
        let decl = self
            .declaration(id)
            .ok_or(Error::UnknownNode(id.index()))?;
        Ok(self.resolver().view(&decl))
    }

    /// First element declaration named `name`, roots first
    pub fn find(&self, name: &str) -> Result<ElementDeclaration<Node<'_>>> {
        self.roots()
            .into_iter()
            .find(|decl| decl.name() == Some(name))
            .or_else(|| self.resolver().find_element(name))
            .ok_or_else(|| Error::ElementNotFound(name.to_string()))
    }

    /// Children of the declaration with id `id`, computed once and cached
    pub fn expand(&mut self, id: NodeId) -> Result<&[NodeView]> {
        if !self.expanded.contains_key(&id) {
            let views = {
                let decl = self
                    .declaration(id)
                    .ok_or(Error::UnknownNode(id.index()))?;
                let resolver = self.resolver();
                resolver
                    .resolve_children(&decl)
                    .iter()
                    .map(|child| resolver.view(child))
                    .collect()
            };
            self.expanded.insert(id, views);
        }
        Ok(self
            .expanded
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    /// Whether the children of `id` are cached
    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.expanded.contains_key(&id)
    }

    /// Fully expanded trees below every root
    pub fn tree(&self, max_depth: usize) -> Vec<NodeTree> {
        let resolver = self.resolver();
        self.roots()
            .iter()
            .map(|decl| build_tree(&resolver, decl, max_depth))
            .collect()
    }

    /// Fully expanded tree below the declaration with id `id`
    pub fn subtree(&self, id: NodeId, max_depth: usize) -> Result<NodeTree> {
        let decl = self
            .declaration(id)
            .ok_or(Error::UnknownNode(id.index()))?;
        Ok(build_tree(&self.resolver(), &decl, max_depth))
    }
}

/// Controller-side session holding at most one loaded schema
#[derive(Debug, Default)]
pub struct Session {
    loader: Loader,
    current: Option<LoadedSchema>,
}

impl Session {
    /// Create an empty session with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits used for loading and parsing
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.loader = self.loader.with_limits(limits);
        self
    }

    /// Load a schema file, replacing the current schema
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<&mut LoadedSchema> {
        self.current = None;
        let source = self.loader.load(path)?;
        self.install(source.info, &source.text)
    }

    /// Load schema text under the file name `name`, replacing the current schema
    pub fn load_str(&mut self, name: &str, text: &str) -> Result<&mut LoadedSchema> {
        self.current = None;
        if !is_valid_file_type(name) {
            return Err(Error::UnsupportedFileType(name.to_string()));
        }
        self.loader.limits().check_file_size(text.len())?;
        self.install(SourceInfo::new(name, text.len() as u64), text)
    }

    fn install(&mut self, source: SourceInfo, text: &str) -> Result<&mut LoadedSchema> {
        let name = source.name.clone();
        let loaded = match LoadedSchema::parse(source, text, self.loader.limits()) {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!(file = %name, error = %err, "failed to load schema");
                return Err(err);
            }
        };

        info!(
            file = %name,
            size = %loaded.source.formatted_size(),
            roots = loaded.roots.len(),
            "schema loaded"
        );
        Ok(self.current.insert(loaded))
    }

    /// The loaded schema, if any
    pub fn current(&self) -> Option<&LoadedSchema> {
        self.current.as_ref()
    }

    /// The loaded schema, or [`Error::NoSchemaLoaded`]
    pub fn loaded(&self) -> Result<&LoadedSchema> {
        self.current.as_ref().ok_or(Error::NoSchemaLoaded)
    }

    /// Children of `id` in the loaded schema, cached per session
    pub fn expand(&mut self, id: NodeId) -> Result<&[NodeView]> {
        self.current
            .as_mut()
            .ok_or(Error::NoSchemaLoaded)?
            .expand(id)
    }

    /// Discard the loaded schema
    pub fn clear(&mut self) {
        self.current = None;
    }
}
