// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
A mutable SVG document tree with typed attributes, DOM-style events
and SMIL animation elements.

`anitree` uses [`roxmltree`](https://github.com/RazrFalcon/roxmltree) for parsing,
but instead of keeping raw XML, every attribute is coerced through a per-element
schema on write. Elements carry event listeners and a load lifecycle,
so a host can deliver `load`, `click` and `SVGTimer` events to scripted handlers.
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

#[macro_use]
mod values;
mod attributes;
mod error;
mod events;
#[rustfmt::skip] mod names;
mod options;
mod parse;
mod resource;
pub mod schema;
mod script;
mod timer;
mod timing;
mod traverser;
mod tree;

use std::collections::{HashMap, VecDeque};
use std::num::NonZeroU32;

pub use attributes::AttributeChange;
pub use error::{AttrError, Error, ResourceError, ScriptError, TreeError};
pub use events::{EventType, Listener, ListenerRegistration, MouseData, XmlEvent};
pub use names::{AId, EId};
pub use options::Options;
pub use parse::{TreeBuilder, XmlAttribute};
pub use resource::{LocalFetcher, ResourceFetcher};
pub use schema::AttributeDescriptor;
pub use script::{
    wrap_handler_code, ScriptContext, ScriptType, ScriptValue, HANDLER_FUNCTION,
    SCRIPT_FILE_LABEL,
};
pub use timer::SvgTimer;
pub use timing::{Duration, DurationUnit, RepeatCount, TimingError};
pub use traverser::{walk_tree, Traverser};
pub use values::{
    count_words, is_iri, AttributeValue, Coercion, EnumTable, EnumValue, FromValue, ValueKind,
};

pub use roxmltree;
pub use svgtypes;

/// The SVG namespace.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
/// The XLink namespace.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
/// The XML namespace.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
/// The XML namespaces namespace.
pub const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";
/// The XML Events namespace.
pub const XML_EVENTS_NS: &str = "http://www.w3.org/2001/xml-events";

/// An SVG document.
///
/// Owns all nodes, the id index, the namespace table and the event queue.
/// Nodes are addressed by [`NodeId`] and read through the [`Node`] handle.
pub struct Document {
    nodes: Vec<NodeData>,
    links: HashMap<String, NodeId>,
    namespaces: Vec<(String, String)>,
    base_iri: Option<String>,
    queue: VecDeque<XmlEvent>,
    changes: Vec<AttributeChange>,
}

impl Document {
    /// Creates an empty document with only the root node.
    pub fn new() -> Self {
        Document {
            nodes: vec![NodeData::new(NodeKind::Root)],
            links: HashMap::new(),
            namespaces: vec![
                ("xml".to_string(), XML_NS.to_string()),
                ("xmlns".to_string(), XMLNS_NS.to_string()),
            ],
            base_iri: None,
            queue: VecDeque::new(),
            changes: Vec::new(),
        }
    }

    /// Returns the root node.
    #[inline]
    pub fn root(&self) -> Node {
        self.get(NodeId::new(0))
    }

    /// Returns the root element.
    #[inline]
    pub fn root_element(&self) -> Option<Node> {
        self.root().first_element_child()
    }

    /// Returns an iterator over document's descendant nodes.
    ///
    /// Shorthand for `doc.root().descendants()`.
    #[inline]
    pub fn descendants(&self) -> Descendants {
        self.root().descendants()
    }

    /// Returns an element by ID.
    ///
    /// Unlike the [`Descendants`] iterator, this is just a HashMap lookup.
    #[inline]
    pub fn element_by_id(&self, id: &str) -> Option<Node> {
        let node_id = self.links.get(id)?;
        Some(self.get(*node_id))
    }

    /// Returns a node by its id.
    ///
    /// # Panics
    ///
    /// Panics when the id belongs to another document.
    #[inline]
    pub fn get(&self, id: NodeId) -> Node {
        Node {
            id,
            d: &self.nodes[id.get_usize()],
            doc: self,
        }
    }

    /// Returns the number of nodes, including the root.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Checks that the document has no nodes besides the root.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Returns the document base IRI.
    #[inline]
    pub fn document_base_iri(&self) -> Option<&str> {
        self.base_iri.as_deref()
    }

    /// Sets the document base IRI.
    pub fn set_document_base_iri(&mut self, iri: Option<String>) {
        self.base_iri = iri;
        for node in &mut self.nodes {
            if let NodeKind::Element(ref mut e) = node.kind {
                e.base_iri.take();
            }
        }
    }

    /// Returns a namespace URI bound to a prefix.
    pub fn lookup_namespace(&self, prefix: &str) -> Option<&str> {
        self.namespaces
            .iter()
            .rev()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// Returns a prefix bound to a namespace URI.
    pub fn lookup_prefix(&self, uri: &str) -> Option<&str> {
        self.namespaces
            .iter()
            .rev()
            .find(|(_, u)| u == uri)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// Binds a prefix to a namespace URI.
    ///
    /// A later binding of the same prefix shadows the previous one.
    pub fn add_namespace(&mut self, prefix: &str, uri: &str) {
        if self.lookup_namespace(prefix) == Some(uri) {
            return;
        }

        log::trace!("Namespace {}={}.", prefix, uri);
        self.namespaces.push((prefix.to_string(), uri.to_string()));
    }

    #[inline]
    fn node_data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.get_usize()]
    }

    #[inline]
    fn node_data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.get_usize()]
    }

    #[inline]
    fn element_data(&self, id: NodeId) -> Option<&ElementData> {
        match self.nodes.get(id.get_usize())?.kind {
            NodeKind::Element(ref e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    fn element_data_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.nodes.get_mut(id.get_usize())?.kind {
            NodeKind::Element(ref mut e) => Some(e),
            _ => None,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        if !self.root().has_children() {
            return write!(f, "Document []");
        }

        macro_rules! writeln_indented {
            ($depth:expr, $f:expr, $fmt:expr) => {
                for _ in 0..$depth { write!($f, "    ")?; }
                writeln!($f, $fmt)?;
            };
            ($depth:expr, $f:expr, $fmt:expr, $($arg:tt)*) => {
                for _ in 0..$depth { write!($f, "    ")?; }
                writeln!($f, $fmt, $($arg)*)?;
            };
        }

        fn print_children(
            parent: Node,
            depth: usize,
            f: &mut std::fmt::Formatter,
        ) -> Result<(), std::fmt::Error> {
            for child in parent.children() {
                if let Some(tag_name) = child.tag_name() {
                    writeln_indented!(depth, f, "Element {{");
                    writeln_indented!(depth, f, "    tag_name: {}", tag_name);

                    if !child.attributes().is_empty() {
                        writeln_indented!(depth + 1, f, "attributes: [");
                        for attr in child.attributes() {
                            writeln_indented!(depth + 2, f, "{:?}", attr);
                        }
                        writeln_indented!(depth + 1, f, "]");
                    }

                    if child.has_children() {
                        writeln_indented!(depth, f, "    children: [");
                        print_children(child, depth + 2, f)?;
                        writeln_indented!(depth, f, "    ]");
                    }

                    writeln_indented!(depth, f, "}}");
                } else {
                    writeln_indented!(depth, f, "{:?}", child);
                }
            }

            Ok(())
        }

        writeln!(f, "Document [")?;
        print_children(self.root(), 1, f)?;
        writeln!(f, "]")?;

        Ok(())
    }
}

/// A node identifier within its [`Document`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    #[inline]
    fn new(id: u32) -> Self {
        debug_assert!(id < core::u32::MAX);

        // We are using `NonZeroU32` to reduce overhead of `Option<NodeId>`.
        match NonZeroU32::new(id + 1) {
            Some(n) => NodeId(n),
            None => unreachable!(),
        }
    }

    #[inline]
    fn get(self) -> u32 {
        self.0.get() - 1
    }

    #[inline]
    fn get_usize(self) -> usize {
        self.get() as usize
    }
}

impl From<usize> for NodeId {
    #[inline]
    fn from(id: usize) -> Self {
        debug_assert!(id <= core::u32::MAX as usize);
        NodeId::new(id as u32)
    }
}

enum NodeKind {
    Root,
    Element(Box<ElementData>),
    Text(String),
}

struct NodeData {
    parent: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
    children: Option<(NodeId, NodeId)>,
    kind: NodeKind,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        NodeData {
            parent: None,
            prev_sibling: None,
            next_sibling: None,
            children: None,
            kind,
        }
    }
}

struct ElementData {
    tag_name: EId,
    namespace: Option<String>,
    attributes: Vec<Attribute>,
    listeners: Option<Box<HashMap<String, Vec<ListenerRegistration>>>>,
    watched: Vec<AId>,
    load: LoadState,
    base_iri: once_cell::unsync::OnceCell<Option<String>>,
}

impl ElementData {
    fn new(tag_name: EId) -> Self {
        ElementData {
            tag_name,
            namespace: Some(SVG_NS.to_string()),
            attributes: Vec::new(),
            listeners: None,
            watched: Vec::new(),
            load: LoadState::default(),
            base_iri: once_cell::unsync::OnceCell::new(),
        }
    }

    fn attribute(&self, aid: AId) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|a| a.name == aid)
            .map(|a| &a.value)
    }
}

struct LoadState {
    // The element itself plus its not yet loaded child elements.
    pending: u32,
    parsed: bool,
    loaded: bool,
    deferred_load: bool,
}

impl Default for LoadState {
    fn default() -> Self {
        LoadState {
            pending: 1,
            parsed: false,
            loaded: false,
            deferred_load: false,
        }
    }
}

/// An attribute.
#[derive(Clone, PartialEq)]
pub struct Attribute {
    /// Attribute's name.
    pub name: AId,
    /// Attribute's coerced value.
    pub value: AttributeValue,
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "Attribute {{ name: {:?}, value: {} }}",
            self.name, self.value
        )
    }
}

/// A read-only node handle.
#[derive(Clone, Copy)]
pub struct Node<'a> {
    id: NodeId,
    doc: &'a Document,
    d: &'a NodeData,
}

impl Eq for Node<'_> {}

impl PartialEq for Node<'_> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.doc, other.doc)
    }
}

impl<'a> Node<'a> {
    /// Returns node's id.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Checks if the current node is the document root.
    #[inline]
    pub fn is_root(&self) -> bool {
        matches!(self.d.kind, NodeKind::Root)
    }

    /// Checks if the current node is an element.
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.d.kind, NodeKind::Element(_))
    }

    /// Checks if the current node is a text.
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.d.kind, NodeKind::Text(_))
    }

    /// Returns node's document.
    #[inline]
    pub fn document(&self) -> &'a Document {
        self.doc
    }

    #[inline]
    fn element_data(&self) -> Option<&'a ElementData> {
        match self.d.kind {
            NodeKind::Element(ref e) => Some(e),
            _ => None,
        }
    }

    /// Returns element's tag name, unless the current node is text or root.
    #[inline]
    pub fn tag_name(&self) -> Option<EId> {
        self.element_data().map(|e| e.tag_name)
    }

    /// Returns element's namespace URI.
    #[inline]
    pub fn namespace(&self) -> Option<&'a str> {
        self.element_data()?.namespace.as_deref()
    }

    /// Returns element's `id` attribute value.
    ///
    /// Returns an empty string otherwise.
    #[inline]
    pub fn element_id(&self) -> &'a str {
        self.attribute(AId::Id).unwrap_or("")
    }

    /// Returns a descriptor of an attribute of this element.
    #[inline]
    pub fn descriptor(&self, aid: AId) -> Option<&'static AttributeDescriptor> {
        schema::descriptor(self.tag_name()?, aid)
    }

    /// Returns a locally set attribute value.
    ///
    /// Returns `None` when the attribute is not set or holds a value of a different kind.
    #[inline]
    pub fn attribute<T: FromValue<'a>>(&self, aid: AId) -> Option<T> {
        T::parse(self.attribute_value(aid)?)
    }

    /// Returns a locally set raw attribute value.
    #[inline]
    pub fn attribute_value(&self, aid: AId) -> Option<&'a AttributeValue> {
        self.element_data()?.attribute(aid)
    }

    /// Checks if an attribute is set locally.
    #[inline]
    pub fn has_attribute(&self, aid: AId) -> bool {
        self.attribute_value(aid).is_some()
    }

    /// Returns a list of all locally set attributes.
    #[inline]
    pub fn attributes(&self) -> &'a [Attribute] {
        match self.element_data() {
            Some(e) => &e.attributes,
            None => &[],
        }
    }

    /// Finds an attribute starting from the current node.
    ///
    /// Inheritable attributes are looked up in ancestors until the root
    /// or a terminal scope element (`svg`) is reached.
    /// Other attributes are checked only on the current node.
    pub fn find_attribute<T: FromValue<'a>>(&self, aid: AId) -> Option<T> {
        self.find_attribute_impl(aid)
            .and_then(|n| n.attribute_value(aid))
            .and_then(T::parse)
    }

    fn find_attribute_impl(&self, aid: AId) -> Option<Node<'a>> {
        if self.has_attribute(aid) {
            return Some(*self);
        }

        let inheritable = self.descriptor(aid).map(|d| d.is_inheritable()) == Some(true);
        if !inheritable {
            return None;
        }

        for n in self.ancestors().skip(1) {
            match n.tag_name() {
                Some(eid) if eid.is_terminal_scope() => return None,
                Some(_) if n.has_attribute(aid) => return Some(n),
                Some(_) => {}
                None => return None,
            }
        }

        None
    }

    /// Finds an attribute and falls back to its default value.
    pub fn resolve<T>(&self, aid: AId) -> Option<T>
    where
        T: for<'b> FromValue<'b>,
    {
        if let Some(v) = self.find_attribute(aid) {
            return Some(v);
        }

        let value = self.descriptor(aid)?.default_value()?;
        T::parse(&value)
    }

    /// Returns node's text data.
    ///
    /// For text nodes returns its content. For elements returns the first child node text.
    #[inline]
    pub fn text(&self) -> &'a str {
        match self.d.kind {
            NodeKind::Element(_) => match self.first_child() {
                Some(child) => match child.d.kind {
                    NodeKind::Text(ref text) => text,
                    _ => "",
                },
                None => "",
            },
            NodeKind::Text(ref text) => text,
            NodeKind::Root => "",
        }
    }

    /// Returns the concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        for n in self.descendants() {
            if let NodeKind::Text(ref s) = n.d.kind {
                text.push_str(s);
            }
        }

        text
    }

    /// Checks that the element and all its child elements are loaded.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.element_data().map(|e| e.load.loaded) == Some(true)
    }

    /// Returns listeners registered for an event type.
    pub fn listeners(&self, event_type: &str) -> &'a [ListenerRegistration] {
        self.element_data()
            .and_then(|e| e.listeners.as_ref())
            .and_then(|map| map.get(event_type))
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// Returns a parent node.
    #[inline]
    pub fn parent(&self) -> Option<Self> {
        self.d.parent.map(|id| self.doc.get(id))
    }

    /// Returns the parent element.
    #[inline]
    pub fn parent_element(&self) -> Option<Self> {
        self.ancestors().skip(1).find(|n| n.is_element())
    }

    /// Returns the previous sibling.
    #[inline]
    pub fn prev_sibling(&self) -> Option<Self> {
        self.d.prev_sibling.map(|id| self.doc.get(id))
    }

    /// Returns the next sibling.
    #[inline]
    pub fn next_sibling(&self) -> Option<Self> {
        self.d.next_sibling.map(|id| self.doc.get(id))
    }

    /// Returns the first child.
    #[inline]
    pub fn first_child(&self) -> Option<Self> {
        self.d.children.map(|(id, _)| self.doc.get(id))
    }

    /// Returns the first child element.
    #[inline]
    pub fn first_element_child(&self) -> Option<Self> {
        self.children().find(|n| n.is_element())
    }

    /// Returns the last child.
    #[inline]
    pub fn last_child(&self) -> Option<Self> {
        self.d.children.map(|(_, id)| self.doc.get(id))
    }

    /// Checks if the node has child nodes.
    #[inline]
    pub fn has_children(&self) -> bool {
        self.d.children.is_some()
    }

    /// Returns an iterator over ancestor nodes starting at this node.
    #[inline]
    pub fn ancestors(&self) -> Ancestors<'a> {
        Ancestors(Some(*self))
    }

    /// Returns an iterator over children nodes.
    #[inline]
    pub fn children(&self) -> Children<'a> {
        Children {
            front: self.first_child(),
            back: self.last_child(),
        }
    }

    #[inline]
    fn traverse(&self) -> Traverse<'a> {
        Traverse {
            root: *self,
            edge: None,
        }
    }

    /// Returns an iterator over this node and its descendants.
    #[inline]
    pub fn descendants(&self) -> Descendants<'a> {
        Descendants(self.traverse())
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        match self.d.kind {
            NodeKind::Root => write!(f, "Root"),
            NodeKind::Element(ref e) => {
                write!(
                    f,
                    "Element {{ tag_name: {}, attributes: {:?} }}",
                    e.tag_name, e.attributes
                )
            }
            NodeKind::Text(ref text) => write!(f, "Text({:?})", text),
        }
    }
}

/// An iterator over ancestor nodes.
#[derive(Clone, Debug)]
pub struct Ancestors<'a>(Option<Node<'a>>);

impl<'a> Iterator for Ancestors<'a> {
    type Item = Node<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.0.take();
        self.0 = node.as_ref().and_then(Node::parent);
        node
    }
}

/// An iterator over children nodes.
#[derive(Clone, Debug)]
pub struct Children<'a> {
    front: Option<Node<'a>>,
    back: Option<Node<'a>>,
}

impl<'a> Iterator for Children<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.front.take();
        if self.front == self.back {
            self.back = None;
        } else {
            self.front = node.as_ref().and_then(Node::next_sibling);
        }
        node
    }
}

impl<'a> DoubleEndedIterator for Children<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let node = self.back.take();
        if self.back == self.front {
            self.front = None;
        } else {
            self.back = node.as_ref().and_then(Node::prev_sibling);
        }
        node
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum Edge<'a> {
    Open(Node<'a>),
    Close(Node<'a>),
}

#[derive(Clone, Debug)]
struct Traverse<'a> {
    root: Node<'a>,
    edge: Option<Edge<'a>>,
}

impl<'a> Iterator for Traverse<'a> {
    type Item = Edge<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.edge {
            Some(Edge::Open(node)) => {
                self.edge = Some(match node.first_child() {
                    Some(first_child) => Edge::Open(first_child),
                    None => Edge::Close(node),
                });
            }
            Some(Edge::Close(node)) => {
                if node == self.root {
                    self.edge = None;
                } else if let Some(next_sibling) = node.next_sibling() {
                    self.edge = Some(Edge::Open(next_sibling));
                } else {
                    self.edge = node.parent().map(Edge::Close);
                }
            }
            None => {
                self.edge = Some(Edge::Open(self.root));
            }
        }

        self.edge
    }
}

/// A descendants iterator.
#[derive(Clone, Debug)]
pub struct Descendants<'a>(Traverse<'a>);

impl<'a> Iterator for Descendants<'a> {
    type Item = Node<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        for edge in &mut self.0 {
            if let Edge::Open(node) = edge {
                return Some(node);
            }
        }

        None
    }
}
