//! What lives in each arena slot.

use crate::serialize::Markup;
use crate::{Attributes, ElementCollection, TagDef};
use compact_str::CompactString;
use indextree::NodeId;
use std::rc::Rc;

/// Tag name, definition and attributes of a `Tag` or `Document` node.
#[derive(Debug, Clone)]
pub struct TagData {
    pub(crate) name: CompactString,
    pub(crate) def: Rc<TagDef>,
    pub attributes: Attributes,
}

impl TagData {
    pub(crate) fn new(name: CompactString, def: Rc<TagDef>) -> Self {
        Self {
            name,
            def,
            attributes: Attributes::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn def(&self) -> &TagDef {
        &self.def
    }

    pub fn id(&self) -> Option<&str> {
        match self.attributes.get_value("id") {
            Some(crate::AttributeValue::Text(id)) => Some(id.as_str()),
            _ => None,
        }
    }
}

/// A tree node.
#[derive(Debug, Clone)]
pub enum Node {
    /// The rendering context's own node. Never moved, never removed.
    Root,
    /// Bare element: renders its children.
    Element,
    /// Tagless grouping node, transparent for indentation and queries.
    Container,
    /// Text payload, escaped on render unless `raw`.
    Text { text: CompactString, raw: bool },
    /// `<!-- comment -->`
    Comment(Option<CompactString>),
    Tag(TagData),
    /// The `html` tag, rendered after a doctype line.
    Document(TagData),
}

impl Node {
    pub fn text(text: impl Into<CompactString>) -> Self {
        Node::Text {
            text: text.into(),
            raw: false,
        }
    }

    pub fn raw(html: impl Into<CompactString>) -> Self {
        Node::Text {
            text: html.into(),
            raw: true,
        }
    }

    /// Tags and documents: what queries return.
    pub fn is_tag(&self) -> bool {
        matches!(self, Node::Tag(_) | Node::Document(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text { .. })
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Node::Container)
    }

    /// Text and comment nodes never hold children.
    pub fn accepts_children(&self) -> bool {
        !matches!(self, Node::Text { .. } | Node::Comment(_))
    }

    pub fn tag(&self) -> Option<&TagData> {
        match self {
            Node::Tag(tag) | Node::Document(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn tag_mut(&mut self) -> Option<&mut TagData> {
        match self {
            Node::Tag(tag) | Node::Document(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn tag_name(&self) -> Option<&str> {
        self.tag().map(TagData::name)
    }

    pub fn text_content(&self) -> Option<&str> {
        match self {
            Node::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Content handed to a builder call or to
/// [`Tree::set_content`](crate::Tree::set_content).
///
/// Strings become escaped text nodes, [`Markup`] becomes a raw text node, and
/// nodes are moved in as children.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(CompactString),
    Raw(Markup),
    /// A handle from the same tree; see [`Tree::check`](crate::Tree::check).
    Node(NodeId),
    Nodes(Vec<NodeId>),
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(CompactString::from(text))
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(CompactString::from(text))
    }
}

impl From<&String> for Content {
    fn from(text: &String) -> Self {
        Content::Text(CompactString::from(text.as_str()))
    }
}

impl From<CompactString> for Content {
    fn from(text: CompactString) -> Self {
        Content::Text(text)
    }
}

impl From<Markup> for Content {
    fn from(markup: Markup) -> Self {
        Content::Raw(markup)
    }
}

impl From<NodeId> for Content {
    fn from(node: NodeId) -> Self {
        Content::Node(node)
    }
}

impl From<Vec<NodeId>> for Content {
    fn from(nodes: Vec<NodeId>) -> Self {
        Content::Nodes(nodes)
    }
}

impl From<ElementCollection> for Content {
    fn from(nodes: ElementCollection) -> Self {
        Content::Nodes(nodes.into_vec())
    }
}
