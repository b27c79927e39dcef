//! Builder primitives on [`Context`]: creating nodes, inserting them along
//! the current flow, and running nested blocks.

use crate::context::{Context, Flow};
use crate::error::{BuildError, Result};
use crate::node::{Content, Node, TagData};
use crate::serialize::Markup;
use crate::{ElementCollection, TagDef, Value, debug};
use compact_str::CompactString;
use indextree::NodeId;
use std::fmt::Display;
use std::rc::Rc;

/// What a builder call creates.
#[derive(Debug, Clone)]
pub enum Kind<'k> {
    /// A tag looked up by keyword in the context's registry.
    Tag(&'k str),
    /// A tag from an explicit definition.
    Def(Rc<TagDef>),
    Element,
    Container,
    /// Text from the content argument, escaped unless it is [`Markup`].
    Text,
    /// Comment with the content argument as its text.
    Comment,
    /// `html` with a head and a body; the block runs inside the body.
    Document,
}

impl<'k> From<&'k str> for Kind<'k> {
    fn from(keyword: &'k str) -> Self {
        Kind::Tag(keyword)
    }
}

impl From<Rc<TagDef>> for Kind<'_> {
    fn from(def: Rc<TagDef>) -> Self {
        Kind::Def(def)
    }
}

impl From<TagDef> for Kind<'_> {
    fn from(def: TagDef) -> Self {
        Kind::Def(Rc::new(def))
    }
}

/// Content and attributes for a builder call.
#[derive(Debug, Clone, Default)]
pub struct Args {
    pub content: Option<Content>,
    pub attributes: Vec<(CompactString, Value)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(text: &str) -> Self {
        Self::new().content(text)
    }

    pub fn content(mut self, content: impl Into<Content>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn attr(mut self, name: impl Display, value: impl Into<Value>) -> Self {
        self.attributes
            .push((compact_str::format_compact!("{name}"), value.into()));
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, classes: &str) -> Self {
        self.attr("class", classes)
    }
}

impl From<()> for Args {
    fn from(_: ()) -> Self {
        Args::new()
    }
}

impl From<Content> for Args {
    fn from(content: Content) -> Self {
        Args::new().content(content)
    }
}

impl From<&str> for Args {
    fn from(text: &str) -> Self {
        Args::text(text)
    }
}

impl From<String> for Args {
    fn from(text: String) -> Self {
        Args::new().content(text)
    }
}

impl From<Markup> for Args {
    fn from(markup: Markup) -> Self {
        Args::new().content(markup)
    }
}

impl From<NodeId> for Args {
    fn from(node: NodeId) -> Self {
        Args::new().content(node)
    }
}

impl From<ElementCollection> for Args {
    fn from(nodes: ElementCollection) -> Self {
        Args::new().content(nodes)
    }
}

impl<K: Display, V: Into<Value>, const N: usize> From<[(K, V); N]> for Args {
    fn from(attributes: [(K, V); N]) -> Self {
        attributes
            .into_iter()
            .fold(Args::new(), |args, (name, value)| args.attr(name, value))
    }
}

impl<K: Display, V: Into<Value>, const N: usize> From<(&str, [(K, V); N])> for Args {
    fn from((text, attributes): (&str, [(K, V); N])) -> Self {
        let args: Args = attributes.into();
        args.content(text)
    }
}

/// A node handle or a selector resolved against the current element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'s> {
    /// A handle from this context's tree; see [`Tree::check`](crate::Tree::check).
    Node(NodeId),
    Selector(&'s str),
}

impl From<NodeId> for Target<'_> {
    fn from(node: NodeId) -> Self {
        Target::Node(node)
    }
}

impl<'s> From<&'s str> for Target<'s> {
    fn from(selector: &'s str) -> Self {
        Target::Selector(selector)
    }
}

fn no_block(_: &mut Context) -> Result<()> {
    Ok(())
}

impl Context {
    // ---- creating ----

    fn tag_def(&self, keyword: &str) -> Rc<TagDef> {
        self.registry()
            .get(keyword)
            .cloned()
            .unwrap_or_else(|| Rc::new(TagDef::new(keyword)))
    }

    fn new_tag(&mut self, def: Rc<TagDef>, document: bool) -> Result<NodeId> {
        let name = CompactString::from(def.name()?);
        let mut tag = TagData::new(name, Rc::clone(&def));
        for (attr, value) in def.default_attributes() {
            tag.attributes.set(attr, value);
        }
        let node = if document {
            Node::Document(tag)
        } else {
            Node::Tag(tag)
        };
        Ok(self.tree_mut().new_node(node))
    }

    /// Allocate a detached node. Text and comment nodes take their payload
    /// out of `args`.
    fn create(&mut self, kind: Kind<'_>, args: &mut Args) -> Result<NodeId> {
        let node = match kind {
            Kind::Tag(keyword) => {
                let def = self.registry().lookup(keyword)?;
                return self.new_tag(def, false);
            }
            Kind::Def(def) => return self.new_tag(def, false),
            Kind::Document => return self.new_tag(self.tag_def("html"), true),
            Kind::Element => Node::Element,
            Kind::Container => Node::Container,
            Kind::Text => match args.content.take() {
                None => Node::text(""),
                Some(Content::Text(text)) => Node::text(text),
                Some(Content::Raw(markup)) => Node::raw(markup.into_string()),
                Some(_) => return Err(BuildError::invalid("text nodes hold text, not nodes")),
            },
            Kind::Comment => match args.content.take() {
                None => Node::Comment(None),
                Some(Content::Text(text)) => Node::Comment((!text.is_empty()).then_some(text)),
                Some(Content::Raw(markup)) => Node::Comment(
                    (!markup.is_empty()).then(|| CompactString::from(markup.as_str())),
                ),
                Some(_) => return Err(BuildError::invalid("comments hold text, not nodes")),
            },
        };
        Ok(self.tree_mut().new_node(node))
    }

    /// Content, default id, explicit attributes, default classes, then the
    /// document skeleton or the user block. Runs with `node` current.
    fn build_step<T>(
        &mut self,
        node: NodeId,
        args: Args,
        block: impl FnOnce(&mut Context) -> Result<T>,
    ) -> Result<T> {
        let Args {
            content,
            attributes,
        } = args;

        if let Some(content) = content {
            self.tree_mut().set_content(node, content)?;
        }

        let def = self.tree().tag(node).map(|tag| Rc::clone(&tag.def));
        if let Some(def) = &def
            && let Some(id) = def.default_id()
            && self.tree().id(node).is_none()
        {
            self.tree_mut().set_id(node, id)?;
        }

        for (name, value) in attributes {
            self.tree_mut().set_attribute(node, &name, value)?;
        }

        if let Some(def) = &def {
            for class in def.default_classes() {
                self.tree_mut().add_class(node, class)?;
            }
        }

        if matches!(self.tree().get(node), Node::Document(_)) {
            let body = self.build_document_skeleton()?;
            return self.with_current(body, Flow::Append, block);
        }
        block(self)
    }

    /// Head with a charset meta, then an empty body. Returns the body.
    fn build_document_skeleton(&mut self) -> Result<NodeId> {
        let head = self.tag_def("head");
        let meta = self.tag_def("meta");
        let body = self.tag_def("body");

        self.insert_with(head, (), |ctx| {
            ctx.insert(
                meta,
                [
                    ("http-equiv", "Content-Type"),
                    ("content", "text/html; charset=utf-8"),
                ],
            )
            .map(drop)
        })?;
        self.insert(body, ())
    }

    // ---- inserting ----

    /// Create a node, insert it along the current flow, and build it.
    pub fn insert<'k>(&mut self, kind: impl Into<Kind<'k>>, args: impl Into<Args>) -> Result<NodeId> {
        self.insert_with(kind, args, no_block)
    }

    /// Like [`Context::insert`], running `block` with the new node current.
    pub fn insert_with<'k>(
        &mut self,
        kind: impl Into<Kind<'k>>,
        args: impl Into<Args>,
        block: impl FnOnce(&mut Context) -> Result<()>,
    ) -> Result<NodeId> {
        let mut args = args.into();
        let node = self.create(kind.into(), &mut args)?;
        debug!(node = %self.tree().describe(node), flow = ?self.current_flow(), "insert");
        self.insert_child(node)?;
        self.with_current(node, Flow::Append, |ctx| ctx.build_step(node, args, block))?;
        Ok(node)
    }

    /// Build a node without inserting it anywhere.
    pub fn build<'k>(
        &mut self,
        kind: impl Into<Kind<'k>>,
        args: impl Into<Args>,
        block: impl FnOnce(&mut Context) -> Result<()>,
    ) -> Result<NodeId> {
        let mut args = args.into();
        let node = self.create(kind.into(), &mut args)?;
        debug!(node = %self.tree().describe(node), "build orphan");
        self.with_current(node, Flow::Append, |ctx| ctx.build_step(node, args, block))?;
        Ok(node)
    }

    /// Build a detached bare element; useful for rendering a fragment
    /// without it ending up in the tree.
    pub fn temporary(&mut self, block: impl FnOnce(&mut Context) -> Result<()>) -> Result<NodeId> {
        self.build(Kind::Element, (), block)
    }

    // ---- convenience builders ----

    pub fn tag(&mut self, keyword: &str, args: impl Into<Args>) -> Result<NodeId> {
        self.insert(Kind::Tag(keyword), args)
    }

    pub fn tag_with(
        &mut self,
        keyword: &str,
        args: impl Into<Args>,
        block: impl FnOnce(&mut Context) -> Result<()>,
    ) -> Result<NodeId> {
        self.insert_with(Kind::Tag(keyword), args, block)
    }

    pub fn text_node(&mut self, text: &str) -> Result<NodeId> {
        self.insert(Kind::Text, text)
    }

    /// Insert pre-escaped HTML verbatim.
    pub fn raw_node(&mut self, html: impl Into<String>) -> Result<NodeId> {
        self.insert(Kind::Text, Markup::raw(html))
    }

    pub fn comment(&mut self, text: &str) -> Result<NodeId> {
        self.insert(Kind::Comment, text)
    }

    pub fn container(&mut self, block: impl FnOnce(&mut Context) -> Result<()>) -> Result<NodeId> {
        self.insert_with(Kind::Container, (), block)
    }

    pub fn document(&mut self, block: impl FnOnce(&mut Context) -> Result<()>) -> Result<NodeId> {
        self.insert_with(Kind::Document, (), block)
    }

    // ---- flows ----

    fn resolve_opt(&self, target: Target<'_>) -> Result<Option<NodeId>> {
        match target {
            Target::Node(node) => Ok(Some(node)),
            Target::Selector(selector) => self.find_first(selector),
        }
    }

    fn resolve(&self, target: Target<'_>) -> Result<NodeId> {
        match target {
            Target::Node(node) => self.tree().check(node),
            Target::Selector(selector) => self
                .find_first(selector)?
                .ok_or_else(|| BuildError::not_found(format!("`{selector}`"))),
        }
    }

    /// The parent of `target`, and `target` itself, for sibling flows.
    fn sibling_frame(&self, target: Target<'_>) -> Result<(NodeId, NodeId)> {
        let node = self.resolve(target)?;
        let parent = self.tree().parent(node).ok_or_else(|| {
            BuildError::invalid(format!(
                "{} has no parent to insert next to it in",
                self.tree().describe(node)
            ))
        })?;
        Ok((parent, node))
    }

    /// Run `block` appending to the current element.
    pub fn append<T>(&mut self, block: impl FnOnce(&mut Context) -> Result<T>) -> Result<T> {
        let element = self.current_element();
        self.with_current(element, Flow::Append, block)
    }

    /// Run `block` prepending to the current element. Nodes keep the order
    /// they were created in.
    pub fn prepend<T>(&mut self, block: impl FnOnce(&mut Context) -> Result<T>) -> Result<T> {
        let element = self.current_element();
        self.with_current(element, Flow::Prepend, block)
    }

    pub fn append_node<'k>(
        &mut self,
        kind: impl Into<Kind<'k>>,
        args: impl Into<Args>,
        block: impl FnOnce(&mut Context) -> Result<()>,
    ) -> Result<NodeId> {
        self.append(|ctx| ctx.insert_with(kind, args, block))
    }

    pub fn prepend_node<'k>(
        &mut self,
        kind: impl Into<Kind<'k>>,
        args: impl Into<Args>,
        block: impl FnOnce(&mut Context) -> Result<()>,
    ) -> Result<NodeId> {
        self.prepend(|ctx| ctx.insert_with(kind, args, block))
    }

    /// Run `block` inserting just before `target`, in its parent.
    pub fn before<'s, T>(
        &mut self,
        target: impl Into<Target<'s>>,
        block: impl FnOnce(&mut Context) -> Result<T>,
    ) -> Result<T> {
        let (parent, node) = self.sibling_frame(target.into())?;
        self.with_current(parent, Flow::Before(node), block)
    }

    /// Run `block` inserting just after `target`, in its parent.
    pub fn after<'s, T>(
        &mut self,
        target: impl Into<Target<'s>>,
        block: impl FnOnce(&mut Context) -> Result<T>,
    ) -> Result<T> {
        let (parent, node) = self.sibling_frame(target.into())?;
        self.with_current(parent, Flow::After(node), block)
    }

    pub fn before_node<'s, 'k>(
        &mut self,
        target: impl Into<Target<'s>>,
        kind: impl Into<Kind<'k>>,
        args: impl Into<Args>,
        block: impl FnOnce(&mut Context) -> Result<()>,
    ) -> Result<NodeId> {
        self.before(target, |ctx| ctx.insert_with(kind, args, block))
    }

    pub fn after_node<'s, 'k>(
        &mut self,
        target: impl Into<Target<'s>>,
        kind: impl Into<Kind<'k>>,
        args: impl Into<Args>,
        block: impl FnOnce(&mut Context) -> Result<()>,
    ) -> Result<NodeId> {
        self.after(target, |ctx| ctx.insert_with(kind, args, block))
    }

    /// Run `block` appending into `target`.
    pub fn within<'s, T>(
        &mut self,
        target: impl Into<Target<'s>>,
        block: impl FnOnce(&mut Context) -> Result<T>,
    ) -> Result<T> {
        let element = self.resolve(target.into())?;
        self.with_current(element, Flow::Append, block)
    }

    /// Like [`Context::within`], but a selector that matches nothing skips
    /// the block.
    pub fn within_opt<'s, T>(
        &mut self,
        target: impl Into<Target<'s>>,
        block: impl FnOnce(&mut Context) -> Result<T>,
    ) -> Result<Option<T>> {
        match self.resolve_opt(target.into())? {
            Some(element) => self.with_current(element, Flow::Append, block).map(Some),
            None => Ok(None),
        }
    }

    /// Run `block` prepending into `target`.
    pub fn prepend_within<'s, T>(
        &mut self,
        target: impl Into<Target<'s>>,
        block: impl FnOnce(&mut Context) -> Result<T>,
    ) -> Result<T> {
        let element = self.resolve(target.into())?;
        self.with_current(element, Flow::Prepend, block)
    }

    pub fn prepend_within_opt<'s, T>(
        &mut self,
        target: impl Into<Target<'s>>,
        block: impl FnOnce(&mut Context) -> Result<T>,
    ) -> Result<Option<T>> {
        match self.resolve_opt(target.into())? {
            Some(element) => self.with_current(element, Flow::Prepend, block).map(Some),
            None => Ok(None),
        }
    }

    // ---- element shortcuts ----

    pub fn set_content(&mut self, node: NodeId, content: impl Into<Content>) -> Result<()> {
        self.tree_mut().set_content(node, content)
    }

    /// The rendered children of `node`.
    pub fn content(&self, node: NodeId) -> Markup {
        self.tree().content_with(node, self.options())
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: impl Into<Value>) -> Result<()> {
        self.tree_mut().set_attribute(node, name, value)
    }

    pub fn add_class(&mut self, node: NodeId, classes: &str) -> Result<()> {
        self.tree_mut().add_class(node, classes)
    }

    /// Run a selector below the current element.
    pub fn find(&self, selector: &str) -> Result<ElementCollection> {
        self.tree().find(self.current_element(), selector)
    }

    pub fn find_first(&self, selector: &str) -> Result<Option<NodeId>> {
        self.tree().find_first(self.current_element(), selector)
    }

    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree().find_by_id(self.current_element(), id)
    }
}
