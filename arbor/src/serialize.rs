//! Indented HTML serializer.
//!
//! Rendering rules:
//!
//! - Each tag is indented by `indent_level * indent_width` spaces
//! - An empty self-closing tag renders as `<name/>`
//! - A tag whose only child is a single-line text node stays on one line
//! - Any other non-empty tag puts its children on their own lines
//! - Siblings are joined by a newline; containers add no indentation
//! - Text is escaped unless it was inserted as [`Markup`]

use crate::node::{Node, TagData};
use crate::{Attributes, Tree};
use indextree::NodeId;
use std::borrow::Cow;
use std::fmt::{self, Write};

/// Rendered, already-escaped HTML.
///
/// Passing markup back into the builder inserts it verbatim, so a rendered
/// fragment embedded in another tree is never escaped twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Markup(String);

impl Markup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trust `html` as safe markup.
    pub fn raw(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    /// Escape `text` into markup.
    pub fn escape(text: &str) -> Self {
        Self(escape_html(text).into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Markup {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Markup> for String {
    fn from(markup: Markup) -> Self {
        markup.0
    }
}

impl PartialEq<str> for Markup {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Markup {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Options for rendering.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Spaces per indent level (default: 2)
    pub indent_width: usize,
    /// Whether to sort attributes alphabetically (default: false, insertion order)
    pub sort_attributes: bool,
    /// Line written before a document's `html` tag
    pub doctype: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent_width: 2,
            sort_attributes: false,
            doctype: "<!DOCTYPE html>".to_string(),
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    /// Sort attributes alphabetically for deterministic output.
    pub fn sort_attributes(mut self) -> Self {
        self.sort_attributes = true;
        self
    }

    pub fn with_doctype(mut self, doctype: impl Into<String>) -> Self {
        self.doctype = doctype.into();
        self
    }
}

/// Escape `& < > " '` for text and attribute values.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Reverse [`escape_html`]. Unknown entities are left alone.
pub fn unescape_html(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let entity = rest.find(';').map(|end| &rest[..=end]);
        let decoded = match entity {
            Some("&amp;") => Some('&'),
            Some("&lt;") => Some('<'),
            Some("&gt;") => Some('>'),
            Some("&quot;") => Some('"'),
            Some("&#39;" | "&#x27;" | "&apos;") => Some('\''),
            _ => None,
        };

        match (decoded, entity) {
            (Some(c), Some(entity)) => {
                out.push(c);
                rest = &rest[entity.len()..];
            }
            _ => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

struct Serializer<'a, W: Write> {
    out: &'a mut W,
    tree: &'a Tree,
    options: &'a RenderOptions,
}

impl<'a, W: Write> Serializer<'a, W> {
    fn new(out: &'a mut W, tree: &'a Tree, options: &'a RenderOptions) -> Self {
        Self { out, tree, options }
    }

    fn write_indent(&mut self, level: isize) {
        let width = level.max(0).unsigned_abs() * self.options.indent_width;
        let _ = write!(self.out, "{:width$}", "");
    }

    fn write_escaped(&mut self, text: &str) {
        let _ = self.out.write_str(&escape_html(text));
    }

    fn write_node(&mut self, node: NodeId, level: isize) {
        let tree = self.tree;
        match tree.get(node) {
            Node::Root | Node::Element | Node::Container => self.write_children(node, level),
            Node::Text { text, raw: true } => {
                let _ = self.out.write_str(text);
            }
            Node::Text { text, raw: false } => self.write_escaped(text),
            Node::Comment(text) => self.write_comment(text.as_deref(), level),
            Node::Tag(tag) => self.write_tag(node, tag, level),
            Node::Document(tag) => {
                let _ = write!(self.out, "{}\n\n", self.options.doctype);
                self.write_tag(node, tag, level);
            }
        }
    }

    fn write_children(&mut self, parent: NodeId, level: isize) {
        let tree = self.tree;
        for (i, child) in tree.children(parent).iter().enumerate() {
            if i > 0 {
                let _ = self.out.write_char('\n');
            }
            let child_level = if tree.get(child).is_container() {
                level
            } else {
                level + 1
            };
            self.write_node(child, child_level);
        }
    }

    fn write_attributes(&mut self, attributes: &Attributes) {
        let mut attrs: Vec<_> = attributes.iter().collect();
        if self.options.sort_attributes {
            attrs.sort_by_key(|(name, _)| *name);
        }
        for (name, value) in attrs {
            let _ = self.out.write_char(' ');
            self.write_escaped(name);
            let _ = self.out.write_str("=\"");
            self.write_escaped(&value.as_text());
            let _ = self.out.write_char('"');
        }
    }

    fn write_tag(&mut self, node: NodeId, tag: &TagData, level: isize) {
        let tree = self.tree;
        let children = tree.children(node);
        let name = tag.name();

        self.write_indent(level);
        let _ = write!(self.out, "<{name}");
        self.write_attributes(&tag.attributes);

        if children.is_empty() && tag.def().is_self_closing() {
            let _ = self.out.write_str("/>");
            return;
        }
        let _ = self.out.write_char('>');

        let one_line = match (children.first(), children.len()) {
            (None, _) => true,
            (Some(only), 1) => tree.text(only).is_some_and(|text| !text.contains('\n')),
            _ => false,
        };

        if one_line {
            self.write_children(node, level);
        } else {
            let _ = self.out.write_char('\n');
            self.write_children(node, level);
            let _ = self.out.write_char('\n');
            self.write_indent(level);
        }
        let _ = write!(self.out, "</{name}>");
    }

    fn write_comment(&mut self, text: Option<&str>, level: isize) {
        match text {
            None => {
                let _ = self.out.write_str("<!-- -->");
            }
            Some(text) if text.contains('\n') => {
                self.write_indent(level);
                let _ = self.out.write_str("<!--\n");
                for (i, line) in text.split('\n').enumerate() {
                    if i > 0 {
                        let _ = self.out.write_char('\n');
                    }
                    self.write_indent(level + 1);
                    self.write_escaped(line);
                }
                let _ = self.out.write_char('\n');
                self.write_indent(level);
                let _ = self.out.write_str("-->");
            }
            Some(text) => {
                let _ = self.out.write_str("<!-- ");
                self.write_escaped(text);
                let _ = self.out.write_str(" -->");
            }
        }
    }
}

// =============================================================================
// Convenience methods on Tree
// =============================================================================

impl Tree {
    /// Render `node` and everything below it with default options.
    pub fn render(&self, node: NodeId) -> Markup {
        self.render_with(node, &RenderOptions::default())
    }

    /// Render `node` with custom options. Indentation starts from the node's
    /// own depth in the tree.
    pub fn render_with(&self, node: NodeId, options: &RenderOptions) -> Markup {
        let mut out = String::new();
        let mut ser = Serializer::new(&mut out, self, options);
        ser.write_node(node, self.indent_level(node));
        Markup(out)
    }

    /// Render several nodes, joined by newlines.
    pub fn render_all(&self, nodes: impl IntoIterator<Item = NodeId>) -> Markup {
        self.render_all_with(nodes, &RenderOptions::default())
    }

    pub fn render_all_with(
        &self,
        nodes: impl IntoIterator<Item = NodeId>,
        options: &RenderOptions,
    ) -> Markup {
        let mut out = String::new();
        for (i, node) in nodes.into_iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let mut ser = Serializer::new(&mut out, self, options);
            ser.write_node(node, self.indent_level(node));
        }
        Markup(out)
    }

    /// The rendered children of `node`.
    pub fn content(&self, node: NodeId) -> Markup {
        self.content_with(node, &RenderOptions::default())
    }

    pub fn content_with(&self, node: NodeId, options: &RenderOptions) -> Markup {
        self.render_all_with(self.children(node).iter(), options)
    }
}
