//! The node arena: parent links, traversal and per-node accessors.

use crate::error::{BuildError, Result};
use crate::node::{Content, Node, TagData};
use crate::query::Query;
use crate::tags::AttributeKind;
use crate::{Attributes, ChildCollection, ChildCollectionMut, ClassList, ElementCollection, Value};
use compact_str::{CompactString, format_compact};
use indextree::{Arena, NodeId};
use std::borrow::Cow;

/// An arena of nodes hanging off a single root.
///
/// Every node handle stays valid for the lifetime of the tree; removing a
/// node only detaches it, so it can be re-inserted later.
#[derive(Debug, Clone)]
pub struct Tree {
    pub(crate) arena: Arena<Node>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(Node::Root);
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Allocate a detached node.
    pub fn new_node(&mut self, node: Node) -> NodeId {
        self.arena.new_node(node)
    }

    /// `node` if it was allocated by this tree's arena.
    ///
    /// Handles carry no tree identity, so a handle from another tree whose
    /// index happens to be in range passes this check and aliases a node
    /// here. Out-of-range handles are rejected.
    pub fn check(&self, node: NodeId) -> Result<NodeId> {
        match self.arena.get(node) {
            Some(_) => Ok(node),
            None => Err(BuildError::invalid(format!(
                "{node:?} does not belong to this tree"
            ))),
        }
    }

    /// Panics if `node` was not allocated by this tree; see [`Tree::check`].
    pub fn get(&self, node: NodeId) -> &Node {
        self.arena[node].get()
    }

    pub fn get_mut(&mut self, node: NodeId) -> &mut Node {
        self.arena[node].get_mut()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].parent()
    }

    pub fn is_orphan(&self, node: NodeId) -> bool {
        self.parent(node).is_none()
    }

    pub fn children(&self, parent: NodeId) -> ChildCollection<'_> {
        ChildCollection::new(self, parent)
    }

    pub fn children_mut(&mut self, parent: NodeId) -> ChildCollectionMut<'_> {
        ChildCollectionMut::new(self, parent)
    }

    /// Detach `node` from its parent, if it has one.
    pub fn remove(&mut self, node: NodeId) -> Result<()> {
        if node == self.root {
            return Err(BuildError::invalid("the root cannot be removed"));
        }
        if let Some(parent) = self.parent(node) {
            self.children_mut(parent).remove(node);
        }
        Ok(())
    }

    /// Parent first, root last.
    pub fn ancestors(&self, node: NodeId) -> ElementCollection {
        node.ancestors(&self.arena).skip(1).collect()
    }

    /// Every node below `node` except text nodes, in document order.
    pub fn descendants(&self, node: NodeId) -> ElementCollection {
        node.descendants(&self.arena)
            .skip(1)
            .filter(|&n| !self.get(n).is_text())
            .collect()
    }

    /// The nearest tags below `node`, looking through containers and bare
    /// elements.
    pub fn child_tags(&self, node: NodeId) -> ElementCollection {
        let mut tags = Vec::new();
        self.collect_child_tags(node, &mut tags);
        ElementCollection::from(tags)
    }

    fn collect_child_tags(&self, node: NodeId, tags: &mut Vec<NodeId>) {
        for child in node.children(&self.arena) {
            let data = self.get(child);
            if data.is_tag() {
                tags.push(child);
            } else if data.accepts_children() {
                self.collect_child_tags(child, tags);
            }
        }
    }

    /// Every tag below `node`, in document order.
    pub fn descendant_tags(&self, node: NodeId) -> ElementCollection {
        node.descendants(&self.arena)
            .skip(1)
            .filter(|&n| self.get(n).is_tag())
            .collect()
    }

    /// Rendering depth. The root sits at -1 so its children start at 0, and
    /// containers share their parent's level.
    pub fn indent_level(&self, node: NodeId) -> isize {
        let parent_level = self.parent(node).map(|p| self.indent_level(p));
        match self.get(node) {
            Node::Root => -1,
            Node::Container => parent_level.unwrap_or(0),
            _ => parent_level.map_or(0, |level| level + 1),
        }
    }

    // ---- tags and attributes ----

    pub fn tag(&self, node: NodeId) -> Option<&TagData> {
        self.get(node).tag()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.get(node).tag_name()
    }

    pub fn attributes(&self, node: NodeId) -> Option<&Attributes> {
        self.tag(node).map(|tag| &tag.attributes)
    }

    pub fn attributes_mut(&mut self, node: NodeId) -> Result<&mut Attributes> {
        if !self.get(node).is_tag() {
            return Err(BuildError::invalid(format!(
                "{} has no attributes",
                self.describe(node)
            )));
        }
        self.get_mut(node)
            .tag_mut()
            .map(|tag| &mut tag.attributes)
            .ok_or_else(|| BuildError::invalid("node has no attributes"))
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<Cow<'_, str>> {
        self.attributes(node).and_then(|attrs| attrs.get(name))
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attributes(node)
            .is_some_and(|attrs| attrs.contains(name))
    }

    /// Read an attribute through the tag's schema: boolean attributes read as
    /// `Value::Bool`, everything else as a string or `Null`.
    pub fn attribute(&self, node: NodeId, name: &str) -> Value {
        match self.attribute_kind(node, name) {
            Some(AttributeKind::Boolean) => Value::Bool(self.has_attribute(node, name)),
            _ => self
                .get_attribute(node, name)
                .map_or(Value::Null, |value| Value::from(&*value)),
        }
    }

    /// Write an attribute through the tag's schema: boolean attributes are
    /// set from the truthiness of `value`.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let value = match self.attribute_kind(node, name) {
            Some(AttributeKind::Boolean) => Value::Bool(value.is_truthy()),
            _ => value,
        };
        self.attributes_mut(node)?.set(name, value);
        Ok(())
    }

    fn attribute_kind(&self, node: NodeId, name: &str) -> Option<AttributeKind> {
        self.tag(node).and_then(|tag| tag.def().attribute_kind(name))
    }

    pub fn id(&self, node: NodeId) -> Option<&str> {
        self.tag(node).and_then(TagData::id)
    }

    pub fn set_id(&mut self, node: NodeId, id: &str) -> Result<()> {
        self.set_attribute(node, "id", id)
    }

    /// Give `node` an id derived from its handle, unique within this tree.
    pub fn generate_id(&mut self, node: NodeId) -> Result<CompactString> {
        let name = self.tag_name(node).unwrap_or("node");
        let id = format_compact!("{name}-{}", usize::from(node));
        self.set_id(node, &id)?;
        Ok(id)
    }

    pub fn classes(&self, node: NodeId) -> Option<&ClassList> {
        self.attributes(node).and_then(Attributes::class_list)
    }

    pub fn add_class(&mut self, node: NodeId, classes: &str) -> Result<()> {
        self.attributes_mut(node)?.add_class(classes);
        Ok(())
    }

    pub fn remove_class(&mut self, node: NodeId, classes: &str) -> Result<()> {
        self.attributes_mut(node)?.remove_class(classes);
        Ok(())
    }

    /// True when `node` has every whitespace separated class in `classes`.
    pub fn has_class(&self, node: NodeId, classes: &str) -> bool {
        match self.classes(node) {
            Some(list) => list.contains_all(classes),
            None => classes.split_whitespace().next().is_none(),
        }
    }

    // ---- content ----

    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.get(node).text_content()
    }

    /// Replace the children of `node` with `content`.
    pub fn set_content(&mut self, node: NodeId, content: impl Into<Content>) -> Result<()> {
        if !self.get(self.check(node)?).accepts_children() {
            return Err(BuildError::invalid(format!(
                "{} cannot have children",
                self.describe(node)
            )));
        }
        let children = self.content_nodes(content.into());
        for &child in &children {
            self.check(child)?;
        }
        self.children_mut(node).clear();
        for child in children {
            self.children_mut(node).add(child)?;
        }
        Ok(())
    }

    /// Turn content into node handles, allocating text nodes as needed.
    pub(crate) fn content_nodes(&mut self, content: Content) -> Vec<NodeId> {
        match content {
            Content::Text(text) => vec![self.new_node(Node::text(text))],
            Content::Raw(markup) => vec![self.new_node(Node::raw(markup.into_string()))],
            Content::Node(node) => vec![node],
            Content::Nodes(nodes) => nodes,
        }
    }

    /// Short description used in error messages, like `<a#home.nav.active>`
    /// or `<input[type=checkbox]>`.
    pub fn describe(&self, node: NodeId) -> String {
        match self.get(node) {
            Node::Tag(tag) | Node::Document(tag) => {
                let mut desc = format!("<{}", tag.name());
                if let Some(id) = tag.id() {
                    desc.push('#');
                    desc.push_str(id);
                }
                if let Some(classes) = tag.attributes.class_list() {
                    for class in classes.iter() {
                        desc.push('.');
                        desc.push_str(class);
                    }
                }
                if let Some(kind) = tag.attributes.get("type") {
                    desc.push_str(&format!("[type={kind}]"));
                }
                desc.push('>');
                desc
            }
            Node::Root => "<root>".to_string(),
            Node::Element => "<element>".to_string(),
            Node::Container => "<container>".to_string(),
            Node::Text { text, .. } => format!("{:?}", text.as_str()),
            Node::Comment(_) => "<!-- -->".to_string(),
        }
    }

    // ---- lookups ----

    /// First tag below `scope` (document order) with the given id.
    pub fn find_by_id(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        scope
            .descendants(&self.arena)
            .skip(1)
            .find(|&n| self.id(n) == Some(id))
    }

    /// Tags below `scope` matching an optional tag name and all of `classes`.
    pub fn find_by_tag_and_classes(
        &self,
        scope: NodeId,
        tag: Option<&str>,
        classes: &[&str],
    ) -> ElementCollection {
        self.descendant_tags(scope)
            .into_iter()
            .filter(|&n| tag.is_none_or(|tag| self.tag_name(n) == Some(tag)))
            .filter(|&n| classes.iter().all(|class| self.has_class(n, class)))
            .collect()
    }

    /// Run a selector relative to `scope`.
    pub fn find(&self, scope: NodeId, selector: &str) -> Result<ElementCollection> {
        Query::new(self, scope).execute(selector)
    }

    pub fn find_first(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.find(scope, selector)?.first().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TagRegistry;
    use facet_testhelpers::test;

    fn tag(tree: &mut Tree, name: &str) -> NodeId {
        let def = TagRegistry::html5().lookup(name).unwrap();
        tree.new_node(Node::Tag(TagData::new(CompactString::from(name), def)))
    }

    #[test]
    fn test_indent_levels() {
        let mut tree = Tree::new();
        let root = tree.root();
        let container = tree.new_node(Node::Container);
        let div = tag(&mut tree, "div");
        let span = tag(&mut tree, "span");

        tree.children_mut(root).add(container).unwrap();
        tree.children_mut(container).add(div).unwrap();
        tree.children_mut(div).add(span).unwrap();

        assert_eq!(tree.indent_level(root), -1);
        assert_eq!(tree.indent_level(container), -1);
        assert_eq!(tree.indent_level(div), 0);
        assert_eq!(tree.indent_level(span), 1);

        let orphan = tree.new_node(Node::Container);
        assert_eq!(tree.indent_level(orphan), 0);
        let orphan_tag = tag(&mut tree, "p");
        assert_eq!(tree.indent_level(orphan_tag), 0);
    }

    #[test]
    fn test_child_tags_see_through_containers() {
        let mut tree = Tree::new();
        let root = tree.root();
        let div = tag(&mut tree, "div");
        let container = tree.new_node(Node::Container);
        let a = tag(&mut tree, "a");
        let text = tree.new_node(Node::text("hi"));
        let span = tag(&mut tree, "span");

        tree.children_mut(root).add(div).unwrap();
        tree.children_mut(div).add(text).unwrap();
        tree.children_mut(div).add(container).unwrap();
        tree.children_mut(container).add(a).unwrap();
        tree.children_mut(a).add(span).unwrap();

        assert_eq!(tree.child_tags(div).as_slice(), [a]);
        assert_eq!(tree.descendant_tags(root).as_slice(), [div, a, span]);
        assert_eq!(tree.descendants(div).as_slice(), [container, a, span]);
        assert_eq!(tree.ancestors(span).as_slice(), [a, container, div, root]);
    }

    #[test]
    fn test_schema_attributes() {
        let mut tree = Tree::new();
        let input = tag(&mut tree, "input");

        tree.set_attribute(input, "checked", "yes").unwrap();
        assert_eq!(tree.get_attribute(input, "checked").as_deref(), Some("checked"));
        assert_eq!(tree.attribute(input, "checked"), Value::Bool(true));

        tree.set_attribute(input, "checked", Value::Null).unwrap();
        assert_eq!(tree.attribute(input, "checked"), Value::Bool(false));

        tree.set_attribute(input, "value", 1).unwrap();
        assert_eq!(tree.attribute(input, "value"), Value::from("1"));
        assert_eq!(tree.attribute(input, "name"), Value::Null);
    }

    #[test]
    fn test_classes_and_ids() {
        let mut tree = Tree::new();
        let a = tag(&mut tree, "a");
        tree.add_class(a, "one two").unwrap();
        tree.set_id(a, "home").unwrap();
        tree.set_attribute(a, "type", "link").unwrap();

        assert!(tree.has_class(a, "two one"));
        assert!(!tree.has_class(a, "one three"));
        assert_eq!(tree.describe(a), "<a#home.one.two[type=link]>");

        tree.remove_class(a, "one").unwrap();
        assert_eq!(tree.describe(a), "<a#home.two[type=link]>");

        let id = tree.generate_id(a).unwrap();
        assert!(id.starts_with("a-"));
        assert_eq!(tree.id(a), Some(id.as_str()));
    }

    #[test]
    fn test_text_nodes_reject_attributes_and_content() {
        let mut tree = Tree::new();
        let text = tree.new_node(Node::text("hi"));
        assert!(matches!(
            tree.add_class(text, "x"),
            Err(BuildError::InvalidOperation { .. })
        ));
        assert!(matches!(
            tree.set_content(text, "nope"),
            Err(BuildError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let mut tree = Tree::new();
        let root = tree.root();
        assert!(tree.remove(root).is_err());
    }

    #[test]
    fn test_set_content_replaces_children() {
        let mut tree = Tree::new();
        let div = tag(&mut tree, "div");
        let span = tag(&mut tree, "span");
        tree.children_mut(div).add(span).unwrap();

        tree.set_content(div, "hello").unwrap();
        assert!(tree.is_orphan(span));
        let children = tree.children(div).to_collection();
        assert_eq!(children.len(), 1);
        assert_eq!(tree.text(children[0]), Some("hello"));
    }
}
