//! Child collections (the ordered children of one parent) and detached
//! element collections (query results, set arithmetic).

use crate::error::{BuildError, Result};
use crate::serialize::{Markup, RenderOptions};
use crate::{Node, Tree, debug};
use indexmap::IndexSet;
use indextree::NodeId;
use std::fmt;
use std::ops::{Add, BitAnd, Deref, Sub};

/// An owned, ordered list of node handles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementCollection {
    nodes: Vec<NodeId>,
}

impl ElementCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: NodeId) {
        self.nodes.push(node);
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn into_vec(self) -> Vec<NodeId> {
        self.nodes
    }

    /// Render each node, joined by newlines.
    pub fn render(&self, tree: &Tree) -> Markup {
        tree.render_all(self.nodes.iter().copied())
    }

    pub fn render_with(&self, tree: &Tree, options: &RenderOptions) -> Markup {
        tree.render_all_with(self.nodes.iter().copied(), options)
    }
}

impl Deref for ElementCollection {
    type Target = [NodeId];

    fn deref(&self) -> &[NodeId] {
        &self.nodes
    }
}

impl From<Vec<NodeId>> for ElementCollection {
    fn from(nodes: Vec<NodeId>) -> Self {
        Self { nodes }
    }
}

impl FromIterator<NodeId> for ElementCollection {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ElementCollection {
    type Item = NodeId;
    type IntoIter = std::vec::IntoIter<NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a ElementCollection {
    type Item = &'a NodeId;
    type IntoIter = std::slice::Iter<'a, NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// Union without duplicates, left order first.
impl Add for ElementCollection {
    type Output = ElementCollection;

    fn add(self, other: ElementCollection) -> ElementCollection {
        let mut seen: IndexSet<NodeId> = self.nodes.into_iter().collect();
        seen.extend(other.nodes);
        seen.into_iter().collect()
    }
}

impl Sub for ElementCollection {
    type Output = ElementCollection;

    fn sub(self, other: ElementCollection) -> ElementCollection {
        self.nodes
            .into_iter()
            .filter(|node| !other.contains(node))
            .collect()
    }
}

impl BitAnd for ElementCollection {
    type Output = ElementCollection;

    fn bitand(self, other: ElementCollection) -> ElementCollection {
        let common: IndexSet<NodeId> = self
            .nodes
            .into_iter()
            .filter(|node| other.contains(node))
            .collect();
        common.into_iter().collect()
    }
}

/// Read-only view of the children of one parent.
#[derive(Clone, Copy)]
pub struct ChildCollection<'a> {
    tree: &'a Tree,
    parent: NodeId,
}

impl<'a> ChildCollection<'a> {
    pub(crate) fn new(tree: &'a Tree, parent: NodeId) -> Self {
        Self { tree, parent }
    }

    pub fn parent(&self) -> NodeId {
        self.parent
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + use<'a> {
        let tree = self.tree;
        self.parent.children(&tree.arena)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.first().is_none()
    }

    pub fn first(&self) -> Option<NodeId> {
        self.tree.arena[self.parent].first_child()
    }

    pub fn last(&self) -> Option<NodeId> {
        self.tree.arena[self.parent].last_child()
    }

    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.iter().nth(index)
    }

    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.iter().position(|child| child == node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.tree.arena.get(node).and_then(|n| n.parent()) == Some(self.parent)
    }

    pub fn to_collection(&self) -> ElementCollection {
        self.iter().collect()
    }

    /// Render the children, joined by newlines.
    pub fn render(&self) -> Markup {
        self.tree.render_all(self.iter())
    }
}

/// Same parent and same sequence.
impl PartialEq for ChildCollection<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.parent == other.parent && self.iter().eq(other.iter())
    }
}

impl fmt::Debug for ChildCollection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildCollection")
            .field("parent", &self.parent)
            .field("children", &self.to_collection().as_slice())
            .finish()
    }
}

impl Add<ChildCollection<'_>> for ChildCollection<'_> {
    type Output = ElementCollection;

    fn add(self, other: ChildCollection<'_>) -> ElementCollection {
        self.to_collection() + other.to_collection()
    }
}

impl Sub<ChildCollection<'_>> for ChildCollection<'_> {
    type Output = ElementCollection;

    fn sub(self, other: ChildCollection<'_>) -> ElementCollection {
        self.to_collection() - other.to_collection()
    }
}

impl BitAnd<ChildCollection<'_>> for ChildCollection<'_> {
    type Output = ElementCollection;

    fn bitand(self, other: ChildCollection<'_>) -> ElementCollection {
        self.to_collection() & other.to_collection()
    }
}

/// Mutable view of the children of one parent.
///
/// A node belongs to at most one parent: every insertion detaches it from
/// wherever it was first.
pub struct ChildCollectionMut<'a> {
    tree: &'a mut Tree,
    parent: NodeId,
}

impl<'a> ChildCollectionMut<'a> {
    pub(crate) fn new(tree: &'a mut Tree, parent: NodeId) -> Self {
        Self { tree, parent }
    }

    pub fn view(&self) -> ChildCollection<'_> {
        ChildCollection::new(self.tree, self.parent)
    }

    pub fn len(&self) -> usize {
        self.view().len()
    }

    pub fn is_empty(&self) -> bool {
        self.view().is_empty()
    }

    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.view().index_of(node)
    }

    /// Append `node`. A node that is already a child stays where it is.
    pub fn add(&mut self, node: NodeId) -> Result<()> {
        self.check_insert(node)?;
        if self.tree.parent(node) == Some(self.parent) {
            return Ok(());
        }
        debug!(parent = ?self.parent, ?node, "append child");
        node.detach(&mut self.tree.arena);
        self.parent
            .checked_append(node, &mut self.tree.arena)
            .map_err(|e| BuildError::invalid(e.to_string()))
    }

    pub fn concat(&mut self, nodes: impl IntoIterator<Item = NodeId>) -> Result<()> {
        for node in nodes {
            self.add(node)?;
        }
        Ok(())
    }

    /// Place `node` so it ends up at `index` (clamped to the length). When the
    /// node is already a child before `index`, its own removal shifts the
    /// target down by one.
    pub fn insert_at(&mut self, index: usize, node: NodeId) -> Result<()> {
        self.check_insert(node)?;

        let mut index = index.min(self.len());
        if let Some(current) = self.index_of(node)
            && current < index
        {
            index -= 1;
        }

        debug!(parent = ?self.parent, ?node, index, "insert child");
        node.detach(&mut self.tree.arena);
        let sibling = self.view().get(index);
        let result = match sibling {
            Some(sibling) => sibling.checked_insert_before(node, &mut self.tree.arena),
            None => self.parent.checked_append(node, &mut self.tree.arena),
        };
        result.map_err(|e| BuildError::invalid(e.to_string()))
    }

    pub fn insert_before(&mut self, existing: NodeId, node: NodeId) -> Result<()> {
        let index = self.require_index(existing)?;
        self.insert_at(index, node)
    }

    pub fn insert_after(&mut self, existing: NodeId, node: NodeId) -> Result<()> {
        let index = self.require_index(existing)?;
        self.insert_at(index + 1, node)
    }

    /// Detach `node` if it is a child; otherwise do nothing.
    pub fn remove(&mut self, node: NodeId) {
        if self.view().contains(node) {
            node.detach(&mut self.tree.arena);
        }
    }

    pub fn clear(&mut self) {
        let children = self.view().to_collection();
        for child in children {
            child.detach(&mut self.tree.arena);
        }
    }

    fn require_index(&self, existing: NodeId) -> Result<usize> {
        self.tree.check(existing)?;
        self.index_of(existing)
            .ok_or_else(|| BuildError::not_found(self.tree.describe(existing)))
    }

    fn check_insert(&self, node: NodeId) -> Result<()> {
        self.tree.check(self.parent)?;
        self.tree.check(node)?;
        if !self.tree.get(self.parent).accepts_children() {
            return Err(BuildError::invalid(format!(
                "{} cannot have children",
                self.tree.describe(self.parent)
            )));
        }
        if matches!(self.tree.get(node), Node::Root) {
            return Err(BuildError::invalid("the root cannot be given a parent"));
        }
        if self.parent.ancestors(&self.tree.arena).any(|a| a == node) {
            return Err(BuildError::invalid(format!(
                "{} cannot be inserted into itself",
                self.tree.describe(node)
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    fn elements<const N: usize>(tree: &mut Tree) -> [NodeId; N] {
        std::array::from_fn(|_| tree.new_node(Node::Element))
    }

    fn children(tree: &Tree, parent: NodeId) -> Vec<NodeId> {
        tree.children(parent).iter().collect()
    }

    #[test]
    fn test_add_appends_and_reparents() {
        let mut tree = Tree::new();
        let [a, b, child] = elements::<3>(&mut tree);

        tree.children_mut(a).add(child).unwrap();
        tree.children_mut(b).add(child).unwrap();

        assert!(tree.children(a).is_empty());
        assert_eq!(children(&tree, b), [child]);
        assert_eq!(tree.parent(child), Some(b));
    }

    #[test]
    fn test_add_existing_does_not_duplicate() {
        let mut tree = Tree::new();
        let [parent, e1, e2] = elements::<3>(&mut tree);

        tree.children_mut(parent).concat([e1, e2]).unwrap();
        tree.children_mut(parent).add(e1).unwrap();
        assert_eq!(children(&tree, parent), [e1, e2]);
    }

    #[test]
    fn test_insert_at_moves_later_node_forward() {
        let mut tree = Tree::new();
        let [parent, e1, e2, e3] = elements::<4>(&mut tree);

        tree.children_mut(parent).concat([e1, e3, e2]).unwrap();
        tree.children_mut(parent).insert_at(1, e2).unwrap();
        assert_eq!(children(&tree, parent), [e1, e2, e3]);
    }

    #[test]
    fn test_insert_at_moves_earlier_node_back() {
        let mut tree = Tree::new();
        let [parent, e1, e2, e3] = elements::<4>(&mut tree);

        tree.children_mut(parent).concat([e2, e1, e3]).unwrap();
        tree.children_mut(parent).insert_at(2, e2).unwrap();
        assert_eq!(children(&tree, parent), [e1, e2, e3]);
    }

    #[test]
    fn test_insert_at_boundaries() {
        let mut tree = Tree::new();
        let [parent, e1, e2, e3] = elements::<4>(&mut tree);

        tree.children_mut(parent).insert_at(0, e2).unwrap();
        tree.children_mut(parent).insert_at(1, e3).unwrap();
        tree.children_mut(parent).insert_at(99, e1).unwrap();
        assert_eq!(children(&tree, parent), [e2, e3, e1]);
    }

    #[test]
    fn test_insert_after() {
        let mut tree = Tree::new();
        let [parent, e1, e2, e3] = elements::<4>(&mut tree);

        tree.children_mut(parent).add(e1).unwrap();
        tree.children_mut(parent).insert_after(e1, e3).unwrap();
        tree.children_mut(parent).insert_after(e1, e2).unwrap();
        assert_eq!(children(&tree, parent), [e1, e2, e3]);
    }

    #[test]
    fn test_insert_before_targets_the_reference_index() {
        let mut tree = Tree::new();
        let [parent, e1, e2, e3] = elements::<4>(&mut tree);

        tree.children_mut(parent).add(e3).unwrap();
        tree.children_mut(parent).insert_before(e3, e1).unwrap();
        tree.children_mut(parent).insert_before(e3, e2).unwrap();
        assert_eq!(children(&tree, parent), [e1, e2, e3]);
    }

    #[test]
    fn test_insert_relative_to_missing_node() {
        let mut tree = Tree::new();
        let [parent, stranger, node] = elements::<3>(&mut tree);

        let err = tree
            .children_mut(parent)
            .insert_before(stranger, node)
            .unwrap_err();
        assert_eq!(err.to_string(), "existing element <element> not found");
        assert!(tree.is_orphan(node));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut tree = Tree::new();
        let [parent, e1, e2, stranger] = elements::<4>(&mut tree);

        tree.children_mut(parent).concat([e1, e2]).unwrap();
        tree.children_mut(parent).remove(stranger);
        tree.children_mut(parent).remove(e1);
        assert_eq!(children(&tree, parent), [e2]);
        assert!(tree.is_orphan(e1));

        tree.children_mut(parent).clear();
        assert!(tree.children(parent).is_empty());
        assert!(tree.is_orphan(e2));
    }

    #[test]
    fn test_rejects_cycles_and_text_parents() {
        let mut tree = Tree::new();
        let [outer, inner] = elements::<2>(&mut tree);
        tree.children_mut(outer).add(inner).unwrap();

        let err = tree.children_mut(inner).add(outer).unwrap_err();
        assert!(matches!(err, BuildError::InvalidOperation { .. }));

        let text = tree.new_node(Node::text("leaf"));
        let err = tree.children_mut(text).add(inner).unwrap_err();
        assert!(matches!(err, BuildError::InvalidOperation { .. }));

        let root = tree.root();
        assert!(tree.children_mut(outer).add(root).is_err());
    }

    #[test]
    fn test_equality_needs_same_parent() {
        let mut tree = Tree::new();
        let [a, b] = elements::<2>(&mut tree);
        assert_eq!(tree.children(a), tree.children(a));
        assert_ne!(tree.children(a), tree.children(b));
    }

    #[test]
    fn test_set_operations() {
        let mut tree = Tree::new();
        let [e1, e2, e3] = elements::<3>(&mut tree);

        let left = ElementCollection::from(vec![e1, e2]);
        let right = ElementCollection::from(vec![e2, e3]);
        assert_eq!((left.clone() + right.clone()).as_slice(), [e1, e2, e3]);
        assert_eq!((left.clone() - right.clone()).as_slice(), [e1]);
        assert_eq!((left & right).as_slice(), [e2]);
    }
}
