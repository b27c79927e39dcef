//! Head, body and title access for `html` documents.

use crate::context::{Context, Flow};
use crate::error::{BuildError, Result};
use crate::{Node, Tree};
use indextree::NodeId;

impl Tree {
    fn is_document(&self, node: NodeId) -> bool {
        matches!(self.get(node), Node::Document(_))
    }

    /// The document enclosing `node`, or failing that the first one below it.
    pub fn document(&self, node: NodeId) -> Option<NodeId> {
        node.ancestors(&self.arena)
            .find(|&n| self.is_document(n))
            .or_else(|| node.descendants(&self.arena).find(|&n| self.is_document(n)))
    }

    fn document_child(&self, document: NodeId, name: &str) -> Option<NodeId> {
        self.child_tags(document)
            .into_iter()
            .find(|&n| self.tag_name(n) == Some(name))
    }

    pub fn head(&self, document: NodeId) -> Option<NodeId> {
        self.document_child(document, "head")
    }

    pub fn body(&self, document: NodeId) -> Option<NodeId> {
        self.document_child(document, "body")
    }

    /// Text of the `title` tag in the document's head.
    pub fn title(&self, document: NodeId) -> Option<String> {
        let head = self.head(document)?;
        let title = self
            .child_tags(head)
            .into_iter()
            .find(|&n| self.tag_name(n) == Some("title"))?;
        Some(
            self.children(title)
                .iter()
                .filter_map(|n| self.text(n))
                .collect(),
        )
    }
}

impl Context {
    /// The document around the current element, or the first one in the tree.
    pub fn current_document(&self) -> Result<NodeId> {
        let tree = self.tree();
        tree.document(self.current_element())
            .or_else(|| tree.document(tree.root()))
            .ok_or_else(|| BuildError::not_found("document"))
    }

    /// The document's head, created as its first child if missing.
    pub fn head(&mut self) -> Result<NodeId> {
        let document = self.current_document()?;
        match self.tree().head(document) {
            Some(head) => Ok(head),
            None => self.with_current(document, Flow::Prepend, |ctx| ctx.tag("head", ())),
        }
    }

    /// The document's body, appended if missing.
    pub fn body(&mut self) -> Result<NodeId> {
        let document = self.current_document()?;
        match self.tree().body(document) {
            Some(body) => Ok(body),
            None => self.with_current(document, Flow::Append, |ctx| ctx.tag("body", ())),
        }
    }

    pub fn head_with(&mut self, block: impl FnOnce(&mut Context) -> Result<()>) -> Result<NodeId> {
        let head = self.head()?;
        self.within(head, block)?;
        Ok(head)
    }

    pub fn body_with(&mut self, block: impl FnOnce(&mut Context) -> Result<()>) -> Result<NodeId> {
        let body = self.body()?;
        self.within(body, block)?;
        Ok(body)
    }

    /// Replace the text of the head's `title`, prepending one if needed.
    pub fn set_title(&mut self, title: &str) -> Result<NodeId> {
        let head = self.head()?;
        let existing = self
            .tree()
            .child_tags(head)
            .into_iter()
            .find(|&n| self.tree().tag_name(n) == Some("title"));
        match existing {
            Some(node) => {
                self.set_content(node, title)?;
                Ok(node)
            }
            None => self.prepend_within(head, |ctx| ctx.tag("title", title)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    const HEAD_META: &str =
        r#"<meta http-equiv="Content-Type" content="text/html; charset=utf-8"/>"#;

    #[test]
    fn test_empty_document() {
        let mut ctx = Context::new();
        ctx.document(|_| Ok(())).unwrap();
        assert_eq!(
            ctx.render().as_str(),
            format!(
                "<!DOCTYPE html>\n\n<html>\n  <head>\n    {HEAD_META}\n  </head>\n  <body></body>\n</html>"
            )
        );
    }

    #[test]
    fn test_block_runs_in_body() {
        let mut ctx = Context::new();
        let html = ctx
            .document(|ctx| {
                ctx.tag("div", "Content Area")?;
                ctx.head_with(|ctx| ctx.tag("title", "My Title").map(drop))?;
                Ok(())
            })
            .unwrap();

        let tree = ctx.tree();
        let body = tree.body(html).unwrap();
        assert_eq!(tree.content(body), "    <div>Content Area</div>");
        assert_eq!(tree.title(html).as_deref(), Some("My Title"));
    }

    #[test]
    fn test_set_title_prepends_then_replaces() {
        let mut ctx = Context::new();
        let html = ctx
            .document(|ctx| {
                ctx.set_title("First")?;
                ctx.set_title("My Title")?;
                Ok(())
            })
            .unwrap();

        let head = ctx.tree().head(html).unwrap();
        assert_eq!(
            ctx.render_node(head).as_str(),
            format!("  <head>\n    <title>My Title</title>\n    {HEAD_META}\n  </head>")
        );
    }

    #[test]
    fn test_no_document() {
        let mut ctx = Context::new();
        assert!(matches!(ctx.body(), Err(BuildError::NotFound { .. })));
    }
}
