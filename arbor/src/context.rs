//! The build context: a tree plus the stack of (element, flow) frames that
//! decides where the next node lands.

use crate::error::{BuildError, Result};
use crate::helpers::Helpers;
use crate::serialize::{Markup, RenderOptions};
use crate::{TagRegistry, Tree, Value, debug};
use compact_str::CompactString;
use indexmap::IndexMap;
use indextree::NodeId;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

/// Named values made available to builder closures.
pub type Assigns = IndexMap<CompactString, Value>;

/// Where [`Context::insert_child`] puts the next node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Append,
    Prepend,
    Before(NodeId),
    After(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    element: NodeId,
    flow: Flow,
}

/// One rendering session: owns the tree, the frame stack, assigns, helpers,
/// the tag registry and the render options.
pub struct Context {
    tree: Tree,
    frames: Vec<Frame>,
    assigns: Assigns,
    helpers: Option<Rc<dyn Helpers>>,
    registry: TagRegistry,
    options: RenderOptions,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        let tree = Tree::new();
        let root = tree.root();
        Self {
            tree,
            frames: vec![Frame {
                element: root,
                flow: Flow::Append,
            }],
            assigns: Assigns::new(),
            helpers: None,
            registry: TagRegistry::html5(),
            options: RenderOptions::default(),
        }
    }

    pub fn with_assigns<K, V>(mut self, assigns: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<CompactString>,
        V: Into<Value>,
    {
        self.assigns
            .extend(assigns.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_helpers(mut self, helpers: impl Helpers + 'static) -> Self {
        self.helpers = Some(Rc::new(helpers));
        self
    }

    pub fn with_registry(mut self, registry: TagRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TagRegistry {
        &mut self.registry
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    // ---- frames ----

    fn top(&self) -> Frame {
        // The initial frame is never popped.
        self.frames.last().copied().unwrap_or(Frame {
            element: self.tree.root(),
            flow: Flow::Append,
        })
    }

    pub fn current_element(&self) -> NodeId {
        self.top().element
    }

    pub fn current_flow(&self) -> Flow {
        self.top().flow
    }

    /// Number of frames on the stack, the initial one included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Run `block` with `(element, flow)` as the current frame. The frame is
    /// popped on every exit path, including an unwinding panic.
    pub fn with_current<T>(
        &mut self,
        element: NodeId,
        flow: Flow,
        block: impl FnOnce(&mut Context) -> T,
    ) -> T {
        debug!(?element, ?flow, depth = self.frames.len(), "push frame");
        let depth = self.frames.len();
        self.frames.push(Frame { element, flow });
        let mut guard = FrameGuard { ctx: self, depth };
        block(&mut guard)
    }

    /// Rewrite the flow of the top frame.
    pub fn replace_current_flow(&mut self, flow: Flow) {
        if let Some(frame) = self.frames.last_mut() {
            debug!(from = ?frame.flow, to = ?flow, "replace flow");
            frame.flow = flow;
        }
    }

    /// Insert `node` into the current element according to the current flow.
    /// Prepending and inserting after a sibling move the flow to "after
    /// `node`", so a run of nodes keeps its order.
    pub fn insert_child(&mut self, node: NodeId) -> Result<()> {
        let Frame { element, flow } = self.top();
        let mut children = self.tree.children_mut(element);
        match flow {
            Flow::Append => children.add(node)?,
            Flow::Prepend => {
                children.insert_at(0, node)?;
                self.replace_current_flow(Flow::After(node));
            }
            Flow::Before(sibling) => children.insert_before(sibling, node)?,
            Flow::After(sibling) => {
                children.insert_after(sibling, node)?;
                self.replace_current_flow(Flow::After(node));
            }
        }
        Ok(())
    }

    // ---- assigns and helpers ----

    pub fn assigns(&self) -> &Assigns {
        &self.assigns
    }

    pub fn assign(&self, name: &str) -> Option<&Value> {
        self.assigns.get(name)
    }

    pub fn set_assign(&mut self, name: &str, value: impl Into<Value>) {
        self.assigns.insert(CompactString::from(name), value.into());
    }

    pub fn responds_to(&self, name: &str) -> bool {
        self.helpers
            .as_ref()
            .is_some_and(|helpers| helpers.responds_to(name))
    }

    /// Call helper `name`. Fails with [`BuildError::MissingHelper`] when no
    /// helper object declares it.
    pub fn helper(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        let helpers = match &self.helpers {
            Some(helpers) if helpers.responds_to(name) => Rc::clone(helpers),
            _ => {
                return Err(BuildError::MissingHelper {
                    name: name.to_string(),
                });
            }
        };
        debug!(name, args = args.len(), "call helper");
        helpers.call(self, name, args)
    }

    // ---- output ----

    /// Render the whole tree with this context's options.
    pub fn render(&self) -> Markup {
        self.tree.render_with(self.tree.root(), &self.options)
    }

    pub fn render_node(&self, node: NodeId) -> Markup {
        self.tree.render_with(node, &self.options)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("frames", &self.frames)
            .field("assigns", &self.assigns)
            .field("helpers", &self.helpers.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Truncates the frame stack back to `depth` when dropped.
struct FrameGuard<'c> {
    ctx: &'c mut Context,
    depth: usize,
}

impl Deref for FrameGuard<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        self.ctx
    }
}

impl DerefMut for FrameGuard<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        self.ctx
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        debug!(depth = self.depth, "pop frame");
        self.ctx.frames.truncate(self.depth);
    }
}
