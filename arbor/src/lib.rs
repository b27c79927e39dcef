//! In-memory HTML tree builder.
//!
//! arbor provides:
//! - **Tree**: an `indextree` arena of tags, text, comments and containers
//! - **Building**: nested builder closures on a [`Context`], with append,
//!   prepend and before/after-sibling insertion flows
//! - **Querying**: a small CSS-subset selector engine
//! - **Serialization**: indented, escaped HTML output
//!
//! # Example
//!
//! ```rust
//! use arbor::{Args, Context};
//!
//! let mut ctx = Context::new();
//! ctx.tag_with("ul", Args::new().class("menu"), |ctx| {
//!     ctx.tag("li", "First")?;
//!     ctx.tag("li", "Second")?;
//!     Ok(())
//! })?;
//!
//! // Insert relative to something found by selector
//! ctx.after("ul.menu > li:first", |ctx| ctx.tag("li", "Between"))?;
//!
//! assert_eq!(
//!     ctx.render().as_str(),
//!     "<ul class=\"menu\">\n  <li>First</li>\n  <li>Between</li>\n  <li>Second</li>\n</ul>"
//! );
//! # Ok::<(), arbor::BuildError>(())
//! ```

mod tracing_macros;
pub(crate) use tracing_macros::{debug, trace};

mod attributes;
mod building;
mod class_list;
mod collection;
mod context;
mod document;
pub mod error;
mod helpers;
mod node;
pub mod query;
pub mod serialize;
mod style;
pub mod tags;
mod tree;
mod value;

pub use attributes::{AttributeValue, Attributes};
pub use building::{Args, Kind, Target};
pub use class_list::ClassList;
pub use collection::{ChildCollection, ChildCollectionMut, ElementCollection};
pub use context::{Assigns, Context, Flow};
pub use error::{BuildError, Result};
pub use helpers::{HelperTable, Helpers};
pub use node::{Content, Node, TagData};
pub use query::{Query, Selector};
pub use serialize::{Markup, RenderOptions, escape_html};
pub use style::{StyleMap, dasherize};
pub use tags::{AttributeKind, TagDef, TagRegistry};
pub use tree::Tree;
pub use value::Value;

pub use indextree::NodeId;

/// Build into a fresh [`Context`] and render the result.
pub fn render(block: impl FnOnce(&mut Context) -> Result<()>) -> Result<Markup> {
    let mut ctx = Context::new();
    block(&mut ctx)?;
    Ok(ctx.render())
}
