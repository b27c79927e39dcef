//! Tag definitions and the keyword registry the builder resolves them from.

use crate::error::{BuildError, Result};
use compact_str::CompactString;
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::rc::Rc;

/// How a declared attribute is read and written through
/// [`Tree::attribute`](crate::Tree::attribute) and
/// [`Tree::set_attribute`](crate::Tree::set_attribute).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// Read and written as a string.
    Plain,
    /// Read as presence; written from truthiness.
    Boolean,
}

/// Everything the builder needs to know about one kind of tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TagDef {
    name: Option<CompactString>,
    self_closing: bool,
    default_id: Option<CompactString>,
    default_classes: SmallVec<[CompactString; 2]>,
    default_attributes: IndexMap<CompactString, CompactString>,
    schema: IndexMap<CompactString, AttributeKind>,
}

impl TagDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(CompactString::from(name)),
            ..Self::unnamed()
        }
    }

    /// A definition without a tag name. Building from it fails with
    /// [`BuildError::NotImplemented`] until [`TagDef::with_name`] is called.
    pub fn unnamed() -> Self {
        let mut schema = IndexMap::new();
        schema.insert(CompactString::const_new("id"), AttributeKind::Plain);
        Self {
            name: None,
            self_closing: false,
            default_id: None,
            default_classes: SmallVec::new(),
            default_attributes: IndexMap::new(),
            schema,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(CompactString::from(name));
        self
    }

    pub fn self_closing(mut self) -> Self {
        self.self_closing = true;
        self
    }

    /// Id given to every tag built from this definition unless the build
    /// arguments carry one.
    pub fn with_default_id(mut self, id: &str) -> Self {
        self.default_id = Some(CompactString::from(id));
        self
    }

    /// Classes added after the build arguments, so a `class` argument never
    /// overwrites them.
    pub fn with_default_classes(mut self, classes: &str) -> Self {
        self.default_classes
            .extend(classes.split_whitespace().map(CompactString::from));
        self
    }

    /// Attribute set at creation time, before content or arguments.
    pub fn with_default_attribute(mut self, name: &str, value: &str) -> Self {
        self.default_attributes
            .insert(CompactString::from(name), CompactString::from(value));
        self
    }

    /// Declare an attribute accessor.
    pub fn with_attribute(mut self, name: &str, kind: AttributeKind) -> Self {
        self.schema.insert(CompactString::from(name), kind);
        self
    }

    pub fn with_boolean_attributes(mut self, names: &[&str]) -> Self {
        for name in names {
            self.schema
                .insert(CompactString::from(*name), AttributeKind::Boolean);
        }
        self
    }

    pub fn name(&self) -> Result<&str> {
        self.name
            .as_deref()
            .ok_or_else(|| BuildError::NotImplemented {
                what: "tag name for an unnamed tag definition".to_string(),
            })
    }

    pub fn is_self_closing(&self) -> bool {
        self.self_closing
    }

    pub fn default_id(&self) -> Option<&str> {
        self.default_id.as_deref()
    }

    pub fn default_classes(&self) -> impl Iterator<Item = &str> {
        self.default_classes.iter().map(CompactString::as_str)
    }

    pub fn default_attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.default_attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn attribute_kind(&self, name: &str) -> Option<AttributeKind> {
        self.schema.get(name).copied()
    }
}

/// Keywords the HTML5 registry knows, each building the tag of the same name.
const HTML5_TAGS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "base", "bdo",
    "blockquote", "body", "br", "button", "canvas", "caption", "cite", "code", "col",
    "colgroup", "command", "datalist", "dd", "del", "details", "dfn", "div", "dl", "dt", "em",
    "embed", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "head", "header", "hgroup", "hr", "html", "i", "iframe", "img", "input", "ins",
    "keygen", "kbd", "label", "legend", "li", "link", "map", "mark", "menu", "meta", "meter",
    "nav", "noscript", "object", "ol", "optgroup", "option", "output", "p", "param", "pre",
    "progress", "q", "s", "samp", "script", "section", "select", "small", "source", "span",
    "strong", "style", "sub", "summary", "sup", "table", "tbody", "td", "textarea", "tfoot", "th",
    "thead", "time", "title", "tr", "track", "ul", "var", "video", "wbr",
];

/// Void elements: rendered as `<name/>` when empty.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

const BOOLEAN_ATTRIBUTES: &[(&str, &[&str])] = &[
    (
        "input",
        &["checked", "disabled", "readonly", "required", "autofocus", "multiple"],
    ),
    ("option", &["selected", "disabled"]),
    ("optgroup", &["disabled"]),
    ("select", &["disabled", "multiple", "required", "autofocus"]),
    ("button", &["disabled", "autofocus"]),
    ("textarea", &["disabled", "readonly", "required", "autofocus"]),
    ("script", &["async", "defer"]),
    ("details", &["open"]),
    ("audio", &["autoplay", "controls", "loop", "muted"]),
    ("video", &["autoplay", "controls", "loop", "muted"]),
    ("iframe", &["allowfullscreen"]),
];

/// Keyword to tag definition table, owned by a [`Context`](crate::Context).
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    tags: IndexMap<CompactString, Rc<TagDef>>,
}

impl TagRegistry {
    /// A registry with no keywords.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard HTML5 tags, plus `para` for `p`.
    pub fn html5() -> Self {
        let mut registry = Self::empty();

        for &name in HTML5_TAGS {
            let mut def = TagDef::new(name);
            if VOID_ELEMENTS.contains(&name) {
                def = def.self_closing();
            }
            if let Some((_, names)) = BOOLEAN_ATTRIBUTES.iter().find(|(tag, _)| *tag == name) {
                def = def.with_boolean_attributes(names);
            }
            if name == "table" {
                def = def
                    .with_default_attribute("border", "0")
                    .with_default_attribute("cellspacing", "0")
                    .with_default_attribute("cellpadding", "0");
            }
            registry.register(name, def);
        }

        registry.register("para", TagDef::new("p"));
        registry
    }

    /// Register (or replace) the definition built by `keyword`.
    pub fn register(&mut self, keyword: &str, def: TagDef) -> &mut Self {
        self.tags.insert(CompactString::from(keyword), Rc::new(def));
        self
    }

    pub fn get(&self, keyword: &str) -> Option<&Rc<TagDef>> {
        self.tags.get(keyword)
    }

    pub fn lookup(&self, keyword: &str) -> Result<Rc<TagDef>> {
        self.get(keyword)
            .cloned()
            .ok_or_else(|| BuildError::UnknownTag {
                keyword: keyword.to_string(),
            })
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.tags.contains_key(keyword)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(CompactString::as_str)
    }
}
