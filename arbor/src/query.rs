//! A small CSS-subset selector engine.
//!
//! Supported grammar, whitespace separated segments each optionally prefixed
//! with `>`:
//!
//! ```text
//! segment := '*' filters | tag? ('#' id)? ('.' class)* filters
//! filters := (':' pseudo)* ('[' attr ']' | '[' attr '=' value ']')*
//! pseudo  := first | last | first-child | last-child
//! ```
//!
//! Selectors are lowercased and whitespace is collapsed before parsing.
//! Containers and bare elements are transparent: `div > a` finds an `a` inside
//! a container directly under the `div`.

use crate::error::{BuildError, Result};
use crate::{ElementCollection, Tree, debug, trace};
use compact_str::CompactString;
use indexmap::IndexSet;
use indextree::NodeId;
use smallvec::SmallVec;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pseudo {
    /// Keep the first match overall.
    First,
    /// Keep the last match overall.
    Last,
    /// Keep nodes that are the first child of their parent.
    FirstChild,
    /// Keep nodes that are the last child of their parent.
    LastChild,
}

/// `[name]` or `[name=value]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeFilter {
    pub name: CompactString,
    pub value: Option<CompactString>,
}

/// One whitespace separated part of a selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segment {
    /// `>`: direct child tags only.
    pub child: bool,
    pub universal: bool,
    pub tag: Option<CompactString>,
    pub id: Option<CompactString>,
    pub classes: SmallVec<[CompactString; 2]>,
    pub pseudos: SmallVec<[Pseudo; 2]>,
    pub attributes: SmallVec<[AttributeFilter; 2]>,
}

impl Segment {
    fn is_empty(&self) -> bool {
        !self.universal
            && self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.pseudos.is_empty()
            && self.attributes.is_empty()
    }

    fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        if let Some(id) = &self.id
            && tree.id(node) != Some(id.as_str())
        {
            return false;
        }
        if let Some(tag) = &self.tag
            && tree.tag_name(node) != Some(tag.as_str())
        {
            return false;
        }
        self.classes.iter().all(|class| tree.has_class(node, class))
    }
}

/// A parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    segments: Vec<Segment>,
}

impl Selector {
    pub fn parse(selector: &str) -> Result<Self> {
        let normalized = selector
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        let segments = Parser {
            source: selector,
            input: &normalized,
            pos: 0,
        }
        .parse()?;

        if segments.is_empty() {
            return Err(BuildError::selector(selector, "empty selector"));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl FromStr for Selector {
    type Err = BuildError;

    fn from_str(selector: &str) -> Result<Self> {
        Self::parse(selector)
    }
}

struct Parser<'s> {
    source: &'s str,
    input: &'s str,
    pos: usize,
}

fn is_ident_start(c: char) -> bool {
    c == '-' || c == '_' || c.is_ascii_lowercase()
}

fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

impl<'s> Parser<'s> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_spaces(&mut self) {
        while self.eat(' ') {}
    }

    fn error(&self, reason: impl Into<String>) -> BuildError {
        BuildError::selector(self.source, reason)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'s str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.input[start..self.pos]
    }

    fn ident(&mut self, what: &str) -> Result<CompactString> {
        if !self.peek().is_some_and(is_ident_start) {
            return Err(self.error(format!("expected {what}")));
        }
        Ok(CompactString::from(self.take_while(is_ident_char)))
    }

    fn parse(mut self) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();

        loop {
            self.skip_spaces();
            let Some(c) = self.peek() else { break };

            let mut segment = Segment::default();
            if c == '>' {
                self.bump();
                segment.child = true;
                self.skip_spaces();
            }

            if self.eat('*') {
                segment.universal = true;
            } else {
                if self.peek().is_some_and(is_ident_start) {
                    segment.tag = Some(self.ident("tag name")?);
                }
                if self.eat('#') {
                    segment.id = Some(self.ident("id after `#`")?);
                }
                while self.eat('.') {
                    segment.classes.push(self.ident("class after `.`")?);
                }
            }

            while self.eat(':') {
                segment.pseudos.push(self.pseudo()?);
            }
            while self.eat('[') {
                segment.attributes.push(self.attribute_filter()?);
            }

            match self.peek() {
                None | Some(' ' | '>') => {}
                Some(other) => return Err(self.error(format!("unexpected `{other}`"))),
            }
            if segment.is_empty() {
                return Err(self.error("`>` must be followed by a selector"));
            }
            segments.push(segment);
        }

        Ok(segments)
    }

    fn pseudo(&mut self) -> Result<Pseudo> {
        let name = self.ident("pseudo-class after `:`")?;
        match name.as_str() {
            "first" => Ok(Pseudo::First),
            "last" => Ok(Pseudo::Last),
            "first-child" => Ok(Pseudo::FirstChild),
            "last-child" => Ok(Pseudo::LastChild),
            other => Err(self.error(format!("unsupported pseudo-class `:{other}`"))),
        }
    }

    fn attribute_filter(&mut self) -> Result<AttributeFilter> {
        let name = self.take_while(|c| c != '=' && c != ']').trim();
        if name.is_empty() {
            return Err(self.error("expected attribute name after `[`"));
        }
        let name = CompactString::from(name);

        match self.bump() {
            Some(']') => Ok(AttributeFilter { name, value: None }),
            Some('=') => {
                let value = match self.peek() {
                    Some(quote @ ('"' | '\'')) => {
                        self.bump();
                        let value = self.take_while(|c| c != quote);
                        if !self.eat(quote) {
                            return Err(self.error("unterminated attribute value"));
                        }
                        value
                    }
                    _ => self.take_while(|c| c != ']').trim(),
                };
                let value = CompactString::from(value);
                if !self.eat(']') {
                    return Err(self.error("unterminated attribute filter"));
                }
                Ok(AttributeFilter {
                    name,
                    value: Some(value),
                })
            }
            _ => Err(self.error("unterminated attribute filter")),
        }
    }
}

/// Runs selectors against the tags below one scope node.
pub struct Query<'t> {
    tree: &'t Tree,
    root: NodeId,
}

impl<'t> Query<'t> {
    pub fn new(tree: &'t Tree, root: NodeId) -> Self {
        Self { tree, root }
    }

    pub fn execute(&self, selector: &str) -> Result<ElementCollection> {
        let parsed = Selector::parse(selector)?;
        debug!(selector, scope = ?self.root, "query");
        Ok(self.run(&parsed))
    }

    /// Thread the matched set through each segment in turn, starting from
    /// the scope node.
    pub fn run(&self, selector: &Selector) -> ElementCollection {
        let tree = self.tree;
        let mut scope = vec![self.root];

        for segment in selector.segments() {
            let mut found: IndexSet<NodeId> = IndexSet::new();
            for &node in &scope {
                let candidates = if segment.child {
                    tree.child_tags(node)
                } else {
                    tree.descendant_tags(node)
                };
                found.extend(
                    candidates
                        .into_iter()
                        .filter(|&candidate| segment.matches(tree, candidate)),
                );
            }

            let mut matched: Vec<NodeId> = found.into_iter().collect();
            for pseudo in &segment.pseudos {
                self.apply_pseudo(*pseudo, &mut matched);
            }
            for filter in &segment.attributes {
                matched.retain(|&node| match &filter.value {
                    Some(value) => {
                        tree.get_attribute(node, &filter.name).as_deref() == Some(value.as_str())
                    }
                    None => tree.has_attribute(node, &filter.name),
                });
            }

            trace!(?segment, matched = matched.len(), "segment");
            scope = matched;
        }

        ElementCollection::from(scope)
    }

    fn apply_pseudo(&self, pseudo: Pseudo, matched: &mut Vec<NodeId>) {
        let tree = self.tree;
        match pseudo {
            Pseudo::First => matched.truncate(1),
            Pseudo::Last => {
                if let Some(last) = matched.pop() {
                    matched.clear();
                    matched.push(last);
                }
            }
            Pseudo::FirstChild => matched.retain(|&node| {
                tree.parent(node)
                    .is_some_and(|parent| tree.children(parent).first() == Some(node))
            }),
            Pseudo::LastChild => matched.retain(|&node| {
                tree.parent(node)
                    .is_some_and(|parent| tree.children(parent).last() == Some(node))
            }),
        }
    }
}
