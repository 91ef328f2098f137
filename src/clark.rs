//! Clark projection and the default node comparison
//!
//! A Clark tree is the prefix-free rendition of an XML tree: every element
//! carries only its `{namespace}local` name, attributes and children, with
//! no namespace scope and no prefix hints. Two trees have equal Clark projections
//! exactly when they are semantically equivalent regardless of prefix
//! choices and scope mechanics, which makes the projection the canonical
//! form for namespace-prefix-insensitive equality.
//!
//! CDATA sections project to plain text: the flag is lexical only and the
//! projection is serialization-independent.

use crate::names::QName;
use crate::nodes::{AttributeMap, Comment, Element, Node, ProcessingInstruction, Text};
use crate::queries::{ChildNodeView, ElementApi};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A node of a Clark tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClarkNode {
    /// Element node
    Element(ClarkElement),
    /// Text node (never CDATA)
    Text(Text),
    /// Comment node
    Comment(Comment),
    /// Processing-instruction node
    ProcessingInstruction(ProcessingInstruction),
}

impl ClarkNode {
    /// The element inside this node, if it is one
    pub fn as_element(&self) -> Option<&ClarkElement> {
        match self {
            ClarkNode::Element(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct ClarkElementData {
    name: QName,
    attributes: AttributeMap,
    children: Vec<ClarkNode>,
}

/// Element of a Clark tree: name, attributes and children only
///
/// Cloning is cheap; equality and hashing are structural and stable, with
/// attribute order ignored.
#[derive(Debug, Clone)]
pub struct ClarkElement {
    data: Arc<ClarkElementData>,
}

impl ClarkElement {
    /// Create a Clark element
    ///
    /// Prefix hints on the name and the attribute names are stripped.
    pub fn new(name: QName, attributes: AttributeMap, children: Vec<ClarkNode>) -> Self {
        let attributes = attributes
            .into_iter()
            .map(|(attr_name, value)| (attr_name.without_prefix(), value))
            .collect();
        Self {
            data: Arc::new(ClarkElementData {
                name: name.without_prefix(),
                attributes,
                children,
            }),
        }
    }

    /// The element name (no prefix hint)
    pub fn name(&self) -> &QName {
        &self.data.name
    }

    /// The attribute map (no prefix hints)
    pub fn attributes(&self) -> &AttributeMap {
        &self.data.attributes
    }

    /// The ordered child nodes
    pub fn children(&self) -> &[ClarkNode] {
        &self.data.children
    }

    /// The element children, in document order
    pub fn child_elements(&self) -> impl Iterator<Item = &ClarkElement> {
        self.data.children.iter().filter_map(ClarkNode::as_element)
    }
}

impl PartialEq for ClarkElement {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data) || self.data == other.data
    }
}

impl Eq for ClarkElement {}

impl Hash for ClarkElement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.name.hash(state);
        // Attribute order is not part of equality, so combine entry hashes
        // order-insensitively.
        let mut attributes_hash = 0u64;
        for entry in self.data.attributes.iter() {
            let mut entry_hasher = DefaultHasher::new();
            entry.hash(&mut entry_hasher);
            attributes_hash = attributes_hash.wrapping_add(entry_hasher.finish());
        }
        attributes_hash.hash(state);
        self.data.children.hash(state);
    }
}

impl ElementApi for ClarkElement {
    fn name(&self) -> &QName {
        ClarkElement::name(self)
    }

    fn attributes(&self) -> &AttributeMap {
        ClarkElement::attributes(self)
    }

    fn child_nodes(&self) -> Vec<ChildNodeView<'_, Self>> {
        self.data
            .children
            .iter()
            .map(|child| match child {
                ClarkNode::Element(e) => ChildNodeView::Element(e.clone()),
                ClarkNode::Text(t) => ChildNodeView::Text(t),
                ClarkNode::Comment(c) => ChildNodeView::Comment(c),
                ClarkNode::ProcessingInstruction(pi) => ChildNodeView::ProcessingInstruction(pi),
            })
            .collect()
    }
}

impl Element {
    /// Project this element onto its Clark form
    ///
    /// Scopes and prefix hints are erased; everything else is kept.
    pub fn to_clark(&self) -> ClarkElement {
        let children = self.children().iter().map(Node::to_clark).collect();
        ClarkElement::new(self.name().clone(), self.attributes().clone(), children)
    }
}

impl Node {
    /// Project this node onto its Clark form
    pub fn to_clark(&self) -> ClarkNode {
        match self {
            Node::Element(e) => ClarkNode::Element(e.to_clark()),
            Node::Text(t) => ClarkNode::Text(Text::new(t.value())),
            Node::Comment(c) => ClarkNode::Comment(c.clone()),
            Node::ProcessingInstruction(pi) => ClarkNode::ProcessingInstruction(pi.clone()),
        }
    }
}

/// Default equality on elements: compare Clark projections
///
/// Prefix hints, scopes and CDATA flags are ignored; names, attributes,
/// text, comments, PIs and child order all count.
pub fn default_eq(a: &Element, b: &Element) -> bool {
    a.to_clark() == b.to_clark()
}

/// Default equality on nodes of any kind
pub fn default_eq_nodes(a: &Node, b: &Node) -> bool {
    a.to_clark() == b.to_clark()
}
