//! Immutable XML node model
//!
//! This module provides the tree model: elements, text, comments,
//! processing instructions and the document wrapper. Every node is deeply
//! immutable; "update" operations return new nodes that share unchanged
//! subtrees with the original. An `Element` is a cheap-to-clone handle over
//! shared data, so whole trees can be passed across threads freely.
//!
//! Structural equality between nodes lives in the comparison layer (see
//! [`crate::clark`]); the node types themselves deliberately do not
//! implement `PartialEq`.

use crate::error::{Error, Result};
use crate::names::QName;
use crate::paths::NavigationPath;
use crate::scopes::NamespaceScope;
use crate::{XML_NAMESPACE, XML_PREFIX};
use indexmap::IndexMap;
use std::sync::Arc;
use url::Url;

/// Mapping from attribute name to value
///
/// Insertion order is preserved for deterministic serialization; equality of
/// `IndexMap` ignores order, so order is not part of attribute-map equality.
pub type AttributeMap = IndexMap<QName, String>;

/// A node in the XML tree
#[derive(Debug, Clone)]
pub enum Node {
    /// Element node
    Element(Element),
    /// Text node
    Text(Text),
    /// Comment node
    Comment(Comment),
    /// Processing-instruction node
    ProcessingInstruction(ProcessingInstruction),
}

impl Node {
    /// The element inside this node, if it is one
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    /// The text inside this node, if it is one
    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }

    /// True for element nodes
    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    /// True for text nodes
    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

impl From<Comment> for Node {
    fn from(comment: Comment) -> Self {
        Node::Comment(comment)
    }
}

impl From<ProcessingInstruction> for Node {
    fn from(pi: ProcessingInstruction) -> Self {
        Node::ProcessingInstruction(pi)
    }
}

/// Text node
///
/// The CDATA flag is lexical only; the default comparison ignores it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Text {
    value: String,
    cdata: bool,
}

impl Text {
    /// Create a plain text node
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            cdata: false,
        }
    }

    /// Create a CDATA text node
    pub fn cdata(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            cdata: true,
        }
    }

    /// The text value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// True when the node was written as a CDATA section
    pub fn is_cdata(&self) -> bool {
        self.cdata
    }

    /// True when the value contains only XML whitespace
    pub fn is_whitespace_only(&self) -> bool {
        self.value
            .chars()
            .all(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
    }
}

/// Comment node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Comment {
    value: String,
}

impl Comment {
    /// Create a comment node
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// The comment text
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Processing-instruction node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessingInstruction {
    target: String,
    data: String,
}

impl ProcessingInstruction {
    /// Create a processing-instruction node
    pub fn new(target: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            data: data.into(),
        }
    }

    /// The PI target
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The PI data
    pub fn data(&self) -> &str {
        &self.data
    }
}

#[derive(Debug)]
struct ElementData {
    name: QName,
    attributes: AttributeMap,
    scope: NamespaceScope,
    children: Vec<Node>,
}

/// Element node: name, attributes, namespace scope and ordered children
///
/// Cloning is cheap (a reference-count bump); the underlying data is shared
/// and immutable.
#[derive(Debug, Clone)]
pub struct Element {
    data: Arc<ElementData>,
}

impl Element {
    /// Create an element, checking name/scope consistency
    ///
    /// Fails with `Error::UnboundPrefix` when the element name or an
    /// attribute name carries a prefix hint that the scope does not bind to
    /// that name's namespace.
    pub fn new(
        name: QName,
        attributes: AttributeMap,
        scope: NamespaceScope,
        children: Vec<Node>,
    ) -> Result<Self> {
        check_name_agrees_with_scope(&name, &scope)?;
        for attribute_name in attributes.keys() {
            check_name_agrees_with_scope(attribute_name, &scope)?;
        }
        Ok(Self::new_unchecked(name, attributes, scope, children))
    }

    /// Start a fluent builder for an element with the given syntactic name
    pub fn builder(name: impl Into<String>) -> ElementBuilder {
        ElementBuilder::new(name)
    }

    pub(crate) fn new_unchecked(
        name: QName,
        attributes: AttributeMap,
        scope: NamespaceScope,
        children: Vec<Node>,
    ) -> Self {
        Self {
            data: Arc::new(ElementData {
                name,
                attributes,
                scope,
                children,
            }),
        }
    }

    /// The element name
    pub fn name(&self) -> &QName {
        &self.data.name
    }

    /// The attribute map
    pub fn attributes(&self) -> &AttributeMap {
        &self.data.attributes
    }

    /// The namespace scope in force at this element
    pub fn scope(&self) -> &NamespaceScope {
        &self.data.scope
    }

    /// The ordered child nodes, all kinds
    pub fn children(&self) -> &[Node] {
        &self.data.children
    }

    /// The element children, in document order
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.data.children.iter().filter_map(Node::as_element)
    }

    /// Attribute value by name
    pub fn attribute(&self, name: &QName) -> Option<&str> {
        self.data.attributes.get(name).map(|v| v.as_str())
    }

    /// Attribute value by local name, ignoring namespaces
    pub fn attribute_by_local_name(&self, local_name: &str) -> Option<&str> {
        self.data
            .attributes
            .iter()
            .find(|(name, _)| name.local_name() == local_name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated value of all text children
    pub fn text(&self) -> String {
        self.data
            .children
            .iter()
            .filter_map(Node::as_text)
            .map(Text::value)
            .collect()
    }

    /// Concatenated text children with surrounding whitespace removed
    pub fn trimmed_text(&self) -> String {
        self.text().trim().to_string()
    }

    /// True when both handles point at the same shared data
    ///
    /// Identity is not observable through the public API; this exists for
    /// structural-sharing assertions in tests.
    pub(crate) fn shares_data_with(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Resolve a navigation path against this element
    ///
    /// Fails with `Error::PathOutOfRange` when an index exceeds the
    /// child-element count at some level.
    pub fn element_at(&self, path: &NavigationPath) -> Result<&Element> {
        let mut current = self;
        for (depth, &index) in path.indices().iter().enumerate() {
            current = current.child_elements().nth(index).ok_or_else(|| {
                Error::PathOutOfRange(format!(
                    "no child element {} at depth {} of path {}",
                    index, depth, path
                ))
            })?;
        }
        Ok(current)
    }
}

fn check_name_agrees_with_scope(name: &QName, scope: &NamespaceScope) -> Result<()> {
    let Some(prefix) = name.prefix() else {
        return Ok(());
    };
    if prefix == XML_PREFIX {
        return if name.namespace() == Some(XML_NAMESPACE) {
            Ok(())
        } else {
            Err(Error::ReservedPrefixMisuse(format!(
                "prefix 'xml' on name '{}'",
                name
            )))
        };
    }
    match scope.namespace_of_prefix(prefix) {
        Some(ns) if Some(ns) == name.namespace() => Ok(()),
        _ => Err(Error::UnboundPrefix(format!(
            "prefix '{}' of name '{}' not bound in scope",
            prefix, name
        ))),
    }
}

/// XML document: an optional base URI plus ordered document children
///
/// Document children are restricted to elements, comments and processing
/// instructions, with exactly one element among them. The element's position
/// among its siblings is preserved.
#[derive(Debug, Clone)]
pub struct Document {
    base_uri: Option<Url>,
    children: Vec<Node>,
}

impl Document {
    /// Create a document from its children
    ///
    /// Fails with `Error::InvalidDocument` when a child is a text node or
    /// when the children do not contain exactly one element.
    pub fn new(base_uri: Option<Url>, children: Vec<Node>) -> Result<Self> {
        let mut element_count = 0;
        for child in &children {
            match child {
                Node::Element(_) => element_count += 1,
                Node::Text(_) => {
                    return Err(Error::InvalidDocument(
                        "text is not allowed as a document child".to_string(),
                    ))
                }
                Node::Comment(_) | Node::ProcessingInstruction(_) => {}
            }
        }
        if element_count != 1 {
            return Err(Error::InvalidDocument(format!(
                "expected exactly one document element, found {}",
                element_count
            )));
        }
        Ok(Self { base_uri, children })
    }

    /// Create a document holding just the given element
    pub fn from_element(element: Element) -> Self {
        Self {
            base_uri: None,
            children: vec![Node::Element(element)],
        }
    }

    /// The document base URI, if any
    pub fn base_uri(&self) -> Option<&Url> {
        self.base_uri.as_ref()
    }

    /// The ordered document children (elements, comments, PIs)
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// The document element
    pub fn document_element(&self) -> &Element {
        self.children
            .iter()
            .find_map(Node::as_element)
            .expect("document invariant: exactly one element child")
    }

    /// New document with the given base URI
    pub fn with_base_uri(&self, base_uri: Option<Url>) -> Self {
        Self {
            base_uri,
            children: self.children.clone(),
        }
    }

    /// New document with the document element replaced in place
    ///
    /// Comments and processing instructions around the element keep their
    /// positions.
    pub fn with_document_element(&self, element: Element) -> Self {
        let children = self
            .children
            .iter()
            .map(|child| match child {
                Node::Element(_) => Node::Element(element.clone()),
                other => other.clone(),
            })
            .collect();
        Self {
            base_uri: self.base_uri.clone(),
            children,
        }
    }
}

/// Fluent element builder threading a namespace scope
///
/// Names are given in syntactic form (`"p:local"` or `"local"`) and resolved
/// against the builder's scope at `build()` time, so the resulting prefix
/// hints always agree with the scope. Attribute names follow the attribute
/// rule: an unprefixed attribute is in no namespace.
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    name: String,
    scope: NamespaceScope,
    declarations: Vec<(String, String)>,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl ElementBuilder {
    /// Start a builder for the given syntactic element name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: NamespaceScope::empty(),
            declarations: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Use the given scope as the starting scope
    pub fn scope(mut self, scope: NamespaceScope) -> Self {
        self.scope = scope;
        self
    }

    /// Declare (or undeclare, with an empty URI) a prefix for this element
    /// and its descendants
    pub fn declare(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.declarations.push((prefix.into(), namespace.into()));
        self
    }

    /// Add an attribute by syntactic name
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Append a child node
    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append a text child
    pub fn text(mut self, value: impl Into<String>) -> Self {
        self.children.push(Node::Text(Text::new(value)));
        self
    }

    /// Resolve all names and produce the element
    pub fn build(self) -> Result<Element> {
        let mut scope = self.scope;
        for (prefix, namespace) in &self.declarations {
            scope = scope.resolve(prefix, namespace)?;
        }
        let name = scope.resolve_element_qname(&self.name)?;
        let mut attributes = AttributeMap::new();
        for (attr_name, value) in &self.attributes {
            let qname = scope.resolve_attribute_qname(attr_name)?;
            attributes.insert(qname, value.clone());
        }
        Element::new(name, attributes, scope, self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn scope(entries: &[(&str, &str)]) -> NamespaceScope {
        NamespaceScope::from_declarations(entries.iter().copied()).unwrap()
    }

    #[test]
    fn test_builder_threads_scope() {
        let element = Element::builder("p:root")
            .declare("p", "http://p")
            .attribute("id", "r1")
            .child(Element::builder("p:item").declare("p", "http://p").build().unwrap())
            .text("tail")
            .build()
            .unwrap();

        assert_eq!(element.name().namespace(), Some("http://p"));
        assert_eq!(element.name().local_name(), "root");
        assert_eq!(element.name().prefix(), Some("p"));
        assert_eq!(element.scope(), &scope(&[("p", "http://p")]));

        // Unprefixed attribute stays in no-namespace.
        let id = element.attributes().keys().next().unwrap();
        assert_eq!(id.namespace(), None);
        assert_eq!(element.attribute(id), Some("r1"));

        assert_eq!(element.children().len(), 2);
        assert_eq!(element.child_elements().count(), 1);
    }

    #[test]
    fn test_builder_default_namespace() {
        let element = Element::builder("root")
            .declare("", "http://ex")
            .build()
            .unwrap();
        assert_eq!(element.name().namespace(), Some("http://ex"));
        assert_eq!(element.name().prefix(), None);
    }

    #[test]
    fn test_builder_unbound_prefix() {
        let err = Element::builder("q:root").build().unwrap_err();
        assert!(matches!(err, Error::UnboundPrefix(_)));
    }

    #[test]
    fn test_element_new_checks_scope_consistency() {
        let name = QName::prefixed("http://p", "root", "p").unwrap();

        let err = Element::new(
            name.clone(),
            AttributeMap::new(),
            NamespaceScope::empty(),
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnboundPrefix(_)));

        let ok = Element::new(
            name,
            AttributeMap::new(),
            scope(&[("p", "http://p")]),
            Vec::new(),
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_element_accepts_xml_prefixed_attribute() {
        let mut attributes = AttributeMap::new();
        attributes.insert(
            QName::prefixed(crate::XML_NAMESPACE, "base", "xml").unwrap(),
            "http://example.com/base/".to_string(),
        );
        let element = Element::new(
            QName::local("root").unwrap(),
            attributes,
            NamespaceScope::empty(),
            Vec::new(),
        )
        .unwrap();
        assert_eq!(
            element.attribute_by_local_name("base"),
            Some("http://example.com/base/")
        );
    }

    #[test]
    fn test_text_helpers() {
        assert!(Text::new(" \t\r\n").is_whitespace_only());
        assert!(!Text::new(" x ").is_whitespace_only());
        assert!(Text::cdata("raw").is_cdata());
    }

    #[test]
    fn test_element_text() {
        let element = Element::builder("root")
            .text("a")
            .child(Element::builder("sep").build().unwrap())
            .text(" b ")
            .build()
            .unwrap();
        assert_eq!(element.text(), "a b ");
        assert_eq!(element.trimmed_text(), "a b");
    }

    #[test]
    fn test_element_at() {
        let root = Element::builder("root")
            .text("noise")
            .child(Element::builder("a").build().unwrap())
            .child(
                Element::builder("b")
                    .child(Element::builder("c").build().unwrap())
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let path = NavigationPath::empty();
        assert_eq!(root.element_at(&path).unwrap().name().local_name(), "root");

        let path = NavigationPath::from_indices([1, 0]);
        assert_eq!(root.element_at(&path).unwrap().name().local_name(), "c");

        let path = NavigationPath::from_indices([2]);
        let err = root.element_at(&path).unwrap_err();
        assert!(matches!(err, Error::PathOutOfRange(_)));
    }

    #[test]
    fn test_document_exactly_one_element() {
        let element = Element::builder("root").build().unwrap();

        let doc = Document::new(
            None,
            vec![
                Node::Comment(Comment::new(" prolog ")),
                Node::Element(element.clone()),
                Node::ProcessingInstruction(ProcessingInstruction::new("target", "data")),
            ],
        )
        .unwrap();
        assert_eq!(doc.document_element().name().local_name(), "root");
        assert_eq!(doc.children().len(), 3);

        let err = Document::new(None, vec![Node::Comment(Comment::new("no element"))]).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));

        let err = Document::new(
            None,
            vec![
                Node::Element(element.clone()),
                Node::Element(element.clone()),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));

        let err = Document::new(
            None,
            vec![Node::Element(element), Node::Text(Text::new("stray"))],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
    }

    #[test]
    fn test_document_with_document_element_preserves_positions() {
        let doc = Document::new(
            None,
            vec![
                Node::Comment(Comment::new(" before ")),
                Node::Element(Element::builder("old").build().unwrap()),
                Node::Comment(Comment::new(" after ")),
            ],
        )
        .unwrap();

        let replaced = doc.with_document_element(Element::builder("new").build().unwrap());
        assert_eq!(replaced.document_element().name().local_name(), "new");
        assert!(matches!(replaced.children()[0], Node::Comment(_)));
        assert!(matches!(replaced.children()[2], Node::Comment(_)));
    }

    #[test]
    fn test_clone_shares_subtrees() {
        let element = Element::builder("root").build().unwrap();
        let copy = element.clone();
        assert!(element.shares_data_with(&copy));
    }

    #[test]
    fn test_trees_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Node>();
        assert_send_sync::<Element>();
        assert_send_sync::<Document>();
        assert_send_sync::<NamespaceScope>();
        assert_send_sync::<NavigationPath>();
    }
}
