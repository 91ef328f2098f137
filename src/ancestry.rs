//! Ancestry-aware element view
//!
//! An [`IndexedElement`] pairs an element with the root it came from and its
//! navigation path under that root. No parent pointers are stored: parents
//! are rematerialized on demand by resolving the shortened path against the
//! immutable root, so the view is as shareable across threads as the
//! underlying tree.

use crate::names::QName;
use crate::nodes::{AttributeMap, Document, Element, Node};
use crate::paths::NavigationPath;
use crate::queries::{ChildNodeView, ElementApi, FilteredElements};
use crate::XML_NAMESPACE;
use once_cell::sync::Lazy;
use url::Url;

static XML_BASE_NAME: Lazy<QName> =
    Lazy::new(|| QName::namespaced(XML_NAMESPACE, "base").unwrap());

/// Element paired with its root and navigation path
///
/// Offers everything [`ElementApi`] offers, plus the upward axes and
/// base-URI derivation that require knowledge of the ancestry.
#[derive(Debug, Clone)]
pub struct IndexedElement {
    root: Element,
    path: NavigationPath,
    element: Element,
    document_base_uri: Option<Url>,
}

impl IndexedElement {
    /// View a bare element as a root, with no document base URI
    pub fn of_root(root: Element) -> Self {
        Self {
            element: root.clone(),
            root,
            path: NavigationPath::empty(),
            document_base_uri: None,
        }
    }

    /// View the document element of a document, carrying its base URI
    pub fn of_document(document: &Document) -> Self {
        Self {
            root: document.document_element().clone(),
            path: NavigationPath::empty(),
            element: document.document_element().clone(),
            document_base_uri: document.base_uri().cloned(),
        }
    }

    /// The underlying element
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// The root element this view was built from
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// The address of this element relative to the root
    pub fn navigation_path(&self) -> &NavigationPath {
        &self.path
    }

    /// The parent element view, unless this is the root
    pub fn parent(&self) -> Option<IndexedElement> {
        if self.path.is_empty() {
            return None;
        }
        let parent_path = self.path.without_last();
        let parent = self.root.element_at(&parent_path).ok()?;
        Some(Self {
            root: self.root.clone(),
            element: parent.clone(),
            path: parent_path,
            document_base_uri: self.document_base_uri.clone(),
        })
    }

    /// This element and its ancestors, innermost first
    pub fn ancestor_element_or_self_stream(&self) -> AncestorElements {
        AncestorElements {
            current: Some(self.clone()),
        }
    }

    /// The ancestors of this element, innermost first
    pub fn ancestor_element_stream(&self) -> AncestorElements {
        AncestorElements {
            current: self.parent(),
        }
    }

    /// Ancestors-or-self matching the predicate, innermost first
    pub fn ancestor_element_or_self_stream_where<P>(
        &self,
        predicate: P,
    ) -> FilteredElements<AncestorElements, P>
    where
        P: Fn(&IndexedElement) -> bool,
    {
        FilteredElements::new(self.ancestor_element_or_self_stream(), predicate)
    }

    /// Ancestors matching the predicate, innermost first
    pub fn ancestor_element_stream_where<P>(
        &self,
        predicate: P,
    ) -> FilteredElements<AncestorElements, P>
    where
        P: Fn(&IndexedElement) -> bool,
    {
        FilteredElements::new(self.ancestor_element_stream(), predicate)
    }

    /// The effective base URI of this element
    ///
    /// Starting from the document base URI, each `xml:base` attribute on
    /// the ancestor chain (outermost first) is resolved against the base in
    /// force above it. An unresolvable `xml:base` value clears the base from
    /// that element downwards.
    pub fn base_uri(&self) -> Option<Url> {
        let mut chain: Vec<IndexedElement> = self.ancestor_element_or_self_stream().collect();
        chain.reverse();

        let mut base = self.document_base_uri.clone();
        for ancestor in &chain {
            if let Some(value) = ancestor.element.attribute(&XML_BASE_NAME) {
                base = match &base {
                    Some(current) => current.join(value).ok(),
                    None => Url::parse(value).ok(),
                };
            }
        }
        base
    }
}

/// Upward walk over an element's ancestor chain
#[derive(Debug)]
pub struct AncestorElements {
    current: Option<IndexedElement>,
}

impl Iterator for AncestorElements {
    type Item = IndexedElement;

    fn next(&mut self) -> Option<IndexedElement> {
        let element = self.current.take()?;
        self.current = element.parent();
        Some(element)
    }
}

impl ElementApi for IndexedElement {
    fn name(&self) -> &QName {
        self.element.name()
    }

    fn attributes(&self) -> &AttributeMap {
        self.element.attributes()
    }

    fn child_nodes(&self) -> Vec<ChildNodeView<'_, Self>> {
        let mut element_index = 0;
        self.element
            .children()
            .iter()
            .map(|child| match child {
                Node::Element(e) => {
                    let view = IndexedElement {
                        root: self.root.clone(),
                        path: self.path.append(element_index),
                        element: e.clone(),
                        document_base_uri: self.document_base_uri.clone(),
                    };
                    element_index += 1;
                    ChildNodeView::Element(view)
                }
                Node::Text(t) => ChildNodeView::Text(t),
                Node::Comment(c) => ChildNodeView::Comment(c),
                Node::ProcessingInstruction(pi) => ChildNodeView::ProcessingInstruction(pi),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::predicates;

    fn sample_root() -> Element {
        Element::builder("root")
            .child(
                Element::builder("a")
                    .child(Element::builder("leaf").build().unwrap())
                    .build()
                    .unwrap(),
            )
            .child(Element::builder("b").build().unwrap())
            .build()
            .unwrap()
    }

    fn leaf_of(root: &IndexedElement) -> IndexedElement {
        root.descendant_element_or_self_stream_where(predicates::has_local_name("leaf"))
            .next()
            .unwrap()
    }

    #[test]
    fn test_navigation_paths_follow_descent() {
        let root = IndexedElement::of_root(sample_root());
        let leaf = leaf_of(&root);
        assert_eq!(leaf.navigation_path(), &NavigationPath::from_indices([0, 0]));

        let b = root
            .child_element_stream_where(predicates::has_local_name("b"))
            .next()
            .unwrap();
        assert_eq!(b.navigation_path(), &NavigationPath::from_indices([1]));
    }

    #[test]
    fn test_parent_and_ancestors() {
        let root = IndexedElement::of_root(sample_root());
        assert!(root.parent().is_none());

        let leaf = leaf_of(&root);
        let parent = leaf.parent().unwrap();
        assert_eq!(parent.name().local_name(), "a");

        let chain: Vec<String> = leaf
            .ancestor_element_or_self_stream()
            .map(|e| e.name().local_name().to_string())
            .collect();
        assert_eq!(chain, vec!["leaf", "a", "root"]);

        let strict: Vec<String> = leaf
            .ancestor_element_stream()
            .map(|e| e.name().local_name().to_string())
            .collect();
        assert_eq!(strict, vec!["a", "root"]);
    }

    #[test]
    fn test_ancestor_stream_where() {
        let root = IndexedElement::of_root(sample_root());
        let leaf = leaf_of(&root);
        let found: Vec<IndexedElement> = leaf
            .ancestor_element_stream_where(predicates::has_local_name("root"))
            .collect();
        assert_eq!(found.len(), 1);
        assert!(found[0].navigation_path().is_empty());
    }

    #[test]
    fn test_base_uri_resolution() {
        let leaf = Element::builder("leaf")
            .attribute("xml:base", "deep/leaf.xml")
            .build()
            .unwrap();
        let mid = Element::builder("mid")
            .attribute("xml:base", "mid/")
            .child(leaf)
            .build()
            .unwrap();
        let root = Element::builder("root").child(mid).build().unwrap();

        let document = Document::from_element(root)
            .with_base_uri(Some(Url::parse("http://example.com/docs/").unwrap()));
        let root_view = IndexedElement::of_document(&document);

        assert_eq!(
            root_view.base_uri(),
            Some(Url::parse("http://example.com/docs/").unwrap())
        );

        let leaf_view = leaf_of(&root_view);
        assert_eq!(
            leaf_view.base_uri(),
            Some(Url::parse("http://example.com/docs/mid/deep/leaf.xml").unwrap())
        );
    }

    #[test]
    fn test_base_uri_absolute_override() {
        let inner = Element::builder("inner")
            .attribute("xml:base", "http://other.org/x/")
            .build()
            .unwrap();
        let root = Element::builder("root").child(inner).build().unwrap();
        let document = Document::from_element(root)
            .with_base_uri(Some(Url::parse("http://example.com/").unwrap()));

        let inner_view = IndexedElement::of_document(&document)
            .child_element_stream()
            .next()
            .unwrap();
        assert_eq!(
            inner_view.base_uri(),
            Some(Url::parse("http://other.org/x/").unwrap())
        );
    }

    #[test]
    fn test_base_uri_without_document_base() {
        let root = IndexedElement::of_root(sample_root());
        assert_eq!(root.base_uri(), None);
    }

    #[test]
    fn test_query_axes_work_on_indexed_elements() {
        let root = IndexedElement::of_root(sample_root());
        let names: Vec<String> = root
            .descendant_element_or_self_stream()
            .map(|e| e.name().local_name().to_string())
            .collect();
        assert_eq!(names, vec!["root", "a", "leaf", "b"]);
    }
}
