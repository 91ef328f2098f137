//! Composable element queries
//!
//! The query surface is a capability trait, [`ElementApi`], over any
//! element-shaped type: the native immutable [`Element`](crate::Element),
//! the ancestry-aware [`IndexedElement`](crate::IndexedElement) and the
//! prefix-free [`ClarkElement`](crate::ClarkElement) all implement it, and
//! every axis and predicate below works over each of them.
//!
//! Axes are lazy: each call returns a fresh iterator encoding its walk as a
//! small explicit stack. Streams are finite, deterministic and in document
//! pre-order; re-traversal means calling the axis method again.

mod axes;
pub mod predicates;

pub use axes::{ChildElements, FilteredElements, PreOrderElements, SelfElements, TopmostElements};

use crate::names::QName;
use crate::nodes::{AttributeMap, Comment, Element, Node, ProcessingInstruction, Text};

/// Borrowed view of one child node, independent of the backing element type
#[derive(Debug)]
pub enum ChildNodeView<'a, E> {
    /// Element child (an owned handle; handles are cheap clones)
    Element(E),
    /// Text child
    Text(&'a Text),
    /// Comment child
    Comment(&'a Comment),
    /// Processing-instruction child
    ProcessingInstruction(&'a ProcessingInstruction),
}

/// Capability surface the query axes run over
///
/// Implementors provide the three primitives (`name`, `attributes`,
/// `child_nodes`); every axis comes for free as a provided method.
pub trait ElementApi: Clone {
    /// The element name
    fn name(&self) -> &QName;

    /// The attribute map
    fn attributes(&self) -> &AttributeMap;

    /// The child nodes, all kinds, in document order
    fn child_nodes(&self) -> Vec<ChildNodeView<'_, Self>>;

    /// Attribute value by name, as an owned string
    fn attribute_option(&self, name: &QName) -> Option<String> {
        self.attributes().get(name).cloned()
    }

    /// Concatenated value of all text children
    fn text_content(&self) -> String {
        self.child_nodes()
            .iter()
            .filter_map(|child| match child {
                ChildNodeView::Text(t) => Some(t.value()),
                _ => None,
            })
            .collect()
    }

    /// True when every child is a text node (vacuously true for no children)
    fn has_only_text_children(&self) -> bool {
        self.child_nodes()
            .iter()
            .all(|child| matches!(child, ChildNodeView::Text(_)))
    }

    /// Singleton stream containing this element
    fn self_element_stream(&self) -> SelfElements<Self> {
        SelfElements::new(Some(self.clone()))
    }

    /// Singleton stream, empty when the predicate rejects this element
    fn self_element_stream_where<P>(&self, predicate: P) -> SelfElements<Self>
    where
        P: Fn(&Self) -> bool,
    {
        let element = predicate(self).then(|| self.clone());
        SelfElements::new(element)
    }

    /// Element children in document order
    fn child_element_stream(&self) -> ChildElements<Self> {
        ChildElements::new(axes::child_elements_of(self))
    }

    /// Element children matching the predicate
    fn child_element_stream_where<P>(&self, predicate: P) -> FilteredElements<ChildElements<Self>, P>
    where
        P: Fn(&Self) -> bool,
    {
        FilteredElements::new(self.child_element_stream(), predicate)
    }

    /// This element and all descendant elements, in document pre-order
    fn descendant_element_or_self_stream(&self) -> PreOrderElements<Self> {
        PreOrderElements::including(self.clone())
    }

    /// Pre-order walk including this element, filtered by the predicate
    fn descendant_element_or_self_stream_where<P>(
        &self,
        predicate: P,
    ) -> FilteredElements<PreOrderElements<Self>, P>
    where
        P: Fn(&Self) -> bool,
    {
        FilteredElements::new(self.descendant_element_or_self_stream(), predicate)
    }

    /// All descendant elements, in document pre-order, excluding this element
    fn descendant_element_stream(&self) -> PreOrderElements<Self> {
        PreOrderElements::below(self)
    }

    /// Pre-order walk excluding this element, filtered by the predicate
    fn descendant_element_stream_where<P>(
        &self,
        predicate: P,
    ) -> FilteredElements<PreOrderElements<Self>, P>
    where
        P: Fn(&Self) -> bool,
    {
        FilteredElements::new(self.descendant_element_stream(), predicate)
    }

    /// The topmost matching elements of the walk rooted at this element
    ///
    /// At each match the element is emitted and its subtree is not entered,
    /// so no emitted element is a descendant of another.
    fn topmost_descendant_element_or_self_stream<P>(&self, predicate: P) -> TopmostElements<Self, P>
    where
        P: Fn(&Self) -> bool,
    {
        TopmostElements::including(self.clone(), predicate)
    }

    /// Topmost matching elements strictly below this element
    fn topmost_descendant_element_stream<P>(&self, predicate: P) -> TopmostElements<Self, P>
    where
        P: Fn(&Self) -> bool,
    {
        TopmostElements::below(self, predicate)
    }

    /// First element of the filtered pre-order walk including this element
    fn find_descendant_element_or_self<P>(&self, predicate: P) -> Option<Self>
    where
        P: Fn(&Self) -> bool,
    {
        self.descendant_element_or_self_stream().find(|e| predicate(e))
    }
}

impl ElementApi for Element {
    fn name(&self) -> &QName {
        Element::name(self)
    }

    fn attributes(&self) -> &AttributeMap {
        Element::attributes(self)
    }

    fn child_nodes(&self) -> Vec<ChildNodeView<'_, Self>> {
        self.children()
            .iter()
            .map(|child| match child {
                Node::Element(e) => ChildNodeView::Element(e.clone()),
                Node::Text(t) => ChildNodeView::Text(t),
                Node::Comment(c) => ChildNodeView::Comment(c),
                Node::ProcessingInstruction(pi) => ChildNodeView::ProcessingInstruction(pi),
            })
            .collect()
    }
}
