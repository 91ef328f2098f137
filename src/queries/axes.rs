//! Axis iterators
//!
//! Each axis is a plain state machine: the pre-order walks keep an explicit
//! stack of elements still to visit. Every iterator is freshly constructed
//! per call and owns its state, so consumers can hold several walks over the
//! same tree at once.

use super::{ChildNodeView, ElementApi};

/// Collect the element children of an element as owned handles
pub(crate) fn child_elements_of<E: ElementApi>(element: &E) -> Vec<E> {
    element
        .child_nodes()
        .into_iter()
        .filter_map(|child| match child {
            ChildNodeView::Element(e) => Some(e),
            _ => None,
        })
        .collect()
}

/// Singleton (or empty) stream over the element itself
#[derive(Debug)]
pub struct SelfElements<E> {
    element: Option<E>,
}

impl<E> SelfElements<E> {
    pub(crate) fn new(element: Option<E>) -> Self {
        Self { element }
    }
}

impl<E> Iterator for SelfElements<E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        self.element.take()
    }
}

/// Stream over the element children, in document order
#[derive(Debug)]
pub struct ChildElements<E> {
    children: std::vec::IntoIter<E>,
}

impl<E> ChildElements<E> {
    pub(crate) fn new(children: Vec<E>) -> Self {
        Self {
            children: children.into_iter(),
        }
    }
}

impl<E> Iterator for ChildElements<E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        self.children.next()
    }
}

/// Document pre-order walk over descendant elements
///
/// The stack holds elements not yet visited; children are pushed in reverse
/// so the leftmost child is popped first.
#[derive(Debug)]
pub struct PreOrderElements<E> {
    stack: Vec<E>,
}

impl<E: ElementApi> PreOrderElements<E> {
    /// Walk including the root itself
    pub(crate) fn including(root: E) -> Self {
        Self { stack: vec![root] }
    }

    /// Walk over strict descendants only
    pub(crate) fn below(root: &E) -> Self {
        let mut stack = child_elements_of(root);
        stack.reverse();
        Self { stack }
    }
}

impl<E: ElementApi> Iterator for PreOrderElements<E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        let element = self.stack.pop()?;
        let mut children = child_elements_of(&element);
        children.reverse();
        self.stack.extend(children);
        Some(element)
    }
}

/// Pre-order walk that emits matching elements without descending into them
///
/// The output is the maximal antichain of matches: no emitted element is a
/// descendant of another emitted element.
#[derive(Debug)]
pub struct TopmostElements<E, P> {
    stack: Vec<E>,
    predicate: P,
}

impl<E: ElementApi, P: Fn(&E) -> bool> TopmostElements<E, P> {
    /// Walk including the root itself
    pub(crate) fn including(root: E, predicate: P) -> Self {
        Self {
            stack: vec![root],
            predicate,
        }
    }

    /// Walk over strict descendants only
    pub(crate) fn below(root: &E, predicate: P) -> Self {
        let mut stack = child_elements_of(root);
        stack.reverse();
        Self { stack, predicate }
    }
}

impl<E: ElementApi, P: Fn(&E) -> bool> Iterator for TopmostElements<E, P> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        while let Some(element) = self.stack.pop() {
            if (self.predicate)(&element) {
                return Some(element);
            }
            let mut children = child_elements_of(&element);
            children.reverse();
            self.stack.extend(children);
        }
        None
    }
}

/// Predicate-filtered wrapper over any element stream
#[derive(Debug)]
pub struct FilteredElements<I, P> {
    inner: I,
    predicate: P,
}

impl<I, P> FilteredElements<I, P> {
    pub(crate) fn new(inner: I, predicate: P) -> Self {
        Self { inner, predicate }
    }
}

impl<E, I, P> Iterator for FilteredElements<I, P>
where
    I: Iterator<Item = E>,
    P: Fn(&E) -> bool,
{
    type Item = E;

    fn next(&mut self) -> Option<E> {
        self.inner.by_ref().find(|element| (self.predicate)(element))
    }
}
