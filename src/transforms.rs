//! Functional transformations
//!
//! Every operation here returns a new element and leaves the receiver
//! untouched; unchanged subtrees are shared between the old and new trees.
//! Bulk rewrites run bottom-up (post-order): a callback always sees an
//! element whose children have already been rewritten. A top-down pass is
//! expressible by composing [`Element::transform_child_elements`] with
//! recursion in the callback.

use crate::error::{Error, Result};
use crate::names::QName;
use crate::nodes::{AttributeMap, Element, Node, Text};
use crate::paths::NavigationPath;
use crate::scopes::NamespaceScope;

impl Element {
    /// New element with the given name, all other fields shared
    ///
    /// Fails with `Error::UnboundPrefix` when the name's prefix hint
    /// disagrees with this element's scope.
    pub fn with_name(&self, name: QName) -> Result<Element> {
        Element::new(
            name,
            self.attributes().clone(),
            self.scope().clone(),
            self.children().to_vec(),
        )
    }

    /// New element with the given children, all other fields shared
    pub fn with_children(&self, children: Vec<Node>) -> Element {
        Element::new_unchecked(
            self.name().clone(),
            self.attributes().clone(),
            self.scope().clone(),
            children,
        )
    }

    /// New element with the given attributes, all other fields shared
    ///
    /// Fails with `Error::UnboundPrefix` when an attribute name's prefix
    /// hint disagrees with this element's scope.
    pub fn with_attributes(&self, attributes: AttributeMap) -> Result<Element> {
        Element::new(
            self.name().clone(),
            attributes,
            self.scope().clone(),
            self.children().to_vec(),
        )
    }

    /// New element with the given scope; all names are re-checked against it
    pub fn with_scope(&self, scope: NamespaceScope) -> Result<Element> {
        Element::new(
            self.name().clone(),
            self.attributes().clone(),
            scope,
            self.children().to_vec(),
        )
    }

    /// New element with one more child appended
    pub fn plus_child(&self, child: impl Into<Node>) -> Element {
        let mut children = self.children().to_vec();
        children.push(child.into());
        self.with_children(children)
    }

    /// New element with the child appended when present
    pub fn plus_child_option(&self, child: Option<impl Into<Node>>) -> Element {
        match child {
            Some(child) => self.plus_child(child),
            None => self.clone(),
        }
    }

    /// New element with the given children appended
    pub fn plus_children(&self, children: impl IntoIterator<Item = Node>) -> Element {
        let mut all = self.children().to_vec();
        all.extend(children);
        self.with_children(all)
    }

    /// New element with one attribute inserted or replaced
    ///
    /// Fails with `Error::UnboundPrefix` when the attribute name's prefix
    /// hint disagrees with this element's scope.
    pub fn plus_attribute(&self, name: QName, value: impl Into<String>) -> Result<Element> {
        let mut attributes = self.attributes().clone();
        attributes.insert(name, value.into());
        self.with_attributes(attributes)
    }

    /// Replace every child by the node list the callback produces
    ///
    /// The child count may change; non-element children may be rewritten.
    pub fn transform_children_to_node_lists<F>(&self, f: F) -> Element
    where
        F: Fn(&Node) -> Vec<Node>,
    {
        let children = self.children().iter().flat_map(|child| f(child)).collect();
        self.with_children(children)
    }

    /// Replace every element child by a node list; other children pass through
    pub fn transform_child_elements_to_node_lists<F>(&self, f: F) -> Element
    where
        F: Fn(&Element) -> Vec<Node>,
    {
        let children = self
            .children()
            .iter()
            .flat_map(|child| match child {
                Node::Element(e) => f(e),
                other => vec![other.clone()],
            })
            .collect();
        self.with_children(children)
    }

    /// Rewrite every element child one-to-one; other children pass through
    pub fn transform_child_elements<F>(&self, f: F) -> Element
    where
        F: Fn(&Element) -> Element,
    {
        let children = self
            .children()
            .iter()
            .map(|child| match child {
                Node::Element(e) => Node::Element(f(e)),
                other => other.clone(),
            })
            .collect();
        self.with_children(children)
    }

    /// Apply the callback to every descendant element and to this element,
    /// bottom-up
    pub fn transform_descendant_elements_or_self<F>(&self, f: F) -> Element
    where
        F: Fn(&Element) -> Element,
    {
        fn go<F: Fn(&Element) -> Element>(element: &Element, f: &F) -> Element {
            let rewritten = element.transform_child_elements(|child| go(child, f));
            f(&rewritten)
        }
        go(self, &f)
    }

    /// Apply the callback to every descendant element, bottom-up, leaving
    /// this element's own fields untouched
    pub fn transform_descendant_elements<F>(&self, f: F) -> Element
    where
        F: Fn(&Element) -> Element,
    {
        self.transform_child_elements(|child| child.transform_descendant_elements_or_self(&f))
    }

    /// Fallible bottom-up rewrite; the callback's error propagates unwrapped
    pub fn try_transform_descendant_elements_or_self<Err, F>(
        &self,
        f: &F,
    ) -> std::result::Result<Element, Err>
    where
        F: Fn(&Element) -> std::result::Result<Element, Err>,
    {
        let mut children = Vec::with_capacity(self.children().len());
        for child in self.children() {
            match child {
                Node::Element(e) => {
                    children.push(Node::Element(e.try_transform_descendant_elements_or_self(f)?))
                }
                other => children.push(other.clone()),
            }
        }
        f(&self.with_children(children))
    }

    /// Apply the callback at each of the given navigation paths
    ///
    /// Paths are applied deepest first, so an update never invalidates a
    /// shallower path in the same batch. Fails with `Error::PathOutOfRange`
    /// when a path does not resolve in the current (post-previous-update)
    /// structure.
    pub fn update_elements<F>(&self, paths: &[NavigationPath], f: F) -> Result<Element>
    where
        F: Fn(&NavigationPath, &Element) -> Element,
    {
        let mut ordered: Vec<&NavigationPath> = paths.iter().collect();
        ordered.sort_by(|a, b| b.len().cmp(&a.len()));

        let mut element = self.clone();
        for path in ordered {
            element = update_at(&element, path, path.indices(), &f)?;
        }
        Ok(element)
    }

    /// Remove whitespace-only text children that sit between elements
    ///
    /// Recursively, every element that has at least one element child and
    /// whose text children are all whitespace-only loses those text
    /// children. Elements with text-only content are untouched. The
    /// `xml:space` attribute is not honored.
    pub fn remove_inter_element_whitespace(&self) -> Element {
        self.transform_descendant_elements_or_self(|element| {
            let has_element_child = element.children().iter().any(Node::is_element);
            if !has_element_child {
                return element.clone();
            }
            let text_all_whitespace = element
                .children()
                .iter()
                .filter_map(Node::as_text)
                .all(Text::is_whitespace_only);
            if !text_all_whitespace {
                return element.clone();
            }
            let children = element
                .children()
                .iter()
                .filter(|child| !child.is_text())
                .cloned()
                .collect();
            element.with_children(children)
        })
    }

    /// Rewrite descendant scopes so that no prefix bound in `start_scope`
    /// (or in an ancestor) ever becomes unbound further down
    ///
    /// The default namespace is not pushed down, since re-introducing it
    /// under an element that dropped it would change how unprefixed names
    /// serialize. The Clark projection is invariant under this rewrite.
    pub fn not_undeclaring_prefixes(&self, start_scope: &NamespaceScope) -> Element {
        let scope = start_scope.without_default_namespace().union(self.scope());
        let element = Element::new_unchecked(
            self.name().clone(),
            self.attributes().clone(),
            scope.clone(),
            self.children().to_vec(),
        );
        element.transform_child_elements(|child| child.not_undeclaring_prefixes(&scope))
    }
}

fn update_at<F>(
    element: &Element,
    full_path: &NavigationPath,
    remaining: &[usize],
    f: &F,
) -> Result<Element>
where
    F: Fn(&NavigationPath, &Element) -> Element,
{
    let Some((&index, rest)) = remaining.split_first() else {
        return Ok(f(full_path, element));
    };

    let mut elements_seen = 0;
    let mut children = element.children().to_vec();
    for slot in 0..children.len() {
        if let Node::Element(child) = &children[slot] {
            if elements_seen == index {
                let updated = update_at(child, full_path, rest, f)?;
                children[slot] = Node::Element(updated);
                return Ok(element.with_children(children));
            }
            elements_seen += 1;
        }
    }
    Err(Error::PathOutOfRange(format!(
        "no child element {} under '{}' for path {}",
        index,
        element.name(),
        full_path
    )))
}
