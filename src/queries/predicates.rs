//! Element predicate factory
//!
//! Composable predicates over any [`ElementApi`] implementor. Each factory
//! returns a closure usable with the filtered axis methods, so the same
//! predicate works over native, ancestry-aware and Clark elements.

use super::ElementApi;
use crate::names::QName;

/// Match by full qualified name (namespace + local name)
pub fn has_name<E: ElementApi>(name: QName) -> impl Fn(&E) -> bool {
    move |element| element.name() == &name
}

/// Match by namespace URI and local name
pub fn has_namespace_and_local_name<E: ElementApi>(
    namespace: impl Into<String>,
    local_name: impl Into<String>,
) -> impl Fn(&E) -> bool {
    let namespace = namespace.into();
    let local_name = local_name.into();
    move |element| {
        element.name().namespace() == Some(namespace.as_str())
            && element.name().local_name() == local_name
    }
}

/// Match by local name only, ignoring the namespace
pub fn has_local_name<E: ElementApi>(local_name: impl Into<String>) -> impl Fn(&E) -> bool {
    let local_name = local_name.into();
    move |element| element.name().local_name() == local_name
}

/// Match elements carrying the given attribute
pub fn has_attribute<E: ElementApi>(name: QName) -> impl Fn(&E) -> bool {
    move |element| element.attributes().contains_key(&name)
}

/// Match elements whose attribute has exactly the given value
pub fn has_attribute_value<E: ElementApi>(
    name: QName,
    value: impl Into<String>,
) -> impl Fn(&E) -> bool {
    let value = value.into();
    move |element| element.attribute_option(&name).as_deref() == Some(value.as_str())
}

/// Match elements whose children are all text nodes
pub fn has_only_text<E: ElementApi>() -> impl Fn(&E) -> bool {
    |element| element.has_only_text_children()
}

/// Match elements whose children are all text nodes and whose concatenated
/// text carries no surrounding whitespace
pub fn has_only_stripped_text<E: ElementApi>() -> impl Fn(&E) -> bool {
    |element| {
        if !element.has_only_text_children() {
            return false;
        }
        let text = element.text_content();
        text == text.trim()
    }
}

/// Both predicates must hold
pub fn and<E, P, Q>(p: P, q: Q) -> impl Fn(&E) -> bool
where
    P: Fn(&E) -> bool,
    Q: Fn(&E) -> bool,
{
    move |element| p(element) && q(element)
}

/// Either predicate may hold
pub fn or<E, P, Q>(p: P, q: Q) -> impl Fn(&E) -> bool
where
    P: Fn(&E) -> bool,
    Q: Fn(&E) -> bool,
{
    move |element| p(element) || q(element)
}

/// Negate a predicate
pub fn not<E, P>(p: P) -> impl Fn(&E) -> bool
where
    P: Fn(&E) -> bool,
{
    move |element| !p(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::Element;
    use crate::queries::ElementApi;

    fn sample() -> Element {
        Element::builder("root")
            .declare("", "http://ex")
            .attribute("kind", "demo")
            .child(
                Element::builder("item")
                    .declare("", "http://ex")
                    .text("plain")
                    .build()
                    .unwrap(),
            )
            .child(
                Element::builder("item")
                    .declare("", "http://ex")
                    .text("  padded  ")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_name_predicates() {
        let root = sample();
        let by_qname = has_name(QName::namespaced("http://ex", "item").unwrap());
        let by_pair = has_namespace_and_local_name("http://ex", "item");
        let by_local = has_local_name("item");

        assert_eq!(root.descendant_element_stream_where(&by_qname).count(), 2);
        assert_eq!(root.descendant_element_stream_where(&by_pair).count(), 2);
        assert_eq!(root.descendant_element_stream_where(&by_local).count(), 2);

        let other_ns = has_namespace_and_local_name("http://other", "item");
        assert_eq!(root.descendant_element_stream_where(&other_ns).count(), 0);
    }

    #[test]
    fn test_attribute_predicates() {
        let root = sample();
        let kind = QName::local("kind").unwrap();

        assert!(has_attribute(kind.clone())(&root));
        assert!(has_attribute_value(kind.clone(), "demo")(&root));
        assert!(!has_attribute_value(kind, "other")(&root));
    }

    #[test]
    fn test_text_shape_predicates() {
        let root = sample();
        let items: Vec<Element> = root.child_element_stream().collect();

        assert!(has_only_text::<Element>()(&items[0]));
        assert!(has_only_stripped_text::<Element>()(&items[0]));
        assert!(has_only_text::<Element>()(&items[1]));
        assert!(!has_only_stripped_text::<Element>()(&items[1]));
        assert!(!has_only_text::<Element>()(&root));
    }

    #[test]
    fn test_combinators() {
        let root = sample();
        let item = has_local_name("item");
        let stripped = has_only_stripped_text();

        let both = and(&item, &stripped);
        assert_eq!(root.descendant_element_stream_where(&both).count(), 1);

        let either = or(has_local_name("root"), has_local_name("item"));
        assert_eq!(
            root.descendant_element_or_self_stream_where(&either).count(),
            3
        );

        let none = not(has_local_name("root"));
        assert_eq!(
            root.descendant_element_or_self_stream_where(&none).count(),
            2
        );
    }
}
