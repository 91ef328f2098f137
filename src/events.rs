//! Event-sink ingestion and event-source emission
//!
//! The tree model is populated from, and rendered back into, an ordered
//! stream of SAX-shaped [`XmlEvent`]s. Any producer can drive the
//! [`TreeBuilder`] sink; the quick-xml adapter in [`crate::parsing`] is one
//! such producer. Emission is symmetric: at each element boundary the
//! parent scope is relativized against the child scope, sanitized for
//! XML 1.0, and rendered as prefix-mapping events.

use crate::error::{Error, Result};
use crate::names::QName;
use crate::nodes::{
    AttributeMap, Comment, Document, Element, Node, ProcessingInstruction, Text,
};
use crate::scopes::{without_prefixed_namespace_undeclarations, Declarations, NamespaceScope};
use url::Url;

/// One attribute as supplied by the event source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventAttribute {
    /// Namespace URI, when the source resolved it
    pub namespace: Option<String>,
    /// Local name
    pub local_name: String,
    /// Prefix the attribute was written with
    pub prefix: Option<String>,
    /// Attribute value
    pub value: String,
}

/// One event of the ingestion/emission protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// Document start, with an optional base URI
    StartDocument {
        /// Base URI of the document being ingested
        base_uri: Option<Url>,
    },
    /// Declare (or undeclare, with an empty URI) a prefix for the element
    /// about to start and its descendants
    StartPrefixMapping {
        /// Prefix; empty for the default namespace
        prefix: String,
        /// Namespace URI; empty to undeclare
        namespace: String,
    },
    /// Element start
    ///
    /// The namespace may be omitted when the source does not resolve names
    /// itself; the sink then resolves `prefix`/`local_name` against the
    /// scope in force.
    StartElement {
        /// Namespace URI, when the source resolved it
        namespace: Option<String>,
        /// Local name
        local_name: String,
        /// Prefix the element was written with
        prefix: Option<String>,
        /// Attributes, without namespace declarations
        attributes: Vec<EventAttribute>,
    },
    /// Element end
    EndElement {
        /// Namespace URI, when the source resolved it
        namespace: Option<String>,
        /// Local name
        local_name: String,
        /// Prefix the element was written with
        prefix: Option<String>,
    },
    /// End of a prefix mapping opened for the element just closed
    EndPrefixMapping {
        /// Prefix; empty for the default namespace
        prefix: String,
    },
    /// Character data
    Characters {
        /// Text value
        value: String,
        /// True when the text was written as a CDATA section
        cdata: bool,
    },
    /// Comment
    Comment(String),
    /// Processing instruction
    ProcessingInstruction {
        /// PI target
        target: String,
        /// PI data
        data: String,
    },
    /// Document end
    EndDocument,
}

/// Inter-element whitespace handling during ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhitespacePolicy {
    /// Keep all text exactly as reported
    #[default]
    Preserve,
    /// Remove whitespace-only text between elements after construction
    Strip,
}

#[derive(Debug)]
struct OpenElement {
    name: QName,
    attributes: AttributeMap,
    scope: NamespaceScope,
    children: Vec<Node>,
}

/// Event sink assembling a [`Document`]
///
/// Feed events with [`TreeBuilder::push`] in protocol order, then call
/// [`TreeBuilder::finish`]. The builder maintains the namespace scope stack
/// and resolves names the source did not resolve itself.
#[derive(Debug)]
pub struct TreeBuilder {
    policy: WhitespacePolicy,
    base_uri: Option<Url>,
    pending_mappings: Declarations,
    open: Vec<OpenElement>,
    document_children: Vec<Node>,
}

impl TreeBuilder {
    /// New builder preserving whitespace
    pub fn new() -> Self {
        Self::with_policy(WhitespacePolicy::Preserve)
    }

    /// New builder with the given whitespace policy
    pub fn with_policy(policy: WhitespacePolicy) -> Self {
        Self {
            policy,
            base_uri: None,
            pending_mappings: Declarations::new(),
            open: Vec::new(),
            document_children: Vec::new(),
        }
    }

    /// Consume one event
    ///
    /// Fails with `Error::Parser` on protocol violations, and with the
    /// name/scope errors of the underlying model when the event data is
    /// inconsistent. The first failure aborts the ingest; the builder must
    /// then be discarded.
    pub fn push(&mut self, event: XmlEvent) -> Result<()> {
        match event {
            XmlEvent::StartDocument { base_uri } => {
                self.base_uri = base_uri;
                Ok(())
            }
            XmlEvent::StartPrefixMapping { prefix, namespace } => {
                self.pending_mappings.insert(prefix, namespace);
                Ok(())
            }
            XmlEvent::StartElement {
                namespace,
                local_name,
                prefix,
                attributes,
            } => self.start_element(namespace, local_name, prefix, attributes),
            XmlEvent::EndElement { .. } => self.end_element(),
            XmlEvent::EndPrefixMapping { .. } => Ok(()),
            XmlEvent::Characters { value, cdata } => self.characters(value, cdata),
            XmlEvent::Comment(value) => {
                self.append(Node::Comment(Comment::new(value)));
                Ok(())
            }
            XmlEvent::ProcessingInstruction { target, data } => {
                self.append(Node::ProcessingInstruction(ProcessingInstruction::new(
                    target, data,
                )));
                Ok(())
            }
            XmlEvent::EndDocument => Ok(()),
        }
    }

    /// Finish ingestion and produce the document
    pub fn finish(self) -> Result<Document> {
        if !self.open.is_empty() {
            return Err(Error::Parser(format!(
                "{} element(s) left open at end of input",
                self.open.len()
            )));
        }
        let document = Document::new(self.base_uri, self.document_children)?;
        Ok(match self.policy {
            WhitespacePolicy::Preserve => document,
            WhitespacePolicy::Strip => {
                let stripped = document.document_element().remove_inter_element_whitespace();
                document.with_document_element(stripped)
            }
        })
    }

    fn current_scope(&self) -> NamespaceScope {
        self.open
            .last()
            .map(|open| open.scope.clone())
            .unwrap_or_default()
    }

    fn start_element(
        &mut self,
        namespace: Option<String>,
        local_name: String,
        prefix: Option<String>,
        attributes: Vec<EventAttribute>,
    ) -> Result<()> {
        let mappings = std::mem::take(&mut self.pending_mappings);
        let scope = self.current_scope().resolve_all(&mappings)?;

        let name = resolve_name(&scope, namespace, &local_name, prefix.as_deref(), true)?;
        let mut attribute_map = AttributeMap::new();
        for attribute in attributes {
            let attr_name = resolve_name(
                &scope,
                attribute.namespace,
                &attribute.local_name,
                attribute.prefix.as_deref(),
                false,
            )?;
            attribute_map.insert(attr_name, attribute.value);
        }

        self.open.push(OpenElement {
            name,
            attributes: attribute_map,
            scope,
            children: Vec::new(),
        });
        Ok(())
    }

    fn end_element(&mut self) -> Result<()> {
        let open = self
            .open
            .pop()
            .ok_or_else(|| Error::Parser("element end without matching start".to_string()))?;
        let element = Element::new(open.name, open.attributes, open.scope, open.children)?;
        self.append(Node::Element(element));
        Ok(())
    }

    fn characters(&mut self, value: String, cdata: bool) -> Result<()> {
        match self.open.last_mut() {
            Some(open) => {
                let text = if cdata {
                    Text::cdata(value)
                } else {
                    Text::new(value)
                };
                open.children.push(Node::Text(text));
                Ok(())
            }
            None if value.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n')) => Ok(()),
            None => Err(Error::Parser(
                "character data outside the document element".to_string(),
            )),
        }
    }

    fn append(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(open) => open.children.push(node),
            None => self.document_children.push(node),
        }
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_name(
    scope: &NamespaceScope,
    namespace: Option<String>,
    local_name: &str,
    prefix: Option<&str>,
    is_element: bool,
) -> Result<QName> {
    match (namespace, prefix) {
        (Some(ns), Some(p)) => QName::prefixed(ns, local_name, p),
        (Some(ns), None) => QName::namespaced(ns, local_name),
        (None, Some(p)) => {
            let syntactic = format!("{}:{}", p, local_name);
            if is_element {
                scope.resolve_element_qname(&syntactic)
            } else {
                scope.resolve_attribute_qname(&syntactic)
            }
        }
        (None, None) => {
            if is_element {
                scope.resolve_element_qname(local_name)
            } else {
                scope.resolve_attribute_qname(local_name)
            }
        }
    }
}

/// Emit the full event stream for a document
pub fn document_events(document: &Document) -> Vec<XmlEvent> {
    let mut events = vec![XmlEvent::StartDocument {
        base_uri: document.base_uri().cloned(),
    }];
    for child in document.children() {
        match child {
            Node::Element(element) => {
                events.extend(element_events(element, &NamespaceScope::empty()))
            }
            Node::Comment(comment) => events.push(XmlEvent::Comment(comment.value().to_string())),
            Node::ProcessingInstruction(pi) => events.push(XmlEvent::ProcessingInstruction {
                target: pi.target().to_string(),
                data: pi.data().to_string(),
            }),
            Node::Text(_) => {}
        }
    }
    events.push(XmlEvent::EndDocument);
    events
}

/// Emit the event stream for an element seen from the given parent scope
///
/// The element boundary carries one `StartPrefixMapping` per entry of the
/// sanitized `parent_scope.relativize(element scope)`, mirrored by
/// `EndPrefixMapping` events in reverse order after the element closes.
/// Prefixed undeclarations are stripped, as XML 1.0 cannot express them.
pub fn element_events(element: &Element, parent_scope: &NamespaceScope) -> Vec<XmlEvent> {
    let declarations = parent_scope.relativize(element.scope());
    let declarations = without_prefixed_namespace_undeclarations(&declarations);

    let mut events = Vec::new();
    for (prefix, namespace) in &declarations {
        events.push(XmlEvent::StartPrefixMapping {
            prefix: prefix.clone(),
            namespace: namespace.clone(),
        });
    }

    let attributes = element
        .attributes()
        .iter()
        .map(|(name, value)| EventAttribute {
            namespace: name.namespace().map(str::to_string),
            local_name: name.local_name().to_string(),
            prefix: name.prefix().map(str::to_string),
            value: value.clone(),
        })
        .collect();
    events.push(XmlEvent::StartElement {
        namespace: element.name().namespace().map(str::to_string),
        local_name: element.name().local_name().to_string(),
        prefix: element.name().prefix().map(str::to_string),
        attributes,
    });

    for child in element.children() {
        match child {
            Node::Element(child_element) => {
                events.extend(element_events(child_element, element.scope()))
            }
            Node::Text(text) => events.push(XmlEvent::Characters {
                value: text.value().to_string(),
                cdata: text.is_cdata(),
            }),
            Node::Comment(comment) => events.push(XmlEvent::Comment(comment.value().to_string())),
            Node::ProcessingInstruction(pi) => events.push(XmlEvent::ProcessingInstruction {
                target: pi.target().to_string(),
                data: pi.data().to_string(),
            }),
        }
    }

    events.push(XmlEvent::EndElement {
        namespace: element.name().namespace().map(str::to_string),
        local_name: element.name().local_name().to_string(),
        prefix: element.name().prefix().map(str::to_string),
    });
    for (prefix, _) in declarations.iter().rev() {
        events.push(XmlEvent::EndPrefixMapping {
            prefix: prefix.clone(),
        });
    }
    events
}
