//! # immuxml
//!
//! Immutable, namespace-faithful XML trees with functional transformation
//! and composable queries.
//!
//! Every node is a deeply immutable value: updates return new trees that
//! share unchanged subtrees with the original, and any tree, scope or path
//! can be handed across threads without coordination. Each element carries
//! its own namespace scope, and the scope algebra (resolution,
//! relativization, syntactic-name interpretation) follows the XML
//! Namespaces recommendation, including the asymmetry between element and
//! attribute names.
//!
//! ## Example
//!
//! ```rust
//! use immuxml::{parse_document, predicates, ElementApi};
//!
//! let doc = parse_document(r#"<root xmlns="urn:ex"><item/><item/></root>"#)?;
//! let root = doc.document_element();
//!
//! let items = root
//!     .descendant_element_stream_where(predicates::has_namespace_and_local_name("urn:ex", "item"))
//!     .count();
//! assert_eq!(items, 2);
//!
//! // Trees compare by their prefix-free Clark projection.
//! let other = immuxml::parse_document(r#"<e:root xmlns:e="urn:ex"><e:item/><e:item/></e:root>"#)?;
//! assert_eq!(root.to_clark(), other.document_element().to_clark());
//! # Ok::<(), immuxml::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod names;
pub mod paths;
pub mod scopes;

// Tree model
pub mod clark;
pub mod nodes;
mod transforms;

// Queries
pub mod queries;

// Views
pub mod ancestry;

// Event protocol and I/O
pub mod events;
pub mod parsing;
pub mod serializing;

// Re-exports for convenience
pub use ancestry::IndexedElement;
pub use clark::{default_eq, default_eq_nodes, ClarkElement, ClarkNode};
pub use error::{Error, Result};
pub use events::{EventAttribute, TreeBuilder, WhitespacePolicy, XmlEvent};
pub use names::QName;
pub use nodes::{
    AttributeMap, Comment, Document, Element, ElementBuilder, Node, ProcessingInstruction, Text,
};
pub use parsing::{parse_document, parse_document_bytes, parse_document_with, ParseOptions};
pub use paths::NavigationPath;
pub use queries::{predicates, ChildNodeView, ElementApi};
pub use scopes::{without_prefixed_namespace_undeclarations, Declarations, NamespaceScope};
pub use serializing::{serialize_document, serialize_element};

/// Version of the immuxml library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The reserved XML namespace, always bound to the `xml` prefix
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// The namespace of namespace declarations themselves; never usable as a
/// binding
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// The reserved `xml` prefix
pub const XML_PREFIX: &str = "xml";

/// The reserved `xmlns` prefix
pub const XMLNS_PREFIX: &str = "xmlns";
