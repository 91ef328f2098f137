//! XML namespace scopes
//!
//! This module provides the `NamespaceScope` type: the set of
//! (prefix -> namespace URI) bindings in force at an element, with the
//! algebra needed for faithful namespace handling: resolution of
//! declarations, relativization between scopes, and interpretation of
//! syntactic QNames.
//!
//! A scope never stores the reserved `xml` binding (it is implicit and
//! immutable) and never accepts `xmlns` as a prefix. The empty string is a
//! legal prefix and denotes the default namespace.

use crate::error::{Error, Result};
use crate::names::{is_valid_ncname, QName};
use crate::{XML_NAMESPACE, XML_PREFIX, XMLNS_PREFIX};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Prefix -> namespace URI mapping used as input/output of scope algebra.
///
/// An empty value is an undeclaration: applying it removes the binding.
pub type Declarations = IndexMap<String, String>;

/// The canonical empty scope
static EMPTY_SCOPE: Lazy<NamespaceScope> = Lazy::new(|| NamespaceScope {
    bindings: Arc::new(IndexMap::new()),
});

/// Immutable mapping from prefix to namespace URI
///
/// The empty prefix denotes the default namespace. All stored values are
/// non-empty; undeclarations exist only transiently inside `Declarations`
/// and are applied by removal.
#[derive(Debug, Clone)]
pub struct NamespaceScope {
    bindings: Arc<IndexMap<String, String>>,
}

impl NamespaceScope {
    /// The canonical empty scope
    pub fn empty() -> Self {
        EMPTY_SCOPE.clone()
    }

    /// Build a scope from explicit declarations
    ///
    /// A correct explicit `("xml", reserved URI)` entry is permitted and
    /// stripped. Fails with `ReservedPrefixMisuse` for a mismatched `xml`
    /// binding, `InvalidPrefix` for an `xmlns` key or a non-NCName prefix,
    /// and `EmptyNamespaceValue` for an empty URI.
    pub fn from_declarations<K, V, I>(declarations: I) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut bindings = IndexMap::new();
        for (prefix, namespace) in declarations {
            let prefix = prefix.into();
            let namespace = namespace.into();
            check_prefix(&prefix)?;
            if prefix == XML_PREFIX {
                if namespace != XML_NAMESPACE {
                    return Err(Error::ReservedPrefixMisuse(format!(
                        "prefix 'xml' bound to '{}'",
                        namespace
                    )));
                }
                continue;
            }
            if namespace.is_empty() {
                return Err(Error::EmptyNamespaceValue(prefix));
            }
            bindings.insert(prefix, namespace);
        }
        Ok(Self {
            bindings: Arc::new(bindings),
        })
    }

    /// True when no prefix is bound
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Number of bindings in the scope
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Iterate over the (prefix, namespace) bindings
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(p, ns)| (p.as_str(), ns.as_str()))
    }

    /// The namespace bound to the empty prefix, if any
    pub fn default_namespace(&self) -> Option<&str> {
        self.bindings.get("").map(|s| s.as_str())
    }

    /// Look up the namespace of a prefix
    ///
    /// The reserved `xml` prefix always resolves, regardless of the scope's
    /// contents.
    pub fn namespace_of_prefix(&self, prefix: &str) -> Option<&str> {
        if prefix == XML_PREFIX {
            return Some(XML_NAMESPACE);
        }
        self.bindings.get(prefix).map(|s| s.as_str())
    }

    /// Apply a single (un-)declaration, returning the resulting scope
    ///
    /// An empty namespace removes the binding. Both default and prefixed
    /// undeclarations are permitted here; callers targeting XML 1.0 must
    /// sanitize with [`without_prefixed_namespace_undeclarations`] before
    /// serialization. Resolving an already-present binding returns the same
    /// instance.
    pub fn resolve(&self, prefix: &str, namespace: &str) -> Result<Self> {
        check_prefix(prefix)?;
        if prefix == XML_PREFIX {
            if namespace != XML_NAMESPACE {
                return Err(Error::ReservedPrefixMisuse(format!(
                    "prefix 'xml' bound to '{}'",
                    namespace
                )));
            }
            return Ok(self.clone());
        }
        if namespace.is_empty() {
            if !self.bindings.contains_key(prefix) {
                return Ok(self.clone());
            }
            let mut bindings = (*self.bindings).clone();
            bindings.shift_remove(prefix);
            return Ok(Self {
                bindings: Arc::new(bindings),
            });
        }
        if self.bindings.get(prefix).map(|s| s.as_str()) == Some(namespace) {
            return Ok(self.clone());
        }
        let mut bindings = (*self.bindings).clone();
        bindings.insert(prefix.to_string(), namespace.to_string());
        Ok(Self {
            bindings: Arc::new(bindings),
        })
    }

    /// Fold [`NamespaceScope::resolve`] over a set of declarations
    pub fn resolve_all(&self, declarations: &Declarations) -> Result<Self> {
        let mut scope = self.clone();
        for (prefix, namespace) in declarations {
            scope = scope.resolve(prefix, namespace)?;
        }
        Ok(scope)
    }

    /// Drop the default-namespace binding, if present
    pub fn without_default_namespace(&self) -> Self {
        self.without_prefix("")
    }

    /// Drop the binding for the given prefix, if present
    pub fn without_prefix(&self, prefix: &str) -> Self {
        if !self.bindings.contains_key(prefix) {
            return self.clone();
        }
        let mut bindings = (*self.bindings).clone();
        bindings.shift_remove(prefix);
        Self {
            bindings: Arc::new(bindings),
        }
    }

    /// The smallest set of (un-)declarations turning `self` into `other`
    ///
    /// For all scopes `a` and `b`:
    /// `a.resolve_all(&a.relativize(&b))` equals `b`. The result may contain
    /// prefixed undeclarations, which XML 1.0 forbids in markup; sanitize
    /// with [`without_prefixed_namespace_undeclarations`] where that matters.
    pub fn relativize(&self, other: &NamespaceScope) -> Declarations {
        let mut declarations = Declarations::new();
        for (prefix, namespace) in other.bindings.iter() {
            if self.bindings.get(prefix) != Some(namespace) {
                declarations.insert(prefix.clone(), namespace.clone());
            }
        }
        for prefix in self.bindings.keys() {
            if !other.bindings.contains_key(prefix) {
                declarations.insert(prefix.clone(), String::new());
            }
        }
        declarations
    }

    /// Combine two scopes; bindings of `other` win on conflict
    pub fn union(&self, other: &NamespaceScope) -> NamespaceScope {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut bindings = (*self.bindings).clone();
        for (prefix, namespace) in other.bindings.iter() {
            bindings.insert(prefix.clone(), namespace.clone());
        }
        Self {
            bindings: Arc::new(bindings),
        }
    }

    /// True when every binding of `self` appears unchanged in `other`
    pub fn sub_scope_of(&self, other: &NamespaceScope) -> bool {
        self.bindings
            .iter()
            .all(|(prefix, namespace)| other.bindings.get(prefix) == Some(namespace))
    }

    /// Resolve a syntactic element name against this scope
    ///
    /// An unprefixed name takes the default namespace, if one is bound.
    pub fn resolve_element_qname(&self, name: &str) -> Result<QName> {
        self.resolve_syntactic_qname(name, true)
    }

    /// Resolve a syntactic attribute name against this scope
    ///
    /// An unprefixed attribute name is always in no-namespace: the default
    /// namespace does not apply to attributes.
    pub fn resolve_attribute_qname(&self, name: &str) -> Result<QName> {
        self.resolve_syntactic_qname(name, false)
    }

    /// Resolve a syntactic QName appearing in element content
    ///
    /// Same rules as element names.
    pub fn resolve_content_qname(&self, name: &str) -> Result<QName> {
        self.resolve_syntactic_qname(name, true)
    }

    fn resolve_syntactic_qname(&self, name: &str, use_default: bool) -> Result<QName> {
        let (prefix, local) = split_syntactic_qname(name)?;
        match prefix {
            None => {
                let namespace = if use_default {
                    self.default_namespace()
                } else {
                    None
                };
                QName::new(namespace, local)
            }
            Some(prefix) => {
                let namespace = self
                    .namespace_of_prefix(prefix)
                    .ok_or_else(|| Error::UnboundPrefix(prefix.to_string()))?;
                QName::prefixed(namespace, local, prefix)
            }
        }
    }
}

impl Default for NamespaceScope {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for NamespaceScope {
    fn eq(&self, other: &Self) -> bool {
        self.bindings == other.bindings
    }
}

impl Eq for NamespaceScope {}

/// Remove prefixed undeclarations from a set of declarations
///
/// The only undeclaration XML 1.0 permits is that of the default namespace;
/// this strips entries with an empty value and a non-empty key.
pub fn without_prefixed_namespace_undeclarations(declarations: &Declarations) -> Declarations {
    declarations
        .iter()
        .filter(|(prefix, namespace)| !(namespace.is_empty() && !prefix.is_empty()))
        .map(|(prefix, namespace)| (prefix.clone(), namespace.clone()))
        .collect()
}

/// Split a syntactic QName into optional prefix and local part
///
/// Fails with `MalformedQName` when the string is empty, has more than one
/// colon, or either part is not an NCName.
pub fn split_syntactic_qname(name: &str) -> Result<(Option<&str>, &str)> {
    if name.is_empty() {
        return Err(Error::MalformedQName("empty name".to_string()));
    }
    match name.split_once(':') {
        None => {
            if !is_valid_ncname(name) {
                return Err(Error::MalformedQName(name.to_string()));
            }
            Ok((None, name))
        }
        Some((prefix, local)) => {
            if !is_valid_ncname(prefix) || !is_valid_ncname(local) {
                return Err(Error::MalformedQName(name.to_string()));
            }
            Ok((Some(prefix), local))
        }
    }
}

fn check_prefix(prefix: &str) -> Result<()> {
    if prefix == XMLNS_PREFIX {
        return Err(Error::InvalidPrefix(XMLNS_PREFIX.to_string()));
    }
    if !prefix.is_empty() && !is_valid_ncname(prefix) {
        return Err(Error::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}
