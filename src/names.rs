//! XML names: qualified names and their lexical validation
//!
//! This module provides the `QName` type used for element and attribute
//! names, plus validation for NCNames according to the XML Namespaces
//! specification.
//!
//! A `QName` is a (namespace URI, local name) pair with an optional
//! syntactic prefix hint. The hint records how the name was written in
//! markup and is advisory for serialization only: equality and hashing
//! ignore it.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::hash::{Hash, Hasher};

/// NCName pattern (simplified ranges, same shape the XML spec uses)
static NCNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\u{370}-\u{37D}\u{37F}-\u{1FFF}][A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\u{370}-\u{37D}\u{37F}-\u{1FFF}\-\.0-9\u{B7}]*$")
        .unwrap()
});

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    NCNAME.is_match(name)
}

/// Validate an NCName and return an error if invalid
pub fn validate_ncname(name: &str) -> Result<()> {
    if is_valid_ncname(name) {
        Ok(())
    } else {
        Err(Error::InvalidName(format!("invalid NCName: '{}'", name)))
    }
}

/// Qualified name - combination of namespace, local name and an optional
/// prefix hint
///
/// Two names are equal when their namespaces and local names are equal;
/// the prefix hint never participates in equality or hashing.
#[derive(Debug, Clone)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    namespace: Option<String>,
    /// Local name
    local_name: String,
    /// Syntactic prefix hint, used only during serialization
    prefix: Option<String>,
}

impl QName {
    /// Create a new QName
    ///
    /// Fails with `Error::InvalidName` when the local name is empty or
    /// contains a colon.
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Result<Self> {
        let local_name = local_name.into();
        check_local_name(&local_name)?;
        Ok(Self {
            namespace: namespace.map(|s| s.into()),
            local_name,
            prefix: None,
        })
    }

    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Result<Self> {
        Self::new(None::<String>, local_name)
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Result<Self> {
        Self::new(Some(namespace), local_name)
    }

    /// Create a QName with a namespace and a syntactic prefix hint
    pub fn prefixed(
        namespace: impl Into<String>,
        local_name: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Result<Self> {
        let prefix = prefix.into();
        validate_ncname(&prefix)?;
        let mut qname = Self::new(Some(namespace), local_name)?;
        qname.prefix = Some(prefix);
        Ok(qname)
    }

    /// Parse a Clark-notation name: `{namespace}local` or plain `local`
    pub fn from_clark(name: &str) -> Result<Self> {
        if let Some(rest) = name.strip_prefix('{') {
            let (namespace, local) = rest
                .split_once('}')
                .ok_or_else(|| Error::InvalidName(format!("unterminated namespace: '{}'", name)))?;
            Self::namespaced(namespace, local)
        } else {
            Self::local(name)
        }
    }

    /// Get the namespace URI, if any
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Get the local name
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Get the syntactic prefix hint, if any
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Return the same name carrying the given prefix hint
    pub fn with_prefix(&self, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_ncname(&prefix)?;
        Ok(Self {
            namespace: self.namespace.clone(),
            local_name: self.local_name.clone(),
            prefix: Some(prefix),
        })
    }

    /// Return the same name with no prefix hint
    pub fn without_prefix(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            local_name: self.local_name.clone(),
            prefix: None,
        }
    }

    /// Render the name the way it appears in markup: `prefix:local` when a
    /// hint is present, `local` otherwise
    pub fn syntactic_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// True when namespace and local name both match
    pub fn matches(&self, namespace: Option<&str>, local_name: &str) -> bool {
        self.namespace.as_deref() == namespace && self.local_name == local_name
    }
}

fn check_local_name(local_name: &str) -> Result<()> {
    if local_name.is_empty() {
        return Err(Error::InvalidName("empty local name".to_string()));
    }
    if local_name.contains(':') {
        return Err(Error::InvalidName(format!(
            "local name contains a colon: '{}'",
            local_name
        )));
    }
    Ok(())
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.local_name == other.local_name
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.local_name.hash(state);
    }
}

impl fmt::Display for QName {
    /// Clark notation: `{namespace}local`, or the bare local name
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qname_creation() {
        let qname = QName::namespaced("http://example.com", "element").unwrap();
        assert_eq!(qname.namespace(), Some("http://example.com"));
        assert_eq!(qname.local_name(), "element");
        assert_eq!(qname.prefix(), None);
    }

    #[test]
    fn test_qname_rejects_bad_local_names() {
        assert!(QName::local("").is_err());
        assert!(QName::local("a:b").is_err());
        assert!(QName::namespaced("http://example.com", "").is_err());
    }

    #[test]
    fn test_qname_display_clark() {
        let qname = QName::namespaced("http://example.com", "element").unwrap();
        assert_eq!(qname.to_string(), "{http://example.com}element");

        let qname_local = QName::local("element").unwrap();
        assert_eq!(qname_local.to_string(), "element");
    }

    #[test]
    fn test_qname_from_clark() {
        let qname = QName::from_clark("{http://example.com}element").unwrap();
        assert_eq!(qname.namespace(), Some("http://example.com"));
        assert_eq!(qname.local_name(), "element");

        let qname = QName::from_clark("element").unwrap();
        assert_eq!(qname.namespace(), None);

        assert!(QName::from_clark("{http://example.com").is_err());
    }

    #[test]
    fn test_equality_ignores_prefix() {
        let a = QName::prefixed("http://example.com", "element", "p").unwrap();
        let b = QName::namespaced("http://example.com", "element").unwrap();
        let c = QName::prefixed("http://example.com", "element", "q").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);

        let d = QName::namespaced("http://other.com", "element").unwrap();
        assert_ne!(a, d);
    }

    #[test]
    fn test_hash_ignores_prefix() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(QName::prefixed("http://example.com", "element", "p").unwrap());
        assert!(set.contains(&QName::namespaced("http://example.com", "element").unwrap()));
    }

    #[test]
    fn test_matches() {
        let qname = QName::namespaced("http://example.com", "element").unwrap();
        assert!(qname.matches(Some("http://example.com"), "element"));
        assert!(!qname.matches(None, "element"));
        assert!(!qname.matches(Some("http://example.com"), "other"));
    }

    #[test]
    fn test_syntactic_name() {
        let qname = QName::prefixed("http://example.com", "element", "p").unwrap();
        assert_eq!(qname.syntactic_name(), "p:element");

        let qname = QName::local("element").unwrap();
        assert_eq!(qname.syntactic_name(), "element");
    }

    #[test]
    fn test_is_valid_ncname() {
        assert!(is_valid_ncname("element"));
        assert!(is_valid_ncname("_private"));
        assert!(is_valid_ncname("my-element"));
        assert!(is_valid_ncname("element123"));

        assert!(!is_valid_ncname(""));
        assert!(!is_valid_ncname("123start"));
        assert!(!is_valid_ncname("ns:element"));
        assert!(!is_valid_ncname("-hyphen"));
    }

    #[test]
    fn test_prefixed_rejects_bad_prefix() {
        assert!(QName::prefixed("http://example.com", "element", "").is_err());
        assert!(QName::prefixed("http://example.com", "element", "a:b").is_err());
    }
}
