//! Navigation paths
//!
//! A `NavigationPath` addresses an element relative to a root by a sequence
//! of zero-based child-element indices. Indices count element children only,
//! skipping text, comment and processing-instruction siblings. The empty
//! path addresses the root element itself.

use std::fmt;

/// Immutable sequence of child-element indices
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NavigationPath {
    entries: Vec<usize>,
}

impl NavigationPath {
    /// The empty path, addressing the root element itself
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a path from a sequence of child-element indices
    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            entries: indices.into_iter().collect(),
        }
    }

    /// True when this path addresses the root itself
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of steps in the path
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The child-element indices, outermost first
    pub fn indices(&self) -> &[usize] {
        &self.entries
    }

    /// First (outermost) index, if any
    pub fn first(&self) -> Option<usize> {
        self.entries.first().copied()
    }

    /// Last (innermost) index, if any
    pub fn last(&self) -> Option<usize> {
        self.entries.last().copied()
    }

    /// New path with the given index appended (one level deeper)
    pub fn append(&self, index: usize) -> Self {
        let mut entries = self.entries.clone();
        entries.push(index);
        Self { entries }
    }

    /// New path with the given index prepended (rebased one level up)
    pub fn prepend(&self, index: usize) -> Self {
        let mut entries = Vec::with_capacity(self.entries.len() + 1);
        entries.push(index);
        entries.extend_from_slice(&self.entries);
        Self { entries }
    }

    /// New path without the first (outermost) step
    ///
    /// The empty path is returned unchanged.
    pub fn without_first(&self) -> Self {
        Self {
            entries: self.entries.iter().skip(1).copied().collect(),
        }
    }

    /// New path without the last (innermost) step
    ///
    /// The empty path is returned unchanged.
    pub fn without_last(&self) -> Self {
        let mut entries = self.entries.clone();
        entries.pop();
        Self { entries }
    }
}

impl fmt::Display for NavigationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, index) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", index)?;
        }
        write!(f, "]")
    }
}

impl FromIterator<usize> for NavigationPath {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self::from_indices(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path() {
        let path = NavigationPath::empty();
        assert!(path.is_empty());
        assert_eq!(path.len(), 0);
        assert_eq!(path.first(), None);
        assert_eq!(path.last(), None);
    }

    #[test]
    fn test_append_and_prepend() {
        let path = NavigationPath::empty().append(1).append(2);
        assert_eq!(path.indices(), &[1, 2]);

        let path = path.prepend(0);
        assert_eq!(path.indices(), &[0, 1, 2]);
    }

    #[test]
    fn test_without_first_and_last() {
        let path = NavigationPath::from_indices([0, 1, 2]);
        assert_eq!(path.without_first().indices(), &[1, 2]);
        assert_eq!(path.without_last().indices(), &[0, 1]);

        assert!(NavigationPath::empty().without_first().is_empty());
        assert!(NavigationPath::empty().without_last().is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(NavigationPath::empty().to_string(), "[]");
        assert_eq!(NavigationPath::from_indices([0, 3]).to_string(), "[0, 3]");
    }

    #[test]
    fn test_operations_return_new_paths() {
        let path = NavigationPath::from_indices([1]);
        let _ = path.append(2);
        assert_eq!(path.indices(), &[1]);
    }
}
