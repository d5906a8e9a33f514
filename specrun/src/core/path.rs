//! Position addressing for nested specification blocks.
//!
//! A block's address is the sequence of sibling indices on the route from
//! the suite root down to the block: the root is `[]`, its second child is
//! `[1]`, that child's first child is `[1.0]`. Addresses are stable across
//! runs because suite bodies declare their blocks deterministically.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of one specification block within its suite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpecPath(Vec<usize>);

impl SpecPath {
    /// The suite root's address: the empty sequence.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Address of the child with the given sibling index.
    pub fn append(&self, child_index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(child_index);
        Self(indices)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of edges between the root and this block.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The block's index among its siblings; `None` for the root.
    pub fn last_index(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// The sibling index this path takes at the given depth.
    pub fn index_at(&self, depth: usize) -> Option<usize> {
        self.0.get(depth).copied()
    }

    /// Whether this block lies on the route to `target`: it is `target`
    /// itself or one of its ancestors.
    pub fn is_on(&self, target: &SpecPath) -> bool {
        self.0.len() <= target.0.len() && target.0[..self.0.len()] == self.0[..]
    }

    /// Whether this block is a strict descendant of `target`.
    pub fn is_beyond(&self, target: &SpecPath) -> bool {
        self.0.len() > target.0.len() && self.0[..target.0.len()] == target.0[..]
    }
}

impl fmt::Display for SpecPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (position, index) in self.0.iter().enumerate() {
            if position > 0 {
                write!(f, ".")?;
            }
            write!(f, "{index}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_empty_and_has_no_last_index() {
        let root = SpecPath::root();
        assert!(root.is_root());
        assert_eq!(root.depth(), 0);
        assert_eq!(root.last_index(), None);
    }

    #[test]
    fn append_extends_and_keeps_parent_unchanged() {
        let parent = SpecPath::root().append(2);
        let child = parent.append(0);
        assert_eq!(parent.depth(), 1);
        assert_eq!(child.depth(), 2);
        assert_eq!(child.last_index(), Some(0));
        assert_eq!(child.index_at(0), Some(2));
    }

    #[test]
    fn ancestors_and_self_are_on_target_path() {
        let target = SpecPath::root().append(1).append(2);
        assert!(SpecPath::root().is_on(&target));
        assert!(SpecPath::root().append(1).is_on(&target));
        assert!(target.is_on(&target));
    }

    #[test]
    fn siblings_are_not_on_target_path() {
        let target = SpecPath::root().append(1);
        assert!(!SpecPath::root().append(0).is_on(&target));
        assert!(!SpecPath::root().append(1).append(0).is_on(&target));
    }

    #[test]
    fn descendants_are_beyond_target() {
        let target = SpecPath::root().append(1);
        assert!(target.append(0).is_beyond(&target));
        assert!(target.append(2).append(5).is_beyond(&target));
        assert!(!target.is_beyond(&target));
        assert!(!SpecPath::root().append(0).append(0).is_beyond(&target));
    }

    #[test]
    fn root_is_never_beyond_anything() {
        assert!(!SpecPath::root().is_beyond(&SpecPath::root()));
        assert!(!SpecPath::root().is_beyond(&SpecPath::root().append(0)));
    }

    #[test]
    fn display_renders_dotted_indices() {
        assert_eq!(SpecPath::root().to_string(), "[]");
        assert_eq!(SpecPath::root().append(0).append(2).to_string(), "[0.2]");
    }
}
