//! Accumulated results across runs, merged into one tree per suite.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::core::path::SpecPath;
use crate::error::SpecError;

/// What one run reports for one executed block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SpecReport {
    pub(crate) name: String,
    pub(crate) path: SpecPath,
    pub(crate) errors: Vec<SpecError>,
}

/// Receives every block of the merged result forest in depth-first order.
pub trait ResultVisitor {
    /// Called once per block with its nesting depth, name, and rendered
    /// error descriptions.
    fn visit_spec(&mut self, nesting: usize, name: &str, errors: &[String]);

    /// Called once after the walk with the final pass and fail counts.
    fn visit_end(&mut self, pass_count: usize, fail_count: usize);
}

/// Merged results for every suite run so far, keyed by suite name.
///
/// Suites iterate in name order; within a suite, children keep sibling
/// order even though runs finish out of order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultCollector {
    roots: BTreeMap<String, ResultNode>,
}

/// One block in a merged result tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultNode {
    pub name: String,
    pub path: SpecPath,
    pub errors: Vec<SpecError>,
    pub children: Vec<ResultNode>,
}

impl ResultCollector {
    /// Merge one executed block into the tree of its suite.
    ///
    /// Runs report ancestors before descendants, so by the time a block
    /// arrives its parent is already in the tree; a report violating that
    /// order is dropped with a warning rather than taking down the
    /// aggregation loop.
    pub(crate) fn update(&mut self, suite: &str, report: &SpecReport) {
        if report.path.is_root() {
            self.roots
                .entry(suite.to_string())
                .or_insert_with(|| ResultNode::new(report.name.clone(), SpecPath::root()))
                .merge_errors(&report.errors);
        } else if let Some(root) = self.roots.get_mut(suite) {
            root.update(report);
        } else {
            warn!(suite, path = %report.path, "block reported before its suite root; dropped");
        }
    }

    /// Number of blocks across all suites.
    pub fn total_count(&self) -> usize {
        self.roots.values().map(ResultNode::subtree_count).sum()
    }

    /// Number of blocks with at least one error.
    pub fn fail_count(&self) -> usize {
        self.roots.values().map(ResultNode::subtree_fail_count).sum()
    }

    /// Number of blocks with no errors of their own. A passing block may
    /// still have failing descendants.
    pub fn pass_count(&self) -> usize {
        self.total_count() - self.fail_count()
    }

    /// Walk the forest depth-first in suite-name order, then report the
    /// final counts.
    pub fn visit<V: ResultVisitor>(&self, visitor: &mut V) {
        for root in self.roots.values() {
            root.visit_subtree(0, visitor);
        }
        visitor.visit_end(self.pass_count(), self.fail_count());
    }
}

impl ResultNode {
    fn new(name: String, path: SpecPath) -> Self {
        Self {
            name,
            path,
            errors: Vec::new(),
            children: Vec::new(),
        }
    }

    fn from_report(report: &SpecReport) -> Self {
        Self {
            name: report.name.clone(),
            path: report.path.clone(),
            errors: report.errors.clone(),
            children: Vec::new(),
        }
    }

    /// Whether this block itself failed, independent of its descendants.
    pub fn is_failed(&self) -> bool {
        !self.errors.is_empty()
    }

    fn update(&mut self, report: &SpecReport) {
        if self.path == report.path {
            self.merge_errors(&report.errors);
            return;
        }
        let is_direct_child = report.path.depth() == self.path.depth() + 1;
        if is_direct_child && !self.has_child_at(&report.path) {
            self.insert_child(ResultNode::from_report(report));
            return;
        }
        let child_index = report.path.index_at(self.path.depth());
        match self
            .children
            .iter_mut()
            .find(|child| child.path.last_index() == child_index)
        {
            Some(child) => child.update(report),
            None => warn!(path = %report.path, "block reported before its parent; dropped"),
        }
    }

    /// Re-reporting an identical error merges silently; a new variant of
    /// a sporadic failure accumulates.
    fn merge_errors(&mut self, errors: &[SpecError]) {
        for error in errors {
            if !self.errors.contains(error) {
                self.errors.push(error.clone());
            }
        }
    }

    fn has_child_at(&self, path: &SpecPath) -> bool {
        self.children.iter().any(|child| child.path == *path)
    }

    /// Keep children in sibling order regardless of arrival order.
    fn insert_child(&mut self, node: ResultNode) {
        let position = self
            .children
            .iter()
            .position(|child| child.path.last_index() > node.path.last_index())
            .unwrap_or(self.children.len());
        self.children.insert(position, node);
    }

    fn subtree_count(&self) -> usize {
        1 + self.children.iter().map(Self::subtree_count).sum::<usize>()
    }

    fn subtree_fail_count(&self) -> usize {
        usize::from(self.is_failed())
            + self
                .children
                .iter()
                .map(Self::subtree_fail_count)
                .sum::<usize>()
    }

    fn visit_subtree<V: ResultVisitor>(&self, nesting: usize, visitor: &mut V) {
        let descriptions: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        visitor.visit_spec(nesting, &self.name, &descriptions);
        for child in &self.children {
            child.visit_subtree(nesting + 1, visitor);
        }
    }
}
