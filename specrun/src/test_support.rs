//! Test-only helpers: execution spies and canned suites.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::context::Context;

/// Thread-safe label log recording which blocks actually ran, and in what
/// order. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    labels: Arc<Mutex<Vec<String>>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, label: &str) {
        self.labels
            .lock()
            .expect("run log lock poisoned")
            .push(label.to_string());
    }

    /// Labels in push order.
    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().expect("run log lock poisoned").clone()
    }

    /// Labels sorted, for order-independent comparison across workers.
    pub fn sorted_labels(&self) -> Vec<String> {
        let mut labels = self.labels();
        labels.sort();
        labels
    }

    /// How many times each label was pushed.
    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for label in self.labels() {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }
}

/// `root` with no children; completes in a single run.
pub fn leaf_only_suite(log: &RunLog) -> impl Fn(&Context) + Send + Sync + 'static {
    let log = log.clone();
    move |_c| log.push("root")
}

/// `root` -> `a` -> `aa`, a single chain.
pub fn nested_chain_suite(log: &RunLog) -> impl Fn(&Context) + Send + Sync + 'static {
    let log = log.clone();
    move |c| {
        log.push("root");
        c.specify("a", || {
            log.push("a");
            c.specify("aa", || log.push("aa"));
        });
    }
}

/// `root` with leaf children `a` and `b`.
pub fn two_children_suite(log: &RunLog) -> impl Fn(&Context) + Send + Sync + 'static {
    let log = log.clone();
    move |c| {
        log.push("root");
        c.specify("a", || log.push("a"));
        c.specify("b", || log.push("b"));
    }
}

/// Two levels of branching:
/// `root` -> (`a` -> (`aa`, `ab`), `b` -> (`ba`, `bb`, `bc`)).
///
/// Five leaves, so the engine needs five runs for full coverage.
pub fn branching_suite(log: &RunLog) -> impl Fn(&Context) + Send + Sync + 'static {
    let log = log.clone();
    move |c| {
        log.push("root");
        c.specify("a", || {
            log.push("a");
            c.specify("aa", || log.push("aa"));
            c.specify("ab", || log.push("ab"));
        });
        c.specify("b", || {
            log.push("b");
            c.specify("ba", || log.push("ba"));
            c.specify("bb", || log.push("bb"));
            c.specify("bc", || log.push("bc"));
        });
    }
}
