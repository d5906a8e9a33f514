//! Per-run execution state for one suite body invocation.

use std::cell::RefCell;
use std::fmt;

use crate::core::classify::{Decision, decide};
use crate::core::path::SpecPath;
use crate::error::{ErrorKind, Frame, SpecError};
use crate::matchers::MatchResult;
use crate::recover;
use crate::results::SpecReport;

/// Handed to a suite body for declaring nested blocks and checkpoints.
///
/// One `Context` lives for exactly one run: the engine re-invokes the
/// suite body with a fresh `Context` for every target it works toward.
/// Bodies must be deterministic in the blocks they declare: re-running
/// from the same ancestor state has to declare the same blocks in the
/// same order, because blocks are addressed by declaration position.
pub struct Context {
    target: SpecPath,
    state: RefCell<RunState>,
}

struct RunState {
    arena: Vec<SpecNode>,
    current: Option<usize>,
    executed: Vec<usize>,
    postponed: Vec<SpecPath>,
}

/// One block encountered during this run. Lives in the run's arena; the
/// parent link is an index into it, never ownership.
struct SpecNode {
    name: String,
    path: SpecPath,
    parent: Option<usize>,
    next_child: usize,
    errors: Vec<SpecError>,
    fatal: bool,
}

impl Context {
    pub(crate) fn new(target: SpecPath) -> Self {
        Self {
            target,
            state: RefCell::new(RunState {
                arena: Vec::new(),
                current: None,
                executed: Vec::new(),
                postponed: Vec::new(),
            }),
        }
    }

    /// Run the suite root through the same lifecycle as any nested block.
    pub(crate) fn run_root(&self, name: &str, body: &(dyn Fn(&Context) + Send + Sync)) {
        self.specify(name, || body(self));
    }

    /// Declare a nested specification block.
    ///
    /// Whether `body` runs depends on the run's target: blocks on the
    /// route to it run, the first child of newly discovered blocks runs,
    /// later unseen siblings are postponed for dedicated runs, and
    /// everything else is skipped. A skipped or postponed body is dropped
    /// unexecuted.
    pub fn specify(&self, name: &str, body: impl FnOnce()) {
        let (index, decision) = self.enter(name);
        match decision {
            Decision::Execute => {
                let recovered = recover::guard(body);
                let mut state = self.state.borrow_mut();
                if let Some(error) = recovered {
                    tracing::debug!(block = %state.arena[index].path, "panic recorded as fatal");
                    state.arena[index].errors.push(error);
                    state.arena[index].fatal = true;
                }
                state.current = state.arena[index].parent;
            }
            Decision::Postpone => {
                let mut state = self.state.borrow_mut();
                let path = state.arena[index].path.clone();
                state.postponed.push(path);
            }
            Decision::Skip => {}
        }
    }

    /// Check `actual` against `expected` with `matcher`. A mismatch is
    /// recorded as a recoverable error and the block keeps running.
    #[track_caller]
    pub fn expect<A, E, M>(&self, actual: A, matcher: M, expected: E)
    where
        A: fmt::Debug,
        M: FnOnce(&A, &E) -> MatchResult,
    {
        let frame = Frame::caller();
        self.check(ErrorKind::ExpectFailed, &actual, matcher, &expected, frame);
    }

    /// Check a precondition. A mismatch is fatal for the block: the error
    /// is recorded and every block nested below is skipped for this run.
    #[track_caller]
    pub fn assume<A, E, M>(&self, actual: A, matcher: M, expected: E)
    where
        A: fmt::Debug,
        M: FnOnce(&A, &E) -> MatchResult,
    {
        let frame = Frame::caller();
        self.check(ErrorKind::AssumeFailed, &actual, matcher, &expected, frame);
    }

    fn check<A, E, M>(&self, kind: ErrorKind, actual: &A, matcher: M, expected: &E, frame: Frame)
    where
        A: fmt::Debug,
        M: FnOnce(&A, &E) -> MatchResult,
    {
        let error = match matcher(actual, expected) {
            Ok(verdict) if verdict.matched => return,
            Ok(verdict) => SpecError {
                kind,
                message: verdict.pos,
                actual: format!("{actual:?}"),
                stack: vec![frame],
            },
            Err(hard) => SpecError {
                kind: ErrorKind::Other,
                message: hard.0,
                actual: format!("{actual:?}"),
                stack: vec![frame],
            },
        };
        // A failed assumption stays fatal even when the matcher itself
        // errored: the precondition was not established either way.
        let fatal = matches!(kind, ErrorKind::AssumeFailed);
        self.record(error, fatal);
    }

    fn record(&self, error: SpecError, fatal: bool) {
        let mut state = self.state.borrow_mut();
        let Some(current) = state.current else {
            tracing::warn!("checkpoint outside a running block; error dropped");
            return;
        };
        state.arena[current].errors.push(error);
        if fatal {
            state.arena[current].fatal = true;
        }
    }

    /// Register and classify the block, marking it current when it runs.
    fn enter(&self, name: &str) -> (usize, Decision) {
        let mut state = self.state.borrow_mut();
        let parent = state.current;
        let (path, ancestor_fatal) = match parent {
            Some(parent_index) => {
                let sibling_index = state.arena[parent_index].next_child;
                state.arena[parent_index].next_child += 1;
                (
                    state.arena[parent_index].path.append(sibling_index),
                    state.arena[parent_index].fatal,
                )
            }
            None => (SpecPath::root(), false),
        };
        let decision = decide(&path, &self.target, ancestor_fatal);
        let index = state.arena.len();
        state.arena.push(SpecNode {
            name: name.to_string(),
            path,
            parent,
            next_child: 0,
            errors: Vec::new(),
            fatal: false,
        });
        if decision == Decision::Execute {
            state.executed.push(index);
            state.current = Some(index);
        }
        (index, decision)
    }

    /// Everything this run produced: executed blocks in encounter order
    /// (ancestors before descendants) and postponed targets.
    pub(crate) fn finish(self) -> (Vec<SpecReport>, Vec<SpecPath>) {
        let state = self.state.into_inner();
        let executed = state
            .executed
            .iter()
            .map(|&index| {
                let node = &state.arena[index];
                SpecReport {
                    name: node.name.clone(),
                    path: node.path.clone(),
                    errors: node.errors.clone(),
                }
            })
            .collect();
        (executed, state.postponed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers::equals;
    use crate::test_support::RunLog;

    fn run_toward(target: SpecPath, body: impl Fn(&Context) + Send + Sync) -> Context {
        let context = Context::new(target);
        context.run_root("root", &body);
        context
    }

    fn paths(reports: &[SpecReport]) -> Vec<String> {
        reports.iter().map(|report| report.path.to_string()).collect()
    }

    #[test]
    fn root_target_executes_root_and_dives_into_first_children() {
        let log = RunLog::new();
        let context = run_toward(SpecPath::root(), {
            let log = log.clone();
            move |c| {
                log.push("root");
                c.specify("a", || log.push("a"));
                c.specify("b", || log.push("b"));
            }
        });
        let (executed, postponed) = context.finish();
        assert_eq!(log.labels(), ["root", "a"]);
        assert_eq!(paths(&executed), ["[]", "[0]"]);
        assert_eq!(postponed, [SpecPath::root().append(1)]);
    }

    #[test]
    fn explicit_target_runs_only_the_route_to_it() {
        let log = RunLog::new();
        let context = run_toward(SpecPath::root().append(1), {
            let log = log.clone();
            move |c| {
                log.push("root");
                c.specify("a", || log.push("a"));
                c.specify("b", || log.push("b"));
            }
        });
        let (executed, postponed) = context.finish();
        assert_eq!(log.labels(), ["root", "b"]);
        assert_eq!(paths(&executed), ["[]", "[1]"]);
        assert!(postponed.is_empty());
    }

    #[test]
    fn single_chain_executes_in_one_run() {
        let log = RunLog::new();
        let context = run_toward(SpecPath::root(), {
            let log = log.clone();
            move |c| {
                log.push("root");
                c.specify("a", || {
                    log.push("a");
                    c.specify("aa", || log.push("aa"));
                });
            }
        });
        let (executed, postponed) = context.finish();
        assert_eq!(log.labels(), ["root", "a", "aa"]);
        assert_eq!(paths(&executed), ["[]", "[0]", "[0.0]"]);
        assert!(postponed.is_empty());
    }

    #[test]
    fn sibling_blocks_do_not_observe_each_others_mutations() {
        let log = RunLog::new();
        run_toward(SpecPath::root().append(1), {
            let log = log.clone();
            move |c| {
                let mut x = 0;
                c.specify("a", || x = 1);
                c.specify("b", || log.push(&format!("b sees {x}")));
            }
        });
        assert_eq!(log.labels(), ["b sees 0"]);
    }

    #[test]
    fn failed_expectation_is_recorded_and_execution_continues() {
        let log = RunLog::new();
        let context = run_toward(SpecPath::root(), {
            let log = log.clone();
            move |c| {
                c.expect(10, equals, 20);
                c.specify("a", || log.push("a"));
            }
        });
        let (executed, _) = context.finish();
        assert_eq!(log.labels(), ["a"]);
        let root = &executed[0];
        assert_eq!(root.errors.len(), 1);
        assert_eq!(root.errors[0].kind, ErrorKind::ExpectFailed);
        assert_eq!(root.errors[0].message, "equals 20");
        assert_eq!(root.errors[0].actual, "10");
    }

    #[test]
    fn expectation_failure_records_the_call_site() {
        let context = run_toward(SpecPath::root(), |c| {
            c.expect(1, equals, 2);
        });
        let (executed, _) = context.finish();
        let stack = &executed[0].errors[0].stack;
        assert_eq!(stack.len(), 1);
        assert_eq!(stack[0].file, "context.rs");
        assert!(stack[0].line > 0);
    }

    #[test]
    fn failed_assumption_skips_the_rest_of_the_subtree() {
        let log = RunLog::new();
        let context = run_toward(SpecPath::root(), {
            let log = log.clone();
            move |c| {
                log.push("root");
                c.assume(10, equals, 20);
                c.specify("a", || log.push("a"));
                c.specify("b", || log.push("b"));
            }
        });
        let (executed, postponed) = context.finish();
        assert_eq!(log.labels(), ["root"]);
        assert_eq!(paths(&executed), ["[]"]);
        assert!(postponed.is_empty(), "fatal blocks postpone nothing");
        assert_eq!(executed[0].errors[0].kind, ErrorKind::AssumeFailed);
    }

    #[test]
    fn matcher_hard_error_during_assume_is_still_fatal() {
        let log = RunLog::new();
        let context = run_toward(SpecPath::root(), {
            let log = log.clone();
            move |c| {
                c.assume(f64::NAN, crate::matchers::is_within(0.5), 1.0);
                c.specify("a", || log.push("a"));
            }
        });
        let (executed, _) = context.finish();
        assert!(log.labels().is_empty());
        assert_eq!(executed[0].errors[0].kind, ErrorKind::Other);
    }

    #[test]
    fn panicking_block_is_fatal_but_siblings_are_still_postponed() {
        let log = RunLog::new();
        let context = run_toward(SpecPath::root(), {
            let log = log.clone();
            move |c| {
                log.push("root");
                c.specify("a", || {
                    log.push("a");
                    panic!("a failed");
                });
                c.specify("b", || log.push("b"));
            }
        });
        let (executed, postponed) = context.finish();
        assert_eq!(log.labels(), ["root", "a"]);
        assert_eq!(postponed, [SpecPath::root().append(1)]);
        let a = &executed[1];
        assert_eq!(a.errors.len(), 1);
        assert_eq!(a.errors[0].message, "panic: a failed");
    }

    #[test]
    fn children_of_a_panicked_block_are_not_postponed() {
        let log = RunLog::new();
        let context = run_toward(SpecPath::root().append(0).append(1), {
            let log = log.clone();
            move |c| {
                c.specify("a", || {
                    log.push("a");
                    panic!("a failed");
                });
            }
        });
        let (_, postponed) = context.finish();
        assert_eq!(log.labels(), ["a"]);
        assert!(postponed.is_empty());
    }

    #[test]
    fn executed_blocks_report_ancestors_before_descendants() {
        let context = run_toward(SpecPath::root(), |c| {
            c.specify("a", || {
                c.specify("aa", || {});
            });
        });
        let (executed, _) = context.finish();
        assert_eq!(paths(&executed), ["[]", "[0]", "[0.0]"]);
    }
}
