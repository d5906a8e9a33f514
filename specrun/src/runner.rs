//! Schedules suite runs until every block has been visited.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{Sender, unbounded};
use tracing::debug;

use crate::context::Context;
use crate::core::path::SpecPath;
use crate::name::suite_name;
use crate::results::{ResultCollector, SpecReport};

/// A suite body. The engine re-invokes it once per run, each time with a
/// fresh [`Context`], so it must tolerate repeated invocation.
pub type SpecBody = dyn Fn(&Context) + Send + Sync + 'static;

/// Scheduling knobs for [`SpecRunner`].
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Upper bound on concurrently running tasks. `None` spawns one
    /// worker per queued task; values below 1 behave like 1.
    pub max_workers: Option<usize>,
}

/// Drives registered suites to full coverage and owns the merged results.
///
/// Each queued task is one run of one suite toward one target block. A
/// finished run reports the blocks it executed and the targets it
/// postponed; postponed targets become new tasks for the same suite until
/// nothing is left. A target is only ever queued once: a block is unseen,
/// then postponed by exactly one run, then executed by its own run.
pub struct SpecRunner {
    config: RunnerConfig,
    queue: VecDeque<ScheduledTask>,
    results: ResultCollector,
}

/// One pending run: a suite body aimed at one target block.
struct ScheduledTask {
    suite: String,
    body: Arc<SpecBody>,
    target: SpecPath,
}

/// Everything one run produced, sent back to the scheduling loop.
struct TaskResult {
    suite: String,
    body: Arc<SpecBody>,
    executed: Vec<SpecReport>,
    postponed: Vec<SpecPath>,
}

impl SpecRunner {
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            config,
            queue: VecDeque::new(),
            results: ResultCollector::default(),
        }
    }

    /// Register a suite under an explicit name.
    pub fn add_named_spec(
        &mut self,
        name: impl Into<String>,
        body: impl Fn(&Context) + Send + Sync + 'static,
    ) {
        let suite = name.into();
        debug!(suite = %suite, "suite registered");
        self.queue.push_back(ScheduledTask {
            suite,
            body: Arc::new(body),
            target: SpecPath::root(),
        });
    }

    /// Register a suite named after its function.
    pub fn add_spec<F>(&mut self, body: F)
    where
        F: Fn(&Context) + Send + Sync + 'static,
    {
        let name = suite_name::<F>();
        self.add_named_spec(name, body);
    }

    /// Run every queued task to completion on worker threads.
    ///
    /// The calling thread is the single aggregation point: workers send
    /// their results over a channel, and each result is merged here
    /// before its postponed follow-up runs are queued. Workers share
    /// nothing else, so no other synchronization exists.
    pub fn run(&mut self) {
        let (tx, rx) = unbounded::<TaskResult>();
        let limit = self.config.max_workers.map_or(usize::MAX, |n| n.max(1));
        let mut in_flight = 0usize;

        while !self.queue.is_empty() || in_flight > 0 {
            while in_flight < limit {
                let Some(task) = self.queue.pop_front() else {
                    break;
                };
                spawn_worker(task, tx.clone());
                in_flight += 1;
            }
            match rx.recv() {
                Ok(result) => {
                    in_flight -= 1;
                    self.absorb(result);
                }
                Err(_) => break,
            }
        }
    }

    /// Run every queued task on the calling thread, in queue order.
    /// Scheduling semantics are identical to [`run`](SpecRunner::run).
    pub fn run_serial(&mut self) {
        while let Some(task) = self.queue.pop_front() {
            let result = run_task(task);
            self.absorb(result);
        }
    }

    /// Merged results of every run so far.
    pub fn results(&self) -> &ResultCollector {
        &self.results
    }

    fn absorb(&mut self, result: TaskResult) {
        debug!(
            suite = %result.suite,
            executed = result.executed.len(),
            postponed = result.postponed.len(),
            "task finished"
        );
        for report in &result.executed {
            self.results.update(&result.suite, report);
        }
        for target in result.postponed {
            self.queue.push_back(ScheduledTask {
                suite: result.suite.clone(),
                body: Arc::clone(&result.body),
                target,
            });
        }
    }
}

impl Default for SpecRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_worker(task: ScheduledTask, results: Sender<TaskResult>) {
    let spawned = thread::Builder::new()
        .name("specrun-worker".to_string())
        .spawn(move || {
            let result = run_task(task);
            // The receiver outlives all workers; a send can only fail if
            // the aggregation loop was torn down first.
            let _ = results.send(result);
        });
    let _ = spawned.expect("failed to spawn spec worker thread");
}

/// Stack boundary for panic normalization: user frames sit below this.
#[inline(never)]
fn run_task(task: ScheduledTask) -> TaskResult {
    debug!(suite = %task.suite, target = %task.target, "running spec task");
    let ScheduledTask {
        suite,
        body,
        target,
    } = task;
    let context = Context::new(target);
    context.run_root(&suite, body.as_ref());
    let (executed, postponed) = context.finish();
    TaskResult {
        suite,
        body,
        executed,
        postponed,
    }
}
