//! Behavior-specification execution engine.
//!
//! Suites are nested closures declared with [`Context::specify`]. A suite
//! body is re-invoked once per run, each run working toward one target
//! block: blocks on the route to the target execute, and so does the
//! first child of every newly discovered block. Remaining unseen siblings
//! are reported for dedicated follow-up runs. Because every leaf gets a
//! run of its own built up from a fresh root, side effects in one block
//! are never observed by its siblings.
//!
//! The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (block addressing, per-block
//!   decisions). No state, no I/O, fully testable in isolation.
//! - **[`SpecRunner`]**: Runs tasks across worker threads and merges every
//!   report into one deduplicated result tree per suite on a single
//!   aggregation thread.
//! - **[`Context`]**: Per-run state handed to suite bodies; carries the
//!   `expect`/`assume` checkpoints and converts panics into recorded
//!   errors with normalized stacks.
//! - **[`Printer`]**: Renders merged results as an indented text tree.

pub mod core;
pub mod logging;
pub mod matchers;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

mod context;
mod error;
mod name;
mod recover;
mod report;
mod results;
mod runner;

pub use crate::core::path::SpecPath;

pub use context::Context;
pub use error::{ErrorKind, Frame, SpecError};
pub use matchers::{MatchError, MatchResult, Verdict, contains, equals, is_within, not};
pub use name::{UNNAMED_SUITE, suite_name};
pub use report::Printer;
pub use results::{ResultCollector, ResultNode, ResultVisitor};
pub use runner::{RunnerConfig, SpecBody, SpecRunner};
