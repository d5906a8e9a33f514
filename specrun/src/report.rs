//! Plain-text rendering of a result forest.

use std::io::{self, Write};

use crate::results::ResultVisitor;

/// Renders visited results as an indented tree, one line per block.
///
/// By default only failing blocks are printed, together with the passing
/// ancestors needed to locate them; unrelated passing subtrees are
/// omitted. [`show_all`](Printer::show_all) switches to the full tree.
pub struct Printer<W: Write> {
    out: W,
    show_all: bool,
    show_summary: bool,
    pending: Vec<PendingBlock>,
}

/// A passing ancestor held back until a failing descendant needs it.
struct PendingBlock {
    nesting: usize,
    name: String,
}

impl Printer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Printer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            show_all: false,
            show_summary: true,
            pending: Vec::new(),
        }
    }

    /// Print every block, passing or failing.
    pub fn show_all(mut self) -> Self {
        self.show_all = true;
        self
    }

    /// Print only failing blocks and their ancestors (the default).
    pub fn show_only_failing(mut self) -> Self {
        self.show_all = false;
        self
    }

    /// Append the `N specs, M failures` line (the default).
    pub fn show_summary(mut self) -> Self {
        self.show_summary = true;
        self
    }

    pub fn hide_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        // A failed write has nowhere to be reported mid-visit.
        let _ = writeln!(self.out, "{text}");
    }

    fn print_block(&mut self, nesting: usize, name: &str, failed: bool) {
        let indent = "  ".repeat(nesting);
        if failed {
            self.line(&format!("{indent}- {name} [FAIL]"));
        } else {
            self.line(&format!("{indent}- {name}"));
        }
    }

    fn print_errors(&mut self, nesting: usize, errors: &[String]) {
        let indent = "  ".repeat(nesting);
        for description in errors {
            for text in description.lines() {
                self.line(&format!("{indent}    {text}"));
            }
        }
    }
}

impl<W: Write> ResultVisitor for Printer<W> {
    fn visit_spec(&mut self, nesting: usize, name: &str, errors: &[String]) {
        // Pending blocks at this depth or deeper belong to finished
        // sibling subtrees with no failures; they are never printed.
        self.pending.retain(|block| block.nesting < nesting);
        let failed = !errors.is_empty();
        if self.show_all || failed {
            let ancestors: Vec<PendingBlock> = self.pending.drain(..).collect();
            for block in ancestors {
                self.print_block(block.nesting, &block.name, false);
            }
            self.print_block(nesting, name, failed);
            self.print_errors(nesting, errors);
        } else {
            self.pending.push(PendingBlock {
                nesting,
                name: name.to_string(),
            });
        }
    }

    fn visit_end(&mut self, pass_count: usize, fail_count: usize) {
        self.pending.clear();
        if self.show_summary {
            self.line("");
            self.line(&format!(
                "{} specs, {} failures",
                pass_count + fail_count,
                fail_count
            ));
        }
    }
}
