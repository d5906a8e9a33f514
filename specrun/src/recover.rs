//! Panic capture for specification bodies.
//!
//! A body runs inside [`guard`], which turns an unwind into an error
//! record carrying a normalized stack. The raw stack has to be captured by
//! a panic hook while the panicking frames are still live; by the time
//! `catch_unwind` returns they are gone. The hook is installed once per
//! process and delegates to the previously installed hook whenever no
//! guard is armed on the panicking thread, so unrelated panics keep their
//! default reporting.

use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use crate::error::{Frame, SpecError};

thread_local! {
    /// Nesting depth of active guards on this thread.
    static GUARD_DEPTH: Cell<usize> = const { Cell::new(0) };
    /// Raw stack captured by the hook for the most recent panic.
    static SNAPSHOT: RefCell<Option<Vec<usize>>> = const { RefCell::new(None) };
}

static INSTALL: Once = Once::new();

/// Run `body`, converting a panic into a fatal error record.
///
/// Returns `None` when the body completes, `Some` when it panicked. The
/// error message is `panic: <payload>` and the stack starts at the frame
/// that panicked, with panic machinery below it and engine frames above
/// it trimmed away.
#[inline(never)]
pub(crate) fn guard<F: FnOnce()>(body: F) -> Option<SpecError> {
    install_hook();
    GUARD_DEPTH.with(|depth| depth.set(depth.get() + 1));
    let outcome = panic::catch_unwind(AssertUnwindSafe(body));
    GUARD_DEPTH.with(|depth| depth.set(depth.get() - 1));
    // Always clear the slot: a body may swallow a panic with its own
    // catch_unwind, and the stale snapshot must not attach to a later one.
    let snapshot = SNAPSHOT.with(|slot| slot.borrow_mut().take());

    match outcome {
        Ok(()) => None,
        Err(payload) => {
            let message = payload_message(payload.as_ref());
            let stack = snapshot.map(|ips| normalize(&ips)).unwrap_or_default();
            Some(SpecError::other(format!("panic: {message}"), stack))
        }
    }
}

fn install_hook() {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if GUARD_DEPTH.with(Cell::get) > 0 {
                let mut ips = Vec::new();
                backtrace::trace(|frame| {
                    ips.push(frame.ip() as usize);
                    true
                });
                SNAPSHOT.with(|slot| *slot.borrow_mut() = Some(ips));
            } else {
                previous(info);
            }
        }));
    });
}

fn payload_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Resolve raw instruction pointers into user-relevant frames.
///
/// A stack walk yields return addresses, one instruction past each call;
/// resolving at `ip - 1` lands symbolication back on the line of the call
/// itself, so every frame names the line where control left it rather
/// than the line after.
fn normalize(ips: &[usize]) -> Vec<Frame> {
    let mut frames = Vec::new();
    for &ip in ips {
        let call_site = ip.saturating_sub(1) as *mut std::ffi::c_void;
        let mut reached_boundary = false;
        backtrace::resolve(call_site, |symbol| {
            if reached_boundary {
                return;
            }
            let name = symbol.name().map(|name| format!("{name:#}"));
            let named = name.as_deref().unwrap_or("");
            if is_boundary(named) {
                reached_boundary = true;
                return;
            }
            if is_machinery(named) {
                return;
            }
            let file = symbol
                .filename()
                .and_then(|path| path.file_name())
                .map(|file| file.to_string_lossy().into_owned())
                .unwrap_or_default();
            if name.is_none() && file.is_empty() {
                return;
            }
            let line = symbol.lineno().unwrap_or(0);
            frames.push(Frame { name, file, line });
        });
        if reached_boundary {
            break;
        }
    }
    frames
}

/// Frames at which the walk stops: everything above belongs to the engine.
fn is_boundary(name: &str) -> bool {
    name.contains("::recover::guard") || name.contains("::runner::run_task")
}

/// Frames dropped from the middle of the walk: panic plumbing below the
/// panicking frame, and std glue between user frames. Trait-impl symbols
/// of std types (`<std::panic::AssertUnwindSafe<F> as FnOnce<()>>` and
/// friends) demangle with a leading `<`, so they need their own prefixes.
fn is_machinery(name: &str) -> bool {
    const PREFIXES: &[&str] = &[
        "std::",
        "core::",
        "alloc::",
        "backtrace::",
        "rust_begin_unwind",
        "rust_panic",
        "__rust",
        "<std::",
        "<core::",
        "<alloc::",
    ];
    PREFIXES.iter().any(|prefix| name.starts_with(prefix))
        || name.contains("::recover::install_hook")
}
