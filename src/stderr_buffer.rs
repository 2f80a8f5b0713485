//! Holds back stderr output while the TUI owns the terminal.

use std::sync::{Mutex, MutexGuard, PoisonError};

static HELD: Mutex<Option<Vec<String>>> = Mutex::new(None);

fn held() -> MutexGuard<'static, Option<Vec<String>>> {
    HELD.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Start holding messages instead of printing them
pub fn hold() {
    *held() = Some(Vec::new());
}

/// Stop holding and return everything collected, collapsing runs of the
/// same message (auto-refresh failures tend to repeat).
pub fn release() -> Vec<String> {
    let messages = held().take().unwrap_or_default();
    collapse_repeats(messages)
}

/// Print a message now, or keep it for later while held
pub fn emit(msg: String) {
    let mut guard = held();
    match guard.as_mut() {
        Some(messages) => messages.push(msg),
        None => {
            drop(guard);
            eprintln!("{}", msg);
        }
    }
}

fn collapse_repeats(messages: Vec<String>) -> Vec<String> {
    let mut out: Vec<(String, usize)> = Vec::new();
    for msg in messages {
        match out.last_mut() {
            Some((last, count)) if *last == msg => *count += 1,
            _ => out.push((msg, 1)),
        }
    }
    out.into_iter()
        .map(|(msg, count)| {
            if count > 1 {
                format!("{} (x{})", msg, count)
            } else {
                msg
            }
        })
        .collect()
}

/// Like `eprintln!`, but held back while the TUI is running
#[macro_export]
macro_rules! buffered_eprintln {
    ($($arg:tt)*) => {
        $crate::stderr_buffer::emit(format!($($arg)*))
    };
}
