//! SIGINT wiring for cooperative fix interruption.
//!
//! The executor consults a shared flag between commands; this module
//! raises that flag from the signal handler. Nothing is intercepted
//! beyond setting the flag - a second interrupt during a blocking read
//! still terminates the process the usual way.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

static FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();

extern "C" fn handle_sigint(_signal: libc::c_int) {
    // Only the atomic store happens here; anything more is not
    // async-signal-safe.
    if let Some(flag) = FLAG.get() {
        flag.store(true, Ordering::SeqCst);
    }
}

/// Install the SIGINT handler and return the shared flag the executor
/// should watch.
pub fn install() -> Arc<AtomicBool> {
    let flag = FLAG
        .get_or_init(|| Arc::new(AtomicBool::new(false)))
        .clone();
    unsafe {
        libc::signal(libc::SIGINT, handle_sigint as libc::sighandler_t);
    }
    flag
}

/// Clear the flag before starting a new fix.
pub fn reset() {
    if let Some(flag) = FLAG.get() {
        flag.store(false, Ordering::SeqCst);
    }
}
