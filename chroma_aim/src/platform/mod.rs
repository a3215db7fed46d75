// THEORY:
// Concrete backends for the traits in `crate::devices`. Backends whose native
// calls block do that work off the runtime thread: capture through
// `BlockingGrab`, hotkey polling on a watcher thread.

pub mod blocking;
pub mod pointer;

#[cfg(target_os = "linux")]
pub mod x11;
