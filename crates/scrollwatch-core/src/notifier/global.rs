//! Process-wide shared notifier
//!
//! Created lazily on first access and never torn down. Its scroll listener
//! still attaches and detaches with its registrations.

use once_cell::sync::OnceCell;

use super::ScrollNotifier;
use crate::Result;

static SHARED: OnceCell<ScrollNotifier> = OnceCell::new();

/// The shared notifier, if it has been created
pub fn shared() -> Option<&'static ScrollNotifier> {
    SHARED.get()
}

/// The shared notifier, built by `init` on first access
pub fn shared_or_init<F>(init: F) -> &'static ScrollNotifier
where
    F: FnOnce() -> ScrollNotifier,
{
    SHARED.get_or_init(init)
}

/// Like `shared_or_init` for fallible construction, e.g. `Host::tokio`
pub fn try_shared_or_init<F>(init: F) -> Result<&'static ScrollNotifier>
where
    F: FnOnce() -> Result<ScrollNotifier>,
{
    SHARED.get_or_try_init(init)
}
