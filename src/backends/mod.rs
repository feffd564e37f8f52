//! Key-event sources.
//!
//! Implementations of [`KeySource`](crate::source::KeySource):
//!
//! - [`hid`] — the real thing, one open `hidapi` handle per session.
//!   Gated behind the **`hid`** feature (default).
//! - [`scripted`] — canned read outcomes for tests and demos; always
//!   compiled.

#[cfg(feature = "hid")]
#[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
pub mod hid;

pub mod scripted;
