//! keycue — binds physical HID key events to user-defined actions.
//!
//! The pipeline: a [`DeviceRegistry`](registry::DeviceRegistry) enumerates
//! candidate devices, a [`HidSession`](backends::hid::HidSession) owns one
//! open handle and decodes raw reports into [`KeyEvent`]s, the
//! [`Dispatcher`] resolves each event against the persisted
//! [`MappingStore`] and hands the bound action string to an
//! [`ActionHandler`] — typically the audio
//! [`PlaybackHandler`](audio::PlaybackHandler).
//!
//! The listening loop runs on its own thread, bounded reads keep it
//! cancellable, and a disconnect ends the session until the owner
//! explicitly re-opens it.

pub mod audio;
pub mod backends;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod logger;
pub mod mapping;
pub mod settings;
pub mod source;

#[cfg(feature = "hid")]
#[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
pub mod registry;

pub use dispatch::*;
pub use error::*;
pub use event::*;
pub use mapping::*;
pub use source::*;

#[cfg(feature = "hid")]
pub use registry::{DeviceDescriptor, DeviceRegistry};
