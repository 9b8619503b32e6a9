//! OS-level keyboard capture.
//!
//! Windows uses a low-level `WH_KEYBOARD_LL` hook running on its own message
//! loop thread; other platforms go through `rdev::listen`. Both forward every
//! edge to an [`EventSink`](crate::events::EventSink) and return immediately.

#[cfg(not(windows))]
mod rdev_listener;
#[cfg(windows)]
mod win32;

#[cfg(not(windows))]
pub use rdev_listener::{start_capture, CaptureHandle};
#[cfg(windows)]
pub use win32::{start_capture, CaptureHandle};
