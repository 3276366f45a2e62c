//! Canon EDSDK camera control.
//!
//! All EDSDK FFI is behind `#[cfg(feature = "canon")]`; mock-based tests
//! run without the real library.

pub mod api;
pub mod discovery;
#[cfg(feature = "canon")]
pub mod ffi;
pub mod handle;
pub mod mock;
pub mod pump;
pub mod runtime;
#[cfg(feature = "canon")]
pub mod sdk;
pub mod session;
pub mod status;
pub mod transfer;
pub mod types;
pub mod values;
