//! Synchronization Support
//!
//! The engine itself never locks; it expects every call for one port to be
//! serialized. [`SharedPort`] provides that serialization with a critical
//! section around a [`SerialPort`](crate::SerialPort), with entry points for
//! the writer path and the interrupt handlers.
//!
//! # Feature Flags
//!
//! - `critical-section` (default): enables this module. The
//!   implementation of the critical section itself comes from the HAL or
//!   runtime crate.

mod shared;

pub use shared::SharedPort;
