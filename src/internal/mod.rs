//! Internal Implementation Details
//!
//! This module contains implementation details that are not part of the public API.
//! Types in this module may change without notice between minor versions.
//!
//! # Contents
//!
//! - `fmt`: logging macros routed to `defmt` or `log`
//! - [`constants`]: buffer sizes, thresholds and FIFO offsets
//!
//! # Stability
//!
//! **WARNING:** This module is `pub(crate)` only. Do not depend on any types
//! or functions in this module from external code. They are subject to change
//! without notice.

#[macro_use]
mod fmt;

pub(crate) mod constants;
