//! Configuration and error types shared by every layer of the engine.
//!
//! - [`config`] - DMA configuration, lifecycle state, flush modes
//! - [`error`] - Error types and result aliases
//!
//! # Example
//!
//! ```ignore
//! use serial_dma::driver::{DmaConfig, Error};
//!
//! let config = DmaConfig::for_mapbase(0x3FF4_0000)
//!     .with_rx_size(2048)
//!     .with_rx_period(32);
//! ```

// Submodules
pub mod config;
pub mod error;

// Re-exports for convenience
pub use config::{DmaConfig, DmaState, FlushMode};
pub use error::{
    ChannelError, ChannelResult, Error, Result, RxError, RxResult, TxError, TxResult,
};
