//! Serial DMA Engine
//!
//! A `no_std`, `no_alloc` DMA transport engine for UART-class serial ports.
//!
//! The engine offloads both directions of a port to a platform DMA
//! controller:
//!
//! - **Transmit**: the line discipline fills a power-of-two [`TxRing`]; the
//!   engine drains it with one-shot bursts, one contiguous run at a time,
//!   chaining the next burst from each completion.
//! - **Receive**: a single cyclic transfer runs over a coherent buffer for
//!   the lifetime of the port. The hardware write position is recovered
//!   from the transfer residue and everything between the last delivered
//!   position and the current one is handed to the line discipline.
//!
//! # Architecture
//!
//! 1. **Collaborators**: [`DmaService`] (downward, the platform DMA layer)
//!    and [`LineDiscipline`] (upward, the terminal layer)
//! 2. **Engine** ([`engine`]): channel acquisition, transmit and receive
//!    sessions, and the [`UartDma`] lifecycle facade
//! 3. **Port** ([`SerialPort`]): ring, line discipline and engine together;
//!    [`sync::SharedPort`] puts it behind a critical section
//!
//! # Features
//!
//! - `critical-section` (default): Enable the ISR-safe `SharedPort` wrapper
//! - `defmt`: Enable defmt formatting and route diagnostics through defmt
//! - `log`: Route diagnostics through the `log` facade
//!
//! # Example
//!
//! ```ignore
//! use serial_dma::{Completion, DmaConfig, FlushMode, SharedPort};
//!
//! static PORT: SharedPort<PlatformDma, Tty, 4096> =
//!     SharedPort::new(PlatformDma::new(), Tty::new(), DmaConfig::for_mapbase(UART1_BASE));
//!
//! if PORT.startup().is_err() {
//!     // run the port interrupt-driven
//! }
//!
//! PORT.write(b"AT\r\n");
//!
//! // DMA interrupt, routed by the completion tag of the descriptor
//! PORT.on_dma_complete(Completion::Rx);
//!
//! // UART receive-timeout interrupt
//! PORT.flush(FlushMode::Transient).ok();
//! ```
//!
//! # Memory Requirements
//!
//! Per port, with default configuration:
//! - Transmit ring: `N` bytes inside the port (4 KB for `N = 4096`)
//! - Receive buffer: 4 KB of coherent memory from the DMA service

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

// =============================================================================
// Modules
// =============================================================================

// Internal implementation details (pub(crate) only). Declared first so the
// logging macros are in scope for everything below.
#[macro_use]
mod internal;

pub mod dma;
pub mod driver;
pub mod engine;
pub mod ldisc;
pub mod port;
pub mod ring;

#[cfg(feature = "critical-section")]
#[cfg_attr(docsrs, doc(cfg(feature = "critical-section")))]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use dma::{
    BusWidth, Capabilities, CapabilityMask, CoherentBuffer, Completion, Cookie, Direction,
    DmaAddr, DmaService, ResidueGranularity, ServiceError, SlaveConfig,
};
pub use driver::config::{DmaConfig, DmaState, FlushMode};
pub use driver::error::{
    ChannelError, ChannelResult, Error, Result, RxError, RxResult, TxError, TxResult,
};
pub use engine::{Counters, RxSession, Sessions, TxSession, UartDma};
pub use ldisc::LineDiscipline;
pub use port::SerialPort;
pub use ring::TxRing;

// Re-export sync types when critical-section is enabled
#[cfg(feature = "critical-section")]
pub use sync::SharedPort;

/// Shared engine constants.
///
/// These are grouped into a dedicated module to keep the top-level facade
/// focused on engine types and integration points.
pub mod constants {
    pub use crate::internal::constants::{
        // Buffer sizes
        DEFAULT_RX_PERIOD,
        DEFAULT_RX_SIZE,
        DEFAULT_XMIT_SIZE,
        // Device layout
        UART_RX_OFFSET,
        UART_TX_OFFSET,
        // Thresholds
        WAKEUP_CHARS,
    };
}

// =============================================================================
// Macro Helpers
// =============================================================================

/// Declare a static, ISR-safe serial port.
///
/// The transmit ring defaults to 4096 bytes.
///
/// # Examples
///
/// ```ignore
/// serial_dma::serial_port_static!(
///     UART1: PlatformDma, Tty = PlatformDma::new(), Tty::new(),
///     serial_dma::DmaConfig::for_mapbase(UART1_BASE)
/// );
///
/// UART1.startup().ok();
/// ```
#[cfg(feature = "critical-section")]
#[macro_export]
macro_rules! serial_port_static {
    ($name:ident: $dma:ty, $ldisc:ty = $dma_init:expr, $ldisc_init:expr, $config:expr) => {
        $crate::serial_port_static!(
            $name: $dma, $ldisc, 4096 = $dma_init, $ldisc_init, $config
        );
    };
    (
        $name:ident: $dma:ty, $ldisc:ty, $size:literal =
        $dma_init:expr, $ldisc_init:expr, $config:expr
    ) => {
        static $name: $crate::sync::SharedPort<$dma, $ldisc, $size> =
            $crate::sync::SharedPort::new($dma_init, $ldisc_init, $config);
    };
}
