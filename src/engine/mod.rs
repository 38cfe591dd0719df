//! DMA transport engine.
//!
//! - [`channel`]: channel acquisition, capability negotiation, buffer setup
//!   and ordered teardown
//! - [`tx`]: one-shot transmit bursts draining the [`TxRing`](crate::TxRing)
//! - [`rx`]: cyclic receive buffer tracked by residue readback
//! - [`uart_dma`]: the per-port facade with the `Active -> Draining ->
//!   Terminated` lifecycle
//!
//! All engine state lives in owned sessions ([`TxSession`], [`RxSession`])
//! that are passed the DMA service, ring and line discipline by reference.
//! Nothing here locks: callers hold the port lock (see `SharedPort`).

pub mod channel;
pub mod rx;
pub mod tx;
pub mod uart_dma;

pub use channel::Sessions;
pub use rx::RxSession;
pub use tx::TxSession;
pub use uart_dma::UartDma;

/// Byte and event counters for one port
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Counters {
    /// Bytes moved to the device by completed bursts
    pub tx: usize,
    /// Bytes taken from the receive buffer
    pub rx: usize,
    /// Received bytes the line discipline refused
    pub rx_dropped: usize,
    /// Residue readings rejected as out of range
    pub invalid_residue: usize,
    /// Transmit bursts that could not be submitted
    pub tx_submit_errors: usize,
}
