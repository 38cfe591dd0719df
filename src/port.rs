//! Serial port: transmit ring, line discipline and DMA engine together.
//!
//! This is the unit the port lock protects. Interrupt handlers and the
//! writer path both go through it; see `SharedPort` for the
//! critical-section wrapper.

use crate::dma::{Completion, DmaService};
use crate::driver::config::{DmaConfig, FlushMode};
use crate::driver::error::{ChannelResult, RxResult, TxResult};
use crate::engine::UartDma;
use crate::ldisc::LineDiscipline;
use crate::ring::TxRing;

/// A UART-class port with DMA offload.
///
/// `N` is the transmit ring capacity and must be a power of two.
///
/// # Address stability
///
/// [`startup`](Self::startup) maps the transmit ring for the DMA
/// controller. The port must not move until [`shutdown`](Self::shutdown);
/// keep it in a `static` (for example inside a `SharedPort`) or otherwise
/// pinned.
pub struct SerialPort<D: DmaService, L: LineDiscipline, const N: usize> {
    xmit: TxRing<N>,
    ldisc: L,
    dma: UartDma<D>,
}

impl<D: DmaService, L: LineDiscipline, const N: usize> SerialPort<D, L, N> {
    /// Create a port. Const-compatible; DMA stays off until `startup`.
    pub const fn new(dma: D, ldisc: L, config: DmaConfig) -> Self {
        Self {
            xmit: TxRing::new(),
            ldisc,
            dma: UartDma::new(dma, config),
        }
    }

    /// Acquire DMA channels and start receiving.
    ///
    /// On error the port keeps working without DMA: received bytes and the
    /// transmit ring must be serviced byte-wise.
    pub fn startup(&mut self) -> ChannelResult<()> {
        self.dma.acquire(&self.xmit)
    }

    /// Drain receive, abandon any transmit burst and release DMA.
    pub fn shutdown(&mut self) {
        self.dma.release(&mut self.ldisc);
    }

    /// Queue bytes for transmission and kick the transmit engine.
    ///
    /// Returns how many bytes fit in the ring.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let written = self.xmit.write(data);
        if written > 0
            && let Err(e) = self.start_tx()
        {
            trace!("port: byte-wise transmit ({})", e.as_str());
        }
        written
    }

    /// Start a transmit burst for whatever is pending.
    ///
    /// On error byte-wise service has already been requested from the line
    /// discipline.
    pub fn start_tx(&mut self) -> TxResult<()> {
        let result = self.dma.submit_pending(&self.xmit, &mut self.ldisc);
        if result.is_err() && !self.xmit.is_empty() {
            self.ldisc.start_pio_tx();
        }
        result
    }

    /// Move up to `out.len()` pending bytes out for byte-wise transmission.
    ///
    /// Returns 0 while a DMA burst owns the ring tail.
    pub fn pio_take(&mut self, out: &mut [u8]) -> usize {
        if self.dma.tx_running() {
            return 0;
        }

        let mut taken = 0;
        while taken < out.len() && !self.xmit.is_empty() {
            let run = self.xmit.pending_slice();
            let n = run.len().min(out.len() - taken);
            out[taken..taken + n].copy_from_slice(&run[..n]);
            self.xmit.advance_tail(n);
            taken += n;
        }

        if self.xmit.is_empty() {
            self.ldisc.stop_pio_tx();
        }
        taken
    }

    /// Route a DMA completion. Call from the DMA interrupt.
    pub fn handle_completion(&mut self, completion: Completion) {
        self.dma
            .handle_completion(completion, &mut self.xmit, &mut self.ldisc);
    }

    /// Transmit burst completion
    pub fn dma_tx_complete(&mut self) {
        self.dma.on_tx_complete(&mut self.xmit, &mut self.ldisc);
    }

    /// Receive period completion. Returns the number of bytes delivered.
    pub fn dma_rx_complete(&mut self) -> usize {
        self.dma.on_rx_complete(&mut self.ldisc)
    }

    /// Drain received data ahead of the next period completion (receive
    /// timeout, line status event).
    pub fn flush(&mut self, mode: FlushMode) -> RxResult<usize> {
        self.dma.flush(mode, &mut self.ldisc)
    }

    /// Transmit ring
    pub fn xmit(&self) -> &TxRing<N> {
        &self.xmit
    }

    /// Transmit ring, mutably
    pub fn xmit_mut(&mut self) -> &mut TxRing<N> {
        &mut self.xmit
    }

    /// Line discipline
    pub fn ldisc(&self) -> &L {
        &self.ldisc
    }

    /// Line discipline, mutably
    pub fn ldisc_mut(&mut self) -> &mut L {
        &mut self.ldisc
    }

    /// DMA engine
    pub fn engine(&self) -> &UartDma<D> {
        &self.dma
    }

    /// DMA engine, mutably
    pub fn engine_mut(&mut self) -> &mut UartDma<D> {
        &mut self.dma
    }
}

// =============================================================================
// Tests
// =============================================================================
