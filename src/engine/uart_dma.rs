//! Per-port DMA engine.
//!
//! [`UartDma`] owns the DMA service and the sessions of one port and walks
//! them through the lifecycle:
//!
//! ```text
//!   Terminated --acquire--> Active --flush(Final)--> Draining
//!       ^                     |                         |
//!       +------ release ------+---------- release ------+
//! ```
//!
//! In `Draining` the receive transfer is stopped. A transmit burst already
//! in flight still completes and chains, but no new burst is started from
//! outside.

use super::Counters;
use super::channel::{self, Sessions};
use crate::dma::{Completion, DmaService};
use crate::driver::config::{DmaConfig, DmaState, FlushMode};
use crate::driver::error::{ChannelError, ChannelResult, RxError, RxResult, TxError, TxResult};
use crate::ldisc::LineDiscipline;
use crate::ring::TxRing;

/// DMA engine for one serial port
pub struct UartDma<D: DmaService> {
    dma: D,
    config: DmaConfig,
    sessions: Option<Sessions<D>>,
    state: DmaState,
    counters: Counters,
}

impl<D: DmaService> UartDma<D> {
    /// Create an engine in the `Terminated` state. Nothing is requested
    /// until [`acquire`](Self::acquire).
    pub const fn new(dma: D, config: DmaConfig) -> Self {
        Self {
            dma,
            config,
            sessions: None,
            state: DmaState::Terminated,
            counters: Counters {
                tx: 0,
                rx: 0,
                rx_dropped: 0,
                invalid_residue: 0,
                tx_submit_errors: 0,
            },
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current lifecycle state
    #[inline(always)]
    pub fn state(&self) -> DmaState {
        self.state
    }

    /// Byte and event counters
    #[inline(always)]
    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Active configuration
    #[inline(always)]
    pub fn config(&self) -> &DmaConfig {
        &self.config
    }

    /// Replace the configuration. Only allowed while terminated.
    pub fn set_config(&mut self, config: DmaConfig) -> ChannelResult<()> {
        if self.state != DmaState::Terminated {
            return Err(ChannelError::AlreadyAcquired);
        }
        self.config = config;
        Ok(())
    }

    /// The DMA service
    pub fn dma(&self) -> &D {
        &self.dma
    }

    /// The DMA service, mutably
    pub fn dma_mut(&mut self) -> &mut D {
        &mut self.dma
    }

    /// Sessions, while acquired
    pub fn sessions(&self) -> Option<&Sessions<D>> {
        self.sessions.as_ref()
    }

    /// A transmit channel is held
    pub fn has_tx(&self) -> bool {
        self.sessions.as_ref().is_some_and(|s| s.tx.is_some())
    }

    /// A transmit burst is in flight
    pub fn tx_running(&self) -> bool {
        self.sessions
            .as_ref()
            .and_then(|s| s.tx.as_ref())
            .is_some_and(|tx| tx.is_running())
    }

    /// Delivered position in the receive buffer, while acquired
    pub fn rx_head_pos(&self) -> Option<usize> {
        self.sessions.as_ref().map(|s| s.rx.rx_head_pos())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Acquire channels and start receiving.
    ///
    /// On error nothing stays allocated and the state remains `Terminated`;
    /// the port should run without DMA.
    pub fn acquire<const N: usize>(&mut self, ring: &TxRing<N>) -> ChannelResult<()> {
        if self.state != DmaState::Terminated {
            return Err(ChannelError::AlreadyAcquired);
        }

        let sessions = channel::acquire(&mut self.dma, ring, &self.config)?;
        info!(
            "uart dma: active (rx {} bytes, tx {})",
            self.config.rx_size,
            sessions.tx.is_some()
        );
        self.sessions = Some(sessions);
        self.state = DmaState::Active;
        Ok(())
    }

    /// Stop both directions and give everything back.
    ///
    /// Data already written to the receive buffer is delivered before the
    /// receive channel is terminated. An in-flight transmit burst is
    /// abandoned. Calling this again, or without a prior `acquire`, does
    /// nothing.
    pub fn release<L: LineDiscipline>(&mut self, ldisc: &mut L) {
        let Some(mut sessions) = self.sessions.take() else {
            self.state = DmaState::Terminated;
            return;
        };

        if self.state == DmaState::Active {
            self.state = DmaState::Draining;
            if let Err(e) =
                sessions
                    .rx
                    .flush(&mut self.dma, ldisc, &mut self.counters, FlushMode::Final)
            {
                debug!("uart dma: final flush skipped: {}", e.as_str());
            }
        }

        channel::release(&mut self.dma, sessions);
        self.state = DmaState::Terminated;
        info!("uart dma: released");
    }

    // =========================================================================
    // Transmit
    // =========================================================================

    /// Start a transmit burst for pending ring data.
    ///
    /// Returns `Err(TxError::NoChannel)` when DMA transmit is unavailable and
    /// `Err(TxError::SubmitFailed)` when the burst could not be submitted;
    /// either way the caller services the ring byte-wise.
    pub fn submit_pending<L: LineDiscipline, const N: usize>(
        &mut self,
        ring: &TxRing<N>,
        ldisc: &mut L,
    ) -> TxResult<()> {
        if self.state != DmaState::Active {
            return Err(TxError::NoChannel);
        }
        let tx = self
            .sessions
            .as_mut()
            .and_then(|s| s.tx.as_mut())
            .ok_or(TxError::NoChannel)?;
        tx.submit_pending(&mut self.dma, ring, ldisc, &mut self.counters)
    }

    /// Transmit burst completion.
    pub fn on_tx_complete<L: LineDiscipline, const N: usize>(
        &mut self,
        ring: &mut TxRing<N>,
        ldisc: &mut L,
    ) {
        match self.sessions.as_mut().and_then(|s| s.tx.as_mut()) {
            Some(tx) => tx.complete(&mut self.dma, ring, ldisc, &mut self.counters),
            None => debug!("uart dma: tx completion without a channel"),
        }
    }

    // =========================================================================
    // Receive
    // =========================================================================

    /// Receive period completion. Returns the number of bytes delivered.
    pub fn on_rx_complete<L: LineDiscipline>(&mut self, ldisc: &mut L) -> usize {
        match self.sessions.as_mut() {
            Some(sessions) if sessions.rx.is_running() => {
                sessions.rx.on_period(&mut self.dma, ldisc, &mut self.counters)
            }
            _ => {
                debug!("uart dma: rx completion while stopped");
                0
            }
        }
    }

    /// Drain the receive buffer now.
    ///
    /// Used when the device signals data the period completion has not
    /// covered yet (receive timeout). `FlushMode::Final` stops receiving
    /// and moves the engine to `Draining`.
    pub fn flush<L: LineDiscipline>(&mut self, mode: FlushMode, ldisc: &mut L) -> RxResult<usize> {
        if self.state != DmaState::Active {
            return Err(RxError::NotRunning);
        }
        let sessions = self.sessions.as_mut().ok_or(RxError::NotRunning)?;
        let count = sessions
            .rx
            .flush(&mut self.dma, ldisc, &mut self.counters, mode)?;

        if mode == FlushMode::Final {
            self.state = DmaState::Draining;
        }
        Ok(count)
    }

    /// Route a descriptor completion to its entry point.
    pub fn handle_completion<L: LineDiscipline, const N: usize>(
        &mut self,
        completion: Completion,
        ring: &mut TxRing<N>,
        ldisc: &mut L,
    ) {
        match completion {
            Completion::Tx => self.on_tx_complete(ring, ldisc),
            Completion::Rx => {
                self.on_rx_complete(ldisc);
            }
        }
    }
}

impl<D: DmaService> Drop for UartDma<D> {
    /// Channels still held are returned without a final flush.
    fn drop(&mut self) {
        if let Some(sessions) = self.sessions.take() {
            channel::release(&mut self.dma, sessions);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
