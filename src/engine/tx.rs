//! Transmit engine.
//!
//! Drains the transmit ring one contiguous run per burst. The completion of
//! a burst advances `tail` and immediately submits the next run, so a full
//! ring empties through a chain of completions without polling. A run never
//! wraps: the bytes after the physical end of the ring go out in the next
//! burst.

use super::Counters;
use crate::dma::{Completion, Cookie, Direction, DmaAddr, DmaService};
use crate::driver::error::{TxError, TxResult};
use crate::internal::constants::WAKEUP_CHARS;
use crate::ldisc::LineDiscipline;
use crate::ring::TxRing;

/// Per-port transmit state
pub struct TxSession<D: DmaService> {
    /// Channel handle
    pub(crate) channel: D::Channel,
    /// Bus address of the mapped ring
    device_address: DmaAddr,
    /// Mapped length (ring capacity)
    map_len: usize,
    /// A burst is in flight
    running: bool,
    /// The last submission failed
    last_error: bool,
    /// Length of the in-flight burst
    burst_size: usize,
    /// Descriptor of the in-flight burst
    cookie: Option<Cookie>,
}

impl<D: DmaService> TxSession<D> {
    pub(crate) fn new(channel: D::Channel, device_address: DmaAddr, map_len: usize) -> Self {
        Self {
            channel,
            device_address,
            map_len,
            running: false,
            last_error: false,
            burst_size: 0,
            cookie: None,
        }
    }

    /// A burst is in flight
    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The most recent submission failed
    #[inline(always)]
    pub fn last_error(&self) -> bool {
        self.last_error
    }

    /// Length of the in-flight burst (0 when idle)
    #[inline(always)]
    pub fn burst_size(&self) -> usize {
        self.burst_size
    }

    /// Bus address of the mapped ring
    #[inline(always)]
    pub fn device_address(&self) -> DmaAddr {
        self.device_address
    }

    /// Descriptor of the in-flight burst
    #[inline(always)]
    pub fn cookie(&self) -> Option<Cookie> {
        self.cookie
    }

    /// Start a burst for the pending bytes, if possible.
    ///
    /// Returns `Ok(())` without doing anything while a burst is in flight.
    /// When the ring is empty or transmission is stopped the pipeline is
    /// reported idle to the line discipline. A submission failure sets
    /// `last_error`; the caller should fall back to byte-wise service.
    pub fn submit_pending<L: LineDiscipline, const N: usize>(
        &mut self,
        dma: &mut D,
        ring: &TxRing<N>,
        ldisc: &mut L,
        counters: &mut Counters,
    ) -> TxResult<()> {
        if self.running {
            return Ok(());
        }

        if ldisc.tx_stopped() || ring.is_empty() {
            ldisc.tx_idle();
            return Ok(());
        }

        let len = ring.count_to_end();
        let addr = self.device_address + ring.tail() as DmaAddr;

        let Some(cookie) =
            dma.submit_one_shot(&self.channel, addr, len, Direction::MemToDev, Completion::Tx)
        else {
            self.last_error = true;
            counters.tx_submit_errors = counters.tx_submit_errors.wrapping_add(1);
            warn!("tx dma: cannot submit {} bytes at tail {}", len, ring.tail());
            return Err(TxError::SubmitFailed);
        };

        self.running = true;
        self.burst_size = len;
        self.cookie = Some(cookie);

        dma.sync_for_device(&self.channel, self.device_address, self.map_len);
        dma.issue_pending(&self.channel);

        if self.last_error {
            self.last_error = false;
            ldisc.stop_pio_tx();
        }
        Ok(())
    }

    /// Burst completion.
    ///
    /// Consumes the burst from the ring, wakes writers below the low-water
    /// mark and chains the next burst. If chaining fails, byte-wise service
    /// is requested from the line discipline since there is no caller to
    /// hand the error to.
    pub fn complete<L: LineDiscipline, const N: usize>(
        &mut self,
        dma: &mut D,
        ring: &mut TxRing<N>,
        ldisc: &mut L,
        counters: &mut Counters,
    ) {
        dma.sync_for_cpu(&self.channel, self.device_address, self.map_len);

        if !self.running {
            debug!("tx dma: completion with no burst in flight");
            return;
        }

        let moved = self.burst_size;
        self.running = false;
        self.burst_size = 0;
        self.cookie = None;

        ring.advance_tail(moved);
        counters.tx = counters.tx.wrapping_add(moved);

        if ring.pending() < WAKEUP_CHARS {
            ldisc.write_wakeup();
        }

        if self.submit_pending(dma, ring, ldisc, counters).is_err() {
            ldisc.start_pio_tx();
        }
    }

    /// Abort the in-flight burst.
    ///
    /// The ring is left alone: `tail` only moves on completion, so the
    /// abandoned bytes stay pending and are not retried by this session.
    pub fn terminate(&mut self, dma: &mut D) {
        dma.terminate_sync(&self.channel);
        self.running = false;
        self.burst_size = 0;
        self.cookie = None;
    }

    /// Terminate, unmap the ring and give the channel back.
    pub(crate) fn release(mut self, dma: &mut D) {
        self.terminate(dma);
        dma.unmap_single(&self.channel, self.device_address, self.map_len);
        dma.release_channel(self.channel);
    }
}

// =============================================================================
// Tests
// =============================================================================
