//! Receive engine.
//!
//! The receive buffer is filled by a cyclic transfer submitted once at
//! acquisition and never resubmitted. The hardware write cursor is not
//! exposed directly; it is recovered from the residue of the running
//! transfer: `position = size - residue`. Each period completion delivers
//! the bytes between the last delivered position (`rx_head_pos`) and the
//! current one, in two spans when the cursor has wrapped.

use super::Counters;
use crate::dma::{CoherentBuffer, Cookie, DmaService};
use crate::driver::config::FlushMode;
use crate::driver::error::{RxError, RxResult};
use crate::ldisc::LineDiscipline;

/// Per-port receive state
pub struct RxSession<D: DmaService> {
    /// Channel handle
    pub(crate) channel: D::Channel,
    /// Coherent buffer the hardware cycles over
    pub(crate) buffer: D::Buffer,
    /// Descriptor of the cyclic transfer
    cookie: Cookie,
    /// Usable buffer size
    size: usize,
    /// Everything before this offset has been delivered
    rx_head_pos: usize,
    /// The cyclic transfer is running
    running: bool,
    /// Hardware has written at least once
    started: bool,
    /// The channel was terminated by a final flush
    terminated: bool,
}

impl<D: DmaService> RxSession<D> {
    pub(crate) fn new(channel: D::Channel, buffer: D::Buffer, cookie: Cookie, size: usize) -> Self {
        Self {
            channel,
            buffer,
            cookie,
            size,
            rx_head_pos: 0,
            running: false,
            started: false,
            terminated: false,
        }
    }

    /// Mark the cyclic transfer as running.
    pub(crate) fn start(&mut self) {
        self.running = true;
    }

    /// The cyclic transfer is running
    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Hardware has written at least once
    #[inline(always)]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Offset up to which data has been delivered
    #[inline(always)]
    pub fn rx_head_pos(&self) -> usize {
        self.rx_head_pos
    }

    /// Receive buffer size
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Descriptor of the cyclic transfer
    #[inline(always)]
    pub fn cookie(&self) -> Cookie {
        self.cookie
    }

    /// Translate a residue reading into a write position.
    ///
    /// `0` and anything above the buffer size are not valid readings for a
    /// running cyclic transfer.
    #[must_use]
    pub fn position(&self, residue: usize) -> Option<usize> {
        if residue == 0 || residue > self.size {
            None
        } else {
            Some(self.size - residue)
        }
    }

    /// Period completion: deliver everything written since the last call.
    ///
    /// Returns the number of bytes taken from the buffer. An invalid residue
    /// is logged and skipped; the next valid reading picks up where this one
    /// would have.
    pub fn on_period<L: LineDiscipline>(
        &mut self,
        dma: &mut D,
        ldisc: &mut L,
        counters: &mut Counters,
    ) -> usize {
        ldisc.rx_activity();

        let residue = dma.residue(&self.channel, self.cookie);
        let Some(new_pos) = self.position(residue) else {
            info!("rx dma: bad residue {} (buffer {})", residue, self.size);
            counters.invalid_residue = counters.invalid_residue.wrapping_add(1);
            return 0;
        };

        // Until the first nonzero position the buffer may hold stale bytes
        if new_pos > 0 {
            self.started = true;
        }

        let mut count = 0;
        if self.started {
            let head = self.rx_head_pos;
            let data = self.buffer.as_slice();

            if new_pos >= head {
                deliver(ldisc, &data[head..new_pos], counters);
                count = new_pos - head;
            } else {
                deliver(ldisc, &data[head..self.size], counters);
                deliver(ldisc, &data[..new_pos], counters);
                count = self.size - head + new_pos;
            }

            self.rx_head_pos = new_pos;
        }

        counters.rx = counters.rx.wrapping_add(count);
        ldisc.flush_delivered();
        count
    }

    /// Drain the buffer with the hardware cursor frozen.
    ///
    /// `Transient` resumes the cyclic transfer afterwards; `Final` terminates
    /// it and the session stops running.
    pub fn flush<L: LineDiscipline>(
        &mut self,
        dma: &mut D,
        ldisc: &mut L,
        counters: &mut Counters,
        mode: FlushMode,
    ) -> RxResult<usize> {
        if !self.running {
            return Err(RxError::NotRunning);
        }

        dma.pause(&self.channel);
        let count = self.on_period(dma, ldisc, counters);

        match mode {
            FlushMode::Transient => dma.resume(&self.channel),
            FlushMode::Final => {
                dma.terminate_sync(&self.channel);
                self.running = false;
                self.terminated = true;
            }
        }
        Ok(count)
    }

    /// Terminate, free the buffer and give the channel back.
    ///
    /// A channel already stopped by a final flush is not terminated again.
    pub(crate) fn release(mut self, dma: &mut D) {
        if !self.terminated {
            dma.terminate_sync(&self.channel);
        }
        self.running = false;
        self.rx_head_pos = 0;
        dma.free_coherent(&self.channel, self.buffer);
        dma.release_channel(self.channel);
    }
}

fn deliver<L: LineDiscipline>(ldisc: &mut L, span: &[u8], counters: &mut Counters) {
    if span.is_empty() {
        return;
    }
    let accepted = ldisc.deliver(span);
    if accepted < span.len() {
        error!("rx dma: consumer took {} of {} bytes", accepted, span.len());
        counters.rx_dropped = counters.rx_dropped.wrapping_add(span.len() - accepted);
    }
}

// =============================================================================
// Tests
// =============================================================================
