//! Transmit circular buffer.
//!
//! The line discipline writes at `head`; the transmit engine drains from
//! `tail`. Each index has exactly one writer, so the shared port lock is
//! the only synchronization needed. One slot is always left empty so that
//! `head == tail` unambiguously means empty.

/// Fixed-capacity byte ring. `N` must be a power of two.
pub struct TxRing<const N: usize> {
    buf: [u8; N],
    head: usize,
    tail: usize,
}

impl<const N: usize> TxRing<N> {
    const MASK: usize = {
        assert!(N.is_power_of_two(), "TxRing capacity must be a power of two");
        N - 1
    };

    /// Create an empty ring. Const-compatible.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: [0u8; N],
            head: 0,
            tail: 0,
        }
    }

    /// Ring capacity in bytes (usable space is one less)
    #[inline(always)]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Producer index
    #[inline(always)]
    #[must_use]
    pub const fn head(&self) -> usize {
        self.head
    }

    /// Consumer index
    #[inline(always)]
    #[must_use]
    pub const fn tail(&self) -> usize {
        self.tail
    }

    /// Bytes queued for transmission
    #[inline(always)]
    #[must_use]
    pub const fn pending(&self) -> usize {
        self.head.wrapping_sub(self.tail) & Self::MASK
    }

    /// Bytes that can still be written
    #[inline(always)]
    #[must_use]
    pub const fn space(&self) -> usize {
        self.tail.wrapping_sub(self.head.wrapping_add(1)) & Self::MASK
    }

    /// Nothing queued
    #[inline(always)]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// No room for another byte
    #[inline(always)]
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.space() == 0
    }

    /// Largest contiguous pending run starting at `tail`.
    ///
    /// Stops at `head` or at the physical end of the buffer, whichever
    /// comes first.
    #[must_use]
    pub const fn count_to_end(&self) -> usize {
        if self.head >= self.tail {
            self.head - self.tail
        } else {
            N - self.tail
        }
    }

    /// Largest contiguous free run starting at `head`.
    #[must_use]
    pub const fn space_to_end(&self) -> usize {
        let end = N - self.head;
        let space = self.space();
        if space < end { space } else { end }
    }

    /// Queue as much of `data` as fits. Returns the number of bytes taken.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let mut written = 0;
        while written < data.len() {
            let run = core::cmp::min(self.space_to_end(), data.len() - written);
            if run == 0 {
                break;
            }
            self.buf[self.head..self.head + run].copy_from_slice(&data[written..written + run]);
            self.head = (self.head + run) & Self::MASK;
            written += run;
        }
        written
    }

    /// Mark `n` bytes at `tail` as consumed.
    #[inline(always)]
    pub fn advance_tail(&mut self, n: usize) {
        self.tail = (self.tail + n) & Self::MASK;
    }

    /// Drop everything queued.
    pub fn clear(&mut self) {
        self.tail = self.head;
    }

    /// Contiguous pending bytes starting at `tail`
    #[must_use]
    pub fn pending_slice(&self) -> &[u8] {
        &self.buf[self.tail..self.tail + self.count_to_end()]
    }

    /// Base address of the backing storage (mapped for device reads)
    #[inline(always)]
    pub fn as_ptr(&self) -> *const u8 {
        self.buf.as_ptr()
    }
}

impl<const N: usize> Default for TxRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
