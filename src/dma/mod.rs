//! DMA offload service boundary.
//!
//! The engine never programs a DMA controller itself. Everything it needs
//! from the platform's DMA layer (channel requests, capability queries,
//! descriptor submission, residue readback, pause/terminate, coherent
//! buffers and streaming mappings) goes through [`DmaService`].
//!
//! Completion callbacks are not closures: every submitted descriptor is
//! tagged with a [`Completion`], and the platform routes the interrupt for
//! that descriptor to the matching entry point on the port
//! (`SerialPort::handle_completion`).

use crate::driver::error::{ChannelError, ChannelResult};

/// Bus address as seen by the DMA controller
pub type DmaAddr = u64;

/// Transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Host memory to device FIFO (transmit)
    MemToDev,
    /// Device FIFO to host memory (receive)
    DevToMem,
}

/// Device-side access width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BusWidth {
    /// 1 byte per beat (UART FIFOs)
    #[default]
    Byte = 1,
    /// 2 bytes per beat
    HalfWord = 2,
    /// 4 bytes per beat
    Word = 4,
}

/// Per-channel slave configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlaveConfig {
    /// Transfer direction
    pub direction: Direction,
    /// Device-side access width
    pub addr_width: BusWidth,
    /// Device FIFO bus address (source for receive, destination for transmit)
    pub device_addr: DmaAddr,
}

impl SlaveConfig {
    /// Receive configuration reading from `fifo`
    #[must_use]
    pub const fn rx(fifo: DmaAddr, width: BusWidth) -> Self {
        Self {
            direction: Direction::DevToMem,
            addr_width: width,
            device_addr: fifo,
        }
    }

    /// Transmit configuration writing to `fifo`
    #[must_use]
    pub const fn tx(fifo: DmaAddr, width: BusWidth) -> Self {
        Self {
            direction: Direction::MemToDev,
            addr_width: width,
            device_addr: fifo,
        }
    }
}

/// How precisely a channel can report the residue of an in-flight transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResidueGranularity {
    /// Residue only changes when a whole descriptor completes
    Descriptor,
    /// Residue is updated per period/segment
    Segment,
    /// Residue is updated per burst
    Burst,
}

/// Channel capabilities, queried once at acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Capabilities {
    /// Channel can pause an in-flight transfer
    pub pause: bool,
    /// Channel can resume a paused transfer
    pub resume: bool,
    /// Channel can terminate transfers
    pub terminate: bool,
    /// Residue reporting granularity
    pub residue_granularity: ResidueGranularity,
}

impl Capabilities {
    /// Capabilities of a fully featured channel
    #[must_use]
    pub const fn full() -> Self {
        Self {
            pause: true,
            resume: true,
            terminate: true,
            residue_granularity: ResidueGranularity::Burst,
        }
    }

    /// Check the requirements of the cyclic receive path.
    ///
    /// The hardware cursor is inferred from the residue, so anything coarser
    /// than per-descriptor reporting would freeze the position for a whole
    /// buffer lap.
    pub const fn check_rx(&self) -> ChannelResult<()> {
        if !self.pause {
            return Err(ChannelError::MissingPause);
        }
        if !self.terminate {
            return Err(ChannelError::MissingTerminate);
        }
        if matches!(self.residue_granularity, ResidueGranularity::Descriptor) {
            return Err(ChannelError::CoarseResidue);
        }
        Ok(())
    }

    /// Check the requirements of the one-shot transmit path.
    pub const fn check_tx(&self) -> ChannelResult<()> {
        if !self.terminate {
            return Err(ChannelError::MissingTerminate);
        }
        Ok(())
    }
}

/// Channel request mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CapabilityMask(u32);

impl CapabilityMask {
    /// Slave (device) transfers
    pub const SLAVE: Self = Self(1 << 0);
    /// Cyclic transfers
    pub const CYCLIC: Self = Self(1 << 1);

    /// Union of two masks
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Check whether every bit of `other` is set
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Identifier of a submitted descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cookie(pub u32);

/// Which engine entry point a descriptor's completion must be routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Completion {
    /// One-shot transmit burst finished
    Tx,
    /// Cyclic receive period elapsed
    Rx,
}

/// Opaque failure reported by the DMA service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceError;

/// Coherent (device-visible, cache-consistent) buffer handed out by the service.
pub trait CoherentBuffer {
    /// Bus address of the first byte
    fn bus_addr(&self) -> DmaAddr;

    /// CPU view of the buffer.
    ///
    /// The hardware keeps writing into the buffer while this view exists;
    /// callers only read ranges the write cursor has already passed.
    fn as_slice(&self) -> &[u8];

    /// Buffer length in bytes
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Whether the buffer is zero-sized
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The platform DMA layer.
///
/// Implementations wrap the SoC's DMA controller driver. Methods mirror a
/// dmaengine-style slave API: a `None` return means the resource could not
/// be obtained.
pub trait DmaService {
    /// Channel handle
    type Channel;
    /// Coherent buffer handle
    type Buffer: CoherentBuffer;

    /// Request a channel for `direction` supporting everything in `mask`.
    fn request_channel(&mut self, direction: Direction, mask: CapabilityMask)
    -> Option<Self::Channel>;

    /// Query the capabilities of an acquired channel.
    fn capabilities(&mut self, chan: &Self::Channel) -> Result<Capabilities, ServiceError>;

    /// Apply a slave configuration.
    fn configure(&mut self, chan: &Self::Channel, config: &SlaveConfig)
    -> Result<(), ServiceError>;

    /// Allocate a coherent buffer of `len` bytes for `chan`'s device.
    fn alloc_coherent(&mut self, chan: &Self::Channel, len: usize) -> Option<Self::Buffer>;

    /// Free a buffer obtained from [`alloc_coherent`](Self::alloc_coherent).
    fn free_coherent(&mut self, chan: &Self::Channel, buffer: Self::Buffer);

    /// Map `len` bytes at `ptr` for device reads.
    fn map_single(&mut self, chan: &Self::Channel, ptr: *const u8, len: usize) -> Option<DmaAddr>;

    /// Undo [`map_single`](Self::map_single).
    fn unmap_single(&mut self, chan: &Self::Channel, addr: DmaAddr, len: usize);

    /// Prepare and submit a one-shot transfer. Not started until
    /// [`issue_pending`](Self::issue_pending).
    fn submit_one_shot(
        &mut self,
        chan: &Self::Channel,
        addr: DmaAddr,
        len: usize,
        direction: Direction,
        completion: Completion,
    ) -> Option<Cookie>;

    /// Prepare and submit a cyclic transfer raising `completion` every
    /// `period` bytes. Not started until [`issue_pending`](Self::issue_pending).
    fn submit_cyclic(
        &mut self,
        chan: &Self::Channel,
        addr: DmaAddr,
        len: usize,
        period: usize,
        direction: Direction,
        completion: Completion,
    ) -> Option<Cookie>;

    /// Start everything submitted on `chan`.
    fn issue_pending(&mut self, chan: &Self::Channel);

    /// Bytes remaining in the current pass of `cookie`'s transfer.
    fn residue(&mut self, chan: &Self::Channel, cookie: Cookie) -> usize;

    /// Freeze the channel (the write cursor stops moving).
    fn pause(&mut self, chan: &Self::Channel);

    /// Resume a paused channel.
    fn resume(&mut self, chan: &Self::Channel);

    /// Abort all transfers on `chan` and wait for the hardware to stop.
    fn terminate_sync(&mut self, chan: &Self::Channel);

    /// Give the channel back.
    fn release_channel(&mut self, chan: Self::Channel);

    /// Hand `len` bytes at `addr` back to the device after CPU writes.
    fn sync_for_device(&mut self, _chan: &Self::Channel, _addr: DmaAddr, _len: usize) {}

    /// Hand `len` bytes at `addr` to the CPU after device access.
    fn sync_for_cpu(&mut self, _chan: &Self::Channel, _addr: DmaAddr, _len: usize) {}
}

impl<T: DmaService + ?Sized> DmaService for &mut T {
    type Channel = T::Channel;
    type Buffer = T::Buffer;

    #[inline]
    fn request_channel(&mut self, direction: Direction, mask: CapabilityMask)
    -> Option<Self::Channel> {
        T::request_channel(self, direction, mask)
    }

    #[inline]
    fn capabilities(&mut self, chan: &Self::Channel) -> Result<Capabilities, ServiceError> {
        T::capabilities(self, chan)
    }

    #[inline]
    fn configure(&mut self, chan: &Self::Channel, config: &SlaveConfig)
    -> Result<(), ServiceError> {
        T::configure(self, chan, config)
    }

    #[inline]
    fn alloc_coherent(&mut self, chan: &Self::Channel, len: usize) -> Option<Self::Buffer> {
        T::alloc_coherent(self, chan, len)
    }

    #[inline]
    fn free_coherent(&mut self, chan: &Self::Channel, buffer: Self::Buffer) {
        T::free_coherent(self, chan, buffer);
    }

    #[inline]
    fn map_single(&mut self, chan: &Self::Channel, ptr: *const u8, len: usize) -> Option<DmaAddr> {
        T::map_single(self, chan, ptr, len)
    }

    #[inline]
    fn unmap_single(&mut self, chan: &Self::Channel, addr: DmaAddr, len: usize) {
        T::unmap_single(self, chan, addr, len);
    }

    #[inline]
    fn submit_one_shot(
        &mut self,
        chan: &Self::Channel,
        addr: DmaAddr,
        len: usize,
        direction: Direction,
        completion: Completion,
    ) -> Option<Cookie> {
        T::submit_one_shot(self, chan, addr, len, direction, completion)
    }

    #[inline]
    fn submit_cyclic(
        &mut self,
        chan: &Self::Channel,
        addr: DmaAddr,
        len: usize,
        period: usize,
        direction: Direction,
        completion: Completion,
    ) -> Option<Cookie> {
        T::submit_cyclic(self, chan, addr, len, period, direction, completion)
    }

    #[inline]
    fn issue_pending(&mut self, chan: &Self::Channel) {
        T::issue_pending(self, chan);
    }

    #[inline]
    fn residue(&mut self, chan: &Self::Channel, cookie: Cookie) -> usize {
        T::residue(self, chan, cookie)
    }

    #[inline]
    fn pause(&mut self, chan: &Self::Channel) {
        T::pause(self, chan);
    }

    #[inline]
    fn resume(&mut self, chan: &Self::Channel) {
        T::resume(self, chan);
    }

    #[inline]
    fn terminate_sync(&mut self, chan: &Self::Channel) {
        T::terminate_sync(self, chan);
    }

    #[inline]
    fn release_channel(&mut self, chan: Self::Channel) {
        T::release_channel(self, chan);
    }

    #[inline]
    fn sync_for_device(&mut self, chan: &Self::Channel, addr: DmaAddr, len: usize) {
        T::sync_for_device(self, chan, addr, len);
    }

    #[inline]
    fn sync_for_cpu(&mut self, chan: &Self::Channel, addr: DmaAddr, len: usize) {
        T::sync_for_cpu(self, chan, addr, len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_capabilities_satisfy_both_paths() {
        let caps = Capabilities::full();
        assert_eq!(caps.check_rx(), Ok(()));
        assert_eq!(caps.check_tx(), Ok(()));
    }

    #[test]
    fn rx_requires_pause() {
        let caps = Capabilities {
            pause: false,
            ..Capabilities::full()
        };
        assert_eq!(caps.check_rx(), Err(ChannelError::MissingPause));
        assert_eq!(caps.check_tx(), Ok(()));
    }

    #[test]
    fn rx_requires_terminate() {
        let caps = Capabilities {
            terminate: false,
            ..Capabilities::full()
        };
        assert_eq!(caps.check_rx(), Err(ChannelError::MissingTerminate));
        assert_eq!(caps.check_tx(), Err(ChannelError::MissingTerminate));
    }

    #[test]
    fn rx_rejects_descriptor_granularity() {
        let caps = Capabilities {
            residue_granularity: ResidueGranularity::Descriptor,
            ..Capabilities::full()
        };
        assert_eq!(caps.check_rx(), Err(ChannelError::CoarseResidue));

        let caps = Capabilities {
            residue_granularity: ResidueGranularity::Segment,
            ..Capabilities::full()
        };
        assert_eq!(caps.check_rx(), Ok(()));
    }

    #[test]
    fn capability_mask_union_contains() {
        let mask = CapabilityMask::SLAVE.union(CapabilityMask::CYCLIC);
        assert!(mask.contains(CapabilityMask::SLAVE));
        assert!(mask.contains(CapabilityMask::CYCLIC));
        assert!(!CapabilityMask::SLAVE.contains(CapabilityMask::CYCLIC));
    }

    #[test]
    fn slave_config_directions() {
        assert_eq!(SlaveConfig::rx(0x100, BusWidth::Byte).direction, Direction::DevToMem);
        assert_eq!(SlaveConfig::tx(0x100, BusWidth::Byte).direction, Direction::MemToDev);
    }
}
