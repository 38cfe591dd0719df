//! Testing utilities and mock implementations
//!
//! Host-side stand-ins for both collaborators of the engine: a DMA service
//! that records every call and simulates a cyclic receive transfer, and a
//! line discipline that collects whatever it is given.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use std::boxed::Box;
use std::vec;
use std::vec::Vec;

use crate::dma::{
    Capabilities, CapabilityMask, CoherentBuffer, Completion, Cookie, Direction, DmaAddr,
    DmaService, ServiceError, SlaveConfig,
};
use crate::ldisc::LineDiscipline;

/// First bus address handed out for coherent buffers
const COHERENT_BASE: DmaAddr = 0x1000_0000;
/// First bus address handed out for streaming mappings
const MAPPING_BASE: DmaAddr = 0x2000_0000;
/// Address space reserved per allocation
const REGION_STRIDE: DmaAddr = 0x0010_0000;

// =============================================================================
// Mock DMA Service
// =============================================================================

/// One recorded service call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Request(Direction),
    Capabilities(Direction),
    Configure(Direction),
    Alloc(usize),
    Free,
    Map(usize),
    Unmap,
    OneShot(DmaAddr, usize),
    Cyclic(usize, usize),
    IssuePending(Direction),
    Pause(Direction),
    Resume(Direction),
    Terminate(Direction),
    Release(Direction),
}

/// Channel handle. Deliberately not `Clone`: the engine must hand back the
/// exact handle it was given.
#[derive(Debug, PartialEq, Eq)]
pub struct MockChannel {
    pub id: u32,
    pub direction: Direction,
}

/// Channel not obtained through `request_channel`, for session-level tests
pub fn mock_channel(direction: Direction) -> MockChannel {
    MockChannel { id: 0, direction }
}

/// Heap-backed coherent buffer
#[derive(Debug)]
pub struct MockBuffer {
    ptr: *mut u8,
    len: usize,
    addr: DmaAddr,
}

impl CoherentBuffer for MockBuffer {
    fn bus_addr(&self) -> DmaAddr {
        self.addr
    }

    fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr/len come from a leaked Box<[u8]> that is only
        // reclaimed in free_coherent, which consumes this handle.
        unsafe { core::slice::from_raw_parts(self.ptr, self.len) }
    }
}

/// Cyclic receive transfer being simulated
#[derive(Debug, Clone, Copy)]
struct CyclicTarget {
    ptr: *mut u8,
    len: usize,
    cookie: Cookie,
}

/// Recording DMA service with fault injection
#[derive(Debug)]
pub struct MockDmaService {
    log: Vec<Call>,
    one_shots: Vec<(DmaAddr, usize)>,
    live_buffers: Vec<(DmaAddr, *mut u8, usize)>,

    next_channel: u32,
    next_cookie: u32,
    next_region: DmaAddr,
    channels_out: usize,
    buffers_out: usize,
    mappings_out: usize,

    cyclic: Option<CyclicTarget>,
    hw_pos: usize,

    // Fault injection
    pub rx_available: bool,
    pub tx_available: bool,
    pub rx_caps: Result<Capabilities, ServiceError>,
    pub tx_caps: Result<Capabilities, ServiceError>,
    pub fail_configure_rx: bool,
    pub fail_configure_tx: bool,
    pub fail_alloc: bool,
    /// Hand out buffers this many bytes shorter than requested
    pub alloc_shortfall: usize,
    pub fail_map: bool,
    pub fail_cyclic: bool,
    /// Number of upcoming one-shot submissions to refuse
    pub fail_one_shot: usize,
    /// Report this residue instead of the simulated one
    pub residue_override: Option<usize>,

    pub paused: bool,
    pub terminated: bool,
}

impl Default for MockDmaService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDmaService {
    /// Service where every request succeeds with full capabilities
    pub fn new() -> Self {
        Self {
            log: Vec::new(),
            one_shots: Vec::new(),
            live_buffers: Vec::new(),
            next_channel: 1,
            next_cookie: 1,
            next_region: 0,
            channels_out: 0,
            buffers_out: 0,
            mappings_out: 0,
            cyclic: None,
            hw_pos: 0,
            rx_available: true,
            tx_available: true,
            rx_caps: Ok(Capabilities::full()),
            tx_caps: Ok(Capabilities::full()),
            fail_configure_rx: false,
            fail_configure_tx: false,
            fail_alloc: false,
            alloc_shortfall: 0,
            fail_map: false,
            fail_cyclic: false,
            fail_one_shot: 0,
            residue_override: None,
            paused: false,
            terminated: false,
        }
    }

    /// Every call made so far, in order
    pub fn log(&self) -> &[Call] {
        &self.log
    }

    /// Every accepted one-shot submission as `(addr, len)`
    pub fn one_shots(&self) -> &[(DmaAddr, usize)] {
        &self.one_shots
    }

    pub fn channels_outstanding(&self) -> usize {
        self.channels_out
    }

    pub fn buffers_outstanding(&self) -> usize {
        self.buffers_out
    }

    pub fn mappings_outstanding(&self) -> usize {
        self.mappings_out
    }

    /// Nothing requested, allocated or mapped remains
    pub fn all_returned(&self) -> bool {
        self.channels_out == 0 && self.buffers_out == 0 && self.mappings_out == 0
    }

    /// Count calls matching `call`
    pub fn count(&self, call: Call) -> usize {
        self.log.iter().filter(|c| **c == call).count()
    }

    /// Simulated hardware write cursor within the cyclic buffer
    pub fn hw_pos(&self) -> usize {
        self.hw_pos
    }

    /// Bytes arriving on the wire: written into the cyclic buffer at the
    /// hardware cursor, wrapping at the end.
    pub fn hw_receive(&mut self, data: &[u8]) {
        let Some(target) = self.cyclic else {
            panic!("hw_receive without a cyclic transfer");
        };
        for &byte in data {
            // SAFETY: target describes a live buffer from alloc_coherent;
            // hw_pos < len.
            unsafe { *target.ptr.add(self.hw_pos) = byte };
            self.hw_pos = (self.hw_pos + 1) % target.len;
        }
    }

    fn region(&mut self, base: DmaAddr) -> DmaAddr {
        let addr = base + self.next_region * REGION_STRIDE;
        self.next_region += 1;
        addr
    }

    fn cookie(&mut self) -> Cookie {
        let cookie = Cookie(self.next_cookie);
        self.next_cookie += 1;
        cookie
    }
}

impl DmaService for MockDmaService {
    type Channel = MockChannel;
    type Buffer = MockBuffer;

    fn request_channel(
        &mut self,
        direction: Direction,
        mask: CapabilityMask,
    ) -> Option<MockChannel> {
        self.log.push(Call::Request(direction));
        assert!(mask.contains(CapabilityMask::SLAVE));

        let available = match direction {
            Direction::DevToMem => self.rx_available,
            Direction::MemToDev => self.tx_available,
        };
        if !available {
            return None;
        }

        let id = self.next_channel;
        self.next_channel += 1;
        self.channels_out += 1;
        Some(MockChannel { id, direction })
    }

    fn capabilities(&mut self, chan: &MockChannel) -> Result<Capabilities, ServiceError> {
        self.log.push(Call::Capabilities(chan.direction));
        match chan.direction {
            Direction::DevToMem => self.rx_caps,
            Direction::MemToDev => self.tx_caps,
        }
    }

    fn configure(&mut self, chan: &MockChannel, config: &SlaveConfig) -> Result<(), ServiceError> {
        self.log.push(Call::Configure(chan.direction));
        assert_eq!(config.direction, chan.direction);
        let fail = match chan.direction {
            Direction::DevToMem => self.fail_configure_rx,
            Direction::MemToDev => self.fail_configure_tx,
        };
        if fail { Err(ServiceError) } else { Ok(()) }
    }

    fn alloc_coherent(&mut self, _chan: &MockChannel, len: usize) -> Option<MockBuffer> {
        self.log.push(Call::Alloc(len));
        if self.fail_alloc {
            return None;
        }

        let len = len.saturating_sub(self.alloc_shortfall);
        let ptr = Box::into_raw(vec![0u8; len].into_boxed_slice()).cast::<u8>();
        let addr = self.region(COHERENT_BASE);
        self.live_buffers.push((addr, ptr, len));
        self.buffers_out += 1;
        Some(MockBuffer { ptr, len, addr })
    }

    fn free_coherent(&mut self, _chan: &MockChannel, buffer: MockBuffer) {
        self.log.push(Call::Free);
        self.live_buffers.retain(|&(addr, _, _)| addr != buffer.addr);
        if self.cyclic.is_some_and(|t| t.ptr == buffer.ptr) {
            self.cyclic = None;
        }
        // SAFETY: reverses the Box::into_raw in alloc_coherent
        drop(unsafe {
            Box::from_raw(core::ptr::slice_from_raw_parts_mut(buffer.ptr, buffer.len))
        });
        self.buffers_out -= 1;
    }

    fn map_single(&mut self, _chan: &MockChannel, ptr: *const u8, len: usize) -> Option<DmaAddr> {
        self.log.push(Call::Map(len));
        assert!(!ptr.is_null());
        if self.fail_map {
            return None;
        }
        self.mappings_out += 1;
        Some(self.region(MAPPING_BASE))
    }

    fn unmap_single(&mut self, _chan: &MockChannel, _addr: DmaAddr, _len: usize) {
        self.log.push(Call::Unmap);
        self.mappings_out -= 1;
    }

    fn submit_one_shot(
        &mut self,
        _chan: &MockChannel,
        addr: DmaAddr,
        len: usize,
        direction: Direction,
        completion: Completion,
    ) -> Option<Cookie> {
        self.log.push(Call::OneShot(addr, len));
        assert_eq!(direction, Direction::MemToDev);
        assert_eq!(completion, Completion::Tx);
        if self.fail_one_shot > 0 {
            self.fail_one_shot -= 1;
            return None;
        }
        self.one_shots.push((addr, len));
        Some(self.cookie())
    }

    fn submit_cyclic(
        &mut self,
        _chan: &MockChannel,
        addr: DmaAddr,
        len: usize,
        period: usize,
        direction: Direction,
        completion: Completion,
    ) -> Option<Cookie> {
        self.log.push(Call::Cyclic(len, period));
        assert_eq!(direction, Direction::DevToMem);
        assert_eq!(completion, Completion::Rx);
        if self.fail_cyclic {
            return None;
        }

        let &(_, ptr, buf_len) = self
            .live_buffers
            .iter()
            .find(|&&(a, _, _)| a == addr)
            .expect("cyclic transfer on unknown buffer");
        assert!(len <= buf_len);

        let cookie = self.cookie();
        self.cyclic = Some(CyclicTarget { ptr, len, cookie });
        self.hw_pos = 0;
        self.terminated = false;
        Some(cookie)
    }

    fn issue_pending(&mut self, chan: &MockChannel) {
        self.log.push(Call::IssuePending(chan.direction));
    }

    fn residue(&mut self, _chan: &MockChannel, cookie: Cookie) -> usize {
        if let Some(residue) = self.residue_override {
            return residue;
        }
        match self.cyclic {
            Some(target) if target.cookie == cookie => target.len - self.hw_pos,
            _ => 0,
        }
    }

    fn pause(&mut self, chan: &MockChannel) {
        self.log.push(Call::Pause(chan.direction));
        self.paused = true;
    }

    fn resume(&mut self, chan: &MockChannel) {
        self.log.push(Call::Resume(chan.direction));
        self.paused = false;
    }

    fn terminate_sync(&mut self, chan: &MockChannel) {
        self.log.push(Call::Terminate(chan.direction));
        self.paused = false;
        if chan.direction == Direction::DevToMem {
            self.terminated = true;
        }
    }

    fn release_channel(&mut self, chan: MockChannel) {
        self.log.push(Call::Release(chan.direction));
        // Handles from mock_channel were never counted
        if chan.id != 0 {
            self.channels_out -= 1;
        }
    }
}

// =============================================================================
// Mock Line Discipline
// =============================================================================

/// Line discipline that records everything
#[derive(Debug, Default)]
pub struct MockLineDiscipline {
    /// Every accepted byte, in delivery order
    pub received: Vec<u8>,
    /// Length of every span offered
    pub deliveries: Vec<usize>,
    pub flushes: usize,
    pub wakeups: usize,
    pub stopped: bool,
    pub idle_count: usize,
    pub pio_started: usize,
    pub pio_stopped: usize,
    pub rx_activity: usize,
    /// Accept at most this many bytes per span
    pub accept_limit: Option<usize>,
}

impl MockLineDiscipline {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LineDiscipline for MockLineDiscipline {
    fn deliver(&mut self, data: &[u8]) -> usize {
        self.deliveries.push(data.len());
        let accepted = self.accept_limit.map_or(data.len(), |limit| limit.min(data.len()));
        self.received.extend_from_slice(&data[..accepted]);
        accepted
    }

    fn flush_delivered(&mut self) {
        self.flushes += 1;
    }

    fn write_wakeup(&mut self) {
        self.wakeups += 1;
    }

    fn tx_stopped(&self) -> bool {
        self.stopped
    }

    fn tx_idle(&mut self) {
        self.idle_count += 1;
    }

    fn start_pio_tx(&mut self) {
        self.pio_started += 1;
    }

    fn stop_pio_tx(&mut self) {
        self.pio_stopped += 1;
    }

    fn rx_activity(&mut self) {
        self.rx_activity += 1;
    }
}
