//! ISR-safe port wrapper using critical sections.

use core::cell::RefCell;
use critical_section::Mutex;

use crate::dma::{Completion, DmaService};
use crate::driver::config::{DmaConfig, FlushMode};
use crate::driver::error::Result;
use crate::ldisc::LineDiscipline;
use crate::port::SerialPort;

/// ISR-safe serial port.
///
/// The critical section is the port lock: the writer path, the DMA
/// completion interrupt and the UART interrupt all go through it, so the
/// engine never sees concurrent callers. Placing the port in a `static`
/// also keeps the mapped transmit ring at a fixed address.
///
/// # Example
///
/// ```ignore
/// static PORT: SharedPort<Dma, Tty, 4096> =
///     SharedPort::new(Dma::new(), Tty::new(), DmaConfig::for_mapbase(UART0_BASE));
///
/// PORT.startup().ok();
/// PORT.write(b"hello");
///
/// #[interrupt]
/// fn DMA_CH0() {
///     PORT.on_dma_complete(Completion::Rx);
/// }
/// ```
pub struct SharedPort<D: DmaService, L: LineDiscipline, const N: usize> {
    port: Mutex<RefCell<SerialPort<D, L, N>>>,
}

impl<D: DmaService, L: LineDiscipline, const N: usize> SharedPort<D, L, N> {
    /// Create a new shared port (const, suitable for static initialization).
    pub const fn new(dma: D, ldisc: L, config: DmaConfig) -> Self {
        Self {
            port: Mutex::new(RefCell::new(SerialPort::new(dma, ldisc, config))),
        }
    }

    /// Run `f` on the port with interrupts masked.
    ///
    /// # Panics
    ///
    /// Re-entering the port from inside `f` panics; use
    /// [`try_with`](Self::try_with) where that can happen.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut SerialPort<D, L, N>) -> R,
    {
        critical_section::with(|cs| f(&mut self.port.borrow_ref_mut(cs)))
    }

    /// Like [`with`](Self::with), but `None` if the port is already held.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut SerialPort<D, L, N>) -> R,
    {
        critical_section::with(|cs| {
            let mut port = self.port.borrow(cs).try_borrow_mut().ok()?;
            Some(f(&mut port))
        })
    }

    /// Acquire DMA for the port.
    pub fn startup(&self) -> Result<()> {
        self.with(SerialPort::startup)?;
        Ok(())
    }

    /// Release DMA for the port.
    pub fn shutdown(&self) {
        self.with(SerialPort::shutdown);
    }

    /// Queue bytes for transmission. Returns how many fit.
    pub fn write(&self, data: &[u8]) -> usize {
        self.with(|port| port.write(data))
    }

    /// DMA completion entry point for interrupt handlers.
    pub fn on_dma_complete(&self, completion: Completion) {
        self.with(|port| port.handle_completion(completion));
    }

    /// Receive flush entry point (UART receive-timeout interrupt).
    pub fn flush(&self, mode: FlushMode) -> Result<usize> {
        Ok(self.with(|port| port.flush(mode))?)
    }
}
