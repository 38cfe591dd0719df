//! Upward collaborator: the line discipline / terminal layer.
//!
//! Every method is called with the port lock held. Implementations must not
//! try to take that lock again (it is not reentrant).

/// Consumer of received bytes and owner of transmit policy.
pub trait LineDiscipline {
    /// Push received bytes upward. Returns how many were accepted.
    fn deliver(&mut self, data: &[u8]) -> usize;

    /// Make everything delivered since the last call visible to readers.
    fn flush_delivered(&mut self);

    /// Transmit ring occupancy dropped below the wakeup threshold.
    fn write_wakeup(&mut self);

    /// Transmission is administratively stopped (e.g. XOFF, hardware
    /// handshake).
    fn tx_stopped(&self) -> bool {
        false
    }

    /// The transmit pipeline went idle; release any resource token held
    /// while bytes were in flight (power-management reference, etc).
    fn tx_idle(&mut self) {}

    /// DMA could not take the pending bytes; service them byte-wise
    /// (enable the transmit-holding-register interrupt).
    fn start_pio_tx(&mut self) {}

    /// DMA is transmitting again; stop byte-wise service.
    fn stop_pio_tx(&mut self) {}

    /// A receive completion arrived. Resets the collaborator's flush
    /// watchdog, which covers completions that never come.
    fn rx_activity(&mut self) {}
}
