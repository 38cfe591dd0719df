//! Configuration types for the serial DMA engine

use crate::dma::{BusWidth, DmaAddr};
use crate::internal::constants::{
    DEFAULT_RX_PERIOD, DEFAULT_RX_SIZE, UART_RX_OFFSET, UART_TX_OFFSET,
};

/// How a receive flush ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlushMode {
    /// Drain, then let the cyclic transfer keep running
    Transient,
    /// Drain, then terminate the receive channel
    Final,
}

/// DMA lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaState {
    /// No channels held; `acquire` is the only way out
    #[default]
    Terminated,
    /// Channels acquired, engines running
    Active,
    /// Receive path drained and stopped, waiting for release
    Draining,
}

/// Complete DMA engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmaConfig {
    /// Receive buffer size in bytes
    pub rx_size: usize,
    /// Cyclic period length in bytes (completion granularity)
    pub rx_period: usize,
    /// Device receive FIFO bus address
    pub rx_fifo_addr: DmaAddr,
    /// Device transmit FIFO bus address
    pub tx_fifo_addr: DmaAddr,
    /// FIFO access width
    pub bus_width: BusWidth,
    /// Keep receive DMA when no usable transmit channel exists
    pub allow_rx_only: bool,
}

impl Default for DmaConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DmaConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rx_size: DEFAULT_RX_SIZE,
            rx_period: DEFAULT_RX_PERIOD,
            rx_fifo_addr: UART_RX_OFFSET,
            tx_fifo_addr: UART_TX_OFFSET,
            bus_width: BusWidth::Byte,
            allow_rx_only: true,
        }
    }

    /// Configuration for a port whose registers start at `mapbase`.
    ///
    /// Both FIFOs sit at their 8250 offsets from the base.
    #[must_use]
    pub const fn for_mapbase(mapbase: DmaAddr) -> Self {
        Self::new()
            .with_rx_fifo_addr(mapbase + UART_RX_OFFSET)
            .with_tx_fifo_addr(mapbase + UART_TX_OFFSET)
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the receive buffer size
    #[must_use]
    pub const fn with_rx_size(mut self, size: usize) -> Self {
        self.rx_size = size;
        self
    }

    /// Set the cyclic period length
    #[must_use]
    pub const fn with_rx_period(mut self, period: usize) -> Self {
        self.rx_period = period;
        self
    }

    /// Set the receive FIFO address
    #[must_use]
    pub const fn with_rx_fifo_addr(mut self, addr: DmaAddr) -> Self {
        self.rx_fifo_addr = addr;
        self
    }

    /// Set the transmit FIFO address
    #[must_use]
    pub const fn with_tx_fifo_addr(mut self, addr: DmaAddr) -> Self {
        self.tx_fifo_addr = addr;
        self
    }

    /// Set the FIFO access width
    #[must_use]
    pub const fn with_bus_width(mut self, width: BusWidth) -> Self {
        self.bus_width = width;
        self
    }

    /// Allow or forbid receive-only DMA
    #[must_use]
    pub const fn with_rx_only(mut self, allowed: bool) -> Self {
        self.allow_rx_only = allowed;
        self
    }

    /// Check that sizes are usable: non-zero buffer, period within it.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.rx_size > 0 && self.rx_period > 0 && self.rx_period <= self.rx_size
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = DmaConfig::new();

        assert_eq!(config.rx_size, DEFAULT_RX_SIZE);
        assert_eq!(config.rx_period, DEFAULT_RX_PERIOD);
        assert_eq!(config.bus_width, BusWidth::Byte);
        assert!(config.allow_rx_only);
        assert!(config.is_valid());
    }

    #[test]
    fn config_default_trait_matches_new() {
        assert_eq!(DmaConfig::default(), DmaConfig::new());
    }

    #[test]
    fn config_builder_chain() {
        let config = DmaConfig::new()
            .with_rx_size(1024)
            .with_rx_period(32)
            .with_rx_only(false)
            .with_bus_width(BusWidth::Word);

        assert_eq!(config.rx_size, 1024);
        assert_eq!(config.rx_period, 32);
        assert!(!config.allow_rx_only);
        assert_eq!(config.bus_width, BusWidth::Word);
    }

    #[test]
    fn config_for_mapbase_offsets_fifos() {
        let config = DmaConfig::for_mapbase(0x4000_0000);
        assert_eq!(config.rx_fifo_addr, 0x4000_0000 + UART_RX_OFFSET);
        assert_eq!(config.tx_fifo_addr, 0x4000_0000 + UART_TX_OFFSET);
    }

    #[test]
    fn config_rejects_bad_sizes() {
        assert!(!DmaConfig::new().with_rx_size(0).is_valid());
        assert!(!DmaConfig::new().with_rx_period(0).is_valid());
        assert!(!DmaConfig::new().with_rx_size(32).with_rx_period(64).is_valid());
    }

    #[test]
    fn state_default_is_terminated() {
        assert_eq!(DmaState::default(), DmaState::Terminated);
    }
}
