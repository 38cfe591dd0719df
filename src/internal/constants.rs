//! Centralized Constants
//!
//! Single source of truth for the sizes and thresholds used by the DMA
//! transport engine.
//!
//! # Organization
//!
//! - **Buffer sizes**: receive ring and transmit ring defaults
//! - **Thresholds**: writer wakeup low-water mark
//! - **Device layout**: FIFO register offsets relative to the port base

// =============================================================================
// Buffer Sizes
// =============================================================================

/// Default receive DMA buffer size in bytes
pub const DEFAULT_RX_SIZE: usize = 4096;

/// Default cyclic period length in bytes (one completion per period)
pub const DEFAULT_RX_PERIOD: usize = 64;

/// Default transmit ring capacity in bytes (must be a power of two)
pub const DEFAULT_XMIT_SIZE: usize = 4096;

// =============================================================================
// Thresholds
// =============================================================================

/// Writers are woken once fewer than this many bytes remain pending
pub const WAKEUP_CHARS: usize = 256;

// =============================================================================
// Device Layout
// =============================================================================

/// Receive buffer register offset (8250-compatible layout)
pub const UART_RX_OFFSET: u64 = 0;

/// Transmit holding register offset (8250-compatible layout)
pub const UART_TX_OFFSET: u64 = 0;
