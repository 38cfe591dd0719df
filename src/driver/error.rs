//! Error types for the serial DMA engine
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ChannelError`]: Channel acquisition, capability and setup failures
//! - [`TxError`]: Transmit burst submission failures
//! - [`RxError`]: Receive path misuse
//!
//! The unified [`Error`] enum wraps all domain errors.
//!
//! An invalid residue reading is deliberately absent: it is logged and
//! counted by the receive engine, never surfaced to the caller.

// =============================================================================
// Channel Errors
// =============================================================================

/// Channel acquisition and setup errors
///
/// Any of these returned from `acquire` means no channel handle, buffer or
/// mapping remains allocated. Receive-side errors mean DMA is unavailable
/// for the port and the caller should fall back to interrupt-driven I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelError {
    /// Channels are already acquired for this port
    AlreadyAcquired,
    /// Receive buffer size or period is unusable
    InvalidConfig,
    /// No receive channel could be requested
    NoRxChannel,
    /// No usable transmit channel and receive-only operation is disabled
    NoTxChannel,
    /// Capability query failed
    CapabilityQuery,
    /// Receive channel cannot pause
    MissingPause,
    /// Channel cannot terminate transfers
    MissingTerminate,
    /// Receive channel only reports residue per descriptor
    CoarseResidue,
    /// Slave configuration rejected
    ConfigureFailed,
    /// Receive buffer allocation failed
    AllocFailed,
    /// Transmit ring could not be mapped for device access
    MapFailed,
    /// Cyclic receive transfer could not be prepared
    SubmitFailed,
}

impl core::fmt::Display for ChannelError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ChannelError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ChannelError::AlreadyAcquired => "channels already acquired",
            ChannelError::InvalidConfig => "invalid DMA configuration",
            ChannelError::NoRxChannel => "no receive channel",
            ChannelError::NoTxChannel => "no transmit channel",
            ChannelError::CapabilityQuery => "capability query failed",
            ChannelError::MissingPause => "receive channel cannot pause",
            ChannelError::MissingTerminate => "channel cannot terminate",
            ChannelError::CoarseResidue => "residue granularity too coarse",
            ChannelError::ConfigureFailed => "slave configuration failed",
            ChannelError::AllocFailed => "receive buffer allocation failed",
            ChannelError::MapFailed => "transmit ring mapping failed",
            ChannelError::SubmitFailed => "cyclic transfer submission failed",
        }
    }

    /// Whether this error comes from capability negotiation
    #[must_use]
    pub const fn is_capability(&self) -> bool {
        matches!(
            self,
            ChannelError::CapabilityQuery
                | ChannelError::MissingPause
                | ChannelError::MissingTerminate
                | ChannelError::CoarseResidue
        )
    }
}

// =============================================================================
// Transmit Errors
// =============================================================================

/// Transmit burst errors
///
/// The caller should service the pending bytes without DMA. The engine
/// stays usable for the next burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxError {
    /// No transmit channel was acquired
    NoChannel,
    /// The one-shot descriptor could not be prepared
    SubmitFailed,
}

impl core::fmt::Display for TxError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TxError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TxError::NoChannel => "no transmit channel",
            TxError::SubmitFailed => "transmit submission failed",
        }
    }
}

// =============================================================================
// Receive Errors
// =============================================================================

/// Receive path errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxError {
    /// No receive transfer is running
    NotRunning,
}

impl core::fmt::Display for RxError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RxError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RxError::NotRunning => "receive DMA not running",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// ```ignore
/// match result {
///     Err(Error::Channel(e)) if e.is_capability() => { /* use PIO */ }
///     Err(Error::Tx(TxError::SubmitFailed)) => { /* byte-wise for this burst */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Channel error
    Channel(ChannelError),
    /// Transmit error
    Tx(TxError),
    /// Receive error
    Rx(RxError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Channel(e) => write!(f, "channel: {}", e.as_str()),
            Error::Tx(e) => write!(f, "tx: {}", e.as_str()),
            Error::Rx(e) => write!(f, "rx: {}", e.as_str()),
        }
    }
}

impl From<ChannelError> for Error {
    fn from(e: ChannelError) -> Self {
        Error::Channel(e)
    }
}

impl From<TxError> for Error {
    fn from(e: TxError) -> Self {
        Error::Tx(e)
    }
}

impl From<RxError> for Error {
    fn from(e: RxError) -> Self {
        Error::Rx(e)
    }
}

/// Result type alias for engine operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for channel operations
pub type ChannelResult<T> = core::result::Result<T, ChannelError>;

/// Result type alias for transmit operations
pub type TxResult<T> = core::result::Result<T, TxError>;

/// Result type alias for receive operations
pub type RxResult<T> = core::result::Result<T, RxError>;

// =============================================================================
// Unit Tests
// =============================================================================
