//! Channel acquisition and teardown.
//!
//! Acquisition order: receive channel (request, capabilities, slave config),
//! transmit channel (same), receive buffer, cyclic receive transfer, ring
//! mapping. Any failure past the first step unwinds everything obtained so
//! far, transmit side first, so a failed `acquire` leaves nothing behind.
//!
//! A transmit channel that cannot be obtained or negotiated is not an error
//! when the configuration allows receive-only operation.

use super::rx::RxSession;
use super::tx::TxSession;
use crate::dma::{
    CapabilityMask, CoherentBuffer, Completion, Direction, DmaService, SlaveConfig,
};
use crate::driver::config::DmaConfig;
use crate::driver::error::{ChannelError, ChannelResult};
use crate::ring::TxRing;

/// Sessions for both directions of one port
pub struct Sessions<D: DmaService> {
    /// Transmit session, absent in receive-only operation
    pub tx: Option<TxSession<D>>,
    /// Receive session
    pub rx: RxSession<D>,
}

/// Acquire channels and resources and start the cyclic receive transfer.
///
/// `ring` is mapped for device reads and must stay at the same address
/// until [`release`].
pub fn acquire<D: DmaService, const N: usize>(
    dma: &mut D,
    ring: &TxRing<N>,
    config: &DmaConfig,
) -> ChannelResult<Sessions<D>> {
    if !config.is_valid() {
        return Err(ChannelError::InvalidConfig);
    }

    let rx_chan = acquire_rx(dma, config)?;
    let tx_chan = acquire_tx(dma, config);

    if tx_chan.is_none() && !config.allow_rx_only {
        dma.release_channel(rx_chan);
        return Err(ChannelError::NoTxChannel);
    }

    let buffer = match dma.alloc_coherent(&rx_chan, config.rx_size) {
        Some(buffer) if buffer.len() >= config.rx_size => buffer,
        Some(buffer) => {
            warn!("rx dma: buffer of {} bytes, wanted {}", buffer.len(), config.rx_size);
            dma.free_coherent(&rx_chan, buffer);
            unwind(dma, tx_chan, rx_chan);
            return Err(ChannelError::AllocFailed);
        }
        None => {
            unwind(dma, tx_chan, rx_chan);
            return Err(ChannelError::AllocFailed);
        }
    };

    let Some(cookie) = dma.submit_cyclic(
        &rx_chan,
        buffer.bus_addr(),
        config.rx_size,
        config.rx_period,
        Direction::DevToMem,
        Completion::Rx,
    ) else {
        dma.free_coherent(&rx_chan, buffer);
        unwind(dma, tx_chan, rx_chan);
        return Err(ChannelError::SubmitFailed);
    };

    let mut rx = RxSession::new(rx_chan, buffer, cookie, config.rx_size);

    let tx = match tx_chan {
        Some(chan) => {
            let Some(addr) = dma.map_single(&chan, ring.as_ptr(), N) else {
                dma.release_channel(chan);
                rx.release(dma);
                return Err(ChannelError::MapFailed);
            };
            Some(TxSession::new(chan, addr, N))
        }
        None => None,
    };

    rx.start();
    dma.issue_pending(&rx.channel);

    debug!(
        "dma acquired: rx {} bytes period {}, tx {}",
        config.rx_size,
        config.rx_period,
        tx.is_some()
    );
    Ok(Sessions { tx, rx })
}

/// Stop both directions and return every resource to the service.
pub fn release<D: DmaService>(dma: &mut D, sessions: Sessions<D>) {
    let Sessions { tx, rx } = sessions;
    rx.release(dma);
    if let Some(tx) = tx {
        tx.release(dma);
    }
}

fn acquire_rx<D: DmaService>(dma: &mut D, config: &DmaConfig) -> ChannelResult<D::Channel> {
    let mask = CapabilityMask::SLAVE.union(CapabilityMask::CYCLIC);
    let chan = dma
        .request_channel(Direction::DevToMem, mask)
        .ok_or(ChannelError::NoRxChannel)?;

    if let Err(e) = negotiate_rx(dma, &chan, config) {
        warn!("rx dma: {}", e.as_str());
        dma.release_channel(chan);
        return Err(e);
    }
    Ok(chan)
}

fn negotiate_rx<D: DmaService>(
    dma: &mut D,
    chan: &D::Channel,
    config: &DmaConfig,
) -> ChannelResult<()> {
    let caps = dma
        .capabilities(chan)
        .map_err(|_| ChannelError::CapabilityQuery)?;
    caps.check_rx()?;
    dma.configure(chan, &SlaveConfig::rx(config.rx_fifo_addr, config.bus_width))
        .map_err(|_| ChannelError::ConfigureFailed)
}

fn acquire_tx<D: DmaService>(dma: &mut D, config: &DmaConfig) -> Option<D::Channel> {
    let Some(chan) = dma.request_channel(Direction::MemToDev, CapabilityMask::SLAVE) else {
        info!("tx dma: no channel, receive only");
        return None;
    };

    if let Err(e) = negotiate_tx(dma, &chan, config) {
        info!("tx dma: {}, receive only", e.as_str());
        dma.release_channel(chan);
        return None;
    }
    Some(chan)
}

fn negotiate_tx<D: DmaService>(
    dma: &mut D,
    chan: &D::Channel,
    config: &DmaConfig,
) -> ChannelResult<()> {
    let caps = dma
        .capabilities(chan)
        .map_err(|_| ChannelError::CapabilityQuery)?;
    caps.check_tx()?;
    dma.configure(chan, &SlaveConfig::tx(config.tx_fifo_addr, config.bus_width))
        .map_err(|_| ChannelError::ConfigureFailed)
}

fn unwind<D: DmaService>(dma: &mut D, tx_chan: Option<D::Channel>, rx_chan: D::Channel) {
    if let Some(chan) = tx_chan {
        dma.release_channel(chan);
    }
    dma.release_channel(rx_chan);
}

// =============================================================================
// Tests
// =============================================================================
