// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Driver for the Intel 82540EM (E1000) descriptor rings.

mod descriptor;
mod regs;
mod ring;
mod rx;
mod tx;

//======================================================================================================================
// Exports
//======================================================================================================================

pub use self::{
    descriptor::{
        RxDescriptor,
        TxDescriptor,
        DESCRIPTOR_SIZE,
        RING_ALIGNMENT,
        RXD_STAT_DD,
        RXD_STAT_EOP,
        TXD_CMD_EOP,
        TXD_CMD_RS,
        TXD_STAT_DD,
    },
    regs::{
        Mmio,
        Register,
        RegisterBus,
        Registers,
        CTRL_RST,
        ICR_RXDW,
        RAH_AV,
        RCTL_EN,
        TCTL_EN,
    },
    rx::DrainStats,
};

//======================================================================================================================
// Imports
//======================================================================================================================

use self::{
    regs::{
        MTA_LENGTH,
        RCTL_BAM,
        RCTL_SECRC,
        RCTL_SZ_2048,
        TCTL_COLD_SHIFT,
        TCTL_CT_SHIFT,
        TCTL_PSP,
        TIPG_DEFAULT,
    },
    rx::RxRing,
    tx::TxRing,
};
use crate::runtime::{
    fail::Fail,
    memory::{
        PageAllocator,
        PageBuffer,
    },
    network::{
        config::NetConfig,
        MacAddress,
    },
    sync,
};
use ::libc::EINVAL;
use ::std::sync::{
    Arc,
    Mutex,
};

//======================================================================================================================
// Structures
//======================================================================================================================

/// An initialized E1000. Transmit and receive rings are guarded by independent locks.
pub struct E1000 {
    regs: Registers,
    allocator: Arc<dyn PageAllocator>,
    link_addr: MacAddress,
    tx: Mutex<TxRing>,
    rx: Mutex<RxRing>,
}

//======================================================================================================================
// Associate Functions
//======================================================================================================================

impl E1000 {
    /// Initializes the device behind `bus` with the addressing and ring sizes in `config`.
    pub fn new(bus: Arc<dyn RegisterBus>, allocator: Arc<dyn PageAllocator>, config: &NetConfig) -> Result<Self, Fail> {
        Self::initialize(
            bus,
            allocator,
            config.local_link_addr(),
            config.tx_ring_size(),
            config.rx_ring_size(),
        )
    }

    /// Resets the device, sets up both descriptor rings and enables the transmitter, the receiver and the receive
    /// interrupt. Fails before touching the device if a ring has a bad size or the receive buffers cannot be
    /// allocated.
    pub fn initialize(
        bus: Arc<dyn RegisterBus>,
        allocator: Arc<dyn PageAllocator>,
        link_addr: MacAddress,
        tx_ring_size: usize,
        rx_ring_size: usize,
    ) -> Result<Self, Fail> {
        if !link_addr.is_unicast() {
            return Err(Fail::new(EINVAL, "device address must be unicast"));
        }
        let tx: TxRing = TxRing::new(tx_ring_size)?;
        let rx: RxRing = match RxRing::new(rx_ring_size, allocator.as_ref()) {
            Ok(rx) => rx,
            Err(e) => {
                error!("initialize(): cannot fill the receive ring: {:?}", e);
                return Err(e);
            },
        };

        let regs: Registers = Registers::new(bus);

        // Reset with interrupts masked. The reset bit clears itself.
        regs.write(Register::Ims, 0);
        let ctrl: u32 = regs.read(Register::Ctrl);
        regs.write(Register::Ctrl, ctrl | CTRL_RST);
        regs.write(Register::Ims, 0);
        regs.barrier();

        tx.program(&regs);
        rx.program(&regs);

        // Accept frames for our address and broadcasts. No multicast.
        let (low, high): (u32, u32) = link_addr.to_receive_address();
        regs.write(Register::Ral, low);
        regs.write(Register::Rah, high | RAH_AV);
        for i in 0..MTA_LENGTH {
            regs.write_array(Register::Mta, i, 0);
        }

        regs.write(
            Register::Tctl,
            TCTL_EN | TCTL_PSP | (0x10 << TCTL_CT_SHIFT) | (0x40 << TCTL_COLD_SHIFT),
        );
        regs.write(Register::Tipg, TIPG_DEFAULT);
        regs.write(Register::Rctl, RCTL_EN | RCTL_BAM | RCTL_SZ_2048 | RCTL_SECRC);

        // Interrupt on every written-back receive descriptor.
        regs.write(Register::Rdtr, 0);
        regs.write(Register::Radv, 0);
        regs.write(Register::Ims, ICR_RXDW);

        info!(
            "initialize(): link_addr={}, tx_ring_size={}, rx_ring_size={}",
            link_addr, tx_ring_size, rx_ring_size
        );
        Ok(Self {
            regs,
            allocator,
            link_addr,
            tx: Mutex::new(tx),
            rx: Mutex::new(rx),
        })
    }

    pub fn link_addr(&self) -> MacAddress {
        self.link_addr
    }

    pub fn tx_capacity(&self) -> usize {
        sync::lock(&self.tx).capacity()
    }

    pub fn rx_capacity(&self) -> usize {
        sync::lock(&self.rx).capacity()
    }

    /// Hands the first `length` bytes of `buffer` to the device. Fails with `EAGAIN` if the transmit ring is full, in
    /// which case the buffer is released.
    pub fn transmit(&self, buffer: PageBuffer, length: usize) -> Result<(), Fail> {
        if length == 0 || length > buffer.len() {
            let cause: String = format!("invalid frame length (length={})", length);
            warn!("transmit(): {}", cause);
            return Err(Fail::new(EINVAL, &cause));
        }
        sync::lock(&self.tx).transmit(&self.regs, buffer, length)
    }

    /// Acknowledges every pending interrupt cause.
    pub fn acknowledge_interrupt(&self) {
        self.regs.write(Register::Icr, 0xffff_ffff);
    }

    /// Drains completed receive descriptors into `deliver`.
    pub fn drain_rx<F>(&self, deliver: F) -> DrainStats
    where
        F: FnMut(PageBuffer, usize),
    {
        let stats: DrainStats = sync::lock(&self.rx).drain(&self.regs, self.allocator.as_ref(), deliver);
        if stats.delivered > 0 {
            debug!("drain_rx(): processed {} packets", stats.delivered);
        }
        stats
    }

    #[cfg(test)]
    fn tx_descriptor(&self, idx: usize) -> TxDescriptor {
        sync::lock(&self.tx).descriptor(idx)
    }

    #[cfg(test)]
    fn tx_owns_buffer(&self, idx: usize) -> bool {
        sync::lock(&self.tx).owns_buffer(idx)
    }
}

//======================================================================================================================
// Trait Implementations
//======================================================================================================================

impl Drop for E1000 {
    fn drop(&mut self) {
        // Stop all DMA before the rings are released.
        self.regs.write(Register::Ims, 0);
        self.regs.write(Register::Rctl, 0);
        self.regs.write(Register::Tctl, 0);
        self.regs.barrier();
    }
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================
