// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::{
    e1000::{
        descriptor::{
            TxDescriptor,
            TXD_CMD_EOP,
            TXD_CMD_RS,
            TXD_STAT_DD,
        },
        regs::{
            Register,
            Registers,
        },
        ring::DescriptorRing,
    },
    runtime::{
        fail::Fail,
        memory::PageBuffer,
    },
};
use ::libc::{
    EAGAIN,
    EIO,
};

//======================================================================================================================
// Structures
//======================================================================================================================

/// Transmit side of the device. Every slot starts out owned by software (DD set) and empty.
pub struct TxRing {
    ring: DescriptorRing<TxDescriptor>,
}

//======================================================================================================================
// Associated Functions
//======================================================================================================================

impl TxRing {
    pub fn new(capacity: usize) -> Result<Self, Fail> {
        let mut ring: DescriptorRing<TxDescriptor> = DescriptorRing::new(capacity)?;
        for idx in 0..capacity {
            ring.write(
                idx,
                TxDescriptor {
                    status: TXD_STAT_DD,
                    ..Default::default()
                },
            );
        }
        Ok(Self { ring })
    }

    /// Registers the ring with the device. Head and tail start at slot zero.
    pub fn program(&self, regs: &Registers) {
        let base: u64 = self.ring.base_address();
        regs.write(Register::Tdbal, base as u32);
        regs.write(Register::Tdbah, (base >> 32) as u32);
        regs.write(Register::Tdlen, self.ring.byte_len() as u32);
        regs.write(Register::Tdh, 0);
        regs.write(Register::Tdt, 0);
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Queues the first `length` bytes of `buffer` for transmission. Never blocks: if the slot at the tail is still
    /// owned by the device the ring is full and the frame is dropped with `EAGAIN`.
    pub fn transmit(&mut self, regs: &Registers, buffer: PageBuffer, length: usize) -> Result<(), Fail> {
        let capacity: usize = self.ring.capacity();
        let tail: usize = regs.read(Register::Tdt) as usize;
        if tail >= capacity {
            let cause: String = format!("transmit tail out of range (tail={}, capacity={})", tail, capacity);
            error!("transmit(): {}", cause);
            return Err(Fail::new(EIO, &cause));
        }

        let desc: TxDescriptor = self.ring.read(tail);
        if !desc.is_done() {
            let cause: &str = "transmit ring is full";
            debug!("transmit(): {} (tail={})", cause, tail);
            return Err(Fail::new(EAGAIN, cause));
        }

        // The device is done with whatever this slot sent last.
        let addr: u64 = buffer.dma_address();
        drop(self.ring.replace_buffer(tail, Some(buffer)));

        self.ring.write(
            tail,
            TxDescriptor {
                addr,
                length: length as u16,
                cmd: TXD_CMD_RS | TXD_CMD_EOP,
                status: 0,
                ..Default::default()
            },
        );
        regs.publish(Register::Tdt, ((tail + 1) % capacity) as u32);
        trace!("transmit(): queued {} bytes in slot {}", length, tail);
        Ok(())
    }

    #[cfg(test)]
    pub fn descriptor(&self, idx: usize) -> TxDescriptor {
        self.ring.read(idx)
    }

    #[cfg(test)]
    pub fn owns_buffer(&self, idx: usize) -> bool {
        self.ring.buffer(idx).is_some()
    }
}
