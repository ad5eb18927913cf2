// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::{
    e1000::{
        descriptor::RxDescriptor,
        regs::{
            Register,
            Registers,
        },
        ring::DescriptorRing,
    },
    runtime::{
        fail::Fail,
        memory::{
            PageAllocator,
            PageBuffer,
        },
    },
};

//======================================================================================================================
// Structures
//======================================================================================================================

/// Outcome of one pass over the receive ring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Frames handed to the protocol layer.
    pub delivered: usize,
    /// Completed descriptors whose contents were discarded.
    pub dropped: usize,
}

/// Receive side of the device. Every slot owns a buffer the device may fill.
pub struct RxRing {
    ring: DescriptorRing<RxDescriptor>,
    /// Set while skipping the remaining descriptors of a frame that spans several of them.
    discarding: bool,
}

//======================================================================================================================
// Associated Functions
//======================================================================================================================

impl RxRing {
    /// Creates a ring with one freshly allocated buffer per slot.
    pub fn new(capacity: usize, allocator: &dyn PageAllocator) -> Result<Self, Fail> {
        let mut ring: DescriptorRing<RxDescriptor> = DescriptorRing::new(capacity)?;
        for idx in 0..capacity {
            let buffer: PageBuffer = allocator.allocate()?;
            ring.write(
                idx,
                RxDescriptor {
                    addr: buffer.dma_address(),
                    ..Default::default()
                },
            );
            ring.replace_buffer(idx, Some(buffer));
        }
        Ok(Self {
            ring,
            discarding: false,
        })
    }

    /// Registers the ring with the device. The tail trails the head by one slot so that the device owns every
    /// descriptor and starts filling slot zero.
    pub fn program(&self, regs: &Registers) {
        let base: u64 = self.ring.base_address();
        regs.write(Register::Rdbal, base as u32);
        regs.write(Register::Rdbah, (base >> 32) as u32);
        regs.write(Register::Rdh, 0);
        regs.write(Register::Rdt, (self.ring.capacity() - 1) as u32);
        regs.write(Register::Rdlen, self.ring.byte_len() as u32);
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Hands every completed descriptor's frame to `deliver` and returns the slot to the device with a fresh buffer.
    /// Visits at most one full turn of the ring and stops at the first descriptor the device still owns.
    pub fn drain<F>(&mut self, regs: &Registers, allocator: &dyn PageAllocator, mut deliver: F) -> DrainStats
    where
        F: FnMut(PageBuffer, usize),
    {
        let capacity: usize = self.ring.capacity();
        let mut stats: DrainStats = DrainStats::default();

        for _ in 0..capacity {
            let idx: usize = (regs.read(Register::Rdt) as usize + 1) % capacity;
            let mut desc: RxDescriptor = self.ring.read(idx);
            if !desc.is_done() {
                break;
            }

            if self.discarding || !desc.is_end_of_packet() {
                // Frames spanning several descriptors are not reassembled.
                if !self.discarding {
                    warn!("drain(): dropping frame that spans multiple descriptors (slot={})", idx);
                }
                self.discarding = !desc.is_end_of_packet();
                stats.dropped += 1;
            } else if self
                .ring
                .buffer(idx)
                .map_or(true, |buffer| desc.length as usize > buffer.len())
            {
                warn!("drain(): dropping frame with bad length (slot={}, length={})", idx, desc.length);
                stats.dropped += 1;
            } else {
                match allocator.allocate() {
                    Ok(fresh) => {
                        desc.addr = fresh.dma_address();
                        match self.ring.replace_buffer(idx, Some(fresh)) {
                            Some(frame) => {
                                deliver(frame, desc.length as usize);
                                stats.delivered += 1;
                            },
                            None => {
                                error!("drain(): completed descriptor without a buffer (slot={})", idx);
                                stats.dropped += 1;
                            },
                        }
                    },
                    Err(e) => {
                        // Keep the frame's buffer in the slot; the frame itself is lost.
                        warn!("drain(): dropping frame, cannot replenish slot {}: {:?}", idx, e);
                        stats.dropped += 1;
                    },
                }
            }

            desc.status = 0;
            desc.length = 0;
            desc.errors = 0;
            self.ring.write(idx, desc);
            regs.publish(Register::Rdt, idx as u32);
        }

        stats
    }
}
