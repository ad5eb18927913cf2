// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::{
    e1000::{
        Register,
        RegisterBus,
        RxDescriptor,
        TxDescriptor,
        CTRL_RST,
        DESCRIPTOR_SIZE,
        ICR_RXDW,
        RCTL_EN,
        RXD_STAT_DD,
        RXD_STAT_EOP,
        TCTL_EN,
        TXD_STAT_DD,
    },
    runtime::{
        logging,
        sync,
    },
};
use ::std::{
    collections::HashMap,
    ptr,
    sync::{
        Arc,
        Mutex,
    },
};

//======================================================================================================================
// Constants
//======================================================================================================================

/// Receive buffer size programmed by the driver.
const RX_BUFFER_SIZE: usize = 2048;

//======================================================================================================================
// Structures
//======================================================================================================================

/// Register-level model of an E1000. Descriptors and buffers are accessed through the addresses the driver programs,
/// the way the device would through DMA.
pub struct SimulatedNic {
    state: Mutex<NicState>,
}

#[derive(Default)]
struct NicState {
    registers: HashMap<usize, u32>,
    resets: usize,
    /// Frames dropped for lack of receive descriptors.
    missed: usize,
}

//======================================================================================================================
// Associate Functions
//======================================================================================================================

impl SimulatedNic {
    pub fn new() -> Arc<Self> {
        logging::initialize();
        Arc::new(Self {
            state: Mutex::new(NicState::default()),
        })
    }

    pub fn register(&self, register: Register) -> u32 {
        sync::lock(&self.state).get(register.offset())
    }

    pub fn interrupt_cause(&self) -> u32 {
        self.register(Register::Icr)
    }

    pub fn resets(&self) -> usize {
        sync::lock(&self.state).resets
    }

    pub fn missed(&self) -> usize {
        sync::lock(&self.state).missed
    }

    /// Sends every frame queued on the transmit ring, marking each descriptor done. Returns the frames in order.
    pub fn process_tx(&self) -> Vec<Vec<u8>> {
        let mut state = sync::lock(&self.state);
        let mut sent: Vec<Vec<u8>> = Vec::new();
        if state.get(Register::Tctl.offset()) & TCTL_EN == 0 {
            return sent;
        }

        let base: u64 = state.ring_base(Register::Tdbal, Register::Tdbah);
        let count: usize = state.get(Register::Tdlen.offset()) as usize / DESCRIPTOR_SIZE;
        let mut head: usize = state.get(Register::Tdh.offset()) as usize;
        for _ in 0..count {
            let slot: *mut TxDescriptor = (base as *mut TxDescriptor).wrapping_add(head);
            // Safety: the driver keeps the ring alive while the transmitter is enabled.
            let mut desc: TxDescriptor = unsafe { ptr::read_volatile(slot) };
            if desc.status & TXD_STAT_DD != 0 {
                break;
            }
            let mut frame: Vec<u8> = vec![0; desc.length as usize];
            // Safety: the descriptor points at a live buffer owned by the ring slot.
            unsafe { ptr::copy_nonoverlapping(desc.addr as *const u8, frame.as_mut_ptr(), frame.len()) };
            sent.push(frame);
            desc.status |= TXD_STAT_DD;
            unsafe { ptr::write_volatile(slot, desc) };
            head = (head + 1) % count;
        }
        state.set(Register::Tdh.offset(), head as u32);
        sent
    }

    /// Receives `frame` into the next free descriptor. Returns false if the frame was missed.
    pub fn inject(&self, frame: &[u8]) -> bool {
        self.inject_chunks(frame, RX_BUFFER_SIZE)
    }

    /// Receives `frame` split across descriptors of `chunk` bytes each.
    pub fn inject_chunks(&self, frame: &[u8], chunk: usize) -> bool {
        let mut state = sync::lock(&self.state);
        if state.get(Register::Rctl.offset()) & RCTL_EN == 0 {
            return false;
        }

        let base: u64 = state.ring_base(Register::Rdbal, Register::Rdbah);
        let count: usize = state.get(Register::Rdlen.offset()) as usize / DESCRIPTOR_SIZE;
        let mut head: usize = state.get(Register::Rdh.offset()) as usize;
        let tail: usize = state.get(Register::Rdt.offset()) as usize;
        if count == 0 {
            return false;
        }
        let chunks: Vec<&[u8]> = frame.chunks(chunk).collect();
        let free: usize = (tail + count - head) % count;
        if free < chunks.len() {
            state.missed += 1;
            return false;
        }

        for (i, piece) in chunks.iter().enumerate() {
            let slot: *mut RxDescriptor = (base as *mut RxDescriptor).wrapping_add(head);
            // Safety: slots between head and tail are owned by the device and point at live buffers.
            unsafe {
                let mut desc: RxDescriptor = ptr::read_volatile(slot);
                ptr::copy_nonoverlapping(piece.as_ptr(), desc.addr as *mut u8, piece.len());
                desc.length = piece.len() as u16;
                desc.status = RXD_STAT_DD;
                if i + 1 == chunks.len() {
                    desc.status |= RXD_STAT_EOP;
                }
                desc.errors = 0;
                ptr::write_volatile(slot, desc);
            }
            head = (head + 1) % count;
        }
        state.set(Register::Rdh.offset(), head as u32);
        let cause: u32 = state.get(Register::Icr.offset()) | ICR_RXDW;
        state.set(Register::Icr.offset(), cause);
        true
    }

    /// Overwrites the length written back for the last received descriptor, as a faulty device would.
    pub fn corrupt_last_rx_length(&self, length: u16) {
        let state = sync::lock(&self.state);
        let base: u64 = state.ring_base(Register::Rdbal, Register::Rdbah);
        let count: usize = state.get(Register::Rdlen.offset()) as usize / DESCRIPTOR_SIZE;
        if count == 0 {
            return;
        }
        let head: usize = state.get(Register::Rdh.offset()) as usize;
        let slot: *mut RxDescriptor = (base as *mut RxDescriptor).wrapping_add((head + count - 1) % count);
        // Safety: the slot was just filled and the driver keeps the ring alive while the receiver is enabled.
        unsafe {
            let mut desc: RxDescriptor = ptr::read_volatile(slot);
            desc.length = length;
            ptr::write_volatile(slot, desc);
        }
    }
}

impl NicState {
    fn get(&self, offset: usize) -> u32 {
        self.registers.get(&offset).copied().unwrap_or(0)
    }

    fn set(&mut self, offset: usize, value: u32) {
        self.registers.insert(offset, value);
    }

    fn ring_base(&self, low: Register, high: Register) -> u64 {
        (self.get(low.offset()) as u64) | ((self.get(high.offset()) as u64) << 32)
    }
}

//======================================================================================================================
// Trait Implementations
//======================================================================================================================

impl RegisterBus for SimulatedNic {
    fn read(&self, offset: usize) -> u32 {
        sync::lock(&self.state).get(offset)
    }

    fn write(&self, offset: usize, value: u32) {
        let mut state = sync::lock(&self.state);
        if offset == Register::Icr.offset() {
            // Write one to clear.
            let cause: u32 = state.get(offset) & !value;
            state.set(offset, cause);
        } else if offset == Register::Ctrl.offset() && value & CTRL_RST != 0 {
            // Reset completes immediately and the bit self-clears.
            state.registers.clear();
            state.resets += 1;
            state.set(offset, value & !CTRL_RST);
        } else {
            state.set(offset, value);
        }
    }
}
