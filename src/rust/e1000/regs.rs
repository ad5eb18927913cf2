// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::runtime::fail::Fail;
use ::libc::EINVAL;
use ::std::{
    mem,
    ptr::{
        self,
        NonNull,
    },
    sync::{
        atomic::{
            self,
            Ordering,
        },
        Arc,
    },
};

//======================================================================================================================
// Constants
//======================================================================================================================

/// Size of the register window (in bytes).
pub const REGISTER_WINDOW_SIZE: usize = 0x20000;

pub const CTRL_RST: u32 = 1 << 26;

pub const RCTL_EN: u32 = 1 << 1;
/// Broadcast accept mode.
pub const RCTL_BAM: u32 = 1 << 15;
pub const RCTL_SZ_2048: u32 = 0;
/// Strip the Ethernet CRC.
pub const RCTL_SECRC: u32 = 1 << 26;

pub const TCTL_EN: u32 = 1 << 1;
/// Pad short packets.
pub const TCTL_PSP: u32 = 1 << 3;
pub const TCTL_CT_SHIFT: u32 = 4;
pub const TCTL_COLD_SHIFT: u32 = 12;

/// Inter-packet gap recommended for IEEE 802.3 copper links.
pub const TIPG_DEFAULT: u32 = 10 | (8 << 10) | (6 << 20);

/// Receive descriptor written back.
pub const ICR_RXDW: u32 = 1 << 7;

/// Address-valid bit of the high receive address register.
pub const RAH_AV: u32 = 1 << 31;

/// Number of 32-bit words in the multicast table.
pub const MTA_LENGTH: usize = 4096 / 32;

//======================================================================================================================
// Structures
//======================================================================================================================

/// Device registers used by the driver, by byte offset in the register window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum Register {
    Ctrl = 0x0000,
    Icr = 0x00c0,
    Ims = 0x00d0,
    Rctl = 0x0100,
    Tctl = 0x0400,
    Tipg = 0x0410,
    Rdbal = 0x2800,
    Rdbah = 0x2804,
    Rdlen = 0x2808,
    Rdh = 0x2810,
    Rdt = 0x2818,
    /// Receive interrupt delay timer.
    Rdtr = 0x2820,
    /// Receive interrupt absolute delay timer.
    Radv = 0x282c,
    Tdbal = 0x3800,
    Tdbah = 0x3804,
    Tdlen = 0x3808,
    Tdh = 0x3810,
    Tdt = 0x3818,
    Mta = 0x5200,
    Ral = 0x5400,
    Rah = 0x5404,
}

/// Typed access to the device registers. Writes that hand descriptors to the device go through [Registers::publish],
/// which orders every prior memory write before the register write.
#[derive(Clone)]
pub struct Registers {
    bus: Arc<dyn RegisterBus>,
}

/// Memory-mapped register window.
pub struct Mmio {
    base: NonNull<u32>,
}

//======================================================================================================================
// Traits
//======================================================================================================================

/// 32-bit register access at byte offsets into a device's register window.
pub trait RegisterBus: Send + Sync {
    fn read(&self, offset: usize) -> u32;
    fn write(&self, offset: usize, value: u32);
}

//======================================================================================================================
// Associate Functions
//======================================================================================================================

impl Register {
    pub const fn offset(self) -> usize {
        self as usize
    }
}

impl Registers {
    pub fn new(bus: Arc<dyn RegisterBus>) -> Self {
        Self { bus }
    }

    pub fn read(&self, register: Register) -> u32 {
        self.bus.read(register.offset())
    }

    pub fn write(&self, register: Register, value: u32) {
        self.bus.write(register.offset(), value)
    }

    /// Writes the `index`-th word of a register array such as the multicast table.
    pub fn write_array(&self, register: Register, index: usize, value: u32) {
        self.bus.write(register.offset() + index * mem::size_of::<u32>(), value)
    }

    /// Full memory barrier.
    pub fn barrier(&self) {
        atomic::fence(Ordering::SeqCst);
    }

    /// Issues a barrier and then writes `value` to `register`.
    pub fn publish(&self, register: Register, value: u32) {
        self.barrier();
        self.write(register, value);
    }
}

impl Mmio {
    /// Wraps the register window mapped at `base`.
    ///
    /// # Safety
    ///
    /// `base` must point to a mapping of at least [REGISTER_WINDOW_SIZE] bytes of device registers that stays valid
    /// for the lifetime of the returned object and is not accessed through other references.
    pub unsafe fn new(base: *mut u8) -> Result<Self, Fail> {
        if base.align_offset(mem::align_of::<u32>()) != 0 {
            return Err(Fail::new(EINVAL, "register window is not word aligned"));
        }
        match NonNull::new(base as *mut u32) {
            Some(base) => Ok(Self { base }),
            None => Err(Fail::new(EINVAL, "register window is null")),
        }
    }

    fn word(&self, offset: usize) -> *mut u32 {
        debug_assert!(offset % mem::size_of::<u32>() == 0 && offset < REGISTER_WINDOW_SIZE);
        // Safety: in bounds of the window per the contract of `Mmio::new`.
        unsafe { self.base.as_ptr().add(offset / mem::size_of::<u32>()) }
    }
}

//======================================================================================================================
// Trait Implementations
//======================================================================================================================

impl RegisterBus for Mmio {
    fn read(&self, offset: usize) -> u32 {
        // Safety: the word lies inside the mapped window.
        unsafe { ptr::read_volatile(self.word(offset)) }
    }

    fn write(&self, offset: usize, value: u32) {
        // Safety: the word lies inside the mapped window.
        unsafe { ptr::write_volatile(self.word(offset), value) }
    }
}

// Register accesses are individual volatile word operations.
unsafe impl Send for Mmio {}
unsafe impl Sync for Mmio {}

//======================================================================================================================
// Unit Tests
//======================================================================================================================

#[cfg(test)]
mod tests {
    use super::{
        Mmio,
        Register,
        RegisterBus,
        Registers,
        REGISTER_WINDOW_SIZE,
    };
    use ::anyhow::Result;
    use ::std::sync::Arc;

    /// Drives [Mmio] over plain memory standing in for a register window.
    #[test]
    fn mmio_reads_back_writes() -> Result<()> {
        let mut window: Vec<u32> = vec![0; REGISTER_WINDOW_SIZE / 4];
        let mmio: Mmio = unsafe { Mmio::new(window.as_mut_ptr() as *mut u8)? };
        mmio.write(Register::Tdt.offset(), 7);
        crate::ensure_eq!(mmio.read(Register::Tdt.offset()), 7);

        let regs: Registers = Registers::new(Arc::new(mmio));
        regs.write_array(Register::Mta, 3, 0xdead_beef);
        regs.publish(Register::Rdt, 15);
        crate::ensure_eq!(regs.read(Register::Rdt), 15);
        drop(regs);

        crate::ensure_eq!(window[Register::Mta.offset() / 4 + 3], 0xdead_beef);
        crate::ensure_eq!(window[Register::Tdt.offset() / 4], 7);
        Ok(())
    }

    #[test]
    fn mmio_rejects_bad_base() -> Result<()> {
        anyhow::ensure!(unsafe { Mmio::new(::std::ptr::null_mut()) }.is_err());
        let mut window: Vec<u32> = vec![0; 4];
        let misaligned: *mut u8 = unsafe { (window.as_mut_ptr() as *mut u8).add(1) };
        anyhow::ensure!(unsafe { Mmio::new(misaligned) }.is_err());
        Ok(())
    }
}
