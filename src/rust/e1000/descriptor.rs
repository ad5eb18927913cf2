// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Constants
//======================================================================================================================

/// Size of a transmit or receive descriptor (in bytes).
pub const DESCRIPTOR_SIZE: usize = 16;

/// Descriptor rings must span a multiple of this many bytes.
pub const RING_ALIGNMENT: usize = 128;

/// End of packet.
pub const TXD_CMD_EOP: u8 = 1 << 0;
/// Report status: the device sets DD once it is done with the descriptor.
pub const TXD_CMD_RS: u8 = 1 << 3;
/// Descriptor done.
pub const TXD_STAT_DD: u8 = 1 << 0;

/// Descriptor done.
pub const RXD_STAT_DD: u8 = 1 << 0;
/// End of packet.
pub const RXD_STAT_EOP: u8 = 1 << 1;

//======================================================================================================================
// Structures
//======================================================================================================================

/// Legacy transmit descriptor.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TxDescriptor {
    pub addr: u64,
    pub length: u16,
    /// Checksum offset.
    pub cso: u8,
    pub cmd: u8,
    pub status: u8,
    /// Checksum start.
    pub css: u8,
    pub special: u16,
}

/// Legacy receive descriptor.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RxDescriptor {
    pub addr: u64,
    pub length: u16,
    pub csum: u16,
    pub status: u8,
    pub errors: u8,
    pub special: u16,
}

//======================================================================================================================
// Associate Functions
//======================================================================================================================

impl TxDescriptor {
    /// Is this descriptor owned by software?
    pub fn is_done(&self) -> bool {
        self.status & TXD_STAT_DD != 0
    }
}

impl RxDescriptor {
    /// Has the device written a frame (or part of one) into this descriptor?
    pub fn is_done(&self) -> bool {
        self.status & RXD_STAT_DD != 0
    }

    pub fn is_end_of_packet(&self) -> bool {
        self.status & RXD_STAT_EOP != 0
    }
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================
