// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! System call entry points for the packet path. Payloads move directly between user memory and frame pages, without
//! an intermediate kernel copy.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::{
    inetstack::NetStack,
    runtime::fail::Fail,
};
use ::std::{
    mem,
    net::Ipv4Addr,
};

//======================================================================================================================
// Constants
//======================================================================================================================

/// Size of the source address written by [sys_recv].
pub const SRC_ADDR_SIZE: usize = mem::size_of::<u32>();

//======================================================================================================================
// Traits
//======================================================================================================================

/// Access to the calling process's address space.
pub trait UserSpace {
    /// Copies `dst.len()` bytes from user address `src`. Fails with `EFAULT` on a bad address.
    fn copy_in(&self, dst: &mut [u8], src: u64) -> Result<(), Fail>;

    /// Copies `src` to user address `dst`. Fails with `EFAULT` on a bad address.
    fn copy_out(&self, dst: u64, src: &[u8]) -> Result<(), Fail>;
}

//======================================================================================================================
// Standalone Functions
//======================================================================================================================

/// Sends `len` bytes at user address `buf` from `src_port` to `dst_port` at `dst_addr` (host byte order).
pub fn sys_send(
    stack: &NetStack,
    user: &dyn UserSpace,
    src_port: u16,
    dst_addr: u32,
    dst_port: u16,
    buf: u64,
    len: usize,
) -> Result<(), Fail> {
    let dst_addr: Ipv4Addr = Ipv4Addr::from(dst_addr);
    stack.send_with(src_port, dst_addr, dst_port, len, |payload| user.copy_in(payload, buf))
}

/// Waits for a datagram on `dst_port`. Stores its source address (`u32`, host byte order) at `src_addr`, its source
/// port (`u16`, host byte order) at `src_port`, and up to `max_len` payload bytes at `buf`. Returns the number of
/// payload bytes copied.
pub fn sys_recv(
    stack: &NetStack,
    user: &dyn UserSpace,
    dst_port: u16,
    src_addr: u64,
    src_port: u64,
    buf: u64,
    max_len: usize,
) -> Result<usize, Fail> {
    stack.receive_with(dst_port, max_len, None, |addr, port, payload| {
        user.copy_out(src_addr, &u32::from(addr).to_ne_bytes())?;
        user.copy_out(src_port, &port.to_ne_bytes())?;
        user.copy_out(buf, payload)?;
        Ok(payload.len())
    })
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================
