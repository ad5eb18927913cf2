// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::{
    runtime::{
        fail::Fail,
        sync,
    },
    syscall::UserSpace,
};
use ::libc::EFAULT;
use ::std::sync::Mutex;

//======================================================================================================================
// Structures
//======================================================================================================================

/// A flat user address space starting at address zero.
pub struct TestUserSpace {
    memory: Mutex<Vec<u8>>,
}

//======================================================================================================================
// Associate Functions
//======================================================================================================================

impl TestUserSpace {
    pub fn new(size: usize) -> Self {
        Self {
            memory: Mutex::new(vec![0; size]),
        }
    }

    /// Stores `bytes` at `addr` as a user process would.
    pub fn poke(&self, addr: u64, bytes: &[u8]) {
        let start: usize = addr as usize;
        sync::lock(&self.memory)[start..start + bytes.len()].copy_from_slice(bytes);
    }

    /// Reads `len` bytes at `addr` as a user process would.
    pub fn peek(&self, addr: u64, len: usize) -> Vec<u8> {
        let start: usize = addr as usize;
        sync::lock(&self.memory)[start..start + len].to_vec()
    }

    fn range(memory: &[u8], addr: u64, len: usize) -> Result<std::ops::Range<usize>, Fail> {
        let start: usize = addr as usize;
        match start.checked_add(len) {
            Some(end) if end <= memory.len() => Ok(start..end),
            _ => Err(Fail::new(EFAULT, "bad user address")),
        }
    }
}

//======================================================================================================================
// Trait Implementations
//======================================================================================================================

impl UserSpace for TestUserSpace {
    fn copy_in(&self, dst: &mut [u8], src: u64) -> Result<(), Fail> {
        let memory = sync::lock(&self.memory);
        let range = Self::range(&memory, src, dst.len())?;
        dst.copy_from_slice(&memory[range]);
        Ok(())
    }

    fn copy_out(&self, dst: u64, src: &[u8]) -> Result<(), Fail> {
        let mut memory = sync::lock(&self.memory);
        let range = Self::range(&memory, dst, src.len())?;
        memory[range].copy_from_slice(src);
        Ok(())
    }
}
