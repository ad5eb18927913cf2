// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::runtime::memory::pool::PoolInner;
use ::std::{
    fmt,
    mem,
    ops::{
        Deref,
        DerefMut,
    },
    sync::Arc,
};

//======================================================================================================================
// Constants
//======================================================================================================================

/// Size of a page (in bytes). One page holds exactly one frame.
pub const PAGE_SIZE: usize = 4096;

//======================================================================================================================
// Structures
//======================================================================================================================

/// An owned, fixed-size page. The page is released to the pool it came from when the buffer is dropped, so a page
/// has exactly one owner at any time and is freed exactly once.
pub struct PageBuffer {
    page: Box<[u8]>,
    pool: Arc<PoolInner>,
}

//======================================================================================================================
// Associated Functions
//======================================================================================================================

impl PageBuffer {
    pub(super) fn new(page: Box<[u8]>, pool: Arc<PoolInner>) -> Self {
        debug_assert_eq!(page.len(), PAGE_SIZE);
        Self { page, pool }
    }

    /// Address the device uses to reach this page. Kernel memory is identity mapped, so this is also the address of
    /// the first byte of the page.
    pub fn dma_address(&self) -> u64 {
        self.page.as_ptr() as u64
    }
}

//======================================================================================================================
// Trait Implementations
//======================================================================================================================

impl Deref for PageBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.page
    }
}

impl DerefMut for PageBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.page
    }
}

impl fmt::Debug for PageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageBuffer({:#x})", self.dma_address())
    }
}

impl Drop for PageBuffer {
    fn drop(&mut self) {
        let page: Box<[u8]> = mem::take(&mut self.page);
        self.pool.recycle(page);
    }
}
