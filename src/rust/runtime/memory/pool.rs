// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::runtime::{
    fail::Fail,
    memory::{
        PageAllocator,
        PageBuffer,
        PAGE_SIZE,
    },
    sync,
};
use ::libc::ENOMEM;
use ::std::sync::{
    Arc,
    Mutex,
};

//======================================================================================================================
// Structures
//======================================================================================================================

/// Free list shared by a [PagePool] and the buffers it handed out.
pub(super) struct PoolInner {
    free: Mutex<Vec<Box<[u8]>>>,
    capacity: usize,
}

/// A fixed-capacity pool of pages. All pages are allocated up front; [PagePool::allocate] fails once every page is
/// owned by someone else.
#[derive(Clone)]
pub struct PagePool(Arc<PoolInner>);

//======================================================================================================================
// Associated Functions
//======================================================================================================================

impl PoolInner {
    pub(super) fn recycle(&self, page: Box<[u8]>) {
        // Pages emptied by a moved-out buffer are not real pages.
        if page.len() == PAGE_SIZE {
            sync::lock(&self.free).push(page);
        }
    }
}

impl PagePool {
    /// Creates a pool holding `capacity` pages.
    pub fn new(capacity: usize) -> Self {
        let free: Vec<Box<[u8]>> = (0..capacity)
            .map(|_| vec![0u8; PAGE_SIZE].into_boxed_slice())
            .collect();
        Self(Arc::new(PoolInner {
            free: Mutex::new(free),
            capacity,
        }))
    }

    /// Number of pages currently available for allocation.
    pub fn available(&self) -> usize {
        sync::lock(&self.0.free).len()
    }

    /// Total number of pages managed by this pool.
    pub fn capacity(&self) -> usize {
        self.0.capacity
    }
}

//======================================================================================================================
// Trait Implementations
//======================================================================================================================

impl PageAllocator for PagePool {
    fn allocate(&self) -> Result<PageBuffer, Fail> {
        match sync::lock(&self.0.free).pop() {
            Some(page) => Ok(PageBuffer::new(page, self.0.clone())),
            None => {
                let cause: &str = "page pool exhausted";
                debug!("allocate(): {}", cause);
                Err(Fail::new(ENOMEM, cause))
            },
        }
    }
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================

#[cfg(test)]
mod tests {
    use crate::runtime::memory::{
        PageAllocator,
        PageBuffer,
        PagePool,
        PAGE_SIZE,
    };
    use ::anyhow::Result;

    #[test]
    fn allocate_and_release() -> Result<()> {
        let pool: PagePool = PagePool::new(2);
        crate::ensure_eq!(pool.available(), 2);

        let mut first: PageBuffer = pool.allocate()?;
        let second: PageBuffer = pool.allocate()?;
        crate::ensure_eq!(first.len(), PAGE_SIZE);
        crate::ensure_neq!(first.dma_address(), second.dma_address());
        crate::ensure_eq!(pool.available(), 0);

        // Exhausted.
        match pool.allocate() {
            Err(e) => crate::ensure_eq!(e.errno, libc::ENOMEM),
            Ok(_) => anyhow::bail!("allocating from an empty pool should fail"),
        }

        first[0] = 0xab;
        drop(first);
        drop(second);
        crate::ensure_eq!(pool.available(), pool.capacity());
        Ok(())
    }
}
