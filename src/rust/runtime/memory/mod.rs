// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

mod page;
mod pool;

//==============================================================================
// Exports
//==============================================================================

pub use self::{
    page::{
        PageBuffer,
        PAGE_SIZE,
    },
    pool::PagePool,
};

//==============================================================================
// Imports
//==============================================================================

use crate::runtime::fail::Fail;

//==============================================================================
// Traits
//==============================================================================

/// Page-granular allocator. A page goes back to its allocator when the [PageBuffer] that owns it is dropped.
pub trait PageAllocator: Send + Sync {
    /// Allocates one page. Fails with `ENOMEM` when no page is available.
    fn allocate(&self) -> Result<PageBuffer, Fail>;
}
