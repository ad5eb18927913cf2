// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::{
    e1000::descriptor::RING_ALIGNMENT,
    runtime::{
        fail::Fail,
        memory::PageBuffer,
    },
};
use ::libc::EINVAL;
use ::std::{
    alloc::{
        self,
        Layout,
    },
    mem,
    ptr::{
        self,
        NonNull,
    },
};

//======================================================================================================================
// Structures
//======================================================================================================================

/// A ring of hardware descriptors in device-visible memory, plus the buffer each slot currently owns.
///
/// Descriptors are only accessed through volatile copies, since the device reads and writes them concurrently.
pub struct DescriptorRing<D: Copy + Default> {
    descriptors: NonNull<D>,
    layout: Layout,
    buffers: Vec<Option<PageBuffer>>,
}

//======================================================================================================================
// Associated Functions
//======================================================================================================================

impl<D: Copy + Default> DescriptorRing<D> {
    /// Allocates a zeroed ring of `capacity` descriptors. The ring's byte size must be a non-zero multiple of
    /// [RING_ALIGNMENT].
    pub fn new(capacity: usize) -> Result<Self, Fail> {
        let size: usize = capacity * mem::size_of::<D>();
        if capacity == 0 || size % RING_ALIGNMENT != 0 {
            let cause: String = format!(
                "descriptor ring of {} bytes is not a multiple of {} bytes",
                size, RING_ALIGNMENT
            );
            error!("new(): {}", cause);
            return Err(Fail::new(EINVAL, &cause));
        }

        let layout: Layout = match Layout::from_size_align(size, RING_ALIGNMENT) {
            Ok(layout) => layout,
            Err(_) => return Err(Fail::new(EINVAL, "invalid descriptor ring layout")),
        };
        // Safety: the layout has a non-zero size.
        let descriptors: NonNull<D> = match NonNull::new(unsafe { alloc::alloc_zeroed(layout) } as *mut D) {
            Some(ptr) => ptr,
            None => alloc::handle_alloc_error(layout),
        };

        let mut ring: Self = Self {
            descriptors,
            layout,
            buffers: (0..capacity).map(|_| None).collect(),
        };
        for idx in 0..capacity {
            ring.write(idx, D::default());
        }
        Ok(ring)
    }

    pub fn capacity(&self) -> usize {
        self.buffers.len()
    }

    /// Size of the ring (in bytes), as programmed into the length register.
    pub fn byte_len(&self) -> usize {
        self.layout.size()
    }

    /// Address of the first descriptor, as programmed into the base address registers.
    pub fn base_address(&self) -> u64 {
        self.descriptors.as_ptr() as u64
    }

    /// Reads a snapshot of descriptor `idx`.
    pub fn read(&self, idx: usize) -> D {
        assert!(idx < self.capacity());
        // Safety: `idx` is in bounds and the memory is owned by this ring.
        unsafe { ptr::read_volatile(self.descriptors.as_ptr().add(idx)) }
    }

    /// Overwrites descriptor `idx`.
    pub fn write(&mut self, idx: usize, descriptor: D) {
        assert!(idx < self.capacity());
        // Safety: `idx` is in bounds and the memory is owned by this ring.
        unsafe { ptr::write_volatile(self.descriptors.as_ptr().add(idx), descriptor) }
    }

    /// Installs `buffer` as the owner of slot `idx`, returning the previous owner.
    pub fn replace_buffer(&mut self, idx: usize, buffer: Option<PageBuffer>) -> Option<PageBuffer> {
        mem::replace(&mut self.buffers[idx], buffer)
    }

    pub fn buffer(&self, idx: usize) -> Option<&PageBuffer> {
        self.buffers[idx].as_ref()
    }
}

//======================================================================================================================
// Trait Implementations
//======================================================================================================================

impl<D: Copy + Default> Drop for DescriptorRing<D> {
    fn drop(&mut self) {
        // Safety: allocated in `new()` with the same layout.
        unsafe { alloc::dealloc(self.descriptors.as_ptr() as *mut u8, self.layout) };
    }
}

// The ring exclusively owns its descriptor memory.
unsafe impl<D: Copy + Default + Send> Send for DescriptorRing<D> {}

//======================================================================================================================
// Unit Tests
//======================================================================================================================
