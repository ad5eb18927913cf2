// Copyright (c) Microsoft Corporation. All rights reserved.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::runtime::fail::Fail;

//======================================================================================================================
// Structures
//======================================================================================================================

/// A fixed-size circular buffer that owns its items. Callers serialize access (e.g. behind a mutex).
///
/// Cursors are free-running 32-bit counters: the slot of a cursor is the cursor masked by the capacity, and the number
/// of stored items is `back - front` in wrapping arithmetic. This lets every slot hold an item.
pub struct RingBuffer<T> {
    // Counts items ever inserted.
    back: u32,
    // Counts items ever removed.
    front: u32,
    // Underlying buffer.
    buffer: Box<[Option<T>]>,
    // Pre-computed capacity mask for the buffer.
    mask: u32,
}

//======================================================================================================================
// Associated Functions
//======================================================================================================================

impl<T> RingBuffer<T> {
    /// Creates a ring buffer.
    pub fn new(capacity: usize) -> Result<RingBuffer<T>, Fail> {
        // Check if capacity is invalid.
        if !capacity.is_power_of_two() || capacity > (1 << 31) {
            return Err(Fail::new(
                libc::EINVAL,
                "cannot create a ring buffer that does not have a power of two capacity",
            ));
        }

        let buffer: Box<[Option<T>]> = (0..capacity).map(|_| None).collect();
        Ok(RingBuffer {
            back: 0,
            front: 0,
            buffer,
            mask: (capacity - 1) as u32,
        })
    }

    /// Returns the capacity of the target ring buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the number of items stored in the target ring buffer.
    pub fn len(&self) -> usize {
        self.back.wrapping_sub(self.front) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.back == self.front
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Attempts to insert an item at the back of the target ring buffer. A full ring hands the item back.
    pub fn try_enqueue(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        let slot: usize = (self.back & self.mask) as usize;
        debug_assert!(self.buffer[slot].is_none());
        self.buffer[slot] = Some(item);
        self.back = self.back.wrapping_add(1);
        Ok(())
    }

    /// Attempts to remove the item at the front of the target ring buffer.
    pub fn try_dequeue(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let slot: usize = (self.front & self.mask) as usize;
        let item: Option<T> = self.buffer[slot].take();
        self.front = self.front.wrapping_add(1);
        item
    }

    /// Removes every item and rewinds both cursors.
    pub fn clear(&mut self) {
        while self.try_dequeue().is_some() {}
        self.back = 0;
        self.front = 0;
    }

    #[cfg(test)]
    fn with_cursor(capacity: usize, cursor: u32) -> Result<RingBuffer<T>, Fail> {
        let mut ring: RingBuffer<T> = RingBuffer::new(capacity)?;
        ring.back = cursor;
        ring.front = cursor;
        Ok(ring)
    }
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================

#[cfg(test)]
mod test {
    use super::RingBuffer;
    use ::anyhow::Result;

    /// Tests if we succeed to perform sequential accesses to a ring buffer.
    #[test]
    fn ring_buffer_sequential() -> Result<()> {
        let mut ring: RingBuffer<u32> = RingBuffer::<u32>::new(4)?;
        crate::ensure_eq!(ring.is_empty(), true);

        for i in 0..4 {
            if ring.try_enqueue(i).is_err() {
                anyhow::bail!("enqueue into a ring with free slots should succeed");
            }
        }
        crate::ensure_eq!(ring.is_full(), true);
        crate::ensure_eq!(ring.try_enqueue(99), Err(99));

        for i in 0..4 {
            crate::ensure_eq!(ring.try_dequeue(), Some(i));
        }
        crate::ensure_eq!(ring.try_dequeue(), None);
        Ok(())
    }

    /// Tests that the cursors keep working across the 32-bit wrap.
    #[test]
    fn ring_buffer_cursor_wraparound() -> Result<()> {
        let mut ring: RingBuffer<String> = RingBuffer::with_cursor(2, u32::MAX - 1)?;
        for round in 0..5 {
            let first: String = format!("a{}", round);
            let second: String = format!("b{}", round);
            anyhow::ensure!(ring.try_enqueue(first.clone()).is_ok());
            anyhow::ensure!(ring.try_enqueue(second.clone()).is_ok());
            crate::ensure_eq!(ring.len(), 2);
            crate::ensure_eq!(ring.try_dequeue(), Some(first));
            crate::ensure_eq!(ring.try_dequeue(), Some(second));
        }
        Ok(())
    }

    #[test]
    fn ring_buffer_bad_capacity() -> Result<()> {
        anyhow::ensure!(RingBuffer::<u8>::new(6).is_err());
        anyhow::ensure!(RingBuffer::<u8>::new(0).is_err());
        let mut ring: RingBuffer<u8> = RingBuffer::new(1)?;
        crate::ensure_eq!(ring.try_enqueue(1), Ok(()));
        ring.clear();
        crate::ensure_eq!(ring.len(), 0);
        Ok(())
    }
}
