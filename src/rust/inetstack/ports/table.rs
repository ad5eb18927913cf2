// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::{
    inetstack::ports::PortQueue,
    runtime::{
        fail::Fail,
        sync,
    },
};
use ::libc::{
    EADDRINUSE,
    EINVAL,
    ENOSPC,
    ENOTCONN,
};
use ::std::sync::Mutex;

//======================================================================================================================
// Structures
//======================================================================================================================

/// Fixed pool of port queues. A slot is free while its queue is bound to no port.
pub struct PortTable {
    slots: Box<[PortQueue]>,
    /// Serializes bind and unbind so that a port is never bound twice.
    bind_lock: Mutex<()>,
}

//======================================================================================================================
// Associate Functions
//======================================================================================================================

impl PortTable {
    /// Creates a table of `size` free slots whose queues hold `queue_capacity` packets each.
    pub fn new(size: usize, queue_capacity: usize) -> Result<Self, Fail> {
        if size == 0 {
            return Err(Fail::new(EINVAL, "port table must have at least one slot"));
        }
        let slots: Box<[PortQueue]> = (0..size)
            .map(|_| PortQueue::new(queue_capacity))
            .collect::<Result<Vec<PortQueue>, Fail>>()?
            .into_boxed_slice();
        Ok(Self {
            slots,
            bind_lock: Mutex::new(()),
        })
    }

    /// Claims a free slot for `port`.
    pub fn bind(&self, port: u16) -> Result<(), Fail> {
        if port == 0 {
            return Err(Fail::new(EINVAL, "cannot bind port zero"));
        }
        let _guard = sync::lock(&self.bind_lock);
        if self.lookup(port).is_some() {
            let cause: String = format!("port {} is already bound", port);
            warn!("bind(): {}", cause);
            return Err(Fail::new(EADDRINUSE, &cause));
        }
        for slot in self.slots.iter() {
            if slot.claim(port) {
                info!("bind(): port={}", port);
                return Ok(());
            }
        }
        let cause: String = format!("no free slot for port {} (slots={})", port, self.slots.len());
        warn!("bind(): {}", cause);
        Err(Fail::new(ENOSPC, &cause))
    }

    /// Releases the slot bound to `port`, dropping its queued packets and cancelling blocked receivers.
    pub fn unbind(&self, port: u16) -> Result<(), Fail> {
        if port == 0 {
            return Err(Fail::new(EINVAL, "cannot unbind port zero"));
        }
        let _guard = sync::lock(&self.bind_lock);
        match self.lookup(port) {
            Some(slot) => {
                let dropped: usize = slot.release();
                info!("unbind(): port={}, dropped {} queued packets", port, dropped);
                Ok(())
            },
            None => Err(Fail::new(ENOTCONN, "port is not bound")),
        }
    }

    /// Finds the queue bound to `port`.
    pub fn lookup(&self, port: u16) -> Option<&PortQueue> {
        if port == 0 {
            return None;
        }
        self.slots.iter().find(|slot| slot.port() == Some(port))
    }

    /// Number of slots bound to a port.
    pub fn bound(&self) -> usize {
        self.slots.iter().filter(|slot| slot.port().is_some()).count()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================
