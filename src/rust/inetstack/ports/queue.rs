// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::{
    collections::ring::RingBuffer,
    runtime::{
        fail::Fail,
        memory::PageBuffer,
        sync,
    },
};
use ::libc::{
    ECANCELED,
    ENOTCONN,
    ETIMEDOUT,
};
use ::std::{
    sync::{
        Condvar,
        Mutex,
        MutexGuard,
    },
    time::{
        Duration,
        Instant,
    },
};

//======================================================================================================================
// Constants
//======================================================================================================================

/// Port number of a free queue.
const FREE_PORT: u16 = 0;

//======================================================================================================================
// Structures
//======================================================================================================================

/// A received datagram waiting to be consumed.
#[derive(Debug)]
pub struct Packet {
    /// The frame holding the datagram.
    pub buffer: PageBuffer,
    /// Frame length (in bytes).
    pub length: usize,
    /// UDP source port.
    pub src_port: u16,
}

/// What happened to a packet offered to a [PortQueue].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Enqueued {
    Queued,
    /// The queue was full; the packet was dropped and counted.
    Full,
    /// The queue is no longer bound to the port; the packet was dropped.
    Unbound,
}

/// A bounded packet queue bound to at most one port. Many producers (the receive path) and one consumer per bound
/// port; consumers block on `readable` until a packet arrives or the port is unbound.
pub struct PortQueue {
    state: Mutex<QueueState>,
    readable: Condvar,
}

struct QueueState {
    /// Bound port, or zero if the queue is free.
    port: u16,
    /// Bumped on every bind and unbind so that waiters notice their binding went away.
    generation: u64,
    packets: RingBuffer<Packet>,
    /// Packets dropped because the queue was full.
    dropped: u64,
    /// Consumers currently blocked in [PortQueue::dequeue].
    waiters: usize,
}

//======================================================================================================================
// Associate Functions
//======================================================================================================================

impl PortQueue {
    /// Creates a free queue holding up to `capacity` packets. The capacity must be a power of two.
    pub fn new(capacity: usize) -> Result<Self, Fail> {
        Ok(Self {
            state: Mutex::new(QueueState {
                port: FREE_PORT,
                generation: 0,
                packets: RingBuffer::new(capacity)?,
                dropped: 0,
                waiters: 0,
            }),
            readable: Condvar::new(),
        })
    }

    /// Port this queue is bound to, if any.
    pub fn port(&self) -> Option<u16> {
        match sync::lock(&self.state).port {
            FREE_PORT => None,
            port => Some(port),
        }
    }

    /// Binds a free queue to `port`, starting from empty cursors and a zero drop count.
    pub fn claim(&self, port: u16) -> bool {
        let mut state: MutexGuard<QueueState> = sync::lock(&self.state);
        if state.port != FREE_PORT {
            return false;
        }
        state.port = port;
        state.generation += 1;
        state.packets.clear();
        state.dropped = 0;
        true
    }

    /// Frees the queue, dropping every queued packet and cancelling blocked consumers. Returns the number of packets
    /// dropped.
    pub fn release(&self) -> usize {
        let pending: Vec<Packet> = {
            let mut state: MutexGuard<QueueState> = sync::lock(&self.state);
            state.port = FREE_PORT;
            state.generation += 1;
            let mut pending: Vec<Packet> = Vec::with_capacity(state.packets.len());
            while let Some(packet) = state.packets.try_dequeue() {
                pending.push(packet);
            }
            state.packets.clear();
            pending
        };
        self.readable.notify_all();
        pending.len()
    }

    /// Offers `packet` to the queue bound to `port` and wakes consumers if it was queued.
    pub fn enqueue(&self, port: u16, packet: Packet) -> Enqueued {
        let outcome: Enqueued = {
            let mut state: MutexGuard<QueueState> = sync::lock(&self.state);
            if state.port != port {
                Enqueued::Unbound
            } else {
                match state.packets.try_enqueue(packet) {
                    Ok(()) => Enqueued::Queued,
                    Err(_dropped) => {
                        state.dropped += 1;
                        Enqueued::Full
                    },
                }
            }
        };
        if outcome == Enqueued::Queued {
            self.readable.notify_all();
        }
        outcome
    }

    /// Removes the oldest packet queued for `port`, waiting for one to arrive. Fails with `ENOTCONN` if the queue is
    /// not bound to `port`, `ECANCELED` if the port is unbound while waiting, and `ETIMEDOUT` once `timeout` expires.
    pub fn dequeue(&self, port: u16, timeout: Option<Duration>) -> Result<Packet, Fail> {
        let deadline: Option<Instant> = timeout.map(|timeout| Instant::now() + timeout);
        let mut state: MutexGuard<QueueState> = sync::lock(&self.state);
        if state.port != port {
            return Err(Fail::new(ENOTCONN, "port is not bound"));
        }
        let generation: u64 = state.generation;

        loop {
            if state.generation != generation {
                return Err(Fail::new(ECANCELED, "port was unbound"));
            }
            if let Some(packet) = state.packets.try_dequeue() {
                return Ok(packet);
            }
            let remaining: Option<Duration> = match deadline {
                None => None,
                Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                    Some(remaining) if !remaining.is_zero() => Some(remaining),
                    _ => return Err(Fail::new(ETIMEDOUT, "timed out waiting for a datagram")),
                },
            };
            state.waiters += 1;
            state = match remaining {
                None => sync::wait(&self.readable, state),
                Some(remaining) => sync::wait_timeout(&self.readable, state, remaining).0,
            };
            state.waiters -= 1;
        }
    }

    /// Number of packets dropped because the queue was full since it was bound.
    pub fn dropped(&self) -> u64 {
        sync::lock(&self.state).dropped
    }

    /// Number of packets waiting in the queue.
    pub fn len(&self) -> usize {
        sync::lock(&self.state).packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of consumers blocked waiting for a packet.
    pub fn waiters(&self) -> usize {
        sync::lock(&self.state).waiters
    }
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================

#[cfg(test)]
mod tests {
    use super::{
        Enqueued,
        Packet,
        PortQueue,
    };
    use crate::runtime::memory::{
        PageAllocator,
        PagePool,
    };
    use ::anyhow::Result;
    use ::std::{
        sync::Arc,
        thread,
        time::Duration,
    };

    fn packet(pool: &PagePool, src_port: u16) -> Result<Packet> {
        Ok(Packet {
            buffer: pool.allocate()?,
            length: 64,
            src_port,
        })
    }

    /// Packets come out in arrival order; overflow is counted and released.
    #[test]
    fn fifo_and_drop_accounting() -> Result<()> {
        let pool: PagePool = PagePool::new(8);
        let queue: PortQueue = PortQueue::new(4)?;
        anyhow::ensure!(queue.claim(7000));

        for src_port in 1..=6 {
            let expected: Enqueued = if src_port <= 4 { Enqueued::Queued } else { Enqueued::Full };
            crate::ensure_eq!(queue.enqueue(7000, packet(&pool, src_port)?), expected);
        }
        crate::ensure_eq!(queue.dropped(), 2);
        crate::ensure_eq!(pool.available(), 4);

        for src_port in 1..=4 {
            crate::ensure_eq!(queue.dequeue(7000, None)?.src_port, src_port);
        }
        crate::ensure_eq!(pool.available(), 8);
        crate::ensure_eq!(queue.is_empty(), true);
        Ok(())
    }

    #[test]
    fn wrong_port_is_rejected() -> Result<()> {
        let pool: PagePool = PagePool::new(1);
        let queue: PortQueue = PortQueue::new(4)?;
        crate::ensure_eq!(queue.enqueue(7000, packet(&pool, 1)?), Enqueued::Unbound);
        crate::ensure_eq!(pool.available(), 1);
        match queue.dequeue(7000, None) {
            Err(e) => crate::ensure_eq!(e.errno, libc::ENOTCONN),
            Ok(_) => anyhow::bail!("dequeue on a free queue should fail"),
        }
        anyhow::ensure!(queue.claim(7000));
        anyhow::ensure!(!queue.claim(7001));
        crate::ensure_eq!(queue.port(), Some(7000));
        Ok(())
    }

    #[test]
    fn release_cancels_waiter_and_drops_packets() -> Result<()> {
        let pool: PagePool = PagePool::new(2);
        let queue: Arc<PortQueue> = Arc::new(PortQueue::new(4)?);
        anyhow::ensure!(queue.claim(9000));

        let waiter: thread::JoinHandle<Option<i32>> = {
            let queue: Arc<PortQueue> = queue.clone();
            thread::spawn(move || queue.dequeue(9000, None).err().map(|e| e.errno))
        };
        while queue.waiters() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        crate::ensure_eq!(queue.release(), 0);
        match waiter.join() {
            Ok(errno) => crate::ensure_eq!(errno, Some(libc::ECANCELED)),
            Err(_) => anyhow::bail!("waiter panicked"),
        }

        anyhow::ensure!(queue.claim(9000));
        crate::ensure_eq!(queue.enqueue(9000, packet(&pool, 1)?), Enqueued::Queued);
        crate::ensure_eq!(queue.release(), 1);
        crate::ensure_eq!(pool.available(), 2);
        crate::ensure_eq!(queue.port(), None);
        Ok(())
    }

    #[test]
    fn dequeue_times_out() -> Result<()> {
        let queue: PortQueue = PortQueue::new(2)?;
        anyhow::ensure!(queue.claim(53));
        match queue.dequeue(53, Some(Duration::from_millis(20))) {
            Err(e) => crate::ensure_eq!(e.errno, libc::ETIMEDOUT),
            Ok(_) => anyhow::bail!("dequeue on an empty queue should time out"),
        }
        Ok(())
    }
}
