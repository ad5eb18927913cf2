// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Minimal ARP/IPv4/UDP stack on top of the E1000 rings: inbound frames are demultiplexed to per-port queues, and
//! outbound datagrams are framed and handed to the transmit ring.

mod demux;
pub mod ports;
pub mod protocols;


//======================================================================================================================
// Imports
//======================================================================================================================

use self::{
    ports::{
        Packet,
        PortQueue,
        PortTable,
    },
    protocols::{
        layer2::{
            EtherType2,
            Ethernet2Header,
            ETHERNET2_HEADER_SIZE,
        },
        layer3::{
            IpProtocol,
            Ipv4Header,
            IPV4_HEADER_MIN_SIZE,
        },
        layer4::{
            UdpHeader,
            UDP_HEADER_SIZE,
        },
        UDP_FRAME_HEADER_SIZE,
    },
};
use crate::{
    e1000::{
        DrainStats,
        RegisterBus,
        E1000,
    },
    runtime::{
        fail::Fail,
        memory::{
            PageAllocator,
            PageBuffer,
            PAGE_SIZE,
        },
        network::{
            config::NetConfig,
            MacAddress,
        },
    },
};
use ::libc::{
    EBADMSG,
    EINVAL,
    EMSGSIZE,
    ENOTCONN,
};
use ::std::{
    net::Ipv4Addr,
    sync::{
        atomic::{
            AtomicBool,
            AtomicU64,
            Ordering,
        },
        Arc,
    },
    time::Duration,
};

//======================================================================================================================
// Structures
//======================================================================================================================

/// Snapshot of the packet path counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NetStats {
    /// Frames taken off the receive ring and demultiplexed.
    pub frames_drained: u64,
    /// ARP replies handed to the device.
    pub arp_replies: u64,
    /// Frames dropped by the driver or as short, unrecognized or malformed.
    pub frames_dropped: u64,
    /// Datagrams dropped because no queue is bound to their destination port.
    pub unbound_drops: u64,
}

#[derive(Default)]
struct Counters {
    frames_drained: AtomicU64,
    arp_replies: AtomicU64,
    frames_dropped: AtomicU64,
    unbound_drops: AtomicU64,
}

/// The packet path: device rings, protocol demultiplexer and port queue table.
pub struct NetStack {
    device: E1000,
    allocator: Arc<dyn PageAllocator>,
    local_link_addr: MacAddress,
    local_ipv4_addr: Ipv4Addr,
    peer_link_addr: MacAddress,
    ports: PortTable,
    /// Only the first ARP request is answered.
    arp_seen: AtomicBool,
    ip_seen: AtomicBool,
    counters: Counters,
}

//======================================================================================================================
// Associate Functions
//======================================================================================================================

impl NetStack {
    /// Brings up the device behind `bus` and an empty port table as described by `config`.
    pub fn new(bus: Arc<dyn RegisterBus>, allocator: Arc<dyn PageAllocator>, config: &NetConfig) -> Result<Self, Fail> {
        config.validate()?;
        let ports: PortTable = PortTable::new(config.port_table_size(), config.port_queue_size())?;
        let device: E1000 = E1000::new(bus, allocator.clone(), config)?;
        info!(
            "new(): local_ipv4_addr={}, peer_link_addr={}, ports={}",
            config.local_ipv4_addr(),
            config.peer_link_addr(),
            ports.capacity()
        );
        Ok(Self {
            device,
            allocator,
            local_link_addr: config.local_link_addr(),
            local_ipv4_addr: config.local_ipv4_addr(),
            peer_link_addr: config.peer_link_addr(),
            ports,
            arp_seen: AtomicBool::new(false),
            ip_seen: AtomicBool::new(false),
            counters: Counters::default(),
        })
    }

    /// Prepares to receive datagrams addressed to `port`.
    pub fn bind(&self, port: u16) -> Result<(), Fail> {
        self.ports.bind(port)
    }

    /// Stops receiving datagrams addressed to `port`. Queued datagrams are dropped and blocked receivers fail with
    /// `ECANCELED`.
    pub fn unbind(&self, port: u16) -> Result<(), Fail> {
        self.ports.unbind(port)
    }

    /// Waits for a datagram addressed to `port` and returns its source address, source port and up to `max_len`
    /// payload bytes.
    pub fn receive(&self, port: u16, max_len: usize) -> Result<(Ipv4Addr, u16, Vec<u8>), Fail> {
        self.receive_with(port, max_len, None, |src_addr, src_port, payload| {
            Ok((src_addr, src_port, payload.to_vec()))
        })
    }

    /// Same as [NetStack::receive] but fails with `ETIMEDOUT` if nothing arrives within `timeout`.
    pub fn receive_timeout(
        &self,
        port: u16,
        max_len: usize,
        timeout: Duration,
    ) -> Result<(Ipv4Addr, u16, Vec<u8>), Fail> {
        self.receive_with(port, max_len, Some(timeout), |src_addr, src_port, payload| {
            Ok((src_addr, src_port, payload.to_vec()))
        })
    }

    /// Dequeues the next datagram for `port` and hands its source address, source port and truncated payload to
    /// `consume`. The frame is released once `consume` returns.
    pub fn receive_with<T, F>(&self, port: u16, max_len: usize, timeout: Option<Duration>, consume: F) -> Result<T, Fail>
    where
        F: FnOnce(Ipv4Addr, u16, &[u8]) -> Result<T, Fail>,
    {
        if port == 0 {
            return Err(Fail::new(EINVAL, "cannot receive on port zero"));
        }
        let queue: &PortQueue = match self.ports.lookup(port) {
            Some(queue) => queue,
            None => {
                let cause: String = format!("receive on unbound port {}", port);
                warn!("receive(): {}", cause);
                return Err(Fail::new(ENOTCONN, &cause));
            },
        };
        let packet: Packet = queue.dequeue(port, timeout)?;

        let frame: &[u8] = &packet.buffer[..packet.length];
        let (ip_hdr, udp_hdr, udp_offset): (Ipv4Header, UdpHeader, usize) = match demux::locate_udp(frame) {
            Ok(headers) => headers,
            Err(e) => return Err(Fail::new(EBADMSG, &e.cause)),
        };
        let payload_offset: usize = udp_offset + UDP_HEADER_SIZE;
        let len: usize = max_len.min(udp_hdr.payload_len());
        consume(
            ip_hdr.get_src_addr(),
            packet.src_port,
            &frame[payload_offset..payload_offset + len],
        )
    }

    /// Sends `payload` from `src_port` to `dst_port` at `dst_addr`.
    pub fn send(&self, src_port: u16, dst_addr: Ipv4Addr, dst_port: u16, payload: &[u8]) -> Result<(), Fail> {
        self.send_with(src_port, dst_addr, dst_port, payload.len(), |buf| {
            buf.copy_from_slice(payload);
            Ok(())
        })
    }

    /// Frames a datagram of `len` payload bytes, lets `fill` write the payload in place, and hands the frame to the
    /// device. The frame must fit in one page; otherwise this fails with `EMSGSIZE` before allocating.
    pub fn send_with<F>(&self, src_port: u16, dst_addr: Ipv4Addr, dst_port: u16, len: usize, fill: F) -> Result<(), Fail>
    where
        F: FnOnce(&mut [u8]) -> Result<(), Fail>,
    {
        if len > PAGE_SIZE - UDP_FRAME_HEADER_SIZE {
            let cause: String = format!("datagram too large (len={})", len);
            warn!("send(): {}", cause);
            return Err(Fail::new(EMSGSIZE, &cause));
        }
        let total: usize = UDP_FRAME_HEADER_SIZE + len;

        let mut buffer: PageBuffer = match self.allocator.allocate() {
            Ok(buffer) => buffer,
            Err(e) => {
                warn!("send(): cannot allocate a frame: {:?}", e);
                return Err(e);
            },
        };
        buffer[..total].fill(0);

        // Payload first, so a failed copy releases the frame untouched by the device.
        fill(&mut buffer[UDP_FRAME_HEADER_SIZE..total])?;

        Ethernet2Header::new(self.peer_link_addr, self.local_link_addr, EtherType2::Ipv4).serialize(&mut buffer[..]);
        Ipv4Header::new(self.local_ipv4_addr, dst_addr, IpProtocol::UDP).serialize(
            &mut buffer[ETHERNET2_HEADER_SIZE..],
            UDP_HEADER_SIZE + len,
        );
        UdpHeader::new(src_port, dst_port).serialize(&mut buffer[ETHERNET2_HEADER_SIZE + IPV4_HEADER_MIN_SIZE..], len);

        trace!("send(): {}:{} -> {}:{} ({} bytes)", self.local_ipv4_addr, src_port, dst_addr, dst_port, len);
        self.device.transmit(buffer, total)
    }

    /// Receive interrupt: acknowledges the device and drains the receive ring into the demultiplexer.
    pub fn interrupt(&self) {
        self.device.acknowledge_interrupt();
        let stats: DrainStats = self
            .device
            .drain_rx(|buffer, length| self.classify_and_dispatch(buffer, length));
        self.counters
            .frames_drained
            .fetch_add(stats.delivered as u64, Ordering::Relaxed);
        self.counters
            .frames_dropped
            .fetch_add(stats.dropped as u64, Ordering::Relaxed);
    }

    pub fn stats(&self) -> NetStats {
        NetStats {
            frames_drained: self.counters.frames_drained.load(Ordering::Relaxed),
            arp_replies: self.counters.arp_replies.load(Ordering::Relaxed),
            frames_dropped: self.counters.frames_dropped.load(Ordering::Relaxed),
            unbound_drops: self.counters.unbound_drops.load(Ordering::Relaxed),
        }
    }

    /// Number of datagrams to `port` dropped because its queue was full.
    pub fn dropped(&self, port: u16) -> Result<u64, Fail> {
        match self.ports.lookup(port) {
            Some(queue) => Ok(queue.dropped()),
            None => Err(Fail::new(ENOTCONN, "port is not bound")),
        }
    }

    pub fn local_ipv4_addr(&self) -> Ipv4Addr {
        self.local_ipv4_addr
    }

    pub fn local_link_addr(&self) -> MacAddress {
        self.local_link_addr
    }

    #[cfg(test)]
    fn waiters(&self, port: u16) -> usize {
        self.ports.lookup(port).map_or(0, |queue| queue.waiters())
    }
}
