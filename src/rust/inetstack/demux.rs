// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::{
    inetstack::{
        ports::{
            Enqueued,
            Packet,
        },
        protocols::{
            layer2::{
                EtherType2,
                Ethernet2Header,
                ETHERNET2_HEADER_SIZE,
            },
            layer3::{
                ArpHeader,
                ArpOperation,
                IpProtocol,
                Ipv4Header,
            },
            layer4::UdpHeader,
            MIN_ARP_FRAME_SIZE,
            MIN_IPV4_FRAME_SIZE,
        },
        NetStack,
    },
    runtime::{
        fail::Fail,
        memory::PageBuffer,
        network::MacAddress,
    },
};
use ::libc::ENOTSUP;
use ::std::sync::atomic::Ordering;

//======================================================================================================================
// Standalone Functions
//======================================================================================================================

/// Locates the UDP datagram inside an Ethernet/IPv4 frame. Returns both headers and the offset of the UDP header.
pub(super) fn locate_udp(frame: &[u8]) -> Result<(Ipv4Header, UdpHeader, usize), Fail> {
    let ip_hdr: Ipv4Header = Ipv4Header::parse(&frame[ETHERNET2_HEADER_SIZE..])?;
    if ip_hdr.get_protocol() != IpProtocol::UDP {
        return Err(Fail::new(ENOTSUP, "not a UDP datagram"));
    }
    let udp_offset: usize = ETHERNET2_HEADER_SIZE + ip_hdr.compute_size();
    let ip_end: usize = ETHERNET2_HEADER_SIZE + ip_hdr.get_total_length();
    let udp_hdr: UdpHeader = UdpHeader::parse(&frame[udp_offset..ip_end])?;
    Ok((ip_hdr, udp_hdr, udp_offset))
}

//======================================================================================================================
// Associate Functions
//======================================================================================================================

impl NetStack {
    /// Classifies a received frame and hands it to the matching protocol handler. Frames nobody wants are dropped
    /// here, which returns their page to the allocator.
    pub(super) fn classify_and_dispatch(&self, buffer: PageBuffer, length: usize) {
        let ether_type: Option<EtherType2> = match Ethernet2Header::parse(&buffer[..length]) {
            Ok(hdr) => Some(hdr.ether_type()),
            Err(_) => None,
        };
        match ether_type {
            Some(EtherType2::Arp) if length >= MIN_ARP_FRAME_SIZE => self.receive_arp(buffer, length),
            Some(EtherType2::Ipv4) if length >= MIN_IPV4_FRAME_SIZE => self.receive_ip(buffer, length),
            _ => {
                trace!("classify_and_dispatch(): dropping frame (length={})", length);
                self.counters.frames_dropped.fetch_add(1, Ordering::Relaxed);
            },
        }
    }

    /// Answers the first ARP request with our address. Every other ARP message is ignored.
    fn receive_arp(&self, buffer: PageBuffer, length: usize) {
        let eth_hdr: Ethernet2Header = match Ethernet2Header::parse(&buffer[..length]) {
            Ok(hdr) => hdr,
            Err(_) => return,
        };
        let query: ArpHeader = match ArpHeader::parse(&buffer[ETHERNET2_HEADER_SIZE..length]) {
            Ok(query) => query,
            Err(e) => {
                debug!("receive_arp(): dropping malformed message ({:?})", e);
                self.counters.frames_dropped.fetch_add(1, Ordering::Relaxed);
                return;
            },
        };
        if query.get_operation() != ArpOperation::Request {
            return;
        }
        if self.arp_seen.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("receive_arp(): received an ARP packet");

        // Reuse the request's page for the reply.
        let remote_link_addr: MacAddress = eth_hdr.src_addr();
        let reply: ArpHeader = ArpHeader::new(
            ArpOperation::Reply,
            self.local_link_addr,
            self.local_ipv4_addr,
            remote_link_addr,
            query.get_sender_protocol_addr(),
        );
        let mut buffer: PageBuffer = buffer;
        buffer[..MIN_ARP_FRAME_SIZE].fill(0);
        Ethernet2Header::new(remote_link_addr, self.local_link_addr, EtherType2::Arp).serialize(&mut buffer[..]);
        reply.serialize(&mut buffer[ETHERNET2_HEADER_SIZE..]);
        match self.device.transmit(buffer, MIN_ARP_FRAME_SIZE) {
            Ok(()) => {
                self.counters.arp_replies.fetch_add(1, Ordering::Relaxed);
            },
            Err(e) => warn!("receive_arp(): failed to send reply ({:?})", e),
        }
    }

    /// Queues a UDP datagram on the port it is addressed to.
    fn receive_ip(&self, buffer: PageBuffer, length: usize) {
        if !self.ip_seen.swap(true, Ordering::AcqRel) {
            info!("receive_ip(): received an IP packet");
        }

        let (ip_hdr, udp_hdr, _): (Ipv4Header, UdpHeader, usize) = match locate_udp(&buffer[..length]) {
            Ok(headers) => headers,
            Err(e) => {
                debug!("receive_ip(): dropping datagram ({:?})", e);
                self.counters.frames_dropped.fetch_add(1, Ordering::Relaxed);
                return;
            },
        };

        let dst_port: u16 = udp_hdr.dest_port();
        let queue = match self.ports.lookup(dst_port) {
            Some(queue) => queue,
            None => {
                warn!("receive_ip(): no queue bound to port {} (src={})", dst_port, ip_hdr.get_src_addr());
                self.counters.unbound_drops.fetch_add(1, Ordering::Relaxed);
                return;
            },
        };
        let packet: Packet = Packet {
            buffer,
            length,
            src_port: udp_hdr.src_port(),
        };
        match queue.enqueue(dst_port, packet) {
            Enqueued::Queued => trace!("receive_ip(): queued datagram for port {}", dst_port),
            Enqueued::Full => debug!("receive_ip(): queue for port {} is full", dst_port),
            Enqueued::Unbound => {
                debug!("receive_ip(): port {} was unbound", dst_port);
                self.counters.unbound_drops.fetch_add(1, Ordering::Relaxed);
            },
        }
    }
}
