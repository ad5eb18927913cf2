// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::{
    inetstack::protocols::{
        checksum::checksum,
        layer3::IpProtocol,
    },
    runtime::fail::Fail,
};
use ::libc::{
    EBADMSG,
    ENOTSUP,
};
use ::std::net::Ipv4Addr;

//==============================================================================
// Constants
//==============================================================================

/// Size of an IPv4 header without options (in bytes).
pub const IPV4_HEADER_MIN_SIZE: usize = 20;

/// IPv4 header length when no options are present (in 32-bit words).
const IPV4_IHL_NO_OPTIONS: u8 = (IPV4_HEADER_MIN_SIZE as u8) / 4;

/// Time to live of outbound datagrams.
const DEFAULT_IPV4_TTL: u8 = 100;

/// Version number for IPv4.
const IPV4_VERSION: u8 = 4;

/// IPv4 Control Flag: More Fragments.
const IPV4_CTRL_FLAG_MF: u8 = 0x1;

//==============================================================================
// Structures
//==============================================================================

/// IPv4 Datagram Header
#[derive(Debug, Copy, Clone)]
pub struct Ipv4Header {
    /// Internet Header Length (in 32-bit words).
    ihl: u8,
    /// Type of service.
    tos: u8,
    /// Total length of the datagram including header and data.
    total_length: u16,
    identification: u16,
    /// Control flags (3 bits).
    flags: u8,
    /// Fragment offset (13 bits).
    fragment_offset: u16,
    ttl: u8,
    protocol: IpProtocol,
    header_checksum: u16,
    src_addr: Ipv4Addr,
    dst_addr: Ipv4Addr,
}

//==============================================================================
// Associate Functions
//==============================================================================

impl Ipv4Header {
    /// Instantiates an IPv4 header without options.
    pub fn new(src_addr: Ipv4Addr, dst_addr: Ipv4Addr, protocol: IpProtocol) -> Self {
        Self {
            ihl: IPV4_IHL_NO_OPTIONS,
            tos: 0,
            total_length: IPV4_HEADER_MIN_SIZE as u16,
            identification: 0,
            flags: 0,
            fragment_offset: 0,
            ttl: DEFAULT_IPV4_TTL,
            protocol,
            header_checksum: 0,
            src_addr,
            dst_addr,
        }
    }

    /// Computes the size of the target IPv4 header.
    pub fn compute_size(&self) -> usize {
        (self.ihl as usize) << 2
    }

    /// Parses and validates the IPv4 header at the front of `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self, Fail> {
        // The datagram should be as big as the header.
        if buf.len() < IPV4_HEADER_MIN_SIZE {
            return Err(Fail::new(EBADMSG, "ipv4 datagram too small"));
        }

        // IP version number.
        let version: u8 = buf[0] >> 4;
        if version != IPV4_VERSION {
            return Err(Fail::new(ENOTSUP, "unsupported IP version"));
        }

        // Internet header length.
        let ihl: u8 = buf[0] & 0xF;
        let hdr_size: usize = (ihl as usize) << 2;
        if hdr_size < IPV4_HEADER_MIN_SIZE {
            return Err(Fail::new(EBADMSG, "ipv4 IHL is too small"));
        }
        if buf.len() < hdr_size {
            return Err(Fail::new(EBADMSG, "ipv4 datagram too small to fit in header"));
        }
        let hdr_buf: &[u8] = &buf[..hdr_size];

        // Total length. There may be padding bytes after the datagram.
        let total_length: u16 = u16::from_be_bytes([hdr_buf[2], hdr_buf[3]]);
        if (total_length as usize) < hdr_size {
            return Err(Fail::new(EBADMSG, "ipv4 datagram smaller than header"));
        }
        if (total_length as usize) > buf.len() {
            return Err(Fail::new(EBADMSG, "ipv4 datagram size mismatch"));
        }

        let identification: u16 = u16::from_be_bytes([hdr_buf[4], hdr_buf[5]]);

        // Fragments past the first carry no transport header, so reassembly would be needed.
        let flags: u8 = hdr_buf[6] >> 5;
        let fragment_offset: u16 = u16::from_be_bytes([hdr_buf[6], hdr_buf[7]]) & 0x1fff;
        if flags & IPV4_CTRL_FLAG_MF != 0 || fragment_offset != 0 {
            return Err(Fail::new(ENOTSUP, "ipv4 fragmentation is not supported"));
        }

        let ttl: u8 = hdr_buf[8];
        let protocol: IpProtocol = IpProtocol::try_from(hdr_buf[9])?;

        // A valid header sums to zero, options included.
        let header_checksum: u16 = u16::from_be_bytes([hdr_buf[10], hdr_buf[11]]);
        if checksum(hdr_buf) != 0 {
            return Err(Fail::new(EBADMSG, "ipv4 checksum mismatch"));
        }

        Ok(Self {
            ihl,
            tos: hdr_buf[1],
            total_length,
            identification,
            flags,
            fragment_offset,
            ttl,
            protocol,
            header_checksum,
            src_addr: Ipv4Addr::new(hdr_buf[12], hdr_buf[13], hdr_buf[14], hdr_buf[15]),
            dst_addr: Ipv4Addr::new(hdr_buf[16], hdr_buf[17], hdr_buf[18], hdr_buf[19]),
        })
    }

    /// Serializes the target IPv4 header for a datagram carrying `payload_len` bytes.
    pub fn serialize(&self, buf: &mut [u8], payload_len: usize) {
        let buf: &mut [u8] = &mut buf[..IPV4_HEADER_MIN_SIZE];

        // Version + IHL.
        buf[0] = (IPV4_VERSION << 4) | IPV4_IHL_NO_OPTIONS;
        buf[1] = self.tos;
        buf[2..4].copy_from_slice(&((IPV4_HEADER_MIN_SIZE + payload_len) as u16).to_be_bytes());
        buf[4..6].copy_from_slice(&self.identification.to_be_bytes());
        buf[6..8].copy_from_slice(&((self.flags as u16) << 13 | self.fragment_offset & 0x1fff).to_be_bytes());
        buf[8] = self.ttl;
        buf[9] = self.protocol as u8;
        buf[10..12].copy_from_slice(&[0, 0]);
        buf[12..16].copy_from_slice(&self.src_addr.octets());
        buf[16..20].copy_from_slice(&self.dst_addr.octets());

        let sum: u16 = checksum(buf);
        buf[10..12].copy_from_slice(&sum.to_be_bytes());
    }

    pub fn get_src_addr(&self) -> Ipv4Addr {
        self.src_addr
    }

    pub fn get_dest_addr(&self) -> Ipv4Addr {
        self.dst_addr
    }

    pub fn get_protocol(&self) -> IpProtocol {
        self.protocol
    }

    pub fn get_total_length(&self) -> usize {
        self.total_length as usize
    }

    pub fn get_ttl(&self) -> u8 {
        self.ttl
    }

    pub fn get_header_checksum(&self) -> u16 {
        self.header_checksum
    }
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================
