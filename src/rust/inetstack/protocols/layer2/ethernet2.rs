// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::runtime::{
    fail::Fail,
    network::types::MacAddress,
};
use ::libc::{
    EBADMSG,
    ENOTSUP,
};

//======================================================================================================================
// Constants
//======================================================================================================================

pub const ETHERNET2_HEADER_SIZE: usize = 14;

//======================================================================================================================
// Enumerations
//======================================================================================================================

#[repr(u16)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EtherType2 {
    Arp = 0x0806,
    Ipv4 = 0x0800,
}

//======================================================================================================================
// Structures
//======================================================================================================================

#[derive(Clone, Debug)]
pub struct Ethernet2Header {
    // Bytes 0..6
    dst_addr: MacAddress,
    // Bytes 6..12
    src_addr: MacAddress,
    // Bytes 12..14
    ether_type: EtherType2,
}

//======================================================================================================================
// Associated Functions
//======================================================================================================================

impl Ethernet2Header {
    /// Creates a header for an Ethernet frame.
    pub fn new(dst_addr: MacAddress, src_addr: MacAddress, ether_type: EtherType2) -> Self {
        Self {
            dst_addr,
            src_addr,
            ether_type,
        }
    }

    /// Parses the Ethernet header at the front of `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self, Fail> {
        if buf.len() < ETHERNET2_HEADER_SIZE {
            return Err(Fail::new(EBADMSG, "frame too small"));
        }
        let hdr_buf: &[u8] = &buf[..ETHERNET2_HEADER_SIZE];
        let dst_addr: MacAddress = MacAddress::from_slice(&hdr_buf[0..6])?;
        let src_addr: MacAddress = MacAddress::from_slice(&hdr_buf[6..12])?;
        let ether_type: EtherType2 = EtherType2::try_from(u16::from_be_bytes([hdr_buf[12], hdr_buf[13]]))?;
        Ok(Self {
            dst_addr,
            src_addr,
            ether_type,
        })
    }

    /// Serializes the target header into the front of `buf`.
    pub fn serialize(&self, buf: &mut [u8]) {
        buf[0..6].copy_from_slice(&self.dst_addr.octets());
        buf[6..12].copy_from_slice(&self.src_addr.octets());
        buf[12..14].copy_from_slice(&(self.ether_type as u16).to_be_bytes());
    }

    pub fn dst_addr(&self) -> MacAddress {
        self.dst_addr
    }

    pub fn src_addr(&self) -> MacAddress {
        self.src_addr
    }

    pub fn ether_type(&self) -> EtherType2 {
        self.ether_type
    }
}

//======================================================================================================================
// Trait Implementations
//======================================================================================================================

impl TryFrom<u16> for EtherType2 {
    type Error = Fail;

    fn try_from(n: u16) -> Result<Self, Fail> {
        match n {
            0x0806 => Ok(EtherType2::Arp),
            0x0800 => Ok(EtherType2::Ipv4),
            _ => Err(Fail::new(ENOTSUP, "unsupported ether type")),
        }
    }
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================

#[cfg(test)]
mod tests {
    use super::{
        EtherType2,
        Ethernet2Header,
        ETHERNET2_HEADER_SIZE,
    };
    use crate::runtime::network::types::MacAddress;
    use ::anyhow::Result;

    #[test]
    fn ethernet2_header_wire_format() -> Result<()> {
        let dst: MacAddress = MacAddress::new([0x52, 0x55, 0x0a, 0x00, 0x02, 0x02]);
        let src: MacAddress = MacAddress::new([0x52, 0x54, 0x00, 0x12, 0x34, 0x56]);
        let mut buf: [u8; ETHERNET2_HEADER_SIZE] = [0; ETHERNET2_HEADER_SIZE];
        Ethernet2Header::new(dst, src, EtherType2::Arp).serialize(&mut buf);
        crate::ensure_eq!(&buf[12..14], &[0x08, 0x06]);
        crate::ensure_eq!(&buf[0..6], &dst.octets());

        let header: Ethernet2Header = Ethernet2Header::parse(&buf)?;
        crate::ensure_eq!(header.dst_addr(), dst);
        crate::ensure_eq!(header.src_addr(), src);
        crate::ensure_eq!(header.ether_type(), EtherType2::Arp);

        buf[12] = 0x86;
        buf[13] = 0xdd;
        match Ethernet2Header::parse(&buf) {
            Err(e) => crate::ensure_eq!(e.errno, libc::ENOTSUP),
            Ok(_) => anyhow::bail!("IPv6 frames should be rejected"),
        }
        anyhow::ensure!(Ethernet2Header::parse(&buf[..10]).is_err());
        Ok(())
    }
}
