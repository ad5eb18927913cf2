// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::runtime::fail::Fail;
use ::libc::EBADMSG;

//======================================================================================================================
// Constants
//======================================================================================================================

/// Size of a UDP header (in bytes).
pub const UDP_HEADER_SIZE: usize = 8;

//======================================================================================================================
// Structures
//======================================================================================================================

/// UDP Datagram Header
#[derive(Debug)]
pub struct UdpHeader {
    /// Port used on sender side (optional).
    src_port: u16,
    /// Port used receiver side.
    dest_port: u16,
    /// Length of header and payload (in bytes).
    length: u16,
}

//======================================================================================================================
// Associated Functions
//======================================================================================================================

/// Associate functions for UDP Datagram Headers
impl UdpHeader {
    /// Creates a UDP header.
    pub fn new(src_port: u16, dest_port: u16) -> Self {
        Self {
            src_port,
            dest_port,
            length: UDP_HEADER_SIZE as u16,
        }
    }

    /// Returns the source port stored in the target UDP header.
    pub fn src_port(&self) -> u16 {
        self.src_port
    }

    /// Returns the destination port stored in the target UDP header.
    pub fn dest_port(&self) -> u16 {
        self.dest_port
    }

    /// Returns the number of payload bytes announced by the target UDP header.
    pub fn payload_len(&self) -> usize {
        self.length as usize - UDP_HEADER_SIZE
    }

    /// Parses the UDP header at the front of `buf`, where `buf` spans the rest of the IP datagram.
    pub fn parse(buf: &[u8]) -> Result<Self, Fail> {
        // Malformed header.
        if buf.len() < UDP_HEADER_SIZE {
            return Err(Fail::new(EBADMSG, "UDP segment too small"));
        }

        let hdr_buf: &[u8] = &buf[..UDP_HEADER_SIZE];
        let src_port: u16 = u16::from_be_bytes([hdr_buf[0], hdr_buf[1]]);
        let dest_port: u16 = u16::from_be_bytes([hdr_buf[2], hdr_buf[3]]);
        let length: u16 = u16::from_be_bytes([hdr_buf[4], hdr_buf[5]]);
        if (length as usize) < UDP_HEADER_SIZE || (length as usize) > buf.len() {
            return Err(Fail::new(EBADMSG, "UDP length mismatch"));
        }

        Ok(Self {
            src_port,
            dest_port,
            length,
        })
    }

    /// Serializes the target header for a datagram carrying `payload_len` bytes. The checksum is left at zero, which
    /// means "not computed" over IPv4.
    pub fn serialize(&self, buf: &mut [u8], payload_len: usize) {
        let buf: &mut [u8] = &mut buf[..UDP_HEADER_SIZE];
        buf[0..2].copy_from_slice(&self.src_port.to_be_bytes());
        buf[2..4].copy_from_slice(&self.dest_port.to_be_bytes());
        buf[4..6].copy_from_slice(&((UDP_HEADER_SIZE + payload_len) as u16).to_be_bytes());
        buf[6..8].copy_from_slice(&[0, 0]);
        trace!("UDP header: {:?} payload size: {:?} bytes", self, payload_len);
    }
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================

#[cfg(test)]
mod test {
    use super::{
        UdpHeader,
        UDP_HEADER_SIZE,
    };
    use ::anyhow::Result;

    #[test]
    fn test_udp_header_serialization() -> Result<()> {
        let mut buf: [u8; UDP_HEADER_SIZE + 2] = [0; UDP_HEADER_SIZE + 2];
        UdpHeader::new(0x32, 7000).serialize(&mut buf, 2);
        crate::ensure_eq!(&buf[..UDP_HEADER_SIZE], &[0x00, 0x32, 0x1b, 0x58, 0x00, 0x0a, 0x00, 0x00]);

        let header: UdpHeader = UdpHeader::parse(&buf)?;
        crate::ensure_eq!(header.src_port(), 0x32);
        crate::ensure_eq!(header.dest_port(), 7000);
        crate::ensure_eq!(header.payload_len(), 2);
        Ok(())
    }

    #[test]
    fn test_udp_header_length_mismatch() -> Result<()> {
        let mut buf: [u8; UDP_HEADER_SIZE] = [0; UDP_HEADER_SIZE];
        UdpHeader::new(1, 2).serialize(&mut buf, 2);
        // Announces two payload bytes that are not there.
        anyhow::ensure!(UdpHeader::parse(&buf).is_err());

        buf[4..6].copy_from_slice(&[0, 4]);
        anyhow::ensure!(UdpHeader::parse(&buf).is_err());
        anyhow::ensure!(UdpHeader::parse(&buf[..4]).is_err());
        Ok(())
    }
}
