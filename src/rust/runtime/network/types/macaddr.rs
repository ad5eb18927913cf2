// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::runtime::fail::Fail;
use ::libc::EINVAL;
use ::std::{
    fmt,
    str::FromStr,
};

//======================================================================================================================
// Constants
//======================================================================================================================

/// Length of a MAC address (in bytes).
pub const MAC_ADDRESS_SIZE: usize = 6;

//======================================================================================================================
// Structures
//======================================================================================================================

/// MAC Address
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct MacAddress(eui48::MacAddress);

//======================================================================================================================
// Associate Functions
//======================================================================================================================

impl MacAddress {
    pub const fn new(bytes: [u8; MAC_ADDRESS_SIZE]) -> Self {
        MacAddress(eui48::MacAddress::new(bytes))
    }

    /// Builds a MAC address from the first six bytes of `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Fail> {
        match bytes.get(..MAC_ADDRESS_SIZE) {
            Some(octets) => match eui48::MacAddress::from_bytes(octets) {
                Ok(addr) => Ok(Self(addr)),
                Err(_) => Err(Fail::new(EINVAL, "invalid MAC address bytes")),
            },
            None => Err(Fail::new(EINVAL, "MAC address too short")),
        }
    }

    /// Returns the array of bytes composing the target [MacAddress].
    pub fn octets(&self) -> [u8; MAC_ADDRESS_SIZE] {
        self.0.to_array()
    }

    pub fn broadcast() -> MacAddress {
        MacAddress(eui48::MacAddress::broadcast())
    }

    pub fn nil() -> MacAddress {
        MacAddress(eui48::MacAddress::nil())
    }

    pub fn is_nil(self) -> bool {
        self.0.is_nil()
    }

    pub fn is_broadcast(self) -> bool {
        self.0.is_broadcast()
    }

    pub fn is_unicast(self) -> bool {
        self.0.is_unicast()
    }

    pub fn to_canonical(self) -> String {
        self.0.to_canonical()
    }

    pub fn parse_canonical_str(canonical_macaddr_string: &str) -> Result<Self, Fail> {
        match eui48::MacAddress::parse_str(canonical_macaddr_string) {
            Ok(addr) => Ok(Self(addr)),
            Err(_) => Err(Fail::new(EINVAL, "failed to parse MAC Address")),
        }
    }

    /// Packs the address into the (low, high) pair expected by the receive address registers. The address-valid bit
    /// is not included.
    pub fn to_receive_address(self) -> (u32, u32) {
        let o: [u8; MAC_ADDRESS_SIZE] = self.octets();
        let low: u32 = u32::from_le_bytes([o[0], o[1], o[2], o[3]]);
        let high: u32 = u16::from_le_bytes([o[4], o[5]]) as u32;
        (low, high)
    }
}

//======================================================================================================================
// Trait Implementations
//======================================================================================================================

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MacAddress({})", &self.to_canonical())
    }
}

impl FromStr for MacAddress {
    type Err = Fail;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MacAddress::parse_canonical_str(s)
    }
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================

#[cfg(test)]
mod tests {
    use super::MacAddress;
    use ::anyhow::Result;

    /// QEMU's e1000 is programmed with 0x12005452 / 0x5634 for 52:54:00:12:34:56.
    #[test]
    fn receive_address_packing() -> Result<()> {
        let mac: MacAddress = MacAddress::new([0x52, 0x54, 0x00, 0x12, 0x34, 0x56]);
        let (low, high): (u32, u32) = mac.to_receive_address();
        crate::ensure_eq!(low, 0x1200_5452);
        crate::ensure_eq!(high, 0x5634);
        Ok(())
    }

    #[test]
    fn parse_and_slice() -> Result<()> {
        let mac: MacAddress = "52:55:0a:00:02:02".parse()?;
        crate::ensure_eq!(mac.octets(), [0x52, 0x55, 0x0a, 0x00, 0x02, 0x02]);
        crate::ensure_eq!(MacAddress::from_slice(&[0x52, 0x55, 0x0a, 0x00, 0x02, 0x02, 0xff])?, mac);
        anyhow::ensure!(MacAddress::from_slice(&[1, 2, 3]).is_err());
        Ok(())
    }
}
