// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::{
    config::Config,
    e1000::{
        DESCRIPTOR_SIZE,
        RING_ALIGNMENT,
    },
    runtime::{
        fail::Fail,
        network::types::MacAddress,
    },
};
use ::libc::EINVAL;
use ::std::net::Ipv4Addr;

//======================================================================================================================
// Constants
//======================================================================================================================

/// QEMU's default hardware address for the emulated NIC.
pub const DEFAULT_LOCAL_LINK_ADDR: MacAddress = MacAddress::new([0x52, 0x54, 0x00, 0x12, 0x34, 0x56]);
/// Address QEMU's user-mode network hands to the guest.
pub const DEFAULT_LOCAL_IPV4_ADDR: Ipv4Addr = Ipv4Addr::new(10, 0, 2, 15);
/// Hardware address of QEMU's user-mode gateway.
pub const DEFAULT_PEER_LINK_ADDR: MacAddress = MacAddress::new([0x52, 0x55, 0x0a, 0x00, 0x02, 0x02]);
pub const DEFAULT_TX_RING_SIZE: usize = 16;
pub const DEFAULT_RX_RING_SIZE: usize = 16;
pub const DEFAULT_PORT_TABLE_SIZE: usize = 16;
pub const DEFAULT_PORT_QUEUE_SIZE: usize = 16;

//======================================================================================================================
// Structures
//======================================================================================================================

/// Network Configuration Descriptor
#[derive(Clone, Debug)]
pub struct NetConfig {
    /// Hardware address programmed into the receive filter and stamped on outbound frames.
    local_link_addr: MacAddress,
    /// Address answered for in ARP and stamped on outbound datagrams.
    local_ipv4_addr: Ipv4Addr,
    /// Destination hardware address of every outbound datagram.
    peer_link_addr: MacAddress,
    tx_ring_size: usize,
    rx_ring_size: usize,
    port_table_size: usize,
    port_queue_size: usize,
}

//======================================================================================================================
// Associate Functions
//======================================================================================================================

impl NetConfig {
    /// Creates a Network Configuration Descriptor from a configuration object.
    pub fn new(config: &Config) -> Result<Self, Fail> {
        let net: Self = Self {
            local_link_addr: config.local_link_addr()?,
            local_ipv4_addr: config.local_ipv4_addr()?,
            peer_link_addr: config.peer_link_addr()?,
            tx_ring_size: config.tx_ring_size()?,
            rx_ring_size: config.rx_ring_size()?,
            port_table_size: config.port_table_size()?,
            port_queue_size: config.port_queue_size()?,
        };
        net.validate()?;
        Ok(net)
    }

    /// Overrides the addressing of the target [NetConfig].
    pub fn with_addresses(mut self, local_link_addr: MacAddress, local_ipv4_addr: Ipv4Addr, peer: MacAddress) -> Self {
        self.local_link_addr = local_link_addr;
        self.local_ipv4_addr = local_ipv4_addr;
        self.peer_link_addr = peer;
        self
    }

    /// Overrides the descriptor ring sizes of the target [NetConfig].
    pub fn with_ring_sizes(mut self, tx_ring_size: usize, rx_ring_size: usize) -> Self {
        self.tx_ring_size = tx_ring_size;
        self.rx_ring_size = rx_ring_size;
        self
    }

    /// Overrides the port table geometry of the target [NetConfig].
    pub fn with_port_table(mut self, port_table_size: usize, port_queue_size: usize) -> Self {
        self.port_table_size = port_table_size;
        self.port_queue_size = port_queue_size;
        self
    }

    /// Checks that the target [NetConfig] describes a usable device and port table.
    pub fn validate(&self) -> Result<(), Fail> {
        for (name, size) in [("tx_ring_size", self.tx_ring_size), ("rx_ring_size", self.rx_ring_size)] {
            if size == 0 || (size * DESCRIPTOR_SIZE) % RING_ALIGNMENT != 0 {
                let cause: String = format!("{} must be a non-zero multiple of {}", name, RING_ALIGNMENT / DESCRIPTOR_SIZE);
                error!("validate(): {}", cause);
                return Err(Fail::new(EINVAL, &cause));
            }
        }
        if self.port_table_size == 0 {
            return Err(Fail::new(EINVAL, "port_table_size must be non-zero"));
        }
        if !self.port_queue_size.is_power_of_two() || self.port_queue_size > u32::MAX as usize {
            return Err(Fail::new(EINVAL, "port_queue_size must be a power of two"));
        }
        if self.local_ipv4_addr.is_unspecified() || self.local_ipv4_addr.is_broadcast() {
            return Err(Fail::new(EINVAL, "local_ipv4_addr must be a unicast address"));
        }
        if !self.local_link_addr.is_unicast() || self.local_link_addr.is_nil() {
            return Err(Fail::new(EINVAL, "local_link_addr must be a unicast address"));
        }
        if self.peer_link_addr.is_nil() {
            return Err(Fail::new(EINVAL, "peer_link_addr must not be nil"));
        }
        Ok(())
    }

    pub fn local_link_addr(&self) -> MacAddress {
        self.local_link_addr
    }

    pub fn local_ipv4_addr(&self) -> Ipv4Addr {
        self.local_ipv4_addr
    }

    pub fn peer_link_addr(&self) -> MacAddress {
        self.peer_link_addr
    }

    pub fn tx_ring_size(&self) -> usize {
        self.tx_ring_size
    }

    pub fn rx_ring_size(&self) -> usize {
        self.rx_ring_size
    }

    pub fn port_table_size(&self) -> usize {
        self.port_table_size
    }

    pub fn port_queue_size(&self) -> usize {
        self.port_queue_size
    }
}

//======================================================================================================================
// Trait Implementations
//======================================================================================================================

/// Default Trait Implementation for Network Configuration Descriptor
impl Default for NetConfig {
    fn default() -> Self {
        Self {
            local_link_addr: DEFAULT_LOCAL_LINK_ADDR,
            local_ipv4_addr: DEFAULT_LOCAL_IPV4_ADDR,
            peer_link_addr: DEFAULT_PEER_LINK_ADDR,
            tx_ring_size: DEFAULT_TX_RING_SIZE,
            rx_ring_size: DEFAULT_RX_RING_SIZE,
            port_table_size: DEFAULT_PORT_TABLE_SIZE,
            port_queue_size: DEFAULT_PORT_QUEUE_SIZE,
        }
    }
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================

#[cfg(test)]
mod tests {
    use crate::runtime::network::config::NetConfig;
    use ::anyhow::Result;
    use ::std::net::Ipv4Addr;

    #[test]
    fn default_config_is_valid() -> Result<()> {
        let config: NetConfig = NetConfig::default();
        config.validate()?;
        crate::ensure_eq!(config.local_ipv4_addr(), Ipv4Addr::new(10, 0, 2, 15));
        crate::ensure_eq!(config.local_link_addr().to_canonical(), "52-54-00-12-34-56");
        crate::ensure_eq!(config.tx_ring_size(), 16);
        crate::ensure_eq!(config.port_queue_size(), 16);
        Ok(())
    }

    #[test]
    fn rejects_bad_geometry() -> Result<()> {
        // 12 descriptors occupy 192 bytes.
        let config: NetConfig = NetConfig::default().with_ring_sizes(12, 16);
        match config.validate() {
            Err(e) => crate::ensure_eq!(e.errno, libc::EINVAL),
            Ok(()) => anyhow::bail!("misaligned ring should be rejected"),
        }

        let config: NetConfig = NetConfig::default().with_port_table(4, 6);
        anyhow::ensure!(config.validate().is_err());

        let config: NetConfig = NetConfig::default().with_port_table(0, 8);
        anyhow::ensure!(config.validate().is_err());

        let config: NetConfig = NetConfig::default().with_ring_sizes(8, 24).with_port_table(1, 1);
        config.validate()?;
        Ok(())
    }
}
