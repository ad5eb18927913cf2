// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::runtime::{
    fail::Fail,
    network::{
        config::{
            DEFAULT_LOCAL_IPV4_ADDR,
            DEFAULT_LOCAL_LINK_ADDR,
            DEFAULT_PEER_LINK_ADDR,
            DEFAULT_PORT_QUEUE_SIZE,
            DEFAULT_PORT_TABLE_SIZE,
            DEFAULT_RX_RING_SIZE,
            DEFAULT_TX_RING_SIZE,
        },
        MacAddress,
    },
};
use ::std::{
    fs::File,
    io::Read,
    net::Ipv4Addr,
    ops::Index,
    str::FromStr,
};
use ::yaml_rust::{
    Yaml,
    YamlLoader,
};

//======================================================================================================================
// Constants
//======================================================================================================================

// Options of the packet path. Every option may be overridden by an environment variable of the same name in upper case.
mod nicpath_config {
    pub const SECTION_NAME: &str = "nicpath";
    // Local network MAC address.
    pub const LOCAL_LINK_ADDR: &str = "local_link_addr";
    // Local IPv4 addr.
    pub const LOCAL_IPV4_ADDR: &str = "local_ipv4_addr";
    // MAC address of the next hop.
    pub const PEER_LINK_ADDR: &str = "peer_link_addr";
    pub const TX_RING_SIZE: &str = "tx_ring_size";
    pub const RX_RING_SIZE: &str = "rx_ring_size";
    pub const PORT_TABLE_SIZE: &str = "port_table_size";
    pub const PORT_QUEUE_SIZE: &str = "port_queue_size";
}

//======================================================================================================================
// Structures
//======================================================================================================================

/// Packet path configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Yaml);

//======================================================================================================================
// Associated Functions
//======================================================================================================================

impl Config {
    /// Reads a configuration file into a [Config] object.
    pub fn new(config_path: &str) -> Result<Self, Fail> {
        let mut config_s: String = String::new();
        File::open(config_path)?.read_to_string(&mut config_s)?;
        Self::from_str(&config_s)
    }

    /// Parses a YAML document into a [Config] object.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(config_s: &str) -> Result<Self, Fail> {
        let config: Vec<Yaml> = match YamlLoader::load_from_str(config_s) {
            Ok(config) => config,
            Err(e) => {
                let message: String = format!("malformed configuration: {}", e);
                return Err(Fail::new(libc::EINVAL, message.as_str()));
            },
        };
        let config_obj: &Yaml = match &config[..] {
            &[ref c] => c,
            _ => return Err(Fail::new(libc::EINVAL, "Wrong number of config objects")),
        };

        Ok(Self(config_obj.clone()))
    }

    fn get_nicpath_config(&self) -> Result<&Yaml, Fail> {
        Self::get_subsection(&self.0, nicpath_config::SECTION_NAME)
    }

    /// Reads the local link address parameter from the environment variable first and then the underlying
    /// configuration file.
    pub fn local_link_addr(&self) -> Result<MacAddress, Fail> {
        self.get_str_option(nicpath_config::LOCAL_LINK_ADDR, DEFAULT_LOCAL_LINK_ADDR, |s| {
            MacAddress::parse_canonical_str(s).ok()
        })
    }

    /// Reads the local IPv4 address parameter from the environment variable first and then the underlying
    /// configuration file.
    pub fn local_ipv4_addr(&self) -> Result<Ipv4Addr, Fail> {
        self.get_str_option(nicpath_config::LOCAL_IPV4_ADDR, DEFAULT_LOCAL_IPV4_ADDR, |s| {
            Ipv4Addr::from_str(s).ok()
        })
    }

    pub fn peer_link_addr(&self) -> Result<MacAddress, Fail> {
        self.get_str_option(nicpath_config::PEER_LINK_ADDR, DEFAULT_PEER_LINK_ADDR, |s| {
            MacAddress::parse_canonical_str(s).ok()
        })
    }

    pub fn tx_ring_size(&self) -> Result<usize, Fail> {
        self.get_usize_option(nicpath_config::TX_RING_SIZE, DEFAULT_TX_RING_SIZE)
    }

    pub fn rx_ring_size(&self) -> Result<usize, Fail> {
        self.get_usize_option(nicpath_config::RX_RING_SIZE, DEFAULT_RX_RING_SIZE)
    }

    pub fn port_table_size(&self) -> Result<usize, Fail> {
        self.get_usize_option(nicpath_config::PORT_TABLE_SIZE, DEFAULT_PORT_TABLE_SIZE)
    }

    pub fn port_queue_size(&self) -> Result<usize, Fail> {
        self.get_usize_option(nicpath_config::PORT_QUEUE_SIZE, DEFAULT_PORT_QUEUE_SIZE)
    }

    /// Reads a string option: environment first, then the configuration file, then `default`.
    fn get_str_option<T, Fn>(&self, index: &str, default: T, parser: Fn) -> Result<T, Fail>
    where
        T: FromStr,
        Fn: FnOnce(&str) -> Option<T>,
    {
        if let Some(value) = Self::get_typed_env_option(index)? {
            return Ok(value);
        }
        match self.get_nicpath_config() {
            Ok(section) if !section.index(index).is_badvalue() => Self::get_typed_str_option(section, index, parser),
            _ => Ok(default),
        }
    }

    /// Reads an integer option: environment first, then the configuration file, then `default`.
    fn get_usize_option(&self, index: &str, default: usize) -> Result<usize, Fail> {
        if let Some(value) = Self::get_typed_env_option(index)? {
            return Ok(value);
        }
        match self.get_nicpath_config() {
            Ok(section) if !section.index(index).is_badvalue() => Self::get_int_option(section, index),
            _ => Ok(default),
        }
    }

    /// Index `yaml` to find the value at `index`, validating that the index exists and is a mapping.
    fn get_subsection<'a>(yaml: &'a Yaml, index: &str) -> Result<&'a Yaml, Fail> {
        let section: &'a Yaml = Self::get_option(yaml, index)?;
        match section {
            Yaml::Hash(_) => Ok(section),
            _ => {
                let message: String = format!("parameter \"{}\" has unexpected type", index);
                Err(Fail::new(libc::EINVAL, message.as_str()))
            },
        }
    }

    /// Index `yaml` to find the value at `index`, validating that the index exists.
    fn get_option<'a>(yaml: &'a Yaml, index: &str) -> Result<&'a Yaml, Fail> {
        match yaml.index(index) {
            Yaml::BadValue => {
                let message: String = format!("missing configuration option \"{}\"", index);
                Err(Fail::new(libc::EINVAL, message.as_str()))
            },
            value => Ok(value),
        }
    }

    /// Index `yaml` to find value at `index`, validating it as a string.
    fn get_typed_str_option<T, Fn>(yaml: &Yaml, index: &str, parser: Fn) -> Result<T, Fail>
    where
        Fn: FnOnce(&str) -> Option<T>,
    {
        let option: &Yaml = Self::get_option(yaml, index)?;
        if let Some(value) = option.as_str() {
            if let Some(value) = parser(value) {
                return Ok(value);
            }
        }
        let message: String = format!("parameter {} has unexpected type", index);
        Err(Fail::new(libc::EINVAL, message.as_str()))
    }

    /// Get value where the environment value overrides the config file if it exists.
    fn get_typed_env_option<T: FromStr>(index: &str) -> Result<Option<T>, Fail> {
        if let Ok(var) = ::std::env::var(index.to_uppercase()) {
            if let Ok(value) = var.as_str().parse() {
                return Ok(Some(value));
            } else {
                let message: String = format!("parameter {} has unexpected type", index);
                return Err(Fail::new(libc::EINVAL, message.as_str()));
            }
        }
        Ok(None)
    }

    /// Reads an integer at `index` and verifies that the destination type may hold it.
    fn get_int_option<T: TryFrom<i64>>(yaml: &Yaml, index: &str) -> Result<T, Fail> {
        let option: &Yaml = Self::get_option(yaml, index)?;
        let val: i64 = match option.as_i64() {
            Some(val) => val,
            None => {
                let message: String = format!("parameter {} has unexpected type", index);
                return Err(Fail::new(libc::EINVAL, message.as_str()));
            },
        };
        match T::try_from(val) {
            Ok(val) => Ok(val),
            _ => {
                let message: String = format!("parameter \"{}\" is out of range", index);
                Err(Fail::new(libc::ERANGE, message.as_str()))
            },
        }
    }
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================
