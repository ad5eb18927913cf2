// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

pub mod checksum;
pub mod layer2;
pub mod layer3;
pub mod layer4;

//======================================================================================================================
// Imports
//======================================================================================================================

use self::{
    layer2::ETHERNET2_HEADER_SIZE,
    layer3::{
        ARP_MESSAGE_SIZE,
        IPV4_HEADER_MIN_SIZE,
    },
    layer4::UDP_HEADER_SIZE,
};

//======================================================================================================================
// Constants
//======================================================================================================================

/// Smallest frame that can carry an ARP message.
pub const MIN_ARP_FRAME_SIZE: usize = ETHERNET2_HEADER_SIZE + ARP_MESSAGE_SIZE;

/// Smallest frame that can carry an IPv4 header.
pub const MIN_IPV4_FRAME_SIZE: usize = ETHERNET2_HEADER_SIZE + IPV4_HEADER_MIN_SIZE;

/// Headers in front of the payload of every outbound UDP datagram.
pub const UDP_FRAME_HEADER_SIZE: usize = ETHERNET2_HEADER_SIZE + IPV4_HEADER_MIN_SIZE + UDP_HEADER_SIZE;
