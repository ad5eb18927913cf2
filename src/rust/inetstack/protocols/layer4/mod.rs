// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

mod udp;

//======================================================================================================================
// Exports
//======================================================================================================================

pub use self::udp::{
    UdpHeader,
    UDP_HEADER_SIZE,
};
