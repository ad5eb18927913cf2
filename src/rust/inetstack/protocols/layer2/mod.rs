// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

mod ethernet2;

//======================================================================================================================
// Exports
//======================================================================================================================

pub use self::ethernet2::{
    EtherType2,
    Ethernet2Header,
    ETHERNET2_HEADER_SIZE,
};
