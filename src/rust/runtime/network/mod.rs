// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

pub mod config;
pub mod types;

//======================================================================================================================
// Exports
//======================================================================================================================

pub use self::types::{
    MacAddress,
    MAC_ADDRESS_SIZE,
};
