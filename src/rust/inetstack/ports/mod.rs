// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

mod queue;
mod table;

//======================================================================================================================
// Exports
//======================================================================================================================

pub use self::{
    queue::{
        Enqueued,
        Packet,
        PortQueue,
    },
    table::PortTable,
};
