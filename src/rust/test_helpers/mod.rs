// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

mod nic;
mod user;

//======================================================================================================================
// Exports
//======================================================================================================================

pub use self::{
    nic::SimulatedNic,
    user::TestUserSpace,
};
