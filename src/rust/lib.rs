// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

#![cfg_attr(feature = "strict", deny(warnings))]
#![deny(clippy::all)]

#[macro_use]
extern crate log;

pub mod collections;
pub mod config;
pub mod e1000;
pub mod inetstack;
pub mod runtime;
pub mod syscall;

#[cfg(test)]
pub mod test_helpers;

//======================================================================================================================
// Exports
//======================================================================================================================

pub use self::{
    config::Config,
    e1000::{
        Mmio,
        RegisterBus,
        E1000,
    },
    inetstack::{
        NetStack,
        NetStats,
    },
    runtime::{
        fail::Fail,
        memory::{
            PageAllocator,
            PageBuffer,
            PagePool,
            PAGE_SIZE,
        },
        network::{
            config::NetConfig,
            MacAddress,
        },
    },
    syscall::{
        sys_recv,
        sys_send,
        UserSpace,
    },
};

//======================================================================================================================
// Macros
//======================================================================================================================

/// Ensures that two expressions are equal, failing the enclosing function with an [anyhow::Error] otherwise.
#[macro_export]
macro_rules! ensure_eq {
    ($left:expr, $right:expr $(,)?) => {
        match (&$left, &$right) {
            (left_val, right_val) => {
                ::anyhow::ensure!(
                    *left_val == *right_val,
                    "ensure_eq!({}, {}) failed: left={:?}, right={:?}",
                    stringify!($left),
                    stringify!($right),
                    left_val,
                    right_val
                );
            },
        }
    };
}

/// Ensures that two expressions are not equal, failing the enclosing function with an [anyhow::Error] otherwise.
#[macro_export]
macro_rules! ensure_neq {
    ($left:expr, $right:expr $(,)?) => {
        match (&$left, &$right) {
            (left_val, right_val) => {
                ::anyhow::ensure!(
                    *left_val != *right_val,
                    "ensure_neq!({}, {}) failed: left={:?}, right={:?}",
                    stringify!($left),
                    stringify!($right),
                    left_val,
                    right_val
                );
            },
        }
    };
}
