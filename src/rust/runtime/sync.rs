// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use ::std::{
    sync::{
        Condvar,
        Mutex,
        MutexGuard,
        PoisonError,
        WaitTimeoutResult,
    },
    time::Duration,
};

//======================================================================================================================
// Standalone Functions
//======================================================================================================================

/// Acquires `mutex`. A lock poisoned by a panicking holder is still handed out: every critical section in this crate
/// leaves the protected state consistent before it can panic.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Atomically releases `guard` and suspends on `cond` until woken.
pub fn wait<'a, T>(cond: &Condvar, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
    cond.wait(guard).unwrap_or_else(PoisonError::into_inner)
}

/// Same as [wait] but gives up after `timeout`.
pub fn wait_timeout<'a, T>(
    cond: &Condvar,
    guard: MutexGuard<'a, T>,
    timeout: Duration,
) -> (MutexGuard<'a, T>, WaitTimeoutResult) {
    cond.wait_timeout(guard, timeout)
        .unwrap_or_else(PoisonError::into_inner)
}
