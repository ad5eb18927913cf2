// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use ::flexi_logger::{
    Logger,
    LoggerHandle,
};
use ::std::sync::{
    Once,
    OnceLock,
};

//======================================================================================================================
// Static Variables
//======================================================================================================================

/// Guardian to the logging initialize function.
static INIT_LOG: Once = Once::new();

/// Handle to the installed logger. Dropping it would shut the logger down.
static LOG_HANDLE: OnceLock<LoggerHandle> = OnceLock::new();

//======================================================================================================================
// Standalone Functions
//======================================================================================================================

/// Initializes logging features. The log specification is read from the `RUST_LOG` environment variable and falls
/// back to warnings only.
pub fn initialize() {
    INIT_LOG.call_once(|| {
        let handle: LoggerHandle = match Logger::try_with_env_or_str("warn").and_then(|logger| logger.start()) {
            Ok(handle) => handle,
            Err(e) => {
                eprintln!("initialize(): failed to start logger ({:?})", e);
                return;
            },
        };
        let _ = LOG_HANDLE.set(handle);
    });
}
