//! Binary-side composition: config, logging, run, exit code.

pub(crate) mod config_runtime;
pub(crate) mod exit_handler;
pub(crate) mod runtime;
