//! Runtime adapters for stride (config, logging, source files).

pub mod config;
pub mod logging;
pub mod source;
