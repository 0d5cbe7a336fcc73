//! Shared utilities for the tsunagu messaging service.

pub mod logger;
pub mod time;
