//! Adapter implementations for board ports.
//!
//! - [`memory`]: deterministic in-process gateway with scripted failures
//! - [`postgres`]: Diesel-backed gateway for `PostgreSQL`

pub mod memory;
pub mod postgres;
