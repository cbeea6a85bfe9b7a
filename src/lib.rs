// Order-entry latency benchmark - library root

pub mod app;
pub mod bench;
pub mod config;
pub mod error;
pub mod fix;
pub mod transport;
