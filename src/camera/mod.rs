// Camera domain: backend contract, hot-plug plumbing, and backends.

pub mod backend;
pub mod error;
pub mod hotplug;
pub mod hotplug_bridge;
pub mod mock;
pub mod simulator;
pub mod types;
pub mod vimba;
