// Settings persistence.

pub mod store;
pub mod types;
