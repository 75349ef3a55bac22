pub mod config;
pub mod memory;
pub mod search;
pub mod status;
