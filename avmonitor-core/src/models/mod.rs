pub mod config;
pub mod device;
pub mod error;
pub mod recording;
pub mod state;
