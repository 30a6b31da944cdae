pub mod capture_provider;
pub mod delegate;
pub mod permissions;
pub mod playback_sink;
