pub mod errors;
pub use errors::{Error, Result};

pub mod command;

pub mod config;
pub use config::Config;

pub mod device;
pub use device::Device;

pub mod props;
pub use props::PropSource;

pub mod bootconfig;

pub mod telephony;

pub mod sensors;

pub mod snapshot;
pub use snapshot::Snapshot;

pub mod utils;

#[cfg(test)]
pub mod testing;
