pub mod temp;
pub use temp::*;

pub mod sensors;
pub use sensors::*;

pub mod telephony;
pub use telephony::*;
