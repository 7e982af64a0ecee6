pub mod asset;
#[macro_use]
pub mod exception;
pub mod json;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod log;
pub mod shutdown;
