//! Tracing setup shared by the pingmon binaries.

mod setup;

pub use setup::init;
