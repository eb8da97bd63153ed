//! Status, priority and grade derivation for ClassConnect assignment views,
//! usable in-process or through the `classconnectd` line protocol.

pub mod config;
pub mod error;
pub mod grades;
pub mod ipc;
pub mod logging;
pub mod model;
pub mod priority;
pub mod status;
pub mod views;

pub use config::DeriveConfig;
pub use error::ValidationError;
