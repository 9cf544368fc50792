//! Security rules.
//!
//! Every rule is a pure function of the manifest (and of the supported SDK range when the
//! platform behaviour depends on the API level). Rules never log: presentation is decided by the
//! results module.

pub mod backup;
pub mod cleartext;
pub mod components;
pub mod info;
pub mod links;
pub mod network;
pub mod permissions;
#[cfg(test)]
mod tests;
