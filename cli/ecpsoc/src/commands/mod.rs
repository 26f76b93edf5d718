//! CLI command implementations.

pub mod build;
pub mod doctor;
pub mod load;
pub mod target;
