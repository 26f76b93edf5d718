//! Target composition for ecpsoc.
//!
//! One composer, parameterized by a [`TargetConfiguration`], drives clock
//! derivation, address map allocation and peripheral attachment in that
//! order. Board revisions are named presets of the same configuration type.
//!
//! [`TargetConfiguration`]: ecpsoc_core::TargetConfiguration

pub mod composer;
pub mod error;
pub mod export;
pub mod loader;
pub mod parse;
pub mod presets;

pub use composer::{assemble, AssembledTarget};
pub use error::{Result, TargetError};
pub use loader::LoadCommand;
pub use presets::{preset, PRESETS};
