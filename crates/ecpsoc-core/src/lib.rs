//! Shared model for ecpsoc targets.
//!
//! Everything the clock generator, address map allocator, and peripheral
//! attachment layer agree on lives here:
//! - **Configuration:** the immutable [`TargetConfiguration`] a build starts from
//! - **Board:** the FPGA board, its reference oscillator and pad resources
//! - **Errors:** the assembly-time error taxonomy shared by every stage

pub mod board;
pub mod config;
pub mod constant;
pub mod dram;
pub mod error;
pub mod hash;
pub mod layout;
pub mod units;

pub use board::{Board, Pad, PadRequests, PadResource, ReferenceClock};
pub use config::{
    CpuConfig, DramConfig, EthernetConfig, ResetSource, SpiFlashConfig, SpiMode,
    TargetConfiguration,
};
pub use constant::{BuildConstant, ConstantValue};
pub use dram::{DramModule, DramTiming, DramTimings, L2Cache};
pub use error::{ErrorKind, Result, SocError};
pub use layout::{LayoutEntry, MemoryMapLayout, RegionKind};
