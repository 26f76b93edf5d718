//! Peripheral attachment layer.
//!
//! Binds external IP blocks to a clock domain and an address region once both
//! exist, requests their board pads, reserves their CSR pages, and publishes
//! the build constants firmware needs to find them.

pub mod attach;
pub mod binding;
pub mod dram;
pub mod ethernet;
pub mod spiflash;

pub use attach::{AttachRequest, Attachments, PeripheralAttacher};
pub use binding::{PeripheralBinding, PeripheralKind, PeripheralMode};
pub use dram::SdramPhy;
