//! Address map allocator.
//!
//! Holds the fixed table of named physical regions, checks that they are
//! disjoint, and binds each region to the footprint of the block placed in
//! it. Also sizes main RAM from the DRAM module and L2 cache configuration,
//! derives the flash boot address, and pages the CSR window.

pub mod csr;
pub mod map;
pub mod region;
pub mod sizing;

pub use csr::{CsrSlot, CsrWindow, CSR_PAGING};
pub use map::{AddressMap, ADDRESS_SPACE_END};
pub use region::AddressRegion;
pub use sizing::{main_ram_size, MainRamSizing};
