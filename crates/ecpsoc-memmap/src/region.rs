//! Address regions.

use serde::{Deserialize, Serialize};

use ecpsoc_core::RegionKind;

/// A fixed, named slice of the physical address space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AddressRegion {
    pub name: String,
    pub kind: RegionKind,
    pub base: u64,
    /// Largest footprint the region can hold.
    pub max_size: u64,
    /// Set once a block has been bound to the region.
    pub populated: bool,
    /// Footprint of the bound block (0 while unpopulated).
    pub size: u64,
}

impl AddressRegion {
    /// End of the bound footprint (exclusive).
    pub fn end(&self) -> u64 {
        self.base + self.size
    }

    /// End of the reserved range (exclusive).
    pub fn limit(&self) -> u64 {
        self.base + self.max_size
    }

    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr < self.limit()
    }

    /// Whether the reserved ranges of two regions intersect.
    pub fn overlaps(&self, other: &AddressRegion) -> bool {
        self.base < other.limit() && other.base < self.limit()
    }
}
