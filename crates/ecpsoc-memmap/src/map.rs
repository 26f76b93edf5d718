//! The region table.
//!
//! Regions are declared once from a [`MemoryMapLayout`] and are then only
//! ever populated. Every failed operation leaves the table untouched.

use serde::{Deserialize, Serialize};
use tracing::debug;

use ecpsoc_core::layout::SPIFLASH;
use ecpsoc_core::units::format_bytes;
use ecpsoc_core::{CpuConfig, MemoryMapLayout, RegionKind, Result, SocError};

use crate::region::AddressRegion;

/// End of the 32-bit bus address space (exclusive).
pub const ADDRESS_SPACE_END: u64 = 1 << 32;

/// Disjoint regions sorted by base address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AddressMap {
    regions: Vec<AddressRegion>,
}

impl AddressMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare every region of `layout`.
    ///
    /// A region's maximum size is the gap to the next region's base (the last
    /// one runs to the end of the address space), reduced by the entry's
    /// size limit and, for cached memories, by the start of the CPU's IO
    /// region.
    pub fn from_layout(layout: &MemoryMapLayout, cpu: &CpuConfig) -> Result<Self> {
        let io_start = cpu.io_region_base;
        let io_end = cpu.io_region_base.saturating_add(cpu.io_region_size);
        let mut map = Self::new();

        for (i, entry) in layout.entries.iter().enumerate() {
            let next_base = match layout.entries.get(i + 1) {
                Some(next) if next.base <= entry.base => {
                    return Err(SocError::configuration(format!(
                        "layout not sorted: '{}' at 0x{:08X} follows '{}' at 0x{:08X}",
                        next.name, next.base, entry.name, entry.base
                    )));
                }
                Some(next) => next.base,
                None => ADDRESS_SPACE_END,
            };
            if entry.base >= ADDRESS_SPACE_END {
                return Err(SocError::configuration(format!(
                    "region '{}' base 0x{:X} outside the 32-bit address space",
                    entry.name, entry.base
                )));
            }

            let mut max_size = next_base - entry.base;
            if let Some(limit) = entry.size_limit {
                max_size = max_size.min(limit);
            }
            if entry.kind.is_cached() {
                if entry.base >= io_start {
                    return Err(SocError::configuration(format!(
                        "cached region '{}' at 0x{:08X} lies in the CPU IO region",
                        entry.name, entry.base
                    )));
                }
                max_size = max_size.min(io_start - entry.base);
            } else if entry.base < io_start || entry.base >= io_end {
                return Err(SocError::configuration(format!(
                    "uncached region '{}' at 0x{:08X} lies outside the CPU IO region",
                    entry.name, entry.base
                )));
            }

            map.allocate(&entry.name, entry.kind, entry.base, max_size)?;
        }
        Ok(map)
    }

    /// Declare a region.
    pub fn allocate(
        &mut self,
        name: &str,
        kind: RegionKind,
        base: u64,
        max_size: u64,
    ) -> Result<AddressRegion> {
        if self.region(name).is_some() {
            return Err(SocError::configuration(format!(
                "region '{name}' declared twice"
            )));
        }
        if max_size == 0 {
            return Err(SocError::configuration(format!(
                "region '{name}' has no room (maximum size 0)"
            )));
        }
        let available = ADDRESS_SPACE_END.saturating_sub(base);
        if max_size > available {
            return Err(SocError::Overflow {
                region: name.into(),
                requested: max_size,
                available,
            });
        }

        let region = AddressRegion {
            name: name.into(),
            kind,
            base,
            max_size,
            populated: false,
            size: 0,
        };
        if let Some(other) = self.regions.iter().find(|r| r.overlaps(&region)) {
            return Err(SocError::Overlap {
                region: name.into(),
                base,
                end: region.limit(),
                other: other.name.clone(),
            });
        }

        let pos = self.regions.partition_point(|r| r.base < base);
        self.regions.insert(pos, region.clone());
        debug!(
            region = name,
            base = format_args!("0x{base:08X}"),
            max = %format_bytes(max_size),
            "region allocated"
        );
        Ok(region)
    }

    /// Populate a region with a block of `size` bytes.
    pub fn bind(&mut self, name: &str, size: u64) -> Result<AddressRegion> {
        let idx = self.check_bind(name, size)?;
        let region = &mut self.regions[idx];
        region.populated = true;
        region.size = size;
        debug!(
            region = name,
            base = format_args!("0x{:08X}", region.base),
            size = %format_bytes(size),
            "region bound"
        );
        Ok(region.clone())
    }

    /// Run every `bind` check without populating anything. Returns the
    /// region's index.
    pub fn check_bind(&self, name: &str, size: u64) -> Result<usize> {
        let idx = self
            .regions
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| {
                SocError::sequencing(format!("bind region '{name}'"), "region allocation")
            })?;
        let next_base = self
            .regions
            .get(idx + 1)
            .map(|r| r.base)
            .unwrap_or(ADDRESS_SPACE_END);
        let region = &self.regions[idx];

        if region.populated {
            return Err(SocError::attach(
                name,
                format!("region already populated with {} bytes", region.size),
            ));
        }
        if size == 0 {
            return Err(SocError::configuration(format!(
                "region '{name}' bound with zero size"
            )));
        }
        if size > region.max_size {
            return Err(SocError::Overflow {
                region: name.into(),
                requested: size,
                available: region.max_size,
            });
        }
        if region.base.saturating_add(size) > next_base {
            return Err(SocError::Overflow {
                region: name.into(),
                requested: size,
                available: next_base - region.base,
            });
        }
        Ok(idx)
    }

    pub fn region(&self, name: &str) -> Option<&AddressRegion> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// All regions in base-address order.
    pub fn regions(&self) -> &[AddressRegion] {
        &self.regions
    }

    /// Region containing `addr`, if any.
    pub fn lookup(&self, addr: u64) -> Option<&AddressRegion> {
        self.regions.iter().find(|r| r.contains(addr))
    }

    /// Address at which the firmware image starts inside boot flash.
    ///
    /// The first `reserved` bytes of the flash are left for the bootloader
    /// and golden image.
    pub fn boot_offset(&self, reserved: u64) -> Result<u64> {
        let flash = self
            .region(SPIFLASH)
            .filter(|r| r.populated)
            .ok_or_else(|| {
                SocError::sequencing("publish flash boot address", "a bound boot flash region")
            })?;
        if reserved >= flash.size {
            return Err(SocError::Overflow {
                region: SPIFLASH.into(),
                requested: reserved,
                available: flash.size,
            });
        }
        Ok(flash.base + reserved)
    }

    /// Re-check the disjointness and ordering of the whole table.
    pub fn check_disjoint(&self) -> Result<()> {
        for (i, a) in self.regions.iter().enumerate() {
            for b in &self.regions[i + 1..] {
                if a.overlaps(b) || a.base >= b.base {
                    return Err(SocError::Overlap {
                        region: b.name.clone(),
                        base: b.base,
                        end: b.limit(),
                        other: a.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
