//! Fixed memory-map layout handed to the address map allocator.

use serde::{Deserialize, Serialize};

pub const ROM: &str = "rom";
pub const SRAM: &str = "sram";
pub const SPIFLASH: &str = "spiflash";
pub const MAIN_RAM: &str = "main_ram";
pub const ETHMAC: &str = "ethmac";
pub const CSR: &str = "csr";

/// What kind of block a region holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionKind {
    Rom,
    Sram,
    Flash,
    MainRam,
    /// Uncached peripheral memory (e.g. Ethernet buffers).
    Io,
    /// Control/status register window.
    Csr,
}

impl RegionKind {
    /// Whether the CPU accesses this region through its caches.
    pub fn is_cached(self) -> bool {
        matches!(
            self,
            RegionKind::Rom | RegionKind::Sram | RegionKind::Flash | RegionKind::MainRam
        )
    }
}

/// One entry of the fixed region table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LayoutEntry {
    pub name: String,
    pub kind: RegionKind,
    pub base: u64,
    /// Upper bound on the region size below the gap to the next region.
    #[serde(default)]
    pub size_limit: Option<u64>,
}

/// The region table of a target, sorted by base address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MemoryMapLayout {
    pub entries: Vec<LayoutEntry>,
}

impl MemoryMapLayout {
    pub fn entry(&self, name: &str) -> Option<&LayoutEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// The VexRiscv memory map with a boot flash window and Ethernet buffers.
    pub fn vexriscv() -> Self {
        let entry = |name: &str, kind, base, size_limit| LayoutEntry {
            name: name.into(),
            kind,
            base,
            size_limit,
        };
        Self {
            entries: vec![
                entry(ROM, RegionKind::Rom, 0x0000_0000, None),
                entry(SRAM, RegionKind::Sram, 0x1000_0000, None),
                entry(SPIFLASH, RegionKind::Flash, 0x2000_0000, None),
                entry(MAIN_RAM, RegionKind::MainRam, 0x4000_0000, None),
                entry(ETHMAC, RegionKind::Io, 0xb000_0000, None),
                // 14-bit CSR address space of 32-bit words
                entry(CSR, RegionKind::Csr, 0xf000_0000, Some(0x1_0000)),
            ],
        }
    }
}
