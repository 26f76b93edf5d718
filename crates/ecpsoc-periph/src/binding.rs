//! Peripheral bindings.

use serde::{Deserialize, Serialize};

use ecpsoc_core::{DramTiming, L2Cache, Pad, SpiMode};
use ecpsoc_memmap::CsrSlot;

use crate::dram::SdramPhy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeripheralKind {
    Dram,
    Ethernet,
    SpiFlash,
}

impl PeripheralKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PeripheralKind::Dram => "dram",
            PeripheralKind::Ethernet => "ethernet",
            PeripheralKind::SpiFlash => "spi-flash",
        }
    }
}

/// Variant tag of a binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PeripheralMode {
    #[serde(rename_all = "kebab-case")]
    Dram {
        timing: DramTiming,
        phy: SdramPhy,
        module: String,
        /// Controller port width in bits.
        port_data_width: u32,
        l2_cache: L2Cache,
    },
    #[serde(rename_all = "kebab-case")]
    Ethernet { port: u8, tx_delay_ps: u32 },
    #[serde(rename_all = "kebab-case")]
    SpiFlash { mode: SpiMode, dummy_cycles: u8 },
}

impl PeripheralMode {
    pub fn kind(&self) -> PeripheralKind {
        match self {
            PeripheralMode::Dram { .. } => PeripheralKind::Dram,
            PeripheralMode::Ethernet { .. } => PeripheralKind::Ethernet,
            PeripheralMode::SpiFlash { .. } => PeripheralKind::SpiFlash,
        }
    }
}

/// A peripheral wired to a clock domain and an address region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PeripheralBinding {
    pub peripheral: String,
    pub kind: PeripheralKind,
    /// Domain the peripheral's bus side runs on.
    pub domain: String,
    /// Further domains the peripheral consumes.
    pub aux_domains: Vec<String>,
    pub region: String,
    pub csr: Vec<CsrSlot>,
    pub pads: Vec<Pad>,
    pub mode: PeripheralMode,
}
