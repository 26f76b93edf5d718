//! Target configuration: the revision-selected bundle every stage reads.
//!
//! A [`TargetConfiguration`] is built once per build invocation and never
//! mutated by assembly. Peripheral presence is expressed with `Option`s so a
//! disabled peripheral simply has no configuration.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::dram::{DramModule, DramTiming, L2Cache};
use crate::layout::MemoryMapLayout;
use crate::units::{KIB, MIB};

/// CPU core selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CpuConfig {
    /// Core type (e.g. "vexriscv").
    pub kind: String,
    /// Core variant (e.g. "standard").
    pub variant: String,
    /// Bus data width in bits.
    pub bus_data_width: u32,
    /// Start of the uncached IO region.
    pub io_region_base: u64,
    /// Size of the uncached IO region.
    pub io_region_size: u64,
}

impl CpuConfig {
    pub fn vexriscv() -> Self {
        Self {
            kind: "vexriscv".into(),
            variant: "standard".into(),
            bus_data_width: 32,
            io_region_base: 0x8000_0000,
            io_region_size: 0x8000_0000,
        }
    }
}

/// External DRAM configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DramConfig {
    pub timing: DramTiming,
    /// Upper bound on mapped main RAM, below the module capacity.
    #[serde(default)]
    pub size_cap: Option<u64>,
    pub module: DramModule,
    #[serde(default)]
    pub l2_cache: L2Cache,
}

/// RGMII Ethernet configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EthernetConfig {
    /// Which of the board's Ethernet ports to use.
    #[serde(default)]
    pub port: u8,
    /// Transmit clock delay in picoseconds.
    #[serde(default = "default_tx_delay_ps")]
    pub tx_delay_ps: u32,
}

fn default_tx_delay_ps() -> u32 {
    2_000
}

impl Default for EthernetConfig {
    fn default() -> Self {
        Self {
            port: 0,
            tx_delay_ps: default_tx_delay_ps(),
        }
    }
}

/// SPI flash bus width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpiMode {
    #[serde(rename = "1x")]
    X1,
    #[serde(rename = "4x")]
    X4,
}

impl SpiMode {
    /// Pad group carrying this bus width.
    pub fn pad_name(self) -> &'static str {
        match self {
            SpiMode::X1 => "spiflash",
            SpiMode::X4 => "spiflash4x",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpiMode::X1 => "1x",
            SpiMode::X4 => "4x",
        }
    }
}

/// Boot flash configuration.
///
/// Bus width and dummy cycles must match the flash part; they are not
/// detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpiFlashConfig {
    pub mode: SpiMode,
    pub dummy_cycles: u8,
    /// Flash part size in bytes.
    pub size_bytes: u64,
    /// Bytes reserved at the start of flash ahead of the firmware image.
    pub boot_reserved_bytes: u64,
}

/// External reset input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResetSource {
    pub pad: String,
    #[serde(default = "default_active_low")]
    pub active_low: bool,
}

fn default_active_low() -> bool {
    true
}

/// Everything a target build needs to know, selected once per build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TargetConfiguration {
    /// Target name (e.g. "rev1").
    pub name: String,
    /// Identification string baked into the SoC.
    pub ident: String,
    /// System clock frequency in Hz.
    pub sys_clk_hz: u64,
    /// Synthesize the 12/48 MHz auxiliary domains.
    #[serde(default)]
    pub usb_pll: bool,
    pub integrated_rom_bytes: u64,
    pub integrated_sram_bytes: u64,
    pub board: Board,
    pub cpu: CpuConfig,
    pub dram: DramConfig,
    #[serde(default)]
    pub ethernet: Option<EthernetConfig>,
    #[serde(default)]
    pub spi_flash: Option<SpiFlashConfig>,
    #[serde(default)]
    pub reset: Option<ResetSource>,
    pub memory_map: MemoryMapLayout,
}

impl TargetConfiguration {
    /// Reference oscillator frequency in Hz.
    pub fn reference_hz(&self) -> u64 {
        self.board.reference.hz
    }

    /// Colorlight 5A-75B baseline: 50 MHz, single-rate SDRAM, no optional peripherals.
    pub fn colorlight_baseline(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ident: "ecpsoc on Colorlight 5A-75B".into(),
            sys_clk_hz: 50_000_000,
            usb_pll: false,
            integrated_rom_bytes: 32 * KIB,
            integrated_sram_bytes: 8 * KIB,
            board: Board::colorlight_5a_75b_v7(),
            cpu: CpuConfig::vexriscv(),
            dram: DramConfig {
                timing: DramTiming::SingleRate,
                size_cap: Some(4 * MIB),
                module: DramModule::m12l16161a(),
                l2_cache: L2Cache::default(),
            },
            ethernet: None,
            spi_flash: None,
            reset: None,
            memory_map: MemoryMapLayout::vexriscv(),
        }
    }
}
