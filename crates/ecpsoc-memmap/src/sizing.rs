//! Main RAM sizing.
//!
//! The mapped main RAM is the smaller of the module capacity and the
//! configured cap, and must be addressable in whole L2 cache lines. The L2
//! line width follows the DRAM controller port, which is twice the DRAM bus
//! width for half-rate controllers.

use serde::{Deserialize, Serialize};

use ecpsoc_core::units::format_bytes;
use ecpsoc_core::{Board, CpuConfig, DramConfig, Result, SocError};

/// Outcome of sizing main RAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MainRamSizing {
    /// Physical module capacity on the board's bus.
    pub capacity: u64,
    /// Bytes mapped into the main RAM region.
    pub mapped: u64,
    /// Controller port data width in bits.
    pub port_data_width: u32,
    /// L2 cache line data width in bits.
    pub cache_data_width: u32,
}

impl MainRamSizing {
    pub fn line_bytes(&self) -> u64 {
        u64::from(self.cache_data_width / 8)
    }
}

/// Size the main RAM region for `dram` on `board`.
pub fn main_ram_size(dram: &DramConfig, board: &Board, cpu: &CpuConfig) -> Result<MainRamSizing> {
    let l2 = &dram.l2_cache;
    if !l2.size_bytes.is_power_of_two() {
        return Err(SocError::configuration(format!(
            "L2 cache size {} is not a power of two",
            l2.size_bytes
        )));
    }
    if !l2.min_data_width.is_power_of_two() || l2.min_data_width < cpu.bus_data_width {
        return Err(SocError::configuration(format!(
            "L2 minimum data width {} must be a power of two of at least the {}-bit CPU bus",
            l2.min_data_width, cpu.bus_data_width
        )));
    }
    if board.sdram_data_width == 0 || !board.sdram_data_width.is_power_of_two() {
        return Err(SocError::configuration(format!(
            "SDRAM bus width {} is not a power of two",
            board.sdram_data_width
        )));
    }

    let port_data_width = board.sdram_data_width * dram.timing.width_multiplier();
    let cache_data_width = port_data_width.max(l2.min_data_width);
    let line_bytes = u64::from(cache_data_width / 8);
    if l2.size_bytes < line_bytes {
        return Err(SocError::configuration(format!(
            "L2 cache of {} bytes cannot hold one {cache_data_width}-bit line",
            l2.size_bytes
        )));
    }

    let capacity = dram.module.capacity_bytes(board.sdram_data_width);
    if capacity == 0 {
        return Err(SocError::configuration(format!(
            "DRAM module {} has no capacity",
            dram.module.name
        )));
    }
    let mapped = match dram.size_cap {
        Some(0) => {
            return Err(SocError::configuration("main RAM size cap is zero"));
        }
        Some(cap) => capacity.min(cap),
        None => capacity,
    };
    if mapped % line_bytes != 0 {
        return Err(SocError::configuration(format!(
            "main RAM size {} is not a multiple of the {line_bytes}-byte L2 line",
            format_bytes(mapped)
        )));
    }

    Ok(MainRamSizing {
        capacity,
        mapped,
        port_data_width,
        cache_data_width,
    })
}
