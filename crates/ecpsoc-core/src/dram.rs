//! DRAM module geometry, timing mode, and L2 cache parameters.

use serde::{Deserialize, Serialize};

/// Rate relationship between the DRAM controller and the DRAM clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DramTiming {
    /// Controller and DRAM run on the same clock.
    SingleRate,
    /// Controller runs at half the DRAM clock and moves twice the data per cycle.
    HalfRate,
}

impl DramTiming {
    /// Data width multiplier of the controller port relative to the DRAM bus.
    ///
    /// Half-rate controllers see two DRAM beats per controller cycle.
    pub fn width_multiplier(self) -> u32 {
        match self {
            DramTiming::SingleRate => 1,
            DramTiming::HalfRate => 2,
        }
    }

    /// Frequency multiplier of the DRAM clock relative to the system clock.
    pub fn clock_multiplier(self) -> u32 {
        self.width_multiplier()
    }

    /// Controller:DRAM rate string as DRAM module tables spell it.
    pub fn rate(self) -> &'static str {
        match self {
            DramTiming::SingleRate => "1:1",
            DramTiming::HalfRate => "1:2",
        }
    }
}

/// DRAM timing parameters in nanoseconds, carried through to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DramTimings {
    pub t_rp_ns: u32,
    pub t_rcd_ns: u32,
    pub t_wr_ns: u32,
    pub t_refi_ns: u32,
    pub t_rfc_ns: u32,
}

/// An SDR SDRAM part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DramModule {
    /// Part number.
    pub name: String,
    pub nbanks: u32,
    pub nrows: u32,
    pub ncols: u32,
    pub timings: DramTimings,
}

impl DramModule {
    /// Physical capacity in bytes when wired to a bus of `bus_width` bits.
    pub fn capacity_bytes(&self, bus_width: u32) -> u64 {
        u64::from(self.nbanks)
            * u64::from(self.nrows)
            * u64::from(self.ncols)
            * u64::from(bus_width)
            / 8
    }

    /// ESMT M12L16161A, 2 banks x 2048 rows x 256 columns.
    pub fn m12l16161a() -> Self {
        Self {
            name: "M12L16161A".into(),
            nbanks: 2,
            nrows: 2048,
            ncols: 256,
            timings: DramTimings {
                t_rp_ns: 15,
                t_rcd_ns: 15,
                t_wr_ns: 15,
                t_refi_ns: 15_625,
                t_rfc_ns: 55,
            },
        }
    }

    /// ESMT M12L64322A, 4 banks x 2048 rows x 256 columns.
    pub fn m12l64322a() -> Self {
        Self {
            name: "M12L64322A".into(),
            nbanks: 4,
            nrows: 2048,
            ncols: 256,
            timings: DramTimings {
                t_rp_ns: 15,
                t_rcd_ns: 15,
                t_wr_ns: 15,
                t_refi_ns: 15_625,
                t_rfc_ns: 55,
            },
        }
    }
}

/// L2 cache placed between the CPU bus and the DRAM controller port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct L2Cache {
    /// Cache size in bytes.
    pub size_bytes: u64,
    /// Minimum cache line data width in bits.
    pub min_data_width: u32,
    /// Reverse word ordering within a cache line.
    pub reverse: bool,
}

impl Default for L2Cache {
    fn default() -> Self {
        Self {
            size_bytes: 32 * 1024,
            min_data_width: 128,
            reverse: true,
        }
    }
}
