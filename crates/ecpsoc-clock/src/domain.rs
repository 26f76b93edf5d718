//! Clock domains.

use serde::{Deserialize, Serialize};

/// Where a domain's clock comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClockSource {
    /// Synthesized directly from a board reference pad.
    Reference { pad: String },
    /// Derived from another domain (multiplied and/or phase-shifted).
    Domain { name: String },
}

/// How a domain is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResetKind {
    /// Held in reset through a synchronizer until its reset policy deasserts.
    Synchronized,
    /// Free-running; only drives clock outputs.
    ResetLess,
}

/// A signal set sharing one frequency/phase reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClockDomain {
    pub name: String,
    pub source: ClockSource,
    /// Requested frequency in Hz.
    pub hz: u64,
    /// Frequency the PLL actually produces.
    pub achieved_hz: u64,
    /// Phase offset in degrees (0-359).
    pub phase_deg: u16,
    /// Frequency multiplier relative to the source domain.
    pub multiplier: u32,
    pub reset: ResetKind,
    /// PLL instance synthesizing this domain.
    pub pll: String,
}

impl ClockDomain {
    pub fn is_reset_less(&self) -> bool {
        self.reset == ResetKind::ResetLess
    }
}
