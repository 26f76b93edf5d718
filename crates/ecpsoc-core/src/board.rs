//! FPGA board model: device, reference oscillator, and pad resources.
//!
//! Pads are requested by name and index the way a platform file hands them
//! out. A pad can be requested once; asking for a pad the board does not
//! have, or asking twice, fails with an attach error naming the requester.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SocError};
use crate::units::MHZ;

/// The fixed board oscillator every clock domain derives from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReferenceClock {
    /// Pad carrying the oscillator (e.g. "clk25").
    pub pad: String,
    /// Oscillator frequency in Hz.
    pub hz: u64,
}

/// A named, indexed pad group exposed by the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PadResource {
    pub name: String,
    #[serde(default)]
    pub index: u8,
}

/// A pad group handed out to a requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Pad {
    pub name: String,
    pub index: u8,
    /// Component that owns the pad.
    pub owner: String,
}

/// Board description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Board {
    /// Board name (e.g. "colorlight-5a-75b").
    pub name: String,
    /// Board hardware revision (e.g. "7.0").
    pub revision: String,
    /// FPGA part number.
    pub device: String,
    /// Reference oscillator.
    pub reference: ReferenceClock,
    /// Width of the SDRAM data bus on this board, in bits.
    pub sdram_data_width: u32,
    /// Pad groups available for request.
    pub pads: Vec<PadResource>,
}

impl Board {
    /// Whether the board exposes the given pad group.
    pub fn has_pad(&self, name: &str, index: u8) -> bool {
        self.pads.iter().any(|p| p.name == name && p.index == index)
    }

    /// Colorlight 5A-75B, hardware revision 7.0 (LFE5U-25F, 25 MHz oscillator).
    pub fn colorlight_5a_75b_v7() -> Self {
        let pad = |name: &str, index: u8| PadResource {
            name: name.into(),
            index,
        };
        Self {
            name: "colorlight-5a-75b".into(),
            revision: "7.0".into(),
            device: "LFE5U-25F-6BG256C".into(),
            reference: ReferenceClock {
                pad: "clk25".into(),
                hz: 25 * MHZ,
            },
            sdram_data_width: 32,
            pads: vec![
                pad("clk25", 0),
                pad("user_led_n", 0),
                pad("user_btn_n", 0),
                pad("serial", 0),
                pad("spiflash", 0),
                pad("spiflash4x", 0),
                pad("sdram_clock", 0),
                pad("sdram", 0),
                pad("eth_clocks", 0),
                pad("eth", 0),
                pad("eth_clocks", 1),
                pad("eth", 1),
            ],
        }
    }
}

/// Tracks which pads have been handed out during one assembly.
#[derive(Debug, Clone)]
pub struct PadRequests {
    available: Vec<PadResource>,
    granted: Vec<Pad>,
}

impl PadRequests {
    pub fn new(board: &Board) -> Self {
        Self {
            available: board.pads.clone(),
            granted: Vec::new(),
        }
    }

    /// Fail if `name:index` cannot be handed to `owner`.
    pub fn check(&self, owner: &str, name: &str, index: u8) -> Result<()> {
        if !self
            .available
            .iter()
            .any(|p| p.name == name && p.index == index)
        {
            return Err(SocError::attach(
                owner,
                format!("board has no pad '{name}:{index}'"),
            ));
        }
        if let Some(prev) = self
            .granted
            .iter()
            .find(|p| p.name == name && p.index == index)
        {
            return Err(SocError::attach(
                owner,
                format!("pad '{name}:{index}' already requested by {}", prev.owner),
            ));
        }
        Ok(())
    }

    /// Hand out a pad group to `owner`.
    pub fn request(&mut self, owner: &str, name: &str, index: u8) -> Result<Pad> {
        self.check(owner, name, index)?;
        let pad = Pad {
            name: name.into(),
            index,
            owner: owner.into(),
        };
        self.granted.push(pad.clone());
        Ok(pad)
    }

    /// Pads handed out so far, in request order.
    pub fn granted(&self) -> &[Pad] {
        &self.granted
    }

    pub fn into_granted(self) -> Vec<Pad> {
        self.granted
    }
}
