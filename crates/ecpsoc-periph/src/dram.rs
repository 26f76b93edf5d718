//! SDRAM controller attachment.

use serde::{Deserialize, Serialize};

use ecpsoc_core::layout::MAIN_RAM;
use ecpsoc_core::{BuildConstant, DramConfig, DramTiming, Result, SocError};
use ecpsoc_memmap::MainRamSizing;

use crate::attach::{AttachRequest, PeripheralAttacher};
use crate::binding::{PeripheralBinding, PeripheralKind, PeripheralMode};

/// Generic SDR SDRAM PHY flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SdramPhy {
    #[serde(rename = "GENSDRPHY")]
    Gensdr,
    #[serde(rename = "HalfRateGENSDRPHY")]
    HalfRateGensdr,
}

impl SdramPhy {
    pub fn for_timing(timing: DramTiming) -> Self {
        match timing {
            DramTiming::SingleRate => SdramPhy::Gensdr,
            DramTiming::HalfRate => SdramPhy::HalfRateGensdr,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SdramPhy::Gensdr => "GENSDRPHY",
            SdramPhy::HalfRateGensdr => "HalfRateGENSDRPHY",
        }
    }
}

impl PeripheralAttacher {
    /// Attach the SDRAM controller behind the main RAM region.
    ///
    /// Main RAM must already be bound with `sizing.mapped` bytes. The
    /// controller runs on the DRAM logic domains of the clock tree and drives
    /// the board clock pin from the phase-shifted output domain.
    pub fn attach_dram(
        &mut self,
        dram: &DramConfig,
        sizing: &MainRamSizing,
    ) -> Result<PeripheralBinding> {
        let clocks = self.clocks()?;
        let output = clocks
            .dram_output_domain()
            .ok_or_else(|| SocError::attach("sdram", "clock tree has no DRAM output domain"))?
            .name
            .clone();
        let mut aux_domains: Vec<String> = clocks
            .dram_logic_domains()
            .into_iter()
            .filter(|d| *d != "sys")
            .map(String::from)
            .collect();
        aux_domains.push(output);

        let region = self.map()?.region(MAIN_RAM).cloned();
        if let Some(region) = region.filter(|r| r.populated) {
            if region.size != sizing.mapped {
                return Err(SocError::attach(
                    "sdram",
                    format!(
                        "main RAM bound with {} bytes, controller sized for {}",
                        region.size, sizing.mapped
                    ),
                ));
            }
        }

        let binding = self.attach(AttachRequest {
            peripheral: "sdram".into(),
            kind: PeripheralKind::Dram,
            domain: "sys".into(),
            aux_domains,
            region: MAIN_RAM.into(),
            mode: PeripheralMode::Dram {
                timing: dram.timing,
                phy: SdramPhy::for_timing(dram.timing),
                module: dram.module.name.clone(),
                port_data_width: sizing.port_data_width,
                l2_cache: dram.l2_cache,
            },
            pads: vec![("sdram_clock".into(), 0), ("sdram".into(), 0)],
            csr_pages: vec!["sdram".into()],
        })?;

        let base = self.map()?.region(MAIN_RAM).map(|r| r.base).unwrap_or_default();
        self.publish(BuildConstant::int("MAIN_RAM_BASE", base));
        self.publish(BuildConstant::int("MAIN_RAM_SIZE", sizing.mapped));
        self.publish(BuildConstant::int("CONFIG_L2_SIZE", dram.l2_cache.size_bytes));
        self.publish(BuildConstant::string("SDRAM_MODULE", &dram.module.name));
        self.publish(BuildConstant::string("SDRAM_RATE", dram.timing.rate()));
        Ok(binding)
    }
}
