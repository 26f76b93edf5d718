//! Attachment sequencing.
//!
//! A [`PeripheralAttacher`] is handed the clock tree and the address map as
//! each stage completes. Every attachment checks that the domains and
//! regions it needs exist before anything is requested or reserved.

use tracing::{debug, info};

use ecpsoc_clock::ClockTree;
use ecpsoc_core::layout::CSR;
use ecpsoc_core::{Board, BuildConstant, Pad, PadRequests, Result, SocError};
use ecpsoc_memmap::{AddressMap, CsrSlot, CsrWindow, CSR_PAGING};

use crate::binding::{PeripheralBinding, PeripheralKind, PeripheralMode};

/// Everything one attachment needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachRequest {
    pub peripheral: String,
    pub kind: PeripheralKind,
    pub domain: String,
    pub aux_domains: Vec<String>,
    pub region: String,
    pub mode: PeripheralMode,
    /// Board pads to request, by name and index.
    pub pads: Vec<(String, u8)>,
    /// CSR pages to reserve.
    pub csr_pages: Vec<String>,
}

/// Result of the attachment stage.
#[derive(Debug, Clone)]
pub struct Attachments {
    pub clocks: ClockTree,
    pub map: AddressMap,
    pub csr: Option<CsrWindow>,
    pub bindings: Vec<PeripheralBinding>,
    pub constants: Vec<BuildConstant>,
    pub pads: Vec<Pad>,
}

/// Binds peripherals once their clock domains and regions are ready.
#[derive(Debug)]
pub struct PeripheralAttacher {
    pads: PadRequests,
    clocks: Option<ClockTree>,
    map: Option<AddressMap>,
    csr: Option<CsrWindow>,
    bindings: Vec<PeripheralBinding>,
    constants: Vec<BuildConstant>,
}

impl PeripheralAttacher {
    pub fn new(board: &Board) -> Self {
        Self {
            pads: PadRequests::new(board),
            clocks: None,
            map: None,
            csr: None,
            bindings: Vec::new(),
            constants: Vec::new(),
        }
    }

    /// Pad requests shared with the clock generator.
    pub fn pads_mut(&mut self) -> &mut PadRequests {
        &mut self.pads
    }

    /// Hand over the derived clock tree.
    ///
    /// The primary domain must already be covered by a reset policy.
    pub fn provide_clocks(&mut self, clocks: ClockTree) -> Result<()> {
        if self.clocks.is_some() {
            return Err(SocError::configuration("clock tree provided twice"));
        }
        if clocks.primary().is_none() || clocks.primary_reset().is_none() {
            return Err(SocError::sequencing(
                "accept clock tree",
                "a reset policy on the primary domain",
            ));
        }
        self.clocks = Some(clocks);
        Ok(())
    }

    /// Hand over the allocated address map and open its CSR window.
    pub fn provide_map(&mut self, map: AddressMap) -> Result<()> {
        if self.map.is_some() {
            return Err(SocError::configuration("address map provided twice"));
        }
        self.csr = match map.region(CSR) {
            Some(region) => Some(CsrWindow::new(region, CSR_PAGING)?),
            None => None,
        };
        self.map = Some(map);
        Ok(())
    }

    pub fn clocks(&self) -> Result<&ClockTree> {
        self.clocks
            .as_ref()
            .ok_or_else(|| SocError::sequencing("attach peripheral", "clock domain derivation"))
    }

    pub fn map(&self) -> Result<&AddressMap> {
        self.map
            .as_ref()
            .ok_or_else(|| SocError::sequencing("attach peripheral", "address map allocation"))
    }

    pub(crate) fn map_mut(&mut self) -> Result<&mut AddressMap> {
        self.map
            .as_mut()
            .ok_or_else(|| SocError::sequencing("attach peripheral", "address map allocation"))
    }

    /// Reserve a CSR page outside of any peripheral binding (SoC core registers).
    pub fn reserve_csr(&mut self, name: &str) -> Result<CsrSlot> {
        self.csr
            .as_mut()
            .ok_or_else(|| SocError::sequencing(format!("reserve CSR page '{name}'"), "a CSR region"))?
            .reserve(name)
    }

    pub(crate) fn publish(&mut self, constant: BuildConstant) {
        debug!(name = %constant.name, value = %constant.value, "build constant");
        self.constants.push(constant);
    }

    pub fn bindings(&self) -> &[PeripheralBinding] {
        &self.bindings
    }

    pub fn constants(&self) -> &[BuildConstant] {
        &self.constants
    }

    /// Bind a peripheral to a clock domain and a populated region.
    pub fn attach(&mut self, request: AttachRequest) -> Result<PeripheralBinding> {
        self.check(&request, None)?;

        let mut pads = Vec::with_capacity(request.pads.len());
        for (name, index) in &request.pads {
            pads.push(self.pads.request(&request.peripheral, name, *index)?);
        }
        let mut csr = Vec::with_capacity(request.csr_pages.len());
        for page in &request.csr_pages {
            csr.push(self.reserve_csr(page)?);
        }

        let binding = PeripheralBinding {
            peripheral: request.peripheral,
            kind: request.kind,
            domain: request.domain,
            aux_domains: request.aux_domains,
            region: request.region,
            csr,
            pads,
            mode: request.mode,
        };
        info!(
            peripheral = %binding.peripheral,
            kind = binding.kind.as_str(),
            domain = %binding.domain,
            region = %binding.region,
            "peripheral attached"
        );
        self.bindings.push(binding.clone());
        Ok(binding)
    }

    pub(crate) fn pads(&self) -> &PadRequests {
        &self.pads
    }

    /// Run every check `attach` makes before it claims anything.
    ///
    /// With `pending_bind` set, the request's region may still be empty as
    /// long as a block of that size could be bound into it.
    pub(crate) fn check(&self, request: &AttachRequest, pending_bind: Option<u64>) -> Result<()> {
        let operation = format!("attach {}", request.peripheral);
        let clocks = self
            .clocks
            .as_ref()
            .ok_or_else(|| SocError::sequencing(&operation, "clock domain derivation"))?;
        for domain in std::iter::once(&request.domain).chain(&request.aux_domains) {
            if clocks.domain(domain).is_none() {
                return Err(SocError::attach(
                    &request.peripheral,
                    format!("no clock domain '{domain}'"),
                ));
            }
        }

        let map = self
            .map
            .as_ref()
            .ok_or_else(|| SocError::sequencing(&operation, "address map allocation"))?;
        let region = map.region(&request.region).ok_or_else(|| {
            SocError::sequencing(&operation, format!("allocation of region '{}'", request.region))
        })?;
        match pending_bind {
            Some(size) => {
                map.check_bind(&request.region, size)?;
            }
            None if !region.populated => {
                return Err(SocError::sequencing(
                    &operation,
                    format!("binding of region '{}'", request.region),
                ));
            }
            None => {}
        }

        if request.mode.kind() != request.kind {
            return Err(SocError::configuration(format!(
                "{}: {} mode given for a {} peripheral",
                request.peripheral,
                request.mode.kind().as_str(),
                request.kind.as_str()
            )));
        }
        if let PeripheralMode::Dram { timing, phy, .. } = &request.mode {
            if *timing != clocks.dram_timing {
                return Err(SocError::configuration(format!(
                    "{}: {} controller on a clock tree derived for {} DRAM",
                    request.peripheral,
                    timing.rate(),
                    clocks.dram_timing.rate()
                )));
            }
            if *phy != crate::dram::SdramPhy::for_timing(*timing) {
                return Err(SocError::configuration(format!(
                    "{}: {} cannot run {} timing",
                    request.peripheral,
                    phy.name(),
                    timing.rate()
                )));
            }
        }

        if self.bindings.iter().any(|b| b.peripheral == request.peripheral) {
            return Err(SocError::attach(&request.peripheral, "already attached"));
        }
        for (name, index) in &request.pads {
            self.pads.check(&request.peripheral, name, *index)?;
        }
        if !request.csr_pages.is_empty() {
            self.csr
                .as_ref()
                .ok_or_else(|| SocError::sequencing(&operation, "a CSR region"))?
                .check_room_for(&request.csr_pages)?;
        }
        Ok(())
    }

    /// Close the stage: bind the CSR window footprint and hand everything back.
    pub fn finish(mut self) -> Result<Attachments> {
        let clocks = self
            .clocks
            .take()
            .ok_or_else(|| SocError::sequencing("finish attachment", "clock domain derivation"))?;
        let mut map = self
            .map
            .take()
            .ok_or_else(|| SocError::sequencing("finish attachment", "address map allocation"))?;
        if let Some(window) = &self.csr {
            if window.footprint() > 0 {
                map.bind(window.region(), window.footprint())?;
            }
        }
        Ok(Attachments {
            clocks,
            map,
            csr: self.csr,
            bindings: self.bindings,
            constants: self.constants,
            pads: self.pads.into_granted(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ecpsoc_core::layout::MAIN_RAM;
    use ecpsoc_core::units::MIB;
    use ecpsoc_core::{DramTiming, ErrorKind, L2Cache, TargetConfiguration};

    use crate::dram::SdramPhy;

    /// Attacher with clocks and a map whose main RAM is bound.
    pub(crate) fn ready(config: &TargetConfiguration) -> PeripheralAttacher {
        let mut attacher = PeripheralAttacher::new(&config.board);
        let clocks = ecpsoc_clock::derive(config, attacher.pads_mut()).unwrap();
        attacher.provide_clocks(clocks).unwrap();
        let mut map = AddressMap::from_layout(&config.memory_map, &config.cpu).unwrap();
        map.bind(MAIN_RAM, 4 * MIB).unwrap();
        attacher.provide_map(map).unwrap();
        attacher
    }

    fn dram_request(timing: DramTiming, phy: SdramPhy) -> AttachRequest {
        AttachRequest {
            peripheral: "sdram".into(),
            kind: PeripheralKind::Dram,
            domain: "sys".into(),
            aux_domains: vec![],
            region: MAIN_RAM.into(),
            mode: PeripheralMode::Dram {
                timing,
                phy,
                module: "M12L16161A".into(),
                port_data_width: 32,
                l2_cache: L2Cache::default(),
            },
            pads: vec![],
            csr_pages: vec![],
        }
    }

    #[test]
    fn attach_before_clocks_is_sequencing_error() {
        let config = TargetConfiguration::colorlight_baseline("t");
        let mut attacher = PeripheralAttacher::new(&config.board);
        let err = attacher
            .attach(dram_request(DramTiming::SingleRate, SdramPhy::Gensdr))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Sequencing);
        assert!(err.to_string().contains("clock domain derivation"));
        assert!(attacher.bindings().is_empty());
    }

    #[test]
    fn attach_before_map_is_sequencing_error() {
        let config = TargetConfiguration::colorlight_baseline("t");
        let mut attacher = PeripheralAttacher::new(&config.board);
        let clocks = ecpsoc_clock::derive(&config, attacher.pads_mut()).unwrap();
        attacher.provide_clocks(clocks).unwrap();
        let err = attacher
            .attach(dram_request(DramTiming::SingleRate, SdramPhy::Gensdr))
            .unwrap_err();
        assert!(err.to_string().contains("address map allocation"));
    }

    #[test]
    fn unbound_region_is_sequencing_error() {
        let config = TargetConfiguration::colorlight_baseline("t");
        let mut attacher = ready(&config);
        let mut request = dram_request(DramTiming::SingleRate, SdramPhy::Gensdr);
        request.region = "sram".into();
        let err = attacher.attach(request).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Sequencing);
        assert!(err.to_string().contains("binding of region 'sram'"));
    }

    #[test]
    fn unknown_domain_is_attach_error() {
        let config = TargetConfiguration::colorlight_baseline("t");
        let mut attacher = ready(&config);
        let mut request = dram_request(DramTiming::SingleRate, SdramPhy::Gensdr);
        request.aux_domains = vec!["sys2x_ps".into()];
        assert_eq!(attacher.attach(request).unwrap_err().kind(), ErrorKind::Attach);
    }

    #[test]
    fn wrong_phy_for_timing_is_configuration_error() {
        let config = TargetConfiguration::colorlight_baseline("t");
        let mut attacher = ready(&config);
        let err = attacher
            .attach(dram_request(DramTiming::SingleRate, SdramPhy::HalfRateGensdr))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        let err = attacher
            .attach(dram_request(DramTiming::HalfRate, SdramPhy::HalfRateGensdr))
            .unwrap_err();
        assert!(err.to_string().contains("derived for 1:1"));
    }

    #[test]
    fn generic_attach_and_finish() {
        let config = TargetConfiguration::colorlight_baseline("t");
        let mut attacher = ready(&config);
        attacher.reserve_csr("ctrl").unwrap();
        let mut request = dram_request(DramTiming::SingleRate, SdramPhy::Gensdr);
        request.pads = vec![("sdram".into(), 0)];
        request.csr_pages = vec!["sdram".into()];
        let binding = attacher.attach(request.clone()).unwrap();
        assert_eq!(binding.csr[0].base, 0xf000_0800);
        assert_eq!(binding.pads[0].owner, "sdram");
        assert_eq!(attacher.attach(request).unwrap_err().kind(), ErrorKind::Attach);

        let done = attacher.finish().unwrap();
        assert_eq!(done.bindings.len(), 1);
        assert_eq!(done.map.region(CSR).unwrap().size, 2 * CSR_PAGING);
        assert!(done.pads.iter().any(|p| p.name == "clk25"));
    }

    #[test]
    fn taken_csr_page_claims_no_pads() {
        let config = TargetConfiguration::colorlight_baseline("t");
        let mut attacher = ready(&config);
        attacher.reserve_csr("sdram").unwrap();
        let mut request = dram_request(DramTiming::SingleRate, SdramPhy::Gensdr);
        request.pads = vec![("sdram".into(), 0)];
        request.csr_pages = vec!["sdram".into()];
        assert_eq!(attacher.attach(request.clone()).unwrap_err().kind(), ErrorKind::Attach);
        assert!(attacher.pads().granted().iter().all(|p| p.name != "sdram"));
        assert!(attacher.bindings().is_empty());

        request.csr_pages = vec!["sdram_phy".into(), "sdram_phy".into()];
        assert_eq!(attacher.attach(request).unwrap_err().kind(), ErrorKind::Attach);
        assert!(attacher.pads().granted().iter().all(|p| p.name != "sdram"));
    }

    #[test]
    fn clocks_provided_twice() {
        let config = TargetConfiguration::colorlight_baseline("t");
        let mut attacher = ready(&config);
        let mut pads = PadRequests::new(&config.board);
        let again = ecpsoc_clock::derive(&config, &mut pads).unwrap();
        assert!(attacher.provide_clocks(again).is_err());
    }
}
