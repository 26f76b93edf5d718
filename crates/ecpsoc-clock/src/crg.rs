//! Clock and reset generation for a target.
//!
//! [`derive`] requests the reference (and reset) pads, configures the main
//! PLL for the system and DRAM domains, optionally configures a second PLL
//! for the 12/48 MHz auxiliary domains, and records which domains each reset
//! policy holds in reset.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ecpsoc_core::units::{format_hz, MHZ};
use ecpsoc_core::{DramTiming, PadRequests, Result, SocError, TargetConfiguration};

use crate::domain::{ClockDomain, ClockSource, ResetKind};
use crate::pll::{Pll, PllConfig};
use crate::reset::ResetPolicy;

pub const SYS: &str = "sys";
pub const SYS_PS: &str = "sys_ps";
pub const SYS2X: &str = "sys2x";
pub const SYS2X_PS: &str = "sys2x_ps";
pub const USB_12: &str = "usb_12";
pub const USB_48: &str = "usb_48";

pub const MAIN_PLL: &str = "main_pll";
pub const USB_PLL: &str = "usb_pll";

/// Phase of the DRAM clock output relative to the clock it copies.
/// Ideally 90°, increased to 180° for output timing margin.
pub const DRAM_CLOCK_PHASE_DEG: u16 = 180;

const OWNER: &str = "crg";

/// Every clock domain of a target with the PLLs and reset policies behind them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClockTree {
    pub reference_pad: String,
    pub reference_hz: u64,
    pub plls: Vec<PllConfig>,
    pub domains: Vec<ClockDomain>,
    pub resets: Vec<ResetPolicy>,
    /// Name of the phase-shifted domain driving the DRAM clock pin.
    pub dram_output: String,
    pub dram_timing: DramTiming,
}

impl ClockTree {
    pub fn domain(&self, name: &str) -> Option<&ClockDomain> {
        self.domains.iter().find(|d| d.name == name)
    }

    /// The system domain.
    pub fn primary(&self) -> Option<&ClockDomain> {
        self.domain(SYS)
    }

    /// The phase-shifted copy of the DRAM interface clock.
    pub fn dram_output_domain(&self) -> Option<&ClockDomain> {
        self.domain(&self.dram_output)
    }

    /// Domains the DRAM PHY and controller run on, output clock excluded.
    pub fn dram_logic_domains(&self) -> Vec<&str> {
        match self.dram_timing {
            DramTiming::SingleRate => vec![SYS],
            DramTiming::HalfRate => vec![SYS, SYS2X],
        }
    }

    pub fn pll(&self, instance: &str) -> Option<&PllConfig> {
        self.plls.iter().find(|p| p.instance == instance)
    }

    /// The reset policy of the system domain.
    pub fn primary_reset(&self) -> Option<&ResetPolicy> {
        self.reset_for(SYS)
    }

    pub fn reset_for(&self, domain: &str) -> Option<&ResetPolicy> {
        self.resets.iter().find(|r| r.covers(domain))
    }

    /// Follow `source` links back to the reference pad of a domain.
    pub fn reference_of(&self, name: &str) -> Option<&str> {
        let mut current = self.domain(name)?;
        for _ in 0..=self.domains.len() {
            match &current.source {
                ClockSource::Reference { pad } => return Some(pad),
                ClockSource::Domain { name } => current = self.domain(name)?,
            }
        }
        None
    }
}

struct DomainSpec {
    name: &'static str,
    source: ClockSource,
    hz: u64,
    phase_deg: u16,
    multiplier: u32,
    reset: ResetKind,
}

/// Derive the clock tree of a target.
pub fn derive(config: &TargetConfiguration, pads: &mut PadRequests) -> Result<ClockTree> {
    let reference = &config.board.reference;
    pads.request(OWNER, &reference.pad, 0)?;
    let external = match &config.reset {
        Some(src) => {
            pads.request(OWNER, &src.pad, 0)?;
            Some(src.clone())
        }
        None => None,
    };

    let sys_hz = config.sys_clk_hz;
    let timing = config.dram.timing;
    let from_ref = || ClockSource::Reference {
        pad: reference.pad.clone(),
    };
    let from = |name: &str| ClockSource::Domain { name: name.into() };

    let mut main = vec![DomainSpec {
        name: SYS,
        source: from_ref(),
        hz: sys_hz,
        phase_deg: 0,
        multiplier: 1,
        reset: ResetKind::Synchronized,
    }];
    let dram_output = match timing {
        DramTiming::SingleRate => {
            main.push(DomainSpec {
                name: SYS_PS,
                source: from(SYS),
                hz: sys_hz,
                phase_deg: DRAM_CLOCK_PHASE_DEG,
                multiplier: 1,
                reset: ResetKind::ResetLess,
            });
            SYS_PS
        }
        DramTiming::HalfRate => {
            let fast_hz = sys_hz
                .checked_mul(u64::from(timing.clock_multiplier()))
                .ok_or_else(|| SocError::configuration("sys2x frequency overflows"))?;
            main.push(DomainSpec {
                name: SYS2X,
                source: from(SYS),
                hz: fast_hz,
                phase_deg: 0,
                multiplier: timing.clock_multiplier(),
                reset: ResetKind::Synchronized,
            });
            main.push(DomainSpec {
                name: SYS2X_PS,
                source: from(SYS2X),
                hz: fast_hz,
                phase_deg: DRAM_CLOCK_PHASE_DEG,
                multiplier: 1,
                reset: ResetKind::ResetLess,
            });
            SYS2X_PS
        }
    };

    let mut plls = Vec::new();
    let mut domains = Vec::new();
    let mut resets = Vec::new();

    let main_pll = synthesize(MAIN_PLL, reference.hz, &main)?;
    domains.extend(collect_domains(&main, &main_pll));
    resets.push(ResetPolicy {
        name: SYS.into(),
        lock_signal: main_pll.lock_signal(),
        external,
        software: true,
        domains: synchronized(&main),
    });
    plls.push(main_pll);

    if config.usb_pll {
        let usb = [
            DomainSpec {
                name: USB_12,
                source: from_ref(),
                hz: 12 * MHZ,
                phase_deg: 0,
                multiplier: 1,
                reset: ResetKind::Synchronized,
            },
            DomainSpec {
                name: USB_48,
                source: from_ref(),
                hz: 48 * MHZ,
                phase_deg: 0,
                multiplier: 1,
                reset: ResetKind::Synchronized,
            },
        ];
        let usb_pll = synthesize(USB_PLL, reference.hz, &usb)?;
        domains.extend(collect_domains(&usb, &usb_pll));
        resets.push(ResetPolicy {
            name: "usb".into(),
            lock_signal: usb_pll.lock_signal(),
            external: None,
            software: false,
            domains: synchronized(&usb),
        });
        plls.push(usb_pll);
    }

    for d in &domains {
        debug!(
            domain = %d.name,
            hz = d.hz,
            achieved_hz = d.achieved_hz,
            phase = d.phase_deg,
            pll = %d.pll,
            "clock domain"
        );
    }
    info!(
        sys = %format_hz(sys_hz),
        domains = domains.len(),
        dram_output,
        "clock tree derived"
    );

    Ok(ClockTree {
        reference_pad: reference.pad.clone(),
        reference_hz: reference.hz,
        plls,
        domains,
        resets,
        dram_output: dram_output.into(),
        dram_timing: timing,
    })
}

fn synthesize(instance: &str, reference_hz: u64, specs: &[DomainSpec]) -> Result<PllConfig> {
    let mut pll = Pll::ecp5(instance);
    pll.register_clkin(reference_hz)?;
    for spec in specs {
        match &spec.source {
            ClockSource::Domain { name } if specs.iter().any(|s| s.name == name.as_str()) => pll
                .create_clkout_locked(spec.name, spec.hz, spec.phase_deg, name, spec.multiplier)?,
            _ => pll.create_clkout(spec.name, spec.hz, spec.phase_deg)?,
        }
    }
    pll.compute_config()
}

fn collect_domains(specs: &[DomainSpec], pll: &PllConfig) -> Vec<ClockDomain> {
    specs
        .iter()
        .map(|spec| ClockDomain {
            name: spec.name.into(),
            source: spec.source.clone(),
            hz: spec.hz,
            achieved_hz: pll
                .output(spec.name)
                .map(|o| o.achieved_hz)
                .unwrap_or(spec.hz),
            phase_deg: spec.phase_deg,
            multiplier: spec.multiplier,
            reset: spec.reset,
            pll: pll.instance.clone(),
        })
        .collect()
}

fn synchronized(specs: &[DomainSpec]) -> Vec<String> {
    specs
        .iter()
        .filter(|s| s.reset == ResetKind::Synchronized)
        .map(|s| s.name.to_string())
        .collect()
}
