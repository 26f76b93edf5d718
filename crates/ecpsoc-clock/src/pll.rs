//! PLL constraint model.
//!
//! A PLL divides its input by a reference divider, multiplies by a feedback
//! divider to reach the VCO, and divides the VCO per output. Only
//! frequencies within the tolerance of `vco / divider`, and phases that are a
//! whole number of VCO periods at that divider, are representable.

use serde::{Deserialize, Serialize};
use tracing::debug;

use ecpsoc_core::units::{format_hz, MHZ};
use ecpsoc_core::{Result, SocError};

/// Frequency and divider limits of a PLL primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllLimits {
    pub clkin_hz: (u64, u64),
    pub pfd_hz: (u64, u64),
    pub vco_hz: (u64, u64),
    pub clkout_hz: (u64, u64),
    /// Largest value of any divider (all dividers start at 1).
    pub max_divider: u32,
    pub max_outputs: usize,
    /// Allowed output frequency error, in percent of the request.
    pub tolerance_pct: u64,
}

impl PllLimits {
    /// Lattice ECP5 EHXPLLL.
    pub const ECP5: PllLimits = PllLimits {
        clkin_hz: (8 * MHZ, 400 * MHZ),
        pfd_hz: (10 * MHZ, 400 * MHZ),
        vco_hz: (400 * MHZ, 800 * MHZ),
        clkout_hz: (3_125_000, 400 * MHZ),
        max_divider: 128,
        max_outputs: 4,
        tolerance_pct: 1,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OutputRequest {
    domain: String,
    hz: u64,
    phase_deg: u16,
    /// Index of the output this one runs at a fixed multiple of.
    locked_to: Option<(usize, u32)>,
}

/// One solved PLL output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PllOutput {
    pub domain: String,
    pub target_hz: u64,
    pub achieved_hz: u64,
    pub divider: u32,
    pub phase_deg: u16,
}

/// A solved PLL: dividers for the reference, feedback, and every output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PllConfig {
    pub instance: String,
    pub reference_hz: u64,
    pub reference_divider: u32,
    pub feedback_divider: u32,
    pub vco_hz: u64,
    pub outputs: Vec<PllOutput>,
}

impl PllConfig {
    pub fn output(&self, domain: &str) -> Option<&PllOutput> {
        self.outputs.iter().find(|o| o.domain == domain)
    }

    /// Name of the lock indicator signal.
    pub fn lock_signal(&self) -> String {
        format!("{}.locked", self.instance)
    }
}

/// A PLL being configured: register the input, request outputs, then solve.
#[derive(Debug, Clone)]
pub struct Pll {
    instance: String,
    limits: PllLimits,
    clkin_hz: Option<u64>,
    requests: Vec<OutputRequest>,
}

impl Pll {
    pub fn new(instance: impl Into<String>, limits: PllLimits) -> Self {
        Self {
            instance: instance.into(),
            limits,
            clkin_hz: None,
            requests: Vec::new(),
        }
    }

    pub fn ecp5(instance: impl Into<String>) -> Self {
        Self::new(instance, PllLimits::ECP5)
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Register the input clock.
    pub fn register_clkin(&mut self, hz: u64) -> Result<()> {
        let (lo, hi) = self.limits.clkin_hz;
        if hz < lo || hz > hi {
            return Err(SocError::configuration(format!(
                "{}: input clock {} outside {}..{}",
                self.instance,
                format_hz(hz),
                format_hz(lo),
                format_hz(hi)
            )));
        }
        self.clkin_hz = Some(hz);
        Ok(())
    }

    /// Request an output for `domain` at `hz` and `phase_deg` degrees.
    pub fn create_clkout(&mut self, domain: &str, hz: u64, phase_deg: u16) -> Result<()> {
        if self.requests.len() >= self.limits.max_outputs {
            return Err(SocError::configuration(format!(
                "{}: no output left for '{domain}' ({} outputs max)",
                self.instance, self.limits.max_outputs
            )));
        }
        if phase_deg >= 360 {
            return Err(SocError::configuration(format!(
                "{}: phase {phase_deg}° for '{domain}' outside 0..359",
                self.instance
            )));
        }
        let (lo, hi) = self.limits.clkout_hz;
        if hz < lo || hz > hi {
            return Err(SocError::configuration(format!(
                "{}: '{domain}' at {} outside output range {}..{}",
                self.instance,
                format_hz(hz),
                format_hz(lo),
                format_hz(hi)
            )));
        }
        if self.requests.iter().any(|r| r.domain == domain) {
            return Err(SocError::configuration(format!(
                "{}: output for '{domain}' requested twice",
                self.instance
            )));
        }
        self.requests.push(OutputRequest {
            domain: domain.into(),
            hz,
            phase_deg,
            locked_to: None,
        });
        Ok(())
    }

    /// Request an output at exactly `multiplier` times the frequency of the
    /// already requested output `base`.
    ///
    /// The solver then only accepts VCOs where the base divider is a multiple
    /// of `multiplier`, so the achieved frequencies keep the ratio exactly.
    pub fn create_clkout_locked(
        &mut self,
        domain: &str,
        hz: u64,
        phase_deg: u16,
        base: &str,
        multiplier: u32,
    ) -> Result<()> {
        let index = self
            .requests
            .iter()
            .position(|r| r.domain == base)
            .ok_or_else(|| {
                SocError::sequencing(
                    format!("lock '{domain}' to '{base}'"),
                    format!("an output request for '{base}'"),
                )
            })?;
        let base_hz = self.requests[index].hz;
        if multiplier == 0 || base_hz.checked_mul(u64::from(multiplier)) != Some(hz) {
            return Err(SocError::configuration(format!(
                "{}: '{domain}' at {} is not {multiplier} x '{base}' at {}",
                self.instance,
                format_hz(hz),
                format_hz(base_hz)
            )));
        }
        self.create_clkout(domain, hz, phase_deg)?;
        if let Some(req) = self.requests.last_mut() {
            req.locked_to = Some((index, multiplier));
        }
        Ok(())
    }

    /// Search the divider space for a configuration meeting every request.
    ///
    /// Reference dividers are tried smallest first, then feedback dividers
    /// from the lowest legal VCO upward; the first VCO that serves every
    /// output wins, so the result is deterministic.
    pub fn compute_config(&self) -> Result<PllConfig> {
        let clkin = self.clkin_hz.ok_or_else(|| {
            SocError::sequencing(
                format!("configure {}", self.instance),
                "a registered input clock",
            )
        })?;
        if self.requests.is_empty() {
            return Err(SocError::configuration(format!(
                "{}: no outputs requested",
                self.instance
            )));
        }

        let l = &self.limits;
        for ref_div in 1..=l.max_divider {
            let rd = u64::from(ref_div);
            // pfd = clkin / ref_div
            if clkin < l.pfd_hz.0 * rd {
                break;
            }
            if clkin > l.pfd_hz.1 * rd {
                continue;
            }
            for fb_div in 1..=l.max_divider {
                let num = clkin * u64::from(fb_div);
                if num % rd != 0 {
                    continue;
                }
                let vco = num / rd;
                if vco < l.vco_hz.0 {
                    continue;
                }
                if vco > l.vco_hz.1 {
                    break;
                }
                if let Some(outputs) = self.solve_outputs(vco) {
                    debug!(
                        instance = %self.instance,
                        ref_div,
                        fb_div,
                        vco_hz = vco,
                        "pll configured"
                    );
                    return Ok(PllConfig {
                        instance: self.instance.clone(),
                        reference_hz: clkin,
                        reference_divider: ref_div,
                        feedback_divider: fb_div,
                        vco_hz: vco,
                        outputs,
                    });
                }
            }
        }

        let wanted: Vec<String> = self
            .requests
            .iter()
            .map(|r| format!("{} {} @ {}°", r.domain, format_hz(r.hz), r.phase_deg))
            .collect();
        Err(SocError::configuration(format!(
            "{}: no divider configuration from {} satisfies {}",
            self.instance,
            format_hz(clkin),
            wanted.join(", ")
        )))
    }

    fn solve_outputs(&self, vco: u64) -> Option<Vec<PllOutput>> {
        let mut dividers = Vec::with_capacity(self.requests.len());
        if !self.assign(vco, &mut dividers) {
            return None;
        }
        Some(
            self.requests
                .iter()
                .zip(dividers)
                .map(|(r, divider)| PllOutput {
                    domain: r.domain.clone(),
                    target_hz: r.hz,
                    achieved_hz: vco / u64::from(divider),
                    divider,
                    phase_deg: r.phase_deg,
                })
                .collect(),
        )
    }

    /// Depth-first divider assignment in request order.
    ///
    /// Free outputs try their candidates best first; locked outputs have the
    /// single divider their base allows.
    fn assign(&self, vco: u64, dividers: &mut Vec<u32>) -> bool {
        let Some(req) = self.requests.get(dividers.len()) else {
            return true;
        };
        let candidates = match req.locked_to {
            Some((base, multiplier)) => {
                let base_div = dividers[base];
                if base_div % multiplier != 0 {
                    return false;
                }
                let div = base_div / multiplier;
                if self.divider_error(vco, req, div).is_none() {
                    return false;
                }
                vec![div]
            }
            None => self.candidate_dividers(vco, req),
        };
        for div in candidates {
            dividers.push(div);
            if self.assign(vco, dividers) {
                return true;
            }
            dividers.pop();
        }
        false
    }

    /// Error `|vco - hz * div|` when `div` serves `req`.
    fn divider_error(&self, vco: u64, req: &OutputRequest, div: u32) -> Option<u64> {
        let div = u64::from(div);
        if div == 0 || div > u64::from(self.limits.max_divider) {
            return None;
        }
        // phase must be a whole number of VCO periods: phase * div / 360
        if (u64::from(req.phase_deg) * div) % 360 != 0 {
            return None;
        }
        let err = vco.abs_diff(req.hz * div);
        if err * 100 > req.hz * div * self.limits.tolerance_pct {
            return None;
        }
        let achieved = vco / div;
        if achieved < self.limits.clkout_hz.0 || achieved > self.limits.clkout_hz.1 {
            return None;
        }
        Some(err)
    }

    /// Usable dividers around `vco / hz`, smallest relative error first.
    fn candidate_dividers(&self, vco: u64, req: &OutputRequest) -> Vec<u32> {
        let nominal = vco / req.hz;
        let lo = nominal.saturating_sub(1).max(1);
        let hi = (nominal + 2).min(u64::from(self.limits.max_divider));
        let mut found: Vec<(u32, u64)> = (lo..=hi)
            .filter_map(|div| u32::try_from(div).ok())
            .filter_map(|div| self.divider_error(vco, req, div).map(|err| (div, err)))
            .collect();
        // compare err / (hz * div) across candidates
        found.sort_by(|(adiv, aerr), (bdiv, berr)| {
            (u128::from(*aerr) * u128::from(*bdiv)).cmp(&(u128::from(*berr) * u128::from(*adiv)))
        });
        found.into_iter().map(|(div, _)| div).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecpsoc_core::ErrorKind;

    fn within_one_percent(achieved: u64, target: u64) -> bool {
        achieved.abs_diff(target) * 100 <= target
    }

    #[test]
    fn exact_50mhz_with_phase_shift() {
        let mut pll = Pll::ecp5("main_pll");
        pll.register_clkin(25 * MHZ).unwrap();
        pll.create_clkout("sys", 50 * MHZ, 0).unwrap();
        pll.create_clkout("sys_ps", 50 * MHZ, 180).unwrap();
        let cfg = pll.compute_config().unwrap();
        assert_eq!(cfg.vco_hz, 400 * MHZ);
        assert_eq!(cfg.output("sys").unwrap().achieved_hz, 50 * MHZ);
        let ps = cfg.output("sys_ps").unwrap();
        assert_eq!(ps.phase_deg, 180);
        assert_eq!(ps.divider % 2, 0);
        assert_eq!(cfg.lock_signal(), "main_pll.locked");
    }

    #[test]
    fn approximate_66mhz_within_tolerance() {
        let mut pll = Pll::ecp5("main_pll");
        pll.register_clkin(25 * MHZ).unwrap();
        pll.create_clkout("sys", 66 * MHZ, 0).unwrap();
        pll.create_clkout("sys_ps", 66 * MHZ, 180).unwrap();
        let cfg = pll.compute_config().unwrap();
        let sys = cfg.output("sys").unwrap();
        assert!(within_one_percent(sys.achieved_hz, 66 * MHZ));
        assert_eq!(sys.achieved_hz, 65_625_000);
    }

    #[test]
    fn shared_vco_serves_doubled_output() {
        let mut pll = Pll::ecp5("main_pll");
        pll.register_clkin(25 * MHZ).unwrap();
        pll.create_clkout("sys", 90 * MHZ, 0).unwrap();
        pll.create_clkout("sys2x", 180 * MHZ, 0).unwrap();
        pll.create_clkout("sys2x_ps", 180 * MHZ, 180).unwrap();
        let cfg = pll.compute_config().unwrap();
        let sys = cfg.output("sys").unwrap();
        let sys2x = cfg.output("sys2x").unwrap();
        assert_eq!(sys.divider, 2 * sys2x.divider);
        assert!(within_one_percent(sys2x.achieved_hz, 180 * MHZ));
        assert_eq!(cfg.vco_hz % sys2x.achieved_hz, 0);
    }

    #[test]
    fn locked_output_keeps_exact_ratio() {
        // At VCO 400 MHz, 3.98 MHz is best served by /101, 7.96 MHz by /50
        let mut free = Pll::ecp5("free");
        free.register_clkin(25 * MHZ).unwrap();
        free.create_clkout("sys", 3_980_000, 0).unwrap();
        free.create_clkout("sys2x", 7_960_000, 0).unwrap();
        let cfg = free.compute_config().unwrap();
        assert_eq!(cfg.output("sys").unwrap().divider, 101);
        assert_eq!(cfg.output("sys2x").unwrap().divider, 50);

        let mut locked = Pll::ecp5("locked");
        locked.register_clkin(25 * MHZ).unwrap();
        locked.create_clkout("sys", 3_980_000, 0).unwrap();
        locked
            .create_clkout_locked("sys2x", 7_960_000, 0, "sys", 2)
            .unwrap();
        let cfg = locked.compute_config().unwrap();
        assert_eq!(cfg.vco_hz, 400 * MHZ);
        let sys = cfg.output("sys").unwrap();
        let sys2x = cfg.output("sys2x").unwrap();
        assert_eq!(sys.divider, 100);
        assert_eq!(sys2x.divider, 50);
        assert_eq!(sys2x.achieved_hz, 2 * sys.achieved_hz);
    }

    #[test]
    fn locked_phase_copy_backtracks_base_divider() {
        let mut pll = Pll::ecp5("main_pll");
        pll.register_clkin(25 * MHZ).unwrap();
        pll.create_clkout("sys", 3_980_000, 0).unwrap();
        pll.create_clkout_locked("sys_ps", 3_980_000, 180, "sys", 1)
            .unwrap();
        let cfg = pll.compute_config().unwrap();
        assert_eq!(cfg.output("sys").unwrap().divider, 100);
        assert_eq!(cfg.output("sys_ps").unwrap().achieved_hz, 4_000_000);
    }

    #[test]
    fn lock_needs_known_base_and_matching_ratio() {
        let mut pll = Pll::ecp5("main_pll");
        pll.register_clkin(25 * MHZ).unwrap();
        let err = pll
            .create_clkout_locked("sys2x", 100 * MHZ, 0, "sys", 2)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Sequencing);
        pll.create_clkout("sys", 50 * MHZ, 0).unwrap();
        let err = pll
            .create_clkout_locked("sys2x", 90 * MHZ, 0, "sys", 2)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn unrepresentable_phase_is_rejected() {
        let mut pll = Pll::ecp5("main_pll");
        pll.register_clkin(25 * MHZ).unwrap();
        pll.create_clkout("fast", 200 * MHZ, 45).unwrap();
        let err = pll.compute_config().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("fast"));
    }

    #[test]
    fn output_out_of_range() {
        let mut pll = Pll::ecp5("main_pll");
        pll.register_clkin(25 * MHZ).unwrap();
        assert!(pll.create_clkout("sys", 450 * MHZ, 0).is_err());
        assert!(pll.create_clkout("sys", 50 * MHZ, 360).is_err());
    }

    #[test]
    fn too_many_outputs() {
        let mut pll = Pll::ecp5("main_pll");
        pll.register_clkin(25 * MHZ).unwrap();
        for i in 0..4 {
            pll.create_clkout(&format!("o{i}"), 50 * MHZ, 0).unwrap();
        }
        let err = pll.create_clkout("o4", 50 * MHZ, 0).unwrap_err();
        assert!(err.to_string().contains("4 outputs max"));
    }

    #[test]
    fn input_out_of_range() {
        let mut pll = Pll::ecp5("main_pll");
        assert!(pll.register_clkin(MHZ).is_err());
    }

    #[test]
    fn compute_before_clkin_is_sequencing_error() {
        let mut pll = Pll::ecp5("main_pll");
        pll.create_clkout("sys", 50 * MHZ, 0).unwrap();
        let err = pll.compute_config().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Sequencing);
    }

    #[test]
    fn duplicate_output_rejected() {
        let mut pll = Pll::ecp5("main_pll");
        pll.create_clkout("sys", 50 * MHZ, 0).unwrap();
        assert!(pll.create_clkout("sys", 50 * MHZ, 0).is_err());
    }
}
