//! Reset policies.
//!
//! A domain synchronized to a policy stays in reset while any contributor is
//! active: the PLL has not locked, the external reset input is asserted, or
//! software requested a reset.

use serde::{Deserialize, Serialize};

use ecpsoc_core::ResetSource;

/// Combined reset condition for one or more domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResetPolicy {
    pub name: String,
    /// Lock indicator of the PLL feeding the domains.
    pub lock_signal: String,
    #[serde(default)]
    pub external: Option<ResetSource>,
    /// Whether the CPU's `ctrl` reset request contributes.
    pub software: bool,
    /// Domains held in reset by this policy.
    pub domains: Vec<String>,
}

impl ResetPolicy {
    /// Evaluate the reset condition.
    ///
    /// `pin_high` is the level of the external reset pin; it is ignored when
    /// no external source is configured.
    pub fn asserted(&self, locked: bool, pin_high: bool, software_reset: bool) -> bool {
        let external = match &self.external {
            Some(src) if src.active_low => !pin_high,
            Some(_) => pin_high,
            None => false,
        };
        !locked || external || (self.software && software_reset)
    }

    /// Render the reset condition as a signal expression.
    pub fn expression(&self) -> String {
        let mut terms = vec![format!("~{}", self.lock_signal)];
        if let Some(src) = &self.external {
            if src.active_low {
                terms.push(format!("~{}", src.pad));
            } else {
                terms.push(src.pad.clone());
            }
        }
        if self.software {
            terms.push("ctrl.reset".into());
        }
        terms.join(" | ")
    }

    pub fn covers(&self, domain: &str) -> bool {
        self.domains.iter().any(|d| d == domain)
    }
}
