//! Clock domain generator.
//!
//! Splits the board reference clock into the domains a target needs:
//! the system clock, the phase-shifted (and for half-rate DRAM, doubled)
//! DRAM clock, and optional fixed-frequency auxiliary domains. Each domain is
//! synthesized by a PLL whose divider constraints are checked at composition
//! time, and the system domains are held in reset until the PLL locks.

pub mod crg;
pub mod domain;
pub mod pll;
pub mod reset;

pub use crg::{derive, ClockTree};
pub use domain::{ClockDomain, ClockSource, ResetKind};
pub use pll::{Pll, PllConfig, PllLimits, PllOutput};
pub use reset::ResetPolicy;
